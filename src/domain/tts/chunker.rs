use serde::{Deserialize, Serialize};

const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?', '…'];
const CLAUSE_SEPARATORS: &[char] = &[',', ';', ':'];
const PARAGRAPH_BREAK: &str = "\n\n";

/// Ordered, length-bounded fragment of the source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
    pub is_last: bool,
}

/// Split text into chunks of at most `max_len` characters.
///
/// Boundaries are searched backward from `max_len` within the remaining text,
/// in this order:
/// 1. a paragraph break past the middle of the window
/// 2. a sentence terminator followed by whitespace
/// 3. a clause separator followed by whitespace
/// 4. the last whitespace, so no word is split
/// 5. a hard cut at exactly `max_len` characters, only for a window with no
///    whitespace at all
///
/// Chunks are trimmed and empty chunks are dropped. Lengths are counted in
/// characters, never bytes, so multi-byte text is never cut inside a code point.
pub fn split(text: &str, max_len: usize) -> Vec<Chunk> {
    let max_len = max_len.max(1);
    let mut pieces: Vec<&str> = Vec::new();
    let mut remaining = text.trim();

    while !remaining.is_empty() {
        let window_end = match byte_offset(remaining, max_len) {
            Some(end) => end,
            None => {
                pieces.push(remaining);
                break;
            }
        };

        let window = &remaining[..window_end];
        let cut = paragraph_boundary(window, max_len)
            .or_else(|| punctuation_boundary(remaining, window, SENTENCE_TERMINATORS))
            .or_else(|| punctuation_boundary(remaining, window, CLAUSE_SEPARATORS))
            .or_else(|| whitespace_boundary(remaining, window))
            .unwrap_or(window_end);

        let piece = remaining[..cut].trim();
        if !piece.is_empty() {
            pieces.push(piece);
        }
        remaining = remaining[cut..].trim_start();
    }

    let total = pieces.len();
    pieces
        .into_iter()
        .enumerate()
        .map(|(index, text)| Chunk {
            index,
            text: text.to_string(),
            is_last: index + 1 == total,
        })
        .collect()
}

/// Byte offset of the `chars`-th character, or None when the text is shorter
/// than or exactly `chars` characters long.
fn byte_offset(text: &str, chars: usize) -> Option<usize> {
    text.char_indices().nth(chars).map(|(offset, _)| offset)
}

fn paragraph_boundary(window: &str, max_len: usize) -> Option<usize> {
    let half = byte_offset(window, max_len / 2).unwrap_or(window.len());
    window
        .rfind(PARAGRAPH_BREAK)
        .filter(|&position| position > half)
}

/// Cut right after the last terminator in the window that is followed by
/// whitespace (or by the end of the text). The character following the
/// window is taken into account so a terminator sitting exactly at the
/// window edge still counts.
fn punctuation_boundary(remaining: &str, window: &str, terminators: &[char]) -> Option<usize> {
    window
        .char_indices()
        .rev()
        .filter(|(_, c)| terminators.contains(c))
        .map(|(position, c)| position + c.len_utf8())
        .find(|&end| {
            end > 0
                && remaining[end..]
                    .chars()
                    .next()
                    .map_or(true, char::is_whitespace)
        })
}

/// Cut at the last whitespace in the window. A word ending exactly at the
/// window edge is kept whole.
fn whitespace_boundary(remaining: &str, window: &str) -> Option<usize> {
    if remaining[window.len()..].starts_with(char::is_whitespace) {
        return Some(window.len());
    }
    window
        .char_indices()
        .rev()
        .find(|&(position, c)| position > 0 && c.is_whitespace())
        .map(|(position, _)| position)
}
