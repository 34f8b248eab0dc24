pub mod client;
pub mod document_extractor;
pub mod reporter;

pub use client::TelegramClient;
pub use document_extractor::TelegramDocumentExtractor;
pub use reporter::TelegramStatusReporter;
