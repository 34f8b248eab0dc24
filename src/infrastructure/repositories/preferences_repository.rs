use crate::domain::preferences::Preferences;
use crate::domain::shared::OwnerId;
use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use std::sync::Arc;

/// Read side of the owner's voice settings.
///
/// The table belongs to the account service; we never write to it.
#[async_trait]
pub trait PreferencesRepository: Send + Sync {
    /// Current settings for `owner`, normalized. Owners without a row get
    /// the defaults.
    async fn snapshot(&self, owner: &OwnerId) -> Result<Preferences, sqlx::Error>;
}

#[derive(Debug, sqlx::FromRow)]
struct PreferencesRow {
    voice: Option<String>,
    speed: Option<f32>,
    style_instructions: Option<String>,
}

impl From<PreferencesRow> for Preferences {
    fn from(row: PreferencesRow) -> Self {
        Preferences {
            voice: row.voice,
            speed: row.speed.unwrap_or(1.0),
            style_instructions: row.style_instructions,
        }
        .normalized()
    }
}

pub struct PgPreferencesRepository {
    pool: Arc<DbPool>,
}

impl PgPreferencesRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PreferencesRepository for PgPreferencesRepository {
    async fn snapshot(&self, owner: &OwnerId) -> Result<Preferences, sqlx::Error> {
        let pool = self.pool.as_ref();
        let row = sqlx::query_as::<_, PreferencesRow>(
            "SELECT voice, speed, style_instructions FROM user_preferences WHERE owner_id = $1",
        )
        .bind(owner.as_str())
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Preferences::from).unwrap_or_default())
    }
}
