//! Revoked Token Repository
//!
//! Backs the logout blacklist: a token written here is refused by the auth
//! extractor until its own expiry passes, at which point `purge_expired`
//! can drop it.

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::RevokedToken;

const REVOKED_TOKEN_TABLE: &str = "revoked_token";

#[derive(Clone)]
pub struct RevokedTokenRepository {
    base: BaseRepository,
}

impl RevokedTokenRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Blacklist a token until `expires_at` (millis since epoch)
    pub async fn insert(&self, token: String, expires_at: i64) -> RepoResult<()> {
        let revoked = RevokedToken {
            id: None,
            token,
            expires_at,
        };
        let created: Option<RevokedToken> = self
            .base
            .db()
            .create(REVOKED_TOKEN_TABLE)
            .content(revoked)
            .await?;
        created
            .map(|_| ())
            .ok_or_else(|| RepoError::Database("Failed to revoke token".to_string()))
    }

    pub async fn is_revoked(&self, token: &str) -> RepoResult<bool> {
        let found: Option<RevokedToken> = self
            .base
            .db()
            .query("SELECT * FROM revoked_token WHERE token = $token LIMIT 1")
            .bind(("token", token.to_string()))
            .await?
            .take(0)?;
        Ok(found.is_some())
    }

    /// Drop blacklist entries whose token has expired anyway
    pub async fn purge_expired(&self, now: i64) -> RepoResult<()> {
        self.base
            .db()
            .query("DELETE revoked_token WHERE expires_at < $now")
            .bind(("now", now))
            .await?
            .check()?;
        Ok(())
    }
}
