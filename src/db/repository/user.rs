//! User Repository

use super::{BaseRepository, RepoError, RepoResult, record_id};
use crate::db::models::{User, UserCreate, UserUpdate};
use crate::utils::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const USER_TABLE: &str = "user";

#[derive(Clone)]
pub struct UserRepository {
    base: BaseRepository,
}

impl UserRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_all(&self) -> RepoResult<Vec<User>> {
        let users: Vec<User> = self
            .base
            .db()
            .query("SELECT * FROM user ORDER BY created_at")
            .await?
            .take(0)?;
        Ok(users)
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<User>> {
        let user: Option<User> = self.base.db().select(record_id(USER_TABLE, id)).await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let user: Option<User> = self
            .base
            .db()
            .query("SELECT * FROM user WHERE email = $email LIMIT 1")
            .bind(("email", email.to_string()))
            .await?
            .take(0)?;
        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let user: Option<User> = self
            .base
            .db()
            .query("SELECT * FROM user WHERE username = $username LIMIT 1")
            .bind(("username", username.to_string()))
            .await?
            .take(0)?;
        Ok(user)
    }

    pub async fn create(&self, data: UserCreate) -> RepoResult<User> {
        let user = User {
            id: None,
            username: data.username,
            email: data.email,
            password_hash: data.password_hash,
            phone_number: data.phone_number,
            gender: data.gender,
            points: 0,
            is_admin: data.is_admin,
            is_active: data.is_active,
            failed_login_attempts: 0,
            created_at: now_millis(),
        };

        let created: Option<User> = self.base.db().create(USER_TABLE).content(user).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create user".to_string()))
    }

    pub async fn update(&self, id: &str, data: UserUpdate) -> RepoResult<User> {
        let thing = record_id(USER_TABLE, id);

        let mut set_parts: Vec<&str> = Vec::new();
        if data.username.is_some() {
            set_parts.push("username = $username");
        }
        if data.email.is_some() {
            set_parts.push("email = $email");
        }
        if data.password_hash.is_some() {
            set_parts.push("password_hash = $password_hash");
        }
        if data.phone_number.is_some() {
            set_parts.push("phone_number = $phone_number");
        }
        if data.gender.is_some() {
            set_parts.push("gender = $gender");
        }
        if data.points.is_some() {
            set_parts.push("points = $points");
        }
        if data.is_active.is_some() {
            set_parts.push("is_active = $is_active");
        }

        if set_parts.is_empty() {
            return self
                .find_by_id(id)
                .await?
                .ok_or_else(|| RepoError::NotFound(format!("User {} not found", id)));
        }

        let query_str = format!("UPDATE $thing SET {} RETURN AFTER", set_parts.join(", "));
        let mut query = self.base.db().query(&query_str).bind(("thing", thing));

        if let Some(v) = data.username {
            query = query.bind(("username", v));
        }
        if let Some(v) = data.email {
            query = query.bind(("email", v));
        }
        if let Some(v) = data.password_hash {
            query = query.bind(("password_hash", v));
        }
        if let Some(v) = data.phone_number {
            query = query.bind(("phone_number", v));
        }
        if let Some(v) = data.gender {
            query = query.bind(("gender", v));
        }
        if let Some(v) = data.points {
            query = query.bind(("points", v));
        }
        if let Some(v) = data.is_active {
            query = query.bind(("is_active", v));
        }

        let users: Vec<User> = query.await?.take(0)?;
        users
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("User {} not found", id)))
    }

    pub async fn delete(&self, id: &str) -> RepoResult<()> {
        let result: Option<User> = self.base.db().delete(record_id(USER_TABLE, id)).await?;
        if result.is_none() {
            return Err(RepoError::NotFound(format!("User {} not found", id)));
        }
        Ok(())
    }

    /// Toggle admin privilege
    pub async fn set_admin(&self, id: &str, is_admin: bool) -> RepoResult<User> {
        let mut result = self
            .base
            .db()
            .query("UPDATE $thing SET is_admin = $is_admin RETURN AFTER")
            .bind(("thing", record_id(USER_TABLE, id)))
            .bind(("is_admin", is_admin))
            .await?;
        let users: Vec<User> = result.take(0)?;
        users
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("User {} not found", id)))
    }

    /// Atomically add to the points balance (voucher reward payout)
    pub async fn add_points(&self, id: &str, points: i64) -> RepoResult<User> {
        let mut result = self
            .base
            .db()
            .query("UPDATE $thing SET points += $points RETURN AFTER")
            .bind(("thing", record_id(USER_TABLE, id)))
            .bind(("points", points))
            .await?;
        let users: Vec<User> = result.take(0)?;
        users
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("User {} not found", id)))
    }

    /// Reset the failed-login counter after a successful login
    pub async fn reset_failed_attempts(&self, id: &str) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE $thing SET failed_login_attempts = 0")
            .bind(("thing", record_id(USER_TABLE, id)))
            .await?
            .check()?;
        Ok(())
    }

    /// Atomically bump the failed-login counter
    pub async fn increment_failed_attempts(&self, id: &str) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE $thing SET failed_login_attempts += 1")
            .bind(("thing", record_id(USER_TABLE, id)))
            .await?
            .check()?;
        Ok(())
    }
}
