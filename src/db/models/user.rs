//! User Model

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

pub type UserId = RecordId;

/// User account
///
/// `points` is the reward balance earned from completed voucher tasks and is
/// only ever mutated through an atomic increment on admin approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Option<UserId>,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub failed_login_attempts: i64,
    pub created_at: i64,
}

fn default_true() -> bool {
    true
}

impl User {
    /// Verify password using argon2
    pub fn verify_password(&self, password: &str) -> Result<bool, argon2::password_hash::Error> {
        use argon2::{
            Argon2,
            password_hash::{PasswordHash, PasswordVerifier},
        };

        let parsed_hash = PasswordHash::new(&self.password_hash)?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash password using argon2
    pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
        use argon2::{
            Argon2,
            password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
        };

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2.hash_password(password.as_bytes(), &salt)?;
        Ok(password_hash.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub email: String,
    /// Already hashed; hashing happens at the API boundary
    pub password_hash: String,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    pub is_admin: bool,
    pub is_active: bool,
}

/// Partial update; only present fields are written
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    pub points: Option<i64>,
    pub is_active: Option<bool>,
}

/// User view safe to return to API callers (no password hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPublic {
    pub id: String,
    pub username: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    pub points: i64,
    pub is_admin: bool,
    pub is_active: bool,
    pub created_at: i64,
}

impl From<User> for UserPublic {
    fn from(user: User) -> Self {
        Self {
            id: user.id.as_ref().map(|t| t.to_string()).unwrap_or_default(),
            username: user.username,
            email: user.email,
            phone_number: user.phone_number,
            gender: user.gender,
            points: user.points,
            is_admin: user.is_admin,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = User::hash_password("correct horse battery").expect("hashing failed");
        let user = User {
            id: None,
            username: "alice".into(),
            email: "alice@example.com".into(),
            password_hash: hash,
            phone_number: None,
            gender: None,
            points: 0,
            is_admin: false,
            is_active: true,
            failed_login_attempts: 0,
            created_at: 0,
        };

        assert!(user.verify_password("correct horse battery").unwrap());
        assert!(!user.verify_password("wrong password").unwrap());
    }
}
