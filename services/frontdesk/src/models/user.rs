//! User model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User entity as stored, including the password hash
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    #[sqlx(rename = "password")]
    pub password_hash: String,
    pub branch_id: Option<i64>,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The fields safe to hand back to a client
    pub fn public_profile(&self) -> PublicProfile {
        PublicProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            branch_id: self.branch_id,
            is_admin: self.is_admin,
        }
    }
}

/// Client-facing user profile; never carries the password hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicProfile {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub branch_id: Option<i64>,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
}

/// Row returned by the user listing, joined with the branch name
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub branch_id: Option<i64>,
    pub branch_name: Option<String>,
    pub is_active: bool,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// New user creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone_number: Option<String>,
    #[serde(default)]
    pub password: String,
    pub branch_id: Option<i64>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, alias = "isAdmin")]
    pub is_admin: bool,
}

/// User update payload; the password is only replaced when supplied
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone_number: Option<String>,
    pub password: Option<String>,
    pub branch_id: Option<i64>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, alias = "isAdmin")]
    pub is_admin: bool,
}

fn default_active() -> bool {
    true
}

/// Validated user ready for insertion, password already hashed
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub password_hash: String,
    pub branch_id: Option<i64>,
    pub is_active: bool,
    pub is_admin: bool,
}

/// Validated user changes; `password_hash` is `None` when the password stays
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub password_hash: Option<String>,
    pub branch_id: Option<i64>,
    pub is_active: bool,
    pub is_admin: bool,
}
