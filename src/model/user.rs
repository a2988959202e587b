use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role_id: u8,
    pub school_id: Option<u64>,
    pub last_login_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}
