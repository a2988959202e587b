use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Teacher {
    pub id: u64,
    pub user_id: u64,
    pub school_id: u64,
    pub subjects: Json<Vec<String>>,
    pub classes: Json<Vec<String>>,
    pub qualification: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
