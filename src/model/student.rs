use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    pub id: u64,
    pub user_id: u64,
    pub school_id: u64,
    pub class_name: String,
    pub section: String,
    pub roll_number: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
