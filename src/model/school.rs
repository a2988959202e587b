use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct School {
    pub id: u64,
    pub name: String,
    pub address: Option<String>,
    pub admin_id: u64,
    pub subscription_plan: String,
    #[schema(example = "2026-01-01T00:00:00", value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}
