use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Fee {
    pub id: u64,
    pub school_id: u64,
    pub student_id: u64,
    pub amount: f64,
    #[serde(rename = "type")]
    pub fee_type: String,
    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub due_date: NaiveDate,
    pub status: String,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub payment_date: Option<NaiveDateTime>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: NaiveDateTime,
}
