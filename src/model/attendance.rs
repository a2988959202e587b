use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Wire contract: exact spelling and casing of the four values.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Leave,
}

/// One class's attendance for one calendar day. At most one row may exist
/// per (school_id, class_name, section, date); enforced by a unique key.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct AttendanceSheet {
    pub id: u64,
    pub school_id: u64,
    pub class_name: String,
    pub section: String,
    pub date: NaiveDate,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct AttendanceRecord {
    pub id: u64,
    pub sheet_id: u64,
    pub student_id: u64,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_names_are_exact() {
        assert_eq!(AttendanceStatus::Present.to_string(), "Present");
        assert_eq!(AttendanceStatus::Leave.to_string(), "Leave");
        assert_eq!(
            AttendanceStatus::from_str("Late").unwrap(),
            AttendanceStatus::Late
        );
        // casing is part of the contract
        assert!(AttendanceStatus::from_str("present").is_err());
        assert!(AttendanceStatus::from_str("Sick").is_err());
    }

    #[test]
    fn status_serde_round_trip() {
        let parsed: AttendanceStatus = serde_json::from_str("\"Absent\"").unwrap();
        assert_eq!(parsed, AttendanceStatus::Absent);
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"Absent\"");
        assert!(serde_json::from_str::<AttendanceStatus>("\"absent\"").is_err());
    }
}
