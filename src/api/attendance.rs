use crate::auth::auth::AuthUser;
use crate::model::attendance::{AttendanceRecord, AttendanceSheet, AttendanceStatus};
use crate::model::role::Role;
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use std::collections::HashMap;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendance {
    #[schema(example = "2026-03-01", value_type = String)]
    pub date: String,
    #[schema(example = "10")]
    pub class_name: String,
    #[schema(example = "A")]
    pub section: String,
    pub records: Vec<RecordInput>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordInput {
    #[schema(example = 1)]
    pub student_id: u64,
    pub status: AttendanceStatus,
}

#[derive(Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SheetRecord {
    pub student_id: u64,
    #[schema(example = "Present")]
    pub status: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SheetResponse {
    pub id: u64,
    pub class_name: String,
    pub section: String,
    #[schema(example = "2026-03-01", value_type = String, format = "date")]
    pub date: NaiveDate,
    pub records: Vec<SheetRecord>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: NaiveDateTime,
}

/// A record resolved against the roster. `name`/`rollNumber` are null when
/// the student reference no longer resolves; the query still succeeds.
#[derive(Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRecord {
    pub student_id: u64,
    pub name: Option<String>,
    pub roll_number: Option<String>,
    #[schema(example = "Late")]
    pub status: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSheetResponse {
    pub id: u64,
    pub class_name: String,
    pub section: String,
    #[schema(example = "2026-03-01", value_type = String, format = "date")]
    pub date: NaiveDate,
    pub records: Vec<ResolvedRecord>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceQuery {
    /// Calendar day; any time-of-day component is ignored
    pub date: Option<String>,
    pub class_name: Option<String>,
    pub section: Option<String>,
}

#[derive(Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentDayStatus {
    pub id: u64,
    #[schema(example = "2026-03-01", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "Absent")]
    pub status: String,
    pub class_name: String,
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Str(String),
    Day(NaiveDate),
}

/// Resolve a raw date string to a calendar day. Time-of-day is discarded so
/// two calls for the same day at different clock times hit the same sheet.
fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .ok()
        .map(|dt| dt.date())
}

/// Duplicate studentIds in one submission collapse last-write-wins,
/// keeping the position of the first occurrence.
fn dedup_last_wins(records: &[RecordInput]) -> Vec<RecordInput> {
    let mut by_student: HashMap<u64, usize> = HashMap::new();
    let mut out: Vec<RecordInput> = Vec::with_capacity(records.len());

    for record in records {
        match by_student.get(&record.student_id) {
            Some(&at) => out[at] = record.clone(),
            None => {
                by_student.insert(record.student_id, out.len());
                out.push(record.clone());
            }
        }
    }

    out
}

/// Mark attendance for a class. First call for a (class, section, day) tuple
/// creates the sheet; later calls replace its record list wholesale.
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = MarkAttendance,
    responses(
        (status = 201, description = "Sheet created", body = SheetResponse),
        (status = 200, description = "Existing sheet updated", body = SheetResponse),
        (status = 400, description = "Missing fields, bad date or unenrolled student"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<MarkAttendance>,
) -> actix_web::Result<impl Responder> {
    auth.require(&[Role::Teacher, Role::Admin])?;
    let school_id = auth.school_id()?;

    if payload.class_name.trim().is_empty() || payload.section.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "className and section are required"
        })));
    }

    let Some(day) = parse_day(&payload.date) else {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "date must be YYYY-MM-DD or an ISO datetime"
        })));
    };

    let records = dedup_last_wins(&payload.records);

    // every referenced student must be enrolled in this class
    if !records.is_empty() {
        let ids: Vec<u64> = records.iter().map(|r| r.student_id).collect();
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id FROM students \
             WHERE school_id = ? AND class_name = ? AND section = ? AND id IN ({})",
            placeholders
        );

        let mut query = sqlx::query_scalar::<_, u64>(&sql)
            .bind(school_id)
            .bind(payload.class_name.trim())
            .bind(payload.section.trim());
        for id in &ids {
            query = query.bind(id);
        }

        let known = query.fetch_all(pool.get_ref()).await.map_err(|e| {
            error!(error = %e, school_id, "Failed to check enrollment");
            ErrorInternalServerError("Internal Server Error")
        })?;

        if known.len() != ids.len() {
            let missing: Vec<String> = ids
                .iter()
                .filter(|id| !known.contains(id))
                .map(|id| id.to_string())
                .collect();
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": format!(
                    "Students not enrolled in this class: {}",
                    missing.join(", ")
                )
            })));
        }
    }

    let mut tx = pool.begin().await.map_err(|e| {
        error!(error = %e, "Failed to begin transaction");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO attendance_sheets (school_id, class_name, section, date)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(school_id)
    .bind(payload.class_name.trim())
    .bind(payload.section.trim())
    .bind(day)
    .execute(&mut *tx)
    .await;

    let (sheet_id, created) = match inserted {
        Ok(res) => (res.last_insert_id(), true),
        Err(e) => {
            // Duplicate key: the sheet for this day already exists (or a
            // concurrent first-mark won the race). Convert to an update.
            let duplicate = matches!(
                &e,
                sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000")
            );
            if !duplicate {
                error!(error = %e, school_id, "Failed to insert attendance sheet");
                return Err(ErrorInternalServerError("Internal Server Error"));
            }

            let id = sqlx::query_scalar::<_, u64>(
                r#"
                SELECT id FROM attendance_sheets
                WHERE school_id = ? AND class_name = ? AND section = ? AND date = ?
                "#,
            )
            .bind(school_id)
            .bind(payload.class_name.trim())
            .bind(payload.section.trim())
            .bind(day)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                error!(error = %e, school_id, "Failed to load existing attendance sheet");
                ErrorInternalServerError("Internal Server Error")
            })?;

            sqlx::query("UPDATE attendance_sheets SET updated_at = NOW() WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    error!(error = %e, sheet_id = id, "Failed to touch attendance sheet");
                    ErrorInternalServerError("Internal Server Error")
                })?;

            (id, false)
        }
    };

    // wholesale replace: students omitted from a re-submission lose their
    // prior status for that day
    sqlx::query("DELETE FROM attendance_records WHERE sheet_id = ?")
        .bind(sheet_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!(error = %e, sheet_id, "Failed to clear attendance records");
            ErrorInternalServerError("Internal Server Error")
        })?;

    for record in &records {
        sqlx::query(
            r#"
            INSERT INTO attendance_records (sheet_id, student_id, status)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(sheet_id)
        .bind(record.student_id)
        .bind(record.status.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!(error = %e, sheet_id, student_id = record.student_id, "Failed to insert attendance record");
            ErrorInternalServerError("Internal Server Error")
        })?;
    }

    tx.commit().await.map_err(|e| {
        error!(error = %e, sheet_id, "Failed to commit attendance upsert");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let sheet = fetch_sheet(pool.get_ref(), sheet_id).await?;

    if created {
        Ok(HttpResponse::Created().json(sheet))
    } else {
        Ok(HttpResponse::Ok().json(sheet))
    }
}

async fn fetch_sheet(pool: &MySqlPool, sheet_id: u64) -> actix_web::Result<SheetResponse> {
    let sheet = sqlx::query_as::<_, AttendanceSheet>(
        r#"
        SELECT id, school_id, class_name, section, date, created_at, updated_at
        FROM attendance_sheets
        WHERE id = ?
        "#,
    )
    .bind(sheet_id)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        error!(error = %e, sheet_id, "Failed to reload attendance sheet");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let records = sqlx::query_as::<_, AttendanceRecord>(
        r#"
        SELECT id, sheet_id, student_id, status
        FROM attendance_records
        WHERE sheet_id = ?
        ORDER BY id
        "#,
    )
    .bind(sheet_id)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        error!(error = %e, sheet_id, "Failed to reload attendance records");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(SheetResponse {
        id: sheet.id,
        class_name: sheet.class_name,
        section: sheet.section,
        date: sheet.date,
        records: records
            .into_iter()
            .map(|r| SheetRecord {
                student_id: r.student_id,
                status: r.status,
            })
            .collect(),
        created_at: sheet.created_at,
        updated_at: sheet.updated_at,
    })
}

/// Fetch one sheet for the caller's school, narrowed by whichever of
/// date/className/section are supplied, with records resolved against
/// the roster.
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Sheet with resolved records", body = ResolvedSheetResponse),
        (status = 404, description = "No sheet yet", body = Object, example = json!({
            "message": "Attendance not marked for this date"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn get_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require(&[Role::Teacher, Role::Admin, Role::Parent])?;
    let school_id = auth.school_id()?;

    let mut conditions = vec!["school_id = ?"];
    let mut values = vec![FilterValue::U64(school_id)];

    if let Some(raw) = &query.date {
        let Some(day) = parse_day(raw) else {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "date must be YYYY-MM-DD or an ISO datetime"
            })));
        };
        conditions.push("date = ?");
        values.push(FilterValue::Day(day));
    }
    if let Some(class_name) = &query.class_name {
        conditions.push("class_name = ?");
        values.push(FilterValue::Str(class_name.clone()));
    }
    if let Some(section) = &query.section {
        conditions.push("section = ?");
        values.push(FilterValue::Str(section.clone()));
    }

    let sql = format!(
        "SELECT id, school_id, class_name, section, date, created_at, updated_at \
         FROM attendance_sheets WHERE {} ORDER BY date DESC, id DESC LIMIT 1",
        conditions.join(" AND ")
    );

    let mut sheet_query = sqlx::query_as::<_, AttendanceSheet>(&sql);
    for value in &values {
        sheet_query = match value {
            FilterValue::U64(v) => sheet_query.bind(v),
            FilterValue::Str(v) => sheet_query.bind(v),
            FilterValue::Day(v) => sheet_query.bind(v),
        };
    }

    let sheet = sheet_query
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, school_id, "Failed to fetch attendance sheet");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let Some(sheet) = sheet else {
        // 404 lets the caller branch into a blank attendance-taking form
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Attendance not marked for this date"
        })));
    };

    let records = sqlx::query_as::<_, ResolvedRecord>(
        r#"
        SELECT ar.student_id, u.name, s.roll_number, ar.status
        FROM attendance_records ar
        LEFT JOIN students s ON s.id = ar.student_id
        LEFT JOIN users u ON u.id = s.user_id
        WHERE ar.sheet_id = ?
        ORDER BY ar.id
        "#,
    )
    .bind(sheet.id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, sheet_id = sheet.id, "Failed to resolve attendance records");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(ResolvedSheetResponse {
        id: sheet.id,
        class_name: sheet.class_name,
        section: sheet.section,
        date: sheet.date,
        records,
        created_at: sheet.created_at,
        updated_at: sheet.updated_at,
    }))
}

/// A student's attendance history across sheets, most recent day first.
/// Only that student's own status is returned.
#[utoipa::path(
    get,
    path = "/api/attendance/student/{student_id}",
    params(("student_id", Path, description = "Student ID")),
    responses(
        (status = 200, description = "History entries", body = [StudentDayStatus]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn get_student_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require(&[Role::Student, Role::Parent, Role::Admin])?;
    let school_id = auth.school_id()?;
    let student_id = path.into_inner();

    let history = sqlx::query_as::<_, StudentDayStatus>(
        r#"
        SELECT sh.id, sh.date, ar.status, sh.class_name
        FROM attendance_records ar
        INNER JOIN attendance_sheets sh ON sh.id = ar.sheet_id
        WHERE sh.school_id = ? AND ar.student_id = ?
        ORDER BY sh.date DESC, sh.id DESC
        "#,
    )
    .bind(school_id)
    .bind(student_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, school_id, student_id, "Failed to fetch student attendance");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(history))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_day_accepts_date_only() {
        assert_eq!(
            parse_day("2024-03-01"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(
            parse_day("  2024-03-01  "),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
    }

    #[test]
    fn parse_day_discards_time_of_day() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1);
        assert_eq!(parse_day("2024-03-01T08:00"), day);
        assert_eq!(parse_day("2024-03-01T23:00"), day);
        assert_eq!(parse_day("2024-03-01T08:15:30"), day);
        assert_eq!(parse_day("2024-03-01T08:15:30.250"), day);
        assert_eq!(parse_day("2024-03-01T08:00:00Z"), day);
        assert_eq!(parse_day("2024-03-01T08:00:00+05:30"), day);
    }

    #[test]
    fn parse_day_rejects_garbage() {
        assert_eq!(parse_day("yesterday"), None);
        assert_eq!(parse_day("2024-13-01"), None);
        assert_eq!(parse_day(""), None);
    }

    fn rec(student_id: u64, status: AttendanceStatus) -> RecordInput {
        RecordInput { student_id, status }
    }

    #[test]
    fn dedup_keeps_last_status_at_first_position() {
        let input = vec![
            rec(1, AttendanceStatus::Present),
            rec(2, AttendanceStatus::Absent),
            rec(1, AttendanceStatus::Late),
        ];
        let out = dedup_last_wins(&input);
        assert_eq!(
            out,
            vec![rec(1, AttendanceStatus::Late), rec(2, AttendanceStatus::Absent)]
        );
    }

    #[test]
    fn dedup_leaves_distinct_records_alone() {
        let input = vec![rec(1, AttendanceStatus::Present), rec(2, AttendanceStatus::Leave)];
        assert_eq!(dedup_last_wins(&input), input);
        assert!(dedup_last_wins(&[]).is_empty());
    }
}
