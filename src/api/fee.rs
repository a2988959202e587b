use crate::auth::auth::AuthUser;
use crate::model::fee::Fee;
use crate::model::role::Role;
use crate::model::student::Student;
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFee {
    #[schema(example = 1)]
    pub student_id: u64,
    #[schema(example = 1500.0)]
    pub amount: f64,
    /// e.g. "Tuition", "Transport", "Exam"
    #[serde(rename = "type")]
    #[schema(example = "Tuition")]
    pub fee_type: String,
    #[schema(example = "2026-04-01", value_type = String, format = "date")]
    pub due_date: NaiveDate,
}

#[derive(Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeeWithStudent {
    pub id: u64,
    pub student_id: u64,
    pub amount: f64,
    #[serde(rename = "type")]
    pub fee_type: String,
    #[schema(example = "2026-04-01", value_type = String, format = "date")]
    pub due_date: NaiveDate,
    pub status: String,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub payment_date: Option<NaiveDateTime>,
    pub student_name: Option<String>,
    pub student_email: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

/// Create a fee record for a student of the admin's school.
#[utoipa::path(
    post,
    path = "/api/fees",
    request_body = CreateFee,
    responses(
        (status = 201, description = "Fee created", body = Fee),
        (status = 404, description = "Student not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Fees"
)]
pub async fn create_fee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateFee>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let school_id = auth.school_id()?;

    let student = sqlx::query_scalar::<_, u64>(
        "SELECT id FROM students WHERE id = ? AND school_id = ?",
    )
    .bind(payload.student_id)
    .bind(school_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, student_id = payload.student_id, "Failed to check student");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if student.is_none() {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Student not found"
        })));
    }

    let fee_id = sqlx::query(
        r#"
        INSERT INTO fees (school_id, student_id, amount, fee_type, due_date)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(school_id)
    .bind(payload.student_id)
    .bind(payload.amount)
    .bind(payload.fee_type.trim())
    .bind(payload.due_date)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, student_id = payload.student_id, "Failed to create fee");
        ErrorInternalServerError("Internal Server Error")
    })?
    .last_insert_id();

    let fee = fetch_fee(pool.get_ref(), fee_id).await?;

    Ok(HttpResponse::Created().json(fee))
}

/// School's fees. A student caller sees only their own.
#[utoipa::path(
    get,
    path = "/api/fees",
    responses(
        (status = 200, description = "Fee list", body = [FeeWithStudent]),
        (status = 404, description = "Student profile not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Fees"
)]
pub async fn get_fees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require(&[Role::Admin, Role::Student, Role::Parent])?;
    let school_id = auth.school_id()?;

    // students see only their own fees
    // TODO: restrict parents to their linked children once a
    // parent-student link table exists
    let mut own_student_id: Option<u64> = None;
    if auth.role == Role::Student {
        let student = sqlx::query_as::<_, Student>(
            r#"
            SELECT id, user_id, school_id, class_name, section, roll_number,
                   created_at, updated_at
            FROM students
            WHERE user_id = ? AND school_id = ?
            "#,
        )
        .bind(auth.user_id)
        .bind(school_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, user_id = auth.user_id, "Failed to look up student profile");
            ErrorInternalServerError("Internal Server Error")
        })?;

        match student {
            Some(student) => own_student_id = Some(student.id),
            None => {
                return Ok(HttpResponse::NotFound().json(json!({
                    "message": "Student profile not found"
                })));
            }
        }
    }

    let mut sql = String::from(
        r#"
        SELECT
            f.id,
            f.student_id,
            f.amount,
            f.fee_type,
            f.due_date,
            f.status,
            f.payment_date,
            u.name AS student_name,
            u.email AS student_email,
            f.created_at
        FROM fees f
        LEFT JOIN students s ON s.id = f.student_id
        LEFT JOIN users u ON u.id = s.user_id
        WHERE f.school_id = ?
        "#,
    );
    if own_student_id.is_some() {
        sql.push_str(" AND f.student_id = ?");
    }
    sql.push_str(" ORDER BY f.id DESC");

    let mut query = sqlx::query_as::<_, FeeWithStudent>(&sql).bind(school_id);
    if let Some(student_id) = own_student_id {
        query = query.bind(student_id);
    }

    let fees = query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, school_id, "Failed to fetch fees");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(fees))
}

/// Mark a fee as paid and stamp the payment date.
#[utoipa::path(
    put,
    path = "/api/fees/{fee_id}/pay",
    params(("fee_id", Path, description = "Fee ID")),
    responses(
        (status = 200, description = "Fee marked paid", body = Fee),
        (status = 404, description = "Fee not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Fees"
)]
pub async fn pay_fee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let school_id = auth.school_id()?;
    let fee_id = path.into_inner();

    let result = sqlx::query(
        r#"
        UPDATE fees
        SET status = 'Paid', payment_date = NOW()
        WHERE id = ? AND school_id = ?
        "#,
    )
    .bind(fee_id)
    .bind(school_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, fee_id, "Failed to mark fee paid");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Fee not found"
        })));
    }

    let fee = fetch_fee(pool.get_ref(), fee_id).await?;

    Ok(HttpResponse::Ok().json(fee))
}

async fn fetch_fee(pool: &MySqlPool, fee_id: u64) -> actix_web::Result<Fee> {
    sqlx::query_as::<_, Fee>(
        r#"
        SELECT id, school_id, student_id, amount, fee_type, due_date,
               status, payment_date, created_at, updated_at
        FROM fees
        WHERE id = ?
        "#,
    )
    .bind(fee_id)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        error!(error = %e, fee_id, "Failed to reload fee");
        ErrorInternalServerError("Internal Server Error")
    })
}
