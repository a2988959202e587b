use crate::auth::auth::AuthUser;
use crate::auth::handlers::is_email_available;
use crate::auth::password::hash_password;
use crate::model::role::Role;
use crate::model::teacher::Teacher;
use crate::utils::{email_cache, email_filter};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use sqlx::types::Json;
use tracing::error;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeacher {
    #[schema(example = "Asha Verma")]
    pub name: String,
    #[schema(example = "asha@school.test", format = "email")]
    pub email: String,
    pub password: String,
    #[schema(example = json!(["Maths", "Physics"]))]
    pub subjects: Vec<String>,
    #[schema(example = json!(["10A", "9B"]))]
    pub classes: Vec<String>,
    pub qualification: Option<String>,
}

#[derive(Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeacherWithUser {
    pub id: u64,
    pub user_id: u64,
    #[schema(value_type = Vec<String>)]
    pub subjects: Json<Vec<String>>,
    #[schema(value_type = Vec<String>)]
    pub classes: Json<Vec<String>>,
    pub qualification: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

/// Create the login account and the teacher profile in one transaction,
/// bound to the admin's own school.
#[utoipa::path(
    post,
    path = "/api/teachers",
    request_body = CreateTeacher,
    responses(
        (status = 201, description = "Teacher created"),
        (status = 400, description = "Missing fields"),
        (status = 409, description = "Email already taken"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Teachers"
)]
pub async fn create_teacher(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateTeacher>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let school_id = auth.school_id()?;

    let name = payload.name.trim();
    let email = payload.email.trim().to_lowercase();

    if name.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Please add all fields"
        })));
    }

    if !is_email_available(&email, pool.get_ref()).await {
        return Ok(HttpResponse::Conflict().json(json!({
            "message": "User already exists"
        })));
    }

    let hashed = hash_password(&payload.password);

    let mut tx = pool.begin().await.map_err(|e| {
        error!(error = %e, "Failed to begin transaction");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let user_insert = sqlx::query(
        r#"INSERT INTO users (name, email, password, role_id, school_id) VALUES (?, ?, ?, ?, ?)"#,
    )
    .bind(name)
    .bind(&email)
    .bind(hashed)
    .bind(Role::Teacher.id())
    .bind(school_id)
    .execute(&mut *tx)
    .await;

    let user_id = match user_insert {
        Ok(res) => res.last_insert_id(),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "message": "User already exists"
                    })));
                }
            }
            error!(error = %e, "Failed to create teacher user");
            return Err(ErrorInternalServerError("Internal Server Error"));
        }
    };

    let teacher_id = sqlx::query(
        r#"
        INSERT INTO teachers (user_id, school_id, subjects, classes, qualification)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(school_id)
    .bind(Json(&payload.subjects))
    .bind(Json(&payload.classes))
    .bind(&payload.qualification)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to create teacher profile");
        ErrorInternalServerError("Internal Server Error")
    })?
    .last_insert_id();

    tx.commit().await.map_err(|e| {
        error!(error = %e, teacher_id, "Failed to commit teacher creation");
        ErrorInternalServerError("Internal Server Error")
    })?;

    email_filter::insert(&email);
    email_cache::mark_taken(&email).await;

    let teacher = sqlx::query_as::<_, Teacher>(
        r#"
        SELECT id, user_id, school_id, subjects, classes, qualification,
               created_at, updated_at
        FROM teachers
        WHERE id = ?
        "#,
    )
    .bind(teacher_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, teacher_id, "Failed to reload teacher");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Teacher created successfully",
        "teacher": {
            "id": teacher.id,
            "userId": teacher.user_id,
            "subjects": teacher.subjects,
            "classes": teacher.classes,
            "qualification": teacher.qualification,
            "name": name,
            "email": email
        }
    })))
}

/// School's teachers with account details resolved. Open to every
/// authenticated role.
#[utoipa::path(
    get,
    path = "/api/teachers",
    responses(
        (status = 200, description = "Teacher list", body = [TeacherWithUser]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Teachers"
)]
pub async fn get_teachers(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let school_id = auth.school_id()?;

    let teachers = sqlx::query_as::<_, TeacherWithUser>(
        r#"
        SELECT
            t.id,
            t.user_id,
            t.subjects,
            t.classes,
            t.qualification,
            u.name,
            u.email,
            t.created_at
        FROM teachers t
        LEFT JOIN users u ON u.id = t.user_id
        WHERE t.school_id = ?
        ORDER BY t.id
        "#,
    )
    .bind(school_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, school_id, "Failed to fetch teachers");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(teachers))
}
