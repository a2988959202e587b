use crate::auth::auth::AuthUser;
use crate::auth::handlers::is_email_available;
use crate::auth::password::hash_password;
use crate::model::role::Role;
use crate::utils::{email_cache, email_filter};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudent {
    #[schema(example = "Ravi Kumar")]
    pub name: String,
    #[schema(example = "ravi@school.test", format = "email")]
    pub email: String,
    pub password: String,
    #[schema(example = "10")]
    pub class_name: String,
    #[schema(example = "A")]
    pub section: String,
    #[schema(example = "23")]
    pub roll_number: String,
}

#[derive(Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentWithUser {
    pub id: u64,
    pub user_id: u64,
    pub class_name: String,
    pub section: String,
    pub roll_number: String,
    pub name: Option<String>,
    pub email: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

/// Create the login account and the student profile in one transaction,
/// bound to the admin's own school.
#[utoipa::path(
    post,
    path = "/api/students",
    request_body = CreateStudent,
    responses(
        (status = 201, description = "Student created"),
        (status = 400, description = "Missing fields"),
        (status = 409, description = "Email or roll number already taken"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
pub async fn create_student(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateStudent>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let school_id = auth.school_id()?;

    let name = payload.name.trim();
    let email = payload.email.trim().to_lowercase();

    if name.is_empty()
        || email.is_empty()
        || payload.password.is_empty()
        || payload.class_name.trim().is_empty()
        || payload.section.trim().is_empty()
        || payload.roll_number.trim().is_empty()
    {
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
    .bind(Role::Student.id())
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
            error!(error = %e, "Failed to create student user");
            return Err(ErrorInternalServerError("Internal Server Error"));
        }
    };

    let student_insert = sqlx::query(
        r#"
        INSERT INTO students (user_id, school_id, class_name, section, roll_number)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(school_id)
    .bind(payload.class_name.trim())
    .bind(payload.section.trim())
    .bind(payload.roll_number.trim())
    .execute(&mut *tx)
    .await;

    let student_id = match student_insert {
        Ok(res) => res.last_insert_id(),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "message": "Roll number already taken for this class"
                    })));
                }
            }
            error!(error = %e, "Failed to create student profile");
            return Err(ErrorInternalServerError("Internal Server Error"));
        }
    };

    tx.commit().await.map_err(|e| {
        error!(error = %e, student_id, "Failed to commit student creation");
        ErrorInternalServerError("Internal Server Error")
    })?;

    email_filter::insert(&email);
    email_cache::mark_taken(&email).await;

    Ok(HttpResponse::Created().json(json!({
        "message": "Student created successfully",
        "student": {
            "id": student_id,
            "userId": user_id,
            "className": payload.class_name.trim(),
            "section": payload.section.trim(),
            "rollNumber": payload.roll_number.trim(),
            "name": name,
            "email": email
        }
    })))
}

/// School roster with account details resolved.
#[utoipa::path(
    get,
    path = "/api/students",
    responses(
        (status = 200, description = "Student list", body = [StudentWithUser]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
pub async fn get_students(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require(&[Role::Admin, Role::Teacher])?;
    let school_id = auth.school_id()?;

    let students = sqlx::query_as::<_, StudentWithUser>(
        r#"
        SELECT
            st.id,
            st.user_id,
            st.class_name,
            st.section,
            st.roll_number,
            u.name,
            u.email,
            st.created_at
        FROM students st
        LEFT JOIN users u ON u.id = st.user_id
        WHERE st.school_id = ?
        ORDER BY st.class_name, st.section, st.roll_number
        "#,
    )
    .bind(school_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, school_id, "Failed to fetch students");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(students))
}
