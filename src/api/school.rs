use crate::auth::auth::AuthUser;
use crate::auth::handlers::is_email_available;
use crate::auth::password::hash_password;
use crate::model::role::Role;
use crate::model::school::School;
use crate::utils::{email_cache, email_filter};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    Free,
    Basic,
    Premium,
}

impl SubscriptionPlan {
    fn as_str(&self) -> &str {
        match self {
            SubscriptionPlan::Free => "free",
            SubscriptionPlan::Basic => "basic",
            SubscriptionPlan::Premium => "premium",
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSchool {
    #[schema(example = "Green Valley High")]
    pub name: String,
    pub address: Option<String>,
    #[schema(example = "Jane Doe")]
    pub admin_name: String,
    #[schema(example = "jane@greenvalley.test", format = "email")]
    pub admin_email: String,
    pub admin_password: String,
    #[schema(example = "free")]
    pub subscription_plan: Option<SubscriptionPlan>,
}

#[derive(Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchoolWithAdmin {
    pub id: u64,
    pub name: String,
    pub address: Option<String>,
    pub admin_id: u64,
    pub subscription_plan: String,
    pub admin_name: Option<String>,
    pub admin_email: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

/// Create a school together with its admin account. The admin user is
/// created first, the school second, and the admin's school_id backfilled,
/// all in one transaction.
#[utoipa::path(
    post,
    path = "/api/schools",
    request_body = CreateSchool,
    responses(
        (status = 201, description = "School and admin created"),
        (status = 400, description = "Missing fields or duplicate school name"),
        (status = 409, description = "Admin email already taken"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Schools"
)]
pub async fn create_school(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateSchool>,
) -> actix_web::Result<impl Responder> {
    auth.require_superadmin()?;

    let name = payload.name.trim();
    let admin_name = payload.admin_name.trim();
    let admin_email = payload.admin_email.trim().to_lowercase();

    if name.is_empty()
        || admin_name.is_empty()
        || admin_email.is_empty()
        || payload.admin_password.is_empty()
    {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Please provide all required fields"
        })));
    }

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM schools WHERE name = ? LIMIT 1)",
    )
    .bind(name)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to check school name");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if exists {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "School with this name already exists"
        })));
    }

    if !is_email_available(&admin_email, pool.get_ref()).await {
        return Ok(HttpResponse::Conflict().json(json!({
            "message": "User with this email already exists"
        })));
    }

    let plan = payload
        .subscription_plan
        .as_ref()
        .map_or("free", SubscriptionPlan::as_str);

    let hashed = hash_password(&payload.admin_password);

    let mut tx = pool.begin().await.map_err(|e| {
        error!(error = %e, "Failed to begin transaction");
        ErrorInternalServerError("Internal Server Error")
    })?;

    // the school row needs the admin's id, so the user comes first
    // and its school_id is backfilled below
    let admin_id = sqlx::query(
        r#"INSERT INTO users (name, email, password, role_id, school_id) VALUES (?, ?, ?, ?, NULL)"#,
    )
    .bind(admin_name)
    .bind(&admin_email)
    .bind(hashed)
    .bind(Role::Admin.id())
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to create school admin");
        ErrorInternalServerError("Internal Server Error")
    })?
    .last_insert_id();

    let school_insert = sqlx::query(
        r#"
        INSERT INTO schools (name, address, admin_id, subscription_plan)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(&payload.address)
    .bind(admin_id)
    .bind(plan)
    .execute(&mut *tx)
    .await;

    let school_id = match school_insert {
        Ok(res) => res.last_insert_id(),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::BadRequest().json(json!({
                        "message": "School with this name already exists"
                    })));
                }
            }
            error!(error = %e, "Failed to create school");
            return Err(ErrorInternalServerError("Internal Server Error"));
        }
    };

    sqlx::query("UPDATE users SET school_id = ? WHERE id = ?")
        .bind(school_id)
        .bind(admin_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!(error = %e, admin_id, "Failed to bind admin to school");
            ErrorInternalServerError("Internal Server Error")
        })?;

    tx.commit().await.map_err(|e| {
        error!(error = %e, school_id, "Failed to commit school creation");
        ErrorInternalServerError("Internal Server Error")
    })?;

    email_filter::insert(&admin_email);
    email_cache::mark_taken(&admin_email).await;

    let school = sqlx::query_as::<_, School>(
        r#"
        SELECT id, name, address, admin_id, subscription_plan, created_at
        FROM schools
        WHERE id = ?
        "#,
    )
    .bind(school_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, school_id, "Failed to reload school");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Created().json(json!({
        "message": "School and Admin created successfully",
        "school": school,
        "admin": {
            "id": admin_id,
            "name": admin_name,
            "email": admin_email
        }
    })))
}

/// All schools with their admin resolved.
#[utoipa::path(
    get,
    path = "/api/schools",
    responses(
        (status = 200, description = "School list", body = [SchoolWithAdmin]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Schools"
)]
pub async fn get_schools(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_superadmin()?;

    let schools = sqlx::query_as::<_, SchoolWithAdmin>(
        r#"
        SELECT
            s.id,
            s.name,
            s.address,
            s.admin_id,
            s.subscription_plan,
            u.name AS admin_name,
            u.email AS admin_email,
            s.created_at
        FROM schools s
        LEFT JOIN users u ON u.id = s.admin_id
        ORDER BY s.id
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch schools");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(schools))
}
