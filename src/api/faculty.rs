use actix_multipart::Multipart;
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::auth::password::hash_password;
use crate::config::Config;
use crate::imports;
use crate::model::user::{FACULTY_PUBLIC_COLUMNS, FacultyPublic};
use crate::utils::upload::collect_multipart;

#[derive(Deserialize, ToSchema)]
pub struct CreateFaculty {
    #[schema(example = "F101")]
    pub username: String,
    #[schema(example = "secret")]
    pub password: String,
    #[schema(example = "A. Ramanathan")]
    pub name: String,
    #[schema(example = "CSE")]
    pub department: String,
    #[schema(example = "Assistant Professor")]
    pub designation: String,
    #[serde(rename = "baseSalary")]
    #[schema(example = 52000.0)]
    pub base_salary: f64,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateFaculty {
    pub username: String,
    /// Absent or empty leaves the stored credential unchanged.
    pub password: Option<String>,
    pub name: String,
    pub department: String,
    pub designation: String,
    #[serde(rename = "baseSalary")]
    pub base_salary: f64,
}

/// Create one faculty record
#[utoipa::path(
    post,
    path = "/api/faculty",
    request_body = CreateFaculty,
    responses(
        (status = 201, description = "Faculty created", body = FacultyPublic),
        (status = 400, description = "Missing field or username already taken"),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Faculty"
)]
pub async fn create_faculty(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateFaculty>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if payload.username.trim().is_empty()
        || payload.password.is_empty()
        || payload.name.trim().is_empty()
        || payload.department.trim().is_empty()
        || payload.designation.trim().is_empty()
    {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Please provide all required fields: name, ID, password, department, designation, and base salary."
        })));
    }
    if payload.base_salary < 0.0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Base salary cannot be negative"
        })));
    }

    let hashed = hash_password(&payload.password);

    let result = sqlx::query(
        r#"
        INSERT INTO users (username, password, name, role, department, designation, base_salary)
        VALUES (?, ?, ?, 'faculty', ?, ?, ?)
        "#,
    )
    .bind(payload.username.trim())
    .bind(hashed)
    .bind(payload.name.trim())
    .bind(&payload.department)
    .bind(&payload.designation)
    .bind(payload.base_salary)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(done) => {
            info!(username = %payload.username, "Faculty created");
            Ok(HttpResponse::Created().json(FacultyPublic {
                id: done.last_insert_id(),
                username: payload.username.trim().to_string(),
                name: payload.name.trim().to_string(),
                department: payload.department.clone(),
                designation: payload.designation.clone(),
                base_salary: payload.base_salary,
            }))
        }
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::BadRequest().json(json!({
                        "message": "Username (Faculty ID) already exists"
                    })));
                }
            }
            error!(error = %e, "Failed to create faculty");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Server Error"
            })))
        }
    }
}

/// List all faculty, public fields only
#[utoipa::path(
    get,
    path = "/api/faculty",
    responses(
        (status = 200, description = "Faculty list", body = [FacultyPublic])
    ),
    tag = "Faculty"
)]
pub async fn list_faculty(pool: web::Data<MySqlPool>) -> actix_web::Result<impl Responder> {
    let sql = format!(
        "SELECT {FACULTY_PUBLIC_COLUMNS} FROM users WHERE role = 'faculty' ORDER BY username"
    );
    let faculty = sqlx::query_as::<_, FacultyPublic>(&sql)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to list faculty");
            actix_web::error::ErrorInternalServerError("Server Error")
        })?;

    Ok(HttpResponse::Ok().json(faculty))
}

/// The authenticated faculty's own record. The credential is never part of
/// this projection.
#[utoipa::path(
    get,
    path = "/api/faculty/me",
    responses(
        (status = 200, description = "Own record", body = FacultyPublic),
        (status = 403, description = "Caller is not a faculty member"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Faculty"
)]
pub async fn get_me(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    if !auth.is_faculty() {
        return Ok(HttpResponse::Forbidden().json(json!({
            "message": "User is not a faculty member"
        })));
    }

    let sql = format!("SELECT {FACULTY_PUBLIC_COLUMNS} FROM users WHERE id = ?");
    let faculty = sqlx::query_as::<_, FacultyPublic>(&sql)
        .bind(auth.user_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, user_id = auth.user_id, "Failed to fetch own record");
            actix_web::error::ErrorInternalServerError("Server Error")
        })?;

    match faculty {
        Some(f) => Ok(HttpResponse::Ok().json(f)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Faculty not found"
        }))),
    }
}

/// Fetch one faculty record (edit-form use)
#[utoipa::path(
    get,
    path = "/api/faculty/{id}",
    params(("id", description = "Faculty ID")),
    responses(
        (status = 200, description = "Faculty record", body = FacultyPublic),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Faculty"
)]
pub async fn get_faculty(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let faculty_id = path.into_inner();

    let sql = format!("SELECT {FACULTY_PUBLIC_COLUMNS} FROM users WHERE id = ? AND role = 'faculty'");
    let faculty = sqlx::query_as::<_, FacultyPublic>(&sql)
        .bind(faculty_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, faculty_id, "Failed to fetch faculty");
            actix_web::error::ErrorInternalServerError("Server Error")
        })?;

    match faculty {
        Some(f) => Ok(HttpResponse::Ok().json(f)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Faculty not found"
        }))),
    }
}

/// Replace a faculty's mutable fields
#[utoipa::path(
    put,
    path = "/api/faculty/{id}",
    params(("id", description = "Faculty ID")),
    request_body = UpdateFaculty,
    responses(
        (status = 200, description = "Faculty updated", body = FacultyPublic),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Faculty"
)]
pub async fn update_faculty(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateFaculty>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let faculty_id = path.into_inner();

    let exists = sqlx::query_scalar::<_, u64>("SELECT id FROM users WHERE id = ?")
        .bind(faculty_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, faculty_id, "Failed to fetch faculty for update");
            actix_web::error::ErrorInternalServerError("Server Error")
        })?;

    if exists.is_none() {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Faculty not found"
        })));
    }

    let password = payload
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(hash_password);

    let result = match password {
        Some(hashed) => {
            sqlx::query(
                r#"
                UPDATE users
                SET username = ?, password = ?, name = ?, department = ?, designation = ?, base_salary = ?
                WHERE id = ?
                "#,
            )
            .bind(&payload.username)
            .bind(hashed)
            .bind(&payload.name)
            .bind(&payload.department)
            .bind(&payload.designation)
            .bind(payload.base_salary)
            .bind(faculty_id)
            .execute(pool.get_ref())
            .await
        }
        None => {
            sqlx::query(
                r#"
                UPDATE users
                SET username = ?, name = ?, department = ?, designation = ?, base_salary = ?
                WHERE id = ?
                "#,
            )
            .bind(&payload.username)
            .bind(&payload.name)
            .bind(&payload.department)
            .bind(&payload.designation)
            .bind(payload.base_salary)
            .bind(faculty_id)
            .execute(pool.get_ref())
            .await
        }
    };

    if let Err(e) = result {
        error!(error = %e, faculty_id, "Failed to update faculty");
        return Ok(HttpResponse::InternalServerError().json(json!({
            "message": "Server Error"
        })));
    }

    Ok(HttpResponse::Ok().json(FacultyPublic {
        id: faculty_id,
        username: payload.username.clone(),
        name: payload.name.clone(),
        department: payload.department.clone(),
        designation: payload.designation.clone(),
        base_salary: payload.base_salary,
    }))
}

/// Delete one faculty record. What happens to the faculty's salary records
/// is a deployment policy: cascade, or keep them and report how many were
/// orphaned.
#[utoipa::path(
    delete,
    path = "/api/faculty/{id}",
    params(("id", description = "Faculty ID")),
    responses(
        (status = 200, description = "Faculty deleted"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Faculty"
)]
pub async fn delete_faculty(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let faculty_id = path.into_inner();

    let salary_count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM salary_records WHERE faculty_id = ?")
            .bind(faculty_id)
            .fetch_one(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, faculty_id, "Failed to count salary records");
                actix_web::error::ErrorInternalServerError("Server Error")
            })?;

    if config.cascade_delete_salaries && salary_count > 0 {
        sqlx::query("DELETE FROM salary_records WHERE faculty_id = ?")
            .bind(faculty_id)
            .execute(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, faculty_id, "Failed to cascade-delete salary records");
                actix_web::error::ErrorInternalServerError("Server Error")
            })?;
    }

    let result = sqlx::query("DELETE FROM users WHERE id = ? AND role = 'faculty'")
        .bind(faculty_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, faculty_id, "Failed to delete faculty");
            actix_web::error::ErrorInternalServerError("Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Faculty not found"
        })));
    }

    info!(faculty_id, salary_count, cascade = config.cascade_delete_salaries, "Faculty deleted");

    let body = if config.cascade_delete_salaries {
        json!({
            "message": "Faculty deleted successfully",
            "deletedSalaryRecords": salary_count
        })
    } else {
        json!({
            "message": "Faculty deleted successfully",
            "orphanedSalaryRecords": salary_count
        })
    };
    Ok(HttpResponse::Ok().json(body))
}

/// Bulk upsert faculty from CSV. Columns: name, username, password,
/// department, designation, baseSalary.
#[utoipa::path(
    post,
    path = "/api/faculty/upload",
    responses(
        (status = 201, description = "CSV processed", body = imports::FacultyImportSummary),
        (status = 400, description = "No file or unreadable CSV")
    ),
    security(("bearer_auth" = [])),
    tag = "Faculty"
)]
pub async fn upload_faculty_csv(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: Multipart,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    // the temp file inside the form is dropped (and deleted) on every path
    // out of this function
    let form = collect_multipart(payload).await?;

    let summary = imports::import_faculty_csv(pool.get_ref(), form.file.path(), true)
        .await
        .map_err(|e| {
            error!(error = %e, "Faculty CSV import failed");
            actix_web::error::ErrorBadRequest("Could not process uploaded CSV")
        })?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Faculty Details CSV processing complete",
        "added": summary.added,
        "updated": summary.updated,
        "failed": summary.failed,
        "errors": summary.errors,
    })))
}
