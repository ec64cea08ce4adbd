use crate::{
    auth::{jwt::generate_token, password::verify_password},
    config::Config,
    model::{role::Role, user::User},
    models::{LoginReqDto, LoginResponse, UserSummary},
};
use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};

/// Login handler. Unknown usernames are reported distinctly from a wrong
/// password (404 vs 401), which the portal frontend relies on.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing username or password"),
        (status = 404, description = "User not found"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, user),
    fields(username = %user.username)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    if user.username.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty username or password");
        return HttpResponse::BadRequest().json(json!({
            "message": "Please enter all fields"
        }));
    }

    debug!("Fetching user from database");

    let db_user = match sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, password, name, role, department, designation, base_salary
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(&user.username)
    .fetch_optional(pool.get_ref())
    .await
    {
        Ok(Some(u)) => u,
        Ok(None) => {
            info!("User not found");
            return HttpResponse::NotFound().json(json!({
                "message": "User not found"
            }));
        }
        Err(e) => {
            error!(error = %e, "Database error while fetching user");
            return HttpResponse::InternalServerError().json(json!({
                "message": "Server error"
            }));
        }
    };

    debug!(user_id = db_user.id, "Verifying password");

    if verify_password(&user.password, &db_user.password).is_err() {
        info!("Invalid credentials: password mismatch");
        return HttpResponse::Unauthorized().json(json!({
            "message": "Invalid credentials"
        }));
    }

    let role = match Role::from_name(&db_user.role) {
        Some(r) => r,
        None => {
            error!(role = %db_user.role, "Unknown role on user row");
            return HttpResponse::InternalServerError().json(json!({
                "message": "Server error"
            }));
        }
    };

    let token = match generate_token(
        db_user.id,
        db_user.username.clone(),
        role,
        &config.jwt_secret,
        config.token_ttl,
    ) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to sign token");
            return HttpResponse::InternalServerError().json(json!({
                "message": "Server error"
            }));
        }
    };

    info!("Login successful");

    HttpResponse::Ok().json(LoginResponse {
        token,
        user: UserSummary {
            id: db_user.id,
            username: db_user.username,
            name: db_user.name,
            role,
        },
    })
}
