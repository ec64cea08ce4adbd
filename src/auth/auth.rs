use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::model::role::Role;
use actix_web::{FromRequest, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data};
use futures::future::{Ready, ready};

pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "Config missing",
                )));
            }
        };

        let claims = match verify_token(token, &config.jwt_secret) {
            Ok(c) => c,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        ready(Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            role: claims.role,
        }))
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Admin only"))
        }
    }

    /// Admins may act on anyone; everyone else only on themselves.
    pub fn require_self_or_admin(&self, username: &str) -> actix_web::Result<()> {
        if self.role == Role::Admin || self.username == username {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden(
                "Access denied. You can only view your own payslips.",
            ))
        }
    }

    pub fn is_faculty(&self) -> bool {
        self.role == Role::Faculty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::generate_token;
    use actix_web::test::TestRequest;

    fn test_config() -> Config {
        Config {
            database_url: String::new(),
            jwt_secret: "test-secret".into(),
            server_addr: String::new(),
            token_ttl: 3600,
            rate_login_per_min: 60,
            rate_upload_per_min: 30,
            rate_protected_per_min: 1000,
            api_prefix: "/api".into(),
            banner_path: String::new(),
            cascade_delete_salaries: false,
        }
    }

    #[actix_web::test]
    async fn extractor_accepts_a_valid_bearer_token() {
        let token = generate_token(7, "F101".into(), Role::Faculty, "test-secret", 3600)
            .expect("token");
        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {token}")))
            .app_data(Data::new(test_config()))
            .to_http_request();

        let user = AuthUser::from_request(&req, &mut Payload::None)
            .await
            .expect("extracted user");
        assert_eq!(user.user_id, 7);
        assert_eq!(user.username, "F101");
        assert!(user.is_faculty());
        assert!(user.require_admin().is_err());
        assert!(user.require_self_or_admin("F101").is_ok());
        assert!(user.require_self_or_admin("F102").is_err());
    }

    #[actix_web::test]
    async fn extractor_rejects_missing_and_garbage_tokens() {
        let no_header = TestRequest::default()
            .app_data(Data::new(test_config()))
            .to_http_request();
        assert!(
            AuthUser::from_request(&no_header, &mut Payload::None)
                .await
                .is_err()
        );

        let garbage = TestRequest::default()
            .insert_header(("Authorization", "Bearer not-a-token"))
            .app_data(Data::new(test_config()))
            .to_http_request();
        assert!(
            AuthUser::from_request(&garbage, &mut Payload::None)
                .await
                .is_err()
        );
    }
}
