use std::time::{SystemTime, UNIX_EPOCH};

use crate::model::role::Role;
use crate::models::Claims;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0) as usize
}

pub fn generate_token(
    user_id: u64,
    username: String,
    role: Role,
    secret: &str,
    ttl: usize,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        user_id,
        sub: username,
        role,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_round_trips() {
        let token = generate_token(7, "F101".into(), Role::Faculty, "test-secret", 3600)
            .expect("token");
        let claims = verify_token(&token, "test-secret").expect("claims");
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.sub, "F101");
        assert_eq!(claims.role, Role::Faculty);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token =
            generate_token(7, "F101".into(), Role::Admin, "test-secret", 3600).expect("token");
        assert!(verify_token(&token, "other-secret").is_err());
    }
}
