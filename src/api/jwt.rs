use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::warn;

static JWT_SERVICE: OnceLock<JwtService> = OnceLock::new();

/// Process-wide JwtService, built from config on first use
pub fn get_jwt_service() -> &'static JwtService {
    JWT_SERVICE.get_or_init(JwtService::from_config)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub token_type: String,
}

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_minutes: u64,
}

fn random_secret(len: usize) -> String {
    const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    std::iter::repeat_with(|| CHARS[rand::random_range(0..CHARS.len())] as char)
        .take(len)
        .collect()
}

impl JwtService {
    pub fn new(secret: &str, access_token_minutes: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_minutes,
        }
    }

    pub fn from_config() -> Self {
        let config = crate::config::get_config();

        // 未配置 secret 时随机生成，重启后旧 token 失效
        let secret = if config.api.jwt_secret.is_empty() {
            warn!("JWT secret not configured, generating a random one");
            random_secret(48)
        } else {
            config.api.jwt_secret.clone()
        };

        Self::new(&secret, config.api.access_token_minutes)
    }

    pub fn access_token_minutes(&self) -> u64 {
        self.access_token_minutes
    }

    pub fn generate_access_token(&self) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: "admin".to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(self.access_token_minutes as i64)).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
            token_type: "access".to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
    }

    pub fn validate_access_token(
        &self,
        token: &str,
    ) -> Result<AccessClaims, jsonwebtoken::errors::Error> {
        let token_data = decode::<AccessClaims>(token, &self.decoding_key, &Validation::default())?;

        if token_data.claims.token_type != "access" {
            return Err(jsonwebtoken::errors::Error::from(
                jsonwebtoken::errors::ErrorKind::InvalidToken,
            ));
        }

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "mflix_test_secret_key_32_bytes!!";

    #[test]
    fn test_generate_and_validate_access_token() {
        let service = JwtService::new(SECRET, 60);
        let token = service.generate_access_token().unwrap();
        let claims = service.validate_access_token(&token).unwrap();

        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.token_type, "access");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_secret_and_garbage_rejected() {
        let token = JwtService::new(SECRET, 60).generate_access_token().unwrap();
        let other = JwtService::new("another_secret_key_of_32_bytes!!", 60);

        assert!(other.validate_access_token(&token).is_err());
        assert!(other.validate_access_token("invalid.token.here").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: "admin".to_string(),
            iat: (now - Duration::hours(2)).timestamp(),
            exp: (now - Duration::hours(1)).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
            token_type: "access".to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(
            JwtService::new(SECRET, 60)
                .validate_access_token(&token)
                .is_err()
        );
    }

    #[test]
    fn test_wrong_token_type_rejected() {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: "admin".to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
            token_type: "refresh".to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(
            JwtService::new(SECRET, 60)
                .validate_access_token(&token)
                .is_err()
        );
    }
}
