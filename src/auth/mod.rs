use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::models::{Admin, AdminRole, Permission, PermissionSet};

/// Signed claim set carried by admin bearer tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: AdminRole,
    pub permissions: PermissionSet,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(admin: &Admin, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(i64::try_from(expiry_hours).unwrap_or(i64::MAX / 3600))).timestamp();

        Self {
            sub: admin.id,
            email: admin.email.clone(),
            role: admin.role,
            permissions: PermissionSet::for_admin(admin),
            exp,
            iat: now.timestamp(),
        }
    }

    pub fn allows(&self, permission: Permission) -> bool {
        self.permissions.allows(permission)
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// Issued token plus its lifetime in seconds
pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64,
}

pub fn generate_jwt(admin: &Admin, security: &SecurityConfig) -> Result<IssuedToken, AuthError> {
    if security.jwt_secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let claims = Claims::new(admin, security.jwt_expiry_hours);
    let expires_in = claims.exp - claims.iat;
    let encoding_key = EncodingKey::from_secret(security.jwt_secret.as_bytes());

    let token =
        encode(&Header::default(), &claims, &encoding_key).map_err(|e| AuthError::TokenGeneration(e.to_string()))?;
    Ok(IssuedToken { token, expires_in })
}

pub fn validate_jwt(token: &str, security: &SecurityConfig) -> Result<Claims, AuthError> {
    if security.jwt_secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let decoding_key = DecodingKey::from_secret(security.jwt_secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
    Ok(token_data.claims)
}

/// bcrypt with a fresh salt per call
pub fn hash_password(plaintext: &str, cost: u32) -> Result<String, AuthError> {
    Ok(bcrypt::hash(plaintext, cost)?)
}

pub fn verify_password(plaintext: &str, hash: &str) -> Result<bool, AuthError> {
    Ok(bcrypt::verify(plaintext, hash)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::models::AdminStatus;
    use std::collections::BTreeSet;

    fn admin(role: AdminRole) -> Admin {
        let now = Utc::now();
        Admin {
            id: Uuid::new_v4(),
            name: "Nadia".to_string(),
            email: "nadia@rio.example".to_string(),
            password_hash: String::new(),
            phone: None,
            role,
            status: AdminStatus::Active,
            department: None,
            permissions: BTreeSet::from([Permission::ViewProducts, Permission::EditProducts]),
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn token_round_trips_claims() {
        let security = AppConfig::development().security;
        let issued = generate_jwt(&admin(AdminRole::Admin), &security).unwrap();
        assert_eq!(issued.expires_in, 7 * 24 * 3600);

        let claims = validate_jwt(&issued.token, &security).unwrap();
        assert_eq!(claims.email, "nadia@rio.example");
        assert!(claims.allows(Permission::EditProducts));
        assert!(!claims.allows(Permission::DeleteAdmins));
    }

    #[test]
    fn super_admin_role_grants_everything() {
        let security = AppConfig::development().security;
        let issued = generate_jwt(&admin(AdminRole::SuperAdmin), &security).unwrap();
        let claims = validate_jwt(&issued.token, &security).unwrap();
        assert!(claims.allows(Permission::DeleteAdmins));
    }

    #[test]
    fn rejects_foreign_signature_and_missing_secret() {
        let security = AppConfig::development().security;
        let issued = generate_jwt(&admin(AdminRole::Admin), &security).unwrap();

        let mut other = security.clone();
        other.jwt_secret = "another-secret".to_string();
        assert!(matches!(validate_jwt(&issued.token, &other), Err(AuthError::InvalidToken(_))));

        other.jwt_secret.clear();
        assert!(matches!(generate_jwt(&admin(AdminRole::Admin), &other), Err(AuthError::MissingSecret)));
    }

    #[test]
    fn password_hashes_are_salted() {
        let a = hash_password("secret1", 4).unwrap();
        let b = hash_password("secret1", 4).unwrap();
        assert_ne!(a, b);
        assert!(verify_password("secret1", &a).unwrap());
        assert!(!verify_password("secret2", &a).unwrap());
    }
}
