use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use super::catalog_service::parse_id;
use super::ServiceError;
use crate::auth;
use crate::filter::FilterData;
use crate::models::admin::normalize_email;
use crate::models::{Admin, AdminInput, AdminStatus};
use crate::store::{AdminStore, StoreError};

const ADMIN_NOT_FOUND: &str = "Admin not found";
const DUPLICATE_EMAIL: &str = "Admin with this email already exists";
const BAD_CREDENTIALS: &str = "Invalid email or password";

/// Admin directory: CRUD with credential hashing, plus login verification
pub struct AdminService {
    admins: Arc<dyn AdminStore>,
    bcrypt_cost: u32,
}

impl AdminService {
    pub fn new(admins: Arc<dyn AdminStore>, bcrypt_cost: u32) -> Self {
        Self { admins, bcrypt_cost }
    }

    async fn hash(&self, plaintext: String) -> Result<String, ServiceError> {
        let cost = self.bcrypt_cost;
        Ok(tokio::task::spawn_blocking(move || auth::hash_password(&plaintext, cost)).await??)
    }

    pub async fn list(&self) -> Result<Vec<Admin>, ServiceError> {
        let admins = self.admins.find(FilterData::default().ordered(json!(["created_at desc", "id desc"]))).await?;
        info!("Fetched {} admins", admins.len());
        Ok(admins)
    }

    pub async fn get(&self, id: &str) -> Result<Admin, ServiceError> {
        let Some(id) = parse_id(id) else {
            return Err(ServiceError::NotFound(ADMIN_NOT_FOUND));
        };
        self.admins.get(id).await?.ok_or(ServiceError::NotFound(ADMIN_NOT_FOUND))
    }

    pub async fn create(&self, input: AdminInput) -> Result<Admin, ServiceError> {
        let new_admin = input.into_new_admin()?;

        if self.admins.find_by_email(&new_admin.email).await?.is_some() {
            warn!("Rejected admin create: email already registered");
            return Err(ServiceError::Conflict(DUPLICATE_EMAIL.to_string()));
        }

        let password = new_admin.password.clone();
        let admin = new_admin.into_admin(self.hash(password).await?, Utc::now());
        match self.admins.insert(&admin).await {
            Ok(()) => {}
            // Lost a race with a concurrent create for the same email
            Err(StoreError::Duplicate(_)) => return Err(ServiceError::Conflict(DUPLICATE_EMAIL.to_string())),
            Err(e) => return Err(e.into()),
        }

        info!("Admin created: id={} name={} role={}", admin.id, admin.name, admin.role);
        Ok(admin)
    }

    /// Partial update; the stored hash changes only when a new password is supplied
    pub async fn update(&self, id: &str, input: AdminInput) -> Result<Admin, ServiceError> {
        let existing = self.get(id).await?;
        let changes = input.apply_to(&existing, Utc::now())?;
        let mut admin = changes.admin;

        if admin.email != existing.email {
            if let Some(other) = self.admins.find_by_email(&admin.email).await? {
                if other.id != admin.id {
                    return Err(ServiceError::Conflict(DUPLICATE_EMAIL.to_string()));
                }
            }
        }
        if let Some(password) = changes.new_password {
            admin.password_hash = self.hash(password).await?;
        }

        match self.admins.replace(&admin).await {
            Ok(true) => {}
            Ok(false) => return Err(ServiceError::NotFound(ADMIN_NOT_FOUND)),
            Err(StoreError::Duplicate(_)) => return Err(ServiceError::Conflict(DUPLICATE_EMAIL.to_string())),
            Err(e) => return Err(e.into()),
        }

        info!("Admin updated: id={} name={}", admin.id, admin.name);
        Ok(admin)
    }

    pub async fn delete(&self, id: &str) -> Result<Admin, ServiceError> {
        let Some(id) = parse_id(id) else {
            return Err(ServiceError::NotFound(ADMIN_NOT_FOUND));
        };
        let deleted = self.admins.delete(id).await?.ok_or(ServiceError::NotFound(ADMIN_NOT_FOUND))?;

        info!("Admin deleted: id={} name={}", deleted.id, deleted.name);
        Ok(deleted)
    }

    /// Verifies credentials and stamps `last_login`. Unknown email and wrong
    /// password are indistinguishable to the caller.
    pub async fn authenticate(&self, email: Option<&str>, password: Option<&str>) -> Result<Admin, ServiceError> {
        let (Ok(email), Some(password)) = (normalize_email(email), password.filter(|p| !p.is_empty())) else {
            return Err(super::invalid("Email and password are required"));
        };

        let Some(admin) = self.admins.find_by_email(&email).await? else {
            warn!("Login rejected: unknown email");
            return Err(ServiceError::Unauthorized(BAD_CREDENTIALS.to_string()));
        };

        let hash = admin.password_hash.clone();
        let plaintext = password.to_string();
        let verified = tokio::task::spawn_blocking(move || auth::verify_password(&plaintext, &hash)).await??;
        if !verified {
            warn!("Login rejected: bad password for admin {}", admin.id);
            return Err(ServiceError::Unauthorized(BAD_CREDENTIALS.to_string()));
        }
        if admin.status != AdminStatus::Active {
            warn!("Login rejected: admin {} is {}", admin.id, admin.status);
            return Err(ServiceError::Forbidden(format!("Admin account is {}", admin.status)));
        }

        let admin = self.admins.record_login(admin.id, Utc::now()).await?.ok_or(ServiceError::NotFound(ADMIN_NOT_FOUND))?;
        info!("Admin logged in: id={}", admin.id);
        Ok(admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service() -> AdminService {
        AdminService::new(Arc::new(MemoryStore::new()), 4)
    }

    fn input(value: serde_json::Value) -> AdminInput {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn create_hashes_and_rejects_duplicate_email() {
        let svc = service();
        let admin = svc
            .create(input(json!({ "name": "Asha", "email": "Asha@Rio.example", "password": "secret1" })))
            .await
            .unwrap();
        assert_eq!(admin.email, "asha@rio.example");
        assert_ne!(admin.password_hash, "secret1");
        assert!(auth::verify_password("secret1", &admin.password_hash).unwrap());

        let dup = svc.create(input(json!({ "name": "Other", "email": "ASHA@rio.example", "password": "secret2" }))).await;
        assert!(matches!(dup, Err(ServiceError::Conflict(_))));
        assert_eq!(svc.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_without_password_keeps_hash() {
        let svc = service();
        let admin = svc
            .create(input(json!({ "name": "Asha", "email": "asha@rio.example", "password": "secret1" })))
            .await
            .unwrap();

        let updated = svc.update(&admin.id.to_string(), input(json!({ "department": "Sales" }))).await.unwrap();
        assert_eq!(updated.password_hash, admin.password_hash);
        assert!(updated.updated_at >= admin.updated_at);

        let rotated = svc.update(&admin.id.to_string(), input(json!({ "password": "newpass" }))).await.unwrap();
        assert_ne!(rotated.password_hash, admin.password_hash);
        assert!(svc.authenticate(Some("asha@rio.example"), Some("newpass")).await.is_ok());
    }

    #[tokio::test]
    async fn authenticate_checks_password_and_status() {
        let svc = service();
        svc.create(input(json!({ "name": "P", "email": "p@rio.example", "password": "secret1", "status": "pending" })))
            .await
            .unwrap();

        assert!(matches!(
            svc.authenticate(Some("p@rio.example"), Some("wrong!")).await,
            Err(ServiceError::Unauthorized(_))
        ));
        assert!(matches!(
            svc.authenticate(Some("p@rio.example"), Some("secret1")).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            svc.authenticate(Some("nobody@rio.example"), Some("secret1")).await,
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn unknown_and_malformed_ids_are_not_found() {
        let svc = service();
        assert!(matches!(svc.delete("not-a-uuid").await, Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.delete(&uuid::Uuid::new_v4().to_string()).await, Err(ServiceError::NotFound(_))));
    }
}
