use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{trimmed, Invalid};

/// Minimum plaintext password length accepted before hashing
pub const MIN_PASSWORD_LEN: usize = 6;

/// Permission entry that grants every capability
pub const SUPERUSER_SENTINEL: &str = "super_admin";

closed_enum! {
    pub enum AdminRole {
        Admin => "admin",
        SuperAdmin => "super_admin",
        Moderator => "moderator",
    }
}

closed_enum! {
    pub enum AdminStatus {
        Active => "active",
        Inactive => "inactive",
        Pending => "pending",
    }
}

closed_enum! {
    pub enum Permission {
        ViewProducts => "view_products",
        AddProducts => "add_products",
        EditProducts => "edit_products",
        DeleteProducts => "delete_products",
        ViewAdmins => "view_admins",
        AddAdmins => "add_admins",
        EditAdmins => "edit_admins",
        DeleteAdmins => "delete_admins",
        ViewOrders => "view_orders",
        ManageOrders => "manage_orders",
    }
}

/// Effective capabilities of a caller: explicit permissions plus the
/// superuser sentinel. Serialized as a flat list of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<String>", from = "Vec<String>")]
pub struct PermissionSet {
    granted: BTreeSet<Permission>,
    superuser: bool,
}

impl PermissionSet {
    pub fn for_admin(admin: &Admin) -> Self {
        Self {
            granted: admin.permissions.clone(),
            superuser: admin.role == AdminRole::SuperAdmin,
        }
    }

    pub fn allows(&self, permission: Permission) -> bool {
        self.superuser || self.granted.contains(&permission)
    }
}

impl From<PermissionSet> for Vec<String> {
    fn from(set: PermissionSet) -> Self {
        let mut out: Vec<String> = set.granted.iter().map(|p| p.as_str().to_string()).collect();
        if set.superuser {
            out.push(SUPERUSER_SENTINEL.to_string());
        }
        out
    }
}

// Unknown entries are dropped rather than rejected
impl From<Vec<String>> for PermissionSet {
    fn from(entries: Vec<String>) -> Self {
        let mut set = PermissionSet::default();
        for entry in entries {
            if entry == SUPERUSER_SENTINEL {
                set.superuser = true;
            } else if let Ok(p) = entry.parse::<Permission>() {
                set.granted.insert(p);
            }
        }
        set
    }
}

/// Admin record as held by the directory. Deliberately not `Serialize`:
/// anything leaving the service goes through `AdminView`.
#[derive(Debug, Clone, PartialEq)]
pub struct Admin {
    pub id: Uuid,
    pub name: String,
    /// Stored lowercased
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub role: AdminRole,
    pub status: AdminStatus,
    pub department: Option<String>,
    pub permissions: BTreeSet<Permission>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Admin {
    pub fn view(&self) -> AdminView {
        AdminView::from(self)
    }
}

/// Public shape of an admin: every attribute except the credential hash.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: AdminRole,
    pub status: AdminStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    pub permissions: Vec<Permission>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Admin> for AdminView {
    fn from(a: &Admin) -> Self {
        Self {
            id: a.id,
            name: a.name.clone(),
            email: a.email.clone(),
            phone: a.phone.clone(),
            role: a.role,
            status: a.status,
            department: a.department.clone(),
            permissions: a.permissions.iter().copied().collect(),
            last_login: a.last_login,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

#[derive(Clone, Default, Deserialize)]
pub struct AdminInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub department: Option<String>,
    pub permissions: Option<Vec<String>>,
}

// Keeps the plaintext password out of logs
impl std::fmt::Debug for AdminInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminInput")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("role", &self.role)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Validated create request, still holding the plaintext password until the
/// service hashes it.
pub struct NewAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub role: AdminRole,
    pub status: AdminStatus,
    pub department: Option<String>,
    pub permissions: BTreeSet<Permission>,
}

impl NewAdmin {
    pub fn into_admin(self, password_hash: String, now: DateTime<Utc>) -> Admin {
        Admin {
            id: Uuid::new_v4(),
            name: self.name,
            email: self.email,
            password_hash,
            phone: self.phone,
            role: self.role,
            status: self.status,
            department: self.department,
            permissions: self.permissions,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Outcome of merging an update request: the new record (hash untouched)
/// and the replacement plaintext password, if one was supplied.
pub struct AdminChanges {
    pub admin: Admin,
    pub new_password: Option<String>,
}

impl AdminInput {
    pub fn into_new_admin(self) -> Result<NewAdmin, Invalid> {
        let mut errors = Vec::new();

        let name = trimmed(self.name.as_deref());
        if name.is_none() {
            errors.push("Name is required".to_string());
        }
        let email = match normalize_email(self.email.as_deref()) {
            Ok(email) => Some(email),
            Err(e) => {
                errors.push(e);
                None
            }
        };
        let password = match self.password {
            Some(p) if p.chars().count() >= MIN_PASSWORD_LEN => Some(p),
            Some(p) if !p.is_empty() => {
                errors.push(password_too_short());
                None
            }
            _ => {
                errors.push("Password is required".to_string());
                None
            }
        };

        let role = parse_or(self.role.as_deref(), AdminRole::Admin, &mut errors);
        let status = parse_or(self.status.as_deref(), AdminStatus::Active, &mut errors);
        let permissions = parse_permissions(self.permissions.unwrap_or_default(), &mut errors);

        let (Some(name), Some(email), Some(password), true) = (name, email, password, errors.is_empty()) else {
            return Err(Invalid::fields(errors));
        };

        Ok(NewAdmin {
            name,
            email,
            password,
            phone: trimmed(self.phone.as_deref()),
            role,
            status,
            department: trimmed(self.department.as_deref()),
            permissions,
        })
    }

    /// Merges the supplied fields over `existing`; `updated_at` always moves
    /// to `now`. An absent or empty password leaves the stored hash alone.
    pub fn apply_to(self, existing: &Admin, now: DateTime<Utc>) -> Result<AdminChanges, Invalid> {
        let mut next = existing.clone();
        let mut errors = Vec::new();

        if let Some(name) = self.name.as_deref() {
            match trimmed(Some(name)) {
                Some(name) => next.name = name,
                None => errors.push("Name cannot be empty".to_string()),
            }
        }
        if self.email.is_some() {
            match normalize_email(self.email.as_deref()) {
                Ok(email) => next.email = email,
                Err(e) => errors.push(e),
            }
        }
        if let Some(phone) = self.phone.as_deref() {
            next.phone = trimmed(Some(phone));
        }
        if let Some(department) = self.department.as_deref() {
            next.department = trimmed(Some(department));
        }
        next.role = parse_or(self.role.as_deref(), existing.role, &mut errors);
        next.status = parse_or(self.status.as_deref(), existing.status, &mut errors);
        if let Some(permissions) = self.permissions {
            next.permissions = parse_permissions(permissions, &mut errors);
        }

        let new_password = match self.password {
            Some(p) if p.is_empty() => None,
            Some(p) if p.chars().count() < MIN_PASSWORD_LEN => {
                errors.push(password_too_short());
                None
            }
            other => other,
        };

        if !errors.is_empty() {
            return Err(Invalid::fields(errors));
        }
        next.updated_at = now;

        Ok(AdminChanges { admin: next, new_password })
    }
}

fn password_too_short() -> String {
    format!("Password must be at least {} characters", MIN_PASSWORD_LEN)
}

pub fn normalize_email(raw: Option<&str>) -> Result<String, String> {
    let Some(email) = trimmed(raw) else {
        return Err("Email is required".to_string());
    };
    let email = email.to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !email.contains(char::is_whitespace) => {
            Ok(email)
        }
        _ => Err(format!("'{}' is not a valid email address", email)),
    }
}

fn parse_or<T: std::str::FromStr<Err = String>>(raw: Option<&str>, default: T, errors: &mut Vec<String>) -> T {
    match trimmed(raw) {
        Some(raw) => raw.parse().unwrap_or_else(|e| {
            errors.push(e);
            default
        }),
        None => default,
    }
}

fn parse_permissions(entries: Vec<String>, errors: &mut Vec<String>) -> BTreeSet<Permission> {
    entries
        .iter()
        .filter_map(|entry| entry.trim().parse::<Permission>().map_err(|e| errors.push(e)).ok())
        .collect()
}

/// Storage-side shape of an admin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AdminRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub role: String,
    pub status: String,
    pub department: Option<String>,
    pub permissions: Vec<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Admin> for AdminRow {
    fn from(a: &Admin) -> Self {
        Self {
            id: a.id,
            name: a.name.clone(),
            email: a.email.clone(),
            password: a.password_hash.clone(),
            phone: a.phone.clone(),
            role: a.role.as_str().to_string(),
            status: a.status.as_str().to_string(),
            department: a.department.clone(),
            permissions: a.permissions.iter().map(|p| p.as_str().to_string()).collect(),
            last_login: a.last_login,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

impl TryFrom<AdminRow> for Admin {
    type Error = String;

    fn try_from(row: AdminRow) -> Result<Self, Self::Error> {
        let permissions = row
            .permissions
            .iter()
            .map(|p| p.parse::<Permission>())
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(Self {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password,
            phone: row.phone,
            role: row.role.parse()?,
            status: row.status.parse()?,
            department: row.department,
            permissions,
            last_login: row.last_login,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
