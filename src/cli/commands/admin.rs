use std::sync::Arc;

use anyhow::bail;
use clap::Args;
use serde_json::json;

use crate::cli::{utils::output_success, OutputFormat};
use crate::config::config;
use crate::models::AdminInput;
use crate::services::{AdminService, ServiceError};
use crate::store::PgStore;

#[derive(Args, Debug)]
pub struct CreateAdminArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub password: String,

    #[arg(long, default_value = "super_admin")]
    pub role: String,

    #[arg(long, help = "Permission to grant (repeatable)")]
    pub permission: Vec<String>,
}

pub async fn handle(args: CreateAdminArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config();
    let database = super::connect_and_migrate(config).await?;
    let service = AdminService::new(Arc::new(PgStore::new(&database)), config.security.bcrypt_cost);

    let result = service.create(args.into_input()).await;
    database.close().await;

    let admin = match result {
        Ok(admin) => admin,
        Err(ServiceError::Invalid(invalid)) => bail!("{}: {}", invalid.message, invalid.errors.join("; ")),
        Err(e) => return Err(e.into()),
    };

    output_success(
        &output_format,
        &format!("Created {} {} <{}>", admin.role, admin.name, admin.email),
        Some(json!({ "admin": admin.view() })),
    )
}

impl CreateAdminArgs {
    fn into_input(self) -> AdminInput {
        AdminInput {
            name: Some(self.name),
            email: Some(self.email),
            password: Some(self.password),
            role: Some(self.role),
            permissions: Some(self.permission),
            ..Default::default()
        }
    }
}
