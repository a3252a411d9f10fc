//! First-run seeding of the administrator account

use anyhow::Result;
use tracing::info;

use crate::{
    config::BootstrapAdmin, models::NewUserRecord, password::hash_password_blocking,
    store::UserStore,
};

/// Create the configured admin when no user exists yet.
///
/// Returns the new user's id, or `None` when nothing was created.
pub async fn seed_admin(
    users: &dyn UserStore,
    admin: Option<&BootstrapAdmin>,
) -> Result<Option<i64>> {
    let Some(admin) = admin else {
        return Ok(None);
    };

    if users.count().await? > 0 {
        return Ok(None);
    }

    let password_hash = hash_password_blocking(admin.password.clone()).await?;
    let id = users
        .create(&NewUserRecord {
            name: admin.name.clone(),
            email: admin.email.clone(),
            phone_number: None,
            password_hash,
            branch_id: None,
            is_active: true,
            is_admin: true,
        })
        .await?;

    info!("Created initial administrator {} (id {})", admin.email, id);
    Ok(Some(id))
}
