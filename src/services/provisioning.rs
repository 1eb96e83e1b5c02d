use crate::{
    auth::hash_password,
    errors::{AppError, AppResult},
    models::domain::User,
    repositories::UserRepository,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    Created(String),
    AlreadyPresent(String),
}

/// Creates the administrator account unless one with that email exists.
/// An existing non-admin account with the email is left alone and reported.
pub async fn ensure_admin(
    users: &dyn UserRepository,
    email: &str,
    password: &str,
) -> AppResult<ProvisionOutcome> {
    if let Some(existing) = users.find_by_email(email).await? {
        if !existing.is_admin() {
            return Err(AppError::AlreadyExists(format!(
                "'{}' belongs to a regular user account",
                existing.email
            )));
        }
        log::info!("Admin {} already provisioned", existing.email);
        return Ok(ProvisionOutcome::AlreadyPresent(existing.id));
    }

    if password.len() < 6 {
        return Err(AppError::ValidationError(
            "Admin password must be at least 6 characters".to_string(),
        ));
    }

    let admin = users
        .create(User::new_admin(email, hash_password(password)?))
        .await?;
    log::info!("Provisioned admin {}", admin.email);
    Ok(ProvisionOutcome::Created(admin.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::domain::UserRole, test_utils::memory::MemoryStore};

    #[tokio::test]
    async fn test_provisioning_is_idempotent() {
        let store = MemoryStore::default();

        let first = ensure_admin(&store, "admin@example.com", "s3cret!").await.unwrap();
        let second = ensure_admin(&store, "Admin@Example.com", "s3cret!").await.unwrap();

        let ProvisionOutcome::Created(id) = first else {
            panic!("expected a new admin");
        };
        assert_eq!(second, ProvisionOutcome::AlreadyPresent(id));
        assert_eq!(store.count_by_role(UserRole::Admin).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_regular_account_is_not_promoted() {
        let store = MemoryStore::default();
        store.add_user(User::test_user("taken@example.com")).await;

        let err = ensure_admin(&store, "taken@example.com", "s3cret!").await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_short_password_is_rejected() {
        let store = MemoryStore::default();
        let err = ensure_admin(&store, "admin@example.com", "abc").await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
