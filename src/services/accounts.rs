use std::sync::Arc;
use validator::Validate;

use crate::auth::{Identity, LoginRequest, PasswordHasher, RegisterRequest};
use crate::config::AdminSeed;
use crate::error::AppError;
use crate::models::{normalize_email, NewUser, Role, User, UserSummary};
use crate::store::Store;

/// Registration, credential checks and user listing.
pub struct AccountService {
    store: Arc<dyn Store>,
    hasher: PasswordHasher,
    /// Verified against on unknown emails so both failed-login paths pay for bcrypt.
    dummy_hash: Option<String>,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>, hasher: PasswordHasher) -> Self {
        let dummy_hash = match hasher.hash("taskdesk-dummy-password") {
            Ok(hash) => Some(hash),
            Err(e) => {
                log::error!("Failed to prepare dummy password hash: {}", e);
                None
            }
        };
        Self {
            store,
            hasher,
            dummy_hash,
        }
    }

    /// Creates a plain user. Emails are normalized before validation and lookup.
    pub async fn register(&self, mut request: RegisterRequest) -> Result<User, AppError> {
        request.email = normalize_email(&request.email);
        request.name = request.name.trim().to_string();
        request.validate()?;

        if self.store.find_user_by_email(&request.email).await?.is_some() {
            return Err(AppError::Conflict("User already exists".into()));
        }

        let password_hash = self.hasher.hash(&request.password)?;
        let user = self
            .store
            .create_user(NewUser {
                name: request.name,
                email: request.email,
                password_hash,
                role: Role::User,
            })
            .await?;

        log::info!("Registered user {}", user.id);
        Ok(user)
    }

    /// Returns the user whose credentials match. Unknown email and wrong password are
    /// indistinguishable to the caller.
    pub async fn authenticate(&self, mut request: LoginRequest) -> Result<User, AppError> {
        request.email = normalize_email(&request.email);
        request.validate()?;

        let user = match self.store.find_user_by_email(&request.email).await? {
            Some(user) => user,
            None => {
                if let Some(hash) = &self.dummy_hash {
                    let _ = self.hasher.verify(&request.password, hash);
                }
                log::warn!("Login failed: unknown email");
                return Err(AppError::Unauthorized("Invalid credentials".into()));
            }
        };

        if !self.hasher.verify(&request.password, &user.password_hash)? {
            log::warn!("Login failed for user {}: wrong password", user.id);
            return Err(AppError::Unauthorized("Invalid credentials".into()));
        }

        log::info!("User {} logged in", user.id);
        Ok(user)
    }

    /// Admin only.
    pub async fn list_users(&self, identity: &Identity) -> Result<Vec<UserSummary>, AppError> {
        identity.require_admin()?;
        let users = self.store.list_users().await?;
        Ok(users.into_iter().map(UserSummary::from).collect())
    }

    /// Makes sure the configured administrator exists. An existing account with the
    /// seed's email is returned unchanged.
    pub async fn ensure_admin(&self, seed: &AdminSeed) -> Result<User, AppError> {
        let seed = RegisterRequest {
            name: seed.name.trim().to_string(),
            email: normalize_email(&seed.email),
            password: seed.password.clone(),
        };
        if let Some(existing) = self.store.find_user_by_email(&seed.email).await? {
            if existing.role != Role::Admin {
                log::warn!(
                    "Bootstrap admin email belongs to user {} with role '{}'; leaving it unchanged",
                    existing.id,
                    existing.role
                );
            }
            return Ok(existing);
        }

        // Same rules as self-registration.
        seed.validate()?;

        let user = self
            .store
            .create_user(NewUser {
                password_hash: self.hasher.hash(&seed.password)?,
                name: seed.name,
                email: seed.email,
                role: Role::Admin,
            })
            .await?;
        log::info!("Created bootstrap admin {}", user.id);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::MIN_COST;
    use crate::store::MemoryStore;

    fn service() -> AccountService {
        AccountService::new(
            Arc::new(MemoryStore::new()),
            PasswordHasher::new(MIN_COST).unwrap(),
        )
    }

    fn register_request(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Test User".to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[actix_rt::test]
    async fn test_short_passwords_are_rejected() {
        let accounts = service();
        for password in ["", "a", "12345"] {
            assert!(matches!(
                accounts
                    .register(register_request("short@example.com", password))
                    .await,
                Err(AppError::ValidationError(_))
            ));
        }
    }

    #[actix_rt::test]
    async fn test_register_hashes_and_defaults_role() {
        let accounts = service();
        let user = accounts
            .register(register_request("  New@Example.com ", "secret"))
            .await
            .unwrap();

        assert_eq!(user.email, "new@example.com");
        assert_eq!(user.role, Role::User);
        assert_ne!(user.password_hash, "secret");
        assert!(PasswordHasher::new(MIN_COST)
            .unwrap()
            .verify("secret", &user.password_hash)
            .unwrap());
    }

    #[actix_rt::test]
    async fn test_duplicate_email_conflicts_regardless_of_case() {
        let accounts = service();
        accounts
            .register(register_request("dup@example.com", "secret"))
            .await
            .unwrap();
        assert!(matches!(
            accounts
                .register(register_request("DUP@example.com", "secret"))
                .await,
            Err(AppError::Conflict(_))
        ));
    }

    #[actix_rt::test]
    async fn test_authenticate() {
        let accounts = service();
        let registered = accounts
            .register(register_request("login@example.com", "secret"))
            .await
            .unwrap();

        let user = accounts
            .authenticate(LoginRequest {
                email: "Login@Example.com".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(user.id, registered.id);

        for (email, password) in [
            ("login@example.com", "wrong-password"),
            ("nobody@example.com", "secret"),
        ] {
            assert!(matches!(
                accounts
                    .authenticate(LoginRequest {
                        email: email.to_string(),
                        password: password.to_string(),
                    })
                    .await,
                Err(AppError::Unauthorized(_))
            ));
        }
    }

    #[actix_rt::test]
    async fn test_ensure_admin_is_idempotent() {
        let accounts = service();
        let seed = AdminSeed {
            name: "Root".to_string(),
            email: "Root@Example.com".to_string(),
            password: "rootpass".to_string(),
        };
        let first = accounts.ensure_admin(&seed).await.unwrap();
        let second = accounts.ensure_admin(&seed).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.role, Role::Admin);
        assert_eq!(first.email, "root@example.com");
    }

    #[test]
    fn test_dummy_hash_uses_configured_cost() {
        let accounts = service();
        let hash = accounts.dummy_hash.as_deref().unwrap();
        assert!(hash.starts_with("$2b$04$"));
        assert!(!accounts.hasher.verify("secret", hash).unwrap());
    }

    #[actix_rt::test]
    async fn test_ensure_admin_applies_registration_rules() {
        let accounts = service();
        for (email, password) in [
            ("root@example.com", "12345"),
            ("not-an-email", "rootpass"),
        ] {
            let seed = AdminSeed {
                name: "Root".to_string(),
                email: email.to_string(),
                password: password.to_string(),
            };
            assert!(matches!(
                accounts.ensure_admin(&seed).await,
                Err(AppError::ValidationError(_))
            ));
        }
        assert!(accounts.store.list_users().await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn test_list_users_requires_admin() {
        let accounts = service();
        let user = accounts
            .register(register_request("plain@example.com", "secret"))
            .await
            .unwrap();

        assert!(matches!(
            accounts.list_users(&Identity::new(user.id, Role::User)).await,
            Err(AppError::Forbidden(_))
        ));
        let listed = accounts
            .list_users(&Identity::new(999, Role::Admin))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].email, "plain@example.com");
    }
}
