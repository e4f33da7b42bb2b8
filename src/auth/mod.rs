pub mod extractors;
pub mod identity;
pub mod middleware;
pub mod password;
pub mod resolver;
pub mod session;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::UserSummary;

// Re-export necessary items
pub use extractors::{AdminUser, AuthenticatedUser};
pub use identity::Identity;
pub use middleware::AuthMiddleware;
pub use password::PasswordHasher;
pub use resolver::{resolver_for, AuthMode, BearerResolver, Credential, IdentityResolver, SessionResolver};
pub use session::SessionService;
pub use token::{Claims, TokenService};

/// Represents the payload for a user login request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// User's email address. Compared after trimming and lower-casing.
    #[validate(email)]
    pub email: String,
    /// User's password.
    #[validate(length(min = 1, message = "Email and password required"))]
    pub password: String,
}

/// Represents the payload for a new user registration request.
///
/// There is no `role` field: self-registration always yields a plain user,
/// and unknown fields in the body are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name, 1 to 100 characters.
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Email address for the new account. At most 255 characters, the width of
    /// `users.email`.
    #[validate(email, length(max = 255))]
    pub email: String,
    /// Password for the new account. Must be at least 6 characters long.
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Body of a successful registration.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserSummary,
}

/// Body of a successful login. `token` is present only in bearer mode.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub token: Option<String>,
    pub user: UserSummary,
}
