use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::Role;

/// The `{userId, role}` pair the gate attaches to every authenticated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: i32,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: i32, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fails with `Forbidden` unless the identity carries the admin role.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            log::warn!("User {} denied an admin-only operation", self.user_id);
            Err(AppError::Forbidden("Forbidden".into()))
        }
    }
}
