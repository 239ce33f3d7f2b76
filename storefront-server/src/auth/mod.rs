//! Request identity
//!
//! Authentication itself happens upstream; the auth gateway terminates the
//! session and injects `x-user-id` / `x-user-role` headers on every proxied
//! request. This module only extracts that identity and enforces ownership
//! and role checks inside the order/payment core.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use shared::{AppError, AppResult};

/// Identity of the acting user, taken from upstream-injected headers
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// Opaque user id
    pub id: String,
    /// True when the upstream role header is `admin`
    pub is_admin: bool,
}

impl CurrentUser {
    /// Fail with `AdminRequired` unless the user is an admin
    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::admin_required())
        }
    }

    /// Fail with `PermissionDenied` unless the user owns the resource
    /// (admins may act on any user's resources)
    pub fn require_owner(&self, owner_id: &str) -> AppResult<()> {
        if self.id == owner_id || self.is_admin {
            Ok(())
        } else {
            Err(AppError::forbidden("Not the owner of this resource"))
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or_else(AppError::not_authenticated)?
            .to_string();

        let is_admin = parts
            .headers
            .get("x-user-role")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.eq_ignore_ascii_case("admin"))
            .unwrap_or(false);

        Ok(CurrentUser { id, is_admin })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_admin() {
        let user = CurrentUser {
            id: "u1".into(),
            is_admin: false,
        };
        assert!(user.require_admin().is_err());

        let admin = CurrentUser {
            id: "u2".into(),
            is_admin: true,
        };
        assert!(admin.require_admin().is_ok());
    }

    #[test]
    fn test_require_owner() {
        let user = CurrentUser {
            id: "u1".into(),
            is_admin: false,
        };
        assert!(user.require_owner("u1").is_ok());
        assert!(user.require_owner("u2").is_err());

        let admin = CurrentUser {
            id: "a1".into(),
            is_admin: true,
        };
        assert!(admin.require_owner("u2").is_ok());
    }
}
