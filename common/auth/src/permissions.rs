use crate::claims::TokenPayload;
use crate::error::{AuthError, AuthResult};

pub const PERM_GET_DRINKS_DETAIL: &str = "get:drinks-detail";
pub const PERM_POST_DRINKS: &str = "post:drinks";
pub const PERM_PATCH_DRINKS: &str = "patch:drinks";
pub const PERM_DELETE_DRINKS: &str = "delete:drinks";

/// Confirms the verified payload grants `required`.
///
/// The claim must exist even when `required` is empty, so a token without
/// permissions is always a 400 and never reaches the 403 branch.
pub fn check_permission(required: &str, payload: &TokenPayload) -> AuthResult<()> {
    let granted = payload.permissions().ok_or(AuthError::MissingPermissions)?;

    if required.is_empty() || granted.iter().any(|value| *value == required) {
        Ok(())
    } else {
        Err(AuthError::InsufficientPermission(required.to_string()))
    }
}
