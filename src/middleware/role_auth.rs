use crate::error::ApiError;
use crate::middleware::auth::Claims;
use crate::models::user::UserRole;

/// Single declarative role check used by every role-restricted handler.
/// Admin is NOT implied — "restrict to user" really means only users
/// (e.g. admins cannot write reviews).
pub fn require_role(claims: &Claims, allowed: &[UserRole]) -> Result<(), ApiError> {
    if allowed.contains(&claims.role) {
        return Ok(());
    }
    log::debug!("Role check failed: {:?} not in {:?}", claims.role, allowed);
    Err(ApiError::Forbidden(
        "You do not have permission to perform this action".to_string(),
    ))
}
