use tracing::warn;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::user::Role;

/// Whether `user` holds one of the `required` roles.
pub fn allow(user: &CurrentUser, required: &[Role]) -> bool {
    required.contains(&user.role)
}

/// Rejects with [`AppError::Forbidden`] unless `user` holds one of `required`.
/// Must run before any store access of the guarded operation.
pub fn require_role(user: &CurrentUser, required: &[Role]) -> Result<(), AppError> {
    if allow(user, required) {
        return Ok(());
    }
    warn!(
        user_id = %user.id,
        role = %user.role,
        "rejected: operation requires one of {:?}",
        required
    );
    Err(AppError::Forbidden)
}
