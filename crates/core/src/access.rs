//! Who may open a tune in the editor.

use crate::roles::is_admin;
use crate::types::DbId;

/// A tune may be edited by its creator or by any administrator.
pub fn may_edit_tune(user_id: DbId, role: &str, created_by: DbId) -> bool {
    user_id == created_by || is_admin(role)
}
