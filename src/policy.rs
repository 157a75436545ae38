//! Notice visibility and ownership rules.
//!
//! Every entry point that lists, creates or mutates notices goes through these
//! functions; handlers never inspect roles or owners themselves.

use crate::{
    auth::Session,
    error::AuthorizationError,
    models::{ALL_DEPARTMENTS, Notice},
};

/// Whether `notice` appears in `viewer`'s notice list.
///
/// - inactive notices are never visible,
/// - admins see every active notice,
/// - a viewer with a department sees notices for that department and for "All",
/// - a viewer without a department sees only notices for "All".
pub fn is_visible_to(viewer: &Session, notice: &Notice) -> bool {
    if !notice.is_active {
        return false;
    }
    if viewer.is_admin() {
        return true;
    }

    let target = notice.department.as_deref();
    if target == Some(ALL_DEPARTMENTS) {
        return true;
    }

    match viewer_department(viewer) {
        Some(department) => target == Some(department),
        None => false,
    }
}

/// The notices `viewer` may see, most recent first.
pub fn visible_notices(viewer: &Session, notices: Vec<Notice>) -> Vec<Notice> {
    let mut visible: Vec<Notice> = notices
        .into_iter()
        .filter(|notice| is_visible_to(viewer, notice))
        .collect();
    sort_newest_first(&mut visible);
    visible
}

/// The anonymous listing: every active notice regardless of department.
pub fn public_notices(notices: Vec<Notice>) -> Vec<Notice> {
    let mut visible: Vec<Notice> = notices.into_iter().filter(|n| n.is_active).collect();
    sort_newest_first(&mut visible);
    visible
}

/// Only admins and teachers may publish notices.
pub fn authorize_create(viewer: &Session) -> Result<(), AuthorizationError> {
    if viewer.role.is_staff() {
        Ok(())
    } else {
        Err(AuthorizationError::CreateRequiresStaff)
    }
}

/// Edit and delete share one rule: the owner or any admin.
pub fn authorize_mutation(viewer: &Session, notice: &Notice) -> Result<(), AuthorizationError> {
    if viewer.user_id == notice.user_id || viewer.is_admin() {
        Ok(())
    } else {
        Err(AuthorizationError::NotOwnerOrAdmin)
    }
}

// Blank departments count as none.
fn viewer_department(viewer: &Session) -> Option<&str> {
    viewer
        .department
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
}

// Stable, so equal timestamps keep the store's order.
fn sort_newest_first(notices: &mut [Notice]) {
    notices.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
