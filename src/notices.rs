use chrono::Utc;
use uuid::Uuid;

use crate::{
    auth::Session,
    error::{AppError, AppResult, ValidationError},
    models::{
        MAX_LABEL_LEN, MAX_TITLE_LEN, Notice, NoticeFields, NoticeRequest, Priority,
        check_length, normalize_label,
    },
    policy,
    repository::RepositoryState,
};

/// Validates a create/edit payload into the fields stored on a notice.
///
/// Title and content are mandatory, and text fields must fit their columns. Absent or blank category and department
/// become `None`, and an absent priority becomes `Normal`, so an edit overwrites
/// every field.
pub fn notice_fields(req: NoticeRequest) -> Result<NoticeFields, ValidationError> {
    let title = req.title.trim().to_string();
    let content = req.content.trim().to_string();

    if title.is_empty() {
        return Err(ValidationError::MissingField("Title"));
    }
    if content.is_empty() {
        return Err(ValidationError::MissingField("Content"));
    }
    check_length("Title", &title, MAX_TITLE_LEN)?;

    let category = normalize_label(req.category);
    let department = normalize_label(req.department);
    for (field, label) in [("Category", &category), ("Department", &department)] {
        if let Some(label) = label {
            check_length(field, label, MAX_LABEL_LEN)?;
        }
    }

    Ok(NoticeFields {
        title,
        content,
        category,
        department,
        priority: Priority::from_input(req.priority.as_deref())?,
    })
}

/// Notice list of the authenticated home page.
pub async fn list_visible(repo: &RepositoryState, viewer: &Session) -> AppResult<Vec<Notice>> {
    let active = repo.list_active_notices().await?;
    Ok(policy::visible_notices(viewer, active))
}

/// Anonymous listing.
pub async fn list_public(repo: &RepositoryState) -> AppResult<Vec<Notice>> {
    let active = repo.list_active_notices().await?;
    Ok(policy::public_notices(active))
}

pub async fn list_owned(repo: &RepositoryState, viewer: &Session) -> AppResult<Vec<Notice>> {
    Ok(repo.list_notices_by_owner(viewer.user_id).await?)
}

/// Looks up an active notice. Absent and inactive notices are both `NotFound`.
pub async fn get_active(repo: &RepositoryState, id: Uuid) -> AppResult<Notice> {
    repo.get_notice(id)
        .await?
        .filter(|notice| notice.is_active)
        .ok_or_else(|| AppError::notice_not_found(id))
}

pub async fn create(
    repo: &RepositoryState,
    author: &Session,
    req: NoticeRequest,
) -> AppResult<Notice> {
    if let Err(denied) = policy::authorize_create(author) {
        tracing::warn!(user_id = %author.user_id, role = %author.role, "notice creation denied");
        return Err(denied.into());
    }

    let fields = notice_fields(req)?;
    let notice = repo.insert_notice(fields, author.user_id, Utc::now()).await?;

    tracing::info!(notice_id = %notice.id, user_id = %author.user_id, "notice created");
    Ok(notice)
}

/// Replaces every content field of a notice owned by `editor` (or any notice
/// when `editor` is an admin).
pub async fn update(
    repo: &RepositoryState,
    editor: &Session,
    id: Uuid,
    req: NoticeRequest,
) -> AppResult<Notice> {
    let existing = repo
        .get_notice(id)
        .await?
        .ok_or_else(|| AppError::notice_not_found(id))?;

    authorize(editor, &existing)?;

    let fields = notice_fields(req)?;
    let updated = repo
        .update_notice(id, fields, Utc::now())
        .await?
        // Deleted between the lookup and the write.
        .ok_or_else(|| AppError::notice_not_found(id))?;

    tracing::info!(notice_id = %id, user_id = %editor.user_id, "notice updated");
    Ok(updated)
}

/// Hard delete, under the same rule as `update`.
pub async fn delete(repo: &RepositoryState, editor: &Session, id: Uuid) -> AppResult<()> {
    let existing = repo
        .get_notice(id)
        .await?
        .ok_or_else(|| AppError::notice_not_found(id))?;

    authorize(editor, &existing)?;

    if !repo.delete_notice(id).await? {
        return Err(AppError::notice_not_found(id));
    }

    tracing::info!(notice_id = %id, user_id = %editor.user_id, "notice deleted");
    Ok(())
}

fn authorize(editor: &Session, notice: &Notice) -> AppResult<()> {
    policy::authorize_mutation(editor, notice).map_err(|denied| {
        tracing::warn!(notice_id = %notice.id, user_id = %editor.user_id, "notice mutation denied");
        AppError::from(denied)
    })
}
