//! The creator/editor handoff: uploads, assignment, approval, publishing and
//! deletion of videos. Every check runs before anything is written, and every
//! record change is a single read-modify-write in the video database.

use crate::error::ApiError;
use crate::helper::directory_helpers::resolve_user_with_role;
use crate::helper::form_helpers::VideoUpload;
use crate::middleware::AuthenticatedUser;
use crate::models::db_operations::{users_db_operations, videos_db_operations};
use crate::models::{Role, Video, VideoAction, VideoStatus};
use crate::publish::{PublishRequest, Publisher, Visibility};
use crate::storage::{ObjectMetadata, ObjectStorage};
use crate::DbPool;
use actix_web::web;
use chrono::Utc;
use redb::Database;
use uuid::Uuid;

pub const PUBLISH_DESCRIPTION: &str = "Uploaded via Creator Dashboard";

/// Who may do what to an existing video.
pub fn can_user_perform_action(video: &Video, user: &AuthenticatedUser, action: VideoAction) -> bool {
    let is_uploader = video.uploaded_by == user.id;
    let is_target = video.uploaded_for == Some(user.id);
    match action {
        VideoAction::Assign => is_uploader,
        VideoAction::Delete | VideoAction::Publish => is_uploader || is_target,
        VideoAction::Approve => is_target && user.role == Role::Creator,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UploadTarget {
    /// Plain upload, assigned later.
    Unassigned,
    /// A creator handing a raw video straight to an editor.
    ForEditor(Uuid),
    /// An editor delivering an edited video back to a creator.
    ForCreator(Uuid),
}

pub struct PublishOptions {
    pub access_token: String,
    pub title: Option<String>,
    pub visibility: Option<Visibility>,
}

fn video_not_found(video_id: &Uuid) -> ApiError {
    ApiError::NotFound(format!("Video {} not found", video_id))
}

fn forbidden(user: &AuthenticatedUser, video: &Video, action: &str) -> ApiError {
    log::warn!("User {} is not allowed to {} video {}.", user.id, action, video.id);
    ApiError::Forbidden(format!("You are not allowed to {} this video.", action))
}

pub async fn upload_video(
    db: &web::Data<Database>,
    pool: &web::Data<DbPool>,
    storage: &dyn ObjectStorage,
    uploader: &AuthenticatedUser,
    upload: VideoUpload,
    target: UploadTarget,
) -> Result<Video, ApiError> {
    {
        let conn = pool.get()?;
        if users_db_operations::read_user_by_id(&conn, uploader.id)?.is_none() {
            return Err(ApiError::Unauthenticated("Account no longer exists.".to_string()));
        }
    }

    // Targets are settled before any bytes leave the server.
    let (uploaded_for, assigned_editors, status) = match target {
        UploadTarget::Unassigned => (None, Vec::new(), VideoStatus::Pending),
        UploadTarget::ForEditor(editor_id) => {
            uploader.require_role(Role::Creator, "upload a video for an editor")?;
            let editor = resolve_user_with_role(pool, editor_id, Role::Editor)?;
            (Some(uploader.id), vec![editor.id], VideoStatus::Pending)
        }
        UploadTarget::ForCreator(creator_id) => {
            uploader.require_role(Role::Editor, "upload a video for a creator")?;
            let creator = resolve_user_with_role(pool, creator_id, Role::Creator)?;
            (Some(creator.id), Vec::new(), VideoStatus::Edited)
        }
    };

    let metadata = ObjectMetadata {
        original_name: upload.original_name.clone(),
        content_type: upload.content_type.clone(),
    };
    let stored = storage.store(upload.bytes, metadata).await?;

    let video = Video {
        id: Uuid::new_v4(),
        url: stored.url,
        provider_ref: stored.provider_ref,
        uploaded_by: uploader.id,
        uploaded_for,
        original_name: upload.original_name,
        status,
        uploaded_at: Utc::now(),
        assigned_editors,
        external_ref: None,
    };

    if let Err(e) = videos_db_operations::insert_video(db, &video) {
        if let Err(cleanup) = storage.delete(&video.provider_ref).await {
            log::error!(
                "Failed to remove stored file {} after a failed insert: {}",
                video.provider_ref,
                cleanup
            );
        }
        return Err(e.into());
    }

    log::info!(
        "User {} uploaded video {} ({:?}, status {}).",
        uploader.id,
        video.id,
        target,
        video.status.as_str()
    );
    Ok(video)
}

/// Adds `editor_id` to the video's editors. Assigning an editor who is already
/// on the list succeeds without changing anything.
pub fn assign_editor(
    db: &web::Data<Database>,
    pool: &web::Data<DbPool>,
    caller: &AuthenticatedUser,
    video_id: Uuid,
    editor_id: Uuid,
) -> Result<Video, ApiError> {
    let editor = resolve_user_with_role(pool, editor_id, Role::Editor)?;

    let video = videos_db_operations::modify_video(db, &video_id, |video| {
        if !can_user_perform_action(video, caller, VideoAction::Assign) {
            return Err(forbidden(caller, video, "assign editors to"));
        }
        if !video.assign_editor(editor.id) {
            log::debug!("Editor {} already assigned to video {}.", editor.id, video.id);
        }
        // Only a creator can be the receiving side of the handoff.
        if video.uploaded_for.is_none() && caller.role == Role::Creator {
            video.uploaded_for = Some(video.uploaded_by);
        }
        Ok(())
    })?;

    log::info!("User {} assigned editor {} to video {}.", caller.id, editor.id, video.id);
    Ok(video)
}

/// Removes the stored file first and the record second. If the file cannot be
/// removed the record stays, so the caller can retry.
pub async fn delete_video(
    db: &web::Data<Database>,
    storage: &dyn ObjectStorage,
    caller: &AuthenticatedUser,
    video_id: Uuid,
) -> Result<(), ApiError> {
    let video = videos_db_operations::read_video(db, &video_id)?.ok_or_else(|| video_not_found(&video_id))?;
    if !can_user_perform_action(&video, caller, VideoAction::Delete) {
        return Err(forbidden(caller, &video, "delete"));
    }

    storage.delete(&video.provider_ref).await?;

    match videos_db_operations::delete_video(db, &video_id) {
        Ok(_) => {
            log::info!("User {} deleted video {}.", caller.id, video_id);
            Ok(())
        }
        Err(e) => {
            log::error!(
                "Stored file {} for video {} was removed but the record could not be: {}",
                video.provider_ref,
                video_id,
                e
            );
            Err(e.into())
        }
    }
}

pub fn approve_video(db: &web::Data<Database>, caller: &AuthenticatedUser, video_id: Uuid) -> Result<Video, ApiError> {
    let video = videos_db_operations::modify_video(db, &video_id, |video| {
        if !can_user_perform_action(video, caller, VideoAction::Approve) {
            return Err(forbidden(caller, video, "approve"));
        }
        if video.status != VideoStatus::Edited {
            return Err(ApiError::Conflict(format!(
                "Only edited videos can be approved; this one is {}.",
                video.status.as_str()
            )));
        }
        video.status = VideoStatus::Approved;
        Ok(())
    })?;

    log::info!("User {} approved video {}.", caller.id, video.id);
    Ok(video)
}

/// Sends the stored file to the publishing platform and records the id it
/// hands back. The access token is used for this call only.
pub async fn publish_video(
    db: &web::Data<Database>,
    storage: &dyn ObjectStorage,
    publisher: &dyn Publisher,
    caller: &AuthenticatedUser,
    video_id: Uuid,
    options: PublishOptions,
) -> Result<Video, ApiError> {
    if options.access_token.trim().is_empty() {
        return Err(ApiError::InvalidInput("accessToken is required.".to_string()));
    }

    let video = videos_db_operations::read_video(db, &video_id)?.ok_or_else(|| video_not_found(&video_id))?;
    if !can_user_perform_action(&video, caller, VideoAction::Publish) {
        return Err(forbidden(caller, &video, "publish"));
    }
    if let Some(existing) = &video.external_ref {
        return Err(ApiError::Conflict(format!("Video is already published as {}.", existing)));
    }

    let bytes = storage.fetch(&video.provider_ref).await?;
    let title = options
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| video.original_name.clone());

    let external_id = publisher
        .publish(PublishRequest {
            bytes,
            title,
            description: PUBLISH_DESCRIPTION.to_string(),
            visibility: options.visibility.unwrap_or_default(),
            access_token: options.access_token,
        })
        .await?;

    let updated = videos_db_operations::modify_video(db, &video_id, |current| {
        if let Some(existing) = &current.external_ref {
            log::warn!("Video {} was published concurrently as {}; keeping {}.", video_id, external_id, existing);
            return Err(ApiError::Conflict(format!("Video is already published as {}.", existing)));
        }
        current.external_ref = Some(external_id.clone());
        Ok(())
    })
    .map_err(|e| {
        if !matches!(e, ApiError::Conflict(_)) {
            log::error!("Video {} was published as {} but the record could not be updated: {}", video_id, external_id, e);
        }
        e
    })?;

    log::info!("User {} published video {} as {}.", caller.id, video_id, external_id);
    Ok(updated)
}
