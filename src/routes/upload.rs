use crate::error::ApiError;
use crate::helper::form_helpers::read_video_upload;
use crate::helper::workflow_helpers::{self, UploadTarget};
use crate::middleware::AuthenticatedUser;
use crate::routes::ApiResponse;
use crate::{AppState, DbPool};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use redb::Database;

pub fn config_upload(cfg: &mut web::ServiceConfig) {
    cfg.route("/video", web::post().to(upload_plain))
        .route("/for-editor", web::post().to(upload_for_editor))
        .route("/for-creator", web::post().to(upload_for_creator));
}

enum TargetField {
    None,
    Editor,
    Creator,
}

async fn handle_upload(
    user: AuthenticatedUser,
    db: web::Data<Database>,
    pool: web::Data<DbPool>,
    state: web::Data<AppState>,
    payload: Multipart,
    target_field: TargetField,
) -> Result<HttpResponse, ApiError> {
    let upload = read_video_upload(payload, state.max_upload_bytes).await?;
    let target = match target_field {
        TargetField::None => UploadTarget::Unassigned,
        TargetField::Editor => UploadTarget::ForEditor(upload.uuid_field("editorId")?),
        TargetField::Creator => UploadTarget::ForCreator(upload.uuid_field("creatorId")?),
    };

    let video = workflow_helpers::upload_video(&db, &pool, state.storage.as_ref(), &user, upload, target).await?;
    Ok(HttpResponse::Created().json(ApiResponse::with_message(video, "Video uploaded successfully")))
}

async fn upload_plain(
    user: AuthenticatedUser,
    db: web::Data<Database>,
    pool: web::Data<DbPool>,
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    handle_upload(user, db, pool, state, payload, TargetField::None).await
}

async fn upload_for_editor(
    user: AuthenticatedUser,
    db: web::Data<Database>,
    pool: web::Data<DbPool>,
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    handle_upload(user, db, pool, state, payload, TargetField::Editor).await
}

async fn upload_for_creator(
    user: AuthenticatedUser,
    db: web::Data<Database>,
    pool: web::Data<DbPool>,
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    handle_upload(user, db, pool, state, payload, TargetField::Creator).await
}
