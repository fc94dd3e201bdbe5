use crate::error::ApiError;
use crate::helper::workflow_helpers::{self, PublishOptions};
use crate::helper::{directory_helpers, view_helpers};
use crate::middleware::AuthenticatedUser;
use crate::models::Role;
use crate::publish::Visibility;
use crate::routes::ApiResponse;
use crate::{AppState, DbPool};
use actix_web::{web, HttpResponse};
use redb::Database;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignEditorRequest {
    editor_id: Uuid,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishVideoRequest {
    access_token: String,
    title: Option<String>,
    visibility: Option<Visibility>,
}

pub fn config_videos(cfg: &mut web::ServiceConfig) {
    cfg.route("/mine", web::get().to(get_my_uploads))
        .route("/to-edit", web::get().to(get_to_edit))
        .route("/assigned", web::get().to(get_assigned))
        .route("/for-me", web::get().to(get_for_me))
        .route("/editors", web::get().to(get_editors))
        .route("/creators", web::get().to(get_creators))
        .route("/{id}/assign-editor", web::post().to(assign_editor))
        .route("/{id}/approve", web::post().to(approve_video))
        .route("/{id}/publish", web::post().to(publish_video))
        .route("/{id}", web::delete().to(delete_video));
}

// --- Views ---

async fn get_my_uploads(user: AuthenticatedUser, db: web::Data<Database>) -> Result<HttpResponse, ApiError> {
    let videos = view_helpers::fetch_my_uploads(&db, user.id)?;
    Ok(HttpResponse::Ok().json(ApiResponse::data(videos)))
}

async fn get_to_edit(user: AuthenticatedUser, db: web::Data<Database>) -> Result<HttpResponse, ApiError> {
    let videos = view_helpers::fetch_to_edit(&db, user.id)?;
    Ok(HttpResponse::Ok().json(ApiResponse::data(videos)))
}

async fn get_assigned(
    user: AuthenticatedUser,
    db: web::Data<Database>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    let videos = view_helpers::fetch_assigned(&db, &pool, user.id)?;
    Ok(HttpResponse::Ok().json(ApiResponse::data(videos)))
}

async fn get_for_me(user: AuthenticatedUser, db: web::Data<Database>) -> Result<HttpResponse, ApiError> {
    let videos = view_helpers::fetch_for_me(&db, user.id)?;
    Ok(HttpResponse::Ok().json(ApiResponse::data(videos)))
}

// --- Directory ---

async fn get_editors(_user: AuthenticatedUser, pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let editors = directory_helpers::list_users_with_role(&pool, Role::Editor)?;
    Ok(HttpResponse::Ok().json(ApiResponse::data(editors)))
}

async fn get_creators(_user: AuthenticatedUser, pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let creators = directory_helpers::list_users_with_role(&pool, Role::Creator)?;
    Ok(HttpResponse::Ok().json(ApiResponse::data(creators)))
}

// --- Workflow ---

async fn assign_editor(
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<AssignEditorRequest>,
    db: web::Data<Database>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    workflow_helpers::assign_editor(&db, &pool, &user, path.into_inner(), body.editor_id)?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Editor assigned successfully")))
}

async fn approve_video(
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    db: web::Data<Database>,
) -> Result<HttpResponse, ApiError> {
    let video = workflow_helpers::approve_video(&db, &user, path.into_inner())?;
    Ok(HttpResponse::Ok().json(ApiResponse::with_message(video, "Video approved")))
}

async fn publish_video(
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<PublishVideoRequest>,
    db: web::Data<Database>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let options = PublishOptions {
        access_token: body.access_token,
        title: body.title,
        visibility: body.visibility,
    };
    let video = workflow_helpers::publish_video(
        &db,
        state.storage.as_ref(),
        state.publisher.as_ref(),
        &user,
        path.into_inner(),
        options,
    )
    .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::with_message(video, "Video published")))
}

async fn delete_video(
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    db: web::Data<Database>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    workflow_helpers::delete_video(&db, state.storage.as_ref(), &user, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Video deleted successfully")))
}
