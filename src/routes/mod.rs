use crate::error::ApiError;
use actix_web::{error, web, HttpRequest};
use serde::Serialize;

pub mod auth;
pub mod public;
pub mod upload;
pub mod videos;

/// Envelope for every JSON body the API returns.
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self { success: true, data: Some(data), message: None, error: None }
    }

    pub fn with_message(data: T, message: &str) -> Self {
        Self { success: true, data: Some(data), message: Some(message.to_string()), error: None }
    }
}

impl ApiResponse<()> {
    pub fn message(message: &str) -> Self {
        Self { success: true, data: None, message: Some(message.to_string()), error: None }
    }
}

fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::InvalidInput(format!("Invalid JSON body: {}", err)).into()
}

fn path_error_handler(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::InvalidInput(format!("Invalid path parameter: {}", err)).into()
}

/// Registers the whole API surface. `/media` is mounted by the server since it
/// depends on the configured media path.
pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .configure(public::config_public)
        .service(
            web::scope("/api")
                .configure(public::config_api)
                .service(web::scope("/auth").configure(auth::config_auth))
                .service(web::scope("/upload").configure(upload::config_upload))
                .service(web::scope("/videos").configure(videos::config_videos)),
        );
}
