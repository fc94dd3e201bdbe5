use crate::error::ApiError;
use crate::storage::is_supported_video_type;
use actix_multipart::Multipart;
use actix_web::web::BytesMut;
use futures_util::StreamExt;
use std::collections::HashMap;
use uuid::Uuid;

pub const VIDEO_FIELD: &str = "video";

/// Text fields are ids and short values; anything longer is a malformed request.
const MAX_TEXT_FIELD_BYTES: usize = 1024;
const MAX_TEXT_FIELDS: usize = 8;

/// A fully buffered video upload plus the plain text fields sent alongside it.
#[derive(Debug)]
pub struct VideoUpload {
    pub bytes: Vec<u8>,
    pub original_name: String,
    pub content_type: String,
    pub fields: HashMap<String, String>,
}

impl VideoUpload {
    /// Reads a required id field such as `editorId`.
    pub fn uuid_field(&self, name: &str) -> Result<Uuid, ApiError> {
        let raw = self
            .fields
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ApiError::InvalidInput(format!("{} is required.", name)))?;
        Uuid::parse_str(raw).map_err(|_| ApiError::InvalidInput(format!("{} is not a valid id.", name)))
    }
}

/// Drains a multipart payload. Exactly one `video` file field is accepted; its
/// type must be on the video allow-list and its size within `max_bytes`.
pub async fn read_video_upload(mut payload: Multipart, max_bytes: u64) -> Result<VideoUpload, ApiError> {
    let mut video: Option<(Vec<u8>, String, String)> = None;
    let mut fields = HashMap::new();

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let field_name = field.content_disposition().get_name().unwrap_or_default().to_string();

        if field_name == VIDEO_FIELD {
            if video.is_some() {
                return Err(ApiError::InvalidInput("Only one video file may be uploaded per request.".to_string()));
            }

            let content_type = field
                .content_type()
                .map(|mime| mime.essence_str().to_string())
                .ok_or_else(|| ApiError::InvalidInput("Content-Type not available for the video file.".to_string()))?;
            if !is_supported_video_type(&content_type) {
                return Err(ApiError::InvalidInput(format!(
                    "Unsupported file type: '{}'. Please upload an mp4, webm, mov or mkv video.",
                    content_type
                )));
            }

            let original_name = field
                .content_disposition()
                .get_filename()
                .map(str::to_string)
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| "upload.bin".to_string());

            let mut data = BytesMut::new();
            while let Some(chunk) = field.next().await {
                let chunk = chunk?;
                if (data.len() + chunk.len()) as u64 > max_bytes {
                    return Err(ApiError::InvalidInput(format!(
                        "File is too large. Maximum size is {}MB.",
                        max_bytes / (1024 * 1024)
                    )));
                }
                data.extend_from_slice(&chunk);
            }
            video = Some((data.to_vec(), original_name, content_type));
        } else {
            if fields.len() >= MAX_TEXT_FIELDS {
                return Err(ApiError::InvalidInput(format!(
                    "Too many form fields; at most {} are accepted besides the video.",
                    MAX_TEXT_FIELDS
                )));
            }
            let mut data = BytesMut::new();
            while let Some(chunk) = field.next().await {
                data.extend_from_slice(&chunk?);
                if data.len() > MAX_TEXT_FIELD_BYTES {
                    return Err(ApiError::InvalidInput(format!("Field '{}' is too long.", field_name)));
                }
            }
            let value = String::from_utf8(data.to_vec())
                .map_err(|_| ApiError::InvalidInput("Invalid UTF-8 in form field.".to_string()))?;
            fields.insert(field_name, value);
        }
    }

    let (bytes, original_name, content_type) =
        video.ok_or_else(|| ApiError::InvalidInput("No video file was uploaded.".to_string()))?;
    if bytes.is_empty() {
        return Err(ApiError::InvalidInput("The uploaded video is empty.".to_string()));
    }

    Ok(VideoUpload {
        bytes,
        original_name,
        content_type,
        fields,
    })
}
