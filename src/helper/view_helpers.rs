use crate::error::ApiError;
use crate::models::db_operations::{users_db_operations, videos_db_operations};
use crate::models::{AssignedVideo, UserSummary, Video};
use crate::DbPool;
use actix_web::web;
use redb::Database;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use uuid::Uuid;

// All views come back newest upload first, straight from the index order.

pub fn fetch_my_uploads(db: &web::Data<Database>, user_id: Uuid) -> Result<Vec<Video>, ApiError> {
    Ok(videos_db_operations::read_videos_by_uploader(db, &user_id)?)
}

pub fn fetch_to_edit(db: &web::Data<Database>, user_id: Uuid) -> Result<Vec<Video>, ApiError> {
    Ok(videos_db_operations::read_videos_by_editor(db, &user_id)?)
}

pub fn fetch_for_me(db: &web::Data<Database>, user_id: Uuid) -> Result<Vec<Video>, ApiError> {
    Ok(videos_db_operations::read_videos_by_uploaded_for(db, &user_id)?)
}

/// The editor's worklist, each video annotated with who uploaded it.
pub fn fetch_assigned(
    db: &web::Data<Database>,
    pool: &web::Data<DbPool>,
    user_id: Uuid,
) -> Result<Vec<AssignedVideo>, ApiError> {
    let videos = videos_db_operations::read_videos_by_editor(db, &user_id)?;
    if videos.is_empty() {
        return Ok(Vec::new());
    }

    let conn = pool.get()?;
    let mut uploaders: HashMap<Uuid, Option<UserSummary>> = HashMap::new();
    let mut assigned = Vec::with_capacity(videos.len());

    for video in videos {
        let uploader = match uploaders.entry(video.uploaded_by) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let summary = users_db_operations::read_user_by_id(&conn, video.uploaded_by)?.map(|u| u.summary());
                entry.insert(summary)
            }
        };

        match uploader {
            Some(creator) => assigned.push(AssignedVideo {
                creator: creator.clone(),
                video,
            }),
            None => log::warn!(
                "Uploader {} of video {} no longer exists; leaving it out of the assigned list.",
                video.uploaded_by,
                video.id
            ),
        }
    }
    Ok(assigned)
}
