use crate::models::Video;
use chrono::{DateTime, Utc};
use redb::{
    CommitError, Database, ReadableTable, StorageError, TableDefinition, TableError,
    TransactionError, WriteTransaction,
};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Redb storage error: {0}")]
    RedbStorage(#[from] StorageError),
    #[error("Redb transaction error: {0}")]
    RedbTransaction(#[from] TransactionError),
    #[error("Redb table error: {0}")]
    RedbTable(#[from] TableError),
    #[error("Redb commit error: {0}")]
    RedbCommit(#[from] CommitError),
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("Item not found in database: {0}")]
    NotFound(String),
}

/// Video documents, keyed by video id, stored as JSON.
pub const VIDEOS: TableDefinition<&[u8; 16], &str> = TableDefinition::new("videos");

// Index tables are keyed by (user id, negated upload time in micros, video id),
// so a forward range scan over one user yields newest uploads first.
pub const BY_UPLOADER: TableDefinition<(&[u8; 16], i64, &[u8; 16]), ()> = TableDefinition::new("videos_by_uploader");
pub const BY_UPLOADED_FOR: TableDefinition<(&[u8; 16], i64, &[u8; 16]), ()> = TableDefinition::new("videos_by_uploaded_for");
pub const BY_EDITOR: TableDefinition<(&[u8; 16], i64, &[u8; 16]), ()> = TableDefinition::new("videos_by_editor");

type IndexDefinition = TableDefinition<'static, (&'static [u8; 16], i64, &'static [u8; 16]), ()>;

fn chronological_key(uploaded_at: &DateTime<Utc>) -> i64 {
    -uploaded_at.timestamp_micros()
}

/// Every (index table, owner) pair a video must appear under.
fn index_owners(video: &Video) -> Vec<(IndexDefinition, Uuid)> {
    let mut owners = vec![(BY_UPLOADER, video.uploaded_by)];
    if let Some(creator_id) = video.uploaded_for {
        owners.push((BY_UPLOADED_FOR, creator_id));
    }
    for editor_id in &video.assigned_editors {
        owners.push((BY_EDITOR, *editor_id));
    }
    owners
}

fn write_index_entries(write_txn: &WriteTransaction, video: &Video) -> Result<(), DbError> {
    let video_id_bytes = video.id.into_bytes();
    let timestamp = chronological_key(&video.uploaded_at);
    for (definition, owner) in index_owners(video) {
        let owner_bytes = owner.into_bytes();
        let mut index = write_txn.open_table(definition)?;
        index.insert((&owner_bytes, timestamp, &video_id_bytes), ())?;
    }
    Ok(())
}

fn remove_index_entries(write_txn: &WriteTransaction, video: &Video) -> Result<(), DbError> {
    let video_id_bytes = video.id.into_bytes();
    let timestamp = chronological_key(&video.uploaded_at);
    for (definition, owner) in index_owners(video) {
        let owner_bytes = owner.into_bytes();
        let mut index = write_txn.open_table(definition)?;
        index.remove((&owner_bytes, timestamp, &video_id_bytes))?;
    }
    Ok(())
}

pub fn insert_video(db: &Database, video: &Video) -> Result<(), DbError> {
    let video_json = serde_json::to_string(video)?;
    let video_id_bytes = video.id.into_bytes();

    let write_txn = db.begin_write()?;
    {
        let mut videos_table = write_txn.open_table(VIDEOS)?;
        videos_table.insert(&video_id_bytes, video_json.as_str())?;
    }
    write_index_entries(&write_txn, video)?;
    write_txn.commit()?;
    Ok(())
}

pub fn read_video(db: &Database, video_id: &Uuid) -> Result<Option<Video>, DbError> {
    let read_txn = db.begin_read()?;
    let videos_table = read_txn.open_table(VIDEOS)?;
    let video_id_bytes = video_id.into_bytes();

    let video = match videos_table.get(&video_id_bytes)? {
        Some(guard) => Some(serde_json::from_str(guard.value())?),
        None => None,
    };
    Ok(video)
}

/// Read-modify-write of a single video inside one write transaction.
///
/// `mutate` sees the current document and may reject the change; a rejection
/// aborts the transaction so nothing is written. Index entries are rebuilt
/// from the before/after documents, so callers never touch the index tables.
pub fn modify_video<F, E>(db: &Database, video_id: &Uuid, mutate: F) -> Result<Video, E>
where
    F: FnOnce(&mut Video) -> Result<(), E>,
    E: From<DbError>,
{
    try_modify_video(db, video_id, mutate)?
}

fn try_modify_video<F, E>(db: &Database, video_id: &Uuid, mutate: F) -> Result<Result<Video, E>, DbError>
where
    F: FnOnce(&mut Video) -> Result<(), E>,
{
    let video_id_bytes = video_id.into_bytes();
    let write_txn = db.begin_write()?;

    let current: Video = {
        let videos_table = write_txn.open_table(VIDEOS)?;
        let guard = videos_table
            .get(&video_id_bytes)?
            .ok_or_else(|| DbError::NotFound(format!("Video {} not found", video_id)))?;
        serde_json::from_str(guard.value())?
    };

    let mut updated = current.clone();
    if let Err(rejection) = mutate(&mut updated) {
        write_txn.abort()?;
        return Ok(Err(rejection));
    }

    if updated == current {
        write_txn.abort()?;
        return Ok(Ok(updated));
    }

    let updated_json = serde_json::to_string(&updated)?;
    {
        let mut videos_table = write_txn.open_table(VIDEOS)?;
        videos_table.insert(&video_id_bytes, updated_json.as_str())?;
    }
    remove_index_entries(&write_txn, &current)?;
    write_index_entries(&write_txn, &updated)?;
    write_txn.commit()?;

    Ok(Ok(updated))
}

/// Removes the document and its index entries. Returns the removed video, or
/// `None` if it was already gone.
pub fn delete_video(db: &Database, video_id: &Uuid) -> Result<Option<Video>, DbError> {
    let video_id_bytes = video_id.into_bytes();
    let write_txn = db.begin_write()?;

    let removed: Option<Video> = {
        let mut videos_table = write_txn.open_table(VIDEOS)?;
        let removed_json = videos_table.remove(&video_id_bytes)?.map(|guard| guard.value().to_string());
        match removed_json {
            Some(json) => Some(serde_json::from_str(&json)?),
            None => None,
        }
    };

    if let Some(video) = &removed {
        remove_index_entries(&write_txn, video)?;
    }
    write_txn.commit()?;
    Ok(removed)
}

fn read_videos_by_index(db: &Database, definition: IndexDefinition, owner: &Uuid) -> Result<Vec<Video>, DbError> {
    let read_txn = db.begin_read()?;
    let index = read_txn.open_table(definition)?;
    let videos_table = read_txn.open_table(VIDEOS)?;

    let owner_bytes = owner.into_bytes();
    let start_key = (&owner_bytes, i64::MIN, &[0u8; 16]);
    let end_key = (&owner_bytes, i64::MAX, &[255u8; 16]);

    let mut videos = Vec::new();
    for entry in index.range(start_key..=end_key)? {
        let (key, _value) = entry?;
        let video_id_bytes = key.value().2;
        match videos_table.get(video_id_bytes)? {
            Some(guard) => videos.push(serde_json::from_str(guard.value())?),
            None => log::warn!(
                "Index entry for owner {} points at missing video {}; skipping.",
                owner,
                Uuid::from_bytes(*video_id_bytes)
            ),
        }
    }
    Ok(videos)
}

pub fn read_videos_by_uploader(db: &Database, user_id: &Uuid) -> Result<Vec<Video>, DbError> {
    read_videos_by_index(db, BY_UPLOADER, user_id)
}

pub fn read_videos_by_uploaded_for(db: &Database, user_id: &Uuid) -> Result<Vec<Video>, DbError> {
    read_videos_by_index(db, BY_UPLOADED_FOR, user_id)
}

pub fn read_videos_by_editor(db: &Database, user_id: &Uuid) -> Result<Vec<Video>, DbError> {
    read_videos_by_index(db, BY_EDITOR, user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VideoStatus;
    use chrono::Duration;
    use tempfile::TempDir;

    fn open_db() -> (TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::create(dir.path().join("videos.db")).unwrap();
        crate::setup::db_setup::setup_videos_db(&db).unwrap();
        (dir, db)
    }

    fn video_uploaded_by(uploader: Uuid, uploaded_at: DateTime<Utc>) -> Video {
        Video {
            id: Uuid::new_v4(),
            url: "/media/videos/aa/bb/file.mp4".to_string(),
            provider_ref: "videos/aa/bb/file.mp4".to_string(),
            uploaded_by: uploader,
            uploaded_for: None,
            original_name: "file.mp4".to_string(),
            status: VideoStatus::Pending,
            uploaded_at,
            assigned_editors: Vec::new(),
            external_ref: None,
        }
    }

    #[test]
    fn uploader_index_returns_newest_first_and_only_that_uploader() {
        let (_dir, db) = open_db();
        let uploader = Uuid::new_v4();
        let someone_else = Uuid::new_v4();
        let now = Utc::now();

        let oldest = video_uploaded_by(uploader, now - Duration::hours(2));
        let newest = video_uploaded_by(uploader, now);
        let middle = video_uploaded_by(uploader, now - Duration::hours(1));
        let foreign = video_uploaded_by(someone_else, now - Duration::minutes(30));
        for video in [&oldest, &newest, &middle, &foreign] {
            insert_video(&db, video).unwrap();
        }

        let ids: Vec<Uuid> = read_videos_by_uploader(&db, &uploader).unwrap().into_iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![newest.id, middle.id, oldest.id]);
    }

    #[test]
    fn modify_reindexes_new_editor_and_creator() {
        let (_dir, db) = open_db();
        let uploader = Uuid::new_v4();
        let editor = Uuid::new_v4();
        let video = video_uploaded_by(uploader, Utc::now());
        insert_video(&db, &video).unwrap();

        let updated = modify_video::<_, DbError>(&db, &video.id, |v| {
            v.assign_editor(editor);
            v.uploaded_for = Some(uploader);
            Ok(())
        })
        .unwrap();

        assert_eq!(updated.assigned_editors, vec![editor]);
        assert_eq!(read_videos_by_editor(&db, &editor).unwrap().len(), 1);
        assert_eq!(read_videos_by_uploaded_for(&db, &uploader).unwrap().len(), 1);
    }

    #[test]
    fn rejected_modification_writes_nothing() {
        let (_dir, db) = open_db();
        let video = video_uploaded_by(Uuid::new_v4(), Utc::now());
        insert_video(&db, &video).unwrap();

        let result = modify_video(&db, &video.id, |v| {
            v.assign_editor(Uuid::new_v4());
            Err(DbError::NotFound("rejected".to_string()))
        });

        assert!(result.is_err());
        let stored = read_video(&db, &video.id).unwrap().unwrap();
        assert!(stored.assigned_editors.is_empty());
    }

    #[test]
    fn delete_removes_document_and_index_entries() {
        let (_dir, db) = open_db();
        let uploader = Uuid::new_v4();
        let video = video_uploaded_by(uploader, Utc::now());
        insert_video(&db, &video).unwrap();

        let removed = delete_video(&db, &video.id).unwrap();
        assert_eq!(removed.map(|v| v.id), Some(video.id));
        assert!(read_video(&db, &video.id).unwrap().is_none());
        assert!(read_videos_by_uploader(&db, &uploader).unwrap().is_empty());
        assert!(delete_video(&db, &video.id).unwrap().is_none());
    }

    #[test]
    fn modifying_a_missing_video_reports_not_found() {
        let (_dir, db) = open_db();
        let result = modify_video::<_, DbError>(&db, &Uuid::new_v4(), |_| Ok(()));
        assert!(matches!(result, Err(DbError::NotFound(_))));
    }
}
