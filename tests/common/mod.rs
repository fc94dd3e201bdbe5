#![allow(dead_code)]

use actix_web::web;
use async_trait::async_trait;
use handoff_backend::helper::token_helpers::TokenIssuer;
use handoff_backend::middleware::AuthenticatedUser;
use handoff_backend::models::db_operations::users_db_operations;
use handoff_backend::models::{Role, User};
use handoff_backend::publish::{PublishError, PublishRequest, Publisher, Visibility};
use handoff_backend::setup::db_setup;
use handoff_backend::storage::{ObjectMetadata, ObjectStorage, StorageError, StoredObject};
use handoff_backend::{AppState, DbPool};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use redb::{Database, TableDefinition};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use uuid::Uuid;

pub const TEST_SECRET: &[u8] = b"integration-test-secret-0123456789abcdef";
pub const PASSWORD: &str = "correct horse battery";

/// Keeps stored objects in memory. Deletes can be made to fail to exercise
/// the upstream-failure path.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    pub fail_deletes: AtomicBool,
}

impl MemoryObjectStore {
    pub fn contains(&self, provider_ref: &str) -> bool {
        self.objects.lock().unwrap().contains_key(provider_ref)
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStore {
    async fn store(&self, bytes: Vec<u8>, metadata: ObjectMetadata) -> Result<StoredObject, StorageError> {
        let provider_ref = format!("videos/{}-{}", Uuid::new_v4(), metadata.original_name);
        self.objects.lock().unwrap().insert(provider_ref.clone(), bytes);
        Ok(StoredObject {
            url: format!("/media/{}", provider_ref),
            provider_ref,
        })
    }

    async fn fetch(&self, provider_ref: &str) -> Result<Vec<u8>, StorageError> {
        self.objects
            .lock()
            .unwrap()
            .get(provider_ref)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(provider_ref.to_string()))
    }

    async fn delete(&self, provider_ref: &str) -> Result<(), StorageError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::new(std::io::ErrorKind::Other, "storage offline")));
        }
        self.objects.lock().unwrap().remove(provider_ref);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PublishedCall {
    pub title: String,
    pub visibility: Visibility,
    pub access_token: String,
    pub size: usize,
}

type PublishHook = Box<dyn Fn() + Send + Sync>;

/// Records every publish call. `on_publish` runs before the id is returned,
/// so a test can change the registry while the upload is in flight.
#[derive(Default)]
pub struct StubPublisher {
    pub calls: Mutex<Vec<PublishedCall>>,
    pub on_publish: Mutex<Option<PublishHook>>,
    counter: AtomicUsize,
}

#[async_trait]
impl Publisher for StubPublisher {
    async fn publish(&self, request: PublishRequest) -> Result<String, PublishError> {
        self.calls.lock().unwrap().push(PublishedCall {
            title: request.title,
            visibility: request.visibility,
            access_token: request.access_token,
            size: request.bytes.len(),
        });
        if let Some(hook) = self.on_publish.lock().unwrap().as_ref() {
            hook();
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("ext-{}", n))
    }
}

/// Fresh databases and collaborators in a temp directory.
pub struct TestEnv {
    _dir: TempDir,
    pub db: web::Data<Database>,
    pub pool: web::Data<DbPool>,
    pub storage: Arc<MemoryObjectStore>,
    pub publisher: Arc<StubPublisher>,
    pub issuer: web::Data<TokenIssuer>,
    pub state: web::Data<AppState>,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();

        let db = Database::create(dir.path().join("videos.db")).unwrap();
        db_setup::setup_videos_db(&db).unwrap();

        let pool = Pool::builder()
            .max_size(4)
            .build(SqliteConnectionManager::file(dir.path().join("users.db")))
            .unwrap();
        db_setup::setup_users_db(&mut pool.get().unwrap()).unwrap();

        let storage = Arc::new(MemoryObjectStore::default());
        let publisher = Arc::new(StubPublisher::default());
        let state = web::Data::new(AppState {
            storage: storage.clone(),
            publisher: publisher.clone(),
            max_upload_bytes: 1024 * 1024,
        });

        TestEnv {
            _dir: dir,
            db: web::Data::new(db),
            pool: web::Data::new(pool),
            storage,
            publisher,
            issuer: web::Data::new(TokenIssuer::new(TEST_SECRET, 1)),
            state,
        }
    }

    pub fn create_user(&self, name: &str, role: Role) -> User {
        let conn = self.pool.get().unwrap();
        let email = format!("{}@example.com", name.to_lowercase());
        users_db_operations::create_user(&conn, name, &email, PASSWORD, role).unwrap()
    }

    /// Swaps the registry for one whose uploader index has the wrong key
    /// type, so every video insert fails after the file is stored.
    pub fn break_video_registry(&mut self) {
        let db = Database::create(self._dir.path().join("broken-videos.db")).unwrap();
        let txn = db.begin_write().unwrap();
        {
            let bad: TableDefinition<&str, &str> = TableDefinition::new("videos_by_uploader");
            txn.open_table(bad).unwrap();
        }
        txn.commit().unwrap();
        self.db = web::Data::new(db);
    }

    pub fn token_for(&self, user: &User) -> String {
        self.issuer.issue(user).unwrap()
    }
}

pub fn principal(user: &User) -> AuthenticatedUser {
    AuthenticatedUser { id: user.id, role: user.role }
}
