use actix_cors::Cors;
use actix_web::http::header;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{web, App, HttpServer};
use clap::Parser;
use handoff_backend::{
    config::Config,
    helper::token_helpers::TokenIssuer,
    publish::HttpPublisher,
    routes,
    storage::LocalObjectStore,
    AppState,
};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use redb::Database;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "handoff_server", author, version, about = "Starts the video handoff web server.")]
struct Cli {
    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

fn build_cors(allowed_origins: &str) -> Cors {
    let cors = if allowed_origins.trim() == "*" {
        Cors::default().allow_any_origin()
    } else {
        allowed_origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };
    cors.allowed_methods(vec!["GET", "POST", "DELETE"])
        .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env(&cli.env_file).expect("FATAL: Failed to load or parse configuration.");

    env_logger::init_from_env(env_logger::Env::new().default_filter_or(&config.log_level));

    fs::create_dir_all(&config.media_path).expect("FATAL: Failed to create media directory");

    let videos_db = web::Data::new(Database::open(config.videos_db_path()).expect(
        "FATAL: videos.db not found. Run 'cargo run --bin setup_cli -- --env-file <path> db setup'",
    ));

    let manager = SqliteConnectionManager::file(config.users_db_path());
    let pool = Pool::builder()
        .build(manager)
        .expect("FATAL: Failed to create Rusqlite connection pool.");

    let secret = config
        .jwt_secret_bytes()
        .expect("FATAL: JWT_SECRET_KEY in .env is not a valid hex string.");
    let token_issuer = web::Data::new(TokenIssuer::new(&secret, config.token_ttl_hours));

    let app_state = web::Data::new(AppState {
        storage: Arc::new(LocalObjectStore::new(&config.media_path, "/media")),
        publisher: Arc::new(HttpPublisher::new(&config.publish_api_base)),
        max_upload_bytes: config.max_upload_bytes(),
    });

    let server_address = format!("{}:{}", config.web.host, config.web.port);
    log::info!("Server starting at http://{}", server_address);

    HttpServer::new(move || {
        App::new()
            .wrap(build_cors(&config.allowed_origins))
            .wrap(Logger::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY")),
            )
            .app_data(videos_db.clone())
            .app_data(web::Data::new(pool.clone()))
            .app_data(token_issuer.clone())
            .app_data(app_state.clone())
            .configure(routes::config_routes)
            .service(actix_files::Files::new("/media", &config.media_path))
    })
    .bind(server_address)?
    .run()
    .await
}
