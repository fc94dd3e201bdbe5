use clap::{Parser, Subcommand};
use handoff_backend::config::Config;
use handoff_backend::models::db_operations::users_db_operations;
use handoff_backend::models::Role;
use handoff_backend::setup::db_setup;
use rand::RngCore;
use redb::Database;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "setup_cli", author, version, about = "A CLI for initial application setup.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the .env configuration file. Required by every command except `secret generate`.
    #[arg(long, value_name = "FILE")]
    env_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    Secret {
        #[command(subcommand)]
        action: SecretAction,
    },
}

#[derive(Subcommand, Debug)]
enum DbAction {
    /// Create the users and/or videos database. Existing databases are left alone.
    Setup { db_type: Option<String> },
}

#[derive(Subcommand, Debug)]
enum UserAction {
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        role: Role,
    },
    List {
        #[arg(long)]
        role: Option<Role>,
    },
}

#[derive(Subcommand, Debug)]
enum SecretAction {
    /// Print a fresh value for JWT_SECRET_KEY.
    Generate,
}

fn main() {
    let cli = Cli::parse();

    if let Commands::Secret { action: SecretAction::Generate } = &cli.command {
        println!("{}", generate_secret());
        return;
    }

    let env_file = match &cli.env_file {
        Some(path) => path,
        None => {
            eprintln!("❌ Error: --env-file <FILE> is required for this command.");
            std::process::exit(2);
        }
    };
    let config = Config::from_env(env_file).expect("FATAL: Failed to load or parse configuration.");

    match &cli.command {
        Commands::Db { action } => match action {
            DbAction::Setup { db_type } => match db_type.as_deref() {
                Some("users") => setup_users_database(&config),
                Some("videos") => setup_videos_database(&config),
                Some(other) => eprintln!("❌ Error: Unknown database type '{}'. Use 'users' or 'videos'.", other),
                None => {
                    setup_users_database(&config);
                    setup_videos_database(&config);
                }
            },
        },
        Commands::User { action } => match action {
            UserAction::Create { name, email, password, role } => create_user(&config, name, email, password, *role),
            UserAction::List { role } => list_users(&config, *role),
        },
        Commands::Secret { .. } => {}
    }
}

/// 64 random bytes, hex-encoded to the 128 characters the server expects.
fn generate_secret() -> String {
    let mut bytes = [0u8; 64];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn setup_users_database(config: &Config) {
    let db_path = config.users_db_path();
    if db_path.exists() {
        println!("ℹ️ Users database already exists at '{}'. Skipping creation.", db_path.display());
        return;
    }
    println!("\nSetting up users database at '{}'...", db_path.display());

    if let Some(parent_dir) = db_path.parent() {
        fs::create_dir_all(parent_dir).expect("Could not create database directory.");
    }

    let mut conn = Connection::open(&db_path).expect("Could not create users database file.");
    match db_setup::setup_users_db(&mut conn) {
        Ok(_) => println!("✅ Users database setup completed successfully."),
        Err(e) => eprintln!("❌ Error setting up users database: {}", e),
    }
}

fn setup_videos_database(config: &Config) {
    let db_path = config.videos_db_path();
    if db_path.exists() {
        println!("ℹ️ Videos database already exists at '{}'. Skipping creation.", db_path.display());
        return;
    }
    println!("\nSetting up videos database at '{}'...", db_path.display());

    if let Some(parent_dir) = db_path.parent() {
        fs::create_dir_all(parent_dir).expect("Could not create database directory.");
    }

    let db = Database::create(&db_path).expect("Failed to create videos database file.");
    match db_setup::setup_videos_db(&db) {
        Ok(_) => println!("✅ Videos database setup completed successfully."),
        Err(e) => eprintln!("❌ Error setting up videos database: {}", e),
    }
}

fn open_users_db(config: &Config) -> Option<Connection> {
    let db_path = config.users_db_path();
    if !db_path.exists() {
        eprintln!(
            "❌ Error: Users database not found at '{}'. Please run `setup_cli db setup` first.",
            db_path.display()
        );
        return None;
    }
    match Connection::open(&db_path) {
        Ok(conn) => Some(conn),
        Err(e) => {
            eprintln!("❌ Error opening users database: {}", e);
            None
        }
    }
}

fn create_user(config: &Config, name: &str, email: &str, password: &str, role: Role) {
    let Some(conn) = open_users_db(config) else { return };

    match users_db_operations::create_user(&conn, name, email, password, role) {
        Ok(user) => println!("✅ {} '{}' <{}> created with id {}.", role, user.name, user.email, user.id),
        Err(e) if users_db_operations::is_unique_violation(&e) => {
            eprintln!("❌ Error: an account with email '{}' already exists.", email)
        }
        Err(e) => eprintln!("❌ Error creating user: {}", e),
    }
}

fn list_users(config: &Config, role: Option<Role>) {
    let Some(conn) = open_users_db(config) else { return };

    match users_db_operations::read_all_users(&conn) {
        Ok(users) => {
            println!("Listing users:");
            for user in users.iter().filter(|u| role.map_or(true, |r| u.role == r)) {
                println!("- [{}] {} <{}> ({})", user.role, user.name, user.email, user.id);
            }
        }
        Err(e) => eprintln!("❌ Error fetching users: {}", e),
    }
}
