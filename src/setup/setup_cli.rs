use clap::{Parser, Subcommand};
use admitbase_backend::config::Config;
use admitbase_backend::models::db_operations::users_db_operations;
use admitbase_backend::setup::db_setup;
use rusqlite::Connection;
use redb::Database;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "setup_cli", author, version, about = "A CLI for initial application setup.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand, Debug)]
enum DbAction {
    Setup {
        db_type: Option<String>,
    }
}

#[derive(Subcommand, Debug)]
enum AdminAction {
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    List,
    ChangePassword {
        #[arg(long)]
        username: String,
        #[arg(long)]
        new_password: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = Config::from_env(&cli.env_file)
        .expect("FATAL: Failed to load or parse configuration.");

    match &cli.command {
        Commands::Db { action } => match action {
            DbAction::Setup { db_type } => {
                match db_type.as_deref() {
                    Some("leads") => setup_leads_database(&config),
                    Some("content") => setup_content_database(&config),
                    Some(other) => eprintln!("❌ Error: Unknown database type '{}'. Use 'leads' or 'content'.", other),
                    None => {
                        setup_leads_database(&config);
                        setup_content_database(&config);
                    }
                }
            }
        },
        Commands::Admin { action } => match action {
            AdminAction::Create { username, password } => {
                create_admin_user(&config, username, password);
            }
            AdminAction::List => {
                list_admin_users(&config);
            }
            AdminAction::ChangePassword { username, new_password } => {
                change_admin_password(&config, username, new_password);
            }
        },
    }
}

fn setup_leads_database(config: &Config) {
    let db_path = config.leads_db_path();
    if db_path.exists() {
        println!("ℹ️ Leads database already exists at '{}'. Skipping creation.", db_path.display());
        return;
    }
    println!("\nSetting up leads database at '{}'...", db_path.display());

    if let Some(parent_dir) = db_path.parent() {
        fs::create_dir_all(parent_dir).expect("Could not create database directory.");
    }

    let mut conn = Connection::open(&db_path).expect("Could not create leads database file.");
    match db_setup::setup_leads_db(&mut conn) {
        Ok(_) => println!("✅ Leads database setup completed successfully."),
        Err(e) => eprintln!("❌ Error setting up leads database: {}", e),
    }
}

fn setup_content_database(config: &Config) {
    let db_path = config.content_db_path();
    if db_path.exists() {
        println!("ℹ️ Content database already exists at '{}'. Skipping creation.", db_path.display());
        return;
    }
    println!("\nSetting up content database at '{}'...", db_path.display());

    if let Some(parent_dir) = db_path.parent() {
        fs::create_dir_all(parent_dir).expect("Could not create database directory.");
    }

    let db = Database::create(&db_path).expect("Failed to create content database file.");
    match db_setup::setup_content_db(&db) {
        Ok(_) => println!("✅ Content database setup completed successfully."),
        Err(e) => eprintln!("❌ Error setting up content database: {}", e),
    }
}

fn create_admin_user(config: &Config, username: &str, password: &str) {
    let db_path = config.leads_db_path();
    if !db_path.exists() {
        eprintln!("❌ Error: Leads database not found at '{}'. Please run `setup_cli db setup` first.", db_path.display());
        return;
    }
    let conn = Connection::open(&db_path).expect("Could not open leads database.");

    match users_db_operations::create_user(&conn, username, password, "admin") {
        Ok(_) => println!("✅ Admin user '{}' created successfully.", username),
        Err(e) => eprintln!("❌ Error creating admin user: {}. It might be because the username already exists.", e),
    }
}

fn list_admin_users(config: &Config) {
    let conn = match Connection::open(&config.leads_db_path()) {
        Ok(c) => c,
        Err(_) => {
            eprintln!("❌ Error: Leads database not found. Please run `setup_cli db setup` first.");
            return;
        }
    };
    let mut stmt = match conn.prepare("SELECT username FROM users WHERE role = 'admin' ORDER BY username") {
        Ok(s) => s,
        Err(e) => {
            eprintln!("❌ Error preparing database query: {}", e);
            return;
        }
    };
    let user_iter = stmt.query_map([], |row| row.get::<_, String>(0));

    println!("Listing Admin Users:");
    match user_iter {
        Ok(users) => {
            for user in users {
                println!("- {}", user.unwrap_or_else(|_| "Invalid username".to_string()));
            }
        }
        Err(e) => eprintln!("❌ Error fetching admins: {}", e),
    }
}

fn change_admin_password(config: &Config, username: &str, new_password: &str) {
    let conn = match Connection::open(&config.leads_db_path()) {
        Ok(c) => c,
        Err(_) => {
            eprintln!("❌ Error: Leads database not found.");
            return;
        }
    };
    match users_db_operations::update_password(&conn, username, new_password) {
        Ok(0) => eprintln!("❌ Error: No admin user named '{}' found.", username),
        Ok(_) => println!("✅ Password for admin user '{}' changed successfully.", username),
        Err(e) => eprintln!("❌ Error updating password: {}", e),
    }
}
