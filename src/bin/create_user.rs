use std::io::{self, Write};
use std::sync::Arc;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;

use directory_api::auth::responses::RegisterRequest;
use directory_api::auth::{AuthConfig, AuthState};
use directory_api::db;
use directory_api::directory::{DirectoryError, DirectoryService, PgDirectoryStore};

#[derive(Parser, Debug)]
#[command(
    name = "create_user",
    about = "Provision a directory user together with their personal organisation"
)]
struct Args {
    #[arg(long)]
    first_name: String,

    #[arg(long)]
    last_name: String,

    /// Stored exactly as given after trimming; lookups are case sensitive.
    #[arg(long)]
    email: String,

    #[arg(long)]
    password: String,

    #[arg(long)]
    phone: Option<String>,

    /// Connection string; falls back to `DATABASE_URL`.
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&args.database_url)
        .await?;
    db::run_migrations(&pool).await?;

    let auth_state = AuthState::from_config(AuthConfig::from_env()?)?;
    let directory = DirectoryService::new(Arc::new(PgDirectoryStore::new(pool)), &auth_state)?;

    let request = RegisterRequest {
        first_name: Some(args.first_name),
        last_name: Some(args.last_name),
        email: Some(args.email),
        password: Some(args.password),
        phone: args.phone,
    };

    match directory.register(&request).await {
        Ok(payload) => {
            println!(
                "Created user '{}' with id {}",
                payload.user.email, payload.user.user_id
            );
            Ok(())
        }
        Err(DirectoryError::Validation(errors)) => {
            for error in errors {
                writeln!(io::stderr(), "error: {}: {}", error.field, error.message)?;
            }
            std::process::exit(1);
        }
        Err(DirectoryError::DuplicateEmail) => {
            writeln!(io::stderr(), "error: a user with that email already exists.")?;
            std::process::exit(1);
        }
        Err(err) => Err(err.into()),
    }
}
