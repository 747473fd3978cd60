use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use gatehouse::logging::init_tracing;
use gatehouse::metrics::init_metrics;
use gatehouse::router::init_router;
use gatehouse::state::AppState;
use gatehouse_config::{DatabaseConfig, ServerConfig};
use gatehouse_db::{PgPool, PgStore, RoleRepository, init_db_pool, migrator};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "gatehouse")]
#[command(about = "Gatehouse - admin API with JWT auth, RBAC and rate limiting", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Create an administrator account
    CreateAdmin {
        /// Login name
        #[arg(short = 'u', long)]
        username: String,

        /// Email address
        #[arg(short = 'e', long)]
        email: String,

        /// Password (6 characters or more)
        #[arg(short = 'p', long)]
        password: String,

        /// Role code to assign
        #[arg(short = 'r', long, default_value = "admin")]
        role: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    let server_config = ServerConfig::from_env();
    init_tracing(&server_config.log_dir)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(server_config).await,
        Commands::CreateAdmin {
            username,
            email,
            password,
            role,
        } => {
            let store = PgStore::new(connect(&DatabaseConfig::from_env()).await?);
            let user =
                gatehouse::cli::create_admin(&store, &username, &email, &password, &role).await?;
            println!("✅ Account '{}' created with role '{}'", user.username, role);
            Ok(())
        }
    }
}

async fn connect(config: &DatabaseConfig) -> anyhow::Result<PgPool> {
    let url = config
        .url
        .as_deref()
        .context("DATABASE_URL must be set")?;
    let pool = init_db_pool(url, config.max_connections)
        .await
        .context("Failed to connect to database")?;

    if config.auto_migrate {
        migrator()
            .run(&pool)
            .await
            .context("Failed to run migrations")?;
        info!("Database migrations applied");
    }

    Ok(pool)
}

async fn serve(server_config: ServerConfig) -> anyhow::Result<()> {
    let store = Arc::new(PgStore::new(connect(&DatabaseConfig::from_env()).await?));
    store
        .ensure_predefined_roles()
        .await
        .context("Failed to seed predefined roles")?;

    let mut state = AppState::from_env(store);
    match init_metrics() {
        Ok(handle) => state = state.with_metrics(handle),
        Err(e) => warn!(error = %e, "Prometheus recorder not installed, /metrics disabled"),
    }

    let _sweeper = state.rate_limiter.spawn_sweeper();
    let app = init_router(state);

    let address = server_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;

    info!(%address, "🚀 Server running");
    info!("📖 Scalar UI available at http://{address}/scalar");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
