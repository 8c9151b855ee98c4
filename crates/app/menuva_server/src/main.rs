//! Menuva gateway server binary.

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use menuva_api::config::ApiConfig;

/// CLI arguments for the gateway server.
#[derive(Parser, Debug)]
#[command(name = "menuva_server", about = "Menuva gateway server")]
struct Args {
    /// Address to bind (host:port).
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3200")]
    bind_addr: String,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/menuva"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,menuva_api=debug,menuva_core=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env();
    config.bind_addr = args.bind_addr;
    config.database_url = args.database_url.clone();

    info!(
        bind_addr = %config.bind_addr,
        production = config.production,
        "starting menuva_server"
    );

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&args.database_url)
        .await?;

    info!("running database migrations");
    menuva_api::migrate(&pool).await?;

    let state = menuva_api::AppState::new(pool, config.clone());
    let app = menuva_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "gateway listening");

    // ConnectInfo gives the rate limiter a peer address to fall back on
    // when no forwarded-for header is present.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
