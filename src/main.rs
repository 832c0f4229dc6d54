use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taquilla::config::Config;
use taquilla::db::{create_pool, init_db, queries, AppState};
use taquilla::gateway::MercadoPagoClient;
use taquilla::handlers;
use taquilla::models::CreateEvent;

#[derive(Parser, Debug)]
#[command(name = "taquilla")]
#[command(about = "MercadoPago payment reconciliation service for event ticketing")]
struct Cli {
    /// Seed the database with dev data (event, order)
    #[arg(long)]
    seed: bool,

    /// Delete the database on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

/// Seeds the database with dev data for testing.
/// Creates an event with limited capacity and a pending order.
/// Only runs in dev mode and when the database is empty.
fn seed_dev_data(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    let existing = queries::count_events(&conn).expect("Failed to count events");
    if existing > 0 {
        tracing::info!("Database already has data, skipping seed");
        return;
    }

    tracing::info!("============================================");
    tracing::info!("SEEDING DEV DATA");
    tracing::info!("============================================");

    let event = queries::create_event(
        &conn,
        &CreateEvent {
            slug: "demo-night".to_string(),
            name: "Demo Night".to_string(),
            currency: "ARS".to_string(),
            capacity: Some(50),
        },
    )
    .expect("Failed to create dev event");

    tracing::info!("Event: {} (slug: {})", event.name, event.slug);

    let order =
        queries::create_order(&conn, &event.id, 250_000).expect("Failed to create dev order");

    tracing::info!("Order: {} (secret: {})", order.code, order.secret);
    tracing::info!("============================================");
    tracing::info!("DEV DATA SEEDED SUCCESSFULLY");
    tracing::info!("============================================");

    // Copy-paste friendly output for manual testing
    println!();
    println!("--- COPY FROM HERE ---");
    println!("  event_slug: {}", event.slug);
    println!("  order_code: {}", order.code);
    println!("  order_secret: {}", order.secret);
    println!("--- END COPY ---");
    println!();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taquilla=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let state = AppState {
        db: db_pool,
        gateway: MercadoPagoClient::new(&config.mp_api_base, &config.mp_access_token),
        base_url: config.base_url.clone(),
        shop_url: config.shop_url.clone(),
    };

    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set TAQUILLA_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    let app = handlers::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    let db_path = config.database_path.clone();

    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: database will be deleted on exit");
    }

    tracing::info!("Taquilla server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");

    if cleanup_on_exit {
        tracing::info!("Cleaning up ephemeral database...");
        if let Err(e) = std::fs::remove_file(&db_path) {
            tracing::warn!("Failed to remove {}: {}", db_path, e);
        } else {
            tracing::info!("Removed {}", db_path);
        }
        let _ = std::fs::remove_file(format!("{}-wal", db_path));
        let _ = std::fs::remove_file(format!("{}-shm", db_path));
        tracing::info!("Ephemeral cleanup complete");
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
