use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use enrollment::config::Config;
use enrollment::db::{AppState, create_pool, init_db, queries};
use enrollment::handlers;
use enrollment::lifecycle::{self, LeadCommand, WorkflowContext};
use enrollment::models::{CreateLead, DiscountType, SetOffer};

#[derive(Parser, Debug)]
#[command(name = "enrollment")]
#[command(about = "Lead lifecycle and payment ledger for course enrollment")]
struct Cli {
    /// Seed the database with a sample lead (dev mode only)
    #[arg(long)]
    seed: bool,

    /// Delete the database on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

/// Creates a tested lead with an offer so the payment screens have something
/// to work on. Skipped when the sample phone is already registered.
fn seed_dev_data(state: &AppState) -> enrollment::error::Result<()> {
    const SAMPLE_PHONE: &str = "01000000001";

    let mut conn = state.db.get()?;
    if queries::get_lead_by_phone(&conn, SAMPLE_PHONE)?.is_some() {
        tracing::info!("Sample lead already present, skipping seed");
        return Ok(());
    }

    let lead = lifecycle::create_lead(
        &mut conn,
        &CreateLead {
            full_name: "Sample Student".to_string(),
            phone: SAMPLE_PHONE.to_string(),
            source: Some("walk_in".to_string()),
            notes: Some("Created by --seed".to_string()),
        },
    )?;

    let ctx = WorkflowContext::for_state(state);
    lifecycle::execute(
        &mut conn,
        &ctx,
        &lead.id,
        LeadCommand::MarkTested(lifecycle::MarkTested {
            assigned_level: Some(2),
            test_notes: None,
        }),
    )?;
    let outcome = lifecycle::execute(
        &mut conn,
        &ctx,
        &lead.id,
        LeadCommand::SendOffer(SetOffer {
            bundle_levels: Some(3),
            discount_value: 0,
            discount_type: DiscountType::Amount,
            final_price: None,
        }),
    )?;

    tracing::info!("============================================");
    tracing::info!("Seeded lead {} ({})", outcome.lead.id, outcome.lead.status);
    tracing::info!("============================================");
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "enrollment=debug,tower_http=debug".into()),
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
        current_round: config.current_round,
    };
    tracing::info!("Current intake round: {}", state.current_round);

    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set ENROLLMENT_ENV=dev)");
        } else if let Err(e) = seed_dev_data(&state) {
            tracing::error!("Failed to seed dev data: {}", e);
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

    tracing::info!("Enrollment server listening on {}", addr);

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
        // WAL mode leaves these behind
        let _ = std::fs::remove_file(format!("{}-wal", db_path));
        let _ = std::fs::remove_file(format!("{}-shm", db_path));
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
