use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use appointment_cell::models::SchedulingConfig;
use appointment_cell::router::AppointmentState;
use appointment_cell::services::{
    AppointmentBookingService, InMemoryAppointmentStore, InMemoryDirectory, SlotService,
};
use doctor_cell::router::DoctorState;
use doctor_cell::services::{AvailabilityBlockService, InMemoryScheduleStore, WeeklyScheduleService};
use shared_config::AppConfig;
use shared_utils::clock::SystemClock;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic scheduling API server");

    // Load configuration
    let config = AppConfig::from_env();

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = build_app(&config)
        .await?
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new()
                    .level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new()
                    .level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let listener = TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Wires the in-memory stores and services of both cells.
async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let scheduling = SchedulingConfig::from(config);

    let seed_path = config
        .directory_seed_path
        .as_deref()
        .filter(|_| config.has_directory_seed());
    let directory = match seed_path {
        Some(path) => InMemoryDirectory::load(path)
            .await
            .with_context(|| format!("failed to load directory seed {}", path))?,
        None => {
            warn!("DIRECTORY_SEED_PATH not set, starting with an empty directory");
            InMemoryDirectory::new()
        }
    };
    let directory = Arc::new(directory);

    let schedule_store = Arc::new(InMemoryScheduleStore::new());
    let schedule = Arc::new(WeeklyScheduleService::new(schedule_store.clone(), directory.clone()));
    let blocks = Arc::new(AvailabilityBlockService::new(schedule_store, directory.clone()));

    let appointments = Arc::new(InMemoryAppointmentStore::new());
    let clock = Arc::new(SystemClock);

    let booking = Arc::new(AppointmentBookingService::new(
        appointments.clone(),
        directory.clone(),
        schedule.clone(),
        blocks.clone(),
        clock.clone(),
        scheduling.clone(),
    ));
    let slots = Arc::new(SlotService::new(
        schedule.clone(),
        blocks.clone(),
        appointments,
        directory,
        clock,
        scheduling.slot_granularity_minutes,
    ));

    info!("Scheduling engine ready (granularity {} min, lock timeout {:?})",
          scheduling.slot_granularity_minutes, scheduling.lock_timeout);

    Ok(router::create_router(
        DoctorState { schedule, blocks },
        AppointmentState { booking, slots },
    ))
}
