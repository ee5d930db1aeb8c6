use std::net::SocketAddr;
use std::sync::Arc;
use anyhow::Context;
use horizons_api::{app, health::HealthProbe, metrics::Metrics, state::{AppState, AuthConfig}, worker};
use horizons_booking::{BookingService, EventHandler, PaymentEventHandler, UserEventHandler};
use horizons_shared::models::events::topics;
use horizons_store::{
    app_config::Config, declare_topics, DbClient, EventConsumer, EventProducer,
    StoreBookingRepository, StoreSeatRepository,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "horizons_api=debug,horizons_booking=debug,horizons_store=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting booking service on port {}", config.server.port);

    // Postgres
    let db = DbClient::new(&config.database)
        .await
        .context("Failed to connect to Postgres")?;
    if config.database.migrate {
        db.migrate().await.context("Failed to run migrations")?;
    }

    // Kafka
    if let Err(e) = declare_topics(&config.kafka, &topics::ALL).await {
        tracing::warn!("Could not declare topics, relying on broker auto-creation: {}", e);
    }
    let producer = EventProducer::new(&config.kafka).context("Failed to create Kafka producer")?;

    let metrics = Arc::new(Metrics::new().context("Failed to register metrics")?);

    let bookings = Arc::new(BookingService::new(
        Arc::new(StoreBookingRepository::new(db.pool.clone())),
        Arc::new(producer.clone()),
    ));

    let handlers: Vec<Arc<dyn EventHandler>> = vec![
        Arc::new(PaymentEventHandler::new(bookings.clone())),
        Arc::new(UserEventHandler::new(bookings.clone())),
    ];
    for handler in handlers {
        let consumer = EventConsumer::subscribe(&config.kafka, handler.name(), handler.topics())
            .with_context(|| format!("Failed to subscribe consumer {}", handler.name()))?;
        tokio::spawn(worker::run_consumer(consumer, handler, metrics.clone()));
    }

    let probes: Vec<Arc<dyn HealthProbe>> = vec![Arc::new(db.clone()), Arc::new(producer)];

    let app_state = AppState {
        bookings,
        seats: Arc::new(StoreSeatRepository::new(db.pool.clone())),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            allowed_roles: config.auth.allowed_roles.clone(),
        },
        metrics,
        probes,
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
