use aerobook_api::{app, AppState, AuthConfig};
use aerobook_core::{events::EventPublisher, BookingStore};
use aerobook_store::{app_config::Config, DbClient, InMemoryBookingStore, PgBookingStore, RedisClient};
use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aerobook_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting AeroBook API on port {}", config.server.port);

    let store: Arc<dyn BookingStore> = match &config.database {
        Some(db) => {
            let client = DbClient::new(&db.url, db.max_connections)
                .await
                .context("Failed to connect to Postgres")?;
            client.migrate().await.context("Failed to run migrations")?;
            Arc::new(PgBookingStore::new(client.pool))
        }
        None => {
            tracing::warn!("No database configured, bookings are kept in memory only");
            Arc::new(InMemoryBookingStore::new())
        }
    };

    let redis = match &config.redis {
        Some(redis) => Some(Arc::new(
            RedisClient::new(&redis.url)
                .await
                .context("Failed to connect to Redis")?,
        )),
        None => None,
    };

    let events = event_publisher(&config)?;

    let state = AppState::new(
        store,
        events,
        redis,
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
        config.business_rules.clone(),
    );

    tokio::spawn(aerobook_api::worker::start_expiry_worker(
        state.sweeper.clone(),
        config.business_rules.sweep_interval(),
    ));

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[cfg(feature = "kafka")]
fn event_publisher(config: &Config) -> anyhow::Result<Arc<dyn EventPublisher>> {
    match &config.kafka {
        Some(kafka) => {
            let producer = aerobook_store::KafkaEventPublisher::new(&kafka.brokers)
                .context("Failed to create Kafka producer")?;
            Ok(Arc::new(producer))
        }
        None => Ok(Arc::new(aerobook_core::events::NoopPublisher)),
    }
}

#[cfg(not(feature = "kafka"))]
fn event_publisher(config: &Config) -> anyhow::Result<Arc<dyn EventPublisher>> {
    if config.kafka.is_some() {
        tracing::warn!("Kafka configured but the `kafka` feature is disabled; events are dropped");
    }
    Ok(Arc::new(aerobook_core::events::NoopPublisher))
}
