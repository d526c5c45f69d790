pub mod app_config;
pub mod database;
#[cfg(feature = "kafka")]
pub mod events;
pub mod memory_store;
pub mod pg_store;
pub mod redis_repo;

pub use database::DbClient;
#[cfg(feature = "kafka")]
pub use events::KafkaEventPublisher;
pub use memory_store::InMemoryBookingStore;
pub use pg_store::PgBookingStore;
pub use redis_repo::RedisClient;
