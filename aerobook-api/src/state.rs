use aerobook_catalog::{InventoryService, ScheduleService};
use aerobook_core::events::EventPublisher;
use aerobook_core::BookingStore;
use aerobook_order::{
    BookingLedger, ExpirySweeper, ManifestService, PaymentFinalizer, ReportService,
    TicketCancellation,
};
use aerobook_store::app_config::BusinessRules;
use aerobook_store::RedisClient;
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    /// Rate limiting is skipped when absent.
    pub redis: Option<Arc<RedisClient>>,
    pub auth: AuthConfig,
    pub business_rules: BusinessRules,
    pub inventory: InventoryService,
    pub schedule: ScheduleService,
    pub ledger: BookingLedger,
    pub cancellation: TicketCancellation,
    pub finalizer: PaymentFinalizer,
    pub sweeper: ExpirySweeper,
    pub manifest: ManifestService,
    pub reports: ReportService,
}

impl AppState {
    pub fn new(
        store: Arc<dyn BookingStore>,
        events: Arc<dyn EventPublisher>,
        redis: Option<Arc<RedisClient>>,
        auth: AuthConfig,
        business_rules: BusinessRules,
    ) -> Self {
        let grace = business_rules.pending_grace();
        Self {
            redis,
            auth,
            inventory: InventoryService::new(store.clone()),
            schedule: ScheduleService::new(store.clone()),
            ledger: BookingLedger::new(store.clone(), events.clone()),
            cancellation: TicketCancellation::new(store.clone(), events.clone()),
            finalizer: PaymentFinalizer::new(store.clone(), events.clone()),
            sweeper: ExpirySweeper::new(store.clone(), events, grace),
            manifest: ManifestService::new(store.clone()),
            reports: ReportService::new(store),
            business_rules,
        }
    }
}
