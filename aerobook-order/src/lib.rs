pub mod cancellation;
pub mod expiry;
pub mod finalizer;
pub mod ledger;
pub mod manifest;
pub mod reports;

#[cfg(test)]
mod test_support;

pub use cancellation::{CancellationOutcome, TicketCancellation};
pub use expiry::ExpirySweeper;
pub use finalizer::{PaymentFinalizer, PaymentQuote, PaymentResult};
pub use ledger::{BookingDetails, BookingLedger, BookingReceipt, MyBookings, NewBookingRequest};
pub use manifest::{Manifest, ManifestQuery, ManifestService, ManifestSort};
pub use reports::{ReportService, ReportSnapshot};
