use aerobook_catalog::{PriceQuote, PricingEngine};
use aerobook_core::events::{publish_event, EventPublisher};
use aerobook_core::repository::PaymentOutcome;
use aerobook_core::{
    Actor, Booking, BookingStore, CoreError, CoreResult, Flight, Payment, PaymentMethod,
};
use aerobook_shared::models::events::{BookingConfirmedEvent, TOPIC_BOOKING_CONFIRMED};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentResult {
    Paid {
        booking: Booking,
        payment: Payment,
        amount: i64,
    },
    /// A payment already exists; nothing was written.
    AlreadyConfirmed { booking: Booking },
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentQuote {
    pub booking: Booking,
    pub quote: PriceQuote,
}

/// Confirms Pending bookings against a single recorded payment.
#[derive(Clone)]
pub struct PaymentFinalizer {
    store: Arc<dyn BookingStore>,
    events: Arc<dyn EventPublisher>,
}

impl PaymentFinalizer {
    pub fn new(store: Arc<dyn BookingStore>, events: Arc<dyn EventPublisher>) -> Self {
        Self { store, events }
    }

    async fn owned_booking(&self, booking_id: Uuid, actor: &Actor) -> CoreResult<(Booking, Flight)> {
        let booking = self
            .store
            .get_booking(booking_id)
            .await?
            .filter(|b| b.is_owned_by(actor))
            .ok_or_else(|| CoreError::NotFound(format!("booking {}", booking_id)))?;
        let flight = self
            .store
            .get_flight(&booking.flight_number)
            .await?
            .ok_or_else(|| CoreError::IntegrityError(format!("flight {} is missing", booking.flight_number)))?;
        Ok((booking, flight))
    }

    /// Amount due for the checkout page. Read only.
    pub async fn quote(&self, booking_id: Uuid, actor: &Actor) -> CoreResult<PaymentQuote> {
        let (booking, flight) = self.owned_booking(booking_id, actor).await?;
        if booking.is_cancelled() {
            return Err(CoreError::StateError(format!("booking {} is cancelled", booking_id)));
        }
        let quote = PricingEngine::quote(&flight, booking.cabin_class, booking.number_of_passengers);
        Ok(PaymentQuote { booking, quote })
    }

    pub async fn pay(
        &self,
        booking_id: Uuid,
        actor: &Actor,
        method: PaymentMethod,
        now: DateTime<Utc>,
    ) -> CoreResult<PaymentResult> {
        let (_, flight) = self.owned_booking(booking_id, actor).await?;
        let payment = Payment::new(booking_id, method, now);

        // Status is decided by the store on the locked row, not on the copy
        // read above.
        match self.store.confirm_payment(booking_id, &payment).await? {
            PaymentOutcome::Confirmed { booking, payment } => {
                let amount = PricingEngine::payment_amount(&flight, &booking);
                info!(
                    "Booking {} confirmed by payment {} ({} via {})",
                    booking.id, payment.id, amount, payment.method
                );

                let event = BookingConfirmedEvent {
                    booking_id: booking.id,
                    payment_id: payment.id,
                    flight_number: booking.flight_number.clone(),
                    amount,
                    timestamp: now.timestamp(),
                };
                publish_event(self.events.as_ref(), TOPIC_BOOKING_CONFIRMED, &booking.id.to_string(), &event).await;

                Ok(PaymentResult::Paid {
                    booking,
                    payment,
                    amount,
                })
            }
            PaymentOutcome::AlreadyConfirmed(booking) => {
                info!("Booking {} already confirmed; payment ignored", booking.id);
                Ok(PaymentResult::AlreadyConfirmed { booking })
            }
            PaymentOutcome::Rejected(booking) => Err(CoreError::StateError(format!(
                "booking {} is cancelled and cannot be paid",
                booking.id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixture, request};
    use aerobook_core::{BookingStatus, CabinClass};
    use aerobook_shared::models::events::TOPIC_BOOKING_CREATED;
    use chrono::Duration;

    #[tokio::test]
    async fn test_pay_confirms_once() {
        let fx = fixture().await;
        let receipt = fx
            .ledger()
            .create_booking(&fx.passenger, request(CabinClass::First, &["1A", "1B"]), fx.now)
            .await
            .unwrap();
        let id = receipt.booking.id;
        let finalizer = fx.finalizer();

        let first = finalizer.pay(id, &fx.passenger, PaymentMethod::CreditCard, fx.now).await.unwrap();
        let payment_id = match first {
            PaymentResult::Paid { booking, payment, amount } => {
                assert_eq!(booking.status, BookingStatus::Confirmed);
                assert_eq!(amount, 2000);
                payment.id
            }
            other => panic!("unexpected result {:?}", other),
        };

        let again = finalizer.pay(id, &fx.passenger, PaymentMethod::Cash, fx.now).await.unwrap();
        assert!(matches!(again, PaymentResult::AlreadyConfirmed { .. }));

        let stored = fx.store.get_payment(id).await.unwrap().unwrap();
        assert_eq!(stored.id, payment_id);
        assert_eq!(stored.method, PaymentMethod::CreditCard);
        assert_eq!(
            fx.events.topics(),
            vec![TOPIC_BOOKING_CREATED, TOPIC_BOOKING_CONFIRMED]
        );
    }

    #[tokio::test]
    async fn test_cancelled_booking_cannot_be_paid() {
        let fx = fixture().await;
        let receipt = fx
            .ledger()
            .create_booking(&fx.passenger, request(CabinClass::Economy, &["2C"]), fx.now)
            .await
            .unwrap();
        fx.sweeper().sweep(fx.now + Duration::minutes(10)).await;

        let err = fx
            .finalizer()
            .pay(receipt.booking.id, &fx.passenger, PaymentMethod::Wallet, fx.now)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::StateError(_)));
        assert!(fx.store.get_payment(receipt.booking.id).await.unwrap().is_none());
        assert!(matches!(
            fx.finalizer().quote(receipt.booking.id, &fx.passenger).await,
            Err(CoreError::StateError(_))
        ));
    }

    #[tokio::test]
    async fn test_only_owner_can_pay() {
        let fx = fixture().await;
        let receipt = fx
            .ledger()
            .create_booking(&fx.passenger, request(CabinClass::Economy, &["2D"]), fx.now)
            .await
            .unwrap();
        assert!(matches!(
            fx.finalizer()
                .pay(receipt.booking.id, &Actor::passenger("other"), PaymentMethod::Cash, fx.now)
                .await,
            Err(CoreError::NotFound(_))
        ));
        assert!(fx.store.get_payment(receipt.booking.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_quote_tracks_passenger_count() {
        let fx = fixture().await;
        let receipt = fx
            .ledger()
            .create_booking(&fx.passenger, request(CabinClass::Business, &["3C", "3D"]), fx.now)
            .await
            .unwrap();
        fx.cancellation()
            .cancel_ticket(receipt.tickets[0].id, &fx.passenger, fx.now)
            .await
            .unwrap();

        let q = fx.finalizer().quote(receipt.booking.id, &fx.passenger).await.unwrap();
        assert_eq!(q.quote.passengers, 1);
        assert_eq!(q.quote.total, 500);
    }

    #[tokio::test]
    async fn test_concurrent_payments_record_one() {
        let fx = fixture().await;
        let receipt = fx
            .ledger()
            .create_booking(&fx.passenger, request(CabinClass::Economy, &["4C"]), fx.now)
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..5 {
            let finalizer = fx.finalizer();
            let actor = fx.passenger.clone();
            let id = receipt.booking.id;
            let now = fx.now;
            handles.push(tokio::spawn(async move {
                finalizer.pay(id, &actor, PaymentMethod::CreditCard, now).await
            }));
        }

        let mut paid = 0;
        for handle in handles {
            if let PaymentResult::Paid { .. } = handle.await.unwrap().unwrap() {
                paid += 1;
            }
        }
        assert_eq!(paid, 1);
    }
}
