use aerobook_catalog::PricingEngine;
use aerobook_core::repository::CabinOccupancy;
use aerobook_core::{Actor, BookingStore, CoreError, CoreResult, FlightStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Reverse;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct FlightReport {
    pub flight_number: String,
    pub departure_airport: String,
    pub arrival_airport: String,
    pub departure_time: DateTime<Utc>,
    pub status: FlightStatus,
    pub capacity: u32,
    pub sold: u32,
    pub sold_by_cabin: CabinOccupancy,
    /// Percent, one decimal place.
    pub occupancy: f64,
    /// Superusers only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSnapshot {
    pub generated_at: DateTime<Utc>,
    pub total_flights: usize,
    pub total_tickets: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_revenue: Option<i64>,
    pub flights: Vec<FlightReport>,
}

fn occupancy_percent(sold: u32, capacity: u32) -> f64 {
    if capacity == 0 {
        return 0.0;
    }
    (f64::from(sold) / f64::from(capacity) * 1000.0).round() / 10.0
}

#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn BookingStore>,
}

impl ReportService {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    /// Per-flight sales figures. Revenue is shown to superusers, who get the
    /// list ordered by revenue; other staff see it ordered by seats sold.
    pub async fn snapshot(&self, actor: &Actor, now: DateTime<Utc>) -> CoreResult<ReportSnapshot> {
        actor.require_staff("view reports")?;
        let show_financials = actor.is_superuser;

        let flights = self.store.list_flights().await?;
        let occupancy = self.store.occupancy_by_flight().await?;

        let mut reports = Vec::with_capacity(flights.len());
        for flight in &flights {
            let aircraft = self.store.get_aircraft(flight.aircraft_id).await?.ok_or_else(|| {
                CoreError::IntegrityError(format!("aircraft {} is missing", flight.aircraft_id))
            })?;
            let sold = occupancy.get(&flight.flight_number).copied().unwrap_or_default();
            let capacity = aircraft.total_capacity();

            reports.push(FlightReport {
                flight_number: flight.flight_number.clone(),
                departure_airport: flight.departure_airport.clone(),
                arrival_airport: flight.arrival_airport.clone(),
                departure_time: flight.departure_time,
                status: flight.status,
                capacity,
                sold: sold.total(),
                sold_by_cabin: sold,
                occupancy: occupancy_percent(sold.total(), capacity),
                revenue: show_financials.then(|| PricingEngine::revenue(flight, &sold)),
            });
        }

        if show_financials {
            reports.sort_by_key(|r| Reverse(r.revenue.unwrap_or(0)));
        } else {
            reports.sort_by_key(|r| Reverse(r.sold));
        }

        let total_tickets = reports.iter().map(|r| r.sold).sum();
        let total_revenue = show_financials.then(|| reports.iter().filter_map(|r| r.revenue).fold(0, i64::saturating_add));

        Ok(ReportSnapshot {
            generated_at: now,
            total_flights: flights.len(),
            total_tickets,
            total_revenue,
            flights: reports,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixture, request};
    use aerobook_core::CabinClass;
    use chrono::Duration;

    #[test]
    fn test_occupancy_rounding() {
        assert_eq!(occupancy_percent(1, 3), 33.3);
        assert_eq!(occupancy_percent(2, 3), 66.7);
        assert_eq!(occupancy_percent(5, 0), 0.0);
    }

    #[tokio::test]
    async fn test_revenue_only_for_superusers() {
        let fx = fixture().await;
        fx.add_flight("EK777", fx.now + Duration::days(5)).await;
        let ledger = fx.ledger();

        // EK202: one first-class seat (1000). EK777: three economy seats (300).
        ledger
            .create_booking(&fx.passenger, request(CabinClass::First, &["1A"]), fx.now)
            .await
            .unwrap();
        let mut req = request(CabinClass::Economy, &["20A", "20B", "20C"]);
        req.flight_number = "EK777".into();
        ledger.create_booking(&fx.passenger, req, fx.now).await.unwrap();

        let staff = fx.reports().snapshot(&Actor::staff("ops"), fx.now).await.unwrap();
        assert_eq!(staff.total_flights, 2);
        assert_eq!(staff.total_tickets, 4);
        assert!(staff.total_revenue.is_none());
        assert_eq!(staff.flights[0].flight_number, "EK777");
        assert!(staff.flights.iter().all(|f| f.revenue.is_none()));

        let root = fx.reports().snapshot(&Actor::superuser("root"), fx.now).await.unwrap();
        assert_eq!(root.flights[0].flight_number, "EK202");
        assert_eq!(root.flights[0].revenue, Some(1000));
        assert_eq!(root.total_revenue, Some(1300));
        assert_eq!(root.flights[1].occupancy, 18.8);

        assert!(matches!(
            fx.reports().snapshot(&fx.passenger, fx.now).await,
            Err(CoreError::AuthorizationError(_))
        ));
    }
}
