use aerobook_core::repository::CabinOccupancy;
use aerobook_core::{Booking, CabinClass, Flight};
use serde::Serialize;

/// Price of a number of seats in one cabin, in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceQuote {
    pub flight_number: String,
    pub cabin_class: CabinClass,
    pub unit_price: i64,
    pub passengers: u32,
    pub total: i64,
}

/// Fixed fare table lookup. Prices live on the flight; there is no
/// dynamic adjustment. Validated prices never overflow a total, so
/// saturation only shows up on rows written around `Flight::validate`.
pub struct PricingEngine;

impl PricingEngine {
    pub fn quote(flight: &Flight, cabin: CabinClass, passengers: u32) -> PriceQuote {
        let unit_price = flight.cabin_price(cabin);
        PriceQuote {
            flight_number: flight.flight_number.clone(),
            cabin_class: cabin,
            unit_price,
            passengers,
            total: unit_price.saturating_mul(i64::from(passengers)),
        }
    }

    /// Amount charged when the booking is paid: cabin price times the
    /// current passenger count.
    pub fn payment_amount(flight: &Flight, booking: &Booking) -> i64 {
        Self::quote(flight, booking.cabin_class, booking.number_of_passengers).total
    }

    /// Sold seats per cabin times that cabin's price.
    pub fn revenue(flight: &Flight, sold: &CabinOccupancy) -> i64 {
        CabinClass::ALL
            .iter()
            .map(|cabin| flight.cabin_price(*cabin).saturating_mul(i64::from(sold.get(*cabin))))
            .fold(0, i64::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerobook_core::FlightStatus;
    use chrono::{Duration, TimeZone, Utc};

    fn flight() -> Flight {
        let dep = Utc.with_ymd_and_hms(2026, 12, 1, 9, 0, 0).unwrap();
        Flight {
            flight_number: "QR7".into(),
            departure_time: dep,
            arrival_time: dep + Duration::hours(3),
            economy_price: 100,
            business_price: 500,
            first_class_price: 1000,
            departure_airport: "DOH".into(),
            arrival_airport: "DXB".into(),
            aircraft_id: 1,
            status: FlightStatus::Scheduled,
        }
    }

    #[test]
    fn test_quote_multiplies_cabin_price() {
        let q = PricingEngine::quote(&flight(), CabinClass::Business, 2);
        assert_eq!(q.unit_price, 500);
        assert_eq!(q.total, 1000);
    }

    #[test]
    fn test_payment_amount_uses_current_passenger_count() {
        let f = flight();
        let mut booking = Booking::new_pending("QR7", None, CabinClass::First, 3, f.departure_time);
        booking.release_one_ticket();
        assert_eq!(PricingEngine::payment_amount(&f, &booking), 2000);
    }

    #[test]
    fn test_revenue() {
        let sold = CabinOccupancy {
            economy: 10,
            business: 2,
            first: 1,
        };
        assert_eq!(PricingEngine::revenue(&flight(), &sold), 1000 + 1000 + 1000);
    }

    #[test]
    fn test_oversized_price_saturates_instead_of_panicking() {
        let mut f = flight();
        f.economy_price = i64::MAX / 2 + 1;
        f.first_class_price = i64::MAX;

        assert_eq!(PricingEngine::quote(&f, CabinClass::Economy, 2).total, i64::MAX);

        let sold = CabinOccupancy {
            economy: 2,
            business: 0,
            first: 1,
        };
        assert_eq!(PricingEngine::revenue(&f, &sold), i64::MAX);
    }

    #[test]
    fn test_largest_valid_price_fits_any_passenger_count() {
        let mut f = flight();
        f.business_price = aerobook_core::flight::MAX_CABIN_PRICE;
        let q = PricingEngine::quote(&f, CabinClass::Business, u32::MAX);
        assert_eq!(q.total, aerobook_core::flight::MAX_CABIN_PRICE * i64::from(u32::MAX));
    }
}
