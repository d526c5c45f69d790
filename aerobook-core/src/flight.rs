use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{CoreError, CoreResult, FieldError};

/// Cabin class; partitions both aircraft capacity and flight pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CabinClass {
    #[serde(alias = "economy")]
    Economy,
    #[serde(alias = "business")]
    Business,
    #[serde(alias = "first")]
    First,
}

impl CabinClass {
    pub const ALL: [CabinClass; 3] = [CabinClass::First, CabinClass::Business, CabinClass::Economy];

    pub fn as_str(&self) -> &'static str {
        match self {
            CabinClass::Economy => "Economy",
            CabinClass::Business => "Business",
            CabinClass::First => "First",
        }
    }
}

impl fmt::Display for CabinClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown cabin class: {0}")]
pub struct UnknownCabinClass(pub String);

impl FromStr for CabinClass {
    type Err = UnknownCabinClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "economy" => Ok(CabinClass::Economy),
            "business" => Ok(CabinClass::Business),
            "first" | "first_class" | "first class" => Ok(CabinClass::First),
            _ => Err(UnknownCabinClass(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlightStatus {
    Scheduled,
    Delayed,
    Cancelled,
    Landed,
}

impl FlightStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightStatus::Scheduled => "Scheduled",
            FlightStatus::Delayed => "Delayed",
            FlightStatus::Cancelled => "Cancelled",
            FlightStatus::Landed => "Landed",
        }
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlightStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Scheduled" => Ok(FlightStatus::Scheduled),
            "Delayed" => Ok(FlightStatus::Delayed),
            "Cancelled" => Ok(FlightStatus::Cancelled),
            "Landed" => Ok(FlightStatus::Landed),
            other => Err(CoreError::IntegrityError(format!(
                "unknown flight status: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Airport {
    pub code: String,
    pub name: String,
    pub city: String,
    pub country: String,
}

impl Airport {
    pub fn validate(&self) -> CoreResult<()> {
        if self.code.len() != 3 || !self.code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(CoreError::invalid(
                "code",
                "airport code must be three uppercase letters",
            ));
        }
        if self.name.trim().is_empty() || self.city.trim().is_empty() {
            return Err(CoreError::invalid("name", "name and city are required"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAircraft {
    pub model: String,
    pub economy_seats: u32,
    pub business_seats: u32,
    pub first_seats: u32,
}

/// Aircraft model with its fixed seat configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aircraft {
    pub id: i64,
    pub model: String,
    pub economy_seats: u32,
    pub business_seats: u32,
    pub first_seats: u32,
}

impl Aircraft {
    pub fn from_new(id: i64, new: &NewAircraft) -> Self {
        Self {
            id,
            model: new.model.clone(),
            economy_seats: new.economy_seats,
            business_seats: new.business_seats,
            first_seats: new.first_seats,
        }
    }

    pub fn capacity(&self, cabin: CabinClass) -> u32 {
        match cabin {
            CabinClass::Economy => self.economy_seats,
            CabinClass::Business => self.business_seats,
            CabinClass::First => self.first_seats,
        }
    }

    pub fn total_capacity(&self) -> u32 {
        self.economy_seats + self.business_seats + self.first_seats
    }
}

/// Upper bound for a single cabin price in minor units. Any price up to
/// this times any `u32` passenger count still fits in an `i64`.
pub const MAX_CABIN_PRICE: i64 = 1_000_000_000;

/// A scheduled flight. Prices are in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flight {
    pub flight_number: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub economy_price: i64,
    pub business_price: i64,
    pub first_class_price: i64,
    pub departure_airport: String,
    pub arrival_airport: String,
    pub aircraft_id: i64,
    pub status: FlightStatus,
}

impl Flight {
    /// Checks timing, route and pricing rules, reporting every broken one.
    pub fn validate(&self) -> CoreResult<()> {
        let mut errors = Vec::new();

        if self.flight_number.trim().is_empty() || self.flight_number.len() > 10 {
            errors.push(FieldError::new(
                "flight_number",
                "flight number must be 1 to 10 characters",
            ));
        }
        if self.departure_time >= self.arrival_time {
            errors.push(FieldError::new(
                "departure_time",
                "departure time must be before arrival time",
            ));
        }
        if self.departure_airport == self.arrival_airport {
            errors.push(FieldError::new(
                "arrival_airport",
                "departure and arrival airports cannot be the same",
            ));
        }
        for cabin in CabinClass::ALL {
            let price = self.cabin_price(cabin);
            if !(0..=MAX_CABIN_PRICE).contains(&price) {
                errors.push(FieldError::new(
                    format!("{}_price", cabin.as_str().to_lowercase()),
                    format!("prices must be between 0 and {}", MAX_CABIN_PRICE),
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CoreError::ValidationError(errors))
        }
    }

    pub fn cabin_price(&self, cabin: CabinClass) -> i64 {
        match cabin {
            CabinClass::Economy => self.economy_price,
            CabinClass::Business => self.business_price,
            CabinClass::First => self.first_class_price,
        }
    }

    pub fn flight_time(&self) -> Duration {
        self.arrival_time - self.departure_time
    }

    /// Ticket holders may only cancel while this is false.
    pub fn has_departed(&self, now: DateTime<Utc>) -> bool {
        self.departure_time <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn flight() -> Flight {
        let dep = Utc.with_ymd_and_hms(2026, 11, 1, 8, 0, 0).unwrap();
        Flight {
            flight_number: "EK101".into(),
            departure_time: dep,
            arrival_time: dep + Duration::hours(8) + Duration::minutes(30),
            economy_price: 100,
            business_price: 500,
            first_class_price: 1000,
            departure_airport: "DXB".into(),
            arrival_airport: "LHR".into(),
            aircraft_id: 1,
            status: FlightStatus::Scheduled,
        }
    }

    #[test]
    fn test_cabin_class_parsing() {
        assert_eq!("economy".parse::<CabinClass>().unwrap(), CabinClass::Economy);
        assert_eq!("Business".parse::<CabinClass>().unwrap(), CabinClass::Business);
        assert_eq!("FIRST".parse::<CabinClass>().unwrap(), CabinClass::First);
        assert!("Invalid".parse::<CabinClass>().is_err());
    }

    #[test]
    fn test_valid_flight() {
        let f = flight();
        assert!(f.validate().is_ok());
        assert_eq!(f.flight_time(), Duration::minutes(510));
        assert_eq!(f.cabin_price(CabinClass::First), 1000);
    }

    #[test]
    fn test_invalid_flight_reports_every_rule() {
        let mut f = flight();
        f.arrival_time = f.departure_time;
        f.arrival_airport = "DXB".into();
        f.business_price = -1;

        match f.validate() {
            Err(CoreError::ValidationError(errors)) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["departure_time", "arrival_airport", "business_price"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_price_above_cap_is_rejected() {
        let mut f = flight();
        f.economy_price = i64::MAX / 2 + 1;
        f.first_class_price = MAX_CABIN_PRICE;

        match f.validate() {
            Err(CoreError::ValidationError(errors)) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "economy_price");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_aircraft_capacity() {
        let aircraft = Aircraft {
            id: 1,
            model: "A380".into(),
            economy_seats: 150,
            business_seats: 16,
            first_seats: 8,
        };
        assert_eq!(aircraft.total_capacity(), 174);
        assert_eq!(aircraft.capacity(CabinClass::Business), 16);
    }
}
