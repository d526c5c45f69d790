use aerobook_shared::Masked;
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::FieldError;

static PASSPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]{8}$").expect("passport pattern"));
static NATIONAL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("national id pattern"));
static PASSENGER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z\s'-]+$").expect("name pattern"));

pub const MAX_PASSENGER_NAME_LEN: usize = 100;

/// Identity of the person travelling on one seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerDetails {
    pub passenger_name: String,
    pub passport: Masked<String>,
    pub national_id: Masked<String>,
    pub date_of_birth: NaiveDate,
}

impl PassengerDetails {
    /// Returns every problem with this record; empty means valid.
    pub fn validate(&self, seat: &str, today: NaiveDate) -> Vec<FieldError> {
        let mut errors = Vec::new();

        let name = self.passenger_name.trim();
        if !PASSENGER_NAME.is_match(name) || !name.chars().any(|c| c.is_ascii_alphabetic()) {
            errors.push(FieldError::for_seat(
                seat,
                "passenger_name",
                "name must contain only letters, spaces, hyphens and apostrophes",
            ));
        } else if self.passenger_name.chars().count() > MAX_PASSENGER_NAME_LEN {
            errors.push(FieldError::for_seat(
                seat,
                "passenger_name",
                format!("name must be at most {} characters", MAX_PASSENGER_NAME_LEN),
            ));
        }
        if !PASSPORT.is_match(self.passport.expose()) {
            errors.push(FieldError::for_seat(
                seat,
                "passport",
                "passport must be 9 alphanumeric characters starting with a letter",
            ));
        }
        if !NATIONAL_ID.is_match(self.national_id.expose()) {
            errors.push(FieldError::for_seat(
                seat,
                "national_id",
                "national ID must be exactly 10 digits",
            ));
        }
        if self.date_of_birth > today {
            errors.push(FieldError::for_seat(
                seat,
                "date_of_birth",
                "date of birth cannot be in the future",
            ));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn valid() -> PassengerDetails {
        PassengerDetails {
            passenger_name: "Mary-Jane O'Neil".into(),
            passport: "A12345678".into(),
            national_id: "1234567890".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
        }
    }

    #[test]
    fn test_valid_passenger() {
        assert!(valid().validate("3A", today()).is_empty());
    }

    #[test]
    fn test_born_today_is_accepted() {
        let mut p = valid();
        p.date_of_birth = today();
        assert!(p.validate("3A", today()).is_empty());
    }

    #[test]
    fn test_each_field_is_checked() {
        let p = PassengerDetails {
            passenger_name: "R2D2".into(),
            passport: "123456789".into(),
            national_id: "12345".into(),
            date_of_birth: NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(),
        };
        let errors = p.validate("7C", today());
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["passenger_name", "passport", "national_id", "date_of_birth"]);
        assert!(errors.iter().all(|e| e.seat.as_deref() == Some("7C")));
    }

    #[test]
    fn test_passport_length_is_exact() {
        let mut p = valid();
        p.passport = "A1234567".into();
        assert_eq!(p.validate("1A", today()).len(), 1);
        p.passport = "A123456789".into();
        assert_eq!(p.validate("1A", today()).len(), 1);
    }

    #[test]
    fn test_name_length_is_capped() {
        let mut p = valid();
        p.passenger_name = "B".repeat(MAX_PASSENGER_NAME_LEN);
        assert!(p.validate("1A", today()).is_empty());

        p.passenger_name.push('b');
        let errors = p.validate("1A", today());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "passenger_name");
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut p = valid();
        p.passenger_name = "   ".into();
        assert_eq!(p.validate("1A", today())[0].field, "passenger_name");
    }
}
