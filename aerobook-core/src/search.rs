use chrono::NaiveDate;
use serde::Deserialize;

use crate::flight::CabinClass;

/// Filters for a passenger flight search. Dates are inclusive and match the
/// departure date.
#[derive(Debug, Clone, Deserialize)]
pub struct FlightSearchCriteria {
    pub origin: String,
    pub destination: String,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    #[serde(default = "default_cabin")]
    pub cabin_class: CabinClass,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
}

fn default_cabin() -> CabinClass {
    CabinClass::Economy
}
