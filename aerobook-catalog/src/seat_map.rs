use aerobook_core::{Aircraft, CabinClass};
use serde::Serialize;

pub const SEATS_PER_ROW: u32 = 6;
const SEAT_LETTERS: [char; SEATS_PER_ROW as usize] = ['A', 'B', 'C', 'D', 'E', 'F'];

/// Inclusive row range one cabin occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CabinRows {
    pub cabin_class: CabinClass,
    pub first_row: u32,
    pub last_row: u32,
}

/// Row layout of an aircraft: first class at the front, then business, then
/// economy. Cabins without seats get no rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatMap {
    pub seats_per_row: u32,
    pub cabins: Vec<CabinRows>,
}

impl SeatMap {
    pub fn for_aircraft(aircraft: &Aircraft) -> Self {
        let mut cabins = Vec::new();
        let mut next_row = 1;
        for cabin in CabinClass::ALL {
            let rows = aircraft.capacity(cabin).div_ceil(SEATS_PER_ROW);
            if rows == 0 {
                continue;
            }
            cabins.push(CabinRows {
                cabin_class: cabin,
                first_row: next_row,
                last_row: next_row + rows - 1,
            });
            next_row += rows;
        }

        Self {
            seats_per_row: SEATS_PER_ROW,
            cabins,
        }
    }

    pub fn rows_for(&self, cabin: CabinClass) -> Option<CabinRows> {
        self.cabins.iter().copied().find(|c| c.cabin_class == cabin)
    }

    /// Cabin whose rows contain `seat` ("12C"), if any.
    pub fn cabin_of(&self, seat: &str) -> Option<CabinClass> {
        let split = seat.find(|c: char| !c.is_ascii_digit())?;
        let (row, letter) = seat.split_at(split);
        let row: u32 = row.parse().ok()?;
        if letter.len() != 1 || !letter.chars().all(|c| SEAT_LETTERS.contains(&c)) {
            return None;
        }
        self.cabins
            .iter()
            .find(|c| (c.first_row..=c.last_row).contains(&row))
            .map(|c| c.cabin_class)
    }

    /// Every seat label in the cabin's rows, front to back.
    pub fn seat_labels(&self, cabin: CabinClass) -> Vec<String> {
        let Some(rows) = self.rows_for(cabin) else {
            return Vec::new();
        };
        (rows.first_row..=rows.last_row)
            .flat_map(|row| SEAT_LETTERS.iter().map(move |l| format!("{}{}", row, l)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aircraft(economy: u32, business: u32, first: u32) -> Aircraft {
        Aircraft {
            id: 1,
            model: "B777".into(),
            economy_seats: economy,
            business_seats: business,
            first_seats: first,
        }
    }

    #[test]
    fn test_default_layout() {
        let map = SeatMap::for_aircraft(&aircraft(150, 16, 8));
        assert_eq!(
            map.rows_for(CabinClass::First),
            Some(CabinRows { cabin_class: CabinClass::First, first_row: 1, last_row: 2 })
        );
        assert_eq!(
            map.rows_for(CabinClass::Business),
            Some(CabinRows { cabin_class: CabinClass::Business, first_row: 3, last_row: 5 })
        );
        assert_eq!(
            map.rows_for(CabinClass::Economy),
            Some(CabinRows { cabin_class: CabinClass::Economy, first_row: 6, last_row: 30 })
        );
    }

    #[test]
    fn test_empty_cabin_has_no_rows() {
        let map = SeatMap::for_aircraft(&aircraft(12, 6, 0));
        assert!(map.rows_for(CabinClass::First).is_none());
        assert_eq!(map.cabin_of("1A"), Some(CabinClass::Business));
        assert_eq!(map.cabin_of("3F"), Some(CabinClass::Economy));
        assert_eq!(map.cabin_of("4A"), None);
        assert_eq!(map.cabin_of("2G"), None);
        assert_eq!(map.seat_labels(CabinClass::Business), vec!["1A", "1B", "1C", "1D", "1E", "1F"]);
    }
}
