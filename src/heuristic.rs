//! Last-resort distance estimate for locations with no table entry and no
//! coordinates.
//!
//! Each endpoint is bucketed as domestic or international against a fixed
//! city list and the estimate is drawn uniformly from a range that widens
//! with the number of international endpoints. Same-location jobs get a
//! short local haul instead.

use std::ops::Range;

use rand::Rng;

/// Reference list of domestic city names (exact match).
pub const DOMESTIC_CITIES: &[&str] = &[
    "Berlin",
    "Hamburg",
    "Munich",
    "Cologne",
    "Frankfurt",
    "Stuttgart",
    "Dusseldorf",
    "Leipzig",
    "Dortmund",
    "Essen",
    "Bremen",
    "Dresden",
    "Hanover",
    "Nuremberg",
    "Duisburg",
    "Bochum",
    "Wuppertal",
    "Bielefeld",
    "Bonn",
    "Munster",
    "Mannheim",
    "Karlsruhe",
    "Augsburg",
    "Wiesbaden",
    "Kassel",
    "Erfurt",
    "Mainz",
    "Rostock",
    "Kiel",
    "Freiburg",
];

/// Haul distance for a job that starts and ends at the same location.
pub const LOCAL_HAUL_KM: Range<u32> = 5..32;

const BOTH_DOMESTIC_KM: Range<u32> = 50..650;
const ONE_DOMESTIC_KM: Range<u32> = 300..1500;
const BOTH_INTERNATIONAL_KM: Range<u32> = 600..2400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Domestic,
    International,
}

pub fn classify(name: &str) -> Region {
    if DOMESTIC_CITIES.contains(&name) {
        Region::Domestic
    } else {
        Region::International
    }
}

/// Kilometer range the estimate is drawn from for this pair.
pub fn range_for(from: &str, to: &str) -> Range<u32> {
    match (classify(from), classify(to)) {
        (Region::Domestic, Region::Domestic) => BOTH_DOMESTIC_KM,
        (Region::International, Region::International) => BOTH_INTERNATIONAL_KM,
        _ => ONE_DOMESTIC_KM,
    }
}

/// Whole-kilometer estimate drawn uniformly from [`range_for`].
pub fn estimate_km<R: Rng>(from: &str, to: &str, rng: &mut R) -> f64 {
    f64::from(rng.gen_range(range_for(from, to)))
}

/// Whole-kilometer local delivery distance drawn from [`LOCAL_HAUL_KM`].
pub fn local_haul_km<R: Rng>(rng: &mut R) -> f64 {
    f64::from(rng.gen_range(LOCAL_HAUL_KM))
}
