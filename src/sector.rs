//! Consumer sectors and the spatial units that carry their annual demand.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Consumer sector of an annual consumption figure.
///
/// The short codes follow the BDEW tariff keys (`h0` households, `g0`
/// commerce, `i0` industry, `l0` agriculture); display names are the
/// long forms used at the I/O boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sector {
    Residential,
    Retail,
    Industrial,
    Agricultural,
}

/// All four sectors, in the column order of the input contract.
pub const ALL_SECTORS: [Sector; 4] = [
    Sector::Residential,
    Sector::Retail,
    Sector::Industrial,
    Sector::Agricultural,
];

/// The three sectors served by the standard load profile tables.
pub const STANDARD_SECTORS: [Sector; 3] =
    [Sector::Residential, Sector::Retail, Sector::Agricultural];

impl Sector {
    /// BDEW tariff short code (`h0`, `g0`, `i0`, `l0`).
    pub fn short_code(self) -> &'static str {
        match self {
            Sector::Residential => "h0",
            Sector::Retail => "g0",
            Sector::Industrial => "i0",
            Sector::Agricultural => "l0",
        }
    }

    /// Long sector name used in exported tables.
    pub fn name(self) -> &'static str {
        match self {
            Sector::Residential => "residential",
            Sector::Retail => "retail",
            Sector::Industrial => "industrial",
            Sector::Agricultural => "agricultural",
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Sector {
    type Err = Error;

    /// Accepts both long names and BDEW short codes.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "residential" | "h0" => Ok(Sector::Residential),
            "retail" | "g0" => Ok(Sector::Retail),
            "industrial" | "i0" => Ok(Sector::Industrial),
            "agricultural" | "l0" => Ok(Sector::Agricultural),
            other => Err(Error::Shape(format!("unknown sector \"{other}\""))),
        }
    }
}

/// One substation or load area with its annual sectoral consumption.
///
/// Consumption is kWh per year, non-negative and finite. Sectors absent
/// from the map count as zero. Read-only to the pipeline once built.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialUnit {
    id: String,
    consumption_kwh: BTreeMap<Sector, f64>,
}

impl SpatialUnit {
    /// Builds a unit, validating every consumption figure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConsumption`] if any figure is negative or
    /// not finite.
    pub fn new(id: impl Into<String>, consumption_kwh: &[(Sector, f64)]) -> Result<Self> {
        let mut map = BTreeMap::new();
        for &(sector, value) in consumption_kwh {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConsumption { sector, value });
            }
            map.insert(sector, value);
        }
        Ok(Self {
            id: id.into(),
            consumption_kwh: map,
        })
    }

    /// Unit identifier (substation / load area id).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Annual consumption for `sector` in kWh, zero if absent.
    pub fn consumption_kwh(&self, sector: Sector) -> f64 {
        self.consumption_kwh.get(&sector).copied().unwrap_or(0.0)
    }

    /// Sum of all sectoral consumption in kWh.
    pub fn total_kwh(&self) -> f64 {
        self.consumption_kwh.values().sum()
    }

    /// Generates a fleet of units with random sectoral shares, each
    /// normalized so the unit's total equals `overall_kwh`.
    ///
    /// Stands in for real source data when none is available; seeded for
    /// reproducible runs.
    pub fn dummy_fleet(count: usize, overall_kwh: f64, seed: u64) -> Vec<SpatialUnit> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut fleet = Vec::with_capacity(count);
        for i in 0..count {
            let raw: Vec<f64> = ALL_SECTORS
                .iter()
                .map(|_| rng.random_range(0.05..1.0))
                .collect();
            let total: f64 = raw.iter().sum();
            let shares: Vec<(Sector, f64)> = ALL_SECTORS
                .iter()
                .zip(&raw)
                .map(|(&s, &r)| (s, overall_kwh * r / total))
                .collect();
            // Shares are positive by construction, so new() cannot fail.
            if let Ok(unit) = SpatialUnit::new(format!("unit_{i:04}"), &shares) {
                fleet.push(unit);
            }
        }
        fleet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_codes_match_bdew_keys() {
        assert_eq!(Sector::Residential.short_code(), "h0");
        assert_eq!(Sector::Retail.short_code(), "g0");
        assert_eq!(Sector::Industrial.short_code(), "i0");
        assert_eq!(Sector::Agricultural.short_code(), "l0");
    }

    #[test]
    fn sector_parses_both_forms() {
        assert_eq!("h0".parse::<Sector>().ok(), Some(Sector::Residential));
        assert_eq!("Retail".parse::<Sector>().ok(), Some(Sector::Retail));
        assert!("x9".parse::<Sector>().is_err());
    }

    #[test]
    fn missing_sector_defaults_to_zero() {
        let unit = SpatialUnit::new("sub_1", &[(Sector::Residential, 1000.0)])
            .expect("valid unit");
        assert_eq!(unit.consumption_kwh(Sector::Residential), 1000.0);
        assert_eq!(unit.consumption_kwh(Sector::Industrial), 0.0);
        assert_eq!(unit.total_kwh(), 1000.0);
    }

    #[test]
    fn negative_consumption_rejected() {
        let err = SpatialUnit::new("sub_1", &[(Sector::Retail, -1.0)]);
        assert!(matches!(
            err,
            Err(Error::InvalidConsumption {
                sector: Sector::Retail,
                ..
            })
        ));
    }

    #[test]
    fn nan_consumption_rejected() {
        let err = SpatialUnit::new("sub_1", &[(Sector::Retail, f64::NAN)]);
        assert!(err.is_err());
    }

    #[test]
    fn dummy_fleet_is_normalized_and_deterministic() {
        let a = SpatialUnit::dummy_fleet(5, 1e5, 42);
        let b = SpatialUnit::dummy_fleet(5, 1e5, 42);
        assert_eq!(a, b);
        assert_eq!(a.len(), 5);
        for unit in &a {
            assert!((unit.total_kwh() - 1e5).abs() < 1e-6);
        }
    }
}
