// ABOUTME: Normalized measurement model shared between the source fetcher and target uploader
// ABOUTME: Six optional body-composition metrics plus the provider-reported calendar date
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Normalized data model for one daily body-composition record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One body-composition record for a single calendar date.
///
/// The date is the source provider's reporting date, not the client-local
/// "today". Fields absent in the upstream record stay `None` and are never
/// defaulted to zero. A measurement is immutable once constructed; the engine
/// hands immutable references outward to the uploader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Calendar date the source provider reported this record for
    pub date: NaiveDate,
    /// Body weight in kilograms
    pub weight_kg: Option<f64>,
    /// Body fat percentage
    pub body_fat_pct: Option<f64>,
    /// Body water percentage
    pub water_pct: Option<f64>,
    /// Bone mass in kilograms
    pub bone_mass_kg: Option<f64>,
    /// Muscle mass in kilograms
    pub muscle_mass_kg: Option<f64>,
    /// Visceral fat rating
    pub visceral_fat: Option<f64>,
}

impl Measurement {
    /// Whether any of the six metrics carries a value
    #[must_use]
    pub const fn has_metrics(&self) -> bool {
        self.weight_kg.is_some()
            || self.body_fat_pct.is_some()
            || self.water_pct.is_some()
            || self.bone_mass_kg.is_some()
            || self.muscle_mass_kg.is_some()
            || self.visceral_fat.is_some()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn absent_metrics_stay_absent() {
        let m = Measurement {
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            weight_kg: Some(70.2),
            body_fat_pct: None,
            water_pct: None,
            bone_mass_kg: None,
            muscle_mass_kg: None,
            visceral_fat: None,
        };
        assert!(m.has_metrics());
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["body_fat_pct"], serde_json::Value::Null);
    }
}
