//! Measurement unit and appearance preferences.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

const KG_PER_LB: f64 = 0.453_592_37;
const KM_PER_MI: f64 = 1.609_344;

/// Unit used to display and enter weights
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    Kg,
    #[default]
    Lbs,
}

impl WeightUnit {
    pub fn label(&self) -> &'static str {
        match self {
            WeightUnit::Kg => "kg",
            WeightUnit::Lbs => "lbs",
        }
    }

    /// Convert a weight expressed in `self` into `target`
    pub fn convert(&self, value: f64, target: WeightUnit) -> f64 {
        match (self, target) {
            (WeightUnit::Lbs, WeightUnit::Kg) => value * KG_PER_LB,
            (WeightUnit::Kg, WeightUnit::Lbs) => value / KG_PER_LB,
            _ => value,
        }
    }

    /// Standard barbell weight in this unit
    pub fn default_bar(&self) -> f64 {
        match self {
            WeightUnit::Kg => 20.0,
            WeightUnit::Lbs => 45.0,
        }
    }

    /// Commonly available plates in this unit, heaviest first
    pub fn default_plates(&self) -> &'static [f64] {
        match self {
            WeightUnit::Kg => &[25.0, 20.0, 15.0, 10.0, 5.0, 2.5, 1.25],
            WeightUnit::Lbs => &[45.0, 35.0, 25.0, 10.0, 5.0, 2.5],
        }
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for WeightUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kg" | "kgs" | "kilograms" => Ok(WeightUnit::Kg),
            "lb" | "lbs" | "pounds" => Ok(WeightUnit::Lbs),
            other => Err(Error::Config(format!("Unknown weight unit: {}", other))),
        }
    }
}

/// Unit used to display and enter distances
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    Km,
    #[default]
    Mi,
}

impl DistanceUnit {
    pub fn label(&self) -> &'static str {
        match self {
            DistanceUnit::Km => "km",
            DistanceUnit::Mi => "mi",
        }
    }

    pub fn convert(&self, value: f64, target: DistanceUnit) -> f64 {
        match (self, target) {
            (DistanceUnit::Mi, DistanceUnit::Km) => value * KM_PER_MI,
            (DistanceUnit::Km, DistanceUnit::Mi) => value / KM_PER_MI,
            _ => value,
        }
    }
}

impl FromStr for DistanceUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "km" | "kilometers" => Ok(DistanceUnit::Km),
            "mi" | "miles" => Ok(DistanceUnit::Mi),
            other => Err(Error::Config(format!("Unknown distance unit: {}", other))),
        }
    }
}

/// Color scheme preference
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" | "lgt" => Ok(Theme::Light),
            "dark" | "drk" => Ok(Theme::Dark),
            "system" | "sys" => Ok(Theme::System),
            other => Err(Error::Config(format!("Unknown theme: {}", other))),
        }
    }
}
