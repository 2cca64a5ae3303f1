//! Length Units
//!
//! Constant table of length units expressed in millimetres, the model unit
//! of the CAD application.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Millimetres per unit, keyed by unit name
pub const UNIT_CONVERSION: [(&str, f64); 6] = [
    ("mm", 1.0),
    ("cm", 10.0),
    ("m", 1000.0),
    ("km", 1e6),
    ("in", 25.4),
    ("mile", 1_609_344.0),
];

/// Errors raised by unit lookups
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum UnitError {
    #[error("unknown length unit '{0}' (expected one of: mm, cm, m, km, in, mile)")]
    Unknown(String),
}

/// Supported length units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    Mm,
    Cm,
    M,
    Km,
    In,
    Mile,
}

impl LengthUnit {
    pub const ALL: [LengthUnit; 6] = [
        LengthUnit::Mm,
        LengthUnit::Cm,
        LengthUnit::M,
        LengthUnit::Km,
        LengthUnit::In,
        LengthUnit::Mile,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LengthUnit::Mm => "mm",
            LengthUnit::Cm => "cm",
            LengthUnit::M => "m",
            LengthUnit::Km => "km",
            LengthUnit::In => "in",
            LengthUnit::Mile => "mile",
        }
    }

    /// Millimetres in one of this unit
    pub fn multiplier(self) -> f64 {
        match self {
            LengthUnit::Mm => 1.0,
            LengthUnit::Cm => 10.0,
            LengthUnit::M => 1000.0,
            LengthUnit::Km => 1e6,
            LengthUnit::In => 25.4,
            LengthUnit::Mile => 1_609_344.0,
        }
    }

    /// Express `value` of this unit in millimetres
    pub fn to_mm(self, value: f64) -> f64 {
        value * self.multiplier()
    }

    /// Express `value` millimetres in this unit
    pub fn from_mm(self, value: f64) -> f64 {
        value / self.multiplier()
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LengthUnit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        LengthUnit::ALL
            .into_iter()
            .find(|unit| unit.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnitError::Unknown(s.to_string()))
    }
}

/// Look up the millimetre multiplier for a unit name
pub fn unit_multiplier(unit: &str) -> Result<f64, UnitError> {
    UNIT_CONVERSION
        .iter()
        .find(|(name, _)| *name == unit)
        .map(|(_, factor)| *factor)
        .ok_or_else(|| UnitError::Unknown(unit.to_string()))
}

/// Convert `value` given in `unit` to millimetres
pub fn convert_units(value: f64, unit: &str) -> Result<f64, UnitError> {
    Ok(value * unit_multiplier(unit)?)
}

/// Convert `value` from one unit to another
pub fn convert_between(value: f64, from: LengthUnit, to: LengthUnit) -> f64 {
    if from == to {
        return value;
    }
    to.from_mm(from.to_mm(value))
}
