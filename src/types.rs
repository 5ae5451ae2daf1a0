#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Source measurement units, set by `%MOMM*%`/`%MOIN*%` (or legacy `G71`/`G70`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Units {
    #[default]
    Millimeters,
    Inches,
}

impl Units {
    pub const MM_PER_INCH: f64 = 25.4;

    /// Factor that converts a value in these units to millimeters.
    pub fn to_millimeters_factor(self) -> f64 {
        match self {
            Units::Millimeters => 1.0,
            Units::Inches => Self::MM_PER_INCH,
        }
    }

    pub fn to_millimeters(self, value: f64) -> f64 {
        value * self.to_millimeters_factor()
    }
}

/// Which zeros a coordinate token may omit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ZeroSuppression {
    /// Leading zeros omitted, tokens are right-aligned.
    Leading,
    /// Trailing zeros omitted, tokens are left-aligned.
    Trailing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axis {
    X,
    Y,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Exposure {
    CutOut,
    Add,
}

impl From<bool> for Exposure {
    fn from(value: bool) -> Self {
        match value {
            true => Exposure::Add,
            false => Exposure::CutOut,
        }
    }
}
