use log::trace;

use crate::error::FormatError;
use crate::types::{Axis, Units, ZeroSuppression};

/// Integer/fraction digit counts for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisDigits {
    pub integer: u8,
    pub fraction: u8,
}

impl AxisDigits {
    pub fn total(&self) -> usize {
        self.integer as usize + self.fraction as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct CoordinateFormat {
    zero_suppression: ZeroSuppression,
    x: AxisDigits,
    y: AxisDigits,
}

/// Coordinate decoding state for one file.
///
/// The digit counts are fixed by a single format directive; decoding before it fails.
/// Units default to millimeters until a units directive says otherwise.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FormatState {
    format: Option<CoordinateFormat>,
    units: Option<Units>,
}

impl FormatState {
    pub fn set_format(
        &mut self,
        zero_suppression: ZeroSuppression,
        int_digits_x: u8,
        frac_digits_x: u8,
        int_digits_y: u8,
        frac_digits_y: u8,
    ) -> Result<(), FormatError> {
        for (integer, fraction) in [(int_digits_x, frac_digits_x), (int_digits_y, frac_digits_y)] {
            if integer == 0 || fraction == 0 {
                return Err(FormatError::InvalidDigitCounts {
                    integer,
                    fraction,
                });
            }
        }

        let format = CoordinateFormat {
            zero_suppression,
            x: AxisDigits {
                integer: int_digits_x,
                fraction: frac_digits_x,
            },
            y: AxisDigits {
                integer: int_digits_y,
                fraction: frac_digits_y,
            },
        };
        trace!("coordinate format: {:?}", format);
        self.format = Some(format);
        Ok(())
    }

    pub fn set_units(&mut self, units: Units) {
        self.units = Some(units);
    }

    /// The effective units, millimeters if no units directive was seen.
    pub fn units(&self) -> Units {
        self.units.unwrap_or_default()
    }

    pub fn has_units(&self) -> bool {
        self.units.is_some()
    }

    pub fn is_established(&self) -> bool {
        self.format.is_some()
    }

    pub fn zero_suppression(&self) -> Option<ZeroSuppression> {
        self.format.map(|format| format.zero_suppression)
    }

    pub fn digits(&self, axis: Axis) -> Option<AxisDigits> {
        self.format.map(|format| match axis {
            Axis::X => format.x,
            Axis::Y => format.y,
        })
    }

    /// Decode a pair of raw coordinate tokens to millimeters.
    pub fn decode(&self, raw_x: &str, raw_y: &str) -> Result<(f64, f64), FormatError> {
        Ok((self.decode_axis(Axis::X, raw_x)?, self.decode_axis(Axis::Y, raw_y)?))
    }

    /// Decode one fixed-width digit token to millimeters.
    ///
    /// Short tokens are padded according to the zero suppression. Tokens wider than the format
    /// keep their last `fraction` digits as the fraction and everything before as the integer.
    pub fn decode_axis(&self, axis: Axis, raw: &str) -> Result<f64, FormatError> {
        let format = self.format.ok_or(FormatError::NotEstablished)?;
        let digits = match axis {
            Axis::X => format.x,
            Axis::Y => format.y,
        };
        let total = digits.total();

        let invalid = || FormatError::InvalidCoordinate {
            token: raw.to_string(),
            digits: total,
        };

        let (sign, unsigned) = match raw.as_bytes().first() {
            Some(b'-') => (-1.0, &raw[1..]),
            Some(b'+') => (1.0, &raw[1..]),
            _ => (1.0, raw),
        };
        if unsigned.is_empty() || !unsigned.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let padded = match format.zero_suppression {
            ZeroSuppression::Leading => format!("{:0>width$}", unsigned, width = total),
            ZeroSuppression::Trailing => format!("{:0<width$}", unsigned, width = total),
        };
        let (integer_part, fraction_part) = padded.split_at(padded.len() - digits.fraction as usize);

        let integer: u64 = integer_part.parse().map_err(|_| invalid())?;
        let fraction: u64 = fraction_part.parse().map_err(|_| invalid())?;
        let value = integer as f64 + fraction as f64 / 10_f64.powi(digits.fraction as i32);

        Ok(self.units().to_millimeters(sign * value))
    }
}
