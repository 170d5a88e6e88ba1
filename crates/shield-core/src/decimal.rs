//! # Scaled Decimals — Exact Canonical Amounts
//!
//! Monetary amounts and interest rates arrive as canonical decimal strings
//! (`-?digits(.digits)?`). `ScaledDecimal` parses them into an integer
//! mantissa plus a scale so masked output keeps exactly the input's
//! precision and never inherits binary floating-point artifacts.
//!
//! Grouping separators, currency symbols and exponents are not canonical
//! and are rejected; normalizing them is the Extractor's job.

use std::str::FromStr;

use thiserror::Error;

/// Maximum number of fractional digits accepted.
pub const MAX_SCALE: u32 = 18;

/// Reasons a string is not a canonical decimal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecimalError {
    /// The string is empty or only a sign.
    #[error("no digits")]
    Empty,
    /// A character outside `[0-9.+-]` or a misplaced sign/point.
    #[error("not a canonical decimal")]
    Malformed,
    /// More fractional digits than [`MAX_SCALE`].
    #[error("more than {MAX_SCALE} fractional digits")]
    TooPrecise,
    /// Magnitude does not fit the mantissa.
    #[error("magnitude out of range")]
    Overflow,
}

/// A decimal number stored as `mantissa × 10^-scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScaledDecimal {
    mantissa: i128,
    scale: u32,
}

impl ScaledDecimal {
    /// Build from a mantissa and scale.
    pub fn new(mantissa: i128, scale: u32) -> Result<Self, DecimalError> {
        if scale > MAX_SCALE {
            return Err(DecimalError::TooPrecise);
        }
        Ok(Self { mantissa, scale })
    }

    /// The integer mantissa.
    pub fn mantissa(&self) -> i128 {
        self.mantissa
    }

    /// Number of fractional digits.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// True if the value is zero at any scale.
    pub fn is_zero(&self) -> bool {
        self.mantissa == 0
    }

    /// True if the value is below zero.
    pub fn is_negative(&self) -> bool {
        self.mantissa < 0
    }

    /// A value with the same scale and a different mantissa.
    pub fn with_mantissa(&self, mantissa: i128) -> Self {
        Self {
            mantissa,
            scale: self.scale,
        }
    }

    /// Re-express the value at a larger scale. Scales smaller than the
    /// current one are returned unchanged; precision is never dropped.
    pub fn rescale(&self, scale: u32) -> Result<Self, DecimalError> {
        if scale <= self.scale {
            return Ok(*self);
        }
        if scale > MAX_SCALE {
            return Err(DecimalError::TooPrecise);
        }
        let factor = 10i128
            .checked_pow(scale - self.scale)
            .ok_or(DecimalError::Overflow)?;
        let mantissa = self
            .mantissa
            .checked_mul(factor)
            .ok_or(DecimalError::Overflow)?;
        Ok(Self { mantissa, scale })
    }

    /// Lossy conversion for range arithmetic.
    pub fn to_f64(&self) -> f64 {
        self.mantissa as f64 / 10f64.powi(self.scale as i32)
    }
}

impl FromStr for ScaledDecimal {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, body) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            Some(_) => (false, s),
            None => return Err(DecimalError::Empty),
        };
        if body.is_empty() {
            return Err(DecimalError::Empty);
        }

        let (int_part, frac_part) = match body.split_once('.') {
            Some((i, f)) => (i, f),
            None => (body, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(DecimalError::Empty);
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(DecimalError::Malformed);
        }
        if body.ends_with('.') {
            return Err(DecimalError::Malformed);
        }
        let scale = u32::try_from(frac_part.len()).map_err(|_| DecimalError::TooPrecise)?;
        if scale > MAX_SCALE {
            return Err(DecimalError::TooPrecise);
        }

        let mut mantissa: i128 = 0;
        for b in int_part.bytes().chain(frac_part.bytes()) {
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add(i128::from(b - b'0')))
                .ok_or(DecimalError::Overflow)?;
        }
        if negative {
            mantissa = -mantissa;
        }
        Ok(Self { mantissa, scale })
    }
}

impl std::fmt::Display for ScaledDecimal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.mantissa < 0 { "-" } else { "" };
        let digits = self.mantissa.unsigned_abs().to_string();
        if self.scale == 0 {
            return write!(f, "{sign}{digits}");
        }
        let scale = self.scale as usize;
        let padded = if digits.len() <= scale {
            format!("{}{digits}", "0".repeat(scale + 1 - digits.len()))
        } else {
            digits
        };
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{sign}{int_part}.{frac_part}")
    }
}
