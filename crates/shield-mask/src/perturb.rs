//! # Numeric Perturber
//!
//! Bounded noise for monetary amounts and interest rates, computed on the
//! exact [`ScaledDecimal`] mantissa. The offset is drawn uniformly from the
//! integer range of representable values, so the result never leaves the
//! configured band and keeps the raw value's precision.

use rand::Rng;

use shield_core::{DecimalError, ScaledDecimal};

/// Percentages are applied in hundredths of a percent.
const PERCENT_RESOLUTION: f64 = 100.0;
const PERCENT_DENOMINATOR: u128 = 100 * 100;

/// Perturb an amount by up to `max_percent` of its magnitude.
///
/// Zero is returned unchanged. For `max_percent < 100` the sign never flips.
pub fn perturb_amount<R: Rng + ?Sized>(
    value: ScaledDecimal,
    max_percent: f64,
    rng: &mut R,
) -> Result<ScaledDecimal, DecimalError> {
    if value.is_zero() {
        return Ok(value);
    }
    let magnitude = value.mantissa().unsigned_abs();
    let hundredths = (max_percent * PERCENT_RESOLUTION).round().max(0.0) as u128;
    let bound = match magnitude.checked_mul(hundredths) {
        Some(product) => product / PERCENT_DENOMINATOR,
        None => (magnitude / PERCENT_DENOMINATOR).saturating_mul(hundredths),
    };
    // Keep |offset| < |value| so the sign survives.
    let bound = bound.min(magnitude - 1);
    let bound = i128::try_from(bound).map_err(|_| DecimalError::Overflow)?;

    let offset = rng.gen_range(-bound..=bound);
    let mantissa = value
        .mantissa()
        .checked_add(offset)
        .ok_or(DecimalError::Overflow)?;
    Ok(value.with_mantissa(mantissa))
}

/// Perturb a rate by up to `max_absolute` rate units, expressed with at
/// least `min_scale` decimals.
///
/// A non-negative rate never goes below zero.
pub fn perturb_rate<R: Rng + ?Sized>(
    value: ScaledDecimal,
    max_absolute: f64,
    min_scale: u32,
    rng: &mut R,
) -> Result<ScaledDecimal, DecimalError> {
    let scaled = value.rescale(value.scale().max(min_scale))?;
    let unit = 10f64.powi(scaled.scale() as i32);
    // The epsilon absorbs binary representation error such as 0.29 * 100.
    let bound = (max_absolute * unit + 1e-6).floor();
    if !bound.is_finite() || bound >= i128::MAX as f64 {
        return Err(DecimalError::Overflow);
    }
    let bound = bound.max(0.0) as i128;

    let low = if scaled.is_negative() {
        -bound
    } else {
        (-bound).max(-scaled.mantissa())
    };
    let offset = rng.gen_range(low..=bound);
    let mantissa = scaled
        .mantissa()
        .checked_add(offset)
        .ok_or(DecimalError::Overflow)?;
    Ok(scaled.with_mantissa(mantissa))
}
