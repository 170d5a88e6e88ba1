//! # Date Shifter
//!
//! Moves a calendar date by a uniform whole-day offset and renders it back
//! in the layout it arrived in. The layout is detected by exact round trip:
//! a format matches only if formatting the parsed date reproduces the raw
//! text, so `01/05/2024` and `1/5/2024` keep their own padding.

use chrono::{Days, NaiveDate};
use rand::Rng;
use thiserror::Error;

/// Layouts recognized in statement data, tried in order.
pub const DATE_LAYOUTS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%m/%d/%y",
    "%-m/%-d/%Y",
    "%-m/%-d/%y",
    "%m-%d-%Y",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%b %d, %Y",
    "%b %-d, %Y",
    "%B %d, %Y",
    "%B %-d, %Y",
    "%d %b %Y",
];

/// Values that mean "no date" in the source systems.
pub const DEFAULT_DATE_SENTINELS: &[&str] = &["00/00/00", "00/00/0000", "0000-00-00"];

/// Date shifting failure.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DateShiftError {
    /// No known layout round-trips the value.
    #[error("unrecognized date layout")]
    UnrecognizedLayout,
    /// The shifted date is outside the representable calendar.
    #[error("shifted date out of range")]
    OutOfRange,
}

/// A parsed date together with the layout it was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectedDate {
    /// The calendar date.
    pub date: NaiveDate,
    /// Matching entry of [`DATE_LAYOUTS`].
    pub layout: &'static str,
    /// Month names were written in upper case.
    pub upper: bool,
}

impl DetectedDate {
    /// Render `date` in this layout.
    pub fn render(&self, date: NaiveDate) -> String {
        let text = date.format(self.layout).to_string();
        if self.upper {
            text.to_uppercase()
        } else {
            text
        }
    }
}

/// Find the layout of `raw`.
pub fn detect(raw: &str) -> Option<DetectedDate> {
    let upper = raw.chars().any(|c| c.is_ascii_alphabetic())
        && !raw.chars().any(|c| c.is_ascii_lowercase());
    DATE_LAYOUTS.iter().find_map(|&layout| {
        let date = NaiveDate::parse_from_str(raw, layout).ok()?;
        let detected = DetectedDate {
            date,
            layout,
            upper,
        };
        (detected.render(date) == raw).then_some(detected)
    })
}

/// Shift `raw` by a uniform offset in `[-max_days, +max_days]`.
pub fn shift_date<R: Rng + ?Sized>(
    raw: &str,
    max_days: u32,
    rng: &mut R,
) -> Result<String, DateShiftError> {
    let detected = detect(raw).ok_or(DateShiftError::UnrecognizedLayout)?;
    let max = i64::from(max_days);
    let offset = rng.gen_range(-max..=max);
    let shifted = if offset >= 0 {
        detected.date.checked_add_days(Days::new(offset.unsigned_abs()))
    } else {
        detected.date.checked_sub_days(Days::new(offset.unsigned_abs()))
    }
    .ok_or(DateShiftError::OutOfRange)?;
    Ok(detected.render(shifted))
}
