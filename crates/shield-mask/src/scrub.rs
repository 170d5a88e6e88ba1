//! Detection of SSN-shaped numbers inside free text.

use regex::Regex;

use shield_core::{FieldClassification, MaskingError};

const SSN_PATTERN: &str = r"\b[0-9]{3}[ -]?[0-9]{2}[ -]?[0-9]{4}\b";

/// Compiled embedded-SSN matcher.
#[derive(Debug, Clone)]
pub struct EmbeddedScrubber {
    pattern: Regex,
}

impl EmbeddedScrubber {
    /// Compile the matcher.
    pub fn new() -> Result<Self, MaskingError> {
        let pattern = Regex::new(SSN_PATTERN).map_err(|e| {
            MaskingError::invalid_policy(FieldClassification::FreeText, format!("invalid SSN pattern: {e}"))
        })?;
        Ok(Self { pattern })
    }

    /// True if `text` contains an SSN-shaped number.
    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    /// Replace every SSN-shaped number in `text` with `replace(found)`.
    pub fn scrub<F>(&self, text: &str, mut replace: F) -> Result<String, MaskingError>
    where
        F: FnMut(&str) -> Result<String, MaskingError>,
    {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for found in self.pattern.find_iter(text) {
            out.push_str(&text[last..found.start()]);
            out.push_str(&replace(found.as_str())?);
            last = found.end();
        }
        out.push_str(&text[last..]);
        Ok(out)
    }
}
