//! Realistic name and address generation.
//!
//! The generator is seeded from the keyed identity seed of the raw value, so
//! a raw identity produces the same substitute in every run under the same
//! key. The shape of the raw value picks the kind of substitute.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use shield_core::{FieldClassification, MaskingError};
use shield_crypto::{derive_seed, SecretKey, SeedDomain};

use super::lexicon::{
    BANK_SUFFIXES, CITIES, COMPANY_SUFFIXES, COMPANY_WORDS, FIRST_NAMES, LAST_NAMES,
    STREET_NAMES, STREET_SUFFIXES, UNIT_DESIGNATORS,
};
use crate::policy::IdentityKind;

/// Draws allowed before accepting a substitute equal to the raw value.
const MAX_DRAWS: usize = 8;

const COMPANY_MARKERS: &[&str] = &["INC", "LLC", "CORP", "CO", "COMPANY", "LTD", "TRUST", "PARTNERS"];
const UNIT_MARKERS: &[&str] = &["APT", "SUITE", "STE", "UNIT"];

/// Generate the substitute for `raw`.
pub fn generate(
    key: &SecretKey,
    kind: IdentityKind,
    classification: FieldClassification,
    raw: &str,
    fit: bool,
) -> Result<String, MaskingError> {
    let mut rng = StdRng::from_seed(derive_seed(key, SeedDomain::Identity, classification, raw)?);
    let mut draw = || {
        let fake = match kind {
            IdentityKind::Name => fake_name(raw, &mut rng),
            IdentityKind::Address => fake_address(raw, &mut rng),
        };
        mirror_case(raw, fake)
    };
    let mut fake = draw();
    for _ in 1..MAX_DRAWS {
        if !fake.eq_ignore_ascii_case(raw.trim()) {
            break;
        }
        fake = draw();
    }
    Ok(if fit {
        fit_width(&fake, raw.chars().count())
    } else {
        fake
    })
}

/// Pad with spaces or truncate to exactly `width` characters.
pub fn fit_width(value: &str, width: usize) -> String {
    let len = value.chars().count();
    if len >= width {
        value.chars().take(width).collect()
    } else {
        format!("{value}{}", " ".repeat(width - len))
    }
}

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, list: &[&'a str]) -> &'a str {
    list[rng.gen_range(0..list.len())]
}

fn words_of(upper: &str) -> Vec<&str> {
    upper
        .split(|c: char| !c.is_alphanumeric() && c != '&')
        .filter(|w| !w.is_empty())
        .collect()
}

fn fake_name<R: Rng + ?Sized>(raw: &str, rng: &mut R) -> String {
    let upper = raw.to_uppercase();
    let words = words_of(&upper);

    if words.contains(&"COUNTY") {
        let (city, _) = CITIES[rng.gen_range(0..CITIES.len())];
        return format!("{city} County");
    }
    if words.contains(&"BANK") {
        return format!("{} {}", pick(rng, COMPANY_WORDS), pick(rng, BANK_SUFFIXES));
    }
    if upper.contains('&') || words.iter().any(|w| COMPANY_MARKERS.contains(w)) {
        return format!("{} {}", pick(rng, COMPANY_WORDS), pick(rng, COMPANY_SUFFIXES));
    }

    let first = pick(rng, FIRST_NAMES);
    let last = pick(rng, LAST_NAMES);
    let middle = (words.len() >= 3).then(|| char::from(rng.gen_range(b'A'..=b'Z')));
    match (raw.contains(','), middle) {
        (true, Some(m)) => format!("{last}, {first} {m}."),
        (true, None) => format!("{last}, {first}"),
        (false, Some(m)) => format!("{first} {m}. {last}"),
        (false, None) => format!("{first} {last}"),
    }
}

fn fake_address<R: Rng + ?Sized>(raw: &str, rng: &mut R) -> String {
    let upper = raw.to_uppercase();
    let multiline = raw.contains('\n');
    let has_unit = upper.contains('#') || words_of(&upper).iter().any(|w| UNIT_MARKERS.contains(w));
    let zip4 = zip_shape(raw).unwrap_or(false);

    if multiline || has_unit {
        let street = street_line(rng);
        let unit = if has_unit {
            format!(" {}", unit_line(rng))
        } else {
            String::new()
        };
        let separator = if multiline { "\n" } else { ", " };
        return format!("{street}{unit}{separator}{}", city_line(rng, zip4));
    }
    if is_city_line(raw) {
        return city_line(rng, zip4);
    }
    street_line(rng)
}

fn street_line<R: Rng + ?Sized>(rng: &mut R) -> String {
    let number = rng.gen_range(100..=9999);
    format!(
        "{number} {} {}",
        pick(rng, STREET_NAMES),
        pick(rng, STREET_SUFFIXES)
    )
}

fn unit_line<R: Rng + ?Sized>(rng: &mut R) -> String {
    let designator = pick(rng, UNIT_DESIGNATORS);
    let number = rng.gen_range(1..=999);
    if designator == "#" {
        format!("#{number}")
    } else {
        format!("{designator} {number}")
    }
}

fn city_line<R: Rng + ?Sized>(rng: &mut R, zip4: bool) -> String {
    let (city, state) = CITIES[rng.gen_range(0..CITIES.len())];
    let zip: u32 = rng.gen_range(10000..=99999);
    if zip4 {
        let plus: u32 = rng.gen_range(0..=9999);
        format!("{city}, {state} {zip:05}-{plus:04}")
    } else {
        format!("{city}, {state} {zip:05}")
    }
}

/// `Some(has_plus4)` if the last token of `raw` is a ZIP code.
fn zip_shape(raw: &str) -> Option<bool> {
    let token = raw.split_whitespace().last()?;
    let all_digits = |s: &str, n: usize| s.len() == n && s.bytes().all(|b| b.is_ascii_digit());
    match token.split_once('-') {
        Some((five, four)) if all_digits(five, 5) && all_digits(four, 4) => Some(true),
        None if all_digits(token, 5) => Some(false),
        _ => None,
    }
}

/// "City, ST 12345" or "City, ST 12345-6789".
fn is_city_line(raw: &str) -> bool {
    let Some((city, rest)) = raw.rsplit_once(',') else {
        return false;
    };
    let city = city.trim();
    let city_ok = !city.is_empty()
        && city
            .chars()
            .all(|c| c.is_alphabetic() || matches!(c, ' ' | '.' | '\'' | '-'));
    let parts: Vec<&str> = rest.split_whitespace().collect();
    city_ok
        && parts.len() == 2
        && parts[0].len() == 2
        && parts[0].chars().all(|c| c.is_ascii_alphabetic())
        && zip_shape(parts[1]).is_some()
}

fn mirror_case(raw: &str, fake: String) -> String {
    let has_letters = raw.chars().any(char::is_alphabetic);
    if has_letters && !raw.chars().any(char::is_lowercase) {
        fake.to_uppercase()
    } else {
        fake
    }
}
