use std::sync::LazyLock;

use regex::{Captures, Regex};
use thiserror::Error;

use crate::table::Cell;

/// A value that matched none of the coordinate formats.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized coordinate {input:?}")]
pub struct CoordinateError {
    pub input: String,
}

/// `9.9732`, `-9.9732`, `9.9732N`
static DECIMAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([-+]?\d+(?:\.\d+)?)([NSEW])?$").expect("valid regex")
});

/// `9°58'23"N`, `9:58:23N`, `76°16.934'W`, `9°N`
static SEXAGESIMAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^([-+]?[\d.]+)[°:]([-\d.]+)?[':]?([-\d.]+)?"?([NSEW])?$"#).expect("valid regex")
});

/// `9 58 23N`, `9 58 23 N`, `76 16.934 W`, `9:58`
static DELIMITED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([-+]?[\d.]+)[\s:]+([\d.]+)(?:[\s:]+([\d.]+))?\s*([NSEW])?$").expect("valid regex")
});

/// `9N`, `76E`
static DEGREE_LETTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+)([NSEW])$").expect("valid regex")
});

/// Unicode look-alikes mapped to their ASCII (or degree sign) equivalents.
const LOOKALIKES: [(char, char); 7] = [
    ('º', '°'),
    ('˚', '°'),
    ('’', '\''),
    ('′', '\''),
    ('‘', '\''),
    ('”', '"'),
    ('″', '"'),
];

fn normalize_symbols(value: &str) -> String {
    value.chars()
        .map(|c| LOOKALIKES.iter().find(|(from, _)| *from == c).map_or(c, |&(_, to)| to))
        .collect()
}

/// Drop whitespace, except runs between two digits (`9 58 23` stays delimited, `9. 5` becomes `9.5`).
fn strip_whitespace(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let numeric = |c: Option<&char>| c.is_some_and(char::is_ascii_digit);

    let mut out = String::with_capacity(value.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i].is_whitespace() {
            let end = chars[i..].iter().position(|c| !c.is_whitespace()).map_or(chars.len(), |n| i + n);
            if i > 0 && numeric(chars.get(i - 1)) && numeric(chars.get(end)) {
                out.push(' ');
            }
            i = end;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

/// Apply the hemisphere letter, which overrides any sign on the number.
#[inline]
fn apply_hemisphere(value: f64, hemisphere: Option<&str>) -> f64 {
    match hemisphere.map(|h| h.to_ascii_uppercase()) {
        Some(h) if h == "S" || h == "W" => -value.abs(),
        Some(_) => value.abs(),
        None => value,
    }
}

/// Combine degree/minute/second captures into decimal degrees.
/// A leading `-` on the degrees makes the whole value negative.
fn from_sexagesimal(caps: &Captures<'_>) -> Option<f64> {
    let degrees_text = caps.get(1)?.as_str();
    let part = |i: usize| caps.get(i).map_or(Some(0.0), |m| m.as_str().parse::<f64>().ok());

    let degrees: f64 = degrees_text.parse().ok()?;
    let magnitude = degrees.abs() + part(2)? / 60.0 + part(3)? / 3600.0;
    let signed = if degrees_text.starts_with('-') { -magnitude } else { magnitude };

    Some(apply_hemisphere(signed, caps.get(4).map(|m| m.as_str())))
}

type Strategy = fn(compact: &str, trimmed: &str) -> Option<f64>;

fn decimal_with_hemisphere(compact: &str, _: &str) -> Option<f64> {
    let caps = DECIMAL.captures(compact)?;
    let value: f64 = caps[1].parse().ok()?;
    Some(apply_hemisphere(value, caps.get(2).map(|m| m.as_str())))
}

fn degrees_minutes_seconds(compact: &str, _: &str) -> Option<f64> {
    from_sexagesimal(&SEXAGESIMAL.captures(compact)?)
}

fn delimited_triple(_: &str, trimmed: &str) -> Option<f64> {
    from_sexagesimal(&DELIMITED.captures(trimmed)?)
}

fn degree_with_letter(compact: &str, _: &str) -> Option<f64> {
    let caps = DEGREE_LETTER.captures(compact)?;
    let value: f64 = caps[1].parse().ok()?;
    Some(apply_hemisphere(value, Some(&caps[2])))
}

fn plain_float(_: &str, trimmed: &str) -> Option<f64> {
    trimmed.parse().ok()
}

/// Parse strategies in priority order; the first success wins.
const STRATEGIES: [Strategy; 5] = [
    decimal_with_hemisphere,
    degrees_minutes_seconds,
    delimited_triple,
    degree_with_letter,
    plain_float,
];

/// Parse a free-form latitude or longitude string into signed decimal degrees.
pub fn parse_coordinate_str(value: &str) -> Result<f64, CoordinateError> {
    let trimmed = normalize_symbols(value.trim());
    let compact = strip_whitespace(&trimmed);

    STRATEGIES.iter()
        .find_map(|strategy| strategy(&compact, &trimmed))
        .filter(|degrees| degrees.is_finite())
        .ok_or_else(|| CoordinateError { input: value.to_string() })
}

/// Parse a table cell. Numeric cells pass through; booleans and blanks are rejected.
pub fn parse_coordinate(cell: &Cell) -> Result<f64, CoordinateError> {
    match cell {
        Cell::Number(value) if value.is_finite() => Ok(*value),
        Cell::Text(text) => parse_coordinate_str(text),
        other => Err(CoordinateError { input: other.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(value: &str) -> f64 {
        parse_coordinate_str(value).unwrap_or_else(|e| panic!("{e}"))
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-6, "expected {expected}, got {actual}");
    }

    #[test]
    fn decimal_degrees_with_hemisphere() {
        for d in [9.9732_f64, -9.9732, 0.0, 76.2821, -122.5, 45.0] {
            assert_close(parse(&format!("{d}N")), d.abs());
            assert_close(parse(&format!("{d}S")), -d.abs());
            assert_close(parse(&format!("{d}e")), d.abs());
            assert_close(parse(&format!("{d}w")), -d.abs());
        }
        assert_close(parse("-9.9732"), -9.9732);
        assert_close(parse("+9.9732"), 9.9732);
    }

    #[test]
    fn degrees_minutes_seconds() {
        assert_close(parse("9°58'23\"N"), 9.0 + 58.0 / 60.0 + 23.0 / 3600.0);
        assert_close(parse("76°16.934'W"), -(76.0 + 16.934 / 60.0));
        assert_close(parse("9:58:23S"), -(9.0 + 58.0 / 60.0 + 23.0 / 3600.0));
        assert_close(parse("-9°30'"), -9.5);
        assert_close(parse("-0°30'"), -0.5);
        assert_close(parse("12°N"), 12.0);
    }

    #[test]
    fn unicode_lookalikes_are_normalized() {
        assert_close(parse("9º58’23”N"), 9.0 + 58.0 / 60.0 + 23.0 / 3600.0);
        assert_close(parse("76°16′56″E"), 76.0 + 16.0 / 60.0 + 56.0 / 3600.0);
    }

    #[test]
    fn whitespace_is_stripped() {
        assert_close(parse(" 9° 58' 23\" N "), 9.0 + 58.0 / 60.0 + 23.0 / 3600.0);
        assert_close(parse("9.5 S"), -9.5);
        assert_close(parse("9. 5"), 9.5);
        assert_close(parse("9 .5N"), 9.5);
        assert_close(parse("76. 25 E"), 76.25);
    }

    #[test]
    fn space_delimited_triples() {
        assert_close(parse("9 58 23N"), 9.0 + 58.0 / 60.0 + 23.0 / 3600.0);
        assert_close(parse("76 16.934 W"), -(76.0 + 16.934 / 60.0));
        assert_close(parse("-9 30"), -9.5);
    }

    #[test]
    fn hemisphere_letter_overrides_sign() {
        assert_close(parse("-9°N"), 9.0);
        assert_close(parse("-9.5N"), 9.5);
        assert_close(parse("+9.5W"), -9.5);
    }

    #[test]
    fn plain_float_fallback() {
        assert_close(parse("1e-3"), 0.001);
        assert_close(parse(".5"), 0.5);
    }

    #[test]
    fn malformed_values_fail() {
        for value in ["abc", "", "9°58'23\"Q", "N", "1.2.3.4", "nan", "inf", "9 58 23 X"] {
            assert!(parse_coordinate_str(value).is_err(), "{value:?} should not parse");
        }
    }

    #[test]
    fn typed_cells() {
        assert_eq!(parse_coordinate(&Cell::Number(-12.25)), Ok(-12.25));
        assert_close(parse_coordinate(&Cell::Text("12.25S".into())).unwrap(), -12.25);
        assert!(parse_coordinate(&Cell::Bool(true)).is_err());
        assert!(parse_coordinate(&Cell::Empty).is_err());
        assert!(parse_coordinate(&Cell::Number(f64::NAN)).is_err());
    }
}
