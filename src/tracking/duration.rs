//! Free-form duration parsing and display.
//!
//! Tokens are tried against these grammars, first match wins:
//!
//! | token            | meaning                         |
//! |------------------|---------------------------------|
//! | `""`, `"   "`    | no entry, `0`                   |
//! | `8`, `2.5`, `2,5`| hours                           |
//! | `1:45`, `1.5:10m`| hours `:` minutes               |
//! | `2h30m`, `2.5h`, `45m`, `90min` | tagged hours/minutes |
//!
//! Fractional hours are rounded half-up to whole minutes before the integer
//! minutes part is added.

use derive_more::Display;
use once_cell::sync::Lazy;
use regex::Regex;

/// Canonical stored duration.
pub type Minutes = u32;

static BARE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)$").expect("valid regex"));

static COLON_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<hours>[0-9]+(?:\.[0-9]+)?)\s*:\s*(?P<minutes>[0-9]+)\s*m?$").expect("valid regex")
});

static TAGGED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(?P<hours>[0-9]+(?:\.[0-9]+)?)\s*h)?\s*(?:(?P<minutes>[0-9]+)\s*m(?:in)?)?$",
    )
    .expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display(fmt = "Invalid duration format: \"{}\"", token)]
pub struct DurationParseError {
    /// The token exactly as the user typed it.
    pub token: String,
}

impl std::error::Error for DurationParseError {}

impl DurationParseError {
    fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
        }
    }
}

pub fn parse(token: &str) -> Result<Minutes, DurationParseError> {
    let normalized = token.trim().to_lowercase().replace(',', ".");
    if normalized.is_empty() {
        return Ok(0);
    }

    let fail = || DurationParseError::new(token);

    if BARE_NUMBER.is_match(&normalized) {
        let hours: f64 = normalized.parse().map_err(|_| fail())?;
        return hours_to_minutes(hours).ok_or_else(fail);
    }

    if let Some(caps) = COLON_PAIR.captures(&normalized) {
        let hours: f64 = caps["hours"].parse().map_err(|_| fail())?;
        let minutes: Minutes = caps["minutes"].parse().map_err(|_| fail())?;
        return hours_to_minutes(hours)
            .and_then(|m| m.checked_add(minutes))
            .ok_or_else(fail);
    }

    if let Some(caps) = TAGGED.captures(&normalized) {
        let hours = caps.name("hours");
        let minutes = caps.name("minutes");
        if hours.is_none() && minutes.is_none() {
            return Err(fail());
        }

        let from_hours = match hours {
            Some(h) => {
                let h: f64 = h.as_str().parse().map_err(|_| fail())?;
                hours_to_minutes(h).ok_or_else(fail)?
            }
            None => 0,
        };
        let from_minutes: Minutes = match minutes {
            Some(m) => m.as_str().parse().map_err(|_| fail())?,
            None => 0,
        };
        return from_hours.checked_add(from_minutes).ok_or_else(fail);
    }

    Err(fail())
}

/// Parses every non-blank token and adds them up, stopping at the first
/// token that does not parse.
pub fn sum_tokens<I, S>(tokens: I) -> Result<Minutes, DurationParseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut total: Minutes = 0;
    for token in tokens {
        let token = token.as_ref();
        if token.trim().is_empty() {
            continue;
        }
        let minutes = parse(token)?;
        total = total
            .checked_add(minutes)
            .ok_or_else(|| DurationParseError::new(token))?;
    }
    Ok(total)
}

/// `150` → `"02:30"`. Hours are not wrapped at 24.
pub fn format_colon(minutes: i64) -> String {
    if minutes < 0 {
        return "00:00".to_string();
    }
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// `150` → `"2h 30m"`.
pub fn format_words(minutes: i64) -> String {
    if minutes < 0 {
        return "0h 0m".to_string();
    }
    format!("{}h {}m", minutes / 60, minutes % 60)
}

fn hours_to_minutes(hours: f64) -> Option<Minutes> {
    let minutes = (hours * 60.0).round();
    if minutes.is_finite() && minutes >= 0.0 && minutes <= f64::from(Minutes::MAX) {
        Some(minutes as Minutes)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_is_zero() {
        assert_eq!(parse(""), Ok(0));
        assert_eq!(parse("   "), Ok(0));
    }

    #[test]
    fn test_bare_number_is_hours() {
        assert_eq!(parse("8"), Ok(480));
        assert_eq!(parse("2.5"), Ok(150));
        assert_eq!(parse("2,5"), Ok(150));
        assert_eq!(parse(".5"), Ok(30));
        assert_eq!(parse(" 1 "), Ok(60));
    }

    #[test]
    fn test_fractional_hours_round_half_up() {
        // 0.0125h = 0.75min, 0.0083h = 0.498min
        assert_eq!(parse("0.0125"), Ok(1));
        assert_eq!(parse("0.0083"), Ok(0));
    }

    #[test]
    fn test_tagged_forms() {
        assert_eq!(parse("2h30m"), Ok(150));
        assert_eq!(parse("2h"), Ok(120));
        assert_eq!(parse("45m"), Ok(45));
        assert_eq!(parse("2.5h"), Ok(150));
        assert_eq!(parse("2H 15M"), Ok(135));
        assert_eq!(parse("90min"), Ok(90));
    }

    #[test]
    fn test_minutes_need_their_tag() {
        assert!(parse("1h45").is_err());
        assert!(parse("2h 30").is_err());
        assert_eq!(parse("1h45m"), Ok(105));
    }

    #[test]
    fn test_only_ascii_digits() {
        // Arabic-Indic and fullwidth digits
        for token in ["٢", "٢h", "١:٣٠", "２h"] {
            assert!(parse(token).is_err(), "token {token:?}");
        }
    }

    #[test]
    fn test_colon_form() {
        assert_eq!(parse("1:45"), Ok(105));
        assert_eq!(parse("0:30m"), Ok(30));
        assert_eq!(parse("1.5:10"), Ok(100));
        assert_eq!(parse("1:90"), Ok(150));
    }

    #[test]
    fn test_invalid_tokens() {
        for token in ["abc", "h", "m", "1:2:3", "-2", "2x", "1h-5m", "abc2hxyz", ":30"] {
            let err = parse(token).unwrap_err();
            assert_eq!(err.token, token);
        }
    }

    #[test]
    fn test_overflow_is_failure() {
        assert!(parse("99999999999").is_err());
        assert!(parse("99999999999m").is_err());
    }

    #[test]
    fn test_error_message_names_token() {
        let err = parse("abc").unwrap_err();
        assert_eq!(err.to_string(), "Invalid duration format: \"abc\"");
    }

    #[test]
    fn test_sum_tokens_skips_blanks() {
        assert_eq!(sum_tokens(["2h", "", "  ", "1:30", "15m"]), Ok(225));
        assert_eq!(sum_tokens(Vec::<String>::new()), Ok(0));
    }

    #[test]
    fn test_sum_tokens_reports_first_bad_token() {
        let err = sum_tokens(["1h", "oops", "nope"]).unwrap_err();
        assert_eq!(err.token, "oops");
    }

    #[test]
    fn test_format_colon() {
        assert_eq!(format_colon(150), "02:30");
        assert_eq!(format_colon(0), "00:00");
        assert_eq!(format_colon(60 * 30 + 5), "30:05");
        assert_eq!(format_colon(-5), "00:00");
    }

    #[test]
    fn test_format_words() {
        assert_eq!(format_words(150), "2h 30m");
        assert_eq!(format_words(45), "0h 45m");
        assert_eq!(format_words(-5), "0h 0m");
    }

    #[test]
    fn test_colon_format_reparses_as_tagged() {
        for m in (0..3000).step_by(7).chain([59, 60, 61, 1439, 1440, 100_000]) {
            let token = format!("{}m", format_colon(m).replace(':', "h"));
            assert_eq!(parse(&token), Ok(m as Minutes), "token {token}");
        }
    }
}
