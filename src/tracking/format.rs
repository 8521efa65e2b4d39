use once_cell::sync::Lazy;
use regex::Regex;

/// Returned instead of an error when a date string is not `YYYY-MM-DD`.
/// Callers that display the value must check for it.
pub const INVALID_DATE: &str = "Data inválida";

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{4})-([0-9]{2})-([0-9]{2})$").expect("valid regex"));

/// `2024-03-05` → `05/03/2024`. Only the shape is checked, not the calendar.
pub fn format_date_dmy(iso_date: &str) -> String {
    match ISO_DATE.captures(iso_date) {
        Some(caps) => format!("{}/{}/{}", &caps[3], &caps[2], &caps[1]),
        None => INVALID_DATE.to_string(),
    }
}

/// True when `raw` has the `YYYY-MM-DD` shape with ASCII digits only.
pub fn is_iso_date(raw: &str) -> bool {
    ISO_DATE.is_match(raw)
}

/// Display label for a stored leave status.
pub fn leave_status_label(status: &str) -> &'static str {
    match status {
        "pending" => "Pendente",
        "approved" => "Aprovado",
        "denied" => "Negado",
        _ => "Desconhecido",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_date_dmy() {
        assert_eq!(format_date_dmy("2024-03-05"), "05/03/2024");
        assert_eq!(format_date_dmy("1999-12-31"), "31/12/1999");
    }

    #[test]
    fn test_format_date_dmy_rejects_bad_shape() {
        for bad in ["bad-date", "", "2024-3-05", "2024-03-05T00:00", " 2024-03-05", "24-03-05"] {
            assert_eq!(format_date_dmy(bad), INVALID_DATE, "input {bad:?}");
        }
    }

    #[test]
    fn test_format_date_dmy_ascii_digits_only() {
        // Arabic-Indic digits
        assert_eq!(format_date_dmy("٢٠٢٤-٠٣-٠٥"), INVALID_DATE);
        assert!(!is_iso_date("٢٠٢٤-٠٣-٠٥"));
        assert!(!is_iso_date("+262142-12-31"));
        assert!(is_iso_date("2024-03-05"));
    }

    #[test]
    fn test_leave_status_label() {
        assert_eq!(leave_status_label("pending"), "Pendente");
        assert_eq!(leave_status_label("approved"), "Aprovado");
        assert_eq!(leave_status_label("denied"), "Negado");
        assert_eq!(leave_status_label("rejected"), "Desconhecido");
    }
}
