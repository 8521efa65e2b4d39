use chrono::NaiveDate;

use super::duration::{Minutes, format_colon};
use super::format::format_date_dmy;

pub const CSV_HEADER: &str = "data,horas_trabalhadas";

/// Builds the monthly CSV. Rows are written in date order.
pub fn month_csv(records: &[(NaiveDate, Minutes)]) -> String {
    let mut sorted = records.to_vec();
    sorted.sort_by_key(|(date, _)| *date);

    let mut out = String::with_capacity(CSV_HEADER.len() + 1 + sorted.len() * 20);
    out.push_str(CSV_HEADER);
    out.push('\n');
    for (date, minutes) in sorted {
        let day = format_date_dmy(&date.format("%Y-%m-%d").to_string());
        out.push_str(&format!("{},\"{}\"\n", day, format_colon(i64::from(minutes))));
    }
    out
}

pub fn month_csv_filename(username: &str, year: i32, month: u32) -> String {
    let safe: String = username
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("relatorio_horas_{}_{:04}-{:02}.csv", safe, year, month)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_empty_month_is_header_only() {
        assert_eq!(month_csv(&[]), "data,horas_trabalhadas\n");
    }

    #[test]
    fn test_rows_sorted_and_quoted() {
        let csv = month_csv(&[(date("2024-03-12"), 480), (date("2024-03-05"), 150)]);
        assert_eq!(
            csv,
            "data,horas_trabalhadas\n05/03/2024,\"02:30\"\n12/03/2024,\"08:00\"\n"
        );
    }

    #[test]
    fn test_filename() {
        assert_eq!(
            month_csv_filename("maria", 2024, 3),
            "relatorio_horas_maria_2024-03.csv"
        );
        assert_eq!(
            month_csv_filename("a b\"c", 2024, 11),
            "relatorio_horas_a_b_c_2024-11.csv"
        );
    }
}
