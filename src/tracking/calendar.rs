use std::collections::HashMap;

use chrono::{Datelike, Days, Months, NaiveDate};

use super::duration::Minutes;

/// The Sunday..Saturday week containing `anchor`.
///
/// `NaiveDate` carries no time of day or offset, so adding and subtracting
/// days can never land on a neighbouring date because of a timezone.
/// `None` when the week runs past the range `NaiveDate` can represent.
pub fn week_buckets(anchor: NaiveDate) -> Option<[NaiveDate; 7]> {
    let offset = u64::from(anchor.weekday().num_days_from_sunday());
    let sunday = anchor.checked_sub_days(Days::new(offset))?;
    // Saturday must exist for the other six to exist
    sunday.checked_add_days(Days::new(6))?;
    Some(std::array::from_fn(|i| sunday + Days::new(i as u64)))
}

/// Hours per bucket for the chart, unrounded.
pub fn week_hours(records: &HashMap<NaiveDate, Minutes>, buckets: &[NaiveDate; 7]) -> [f64; 7] {
    std::array::from_fn(|i| {
        let minutes = records.get(&buckets[i]).copied().unwrap_or(0);
        f64::from(minutes) / 60.0
    })
}

/// Half-open `[first day, first day of next month)` range.
pub fn month_range(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let end = start.checked_add_months(Months::new(1))?;
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_week_buckets_from_midweek() {
        // 2024-03-06 is a Wednesday
        let week = week_buckets(date("2024-03-06")).unwrap();
        assert_eq!(week[0], date("2024-03-03"));
        assert_eq!(week[6], date("2024-03-09"));
    }

    #[test]
    fn test_week_buckets_shape_for_every_weekday() {
        let sunday = date("2024-10-27"); // DST change in much of Europe
        let expected = week_buckets(sunday).unwrap();
        assert_eq!(expected[0].weekday(), Weekday::Sun);

        for i in 0..7 {
            let anchor = sunday + Days::new(i);
            let week = week_buckets(anchor).unwrap();
            assert_eq!(week, expected);
            for pair in week.windows(2) {
                assert_eq!(pair[1], pair[0] + Days::new(1));
            }
        }
    }

    #[test]
    fn test_week_buckets_cross_year() {
        let week = week_buckets(date("2025-01-01")).unwrap();
        assert_eq!(week[0], date("2024-12-29"));
        assert_eq!(week[6], date("2025-01-04"));
    }

    #[test]
    fn test_week_buckets_at_edge_of_date_range() {
        assert_eq!(week_buckets(NaiveDate::MAX), None);
        assert_eq!(week_buckets(NaiveDate::MIN), None);

        let last_full_week = week_buckets(NaiveDate::MAX - Days::new(14)).unwrap();
        assert_eq!(last_full_week[0].weekday(), Weekday::Sun);
    }

    #[test]
    fn test_week_hours_defaults_missing_days() {
        let buckets = week_buckets(date("2024-03-06")).unwrap();
        let mut records = HashMap::new();
        records.insert(date("2024-03-04"), 90);
        records.insert(date("2024-03-09"), 480);
        records.insert(date("2024-03-20"), 600); // outside the week

        let hours = week_hours(&records, &buckets);
        assert_eq!(hours, [0.0, 1.5, 0.0, 0.0, 0.0, 0.0, 8.0]);
    }

    #[test]
    fn test_month_range() {
        assert_eq!(
            month_range(2024, 2),
            Some((date("2024-02-01"), date("2024-03-01")))
        );
        assert_eq!(
            month_range(2024, 12),
            Some((date("2024-12-01"), date("2025-01-01")))
        );
        assert_eq!(month_range(2024, 0), None);
        assert_eq!(month_range(2024, 13), None);
    }
}
