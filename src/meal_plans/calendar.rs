use time::{Date, Duration};

use super::repo_types::Day;

/// Most recent Sunday, or `today` itself when it is a Sunday.
pub fn week_start(today: Date) -> Date {
    today - Duration::days(today.weekday().number_days_from_sunday() as i64)
}

pub fn date_for(week_start: Date, day: Day) -> Date {
    week_start + Duration::days(day.offset())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{macros::date, Weekday};

    #[test]
    fn week_starts_on_sunday() {
        // 2024-06-12 is a Wednesday.
        assert_eq!(week_start(date!(2024 - 06 - 12)), date!(2024 - 06 - 09));
        assert_eq!(week_start(date!(2024 - 06 - 09)), date!(2024 - 06 - 09));
        assert_eq!(week_start(date!(2024 - 06 - 15)), date!(2024 - 06 - 09));
    }

    #[test]
    fn offsets_cover_the_week_across_month_end() {
        let start = week_start(date!(2024 - 06 - 30));
        assert_eq!(start.weekday(), Weekday::Sunday);
        assert_eq!(date_for(start, Day::Saturday), date!(2024 - 07 - 06));
        for day in Day::ALL {
            assert_eq!(date_for(start, day) - start, Duration::days(day.offset()));
        }
    }
}
