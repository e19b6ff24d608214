//! French display formatting for assistant replies.

use chrono::{Datelike, NaiveDate};

const SHORT_MONTHS: [&str; 12] = [
    "janv.", "févr.", "mars", "avr.", "mai", "juin", "juil.", "août", "sept.", "oct.", "nov.",
    "déc.",
];

/// Amount in dirhams with grouped thousands: `1 500 DH`, `99,5 DH`.
///
/// At most two decimals are shown; trailing zeros are dropped.
pub fn format_currency(amount: f64) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    let cents = (amount.abs() * 100.0).round() as u64;
    let (whole, fraction) = (cents / 100, cents % 100);

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    let decimals = match fraction {
        0 => String::new(),
        f if f % 10 == 0 => format!(",{}", f / 10),
        f => format!(",{:02}", f),
    };
    format!("{}{}{} DH", sign, grouped, decimals)
}

/// `10 janv. 2025`.
pub fn format_short_date(date: NaiveDate) -> String {
    format!(
        "{:02} {} {}",
        date.day(),
        SHORT_MONTHS[date.month0() as usize],
        date.year()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_currency_grouping() {
        assert_eq!(format_currency(0.0), "0 DH");
        assert_eq!(format_currency(450.0), "450 DH");
        assert_eq!(format_currency(1500.0), "1 500 DH");
        assert_eq!(format_currency(1234567.0), "1 234 567 DH");
    }

    #[test]
    fn test_currency_decimals() {
        assert_eq!(format_currency(99.5), "99,5 DH");
        assert_eq!(format_currency(1200.25), "1 200,25 DH");
        assert_eq!(format_currency(-300.0), "-300 DH");
        assert_eq!(format_currency(f64::NAN), "0 DH");
    }

    #[test]
    fn test_short_dates() {
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        assert_eq!(format_short_date(date(2025, 1, 10)), "10 janv. 2025");
        assert_eq!(format_short_date(date(2024, 8, 1)), "01 août 2024");
        assert_eq!(format_short_date(date(2024, 12, 25)), "25 déc. 2024");
    }

    proptest! {
        #[test]
        fn prop_whole_amounts_keep_their_digits(n in 0u64..10_000_000_000) {
            let text = format_currency(n as f64);
            let digits: String = text.trim_end_matches(" DH").chars().filter(|c| *c != ' ').collect();
            prop_assert_eq!(digits, n.to_string());
            prop_assert!(text.split(' ').all(|group| group.len() <= 3 || group == "DH"));
        }
    }
}
