//! Number and date formatting for labels and tooltips.

use chrono::{Datelike, NaiveDate};

const SI_PREFIXES: [&str; 17] = [
    "y", "z", "a", "f", "p", "n", "µ", "m", "", "k", "M", "G", "T", "P", "E", "Z", "Y",
];

fn round_significant(value: f64, digits: i32) -> f64 {
    if value == 0.0 {
        return 0.0;
    }
    let power = digits - 1 - value.abs().log10().floor() as i32;
    if power >= 0 {
        let f = 10f64.powi(power);
        (value * f).round() / f
    } else {
        let f = 10f64.powi(-power);
        (value / f).round() * f
    }
}

fn trim_zeros(s: String) -> String {
    if !s.contains('.') {
        return s;
    }
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn group_thousands(integer: &str) -> String {
    let (sign, digits) = match integer.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", integer),
    };
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    format!("{}{}", sign, out)
}

/// Two significant digits with an SI prefix: `1.2k`, `3.4M`, `12`.
pub fn si(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let rounded = round_significant(value, 2);
    if rounded == 0.0 {
        return "0".to_string();
    }
    let exponent = rounded.abs().log10().floor() as i32;
    let prefix_exponent = (exponent.div_euclid(3) * 3).clamp(-24, 24);
    let scaled = rounded / 10f64.powi(prefix_exponent);
    let decimals = (1 - (exponent - prefix_exponent)).max(0) as usize;
    let prefix = SI_PREFIXES[((prefix_exponent + 24) / 3) as usize];
    format!("{}{}", trim_zeros(format!("{:.*}", decimals, scaled)), prefix)
}

/// Thousands separators, at most `max_decimals` decimals, trailing zeros
/// dropped: `1,234.5`.
pub fn grouped(value: f64, max_decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let text = trim_zeros(format!("{:.*}", max_decimals, value));
    let text = if text == "-0" { "0".to_string() } else { text };
    match text.split_once('.') {
        Some((integer, fraction)) => format!("{}.{}", group_thousands(integer), fraction),
        None => group_thousands(&text),
    }
}

/// Thousands-separated number for tooltips.
pub fn thousands(value: f64) -> String {
    grouped(value, 6)
}

/// Thousands-separated with up to two decimals.
pub fn display_number(value: f64) -> String {
    grouped(value, 2)
}

/// Axis label: small values keep their decimals, others use SI prefixes.
pub fn axis_number(value: f64) -> String {
    if value.abs() < 1.0 {
        display_number(value)
    } else {
        si(value)
    }
}

/// Signed percentage change from `previous` to `value`, one decimal:
/// `+12.5`, `-3`. `None` when `previous` is zero.
pub fn percent_change(value: f64, previous: f64) -> Option<String> {
    if previous == 0.0 || !previous.is_finite() || !value.is_finite() {
        return None;
    }
    let change = (value - previous) / previous * 100.0;
    let text = trim_zeros(format!("{:.1}", change.abs()));
    let sign = if change < 0.0 && text != "0" { '-' } else { '+' };
    Some(format!("{}{}", sign, text))
}

/// `1st`, `2nd`, `3rd`, `4th`, `11th`, `21st`, ...
pub fn ordinal(n: f64) -> String {
    let n = n.round() as i64;
    let suffix = match (n.rem_euclid(100), n.rem_euclid(10)) {
        (11..=13, _) => "th",
        (_, 1) => "st",
        (_, 2) => "nd",
        (_, 3) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

/// `April 1st, 2020`.
pub fn long_date(date: NaiveDate) -> String {
    format!(
        "{} {}, {}",
        date.format("%B"),
        ordinal(date.day() as f64),
        date.year()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn si_prefixes() {
        assert_eq!(si(1234.0), "1.2k");
        assert_eq!(si(1_500_000.0), "1.5M");
        assert_eq!(si(999.0), "1k");
        assert_eq!(si(12.0), "12");
        assert_eq!(si(100.0), "100");
        assert_eq!(si(0.0), "0");
        assert_eq!(si(-2500.0), "-2.5k");
        assert_eq!(si(0.5), "500m");
    }

    #[test]
    fn grouped_numbers() {
        assert_eq!(thousands(1_234_567.0), "1,234,567");
        assert_eq!(thousands(999.0), "999");
        assert_eq!(display_number(1234.567), "1,234.57");
        assert_eq!(display_number(-1234.5), "-1,234.5");
        assert_eq!(display_number(0.001), "0");
        assert_eq!(axis_number(0.25), "0.25");
        assert_eq!(axis_number(25_000.0), "25k");
    }

    #[test]
    fn percent_changes() {
        assert_eq!(percent_change(110.0, 100.0).as_deref(), Some("+10"));
        assert_eq!(percent_change(90.0, 100.0).as_deref(), Some("-10"));
        assert_eq!(percent_change(100.0, 100.0).as_deref(), Some("+0"));
        assert_eq!(percent_change(1.0, 3.0).as_deref(), Some("-66.7"));
        assert_eq!(percent_change(5.0, 0.0), None);
    }

    #[test]
    fn ordinals() {
        let got: Vec<String> = [1.0, 2.0, 3.0, 4.0, 11.0, 12.0, 13.0, 21.0, 102.0, 111.0]
            .iter()
            .map(|&n| ordinal(n))
            .collect();
        assert_eq!(
            got,
            vec!["1st", "2nd", "3rd", "4th", "11th", "12th", "13th", "21st", "102nd", "111th"]
        );
    }

    #[test]
    fn long_dates() {
        let d = NaiveDate::from_ymd_opt(2020, 4, 1).unwrap();
        assert_eq!(long_date(d), "April 1st, 2020");
        let d = NaiveDate::from_ymd_opt(2021, 12, 22).unwrap();
        assert_eq!(long_date(d), "December 22nd, 2021");
    }
}
