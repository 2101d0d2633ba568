use crate::prelude::*;

pub fn format_date(date: DateTime) -> String {
  date.format("%d.%m.%Y %H:%M").to_string()
}

/// Renders minor units as `1234.50`.
pub fn format_amount(cents: i64) -> String {
  let sign = if cents < 0 { "-" } else { "" };
  let cents = cents.unsigned_abs();
  format!("{sign}{}.{:02}", cents / 100, cents % 100)
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  #[test]
  fn test_format_amount() {
    assert_eq!(format_amount(0), "0.00");
    assert_eq!(format_amount(25_000), "250.00");
    assert_eq!(format_amount(1_050), "10.50");
    assert_eq!(format_amount(-7), "-0.07");
  }

  #[test]
  fn test_format_date() {
    let date = NaiveDate::from_ymd_opt(2026, 3, 1)
      .unwrap()
      .and_hms_opt(9, 5, 0)
      .unwrap();
    assert_eq!(format_date(date), "01.03.2026 09:05");
  }
}
