use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Largest amount accepted from input, far above any course price.
fn max_amount() -> Decimal {
  Decimal::from(1_000_000_000_000_i64)
}

/// Numeric input that may arrive as a JSON number or a numeric string
/// (form fields). Normalized with [`RawAmount::parse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
  Number(json::Number),
  Text(String),
}

impl RawAmount {
  /// Parses a non-negative decimal amount.
  pub fn parse(&self) -> Result<Decimal> {
    let text = match self {
      RawAmount::Number(number) => number.to_string(),
      RawAmount::Text(text) => text.trim().to_string(),
    };

    if text.is_empty() {
      return Err(Error::InvalidAmount("amount is empty".into()));
    }

    let value = Decimal::from_str(&text)
      .or_else(|_| Decimal::from_scientific(&text))
      .map_err(|_| Error::InvalidAmount(format!("`{text}` is not a number")))?;

    if value < Decimal::ZERO {
      return Err(Error::InvalidAmount(format!("`{text}` is negative")));
    }
    if value > max_amount() {
      return Err(Error::InvalidAmount(format!("`{text}` is too large")));
    }

    Ok(value.normalize())
  }

  /// Parses a whole, strictly positive count (usage caps).
  pub fn parse_count(&self) -> Result<i32> {
    let value = self.parse()?;
    if !value.fract().is_zero() || value.is_zero() {
      return Err(Error::InvalidAmount(format!(
        "`{value}` is not a positive whole number"
      )));
    }

    value
      .to_i32()
      .ok_or_else(|| Error::InvalidAmount(format!("`{value}` is too large")))
  }

  pub fn parse_opt(raw: Option<&RawAmount>) -> Result<Option<Decimal>> {
    raw.map(RawAmount::parse).transpose()
  }
}

impl From<Decimal> for RawAmount {
  fn from(value: Decimal) -> Self {
    RawAmount::Text(value.to_string())
  }
}

#[cfg(test)]
mod tests {
  use tokio_test::{assert_err, assert_ok};

  use super::*;

  fn raw(input: &str) -> RawAmount {
    json::from_str(input).unwrap()
  }

  #[test]
  fn numbers_and_strings_agree() {
    assert_eq!(raw("150").parse().unwrap(), Decimal::from(150));
    assert_eq!(raw("\"150\"").parse().unwrap(), Decimal::from(150));
    assert_eq!(raw("\" 150.50 \"").parse().unwrap(), Decimal::new(15050, 2));
    assert_eq!(raw("149.995").parse().unwrap(), Decimal::new(149995, 3));
    assert_eq!(raw("\"1e2\"").parse().unwrap(), Decimal::from(100));
  }

  #[test]
  fn garbage_is_rejected_not_nan() {
    for input in ["\"abc\"", "\"\"", "\"  \"", "-5", "\"-0.01\"", "\"12,5\""] {
      let err = assert_err!(raw(input).parse());
      assert!(matches!(err, Error::InvalidAmount(_)), "{input}: {err}");
    }
  }

  #[test]
  fn huge_amounts_are_rejected() {
    assert_ok!(raw("\"1000000000000\"").parse());

    let inputs =
      ["\"1000000000000.01\"", "\"79228162514264337593543950335\"", "1e20"];
    for input in inputs {
      let err = assert_err!(raw(input).parse());
      assert!(matches!(err, Error::InvalidAmount(_)), "{input}: {err}");
    }
  }

  #[test]
  fn counts() {
    assert_eq!(assert_ok!(raw("5").parse_count()), 5);
    assert_eq!(assert_ok!(raw("\"12\"").parse_count()), 12);
    assert_eq!(assert_ok!(raw("\"3.0\"").parse_count()), 3);

    assert_err!(raw("0").parse_count());
    assert_err!(raw("2.5").parse_count());
    assert_err!(raw("\"99999999999\"").parse_count());
  }

  #[test]
  fn optional_amounts() {
    assert_eq!(RawAmount::parse_opt(None).unwrap(), None);
    assert_eq!(
      RawAmount::parse_opt(Some(&raw("\"20\""))).unwrap(),
      Some(Decimal::from(20))
    );
  }
}
