use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Input for the pre-commit price check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceCheck {
    pub product_name: String,
    pub price: f64,
    #[serde(default)]
    pub previous_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub is_valid: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

impl Verdict {
    pub fn valid() -> Self {
        Verdict { is_valid: true, reason: None }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Verdict { is_valid: false, reason: Some(reason.into()) }
    }
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("validation service unavailable: {0}")]
    Unavailable(String),
}

/// Seam for the external reasonableness check (remote model or local rules).
pub trait PriceValidator {
    fn validate(&self, check: &PriceCheck) -> Result<Verdict, ValidationError>;
}

/// Gate a price update through a validator, failing open.
///
/// A validator outage must never block a legitimate price update: on error
/// the price is accepted with a warning reason attached for the caller to
/// display or log.
pub fn gate_price(validator: &dyn PriceValidator, check: &PriceCheck) -> Verdict {
    match validator.validate(check) {
        Ok(verdict) => verdict,
        Err(e) => {
            warn!(product = %check.product_name, error = %e, "price validation unavailable, accepting");
            Verdict {
                is_valid: true,
                reason: Some(format!("aceptado sin verificación: {e}")),
            }
        }
    }
}

/// Local rule-based validator: positive price, bounded jump from the
/// previous price when one exists.
#[derive(Debug, Clone)]
pub struct RangeValidator {
    /// Maximum accepted deviation from the previous price, in percent.
    pub max_deviation_pct: f64,
}

impl Default for RangeValidator {
    fn default() -> Self {
        RangeValidator { max_deviation_pct: 50.0 }
    }
}

impl PriceValidator for RangeValidator {
    fn validate(&self, check: &PriceCheck) -> Result<Verdict, ValidationError> {
        if check.price <= 0.0 {
            return Ok(Verdict::invalid("el precio debe ser mayor que cero"));
        }

        if let Some(prev) = check.previous_price {
            if prev > 0.0 {
                let deviation = (check.price - prev) / prev * 100.0;
                if deviation.abs() > self.max_deviation_pct {
                    return Ok(Verdict::invalid(format!(
                        "el precio se aparta {deviation:.1}% del anterior ({prev})"
                    )));
                }
            }
        }

        Ok(Verdict::valid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Offline;

    impl PriceValidator for Offline {
        fn validate(&self, _check: &PriceCheck) -> Result<Verdict, ValidationError> {
            Err(ValidationError::Unavailable("timeout".into()))
        }
    }

    fn check(price: f64, previous: Option<f64>) -> PriceCheck {
        PriceCheck {
            product_name: "Tomate".into(),
            price,
            previous_price: previous,
        }
    }

    #[test]
    fn range_validator_accepts_reasonable_price() {
        let v = RangeValidator::default();
        assert_eq!(v.validate(&check(3200.0, Some(3300.0))).unwrap(), Verdict::valid());
        assert_eq!(v.validate(&check(3200.0, None)).unwrap(), Verdict::valid());
    }

    #[test]
    fn range_validator_flags_bad_prices() {
        let v = RangeValidator::default();
        assert!(!v.validate(&check(0.0, None)).unwrap().is_valid);
        assert!(!v.validate(&check(9000.0, Some(3000.0))).unwrap().is_valid);
    }

    #[test]
    fn gate_fails_open_on_outage() {
        let verdict = gate_price(&Offline, &check(3200.0, Some(3300.0)));
        assert!(verdict.is_valid);
        assert!(verdict.reason.unwrap().contains("timeout"));
    }

    #[test]
    fn gate_passes_through_a_rejection() {
        let verdict = gate_price(&RangeValidator::default(), &check(-5.0, None));
        assert!(!verdict.is_valid);
    }
}
