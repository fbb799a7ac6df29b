use serde::{Deserialize, Serialize};
use std::fmt;

/// Assumed system lifetime (years).
pub const SYSTEM_LIFETIME_YEARS: f64 = 25.0;

/// Years until cumulative savings cover the system cost.
///
/// `NotApplicable` when there are no savings to recover the cost from. Serialized as a plain
/// number or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum Payback {
    Years(f64),
    NotApplicable,
}

impl Payback {
    pub fn years(&self) -> Option<f64> {
        match self {
            Payback::Years(y) => Some(*y),
            Payback::NotApplicable => None,
        }
    }
}

impl From<Option<f64>> for Payback {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(y) if y.is_finite() => Payback::Years(y),
            _ => Payback::NotApplicable,
        }
    }
}

impl From<Payback> for Option<f64> {
    fn from(value: Payback) -> Self {
        value.years()
    }
}

impl fmt::Display for Payback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payback::Years(y) => write!(f, "{y:.1} years"),
            Payback::NotApplicable => f.write_str("N/A"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinancialProjection {
    pub yearly_savings: f64,
    pub lifetime_savings: f64,
    pub payback_years: Payback,
}

/// Savings assume the whole bill is offset by the system.
pub fn project_financials(monthly_spend: f64, total_cost: f64) -> FinancialProjection {
    let yearly_savings = monthly_spend * 12.0;
    let payback_years = if yearly_savings > 0.0 {
        Payback::Years(total_cost / yearly_savings)
    } else {
        Payback::NotApplicable
    };

    FinancialProjection {
        yearly_savings,
        lifetime_savings: yearly_savings * SYSTEM_LIFETIME_YEARS,
        payback_years,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reference_example() {
        let fin = project_financials(500.0, 26_700.0);
        assert_eq!(fin.yearly_savings, 6_000.0);
        assert_eq!(fin.lifetime_savings, 150_000.0);
        assert_eq!(fin.payback_years, Payback::Years(4.45));
    }

    #[test]
    fn zero_spend_is_not_applicable() {
        let fin = project_financials(0.0, 26_700.0);
        assert_eq!(fin.yearly_savings, 0.0);
        assert_eq!(fin.lifetime_savings, 0.0);
        assert_eq!(fin.payback_years, Payback::NotApplicable);
        assert_eq!(fin.payback_years.to_string(), "N/A");
    }

    #[test]
    fn negative_spend_is_not_applicable() {
        let fin = project_financials(-10.0, 1_000.0);
        assert_eq!(fin.payback_years, Payback::NotApplicable);
    }

    #[test]
    fn payback_serializes_as_nullable_number() {
        assert_eq!(serde_json::to_value(Payback::Years(4.5)).unwrap(), json!(4.5));
        assert_eq!(serde_json::to_value(Payback::NotApplicable).unwrap(), json!(null));
        let parsed: Payback = serde_json::from_value(json!(null)).unwrap();
        assert_eq!(parsed, Payback::NotApplicable);
    }

    #[test]
    fn payback_display_uses_one_decimal() {
        assert_eq!(Payback::Years(4.45).to_string(), "4.5 years");
    }
}
