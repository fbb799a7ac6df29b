use serde::{Deserialize, Serialize};

/// Spend at or below this amount (GHS/month) is billed at the lifeline rate.
///
/// Stands in for the 300 kWh consumption threshold of the residential tariff; the bracket is
/// picked by spend, not by iterating over kWh.
pub const LIFELINE_SPEND_CEILING: f64 = 525.0;
pub const LIFELINE_RATE_PER_KWH: f64 = 1.76;
pub const STANDARD_RATE_PER_KWH: f64 = 2.32;

/// Average monthly yield of one installed kW in Ghana (kWh).
pub const MONTHLY_KWH_PER_KW: f64 = 120.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionEstimate {
    pub tariff_rate_per_kwh: f64,
    pub monthly_kwh: f64,
    pub system_size_kw: f64,
}

pub fn tariff_rate(monthly_spend: f64) -> f64 {
    if monthly_spend <= LIFELINE_SPEND_CEILING {
        LIFELINE_RATE_PER_KWH
    } else {
        STANDARD_RATE_PER_KWH
    }
}

pub fn estimate_consumption(monthly_spend: f64) -> ConsumptionEstimate {
    let tariff_rate_per_kwh = tariff_rate(monthly_spend);
    let monthly_kwh = monthly_spend / tariff_rate_per_kwh;
    ConsumptionEstimate {
        tariff_rate_per_kwh,
        monthly_kwh,
        system_size_kw: monthly_kwh / MONTHLY_KWH_PER_KW,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifeline_bracket_up_to_and_including_ceiling() {
        for spend in [1.0, 100.0, 524.99, 525.0] {
            assert_eq!(estimate_consumption(spend).tariff_rate_per_kwh, 1.76, "spend={spend}");
        }
    }

    #[test]
    fn standard_bracket_above_ceiling() {
        for spend in [525.01, 600.0, 5_000.0] {
            assert_eq!(estimate_consumption(spend).tariff_rate_per_kwh, 2.32, "spend={spend}");
        }
    }

    #[test]
    fn system_size_follows_kwh_over_yield() {
        for spend in [50.0, 500.0, 525.0, 900.0, 2_500.0] {
            let est = estimate_consumption(spend);
            let rate = tariff_rate(spend);
            assert_eq!(est.monthly_kwh, spend / rate);
            assert_eq!(est.system_size_kw, (spend / rate) / 120.0);
        }
    }

    #[test]
    fn five_hundred_cedis_example() {
        let est = estimate_consumption(500.0);
        assert!((est.monthly_kwh - 284.09).abs() < 0.01);
        assert!((est.system_size_kw - 2.367).abs() < 0.001);
    }
}
