use crate::domain::calculation::CalculationRecord;
use crate::domain::site::SiteInput;
use crate::estimate::cost::{CostBreakdown, PricingStrategy};
use crate::estimate::finance::FinancialProjection;
use crate::estimate::production::{ProductionResult, ProductionSource};
use crate::estimate::tariff::ConsumptionEstimate;

pub fn build_record(
    site: SiteInput,
    consumption: ConsumptionEstimate,
    production: ProductionResult,
    cost: CostBreakdown,
    financial: FinancialProjection,
) -> CalculationRecord {
    CalculationRecord {
        id: None,
        created_at: chrono::Utc::now(),
        site,
        consumption,
        pricing: PricingStrategy::for_source(production.source),
        is_fallback: production.source == ProductionSource::Fallback,
        production,
        cost,
        financial,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimate::cost::compute_cost;
    use crate::estimate::finance::project_financials;
    use crate::estimate::production::fallback_production;
    use crate::estimate::tariff::estimate_consumption;
    use serde_json::Value;
    use std::collections::BTreeSet;

    fn site() -> SiteInput {
        SiteInput {
            location: "Kumasi".to_string(),
            latitude: 6.6885,
            longitude: -1.6244,
            azimuth: 180,
            tilt: 15,
            monthly_spend: 700.0,
            includes_battery: true,
        }
    }

    fn record_for(production: ProductionResult) -> CalculationRecord {
        let site = site();
        let consumption = estimate_consumption(site.monthly_spend);
        let cost = compute_cost(
            consumption.system_size_kw,
            consumption.monthly_kwh,
            site.includes_battery,
            PricingStrategy::for_source(production.source),
        );
        let financial = project_financials(site.monthly_spend, cost.total_cost);
        build_record(site, consumption, production, cost, financial)
    }

    fn keys(record: &CalculationRecord) -> BTreeSet<String> {
        match serde_json::to_value(record).unwrap() {
            Value::Object(map) => map.keys().cloned().collect(),
            other => panic!("record must serialize to an object, got {other}"),
        }
    }

    #[test]
    fn live_and_fallback_records_share_one_schema() {
        let fallback = record_for(fallback_production(2.5));
        let live = record_for(ProductionResult {
            yearly_kwh: 4_100.0,
            co2_savings_kg: 1_950.0,
            source: ProductionSource::Live,
        });

        assert_eq!(keys(&live), keys(&fallback));
        assert!(fallback.is_fallback);
        assert!(!live.is_fallback);
        assert_eq!(fallback.pricing, PricingStrategy::Flat);
        assert_eq!(live.pricing, PricingStrategy::Itemized);
    }

    #[test]
    fn record_is_flat_json_with_expected_keys() {
        let record = record_for(fallback_production(2.5));
        let keys = keys(&record);
        for key in [
            "id",
            "created_at",
            "location",
            "latitude",
            "longitude",
            "azimuth",
            "tilt",
            "monthly_spend",
            "includes_battery",
            "tariff_rate_per_kwh",
            "monthly_kwh",
            "system_size_kw",
            "yearly_kwh",
            "co2_savings_kg",
            "source",
            "pricing",
            "panels_needed",
            "panels_cost",
            "inverter_cost",
            "installation_cost",
            "system_cost_ex_battery",
            "battery_kwh",
            "battery_cost",
            "total_cost",
            "yearly_savings",
            "lifetime_savings",
            "payback_years",
            "is_fallback",
        ] {
            assert!(keys.contains(key), "missing key {key}");
        }
        assert_eq!(keys.len(), 28);
    }

    #[test]
    fn record_survives_json_round_trip() {
        let record = record_for(fallback_production(2.5));
        let json = serde_json::to_string(&record).unwrap();
        let back: CalculationRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.site_input(), site());
        assert_eq!(back.production.source, ProductionSource::Fallback);
        assert_eq!(back.cost.panels_needed, record.cost.panels_needed);
        assert_eq!(back.created_at, record.created_at);
        assert!((back.cost.total_cost - record.cost.total_cost).abs() < 1e-6);
    }

    #[test]
    fn new_records_are_unsaved() {
        let record = record_for(fallback_production(2.5));
        assert!(record.id.is_none());
    }
}
