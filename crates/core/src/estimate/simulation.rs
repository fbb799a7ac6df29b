//! Multi-facet roof simulation with appliance-based storage sizing.
//!
//! Unlike the spend-driven pipeline, production here is supplied per roof facet by the caller
//! (monthly figures, an annual total, or nothing at all), and savings are valued at the
//! standard tariff rate.

use crate::estimate::finance::SYSTEM_LIFETIME_YEARS;
use crate::estimate::tariff::STANDARD_RATE_PER_KWH;
use anyhow::ensure;
use serde::{Deserialize, Serialize};

pub const MONTHS: usize = 12;

/// Monthly yield assumed per kWp when a facet comes without production data (kWh).
pub const FALLBACK_FACET_KWH_PER_KWP_MONTH: f64 = 10.0;

pub const BATTERY_AUTONOMY_DAYS: f64 = 1.0;
pub const BATTERY_DEPTH_OF_DISCHARGE: f64 = 0.8;
pub const BATTERY_ROUND_TRIP_EFFICIENCY: f64 = 0.9;
pub const BATTERY_MODULE_KWH: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoofFacet {
    #[serde(default)]
    pub name: Option<String>,
    pub capacity_kwp: f64,
    /// Twelve values, January first. Takes precedence over `annual_kwh`.
    #[serde(default)]
    pub monthly_kwh: Option<Vec<f64>>,
    #[serde(default)]
    pub annual_kwh: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appliance {
    pub name: String,
    /// Watts per unit.
    pub wattage: f64,
    pub quantity: u32,
    pub hours_per_day: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub appliances: Vec<Appliance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub facets: Vec<RoofFacet>,
    #[serde(default)]
    pub storage: Option<StorageConfig>,
}

impl SimulationRequest {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.facets.is_empty(), "at least one roof facet is required");

        for (i, facet) in self.facets.iter().enumerate() {
            let label = facet_name(facet, i);
            ensure!(
                facet.capacity_kwp.is_finite() && facet.capacity_kwp > 0.0,
                "{label}: capacity_kwp must be greater than 0 (got {})",
                facet.capacity_kwp
            );
            if let Some(monthly) = &facet.monthly_kwh {
                ensure!(
                    monthly.len() == MONTHS,
                    "{label}: monthly_kwh must contain 12 monthly values (got {})",
                    monthly.len()
                );
                ensure!(
                    monthly.iter().all(|v| v.is_finite() && *v >= 0.0),
                    "{label}: monthly_kwh values must be non-negative numbers"
                );
            }
            if let Some(annual) = facet.annual_kwh {
                ensure!(
                    annual.is_finite() && annual >= 0.0,
                    "{label}: annual_kwh must be a non-negative number (got {annual})"
                );
            }
        }

        if let Some(storage) = &self.storage {
            for ap in &storage.appliances {
                ensure!(
                    ap.wattage.is_finite() && ap.wattage >= 0.0,
                    "appliance {}: wattage must be non-negative",
                    ap.name
                );
                ensure!(
                    ap.hours_per_day.is_finite() && (0.0..=24.0).contains(&ap.hours_per_day),
                    "appliance {}: hours_per_day must be between 0 and 24",
                    ap.name
                );
            }
        }
        Ok(())
    }

    fn storage_enabled(&self) -> Option<&StorageConfig> {
        self.storage.as_ref().filter(|s| s.enabled)
    }
}

/// Where a facet's production figures came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetBasis {
    Monthly,
    Annual,
    CapacityEstimate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetResult {
    pub name: String,
    pub capacity_kwp: f64,
    pub annual_kwh: f64,
    pub monthly_kwh: Vec<f64>,
    pub basis: FacetBasis,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StorageSizing {
    pub daily_load_kwh: f64,
    pub required_battery_kwh: f64,
    pub battery_module_size_kwh: f64,
    pub battery_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationFinancials {
    pub monthly_kwh: Vec<f64>,
    pub monthly_savings_ghs: Vec<f64>,
    pub annual_savings_ghs: f64,
    pub lifetime_savings_ghs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub system_total_capacity_kwp: f64,
    pub system_total_annual_kwh: f64,
    pub details: Vec<FacetResult>,
    pub system_financials: SimulationFinancials,
    /// `None` unless storage was requested.
    pub storage: Option<StorageSizing>,
}

fn facet_name(facet: &RoofFacet, index: usize) -> String {
    match facet.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("Facet {}", index + 1),
    }
}

/// Monthly production for one facet and how it was obtained.
pub fn facet_production(facet: &RoofFacet) -> ([f64; MONTHS], FacetBasis) {
    if let Some(values) = facet.monthly_kwh.as_deref().filter(|v| v.len() == MONTHS) {
        let mut monthly = [0.0; MONTHS];
        monthly.copy_from_slice(values);
        return (monthly, FacetBasis::Monthly);
    }
    if let Some(annual) = facet.annual_kwh {
        return ([annual / MONTHS as f64; MONTHS], FacetBasis::Annual);
    }
    (
        [facet.capacity_kwp * FALLBACK_FACET_KWH_PER_KWP_MONTH; MONTHS],
        FacetBasis::CapacityEstimate,
    )
}

/// Battery bank covering one day of appliance load, in whole modules.
pub fn size_storage(appliances: &[Appliance]) -> StorageSizing {
    let daily_load_kwh: f64 = appliances
        .iter()
        .map(|ap| ap.wattage * f64::from(ap.quantity) * ap.hours_per_day / 1000.0)
        .sum();
    let required_battery_kwh = daily_load_kwh * BATTERY_AUTONOMY_DAYS
        / (BATTERY_DEPTH_OF_DISCHARGE * BATTERY_ROUND_TRIP_EFFICIENCY);
    let battery_count = (required_battery_kwh / BATTERY_MODULE_KWH).ceil() as u32;

    StorageSizing {
        daily_load_kwh: round_to(daily_load_kwh, 2),
        required_battery_kwh: round_to(required_battery_kwh, 2),
        battery_module_size_kwh: BATTERY_MODULE_KWH,
        battery_count,
    }
}

/// Assumes a validated request. Totals are summed before rounding; reported values are
/// rounded to 2 decimals (3 for capacities).
pub fn simulate(request: &SimulationRequest) -> SimulationResult {
    let mut details = Vec::with_capacity(request.facets.len());
    let mut system_monthly = [0.0; MONTHS];
    let mut total_capacity = 0.0;
    let mut total_annual = 0.0;

    for (i, facet) in request.facets.iter().enumerate() {
        let (monthly, basis) = facet_production(facet);
        let annual: f64 = match basis {
            FacetBasis::Annual => facet.annual_kwh.unwrap_or_default(),
            _ => monthly.iter().sum(),
        };

        for (total, month) in system_monthly.iter_mut().zip(monthly) {
            *total += month;
        }
        total_capacity += facet.capacity_kwp;
        total_annual += annual;

        details.push(FacetResult {
            name: facet_name(facet, i),
            capacity_kwp: round_to(facet.capacity_kwp, 3),
            annual_kwh: round_to(annual, 2),
            monthly_kwh: monthly.iter().map(|m| round_to(*m, 2)).collect(),
            basis,
        });
    }

    let monthly_savings = system_monthly.map(|kwh| kwh * STANDARD_RATE_PER_KWH);
    let annual_savings: f64 = monthly_savings.iter().sum();

    let storage = request
        .storage_enabled()
        .map(|s| size_storage(&s.appliances));

    tracing::debug!(
        facets = details.len(),
        total_capacity_kwp = total_capacity,
        total_annual_kwh = total_annual,
        battery_modules = storage.map(|s| s.battery_count),
        "roof simulation computed"
    );

    SimulationResult {
        system_total_capacity_kwp: round_to(total_capacity, 3),
        system_total_annual_kwh: round_to(total_annual, 2),
        details,
        system_financials: SimulationFinancials {
            monthly_kwh: system_monthly.iter().map(|m| round_to(*m, 2)).collect(),
            monthly_savings_ghs: monthly_savings.iter().map(|m| round_to(*m, 2)).collect(),
            annual_savings_ghs: round_to(annual_savings, 2),
            lifetime_savings_ghs: round_to(annual_savings * SYSTEM_LIFETIME_YEARS, 2),
        },
        storage,
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facet(capacity_kwp: f64) -> RoofFacet {
        RoofFacet {
            name: None,
            capacity_kwp,
            monthly_kwh: None,
            annual_kwh: None,
        }
    }

    fn appliance(wattage: f64, quantity: u32, hours_per_day: f64) -> Appliance {
        Appliance {
            name: "load".to_string(),
            wattage,
            quantity,
            hours_per_day,
        }
    }

    fn request(facets: Vec<RoofFacet>) -> SimulationRequest {
        SimulationRequest {
            facets,
            storage: None,
        }
    }

    #[test]
    fn monthly_values_must_number_twelve() {
        let mut short = facet(2.0);
        short.monthly_kwh = Some(vec![100.0; 11]);
        let err = request(vec![short]).validate().unwrap_err();
        assert!(err.to_string().contains("12 monthly values"));

        let mut exact = facet(2.0);
        exact.monthly_kwh = Some(vec![100.0; 12]);
        assert!(request(vec![exact]).validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_capacity_and_empty_roof() {
        assert!(request(vec![facet(0.0)]).validate().is_err());
        assert!(request(vec![facet(-1.5)]).validate().is_err());
        assert!(request(Vec::new()).validate().is_err());
    }

    #[test]
    fn rejects_impossible_appliance_hours() {
        let mut req = request(vec![facet(1.0)]);
        req.storage = Some(StorageConfig {
            enabled: true,
            appliances: vec![appliance(100.0, 1, 25.0)],
        });
        assert!(req.validate().is_err());
    }

    #[test]
    fn monthly_figures_are_used_as_given() {
        let mut f = facet(3.0);
        let monthly: Vec<f64> = (1..=12).map(|m| m as f64 * 10.0).collect();
        f.monthly_kwh = Some(monthly.clone());
        f.annual_kwh = Some(99_999.0);

        let (values, basis) = facet_production(&f);
        assert_eq!(basis, FacetBasis::Monthly);
        assert_eq!(values.to_vec(), monthly);

        let result = simulate(&request(vec![f]));
        assert_eq!(result.details[0].annual_kwh, 780.0);
    }

    #[test]
    fn annual_total_is_spread_evenly() {
        let mut f = facet(2.0);
        f.annual_kwh = Some(3_000.0);

        let (values, basis) = facet_production(&f);
        assert_eq!(basis, FacetBasis::Annual);
        assert!(values.iter().all(|v| *v == 250.0));

        let result = simulate(&request(vec![f]));
        assert_eq!(result.details[0].annual_kwh, 3_000.0);
    }

    #[test]
    fn missing_production_uses_capacity_estimate() {
        let (values, basis) = facet_production(&facet(2.5));
        assert_eq!(basis, FacetBasis::CapacityEstimate);
        assert!(values.iter().all(|v| *v == 25.0));

        let result = simulate(&request(vec![facet(2.5)]));
        assert_eq!(result.details[0].annual_kwh, 300.0);
    }

    #[test]
    fn totals_and_default_names_across_facets() {
        let mut south = facet(3.0);
        south.name = Some("South roof".to_string());
        south.annual_kwh = Some(4_800.0);
        let east = facet(1.5);

        let result = simulate(&request(vec![south, east]));

        assert_eq!(result.details[0].name, "South roof");
        assert_eq!(result.details[1].name, "Facet 2");
        assert_eq!(result.system_total_capacity_kwp, 4.5);
        assert_eq!(result.system_total_annual_kwh, 4_980.0);
        assert_eq!(result.system_financials.monthly_kwh[0], 415.0);
        assert!(result.storage.is_none());
    }

    #[test]
    fn savings_use_standard_rate_over_system_lifetime() {
        let mut f = facet(2.0);
        f.annual_kwh = Some(1_200.0);

        let financials = simulate(&request(vec![f])).system_financials;
        assert_eq!(financials.monthly_savings_ghs, vec![232.0; 12]);
        assert_eq!(financials.annual_savings_ghs, 2_784.0);
        assert_eq!(financials.lifetime_savings_ghs, 69_600.0);
    }

    #[test]
    fn storage_counts_whole_modules() {
        // 2 kWh/day -> 2.78 kWh of battery -> one module.
        let small = size_storage(&[appliance(100.0, 2, 10.0)]);
        assert_eq!(small.daily_load_kwh, 2.0);
        assert_eq!(small.required_battery_kwh, 2.78);
        assert_eq!(small.battery_count, 1);

        // 2 + 10 kWh/day -> 16.67 kWh -> four modules.
        let large = size_storage(&[appliance(100.0, 2, 10.0), appliance(500.0, 1, 20.0)]);
        assert_eq!(large.daily_load_kwh, 12.0);
        assert_eq!(large.required_battery_kwh, 16.67);
        assert_eq!(large.battery_count, 4);
        assert_eq!(large.battery_module_size_kwh, 5.0);

        assert_eq!(size_storage(&[]).battery_count, 0);
    }

    #[test]
    fn storage_is_sized_only_when_enabled() {
        let mut req = request(vec![facet(1.0)]);
        req.storage = Some(StorageConfig {
            enabled: false,
            appliances: vec![appliance(500.0, 1, 20.0)],
        });
        assert!(simulate(&req).storage.is_none());

        req.storage = Some(StorageConfig {
            enabled: true,
            appliances: vec![appliance(500.0, 1, 20.0)],
        });
        assert_eq!(simulate(&req).storage.map(|s| s.battery_count), Some(3));
    }

    #[test]
    fn request_json_accepts_sparse_facets() {
        let req: SimulationRequest = serde_json::from_str(
            r#"{"facets": [{"capacity_kwp": 2.0}, {"name": "West", "capacity_kwp": 1.0, "annual_kwh": 1400}]}"#,
        )
        .unwrap();
        assert!(req.validate().is_ok());
        assert!(req.storage.is_none());
        assert_eq!(req.facets[1].annual_kwh, Some(1400.0));
    }
}
