use crate::estimate::production::ProductionSource;
use serde::{Deserialize, Serialize};

/// Nominal rating of one panel (W).
pub const PANEL_RATING_W: f64 = 400.0;

/// Battery sized for a third of one average day of consumption.
const BATTERY_DAYS_PER_MONTH: f64 = 30.0;
const BATTERY_DAY_FRACTION_DIVISOR: f64 = 3.0;
pub const MIN_BATTERY_KWH: f64 = 5.0;

// Itemized pricing (GHS, May 2025 market quotes).
const ITEMIZED_PANEL_PRICE: f64 = 1500.0;
const ITEMIZED_INVERTER_SMALL: f64 = 4000.0;
const ITEMIZED_INVERTER_MEDIUM: f64 = 6000.0;
const ITEMIZED_INVERTER_LARGE: f64 = 8000.0;
const ITEMIZED_INVERTER_MEDIUM_FROM_KW: f64 = 3.0;
const ITEMIZED_INVERTER_LARGE_FROM_KW: f64 = 5.0;
const ITEMIZED_INSTALLATION_BASE: f64 = 2000.0;
const ITEMIZED_INSTALLATION_PER_KW: f64 = 500.0;
const ITEMIZED_BATTERY_PER_KWH: f64 = 3500.0;
const ITEMIZED_BATTERY_INSTALLATION: f64 = 1500.0;

// Flat pricing: inverter and mounting folded into the per-panel price.
const FLAT_PANEL_PRICE: f64 = 3450.0;
const FLAT_BASE_FEE: f64 = 6000.0;
const FLAT_BATTERY_PER_KWH: f64 = 3000.0;

/// How system cost is composed.
///
/// `Itemized` prices components separately and scales the inverter and installation with
/// system size. `Flat` is the coarse heuristic paired with fallback production figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingStrategy {
    Itemized,
    Flat,
}

impl PricingStrategy {
    pub fn for_source(source: ProductionSource) -> Self {
        match source {
            ProductionSource::Live => PricingStrategy::Itemized,
            ProductionSource::Fallback => PricingStrategy::Flat,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PricingStrategy::Itemized => "itemized",
            PricingStrategy::Flat => "flat",
        }
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "itemized" => Ok(PricingStrategy::Itemized),
            "flat" => Ok(PricingStrategy::Flat),
            other => anyhow::bail!("unknown pricing strategy: {other}"),
        }
    }

    fn inverter_cost(&self, system_size_kw: f64) -> f64 {
        match self {
            PricingStrategy::Itemized => {
                if system_size_kw < ITEMIZED_INVERTER_MEDIUM_FROM_KW {
                    ITEMIZED_INVERTER_SMALL
                } else if system_size_kw < ITEMIZED_INVERTER_LARGE_FROM_KW {
                    ITEMIZED_INVERTER_MEDIUM
                } else {
                    ITEMIZED_INVERTER_LARGE
                }
            }
            PricingStrategy::Flat => 0.0,
        }
    }

    fn panels_cost(&self, panels: u32) -> f64 {
        let unit = match self {
            PricingStrategy::Itemized => ITEMIZED_PANEL_PRICE,
            PricingStrategy::Flat => FLAT_PANEL_PRICE,
        };
        f64::from(panels) * unit
    }

    fn installation_cost(&self, system_size_kw: f64) -> f64 {
        match self {
            PricingStrategy::Itemized => {
                ITEMIZED_INSTALLATION_BASE + system_size_kw * ITEMIZED_INSTALLATION_PER_KW
            }
            PricingStrategy::Flat => FLAT_BASE_FEE,
        }
    }

    fn battery_cost(&self, battery_kwh: f64) -> f64 {
        match self {
            PricingStrategy::Itemized => {
                battery_kwh * ITEMIZED_BATTERY_PER_KWH + ITEMIZED_BATTERY_INSTALLATION
            }
            PricingStrategy::Flat => battery_kwh * FLAT_BATTERY_PER_KWH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub panels_needed: u32,
    pub panels_cost: f64,
    pub inverter_cost: f64,
    pub installation_cost: f64,
    pub system_cost_ex_battery: f64,
    pub battery_kwh: f64,
    pub battery_cost: f64,
    pub total_cost: f64,
}

pub fn panels_needed(system_size_kw: f64) -> u32 {
    (system_size_kw * 1000.0 / PANEL_RATING_W).ceil() as u32
}

pub fn battery_kwh(monthly_kwh: f64) -> f64 {
    (monthly_kwh / BATTERY_DAYS_PER_MONTH / BATTERY_DAY_FRACTION_DIVISOR)
        .ceil()
        .max(MIN_BATTERY_KWH)
}

pub fn compute_cost(
    system_size_kw: f64,
    monthly_kwh: f64,
    includes_battery: bool,
    strategy: PricingStrategy,
) -> CostBreakdown {
    let panels_needed = panels_needed(system_size_kw);
    let panels_cost = strategy.panels_cost(panels_needed);
    let inverter_cost = strategy.inverter_cost(system_size_kw);
    let installation_cost = strategy.installation_cost(system_size_kw);
    let system_cost_ex_battery = panels_cost + inverter_cost + installation_cost;

    let (battery_kwh, battery_cost) = if includes_battery {
        let kwh = battery_kwh(monthly_kwh);
        (kwh, strategy.battery_cost(kwh))
    } else {
        (0.0, 0.0)
    };

    CostBreakdown {
        panels_needed,
        panels_cost,
        inverter_cost,
        installation_cost,
        system_cost_ex_battery,
        battery_kwh,
        battery_cost,
        total_cost: system_cost_ex_battery + battery_cost,
    }
}
