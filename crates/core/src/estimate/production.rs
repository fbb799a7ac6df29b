use crate::domain::site::SiteInput;
use serde::{Deserialize, Serialize};

/// Yearly yield per installed kWp from Ghana's average irradiation (kWh).
pub const FALLBACK_KWH_PER_KWP_YEAR: f64 = 1600.0;
/// Grid emissions avoided per kWh produced (kg CO2).
pub const FALLBACK_CO2_KG_PER_KWH: f64 = 0.5;
/// System losses assumed for every production request (%).
pub const SYSTEM_LOSS_PERCENT: u32 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductionSource {
    Live,
    Fallback,
}

impl ProductionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductionSource::Live => "live",
            ProductionSource::Fallback => "fallback",
        }
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "live" => Ok(ProductionSource::Live),
            "fallback" => Ok(ProductionSource::Fallback),
            other => anyhow::bail!("unknown production source: {other}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProductionResult {
    pub yearly_kwh: f64,
    pub co2_savings_kg: f64,
    pub source: ProductionSource,
}

/// What a live provider is asked for. Built from the site and the derived system size.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub peak_power_kw: f64,
    pub loss_percent: u32,
    pub tilt: i32,
    pub azimuth: i32,
}

impl ProductionRequest {
    pub fn for_site(site: &SiteInput, system_size_kw: f64) -> Self {
        Self {
            latitude: site.latitude,
            longitude: site.longitude,
            peak_power_kw: system_size_kw,
            loss_percent: SYSTEM_LOSS_PERCENT,
            tilt: site.tilt,
            azimuth: site.azimuth,
        }
    }
}

/// Totals reported by a live provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveProduction {
    pub yearly_kwh: f64,
    pub co2_savings_kg: f64,
}

#[async_trait::async_trait]
pub trait ProductionProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_production(&self, request: &ProductionRequest) -> anyhow::Result<LiveProduction>;
}

pub fn fallback_production(system_size_kw: f64) -> ProductionResult {
    let yearly_kwh = system_size_kw * FALLBACK_KWH_PER_KWP_YEAR;
    ProductionResult {
        yearly_kwh,
        co2_savings_kg: yearly_kwh * FALLBACK_CO2_KG_PER_KWH,
        source: ProductionSource::Fallback,
    }
}

/// Live production when the provider answers, the closed-form estimate otherwise.
///
/// Never fails. Every provider error (transport, status, body, missing totals) is treated the
/// same way and there is no retry.
pub async fn resolve_production(
    provider: Option<&dyn ProductionProvider>,
    site: &SiteInput,
    system_size_kw: f64,
) -> ProductionResult {
    let Some(provider) = provider else {
        tracing::debug!(system_size_kw, "no live production provider configured; using fallback");
        return fallback_production(system_size_kw);
    };

    let request = ProductionRequest::for_site(site, system_size_kw);
    match provider.fetch_production(&request).await {
        Ok(live) => ProductionResult {
            yearly_kwh: live.yearly_kwh,
            co2_savings_kg: live.co2_savings_kg,
            source: ProductionSource::Live,
        },
        Err(err) => {
            tracing::warn!(
                provider = provider.provider_name(),
                system_size_kw,
                error = format!("{err:#}"),
                "live production unavailable; using fallback"
            );
            fallback_production(system_size_kw)
        }
    }
}
