//! PVGIS `PVcalc` client, the live source of yearly production figures.

pub mod error;

use crate::config::Settings;
use crate::estimate::production::{LiveProduction, ProductionProvider, ProductionRequest};
use anyhow::{Context, Result};
use error::ProductionFetchError;
use serde::Deserialize;
use std::time::Duration;

const PVCALC_PATH: &str = "/PVcalc";

#[derive(Debug, Clone)]
pub struct PvgisClient {
    http: reqwest::Client,
    base_url: String,
}

impl PvgisClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(settings.pvgis_base_url(), settings.pvgis_timeout())
    }

    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build PVGIS http client")?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), PVCALC_PATH)
    }

    fn query(request: &ProductionRequest) -> Vec<(&'static str, String)> {
        vec![
            ("lat", request.latitude.to_string()),
            ("lon", request.longitude.to_string()),
            ("peakpower", format!("{:.2}", request.peak_power_kw)),
            ("loss", request.loss_percent.to_string()),
            ("angle", request.tilt.to_string()),
            ("aspect", request.azimuth.to_string()),
            ("outputformat", "json".to_string()),
        ]
    }
}

#[async_trait::async_trait]
impl ProductionProvider for PvgisClient {
    fn provider_name(&self) -> &'static str {
        "pvgis"
    }

    async fn fetch_production(&self, request: &ProductionRequest) -> Result<LiveProduction> {
        let res = self
            .http
            .get(self.url())
            .query(&Self::query(request))
            .send()
            .await
            .map_err(|e| ProductionFetchError::new("http", e.to_string()))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| ProductionFetchError::new("body", e.to_string()))?;

        if !status.is_success() {
            return Err(ProductionFetchError::new("http", format!("status={status}"))
                .with_raw_body(text)
                .into());
        }

        let parsed = serde_json::from_str::<PvcalcResponse>(&text).map_err(|e| {
            ProductionFetchError::new("decode", e.to_string()).with_raw_body(text.clone())
        })?;

        let totals = parsed.outputs.totals.fixed;
        validate_totals(&totals)?;

        tracing::debug!(
            yearly_kwh = totals.e_y,
            co2_savings_kg = totals.co2_savings,
            "PVGIS production received"
        );

        Ok(LiveProduction {
            yearly_kwh: totals.e_y,
            co2_savings_kg: totals.co2_savings,
        })
    }
}

fn validate_totals(totals: &FixedTotals) -> Result<()> {
    if !(totals.e_y.is_finite() && totals.e_y >= 0.0) {
        return Err(ProductionFetchError::new("validate", format!("invalid E_y: {}", totals.e_y)).into());
    }
    if !(totals.co2_savings.is_finite() && totals.co2_savings >= 0.0) {
        return Err(ProductionFetchError::new(
            "validate",
            format!("invalid CO2_savings: {}", totals.co2_savings),
        )
        .into());
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
struct PvcalcResponse {
    outputs: Outputs,
}

#[derive(Debug, Clone, Deserialize)]
struct Outputs {
    totals: Totals,
}

#[derive(Debug, Clone, Deserialize)]
struct Totals {
    fixed: FixedTotals,
}

#[derive(Debug, Clone, Deserialize)]
struct FixedTotals {
    #[serde(rename = "E_y")]
    e_y: f64,
    #[serde(rename = "CO2_savings")]
    co2_savings: f64,
}
