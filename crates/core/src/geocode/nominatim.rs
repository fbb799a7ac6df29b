use super::{Geocoder, Place};
use crate::config::Settings;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use std::time::Duration;

const SEARCH_PATH: &str = "/search";
const RESULT_LIMIT: u32 = 5;
const COUNTRY_CODE: &str = "gh";
const COUNTRY_SUFFIX: &str = ", Ghana";

/// OpenStreetMap Nominatim search, restricted to Ghana.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    http: reqwest::Client,
    base_url: String,
    user_agent: String,
}

impl NominatimClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            settings.nominatim_base_url(),
            settings.nominatim_user_agent(),
            settings.geocode_timeout(),
        )
    }

    pub fn new(
        base_url: impl Into<String>,
        user_agent: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build nominatim http client")?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            user_agent: user_agent.into(),
        })
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), SEARCH_PATH)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(&self.user_agent)?);
        Ok(headers)
    }
}

#[async_trait::async_trait]
impl Geocoder for NominatimClient {
    fn provider_name(&self) -> &'static str {
        "nominatim"
    }

    async fn search(&self, query: &str) -> Result<Vec<Place>> {
        let q = format!("{}{COUNTRY_SUFFIX}", query.trim());
        let limit = RESULT_LIMIT.to_string();

        let res = self
            .http
            .get(self.url())
            .headers(self.headers()?)
            .query(&[
                ("q", q.as_str()),
                ("format", "json"),
                ("limit", limit.as_str()),
                ("countrycodes", COUNTRY_CODE),
            ])
            .send()
            .await
            .context("nominatim request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read nominatim response")?;
        if !status.is_success() {
            anyhow::bail!("nominatim HTTP {status}: {text}");
        }

        let raw = serde_json::from_str::<Vec<RawPlace>>(&text)
            .with_context(|| format!("nominatim response is not a place list: {text}"))?;

        let mut places = Vec::with_capacity(raw.len());
        for item in raw {
            match item.into_place() {
                Ok(place) => places.push(place),
                Err(err) => tracing::warn!(error = %err, "skipping unparsable nominatim result"),
            }
        }
        Ok(places)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawPlace {
    lat: String,
    lon: String,
    display_name: String,
    #[serde(rename = "type", default)]
    place_type: Option<String>,
}

impl RawPlace {
    fn into_place(self) -> Result<Place> {
        let lat = self
            .lat
            .trim()
            .parse::<f64>()
            .with_context(|| format!("invalid lat: {}", self.lat))?;
        let lon = self
            .lon
            .trim()
            .parse::<f64>()
            .with_context(|| format!("invalid lon: {}", self.lon))?;
        Ok(Place {
            lat,
            lon,
            display_name: self.display_name,
            place_type: self.place_type,
        })
    }
}
