//! Turning free-text locations into coordinates. Feeds `SiteInput`; not part of estimation.

pub mod gazetteer;
pub mod nominatim;

use serde::{Deserialize, Serialize};

pub const FALLBACK_LATITUDE: f64 = 5.6037;
pub const FALLBACK_LONGITUDE: f64 = -0.1870;
pub const FALLBACK_DISPLAY_NAME: &str = "Accra, Ghana";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub lat: f64,
    pub lon: f64,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_type: Option<String>,
}

impl Place {
    pub fn accra() -> Self {
        Self {
            lat: FALLBACK_LATITUDE,
            lon: FALLBACK_LONGITUDE,
            display_name: FALLBACK_DISPLAY_NAME.to_string(),
            place_type: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeOutcome {
    /// Ranked best match first.
    Found(Vec<Place>),
    Fallback { reason: String, place: Place },
}

impl GeocodeOutcome {
    /// The place to use when only one is wanted.
    pub fn best(&self) -> Option<&Place> {
        match self {
            GeocodeOutcome::Found(places) => places.first(),
            GeocodeOutcome::Fallback { place, .. } => Some(place),
        }
    }
}

#[async_trait::async_trait]
pub trait Geocoder: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn search(&self, query: &str) -> anyhow::Result<Vec<Place>>;
}

/// Search results, or the fixed Accra location when the search fails or finds nothing.
pub async fn geocode_or_fallback(geocoder: &dyn Geocoder, query: &str) -> GeocodeOutcome {
    match geocoder.search(query).await {
        Ok(places) if !places.is_empty() => GeocodeOutcome::Found(places),
        Ok(_) => GeocodeOutcome::Fallback {
            reason: "No locations found".to_string(),
            place: Place::accra(),
        },
        Err(err) => {
            tracing::warn!(
                provider = geocoder.provider_name(),
                query,
                error = format!("{err:#}"),
                "geocoding failed; using fallback location"
            );
            GeocodeOutcome::Fallback {
                reason: format!("{err:#}"),
                place: Place::accra(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<Place>);

    #[async_trait::async_trait]
    impl Geocoder for Fixed {
        fn provider_name(&self) -> &'static str {
            "fixed"
        }

        async fn search(&self, _query: &str) -> anyhow::Result<Vec<Place>> {
            Ok(self.0.clone())
        }
    }

    struct Down;

    #[async_trait::async_trait]
    impl Geocoder for Down {
        fn provider_name(&self) -> &'static str {
            "down"
        }

        async fn search(&self, _query: &str) -> anyhow::Result<Vec<Place>> {
            anyhow::bail!("dns error")
        }
    }

    #[tokio::test]
    async fn empty_results_fall_back_to_accra() {
        let outcome = geocode_or_fallback(&Fixed(Vec::new()), "Atlantis").await;
        match &outcome {
            GeocodeOutcome::Fallback { reason, place } => {
                assert_eq!(reason, "No locations found");
                assert_eq!(place, &Place::accra());
            }
            other => panic!("expected fallback, got {other:?}"),
        }
        assert_eq!(outcome.best().unwrap().display_name, "Accra, Ghana");
    }

    #[tokio::test]
    async fn errors_fall_back_with_reason() {
        let outcome = geocode_or_fallback(&Down, "Tema").await;
        match outcome {
            GeocodeOutcome::Fallback { reason, .. } => assert!(reason.contains("dns error")),
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn results_are_passed_through_in_rank_order() {
        let tema = Place {
            lat: 5.6698,
            lon: -0.0168,
            display_name: "Tema, Greater Accra Region, Ghana".to_string(),
            place_type: Some("city".to_string()),
        };
        let outcome = geocode_or_fallback(&Fixed(vec![tema.clone(), Place::accra()]), "Tema").await;
        assert_eq!(outcome.best(), Some(&tema));
    }
}
