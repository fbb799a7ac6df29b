use anyhow::ensure;
use serde::{Deserialize, Serialize};

pub const UNKNOWN_LOCATION: &str = "Unknown";

/// Roof geometry and household economics for one submission.
///
/// Built once at the boundary (API body, CLI flags, or a stored record) and passed by value
/// through the pipeline. Nothing downstream mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteInput {
    #[serde(default = "default_location")]
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Compass degrees the roof face points to (0 = north, clockwise).
    pub azimuth: i32,
    /// Roof pitch in degrees.
    pub tilt: i32,
    /// Monthly electricity spend in GHS.
    pub monthly_spend: f64,
    #[serde(default)]
    pub includes_battery: bool,
}

fn default_location() -> String {
    UNKNOWN_LOCATION.to_string()
}

impl SiteInput {
    /// Boundary checks applied before a site reaches the pipeline.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude),
            "latitude must be between -90 and 90 (got {})",
            self.latitude
        );
        ensure!(
            self.longitude.is_finite() && (-180.0..=180.0).contains(&self.longitude),
            "longitude must be between -180 and 180 (got {})",
            self.longitude
        );
        ensure!(
            (0..=359).contains(&self.azimuth),
            "azimuth must be 0..=359 (got {})",
            self.azimuth
        );
        ensure!(
            (0..=90).contains(&self.tilt),
            "tilt must be 0..=90 (got {})",
            self.tilt
        );
        ensure!(
            self.monthly_spend.is_finite() && self.monthly_spend > 0.0,
            "monthly spend must be greater than 0 (got {})",
            self.monthly_spend
        );
        Ok(())
    }

    pub fn location_or_unknown(mut self) -> Self {
        if self.location.trim().is_empty() {
            self.location = default_location();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn accra() -> SiteInput {
        SiteInput {
            location: "Accra".to_string(),
            latitude: 5.6037,
            longitude: -0.1870,
            azimuth: 180,
            tilt: 15,
            monthly_spend: 500.0,
            includes_battery: false,
        }
    }

    #[test]
    fn accepts_typical_site() {
        assert!(accra().validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_spend() {
        let mut site = accra();
        site.monthly_spend = 0.0;
        assert!(site.validate().is_err());
        site.monthly_spend = f64::NAN;
        assert!(site.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_geometry() {
        let mut site = accra();
        site.azimuth = 360;
        assert!(site.validate().is_err());

        let mut site = accra();
        site.tilt = -5;
        assert!(site.validate().is_err());

        let mut site = accra();
        site.latitude = 91.0;
        assert!(site.validate().is_err());
    }

    #[test]
    fn location_and_battery_are_optional_in_json() {
        let site: SiteInput = serde_json::from_value(json!({
            "latitude": 6.6885,
            "longitude": -1.6244,
            "azimuth": 90,
            "tilt": 30,
            "monthly_spend": 800.0,
        }))
        .unwrap();

        assert_eq!(site.location, UNKNOWN_LOCATION);
        assert!(!site.includes_battery);
    }

    #[test]
    fn blank_location_becomes_unknown() {
        let mut site = accra();
        site.location = "   ".to_string();
        assert_eq!(site.location_or_unknown().location, UNKNOWN_LOCATION);
    }
}
