pub mod domain;
pub mod estimate;
pub mod geocode;
pub mod pvgis;
pub mod storage;

pub mod config {
    use anyhow::Context;
    use std::time::Duration;

    pub const DEFAULT_PVGIS_BASE_URL: &str = "https://re.jrc.ec.europa.eu/api/v5_3";
    pub const DEFAULT_NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org";
    pub const DEFAULT_NOMINATIM_USER_AGENT: &str = "SunSmart Solar Estimator/1.0";
    pub const DEFAULT_PVGIS_TIMEOUT_SECS: u64 = 10;
    pub const DEFAULT_GEOCODE_TIMEOUT_SECS: u64 = 10;
    pub const DEFAULT_STORE_TIMEOUT_SECS: u64 = 5;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub sentry_dsn: Option<String>,
        pub pvgis_base_url: Option<String>,
        pub nominatim_base_url: Option<String>,
        pub nominatim_user_agent: Option<String>,
        pub pvgis_timeout_secs: u64,
        pub geocode_timeout_secs: u64,
        /// Upper bound on a calculation write before the result is returned unsaved.
        pub store_timeout_secs: u64,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                database_url: None,
                sentry_dsn: None,
                pvgis_base_url: None,
                nominatim_base_url: None,
                nominatim_user_agent: None,
                pvgis_timeout_secs: DEFAULT_PVGIS_TIMEOUT_SECS,
                geocode_timeout_secs: DEFAULT_GEOCODE_TIMEOUT_SECS,
                store_timeout_secs: DEFAULT_STORE_TIMEOUT_SECS,
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                database_url: non_empty_var("DATABASE_URL"),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
                pvgis_base_url: non_empty_var("PVGIS_BASE_URL"),
                nominatim_base_url: non_empty_var("NOMINATIM_BASE_URL"),
                nominatim_user_agent: non_empty_var("NOMINATIM_USER_AGENT"),
                pvgis_timeout_secs: secs_var("PVGIS_TIMEOUT_SECS", DEFAULT_PVGIS_TIMEOUT_SECS)?,
                geocode_timeout_secs: secs_var(
                    "GEOCODE_TIMEOUT_SECS",
                    DEFAULT_GEOCODE_TIMEOUT_SECS,
                )?,
                store_timeout_secs: secs_var("STORE_TIMEOUT_SECS", DEFAULT_STORE_TIMEOUT_SECS)?,
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        pub fn pvgis_base_url(&self) -> &str {
            self.pvgis_base_url
                .as_deref()
                .unwrap_or(DEFAULT_PVGIS_BASE_URL)
        }

        pub fn nominatim_base_url(&self) -> &str {
            self.nominatim_base_url
                .as_deref()
                .unwrap_or(DEFAULT_NOMINATIM_BASE_URL)
        }

        pub fn nominatim_user_agent(&self) -> &str {
            self.nominatim_user_agent
                .as_deref()
                .unwrap_or(DEFAULT_NOMINATIM_USER_AGENT)
        }

        pub fn pvgis_timeout(&self) -> Duration {
            Duration::from_secs(self.pvgis_timeout_secs)
        }

        pub fn geocode_timeout(&self) -> Duration {
            Duration::from_secs(self.geocode_timeout_secs)
        }

        pub fn store_timeout(&self) -> Duration {
            Duration::from_secs(self.store_timeout_secs)
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|s| !s.trim().is_empty())
    }

    fn secs_var(key: &str, default: u64) -> anyhow::Result<u64> {
        match non_empty_var(key) {
            Some(raw) => parse_secs(key, &raw),
            None => Ok(default),
        }
    }

    fn parse_secs(key: &str, raw: &str) -> anyhow::Result<u64> {
        let secs = raw
            .trim()
            .parse::<u64>()
            .with_context(|| format!("{key} must be a whole number of seconds, got {raw:?}"))?;
        anyhow::ensure!(secs > 0, "{key} must be at least 1 second");
        Ok(secs)
    }

}
