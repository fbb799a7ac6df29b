use std::fmt;

/// Why a live production fetch was rejected. Carried through `anyhow` into the fallback log.
#[derive(Debug, Clone)]
pub struct ProductionFetchError {
    pub stage: &'static str,
    pub detail: String,
    pub raw_body: Option<String>,
}

impl ProductionFetchError {
    pub fn new(stage: &'static str, detail: impl Into<String>) -> Self {
        Self {
            stage,
            detail: detail.into(),
            raw_body: None,
        }
    }

    pub fn with_raw_body(mut self, body: String) -> Self {
        self.raw_body = Some(body);
        self
    }
}

impl fmt::Display for ProductionFetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PVGIS error (stage={}): {}", self.stage, self.detail)
    }
}

impl std::error::Error for ProductionFetchError {}
