use crate::domain::site::SiteInput;
use crate::estimate::cost::{CostBreakdown, PricingStrategy};
use crate::estimate::finance::FinancialProjection;
use crate::estimate::labels::GeometryLabels;
use crate::estimate::production::ProductionResult;
use crate::estimate::tariff::ConsumptionEstimate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The persisted unit: every pipeline input and output for one submission.
///
/// Component structs are flattened when serialized, so the JSON is a single flat object and
/// the live and fallback paths always carry the same keys. `id` stays `None` until the store
/// assigns one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRecord {
    pub id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub site: SiteInput,
    #[serde(flatten)]
    pub consumption: ConsumptionEstimate,
    #[serde(flatten)]
    pub production: ProductionResult,
    pub pricing: PricingStrategy,
    #[serde(flatten)]
    pub cost: CostBreakdown,
    #[serde(flatten)]
    pub financial: FinancialProjection,
    pub is_fallback: bool,
}

impl CalculationRecord {
    /// The inputs this record was computed from, for recalculation.
    pub fn site_input(&self) -> SiteInput {
        self.site.clone()
    }

    pub fn labels(&self) -> GeometryLabels {
        GeometryLabels::new(self.site.azimuth, self.site.tilt)
    }
}

/// What the store hands back for a newly created record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCalculation {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
}
