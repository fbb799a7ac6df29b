use crate::domain::calculation::CalculationRecord;
use crate::domain::site::SiteInput;
use crate::estimate::cost::{compute_cost, PricingStrategy};
use crate::estimate::finance::project_financials;
use crate::estimate::production::{resolve_production, ProductionProvider};
use crate::estimate::record::build_record;
use crate::estimate::tariff::estimate_consumption;
use crate::config::DEFAULT_STORE_TIMEOUT_SECS;
use crate::storage::CalculationStore;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Runs the estimation pipeline and hands the result to persistence.
///
/// Holds only shared client handles; every call works on its own `SiteInput`, so concurrent
/// estimates never see each other's state.
#[derive(Clone)]
pub struct Estimator {
    production: Option<Arc<dyn ProductionProvider>>,
    store: Option<Arc<dyn CalculationStore>>,
    store_timeout: Duration,
}

impl Default for Estimator {
    fn default() -> Self {
        Self {
            production: None,
            store: None,
            store_timeout: Duration::from_secs(DEFAULT_STORE_TIMEOUT_SECS),
        }
    }
}

impl fmt::Debug for Estimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Estimator")
            .field(
                "production",
                &self.production.as_ref().map(|p| p.provider_name()),
            )
            .field("store", &self.store.is_some())
            .field("store_timeout", &self.store_timeout)
            .finish()
    }
}

/// A computed record and whether it reached the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub calculation: CalculationRecord,
    pub saved: bool,
}

impl Estimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_production_provider(mut self, provider: Arc<dyn ProductionProvider>) -> Self {
        self.production = Some(provider);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn CalculationStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// How long `estimate` waits on a write before returning the record unsaved.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn store(&self) -> Option<&Arc<dyn CalculationStore>> {
        self.store.as_ref()
    }

    /// The full derivation chain, without persistence.
    pub async fn calculate(&self, site: SiteInput) -> CalculationRecord {
        let consumption = estimate_consumption(site.monthly_spend);
        let production =
            resolve_production(self.production.as_deref(), &site, consumption.system_size_kw)
                .await;
        let cost = compute_cost(
            consumption.system_size_kw,
            consumption.monthly_kwh,
            site.includes_battery,
            PricingStrategy::for_source(production.source),
        );
        let financial = project_financials(site.monthly_spend, cost.total_cost);

        tracing::info!(
            location = %site.location,
            source = production.source.as_str(),
            system_size_kw = consumption.system_size_kw,
            total_cost = cost.total_cost,
            "estimate computed"
        );

        build_record(site, consumption, production, cost, financial)
    }

    /// Calculates, then stores the record when a store is configured.
    ///
    /// A failed or stalled write is logged and the unsaved record is still returned.
    pub async fn estimate(&self, site: SiteInput) -> Estimate {
        let mut calculation = self.calculate(site).await;

        let Some(store) = &self.store else {
            tracing::debug!("no calculation store configured; result not persisted");
            return Estimate {
                calculation,
                saved: false,
            };
        };

        match tokio::time::timeout(self.store_timeout, store.create(&calculation)).await {
            Ok(Ok(stored)) => {
                calculation.id = Some(stored.id);
                calculation.created_at = stored.created_at;
                tracing::info!(id = %stored.id, "persisted calculation");
                Estimate {
                    calculation,
                    saved: true,
                }
            }
            Ok(Err(err)) => {
                tracing::error!(
                    error = format!("{err:#}"),
                    "failed to persist calculation; returning unsaved result"
                );
                Estimate {
                    calculation,
                    saved: false,
                }
            }
            Err(_) => {
                tracing::error!(
                    timeout_ms = self.store_timeout.as_millis() as u64,
                    "calculation write timed out; returning unsaved result"
                );
                Estimate {
                    calculation,
                    saved: false,
                }
            }
        }
    }

    /// Re-runs a stored calculation from its original inputs. The stored record is left as is.
    ///
    /// `Ok(None)` when the id is unknown.
    pub async fn recalculate(&self, id: Uuid) -> anyhow::Result<Option<Estimate>> {
        let store = self
            .store
            .as_ref()
            .context("recalculation requires a calculation store")?;

        let Some(previous) = store.get(id).await? else {
            return Ok(None);
        };

        tracing::info!(%id, "recalculating stored calculation");
        Ok(Some(self.estimate(previous.site_input()).await))
    }
}
