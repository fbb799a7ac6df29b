use super::CalculationStore;
use crate::domain::calculation::{CalculationRecord, StoredCalculation};
use crate::domain::site::SiteInput;
use crate::estimate::cost::{CostBreakdown, PricingStrategy};
use crate::estimate::finance::{FinancialProjection, Payback};
use crate::estimate::production::{ProductionResult, ProductionSource};
use crate::estimate::tariff::ConsumptionEstimate;
use anyhow::Context;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const DEFAULT_LIST_LIMIT: i64 = 10;
pub const MAX_LIST_LIMIT: i64 = 100;

const SELECT_COLUMNS: &str = "id, created_at, location, latitude, longitude, azimuth, tilt, \
     monthly_spend, includes_battery, tariff_rate_per_kwh, monthly_kwh, system_size_kw, \
     yearly_kwh, co2_savings_kg, source, pricing, is_fallback, panels_needed, panels_cost, \
     inverter_cost, installation_cost, system_cost_ex_battery, battery_kwh, battery_cost, \
     total_cost, yearly_savings, lifetime_savings, payback_years";

/// Default 10, clamped to 1..=100 so a single request cannot pull the whole table.
pub fn clamp_list_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT)
}

#[derive(Debug, Clone)]
pub struct PgCalculationStore {
    pool: sqlx::PgPool,
}

impl PgCalculationStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CalculationStore for PgCalculationStore {
    async fn create(&self, record: &CalculationRecord) -> anyhow::Result<StoredCalculation> {
        let panels_needed = i32::try_from(record.cost.panels_needed)
            .context("panels_needed does not fit in INTEGER")?;

        let (id, created_at): (Uuid, DateTime<Utc>) = sqlx::query_as(
            "INSERT INTO solar_calculations (created_at, location, latitude, longitude, azimuth, tilt, \
             monthly_spend, includes_battery, tariff_rate_per_kwh, monthly_kwh, system_size_kw, \
             yearly_kwh, co2_savings_kg, source, pricing, is_fallback, panels_needed, panels_cost, \
             inverter_cost, installation_cost, system_cost_ex_battery, battery_kwh, battery_cost, \
             total_cost, yearly_savings, lifetime_savings, payback_years) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, \
                     $18, $19, $20, $21, $22, $23, $24, $25, $26, $27) \
             RETURNING id, created_at",
        )
        .bind(record.created_at)
        .bind(&record.site.location)
        .bind(record.site.latitude)
        .bind(record.site.longitude)
        .bind(record.site.azimuth)
        .bind(record.site.tilt)
        .bind(record.site.monthly_spend)
        .bind(record.site.includes_battery)
        .bind(record.consumption.tariff_rate_per_kwh)
        .bind(record.consumption.monthly_kwh)
        .bind(record.consumption.system_size_kw)
        .bind(record.production.yearly_kwh)
        .bind(record.production.co2_savings_kg)
        .bind(record.production.source.as_str())
        .bind(record.pricing.as_str())
        .bind(record.is_fallback)
        .bind(panels_needed)
        .bind(record.cost.panels_cost)
        .bind(record.cost.inverter_cost)
        .bind(record.cost.installation_cost)
        .bind(record.cost.system_cost_ex_battery)
        .bind(record.cost.battery_kwh)
        .bind(record.cost.battery_cost)
        .bind(record.cost.total_cost)
        .bind(record.financial.yearly_savings)
        .bind(record.financial.lifetime_savings)
        .bind(record.financial.payback_years.years())
        .fetch_one(&self.pool)
        .await
        .context("insert solar_calculations failed")?;

        Ok(StoredCalculation { id, created_at })
    }

    async fn list(&self, limit: i64) -> anyhow::Result<Vec<CalculationRecord>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM solar_calculations \
             ORDER BY created_at DESC \
             LIMIT $1"
        );
        let rows = sqlx::query_as::<_, CalculationRow>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .context("select solar_calculations failed")?;

        rows.into_iter().map(CalculationRecord::try_from).collect()
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<CalculationRecord>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM solar_calculations WHERE id = $1");
        let row = sqlx::query_as::<_, CalculationRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("select solar_calculations failed (id={id})"))?;

        row.map(CalculationRecord::try_from).transpose()
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct CalculationRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    location: String,
    latitude: f64,
    longitude: f64,
    azimuth: i32,
    tilt: i32,
    monthly_spend: f64,
    includes_battery: bool,
    tariff_rate_per_kwh: f64,
    monthly_kwh: f64,
    system_size_kw: f64,
    yearly_kwh: f64,
    co2_savings_kg: f64,
    source: String,
    pricing: String,
    is_fallback: bool,
    panels_needed: i32,
    panels_cost: f64,
    inverter_cost: f64,
    installation_cost: f64,
    system_cost_ex_battery: f64,
    battery_kwh: f64,
    battery_cost: f64,
    total_cost: f64,
    yearly_savings: f64,
    lifetime_savings: f64,
    payback_years: Option<f64>,
}

impl TryFrom<CalculationRow> for CalculationRecord {
    type Error = anyhow::Error;

    fn try_from(row: CalculationRow) -> anyhow::Result<Self> {
        let source = ProductionSource::parse(&row.source)
            .with_context(|| format!("invalid source in DB for id={}", row.id))?;
        let pricing = PricingStrategy::parse(&row.pricing)
            .with_context(|| format!("invalid pricing in DB for id={}", row.id))?;
        let panels_needed = u32::try_from(row.panels_needed)
            .with_context(|| format!("negative panels_needed in DB for id={}", row.id))?;
        anyhow::ensure!(
            row.is_fallback == (source == ProductionSource::Fallback),
            "is_fallback disagrees with source in DB for id={}",
            row.id
        );

        Ok(CalculationRecord {
            id: Some(row.id),
            created_at: row.created_at,
            site: SiteInput {
                location: row.location,
                latitude: row.latitude,
                longitude: row.longitude,
                azimuth: row.azimuth,
                tilt: row.tilt,
                monthly_spend: row.monthly_spend,
                includes_battery: row.includes_battery,
            },
            consumption: ConsumptionEstimate {
                tariff_rate_per_kwh: row.tariff_rate_per_kwh,
                monthly_kwh: row.monthly_kwh,
                system_size_kw: row.system_size_kw,
            },
            production: ProductionResult {
                yearly_kwh: row.yearly_kwh,
                co2_savings_kg: row.co2_savings_kg,
                source,
            },
            pricing,
            cost: CostBreakdown {
                panels_needed,
                panels_cost: row.panels_cost,
                inverter_cost: row.inverter_cost,
                installation_cost: row.installation_cost,
                system_cost_ex_battery: row.system_cost_ex_battery,
                battery_kwh: row.battery_kwh,
                battery_cost: row.battery_cost,
                total_cost: row.total_cost,
            },
            financial: FinancialProjection {
                yearly_savings: row.yearly_savings,
                lifetime_savings: row.lifetime_savings,
                payback_years: Payback::from(row.payback_years),
            },
            is_fallback: row.is_fallback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row() -> CalculationRow {
        CalculationRow {
            id: Uuid::new_v4(),
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            location: "Osu".to_string(),
            latitude: 5.556,
            longitude: -0.187,
            azimuth: 180,
            tilt: 15,
            monthly_spend: 500.0,
            includes_battery: false,
            tariff_rate_per_kwh: 1.76,
            monthly_kwh: 284.09,
            system_size_kw: 2.367,
            yearly_kwh: 3_787.9,
            co2_savings_kg: 1_893.9,
            source: "fallback".to_string(),
            pricing: "flat".to_string(),
            is_fallback: true,
            panels_needed: 6,
            panels_cost: 20_700.0,
            inverter_cost: 0.0,
            installation_cost: 6_000.0,
            system_cost_ex_battery: 26_700.0,
            battery_kwh: 0.0,
            battery_cost: 0.0,
            total_cost: 26_700.0,
            yearly_savings: 6_000.0,
            lifetime_savings: 150_000.0,
            payback_years: Some(4.45),
        }
    }

    #[test]
    fn row_maps_to_record() {
        let row = row();
        let id = row.id;
        let record = CalculationRecord::try_from(row).unwrap();
        assert_eq!(record.id, Some(id));
        assert_eq!(record.production.source, ProductionSource::Fallback);
        assert_eq!(record.pricing, PricingStrategy::Flat);
        assert_eq!(record.cost.panels_needed, 6);
        assert_eq!(record.financial.payback_years, Payback::Years(4.45));
        assert_eq!(record.site_input().location, "Osu");
    }

    #[test]
    fn null_payback_maps_to_not_applicable() {
        let mut row = row();
        row.payback_years = None;
        let record = CalculationRecord::try_from(row).unwrap();
        assert_eq!(record.financial.payback_years, Payback::NotApplicable);
    }

    #[test]
    fn rejects_unknown_source_and_inconsistent_flag() {
        let mut bad_source = row();
        bad_source.source = "guess".to_string();
        assert!(CalculationRecord::try_from(bad_source).is_err());

        let mut inconsistent = row();
        inconsistent.is_fallback = false;
        assert!(CalculationRecord::try_from(inconsistent).is_err());
    }

    #[test]
    fn list_limit_is_clamped() {
        assert_eq!(clamp_list_limit(None), 10);
        assert_eq!(clamp_list_limit(Some(0)), 1);
        assert_eq!(clamp_list_limit(Some(-5)), 1);
        assert_eq!(clamp_list_limit(Some(50)), 50);
        assert_eq!(clamp_list_limit(Some(1_000)), 100);
    }
}
