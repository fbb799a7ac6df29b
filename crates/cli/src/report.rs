use std::fmt;

use sunsmart_core::domain::calculation::CalculationRecord;
use sunsmart_core::estimate::simulation::{FacetBasis, SimulationResult};

/// `GHS 26,700.00`
pub fn format_ghs(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}GHS {grouped}.{cents}")
}

/// Text report for one calculation.
pub struct CalculationReport<'a> {
    pub record: &'a CalculationRecord,
    pub saved: bool,
}

impl fmt::Display for CalculationReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.record;
        let labels = record.labels();
        let site = &record.site;
        let cost = &record.cost;

        writeln!(f, "Solar estimate for {}", site.location)?;
        match record.id {
            Some(id) if self.saved => writeln!(f, "  id:            {id}")?,
            _ => writeln!(f, "  id:            (not saved)")?,
        }
        writeln!(
            f,
            "  created:       {}",
            record.created_at.format("%Y-%m-%d %H:%M UTC")
        )?;
        writeln!(
            f,
            "  coordinates:   {:.4}, {:.4}",
            site.latitude, site.longitude
        )?;
        writeln!(
            f,
            "  panels face:   {} ({}), {}",
            labels.orientation, labels.facing, labels.tilt
        )?;
        writeln!(f)?;

        writeln!(f, "Usage")?;
        writeln!(f, "  monthly bill:  {}", format_ghs(site.monthly_spend))?;
        writeln!(
            f,
            "  tariff:        GHS {:.2}/kWh",
            record.consumption.tariff_rate_per_kwh
        )?;
        writeln!(
            f,
            "  consumption:   {:.0} kWh/month",
            record.consumption.monthly_kwh
        )?;
        writeln!(f)?;

        writeln!(f, "System")?;
        writeln!(
            f,
            "  size:          {:.2} kWp ({} panels)",
            record.consumption.system_size_kw, cost.panels_needed
        )?;
        let source = if record.is_fallback {
            "offline estimate"
        } else {
            "PVGIS"
        };
        writeln!(
            f,
            "  production:    {:.0} kWh/year ({source})",
            record.production.yearly_kwh
        )?;
        writeln!(
            f,
            "  CO2 avoided:   {:.0} kg/year",
            record.production.co2_savings_kg
        )?;
        if site.includes_battery {
            writeln!(f, "  battery:       {:.0} kWh", cost.battery_kwh)?;
        } else {
            writeln!(f, "  battery:       None (grid-tied only)")?;
        }
        writeln!(f)?;

        writeln!(f, "Cost ({} pricing)", record.pricing.as_str())?;
        writeln!(f, "  panels:        {}", format_ghs(cost.panels_cost))?;
        writeln!(f, "  inverter:      {}", format_ghs(cost.inverter_cost))?;
        writeln!(f, "  installation:  {}", format_ghs(cost.installation_cost))?;
        if site.includes_battery {
            writeln!(f, "  battery:       {}", format_ghs(cost.battery_cost))?;
        }
        writeln!(f, "  total:         {}", format_ghs(cost.total_cost))?;
        writeln!(f)?;

        writeln!(f, "Savings")?;
        writeln!(
            f,
            "  yearly:        {}",
            format_ghs(record.financial.yearly_savings)
        )?;
        writeln!(
            f,
            "  over 25 years: {}",
            format_ghs(record.financial.lifetime_savings)
        )?;
        writeln!(f, "  payback:       {}", record.financial.payback_years)
    }
}

/// Text report for a roof simulation.
pub struct SimulationReport<'a>(pub &'a SimulationResult);

impl fmt::Display for SimulationReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.0;

        writeln!(
            f,
            "Roof simulation: {:.3} kWp, {:.0} kWh/year",
            result.system_total_capacity_kwp, result.system_total_annual_kwh
        )?;
        for facet in &result.details {
            let basis = match facet.basis {
                FacetBasis::Monthly => "monthly data",
                FacetBasis::Annual => "annual total",
                FacetBasis::CapacityEstimate => "capacity estimate",
            };
            writeln!(
                f,
                "  {:<16} {:>7.3} kWp  {:>9.0} kWh/year  ({basis})",
                facet.name, facet.capacity_kwp, facet.annual_kwh
            )?;
        }
        writeln!(f)?;

        let financials = &result.system_financials;
        writeln!(f, "Savings")?;
        writeln!(f, "  yearly:        {}", format_ghs(financials.annual_savings_ghs))?;
        writeln!(f, "  over 25 years: {}", format_ghs(financials.lifetime_savings_ghs))?;

        if let Some(storage) = &result.storage {
            writeln!(f)?;
            writeln!(f, "Storage")?;
            writeln!(f, "  daily load:    {:.2} kWh", storage.daily_load_kwh)?;
            writeln!(f, "  battery need:  {:.2} kWh", storage.required_battery_kwh)?;
            writeln!(
                f,
                "  modules:       {} x {:.0} kWh",
                storage.battery_count, storage.battery_module_size_kwh
            )?;
        }
        Ok(())
    }
}

/// One row of `history` output.
pub fn history_line(record: &CalculationRecord) -> String {
    let id = record
        .id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{id}  {}  {:<20}  {:>6.2} kWp  {:>16}  {:<8}  {}",
        record.created_at.format("%Y-%m-%d"),
        record.site.location,
        record.consumption.system_size_kw,
        format_ghs(record.cost.total_cost),
        record.production.source.as_str(),
        record.labels().orientation,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sunsmart_core::domain::site::SiteInput;
    use sunsmart_core::estimate::simulation::{
        simulate, Appliance, RoofFacet, SimulationRequest, StorageConfig,
    };
    use sunsmart_core::estimate::Estimator;

    fn site(includes_battery: bool) -> SiteInput {
        SiteInput {
            location: "Accra".to_string(),
            latitude: 5.6037,
            longitude: -0.1870,
            azimuth: 180,
            tilt: 15,
            monthly_spend: 500.0,
            includes_battery,
        }
    }

    #[test]
    fn ghs_groups_thousands() {
        assert_eq!(format_ghs(0.0), "GHS 0.00");
        assert_eq!(format_ghs(999.5), "GHS 999.50");
        assert_eq!(format_ghs(26_700.0), "GHS 26,700.00");
        assert_eq!(format_ghs(1_234_567.891), "GHS 1,234,567.89");
        assert_eq!(format_ghs(-1500.0), "-GHS 1,500.00");
    }

    #[tokio::test]
    async fn report_for_offline_estimate() {
        let record = Estimator::new().calculate(site(false)).await;
        let text = CalculationReport {
            record: &record,
            saved: false,
        }
        .to_string();

        assert!(text.contains("Solar estimate for Accra"));
        assert!(text.contains("(not saved)"));
        assert!(text.contains("South (Front), Slightly Sloped"));
        assert!(text.contains("offline estimate"));
        assert!(text.contains("None (grid-tied only)"));
        assert!(text.contains("Cost (flat pricing)"));
        assert!(text.contains("GHS 6,000.00"));
        assert!(text.ends_with("years\n"));
    }

    #[tokio::test]
    async fn report_lists_battery_when_requested() {
        let record = Estimator::new().calculate(site(true)).await;
        let text = CalculationReport {
            record: &record,
            saved: false,
        }
        .to_string();
        assert!(text.contains("  battery:       5 kWh"));
        assert!(text.contains("GHS 15,000.00"));
    }

    #[tokio::test]
    async fn history_line_names_source_and_orientation() {
        let record = Estimator::new().calculate(site(false)).await;
        let line = history_line(&record);
        assert!(line.starts_with("-  "));
        assert!(line.contains("fallback"));
        assert!(line.ends_with("South"));
    }

    #[test]
    fn simulation_report_lists_facets_and_storage() {
        let request = SimulationRequest {
            facets: vec![
                RoofFacet {
                    name: Some("South".to_string()),
                    capacity_kwp: 3.0,
                    monthly_kwh: None,
                    annual_kwh: Some(4_200.0),
                },
                RoofFacet {
                    name: None,
                    capacity_kwp: 1.0,
                    monthly_kwh: None,
                    annual_kwh: None,
                },
            ],
            storage: Some(StorageConfig {
                enabled: true,
                appliances: vec![Appliance {
                    name: "Fridge".to_string(),
                    wattage: 500.0,
                    quantity: 1,
                    hours_per_day: 20.0,
                }],
            }),
        };

        let text = SimulationReport(&simulate(&request)).to_string();
        assert!(text.starts_with("Roof simulation: 4.000 kWp, 4320 kWh/year"));
        assert!(text.contains("(annual total)"));
        assert!(text.contains("Facet 2"));
        assert!(text.contains("(capacity estimate)"));
        assert!(text.contains("modules:       3 x 5 kWh"));
    }
}
