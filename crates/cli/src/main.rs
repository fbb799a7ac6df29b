use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use sunsmart_core::config::Settings;
use sunsmart_core::domain::calculation::CalculationRecord;
use sunsmart_core::domain::site::SiteInput;
use sunsmart_core::estimate::labels::GeometryLabels;
use sunsmart_core::estimate::simulation::{simulate, SimulationRequest};
use sunsmart_core::estimate::Estimator;
use sunsmart_core::geocode::nominatim::NominatimClient;
use sunsmart_core::geocode::{gazetteer, geocode_or_fallback, GeocodeOutcome, Place};
use sunsmart_core::pvgis::PvgisClient;
use sunsmart_core::storage::calculations::{clamp_list_limit, PgCalculationStore};
use sunsmart_core::storage::CalculationStore;

mod report;

#[derive(Debug, Parser)]
#[command(name = "sunsmart", about = "Solar savings estimates for Ghanaian households")]
struct Args {
    /// Print records as JSON instead of a text report.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Estimate system size, cost and savings for a site.
    Estimate(EstimateArgs),

    /// Re-run a stored calculation from its original inputs.
    Recalculate {
        id: Uuid,

        /// Skip PVGIS and use the fallback production estimate.
        #[arg(long)]
        offline: bool,
    },

    /// List recent calculations, newest first.
    History {
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Print a stored calculation.
    Show { id: Uuid },

    /// Simulate a multi-facet roof from a JSON request file ("-" reads stdin).
    Simulate { input: PathBuf },
}

#[derive(Debug, clap::Args)]
struct EstimateArgs {
    /// Average monthly electricity bill in GHS.
    #[arg(long)]
    monthly_spend: f64,

    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,

    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Place name to geocode when coordinates are not given.
    #[arg(long)]
    location: Option<String>,

    /// Panel azimuth in degrees (0 = North, 180 = South).
    #[arg(long, default_value_t = 180)]
    azimuth: i32,

    /// Panel tilt in degrees from horizontal.
    #[arg(long, default_value_t = 15)]
    tilt: i32,

    /// Include battery storage in the quote.
    #[arg(long)]
    battery: bool,

    /// Skip PVGIS and geocoding services; use offline estimates.
    #[arg(long)]
    offline: bool,

    /// Do everything except writing to the database.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let output = Output { json: args.json };
    let result = match args.command {
        Command::Estimate(estimate) => run_estimate(&settings, output, estimate).await,
        Command::Recalculate { id, offline } => {
            run_recalculate(&settings, output, id, offline).await
        }
        Command::History { limit } => run_history(&settings, output, limit).await,
        Command::Show { id } => run_show(&settings, output, id).await,
        Command::Simulate { input } => run_simulate(output, &input),
    };

    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
    }
    result
}

async fn run_estimate(settings: &Settings, output: Output, args: EstimateArgs) -> anyhow::Result<()> {
    let site = resolve_site(settings, &args).await?;
    site.validate().context("invalid estimate input")?;

    let mut estimator = build_estimator(settings, args.offline)?;

    if args.dry_run {
        let calculation = estimator.calculate(site).await;
        tracing::info!(
            dry_run = true,
            source = calculation.production.source.as_str(),
            "estimate computed"
        );
        return output.calculation(&calculation, false);
    }

    match connect_store(settings).await {
        Ok(store) => estimator = estimator.with_store(store),
        Err(e) => tracing::warn!(
            error = format!("{e:#}"),
            "calculation store unavailable; result will not be saved"
        ),
    }

    let estimate = estimator.estimate(site).await;
    output.calculation(&estimate.calculation, estimate.saved)
}

async fn run_recalculate(
    settings: &Settings,
    output: Output,
    id: Uuid,
    offline: bool,
) -> anyhow::Result<()> {
    let store = connect_store(settings).await?;
    let estimator = build_estimator(settings, offline)?.with_store(store);

    let estimate = estimator
        .recalculate(id)
        .await?
        .with_context(|| format!("calculation {id} not found"))?;

    output.calculation(&estimate.calculation, estimate.saved)
}

async fn run_history(settings: &Settings, output: Output, limit: Option<i64>) -> anyhow::Result<()> {
    let store = connect_store(settings).await?;
    let records = store.list(clamp_list_limit(limit)).await?;

    if output.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No calculations stored yet.");
        return Ok(());
    }

    for record in &records {
        println!("{}", report::history_line(record));
    }
    Ok(())
}

async fn run_show(settings: &Settings, output: Output, id: Uuid) -> anyhow::Result<()> {
    let store = connect_store(settings).await?;
    let record = store
        .get(id)
        .await?
        .with_context(|| format!("calculation {id} not found"))?;

    output.calculation(&record, true)
}

fn run_simulate(output: Output, input: &Path) -> anyhow::Result<()> {
    let raw = read_input(input)?;
    let request: SimulationRequest = serde_json::from_str(&raw)
        .with_context(|| format!("invalid simulation request in {}", input.display()))?;
    request.validate().context("invalid simulation request")?;

    let result = simulate(&request);
    if output.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", report::SimulationReport(&result));
    }
    Ok(())
}

fn read_input(input: &Path) -> anyhow::Result<String> {
    if input.as_os_str() == "-" {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("read simulation request from stdin failed")?;
        return Ok(raw);
    }
    std::fs::read_to_string(input).with_context(|| format!("read {} failed", input.display()))
}

#[derive(Debug, Clone, Copy)]
struct Output {
    json: bool,
}

#[derive(serde::Serialize)]
struct CalculationJson<'a> {
    calculation: &'a CalculationRecord,
    labels: GeometryLabels,
    saved: bool,
}

impl Output {
    fn calculation(self, record: &CalculationRecord, saved: bool) -> anyhow::Result<()> {
        if self.json {
            let body = CalculationJson {
                calculation: record,
                labels: record.labels(),
                saved,
            };
            println!("{}", serde_json::to_string_pretty(&body)?);
        } else {
            print!("{}", report::CalculationReport { record, saved });
        }
        Ok(())
    }
}

fn build_estimator(settings: &Settings, offline: bool) -> anyhow::Result<Estimator> {
    let estimator = Estimator::new().with_store_timeout(settings.store_timeout());
    if offline {
        return Ok(estimator);
    }
    let pvgis = PvgisClient::from_settings(settings)?;
    Ok(estimator.with_production_provider(Arc::new(pvgis)))
}

async fn connect_store(settings: &Settings) -> anyhow::Result<Arc<dyn CalculationStore>> {
    let db_url = settings.require_database_url()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;

    sunsmart_core::storage::migrate(&pool).await?;

    Ok(Arc::new(PgCalculationStore::new(pool)))
}

/// Coordinates win over `--location`; a bare location is geocoded, falling back to the gazetteer.
async fn resolve_site(settings: &Settings, args: &EstimateArgs) -> anyhow::Result<SiteInput> {
    let (location, latitude, longitude) = match (args.lat, args.lon, args.location.as_deref()) {
        (Some(lat), Some(lon), name) => {
            let name = name
                .map(str::to_string)
                .unwrap_or_else(|| gazetteer::reverse_geocode(lat, lon));
            (name, lat, lon)
        }
        (_, _, Some(name)) => {
            let place = locate(settings, name, args.offline).await?;
            tracing::info!(
                query = name,
                resolved = %place.display_name,
                lat = place.lat,
                lon = place.lon,
                "location resolved"
            );
            (place.display_name, place.lat, place.lon)
        }
        _ => anyhow::bail!("either --lat and --lon or --location is required"),
    };

    Ok(SiteInput {
        location,
        latitude,
        longitude,
        azimuth: args.azimuth,
        tilt: args.tilt,
        monthly_spend: args.monthly_spend,
        includes_battery: args.battery,
    }
    .location_or_unknown())
}

async fn locate(settings: &Settings, name: &str, offline: bool) -> anyhow::Result<Place> {
    if offline {
        return Ok(gazetteer::lookup_location(name));
    }

    let nominatim = NominatimClient::from_settings(settings)?;
    match geocode_or_fallback(&nominatim, name).await {
        GeocodeOutcome::Found(places) => Ok(places
            .into_iter()
            .next()
            .unwrap_or_else(|| gazetteer::lookup_location(name))),
        GeocodeOutcome::Fallback { reason, .. } => {
            tracing::warn!(
                query = name,
                reason = %reason,
                "geocoding failed; using offline gazetteer"
            );
            Ok(gazetteer::lookup_location(name))
        }
    }
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("sunsmart").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn estimate_defaults_to_south_facing_slight_roof() {
        let Command::Estimate(args) =
            parse(&["estimate", "--monthly-spend", "300", "--location", "Tema"]).command
        else {
            panic!("expected estimate");
        };
        assert_eq!(args.azimuth, 180);
        assert_eq!(args.tilt, 15);
        assert!(!args.battery);
        assert!(!args.offline);
    }

    #[test]
    fn negative_longitude_is_accepted() {
        let Command::Estimate(args) =
            parse(&["estimate", "--monthly-spend", "300", "--lat", "5.6", "--lon", "-0.18"]).command
        else {
            panic!("expected estimate");
        };
        assert_eq!(args.lon, Some(-0.18));
    }

    #[test]
    fn json_flag_is_global() {
        let args = parse(&["history", "--limit", "3", "--json"]);
        assert!(args.json);
        assert!(matches!(args.command, Command::History { limit: Some(3) }));
    }

    #[test]
    fn simulate_takes_request_path() {
        let args = parse(&["simulate", "roof.json"]);
        assert!(matches!(args.command, Command::Simulate { input } if input == Path::new("roof.json")));
    }

    #[test]
    fn simulate_rejects_invalid_request_file() {
        let path = std::env::temp_dir().join(format!("sunsmart-sim-{}.json", Uuid::new_v4()));
        std::fs::write(&path, r#"{"facets": [{"capacity_kwp": 2.0, "monthly_kwh": [1, 2, 3]}]}"#)
            .unwrap();

        let err = run_simulate(Output { json: true }, &path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(format!("{err:#}").contains("12 monthly values"));
    }

    #[test]
    fn lat_without_lon_is_rejected() {
        let res = Args::try_parse_from(["sunsmart", "estimate", "--monthly-spend", "300", "--lat", "5.6"]);
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn offline_location_uses_gazetteer() {
        let settings = Settings::default();
        let Command::Estimate(args) =
            parse(&["estimate", "--monthly-spend", "300", "--location", "kumasi", "--offline"]).command
        else {
            panic!("expected estimate");
        };

        let site = resolve_site(&settings, &args).await.unwrap();
        assert_eq!(site.location, "Kumasi");
        assert!((site.latitude - 6.6885).abs() < 1e-9);
    }

    #[tokio::test]
    async fn coordinates_without_name_are_reverse_geocoded() {
        let settings = Settings::default();
        let Command::Estimate(args) =
            parse(&["estimate", "--monthly-spend", "300", "--lat", "5.70", "--lon", "-0.25"]).command
        else {
            panic!("expected estimate");
        };

        let site = resolve_site(&settings, &args).await.unwrap();
        assert_eq!(site.location, "Greater Accra");
    }
}
