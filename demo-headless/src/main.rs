mod scenario;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use fire_risk_core::analytics::{most_common_cause, temporal_histogram, top_neighborhoods};
use fire_risk_core::impact::assess;
use fire_risk_core::{
    create_risk_model, nearest_station, project, score, summarize, EngineConfig, GeoPoint,
    ImpactReport, ResponseUrgency, RiskModelCache, RiskStrategy, RiskSurface, SpatialRiskModel,
};
use scenario::Scenario;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Strategy {
    /// k-means hot-zones
    Epicenters,
    /// Random-forest probability lattice
    Grid,
}

impl From<Strategy> for RiskStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Epicenters => RiskStrategy::Epicenters,
            Strategy::Grid => RiskStrategy::GridProbability,
        }
    }
}

/// Wildfire decision-support demo with configurable parameters
#[derive(Parser, Debug)]
#[command(name = "fire-risk-demo")]
#[command(about = "Municipal wildfire risk, spread and response demo", long_about = None)]
struct Args {
    /// Temperature in °C
    #[arg(short, long, default_value_t = 34.0, allow_hyphen_values = true)]
    temperature: f64,

    /// Relative humidity in %
    #[arg(long, default_value_t = 15.0)]
    humidity: f64,

    /// Wind speed in km/h
    #[arg(short, long, default_value_t = 25.0)]
    wind_speed: f64,

    /// Wind direction in degrees (0=North, 90=East)
    #[arg(long, default_value_t = 90.0)]
    wind_direction: f64,

    /// Ignition latitude
    #[arg(long, default_value_t = 31.7389, allow_hyphen_values = true)]
    lat: f64,

    /// Ignition longitude
    #[arg(long, default_value_t = -106.4856, allow_hyphen_values = true)]
    lon: f64,

    /// Projection horizon in hours
    #[arg(short, long, default_value_t = 1.0)]
    duration: f64,

    /// Number of risk epicenters
    #[arg(short, long, default_value_t = 5)]
    clusters: usize,

    /// Spatial risk strategy
    #[arg(short, long, value_enum, default_value_t = Strategy::Epicenters)]
    strategy: Strategy,

    /// Seed for synthetic data and model training
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Scenario JSON with `incidents` and `assets` (synthetic if omitted)
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Engine configuration JSON (defaults if omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use the fast configuration preset
    #[arg(short, long)]
    fast: bool,

    /// Synthetic incident count
    #[arg(long, default_value_t = 400)]
    incidents: usize,

    /// Active satellite thermal anomalies
    #[arg(long, default_value_t = 0)]
    anomalies: usize,

    /// Routed response time in minutes from an external router
    #[arg(long)]
    route_minutes: Option<f64>,

    /// Query date for the grid strategy (defaults to the latest incident)
    #[arg(long)]
    date: Option<NaiveDate>,
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None if args.fast => EngineConfig::fast(),
        None => EngineConfig::default(),
    };

    config.cluster.k = args.clusters;
    config.cluster.seed = args.seed;
    config.classifier.seed = args.seed;
    config.spread.duration_hours = args.duration;
    config.validate().context("invalid engine configuration")?;
    Ok(config)
}

fn print_surface(surface: &RiskSurface) {
    match surface {
        RiskSurface::Epicenters(epicenters) => {
            println!("ID | Latitude  | Longitude   | Incidents | Severity");
            println!("---|-----------|-------------|-----------|---------");
            for e in epicenters {
                println!(
                    "{:2} | {:9.5} | {:11.5} | {:9} | {:?}",
                    e.id, e.lat, e.lon, e.member_count, e.severity
                );
            }
        }
        RiskSurface::Grid(grid) => {
            println!(
                "Lattice: {0}x{0} for {1}, held-out accuracy {2:.1}% ({3} train / {4} test)",
                grid.resolution,
                grid.query_date,
                grid.accuracy * 100.0,
                grid.train_size,
                grid.test_size
            );
            println!(
                "High-risk cells (p > {:.2}): {}",
                grid.threshold,
                grid.high_risk_cells().count()
            );
            if let Some(peak) = grid.peak() {
                println!(
                    "Peak cell: ({:.5}, {:.5}) p = {:.2}",
                    peak.lat, peak.lon, peak.probability
                );
            }
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    info!(
        strategy = ?args.strategy,
        fast = args.fast,
        k = config.cluster.k,
        "demo configuration loaded"
    );

    println!("=== Fire Risk Demo ===\n");

    let ignition = GeoPoint::new(args.lat, args.lon);
    let scenario = match &args.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::synthetic(ignition, args.incidents, args.seed)?,
    };
    info!(
        incidents = scenario.incidents.len(),
        assets = scenario.assets.len(),
        "scenario ready"
    );
    println!(
        "Scenario: {} incidents, {} assets ({})",
        scenario.incidents.len(),
        scenario.assets.len(),
        args.scenario
            .as_ref()
            .map_or_else(|| format!("synthetic, seed {}", args.seed), |p| p.display().to_string())
    );

    // Weather danger
    let danger = score(args.temperature, args.humidity, args.wind_speed)
        .context("scoring fire weather")?;
    println!(
        "Weather: {:.1}°C, {:.0}% RH, {:.1} km/h from {:.0}°",
        args.temperature, args.humidity, args.wind_speed, args.wind_direction
    );
    println!("Fire weather index: {:.1} ({})\n", danger.value, danger.category);

    // Spatial risk
    let query_date = args
        .date
        .or_else(|| scenario.latest_date())
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let cache = RiskModelCache::new(&config.cache)?;
    let model = create_risk_model(args.strategy.into(), &config, query_date);
    println!("Spatial risk ({})", model.name());
    let surface = cache
        .get_or_train(model.as_ref(), &scenario.incidents)
        .context("training spatial risk model")?;
    print_surface(&surface);

    // Spread and impact
    let perimeter = project(
        args.lat,
        args.lon,
        args.wind_direction,
        args.wind_speed,
        &config.spread,
    )
    .context("projecting spread perimeter")?;
    let head = perimeter.head_point();
    println!(
        "\nProjected perimeter after {:.1} h: {:.2} x {:.2} km, {:.2} km², head at ({:.5}, {:.5})",
        perimeter.duration_hours,
        perimeter.major_axis_km,
        perimeter.minor_axis_km,
        perimeter.area_km2(),
        head.lat,
        head.lon
    );

    let polygon = perimeter.polygon();
    let report = ImpactReport::from_findings(&assess(&polygon, &scenario.assets));
    println!("Impacted assets: {}", report.total());
    for entry in &report.entries {
        println!("  [{}] {} (#{})", entry.category, entry.name, entry.asset_id);
    }

    // Dispatch
    match nearest_station(args.lat, args.lon, &scenario.assets) {
        Ok(assignment) => {
            println!(
                "\nDispatch: {} (#{}) at ~{:.2} km",
                assignment.station.name,
                assignment.station.id,
                assignment.approx_distance_km()
            );
            if let Some(minutes) = args.route_minutes {
                let urgency = ResponseUrgency::from_route_minutes(minutes)?;
                println!("Route: {minutes:.0} min → {urgency}");
            }
        }
        Err(err) => {
            warn!(error = %err, "no responder could be assigned");
            println!("\nDispatch unavailable: {err}");
        }
    }

    // History analytics
    let histogram = temporal_histogram(&scenario.incidents);
    if let Some((day, hour)) = histogram.peak() {
        println!(
            "\nPeak activity: {} {:02}:00 ({} incidents)",
            WEEKDAYS[day],
            hour,
            histogram.get(day, hour)
        );
    }
    for n in top_neighborhoods(&scenario.incidents, 3) {
        println!("  {:<20} {:5}", n.label, n.count);
    }
    if let Some(cause) = most_common_cause(&scenario.incidents) {
        println!("Most common cause: {cause}");
    }

    // Briefing
    let summary = summarize(
        Some(&danger),
        args.anomalies,
        surface.epicenters().unwrap_or_default(),
    );
    println!("\n=== Status: {} ===", summary.status);
    if let Some(e) = &summary.dominant_epicenter {
        println!(
            "Dominant epicenter #{} at ({:.5}, {:.5}) with {} incidents",
            e.id, e.lat, e.lon, e.member_count
        );
    }
    println!("Satellite anomalies: {}", summary.satellite_anomalies);

    Ok(())
}
