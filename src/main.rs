use anyhow::Context;
use chartcore::change::format_percent_change;
use chartcore::config::{self, Settings};
use chartcore::format::{
    format_compact_with, format_cycle_date, format_position, format_weeks, group_digits,
};
use chartcore::model::ChartId;
use chartcore::pipeline::{WeeklyReport, report_from_history};
use chartcore::snapshot::{self, CatalogSnapshot, PriorCharts};
use chartcore::social::{LiveListenerTicker, platform_reach};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct CliArgs {
    snapshot: Option<PathBuf>,
    history: Option<PathBuf>,
    prior: Option<PathBuf>,
    save_prior: Option<PathBuf>,
    chart: Option<ChartId>,
    json: bool,
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = parse_args(std::env::args().skip(1).collect())?;
    let settings = config::load_settings()?;
    let report = build_report(&args, &settings)?;

    if let Some(path) = &args.save_prior {
        snapshot::save_prior(path, &report.prior_for_next_cycle())?;
    }

    if args.json {
        println!("{}", report.to_json()?);
        return Ok(());
    }
    print_report(&report, args.chart, &settings);
    Ok(())
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_env("CHARTCORE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_report(args: &CliArgs, settings: &Settings) -> anyhow::Result<WeeklyReport> {
    if let Some(path) = &args.snapshot {
        let catalog = CatalogSnapshot::load(path)?;
        let prior = match &args.prior {
            Some(prior_path) => snapshot::load_prior(prior_path)?,
            None => PriorCharts::default(),
        };
        return Ok(WeeklyReport::build(&catalog, &prior)?);
    }

    let dir = args
        .history
        .clone()
        .or_else(|| settings.history_dir.clone())
        .context("pass --snapshot <file> or --history <dir>")?;
    let history = snapshot::load_history(&dir)?;
    report_from_history(&history)?
        .with_context(|| format!("no snapshots found in {}", dir.display()))
}

fn parse_args(args: Vec<String>) -> anyhow::Result<CliArgs> {
    let mut out = CliArgs::default();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--snapshot" => out.snapshot = Some(path_value(&args, &mut index, "--snapshot")?),
            "--history" => out.history = Some(path_value(&args, &mut index, "--history")?),
            "--prior" => out.prior = Some(path_value(&args, &mut index, "--prior")?),
            "--save-prior" => {
                out.save_prior = Some(path_value(&args, &mut index, "--save-prior")?)
            }
            "--chart" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    anyhow::bail!("--chart requires a chart key");
                };
                let Some(chart) = ChartId::from_key(value.trim()) else {
                    anyhow::bail!(
                        "unknown chart {value}; expected hot100, billboard200 or bubblingUnderHot50"
                    );
                };
                out.chart = Some(chart);
            }
            "--json" => out.json = true,
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other => anyhow::bail!("unknown argument {other}"),
        }
        index += 1;
    }
    if out.snapshot.is_some() && out.history.is_some() {
        anyhow::bail!("--snapshot and --history cannot be combined");
    }
    Ok(out)
}

fn path_value(args: &[String], index: &mut usize, flag: &str) -> anyhow::Result<PathBuf> {
    *index += 1;
    let Some(value) = args.get(*index) else {
        anyhow::bail!("{flag} requires a path");
    };
    if value.trim().is_empty() {
        anyhow::bail!("{flag} cannot be empty");
    }
    Ok(PathBuf::from(value.trim()))
}

fn print_report(report: &WeeklyReport, only: Option<ChartId>, settings: &Settings) {
    let compact = |value: u64| format_compact_with(Some(value), settings.compact_threshold);

    println!(
        "{}  |  {}",
        report.artist_name,
        format_cycle_date(report.cycle_date)
    );

    let charts = match only {
        Some(chart) => vec![chart],
        None => ChartId::ALL.to_vec(),
    };
    for chart in charts {
        println!();
        println!("{}", chart.label());
        let entries = report.chart(chart);
        if entries.is_empty() {
            println!("  no entries this week");
            continue;
        }
        for entry in entries.iter().take(settings.listing_limit) {
            println!(
                "  {:>4} {:>3}  {} - {}  (peak {}, {})",
                format_position(entry.position),
                entry.status.marker(),
                entry.title,
                entry.artist,
                format_position(entry.peak_position),
                format_weeks(entry.weeks_on_chart)
            );
        }
    }

    let rollup = &report.rollup;
    println!();
    println!(
        "Career: {} charted  |  {} #1s  |  {} top 10s  |  longest run {}",
        rollup.total_charted_items,
        rollup.number_one_count,
        rollup.top10_count,
        format_weeks(rollup.longest_chart_run)
    );
    println!(
        "This week {}  |  lifetime {}",
        compact(rollup.career_weekly_total),
        compact(rollup.career_lifetime_total)
    );

    let movers = report.top_movers(settings.movers_limit);
    if !movers.is_empty() {
        println!();
        println!("Top movers");
        for mover in movers {
            println!(
                "  {:<7} {} [{}]  {} {}  {}",
                mover.trend.label(),
                mover.title,
                mover.kind.label(),
                compact(mover.weekly_metric),
                mover.kind.metric_label(),
                format_percent_change(mover.change)
            );
        }
    }

    println!();
    println!("Reach");
    for row in platform_reach(rollup.career_lifetime_total) {
        println!(
            "  {:<14} {} followers, {} per post",
            row.platform.label(),
            compact(row.followers),
            compact(row.engagement)
        );
    }

    let mut ticker = match settings.live_listener_seed {
        Some(seed) => LiveListenerTicker::with_seed(seed),
        None => LiveListenerTicker::new(),
    };
    println!();
    println!("Listening now: {}", group_digits(u64::from(ticker.next_count())));
}

fn print_help() {
    println!("chartcore");
    println!("  --snapshot file      Weekly catalog snapshot (JSON)");
    println!("  --history dir        Directory of weekly snapshots, replayed in order");
    println!("  --prior file         Previous week's chart positions");
    println!("  --save-prior file    Write this week's positions for the next run");
    println!("  --chart key          Only print hot100, billboard200 or bubblingUnderHot50");
    println!("  --json               Print the full report as JSON");
}
