use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use request_dashboard::options::FilterOptions;
use request_dashboard::{
    export, report, AggregateSettings, Config, Criteria, Dashboard, DatasetCache, Granularity,
};

#[derive(Parser)]
#[command(name = "request-dashboard")]
#[command(about = "Filter and summarise customer service requests", long_about = None)]
struct Cli {
    /// TOML config file (defaults to ./dashboard.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Dataset path, overriding config and DASHBOARD_DATA
    #[arg(long, global = true)]
    data: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// First day to include (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Last day to include (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,
    #[arg(long = "department")]
    departments: Vec<String>,
    #[arg(long = "status")]
    statuses: Vec<String>,
    #[arg(long = "type")]
    types: Vec<String>,
    #[arg(long = "community")]
    communities: Vec<String>,
}

impl FilterArgs {
    fn criteria(&self) -> Criteria {
        let mut criteria = Criteria::new()
            .with_departments(self.departments.iter().cloned())
            .with_statuses(self.statuses.iter().cloned())
            .with_types(self.types.iter().cloned())
            .with_communities(self.communities.iter().cloned());
        criteria.date_from = self.from;
        criteria.date_to = self.to;
        criteria
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print key metrics and top breakdowns
    Summary {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long)]
        granularity: Option<Granularity>,
    },
    /// List the values available to each filter
    Options,
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long)]
        granularity: Option<Granularity>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Write aggregate tables as CSV and the map payload as JSON
    Export {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long)]
        granularity: Option<Granularity>,
        #[arg(long, default_value = "dashboard-export")]
        out_dir: PathBuf,
    },
}

fn init_logging(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::resolve(cli.config.as_deref()).context("failed to load config")?;
    if let Some(data) = cli.data {
        config.data_path = data;
    }
    init_logging(&config.log_level);

    let mut cache = DatasetCache::new();
    let table = cache
        .get_or_load(&config.data_path)
        .with_context(|| format!("failed to load {}", config.data_path.display()))?;
    let mut dashboard = Dashboard::new(table, AggregateSettings::from(&config));

    match cli.command {
        Commands::Summary {
            filters,
            granularity,
        } => {
            let criteria = filters.criteria();
            let view = dashboard.view(&criteria, granularity.unwrap_or(config.granularity));
            let kpis = &view.kpis;

            println!("Filtered records: {} / {}", kpis.total, view.loaded_rows);
            if kpis.total == 0 {
                println!("No requests match these filters.");
                return Ok(());
            }

            println!(
                "Closed: {} ({:.1}%)  Open/other: {} ({:.1}%)",
                kpis.closed_count, kpis.closed_pct, kpis.open_count, kpis.open_pct
            );
            println!(
                "Request types: {}  Departments: {}",
                kpis.distinct_types, kpis.distinct_departments
            );

            println!("Requests over time ({}):", view.granularity);
            for bucket in &view.time_series {
                println!("- {}: {}", bucket.start, bucket.count);
            }
            println!("Top departments:");
            for department in &view.departments {
                println!(
                    "- {}: {} ({:.1}%)",
                    department.label, department.count, department.pct
                );
            }
            println!("Status distribution:");
            for status in &view.statuses {
                println!("- {}: {} ({:.1}%)", status.label, status.count, status.pct);
            }
            println!("Top request types:");
            for request_type in &view.types {
                println!("- {}: {}", request_type.label, request_type.count);
            }
            println!("Top communities:");
            for community in &view.communities {
                println!("- {}: {}", community.label, community.count);
            }
        }
        Commands::Options => {
            let options = FilterOptions::from_table(dashboard.table());
            if let (Some(min), Some(max)) = (options.min_date, options.max_date) {
                println!("Dates: {min} to {max}");
            }
            print_list("Departments", &options.departments);
            print_list("Statuses", &options.statuses);
            print_list("Request types", &options.types);
            print_list("Communities", &options.communities);
        }
        Commands::Report {
            filters,
            granularity,
            out,
        } => {
            let criteria = filters.criteria();
            let view = dashboard.view(&criteria, granularity.unwrap_or(config.granularity));
            let report = report::build_report(&criteria, view);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export {
            filters,
            granularity,
            out_dir,
        } => {
            let criteria = filters.criteria();
            let view = dashboard.view(&criteria, granularity.unwrap_or(config.granularity));
            let written = export::export_view(view, &out_dir)?;
            println!("Wrote {} files to {}.", written.len(), out_dir.display());
        }
    }

    Ok(())
}

fn print_list(title: &str, values: &[String]) {
    println!("{title} ({}):", values.len());
    for value in values {
        println!("- {value}");
    }
}
