use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use advisor_metrics::{
    build_report, get_primary_clients, load_snapshot, open_database, setup_database,
    PlanningCalculator, SchemaValidator, Settings, WhatIf,
};

#[derive(Debug, Parser)]
#[command(name = "advisor-metrics")]
#[command(about = "Household financial health metrics for advisors", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create the schema in the configured database
    Init,

    /// List primary clients
    Clients,

    /// Compute the household report for one client and print it as JSON
    Report {
        /// Client id
        #[arg(long)]
        client: String,

        /// As-of date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        as_of: Option<String>,

        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },

    /// Re-run the retirement projection with adjusted assumptions
    WhatIf {
        /// Client id
        #[arg(long)]
        client: String,

        /// As-of date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        as_of: Option<String>,

        /// Income change in percent, e.g. -10
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        income_change: f64,

        /// Spending change in percent
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        expense_change: f64,

        /// Change to the assumed annual return, e.g. -0.01
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        return_change: f64,

        /// Years added to the retirement age
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        retirement_age_change: i32,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => run_init(&settings),
        Commands::Clients => run_clients(&settings),
        Commands::Report {
            client,
            as_of,
            compact,
        } => run_report(&settings, &client, as_of.as_deref(), compact),
        Commands::WhatIf {
            client,
            as_of,
            income_change,
            expense_change,
            return_change,
            retirement_age_change,
        } => {
            let scenario = WhatIf {
                income_change_pct: income_change,
                expense_change_pct: expense_change,
                return_change,
                retirement_age_change,
            };
            run_what_if(&settings, &client, as_of.as_deref(), &scenario)
        }
    }
}

fn run_init(settings: &Settings) -> Result<()> {
    let conn = open_database(&settings.database_path)?;
    setup_database(&conn)?;
    println!("✓ Database initialized at {}", settings.database_path.display());
    Ok(())
}

fn run_clients(settings: &Settings) -> Result<()> {
    let conn = open_database(&settings.database_path)?;
    let clients = get_primary_clients(&conn)?;

    if clients.is_empty() {
        println!("No clients found");
        return Ok(());
    }
    for client in clients {
        println!(
            "{}  {}  (born {}, retires at {}, {} risk)",
            client.id, client.name, client.date_of_birth, client.retirement_age, client.risk_tolerance
        );
    }
    Ok(())
}

fn run_report(settings: &Settings, client_id: &str, as_of: Option<&str>, compact: bool) -> Result<()> {
    let as_of = resolve_as_of_date(as_of)?;
    let conn = open_database(&settings.database_path)?;
    let snapshot = load_snapshot(&conn, client_id, as_of)?;

    let report = match build_report(&snapshot, &settings.thresholds) {
        Ok(report) => report,
        Err(violations) => {
            for violation in &violations {
                eprintln!("❌ {}", violation);
            }
            bail!("snapshot for {} failed validation ({} violations)", client_id, violations.len());
        }
    };

    let json = report
        .to_json(!compact)
        .context("failed to serialise report")?;
    println!("{}", json);
    Ok(())
}

fn run_what_if(settings: &Settings, client_id: &str, as_of: Option<&str>, scenario: &WhatIf) -> Result<()> {
    let as_of = resolve_as_of_date(as_of)?;
    let conn = open_database(&settings.database_path)?;
    let snapshot = load_snapshot(&conn, client_id, as_of)?;

    if let Err(violations) = SchemaValidator::new().validate(&snapshot) {
        for violation in &violations {
            eprintln!("❌ {}", violation);
        }
        bail!("snapshot for {} failed validation ({} violations)", client_id, violations.len());
    }

    let result = PlanningCalculator::new(&settings.thresholds).what_if(&snapshot, scenario);
    println!("📊 {}", result.label);
    println!(
        "{}",
        serde_json::to_string_pretty(&result).context("failed to serialise what-if result")?
    );
    Ok(())
}

fn resolve_as_of_date(raw: Option<&str>) -> Result<NaiveDate> {
    match raw {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("--as-of must be YYYY-MM-DD, got {}", raw)),
        None => Ok(chrono::Local::now().date_naive()),
    }
}
