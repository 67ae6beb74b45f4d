// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! costscope entry point - runs a synthetic fan-out workload and prints its cost report.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use costscope::config::{self, CostConfig};
use costscope::cost::{
    AsyncProvider, CostContext, CostReport, Costs, DirectProvider, Instrumented, Pending, Surface,
    ThreadProvider, TokioProvider,
};
use costscope::telemetry::{init_logging, CostVerbosity, LogConfig};
use costscope::call;

/// costscope version string.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// costscope - where did the time go?
#[derive(Parser)]
#[command(name = "costscope")]
#[command(author, version, about = "Track the cost of work that fans out across threads", long_about = None)]
struct Cli {
    /// Directory to load configuration from
    #[arg(short, long, env = "COSTSCOPE_CONFIG_DIR")]
    config: Option<PathBuf>,

    /// Log timed calls that reach the trace cost limit
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Log every timed call, with source locations
    #[arg(long)]
    trace: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Subcommands for costscope.
#[derive(Subcommand)]
enum Commands {
    /// Run the synthetic workload inside one scope
    Run(RunArgs),

    /// Show the resolved configuration
    Config,

    /// Show version information
    Version,
}

#[derive(Debug, Clone, clap::Args)]
struct RunArgs {
    /// Number of tasks to fan out
    #[arg(short, long, default_value_t = 8)]
    tasks: usize,

    /// Simulated cost of one lookup (ms)
    #[arg(short, long, default_value_t = 25)]
    work_ms: u64,

    /// Where submitted tasks run
    #[arg(short, long, value_enum, default_value = "threads")]
    executor: Executor,

    /// Make every n-th task fail (0 disables)
    #[arg(long, default_value_t = 0)]
    fail_every: usize,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            tasks: 8,
            work_ms: 25,
            executor: Executor::Threads,
            fail_every: 0,
            format: OutputFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Executor {
    Direct,
    Threads,
    Tokio,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Capability the workload calls through an instrumented wrapper.
trait Catalog {
    fn lookup(&self, sku: u64) -> anyhow::Result<String>;
    fn execute(&self, sql: &str) -> anyhow::Result<usize>;
}

#[derive(Debug, Clone)]
struct SimulatedCatalog {
    work: Duration,
}

impl Catalog for SimulatedCatalog {
    fn lookup(&self, sku: u64) -> anyhow::Result<String> {
        std::thread::sleep(self.work);
        Ok(format!("item-{}", sku))
    }

    fn execute(&self, sql: &str) -> anyhow::Result<usize> {
        std::thread::sleep(self.work / 2);
        Ok(sql.len())
    }
}

impl<C: Catalog> Catalog for Instrumented<C> {
    fn lookup(&self, sku: u64) -> anyhow::Result<String> {
        self.invoke(call!(lookup(u64)), |c| c.lookup(sku))
    }

    fn execute(&self, sql: &str) -> anyhow::Result<usize> {
        self.invoke(call!(execute(&str)).with_text(sql), |c| c.execute(sql))
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::new(CostVerbosity::from_flags(cli.verbose, cli.trace));
    let _guard = init_logging(&log_config)?;

    let config_dir = match cli.config {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Some(Commands::Config) => {
            let config = config::load_config(&config_dir)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Some(Commands::Version) => {
            println!("costscope {}", VERSION);
        }
        Some(Commands::Run(args)) => run(&config::load_config(&config_dir)?, &args)?,
        None => run(&config::load_config(&config_dir)?, &RunArgs::default())?,
    }

    Ok(())
}

fn run(config: &CostConfig, args: &RunArgs) -> anyhow::Result<()> {
    let costs = Costs::new(config.clone());
    let catalog = SimulatedCatalog {
        work: Duration::from_millis(args.work_ms),
    };

    let report = match args.executor {
        Executor::Direct => fan_out(&costs, &DirectProvider, &catalog, args),
        Executor::Threads => fan_out(&costs, &ThreadProvider::default(), &catalog, args),
        Executor::Tokio => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            fan_out(
                &costs,
                &TokioProvider::new(runtime.handle().clone()),
                &catalog,
                args,
            )
        }
    };

    match args.format {
        OutputFormat::Text => print_report(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

fn fan_out<P: AsyncProvider>(
    costs: &Costs,
    provider: &P,
    catalog: &SimulatedCatalog,
    args: &RunArgs,
) -> CostReport {
    costs.scope(|ctx| {
        ctx.note("fan-out started");

        let pending: Vec<Pending<String>> = (0..args.tasks)
            .map(|i| submit_lookup(ctx, provider, catalog.clone(), i, args.fail_every))
            .collect();

        match ctx.resolve_all(pending) {
            Ok(items) => tracing::info!(count = items.len(), "All lookups finished"),
            Err(err) => {
                tracing::warn!(error = %err, "Some lookups failed");
                for failure in err.failures() {
                    eprintln!("{} {}", "failed:".red(), failure);
                }
            }
        }
    })
}

fn submit_lookup<P: AsyncProvider>(
    ctx: &CostContext,
    provider: &P,
    catalog: SimulatedCatalog,
    index: usize,
    fail_every: usize,
) -> Pending<String> {
    ctx.submit(provider, move |worker| {
        let catalog = worker.instrument("catalog", Surface::of::<dyn Catalog>(), catalog);
        let item = catalog.lookup(index as u64)?;
        catalog.execute("UPDATE inventory SET reserved = reserved + 1 WHERE sku = ?")?;

        if fail_every > 0 && (index + 1) % fail_every == 0 {
            anyhow::bail!("lookup {} rejected", index);
        }
        Ok(item)
    })
}

fn print_report(report: &CostReport) {
    println!("{}", "Cost report".bold());
    if let Some(id) = &report.activity_id {
        println!("  {} {}", "activity:".dimmed(), id);
    }
    println!(
        "  {} {}ms wall, {}ms accumulated",
        "elapsed:".dimmed(),
        report.cost.to_string().cyan(),
        report.accumulated()
    );

    if report.details.is_empty() {
        println!("  {}", "(cost tracking disabled)".yellow());
        return;
    }

    println!();
    for detail in &report.details {
        println!(
            "  {:<48} {:>5} calls  avg {:>8.1}ms  max {:>6}ms",
            detail.description.green(),
            detail.count,
            detail.mean(),
            detail.max
        );
    }
}
