//! lanham CLI

mod config;
mod run;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use config::{read_config, AnalysisConfig, CiKind};
use lh_data::{generate, write_table, SimulationConfig};
use lh_inference::{run_specification, DididFormula, RegressionSpec, SampleFilter};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "lanham")]
#[command(about = "lanham - Triple-difference analysis of wartime childcare spending")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline: prepare, four regressions, comparison table, plots
    Run {
        /// Analysis config (YAML, or JSON by extension)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Survey extract (.csv or .parquet). Overrides `input`.
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory. Overrides `out_dir`.
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Worker threads for the fits. Overrides `regression.threads`.
        #[arg(long)]
        threads: Option<usize>,

        /// Allow writing into a non-empty output directory.
        #[arg(long)]
        overwrite: bool,
    },

    /// Fit a single specification and print the fitted model as JSON
    Fit {
        /// Survey extract (.csv or .parquet)
        #[arg(short, long)]
        input: PathBuf,

        /// Analysis config for column names and estimation settings
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Dependent variable (a source column or `part_time`)
        #[arg(long)]
        outcome: String,

        /// Estimation sample
        #[arg(long, value_enum, default_value = "all")]
        sample: SampleArg,

        /// Print the text summary instead of JSON.
        #[arg(long)]
        summary: bool,

        /// Output file (pretty JSON or text). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the point-plot artifacts and SVGs only
    Viz {
        /// Survey extract (.csv or .parquet)
        #[arg(short, long)]
        input: PathBuf,

        /// Analysis config for column names and plot settings
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory
        #[arg(long)]
        out_dir: PathBuf,

        /// Interval method. Overrides `viz.ci`.
        #[arg(long, value_enum)]
        ci: Option<CiKind>,

        /// Bootstrap resamples. Overrides `viz.n_boot`.
        #[arg(long)]
        n_boot: Option<usize>,

        /// Bootstrap seed. Overrides `viz.seed`.
        #[arg(long)]
        seed: Option<u64>,

        /// Renderer theme (whitegrid, ticks, paper). Overrides `viz.theme`.
        #[arg(long)]
        theme: Option<String>,
    },

    /// Write a synthetic survey extract with a known triple-difference effect
    Simulate {
        /// Output file (.csv or .parquet)
        #[arg(short, long)]
        output: PathBuf,

        #[arg(long, default_value = "42")]
        seed: u64,

        /// Respondents per state x treated x post cell
        #[arg(long, default_value = "250")]
        n_per_cell: usize,

        /// True triple-interaction coefficient on weekly hours
        #[arg(long, default_value = "2.0")]
        effect: f64,

        #[arg(long, default_value = "8")]
        n_states: usize,
    },

    /// Print version information
    Version,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SampleArg {
    All,
    Employed,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run { config, input, out_dir, threads, overwrite } => {
            cmd_run(config.as_deref(), input, out_dir, threads, overwrite)
        }
        Commands::Fit { input, config, outcome, sample, summary, output } => {
            cmd_fit(&input, config.as_deref(), &outcome, sample, summary, output.as_ref())
        }
        Commands::Viz { input, config, out_dir, ci, n_boot, seed, theme } => {
            cmd_viz(&input, config.as_deref(), &out_dir, ci, n_boot, seed, theme)
        }
        Commands::Simulate { output, seed, n_per_cell, effect, n_states } => {
            let sim = SimulationConfig { seed, n_per_cell, effect, n_states, ..SimulationConfig::default() };
            cmd_simulate(&output, &sim)
        }
        Commands::Version => {
            println!("lanham {}", VERSION);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(p) => read_config(p),
        None => Ok(AnalysisConfig::default()),
    }
}

fn cmd_run(
    config: Option<&Path>,
    input: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    threads: Option<usize>,
    overwrite: bool,
) -> Result<()> {
    let mut cfg = load_config(config)?;
    if let Some(input) = input {
        cfg.input = Some(input);
    }
    if let Some(out_dir) = out_dir {
        cfg.out_dir = out_dir;
    }
    if let Some(threads) = threads {
        cfg.regression.threads = threads;
    }
    cfg.overwrite |= overwrite;

    let out = run::run(&cfg)?;
    for path in &out.written {
        tracing::debug!(path = %path.display(), "artifact");
    }
    print!("{}", out.comparison_text);
    Ok(())
}

fn cmd_fit(
    input: &Path,
    config: Option<&Path>,
    outcome: &str,
    sample: SampleArg,
    summary: bool,
    output: Option<&PathBuf>,
) -> Result<()> {
    let cfg = load_config(config)?;
    let prepared = run::load_prepared(input, &cfg)?;
    let columns = &cfg.prepare.columns;
    let sample = match sample {
        SampleArg::All => SampleFilter::All,
        SampleArg::Employed => SampleFilter::Equals { column: columns.employed.clone(), value: 1.0 },
    };
    let spec = RegressionSpec {
        label: "(1)".to_string(),
        outcome: outcome.to_string(),
        sample,
        formula: DididFormula::new(columns),
    };
    let model = run_specification(&prepared.table, &spec, &cfg.regression.fit_options())?;
    tracing::info!(outcome = %model.outcome, n_obs = model.n_obs, "fit complete");

    if summary {
        let text = lh_viz::regression_summary(&model, cfg.regression.precision);
        match output {
            Some(path) => std::fs::write(path, text)
                .with_context(|| format!("writing {}", path.display()))?,
            None => print!("{}", text),
        }
        return Ok(());
    }
    write_json(output, serde_json::to_value(&model)?)
}

fn cmd_viz(
    input: &Path,
    config: Option<&Path>,
    out_dir: &Path,
    ci: Option<CiKind>,
    n_boot: Option<usize>,
    seed: Option<u64>,
    theme: Option<String>,
) -> Result<()> {
    let mut cfg = load_config(config)?;
    if let Some(ci) = ci {
        cfg.viz.ci = ci;
    }
    if let Some(n_boot) = n_boot {
        cfg.viz.n_boot = n_boot;
    }
    if let Some(seed) = seed {
        cfg.viz.seed = seed;
    }
    if let Some(theme) = theme {
        cfg.viz.theme = theme;
    }

    let mut prepared = run::load_prepared(input, &cfg)?;
    lh_data::add_plot_features(&mut prepared, &cfg.prepare)
        .context("cannot form spending quartiles for the plots")?;
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;
    let written = run::write_point_plots(&prepared, &cfg, out_dir)?;
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}

fn cmd_simulate(output: &Path, sim: &SimulationConfig) -> Result<()> {
    let table = generate(sim, &lh_data::ColumnMap::default())?;
    write_table(&table, output).with_context(|| format!("writing {}", output.display()))?;
    tracing::info!(path = %output.display(), rows = table.n_rows(), "synthetic extract written");
    Ok(())
}

fn write_json(output: Option<&PathBuf>, value: serde_json::Value) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(&value)?)?;
    } else {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}
