//! small_town: a 29-person town for the rust_abm epidemic engine.
//!
//! Six households, a workplace, a school, a hospital with two staff and one
//! inpatient, a bus line, two leisure venues and a retirement home.  One
//! resident arrives exposed; testing, contact tracing and a vaccination
//! campaign run alongside the outbreak.
//!
//! ```text
//! cargo run -p small_town -- --days 120 --output output/small_town
//! ```

mod town;

use std::io::Cursor;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;

use abm_core::{Category, Tick};
use abm_output::{CsvWriter, OutputWriter, SimOutputObserver};
use abm_population::{AgentStore, load_agents_reader, load_places_reader};
use abm_sim::{RunReport, SimBuilder, SimObserver, SimParams, StepSnapshot};
use abm_states::StatesManager;

const LOG_PATTERN: &str = "{d(%H:%M:%S%.3f)} {h({l:5})} {t} - {m}{n}";

#[derive(Parser, Debug)]
#[command(name = "small_town")]
#[command(about = "Run a small-town outbreak with testing, tracing and vaccination")]
struct Args {
    /// Random seed; defaults to the one in the parameter set.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Simulated days; defaults to the parameter set's length.
    #[arg(short, long)]
    days: Option<u64>,

    /// Parameter file to use instead of the built-in one.
    #[arg(short, long)]
    params: Option<PathBuf>,

    /// Directory for CSV output; nothing is written when absent.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

fn init_logging(level: LevelFilter) -> Result<()> {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build();
    let config = log4rs::Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))?;
    log4rs::init_config(config)?;
    Ok(())
}

// ── Observer ──────────────────────────────────────────────────────────────────

/// Logs a weekly line and tracks the epidemic peak, forwarding everything to
/// the output observer when one is configured.
struct Progress<W: OutputWriter> {
    output:    Option<SimOutputObserver<W>>,
    peak:      (Tick, u32),
    confirmed: u32,
}

impl<W: OutputWriter> Progress<W> {
    fn new(output: Option<SimOutputObserver<W>>) -> Self {
        Self { output, peak: (Tick::ZERO, 0), confirmed: 0 }
    }
}

impl<W: OutputWriter> SimObserver for Progress<W> {
    fn on_step_end(&mut self, snapshot: &StepSnapshot, states: &StatesManager) {
        let infectious: u32 = ["asymptomatic", "symptomatic", "hospitalized"]
            .iter()
            .map(|s| snapshot.count(Category::Health, states, s))
            .sum();
        if infectious > self.peak.1 {
            self.peak = (snapshot.tick, infectious);
        }
        self.confirmed += snapshot.new_confirmed;
        if snapshot.tick.0 % 7 == 0 {
            log::info!(
                "day {:>3}: {:>2} infectious, {:>2} ever infected, {:>2} confirmed, {:>2} vaccinated, {:>2} in quarantine",
                snapshot.day,
                infectious,
                snapshot.cumulative_infections,
                self.confirmed,
                snapshot.count(Category::Vaccination, states, "vaccinated")
                    + snapshot.count(Category::Vaccination, states, "boosted"),
                snapshot.count(Category::Role, states, "quarantined")
                    + snapshot.count(Category::Role, states, "on_leave"),
            );
        }
        if let Some(out) = &mut self.output {
            out.on_step_end(snapshot, states);
        }
    }

    fn on_snapshot(&mut self, tick: Tick, states: &StatesManager, agents: &AgentStore) {
        if let Some(out) = &mut self.output {
            out.on_snapshot(tick, states, agents);
        }
    }

    fn on_sim_end(&mut self, final_tick: Tick, report: &RunReport) {
        if let Some(out) = &mut self.output {
            out.on_sim_end(final_tick, report);
        }
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn load_params(args: &Args) -> Result<SimParams> {
    let mut params = match &args.params {
        Some(path) => SimParams::load_json(path)
            .with_context(|| format!("loading parameters from {}", path.display()))?,
        None => SimParams::from_json_str(town::PARAMS_JSON).context("built-in parameters")?,
    };
    if let Some(seed) = args.seed {
        params.simulation.seed = seed;
    }
    if let Some(days) = args.days {
        params.simulation.total_ticks = (days as f64 / params.simulation.step_days).round() as u64;
    }
    Ok(params)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level)?;

    let params = load_params(&args)?;
    let places = load_places_reader(Cursor::new(town::PLACES_CSV))?;
    let agents = load_agents_reader(Cursor::new(town::AGENTS_CSV))?;
    log::info!(
        "small_town: {} agents, {} places, {} days, seed {}",
        agents.len(),
        places.len(),
        params.simulation.total_ticks as f64 * params.simulation.step_days,
        params.simulation.seed
    );

    let mut sim = SimBuilder::new(params).places(places).agents(agents).build()?;

    let output = match &args.output {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?;
            Some(SimOutputObserver::new(CsvWriter::new(dir)?))
        }
        None => None,
    };
    let mut progress = Progress::new(output);

    let t0 = Instant::now();
    let report = sim.run(&mut progress)?;
    let elapsed = t0.elapsed();

    if let Some(e) = progress.output.as_mut().and_then(|o| o.take_error()) {
        log::error!("output incomplete: {e}");
    }

    let (peak_tick, peak) = progress.peak;
    println!();
    println!("Finished in {:.3} s", elapsed.as_secs_f64());
    println!("  {report}");
    println!("  peak: {peak} infectious on day {}", sim.clock.days_at(peak_tick));
    if report.recoverable_faults() > 0 {
        println!("  {} recoverable faults (see warnings above)", report.recoverable_faults());
    }
    println!();

    println!("{:<14} {:>6}", "Health", "Agents");
    println!("{}", "-".repeat(21));
    let states = sim.transitions.states();
    let counts = states.counts(Category::Health);
    for value in states.taxonomy().values(Category::Health) {
        println!("{:<14} {:>6}", states.taxonomy().name(Category::Health, value), counts[value.index()]);
    }

    Ok(())
}
