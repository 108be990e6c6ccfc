//! A small MCMC demo: samples a one-dimensional target with Metropolis-Hastings,
//! then compares the chains with the analytic density.

use clap::{Parser, ValueEnum};
use log::{info, warn};
use mini_metropolis::config::SamplerConfig;
use mini_metropolis::core::ChainRunner;
use mini_metropolis::distributions::{Exponential, Gaussian1D, Normalized, TargetDensity};
use mini_metropolis::ks_test::one_sample_ks_test;
use mini_metropolis::metropolis_hastings::MetropolisHastings;
use mini_metropolis::stats::{effective_sample_size, rhat, summarize};
use ndarray::Array2;
use std::error::Error;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Target {
    /// Standard normal distribution
    Normal,
    /// Exponential distribution with rate 1
    Exponential,
}

#[derive(Parser, Debug)]
#[clap(about = "Sample a 1D target with random-walk Metropolis-Hastings")]
struct Args {
    /// The target density
    #[clap(long = "target", value_enum, default_value = "normal")]
    target: Target,
    /// Starting state of every chain
    #[clap(long = "initial-state", default_value = "0.0", allow_hyphen_values = true)]
    initial_state: f64,
    /// Scale of the Gaussian proposal offset
    #[clap(long = "scale", short = 's', default_value = "2.0")]
    scale: f64,
    /// The number of iterations to run each chain, burn-in included
    #[clap(long = "n-steps", short = 'n', default_value = "100000")]
    n_steps: usize,
    /// The number of leading iterations to discard
    #[clap(long = "burn-in", default_value = "1000")]
    burn_in: usize,
    /// The number of independent chains
    #[clap(long = "n-chains", short = 'c', default_value = "1")]
    n_chains: usize,
    /// Seed for reproducible runs
    #[clap(long = "seed")]
    seed: Option<u64>,
    /// Draw a progress bar per chain
    #[clap(long = "progress")]
    progress: bool,
    /// Write the kept samples to this CSV file (requires the `csv` feature)
    #[clap(long = "output", short = 'o')]
    output: Option<PathBuf>,
}

impl Args {
    fn config(&self) -> SamplerConfig {
        let config = SamplerConfig::default()
            .set_initial_state(self.initial_state)
            .set_scale(self.scale)
            .set_n_steps(self.n_steps)
            .set_burn_in(self.burn_in)
            .set_n_chains(self.n_chains);
        match self.seed {
            Some(seed) => config.set_seed(seed),
            None => config,
        }
    }
}

/// Report printed at the end of a run.
#[derive(Debug)]
struct Report {
    n_samples: usize,
    mean: f64,
    variance: f64,
    acceptance_rate: f64,
    ess: f64,
    rhat: Option<f64>,
    ks_p_value: f64,
}

fn sample_target<D>(target: D, args: &Args) -> Result<Report, Box<dyn Error>>
where
    D: TargetDensity<f64> + Normalized<f64> + Clone + Send,
{
    let config = args.config();
    config.validate()?;
    let mut mh = MetropolisHastings::from_config(target.clone(), &config)?;
    info!(
        "Running {} chain(s) of {} steps with seed {}",
        config.n_chains, config.n_steps, mh.seed
    );

    let samples = if args.progress {
        mh.run_progress(config.n_steps, config.burn_in)?
    } else {
        mh.run(config.n_steps, config.burn_in)?
    };

    let pooled: Vec<f64> = samples.iter().copied().collect();
    let summary = summarize(&pooled, 0)?;

    let mut ess = 0.0;
    for chain in samples.outer_iter() {
        match effective_sample_size(&chain.to_vec()) {
            Ok(chain_ess) => ess += chain_ess,
            Err(e) => warn!("Could not compute ESS: {e}"),
        }
    }

    let rhat = if samples.nrows() > 1 {
        Some(rhat(samples.view())?)
    } else {
        None
    };

    let ks = one_sample_ks_test(&pooled, |x| target.cdf(x), 0.05)?;
    if ks.is_rejected {
        warn!(
            "KS test rejects the target distribution (p = {:.4})",
            ks.p_value
        );
    }

    if let Some(path) = &args.output {
        save_samples(&samples, path)?;
    }

    Ok(Report {
        n_samples: summary.n,
        mean: summary.mean,
        variance: summary.variance,
        acceptance_rate: mh.acceptance_rate(),
        ess,
        rhat,
        ks_p_value: ks.p_value,
    })
}

#[cfg(feature = "csv")]
fn save_samples(samples: &Array2<f64>, path: &Path) -> Result<(), Box<dyn Error>> {
    mini_metropolis::io::csv::save_csv(samples, path)?;
    info!("Saved samples to {}", path.display());
    Ok(())
}

#[cfg(not(feature = "csv"))]
fn save_samples(_samples: &Array2<f64>, path: &Path) -> Result<(), Box<dyn Error>> {
    warn!(
        "Not writing {}: built without the `csv` feature",
        path.display()
    );
    Ok(())
}

fn run(args: &Args) -> Result<Report, Box<dyn Error>> {
    match args.target {
        Target::Normal => sample_target(Gaussian1D::<f64>::standard(), args),
        Target::Exponential => sample_target(Exponential { rate: 1.0 }, args),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let args = Args::parse();
    let report = run(&args)?;

    println!("Generated {} samples", report.n_samples);
    println!("Mean after burn-in: {:.4}", report.mean);
    println!("Variance after burn-in: {:.4}", report.variance);
    println!("Acceptance rate: {:.3}", report.acceptance_rate);
    println!("Effective sample size: {:.0}", report.ess);
    if let Some(rhat) = report.rhat {
        println!("R-hat: {:.4}", rhat);
    }
    println!("KS p-value against the analytic CDF: {:.4}", report.ks_p_value);
    Ok(())
}
