//! Monte Carlo simulation
//!
//! Every trial runs the projection recurrence with an independent growth
//! draw per year. Trial seeds are derived from the master seed before any
//! trial runs, so a given seed produces identical results whether trials run
//! serially or on the rayon pool.

use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{ConfigurationError, Result};
use crate::model::{
    FinalValueStats, MarketAssumptions, PercentileBand, ResolvedAssumptions, RetirementConfig,
    ReturnSampler, SimulationResult,
};
use crate::percentiles::{mean, percentile_sorted, sort_values, standard};
use crate::projection::{PlanInputs, project_year};
use crate::snapshot::FinancialSnapshot;

/// Trial count used when the caller has no preference
pub const DEFAULT_TRIALS: usize = 1_000;

/// Year-end values of one trial
#[derive(Debug, Clone)]
struct TrialPath {
    ending_values: Vec<f64>,
    survived: bool,
}

fn run_trial(
    config: &RetirementConfig,
    inputs: &PlanInputs,
    sampler: &ReturnSampler,
    seed: u64,
) -> TrialPath {
    let horizon = config.horizon_years();
    let mut rng = SmallRng::seed_from_u64(seed);
    let draws = sampler.sample_sequence(&mut rng, horizon as usize);

    let mut ending_values = Vec::with_capacity(horizon as usize + 1);
    let mut value = inputs.start_value;
    let mut survived = true;
    for year in 0..=horizon {
        let growth = draws.get(year as usize).copied().unwrap_or(0.0);
        value = project_year(config, inputs, year, value, growth).ending_value;
        survived &= value >= 0.0;
        ending_values.push(value);
    }

    TrialPath {
        ending_values,
        survived,
    }
}

/// Run `trials` randomized projections and aggregate them per year.
///
/// With `seed` unset a master seed is drawn from the thread RNG and reported
/// in the result so the run can be replayed.
pub fn simulate(
    snapshot: &FinancialSnapshot,
    config: &RetirementConfig,
    market: &MarketAssumptions,
    trials: usize,
    seed: Option<u64>,
) -> Result<SimulationResult> {
    if trials == 0 {
        return Err(ConfigurationError::ZeroTrials);
    }
    config.validate()?;
    let assumptions = market.resolve()?;
    let inputs = PlanInputs::from_snapshot(snapshot, config, &assumptions);
    simulate_with(config, &inputs, assumptions, trials, seed)
}

pub(crate) fn simulate_with(
    config: &RetirementConfig,
    inputs: &PlanInputs,
    assumptions: ResolvedAssumptions,
    trials: usize,
    seed: Option<u64>,
) -> Result<SimulationResult> {
    let sampler = assumptions
        .distribution
        .sampler(assumptions.growth_rate, assumptions.volatility)?;
    let seed = seed.unwrap_or_else(|| rand::rng().random());

    let mut master = SmallRng::seed_from_u64(seed);
    let trial_seeds: Vec<u64> = (0..trials).map(|_| master.next_u64()).collect();

    tracing::debug!(trials, seed, horizon = config.horizon_years(), "running monte carlo");

    #[cfg(feature = "parallel")]
    let paths: Vec<TrialPath> = trial_seeds
        .par_iter()
        .map(|&trial_seed| run_trial(config, inputs, &sampler, trial_seed))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let paths: Vec<TrialPath> = trial_seeds
        .iter()
        .map(|&trial_seed| run_trial(config, inputs, &sampler, trial_seed))
        .collect();

    let survivors = paths.iter().filter(|p| p.survived).count();
    let success_rate = 100.0 * survivors as f64 / trials as f64;
    let (years, final_values) = aggregate(config, &paths);

    tracing::debug!(success_rate, "monte carlo complete");

    Ok(SimulationResult {
        trials,
        seed,
        success_rate,
        years,
        final_values,
        assumptions,
    })
}

fn aggregate(config: &RetirementConfig, paths: &[TrialPath]) -> (Vec<PercentileBand>, FinalValueStats) {
    let horizon = config.horizon_years();
    let trials = paths.len() as f64;
    let mut column = Vec::with_capacity(paths.len());
    let mut bands = Vec::with_capacity(horizon as usize + 1);

    for year in 0..=horizon {
        column.clear();
        column.extend(paths.iter().map(|p| p.ending_values[year as usize]));
        sort_values(&mut column);

        let solvent = column.iter().filter(|v| **v >= 0.0).count();
        bands.push(PercentileBand {
            year,
            age: config.current_age + year,
            p10: percentile_sorted(&column, standard::P10),
            p25: percentile_sorted(&column, standard::P25),
            median: percentile_sorted(&column, standard::P50),
            p75: percentile_sorted(&column, standard::P75),
            p90: percentile_sorted(&column, standard::P90),
            mean: mean(&column),
            survival_rate: solvent as f64 / trials,
        });
    }

    // `column` still holds the sorted final-year values
    let final_values = FinalValueStats {
        mean: mean(&column),
        median: percentile_sorted(&column, standard::P50),
        min: column.first().copied().unwrap_or(0.0),
        max: column.last().copied().unwrap_or(0.0),
        p10: percentile_sorted(&column, standard::P10),
        p90: percentile_sorted(&column, standard::P90),
    };

    (bands, final_values)
}
