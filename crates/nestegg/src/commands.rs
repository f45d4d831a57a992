//! Command dispatch
//!
//! Each command loads the plan, calls one engine operation and returns the
//! result as JSON.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use color_eyre::eyre::{WrapErr, eyre};
use jiff::civil::Date;
use serde::Serialize;
use serde_json::{Value, json};

use nestegg_core::model::AllocationTable;
use nestegg_core::{
    FinancialSnapshot, ScenarioBaseline, ScenarioOverrides, analyze_drift, analyze_scenario,
    assess_readiness, income_comparison, model_portfolio, optimize_allocation,
    plan_model_portfolio, project_years, recommend_trades, scenario_presets, simulate,
};

use crate::data::{DataDirectory, PlanData, load_overrides};

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Write an example plan to the data directory
    Init {
        /// Replace an existing plan
        #[arg(long)]
        force: bool,
    },
    /// Allocate a portfolio across the target table
    Allocate {
        /// Amount to allocate (default: current net worth)
        #[arg(long)]
        total: Option<f64>,
    },
    /// Year-by-year projection at the expected growth rate
    Project,
    /// Monte Carlo simulation
    Simulate {
        /// Number of trials (default: from the plan)
        #[arg(long)]
        trials: Option<usize>,
        /// Master seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Drift of current holdings from the target table
    Drift,
    /// Rebalancing recommendations for high and medium priority trades
    Recommend,
    /// Retirement readiness metrics for today's snapshot
    Readiness,
    /// Current holdings income against the target allocation's income
    Income,
    /// Tiered model portfolio for the yield the plan needs
    ModelPortfolio {
        /// Required yield as a fraction (default: derived from the plan)
        #[arg(long)]
        required_yield: Option<f64>,
    },
    /// Compare a what-if scenario with the baseline plan
    Scenario {
        /// Built-in preset, matched by name prefix
        #[arg(long, conflicts_with_all = ["overrides", "saved"])]
        preset: Option<String>,
        /// YAML file of overrides
        #[arg(long, conflicts_with = "saved")]
        overrides: Option<PathBuf>,
        /// Overrides saved in the scenarios directory
        #[arg(long)]
        saved: Option<String>,
        /// Save the overrides used under this name
        #[arg(long)]
        save: Option<String>,
    },
    /// List built-in presets and saved scenarios
    Presets,
    /// Upcoming lumpy expenses
    Expenses {
        /// Years ahead to project
        #[arg(long, default_value_t = 10)]
        years: u16,
        /// Start date, YYYY-MM-DD (default: today)
        #[arg(long)]
        as_of: Option<Date>,
    },
}

fn to_json<T: Serialize>(value: &T) -> color_eyre::Result<Value> {
    serde_json::to_value(value).wrap_err("Failed to serialize result")
}

/// A loaded plan with its validated snapshot
struct PlanContext {
    plan: PlanData,
    snapshot: FinancialSnapshot,
    table: AllocationTable,
}

impl PlanContext {
    fn load(data_dir: &DataDirectory, plan_path: Option<&Path>) -> color_eyre::Result<Self> {
        let plan = match plan_path {
            Some(path) => data_dir.load_plan_from(path)?,
            None => data_dir
                .load_plan()
                .wrap_err("No plan found, run `nestegg init` first")?,
        };
        let snapshot = plan.snapshot().wrap_err("Invalid plan")?;
        let table = plan.allocation_table();
        Ok(Self {
            plan,
            snapshot,
            table,
        })
    }
}

fn init(data_dir: &DataDirectory, force: bool) -> color_eyre::Result<Value> {
    let path = data_dir.plan_path();
    if path.exists() && !force {
        return Err(eyre!(
            "A plan already exists at {}, pass --force to replace it",
            path.display()
        ));
    }
    data_dir.save_plan(&PlanData::example())?;
    tracing::info!(plan = %path.display(), "example plan written");
    Ok(json!({ "plan": path }))
}

fn find_preset(annual_expenses: f64, name: &str) -> color_eyre::Result<ScenarioOverrides> {
    let needle = name.to_lowercase();
    scenario_presets(annual_expenses)
        .into_iter()
        .find(|preset| preset.name.to_lowercase().starts_with(&needle))
        .map(|preset| preset.overrides)
        .ok_or_else(|| eyre!("Unknown preset '{name}', see `nestegg presets`"))
}

/// Run `command` against the plan and return its JSON output
pub fn run(
    command: &Command,
    data_dir: &DataDirectory,
    plan_path: Option<&Path>,
) -> color_eyre::Result<Value> {
    tracing::info!(?command, "running command");
    let load = || PlanContext::load(data_dir, plan_path);

    match command {
        Command::Init { force } => init(data_dir, *force),
        Command::Allocate { total } => {
            let ctx = load()?;
            let total = total.unwrap_or_else(|| ctx.snapshot.net_worth());
            let allocation = optimize_allocation(
                total,
                &ctx.table,
                &ctx.plan.market,
                &ctx.plan.retirement.tax_rates,
            )?;
            to_json(&allocation)
        }
        Command::Project => {
            let ctx = load()?;
            to_json(&project_years(
                &ctx.snapshot,
                &ctx.plan.retirement,
                &ctx.plan.market,
            )?)
        }
        Command::Simulate { trials, seed } => {
            let ctx = load()?;
            let trials = trials.unwrap_or(ctx.plan.trials);
            let result = simulate(
                &ctx.snapshot,
                &ctx.plan.retirement,
                &ctx.plan.market,
                trials,
                *seed,
            )?;
            tracing::info!(
                trials,
                seed = result.seed,
                success_rate = result.success_rate,
                "simulation complete"
            );
            to_json(&result)
        }
        Command::Drift => {
            let ctx = load()?;
            to_json(&analyze_drift(
                &ctx.snapshot.holdings_by_category(),
                &ctx.table,
                &ctx.plan.drift_policy,
            )?)
        }
        Command::Recommend => {
            let ctx = load()?;
            let drift = analyze_drift(
                &ctx.snapshot.holdings_by_category(),
                &ctx.table,
                &ctx.plan.drift_policy,
            )?;
            to_json(&recommend_trades(&drift, &ctx.table, &ctx.plan.market))
        }
        Command::Readiness => {
            let ctx = load()?;
            to_json(&assess_readiness(&ctx.snapshot, &ctx.plan.retirement)?)
        }
        Command::Income => {
            let ctx = load()?;
            to_json(&income_comparison(
                &ctx.snapshot,
                &ctx.table,
                &ctx.plan.market,
                &ctx.plan.retirement.tax_rates,
            )?)
        }
        Command::ModelPortfolio { required_yield } => match required_yield {
            Some(required_yield) => to_json(&model_portfolio(*required_yield)?),
            None => {
                let ctx = load()?;
                to_json(&plan_model_portfolio(&ctx.snapshot, &ctx.plan.retirement)?)
            }
        },
        Command::Scenario {
            preset,
            overrides,
            saved,
            save,
        } => {
            let ctx = load()?;
            let overrides = match (preset, overrides, saved) {
                (Some(name), _, _) => find_preset(ctx.snapshot.annual_expenses(), name)?,
                (None, Some(path), _) => load_overrides(path)?,
                (None, None, Some(name)) => data_dir.load_scenario(name)?,
                (None, None, None) => ScenarioOverrides::default(),
            };
            if let Some(name) = save {
                data_dir.save_scenario(name, &overrides)?;
            }
            let baseline = ScenarioBaseline {
                snapshot: &ctx.snapshot,
                config: &ctx.plan.retirement,
                market: &ctx.plan.market,
                table: &ctx.table,
            };
            to_json(&analyze_scenario(&baseline, &overrides)?)
        }
        Command::Presets => {
            let ctx = load()?;
            Ok(json!({
                "presets": to_json(&scenario_presets(ctx.snapshot.annual_expenses()))?,
                "saved": data_dir.scenario_names()?,
            }))
        }
        Command::Expenses { years, as_of } => {
            let ctx = load()?;
            let as_of = as_of.unwrap_or_else(|| jiff::Zoned::now().date());
            to_json(&ctx.snapshot.upcoming_expenses(as_of, *years))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn initialized() -> (TempDir, DataDirectory) {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = DataDirectory::new(temp_dir.path().join(".nestegg"));
        run(&Command::Init { force: false }, &data_dir, None).unwrap();
        (temp_dir, data_dir)
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let (_temp_dir, data_dir) = initialized();
        assert!(run(&Command::Init { force: false }, &data_dir, None).is_err());
        assert!(run(&Command::Init { force: true }, &data_dir, None).is_ok());
    }

    #[test]
    fn test_missing_plan_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = DataDirectory::new(temp_dir.path().to_path_buf());
        assert!(run(&Command::Project, &data_dir, None).is_err());
    }

    #[test]
    fn test_project_outputs_every_year() {
        let (_temp_dir, data_dir) = initialized();
        let output = run(&Command::Project, &data_dir, None).unwrap();

        let years = output["years"].as_array().unwrap();
        assert_eq!(years.len(), 40);
        assert_eq!(years[0]["age"], 51);
        assert_eq!(output["summary"]["starting_value"], 2_190_000.0);
    }

    #[test]
    fn test_seeded_simulation_is_reproducible() {
        let (_temp_dir, data_dir) = initialized();
        let command = Command::Simulate {
            trials: Some(50),
            seed: Some(7),
        };
        let first = run(&command, &data_dir, None).unwrap();
        let second = run(&command, &data_dir, None).unwrap();

        assert_eq!(first, second);
        assert_eq!(first["trials"], 50);
        assert_eq!(first["seed"], 7);
    }

    #[test]
    fn test_scenario_preset_and_save() {
        let (_temp_dir, data_dir) = initialized();
        let command = Command::Scenario {
            preset: Some("retire later".to_string()),
            overrides: None,
            saved: None,
            save: Some("later".to_string()),
        };
        let output = run(&command, &data_dir, None).unwrap();
        assert_eq!(output["overrides"]["withdrawal_start_age"], 60);

        let presets = run(&Command::Presets, &data_dir, None).unwrap();
        assert_eq!(presets["presets"].as_array().unwrap().len(), 6);
        assert_eq!(presets["saved"], json!(["later"]));

        let replay = Command::Scenario {
            preset: None,
            overrides: None,
            saved: Some("later".to_string()),
            save: None,
        };
        assert_eq!(run(&replay, &data_dir, None).unwrap(), output);
    }

    #[test]
    fn test_unknown_preset_rejected() {
        let (_temp_dir, data_dir) = initialized();
        let command = Command::Scenario {
            preset: Some("moon shot".to_string()),
            overrides: None,
            saved: None,
            save: None,
        };
        assert!(run(&command, &data_dir, None).is_err());
    }

    #[test]
    fn test_expenses_project_roof_cycle() {
        let (_temp_dir, data_dir) = initialized();
        let command = Command::Expenses {
            years: 30,
            as_of: Some(jiff::civil::date(2025, 1, 1)),
        };
        let output = run(&command, &data_dir, None).unwrap();
        let upcoming = output.as_array().unwrap();

        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0]["date"], "2044-06-01");
        assert_eq!(upcoming[0]["amount"], 25_000.0);
    }

    #[test]
    fn test_model_portfolio_for_plan_and_explicit_yield() {
        let (_temp_dir, data_dir) = initialized();
        let explicit = Command::ModelPortfolio {
            required_yield: Some(0.03),
        };
        let output = run(&explicit, &data_dir, None).unwrap();
        assert_eq!(output["tier"], "Moderate");
        assert_eq!(output["table"]["targets"].as_array().unwrap().len(), 5);

        // 150k inflated four years over 2.19M needs about 7.7%
        let from_plan = Command::ModelPortfolio {
            required_yield: None,
        };
        let output = run(&from_plan, &data_dir, None).unwrap();
        assert_eq!(output["current_net_worth"], 2_190_000.0);
        assert_eq!(output["model"]["tier"], "Aggressive");
        assert_eq!(output["model"]["meets_required_yield"], false);

        let negative = Command::ModelPortfolio {
            required_yield: Some(-0.01),
        };
        assert!(run(&negative, &data_dir, None).is_err());
    }

    #[test]
    fn test_income_comparison_for_example_plan() {
        let (_temp_dir, data_dir) = initialized();
        let output = run(&Command::Income, &data_dir, None).unwrap();

        assert_eq!(output["net_worth"], 2_190_000.0);
        let current = output["current_annual_income"].as_f64().unwrap();
        assert!((current - 70_880.0).abs() < 1e-6);
        // No quotes in the example plan, so every yield is estimated
        assert_eq!(output["status"], "BelowTarget");
        assert!(!output["warnings"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_drift_and_recommendations() {
        let (_temp_dir, data_dir) = initialized();
        let drift = run(&Command::Drift, &data_dir, None).unwrap();
        assert_eq!(drift["total_value"], 2_190_000.0);

        let recommendations = run(&Command::Recommend, &data_dir, None).unwrap();
        assert!(!recommendations.as_array().unwrap().is_empty());
    }
}
