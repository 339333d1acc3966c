use log::debug;

use super::assumptions::Assumptions;
use super::report::assemble_report;
use super::schema::RETIREMENT_LINE_ITEM;
use super::types::{
    Analysis, BudgetSummary, ExpenseSet, ForecastPoint, MonthlyIncome, Submission, UserProfile,
};

pub const FORECAST_MAX_YEARS: u32 = 45;
pub const FORECAST_LAST_AGE: u32 = 100;

pub fn summarize_budget(income: MonthlyIncome, expenses: &ExpenseSet) -> BudgetSummary {
    let total_income = income.total();
    let total_expenses = expenses.total();
    BudgetSummary {
        total_income,
        total_expenses,
        disposable_income: total_income - total_expenses,
    }
}

/// Payroll retirement line item plus the additional IRA/Roth contribution.
pub fn monthly_contribution_total(profile: &UserProfile, expenses: &ExpenseSet) -> f64 {
    let (category, item) = RETIREMENT_LINE_ITEM;
    let payroll = expenses.amount(category, item).unwrap_or(0.0);
    let additional = profile
        .retirement
        .map(|plan| plan.monthly_contributions)
        .unwrap_or(0.0);
    payroll + additional
}

/// Yearly balance forecast from `starting_age` for at most 45 years, ending no
/// later than age 100. Each year grows the prior balance first and then adds
/// twelve months of contributions as a lump sum.
pub fn project_retirement(
    current_balance: f64,
    annual_return_rate: f64,
    monthly_contribution_total: f64,
    starting_age: u32,
) -> Vec<ForecastPoint> {
    let end_age = starting_age
        .saturating_add(FORECAST_MAX_YEARS)
        .min(FORECAST_LAST_AGE + 1);
    let annual_contribution = monthly_contribution_total * 12.0;

    let mut balance = current_balance;
    let mut forecast = Vec::with_capacity(end_age.saturating_sub(starting_age) as usize);
    for age in starting_age..end_age {
        balance *= 1.0 + annual_return_rate;
        balance += annual_contribution;
        forecast.push(ForecastPoint { age, balance });
    }
    forecast
}

/// Runs one submission through aggregation, projection and report assembly.
pub fn analyze(submission: Submission, assumptions: &Assumptions) -> Analysis {
    let Submission {
        variant,
        profile,
        expenses,
    } = submission;

    let summary = summarize_budget(profile.monthly_income, &expenses);
    debug!(
        "{variant} budget: income {:.2}, expenses {:.2}, disposable {:.2}",
        summary.total_income, summary.total_expenses, summary.disposable_income
    );

    let forecast = match (variant.includes_planning(), profile.retirement) {
        (true, Some(plan)) => {
            let contributions = monthly_contribution_total(&profile, &expenses);
            let forecast = project_retirement(
                plan.current_balance,
                assumptions.investment_return_rate,
                contributions,
                profile.individual_age,
            );
            debug!(
                "projected {} years from age {} at {:.4} with {:.2}/month",
                forecast.len(),
                profile.individual_age,
                assumptions.investment_return_rate,
                contributions
            );
            Some(forecast)
        }
        _ => None,
    };

    Analysis {
        variant,
        summary,
        report: assemble_report(profile, expenses, forecast),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{EstatePlan, RetirementPlan, Variant};
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_profile() -> UserProfile {
        UserProfile {
            individual_age: 30,
            spouse_age: 0,
            dependents: Vec::new(),
            monthly_income: MonthlyIncome {
                individual: 3000.0,
                spouse: 0.0,
            },
            income_changes: Vec::new(),
            retirement: Some(RetirementPlan {
                target_age: 68,
                current_balance: 50_000.0,
                monthly_contributions: 100.0,
            }),
            estate: Some(EstatePlan {
                value_at_80: 500_000.0,
                beneficiaries: String::new(),
            }),
        }
    }

    #[test]
    fn summarize_budget_matches_basic_example() {
        let expenses = Variant::Basic.default_expenses();
        let summary = summarize_budget(
            MonthlyIncome {
                individual: 3000.0,
                spouse: 0.0,
            },
            &expenses,
        );
        assert_approx(summary.total_income, 3000.0);
        assert_approx(summary.total_expenses, 1670.0);
        assert_approx(summary.disposable_income, 1330.0);
    }

    #[test]
    fn summarize_budget_allows_negative_disposable_income() {
        let expenses = Variant::Extended.default_expenses();
        let summary = summarize_budget(
            MonthlyIncome {
                individual: 3000.0,
                spouse: 0.0,
            },
            &expenses,
        );
        assert_approx(summary.total_expenses, 6570.0);
        assert_approx(summary.disposable_income, -3570.0);
    }

    #[test]
    fn first_forecast_year_grows_then_contributes() {
        let forecast = project_retirement(50_000.0, 0.08, 300.0, 30);
        assert_eq!(forecast[0].age, 30);
        assert_approx(forecast[0].balance, 57_600.0);
        assert_approx(forecast[1].balance, 57_600.0 * 1.08 + 3_600.0);
        assert_eq!(forecast.len(), 45);
        assert_eq!(forecast.last().map(|p| p.age), Some(74));
    }

    #[test]
    fn forecast_stops_at_age_one_hundred() {
        let forecast = project_retirement(1_000.0, 0.08, 0.0, 95);
        let ages: Vec<_> = forecast.iter().map(|p| p.age).collect();
        assert_eq!(ages, [95, 96, 97, 98, 99, 100]);
    }

    #[test]
    fn forecast_is_empty_past_one_hundred() {
        assert!(project_retirement(1_000.0, 0.08, 10.0, 101).is_empty());
        assert!(project_retirement(1_000.0, 0.08, 10.0, u32::MAX).is_empty());
    }

    #[test]
    fn contribution_total_adds_line_item_and_additional_ira() {
        let profile = sample_profile();
        let expenses = Variant::Extended.default_expenses();
        assert_approx(monthly_contribution_total(&profile, &expenses), 300.0);

        let basic = Variant::Basic.default_expenses();
        assert_approx(monthly_contribution_total(&profile, &basic), 100.0);
    }

    #[test]
    fn analyze_extended_builds_forecast_from_assumed_return() {
        let submission = Submission {
            variant: Variant::Extended,
            profile: sample_profile(),
            expenses: Variant::Extended.default_expenses(),
        };
        let analysis = analyze(submission, &Assumptions::default());
        let forecast = analysis
            .report
            .retirement_forecast
            .expect("extended variant has a forecast");
        assert_eq!(forecast.len(), 45);
        assert_approx(forecast[0].balance, 57_600.0);
        assert_approx(analysis.summary.total_income, 3000.0);
    }

    #[test]
    fn analyze_uses_injected_return_rate() {
        let assumptions = Assumptions {
            investment_return_rate: 0.0,
            ..Assumptions::default()
        };
        let submission = Submission {
            variant: Variant::Extended,
            profile: sample_profile(),
            expenses: Variant::Extended.default_expenses(),
        };
        let analysis = analyze(submission, &assumptions);
        let forecast = analysis.report.retirement_forecast.expect("forecast");
        assert_approx(forecast[0].balance, 53_600.0);
    }

    #[test]
    fn analyze_basic_has_no_forecast() {
        let mut profile = sample_profile();
        profile.retirement = None;
        profile.estate = None;
        let submission = Submission {
            variant: Variant::Basic,
            profile,
            expenses: Variant::Basic.default_expenses(),
        };
        let analysis = analyze(submission, &Assumptions::default());
        assert!(analysis.report.retirement_forecast.is_none());
        assert_approx(analysis.summary.disposable_income, 1330.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_forecast_length_and_ordering(
            starting_age in 18u32..=100,
            balance_cents in 0u64..200_000_000,
            contribution_cents in 0u64..500_000,
        ) {
            let forecast = project_retirement(
                balance_cents as f64 / 100.0,
                0.08,
                contribution_cents as f64 / 100.0,
                starting_age,
            );
            prop_assert_eq!(forecast.len() as u32, FORECAST_MAX_YEARS.min(101 - starting_age));
            prop_assert_eq!(forecast[0].age, starting_age);
            for pair in forecast.windows(2) {
                prop_assert_eq!(pair[1].age, pair[0].age + 1);
                prop_assert!(pair[1].balance >= pair[0].balance);
            }
        }
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(32))]

        #[test]
        fn prop_projection_is_deterministic(
            starting_age in 18u32..=100,
            balance in 0.0f64..5_000_000.0,
            rate_bp in 0u32..1500,
            contribution in 0.0f64..10_000.0,
        ) {
            let rate = rate_bp as f64 / 10_000.0;
            let first = project_retirement(balance, rate, contribution, starting_age);
            let second = project_retirement(balance, rate, contribution, starting_age);
            prop_assert_eq!(first, second);
        }
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_budget_identities_hold(
            individual in 0u32..2_000_000,
            spouse in 0u32..2_000_000,
            amounts in proptest::collection::vec(0u32..1_000_000, 23),
        ) {
            let overrides: Vec<(&str, &str, f64)> = Variant::Extended
                .line_items()
                .iter()
                .zip(&amounts)
                .map(|(spec, cents)| (spec.category, spec.item, *cents as f64 / 100.0))
                .collect();
            let expenses = Variant::Extended
                .expenses_with(overrides.iter().copied())
                .expect("schema items");
            let income = MonthlyIncome {
                individual: individual as f64 / 100.0,
                spouse: spouse as f64 / 100.0,
            };
            let summary = summarize_budget(income, &expenses);

            let flat_sum: f64 = overrides.iter().map(|(_, _, amount)| amount).sum();
            let by_category: f64 = expenses.categories().iter().map(|c| c.total()).sum();
            prop_assert!((summary.total_expenses - flat_sum).abs() <= EPS);
            prop_assert!((summary.total_expenses - by_category).abs() <= EPS);
            prop_assert_eq!(summary.disposable_income, summary.total_income - summary.total_expenses);
        }
    }
}
