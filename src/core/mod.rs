mod assumptions;
mod engine;
mod error;
mod report;
pub mod schema;
mod types;

pub use assumptions::Assumptions;
pub use engine::{analyze, monthly_contribution_total, project_retirement, summarize_budget};
pub use error::{FinanceError, Result};
pub use report::{assemble_report, format_currency};
pub use types::{
    Analysis, BudgetSummary, Dependent, EstatePlan, ExpenseCategory, ExpenseSet, ForecastPoint,
    LineItem, MonthlyIncome, Report, RetirementPlan, Submission, UserProfile, Variant,
};
