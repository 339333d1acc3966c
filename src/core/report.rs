use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use super::error::{FinanceError, Result};
use super::types::{BudgetSummary, ExpenseSet, ForecastPoint, Report, UserProfile};

pub fn assemble_report(
    user_profile: UserProfile,
    monthly_expenses: ExpenseSet,
    retirement_forecast: Option<Vec<ForecastPoint>>,
) -> Report {
    Report {
        user_profile,
        monthly_expenses,
        retirement_forecast,
    }
}

impl Report {
    /// UTF-8 JSON with four-space indentation. Fails on any non-finite amount.
    pub fn to_pretty_json(&self) -> Result<String> {
        self.ensure_finite()?;
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        Ok(String::from_utf8(buf)?)
    }

    fn ensure_finite(&self) -> Result<()> {
        let profile = &self.user_profile;
        let mut amounts = vec![
            ("monthly_income.individual".to_string(), profile.monthly_income.individual),
            ("monthly_income.spouse".to_string(), profile.monthly_income.spouse),
        ];
        if let Some(plan) = &profile.retirement {
            amounts.push(("retirement.current_balance".to_string(), plan.current_balance));
            amounts.push((
                "retirement.monthly_contributions".to_string(),
                plan.monthly_contributions,
            ));
        }
        if let Some(estate) = &profile.estate {
            amounts.push(("estate.value_at_80".to_string(), estate.value_at_80));
        }
        for (category, item) in self.monthly_expenses.line_items() {
            amounts.push((format!("{category}.{}", item.name), item.amount));
        }
        for point in self.retirement_forecast.iter().flatten() {
            amounts.push((format!("retirement balance at age {}", point.age), point.balance));
        }

        match amounts.into_iter().find(|(_, value)| !value.is_finite()) {
            Some((field, _)) => Err(FinanceError::NonFinite { field }),
            None => Ok(()),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// `$1,234.56`; negative amounts render as `$-1,234.56`.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return format!("${value}");
    }
    let digits = format!("{:.2}", value.abs());
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let is_zero = digits.bytes().all(|b| b == b'0' || b == b'.');
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };
    format!("${sign}{grouped}.{fraction}")
}

impl BudgetSummary {
    pub fn summary_lines(&self) -> [String; 3] {
        [
            format!("Total Monthly Income: {}", format_currency(self.total_income)),
            format!(
                "Total Monthly Expenses: {}",
                format_currency(self.total_expenses)
            ),
            format!(
                "Disposable Income: {}",
                format_currency(self.disposable_income)
            ),
        ]
    }
}
