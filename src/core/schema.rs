//! Declarative line-item schema for both report variants, plus the bounds the
//! input boundary clamps profile fields to.

use serde::Serialize;

use super::error::{FinanceError, Result};
use super::types::{ExpenseSet, Variant};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemSpec {
    pub category: &'static str,
    pub item: &'static str,
    pub label: &'static str,
    pub default: f64,
    pub min: f64,
    pub max: Option<f64>,
}

const fn row(
    category: &'static str,
    item: &'static str,
    label: &'static str,
    default: f64,
) -> LineItemSpec {
    LineItemSpec {
        category,
        item,
        label,
        default,
        min: 0.0,
        max: Some(MAX_AMOUNT),
    }
}

const BASIC_LINE_ITEMS: &[LineItemSpec] = &[
    row("housing", "mortgage_or_rent", "Mortgage or Rent", 1000.0),
    row("food", "groceries", "Groceries", 400.0),
    row("transportation", "gas", "Gas (Transportation)", 150.0),
    row("utilities", "electricity", "Electricity", 120.0),
];

const EXTENDED_LINE_ITEMS: &[LineItemSpec] = &[
    row("housing", "mortgage_or_rent", "Mortgage or Rent", 3000.0),
    row("housing", "property_tax", "Property Taxes", 500.0),
    row("housing", "repairs", "Household Repairs", 100.0),
    row("housing", "hoa_fees", "HOA Fees", 50.0),
    row("transportation", "car_payment", "Car Payment", 300.0),
    row("transportation", "gas", "Gas (Transportation)", 150.0),
    row("transportation", "maintenance", "Car Maintenance", 60.0),
    row("transportation", "insurance", "Auto Insurance", 100.0),
    row("food", "groceries", "Groceries", 400.0),
    row("food", "restaurants", "Restaurants", 150.0),
    row("food", "pet_food", "Pet Food", 50.0),
    row("utilities", "electricity", "Electricity", 120.0),
    row("utilities", "water", "Water", 40.0),
    row("utilities", "garbage", "Garbage", 30.0),
    row("utilities", "phones", "Phone Bills", 80.0),
    row("utilities", "internet", "Internet", 60.0),
    row("healthcare", "insurance", "Health Insurance", 400.0),
    row("healthcare", "other_medical", "Other Medical Expenses", 100.0),
    row("education_and_childcare", "childcare", "Childcare/Education", 200.0),
    row("entertainment", "entertainment", "Entertainment", 150.0),
    row("entertainment", "subscriptions", "Subscriptions (e.g., Netflix, Hulu)", 30.0),
    row("savings", "general", "Savings (Monthly)", 300.0),
    row("savings", "retirement", "Retirement Contributions", 200.0),
];

/// Line item whose amount also feeds the retirement projection.
pub const RETIREMENT_LINE_ITEM: (&str, &str) = ("savings", "retirement");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AgeBounds {
    pub min: u32,
    pub max: u32,
    pub default: u32,
}

impl AgeBounds {
    pub fn clamp(self, value: u32) -> u32 {
        value.clamp(self.min, self.max)
    }
}

pub const INDIVIDUAL_AGE: AgeBounds = AgeBounds {
    min: 18,
    max: 100,
    default: 30,
};
pub const SPOUSE_AGE: AgeBounds = AgeBounds {
    min: 0,
    max: 100,
    default: 0,
};
pub const DEPENDENT_AGE: AgeBounds = AgeBounds {
    min: 0,
    max: 100,
    default: 0,
};
pub const TARGET_RETIREMENT_AGE: AgeBounds = AgeBounds {
    min: 50,
    max: 75,
    default: 68,
};
pub const MAX_DEPENDENTS: usize = 10;

/// Ceiling for every monetary input. Keeps the 45-year projection finite at
/// any sane return rate.
pub const MAX_AMOUNT: f64 = 1e12;

pub const DEFAULT_INDIVIDUAL_INCOME: f64 = 3000.0;
pub const DEFAULT_SPOUSE_INCOME: f64 = 2500.0;
pub const DEFAULT_RETIREMENT_BALANCE: f64 = 50_000.0;
pub const DEFAULT_ADDITIONAL_IRA: f64 = 100.0;
pub const DEFAULT_ESTATE_VALUE: f64 = 500_000.0;

/// Clamps a monetary amount into `[min, max]`. Non-finite input is rejected.
pub fn clamp_amount(field: &str, value: f64, min: f64, max: Option<f64>) -> Result<f64> {
    if !value.is_finite() {
        return Err(FinanceError::NonFinite {
            field: field.to_string(),
        });
    }
    let value = value.max(min);
    Ok(match max {
        Some(max) => value.min(max),
        None => value,
    })
}

impl Variant {
    pub fn line_items(self) -> &'static [LineItemSpec] {
        match self {
            Variant::Basic => BASIC_LINE_ITEMS,
            Variant::Extended => EXTENDED_LINE_ITEMS,
        }
    }

    pub fn line_item(self, category: &str, item: &str) -> Option<&'static LineItemSpec> {
        self.line_items()
            .iter()
            .find(|spec| spec.category == category && spec.item == item)
    }

    pub fn default_expenses(self) -> ExpenseSet {
        let mut expenses = ExpenseSet::new();
        for spec in self.line_items() {
            expenses.push(spec.category, spec.item, spec.default);
        }
        expenses
    }

    /// Schema defaults overlaid with `overrides`, each clamped to its row's bounds.
    pub fn expenses_with<'a, I>(self, overrides: I) -> Result<ExpenseSet>
    where
        I: IntoIterator<Item = (&'a str, &'a str, f64)>,
    {
        let mut expenses = self.default_expenses();
        for (category, item, amount) in overrides {
            let Some(spec) = self.line_item(category, item) else {
                return Err(FinanceError::UnknownLineItem {
                    variant: self,
                    category: category.to_string(),
                    item: item.to_string(),
                });
            };
            let field = format!("{category}.{item}");
            let clamped = clamp_amount(&field, amount, spec.min, spec.max)?;
            if let Some(slot) = expenses.amount_mut(category, item) {
                *slot = clamped;
            }
        }
        Ok(expenses)
    }

    pub fn report_file_name(self) -> &'static str {
        match self {
            Variant::Basic => "budget_report.json",
            Variant::Extended => "personal_finance_report.json",
        }
    }
}
