use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Basic,
    Extended,
}

impl Variant {
    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Basic => "basic",
            Variant::Extended => "extended",
        }
    }

    /// Whether the variant carries retirement and estate sections and a forecast.
    pub fn includes_planning(self) -> bool {
        matches!(self, Variant::Extended)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dependent is exported as an `[age, relationship]` pair.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(from = "(u32, String)", into = "(u32, String)")]
pub struct Dependent {
    pub age: u32,
    pub relationship: String,
}

impl From<(u32, String)> for Dependent {
    fn from((age, relationship): (u32, String)) -> Self {
        Self { age, relationship }
    }
}

impl From<Dependent> for (u32, String) {
    fn from(value: Dependent) -> Self {
        (value.age, value.relationship)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct MonthlyIncome {
    pub individual: f64,
    pub spouse: f64,
}

impl MonthlyIncome {
    pub fn total(self) -> f64 {
        self.individual + self.spouse
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct RetirementPlan {
    pub target_age: u32,
    pub current_balance: f64,
    /// Additional IRA/Roth contribution per month. The payroll retirement
    /// contribution is an expense line item and is not repeated here.
    pub monthly_contributions: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EstatePlan {
    pub value_at_80: f64,
    pub beneficiaries: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UserProfile {
    pub individual_age: u32,
    pub spouse_age: u32,
    pub dependents: Vec<Dependent>,
    pub monthly_income: MonthlyIncome,
    #[serde(default)]
    pub income_changes: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retirement: Option<RetirementPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estate: Option<EstatePlan>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseCategory {
    pub name: String,
    pub items: Vec<LineItem>,
}

impl ExpenseCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
        }
    }

    pub fn total(&self) -> f64 {
        self.items.iter().map(|item| item.amount).sum()
    }
}

/// Expense categories in schema order. Serialized as a JSON object of objects
/// without reordering keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseSet {
    categories: Vec<ExpenseCategory>,
}

impl ExpenseSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn categories(&self) -> &[ExpenseCategory] {
        &self.categories
    }

    pub fn line_items(&self) -> impl Iterator<Item = (&str, &LineItem)> {
        self.categories
            .iter()
            .flat_map(|c| c.items.iter().map(move |item| (c.name.as_str(), item)))
    }

    pub fn amount(&self, category: &str, item: &str) -> Option<f64> {
        self.categories
            .iter()
            .find(|c| c.name == category)?
            .items
            .iter()
            .find(|i| i.name == item)
            .map(|i| i.amount)
    }

    pub fn amount_mut(&mut self, category: &str, item: &str) -> Option<&mut f64> {
        self.categories
            .iter_mut()
            .find(|c| c.name == category)?
            .items
            .iter_mut()
            .find(|i| i.name == item)
            .map(|i| &mut i.amount)
    }

    /// Appends a line item, creating the category at the end if it is new.
    pub fn push(&mut self, category: &str, item: &str, amount: f64) {
        let index = match self.categories.iter().position(|c| c.name == category) {
            Some(index) => index,
            None => {
                self.categories.push(ExpenseCategory::new(category));
                self.categories.len() - 1
            }
        };
        self.categories[index].items.push(LineItem {
            name: item.to_string(),
            amount,
        });
    }

    pub fn total(&self) -> f64 {
        self.line_items().map(|(_, item)| item.amount).sum()
    }
}

struct CategoryItems<'a>(&'a [LineItem]);

impl Serialize for CategoryItems<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for item in self.0 {
            map.serialize_entry(&item.name, &item.amount)?;
        }
        map.end()
    }
}

impl Serialize for ExpenseSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for category in &self.categories {
            map.serialize_entry(&category.name, &CategoryItems(&category.items))?;
        }
        map.end()
    }
}

struct OrderedItems(Vec<LineItem>);

impl<'de> Deserialize<'de> for OrderedItems {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ItemsVisitor;

        impl<'de> Visitor<'de> for ItemsVisitor {
            type Value = OrderedItems;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of line item names to amounts")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut items = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, amount)) = access.next_entry::<String, f64>()? {
                    items.push(LineItem { name, amount });
                }
                Ok(OrderedItems(items))
            }
        }

        deserializer.deserialize_map(ItemsVisitor)
    }
}

impl<'de> Deserialize<'de> for ExpenseSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SetVisitor;

        impl<'de> Visitor<'de> for SetVisitor {
            type Value = ExpenseSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of expense categories")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut categories = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, items)) = access.next_entry::<String, OrderedItems>()? {
                    categories.push(ExpenseCategory { name, items: items.0 });
                }
                Ok(ExpenseSet { categories })
            }
        }

        deserializer.deserialize_map(SetVisitor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSummary {
    pub total_income: f64,
    pub total_expenses: f64,
    pub disposable_income: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ForecastPoint {
    #[serde(rename = "Age")]
    pub age: u32,
    #[serde(rename = "Retirement Balance")]
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Report {
    pub user_profile: UserProfile,
    pub monthly_expenses: ExpenseSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retirement_forecast: Option<Vec<ForecastPoint>>,
}

/// One form submission: built once at the input boundary, then consumed by
/// the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub variant: Variant,
    pub profile: UserProfile,
    pub expenses: ExpenseSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub variant: Variant,
    pub summary: BudgetSummary,
    pub report: Report,
}
