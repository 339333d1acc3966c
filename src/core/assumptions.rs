use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{FinanceError, Result};

/// Planning assumptions shared by every submission.
///
/// Only `investment_return_rate` feeds a computation (the retirement
/// projector). The remaining fields describe the planning context and are
/// carried so that callers can display or extend them.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Assumptions {
    pub tcja_permanent: bool,
    pub residence_state: String,
    pub social_security_age: u32,
    pub social_security_cut_year: u32,
    pub social_security_reduction: f64,
    pub inflation_rate: f64,
    pub investment_return_rate: f64,
    pub retirement_accounts: Vec<String>,
    pub education_savings_plan: String,
    pub estate_valuation_age: u32,
    pub cost_of_living_area: String,
}

impl Default for Assumptions {
    fn default() -> Self {
        Self {
            tcja_permanent: true,
            residence_state: "Michigan".to_string(),
            social_security_age: 68,
            social_security_cut_year: 2033,
            social_security_reduction: 0.30,
            inflation_rate: 0.03,
            investment_return_rate: 0.08,
            retirement_accounts: vec!["IRA".to_string(), "Roth IRA".to_string()],
            education_savings_plan: "529 Plan".to_string(),
            estate_valuation_age: 80,
            cost_of_living_area: "South Bend, IN".to_string(),
        }
    }
}

impl Assumptions {
    /// Reads assumptions from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| FinanceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let assumptions: Assumptions = serde_json::from_str(&raw)?;
        if !assumptions.investment_return_rate.is_finite() {
            return Err(FinanceError::NonFinite {
                field: "investment_return_rate".to_string(),
            });
        }
        Ok(assumptions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults_for_missing_keys() {
        let parsed: Assumptions =
            serde_json::from_str(r#"{"investment_return_rate": 0.05}"#).expect("valid json");
        assert_eq!(parsed.investment_return_rate, 0.05);
        assert_eq!(parsed.estate_valuation_age, 80);
        assert_eq!(parsed.retirement_accounts, vec!["IRA", "Roth IRA"]);
    }

    #[test]
    fn from_json_file_reports_missing_path() {
        let err = Assumptions::from_json_file(Path::new("does/not/exist.json"))
            .expect_err("missing file must fail");
        assert!(err.to_string().contains("does/not/exist.json"));
    }

    #[test]
    fn from_json_file_reads_overrides() {
        let path = std::env::temp_dir().join(format!(
            "household_finance_assumptions_{}.json",
            std::process::id()
        ));
        fs::write(&path, r#"{"residence_state": "Indiana", "inflation_rate": 0.025}"#)
            .expect("write temp file");
        let parsed = Assumptions::from_json_file(&path).expect("valid assumptions");
        let _ = fs::remove_file(&path);

        assert_eq!(parsed.residence_state, "Indiana");
        assert_eq!(parsed.inflation_rate, 0.025);
        assert_eq!(parsed.investment_return_rate, 0.08);
    }
}
