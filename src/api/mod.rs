use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Parser, ValueEnum};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::core::schema::{
    self, AgeBounds, DEPENDENT_AGE, INDIVIDUAL_AGE, LineItemSpec, MAX_AMOUNT, MAX_DEPENDENTS,
    SPOUSE_AGE, TARGET_RETIREMENT_AGE, clamp_amount,
};
use crate::core::{
    Analysis, Assumptions, BudgetSummary, Dependent, EstatePlan, FinanceError, MonthlyIncome,
    Report, RetirementPlan, Submission, UserProfile, Variant, analyze,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliVariant {
    Basic,
    Extended,
}

impl From<CliVariant> for Variant {
    fn from(value: CliVariant) -> Self {
        match value {
            CliVariant::Basic => Variant::Basic,
            CliVariant::Extended => Variant::Extended,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiVariant {
    #[serde(alias = "budget", alias = "simple")]
    Basic,
    #[serde(alias = "full", alias = "personal-finance", alias = "personalFinance")]
    Extended,
}

impl From<ApiVariant> for CliVariant {
    fn from(value: ApiVariant) -> Self {
        match value {
            ApiVariant::Basic => CliVariant::Basic,
            ApiVariant::Extended => CliVariant::Extended,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct DependentArg {
    age: u32,
    relationship: String,
}

#[derive(Debug, Clone, PartialEq)]
struct ExpenseArg {
    category: String,
    item: String,
    amount: f64,
}

fn parse_dependent(raw: &str) -> Result<DependentArg, FinanceError> {
    let malformed = || FinanceError::MalformedArgument {
        kind: "dependent",
        value: raw.to_string(),
        expected: "AGE:RELATIONSHIP",
    };
    let (age, relationship) = raw.split_once(':').ok_or_else(malformed)?;
    let age = age.trim().parse::<u32>().map_err(|_| malformed())?;
    Ok(DependentArg {
        age,
        relationship: relationship.trim().to_string(),
    })
}

fn parse_expense(raw: &str) -> Result<ExpenseArg, FinanceError> {
    let malformed = || FinanceError::MalformedArgument {
        kind: "expense",
        value: raw.to_string(),
        expected: "CATEGORY.ITEM=AMOUNT",
    };
    let (key, amount) = raw.split_once('=').ok_or_else(malformed)?;
    let (category, item) = key.trim().split_once('.').ok_or_else(malformed)?;
    let amount = amount.trim().parse::<f64>().map_err(|_| malformed())?;
    Ok(ExpenseArg {
        category: category.to_string(),
        item: item.to_string(),
        amount,
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ApiDependent {
    age: Option<u32>,
    relationship: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ReportPayload {
    variant: Option<ApiVariant>,
    individual_age: Option<u32>,
    spouse_age: Option<u32>,
    dependents: Option<Vec<ApiDependent>>,

    income_individual: Option<f64>,
    income_spouse: Option<f64>,

    expenses: Option<BTreeMap<String, BTreeMap<String, f64>>>,

    target_retirement_age: Option<u32>,
    current_retirement_balance: Option<f64>,
    additional_ira_contribution: Option<f64>,

    estate_value: Option<f64>,
    beneficiaries: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SchemaQuery {
    variant: Option<ApiVariant>,
}

#[derive(Parser, Debug)]
#[command(
    name = "household-finance",
    about = "Monthly budget summary, retirement forecast and JSON report export",
    after_help = "Run `household-finance serve [port] [assumptions.json]` to start the HTTP API."
)]
pub struct Cli {
    #[arg(long, value_enum, default_value_t = CliVariant::Extended)]
    variant: CliVariant,
    #[arg(long, default_value_t = INDIVIDUAL_AGE.default, help = "Your age (18-100)")]
    individual_age: u32,
    #[arg(
        long,
        default_value_t = SPOUSE_AGE.default,
        help = "Spouse's age, 0 if none"
    )]
    spouse_age: u32,
    #[arg(
        long = "dependent",
        value_parser = parse_dependent,
        help = "Dependent as AGE:RELATIONSHIP, repeatable (at most 10)"
    )]
    dependents: Vec<DependentArg>,
    #[arg(long, default_value_t = schema::DEFAULT_INDIVIDUAL_INCOME)]
    income_individual: f64,
    #[arg(
        long,
        default_value_t = schema::DEFAULT_SPOUSE_INCOME,
        help = "Spouse's monthly income; ignored when --spouse-age is 0"
    )]
    income_spouse: f64,
    #[arg(
        long = "expense",
        value_parser = parse_expense,
        help = "Override a line item as CATEGORY.ITEM=AMOUNT, repeatable"
    )]
    expenses: Vec<ExpenseArg>,
    #[arg(
        long,
        default_value_t = TARGET_RETIREMENT_AGE.default,
        help = "Target retirement age (50-75)"
    )]
    target_retirement_age: u32,
    #[arg(long, default_value_t = schema::DEFAULT_RETIREMENT_BALANCE)]
    current_retirement_balance: f64,
    #[arg(
        long,
        default_value_t = schema::DEFAULT_ADDITIONAL_IRA,
        help = "Additional IRA/Roth IRA contribution per month"
    )]
    additional_ira_contribution: f64,
    #[arg(
        long,
        default_value_t = schema::DEFAULT_ESTATE_VALUE,
        help = "Expected estate value at age 80"
    )]
    estate_value: f64,
    #[arg(long, default_value = "", help = "Beneficiaries and shares, free text")]
    beneficiaries: String,
    #[arg(long, help = "JSON file overriding the planning assumptions")]
    assumptions: Option<PathBuf>,
    #[arg(
        long,
        conflicts_with = "output_dir",
        help = "Report path; without it or --output-dir the report goes to stdout"
    )]
    output: Option<PathBuf>,
    #[arg(long, help = "Directory for the report, named after the variant")]
    output_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportResponse {
    variant: Variant,
    file_name: &'static str,
    summary: BudgetSummary,
    summary_text: [String; 3],
    report: Report,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SchemaResponse {
    variant: Variant,
    file_name: &'static str,
    includes_planning: bool,
    line_items: &'static [LineItemSpec],
    individual_age: AgeBounds,
    spouse_age: AgeBounds,
    dependent_age: AgeBounds,
    max_dependents: usize,
    target_retirement_age: AgeBounds,
}

fn clamped_age(name: &str, bounds: AgeBounds, value: u32) -> u32 {
    let clamped = bounds.clamp(value);
    if clamped != value {
        warn!("{name} {value} outside {}-{}, using {clamped}", bounds.min, bounds.max);
    }
    clamped
}

fn monthly_amount(name: &str, value: f64) -> Result<f64, String> {
    let clamped = clamp_amount(name, value, 0.0, Some(MAX_AMOUNT)).map_err(|e| e.to_string())?;
    if clamped != value {
        warn!("{name} {value} outside 0-{MAX_AMOUNT}, using {clamped}");
    }
    Ok(clamped)
}

fn build_submission(cli: Cli) -> Result<Submission, String> {
    if cli.dependents.len() > MAX_DEPENDENTS {
        return Err(FinanceError::TooManyDependents {
            count: cli.dependents.len(),
            max: MAX_DEPENDENTS,
        }
        .to_string());
    }

    let variant = Variant::from(cli.variant);
    let individual_age = clamped_age("--individual-age", INDIVIDUAL_AGE, cli.individual_age);
    let spouse_age = clamped_age("--spouse-age", SPOUSE_AGE, cli.spouse_age);

    let dependents = cli
        .dependents
        .into_iter()
        .map(|d| Dependent {
            age: clamped_age("dependent age", DEPENDENT_AGE, d.age),
            relationship: d.relationship,
        })
        .collect();

    let individual = monthly_amount("--income-individual", cli.income_individual)?;
    let spouse = if spouse_age > 0 {
        monthly_amount("--income-spouse", cli.income_spouse)?
    } else {
        0.0
    };

    let expenses = variant
        .expenses_with(
            cli.expenses
                .iter()
                .map(|e| (e.category.as_str(), e.item.as_str(), e.amount)),
        )
        .map_err(|e| e.to_string())?;

    let (retirement, estate) = if variant.includes_planning() {
        let current_balance =
            monthly_amount("--current-retirement-balance", cli.current_retirement_balance)?;
        let monthly_contributions =
            monthly_amount("--additional-ira-contribution", cli.additional_ira_contribution)?;
        let value_at_80 = monthly_amount("--estate-value", cli.estate_value)?;
        (
            Some(RetirementPlan {
                target_age: clamped_age(
                    "--target-retirement-age",
                    TARGET_RETIREMENT_AGE,
                    cli.target_retirement_age,
                ),
                current_balance,
                monthly_contributions,
            }),
            Some(EstatePlan {
                value_at_80,
                beneficiaries: cli.beneficiaries,
            }),
        )
    } else {
        (None, None)
    };

    Ok(Submission {
        variant,
        profile: UserProfile {
            individual_age,
            spouse_age,
            dependents,
            monthly_income: MonthlyIncome { individual, spouse },
            income_changes: Vec::new(),
            retirement,
            estate,
        },
        expenses,
    })
}

fn load_assumptions(path: Option<&PathBuf>) -> Result<Assumptions, String> {
    match path {
        Some(path) => Assumptions::from_json_file(path).map_err(|e| e.to_string()),
        None => Ok(Assumptions::default()),
    }
}

/// One-shot CLI run: prints the summary and writes the report file.
/// Runs one analysis. Returns the report path, or `None` when the report
/// was written to stdout.
pub fn run_cli(cli: Cli) -> Result<Option<PathBuf>, String> {
    let stdout = io::stdout();
    run_cli_with(cli, &mut stdout.lock())
}

fn run_cli_with<W: Write>(cli: Cli, out: &mut W) -> Result<Option<PathBuf>, String> {
    let assumptions = load_assumptions(cli.assumptions.as_ref())?;
    let output = cli.output.clone();
    let output_dir = cli.output_dir.clone();

    let analysis = analyze(build_submission(cli)?, &assumptions);
    let json = analysis.report.to_pretty_json().map_err(|e| e.to_string())?;
    let path = match (output, output_dir) {
        (Some(path), _) => Some(path),
        (None, Some(dir)) => Some(dir.join(analysis.variant.report_file_name())),
        (None, None) => None,
    };

    let write_err = |e: io::Error| format!("failed to write output: {e}");
    match path {
        Some(path) => {
            for line in analysis.summary.summary_lines() {
                writeln!(out, "{line}").map_err(write_err)?;
            }
            fs::write(&path, json)
                .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
            info!("wrote {} report to {}", analysis.variant, path.display());
            Ok(Some(path))
        }
        None => {
            for line in analysis.summary.summary_lines() {
                info!("{line}");
            }
            writeln!(out, "{json}").map_err(write_err)?;
            Ok(None)
        }
    }
}

pub async fn run_http_server(port: u16, assumptions: Assumptions) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(assumptions);

    let listener = TcpListener::bind(addr).await?;
    info!("household finance API listening on http://{addr}");
    info!("local access: http://127.0.0.1:{port}/api/schema");

    axum::serve(listener, app).await
}

fn router(assumptions: Assumptions) -> Router {
    Router::new()
        .route("/api/schema", get(schema_handler))
        .route(
            "/api/report",
            get(report_get_handler).post(report_post_handler),
        )
        .route("/api/report/download", post(download_handler))
        .fallback(not_found_handler)
        .with_state(Arc::new(assumptions))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn schema_handler(Query(query): Query<SchemaQuery>) -> Response {
    let variant = query
        .variant
        .map(|v| Variant::from(CliVariant::from(v)))
        .unwrap_or(Variant::Extended);
    json_response(StatusCode::OK, schema_response(variant))
}

async fn report_get_handler(
    State(assumptions): State<Arc<Assumptions>>,
    Query(payload): Query<ReportPayload>,
) -> Response {
    report_handler_impl(&assumptions, payload)
}

async fn report_post_handler(
    State(assumptions): State<Arc<Assumptions>>,
    Json(payload): Json<ReportPayload>,
) -> Response {
    report_handler_impl(&assumptions, payload)
}

fn report_handler_impl(assumptions: &Assumptions, payload: ReportPayload) -> Response {
    let analysis = match analysis_from_payload(assumptions, payload) {
        Ok(analysis) => analysis,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    json_response(StatusCode::OK, build_report_response(analysis))
}

async fn download_handler(
    State(assumptions): State<Arc<Assumptions>>,
    Json(payload): Json<ReportPayload>,
) -> Response {
    let analysis = match analysis_from_payload(&assumptions, payload) {
        Ok(analysis) => analysis,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    let body = match analysis.report.to_pretty_json() {
        Ok(body) => body,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    };
    let file_name = analysis.variant.report_file_name();
    info!("exporting {file_name}");
    with_cache_control((
        [
            (
                header::CONTENT_TYPE,
                "application/json; charset=utf-8".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    ))
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn analysis_from_payload(
    assumptions: &Assumptions,
    payload: ReportPayload,
) -> Result<Analysis, String> {
    let submission = submission_from_payload(payload)?;
    Ok(analyze(submission, assumptions))
}

#[cfg(test)]
fn submission_from_json(json: &str) -> Result<Submission, String> {
    let payload = serde_json::from_str::<ReportPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    submission_from_payload(payload)
}

fn submission_from_payload(payload: ReportPayload) -> Result<Submission, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.variant {
        cli.variant = v.into();
    }
    if let Some(v) = payload.individual_age {
        cli.individual_age = v;
    }
    if let Some(v) = payload.spouse_age {
        cli.spouse_age = v;
    }
    if let Some(dependents) = payload.dependents {
        cli.dependents = dependents
            .into_iter()
            .map(|d| DependentArg {
                age: d.age.unwrap_or(DEPENDENT_AGE.default),
                relationship: d.relationship.unwrap_or_default(),
            })
            .collect();
    }
    if let Some(v) = payload.income_individual {
        cli.income_individual = v;
    }
    if let Some(v) = payload.income_spouse {
        cli.income_spouse = v;
    }
    if let Some(expenses) = payload.expenses {
        cli.expenses = expenses
            .into_iter()
            .flat_map(|(category, items)| {
                items.into_iter().map(move |(item, amount)| ExpenseArg {
                    category: category.clone(),
                    item,
                    amount,
                })
            })
            .collect();
    }
    if let Some(v) = payload.target_retirement_age {
        cli.target_retirement_age = v;
    }
    if let Some(v) = payload.current_retirement_balance {
        cli.current_retirement_balance = v;
    }
    if let Some(v) = payload.additional_ira_contribution {
        cli.additional_ira_contribution = v;
    }
    if let Some(v) = payload.estate_value {
        cli.estate_value = v;
    }
    if let Some(v) = payload.beneficiaries {
        cli.beneficiaries = v;
    }

    build_submission(cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        variant: CliVariant::Extended,
        individual_age: INDIVIDUAL_AGE.default,
        spouse_age: SPOUSE_AGE.default,
        dependents: Vec::new(),
        income_individual: schema::DEFAULT_INDIVIDUAL_INCOME,
        income_spouse: schema::DEFAULT_SPOUSE_INCOME,
        expenses: Vec::new(),
        target_retirement_age: TARGET_RETIREMENT_AGE.default,
        current_retirement_balance: schema::DEFAULT_RETIREMENT_BALANCE,
        additional_ira_contribution: schema::DEFAULT_ADDITIONAL_IRA,
        estate_value: schema::DEFAULT_ESTATE_VALUE,
        beneficiaries: String::new(),
        assumptions: None,
        output: None,
        output_dir: None,
    }
}

fn build_report_response(analysis: Analysis) -> ReportResponse {
    ReportResponse {
        variant: analysis.variant,
        file_name: analysis.variant.report_file_name(),
        summary: analysis.summary,
        summary_text: analysis.summary.summary_lines(),
        report: analysis.report,
    }
}

fn schema_response(variant: Variant) -> SchemaResponse {
    SchemaResponse {
        variant,
        file_name: variant.report_file_name(),
        includes_planning: variant.includes_planning(),
        line_items: variant.line_items(),
        individual_age: INDIVIDUAL_AGE,
        spouse_age: SPOUSE_AGE,
        dependent_age: DEPENDENT_AGE,
        max_dependents: MAX_DEPENDENTS,
        target_retirement_age: TARGET_RETIREMENT_AGE,
    }
}
