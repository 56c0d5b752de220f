use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    ComparisonRow, GrowthConfig, SP500_MAX_YEAR, SP500_MIN_YEAR, SimError, SimulationInputs,
    SimulationOutput, System1Config, System2Config, System3Config, TaxSystemsConfig,
    run_simulation, validate_year_range, years_from_range,
};

const MAX_FIXED_YEARS: u32 = 100;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliGrowthMode {
    Fixed,
    Historical,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
enum ApiGrowthMode {
    Fixed,
    #[serde(alias = "sp500", alias = "historicalIndex", alias = "historical_index")]
    Historical,
}

impl From<ApiGrowthMode> for CliGrowthMode {
    fn from(value: ApiGrowthMode) -> Self {
        match value {
            ApiGrowthMode::Fixed => CliGrowthMode::Fixed,
            ApiGrowthMode::Historical => CliGrowthMode::Historical,
        }
    }
}

impl From<GrowthConfig> for ApiGrowthMode {
    fn from(value: GrowthConfig) -> Self {
        match value {
            GrowthConfig::Fixed { .. } => ApiGrowthMode::Fixed,
            GrowthConfig::HistoricalIndex { .. } => ApiGrowthMode::Historical,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    initial_sum: Option<f64>,
    monthly_deposit: Option<f64>,
    years: Option<u32>,

    growth_mode: Option<ApiGrowthMode>,
    growth_rate: Option<f64>,
    start_year: Option<i32>,
    end_year: Option<i32>,

    system1_tax_rate: Option<f64>,
    system1_allowance: Option<f64>,
    system1_loss_threshold: Option<f64>,

    system2_tax_rate: Option<f64>,

    system3_tax_free_wealth: Option<f64>,
    system3_persons: Option<u32>,
    system3_fictional_return: Option<f64>,
    system3_tax_rate: Option<f64>,
}

#[derive(Parser, Debug)]
#[command(
    name = "taxsim",
    about = "Compare a recurring investment under a no-tax benchmark and three tax regimes"
)]
struct Cli {
    #[arg(long, default_value_t = 10_000.0)]
    initial_sum: f64,
    #[arg(long, default_value_t = 500.0)]
    monthly_deposit: f64,
    #[arg(
        long,
        default_value_t = 10,
        help = "Years to simulate; derived from the year range in historical mode"
    )]
    years: u32,
    #[arg(long, value_enum, default_value_t = CliGrowthMode::Fixed)]
    growth_mode: CliGrowthMode,
    #[arg(
        long,
        default_value_t = 7.0,
        help = "Fixed annual growth rate in percent, e.g. 7"
    )]
    growth_rate: f64,
    #[arg(long, help = "First calendar year of S&P 500 returns in historical mode")]
    start_year: Option<i32>,
    #[arg(long, help = "Last calendar year of S&P 500 returns in historical mode")]
    end_year: Option<i32>,
    #[arg(
        long,
        default_value_t = 36.0,
        help = "System 1 tax rate on unrealized gains in percent"
    )]
    system1_tax_rate: f64,
    #[arg(long, default_value_t = 1800.0, help = "System 1 annual tax-free allowance")]
    system1_allowance: f64,
    #[arg(
        long,
        default_value_t = 500.0,
        help = "System 1 losses at or below this amount are written off instead of carried forward"
    )]
    system1_loss_threshold: f64,
    #[arg(
        long,
        default_value_t = 36.0,
        help = "System 2 tax rate on realized gains in percent"
    )]
    system2_tax_rate: f64,
    #[arg(long, default_value_t = 59357.0, help = "System 3 tax-free wealth per person")]
    system3_tax_free_wealth: f64,
    #[arg(long, default_value_t = 2, help = "System 3 number of persons in the household")]
    system3_persons: u32,
    #[arg(
        long,
        default_value_t = 6.0,
        help = "System 3 deemed return on taxable wealth in percent"
    )]
    system3_fictional_return: f64,
    #[arg(
        long,
        default_value_t = 36.0,
        help = "System 3 tax rate on the deemed return in percent"
    )]
    system3_tax_rate: f64,
}

#[derive(Debug)]
struct ApiRequest {
    inputs: SimulationInputs,
    config: TaxSystemsConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    growth_mode: ApiGrowthMode,
    years: u32,
    #[serde(flatten)]
    output: SimulationOutput,
    comparison: Vec<ComparisonRow>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryResponse {
    min_year: i32,
    max_year: i32,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_inputs(cli: Cli) -> Result<ApiRequest, String> {
    if !cli.initial_sum.is_finite() || cli.initial_sum < 0.0 {
        return Err("--initial-sum must be >= 0".to_string());
    }

    if !cli.monthly_deposit.is_finite() || cli.monthly_deposit < 0.0 {
        return Err("--monthly-deposit must be >= 0".to_string());
    }

    let growth = match cli.growth_mode {
        CliGrowthMode::Fixed => {
            if !(1..=MAX_FIXED_YEARS).contains(&cli.years) {
                return Err(format!("--years must be between 1 and {MAX_FIXED_YEARS}"));
            }
            if !cli.growth_rate.is_finite() || cli.growth_rate <= -100.0 {
                return Err("--growth-rate must be > -100".to_string());
            }
            GrowthConfig::Fixed {
                rate: cli.growth_rate / 100.0,
            }
        }
        CliGrowthMode::Historical => {
            let (Some(start_year), Some(end_year)) = (cli.start_year, cli.end_year) else {
                return Err(
                    "--start-year and --end-year are required when --growth-mode=historical"
                        .to_string(),
                );
            };
            validate_year_range(start_year, end_year)
                .map_err(|e| format!("--start-year/--end-year: {e}"))?;
            GrowthConfig::HistoricalIndex {
                start_year,
                end_year,
            }
        }
    };

    for (name, rate) in [
        ("--system1-tax-rate", cli.system1_tax_rate),
        ("--system2-tax-rate", cli.system2_tax_rate),
        ("--system3-fictional-return", cli.system3_fictional_return),
        ("--system3-tax-rate", cli.system3_tax_rate),
    ] {
        if !(0.0..=100.0).contains(&rate) {
            return Err(format!("{name} must be between 0 and 100"));
        }
    }

    if !cli.system1_allowance.is_finite() || cli.system1_allowance < 0.0 {
        return Err("--system1-allowance must be >= 0".to_string());
    }

    if !cli.system1_loss_threshold.is_finite() || cli.system1_loss_threshold < 0.0 {
        return Err("--system1-loss-threshold must be >= 0".to_string());
    }

    if !cli.system3_tax_free_wealth.is_finite() || cli.system3_tax_free_wealth < 0.0 {
        return Err("--system3-tax-free-wealth must be >= 0".to_string());
    }

    if cli.system3_persons == 0 {
        return Err("--system3-persons must be >= 1".to_string());
    }

    let years = match growth {
        GrowthConfig::Fixed { .. } => cli.years,
        GrowthConfig::HistoricalIndex {
            start_year,
            end_year,
        } => years_from_range(start_year, end_year),
    };

    Ok(ApiRequest {
        inputs: SimulationInputs {
            initial_sum: cli.initial_sum,
            monthly_deposit: cli.monthly_deposit,
            years,
            growth,
        },
        config: TaxSystemsConfig {
            system1: System1Config {
                tax_rate: cli.system1_tax_rate / 100.0,
                tax_free_allowance: cli.system1_allowance,
                loss_threshold: cli.system1_loss_threshold,
            },
            system2: System2Config {
                tax_rate: cli.system2_tax_rate / 100.0,
            },
            system3: System3Config {
                tax_free_wealth_per_person: cli.system3_tax_free_wealth,
                persons: cli.system3_persons,
                fictional_return_rate: cli.system3_fictional_return / 100.0,
                tax_rate: cli.system3_tax_rate / 100.0,
            },
        },
    })
}

pub fn run_simulate_command<I, T>(args: I) -> Result<String, String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;
    let request = build_inputs(cli)?;
    let response = simulate(&request).map_err(|e| e.to_string())?;
    serde_json::to_string_pretty(&response).map_err(|e| format!("Failed to render output: {e}"))
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route("/api/history", get(history_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    log::info!("Tax comparison HTTP API listening on http://{addr}");
    log::info!("Local access: http://127.0.0.1:{port}/api/simulate");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn history_handler() -> Response {
    json_response(
        StatusCode::OK,
        HistoryResponse {
            min_year: SP500_MIN_YEAR,
            max_year: SP500_MAX_YEAR,
        },
    )
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => {
            log::warn!("Rejected simulate request: {msg}");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };

    match simulate(&request) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(e) => {
            log::warn!("Simulation failed: {e}");
            error_response(StatusCode::UNPROCESSABLE_ENTITY, &e.to_string())
        }
    }
}

fn simulate(request: &ApiRequest) -> Result<SimulateResponse, SimError> {
    let output = run_simulation(&request.inputs, &request.config)?;
    Ok(SimulateResponse {
        growth_mode: request.inputs.growth.into(),
        years: request.inputs.horizon_years(),
        comparison: output.comparison_matrix(),
        output,
    })
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: SimulatePayload) -> Result<ApiRequest, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.initial_sum {
        cli.initial_sum = v;
    }
    if let Some(v) = payload.monthly_deposit {
        cli.monthly_deposit = v;
    }
    if let Some(v) = payload.years {
        cli.years = v;
    }

    if let Some(v) = payload.growth_mode {
        cli.growth_mode = v.into();
    }
    if let Some(v) = payload.growth_rate {
        cli.growth_rate = v;
    }
    if let Some(v) = payload.start_year {
        cli.start_year = Some(v);
    }
    if let Some(v) = payload.end_year {
        cli.end_year = Some(v);
    }

    if let Some(v) = payload.system1_tax_rate {
        cli.system1_tax_rate = v;
    }
    if let Some(v) = payload.system1_allowance {
        cli.system1_allowance = v;
    }
    if let Some(v) = payload.system1_loss_threshold {
        cli.system1_loss_threshold = v;
    }

    if let Some(v) = payload.system2_tax_rate {
        cli.system2_tax_rate = v;
    }

    if let Some(v) = payload.system3_tax_free_wealth {
        cli.system3_tax_free_wealth = v;
    }
    if let Some(v) = payload.system3_persons {
        cli.system3_persons = v;
    }
    if let Some(v) = payload.system3_fictional_return {
        cli.system3_fictional_return = v;
    }
    if let Some(v) = payload.system3_tax_rate {
        cli.system3_tax_rate = v;
    }

    build_inputs(cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        initial_sum: 10_000.0,
        monthly_deposit: 500.0,
        years: 10,
        growth_mode: CliGrowthMode::Fixed,
        growth_rate: 7.0,
        start_year: None,
        end_year: None,
        system1_tax_rate: 36.0,
        system1_allowance: 1_800.0,
        system1_loss_threshold: 500.0,
        system2_tax_rate: 36.0,
        system3_tax_free_wealth: 59_357.0,
        system3_persons: 2,
        system3_fictional_return: 6.0,
        system3_tax_rate: 36.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_cli() -> Cli {
        default_cli_for_api()
    }

    #[test]
    fn api_defaults_match_engine_defaults() {
        let request = build_inputs(sample_cli()).expect("valid inputs");
        assert_eq!(request.inputs, SimulationInputs::default());
        assert_eq!(request.config, TaxSystemsConfig::default());
    }

    #[test]
    fn clap_defaults_match_api_defaults() {
        let request = build_inputs(Cli::parse_from(["taxsim"])).expect("valid inputs");
        assert_eq!(request.inputs, SimulationInputs::default());
        assert_eq!(request.config, TaxSystemsConfig::default());
    }

    #[test]
    fn build_inputs_converts_percentages() {
        let mut cli = sample_cli();
        cli.growth_rate = 5.5;
        cli.system1_tax_rate = 31.0;
        cli.system3_fictional_return = 7.78;

        let request = build_inputs(cli).expect("valid inputs");
        assert_eq!(request.inputs.growth, GrowthConfig::Fixed { rate: 0.055 });
        assert_approx(request.config.system1.tax_rate, 0.31);
        assert_approx(request.config.system3.fictional_return_rate, 0.0778);
    }

    #[test]
    fn build_inputs_derives_years_from_historical_range() {
        let mut cli = sample_cli();
        cli.growth_mode = CliGrowthMode::Historical;
        cli.start_year = Some(1970);
        cli.end_year = Some(1999);
        cli.years = 3;

        let request = build_inputs(cli).expect("valid inputs");
        assert_eq!(request.inputs.years, 30);
        assert_eq!(request.inputs.horizon_years(), 30);
        assert_eq!(
            request.inputs.growth,
            GrowthConfig::HistoricalIndex {
                start_year: 1970,
                end_year: 1999
            }
        );
    }

    #[test]
    fn build_inputs_requires_historical_bounds() {
        let mut cli = sample_cli();
        cli.growth_mode = CliGrowthMode::Historical;
        cli.start_year = Some(1970);

        let err = build_inputs(cli).expect_err("must require end year");
        assert!(err.contains("--end-year"));
    }

    #[test]
    fn build_inputs_rejects_out_of_range_years() {
        let mut cli = sample_cli();
        cli.growth_mode = CliGrowthMode::Historical;
        cli.start_year = Some(1900);
        cli.end_year = Some(1950);
        let err = build_inputs(cli).expect_err("start before data");
        assert!(err.contains("1928 or later"));

        let mut cli = sample_cli();
        cli.growth_mode = CliGrowthMode::Historical;
        cli.start_year = Some(2000);
        cli.end_year = Some(1990);
        let err = build_inputs(cli).expect_err("end before start");
        assert!(err.contains("greater than or equal to start year"));
    }

    #[test]
    fn build_inputs_rejects_invalid_tax_parameters() {
        let mut cli = sample_cli();
        cli.system2_tax_rate = 120.0;
        let err = build_inputs(cli).expect_err("rate above 100");
        assert!(err.contains("--system2-tax-rate"));

        let mut cli = sample_cli();
        cli.system3_persons = 0;
        let err = build_inputs(cli).expect_err("no persons");
        assert!(err.contains("--system3-persons"));

        let mut cli = sample_cli();
        cli.system1_loss_threshold = -1.0;
        let err = build_inputs(cli).expect_err("negative threshold");
        assert!(err.contains("--system1-loss-threshold"));
    }

    #[test]
    fn build_inputs_rejects_negative_amounts_and_zero_years() {
        let mut cli = sample_cli();
        cli.monthly_deposit = -10.0;
        let err = build_inputs(cli).expect_err("negative deposit");
        assert!(err.contains("--monthly-deposit"));

        let mut cli = sample_cli();
        cli.years = 0;
        let err = build_inputs(cli).expect_err("zero years");
        assert!(err.contains("--years"));
    }

    #[test]
    fn build_inputs_caps_fixed_years() {
        let mut cli = default_cli_for_api();
        cli.years = MAX_FIXED_YEARS;
        let request = build_inputs(cli).expect("upper bound is accepted");
        assert_eq!(request.inputs.horizon_years(), MAX_FIXED_YEARS);

        let mut cli = default_cli_for_api();
        cli.years = u32::MAX;
        let err = build_inputs(cli).expect_err("horizon too long");
        assert_eq!(err, "--years must be between 1 and 100");

        let mut cli = default_cli_for_api();
        cli.years = MAX_FIXED_YEARS + 1;
        assert!(build_inputs(cli).is_err());
    }

    #[test]
    fn api_request_from_json_parses_web_keys() {
        let json = r#"{
          "initialSum": 25000,
          "monthlyDeposit": 750,
          "growthMode": "sp500",
          "startYear": 1995,
          "endYear": 2004,
          "system1TaxRate": 32,
          "system1Allowance": 2000,
          "system1LossThreshold": 0,
          "system2TaxRate": 28,
          "system3TaxFreeWealth": 57000,
          "system3Persons": 1,
          "system3FictionalReturn": 5.88,
          "system3TaxRate": 36
        }"#;
        let request = api_request_from_json(json).expect("json should parse");
        let inputs = request.inputs;
        let config = request.config;

        assert_approx(inputs.initial_sum, 25_000.0);
        assert_approx(inputs.monthly_deposit, 750.0);
        assert_eq!(inputs.years, 10);
        assert!(inputs.growth.is_historical());
        assert_approx(config.system1.tax_rate, 0.32);
        assert_approx(config.system1.tax_free_allowance, 2_000.0);
        assert_approx(config.system1.loss_threshold, 0.0);
        assert_approx(config.system2.tax_rate, 0.28);
        assert_approx(config.system3.tax_free_wealth_per_person, 57_000.0);
        assert_eq!(config.system3.persons, 1);
        assert_approx(config.system3.fictional_return_rate, 0.0588);
    }

    #[test]
    fn api_request_from_json_rejects_unknown_growth_mode() {
        let err = api_request_from_json(r#"{ "growthMode": "lunar" }"#)
            .expect_err("unknown mode must fail");
        assert!(err.contains("Invalid API JSON payload"));
    }

    #[test]
    fn fixed_response_serialization_omits_stock_tracking() {
        let request = build_inputs(sample_cli()).expect("valid inputs");
        let response = simulate(&request).expect("run");
        let json = serde_json::to_string(&response).expect("response should serialize");

        assert!(json.contains("\"growthMode\":\"fixed\""));
        assert!(json.contains("\"years\":10"));
        assert!(json.contains("\"summary\""));
        assert!(json.contains("\"efficiencyScore\""));
        assert!(json.contains("\"accumulatedLossBucket\""));
        assert!(json.contains("\"deferredTaxLiability\""));
        assert!(json.contains("\"fictionalReturn\""));
        assert!(json.contains("\"comparison\""));
        assert!(!json.contains("\"stockTracking\""));
    }

    #[test]
    fn historical_response_serialization_includes_stock_tracking() {
        let mut cli = sample_cli();
        cli.growth_mode = CliGrowthMode::Historical;
        cli.start_year = Some(2000);
        cli.end_year = Some(2009);
        let request = build_inputs(cli).expect("valid inputs");
        let response = simulate(&request).expect("run");
        let value = serde_json::to_value(&response).expect("response should serialize");

        assert_eq!(value["growthMode"], "historical");
        assert_eq!(value["years"], 10);
        assert_eq!(value["benchmark"].as_array().map(Vec::len), Some(10));
        assert_eq!(
            value["stockTracking"]["system1"][0]["calendarYear"],
            serde_json::json!(2000)
        );
        assert!(value["stockTracking"]["initialShares"].is_f64());
    }

    #[test]
    fn run_simulate_command_prints_json() {
        let json = run_simulate_command([
            "taxsim",
            "--initial-sum",
            "1000",
            "--monthly-deposit",
            "0",
            "--years",
            "2",
            "--growth-rate",
            "10",
        ])
        .expect("command should succeed");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value["years"], 2);
        assert_eq!(value["system2"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn run_simulate_command_returns_flag_errors() {
        let err = run_simulate_command(["taxsim", "--years", "soon"])
            .expect_err("non-numeric years");
        assert!(err.contains("--years"));

        let err = run_simulate_command(["taxsim", "--no-such-flag"]).expect_err("unknown flag");
        assert!(err.contains("--no-such-flag"));
    }

    #[tokio::test]
    async fn simulate_handler_maps_errors_to_status_codes() {
        let ok = simulate_handler_impl(SimulatePayload::default()).await;
        assert_eq!(ok.status(), StatusCode::OK);

        let bad = simulate_handler_impl(SimulatePayload {
            years: Some(0),
            ..SimulatePayload::default()
        })
        .await;
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let huge = simulate_handler_impl(SimulatePayload {
            years: Some(u32::MAX),
            ..SimulatePayload::default()
        })
        .await;
        assert_eq!(huge.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            bad.headers().get(header::CACHE_CONTROL),
            Some(&header::HeaderValue::from_static("no-store"))
        );
    }
}
