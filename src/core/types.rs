use serde::Serialize;

use super::history::years_from_range;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum GrowthConfig {
    /// Constant annual rate as a decimal fraction (0.07 = 7%).
    Fixed { rate: f64 },
    HistoricalIndex { start_year: i32, end_year: i32 },
}

impl GrowthConfig {
    pub fn is_historical(&self) -> bool {
        matches!(self, GrowthConfig::HistoricalIndex { .. })
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SimulationInputs {
    pub initial_sum: f64,
    pub monthly_deposit: f64,
    pub years: u32,
    pub growth: GrowthConfig,
}

impl SimulationInputs {
    pub fn horizon_years(&self) -> u32 {
        match self.growth {
            GrowthConfig::Fixed { .. } => self.years,
            GrowthConfig::HistoricalIndex {
                start_year,
                end_year,
            } => years_from_range(start_year, end_year),
        }
    }

    pub fn annual_deposits(&self) -> f64 {
        self.monthly_deposit * 12.0
    }
}

impl Default for SimulationInputs {
    fn default() -> Self {
        Self {
            initial_sum: 10_000.0,
            monthly_deposit: 500.0,
            years: 10,
            growth: GrowthConfig::Fixed { rate: 0.07 },
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct System1Config {
    pub tax_rate: f64,
    pub tax_free_allowance: f64,
    /// Losses at or below this amount are written off instead of carried forward.
    pub loss_threshold: f64,
}

impl Default for System1Config {
    fn default() -> Self {
        Self {
            tax_rate: 0.36,
            tax_free_allowance: 1_800.0,
            loss_threshold: 500.0,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct System2Config {
    pub tax_rate: f64,
}

impl Default for System2Config {
    fn default() -> Self {
        Self { tax_rate: 0.36 }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct System3Config {
    pub tax_free_wealth_per_person: f64,
    pub persons: u32,
    pub fictional_return_rate: f64,
    pub tax_rate: f64,
}

impl Default for System3Config {
    fn default() -> Self {
        Self {
            tax_free_wealth_per_person: 59_357.0,
            persons: 2,
            fictional_return_rate: 0.06,
            tax_rate: 0.36,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TaxSystemsConfig {
    pub system1: System1Config,
    pub system2: System2Config,
    pub system3: System3Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyResult {
    pub year: u32,
    pub start_balance: f64,
    pub deposits: f64,
    pub gross_balance: f64,
    pub tax_paid: f64,
    pub end_balance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct System1Year {
    #[serde(flatten)]
    pub base: YearlyResult,
    pub gross_profit: f64,
    pub accumulated_loss_bucket: f64,
    pub taxable_income: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct System2Year {
    #[serde(flatten)]
    pub base: YearlyResult,
    pub invested_capital: f64,
    pub deferred_tax_liability: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct System3Year {
    #[serde(flatten)]
    pub base: YearlyResult,
    pub asset_value: f64,
    pub tax_free_threshold: f64,
    pub fictional_return: f64,
}

pub trait YearRecord {
    fn base(&self) -> &YearlyResult;
}

impl YearRecord for YearlyResult {
    fn base(&self) -> &YearlyResult {
        self
    }
}

impl YearRecord for System1Year {
    fn base(&self) -> &YearlyResult {
        &self.base
    }
}

impl YearRecord for System2Year {
    fn base(&self) -> &YearlyResult {
        &self.base
    }
}

impl YearRecord for System3Year {
    fn base(&self) -> &YearlyResult {
        &self.base
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockYearData {
    pub year: u32,
    pub calendar_year: i32,
    pub stock_price: f64,
    pub shares_owned: f64,
    pub shares_bought: f64,
    pub shares_sold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockTracking {
    pub initial_price: f64,
    pub initial_shares: f64,
    pub benchmark: Vec<StockYearData>,
    pub system1: Vec<StockYearData>,
    pub system2: Vec<StockYearData>,
    pub system3: Vec<StockYearData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkSummary {
    pub final_balance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSummary {
    pub final_balance: f64,
    pub total_tax_paid: f64,
    /// Final balance as a percentage of the benchmark's final balance.
    pub efficiency_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationSummary {
    pub benchmark: BenchmarkSummary,
    pub system1: SystemSummary,
    pub system2: SystemSummary,
    pub system3: SystemSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub year: u32,
    pub system1_balance: f64,
    pub system2_balance: f64,
    pub system3_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationOutput {
    pub benchmark: Vec<YearlyResult>,
    pub system1: Vec<System1Year>,
    pub system2: Vec<System2Year>,
    pub system3: Vec<System3Year>,
    pub summary: SimulationSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_tracking: Option<StockTracking>,
}

impl SimulationOutput {
    pub fn comparison_matrix(&self) -> Vec<ComparisonRow> {
        self.system1
            .iter()
            .zip(&self.system2)
            .zip(&self.system3)
            .map(|((s1, s2), s3)| ComparisonRow {
                year: s1.base.year,
                system1_balance: s1.base.end_balance,
                system2_balance: s2.base.end_balance,
                system3_balance: s3.base.end_balance,
            })
            .collect()
    }
}
