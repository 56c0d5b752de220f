mod benchmark;
mod engine;
mod error;
mod growth;
mod history;
mod stock;
mod system1;
mod system2;
mod system3;
mod types;

pub use benchmark::calculate_benchmark;
pub use engine::{run_simulation, run_simulation_with};
pub use error::{SimError, SimResult, YearRangeError};
pub use growth::GrowthRateResolver;
pub use history::{
    PriceTable, ReturnTable, SP500_MAX_YEAR, SP500_MIN_YEAR, Sp500History, validate_year_range,
    years_from_range,
};
pub use stock::{RegimeSeries, compute_stock_tracking};
pub use system1::calculate_system1;
pub use system2::calculate_system2;
pub use system3::calculate_system3;
pub use types::{
    BenchmarkSummary, ComparisonRow, GrowthConfig, SimulationInputs, SimulationOutput,
    SimulationSummary, StockTracking, StockYearData, System1Config, System1Year, System2Config,
    System2Year, System3Config, System3Year, SystemSummary, TaxSystemsConfig, YearRecord,
    YearlyResult,
};
