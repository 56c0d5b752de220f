use super::error::SimResult;
use super::growth::GrowthRateResolver;
use super::history::ReturnTable;
use super::types::{SimulationInputs, YearlyResult};

pub fn calculate_benchmark(
    inputs: &SimulationInputs,
    returns: &dyn ReturnTable,
) -> SimResult<Vec<YearlyResult>> {
    let resolver = GrowthRateResolver::new(inputs.growth, returns);
    let deposits = inputs.annual_deposits();
    let mut results = Vec::new();
    let mut balance = inputs.initial_sum;

    for year in 1..=inputs.horizon_years() {
        let start_balance = balance;
        let growth = start_balance * resolver.rate(year)?;
        balance = start_balance + growth + deposits;

        results.push(YearlyResult {
            year,
            start_balance,
            deposits,
            gross_balance: balance,
            tax_paid: 0.0,
            end_balance: balance,
        });
    }

    Ok(results)
}
