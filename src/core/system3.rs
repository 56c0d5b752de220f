use super::error::SimResult;
use super::growth::GrowthRateResolver;
use super::history::ReturnTable;
use super::types::{SimulationInputs, System3Config, System3Year, YearlyResult};

pub fn calculate_system3(
    inputs: &SimulationInputs,
    config: &System3Config,
    returns: &dyn ReturnTable,
) -> SimResult<Vec<System3Year>> {
    let resolver = GrowthRateResolver::new(inputs.growth, returns);
    let deposits = inputs.annual_deposits();
    let tax_free_threshold = config.tax_free_wealth_per_person * f64::from(config.persons);
    let mut results = Vec::new();
    let mut balance = inputs.initial_sum;

    for year in 1..=inputs.horizon_years() {
        let start_balance = balance;
        let gross_balance = start_balance + start_balance * resolver.rate(year)? + deposits;

        let taxable_assets = (gross_balance - tax_free_threshold).max(0.0);
        let fictional_return = taxable_assets * config.fictional_return_rate;
        let tax_paid = fictional_return * config.tax_rate;
        balance = gross_balance - tax_paid;

        results.push(System3Year {
            base: YearlyResult {
                year,
                start_balance,
                deposits,
                gross_balance,
                tax_paid,
                end_balance: balance,
            },
            asset_value: gross_balance,
            tax_free_threshold,
            fictional_return,
        });
    }

    Ok(results)
}
