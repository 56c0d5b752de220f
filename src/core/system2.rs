use super::error::SimResult;
use super::growth::GrowthRateResolver;
use super::history::ReturnTable;
use super::types::{SimulationInputs, System2Config, System2Year, YearlyResult};

pub fn calculate_system2(
    inputs: &SimulationInputs,
    config: &System2Config,
    returns: &dyn ReturnTable,
) -> SimResult<Vec<System2Year>> {
    let resolver = GrowthRateResolver::new(inputs.growth, returns);
    let horizon = inputs.horizon_years();
    let deposits = inputs.annual_deposits();
    let invested_over_horizon = inputs.initial_sum + deposits * f64::from(horizon);
    let mut results = Vec::new();
    let mut balance = inputs.initial_sum;

    for year in 1..=horizon {
        let start_balance = balance;
        let gross_balance = start_balance + start_balance * resolver.rate(year)? + deposits;
        let invested_capital = inputs.initial_sum + deposits * f64::from(year);

        let (tax_paid, deferred_tax_liability) = if year < horizon {
            let unrealized_gain = gross_balance - invested_capital;
            (0.0, (unrealized_gain * config.tax_rate).max(0.0))
        } else {
            let total_capital_gain = gross_balance - invested_over_horizon;
            ((total_capital_gain * config.tax_rate).max(0.0), 0.0)
        };
        balance = gross_balance - tax_paid;

        results.push(System2Year {
            base: YearlyResult {
                year,
                start_balance,
                deposits,
                gross_balance,
                tax_paid,
                end_balance: balance,
            },
            invested_capital,
            deferred_tax_liability,
        });
    }

    Ok(results)
}
