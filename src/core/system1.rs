use super::error::SimResult;
use super::growth::GrowthRateResolver;
use super::history::ReturnTable;
use super::types::{SimulationInputs, System1Config, System1Year, YearlyResult};

// Losses above `loss_threshold` carry forward in full; smaller ones are written off.
pub fn calculate_system1(
    inputs: &SimulationInputs,
    config: &System1Config,
    returns: &dyn ReturnTable,
) -> SimResult<Vec<System1Year>> {
    let resolver = GrowthRateResolver::new(inputs.growth, returns);
    let deposits = inputs.annual_deposits();
    let mut results = Vec::new();
    let mut balance = inputs.initial_sum;
    let mut loss_bucket = 0.0;

    for year in 1..=inputs.horizon_years() {
        let start_balance = balance;
        let balance_after_deposits = start_balance + deposits;
        let gross_balance = balance_after_deposits + balance_after_deposits * resolver.rate(year)?;
        let gross_profit = gross_balance - balance_after_deposits;

        let (next_bucket, taxable_income) = apply_loss_bucket(gross_profit, loss_bucket, config);
        loss_bucket = next_bucket;

        let tax_paid = (taxable_income - config.tax_free_allowance).max(0.0) * config.tax_rate;
        balance = gross_balance - tax_paid;

        results.push(System1Year {
            base: YearlyResult {
                year,
                start_balance,
                deposits,
                gross_balance,
                tax_paid,
                end_balance: balance,
            },
            gross_profit,
            accumulated_loss_bucket: loss_bucket,
            taxable_income,
        });
    }

    Ok(results)
}

fn apply_loss_bucket(gross_profit: f64, loss_bucket: f64, config: &System1Config) -> (f64, f64) {
    if gross_profit < 0.0 {
        let loss = gross_profit.abs();
        if loss > config.loss_threshold {
            return (loss_bucket + loss, 0.0);
        }
        return (loss_bucket, 0.0);
    }

    let net_gain = gross_profit - loss_bucket;
    if net_gain < 0.0 {
        (net_gain.abs(), 0.0)
    } else {
        (0.0, net_gain)
    }
}
