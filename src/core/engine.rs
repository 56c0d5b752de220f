use super::benchmark::calculate_benchmark;
use super::error::{SimError, SimResult};
use super::history::{PriceTable, ReturnTable, Sp500History};
use super::stock::{RegimeSeries, compute_stock_tracking};
use super::system1::calculate_system1;
use super::system2::calculate_system2;
use super::system3::calculate_system3;
use super::types::{
    BenchmarkSummary, SimulationInputs, SimulationOutput, SimulationSummary, SystemSummary,
    TaxSystemsConfig, YearRecord,
};

pub fn run_simulation(
    inputs: &SimulationInputs,
    config: &TaxSystemsConfig,
) -> SimResult<SimulationOutput> {
    run_simulation_with(inputs, config, &Sp500History, &Sp500History)
}

pub fn run_simulation_with(
    inputs: &SimulationInputs,
    config: &TaxSystemsConfig,
    returns: &dyn ReturnTable,
    prices: &dyn PriceTable,
) -> SimResult<SimulationOutput> {
    let horizon = inputs.horizon_years();
    if horizon == 0 {
        return Err(SimError::EmptyHorizon);
    }
    log::debug!(
        "Simulating {horizon} years: initial {}, monthly deposit {}, growth {:?}",
        inputs.initial_sum,
        inputs.monthly_deposit,
        inputs.growth
    );

    let benchmark = calculate_benchmark(inputs, returns)?;
    let system1 = calculate_system1(inputs, &config.system1, returns)?;
    let system2 = calculate_system2(inputs, &config.system2, returns)?;
    let system3 = calculate_system3(inputs, &config.system3, returns)?;

    let benchmark_final = final_balance(&benchmark);
    let summary = SimulationSummary {
        benchmark: BenchmarkSummary {
            final_balance: benchmark_final,
        },
        system1: summarize(&system1, benchmark_final),
        system2: summarize(&system2, benchmark_final),
        system3: summarize(&system3, benchmark_final),
    };
    log::debug!(
        "Final balances: benchmark {:.2}, system1 {:.2}, system2 {:.2}, system3 {:.2}",
        summary.benchmark.final_balance,
        summary.system1.final_balance,
        summary.system2.final_balance,
        summary.system3.final_balance
    );

    let stock_tracking = if inputs.growth.is_historical() {
        log::debug!("Historical growth, computing stock tracking");
        let series = RegimeSeries {
            benchmark: &benchmark,
            system1: &system1,
            system2: &system2,
            system3: &system3,
        };
        Some(compute_stock_tracking(inputs, series, prices)?)
    } else {
        None
    };

    Ok(SimulationOutput {
        benchmark,
        system1,
        system2,
        system3,
        summary,
        stock_tracking,
    })
}

fn final_balance<R: YearRecord>(rows: &[R]) -> f64 {
    rows.last().map_or(0.0, |row| row.base().end_balance)
}

fn summarize<R: YearRecord>(rows: &[R], benchmark_final: f64) -> SystemSummary {
    let final_balance = final_balance(rows);
    SystemSummary {
        final_balance,
        total_tax_paid: rows.iter().map(|row| row.base().tax_paid).sum(),
        efficiency_score: final_balance / benchmark_final * 100.0,
    }
}
