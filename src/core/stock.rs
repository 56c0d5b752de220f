use super::error::{SimError, SimResult};
use super::history::{PriceTable, calendar_year};
use super::types::{
    GrowthConfig, SimulationInputs, StockTracking, StockYearData, System1Year, System2Year,
    System3Year, YearRecord, YearlyResult,
};

#[derive(Clone, Copy)]
pub struct RegimeSeries<'a> {
    pub benchmark: &'a [YearlyResult],
    pub system1: &'a [System1Year],
    pub system2: &'a [System2Year],
    pub system3: &'a [System3Year],
}

pub fn compute_stock_tracking(
    inputs: &SimulationInputs,
    series: RegimeSeries<'_>,
    prices: &dyn PriceTable,
) -> SimResult<StockTracking> {
    let GrowthConfig::HistoricalIndex { start_year, .. } = inputs.growth else {
        return Err(SimError::StockTrackingRequiresHistoricalGrowth);
    };

    let initial_price = prices.year_end_price(calendar_year(start_year, 0))?;
    Ok(StockTracking {
        initial_price,
        initial_shares: inputs.initial_sum / initial_price,
        benchmark: share_series(series.benchmark, start_year, prices)?,
        system1: share_series(series.system1, start_year, prices)?,
        system2: share_series(series.system2, start_year, prices)?,
        system3: share_series(series.system3, start_year, prices)?,
    })
}

fn share_series<R: YearRecord>(
    rows: &[R],
    start_year: i32,
    prices: &dyn PriceTable,
) -> SimResult<Vec<StockYearData>> {
    rows.iter()
        .map(|row| {
            let row = row.base();
            let calendar_year = calendar_year(start_year, row.year);
            let stock_price = prices.year_end_price(calendar_year)?;
            Ok(StockYearData {
                year: row.year,
                calendar_year,
                stock_price,
                shares_owned: row.end_balance / stock_price,
                shares_bought: row.deposits / stock_price,
                shares_sold: row.tax_paid / stock_price,
            })
        })
        .collect()
}
