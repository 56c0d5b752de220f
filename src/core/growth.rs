use super::error::SimResult;
use super::history::{ReturnTable, calendar_year};
use super::types::GrowthConfig;

#[derive(Clone, Copy)]
pub struct GrowthRateResolver<'a> {
    growth: GrowthConfig,
    returns: &'a dyn ReturnTable,
}

impl<'a> GrowthRateResolver<'a> {
    pub fn new(growth: GrowthConfig, returns: &'a dyn ReturnTable) -> Self {
        Self { growth, returns }
    }

    pub fn rate(&self, simulation_year: u32) -> SimResult<f64> {
        match self.growth {
            GrowthConfig::Fixed { rate } => Ok(rate),
            GrowthConfig::HistoricalIndex { start_year, .. } => self
                .returns
                .annual_return(calendar_year(start_year, simulation_year)),
        }
    }
}
