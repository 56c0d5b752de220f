use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("no historical return for year {year} (known range {min}-{max})")]
    ReturnOutOfRange { year: i32, min: i32, max: i32 },

    #[error("no year-end price for year {year} (known range {min}-{max})")]
    PriceOutOfRange { year: i32, min: i32, max: i32 },

    #[error("stock tracking is only available for historical index growth")]
    StockTrackingRequiresHistoricalGrowth,

    #[error("simulation horizon is empty")]
    EmptyHorizon,
}

pub type SimResult<T> = Result<T, SimError>;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearRangeError {
    #[error("start year must be {min} or later")]
    StartBeforeMinimum { min: i32 },

    #[error("end year must be {max} or earlier")]
    EndAfterMaximum { max: i32 },

    #[error("end year must be greater than or equal to start year")]
    EndBeforeStart,
}
