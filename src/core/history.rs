use super::error::{SimError, SimResult, YearRangeError};

pub const SP500_MIN_YEAR: i32 = 1928;
pub const SP500_MAX_YEAR: i32 = 2026;

/// Year-end close of 1927, the anchor for reconstructed year-end prices.
const SP500_BASE_CLOSE: f64 = 17.66;

/// Annual S&P 500 price returns from 1928 through 2026, as decimal fractions.
const SP500_RETURNS: [f64; (SP500_MAX_YEAR - SP500_MIN_YEAR + 1) as usize] = [
    0.3788, -0.1191, // 1928-1929
    -0.2848, -0.4707, -0.1515, 0.4659, -0.0594, 0.4137, 0.2792, -0.3859, 0.2521, -0.0545,
    -0.1529, -0.1786, 0.1243, 0.1945, 0.138, 0.3072, -0.1187, 0.0, -0.0065, 0.1026,
    0.2178, 0.1646, 0.1178, -0.0662, 0.4502, 0.264, 0.0262, -0.1431, 0.3806, 0.0848,
    -0.0297, 0.2313, -0.1181, 0.1889, 0.1297, 0.0906, -0.1309, 0.2009, 0.0766, -0.1136,
    0.001, 0.1079, 0.1563, -0.1737, -0.2972, 0.3155, 0.1915, -0.115, 0.0106, 0.1231,
    0.2577, -0.0973, 0.1476, 0.1727, 0.014, 0.2633, 0.1462, 0.0203, 0.124, 0.2725,
    -0.0656, 0.2631, 0.0446, 0.0706, -0.0154, 0.3411, 0.2026, 0.3101, 0.2667, 0.1953,
    -0.1014, -0.1304, -0.2337, 0.2638, 0.0899, 0.03, 0.1362, 0.0353, -0.3849, 0.2345,
    0.1278, 0.0, 0.1341, 0.296, 0.1139, -0.0073, 0.0954, 0.1942, -0.0624, 0.2888,
    0.1626, 0.2689, -0.1944, 0.2423, 0.2331, 0.1639, 0.0099, // 2020-2026
];

pub trait ReturnTable {
    fn annual_return(&self, calendar_year: i32) -> SimResult<f64>;
}

pub trait PriceTable {
    fn year_end_price(&self, calendar_year: i32) -> SimResult<f64>;
}

/// Bundled S&P 500 history. Returns cover 1928-2026; year-end prices cover
/// 1927-2026 and are compounded from the 1927 close.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sp500History;

impl ReturnTable for Sp500History {
    fn annual_return(&self, calendar_year: i32) -> SimResult<f64> {
        if !(SP500_MIN_YEAR..=SP500_MAX_YEAR).contains(&calendar_year) {
            return Err(SimError::ReturnOutOfRange {
                year: calendar_year,
                min: SP500_MIN_YEAR,
                max: SP500_MAX_YEAR,
            });
        }
        Ok(SP500_RETURNS[(calendar_year - SP500_MIN_YEAR) as usize])
    }
}

impl PriceTable for Sp500History {
    fn year_end_price(&self, calendar_year: i32) -> SimResult<f64> {
        let min = SP500_MIN_YEAR - 1;
        if !(min..=SP500_MAX_YEAR).contains(&calendar_year) {
            return Err(SimError::PriceOutOfRange {
                year: calendar_year,
                min,
                max: SP500_MAX_YEAR,
            });
        }
        let elapsed = (calendar_year - min) as usize;
        Ok(SP500_RETURNS[..elapsed]
            .iter()
            .fold(SP500_BASE_CLOSE, |price, r| price * (1.0 + r)))
    }
}

pub fn validate_year_range(start_year: i32, end_year: i32) -> Result<(), YearRangeError> {
    if start_year < SP500_MIN_YEAR {
        return Err(YearRangeError::StartBeforeMinimum {
            min: SP500_MIN_YEAR,
        });
    }
    if end_year > SP500_MAX_YEAR {
        return Err(YearRangeError::EndAfterMaximum {
            max: SP500_MAX_YEAR,
        });
    }
    if end_year < start_year {
        return Err(YearRangeError::EndBeforeStart);
    }
    Ok(())
}

pub fn years_from_range(start_year: i32, end_year: i32) -> u32 {
    (i64::from(end_year) - i64::from(start_year) + 1).clamp(0, i64::from(u32::MAX)) as u32
}

// Saturates at the i32 bounds, which no table covers, so overflow surfaces as
// an out-of-range lookup.
pub(crate) fn calendar_year(start_year: i32, simulation_year: u32) -> i32 {
    (i64::from(start_year) + i64::from(simulation_year) - 1)
        .clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
pub(crate) struct ScriptedHistory {
    pub first_year: i32,
    pub returns: Vec<f64>,
    /// Year-end prices starting at `first_year - 1`.
    pub prices: Vec<f64>,
}

#[cfg(test)]
impl ScriptedHistory {
    pub fn from_returns(first_year: i32, returns: Vec<f64>) -> Self {
        Self {
            first_year,
            returns,
            prices: Vec::new(),
        }
    }
}

#[cfg(test)]
impl ReturnTable for ScriptedHistory {
    fn annual_return(&self, calendar_year: i32) -> SimResult<f64> {
        usize::try_from(calendar_year - self.first_year)
            .ok()
            .and_then(|idx| self.returns.get(idx).copied())
            .ok_or(SimError::ReturnOutOfRange {
                year: calendar_year,
                min: self.first_year,
                max: self.first_year + self.returns.len() as i32 - 1,
            })
    }
}

#[cfg(test)]
impl PriceTable for ScriptedHistory {
    fn year_end_price(&self, calendar_year: i32) -> SimResult<f64> {
        let min = self.first_year - 1;
        usize::try_from(calendar_year - min)
            .ok()
            .and_then(|idx| self.prices.get(idx).copied())
            .ok_or(SimError::PriceOutOfRange {
                year: calendar_year,
                min,
                max: min + self.prices.len() as i32 - 1,
            })
    }
}
