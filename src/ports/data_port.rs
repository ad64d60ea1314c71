//! Market data port trait.
//!
//! Implementations must be `Sync`; batch runs share one source across
//! worker threads.

use crate::domain::asset::{Asset, Timeframe};
use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait MarketDataPort: Sync {
    /// Assets whose symbol matches `query`, at most `limit` of them.
    fn search_assets(&self, query: &str, limit: usize) -> Result<Vec<Asset>, SigtraderError>;

    fn get_asset(&self, symbol: &str) -> Result<Option<Asset>, SigtraderError>;

    /// Bars for `symbol` with `start_date <= date <= end_date`, ascending by date.
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SigtraderError>;
}
