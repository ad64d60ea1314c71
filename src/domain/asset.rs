//! Tradable asset metadata and bar timeframes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Stock,
    Crypto,
    Future,
    Option,
}

impl AssetType {
    /// Infer the asset type from ticker conventions: `BTC-USD` is crypto,
    /// `GC=F` a future, long alphanumeric tickers are option contracts.
    pub fn classify(symbol: &str) -> Self {
        if symbol.ends_with("-USD") || symbol.ends_with("USD") {
            AssetType::Crypto
        } else if symbol.contains("=F") {
            AssetType::Future
        } else if symbol.len() > 5 && symbol.chars().any(|c| c.is_ascii_digit()) {
            AssetType::Option
        } else {
            AssetType::Stock
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssetType::Stock => "stock",
            AssetType::Crypto => "crypto",
            AssetType::Future => "future",
            AssetType::Option => "option",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub symbol: String,
    pub name: String,
    pub asset_type: AssetType,
    pub exchange: Option<String>,
    pub sector: Option<String>,
}

impl Asset {
    /// Minimal asset record when only the ticker is known.
    pub fn from_symbol(symbol: &str) -> Self {
        Asset {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            asset_type: AssetType::classify(symbol),
            exchange: None,
            sector: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
    #[serde(rename = "1w")]
    W1,
    #[serde(rename = "1M")]
    M1,
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
            Timeframe::W1 => "1w",
            Timeframe::M1 => "1M",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1h" => Ok(Timeframe::H1),
            "4h" => Ok(Timeframe::H4),
            "1d" => Ok(Timeframe::D1),
            "1w" => Ok(Timeframe::W1),
            "1M" => Ok(Timeframe::M1),
            other => Err(format!("unknown timeframe '{other}'")),
        }
    }
}
