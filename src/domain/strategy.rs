//! Strategy descriptors as served by the strategy catalog.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::asset::AssetType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Equity,
    Options,
    Futures,
    Crypto,
}

impl AssetClass {
    /// The strategy asset class matching a ticker's asset type.
    pub fn for_asset(asset_type: AssetType) -> Self {
        match asset_type {
            AssetType::Stock => AssetClass::Equity,
            AssetType::Crypto => AssetClass::Crypto,
            AssetType::Future => AssetClass::Futures,
            AssetType::Option => AssetClass::Options,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyCategory {
    Long,
    Short,
    Spread,
    Straddle,
    Strangle,
    IronCondor,
}

impl StrategyCategory {
    /// Neutral categories are forecast-only and never enter simulated trades.
    pub fn is_directional(self) -> bool {
        matches!(self, StrategyCategory::Long | StrategyCategory::Short)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub id: String,
    pub name: String,
    pub asset_class: AssetClass,
    pub category: StrategyCategory,
    pub description: String,
    pub risk_level: RiskLevel,
    pub capital_required: f64,
    pub max_loss: Option<f64>,
    pub max_profit: Option<f64>,
    pub success_rate: Option<f64>,
    pub avg_return: Option<f64>,
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssetClass::Equity => "equity",
            AssetClass::Options => "options",
            AssetClass::Futures => "futures",
            AssetClass::Crypto => "crypto",
        };
        write!(f, "{s}")
    }
}

impl FromStr for AssetClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "equity" => Ok(AssetClass::Equity),
            "options" => Ok(AssetClass::Options),
            "futures" => Ok(AssetClass::Futures),
            "crypto" => Ok(AssetClass::Crypto),
            other => Err(format!("unknown asset class '{other}'")),
        }
    }
}

impl fmt::Display for StrategyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StrategyCategory::Long => "long",
            StrategyCategory::Short => "short",
            StrategyCategory::Spread => "spread",
            StrategyCategory::Straddle => "straddle",
            StrategyCategory::Strangle => "strangle",
            StrategyCategory::IronCondor => "iron_condor",
        };
        write!(f, "{s}")
    }
}

impl FromStr for StrategyCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "long" => Ok(StrategyCategory::Long),
            "short" => Ok(StrategyCategory::Short),
            "spread" => Ok(StrategyCategory::Spread),
            "straddle" => Ok(StrategyCategory::Straddle),
            "strangle" => Ok(StrategyCategory::Strangle),
            "iron_condor" => Ok(StrategyCategory::IronCondor),
            other => Err(format!("unknown strategy category '{other}'")),
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        };
        write!(f, "{s}")
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(format!("unknown risk level '{other}'")),
        }
    }
}
