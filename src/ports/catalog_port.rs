//! Strategy catalog port trait.

use crate::domain::strategy::{AssetClass, RiskLevel, Strategy, StrategyCategory};

/// Optional filters for [`StrategyCatalog::list`]; `None` matches anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrategyFilter {
    pub asset_class: Option<AssetClass>,
    pub risk_level: Option<RiskLevel>,
    pub category: Option<StrategyCategory>,
}

impl StrategyFilter {
    pub fn matches(&self, strategy: &Strategy) -> bool {
        self.asset_class.is_none_or(|c| c == strategy.asset_class)
            && self.risk_level.is_none_or(|r| r == strategy.risk_level)
            && self.category.is_none_or(|c| c == strategy.category)
    }
}

pub trait StrategyCatalog: Sync {
    fn list(&self, filter: &StrategyFilter) -> Vec<Strategy>;

    fn get(&self, id: &str) -> Option<Strategy>;

    /// Strategies applicable to `symbol` given its asset classification.
    fn compatible(&self, symbol: &str) -> Vec<Strategy>;
}
