//! In-memory strategy catalog with the built-in demo strategies.

use crate::domain::asset::AssetType;
use crate::domain::strategy::{AssetClass, RiskLevel, Strategy, StrategyCategory};
use crate::ports::catalog_port::{StrategyCatalog, StrategyFilter};

pub struct StaticCatalog {
    strategies: Vec<Strategy>,
}

impl StaticCatalog {
    pub fn new(strategies: Vec<Strategy>) -> Self {
        Self { strategies }
    }

    /// The eight demo strategies, in catalog order.
    pub fn builtin() -> Self {
        Self::new(builtin_strategies())
    }
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[allow(clippy::too_many_arguments)]
fn strategy(
    id: &str,
    name: &str,
    asset_class: AssetClass,
    category: StrategyCategory,
    risk_level: RiskLevel,
    description: &str,
    capital_required: f64,
    max_loss: f64,
    max_profit: f64,
    success_rate: f64,
    avg_return: f64,
) -> Strategy {
    Strategy {
        id: id.to_string(),
        name: name.to_string(),
        asset_class,
        category,
        description: description.to_string(),
        risk_level,
        capital_required,
        max_loss: Some(max_loss),
        max_profit: Some(max_profit),
        success_rate: Some(success_rate),
        avg_return: Some(avg_return),
    }
}

fn builtin_strategies() -> Vec<Strategy> {
    use AssetClass::*;
    use RiskLevel::*;

    vec![
        strategy(
            "long_equity_momentum",
            "Long Equity Momentum",
            Equity,
            StrategyCategory::Long,
            Medium,
            "Buy stocks with RSI momentum above SMA20 on rising volume",
            5000.0, 1000.0, 2500.0, 65.5, 8.2,
        ),
        strategy(
            "short_equity_reversal",
            "Short Equity Mean Reversion",
            Equity,
            StrategyCategory::Short,
            High,
            "Short overbought stocks as price breaks below SMA20",
            10000.0, 2000.0, 3000.0, 58.3, 12.1,
        ),
        strategy(
            "long_call_earnings",
            "Long Call Before Earnings",
            Options,
            StrategyCategory::Long,
            High,
            "Buy ATM calls 2-3 weeks before earnings on high IV rank names",
            2000.0, 2000.0, 8000.0, 45.2, 15.8,
        ),
        strategy(
            "put_credit_spread",
            "Put Credit Spread",
            Options,
            StrategyCategory::Spread,
            Medium,
            "Sell put spreads on bullish stocks with high IV and strong support",
            3000.0, 800.0, 200.0, 78.9, 6.7,
        ),
        strategy(
            "iron_condor_neutral",
            "Iron Condor (Neutral)",
            Options,
            StrategyCategory::IronCondor,
            Medium,
            "Sell iron condors on low volatility stocks expecting sideways movement",
            4000.0, 800.0, 200.0, 72.4, 5.2,
        ),
        strategy(
            "straddle_volatility",
            "Long Straddle (High Vol)",
            Options,
            StrategyCategory::Straddle,
            High,
            "Buy straddles ahead of events expecting a large move",
            3500.0, 3500.0, 15000.0, 42.1, 18.3,
        ),
        strategy(
            "crypto_momentum",
            "Crypto Momentum Trading",
            Crypto,
            StrategyCategory::Long,
            High,
            "Buy crypto assets breaking out with volume confirmation",
            2000.0, 1000.0, 5000.0, 52.8, 22.4,
        ),
        strategy(
            "futures_trend_following",
            "Futures Trend Following",
            Futures,
            StrategyCategory::Long,
            Medium,
            "Follow trends in commodity futures",
            8000.0, 1600.0, 4000.0, 61.7, 11.3,
        ),
    ]
}

impl StrategyCatalog for StaticCatalog {
    fn list(&self, filter: &StrategyFilter) -> Vec<Strategy> {
        self.strategies
            .iter()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect()
    }

    fn get(&self, id: &str) -> Option<Strategy> {
        self.strategies.iter().find(|s| s.id == id).cloned()
    }

    fn compatible(&self, symbol: &str) -> Vec<Strategy> {
        let asset_type = AssetType::classify(symbol);
        let class = AssetClass::for_asset(asset_type);
        let include_equity = asset_type != AssetType::Crypto;

        // catalog order, each strategy at most once
        self.strategies
            .iter()
            .filter(|s| {
                s.asset_class == class || (include_equity && s.asset_class == AssetClass::Equity)
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(strategies: &[Strategy]) -> Vec<&str> {
        strategies.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn builtin_has_eight_unique_strategies() {
        let catalog = StaticCatalog::builtin();
        let all = catalog.list(&StrategyFilter::default());
        assert_eq!(all.len(), 8);
        let mut unique = ids(&all);
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 8);
        assert!(all.iter().all(|s| s.capital_required > 0.0));
    }

    #[test]
    fn get_by_id() {
        let catalog = StaticCatalog::builtin();
        let s = catalog.get("short_equity_reversal").unwrap();
        assert_eq!(s.category, StrategyCategory::Short);
        assert_eq!(s.capital_required, 10000.0);
        assert!(catalog.get("unknown").is_none());
    }

    #[test]
    fn filter_by_asset_class() {
        let catalog = StaticCatalog::builtin();
        let filter = StrategyFilter {
            asset_class: Some(AssetClass::Options),
            ..Default::default()
        };
        assert_eq!(
            ids(&catalog.list(&filter)),
            vec![
                "long_call_earnings",
                "put_credit_spread",
                "iron_condor_neutral",
                "straddle_volatility"
            ]
        );
    }

    #[test]
    fn filters_combine() {
        let catalog = StaticCatalog::builtin();
        let filter = StrategyFilter {
            asset_class: None,
            risk_level: Some(RiskLevel::High),
            category: Some(StrategyCategory::Long),
        };
        assert_eq!(
            ids(&catalog.list(&filter)),
            vec!["long_call_earnings", "crypto_momentum"]
        );
    }

    #[test]
    fn compatible_with_stock_is_equity_only() {
        let catalog = StaticCatalog::builtin();
        assert_eq!(
            ids(&catalog.compatible("AAPL")),
            vec!["long_equity_momentum", "short_equity_reversal"]
        );
    }

    #[test]
    fn compatible_with_crypto_excludes_equity() {
        let catalog = StaticCatalog::builtin();
        assert_eq!(ids(&catalog.compatible("BTC-USD")), vec!["crypto_momentum"]);
    }

    #[test]
    fn compatible_with_future_includes_equity() {
        let catalog = StaticCatalog::builtin();
        assert_eq!(
            ids(&catalog.compatible("GC=F")),
            vec![
                "long_equity_momentum",
                "short_equity_reversal",
                "futures_trend_following"
            ]
        );
    }

    #[test]
    fn compatible_with_option_contract() {
        let catalog = StaticCatalog::builtin();
        let found = catalog.compatible("AAPL240119C00150000");
        assert_eq!(found.len(), 6);
        assert!(found.iter().all(|s| s.asset_class != AssetClass::Crypto));
    }
}
