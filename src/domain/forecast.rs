//! Forward-looking trade forecasts for one strategy on one symbol.
//!
//! Rule checks, entry and exit levels and the expected return are pure
//! functions of the price history. The confidence score and win
//! probability add a bounded jitter drawn from the caller's random source,
//! so a seeded generator reproduces a forecast exactly.

use chrono::NaiveDate;
use rand::Rng;
use serde::Serialize;

use super::backtest::validate_bars;
use super::error::SigtraderError;
use super::indicator::rsi::RsiZeroLoss;
use super::indicator::{compute_snapshots, IndicatorSnapshot, SMA_SLOW_PERIOD};
use super::ohlcv::OhlcvBar;
use super::strategy::{RiskLevel, Strategy, StrategyCategory};

/// Forecasts read the same 50-bar indicator set as the technical snapshot.
pub const FORECAST_MIN_BARS: usize = SMA_SLOW_PERIOD;

const VOLUME_SURGE_RATIO: f64 = 1.2;
const LOW_VOLATILITY: f64 = 0.02;
const DEFAULT_SUCCESS_RATE: f64 = 50.0;
const DEFAULT_AVG_RETURN_PCT: f64 = 5.0;
const DEFAULT_MAX_LOSS: f64 = 1000.0;
const CONFIDENCE_JITTER: f64 = 10.0;
const WIN_PROBABILITY_JITTER: f64 = 5.0;
const INVALID_SETUP_PENALTY: f64 = 30.0;

/// Outcome of the per-category technical rule checks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleCheck {
    pub is_valid: bool,
    pub conditions_met: Vec<String>,
    /// 25 points per satisfied condition.
    pub score: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastFeatures {
    /// Fractional close change over the last 20 bars.
    pub price_momentum: f64,
    pub rsi: f64,
    /// Last bar's volume over the trailing 10-bar mean.
    pub volume_ratio: f64,
    /// Population stdev over mean of the last 20 closes.
    pub volatility: f64,
    /// |SMA20 - SMA50| / SMA50.
    pub trend_strength: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub strategy: Strategy,
    pub symbol: String,
    pub as_of: NaiveDate,
    pub current_price: f64,
    pub is_valid: bool,
    pub confidence: f64,
    /// Dollar return on the strategy's capital requirement.
    pub expected_return: f64,
    pub reward_risk_ratio: f64,
    pub win_probability: f64,
    pub entry_points: Vec<f64>,
    pub exit_points: Vec<f64>,
    pub reasoning: String,
    pub technical_conditions: Vec<String>,
    pub features: ForecastFeatures,
}

pub fn generate_forecast<R: Rng>(
    symbol: &str,
    strategy: &Strategy,
    bars: &[OhlcvBar],
    zero_loss: RsiZeroLoss,
    rng: &mut R,
) -> Result<Forecast, SigtraderError> {
    if bars.len() < FORECAST_MIN_BARS {
        return Err(SigtraderError::InsufficientData {
            symbol: symbol.to_string(),
            bars: bars.len(),
            minimum: FORECAST_MIN_BARS,
        });
    }
    validate_bars(bars)?;

    let snapshots = compute_snapshots(bars, zero_loss);
    let (Some(last_bar), Some(snapshot)) = (bars.last(), snapshots.last()) else {
        return Err(SigtraderError::InsufficientData {
            symbol: symbol.to_string(),
            bars: 0,
            minimum: FORECAST_MIN_BARS,
        });
    };
    let current_price = last_bar.close;

    let rules = check_technical_rules(strategy.category, bars, snapshot);
    let features = extract_features(bars, snapshot);
    let model_score = model_confidence(strategy, &features, rng);
    let confidence = if rules.is_valid {
        model_score
    } else {
        (model_score - INVALID_SETUP_PENALTY).max(0.0)
    };

    let entries = entry_points(strategy.category, current_price, snapshot.sma20);
    let exits = exit_points(strategy.category, &entries);
    let expected = expected_return(strategy, current_price, &entries, model_score);
    let max_loss = strategy
        .max_loss
        .filter(|loss| *loss != 0.0)
        .unwrap_or(DEFAULT_MAX_LOSS);
    let jitter = rng.gen_range(-WIN_PROBABILITY_JITTER..=WIN_PROBABILITY_JITTER);
    let win_probability = (confidence * 0.8 + jitter).clamp(5.0, 95.0);

    Ok(Forecast {
        reasoning: reasoning(strategy, symbol, &rules, model_score),
        strategy: strategy.clone(),
        symbol: symbol.to_string(),
        as_of: last_bar.date,
        current_price,
        is_valid: rules.is_valid,
        confidence,
        expected_return: expected,
        reward_risk_ratio: (expected / max_loss).abs(),
        win_probability,
        entry_points: entries,
        exit_points: exits,
        technical_conditions: rules.conditions_met,
        features,
    })
}

/// Highest confidence first.
pub fn rank_forecasts(forecasts: &mut [Forecast]) {
    forecasts.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
}

/// Checks the latest bar against the category's setup conditions.
///
/// Long setups need two of RSI momentum, price above SMA20 and a volume
/// surge. Short setups need one of overbought RSI or price below SMA20.
/// Spread and iron condor setups need one of neutral RSI or low
/// volatility. Straddles and strangles have no rules and are never valid.
pub fn check_technical_rules(
    category: StrategyCategory,
    bars: &[OhlcvBar],
    snapshot: &IndicatorSnapshot,
) -> RuleCheck {
    let mut conditions = Vec::new();
    let current = bars.last().map_or(0.0, |b| b.close);

    let is_valid = match category {
        StrategyCategory::Long => {
            if let Some(rsi) = snapshot.rsi.filter(|r| *r > 50.0) {
                conditions.push(format!("RSI ({rsi:.1}) above 50 - bullish momentum"));
            }
            if let Some(sma) = snapshot.sma20.filter(|s| current > *s) {
                conditions.push(format!("Price above SMA20 ({sma:.2}) - uptrend"));
            }
            if snapshot
                .volume
                .is_some_and(|v| v.is_surge(VOLUME_SURGE_RATIO))
            {
                conditions.push("Above average volume - strong interest".to_string());
            }
            conditions.len() >= 2
        }
        StrategyCategory::Short => {
            if let Some(rsi) = snapshot.rsi.filter(|r| *r > 70.0) {
                conditions.push(format!("RSI ({rsi:.1}) overbought - reversal signal"));
            }
            if let Some(sma) = snapshot.sma20.filter(|s| current < *s) {
                conditions.push(format!("Price below SMA20 ({sma:.2}) - downtrend"));
            }
            !conditions.is_empty()
        }
        StrategyCategory::Spread | StrategyCategory::IronCondor => {
            if let Some(rsi) = snapshot.rsi.filter(|r| (40.0..=60.0).contains(r)) {
                conditions.push(format!("RSI ({rsi:.1}) neutral - sideways movement expected"));
            }
            if bars.len() >= 20 && relative_volatility(&closes(&bars[bars.len() - 20..])) < LOW_VOLATILITY
            {
                conditions.push("Low volatility environment - good for neutral strategies".to_string());
            }
            !conditions.is_empty()
        }
        StrategyCategory::Straddle | StrategyCategory::Strangle => false,
    };

    RuleCheck {
        is_valid,
        score: conditions.len() as u32 * 25,
        conditions_met: conditions,
    }
}

pub fn extract_features(bars: &[OhlcvBar], snapshot: &IndicatorSnapshot) -> ForecastFeatures {
    let n = bars.len();
    let current = bars.last().map_or(0.0, |b| b.close);

    let price_momentum = if n >= 20 {
        let base = bars[n - 20].close;
        (current - base) / base
    } else {
        0.0
    };

    let volume_ratio = if n >= 10 {
        let mean = bars[n - 10..].iter().map(|b| b.volume as f64).sum::<f64>() / 10.0;
        if mean > 0.0 {
            bars[n - 1].volume as f64 / mean
        } else {
            1.0
        }
    } else {
        1.0
    };

    let volatility = if n >= 20 {
        relative_volatility(&closes(&bars[n - 20..]))
    } else {
        LOW_VOLATILITY
    };

    let trend_strength = match (snapshot.sma20, snapshot.sma50) {
        (Some(fast), Some(slow)) if slow != 0.0 => (fast - slow).abs() / slow,
        _ => 0.0,
    };

    ForecastFeatures {
        price_momentum,
        rsi: snapshot.rsi.unwrap_or(50.0),
        volume_ratio,
        volatility,
        trend_strength,
    }
}

/// Strategy base rate adjusted by feature boosts, plus ±10 jitter,
/// clamped to [5, 95].
pub fn model_confidence<R: Rng>(strategy: &Strategy, features: &ForecastFeatures, rng: &mut R) -> f64 {
    let mut confidence = strategy.success_rate.unwrap_or(DEFAULT_SUCCESS_RATE);

    match strategy.category {
        StrategyCategory::Long => {
            if features.price_momentum > 0.05 {
                confidence += 10.0;
            }
            if features.rsi > 60.0 {
                confidence += 5.0;
            }
            if features.volume_ratio > 1.5 {
                confidence += 8.0;
            }
        }
        StrategyCategory::Short => {
            if features.price_momentum < -0.05 {
                confidence += 10.0;
            }
            if features.rsi > 70.0 {
                confidence += 15.0;
            }
        }
        _ => {}
    }

    let jitter = rng.gen_range(-CONFIDENCE_JITTER..=CONFIDENCE_JITTER);
    (confidence + jitter).clamp(5.0, 95.0)
}

/// Up to three suggested entry prices, ascending.
pub fn entry_points(category: StrategyCategory, current_price: f64, sma20: Option<f64>) -> Vec<f64> {
    let mut points: Vec<f64> = match category {
        StrategyCategory::Long => {
            let mut points: Vec<f64> = [0.99, 0.975, 0.96].iter().map(|m| current_price * m).collect();
            points.extend(sma20);
            points
        }
        StrategyCategory::Short => [1.01, 1.025, 1.04].iter().map(|m| current_price * m).collect(),
        _ => [0.995, 1.0, 1.005].iter().map(|m| current_price * m).collect(),
    };
    points.sort_by(f64::total_cmp);
    points.truncate(3);
    points
}

/// 5/10/15% profit targets from the mean entry. Non-directional
/// categories have none.
pub fn exit_points(category: StrategyCategory, entries: &[f64]) -> Vec<f64> {
    if entries.is_empty() {
        return Vec::new();
    }
    let avg_entry = entries.iter().sum::<f64>() / entries.len() as f64;
    let multipliers: &[f64] = match category {
        StrategyCategory::Long => &[1.05, 1.10, 1.15],
        StrategyCategory::Short => &[0.95, 0.90, 0.85],
        _ => &[],
    };
    multipliers.iter().map(|m| avg_entry * m).collect()
}

/// Dollar return on `capital_required`, rounded to cents.
pub fn expected_return(strategy: &Strategy, current_price: f64, entries: &[f64], confidence: f64) -> f64 {
    if entries.is_empty() || current_price == 0.0 {
        return 0.0;
    }
    let base_return = strategy.avg_return.unwrap_or(DEFAULT_AVG_RETURN_PCT);
    let avg_entry = entries.iter().sum::<f64>() / entries.len() as f64;
    let entry_advantage = (current_price - avg_entry).abs() / current_price;
    let return_pct = base_return * (confidence / 100.0) * (1.0 + entry_advantage * 10.0);
    let dollars = strategy.capital_required * return_pct / 100.0;
    (dollars * 100.0).round() / 100.0
}

fn reasoning(strategy: &Strategy, symbol: &str, rules: &RuleCheck, confidence: f64) -> String {
    let mut parts = vec![format!("Analyzing {} for {}.", strategy.name, symbol)];

    if rules.is_valid {
        parts.push("Technical conditions are favorable:".to_string());
        parts.extend(rules.conditions_met.iter().map(|c| format!("- {c}")));
    } else {
        parts.push("Technical conditions are not fully aligned with strategy requirements.".to_string());
    }

    parts.push(if confidence > 70.0 {
        format!("Model confidence is high ({confidence:.1}%) based on historical patterns.")
    } else if confidence > 50.0 {
        format!("Model confidence is moderate ({confidence:.1}%) with mixed signals.")
    } else {
        format!("Model confidence is low ({confidence:.1}%) due to unfavorable conditions.")
    });

    match strategy.risk_level {
        RiskLevel::High => parts.push(
            "This is a high-risk strategy requiring careful position sizing and risk management."
                .to_string(),
        ),
        RiskLevel::Low => {
            parts.push("This is a conservative strategy suitable for risk-averse traders.".to_string())
        }
        RiskLevel::Medium => {}
    }

    parts.join(" ")
}

fn closes(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

fn relative_volatility(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() / mean
}
