//! Trailing volume statistics used for volume-surge confirmation.

use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeStats {
    /// Mean volume over the trailing `recent_window` bars ending at this bar.
    pub recent_mean: f64,
    /// Mean volume over every bar up to and including this one.
    pub baseline_mean: f64,
}

impl VolumeStats {
    pub fn is_surge(&self, ratio: f64) -> bool {
        self.recent_mean > ratio * self.baseline_mean
    }
}

/// One entry per bar; `None` until `recent_window` bars are available.
pub fn calculate_volume_stats(bars: &[OhlcvBar], recent_window: usize) -> Vec<Option<VolumeStats>> {
    let mut out = Vec::with_capacity(bars.len());
    let mut cumulative = 0.0_f64;

    for (i, bar) in bars.iter().enumerate() {
        cumulative += bar.volume as f64;
        if recent_window == 0 || i + 1 < recent_window {
            out.push(None);
            continue;
        }
        let recent_sum: f64 = bars[i + 1 - recent_window..=i]
            .iter()
            .map(|b| b.volume as f64)
            .sum();
        out.push(Some(VolumeStats {
            recent_mean: recent_sum / recent_window as f64,
            baseline_mean: cumulative / (i + 1) as f64,
        }));
    }

    out
}
