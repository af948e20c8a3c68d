//! Barbell plate calculator.

use serde::Serialize;

/// Remainders at or below this are treated as loaded exactly
const TOLERANCE: f64 = 0.1;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlateCount {
    pub weight: f64,
    pub count: u32,
}

/// Plates to load on each side of the bar to reach `target`
///
/// Greedy from the heaviest plate down. Returns an empty list when the target
/// is at or below the bar weight, or cannot be reached with `available`.
pub fn calculate_plates(target: f64, bar: f64, available: &[f64]) -> Vec<PlateCount> {
    let mut plates: Vec<f64> = available.iter().copied().filter(|p| *p > 0.0).collect();
    plates.sort_by(|a, b| b.total_cmp(a));
    plates.dedup();

    let mut remaining = ((target - bar) / 2.0).max(0.0);
    let mut out = Vec::new();

    for plate in plates {
        if remaining >= plate {
            let count = (remaining / plate).floor();
            remaining -= count * plate;
            out.push(PlateCount {
                weight: plate,
                count: count as u32,
            });
        }
    }

    if remaining > TOLERANCE {
        tracing::debug!("{} is not reachable ({} left per side)", target, remaining);
        out.clear();
    }
    out
}

/// Total weight loaded by `plates` on both sides plus the bar
pub fn loaded_weight(bar: f64, plates: &[PlateCount]) -> f64 {
    bar + plates.iter().map(|p| p.weight * f64::from(p.count) * 2.0).sum::<f64>()
}
