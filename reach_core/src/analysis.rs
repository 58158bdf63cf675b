//! Post-hoc trajectory helpers: velocity, time normalisation, and movement
//! time outlier removal.

use tracing::info;

use crate::record::Sample;

/// Number of points on the normalised time axis (0.00 ..= 1.00)
pub const NORMALIZED_POINTS: usize = 101;

/// Velocity estimate for one sample
#[derive(Debug, Clone, PartialEq)]
pub struct VelocityRow {
    pub time: f64,
    pub velocity: Vec<f64>, // One entry per input axis
    pub speed: f64,
}

impl VelocityRow {
    fn zero(axes: usize) -> Self {
        Self {
            time: 0.0,
            velocity: vec![0.0; axes],
            speed: 0.0,
        }
    }
}

/// Five-point central difference
/// `(x[i+2] - x[i-2] + x[i+1] - x[i-1]) / (6 * mean_dt)`.
///
/// The two rows at each end cannot be estimated and are all zeros, time
/// included. Fewer than five samples give all-zero rows.
pub fn velocity(time: &[f64], axes: &[&[f64]]) -> Vec<VelocityRow> {
    let n = time.len();
    let mut rows = vec![VelocityRow::zero(axes.len()); n];
    if n < 5 {
        return rows;
    }

    let mean_dt = (time[n - 1] - time[0]) / (n - 1) as f64;
    for i in 2..n - 2 {
        let velocity: Vec<f64> = axes
            .iter()
            .map(|x| (x[i + 2] - x[i - 2] + x[i + 1] - x[i - 1]) / (6.0 * mean_dt))
            .collect();
        let speed = velocity.iter().map(|v| v * v).sum::<f64>().sqrt();
        rows[i] = VelocityRow {
            time: time[i],
            velocity,
            speed,
        };
    }
    rows
}

/// Cursor velocity of a recorded reach
pub fn trajectory_velocity(samples: &[Sample]) -> Vec<VelocityRow> {
    let time: Vec<f64> = samples.iter().map(|s| s.time).collect();
    let x: Vec<f64> = samples.iter().map(|s| f64::from(s.cursor_x)).collect();
    let y: Vec<f64> = samples.iter().map(|s| f64::from(s.cursor_y)).collect();
    velocity(&time, &[x.as_slice(), y.as_slice()])
}

/// A sample on the normalised time axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedSample {
    pub norm_time: f64,
    pub time: f64,
    pub cursor_x: f64,
    pub cursor_y: f64,
}

/// Width of one normalised time bin, in nanoseconds of pseudo-time
const BIN_NS: u128 = 10_000_000;

/// Put the reach on a 101-point normalised time axis so reaches of
/// different length line up.
///
/// Sample `i` of `n` is placed at pseudo-time `i / (n - 1)` seconds and
/// dropped into 10 ms bin `floor(t / 10 ms)`; the last sample lands in bin
/// 100. Each bin holds the mean of its samples. Bins without samples are
/// linearly interpolated between their filled neighbours, and held flat
/// past the last filled bin.
pub fn normalize_time(samples: &[Sample]) -> Vec<NormalizedSample> {
    let n = samples.len();
    if n == 0 {
        return Vec::new();
    }

    let span = (n - 1).max(1) as u128;
    let mut sums = [([0.0f64; 3], 0u32); NORMALIZED_POINTS];
    for (i, sample) in samples.iter().enumerate() {
        let bin = ((i as u128 * 1_000_000_000 / span) / BIN_NS) as usize;
        let (acc, count) = &mut sums[bin.min(NORMALIZED_POINTS - 1)];
        acc[0] += sample.time;
        acc[1] += f64::from(sample.cursor_x);
        acc[2] += f64::from(sample.cursor_y);
        *count += 1;
    }
    let means: Vec<Option<[f64; 3]>> = sums
        .iter()
        .map(|(acc, count)| (*count > 0).then(|| acc.map(|v| v / f64::from(*count))))
        .collect();

    let mut last: Option<(usize, [f64; 3])> = None;
    let mut binned = [[0.0f64; 3]; NORMALIZED_POINTS];
    for (k, mean) in means.iter().enumerate() {
        let Some(value) = *mean else {
            continue;
        };
        binned[k] = value;
        if let Some((p, prev)) = last {
            for (gap, slot) in binned.iter_mut().enumerate().take(k).skip(p + 1) {
                let w = (gap - p) as f64 / (k - p) as f64;
                *slot = [0, 1, 2].map(|c| prev[c] + (value[c] - prev[c]) * w);
            }
        }
        last = Some((k, value));
    }
    if let Some((p, value)) = last {
        binned[p + 1..].fill(value);
    }

    binned
        .iter()
        .enumerate()
        .map(|(k, [time, cursor_x, cursor_y])| NormalizedSample {
            norm_time: k as f64 / (NORMALIZED_POINTS - 1) as f64,
            time: *time,
            cursor_x: *cursor_x,
            cursor_y: *cursor_y,
        })
        .collect()
}

/// Trials kept and removed by the outlier check
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutlierSplit {
    pub kept: Vec<usize>,
    pub removed: Vec<usize>,
}

/// Flag trials whose movement time is more than three (population) standard
/// deviations from the mean. Input pairs are (trial id, movement time).
pub fn remove_outliers(movement_times: &[(usize, f64)]) -> OutlierSplit {
    let mut split = OutlierSplit::default();
    if movement_times.is_empty() {
        return split;
    }

    let n = movement_times.len() as f64;
    let mean = movement_times.iter().map(|(_, t)| t).sum::<f64>() / n;
    let var = movement_times
        .iter()
        .map(|(_, t)| (t - mean).powi(2))
        .sum::<f64>()
        / n;
    let std = var.sqrt();

    for &(trial, t) in movement_times {
        if std > 0.0 && (t - mean).abs() / std > 3.0 {
            split.removed.push(trial);
        } else {
            split.kept.push(trial);
        }
    }

    info!(removed = ?split.removed, "Movement time outliers");
    split
}
