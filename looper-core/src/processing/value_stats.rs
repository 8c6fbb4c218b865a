use crate::models::audio_models::DurationStats;

/// Fixed-capacity ring of values with aggregate statistics on demand.
///
/// `insert` never allocates, so it is safe to call from the audio callback.
/// `stats` sorts a copy and belongs on the control plane.
#[derive(Debug, Clone)]
pub struct ValueStats {
    values: Vec<f64>,
    next: usize,
    count: usize,
}

impl ValueStats {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: vec![0.0; capacity.max(1)],
            next: 0,
            count: 0,
        }
    }

    /// Record a value, overwriting the oldest once full.
    pub fn insert(&mut self, value: f64) {
        self.values[self.next] = value;
        self.next = (self.next + 1) % self.values.len();
        self.count = (self.count + 1).min(self.values.len());
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    /// Mean, max, population standard deviation and 99th percentile of the
    /// retained values. All zero when nothing has been recorded.
    pub fn stats(&self) -> DurationStats {
        if self.count == 0 {
            return DurationStats::default();
        }

        let values = &self.values[..self.count];
        let n = self.count as f64;
        let mean = values.iter().sum::<f64>() / n;
        let max = values.iter().copied().fold(f64::MIN, f64::max);
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        DurationStats {
            mean,
            max,
            std: variance.sqrt(),
            p99: percentile(values, 99.0),
        }
    }

    pub fn clear(&mut self) {
        self.next = 0;
        self.count = 0;
    }
}

/// Percentile with linear interpolation between the closest ranks.
fn percentile(values: &[f64], pct: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}
