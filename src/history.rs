use std::collections::{BTreeMap, VecDeque};

use crate::snapshot::Snapshot;

/// Chart window used by the dashboard.
pub const DEFAULT_WINDOW: usize = 30;

/// Bounded rolling price history backing the client trend chart.
///
/// One label sequence (timestamps) plus one price sequence per tracked
/// asset, all kept the same length and index-aligned. Oldest entries are
/// evicted FIFO once the window is full. Pure state, no I/O: feed it
/// snapshots as they arrive on the push channel.
#[derive(Debug)]
pub struct RollingHistory {
    window: usize,
    labels: VecDeque<String>,
    series: BTreeMap<String, VecDeque<f64>>,
}

impl RollingHistory {
    pub fn new(assets: impl IntoIterator<Item = String>, window: usize) -> Self {
        RollingHistory {
            window,
            labels: VecDeque::with_capacity(window),
            series: assets
                .into_iter()
                .map(|id| (id, VecDeque::with_capacity(window)))
                .collect(),
        }
    }

    /// Appends one timestamped reading across all tracked sequences,
    /// evicting from the front once past the window.
    pub fn record(&mut self, label: impl Into<String>, snapshot: &Snapshot) {
        self.labels.push_back(label.into());
        if self.labels.len() > self.window {
            self.labels.pop_front();
        }

        for (asset, prices) in self.series.iter_mut() {
            // snapshots are complete by construction; NaN keeps the
            // sequences aligned if one ever is not
            let price = snapshot.get(asset).map(|q| q.usd).unwrap_or(f64::NAN);
            prices.push_back(price);
            if prices.len() > self.window {
                prices.pop_front();
            }
        }
    }

    /// `record` with the current local time as the label, in the HH:MM:SS
    /// format the chart axis uses.
    pub fn record_now(&mut self, snapshot: &Snapshot) {
        self.record(
            chrono::Local::now().format("%H:%M:%S").to_string(),
            snapshot,
        );
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn series(&self, asset: &str) -> Option<&VecDeque<f64>> {
        self.series.get(asset)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
