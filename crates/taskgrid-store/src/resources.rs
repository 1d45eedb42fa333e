//! Bounded resource-usage history.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Samples kept per window; the oldest is evicted first.
pub const RESOURCE_WINDOW_CAPACITY: usize = 20;

/// Point-in-time usage percentages, each clamped to `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResourceSample {
    /// When the sample was taken.
    pub timestamp: DateTime<Utc>,
    /// CPU usage.
    pub cpu: f64,
    /// Memory usage.
    pub memory: f64,
    /// VRAM usage.
    pub vram: f64,
}

impl ResourceSample {
    /// Sample with every value clamped into range. Non-finite values read as 0.
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, cpu: f64, memory: f64, vram: f64) -> Self {
        Self {
            timestamp,
            cpu: clamp_percent(cpu),
            memory: clamp_percent(memory),
            vram: clamp_percent(vram),
        }
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// FIFO window of at most [`RESOURCE_WINDOW_CAPACITY`] samples.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ResourceWindow {
    samples: VecDeque<ResourceSample>,
}

impl ResourceWindow {
    /// Empty window.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            samples: VecDeque::new(),
        }
    }

    /// Append a sample, evicting the oldest when full.
    pub fn push(&mut self, sample: ResourceSample) {
        while self.samples.len() >= RESOURCE_WINDOW_CAPACITY {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Drop every sample.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Number of samples held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the window holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Most recent sample.
    #[must_use]
    pub fn latest(&self) -> Option<&ResourceSample> {
        self.samples.back()
    }

    /// Samples oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceSample> {
        self.samples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn at(offset: i64) -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(offset)
    }

    #[test]
    fn values_are_clamped() {
        let sample = ResourceSample::new(at(0), 140.0, -3.0, f64::NAN);
        assert!((sample.cpu - 100.0).abs() < f64::EPSILON);
        assert!(sample.memory.abs() < f64::EPSILON);
        assert!(sample.vram.abs() < f64::EPSILON);
    }

    #[test]
    fn twenty_first_sample_evicts_the_oldest() {
        let mut window = ResourceWindow::new();
        for offset in 0..21 {
            window.push(ResourceSample::new(at(offset), 10.0, 10.0, 10.0));
        }
        assert_eq!(window.len(), RESOURCE_WINDOW_CAPACITY);
        assert_eq!(window.iter().next().map(|s| s.timestamp), Some(at(1)));
        assert_eq!(window.latest().map(|s| s.timestamp), Some(at(20)));
    }

    #[test]
    fn length_never_exceeds_capacity() {
        let mut window = ResourceWindow::new();
        for offset in 0..100 {
            window.push(ResourceSample::new(at(offset), 1.0, 2.0, 3.0));
            assert!(window.len() <= RESOURCE_WINDOW_CAPACITY);
        }
        window.clear();
        assert!(window.is_empty());
    }
}
