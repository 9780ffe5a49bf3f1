//! Bounded sample storage with front-first eviction.

use std::collections::VecDeque;

use crate::error::{GraphError, Result};

/// One two-valued measurement ingested by a chart.
///
/// The semantics of the pair are defined by the chart that owns the buffer
/// (upload/download, used/available). Values are expected to be
/// non-negative; `secondary` is zero when a chart plots a single series.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sample {
    /// First measurement of the pair.
    pub primary: f64,
    /// Second measurement of the pair.
    pub secondary: f64,
}

impl Sample {
    /// The defined empty value returned when no sample exists.
    pub const ZERO: Self = Self {
        primary: 0.0,
        secondary: 0.0,
    };

    /// Create a new sample pair.
    pub const fn new(primary: f64, secondary: f64) -> Self {
        Self { primary, secondary }
    }

    /// Create a single-series sample with an unused secondary value.
    pub const fn single(primary: f64) -> Self {
        Self::new(primary, 0.0)
    }
}

/// How a buffer sheds its oldest samples once full.
///
/// The two variants are deliberately different on screen: batch eviction
/// produces a visible step when the batch drops out, per-frame single
/// eviction keeps the trace scrolling smoothly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityPolicy {
    /// Static capacity; once exceeded, evict `batch` samples in one step.
    Fixed {
        /// Maximum retained samples.
        capacity: usize,
        /// Samples removed per eviction step.
        batch: usize,
    },
    /// Capacity follows the drawing width minus a fixed margin; evict one
    /// sample at a time until the buffer fits.
    WidthDriven {
        /// Pixels reserved for axis furniture, excluded from capacity.
        margin: u32,
    },
}

impl CapacityPolicy {
    /// Static capacity with the default batch of one tenth, at least one.
    pub fn fixed(capacity: usize) -> Result<Self> {
        Self::fixed_with_batch(capacity, (capacity / 10).max(1))
    }

    /// Static capacity with an explicit eviction batch.
    pub fn fixed_with_batch(capacity: usize, batch: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(GraphError::InvalidCapacity(
                "fixed capacity must hold at least one sample".into(),
            ));
        }
        if batch == 0 {
            return Err(GraphError::InvalidCapacity(
                "eviction batch must remove at least one sample".into(),
            ));
        }
        Ok(Self::Fixed { capacity, batch })
    }

    /// Width-driven capacity. A surface narrower than `margin` yields a
    /// capacity of zero, which is valid: the buffer simply drains.
    pub const fn width_driven(margin: u32) -> Self {
        Self::WidthDriven { margin }
    }
}

/// Bounded ordered sample sequence, oldest at the front.
///
/// Producers append through [`push`](Self::push) without backpressure; the
/// render pass trims the buffer once per frame through
/// [`evict_excess`](Self::evict_excess) and reads a snapshot. Eviction only
/// ever removes from the front, so retained samples stay in arrival order.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: VecDeque<Sample>,
    policy: CapacityPolicy,
}

impl SampleBuffer {
    /// Create an empty buffer with the given eviction policy.
    pub fn new(policy: CapacityPolicy) -> Self {
        Self {
            samples: VecDeque::new(),
            policy,
        }
    }

    /// Access the eviction policy.
    pub fn policy(&self) -> CapacityPolicy {
        self.policy
    }

    /// Append a sample at the tail unconditionally.
    pub fn push(&mut self, sample: Sample) {
        self.samples.push_back(sample);
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check whether the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The most recently pushed sample, or [`Sample::ZERO`] when empty.
    pub fn last(&self) -> Sample {
        self.samples.back().copied().unwrap_or(Sample::ZERO)
    }

    /// Trim the buffer according to its policy.
    ///
    /// Called once per render pass. `surface_width` only matters for
    /// width-driven policies.
    pub fn evict_excess(&mut self, surface_width: u32) {
        match self.policy {
            CapacityPolicy::Fixed { capacity, batch } => {
                if self.samples.len() > capacity {
                    // A burst between render passes can overshoot by more
                    // than one batch; a single pass must still restore the
                    // cap.
                    let excess = self.samples.len() - capacity;
                    let drop = batch.max(excess).min(self.samples.len());
                    self.samples.drain(..drop);
                }
            }
            CapacityPolicy::WidthDriven { margin } => {
                let capacity = surface_width.saturating_sub(margin) as usize;
                while self.samples.len() > capacity {
                    self.samples.pop_front();
                }
            }
        }
    }

    /// Clone the current contents, oldest first.
    ///
    /// The render pass snapshots under the buffer lock and draws from the
    /// copy, so a concurrent producer never races the drawing loop.
    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.iter().copied().collect()
    }

    /// Iterate over samples, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(policy: CapacityPolicy, count: usize) -> SampleBuffer {
        let mut buffer = SampleBuffer::new(policy);
        for i in 0..count {
            buffer.push(Sample::single(i as f64));
        }
        buffer
    }

    #[test]
    fn fixed_eviction_drops_a_batch_of_oldest() {
        let policy = CapacityPolicy::fixed(100).expect("valid capacity");
        let mut buffer = filled(policy, 101);

        buffer.evict_excess(0);

        assert_eq!(buffer.len(), 91);
        // Retained samples are exactly the most recent, in arrival order.
        let snapshot = buffer.snapshot();
        assert_eq!(snapshot.first().unwrap().primary, 10.0);
        assert_eq!(snapshot.last().unwrap().primary, 100.0);
        assert!(snapshot.windows(2).all(|w| w[0].primary < w[1].primary));
    }

    #[test]
    fn fixed_eviction_restores_the_cap_after_a_burst() {
        let policy = CapacityPolicy::fixed(100).expect("valid capacity");
        let mut buffer = filled(policy, 350);

        buffer.evict_excess(0);

        assert_eq!(buffer.len(), 100);
        assert_eq!(buffer.snapshot().first().unwrap().primary, 250.0);
    }

    #[test]
    fn fixed_eviction_is_a_noop_at_capacity() {
        let policy = CapacityPolicy::fixed(100).expect("valid capacity");
        let mut buffer = filled(policy, 100);
        buffer.evict_excess(0);
        assert_eq!(buffer.len(), 100);
    }

    #[test]
    fn width_driven_trims_to_surface_width_minus_margin() {
        let mut buffer = filled(CapacityPolicy::width_driven(50), 400);

        buffer.evict_excess(300);

        assert_eq!(buffer.len(), 250);
        assert_eq!(buffer.snapshot().last().unwrap().primary, 399.0);
    }

    #[test]
    fn width_driven_drains_on_narrow_surface() {
        let mut buffer = filled(CapacityPolicy::width_driven(50), 10);
        buffer.evict_excess(40);
        assert!(buffer.is_empty());
    }

    #[test]
    fn last_returns_zero_when_empty() {
        let buffer = SampleBuffer::new(CapacityPolicy::width_driven(0));
        assert_eq!(buffer.last(), Sample::ZERO);
    }

    #[test]
    fn last_returns_most_recent_push() {
        let mut buffer = SampleBuffer::new(CapacityPolicy::width_driven(0));
        buffer.push(Sample::new(1.0, 2.0));
        buffer.push(Sample::new(3.0, 4.0));
        assert_eq!(buffer.last(), Sample::new(3.0, 4.0));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(CapacityPolicy::fixed(0).is_err());
        assert!(CapacityPolicy::fixed_with_batch(10, 0).is_err());
    }
}
