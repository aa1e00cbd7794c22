// crates/core/src/metrics.rs

use std::time::Duration;

/// Timing metrics for one evaluation data pass.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    pub total_time: Option<Duration>,
    pub batch_times: Vec<Duration>,
    pub samples_seen: u64,
    pub batches_seen: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_total_time(&mut self, duration: Duration) {
        self.total_time = Some(duration);
    }

    pub fn record_batch(&mut self, samples: usize, duration: Duration) {
        self.batch_times.push(duration);
        self.batches_seen += 1;
        self.samples_seen += samples as u64;
    }

    pub fn average_batch_time(&self) -> Option<Duration> {
        if self.batch_times.is_empty() {
            return None;
        }
        let total: Duration = self.batch_times.iter().sum();
        Some(total / self.batch_times.len() as u32)
    }

    pub fn samples_per_second(&self) -> Option<f64> {
        let total_time = self.total_time?;
        let seconds = total_time.as_secs_f64();
        if seconds > 0.0 {
            Some(self.samples_seen as f64 / seconds)
        } else {
            None
        }
    }

    pub fn print_summary(&self) {
        println!("\n=== Evaluation Data Summary ===");

        if let Some(total_time) = self.total_time {
            println!("Total Time: {:?}", total_time);
        }

        println!("Batches: {}", self.batches_seen);
        println!("Samples: {}", self.samples_seen);

        if let Some(avg) = self.average_batch_time() {
            println!("Average Batch Time: {:?}", avg);
        }

        if let Some(rate) = self.samples_per_second() {
            println!("Throughput: {:.1} samples/s", rate);
        }

        println!("===============================\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_recording_accumulates() {
        let mut m = Metrics::new();
        m.record_batch(128, Duration::from_millis(10));
        m.record_batch(64, Duration::from_millis(20));

        assert_eq!(m.batches_seen, 2);
        assert_eq!(m.samples_seen, 192);
        assert_eq!(m.average_batch_time(), Some(Duration::from_millis(15)));
    }

    #[test]
    fn throughput_needs_a_total_time() {
        let mut m = Metrics::new();
        m.record_batch(100, Duration::from_millis(5));
        assert!(m.samples_per_second().is_none());

        m.record_total_time(Duration::from_secs(2));
        assert_eq!(m.samples_per_second(), Some(50.0));
    }
}
