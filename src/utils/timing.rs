//! Timing utilities for measuring and formatting durations
//!
//! This module provides utilities for measuring elapsed time and formatting
//! durations in a human-readable way.

use std::time::{Duration, Instant};

/// A simple timer for measuring elapsed time
#[derive(Debug, Clone)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Create a new timer that starts immediately
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration since the timer started
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::start()
    }
}

/// Format a duration into a human-readable string
///
/// - Durations >= 1 second: "1.23s"
/// - Durations >= 1 millisecond: "456ms"
/// - Durations < 1 millisecond: "< 1ms"
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();

    if millis == 0 {
        "< 1ms".to_string()
    } else if millis >= 1000 {
        let secs = duration.as_secs_f64();
        format!("{:.2}s", secs)
    } else {
        format!("{}ms", millis)
    }
}

/// The `count` longest entries, longest first
pub fn slowest<'a, I>(entries: I, count: usize) -> Vec<(&'a str, Duration)>
where
    I: IntoIterator<Item = (&'a str, Duration)>,
{
    let mut entries: Vec<(&str, Duration)> = entries.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries.truncate(count);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration_less_than_1ms() {
        assert_eq!(format_duration(Duration::from_micros(500)), "< 1ms");
        assert_eq!(format_duration(Duration::ZERO), "< 1ms");
    }

    #[test]
    fn test_format_duration_milliseconds() {
        assert_eq!(format_duration(Duration::from_millis(1)), "1ms");
        assert_eq!(format_duration(Duration::from_millis(456)), "456ms");
        assert_eq!(format_duration(Duration::from_millis(999)), "999ms");
    }

    #[test]
    fn test_format_duration_seconds() {
        assert_eq!(format_duration(Duration::from_millis(1000)), "1.00s");
        assert_eq!(format_duration(Duration::from_millis(1234)), "1.23s");
        assert_eq!(format_duration(Duration::from_secs_f64(3.456)), "3.46s");
    }

    #[test]
    fn test_timer_basic() {
        let timer = Timer::start();
        std::thread::sleep(Duration::from_millis(10));
        assert!(timer.elapsed() >= Duration::from_millis(10));
        assert!(format_duration(timer.elapsed()).ends_with('s'));
    }

    #[test]
    fn test_slowest() {
        let entries = vec![
            ("Unique Names", Duration::from_millis(4)),
            ("Empty Transforms", Duration::from_millis(12)),
            ("Default Names", Duration::from_millis(1)),
        ];
        let top = slowest(entries, 2);
        assert_eq!(top[0].0, "Empty Transforms");
        assert_eq!(top[1].0, "Unique Names");
        assert_eq!(top.len(), 2);
    }
}
