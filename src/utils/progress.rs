//! Cosmetic progress for backend calls.
//!
//! The backend reports nothing while it works, so the percentage shown here is
//! made up: it creeps forward by a random step every tick and stalls below
//! 100 until the caller finishes the bar.

use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use std::time::Duration;
use tokio::task::JoinHandle;

const TICK: Duration = Duration::from_millis(400);
const STALL_AT: f64 = 95.0;
const MAX_STEP: f64 = 5.0;

/// One synthetic tick. Stops moving once `STALL_AT` is reached, so the result stays below 100.
pub fn advance(current: f64, step: f64) -> f64 {
    if current < STALL_AT {
        current + step.clamp(0.0, MAX_STEP - f64::EPSILON)
    } else {
        current
    }
}

pub struct SyntheticProgress {
    bar: ProgressBar,
    ticker: JoinHandle<()>,
}

impl SyntheticProgress {
    /// Starts ticking on the current tokio runtime.
    pub fn start(message: impl Into<String>) -> Self {
        let bar = ProgressBar::new(100);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}%")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar.set_message(message.into());

        let ticking = bar.clone();
        let ticker = tokio::spawn(async move {
            let mut percent = 0.0;
            let mut interval = tokio::time::interval(TICK);
            loop {
                interval.tick().await;
                let step = rand::rng().random_range(0.0..MAX_STEP);
                percent = advance(percent, step);
                ticking.set_position(percent as u64);
                ticking.tick();
            }
        });

        Self { bar, ticker }
    }

    pub fn finish(self, message: impl Into<String>) {
        self.ticker.abort();
        self.bar.set_position(100);
        self.bar.finish_with_message(message.into());
    }

    pub fn abandon(self, message: impl Into<String>) {
        self.ticker.abort();
        self.bar.abandon_with_message(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_never_reaches_hundred() {
        let mut percent = 0.0;
        for _ in 0..10_000 {
            percent = advance(percent, MAX_STEP);
        }
        assert!(percent >= STALL_AT);
        assert!(percent < 100.0);
    }

    #[test]
    fn test_advance_stalls_and_ignores_negative_steps() {
        assert_eq!(advance(96.0, 4.0), 96.0);
        assert_eq!(advance(10.0, -3.0), 10.0);
        assert_eq!(advance(10.0, 2.5), 12.5);
    }

    #[tokio::test]
    async fn test_progress_finishes_cleanly() {
        let progress = SyntheticProgress::start("working");
        tokio::time::sleep(Duration::from_millis(10)).await;
        progress.finish("done");
    }
}
