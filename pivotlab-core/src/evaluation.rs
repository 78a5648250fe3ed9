//! Forward-window scoring of signal events.
//!
//! A buy is correct when the highest close within the next `forward_window`
//! bars is at least `threshold` above the entry close; a sell when the lowest
//! close is at least `threshold` below it.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::Bar;
use crate::signals::{Side, SignalEvent};

fn default_forward_window() -> usize {
    5
}

fn default_threshold() -> f64 {
    0.01
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalEvaluator {
    #[serde(default = "default_forward_window")]
    pub forward_window: usize,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl Default for SignalEvaluator {
    fn default() -> Self {
        Self {
            forward_window: default_forward_window(),
            threshold: default_threshold(),
        }
    }
}

/// Outcome of one scored event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub timestamp: NaiveDateTime,
    /// Name of the event's producer.
    pub model: String,
    pub side: Side,
    pub entry: f64,
    /// Best favourable move inside the window, as a fraction of entry.
    pub max_fwd_pnl: f64,
    pub success: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub total_signals: usize,
    pub correct_calls: usize,
    pub incorrect_calls: usize,
    /// Scored events in arrival order.
    pub results: Vec<EvaluationRecord>,
}

impl Evaluation {
    /// Fraction of scored events that succeeded; 0 when nothing was scored.
    pub fn win_rate(&self) -> f64 {
        if self.total_signals == 0 {
            0.0
        } else {
            self.correct_calls as f64 / self.total_signals as f64
        }
    }
}

impl SignalEvaluator {
    pub fn new(forward_window: usize, threshold: f64) -> Self {
        Self {
            forward_window,
            threshold,
        }
    }

    /// Score each event. Events too close to the end of the series for a full
    /// window, or with a non-positive entry close, are skipped.
    pub fn evaluate(&self, bars: &[Bar], events: &[SignalEvent]) -> Evaluation {
        let n = bars.len();
        let mut evaluation = Evaluation::default();

        for event in events {
            let i = event.index;
            if i + self.forward_window >= n {
                continue;
            }
            let entry = bars[i].close;
            if entry <= 0.0 {
                continue;
            }

            let window = &bars[i + 1..=i + self.forward_window];
            let max_fwd_pnl = match event.side {
                Side::Buy => {
                    let best = window.iter().map(|b| b.close).fold(f64::NEG_INFINITY, f64::max);
                    (best - entry) / entry
                }
                Side::Sell => {
                    let best = window.iter().map(|b| b.close).fold(f64::INFINITY, f64::min);
                    (entry - best) / entry
                }
            };
            let success = max_fwd_pnl >= self.threshold;

            evaluation.total_signals += 1;
            if success {
                evaluation.correct_calls += 1;
            } else {
                evaluation.incorrect_calls += 1;
            }
            evaluation.results.push(EvaluationRecord {
                timestamp: bars[i].timestamp,
                model: event.name.clone(),
                side: event.side,
                entry,
                max_fwd_pnl,
                success,
            });
        }

        tracing::debug!(
            events = events.len(),
            scored = evaluation.total_signals,
            correct = evaluation.correct_calls,
            "signals evaluated"
        );
        evaluation
    }
}
