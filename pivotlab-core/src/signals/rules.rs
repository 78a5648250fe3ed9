//! Fixed rule set turning indicator series into signal events.
//!
//! Rules, in emission order:
//! 1. crossover between the first two moving averages (`sma_*`/`ema_*`,
//!    name order), both directions;
//! 2. first RSI crossing up through 30 (buy);
//! 3. first RSI crossing down through 70 (sell);
//! 4. close crossing the first moving average, both directions.
//!
//! A rule whose series are missing is skipped.

use crate::components::IndicatorValues;
use crate::domain::{column_values, Bar, BarColumn};

use super::detectors::{detect_crossover, detect_threshold};
use super::event::{events_from_series, Side, SignalEvent};

pub const RSI_OVERSOLD: f64 = 30.0;
pub const RSI_OVERBOUGHT: f64 = 70.0;

fn is_moving_average(name: &str) -> bool {
    name.starts_with("sma_") || name.starts_with("ema_")
}

fn direction(side: Side) -> &'static str {
    match side {
        Side::Buy => "above",
        Side::Sell => "below",
    }
}

/// Run every rule over `bars` and `indicators`.
pub fn extract_rule_events(bars: &[Bar], indicators: &IndicatorValues) -> Vec<SignalEvent> {
    let ma_names: Vec<&str> = indicators.names().filter(|n| is_moving_average(n)).collect();
    let rsi_name = indicators.names().find(|n| n.starts_with("rsi"));
    let mut events = Vec::new();

    if let [fast, slow, ..] = ma_names.as_slice() {
        if let (Some(a), Some(b)) = (indicators.get_series(fast), indicators.get_series(slow)) {
            let cross = detect_crossover(a, b);
            events.extend(events_from_series(bars, &cross, "MA Crossover", |side| {
                format!("{fast} crossed {} {slow}", direction(side))
            }));
        }
    }

    if let Some(rsi) = rsi_name.and_then(|n| indicators.get_series(n)) {
        let oversold = detect_threshold(rsi, RSI_OVERSOLD);
        let up_only: Vec<i8> = oversold.iter().map(|&f| i8::from(f == 1)).collect();
        events.extend(events_from_series(bars, &up_only, "RSI Oversold Exit", |_| {
            format!("RSI crossed above {RSI_OVERSOLD}")
        }));

        let overbought = detect_threshold(rsi, RSI_OVERBOUGHT);
        let down_only: Vec<i8> = overbought.iter().map(|&f| if f == -1 { -1 } else { 0 }).collect();
        events.extend(events_from_series(bars, &down_only, "RSI Overbought Exit", |_| {
            format!("RSI crossed below {RSI_OVERBOUGHT}")
        }));
    }

    if let Some(&ma) = ma_names.first() {
        if let Some(series) = indicators.get_series(ma) {
            let closes = column_values(bars, BarColumn::Close);
            let cross = detect_crossover(&closes, series);
            events.extend(events_from_series(bars, &cross, "Price/MA Cross", |side| {
                format!("Price crossed {} {ma}", direction(side))
            }));
        }
    }

    tracing::debug!(events = events.len(), "rule events extracted");
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn no_indicators_no_events() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        assert!(extract_rule_events(&bars, &IndicatorValues::new()).is_empty());
    }

    #[test]
    fn ma_crossover_uses_first_two_names() {
        let bars = make_bars(&[10.0, 10.0, 10.0, 10.0]);
        let iv: IndicatorValues = vec![
            ("ema_5", vec![1.0, 1.0, 2.0, 2.0]),
            ("sma_10", vec![2.0, 2.0, 1.0, 1.0]),
            ("sma_50", vec![0.0, 0.0, 0.0, 9.0]),
        ]
        .into_iter()
        .collect();

        let events = extract_rule_events(&bars, &iv);
        let ma: Vec<&SignalEvent> = events.iter().filter(|e| e.name == "MA Crossover").collect();
        assert_eq!(ma.len(), 1);
        assert_eq!(ma[0].index, 2);
        assert_eq!(ma[0].side, Side::Buy);
        assert_eq!(ma[0].description, "ema_5 crossed above sma_10");
    }

    #[test]
    fn rsi_exits_fire_one_direction_each() {
        let bars = make_bars(&[10.0; 6]);
        let iv: IndicatorValues = vec![("rsi_14", vec![25.0, 35.0, 25.0, 75.0, 65.0, 75.0])]
            .into_iter()
            .collect();

        let events = extract_rule_events(&bars, &iv);
        let summary: Vec<(&str, usize, Side)> = events
            .iter()
            .map(|e| (e.name.as_str(), e.index, e.side))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("RSI Oversold Exit", 1, Side::Buy),
                ("RSI Oversold Exit", 3, Side::Buy),
                ("RSI Overbought Exit", 4, Side::Sell),
            ]
        );
        assert_eq!(events[0].description, "RSI crossed above 30");
    }

    #[test]
    fn price_crosses_first_ma() {
        let bars = make_bars(&[9.0, 11.0, 12.0, 8.0]);
        let iv: IndicatorValues = vec![("sma_3", vec![f64::NAN, 10.0, 10.0, 10.0])]
            .into_iter()
            .collect();

        let events = extract_rule_events(&bars, &iv);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "Price/MA Cross");
        assert_eq!(events[0].index, 3);
        assert_eq!(events[0].side, Side::Sell);
        assert_eq!(events[0].description, "Price crossed below sma_3");
    }
}
