//! ZigZag swing detection.
//!
//! One forward pass. The reference price starts at the first close; the first
//! bar whose High or Low moves `deviation_pct` away from it opens the first
//! pivot. While the last pivot is a high, a higher High extends it in place and
//! a Low `deviation_pct` below it opens a support pivot; the low side mirrors
//! this. Extension is checked before reversal, so a bar satisfying both only
//! extends.

use crate::domain::{Bar, Pivot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leg {
    Unset,
    High,
    Low,
}

pub fn zigzag_pivots(bars: &[Bar], deviation_pct: f64) -> Vec<Pivot> {
    let mut pivots: Vec<Pivot> = Vec::new();
    let Some(first) = bars.first() else {
        return pivots;
    };

    let mut last_price = first.close;
    let mut leg = Leg::Unset;

    for (i, bar) in bars.iter().enumerate().skip(1) {
        if !(last_price.is_finite() && last_price > 0.0) {
            continue;
        }
        let diff_high = (bar.high - last_price) / last_price;
        let diff_low = (bar.low - last_price) / last_price;

        match leg {
            Leg::Unset => {
                if diff_high >= deviation_pct {
                    leg = Leg::High;
                    last_price = bar.high;
                    pivots.push(Pivot::resistance(bar.high, i));
                } else if diff_low <= -deviation_pct {
                    leg = Leg::Low;
                    last_price = bar.low;
                    pivots.push(Pivot::support(bar.low, i));
                }
            }
            Leg::High => {
                if bar.high > last_price {
                    last_price = bar.high;
                    replace_last(&mut pivots, Pivot::resistance(bar.high, i));
                } else if diff_low <= -deviation_pct {
                    leg = Leg::Low;
                    last_price = bar.low;
                    pivots.push(Pivot::support(bar.low, i));
                }
            }
            Leg::Low => {
                if bar.low < last_price {
                    last_price = bar.low;
                    replace_last(&mut pivots, Pivot::support(bar.low, i));
                } else if diff_high >= deviation_pct {
                    leg = Leg::High;
                    last_price = bar.high;
                    pivots.push(Pivot::resistance(bar.high, i));
                }
            }
        }
    }
    pivots
}

fn replace_last(pivots: &mut [Pivot], pivot: Pivot) {
    if let Some(last) = pivots.last_mut() {
        *last = pivot;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PivotKind;
    use crate::pivots::bars_from_high_low;

    #[test]
    fn empty_and_single_bar() {
        assert!(zigzag_pivots(&[], 0.05).is_empty());
        let bars = bars_from_high_low(&[101.0], &[99.0]);
        assert!(zigzag_pivots(&bars, 0.05).is_empty());
    }

    #[test]
    fn quiet_market_forms_no_pivot() {
        // close[0] = 100; every High/Low stays within 1% of it.
        let highs = [100.5, 100.8, 100.9, 100.7, 100.6];
        let lows = [99.5, 99.4, 99.2, 99.3, 99.5];
        let bars = bars_from_high_low(&highs, &lows);
        assert!(zigzag_pivots(&bars, 0.01).is_empty());
    }

    #[test]
    fn alternating_swings_extend_then_reverse() {
        // close[0] = 100
        let highs = [101.0, 106.0, 110.0, 104.0, 99.0, 96.0, 103.0];
        let lows = [99.0, 104.0, 108.0, 100.0, 95.0, 94.0, 101.0];
        let bars = bars_from_high_low(&highs, &lows);
        let pivots = zigzag_pivots(&bars, 0.05);

        // bar 1 opens a high at 106, bar 2 extends it to 110, bar 3 (low 100
        // is 9.1% below 110) opens a low, bars 4-5 extend it to 94, bar 6
        // (high 103 is 9.6% above 94) opens a high.
        assert_eq!(
            pivots,
            vec![
                Pivot::resistance(110.0, 2),
                Pivot::support(94.0, 5),
                Pivot::resistance(103.0, 6),
            ]
        );
    }

    #[test]
    fn small_pullback_does_not_reverse() {
        // From a 110 high, a low of 105 is only 4.5% down with deviation 5%.
        let highs = [101.0, 110.0, 107.0];
        let lows = [99.0, 108.0, 105.0];
        let bars = bars_from_high_low(&highs, &lows);
        let pivots = zigzag_pivots(&bars, 0.05);
        assert_eq!(pivots, vec![Pivot::resistance(110.0, 1)]);
    }

    #[test]
    fn extension_beats_reversal_on_outside_bar() {
        // After a high at 110, an outside bar makes a higher high (112) and a
        // low 10% below 110. Extension wins.
        let highs = [101.0, 110.0, 112.0];
        let lows = [99.0, 108.0, 99.0];
        let bars = bars_from_high_low(&highs, &lows);
        let pivots = zigzag_pivots(&bars, 0.05);
        assert_eq!(pivots, vec![Pivot::resistance(112.0, 2)]);
    }

    #[test]
    fn first_pivot_can_be_support() {
        let highs = [101.0, 100.0, 96.0];
        let lows = [99.0, 97.0, 92.0];
        let bars = bars_from_high_low(&highs, &lows);
        let pivots = zigzag_pivots(&bars, 0.05);
        assert_eq!(pivots.len(), 1);
        assert_eq!(pivots[0].kind, PivotKind::Support);
        assert_eq!(pivots[0].index, 2);
    }
}
