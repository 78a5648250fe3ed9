//! PivotLab Core: bar series, pivot detection, level clustering, signal
//! models, signal evaluation.
//!
//! Everything here is a pure, synchronous transformation over `&[Bar]`:
//! - Domain types (bars, pivots, levels)
//! - Pivot detectors (ZigZag, smoothed extrema, fractals)
//! - Level clusterer with recency-weighted strength
//! - Indicator trait, reference indicators, feature-config factory
//! - Signal detectors, rule engine, divergence and classifier models
//! - Forward-window signal evaluator and the strategy bundle

pub mod components;
pub mod domain;
pub mod evaluation;
pub mod indicators;
pub mod levels;
pub mod pivots;
pub mod signals;
pub mod strategy;
