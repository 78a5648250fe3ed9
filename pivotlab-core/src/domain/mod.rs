//! Domain types for PivotLab

pub mod bar;
pub mod level;
pub mod pivot;

pub use bar::{column_values, Bar, BarColumn, BarError, BarSeries};
pub use level::Level;
pub use pivot::{Pivot, PivotKind};
