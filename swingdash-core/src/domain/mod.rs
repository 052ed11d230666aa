//! Domain types: bars and cleaned price series.

pub mod bar;
pub mod series;

pub use bar::Bar;
pub use series::{PriceSeries, MIN_BARS};
