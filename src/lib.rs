//! Market aggregation and statistics engine for the Campo Mercado dashboard.
//!
//! The engine is a pure recompute pipeline: an immutable snapshot of the
//! shared `produces` and `prices` collections flows through the series
//! builder and aggregator ([`series`]), per-product derived metrics
//! ([`stats`]), and sector/market roll-ups ([`rollup`]). A user's private
//! inventory joins against the same metrics in [`inventory`]. Nothing here
//! holds state; the external store triggers a full recompute on change.

pub mod inventory;
pub mod loader;
pub mod model;
pub mod report;
pub mod rollup;
pub mod series;
pub mod stats;
pub mod validation;
