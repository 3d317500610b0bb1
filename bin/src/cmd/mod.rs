//! CLI subcommand modules.

pub(crate) mod backtest;
pub(crate) mod metrics;
pub(crate) mod rank;
pub(crate) mod regress;
