pub mod carry;
pub mod engine;
pub mod fees;

pub use carry::{AmericanCarry, CarryPolicy, EuropeanCarry, HybridCarry};
pub use engine::{apply_waterfall, RevenueStreams, WaterfallSplit, WaterfallTerms};
