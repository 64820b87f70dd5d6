// Valuation: ADP/tier/risk derivation and positional scarcity.

pub mod adp;
pub mod scarcity;
