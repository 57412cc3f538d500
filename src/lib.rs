//! capsim: monthly portfolio evolution simulator.
//!
//! Blends external indicators (interest rates, index closes, fund quotas)
//! into one monthly return and compounds a starting capital through it,
//! with optional contributions and withdrawals.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], command line in [`cli`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
