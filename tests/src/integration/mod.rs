//! Integration flows across the console crates.

pub mod fixtures;

mod e2e_startup;
mod flows;
