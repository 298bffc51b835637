pub mod auction;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod grade;
pub mod lifecycle;
pub mod locks;
pub mod money;
pub mod ratchet;
pub mod scope;
pub mod sweep;

#[cfg(test)]
mod fixtures;
