//! Domain definitions.

pub mod account;
pub mod contact;
pub mod employee;
pub mod opportunity;
pub mod product;

pub use self::{opportunity::Opportunity, product::Product};
