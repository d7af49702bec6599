//! Controllers driving the console screens.
//!
//! Controllers are single-threaded: they take `&self` and keep their mutable
//! state in [`RefCell`]s, never borrowed across an `.await`, so another
//! gesture may be handled while a record store request is in flight.
//!
//! [`RefCell`]: std::cell::RefCell

pub mod board;
#[cfg(test)]
mod fake;
pub mod form;

pub use self::{board::PipelineBoard, form::OpportunityForm};
