//! Read entities definitions.

pub mod opportunity;
