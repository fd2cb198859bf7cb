//! Console reporting for the pollwatch binary
//!
//! This crate contains the printing logic used by `pollwatch`; the binary
//! itself only wires configuration, logging and the watch session together.

pub mod report;
