//! Shared building blocks for the appshell workspace.
//!
//! Every error enum in the workspace carries an [`ErrorLocation`] so that a
//! logged failure points at the call site that produced it.
//!
//! ## Architecture
//!
//! - **common** (this crate): Types shared by every layer
//! - **app-core**: Application lifecycle framework over host handles
//! - **echo-app**: Concrete application and loopback host wiring it together

pub mod error;

pub use error::error_location::ErrorLocation;
