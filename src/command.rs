//! Command implementations.
//!
//! - **pr**: validate the options, resolve each rule's repositories and
//!   create or update one pull request per repository.

/// Version propagation pull requests.
pub mod pr;
