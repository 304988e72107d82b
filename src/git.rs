//! Local git plumbing: clones, branches, commits and pushes, plus the
//! identity, credential and remote discovery helpers used during setup.

/// Git credentials file management.
pub mod credentials;

/// Discovery of the git server and token from a local checkout.
pub mod discovery;

/// Commit author identity setup.
pub mod identity;

/// High level git repository wrapper around git2.
pub mod repo;
