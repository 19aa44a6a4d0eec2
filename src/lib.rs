//! Version-control layer of the package pool.
//!
//! Opens and initializes git repositories and runs git plumbing and porcelain
//! commands rooted at them. See [`git::Repository`].

pub mod cli;
pub mod config;
pub mod errors;
pub mod git;
pub mod utils;

/// Metadata directory inside a non-bare repository.
pub const GIT_DIR_NAME: &str = ".git";

/// Name suffix identifying a bare repository.
pub const BARE_SUFFIX: &str = ".git";
