//! Git Operations Module
//!
//! The version-control layer of the pool: a [`Repository`] handle plus the
//! plumbing, porcelain and ref-file operations implemented on it. Every
//! operation runs the external git program in the repository root.

pub mod command;
pub mod log;
pub mod paths;
pub mod plumbing;
pub mod porcelain;
pub mod refs;
pub mod repository;
pub mod status;

pub use command::{CommandOutput, GitRequest, GitRunner, SystemRunner};
pub use log::LogStream;
pub use repository::{Repository, is_git_repository};
pub use status::{Change, ChangeStatus};
