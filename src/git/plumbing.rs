//! Plumbing Operations
//!
//! One git command per method, working directly on objects and refs.
//! `rev_parse`, `merge_base` and `show_ref` treat a failing command as
//! "not found" and return `None`; `raw` returns the exit status and never
//! fails. Everything else fails with `GitError::CommandFailed`.

use tracing::debug;

use crate::{
    errors::{GitError, PoolError, Result},
    git::{
        repository::{Repository, not_found_as_none},
        status::{parse_path_list, second_token},
    },
};

/// Exit status reported by [`Repository::raw`] when git cannot be started.
pub const COMMAND_NOT_FOUND_STATUS: i32 = 127;

impl Repository {
    /// `git write-tree`
    ///
    /// # Returns
    /// The id of the tree written from the index.
    ///
    /// # Errors
    /// * If the command fails (e.g. unmerged entries)
    pub fn write_tree(&self) -> Result<String> {
        self.capture(&self.request("write-tree", &[], &[]))
    }

    /// `git rev-parse <rev>`
    ///
    /// # Returns
    /// The object id, or `None` if `rev` does not resolve.
    ///
    /// # Errors
    /// * Only if git cannot be run at all
    pub fn rev_parse(&self, rev: &str) -> Result<Option<String>> {
        not_found_as_none(self.capture(&self.request("rev-parse", &[], &[rev])))
    }

    /// `git merge-base <a> <b>`
    ///
    /// # Returns
    /// The best common ancestor, or `None` if there is none.
    ///
    /// # Errors
    /// * Only if git cannot be run at all
    pub fn merge_base(&self, a: &str, b: &str) -> Result<Option<String>> {
        not_found_as_none(self.capture(&self.request("merge-base", &[], &[a, b])))
    }

    /// `git symbolic-ref <name> [<target>]`
    ///
    /// Reads `name` when `target` is `None`, otherwise points it at `target`.
    ///
    /// # Returns
    /// The value of the symbolic ref after the call.
    ///
    /// # Errors
    /// * If the command fails
    pub fn symbolic_ref(&self, name: &str, target: Option<&str>) -> Result<String> {
        match target {
            None => self.capture(&self.request("symbolic-ref", &[], &[name])),
            Some(target) => {
                self.capture(&self.request("symbolic-ref", &[], &[name, target]))?;
                Ok(target.to_string())
            }
        }
    }

    /// `git rev-list <commit>`
    ///
    /// # Returns
    /// Reachable commit ids, newest first as git prints them.
    ///
    /// # Errors
    /// * If the command fails
    pub fn rev_list(&self, commit: &str) -> Result<Vec<String>> {
        let output = self.capture(&self.request("rev-list", &[], &[commit]))?;
        Ok(parse_path_list(&output))
    }

    /// `git name-rev <rev>`
    ///
    /// # Returns
    /// The symbolic name, e.g. `tags/v1.0~2`.
    ///
    /// # Errors
    /// * If the command fails or prints something unexpected
    pub fn name_rev(&self, rev: &str) -> Result<String> {
        let output = self.capture(&self.request("name-rev", &[], &[rev]))?;
        second_token(&output)
    }

    /// `git show-ref <ref>`
    ///
    /// # Returns
    /// The full ref name, or `None` if no such ref exists.
    ///
    /// # Errors
    /// * If git cannot be run, or prints something unexpected
    pub fn show_ref(&self, reference: &str) -> Result<Option<String>> {
        match not_found_as_none(self.capture(&self.request("show-ref", &[], &[reference])))? {
            Some(output) => second_token(&output).map(Some),
            None => Ok(None),
        }
    }

    /// `git commit-tree <tree> [-p <parent>]... < log`
    ///
    /// Parents are passed in the given order, which is recorded in the
    /// commit and therefore changes its id.
    ///
    /// # Returns
    /// The id of the new commit.
    ///
    /// # Errors
    /// * If the command fails; the error carries git's stderr
    pub fn commit_tree(&self, tree: &str, log: &str, parents: &[&str]) -> Result<String> {
        let mut args = vec![tree];
        for parent in parents {
            args.push("-p");
            args.push(*parent);
        }

        let request = self.request("commit-tree", &[], &args).stdin(log);
        self.capture(&request)
    }

    /// `git <command> <args>...`
    ///
    /// # Returns
    /// `None` on success, otherwise the exit status. A program that cannot
    /// be started reports [`COMMAND_NOT_FOUND_STATUS`], as a shell would.
    ///
    /// # Errors
    /// * Never for a failing or missing program, only for other runner errors
    pub fn raw(&self, command: &str, args: &[&str]) -> Result<Option<i32>> {
        let code = match self.run_status(&self.request(command, &[], args)) {
            Ok(code) => code,
            Err(PoolError::Git(GitError::Spawn { command, source })) => {
                debug!(%command, error = %source, "git could not be started");
                COMMAND_NOT_FOUND_STATUS
            }
            Err(e) => return Err(e),
        };
        Ok((code != 0).then_some(code))
    }
}
