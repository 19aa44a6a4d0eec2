//! Porcelain Operations
//!
//! Workflow-level commands (index maintenance, commits, checkouts, merges)
//! plus the diff/status queries that return structured results.

use crate::{
    errors::{GitError, Result},
    git::{
        log::LogStream,
        repository::Repository,
        status::{Change, parse_name_status, parse_needs_update, parse_path_list},
    },
};

impl Repository {
    /// `git read-tree <opts>...`
    ///
    /// # Errors
    /// * If the command fails
    pub fn read_tree(&self, opts: &[&str]) -> Result<()> {
        self.run(&self.request("read-tree", &[], opts))
    }

    /// `git update-index --remove <paths>...`
    ///
    /// # Errors
    /// * If the command fails
    pub fn update_index(&self, paths: &[&str]) -> Result<()> {
        self.run(&self.request("update-index", &["--remove"], paths))
    }

    /// `git update-index -q --unmerged --refresh`
    ///
    /// # Errors
    /// * If the command fails
    pub fn update_index_refresh(&self) -> Result<()> {
        self.run(&self.request("update-index", &["-q", "--unmerged", "--refresh"], &[]))
    }

    /// Refreshes the index and re-adds every path git reports as
    /// `needs update`.
    ///
    /// # Errors
    /// * If git cannot be run
    /// * If re-adding the stale paths fails
    pub fn update_index_all(&self) -> Result<()> {
        let request = self.request("update-index", &["--refresh"], &[]);
        let output = self.runner().output(&request)?;
        if output.success() {
            return Ok(());
        }

        let mut stale = parse_needs_update(&output.stdout);
        stale.extend(parse_needs_update(&output.stderr));
        if stale.is_empty() {
            return Ok(());
        }

        let stale: Vec<&str> = stale.iter().map(String::as_str).collect();
        self.update_index(&stale)
    }

    /// `git add <paths>...`
    ///
    /// # Errors
    /// * If the command fails (git rejects empty directories)
    pub fn add(&self, paths: &[&str]) -> Result<()> {
        self.run(&self.request("add", &[], paths))
    }

    /// `git checkout <args>...`
    ///
    /// # Errors
    /// * If the command fails
    pub fn checkout(&self, args: &[&str]) -> Result<()> {
        self.run(&self.request("checkout", &[], args))
    }

    /// `git checkout-index -a -f`
    ///
    /// # Errors
    /// * If the command fails
    pub fn checkout_index(&self) -> Result<()> {
        self.run(&self.request("checkout-index", &["-a", "-f"], &[]))
    }

    /// `git update-ref [-d] <ref> <rev> [<oldvalue>]`
    ///
    /// # Errors
    /// * If the command fails
    pub fn update_ref(&self, args: &[&str]) -> Result<()> {
        self.run(&self.request("update-ref", &[], args))
    }

    /// `git rm --ignore-unmatch --cached --quiet -f -r <path>`
    ///
    /// # Errors
    /// * If the command fails
    pub fn rm_cached(&self, path: &str) -> Result<()> {
        self.run(&self.request(
            "rm",
            &["--ignore-unmatch", "--cached", "--quiet", "-f", "-r"],
            &[path],
        ))
    }

    /// `git commit [-a] [-v] [-m <msg>] <paths>...`
    ///
    /// Without a message git opens its editor; the editor session is not
    /// managed here.
    ///
    /// # Errors
    /// * If the command fails (including nothing to commit)
    pub fn commit(
        &self,
        paths: &[&str],
        message: Option<&str>,
        update_all: bool,
        verbose: bool,
    ) -> Result<()> {
        let mut flags = Vec::new();
        if update_all {
            flags.push("-a");
        }
        if verbose {
            flags.push("-v");
        }
        if let Some(message) = message.filter(|m| !m.is_empty()) {
            flags.push("-m");
            flags.push(message);
        }

        self.run(&self.request("commit", &flags, paths))
    }

    /// `git merge <remote>`
    ///
    /// # Errors
    /// * If the command fails (including conflicts)
    pub fn merge(&self, remote: &str) -> Result<()> {
        self.run(&self.request("merge", &[], &[remote]))
    }

    /// `git reset <args>...`
    ///
    /// # Errors
    /// * If the command fails
    pub fn reset(&self, args: &[&str]) -> Result<()> {
        self.run(&self.request("reset", &[], args))
    }

    /// `git branch -D <branch>`
    ///
    /// # Errors
    /// * If the command fails
    pub fn branch_delete(&self, branch: &str) -> Result<()> {
        self.run(&self.request("branch", &["-D"], &[branch]))
    }

    /// `git prune`
    ///
    /// # Errors
    /// * If the command fails
    pub fn prune(&self) -> Result<()> {
        self.run(&self.request("prune", &[], &[]))
    }

    /// `git repack <args>...`
    ///
    /// # Errors
    /// * If the command fails
    pub fn repack(&self, args: &[&str]) -> Result<()> {
        self.run(&self.request("repack", &[], args))
    }

    /// `git fetch <repository> <refspec>`
    ///
    /// # Errors
    /// * If the command fails
    pub fn fetch(&self, repository: &str, refspec: &str) -> Result<()> {
        self.run(&self.request("fetch", &[], &[repository, refspec]))
    }

    /// Changes between `HEAD` and the freshly refreshed index.
    ///
    /// # Returns
    /// One [`Change`] per `diff-index --name-status HEAD` line, in git's order.
    ///
    /// # Errors
    /// * If refreshing the index or the diff fails (e.g. no `HEAD` yet)
    pub fn status(&self, paths: &[&str]) -> Result<Vec<Change>> {
        self.update_index_refresh()?;
        let output = self.capture(&self.request("diff-index", &["--name-status", "HEAD"], paths))?;
        parse_name_status(&output)
    }

    /// Paths with unresolved merge conflicts.
    ///
    /// # Errors
    /// * If the command fails
    pub fn list_unmerged(&self) -> Result<Vec<String>> {
        let output = self.capture(&self.request(
            "diff",
            &["--name-only", "--diff-filter=U"],
            &[],
        ))?;
        Ok(parse_path_list(&output))
    }

    /// Message of `committish`: everything after the commit header.
    ///
    /// # Errors
    /// * If `committish` is not a commit
    pub fn get_commit_log(&self, committish: &str) -> Result<String> {
        let output = self.capture(&self.request("cat-file", &["commit"], &[committish]))?;
        Ok(output
            .split_once("\n\n")
            .map(|(_, message)| message.to_string())
            .unwrap_or_default())
    }

    /// Files changed between revisions.
    ///
    /// With two revisions the trees are compared (`diff-tree`); with one,
    /// the revision is compared against the index (`diff-index`).
    ///
    /// # Errors
    /// * `GitError::Usage` for any other number of revisions, before
    ///   anything is run
    /// * If refreshing the index or the diff fails
    pub fn list_changed_files(&self, compared: &[&str], paths: &[&str]) -> Result<Vec<String>> {
        let (subcommand, revisions) = match compared {
            [a, b] => ("diff-tree", vec![*a, *b]),
            [rev] => ("diff-index", vec![*rev]),
            _ => {
                return Err(GitError::Usage(format!(
                    "expected 1 or 2 revisions to compare, got {}",
                    compared.len()
                ))
                .into());
            }
        };

        self.update_index_refresh()?;

        let args: Vec<&str> = revisions.into_iter().chain(paths.iter().copied()).collect();
        let output = self.capture(&self.request(subcommand, &["-r", "--name-only"], &args))?;
        Ok(parse_path_list(&output))
    }

    /// `git log <args>...` as a live line stream.
    ///
    /// The caller owns the stream and must drain it, call
    /// [`LogStream::finish`], or drop it.
    ///
    /// # Errors
    /// * If git cannot be started
    pub fn log(&self, args: &[&str]) -> Result<LogStream> {
        self.runner().stream(&self.request("log", &[], args))
    }
}
