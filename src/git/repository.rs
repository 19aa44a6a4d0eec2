//! Repository Handle
//!
//! [`Repository`] is an opened git repository: canonical root, metadata
//! directory and bare flag, fixed at construction. Every operation builds a
//! [`GitRequest`] rooted at `root` and hands it to the configured
//! [`GitRunner`].

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    BARE_SUFFIX, GIT_DIR_NAME,
    config::GitSettings,
    errors::{GitError, PoolError, Result},
    git::{
        command::{GitRequest, GitRunner, SystemRunner, command_failed},
        paths::relativize_all,
    },
};

/// Scratch file git reads the default merge message from.
pub const MERGE_MSG_FILE: &str = "MERGE_MSG";

/// An opened git repository.
#[derive(Clone)]
pub struct Repository {
    root: PathBuf,
    git_dir: PathBuf,
    bare: bool,
    settings: GitSettings,
    runner: Arc<dyn GitRunner>,
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("root", &self.root)
            .field("git_dir", &self.git_dir)
            .field("bare", &self.bare)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Returns true if `path` opens as a repository.
///
/// # Examples
///
/// ```no_run
/// use pool::git::repository::is_git_repository;
///
/// if is_git_repository("/srv/pool/.git") {
///     println!("bare pool found");
/// }
/// ```
pub fn is_git_repository(path: impl AsRef<Path>) -> bool {
    Repository::open(path).is_ok()
}

impl Repository {
    /// Opens an existing repository with default settings.
    ///
    /// A path containing a `.git` directory is a regular repository. A path
    /// whose name ends in `.git` and that holds `refs` and `objects`
    /// directories is a bare one. Anything else is rejected.
    ///
    /// # Errors
    /// * `GitError::NotARepository` if neither heuristic matches
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, GitSettings::default())
    }

    /// Opens an existing repository with explicit settings.
    ///
    /// # Errors
    /// * `GitError::NotARepository` if neither heuristic matches
    pub fn open_with(path: impl AsRef<Path>, settings: GitSettings) -> Result<Self> {
        Self::open_with_runner(path, settings, Arc::new(SystemRunner))
    }

    /// Opens an existing repository, executing commands through `runner`.
    ///
    /// # Errors
    /// * `GitError::NotARepository` if neither heuristic matches
    pub fn open_with_runner(
        path: impl AsRef<Path>,
        settings: GitSettings,
        runner: Arc<dyn GitRunner>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let not_a_repository = || {
            PoolError::Git(GitError::NotARepository {
                path: path.to_path_buf(),
            })
        };

        let root = fs::canonicalize(path).map_err(|_| not_a_repository())?;

        let nested = root.join(GIT_DIR_NAME);
        let (git_dir, bare) = if nested.is_dir() {
            (nested, false)
        } else if root.to_string_lossy().ends_with(BARE_SUFFIX)
            && root.join("refs").is_dir()
            && root.join("objects").is_dir()
        {
            (root.clone(), true)
        } else {
            return Err(not_a_repository());
        };

        Ok(Self {
            root,
            git_dir,
            bare,
            settings,
            runner,
        })
    }

    /// Creates (if needed) and initializes a repository at `path`, then opens it.
    ///
    /// A bare repository only opens afterwards if `path` ends in `.git`.
    /// Re-initializing an existing repository is left to git.
    ///
    /// # Errors
    /// * If the directory cannot be created
    /// * If `git init` fails
    /// * If the result does not open as a repository
    pub fn init_create(path: impl AsRef<Path>, bare: bool, verbose: bool) -> Result<Self> {
        Self::init_with(path, bare, verbose, GitSettings::default())
    }

    /// [`Repository::init_create`] with explicit settings.
    ///
    /// # Errors
    /// * If the directory cannot be created
    /// * If `git init` fails
    /// * If the result does not open as a repository
    pub fn init_with(
        path: impl AsRef<Path>,
        bare: bool,
        verbose: bool,
        settings: GitSettings,
    ) -> Result<Self> {
        Self::init_with_runner(path, bare, verbose, settings, Arc::new(SystemRunner))
    }

    /// [`Repository::init_create`] executing through `runner`.
    ///
    /// # Errors
    /// * If the directory cannot be created
    /// * If `git init` fails
    /// * If the result does not open as a repository
    pub fn init_with_runner(
        path: impl AsRef<Path>,
        bare: bool,
        verbose: bool,
        settings: GitSettings,
        runner: Arc<dyn GitRunner>,
    ) -> Result<Self> {
        let path = path.as_ref();

        if fs::symlink_metadata(path).is_err() {
            fs::create_dir_all(path)?;
        }

        let mut request = GitRequest::new(&settings.git, path).arg("init");
        if bare {
            request = request.arg("--bare");
        }
        if settings.quiet_init && !verbose {
            request = request.quiet();
        }

        let code = runner.status(&request)?;
        if code != 0 {
            return Err(command_failed(&request, code, ""));
        }

        Self::open_with_runner(path, settings, runner)
    }

    /// Canonical repository root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Metadata directory: `root/.git`, or `root` itself when bare.
    #[must_use]
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    #[must_use]
    pub fn is_bare(&self) -> bool {
        self.bare
    }

    #[must_use]
    pub fn settings(&self) -> &GitSettings {
        &self.settings
    }

    /// Builds `git <subcommand> <flags..> <args..>` rooted at the repository.
    ///
    /// `flags` are passed verbatim; `args` go through path relativization.
    pub(crate) fn request(&self, subcommand: &str, flags: &[&str], args: &[&str]) -> GitRequest {
        GitRequest::new(&self.settings.git, &self.root)
            .arg(subcommand)
            .args(flags.iter().copied())
            .args(relativize_all(&self.root, args))
    }

    /// Runs with inherited stdio; non-zero exit is an error.
    pub(crate) fn run(&self, request: &GitRequest) -> Result<()> {
        match self.runner.status(request)? {
            0 => Ok(()),
            code => Err(command_failed(request, code, "")),
        }
    }

    /// Runs and returns the exit code, never failing on non-zero exit.
    pub(crate) fn run_status(&self, request: &GitRequest) -> Result<i32> {
        self.runner.status(request)
    }

    /// Captures stdout minus its final newline; non-zero exit is an error.
    pub(crate) fn capture(&self, request: &GitRequest) -> Result<String> {
        self.runner.output(request)?.into_stdout(request)
    }

    pub(crate) fn runner(&self) -> &dyn GitRunner {
        self.runner.as_ref()
    }

    fn merge_msg_path(&self) -> PathBuf {
        self.git_dir.join(MERGE_MSG_FILE)
    }

    /// Contents of `MERGE_MSG`, or `None` when the file does not exist.
    ///
    /// # Errors
    /// * If the file exists but cannot be read
    pub fn read_merge_message(&self) -> Result<Option<String>> {
        let path = self.merge_msg_path();
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    /// Overwrites `MERGE_MSG` with `message`.
    ///
    /// # Errors
    /// * If the file cannot be written
    pub fn write_merge_message(&self, message: &str) -> Result<()> {
        fs::write(self.merge_msg_path(), message)?;
        Ok(())
    }
}

/// Maps a failed command to `None`, for queries where failure means
/// "no such object". Other errors still propagate.
pub(crate) fn not_found_as_none<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(PoolError::Git(GitError::CommandFailed { .. })) => Ok(None),
        Err(e) => Err(e),
    }
}
