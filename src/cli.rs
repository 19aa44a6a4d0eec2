use std::{
    io::{self, Write},
    path::PathBuf,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use tracing_subscriber::EnvFilter;

use crate::{
    config::{Config, GitSettings},
    errors::Result,
    git::{LogStream, Repository},
    utils::{print_success, print_warning},
};

#[derive(Subcommand)]
enum Commands {
    /// Create (if needed) and initialize a repository
    Init {
        /// Directory to initialize
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Create a bare repository (the path should end in `.git`)
        #[arg(long, default_value_t = false)]
        bare: bool,
    },

    /// Changes between HEAD and the index, one `STATUS<TAB>path` per line
    Status {
        /// Limit the output to these paths
        #[arg(value_name = "PATHS")]
        paths: Vec<String>,
    },

    /// Files changed between two revisions, or between a revision and the index
    Changed {
        /// One or two revisions to compare
        #[arg(value_name = "REVS", required = true)]
        revisions: Vec<String>,

        /// Limit the output to these paths
        #[arg(last = true, value_name = "PATHS")]
        paths: Vec<String>,
    },

    /// Resolve a revision to an object id
    RevParse {
        #[arg(value_name = "REV")]
        rev: String,
    },

    /// List the refs of a namespace (e.g. `heads`, `tags`)
    Refs {
        #[arg(value_name = "NAMESPACE")]
        namespace: String,
    },

    /// Stream `git log` output
    Log {
        /// Arguments passed to `git log`
        #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Run any git subcommand and exit with its status
    Raw {
        #[arg(value_name = "COMMAND")]
        command: String,

        #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
#[command(about = "Git layer of the package pool:\n\
\t- Initializes and inspects pool repositories.\n\
\t- Runs plumbing commands rooted at the repository.")]
#[command(help_template = "{about}\n\nUSAGE:\n{usage}\n\n{all-args}\n")]
#[command(name = "pool-git", version)]
pub struct Cli {
    /// Commands
    #[command(subcommand)]
    command: Commands,

    /// Repository to operate on
    #[arg(short = 'C', long = "repo", value_name = "PATH", default_value = ".", global = true)]
    repo: PathBuf,

    /// Verbose
    /// If passed, git invocations are logged and `init` output is shown.
    #[arg(short, long, default_value = "false", global = true)]
    verbose: bool,
}

/// # `init_logging`
/// Installs the stderr subscriber. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn load_settings() -> Result<GitSettings> {
    match Config::new() {
        Ok(config) => config.load(),
        Err(_) => Ok(GitSettings::default()),
    }
}

/// # `run`
/// Runs the program.
///
/// ## Returns
/// The process exit code.
///
/// ## Errors
/// Returns an error if the repository cannot be opened or a git command fails.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(shell, &mut cmd, name, &mut io::stdout());
        return Ok(0);
    }

    let settings = load_settings()?;

    if let Commands::Init { path, bare } = &cli.command {
        let repository = Repository::init_with(path, *bare, cli.verbose, settings)?;
        print_success(
            "Repository initialized",
            &repository.root().display().to_string(),
        );
        return Ok(0);
    }

    let repository = Repository::open_with(&cli.repo, settings)?;
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Status { paths } => {
            for change in repository.status(&as_strs(&paths))? {
                writeln!(stdout, "{change}")?;
            }
        }
        Commands::Changed { revisions, paths } => {
            for path in repository.list_changed_files(&as_strs(&revisions), &as_strs(&paths))? {
                writeln!(stdout, "{path}")?;
            }
        }
        Commands::RevParse { rev } => match repository.rev_parse(&rev)? {
            Some(id) => writeln!(stdout, "{id}")?,
            None => {
                print_warning("Revision not found", &rev);
                return Ok(1);
            }
        },
        Commands::Refs { namespace } => {
            for name in repository.list_refs(&namespace)? {
                writeln!(stdout, "{name}")?;
            }
        }
        Commands::Log { args } => {
            pipe_log(repository.log(&as_strs(&args))?, &mut stdout)?;
        }
        Commands::Raw { command, args } => {
            stdout.flush()?;
            return Ok(repository.raw(&command, &as_strs(&args))?.unwrap_or(0));
        }
        Commands::Init { .. } | Commands::Completions { .. } => {}
    }

    Ok(0)
}

/// # `pipe_log`
/// Copies every line of `stream` to `out`. If `out` stops accepting writes
/// (e.g. `| head`), the process is terminated instead of drained.
///
/// ## Errors
/// Returns an error if reading fails or the log command exits non-zero.
fn pipe_log(mut stream: LogStream, out: &mut impl Write) -> Result<()> {
    let mut reader_gone = false;
    for line in stream.by_ref() {
        if writeln!(out, "{}", line?).is_err() {
            reader_gone = true;
            break;
        }
    }

    if reader_gone {
        stream.terminate()
    } else {
        stream.finish()
    }
}

fn as_strs(values: &[String]) -> Vec<&str> {
    values.iter().map(String::as_str).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{GitRequest, GitRunner, SystemRunner};
    use tempfile::TempDir;

    /// Accepts `capacity` lines, then fails like a closed pipe.
    struct ClosingWriter {
        written: Vec<u8>,
        capacity: usize,
    }

    impl Write for ClosingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let lines = self.written.iter().filter(|b| **b == b'\n').count();
            if lines >= self.capacity {
                return Err(io::Error::from(io::ErrorKind::BrokenPipe));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn shell_stream(temp_dir: &TempDir, script: &str) -> LogStream {
        SystemRunner
            .stream(&GitRequest::new("sh", temp_dir.path()).args(["-c", script]))
            .unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_changed_splits_paths_after_separator() {
        let cli = Cli::try_parse_from(["pool-git", "changed", "v1", "v2", "--", "pkgs"]).unwrap();

        match cli.command {
            Commands::Changed { revisions, paths } => {
                assert_eq!(revisions, vec!["v1", "v2"]);
                assert_eq!(paths, vec!["pkgs"]);
            }
            _ => panic!("expected the changed subcommand"),
        }
    }

    #[test]
    fn test_raw_keeps_hyphenated_args() {
        let cli =
            Cli::try_parse_from(["pool-git", "-C", "/srv/pool", "raw", "gc", "--auto"]).unwrap();

        assert_eq!(cli.repo, PathBuf::from("/srv/pool"));
        match cli.command {
            Commands::Raw { command, args } => {
                assert_eq!(command, "gc");
                assert_eq!(args, vec!["--auto"]);
            }
            _ => panic!("expected the raw subcommand"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_pipe_log_copies_every_line() {
        let temp_dir = TempDir::new().unwrap();
        let mut out = Vec::new();

        pipe_log(shell_stream(&temp_dir, "printf 'b\\na\\n'"), &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "b\na\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_pipe_log_stops_when_reader_goes_away() {
        let temp_dir = TempDir::new().unwrap();
        let mut out = ClosingWriter {
            written: Vec::new(),
            capacity: 2,
        };

        pipe_log(shell_stream(&temp_dir, "exec yes"), &mut out).unwrap();

        assert_eq!(out.written, b"y\ny\n");
    }
}
