use pool::{
    cli::run,
    errors::{GitError, PoolError},
    utils::print_error,
};

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            report(&e);
            std::process::exit(1);
        }
    }
}

fn report(error: &PoolError) {
    let suggestion = match error {
        PoolError::Git(GitError::NotARepository { .. }) => {
            "Pass the repository with -C <path>, or create one with `pool-git init`."
        }
        PoolError::Git(GitError::Spawn { .. }) => {
            "Make sure git is installed, or point POOL_GIT at it."
        }
        _ => "",
    };

    print_error("pool-git failed", &error.to_string(), suggestion);
}
