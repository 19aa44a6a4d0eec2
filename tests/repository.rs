use std::{fs, process::Command};

use pool::{
    errors::{GitError, PoolError},
    git::{ChangeStatus, Repository, is_git_repository},
};
use tempfile::TempDir;

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// A fresh non-bare repository with an identity configured, or `None` when
/// git is not installed.
fn fresh_repository() -> Option<(TempDir, Repository)> {
    if !git_available() {
        eprintln!("git not found on PATH, skipping");
        return None;
    }

    let temp_dir = TempDir::new().unwrap();
    let repository = Repository::init_create(temp_dir.path().join("work"), false, false).unwrap();

    for (key, value) in [
        ("user.name", "Pool Tests"),
        ("user.email", "pool@example.invalid"),
        ("commit.gpgsign", "false"),
    ] {
        assert_eq!(repository.raw("config", &[key, value]).unwrap(), None);
    }

    Some((temp_dir, repository))
}

fn write(repository: &Repository, name: &str, content: &str) {
    fs::write(repository.root().join(name), content).unwrap();
}

fn commit_all(repository: &Repository, message: &str) -> String {
    repository.add(&["."]).unwrap();
    repository.commit(&[], Some(message), false, false).unwrap();
    repository.rev_parse("HEAD").unwrap().unwrap()
}

#[test]
fn test_init_then_open() {
    let Some((temp_dir, repository)) = fresh_repository() else {
        return;
    };
    let root = fs::canonicalize(temp_dir.path().join("work")).unwrap();

    assert!(!repository.is_bare());
    assert_eq!(repository.root(), root);
    assert_eq!(repository.git_dir(), root.join(".git"));
    assert!(is_git_repository(&root));
}

#[test]
fn test_init_bare() {
    if !git_available() {
        return;
    }
    let temp_dir = TempDir::new().unwrap();

    let repository =
        Repository::init_create(temp_dir.path().join("pool.git"), true, false).unwrap();

    assert!(repository.is_bare());
    assert_eq!(repository.git_dir(), repository.root());
}

#[test]
fn test_plumbing_commit_round_trip() {
    let Some((_guard, repository)) = fresh_repository() else {
        return;
    };
    write(&repository, "a.txt", "alpha\n");
    repository.add(&["a.txt"]).unwrap();

    let tree = repository.write_tree().unwrap();
    let commit = repository
        .commit_tree(&tree, "initial import\n", &[])
        .unwrap();
    repository
        .update_ref(&["refs/heads/pool", commit.as_str()])
        .unwrap();

    assert_eq!(
        repository.rev_parse("refs/heads/pool").unwrap().as_deref(),
        Some(commit.as_str())
    );
    assert_eq!(repository.get_commit_log(&commit).unwrap(), "initial import");
    assert!(repository.list_heads().unwrap().contains(&"pool".to_string()));
    assert_eq!(repository.rev_list(&commit).unwrap(), vec![commit.clone()]);
}

#[test]
fn test_commit_tree_records_parent_order() {
    let Some((_guard, repository)) = fresh_repository() else {
        return;
    };
    write(&repository, "a.txt", "alpha\n");
    let first = commit_all(&repository, "first");
    write(&repository, "b.txt", "beta\n");
    let second = commit_all(&repository, "second");

    let tree = repository.write_tree().unwrap();
    let forward = repository
        .commit_tree(&tree, "merge\n", &[first.as_str(), second.as_str()])
        .unwrap();
    let backward = repository
        .commit_tree(&tree, "merge\n", &[second.as_str(), first.as_str()])
        .unwrap();

    assert_ne!(forward, backward);
    assert_eq!(
        repository.rev_parse(&format!("{forward}^1")).unwrap().as_deref(),
        Some(first.as_str())
    );
    assert_eq!(
        repository.merge_base(&first, &second).unwrap().as_deref(),
        Some(first.as_str())
    );
}

#[test]
fn test_rev_parse_missing_is_none() {
    let Some((_guard, repository)) = fresh_repository() else {
        return;
    };

    assert_eq!(repository.rev_parse("no-such-revision").unwrap(), None);
    assert_eq!(repository.show_ref("no-such-ref").unwrap(), None);
}

#[test]
fn test_status_after_add() {
    let Some((_guard, repository)) = fresh_repository() else {
        return;
    };
    write(&repository, "a.txt", "alpha\n");
    commit_all(&repository, "initial");

    write(&repository, "b.txt", "beta\n");
    repository.add(&["b.txt"]).unwrap();

    let changes = repository.status(&[]).unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].status, ChangeStatus::Added);
    assert_eq!(changes[0].path, "b.txt");
}

#[test]
fn test_paths_keep_trailing_whitespace() {
    let Some((_guard, repository)) = fresh_repository() else {
        return;
    };
    write(&repository, "a.txt", "alpha\n");
    let first = commit_all(&repository, "initial");

    write(&repository, "pkg ", "spaced\n");
    repository.add(&["pkg "]).unwrap();

    let changes = repository.status(&[]).unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].path, "pkg ");
    assert!(repository.root().join(&changes[0].path).exists());

    assert_eq!(
        repository.list_changed_files(&[first.as_str()], &[]).unwrap(),
        vec!["pkg "]
    );
}

#[test]
fn test_absolute_paths_are_made_relative() {
    let Some((_guard, repository)) = fresh_repository() else {
        return;
    };
    write(&repository, "a.txt", "alpha\n");
    commit_all(&repository, "initial");

    write(&repository, "a.txt", "changed\n");
    let absolute = repository.root().join("a.txt");
    repository
        .add(&[absolute.to_string_lossy().as_ref()])
        .unwrap();

    let changes = repository.status(&[]).unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].status, ChangeStatus::Modified);
}

#[test]
fn test_list_changed_files() {
    let Some((_guard, repository)) = fresh_repository() else {
        return;
    };
    write(&repository, "a.txt", "alpha\n");
    let first = commit_all(&repository, "first");
    write(&repository, "a.txt", "alpha 2\n");
    write(&repository, "c.txt", "gamma\n");
    let second = commit_all(&repository, "second");

    assert_eq!(
        repository
            .list_changed_files(&[first.as_str(), second.as_str()], &[])
            .unwrap(),
        vec!["a.txt", "c.txt"]
    );
    assert_eq!(
        repository
            .list_changed_files(&[first.as_str(), second.as_str()], &["c.txt"])
            .unwrap(),
        vec!["c.txt"]
    );

    write(&repository, "c.txt", "gamma 2\n");
    assert_eq!(
        repository.list_changed_files(&["HEAD"], &[]).unwrap(),
        vec!["c.txt"]
    );

    assert!(matches!(
        repository.list_changed_files(&["a", "b", "c"], &[]),
        Err(PoolError::Git(GitError::Usage(_)))
    ));
}

#[test]
fn test_remove_ref() {
    let Some((_guard, repository)) = fresh_repository() else {
        return;
    };
    write(&repository, "a.txt", "alpha\n");
    let head = commit_all(&repository, "initial");
    repository
        .update_ref(&["refs/heads/doomed", head.as_str()])
        .unwrap();

    repository.remove_ref("heads/doomed").unwrap();
    repository.remove_ref("heads/doomed").unwrap();

    assert_eq!(repository.rev_parse("refs/heads/doomed").unwrap(), None);
}

#[test]
fn test_log_stream() {
    let Some((_guard, repository)) = fresh_repository() else {
        return;
    };
    write(&repository, "a.txt", "alpha\n");
    commit_all(&repository, "first");
    write(&repository, "b.txt", "beta\n");
    commit_all(&repository, "second");

    let mut stream = repository.log(&["--format=%s"]).unwrap();
    let lines: Vec<String> = stream.by_ref().map(|line| line.unwrap()).collect();
    stream.finish().unwrap();

    assert_eq!(lines, vec!["second", "first"]);
}

#[test]
fn test_failed_command_reports_status() {
    let Some((_guard, repository)) = fresh_repository() else {
        return;
    };

    let error = repository.checkout(&["no-such-branch"]).unwrap_err();
    assert!(error.exit_status().is_some_and(|status| status != 0));
    assert_eq!(repository.raw("rev-parse", &["--verify", "nope"]).unwrap(), Some(128));
}

#[test]
fn test_set_alternates_shares_objects() {
    let Some((_source_guard, source)) = fresh_repository() else {
        return;
    };
    let Some((_target_guard, target)) = fresh_repository() else {
        return;
    };
    write(&source, "a.txt", "alpha\n");
    let commit = commit_all(&source, "shared");

    assert!(target.raw("cat-file", &["-e", commit.as_str()]).unwrap().is_some());
    target.set_alternates(&source).unwrap();
    assert_eq!(target.raw("cat-file", &["-e", commit.as_str()]).unwrap(), None);
}
