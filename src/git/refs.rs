//! Ref Files
//!
//! Direct access to the ref hierarchy under the metadata directory, for the
//! few things git has no plumbing for: listing a namespace, deleting a ref
//! file and pointing the object store at another repository.

use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use crate::{
    errors::{GitError, Result},
    git::repository::Repository,
};

const REFS_DIR: &str = "refs";
const OBJECTS_DIR: &str = "objects";
const ALTERNATES_FILE: &str = "objects/info/alternates";

impl Repository {
    /// Entries directly under `refs/<namespace>`, sorted by name.
    ///
    /// # Errors
    /// * `GitError::Usage` if `namespace` escapes the ref hierarchy
    /// * If the directory cannot be read (e.g. the namespace does not exist)
    pub fn list_refs(&self, namespace: &str) -> Result<Vec<String>> {
        let dir = self.ref_path(namespace)?;

        let mut names = fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<std::io::Result<Vec<_>>>()?;
        names.sort();

        Ok(names)
    }

    /// Local branch names.
    ///
    /// # Errors
    /// * If `refs/heads` cannot be read
    pub fn list_heads(&self) -> Result<Vec<String>> {
        self.list_refs("heads")
    }

    /// Tag names.
    ///
    /// # Errors
    /// * If `refs/tags` cannot be read
    pub fn list_tags(&self) -> Result<Vec<String>> {
        self.list_refs("tags")
    }

    /// Deletes `refs/<reference>`. A missing ref is not an error.
    ///
    /// Packed refs are not touched.
    ///
    /// # Errors
    /// * `GitError::Usage` if `reference` escapes the ref hierarchy
    /// * If the file exists but cannot be removed
    pub fn remove_ref(&self, reference: &str) -> Result<()> {
        let path = self.ref_path(reference)?;
        if fs::symlink_metadata(&path).is_ok() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Lets this repository read objects from `other`'s object store.
    ///
    /// Replaces any existing alternates list.
    ///
    /// # Errors
    /// * If the alternates file cannot be written
    pub fn set_alternates(&self, other: &Repository) -> Result<()> {
        let alternates = self.git_dir().join(ALTERNATES_FILE);
        if let Some(info_dir) = alternates.parent() {
            fs::create_dir_all(info_dir)?;
        }

        let objects = other.git_dir().join(OBJECTS_DIR);
        fs::write(alternates, format!("{}\n", objects.display()))?;
        Ok(())
    }

    fn ref_path(&self, name: &str) -> Result<PathBuf> {
        let escapes = Path::new(name)
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(GitError::Usage(format!("invalid ref name `{name}'")).into());
        }

        Ok(self.git_dir().join(REFS_DIR).join(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PoolError;
    use tempfile::TempDir;

    fn repository_with_refs() -> (TempDir, Repository) {
        let temp_dir = TempDir::new().unwrap();
        let refs = temp_dir.path().join(".git/refs");
        fs::create_dir_all(refs.join("heads")).unwrap();
        fs::create_dir_all(refs.join("tags")).unwrap();
        fs::write(refs.join("heads/main"), "1111\n").unwrap();
        fs::write(refs.join("heads/devel"), "2222\n").unwrap();
        fs::write(refs.join("tags/v1.0"), "3333\n").unwrap();

        let repository = Repository::open(temp_dir.path()).unwrap();
        (temp_dir, repository)
    }

    #[test]
    fn test_list_refs_is_sorted() {
        let (_guard, repository) = repository_with_refs();

        assert_eq!(repository.list_heads().unwrap(), vec!["devel", "main"]);
        assert_eq!(repository.list_tags().unwrap(), vec!["v1.0"]);
    }

    #[test]
    fn test_list_refs_missing_namespace() {
        let (_guard, repository) = repository_with_refs();

        assert!(matches!(
            repository.list_refs("remotes"),
            Err(PoolError::Io(_))
        ));
    }

    #[test]
    fn test_ref_names_cannot_escape() {
        let (_guard, repository) = repository_with_refs();

        for name in ["../config", "heads/../../HEAD", "/etc/passwd"] {
            assert!(matches!(
                repository.remove_ref(name),
                Err(PoolError::Git(GitError::Usage(_)))
            ));
        }
        assert!(repository.git_dir().join("refs/heads/main").exists());
    }

    #[test]
    fn test_remove_ref_is_idempotent() {
        let (_guard, repository) = repository_with_refs();

        repository.remove_ref("heads/devel").unwrap();
        repository.remove_ref("heads/devel").unwrap();
        repository.remove_ref("heads/never-existed").unwrap();

        assert_eq!(repository.list_heads().unwrap(), vec!["main"]);
    }

    #[test]
    fn test_set_alternates() {
        let (_guard, repository) = repository_with_refs();
        let (_other_guard, other) = repository_with_refs();

        repository.set_alternates(&other).unwrap();

        let contents =
            fs::read_to_string(repository.git_dir().join("objects/info/alternates")).unwrap();
        assert_eq!(
            contents,
            format!("{}\n", other.git_dir().join("objects").display())
        );
    }
}
