//! Locates migration scripts on disk.
//!
//! Scripts are named `<name>.up.sql` and `<name>.dn.sql`. Only the top level of
//! the directory is scanned. Forward candidates come out in ascending name
//! order and backward candidates in descending order, whatever order the
//! file system lists them in.

use std::path::PathBuf;

use tracing::debug;

use strata_core::error::{Result, StrataError};
use strata_core::migration::{Direction, MigrationScript};

/// A script file found for one direction. Its SQL is read on [`load`](Self::load).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptCandidate {
    pub name: String,
    pub direction: Direction,
    pub path: PathBuf,
}

impl ScriptCandidate {
    /// Read the script text.
    pub fn load(&self) -> Result<MigrationScript> {
        let sql = std::fs::read_to_string(&self.path).map_err(|source| StrataError::ScriptRead {
            path: self.path.clone(),
            source,
        })?;

        Ok(MigrationScript {
            name: self.name.clone(),
            direction: self.direction,
            path: self.path.clone(),
            sql,
        })
    }
}

/// Enumerates migration scripts in one directory.
#[derive(Debug, Clone)]
pub struct ScriptResolver {
    dir: PathBuf,
}

impl ScriptResolver {
    /// Bind to `dir`, failing right away if it is not an existing directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(StrataError::DirectoryNotFound(dir));
        }
        Ok(Self { dir })
    }

    /// Every script for `direction`, in execution order. Script text is read
    /// per candidate through [`ScriptCandidate::load`]; calling this again
    /// rescans the directory.
    pub fn resolve(&self, direction: Direction) -> Result<Vec<ScriptCandidate>> {
        let mut candidates = Vec::new();

        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.path().is_file() {
                continue;
            }

            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                debug!("Skipping non UTF-8 file name {:?}", entry.path());
                continue;
            };

            if let Some(name) = MigrationScript::name_from_file(file_name, direction) {
                candidates.push(ScriptCandidate {
                    name: name.to_string(),
                    direction,
                    path: entry.path(),
                });
            }
        }

        match direction {
            Direction::Up => candidates.sort_by(|a, b| a.name.cmp(&b.name)),
            Direction::Down => candidates.sort_by(|a, b| b.name.cmp(&a.name)),
        }

        debug!(
            "Found {} {} scripts in {}",
            candidates.len(),
            direction,
            self.dir.display()
        );
        Ok(candidates)
    }

    /// Whether a script exists for `name` in `direction`.
    pub fn has_script(&self, name: &str, direction: Direction) -> bool {
        self.dir
            .join(format!("{}{}", name, direction.suffix()))
            .is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn names(candidates: &[ScriptCandidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_missing_directory() {
        let err = ScriptResolver::new("/nonexistent/migrations").unwrap_err();
        assert!(matches!(err, StrataError::DirectoryNotFound(_)));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_file_is_not_a_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("migrations");
        fs::write(&file, "").unwrap();

        assert!(ScriptResolver::new(&file).is_err());
    }

    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        let resolver = ScriptResolver::new(dir.path()).unwrap();
        assert!(resolver.resolve(Direction::Up).unwrap().is_empty());
        assert!(resolver.resolve(Direction::Down).unwrap().is_empty());
    }

    #[test]
    fn test_forward_candidates_sorted_ascending() {
        let dir = TempDir::new().unwrap();

        // Created out of order
        fs::write(dir.path().join("003_index.up.sql"), "SELECT 3;").unwrap();
        fs::write(dir.path().join("001_init.up.sql"), "SELECT 1;").unwrap();
        fs::write(dir.path().join("002_add_col.up.sql"), "SELECT 2;").unwrap();

        let resolver = ScriptResolver::new(dir.path()).unwrap();
        let candidates = resolver.resolve(Direction::Up).unwrap();
        assert_eq!(names(&candidates), ["001_init", "002_add_col", "003_index"]);
    }

    #[test]
    fn test_backward_candidates_sorted_descending() {
        let dir = TempDir::new().unwrap();

        fs::write(dir.path().join("001_init.dn.sql"), "").unwrap();
        fs::write(dir.path().join("003_index.dn.sql"), "").unwrap();
        fs::write(dir.path().join("002_add_col.dn.sql"), "").unwrap();

        let resolver = ScriptResolver::new(dir.path()).unwrap();
        let candidates = resolver.resolve(Direction::Down).unwrap();
        assert_eq!(names(&candidates), ["003_index", "002_add_col", "001_init"]);
    }

    #[test]
    fn test_filters_by_direction_suffix() {
        let dir = TempDir::new().unwrap();

        fs::write(dir.path().join("001_init.up.sql"), "CREATE TABLE t (id INTEGER);").unwrap();
        fs::write(dir.path().join("001_init.dn.sql"), "DROP TABLE t;").unwrap();
        fs::write(dir.path().join("002_plain.sql"), "SELECT 1;").unwrap();
        fs::write(dir.path().join("readme.txt"), "Not a migration").unwrap();
        fs::create_dir(dir.path().join("004_dir.up.sql")).unwrap();

        let resolver = ScriptResolver::new(dir.path()).unwrap();
        assert_eq!(names(&resolver.resolve(Direction::Up).unwrap()), ["001_init"]);
        assert_eq!(names(&resolver.resolve(Direction::Down).unwrap()), ["001_init"]);
    }

    #[test]
    fn test_subdirectories_are_not_scanned() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/001_init.up.sql"), "SELECT 1;").unwrap();

        let resolver = ScriptResolver::new(dir.path()).unwrap();
        assert!(resolver.resolve(Direction::Up).unwrap().is_empty());
    }

    #[test]
    fn test_resolve_reads_script_text() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("001_init.up.sql"), "CREATE TABLE t (id INTEGER);").unwrap();

        let resolver = ScriptResolver::new(dir.path()).unwrap();
        let scripts: Vec<_> = resolver
            .resolve(Direction::Up)
            .unwrap()
            .iter()
            .map(|c| c.load())
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0].name, "001_init");
        assert_eq!(scripts[0].direction, Direction::Up);
        assert_eq!(scripts[0].sql, "CREATE TABLE t (id INTEGER);");

        // Rescanning yields the same sequence
        let again = resolver.resolve(Direction::Up).unwrap();
        assert_eq!(names(&again), ["001_init"]);
    }

    #[test]
    fn test_load_of_removed_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("001_init.up.sql"), "SELECT 1;").unwrap();

        let resolver = ScriptResolver::new(dir.path()).unwrap();
        let candidates = resolver.resolve(Direction::Up).unwrap();
        fs::remove_file(dir.path().join("001_init.up.sql")).unwrap();

        let err = candidates[0].load().unwrap_err();
        assert!(matches!(err, StrataError::ScriptRead { .. }));
    }

    #[test]
    fn test_has_script() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("001_init.up.sql"), "").unwrap();

        let resolver = ScriptResolver::new(dir.path()).unwrap();
        assert!(resolver.has_script("001_init", Direction::Up));
        assert!(!resolver.has_script("001_init", Direction::Down));
    }
}
