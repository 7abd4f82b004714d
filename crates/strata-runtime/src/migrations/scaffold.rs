use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use strata_core::error::{Result, StrataError};
use strata_core::migration::Direction;

/// Paths of a freshly created up/down script pair.
#[derive(Debug, Clone)]
pub struct ScaffoldedMigration {
    pub name: String,
    pub up_path: PathBuf,
    pub down_path: PathBuf,
}

/// Create an empty `<timestamp>_<name>` script pair in `dir`.
///
/// The directory is created if needed. Existing files are never overwritten.
pub fn create_migration(dir: &Path, name: &str) -> Result<ScaffoldedMigration> {
    create_migration_at(dir, name, Utc::now())
}

fn create_migration_at(dir: &Path, name: &str, now: DateTime<Utc>) -> Result<ScaffoldedMigration> {
    let slug = slugify(name);
    if slug.is_empty() {
        return Err(StrataError::Config(format!(
            "invalid migration name '{}'",
            name
        )));
    }

    let name = format!("{}_{}", now.format("%Y%m%d%H%M%S"), slug);
    let up_path = dir.join(format!("{}{}", name, Direction::Up.suffix()));
    let down_path = dir.join(format!("{}{}", name, Direction::Down.suffix()));

    for path in [&up_path, &down_path] {
        if path.exists() {
            return Err(StrataError::Config(format!(
                "migration script {} already exists",
                path.display()
            )));
        }
    }

    std::fs::create_dir_all(dir)?;

    let created = now.format("%Y-%m-%d %H:%M:%S UTC");
    std::fs::write(
        &up_path,
        format!("-- Migration: {}\n-- Created at: {}\n\n", name, created),
    )?;
    std::fs::write(
        &down_path,
        format!("-- Revert: {}\n-- Created at: {}\n\n", name, created),
    )?;

    Ok(ScaffoldedMigration {
        name,
        up_path,
        down_path,
    })
}

/// Lowercase, with runs of anything but letters and digits collapsed to `_`.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_end_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Add Users Table"), "add_users_table");
        assert_eq!(slugify("  add--email!! "), "add_email");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_create_migration_pair() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("migrations");
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();

        let created = create_migration_at(&target, "create users", now).unwrap();

        assert_eq!(created.name, "20240301123000_create_users");
        assert!(created.up_path.ends_with("20240301123000_create_users.up.sql"));
        assert!(created.down_path.ends_with("20240301123000_create_users.dn.sql"));
        let up = std::fs::read_to_string(&created.up_path).unwrap();
        assert!(up.starts_with("-- Migration: 20240301123000_create_users"));
        assert!(created.down_path.exists());
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();

        create_migration_at(dir.path(), "init", now).unwrap();
        let err = create_migration_at(dir.path(), "init", now).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_rejects_empty_name() {
        let dir = TempDir::new().unwrap();
        assert!(create_migration(dir.path(), "---").is_err());
    }
}
