//! Fixture tree walker: `<root>/<group>/<file>`

use std::path::{Path, PathBuf};

use respcheck_core::fixture::parse_fixture;
use respcheck_core::{FixtureError, FixtureSet, FixtureSource, KeyRules, SkippedFixture};

/// Loads every file under each group directory of `root`, in sorted order.
#[derive(Debug, Clone)]
pub struct DirFixtureLoader {
    root: PathBuf,
    rules: KeyRules,
}

impl DirFixtureLoader {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, rules: KeyRules) -> Self {
        Self {
            root: root.into(),
            rules,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FixtureSource for DirFixtureLoader {
    fn load(&self) -> Result<FixtureSet, FixtureError> {
        let groups = sorted_entries(&self.root)?;
        let mut set = FixtureSet::default();

        for group_path in groups {
            if !group_path.is_dir() {
                tracing::debug!(path = %group_path.display(), "not a fixture group, ignoring");
                continue;
            }
            let group = file_name(&group_path);

            for path in sorted_entries(&group_path)? {
                if !path.is_file() {
                    continue;
                }
                let shown = format!("{group}/{}", file_name(&path));
                let parsed = std::fs::read_to_string(&path)
                    .map_err(|e| FixtureError::Io(format!("{}: {e}", path.display())))
                    .and_then(|text| parse_fixture(&group, &file_name(&path), &text, &self.rules));

                match parsed {
                    Ok(fixture) => set.fixtures.push(fixture),
                    Err(e) => {
                        tracing::warn!(fixture = %shown, error = %e, "invalid fixture, skipping");
                        set.skipped.push(SkippedFixture {
                            path: shown,
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        tracing::debug!(
            loaded = set.fixtures.len(),
            skipped = set.skipped.len(),
            root = %self.root.display(),
            "loaded fixtures"
        );
        Ok(set)
    }
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, FixtureError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| FixtureError::Io(format!("{}: {e}", dir.display())))?;
    let mut paths = entries
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| FixtureError::Io(format!("{}: {e}", dir.display())))?;
    paths.sort();
    Ok(paths)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const OK: &str = "HTTP/2 200\r\ncontent-type: application/json\r\n\r\n{\"id\": \"x\"}\r\n\r\nexpect_code: 200\r\n";

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn walks_groups_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "get_id/output_b.json", OK);
        write(dir.path(), "get_id/output_a.json", OK);
        write(dir.path(), "delete_id/output_gone.json", OK);
        write(dir.path(), "README.md", "not a group");

        let set = DirFixtureLoader::new(dir.path(), KeyRules::default())
            .load()
            .unwrap();
        let names: Vec<_> = set
            .fixtures
            .iter()
            .map(|f| format!("{}/{}", f.group, f.file_name))
            .collect();
        assert_eq!(
            names,
            [
                "delete_id/output_gone.json",
                "get_id/output_a.json",
                "get_id/output_b.json"
            ]
        );
        assert!(set.skipped.is_empty());
    }

    #[test]
    fn invalid_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "get_id/output_ok.json", OK);
        write(dir.path(), "get_id/output_bad.json", "HTTP/2 200\r\n\r\n{oops\r\n\r\nexpect_code: 200");
        write(dir.path(), "get_id/output_flat.json", "no sections here");

        let set = DirFixtureLoader::new(dir.path(), KeyRules::default())
            .load()
            .unwrap();
        assert_eq!(set.fixtures.len(), 1);
        let skipped: Vec<_> = set.skipped.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(skipped, ["get_id/output_bad.json", "get_id/output_flat.json"]);
        assert!(set.skipped[0].reason.starts_with("Invalid JSON body"));
    }

    #[test]
    fn missing_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let loader = DirFixtureLoader::new(dir.path().join("nope"), KeyRules::default());
        assert!(matches!(loader.load(), Err(FixtureError::Io(_))));
    }
}
