//! Operator list.
//!
//! Persisted as a JSON array of player names. Names are kept lowercase so
//! lookups ignore case, matching how the player registry compares names.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

/// Operator names with their backing file.
pub struct PermissionManager {
    path: PathBuf,
    ops: HashSet<String>,
}

impl PermissionManager {
    /// Load the ops list. A missing or unreadable file yields an empty list.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let ops = load_set(&path)
            .into_iter()
            .map(|name| name.to_ascii_lowercase())
            .collect();
        Self { path, ops }
    }

    pub fn is_op(&self, name: &str) -> bool {
        self.ops.contains(&name.to_ascii_lowercase())
    }

    /// Grant or revoke operator status and persist the change.
    /// Returns false when nothing changed.
    pub fn set_op(&mut self, name: &str, op: bool) -> bool {
        let name = name.to_ascii_lowercase();
        let changed = if op {
            self.ops.insert(name)
        } else {
            self.ops.remove(&name)
        };
        if changed {
            self.save();
        }
        changed
    }

    /// Save the ops list to disk.
    pub fn save(&self) {
        save_set(&self.path, &self.ops);
    }
}

/// Load a HashSet<String> from a JSON array file.
fn load_set(path: &Path) -> HashSet<String> {
    if !path.exists() {
        return HashSet::new();
    }
    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<Vec<String>>(&contents) {
            Ok(vec) => {
                info!("Loaded {} entries from {}", vec.len(), path.display());
                vec.into_iter().collect()
            }
            Err(e) => {
                warn!("Failed to parse {}: {e}", path.display());
                HashSet::new()
            }
        },
        Err(e) => {
            warn!("Failed to read {}: {e}", path.display());
            HashSet::new()
        }
    }
}

/// Save a HashSet<String> as a sorted JSON array.
fn save_set(path: &Path, set: &HashSet<String>) {
    let mut sorted: Vec<&String> = set.iter().collect();
    sorted.sort();
    match serde_json::to_string_pretty(&sorted) {
        Ok(json) => {
            if let Err(e) = fs::write(path, json) {
                warn!("Failed to write {}: {e}", path.display());
            }
        }
        Err(e) => warn!("Failed to serialize {}: {e}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_file(tag: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("classic_perm_test_{tag}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let _ = fs::create_dir_all(&dir);
        dir.join("ops.json")
    }

    #[test]
    fn missing_file_is_empty() {
        let pm = PermissionManager::load(temp_file("missing"));
        assert!(!pm.is_op("Steve"));
    }

    #[test]
    fn save_and_reload_ops() {
        let path = temp_file("reload");
        let mut pm = PermissionManager::load(&path);
        assert!(pm.set_op("Steve", true));
        assert!(pm.set_op("Alex", true));
        assert!(!pm.set_op("Alex", true));

        let pm2 = PermissionManager::load(&path);
        assert!(pm2.is_op("Steve"));
        assert!(pm2.is_op("Alex"));

        let written = fs::read_to_string(&path).unwrap();
        let names: Vec<String> = serde_json::from_str(&written).unwrap();
        assert_eq!(names, vec!["alex", "steve"]);
    }

    #[test]
    fn names_ignore_case() {
        let path = temp_file("case");
        let mut pm = PermissionManager::load(&path);
        assert!(pm.set_op("bob", true));
        assert!(pm.is_op("Bob"));
        assert!(!pm.set_op("BOB", true));
        assert!(pm.set_op("Bob", false));
        assert!(!pm.is_op("bob"));

        fs::write(&path, r#"["Steve"]"#).unwrap();
        assert!(PermissionManager::load(&path).is_op("steve"));
    }

    #[test]
    fn deop_persists() {
        let path = temp_file("deop");
        let mut pm = PermissionManager::load(&path);
        pm.set_op("Steve", true);
        assert!(pm.set_op("Steve", false));
        assert!(!pm.set_op("Steve", false));
        assert!(!PermissionManager::load(&path).is_op("Steve"));
    }

    #[test]
    fn unparsable_file_is_empty() {
        let path = temp_file("garbage");
        fs::write(&path, "{not json").unwrap();
        assert!(!PermissionManager::load(&path).is_op("Steve"));
    }
}
