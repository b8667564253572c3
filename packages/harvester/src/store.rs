//! Persistence of the last committed version per category.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::extract::VersionToken;

/// Key → version persistence consulted by the pipeline runner.
pub trait VersionStore {
    /// Last committed version of `category`, if any.
    fn last_version(&self, category: &str) -> Result<Option<String>>;

    /// Record `version` as fully harvested for `category`.
    fn commit(
        &mut self,
        category: &str,
        version: &VersionToken,
        document_count: usize,
    ) -> Result<()>;
}

/// One committed harvest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedVersion {
    pub version: String,
    pub committed_at: String,
    pub document_count: usize,
}

impl CommittedVersion {
    fn now(version: &VersionToken, document_count: usize) -> Self {
        Self {
            version: version.as_str().to_string(),
            committed_at: Utc::now().to_rfc3339(),
            document_count,
        }
    }
}

/// In-process store; forgets everything on drop.
#[derive(Debug, Clone, Default)]
pub struct MemoryVersionStore {
    entries: BTreeMap<String, CommittedVersion>,
}

impl MemoryVersionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, category: &str) -> Option<&CommittedVersion> {
        self.entries.get(category)
    }
}

impl VersionStore for MemoryVersionStore {
    fn last_version(&self, category: &str) -> Result<Option<String>> {
        Ok(self.entries.get(category).map(|e| e.version.clone()))
    }

    fn commit(
        &mut self,
        category: &str,
        version: &VersionToken,
        document_count: usize,
    ) -> Result<()> {
        self.entries.insert(
            category.to_string(),
            CommittedVersion::now(version, document_count),
        );
        Ok(())
    }
}

/// On-disk layout of the state file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    categories: BTreeMap<String, CommittedVersion>,
}

/// YAML state file mapping category → committed version.
///
/// A missing file is an empty store. Every commit rewrites the file through
/// a temporary sibling and a rename.
#[derive(Debug, Clone)]
pub struct FileVersionStore {
    path: PathBuf,
    state: StateFile,
}

impl FileVersionStore {
    /// Open the store at `path`, reading it if it exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                StateFile::default()
            } else {
                serde_yaml_ng::from_str(&content)?
            }
        } else {
            StateFile::default()
        };

        tracing::debug!(
            path = %path.display(),
            categories = state.categories.len(),
            "State file loaded"
        );
        Ok(Self { path, state })
    }

    #[must_use]
    pub fn get(&self, category: &str) -> Option<&CommittedVersion> {
        self.state.categories.get(category)
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml_ng::to_string(&self.state)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, format!("---\n{yaml}"))?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl VersionStore for FileVersionStore {
    fn last_version(&self, category: &str) -> Result<Option<String>> {
        Ok(self.get(category).map(|e| e.version.clone()))
    }

    fn commit(
        &mut self,
        category: &str,
        version: &VersionToken,
        document_count: usize,
    ) -> Result<()> {
        self.state.categories.insert(
            category.to_string(),
            CommittedVersion::now(version, document_count),
        );
        self.save()?;
        tracing::info!(
            category,
            version = %version,
            path = %self.path.display(),
            "Version committed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_commit() {
        let mut store = MemoryVersionStore::new();
        assert_eq!(store.last_version("eez").unwrap(), None);

        store.commit("eez", &VersionToken::new("v1"), 12).unwrap();
        assert_eq!(store.last_version("eez").unwrap(), Some("v1".to_string()));
        assert_eq!(store.get("eez").unwrap().document_count, 12);
        assert_eq!(store.last_version("lme").unwrap(), None);
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileVersionStore::open(dir.path().join("state.yaml")).unwrap();
        assert_eq!(store.last_version("eez").unwrap(), None);
    }

    #[test]
    fn test_file_store_persists_across_opens() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state.yaml");

        let mut store = FileVersionStore::open(&path).unwrap();
        store.commit("eez", &VersionToken::new("v1"), 3).unwrap();
        store.commit("taxon", &VersionToken::new("v7"), 40).unwrap();

        let reopened = FileVersionStore::open(&path).unwrap();
        assert_eq!(
            reopened.last_version("eez").unwrap(),
            Some("v1".to_string())
        );
        assert_eq!(reopened.get("taxon").unwrap().document_count, 40);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("---\n"));
        assert!(content.contains("version: v1"));
        assert!(!dir.path().join("nested").join("state.yaml.tmp").exists());
    }

    #[test]
    fn test_file_store_rejects_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.yaml");
        fs::write(&path, "categories: [not, a, map]").unwrap();

        assert!(FileVersionStore::open(&path).is_err());
    }
}
