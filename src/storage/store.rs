//! File-backed skill store.
//!
//! Layout under the store root:
//!
//! ```text
//! skills/<name>.json        metadata document
//! content/<name>/SKILL.md   primary document
//! content/<name>/<path>     auxiliary files
//! index.json                aggregate of every metadata document
//! ```

use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::core::{PRIMARY_DOCUMENT, SkillRecord};
use crate::error::{Result, SyncError};

const SKILLS_DIR: &str = "skills";
const CONTENT_DIR: &str = "content";
const INDEX_FILE: &str = "index.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexMeta {
    pub generated_at: DateTime<Utc>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillIndex {
    pub meta: IndexMeta,
    pub skills: Vec<SkillRecord>,
}

#[derive(Debug, Clone)]
pub struct SkillStore {
    root: PathBuf,
}

impl SkillStore {
    /// Open (creating if needed) the store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(SKILLS_DIR))?;
        fs::create_dir_all(root.join(CONTENT_DIR))?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    pub fn metadata_path(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(SKILLS_DIR).join(format!("{name}.json")))
    }

    pub fn content_dir(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(CONTENT_DIR).join(name))
    }

    /// Load the metadata for `name`.
    ///
    /// A malformed document is treated as absent so the next sync rewrites it.
    pub fn load(&self, name: &str) -> Result<Option<SkillRecord>> {
        let path = self.metadata_path(name)?;
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)?;
        match serde_json::from_str(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring malformed skill metadata");
                Ok(None)
            }
        }
    }

    /// Read the stored primary document for `name`, if present.
    pub fn load_content(&self, name: &str) -> Result<Option<String>> {
        let path = self.content_dir(name)?.join(PRIMARY_DOCUMENT);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    /// Every readable metadata document, sorted by name.
    pub fn load_all(&self) -> Result<Vec<SkillRecord>> {
        let dir = self.root.join(SKILLS_DIR);
        let mut records = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let raw = fs::read_to_string(&path)?;
            match serde_json::from_str::<SkillRecord>(&raw) {
                Ok(record) => records.push(record),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping malformed skill metadata");
                }
            }
        }
        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }

    /// Persist metadata and content for `record`.
    ///
    /// The content directory is staged next to its final location and
    /// swapped in, so files dropped upstream do not linger. Metadata is
    /// written last: if anything before it fails, the stored metadata still
    /// describes the previous content and the next sync retries the skill.
    /// Auxiliary paths that would escape the directory are refused with a
    /// warning.
    pub fn write(&self, record: &SkillRecord) -> Result<()> {
        let metadata_path = self.metadata_path(&record.name)?;
        let dir = self.content_dir(&record.name)?;

        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(self.root.join(CONTENT_DIR))?;
        fs::write(staging.path().join(PRIMARY_DOCUMENT), &record.content)?;
        for (relative, body) in &record.files {
            let Some(relative_path) = safe_relative_path(relative) else {
                warn!(skill = %record.name, path = %relative, "refusing unsafe auxiliary path");
                continue;
            };
            let target = staging.path().join(relative_path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, body)?;
        }

        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        fs::rename(staging.path(), &dir)?;

        let json = serde_json::to_string_pretty(record)?;
        write_atomic(&metadata_path, json.as_bytes())?;

        debug!(skill = %record.name, files = record.files.len(), "skill written");
        Ok(())
    }

    /// Rewrite `index.json` from the metadata documents on disk.
    pub fn rebuild_index(&self) -> Result<SkillIndex> {
        let skills = self.load_all()?;
        let index = SkillIndex {
            meta: IndexMeta {
                generated_at: Utc::now(),
                total: skills.len(),
            },
            skills,
        };
        let json = serde_json::to_string_pretty(&index)?;
        write_atomic(&self.index_path(), json.as_bytes())?;
        debug!(total = index.meta.total, "index rebuilt");
        Ok(index)
    }

    pub fn read_index(&self) -> Result<Option<SkillIndex>> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }
}

fn validate_name(name: &str) -> Result<()> {
    let valid = !name.trim().is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains('\0');
    if valid {
        Ok(())
    } else {
        Err(SyncError::InvalidSkill(format!(
            "'{name}' cannot be used as a store key"
        )))
    }
}

/// Relative path confined to its base directory, or `None`.
#[must_use]
pub fn safe_relative_path(path: &str) -> Option<PathBuf> {
    if path.is_empty() || path.contains('\\') {
        return None;
    }
    let mut out = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if out.as_os_str().is_empty() {
        None
    } else {
        Some(out)
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| SyncError::Io(std::io::Error::other("path has no parent")))?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| SyncError::Io(err.error))?;
    Ok(())
}
