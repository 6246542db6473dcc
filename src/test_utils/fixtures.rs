use std::path::PathBuf;

use tempfile::TempDir;

use crate::core::SkillRecord;
use crate::storage::SkillStore;

/// Test fixture providing an isolated store root.
pub struct UnitTestFixture {
    pub temp_dir: TempDir,
    pub data_path: PathBuf,
}

impl Default for UnitTestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitTestFixture {
    #[must_use]
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_path = temp_dir.path().to_path_buf();

        println!("[FIXTURE] Created temp directory: {data_path:?}");

        Self {
            temp_dir,
            data_path,
        }
    }

    /// Open a store rooted in the fixture directory.
    #[must_use]
    pub fn store(&self) -> SkillStore {
        SkillStore::open(&self.data_path).expect("Failed to open store")
    }

    /// Write a stored skill owned by `owner`, with `# <name>` as content.
    pub fn create_skill(&self, name: &str, owner: &str) -> SkillRecord {
        let mut record = SkillRecord::new(name, format!("https://github.com/{owner}/skills"));
        record.content = format!("# {name}");
        self.store().write(&record).expect("Failed to write skill");
        println!("[FIXTURE] Created skill: {name} ({owner})");
        record
    }
}

impl Drop for UnitTestFixture {
    fn drop(&mut self) {
        println!("[FIXTURE] Cleaning up temp directory: {:?}", self.data_path);
    }
}
