use super::backend::SnapshotBackend;
use super::repo_store::RepoStore;
use super::snapshot::Snapshot;
use crate::error::{BulkError, Result};
use std::fs;
use std::path::{Path, PathBuf};

const ASSETSTORE_DIR: &str = "assetstore";

/// Snapshot kept as a JSON document, bitstream bytes as files in an
/// `assetstore/` directory next to it.
pub struct FsBackend {
    path: PathBuf,
}

impl FsBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn assetstore(&self) -> PathBuf {
        self.path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
            .join(ASSETSTORE_DIR)
    }
}

impl SnapshotBackend for FsBackend {
    fn load(&self) -> Result<Snapshot> {
        if !self.path.exists() {
            return Err(BulkError::Repository(format!(
                "repository file {} does not exist",
                self.path.display()
            )));
        }
        let content = fs::read_to_string(&self.path).map_err(BulkError::Io)?;
        let snapshot: Snapshot = serde_json::from_str(&content).map_err(BulkError::Serialization)?;
        Ok(snapshot)
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let content = serde_json::to_string_pretty(snapshot).map_err(BulkError::Serialization)?;
        // Write beside the target and rename so a failed write never truncates it.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).map_err(BulkError::Io)?;
        fs::rename(&tmp, &self.path).map_err(BulkError::Io)?;
        Ok(())
    }

    fn write_content(&self, internal_id: &str, content: &[u8]) -> Result<()> {
        let dir = self.assetstore();
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(BulkError::Io)?;
        }
        fs::write(dir.join(internal_id), content).map_err(BulkError::Io)?;
        Ok(())
    }

    fn read_content(&self, internal_id: &str) -> Result<Option<Vec<u8>>> {
        let path = self.assetstore().join(internal_id);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read(path).map_err(BulkError::Io)?))
    }

    fn delete_content(&self, internal_id: &str) -> Result<()> {
        match fs::remove_file(self.assetstore().join(internal_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BulkError::Io(e)),
        }
    }
}

pub type JsonRepository = RepoStore<FsBackend>;

impl JsonRepository {
    /// Open the repository stored at `path`. A missing or unreadable file is fatal.
    pub fn open_path(path: impl Into<PathBuf>) -> Result<Self> {
        RepoStore::open(FsBackend::new(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DsoRef, MetadataField, ObjectType};
    use crate::store::ContentRepository;

    const SAMPLE: &str = r#"{
        "collections": [{"id": 1, "handle": "1/1", "name": "C1", "items": [2]}],
        "items": [{"id": 2, "owning_collection": 1, "bundles": [3]}],
        "bundles": [{"id": 3, "name": "ORIGINAL", "bitstreams": [4]}],
        "bitstreams": [{"id": 4, "name": "a.pdf", "mimeType": "application/pdf", "size": 100,
            "internalId": "x", "checksum": "00", "checksumAlgorithm": "MD5"}]
    }"#;

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = JsonRepository::open_path(dir.path().join("nope.json"));
        assert!(matches!(result, Err(BulkError::Repository(_))));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repo.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            JsonRepository::open_path(&path),
            Err(BulkError::Serialization(_))
        ));
    }

    #[test]
    fn commit_persists_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repo.json");
        fs::write(&path, SAMPLE).unwrap();

        let item = DsoRef::new(ObjectType::Item, 2);
        let title = MetadataField::new("dc", "title", None);
        let mut repo = JsonRepository::open_path(&path).unwrap();
        repo.set_metadata(item, &title, vec!["Stored".into()])
            .unwrap();
        repo.commit().unwrap();

        let reopened = JsonRepository::open_path(&path).unwrap();
        assert_eq!(reopened.name_of(item).unwrap().as_deref(), Some("Stored"));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn uncommitted_edits_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repo.json");
        fs::write(&path, SAMPLE).unwrap();

        let item = DsoRef::new(ObjectType::Item, 2);
        let title = MetadataField::new("dc", "title", None);
        {
            let mut repo = JsonRepository::open_path(&path).unwrap();
            repo.set_metadata(item, &title, vec!["Lost".into()])
                .unwrap();
        }
        let reopened = JsonRepository::open_path(&path).unwrap();
        assert_eq!(reopened.name_of(item).unwrap(), None);
    }

    #[test]
    fn replaced_content_lands_in_assetstore() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repo.json");
        fs::write(&path, SAMPLE).unwrap();

        let bs = DsoRef::new(ObjectType::Bitstream, 4);
        let mut repo = JsonRepository::open_path(&path).unwrap();
        let info = repo.replace_bitstream(bs, b"new bytes", "text/plain").unwrap();
        assert!(dir.path().join("assetstore").join(&info.internal_id).exists());
        assert_eq!(repo.bitstream_content(bs).unwrap().unwrap(), b"new bytes");
    }

    fn assetstore_files(dir: &Path) -> Vec<String> {
        match fs::read_dir(dir.join(ASSETSTORE_DIR)) {
            Ok(entries) => entries
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    #[test]
    fn dropped_session_removes_its_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repo.json");
        fs::write(&path, SAMPLE).unwrap();
        let bitstream = DsoRef::new(ObjectType::Bitstream, 4);

        {
            let mut repo = JsonRepository::open_path(&path).unwrap();
            repo.replace_bitstream(bitstream, b"draft", "text/plain")
                .unwrap();
            assert_eq!(assetstore_files(dir.path()).len(), 1);
        }
        assert!(assetstore_files(dir.path()).is_empty());
        let reopened = JsonRepository::open_path(&path).unwrap();
        assert_eq!(reopened.bitstream_info(bitstream).unwrap().internal_id, "x");
    }

    #[test]
    fn commit_keeps_only_current_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repo.json");
        fs::write(&path, SAMPLE).unwrap();
        let bitstream = DsoRef::new(ObjectType::Bitstream, 4);

        let mut repo = JsonRepository::open_path(&path).unwrap();
        repo.replace_bitstream(bitstream, b"one", "text/plain")
            .unwrap();
        repo.commit().unwrap();
        let current = repo
            .replace_bitstream(bitstream, b"two", "text/plain")
            .unwrap();
        repo.commit().unwrap();
        drop(repo);

        assert_eq!(assetstore_files(dir.path()), vec![current.internal_id]);
    }
}
