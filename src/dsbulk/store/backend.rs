use super::snapshot::Snapshot;
use crate::error::Result;

/// Raw storage I/O for a repository snapshot.
///
/// The backend handles the "how" (a JSON file, memory), while
/// [`RepoStore`](super::repo_store::RepoStore) handles the "what": lookups,
/// edits and commit.
pub trait SnapshotBackend {
    /// Load the last committed snapshot.
    fn load(&self) -> Result<Snapshot>;

    /// Persist a snapshot. Called only on commit.
    fn save(&self, snapshot: &Snapshot) -> Result<()>;

    /// Store the bytes of a bitstream under its internal storage id.
    fn write_content(&self, internal_id: &str, content: &[u8]) -> Result<()>;

    /// Read back stored bitstream bytes, `None` if nothing is stored under the id.
    fn read_content(&self, internal_id: &str) -> Result<Option<Vec<u8>>>;

    /// Remove stored bytes. Removing an id with nothing stored is not an error.
    fn delete_content(&self, internal_id: &str) -> Result<()>;
}
