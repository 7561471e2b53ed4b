use super::backend::SnapshotBackend;
use super::snapshot::{MetadataValue, PolicyRecord, Snapshot};
use super::{AuthorizationService, ContentRepository};
use crate::error::{BulkError, Result};
use crate::model::{
    BitstreamInfo, DsoRef, MetadataField, ObjectType, Policy, PolicyAction, Principal,
};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const CHECKSUM_ALGORITHM: &str = "SHA-256";

/// Repository session over a snapshot loaded from a backend.
///
/// Edits only touch the in-memory snapshot until [`commit`](ContentRepository::commit)
/// hands it back to the backend. Dropping the store without committing
/// discards them.
///
/// Replacement content has to be stored before the snapshot can point at
/// it, so it is written right away and tracked: content the committed
/// snapshot no longer refers to is deleted after the commit, and content
/// written by a session that is dropped uncommitted is deleted with it.
pub struct RepoStore<B: SnapshotBackend> {
    pub(crate) backend: B,
    snapshot: Snapshot,
    dirty: bool,
    /// Content ids written since the last commit.
    written: Vec<String>,
    /// Content ids replaced since the last commit.
    superseded: Vec<String>,
}

impl<B: SnapshotBackend> RepoStore<B> {
    pub fn open(backend: B) -> Result<Self> {
        let snapshot = backend.load()?;
        debug!(
            communities = snapshot.communities.len(),
            collections = snapshot.collections.len(),
            items = snapshot.items.len(),
            bitstreams = snapshot.bitstreams.len(),
            "repository loaded"
        );
        Ok(Self::from_parts(backend, snapshot))
    }

    pub(crate) fn from_parts(backend: B, snapshot: Snapshot) -> Self {
        Self {
            backend,
            snapshot,
            dirty: false,
            written: Vec::new(),
            superseded: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// True when there are edits that have not been committed.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Delete content written since the last commit.
    fn discard_written(&mut self) {
        for id in self.written.drain(..) {
            if let Err(e) = self.backend.delete_content(&id) {
                warn!(internal_id = %id, error = %e, "could not remove uncommitted content");
            }
        }
        self.superseded.clear();
    }

    /// Bytes currently stored for a bitstream.
    pub fn bitstream_content(&self, bitstream: DsoRef) -> Result<Option<Vec<u8>>> {
        let record = self.snapshot.bitstream(bitstream)?;
        self.backend.read_content(&record.info.internal_id)
    }
}

impl<B: SnapshotBackend> ContentRepository for RepoStore<B> {
    fn exists(&self, obj: DsoRef) -> Result<bool> {
        Ok(self.snapshot.contains(obj))
    }

    fn resolve_handle(&self, handle: &str) -> Result<Option<DsoRef>> {
        Ok(self.snapshot.find_handle(handle))
    }

    fn handle_of(&self, obj: DsoRef) -> Result<Option<String>> {
        self.snapshot.handle(obj)
    }

    fn parent_of(&self, obj: DsoRef) -> Result<Option<DsoRef>> {
        self.snapshot.parent(obj)
    }

    fn collections_of(&self, community: DsoRef) -> Result<Vec<DsoRef>> {
        self.snapshot.collections_of(community)
    }

    fn items_of(&self, collection: DsoRef) -> Result<Vec<DsoRef>> {
        self.snapshot.items_of(collection)
    }

    fn bundles_of(&self, item: DsoRef) -> Result<Vec<DsoRef>> {
        self.snapshot.bundles_of(item)
    }

    fn bitstreams_of(&self, bundle: DsoRef) -> Result<Vec<DsoRef>> {
        self.snapshot.bitstreams_of(bundle)
    }

    fn bundles_containing(&self, bitstream: DsoRef) -> Result<Vec<DsoRef>> {
        self.snapshot.bundles_containing(bitstream)
    }

    fn items_containing(&self, bundle: DsoRef) -> Result<Vec<DsoRef>> {
        self.snapshot.items_containing(bundle)
    }

    fn name_of(&self, obj: DsoRef) -> Result<Option<String>> {
        self.snapshot.name(obj)
    }

    fn is_withdrawn(&self, item: DsoRef) -> Result<bool> {
        Ok(self.snapshot.item(item)?.withdrawn)
    }

    fn is_embargoed(&self, bundle: DsoRef) -> Result<bool> {
        Ok(self.snapshot.bundle(bundle)?.embargoed)
    }

    fn template_item_of(&self, collection: DsoRef) -> Result<Option<DsoRef>> {
        Ok(self
            .snapshot
            .collection(collection)?
            .template_item
            .map(|id| DsoRef::new(ObjectType::Item, id)))
    }

    fn bitstream_info(&self, bitstream: DsoRef) -> Result<BitstreamInfo> {
        Ok(self.snapshot.bitstream(bitstream)?.info.clone())
    }

    fn metadata_values(&self, item: DsoRef, field: &MetadataField) -> Result<Vec<String>> {
        self.snapshot.metadata_values(item, field)
    }

    fn set_metadata(
        &mut self,
        item: DsoRef,
        field: &MetadataField,
        values: Vec<String>,
    ) -> Result<()> {
        let record = self.snapshot.item_mut(item)?;
        record.metadata.retain(|m| &m.field != field);
        record
            .metadata
            .extend(values.into_iter().map(|value| MetadataValue {
                field: field.clone(),
                value,
            }));
        self.dirty = true;
        Ok(())
    }

    fn add_metadata(&mut self, item: DsoRef, field: &MetadataField, value: String) -> Result<()> {
        let record = self.snapshot.item_mut(item)?;
        record.metadata.push(MetadataValue {
            field: field.clone(),
            value,
        });
        self.dirty = true;
        Ok(())
    }

    fn replace_bitstream(
        &mut self,
        bitstream: DsoRef,
        content: &[u8],
        mime_type: &str,
    ) -> Result<BitstreamInfo> {
        // Fail on a missing bitstream before anything is written.
        self.snapshot.bitstream(bitstream)?;

        let internal_id = Uuid::new_v4().simple().to_string();
        let checksum = {
            let mut hasher = Sha256::new();
            hasher.update(content);
            format!("{:x}", hasher.finalize())
        };
        self.backend.write_content(&internal_id, content)?;

        self.written.push(internal_id.clone());

        let record = self.snapshot.bitstream_mut(bitstream)?;
        let previous = std::mem::replace(&mut record.info.internal_id, internal_id);
        if !previous.is_empty() {
            self.superseded.push(previous);
        }
        record.info.checksum = checksum;
        record.info.checksum_algorithm = CHECKSUM_ALGORITHM.to_string();
        record.info.size = content.len() as i64;
        record.info.mime_type = mime_type.to_string();
        self.dirty = true;
        Ok(record.info.clone())
    }

    fn commit(&mut self) -> Result<()> {
        if !self.dirty {
            debug!("nothing to commit");
            return Ok(());
        }
        self.backend.save(&self.snapshot)?;
        self.dirty = false;
        self.written.clear();
        for id in self.superseded.drain(..) {
            if let Err(e) = self.backend.delete_content(&id) {
                warn!(internal_id = %id, error = %e, "could not remove superseded content");
            }
        }
        info!("changes committed");
        Ok(())
    }
}

impl<B: SnapshotBackend> Drop for RepoStore<B> {
    fn drop(&mut self) {
        if !self.written.is_empty() {
            debug!(count = self.written.len(), "discarding uncommitted content");
            self.discard_written();
        }
    }
}

impl<B: SnapshotBackend> AuthorizationService for RepoStore<B> {
    fn find_eperson(&self, email: &str) -> Result<Option<Principal>> {
        Ok(self
            .snapshot
            .epeople
            .values()
            .find(|e| e.email.eq_ignore_ascii_case(email))
            .map(|e| Principal::EPerson(e.email.clone())))
    }

    fn find_group(&self, name: &str) -> Result<Option<Principal>> {
        Ok(self
            .snapshot
            .groups
            .values()
            .find(|g| g.name == name)
            .map(|g| Principal::Group(g.name.clone())))
    }

    fn policies_of(&self, obj: DsoRef) -> Result<Vec<Policy>> {
        if !self.snapshot.contains(obj) {
            return Err(BulkError::NotFound(obj));
        }
        Ok(self
            .snapshot
            .policies
            .iter()
            .filter(|p| p.object == obj)
            .map(|p| p.policy.clone())
            .collect())
    }

    fn add_policy(&mut self, obj: DsoRef, policy: Policy) -> Result<()> {
        if !self.snapshot.contains(obj) {
            return Err(BulkError::NotFound(obj));
        }
        self.snapshot.policies.push(PolicyRecord {
            object: obj,
            policy,
        });
        self.dirty = true;
        Ok(())
    }

    fn remove_policies(
        &mut self,
        obj: DsoRef,
        action: PolicyAction,
        principal: &Principal,
    ) -> Result<usize> {
        if !self.snapshot.contains(obj) {
            return Err(BulkError::NotFound(obj));
        }
        let before = self.snapshot.policies.len();
        self.snapshot.policies.retain(|p| {
            !(p.object == obj && p.policy.action == action && &p.policy.principal == principal)
        });
        let removed = before - self.snapshot.policies.len();
        if removed > 0 {
            self.dirty = true;
        }
        Ok(removed)
    }
}
