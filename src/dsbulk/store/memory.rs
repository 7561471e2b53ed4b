use super::backend::SnapshotBackend;
use super::repo_store::RepoStore;
use super::snapshot::Snapshot;
use crate::error::{BulkError, Result};
use std::cell::RefCell;
use std::collections::HashMap;

/// In-memory snapshot backend for testing.
///
/// Uses `RefCell` for interior mutability since the tool is single-threaded,
/// which lets the backend trait stay `&self` throughout.
#[derive(Default)]
pub struct MemBackend {
    committed: RefCell<Snapshot>,
    content: RefCell<HashMap<String, Vec<u8>>>,
    saves: RefCell<usize>,
    simulate_write_error: RefCell<bool>,
    content_writes_left: RefCell<Option<usize>>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            committed: RefCell::new(snapshot),
            ..Self::default()
        }
    }

    /// Make every following write fail, for exercising error paths.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        *self.simulate_write_error.borrow_mut() = simulate;
    }

    /// Let `count` more content writes succeed, then fail the rest.
    pub fn fail_content_writes_after(&self, count: usize) {
        *self.content_writes_left.borrow_mut() = Some(count);
    }

    /// Number of successful saves (commits) so far.
    pub fn save_count(&self) -> usize {
        *self.saves.borrow()
    }

    /// Copy of the last saved snapshot.
    pub fn committed(&self) -> Snapshot {
        self.committed.borrow().clone()
    }
}

impl SnapshotBackend for MemBackend {
    fn load(&self) -> Result<Snapshot> {
        Ok(self.committed.borrow().clone())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if *self.simulate_write_error.borrow() {
            return Err(BulkError::Repository("Simulated write error".to_string()));
        }
        *self.committed.borrow_mut() = snapshot.clone();
        *self.saves.borrow_mut() += 1;
        Ok(())
    }

    fn write_content(&self, internal_id: &str, content: &[u8]) -> Result<()> {
        if *self.simulate_write_error.borrow() {
            return Err(BulkError::Repository("Simulated write error".to_string()));
        }
        if let Some(left) = self.content_writes_left.borrow_mut().as_mut() {
            if *left == 0 {
                return Err(BulkError::Repository("Simulated content write error".to_string()));
            }
            *left -= 1;
        }
        self.content
            .borrow_mut()
            .insert(internal_id.to_string(), content.to_vec());
        Ok(())
    }

    fn read_content(&self, internal_id: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.content.borrow().get(internal_id).cloned())
    }

    fn delete_content(&self, internal_id: &str) -> Result<()> {
        self.content.borrow_mut().remove(internal_id);
        Ok(())
    }
}

pub type InMemoryRepository = RepoStore<MemBackend>;

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::from_snapshot(Snapshot::default())
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        RepoStore::from_parts(MemBackend::with_snapshot(snapshot.clone()), snapshot)
    }

    pub fn backend(&self) -> &MemBackend {
        &self.backend
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::model::{BitstreamInfo, DsoRef, MetadataField, ObjectType};
    use crate::store::snapshot::{
        BitstreamRecord, BundleRecord, CollectionRecord, CommunityRecord, EPersonRecord,
        GroupRecord, ItemRecord, MetadataValue,
    };

    pub const HANDLE_PREFIX: &str = "123456789";

    /// Builds a repository hierarchy one object at a time.
    ///
    /// Ids are allocated from a single counter so every object in a fixture
    /// has a distinct id regardless of type.
    #[derive(Default)]
    pub struct RepoFixture {
        pub snapshot: Snapshot,
        next_id: i64,
    }

    impl RepoFixture {
        pub fn new() -> Self {
            Self::default()
        }

        fn allocate(&mut self) -> i64 {
            self.next_id += 1;
            self.next_id
        }

        fn handle(id: i64) -> Option<String> {
            Some(format!("{}/{}", HANDLE_PREFIX, id))
        }

        pub fn community(&mut self, name: &str) -> DsoRef {
            let id = self.allocate();
            self.snapshot.communities.insert(
                id,
                CommunityRecord {
                    id,
                    handle: Self::handle(id),
                    name: name.to_string(),
                    ..Default::default()
                },
            );
            DsoRef::new(ObjectType::Community, id)
        }

        pub fn collection(&mut self, community: Option<DsoRef>, name: &str) -> DsoRef {
            let id = self.allocate();
            self.snapshot.collections.insert(
                id,
                CollectionRecord {
                    id,
                    handle: Self::handle(id),
                    name: name.to_string(),
                    ..Default::default()
                },
            );
            if let Some(community) = community {
                if let Some(c) = self.snapshot.communities.get_mut(&community.id) {
                    c.collections.push(id);
                }
            }
            DsoRef::new(ObjectType::Collection, id)
        }

        /// An archived item owned by `collection`, titled if `title` is given.
        pub fn item(&mut self, collection: Option<DsoRef>, title: Option<&str>) -> DsoRef {
            let id = self.allocate();
            let metadata = title
                .map(|t| {
                    vec![MetadataValue {
                        field: MetadataField::new("dc", "title", None),
                        value: t.to_string(),
                    }]
                })
                .unwrap_or_default();
            self.snapshot.items.insert(
                id,
                ItemRecord {
                    id,
                    handle: Self::handle(id),
                    owning_collection: collection.map(|c| c.id),
                    archived: true,
                    withdrawn: false,
                    metadata,
                    bundles: Vec::new(),
                },
            );
            if let Some(collection) = collection {
                if let Some(c) = self.snapshot.collections.get_mut(&collection.id) {
                    c.items.push(id);
                }
            }
            DsoRef::new(ObjectType::Item, id)
        }

        pub fn metadata(&mut self, item: DsoRef, field: &str, value: &str) -> &mut Self {
            if let Some(record) = self.snapshot.items.get_mut(&item.id) {
                record.metadata.push(MetadataValue {
                    field: field.parse().expect("fixture metadata field"),
                    value: value.to_string(),
                });
            }
            self
        }

        pub fn bundle(&mut self, item: Option<DsoRef>, name: &str) -> DsoRef {
            let id = self.allocate();
            self.snapshot.bundles.insert(
                id,
                BundleRecord {
                    id,
                    name: name.to_string(),
                    ..Default::default()
                },
            );
            if let Some(item) = item {
                if let Some(i) = self.snapshot.items.get_mut(&item.id) {
                    i.bundles.push(id);
                }
            }
            DsoRef::new(ObjectType::Bundle, id)
        }

        pub fn bitstream(&mut self, bundle: Option<DsoRef>, name: &str, size: i64) -> DsoRef {
            let id = self.allocate();
            self.snapshot.bitstreams.insert(
                id,
                BitstreamRecord {
                    id,
                    info: BitstreamInfo {
                        name: name.to_string(),
                        mime_type: "application/octet-stream".to_string(),
                        size,
                        internal_id: format!("internal-{}", id),
                        checksum: format!("{:032x}", id),
                        checksum_algorithm: "MD5".to_string(),
                    },
                },
            );
            if let Some(bundle) = bundle {
                if let Some(b) = self.snapshot.bundles.get_mut(&bundle.id) {
                    b.bitstreams.push(id);
                }
            }
            DsoRef::new(ObjectType::Bitstream, id)
        }

        pub fn eperson(&mut self, email: &str) -> DsoRef {
            let id = self.allocate();
            self.snapshot.epeople.insert(
                id,
                EPersonRecord {
                    id,
                    email: email.to_string(),
                },
            );
            DsoRef::new(ObjectType::EPerson, id)
        }

        pub fn group(&mut self, name: &str) -> DsoRef {
            let id = self.allocate();
            self.snapshot.groups.insert(
                id,
                GroupRecord {
                    id,
                    name: name.to_string(),
                },
            );
            DsoRef::new(ObjectType::Group, id)
        }

        pub fn build(self) -> InMemoryRepository {
            InMemoryRepository::from_snapshot(self.snapshot)
        }
    }

    /// The hierarchy used across the engine tests.
    ///
    /// ```text
    /// Community "Science"
    /// └── Collection "C1"
    ///     ├── Item I1 "First"
    ///     │   └── Bundle B1 "ORIGINAL"
    ///     │       └── Bitstream BS1 "a.pdf" (100 bytes)
    ///     └── Item I2 "Second"
    /// ```
    pub struct Sample {
        pub community: DsoRef,
        pub c1: DsoRef,
        pub i1: DsoRef,
        pub i2: DsoRef,
        pub b1: DsoRef,
        pub bs1: DsoRef,
    }

    pub fn sample() -> (RepoFixture, Sample) {
        let mut f = RepoFixture::new();
        let community = f.community("Science");
        let c1 = f.collection(Some(community), "C1");
        let i1 = f.item(Some(c1), Some("First"));
        let i2 = f.item(Some(c1), Some("Second"));
        let b1 = f.bundle(Some(i1), "ORIGINAL");
        let bs1 = f.bitstream(Some(b1), "a.pdf", 100);
        f.eperson("admin@example.org");
        f.group("Anonymous");
        (
            f,
            Sample {
                community,
                c1,
                i1,
                i2,
                b1,
                bs1,
            },
        )
    }
}
