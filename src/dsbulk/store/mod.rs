//! # Storage Layer
//!
//! The engine never touches repository records directly. Everything it needs
//! goes through two collaborator traits:
//!
//! - [`ContentRepository`]: object identity, structure (parents, children),
//!   per-type fields, item metadata, plus the few edits the bulk drivers make
//!   and an explicit `commit`.
//! - [`AuthorizationService`]: resource policies and principals, used only by
//!   the policy driver.
//!
//! ## Implementations
//!
//! Both traits are implemented by [`repo_store::RepoStore`], which keeps a
//! [`snapshot::Snapshot`] in memory and delegates raw I/O to a
//! [`backend::SnapshotBackend`]:
//!
//! - [`fs::JsonRepository`]: production, snapshot in a JSON file with
//!   bitstream bytes in an `assetstore/` directory beside it
//! - [`memory::InMemoryRepository`]: testing, nothing persists
//!
//! ## Failure Semantics
//!
//! Asking for a missing object or calling a per-type accessor on the wrong
//! type is an error. Expected absence (no parent, no handle, zero metadata
//! values) is `None` or an empty `Vec`, never an error.

use crate::error::Result;
use crate::model::{BitstreamInfo, DsoRef, MetadataField, Policy, PolicyAction, Principal};

pub mod backend;
pub mod fs;
pub mod memory;
pub mod repo_store;
pub mod snapshot;

/// Access to typed repository objects and their relationships.
pub trait ContentRepository {
    /// True if the object exists.
    fn exists(&self, obj: DsoRef) -> Result<bool>;

    /// Look up a community, collection or item by persistent handle.
    fn resolve_handle(&self, handle: &str) -> Result<Option<DsoRef>>;

    fn handle_of(&self, obj: DsoRef) -> Result<Option<String>>;

    /// The next-shallower containing object.
    fn parent_of(&self, obj: DsoRef) -> Result<Option<DsoRef>>;

    /// Direct child collections of a community.
    fn collections_of(&self, community: DsoRef) -> Result<Vec<DsoRef>>;

    /// Archived member items of a collection, in repository order.
    fn items_of(&self, collection: DsoRef) -> Result<Vec<DsoRef>>;

    fn bundles_of(&self, item: DsoRef) -> Result<Vec<DsoRef>>;

    fn bitstreams_of(&self, bundle: DsoRef) -> Result<Vec<DsoRef>>;

    fn bundles_containing(&self, bitstream: DsoRef) -> Result<Vec<DsoRef>>;

    fn items_containing(&self, bundle: DsoRef) -> Result<Vec<DsoRef>>;

    fn name_of(&self, obj: DsoRef) -> Result<Option<String>>;

    fn is_withdrawn(&self, item: DsoRef) -> Result<bool>;

    fn is_embargoed(&self, bundle: DsoRef) -> Result<bool>;

    fn template_item_of(&self, collection: DsoRef) -> Result<Option<DsoRef>>;

    fn bitstream_info(&self, bitstream: DsoRef) -> Result<BitstreamInfo>;

    /// All values of one metadata field on an item, in stored order.
    fn metadata_values(&self, item: DsoRef, field: &MetadataField) -> Result<Vec<String>>;

    /// Replace every value of `field` on `item`. An empty `values` clears the field.
    fn set_metadata(&mut self, item: DsoRef, field: &MetadataField, values: Vec<String>)
        -> Result<()>;

    /// Append one value to `field` on `item`, keeping existing ones.
    fn add_metadata(&mut self, item: DsoRef, field: &MetadataField, value: String) -> Result<()>;

    /// Store new content for a bitstream, returning its updated properties.
    fn replace_bitstream(
        &mut self,
        bitstream: DsoRef,
        content: &[u8],
        mime_type: &str,
    ) -> Result<BitstreamInfo>;

    /// Persist all edits made in this session.
    fn commit(&mut self) -> Result<()>;
}

/// Resource policies and the principals they name.
pub trait AuthorizationService {
    fn find_eperson(&self, email: &str) -> Result<Option<Principal>>;

    fn find_group(&self, name: &str) -> Result<Option<Principal>>;

    fn policies_of(&self, obj: DsoRef) -> Result<Vec<Policy>>;

    fn add_policy(&mut self, obj: DsoRef, policy: Policy) -> Result<()>;

    /// Remove every policy on `obj` granting `action` to `principal`; returns how many went.
    fn remove_policies(
        &mut self,
        obj: DsoRef,
        action: PolicyAction,
        principal: &Principal,
    ) -> Result<usize>;
}
