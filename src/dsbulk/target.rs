//! # Attribute Targets
//!
//! An [`ActionTarget`] wraps one repository object and exposes it as a flat
//! key/value map. The map is built on first access and cached; callers can
//! overlay their own keys (before/after snapshots, per-object results)
//! before printing.
//!
//! ## Arena
//!
//! Targets live in a [`Targets`] arena and refer to each other by
//! [`TargetId`]. Each target has an `up` link to the target representing its
//! container in the current traversal:
//!
//! - `UpState::Resolved(id)`: known, either set at creation or resolved lazily
//! - `UpState::Unresolved`: not computed yet, resolved on demand with
//!   [`Targets::create_up_for`]
//! - `UpState::Absent`: resolution found no container
//!
//! ## Key Resolution
//!
//! [`Targets::get`] looks a key up in this order:
//!
//! 1. the materialized map
//! 2. `TYPE.rest` keys, where `TYPE` is strictly above this target in the
//!    containment order: walk the `up` chain to the first target of that
//!    type and look `rest` up there
//! 3. for items only, the key as a metadata field (`dc.title`)
//!
//! The arena is single-threaded by construction: every lazy step goes
//! through `&mut Targets`.

use crate::attributes::keys;
use crate::attributes::AttrValue;
use crate::error::Result;
use crate::model::{BitstreamInfo, DsoRef, MetadataField, ObjectType};
use crate::store::ContentRepository;
use std::collections::BTreeMap;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpState {
    Unresolved,
    Resolved(TargetId),
    Absent,
}

/// The closed set of target shapes. Everything outside the four listable
/// types is `Other` and carries only the common keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetVariant {
    Collection,
    Item,
    Bundle,
    Bitstream,
    Other,
}

impl TargetVariant {
    fn for_kind(kind: ObjectType) -> Self {
        match kind {
            ObjectType::Collection => TargetVariant::Collection,
            ObjectType::Item => TargetVariant::Item,
            ObjectType::Bundle => TargetVariant::Bundle,
            ObjectType::Bitstream => TargetVariant::Bitstream,
            _ => TargetVariant::Other,
        }
    }

    fn extra_attrs<R: ContentRepository + ?Sized>(
        self,
        repo: &R,
        obj: DsoRef,
    ) -> Result<Vec<(&'static str, AttrValue)>> {
        Ok(match self {
            TargetVariant::Collection => CollectionFields::load(repo, obj)?.into_attrs(),
            TargetVariant::Item => ItemFields::load(repo, obj)?.into_attrs(),
            TargetVariant::Bundle => BundleFields::load(repo, obj)?.into_attrs(),
            TargetVariant::Bitstream => BitstreamFields::load(repo, obj)?.into_attrs(),
            TargetVariant::Other => Vec::new(),
        })
    }
}

struct CollectionFields {
    name: Option<String>,
    template: Option<DsoRef>,
}

impl CollectionFields {
    fn load<R: ContentRepository + ?Sized>(repo: &R, obj: DsoRef) -> Result<Self> {
        Ok(Self {
            name: repo.name_of(obj)?,
            template: repo.template_item_of(obj)?,
        })
    }

    fn into_attrs(self) -> Vec<(&'static str, AttrValue)> {
        vec![
            (keys::NAME, self.name.into()),
            (keys::TEMPLATE, self.template.into()),
        ]
    }
}

struct ItemFields {
    withdrawn: bool,
    name: Option<String>,
}

impl ItemFields {
    fn load<R: ContentRepository + ?Sized>(repo: &R, obj: DsoRef) -> Result<Self> {
        Ok(Self {
            withdrawn: repo.is_withdrawn(obj)?,
            name: repo.name_of(obj)?,
        })
    }

    fn into_attrs(self) -> Vec<(&'static str, AttrValue)> {
        vec![
            (keys::WITHDRAWN, self.withdrawn.into()),
            (keys::NAME, self.name.into()),
        ]
    }
}

struct BundleFields {
    embargoed: bool,
    name: Option<String>,
}

impl BundleFields {
    fn load<R: ContentRepository + ?Sized>(repo: &R, obj: DsoRef) -> Result<Self> {
        Ok(Self {
            embargoed: repo.is_embargoed(obj)?,
            name: repo.name_of(obj)?,
        })
    }

    fn into_attrs(self) -> Vec<(&'static str, AttrValue)> {
        vec![
            (keys::EMBARGOED, self.embargoed.into()),
            (keys::NAME, self.name.into()),
        ]
    }
}

struct BitstreamFields {
    info: BitstreamInfo,
}

impl BitstreamFields {
    fn load<R: ContentRepository + ?Sized>(repo: &R, obj: DsoRef) -> Result<Self> {
        Ok(Self {
            info: repo.bitstream_info(obj)?,
        })
    }

    fn into_attrs(self) -> Vec<(&'static str, AttrValue)> {
        let info = self.info;
        vec![
            (keys::MIME_TYPE, info.mime_type.into()),
            (keys::NAME, info.name.into()),
            (keys::SIZE, info.size.into()),
            (keys::INTERNAL_ID, info.internal_id.into()),
            (keys::CHECKSUM, info.checksum.into()),
            (keys::CHECKSUM_ALGORITHM, info.checksum_algorithm.into()),
        ]
    }
}

/// Collects attributes, turning the first lookup failure into the
/// `exception` key instead of an error.
struct AttrMapBuilder {
    attrs: BTreeMap<String, AttrValue>,
    exception: Option<String>,
}

impl AttrMapBuilder {
    fn field(&mut self, key: &str, value: Result<AttrValue>) {
        match value {
            Ok(v) => {
                self.attrs.insert(key.to_string(), v);
            }
            Err(e) => {
                self.exception.get_or_insert_with(|| e.to_string());
            }
        }
    }

    fn fields(&mut self, values: Result<Vec<(&'static str, AttrValue)>>) {
        match values {
            Ok(values) => {
                for (key, v) in values {
                    self.attrs.insert(key.to_string(), v);
                }
            }
            Err(e) => {
                self.exception.get_or_insert_with(|| e.to_string());
            }
        }
    }

    fn finish(mut self) -> BTreeMap<String, AttrValue> {
        if let Some(message) = self.exception {
            self.attrs
                .insert(keys::EXCEPTION.to_string(), AttrValue::Str(message));
        }
        self.attrs
    }
}

/// One wrapped repository object.
#[derive(Debug, Clone)]
pub struct ActionTarget {
    object: DsoRef,
    variant: TargetVariant,
    up: UpState,
    attrs: Option<BTreeMap<String, AttrValue>>,
}

impl ActionTarget {
    pub fn object(&self) -> DsoRef {
        self.object
    }

    pub fn kind(&self) -> ObjectType {
        self.object.kind
    }

    pub fn variant(&self) -> TargetVariant {
        self.variant
    }

    pub fn up(&self) -> UpState {
        self.up
    }

    pub fn is_materialized(&self) -> bool {
        self.attrs.is_some()
    }

    /// The materialized map, `None` before first access.
    pub fn attrs(&self) -> Option<&BTreeMap<String, AttrValue>> {
        self.attrs.as_ref()
    }

    /// Keys a target of `kind` materializes, for help output.
    pub fn available_keys(kind: ObjectType) -> Vec<&'static str> {
        keys::available_keys(kind)
    }
}

/// Arena owning every target created during one invocation.
#[derive(Debug, Default)]
pub struct Targets {
    nodes: Vec<ActionTarget>,
}

impl Targets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn target(&self, id: TargetId) -> &ActionTarget {
        &self.nodes[id.0]
    }

    pub fn object(&self, id: TargetId) -> DsoRef {
        self.nodes[id.0].object
    }

    pub fn kind(&self, id: TargetId) -> ObjectType {
        self.nodes[id.0].object.kind
    }

    /// Current `up` state, without resolving it.
    pub fn up_of(&self, id: TargetId) -> UpState {
        self.nodes[id.0].up
    }

    fn push(&mut self, object: DsoRef, variant: TargetVariant, up: UpState) -> TargetId {
        let id = TargetId(self.nodes.len());
        self.nodes.push(ActionTarget {
            object,
            variant,
            up,
            attrs: None,
        });
        id
    }

    /// Wrap `obj` with `up` as its container, or an unresolved container if none is given.
    ///
    /// # Panics
    ///
    /// If `obj` is not a collection, item, bundle or bitstream.
    pub fn create(&mut self, up: Option<TargetId>, obj: DsoRef) -> TargetId {
        assert!(
            obj.kind.is_listable(),
            "cannot create an action target for {}",
            obj
        );
        let up = up.map_or(UpState::Unresolved, UpState::Resolved);
        self.push(obj, TargetVariant::for_kind(obj.kind), up)
    }

    /// Wrap a container that is never listed itself, such as the community
    /// a listing starts from. Only the common keys are available on it.
    pub fn create_container(&mut self, obj: DsoRef) -> TargetId {
        self.push(obj, TargetVariant::for_kind(obj.kind), UpState::Unresolved)
    }

    /// Wrap every object in order, all sharing the same `up`.
    pub fn create_all<I>(&mut self, up: Option<TargetId>, objs: I) -> Vec<TargetId>
    where
        I: IntoIterator<Item = DsoRef>,
    {
        objs.into_iter().map(|obj| self.create(up, obj)).collect()
    }

    /// A fresh target for the immediate container of `obj`, or `None` when
    /// it has none (an orphaned bitstream, a top-level community).
    pub fn create_up_for<R: ContentRepository + ?Sized>(
        &mut self,
        repo: &R,
        obj: DsoRef,
    ) -> Result<Option<TargetId>> {
        let container = match obj.kind {
            ObjectType::Bitstream => repo.bundles_containing(obj)?.into_iter().next(),
            ObjectType::Bundle => repo.items_containing(obj)?.into_iter().next(),
            ObjectType::Item | ObjectType::Collection => repo.parent_of(obj)?,
            _ => None,
        };
        Ok(container.map(|c| self.create_container(c)))
    }

    /// The target's container, resolving it on first use.
    pub fn resolve_up<R: ContentRepository + ?Sized>(
        &mut self,
        repo: &R,
        id: TargetId,
    ) -> Result<Option<TargetId>> {
        match self.nodes[id.0].up {
            UpState::Resolved(up) => Ok(Some(up)),
            UpState::Absent => Ok(None),
            UpState::Unresolved => {
                let obj = self.nodes[id.0].object;
                let up = self.create_up_for(repo, obj)?;
                debug!(
                    object = %obj,
                    up = ?up.map(|u| self.nodes[u.0].object.to_string()),
                    "resolved up"
                );
                self.nodes[id.0].up = up.map_or(UpState::Absent, UpState::Resolved);
                if let Some(up) = up {
                    let container = self.nodes[up.0].object;
                    // A map built before resolution holds `up` as null.
                    if let Some(attrs) = self.nodes[id.0].attrs.as_mut() {
                        attrs.insert(keys::UP.to_string(), AttrValue::Object(container));
                    }
                }
                Ok(up)
            }
        }
    }

    /// Build the attribute map on first call. Returns `false` when it was
    /// already built, so callers can add their own keys exactly once.
    pub fn materialize<R: ContentRepository + ?Sized>(&mut self, repo: &R, id: TargetId) -> bool {
        if self.nodes[id.0].attrs.is_some() {
            return false;
        }
        let node = &self.nodes[id.0];
        let obj = node.object;
        let up = match node.up {
            UpState::Resolved(up) => AttrValue::Object(self.nodes[up.0].object),
            UpState::Unresolved | UpState::Absent => AttrValue::Null,
        };

        let mut builder = AttrMapBuilder {
            attrs: BTreeMap::new(),
            exception: None,
        };
        builder.field(keys::OBJECT, Ok(AttrValue::Object(obj)));
        builder.field(keys::TYPE, Ok(AttrValue::Str(obj.kind.to_string())));
        builder.field(keys::ID, Ok(AttrValue::Int(obj.id)));
        builder.field(keys::PARENT, repo.parent_of(obj).map(AttrValue::from));
        builder.field(keys::UP, Ok(up));
        builder.field(keys::HANDLE, repo.handle_of(obj).map(AttrValue::from));
        builder.fields(node.variant.extra_attrs(repo, obj));

        trace!(object = %obj, "materialized attributes");
        self.nodes[id.0].attrs = Some(builder.finish());
        true
    }

    /// The materialized map of a target.
    pub fn attrs<R: ContentRepository + ?Sized>(
        &mut self,
        repo: &R,
        id: TargetId,
    ) -> &BTreeMap<String, AttrValue> {
        self.materialize(repo, id);
        self.nodes[id.0]
            .attrs
            .get_or_insert_with(BTreeMap::new)
    }

    /// Overlay `key` on the target's map, materializing it first.
    pub fn put<R: ContentRepository + ?Sized>(
        &mut self,
        repo: &R,
        id: TargetId,
        key: impl Into<String>,
        value: impl Into<AttrValue>,
    ) {
        self.materialize(repo, id);
        if let Some(attrs) = self.nodes[id.0].attrs.as_mut() {
            attrs.insert(key.into(), value.into());
        }
    }

    /// Resolve `key` for a target. See the module docs for the lookup order.
    pub fn get<R: ContentRepository + ?Sized>(
        &mut self,
        repo: &R,
        id: TargetId,
        key: &str,
    ) -> Result<Option<AttrValue>> {
        if let Some(value) = self.attrs(repo, id).get(key) {
            return Ok(Some(value.clone()).filter(|v| !v.is_null()));
        }

        let kind = self.kind(id);
        if let Some((prefix, rest)) = key.split_once('.') {
            if let Ok(wanted) = prefix.parse::<ObjectType>() {
                if wanted.is_above(kind) {
                    return self.get_from_up(repo, id, wanted, rest);
                }
            }
        }

        if kind == ObjectType::Item {
            if let Ok(field) = key.parse::<MetadataField>() {
                let values = repo.metadata_values(self.object(id), &field)?;
                return Ok(AttrValue::from_values(values));
            }
        }

        Ok(None)
    }

    fn get_from_up<R: ContentRepository + ?Sized>(
        &mut self,
        repo: &R,
        id: TargetId,
        wanted: ObjectType,
        rest: &str,
    ) -> Result<Option<AttrValue>> {
        let mut current = id;
        loop {
            let Some(up) = self.resolve_up(repo, current)? else {
                return Ok(None);
            };
            let kind = self.kind(up);
            if kind == wanted {
                return self.get(repo, up, rest);
            }
            if !wanted.is_above(kind) {
                // The chain skipped past the wanted level.
                return Ok(None);
            }
            current = up;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures::{sample, RepoFixture};

    #[test]
    fn create_dispatches_on_kind() {
        let (f, s) = sample();
        let repo = f.build();
        let mut targets = Targets::new();
        for obj in [s.c1, s.i1, s.b1, s.bs1] {
            let id = targets.create(None, obj);
            assert_eq!(targets.kind(id), obj.kind);
            let attrs = targets.attrs(&repo, id);
            for key in keys::COMMON_KEYS {
                assert!(attrs.contains_key(*key), "{} missing {}", obj, key);
            }
        }
        assert_eq!(
            targets.target(TargetId(0)).variant(),
            TargetVariant::Collection
        );
    }

    #[test]
    #[should_panic(expected = "cannot create an action target")]
    fn create_rejects_communities() {
        let (_, s) = sample();
        Targets::new().create(None, s.community);
    }

    #[test]
    fn materialize_is_idempotent() {
        let (f, s) = sample();
        let repo = f.build();
        let mut targets = Targets::new();
        let id = targets.create(None, s.bs1);

        assert!(targets.materialize(&repo, id));
        let first = targets.target(id).attrs().cloned();
        assert!(!targets.materialize(&repo, id));
        assert_eq!(targets.target(id).attrs().cloned(), first);
    }

    #[test]
    fn variant_fields_are_materialized() {
        let (f, s) = sample();
        let repo = f.build();
        let mut targets = Targets::new();
        let bs = targets.create(None, s.bs1);
        assert_eq!(
            targets.get(&repo, bs, "name").unwrap(),
            Some(AttrValue::from("a.pdf"))
        );
        assert_eq!(targets.get(&repo, bs, "size").unwrap(), Some(AttrValue::Int(100)));
        assert_eq!(
            targets.get(&repo, bs, "checksumAlgorithm").unwrap(),
            Some(AttrValue::from("MD5"))
        );

        let item = targets.create(None, s.i1);
        assert_eq!(
            targets.get(&repo, item, "withdrawn").unwrap(),
            Some(AttrValue::Bool(false))
        );
        assert_eq!(
            targets.get(&repo, item, "type").unwrap(),
            Some(AttrValue::from("ITEM"))
        );
    }

    #[test]
    fn null_fields_read_as_none() {
        let (f, s) = sample();
        let repo = f.build();
        let mut targets = Targets::new();
        let bundle = targets.create(None, s.b1);
        // Bundles have no handle; the key is present but empty.
        assert!(targets.attrs(&repo, bundle).contains_key("handle"));
        assert_eq!(targets.get(&repo, bundle, "handle").unwrap(), None);
        assert_eq!(targets.get(&repo, bundle, "nonsense").unwrap(), None);
    }

    #[test]
    fn up_lookup_walks_lazily() {
        let (f, s) = sample();
        let repo = f.build();
        let mut targets = Targets::new();
        let item = targets.create(None, s.i1);

        assert_eq!(
            targets.get(&repo, item, "COLLECTION.name").unwrap(),
            Some(AttrValue::from("C1"))
        );
        assert!(matches!(targets.target(item).up(), UpState::Resolved(_)));

        // Reuses the resolved chain instead of creating a second collection target.
        let before = targets.len();
        targets.get(&repo, item, "collection.handle").unwrap();
        assert_eq!(targets.len(), before);
    }

    #[test]
    fn up_lookup_spans_several_levels() {
        let (f, s) = sample();
        let repo = f.build();
        let mut targets = Targets::new();
        let bs = targets.create(None, s.bs1);

        assert_eq!(
            targets.get(&repo, bs, "BUNDLE.name").unwrap(),
            Some(AttrValue::from("ORIGINAL"))
        );
        assert_eq!(
            targets.get(&repo, bs, "ITEM.name").unwrap(),
            Some(AttrValue::from("First"))
        );
        assert_eq!(
            targets.get(&repo, bs, "ITEM.dc.title").unwrap(),
            Some(AttrValue::from("First"))
        );
        // Communities wrap as `Other`: common keys only.
        assert_eq!(
            targets.get(&repo, bs, "COMMUNITY.handle").unwrap(),
            Some(AttrValue::from("123456789/1"))
        );
        assert_eq!(targets.get(&repo, bs, "COMMUNITY.name").unwrap(), None);
    }

    #[test]
    fn up_lookup_uses_given_context() {
        let (f, s) = sample();
        let repo = f.build();
        let mut targets = Targets::new();
        let coll = targets.create(None, s.c1);
        let item = targets.create(Some(coll), s.i2);

        assert_eq!(
            targets.get(&repo, item, "up").unwrap(),
            Some(AttrValue::Object(s.c1))
        );
        assert_eq!(
            targets.get(&repo, item, "COLLECTION.name").unwrap(),
            Some(AttrValue::from("C1"))
        );
        assert_eq!(targets.len(), 2);
    }

    #[test]
    fn resolving_up_refreshes_the_up_key() {
        let (f, s) = sample();
        let repo = f.build();
        let mut targets = Targets::new();
        let item = targets.create(None, s.i1);

        assert_eq!(targets.get(&repo, item, "up").unwrap(), None);
        targets.get(&repo, item, "COLLECTION.name").unwrap();
        assert_eq!(
            targets.get(&repo, item, "up").unwrap(),
            Some(AttrValue::Object(s.c1))
        );
    }

    #[test]
    fn up_lookup_without_ancestor_is_none() {
        let mut f = RepoFixture::new();
        let orphan = f.item(None, Some("Loose"));
        let loose_bs = f.bitstream(None, "x.txt", 1);
        let repo = f.build();
        let mut targets = Targets::new();

        let item = targets.create(None, orphan);
        assert_eq!(targets.get(&repo, item, "COLLECTION.name").unwrap(), None);
        assert_eq!(targets.target(item).up(), UpState::Absent);

        assert_eq!(targets.create_up_for(&repo, loose_bs).unwrap(), None);
    }

    #[test]
    fn type_prefix_must_be_above() {
        let (f, s) = sample();
        let repo = f.build();
        let mut targets = Targets::new();
        let coll = targets.create(None, s.c1);
        assert_eq!(targets.get(&repo, coll, "ITEM.name").unwrap(), None);
        assert_eq!(targets.get(&repo, coll, "COLLECTION.name").unwrap(), None);
        // No up resolution was attempted.
        assert_eq!(targets.target(coll).up(), UpState::Unresolved);
    }

    #[test]
    fn metadata_lookup_by_value_count() {
        let (mut f, s) = sample();
        f.metadata(s.i1, "dc.contributor.author", "Ada")
            .metadata(s.i1, "dc.contributor.author", "Grace");
        let repo = f.build();
        let mut targets = Targets::new();
        let item = targets.create(None, s.i1);

        assert_eq!(
            targets.get(&repo, item, "dc.title").unwrap(),
            Some(AttrValue::from("First"))
        );
        assert_eq!(
            targets.get(&repo, item, "dc.contributor.author").unwrap(),
            Some(AttrValue::List(vec!["Ada".into(), "Grace".into()]))
        );
        assert_eq!(targets.get(&repo, item, "dc.subject").unwrap(), None);
    }

    #[test]
    fn metadata_lookup_is_items_only() {
        let (f, s) = sample();
        let repo = f.build();
        let mut targets = Targets::new();
        let bundle = targets.create(None, s.b1);
        assert_eq!(targets.get(&repo, bundle, "dc.title").unwrap(), None);
    }

    #[test]
    fn put_overlays_after_materializing() {
        let (f, s) = sample();
        let repo = f.build();
        let mut targets = Targets::new();
        let item = targets.create(None, s.i2);

        targets.put(&repo, item, "changed", true);
        assert!(targets.target(item).is_materialized());
        assert_eq!(
            targets.get(&repo, item, "changed").unwrap(),
            Some(AttrValue::Bool(true))
        );
        targets.put(&repo, item, "name", "Overridden");
        assert_eq!(
            targets.get(&repo, item, "name").unwrap(),
            Some(AttrValue::from("Overridden"))
        );
    }

    #[test]
    fn failed_lookups_land_in_exception() {
        let repo = RepoFixture::new().build();
        let mut targets = Targets::new();
        let ghost = targets.create(None, DsoRef::new(ObjectType::Item, 999));

        let attrs = targets.attrs(&repo, ghost);
        assert!(attrs.contains_key(keys::EXCEPTION));
        assert_eq!(attrs.get(keys::ID), Some(&AttrValue::Int(999)));
    }

    #[test]
    fn create_all_shares_up() {
        let (f, s) = sample();
        let repo = f.build();
        let mut targets = Targets::new();
        let coll = targets.create(None, s.c1);
        let items = targets.create_all(Some(coll), repo.items_of(s.c1).unwrap());
        assert_eq!(items.len(), 2);
        assert_eq!(targets.object(items[0]), s.i1);
        assert_eq!(targets.object(items[1]), s.i2);
        for item in items {
            assert_eq!(targets.target(item).up(), UpState::Resolved(coll));
        }
    }
}
