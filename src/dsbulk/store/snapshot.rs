//! In-memory model of a repository's content.
//!
//! A [`Snapshot`] is what the backends load and save. Records refer to each
//! other by id; children are kept as ordered id lists on the parent so the
//! repository's iteration order survives a save/load cycle.

use crate::error::{BulkError, Result};
use crate::model::{BitstreamInfo, DsoRef, MetadataField, ObjectType, Policy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Records addressable by their numeric id.
pub trait Record {
    fn id(&self) -> i64;
}

/// Serializes a `BTreeMap<i64, T>` as a plain list of records.
mod by_id {
    use super::Record;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S, T>(map: &BTreeMap<i64, T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        serializer.collect_seq(map.values())
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<BTreeMap<i64, T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Record,
    {
        let records = Vec::<T>::deserialize(deserializer)?;
        Ok(records.into_iter().map(|r| (r.id(), r)).collect())
    }
}

macro_rules! impl_record {
    ($($ty:ty),*) => {
        $(impl Record for $ty {
            fn id(&self) -> i64 {
                self.id
            }
        })*
    };
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommunityRecord {
    pub id: i64,
    #[serde(default)]
    pub handle: Option<String>,
    pub name: String,
    #[serde(default)]
    pub parent: Option<i64>,
    #[serde(default)]
    pub collections: Vec<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionRecord {
    pub id: i64,
    #[serde(default)]
    pub handle: Option<String>,
    pub name: String,
    #[serde(default)]
    pub template_item: Option<i64>,
    #[serde(default)]
    pub items: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataValue {
    pub field: MetadataField,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: i64,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub owning_collection: Option<i64>,
    #[serde(default = "default_true")]
    pub archived: bool,
    #[serde(default)]
    pub withdrawn: bool,
    #[serde(default)]
    pub metadata: Vec<MetadataValue>,
    #[serde(default)]
    pub bundles: Vec<i64>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BundleRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub embargoed: bool,
    #[serde(default)]
    pub bitstreams: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitstreamRecord {
    pub id: i64,
    #[serde(flatten)]
    pub info: BitstreamInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EPersonRecord {
    pub id: i64,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupRecord {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRecord {
    pub object: DsoRef,
    #[serde(flatten)]
    pub policy: Policy,
}

impl_record!(
    CommunityRecord,
    CollectionRecord,
    ItemRecord,
    BundleRecord,
    BitstreamRecord,
    EPersonRecord,
    GroupRecord
);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, with = "by_id")]
    pub communities: BTreeMap<i64, CommunityRecord>,
    #[serde(default, with = "by_id")]
    pub collections: BTreeMap<i64, CollectionRecord>,
    #[serde(default, with = "by_id")]
    pub items: BTreeMap<i64, ItemRecord>,
    #[serde(default, with = "by_id")]
    pub bundles: BTreeMap<i64, BundleRecord>,
    #[serde(default, with = "by_id")]
    pub bitstreams: BTreeMap<i64, BitstreamRecord>,
    #[serde(default, with = "by_id")]
    pub epeople: BTreeMap<i64, EPersonRecord>,
    #[serde(default, with = "by_id")]
    pub groups: BTreeMap<i64, GroupRecord>,
    #[serde(default)]
    pub policies: Vec<PolicyRecord>,
}

fn lookup<T>(map: &BTreeMap<i64, T>, obj: DsoRef) -> Result<&T> {
    map.get(&obj.id).ok_or(BulkError::NotFound(obj))
}

fn wrong_kind(obj: DsoRef, expected: ObjectType) -> BulkError {
    BulkError::InvalidArgument(format!("{} is not a {}", obj, expected))
}

fn refs(kind: ObjectType, ids: &[i64]) -> Vec<DsoRef> {
    ids.iter().map(|id| DsoRef::new(kind, *id)).collect()
}

impl Snapshot {
    pub fn contains(&self, obj: DsoRef) -> bool {
        match obj.kind {
            ObjectType::Community => self.communities.contains_key(&obj.id),
            ObjectType::Collection => self.collections.contains_key(&obj.id),
            ObjectType::Item => self.items.contains_key(&obj.id),
            ObjectType::Bundle => self.bundles.contains_key(&obj.id),
            ObjectType::Bitstream => self.bitstreams.contains_key(&obj.id),
            ObjectType::EPerson => self.epeople.contains_key(&obj.id),
            ObjectType::Group => self.groups.contains_key(&obj.id),
            ObjectType::Site => false,
        }
    }

    pub fn find_handle(&self, handle: &str) -> Option<DsoRef> {
        let wanted = Some(handle);
        self.communities
            .values()
            .find(|c| c.handle.as_deref() == wanted)
            .map(|c| DsoRef::new(ObjectType::Community, c.id))
            .or_else(|| {
                self.collections
                    .values()
                    .find(|c| c.handle.as_deref() == wanted)
                    .map(|c| DsoRef::new(ObjectType::Collection, c.id))
            })
            .or_else(|| {
                self.items
                    .values()
                    .find(|i| i.handle.as_deref() == wanted)
                    .map(|i| DsoRef::new(ObjectType::Item, i.id))
            })
    }

    pub fn handle(&self, obj: DsoRef) -> Result<Option<String>> {
        Ok(match obj.kind {
            ObjectType::Community => lookup(&self.communities, obj)?.handle.clone(),
            ObjectType::Collection => lookup(&self.collections, obj)?.handle.clone(),
            ObjectType::Item => lookup(&self.items, obj)?.handle.clone(),
            _ if self.contains(obj) => None,
            _ => return Err(BulkError::NotFound(obj)),
        })
    }

    pub fn parent(&self, obj: DsoRef) -> Result<Option<DsoRef>> {
        let parent = match obj.kind {
            ObjectType::Community => lookup(&self.communities, obj)?
                .parent
                .map(|id| DsoRef::new(ObjectType::Community, id)),
            ObjectType::Collection => {
                lookup(&self.collections, obj)?;
                self.communities
                    .values()
                    .find(|c| c.collections.contains(&obj.id))
                    .map(|c| DsoRef::new(ObjectType::Community, c.id))
            }
            ObjectType::Item => lookup(&self.items, obj)?
                .owning_collection
                .map(|id| DsoRef::new(ObjectType::Collection, id)),
            ObjectType::Bundle => self.items_containing(obj)?.into_iter().next(),
            ObjectType::Bitstream => self.bundles_containing(obj)?.into_iter().next(),
            _ if self.contains(obj) => None,
            _ => return Err(BulkError::NotFound(obj)),
        };
        Ok(parent)
    }

    pub fn collections_of(&self, community: DsoRef) -> Result<Vec<DsoRef>> {
        if community.kind != ObjectType::Community {
            return Err(wrong_kind(community, ObjectType::Community));
        }
        let record = lookup(&self.communities, community)?;
        Ok(refs(ObjectType::Collection, &record.collections))
    }

    /// Archived member items only.
    pub fn items_of(&self, collection: DsoRef) -> Result<Vec<DsoRef>> {
        if collection.kind != ObjectType::Collection {
            return Err(wrong_kind(collection, ObjectType::Collection));
        }
        let record = lookup(&self.collections, collection)?;
        Ok(record
            .items
            .iter()
            .filter(|id| self.items.get(id).is_some_and(|i| i.archived))
            .map(|id| DsoRef::new(ObjectType::Item, *id))
            .collect())
    }

    pub fn bundles_of(&self, item: DsoRef) -> Result<Vec<DsoRef>> {
        if item.kind != ObjectType::Item {
            return Err(wrong_kind(item, ObjectType::Item));
        }
        Ok(refs(ObjectType::Bundle, &lookup(&self.items, item)?.bundles))
    }

    pub fn bitstreams_of(&self, bundle: DsoRef) -> Result<Vec<DsoRef>> {
        if bundle.kind != ObjectType::Bundle {
            return Err(wrong_kind(bundle, ObjectType::Bundle));
        }
        Ok(refs(
            ObjectType::Bitstream,
            &lookup(&self.bundles, bundle)?.bitstreams,
        ))
    }

    pub fn bundles_containing(&self, bitstream: DsoRef) -> Result<Vec<DsoRef>> {
        if bitstream.kind != ObjectType::Bitstream {
            return Err(wrong_kind(bitstream, ObjectType::Bitstream));
        }
        lookup(&self.bitstreams, bitstream)?;
        Ok(self
            .bundles
            .values()
            .filter(|b| b.bitstreams.contains(&bitstream.id))
            .map(|b| DsoRef::new(ObjectType::Bundle, b.id))
            .collect())
    }

    pub fn items_containing(&self, bundle: DsoRef) -> Result<Vec<DsoRef>> {
        if bundle.kind != ObjectType::Bundle {
            return Err(wrong_kind(bundle, ObjectType::Bundle));
        }
        lookup(&self.bundles, bundle)?;
        Ok(self
            .items
            .values()
            .filter(|i| i.bundles.contains(&bundle.id))
            .map(|i| DsoRef::new(ObjectType::Item, i.id))
            .collect())
    }

    /// Items are named by their first `dc.title`.
    pub fn name(&self, obj: DsoRef) -> Result<Option<String>> {
        Ok(match obj.kind {
            ObjectType::Community => Some(lookup(&self.communities, obj)?.name.clone()),
            ObjectType::Collection => Some(lookup(&self.collections, obj)?.name.clone()),
            ObjectType::Item => {
                let title = MetadataField::new("dc", "title", None);
                self.metadata_values(obj, &title)?.into_iter().next()
            }
            ObjectType::Bundle => Some(lookup(&self.bundles, obj)?.name.clone()),
            ObjectType::Bitstream => Some(lookup(&self.bitstreams, obj)?.info.name.clone()),
            ObjectType::EPerson => Some(lookup(&self.epeople, obj)?.email.clone()),
            ObjectType::Group => Some(lookup(&self.groups, obj)?.name.clone()),
            ObjectType::Site => None,
        })
    }

    pub fn item(&self, item: DsoRef) -> Result<&ItemRecord> {
        if item.kind != ObjectType::Item {
            return Err(wrong_kind(item, ObjectType::Item));
        }
        lookup(&self.items, item)
    }

    pub fn item_mut(&mut self, item: DsoRef) -> Result<&mut ItemRecord> {
        if item.kind != ObjectType::Item {
            return Err(wrong_kind(item, ObjectType::Item));
        }
        self.items.get_mut(&item.id).ok_or(BulkError::NotFound(item))
    }

    pub fn bundle(&self, bundle: DsoRef) -> Result<&BundleRecord> {
        if bundle.kind != ObjectType::Bundle {
            return Err(wrong_kind(bundle, ObjectType::Bundle));
        }
        lookup(&self.bundles, bundle)
    }

    pub fn collection(&self, collection: DsoRef) -> Result<&CollectionRecord> {
        if collection.kind != ObjectType::Collection {
            return Err(wrong_kind(collection, ObjectType::Collection));
        }
        lookup(&self.collections, collection)
    }

    pub fn bitstream(&self, bitstream: DsoRef) -> Result<&BitstreamRecord> {
        if bitstream.kind != ObjectType::Bitstream {
            return Err(wrong_kind(bitstream, ObjectType::Bitstream));
        }
        lookup(&self.bitstreams, bitstream)
    }

    pub fn bitstream_mut(&mut self, bitstream: DsoRef) -> Result<&mut BitstreamRecord> {
        if bitstream.kind != ObjectType::Bitstream {
            return Err(wrong_kind(bitstream, ObjectType::Bitstream));
        }
        self.bitstreams
            .get_mut(&bitstream.id)
            .ok_or(BulkError::NotFound(bitstream))
    }

    pub fn metadata_values(&self, item: DsoRef, field: &MetadataField) -> Result<Vec<String>> {
        Ok(self
            .item(item)?
            .metadata
            .iter()
            .filter(|m| &m.field == field)
            .map(|m| m.value.clone())
            .collect())
    }
}
