//! # Hierarchy Lister
//!
//! Expands a root object into the targets at one level of the fixed
//! hierarchy, walking Collection → Item → Bundle → Bitstream top-down.
//! Each level is computed at most once per lister and only between the
//! root's level and the requested one.

use crate::error::{BulkError, Result};
use crate::model::{DsoRef, ObjectType};
use crate::store::ContentRepository;
use crate::target::{TargetId, Targets};
use tracing::debug;

const LEVELS: usize = 5;

pub struct Lister {
    root: DsoRef,
    target_type: ObjectType,
    targets: Targets,
    levels: [Option<Vec<TargetId>>; LEVELS],
}

impl Lister {
    pub fn new(root: DsoRef, target_type: ObjectType) -> Result<Self> {
        if !target_type.is_listable() {
            return Err(BulkError::InvalidArgument(format!(
                "cannot list {} targets",
                target_type
            )));
        }
        Ok(Self {
            root,
            target_type,
            targets: Targets::new(),
            levels: Default::default(),
        })
    }

    pub fn root(&self) -> DsoRef {
        self.root
    }

    pub fn target_type(&self) -> ObjectType {
        self.target_type
    }

    pub fn targets(&self) -> &Targets {
        &self.targets
    }

    /// The arena, for reading or overlaying attributes on listed targets.
    pub fn targets_mut(&mut self) -> &mut Targets {
        &mut self.targets
    }

    /// Targets at the requested type.
    pub fn list<R: ContentRepository + ?Sized>(&mut self, repo: &R) -> Result<Vec<TargetId>> {
        let target_type = self.target_type;
        Ok(self.level(repo, target_type)?.to_vec())
    }

    /// Targets at `kind`, computing it and any level above it on first use.
    pub fn level<R: ContentRepository + ?Sized>(
        &mut self,
        repo: &R,
        kind: ObjectType,
    ) -> Result<&[TargetId]> {
        let depth = kind
            .depth()
            .filter(|_| kind.is_listable())
            .ok_or_else(|| BulkError::InvalidArgument(format!("{} is not a listing level", kind)))?;

        if self.levels[depth].is_none() {
            let computed = self.compute(repo, kind)?;
            debug!(level = %kind, count = computed.len(), "listed");
            self.levels[depth] = Some(computed);
        }
        Ok(self.levels[depth].as_deref().unwrap_or_default())
    }

    fn compute<R: ContentRepository + ?Sized>(
        &mut self,
        repo: &R,
        kind: ObjectType,
    ) -> Result<Vec<TargetId>> {
        if self.root.kind == kind {
            return Ok(vec![self.targets.create(None, self.root)]);
        }

        if kind == ObjectType::Collection {
            if self.root.kind == ObjectType::Community {
                let collections = repo.collections_of(self.root)?;
                let community = self.targets.create_container(self.root);
                return Ok(self.targets.create_all(Some(community), collections));
            }
            return Ok(Vec::new());
        }

        let parent_kind = match kind {
            ObjectType::Item => ObjectType::Collection,
            ObjectType::Bundle => ObjectType::Item,
            _ => ObjectType::Bundle,
        };
        let parents = self.level(repo, parent_kind)?.to_vec();

        let mut listed = Vec::new();
        for parent in parents {
            let obj = self.targets.object(parent);
            let children = match kind {
                ObjectType::Item => repo.items_of(obj)?,
                ObjectType::Bundle => repo.bundles_of(obj)?,
                _ => repo.bitstreams_of(obj)?,
            };
            listed.extend(self.targets.create_all(Some(parent), children));
        }
        Ok(listed)
    }
}
