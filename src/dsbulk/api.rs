//! # API Facade
//!
//! A thin facade over the command layer and the single entry point for
//! every bulk operation, whatever the UI.
//!
//! The facade resolves raw options into validated inputs (through
//! [`crate::args`]) and dispatches to `commands/*`. It does no I/O of its
//! own and returns [`CmdResult`] values for the caller to present.
//!
//! `BulkApi<R>` is generic over the repository session:
//! - Production: `BulkApi<JsonRepository>`
//! - Testing: `BulkApi<InMemoryRepository>`

use crate::args::{
    self, CommonArgs, Defaults, ListArgs, MetadataArgs, PolicyArgs, ReplaceArgs, Resolved,
};
use crate::commands;
use crate::error::Result;
use crate::store::{AuthorizationService, ContentRepository};

pub struct BulkApi<R> {
    repo: R,
    defaults: Defaults,
}

impl<R: ContentRepository + AuthorizationService> BulkApi<R> {
    pub fn new(repo: R, defaults: Defaults) -> Self {
        Self { repo, defaults }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn into_repository(self) -> R {
        self.repo
    }

    pub fn resolve(&self, common: &CommonArgs) -> Result<Resolved> {
        args::resolve(&self.repo, common, &self.defaults)
    }

    pub fn list(&self, opts: &ListArgs) -> Result<commands::CmdResult> {
        let resolved = self.resolve(&opts.common)?;
        commands::list::run(&self.repo, &resolved)
    }

    pub fn edit_metadata(&mut self, opts: &MetadataArgs) -> Result<commands::CmdResult> {
        let resolved = self.resolve(&opts.common)?;
        let edit = args::resolve_metadata_edit(&self.repo, &resolved, opts)?;
        commands::metadata::run(&mut self.repo, &resolved, &edit)
    }

    pub fn edit_policies(&mut self, opts: &PolicyArgs) -> Result<commands::CmdResult> {
        let resolved = self.resolve(&opts.common)?;
        let edit = args::resolve_policy_edit(&self.repo, opts)?;
        commands::policy::run(&mut self.repo, &resolved, &edit)
    }

    pub fn replace_bitstreams(&mut self, opts: &ReplaceArgs) -> Result<commands::CmdResult> {
        let resolved = self.resolve(&opts.common)?;
        let replacement = args::resolve_replacement(&self.repo, &resolved, opts)?;
        commands::replace::run(&mut self.repo, &resolved, &replacement)
    }
}

pub use crate::commands::{CmdMessage, CmdResult, MessageLevel};
