//! # Argument Resolution
//!
//! Turns raw command-line options into validated inputs for the drivers.
//! Parsing the shell tokens is clap's job; this module does everything
//! clap cannot check on its own because it needs the repository:
//!
//! 1. resolve `--root` (a handle or `TYPE.ID`) to an existing object
//! 2. check the root is a community, collection, item, bundle or bitstream
//! 3. pick the target type (`--type`, else the root's own type) and check
//!    it can be listed
//! 4. look up the output format, uppercasing what the user typed
//! 5. split `--include` into columns, rejecting an empty list
//! 6. check the target type is not above the root
//!
//! Help handling and opening the repository happen in the CLI before any
//! of this runs. Every failure here is [`BulkError::Args`], which the CLI
//! follows with usage text.

use crate::attributes::default_columns;
use crate::commands::metadata::MetadataEdit;
use crate::commands::policy::{PolicyEdit, PolicyMode};
use crate::commands::replace::Replacement;
use crate::error::{BulkError, Result};
use crate::model::{DsoRef, MetadataField, ObjectType, PolicyAction, Principal};
use crate::printer::{Format, FORMAT_NAMES};
use crate::store::{AuthorizationService, ContentRepository};
use clap::Args;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Options shared by every driver.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Root object: a handle or TYPE.ID (e.g. collection.12)
    #[arg(short = 'r', long = "root", value_name = "ROOT")]
    pub root: Option<String>,

    /// Target type: collection, item, bundle or bitstream (default: the root's type)
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub target_type: Option<String>,

    /// Output format: TXT or TSV
    #[arg(short = 'f', long = "format", value_name = "FORMAT")]
    pub format: Option<String>,

    /// Comma-separated keys to print
    #[arg(short = 'i', long = "include", value_name = "KEYS")]
    pub include: Option<String>,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Print help and the keys available per type
    #[arg(short = 'h', long = "help")]
    pub help: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct MetadataArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// E-person performing the edit
    #[arg(short = 'e', long = "eperson", value_name = "EMAIL")]
    pub eperson: Option<String>,

    /// Field and value to set: schema.element[.qualifier]=value
    #[arg(short = 'm', long = "metadata", value_name = "FIELD=VALUE")]
    pub metadata: Option<String>,

    /// Add the value next to existing ones instead of replacing them
    #[arg(long = "append")]
    pub append: bool,

    /// Show what would change without committing
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PolicyArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// E-person performing the edit
    #[arg(short = 'e', long = "eperson", value_name = "EMAIL")]
    pub eperson: Option<String>,

    /// Action granted: READ, WRITE, ADD, REMOVE or DELETE
    #[arg(short = 'a', long = "action", value_name = "ACTION")]
    pub action: Option<String>,

    /// Group name or e-person email the policy applies to
    #[arg(short = 'w', long = "who", value_name = "WHO")]
    pub who: Option<String>,

    /// Grant the policy
    #[arg(long = "add")]
    pub add: bool,

    /// Revoke matching policies
    #[arg(long = "remove")]
    pub remove: bool,

    /// Show what would change without committing
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ReplaceArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// E-person performing the replacement
    #[arg(short = 'e', long = "eperson", value_name = "EMAIL")]
    pub eperson: Option<String>,

    /// File holding the new content
    #[arg(short = 'F', long = "file", value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Show what would change without storing anything
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

/// Fallbacks for options the user left out, usually from the config file.
#[derive(Debug, Clone, Default)]
pub struct Defaults {
    pub format: Option<String>,
    pub include: Option<String>,
}

/// The validated (root, target type, output shape) triple every driver starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub root: DsoRef,
    pub target_type: ObjectType,
    pub format: Format,
    pub columns: Vec<String>,
    pub verbose: bool,
}

pub fn resolve<R: ContentRepository + ?Sized>(
    repo: &R,
    args: &CommonArgs,
    defaults: &Defaults,
) -> Result<Resolved> {
    let descriptor = args
        .root
        .as_deref()
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| BulkError::args("missing --root"))?;
    let root = resolve_root(repo, descriptor)?;

    if !root.kind.is_root() {
        return Err(BulkError::args(format!(
            "root {} must be a {}",
            root,
            type_list(&ObjectType::ROOTS)
        )));
    }

    let target_type = match args.target_type.as_deref() {
        Some(name) => name
            .parse::<ObjectType>()
            .map_err(|_| BulkError::args(format!("unknown type '{}'", name)))?,
        None => root.kind,
    };
    if !target_type.is_listable() {
        return Err(BulkError::args(format!(
            "target type must be a {}, not {}",
            type_list(&ObjectType::LISTABLE),
            target_type
        )));
    }

    let format_name = args
        .format
        .as_deref()
        .or(defaults.format.as_deref())
        .unwrap_or(FORMAT_NAMES[0]);
    let format = Format::lookup(&format_name.trim().to_ascii_uppercase()).ok_or_else(|| {
        BulkError::args(format!(
            "unknown format '{}', expected one of {}",
            format_name,
            FORMAT_NAMES.join(", ")
        ))
    })?;

    let columns = match args.include.as_deref().or(defaults.include.as_deref()) {
        Some(include) => parse_columns(include)?,
        None => default_columns(),
    };

    // Community is depth 0, so any listable type fits under it.
    if target_type.depth() < root.kind.depth() {
        return Err(BulkError::args(format!(
            "cannot list {} targets inside {}",
            target_type, root
        )));
    }
    debug!(root = %root, target = %target_type, format = %format, "arguments resolved");

    Ok(Resolved {
        root,
        target_type,
        format,
        columns,
        verbose: args.verbose,
    })
}

/// A handle or `TYPE.ID` descriptor to an existing object.
pub fn resolve_root<R: ContentRepository + ?Sized>(repo: &R, descriptor: &str) -> Result<DsoRef> {
    let descriptor = descriptor.trim();
    if let Ok(obj) = descriptor.parse::<DsoRef>() {
        if repo.exists(obj)? {
            return Ok(obj);
        }
        return Err(BulkError::args(format!("root {} does not exist", obj)));
    }
    repo.resolve_handle(descriptor)?
        .ok_or_else(|| BulkError::args(format!("cannot resolve root '{}'", descriptor)))
}

/// Split a comma-separated key list. Blank entries are dropped; nothing left is an error.
pub fn parse_columns(include: &str) -> Result<Vec<String>> {
    let columns: Vec<String> = include
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    if columns.is_empty() {
        return Err(BulkError::args("--include needs at least one key"));
    }
    Ok(columns)
}

fn type_list(types: &[ObjectType]) -> String {
    let names: Vec<&str> = types.iter().map(|t| t.as_str()).collect();
    names.join(", ")
}

/// The e-person a mutating driver acts as.
pub fn resolve_actor<A: AuthorizationService + ?Sized>(
    auth: &A,
    eperson: Option<&str>,
) -> Result<Principal> {
    let email = eperson
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| BulkError::args("missing --eperson"))?;
    auth.find_eperson(email.trim())?
        .ok_or_else(|| BulkError::args(format!("unknown e-person '{}'", email)))
}

/// A group by name, else an e-person by email.
pub fn resolve_principal<A: AuthorizationService + ?Sized>(
    auth: &A,
    who: Option<&str>,
) -> Result<Principal> {
    let who = who
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .ok_or_else(|| BulkError::args("missing --who"))?;
    if let Some(group) = auth.find_group(who)? {
        return Ok(group);
    }
    auth.find_eperson(who)?
        .ok_or_else(|| BulkError::args(format!("no group or e-person named '{}'", who)))
}

fn require_type(resolved: &Resolved, wanted: ObjectType, driver: &str) -> Result<()> {
    if resolved.target_type != wanted {
        return Err(BulkError::args(format!(
            "{} works on {} targets, not {}",
            driver, wanted, resolved.target_type
        )));
    }
    Ok(())
}

pub fn resolve_metadata_edit<A: AuthorizationService + ?Sized>(
    auth: &A,
    resolved: &Resolved,
    args: &MetadataArgs,
) -> Result<MetadataEdit> {
    require_type(resolved, ObjectType::Item, "metadata")?;
    let actor = resolve_actor(auth, args.eperson.as_deref())?;
    let assignment = args
        .metadata
        .as_deref()
        .ok_or_else(|| BulkError::args("missing --metadata"))?;
    let (field, value) = MetadataField::parse_assignment(assignment)?;
    Ok(MetadataEdit {
        actor,
        field,
        value,
        append: args.append,
        dry_run: args.dry_run,
    })
}

pub fn resolve_policy_edit<A: AuthorizationService + ?Sized>(
    auth: &A,
    args: &PolicyArgs,
) -> Result<PolicyEdit> {
    let mode = match (args.add, args.remove) {
        (true, false) => PolicyMode::Add,
        (false, true) => PolicyMode::Remove,
        _ => return Err(BulkError::args("pass exactly one of --add or --remove")),
    };
    let actor = resolve_actor(auth, args.eperson.as_deref())?;
    let action = args
        .action
        .as_deref()
        .ok_or_else(|| BulkError::args("missing --action"))?
        .parse::<PolicyAction>()?;
    let who = resolve_principal(auth, args.who.as_deref())?;
    Ok(PolicyEdit {
        actor,
        action,
        who,
        mode,
        dry_run: args.dry_run,
    })
}

pub fn resolve_replacement<A: AuthorizationService + ?Sized>(
    auth: &A,
    resolved: &Resolved,
    args: &ReplaceArgs,
) -> Result<Replacement> {
    require_type(resolved, ObjectType::Bitstream, "replace")?;
    let actor = resolve_actor(auth, args.eperson.as_deref())?;
    let path = args
        .file
        .as_deref()
        .ok_or_else(|| BulkError::args("missing --file"))?;
    let mime_type = detect_mime(path).ok_or_else(|| {
        BulkError::args(format!("cannot detect the format of {}", path.display()))
    })?;
    let content = fs::read(path)
        .map_err(|e| BulkError::args(format!("cannot read {}: {}", path.display(), e)))?;
    Ok(Replacement {
        actor,
        source: path.to_path_buf(),
        content,
        mime_type: mime_type.to_string(),
        dry_run: args.dry_run,
    })
}

static MIME_TYPES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("pdf", "application/pdf"),
        ("txt", "text/plain"),
        ("csv", "text/csv"),
        ("htm", "text/html"),
        ("html", "text/html"),
        ("xml", "text/xml"),
        ("json", "application/json"),
        ("rtf", "text/rtf"),
        ("doc", "application/msword"),
        (
            "docx",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ),
        ("xls", "application/vnd.ms-excel"),
        (
            "xlsx",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ),
        ("odt", "application/vnd.oasis.opendocument.text"),
        ("zip", "application/zip"),
        ("gif", "image/gif"),
        ("jpg", "image/jpeg"),
        ("jpeg", "image/jpeg"),
        ("png", "image/png"),
        ("tif", "image/tiff"),
        ("tiff", "image/tiff"),
        ("mp3", "audio/mpeg"),
        ("wav", "audio/x-wav"),
        ("mp4", "video/mp4"),
    ])
});

/// MIME type for a file, judged by its extension.
pub fn detect_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    MIME_TYPES.get(ext.as_str()).copied()
}
