use crate::args::Resolved;
use crate::attributes::{keys, AttrValue};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::lister::Lister;
use crate::printer::Printer;
use crate::store::ContentRepository;
use crate::target::{TargetId, Targets};

/// Prefix for the overlay key holding a value before the edit.
pub const BEFORE: &str = "before:";
/// Prefix for the overlay key holding a value after the edit.
pub const AFTER: &str = "after:";
/// Overlay key telling whether the edit changed anything.
pub const CHANGED: &str = "changed";

pub fn before_key(name: &str) -> String {
    format!("{}{}", BEFORE, name)
}

pub fn after_key(name: &str) -> String {
    format!("{}{}", AFTER, name)
}

/// Lister for the resolved root and type, with its targets already listed.
pub fn list_targets<R: ContentRepository + ?Sized>(
    repo: &R,
    resolved: &Resolved,
) -> Result<(Lister, Vec<TargetId>)> {
    let mut lister = Lister::new(resolved.root, resolved.target_type)?;
    let listed = lister.list(repo)?;
    Ok((lister, listed))
}

pub fn render_all<R: ContentRepository + ?Sized>(
    printer: &mut Printer,
    targets: &mut Targets,
    repo: &R,
    ids: &[TargetId],
) -> Result<Vec<String>> {
    let mut lines = Vec::with_capacity(ids.len());
    for &id in ids {
        lines.extend(printer.render(targets, repo, id)?);
    }
    Ok(lines)
}

/// Summary of failed targets: a warning when some failed, an error when all did.
pub fn failure_message(result: &CmdResult, noun: &str) -> Option<CmdMessage> {
    if result.failed == 0 {
        return None;
    }
    if result.failed == result.processed {
        return Some(CmdMessage::error(format!(
            "All {} {} failed, see the result column",
            result.failed, noun
        )));
    }
    Some(CmdMessage::warning(format!(
        "{} {} failed, see the result column",
        result.failed, noun
    )))
}

/// Record a per-object outcome under `result`.
pub fn record_outcome<R: ContentRepository + ?Sized>(
    targets: &mut Targets,
    repo: &R,
    id: TargetId,
    outcome: &Result<()>,
) {
    let value = match outcome {
        Ok(()) => AttrValue::from("ok"),
        Err(e) => AttrValue::Str(format!("error: {}", e)),
    };
    targets.put(repo, id, keys::RESULT, value);
}
