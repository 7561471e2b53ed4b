use crate::args::Resolved;
use crate::attributes::{keys, AttrValue};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{BulkError, Result};
use crate::model::Principal;
use crate::printer::Printer;
use crate::store::ContentRepository;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::helpers::{
    after_key, before_key, failure_message, list_targets, record_outcome, render_all,
};

/// New content for every listed bitstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub actor: Principal,
    pub source: PathBuf,
    pub content: Vec<u8>,
    pub mime_type: String,
    /// Report what would be replaced without storing anything.
    pub dry_run: bool,
}

pub fn run<R: ContentRepository + ?Sized>(
    repo: &mut R,
    resolved: &Resolved,
    replacement: &Replacement,
) -> Result<CmdResult> {
    let (mut lister, listed) = list_targets(&*repo, resolved)?;
    let before = before_key(keys::CHECKSUM);
    let after = after_key(keys::CHECKSUM);

    let mut result = CmdResult::default();
    for &id in &listed {
        let obj = lister.targets().object(id);
        // Materializes the target with the old checksum before anything changes.
        let old = lister.targets_mut().get(&*repo, id, keys::CHECKSUM)?;
        lister
            .targets_mut()
            .put(&*repo, id, before.as_str(), old.unwrap_or(AttrValue::Null));
        result.processed += 1;

        if replacement.dry_run {
            lister
                .targets_mut()
                .put(&*repo, id, keys::RESULT, "skipped (dry run)");
            continue;
        }

        let outcome = repo
            .replace_bitstream(obj, &replacement.content, &replacement.mime_type)
            .map(|info| {
                debug!(object = %obj, internal_id = %info.internal_id, "bitstream replaced");
                info
            });
        let targets = lister.targets_mut();
        let outcome = match outcome {
            Ok(info) => {
                targets.put(&*repo, id, after.as_str(), info.checksum.clone());
                targets.put(&*repo, id, keys::CHECKSUM, info.checksum);
                targets.put(&*repo, id, keys::CHECKSUM_ALGORITHM, info.checksum_algorithm);
                targets.put(&*repo, id, keys::SIZE, info.size);
                targets.put(&*repo, id, keys::MIME_TYPE, info.mime_type);
                targets.put(&*repo, id, keys::INTERNAL_ID, info.internal_id);
                result.changed += 1;
                Ok(())
            }
            Err(e) => {
                warn!(object = %obj, error = %e, "bitstream replace failed");
                result.failed += 1;
                Err::<(), BulkError>(e)
            }
        };
        record_outcome(targets, &*repo, id, &outcome);
    }

    let mut printer = Printer::new(resolved.format, resolved.columns.clone());
    printer.add_column(before.as_str());
    printer.add_column(after.as_str());
    printer.add_column(keys::RESULT);
    result.lines = render_all(&mut printer, lister.targets_mut(), &*repo, &listed)?;

    info!(
        actor = %replacement.actor,
        source = %replacement.source.display(),
        processed = result.processed,
        replaced = result.changed,
        failed = result.failed,
        dry_run = replacement.dry_run,
        "replace done"
    );
    if replacement.dry_run {
        result.add_message(CmdMessage::info(format!(
            "Dry run: {} bitstreams would be replaced with {}",
            result.processed,
            replacement.source.display()
        )));
        return Ok(result);
    }
    repo.commit()?;
    result.add_message(CmdMessage::success(format!(
        "Replaced {} of {} bitstreams with {}",
        result.changed,
        result.processed,
        replacement.source.display()
    )));
    if let Some(message) = failure_message(&result, "bitstreams") {
        result.add_message(message);
    }
    Ok(result)
}
