use crate::args::Resolved;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::printer::Printer;
use crate::store::ContentRepository;
use tracing::info;

use super::helpers::{list_targets, render_all};

pub fn run<R: ContentRepository + ?Sized>(repo: &R, resolved: &Resolved) -> Result<CmdResult> {
    let (mut lister, listed) = list_targets(repo, resolved)?;
    let mut printer = Printer::new(resolved.format, resolved.columns.clone());
    let lines = render_all(&mut printer, lister.targets_mut(), repo, &listed)?;

    info!(root = %resolved.root, target = %resolved.target_type, count = listed.len(), "listed");
    let mut result = CmdResult::default().with_lines(lines);
    result.processed = listed.len();
    if listed.is_empty() {
        result.add_message(CmdMessage::info(format!(
            "No {} targets under {}",
            resolved.target_type, resolved.root
        )));
    }
    Ok(result)
}
