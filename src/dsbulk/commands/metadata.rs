use crate::args::Resolved;
use crate::attributes::{keys, AttrValue};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::{DsoRef, MetadataField, Principal};
use crate::printer::Printer;
use crate::store::ContentRepository;
use tracing::{debug, info};

use super::helpers::{
    after_key, before_key, failure_message, list_targets, record_outcome, render_all, CHANGED,
};

/// One metadata assignment applied to every listed item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataEdit {
    pub actor: Principal,
    pub field: MetadataField,
    pub value: String,
    /// Keep existing values and add this one after them.
    pub append: bool,
    pub dry_run: bool,
}

pub fn run<R: ContentRepository + ?Sized>(
    repo: &mut R,
    resolved: &Resolved,
    edit: &MetadataEdit,
) -> Result<CmdResult> {
    let (mut lister, listed) = list_targets(&*repo, resolved)?;
    let field_name = edit.field.to_string();
    let before = before_key(&field_name);
    let after = after_key(&field_name);

    let mut result = CmdResult::default();
    for &id in &listed {
        let obj = lister.targets().object(id);
        let old = repo.metadata_values(obj, &edit.field)?;
        let targets = lister.targets_mut();
        targets.put(&*repo, id, before.as_str(), AttrValue::from_values(old.clone()));

        let new = if edit.append {
            let mut values = old.clone();
            values.push(edit.value.clone());
            values
        } else {
            vec![edit.value.clone()]
        };
        let changed = new != old;

        let outcome = if changed {
            apply(repo, obj, edit)
        } else {
            Ok(())
        };
        let targets = lister.targets_mut();
        match &outcome {
            Ok(()) => {
                targets.put(&*repo, id, after.as_str(), AttrValue::from_values(new));
                targets.put(&*repo, id, CHANGED, changed);
                if changed {
                    result.changed += 1;
                }
            }
            Err(e) => {
                debug!(object = %obj, error = %e, "metadata edit failed");
                targets.put(&*repo, id, after.as_str(), AttrValue::from_values(old));
                targets.put(&*repo, id, CHANGED, false);
                result.failed += 1;
            }
        }
        record_outcome(targets, &*repo, id, &outcome);
        result.processed += 1;
    }

    let mut printer = Printer::new(resolved.format, resolved.columns.clone());
    printer.add_column(before.as_str());
    printer.add_column(after.as_str());
    printer.add_column(CHANGED);
    printer.add_column(keys::RESULT);
    result.lines = render_all(&mut printer, lister.targets_mut(), &*repo, &listed)?;

    finish(repo, edit, &mut result)?;
    Ok(result)
}

fn apply<R: ContentRepository + ?Sized>(repo: &mut R, item: DsoRef, edit: &MetadataEdit) -> Result<()> {
    if edit.append {
        repo.add_metadata(item, &edit.field, edit.value.clone())
    } else {
        repo.set_metadata(item, &edit.field, vec![edit.value.clone()])
    }
}

fn finish<R: ContentRepository + ?Sized>(
    repo: &mut R,
    edit: &MetadataEdit,
    result: &mut CmdResult,
) -> Result<()> {
    info!(
        actor = %edit.actor,
        field = %edit.field,
        processed = result.processed,
        changed = result.changed,
        failed = result.failed,
        dry_run = edit.dry_run,
        "metadata edit done"
    );
    if edit.dry_run {
        result.add_message(CmdMessage::info(format!(
            "Dry run: {} of {} items would change, nothing committed",
            result.changed, result.processed
        )));
        return Ok(());
    }
    repo.commit()?;
    result.add_message(CmdMessage::success(format!(
        "Updated {} on {} of {} items",
        edit.field, result.changed, result.processed
    )));
    if let Some(message) = failure_message(result, "items") {
        result.add_message(message);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{resolve, CommonArgs, Defaults};
    use crate::store::memory::fixtures::sample;

    fn items_of_c1(repo: &impl ContentRepository, c1: DsoRef) -> Resolved {
        let args = CommonArgs {
            root: Some(c1.to_string()),
            target_type: Some("item".into()),
            include: Some("id".into()),
            ..Default::default()
        };
        resolve(repo, &args, &Defaults::default()).unwrap()
    }

    fn edit(assignment: &str) -> MetadataEdit {
        let (field, value) = MetadataField::parse_assignment(assignment).unwrap();
        MetadataEdit {
            actor: Principal::EPerson("admin@example.org".into()),
            field,
            value,
            append: false,
            dry_run: false,
        }
    }

    #[test]
    fn sets_field_and_reports_before_after() {
        let (f, s) = sample();
        let mut repo = f.build();
        let resolved = items_of_c1(&repo, s.c1);

        let result = run(&mut repo, &resolved, &edit("dc.title=Second")).unwrap();
        assert_eq!(
            result.lines,
            vec![
                "id=3 before:dc.title=First after:dc.title=Second changed=true result=ok",
                "id=4 before:dc.title=Second after:dc.title=Second changed=false result=ok",
            ]
        );
        assert_eq!(result.changed, 1);
        assert_eq!(repo.backend().save_count(), 1);
        assert_eq!(repo.name_of(s.i1).unwrap().as_deref(), Some("Second"));
    }

    #[test]
    fn append_keeps_existing_values() {
        let (mut f, s) = sample();
        f.metadata(s.i1, "dc.subject", "physics");
        let mut repo = f.build();
        let resolved = items_of_c1(&repo, s.c1);

        let mut edit = edit("dc.subject=optics");
        edit.append = true;
        let result = run(&mut repo, &resolved, &edit).unwrap();
        assert_eq!(result.changed, 2);
        assert_eq!(
            result.lines[0],
            "id=3 before:dc.subject=physics after:dc.subject=[physics, optics] changed=true result=ok"
        );
        assert_eq!(
            result.lines[1],
            "id=4 before:dc.subject= after:dc.subject=optics changed=true result=ok"
        );
        let subject = MetadataField::new("dc", "subject", None);
        assert_eq!(
            repo.metadata_values(s.i1, &subject).unwrap(),
            vec!["physics", "optics"]
        );
    }

    #[test]
    fn dry_run_does_not_commit() {
        let (f, s) = sample();
        let mut repo = f.build();
        let resolved = items_of_c1(&repo, s.c1);

        let mut edit = edit("dc.title=Renamed");
        edit.dry_run = true;
        let result = run(&mut repo, &resolved, &edit).unwrap();
        assert_eq!(result.changed, 2);
        assert_eq!(repo.backend().save_count(), 0);
        assert!(result.messages[0].content.starts_with("Dry run"));
    }

    #[test]
    fn commit_failure_aborts() {
        let (f, s) = sample();
        let mut repo = f.build();
        let resolved = items_of_c1(&repo, s.c1);
        repo.backend().set_simulate_write_error(true);
        assert!(run(&mut repo, &resolved, &edit("dc.title=X")).is_err());
    }
}
