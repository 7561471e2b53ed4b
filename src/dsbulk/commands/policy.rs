use crate::args::Resolved;
use crate::attributes::{keys, AttrValue};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::{DsoRef, Policy, PolicyAction, Principal};
use crate::printer::Printer;
use crate::store::{AuthorizationService, ContentRepository};
use chrono::Utc;
use tracing::{debug, info};

use super::helpers::{
    after_key, before_key, failure_message, list_targets, record_outcome, render_all, CHANGED,
};

/// Column suffix for the policy overlays: `before:policies`, `after:policies`.
const POLICIES: &str = "policies";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyMode {
    Add,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyEdit {
    pub actor: Principal,
    pub action: PolicyAction,
    pub who: Principal,
    pub mode: PolicyMode,
    pub dry_run: bool,
}

pub fn run<R>(repo: &mut R, resolved: &Resolved, edit: &PolicyEdit) -> Result<CmdResult>
where
    R: ContentRepository + AuthorizationService + ?Sized,
{
    let (mut lister, listed) = list_targets(&*repo, resolved)?;
    let before = before_key(POLICIES);
    let after = after_key(POLICIES);

    let mut result = CmdResult::default();
    for &id in &listed {
        let obj = lister.targets().object(id);
        let old = repo.policies_of(obj)?;
        lister
            .targets_mut()
            .put(&*repo, id, before.as_str(), policy_list(&old));

        let outcome = apply(repo, obj, edit, &old);
        let targets = lister.targets_mut();
        match &outcome {
            Ok(changed) => {
                targets.put(&*repo, id, after.as_str(), policy_list(&repo.policies_of(obj)?));
                targets.put(&*repo, id, CHANGED, *changed);
                if *changed {
                    result.changed += 1;
                }
            }
            Err(e) => {
                debug!(object = %obj, error = %e, "policy edit failed");
                targets.put(&*repo, id, after.as_str(), policy_list(&old));
                targets.put(&*repo, id, CHANGED, false);
                result.failed += 1;
            }
        }
        record_outcome(targets, &*repo, id, &outcome.map(|_| ()));
        result.processed += 1;
    }

    let mut printer = Printer::new(resolved.format, resolved.columns.clone());
    printer.add_column(before.as_str());
    printer.add_column(after.as_str());
    printer.add_column(CHANGED);
    printer.add_column(keys::RESULT);
    result.lines = render_all(&mut printer, lister.targets_mut(), &*repo, &listed)?;

    info!(
        actor = %edit.actor,
        action = %edit.action,
        who = %edit.who,
        mode = ?edit.mode,
        processed = result.processed,
        changed = result.changed,
        dry_run = edit.dry_run,
        "policy edit done"
    );
    if edit.dry_run {
        result.add_message(CmdMessage::info(format!(
            "Dry run: {} of {} objects would change, nothing committed",
            result.changed, result.processed
        )));
        return Ok(result);
    }
    repo.commit()?;
    let verb = match edit.mode {
        PolicyMode::Add => "Granted",
        PolicyMode::Remove => "Revoked",
    };
    result.add_message(CmdMessage::success(format!(
        "{} {} to {} on {} of {} objects",
        verb, edit.action, edit.who, result.changed, result.processed
    )));
    if let Some(message) = failure_message(&result, "objects") {
        result.add_message(message);
    }
    Ok(result)
}

/// Apply the edit to one object; `Ok(true)` when its policies changed.
fn apply<R>(repo: &mut R, obj: DsoRef, edit: &PolicyEdit, existing: &[Policy]) -> Result<bool>
where
    R: AuthorizationService + ?Sized,
{
    match edit.mode {
        PolicyMode::Add => {
            if existing
                .iter()
                .any(|p| p.action == edit.action && p.principal == edit.who)
            {
                return Ok(false);
            }
            let mut policy = Policy::new(edit.action, edit.who.clone());
            policy.start_date = Some(Utc::now());
            repo.add_policy(obj, policy)?;
            Ok(true)
        }
        PolicyMode::Remove => Ok(repo.remove_policies(obj, edit.action, &edit.who)? > 0),
    }
}

fn policy_list(policies: &[Policy]) -> AttrValue {
    AttrValue::List(
        policies
            .iter()
            .map(|p| AttrValue::Str(p.to_string()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{resolve, CommonArgs, Defaults};
    use crate::store::memory::fixtures::sample;

    fn edit(mode: PolicyMode) -> PolicyEdit {
        PolicyEdit {
            actor: Principal::EPerson("admin@example.org".into()),
            action: PolicyAction::Read,
            who: Principal::Group("Anonymous".into()),
            mode,
            dry_run: false,
        }
    }

    fn items_of(repo: &impl ContentRepository, root: DsoRef) -> Resolved {
        let args = CommonArgs {
            root: Some(root.to_string()),
            target_type: Some("item".into()),
            include: Some("object".into()),
            ..Default::default()
        };
        resolve(repo, &args, &Defaults::default()).unwrap()
    }

    #[test]
    fn add_then_remove() {
        let (f, s) = sample();
        let mut repo = f.build();
        let resolved = items_of(&repo, s.c1);

        let added = run(&mut repo, &resolved, &edit(PolicyMode::Add)).unwrap();
        assert_eq!(added.changed, 2);
        assert_eq!(
            added.lines[0],
            "object=ITEM.3 before:policies=[] after:policies=[READ:GROUP:Anonymous] changed=true result=ok"
        );
        assert_eq!(repo.policies_of(s.i1).unwrap().len(), 1);
        assert!(repo.policies_of(s.i1).unwrap()[0].start_date.is_some());

        // Adding the same grant again is a no-op.
        let again = run(&mut repo, &resolved, &edit(PolicyMode::Add)).unwrap();
        assert_eq!(again.changed, 0);
        assert_eq!(repo.policies_of(s.i2).unwrap().len(), 1);

        let removed = run(&mut repo, &resolved, &edit(PolicyMode::Remove)).unwrap();
        assert_eq!(removed.changed, 2);
        assert!(repo.policies_of(s.i1).unwrap().is_empty());
        assert_eq!(repo.backend().save_count(), 2);
    }

    #[test]
    fn works_on_bitstreams_too() {
        let (f, s) = sample();
        let mut repo = f.build();
        let args = CommonArgs {
            root: Some(s.c1.to_string()),
            target_type: Some("bitstream".into()),
            include: Some("name".into()),
            ..Default::default()
        };
        let resolved = resolve(&repo, &args, &Defaults::default()).unwrap();
        let result = run(&mut repo, &resolved, &edit(PolicyMode::Add)).unwrap();
        assert_eq!(result.processed, 1);
        assert_eq!(repo.policies_of(s.bs1).unwrap().len(), 1);
    }

    #[test]
    fn dry_run_leaves_backend_untouched() {
        let (f, s) = sample();
        let mut repo = f.build();
        let resolved = items_of(&repo, s.c1);
        let mut edit = edit(PolicyMode::Add);
        edit.dry_run = true;
        let result = run(&mut repo, &resolved, &edit).unwrap();
        assert_eq!(result.changed, 2);
        assert_eq!(repo.backend().save_count(), 0);
    }
}
