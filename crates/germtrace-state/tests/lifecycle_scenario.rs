//! # Lifecycle Scenario and Property Tests
//!
//! End-to-end runs of the specimen pipeline through the public API, plus
//! property checks over the stage and lock rules:
//! - Advances succeed only from the exact preceding stage
//! - Reject never moves the stage pointer
//! - A committed record refuses every mutation except purge
//! - Payload arity is exact for every stage

use germtrace_core::content_hash;
use germtrace_state::{
    dispatch, field_count, lifecycle, HistoryEntry, Ledger, LifecycleError, MemoryLedger,
    Operation, Record, Response, Stage,
};
use proptest::prelude::*;

fn fields(stage: Stage, tag: &str) -> Vec<String> {
    (0..field_count(stage))
        .map(|i| format!("{tag}:{i}"))
        .collect()
}

fn open_ledger() -> MemoryLedger {
    let mut ledger = MemoryLedger::new();
    ledger.begin_next().unwrap();
    ledger
}

fn to_stage(ledger: &mut MemoryLedger, id: &str, stage: Stage) {
    lifecycle::create(ledger, id, &fields(Stage::Collected, "c")).unwrap();
    if stage >= Stage::Saved {
        lifecycle::save(ledger, id, &fields(Stage::Saved, "s")).unwrap();
    }
    if stage >= Stage::Entered {
        lifecycle::enter(ledger, id, &fields(Stage::Entered, "e")).unwrap();
    }
    if stage >= Stage::Shared {
        lifecycle::share(ledger, id, &fields(Stage::Shared, "h")).unwrap();
    }
}

fn advance_to(ledger: &mut MemoryLedger, id: &str, target: Stage) -> Result<Record, LifecycleError> {
    match target {
        Stage::Collected => lifecycle::create(ledger, id, &fields(target, "x")),
        Stage::Saved => lifecycle::save(ledger, id, &fields(target, "x")),
        Stage::Entered => lifecycle::enter(ledger, id, &fields(target, "x")),
        Stage::Shared => lifecycle::share(ledger, id, &fields(target, "x")),
    }
}

fn reject_at(ledger: &mut MemoryLedger, id: &str, stage: Stage) -> Result<Record, LifecycleError> {
    match stage {
        Stage::Collected => lifecycle::reject_create(ledger, id),
        Stage::Saved => lifecycle::reject_save(ledger, id),
        Stage::Entered => lifecycle::reject_enter(ledger, id),
        Stage::Shared => lifecycle::reject_share(ledger, id),
    }
}

fn stage_strategy() -> impl Strategy<Value = Stage> {
    prop::sample::select(Stage::ALL.to_vec())
}

// ─── Scenario ───────────────────────────────────────────────────────

#[test]
fn specimen_pipeline_end_to_end() {
    let mut ledger = open_ledger();

    let r = lifecycle::create(&mut ledger, "A", &fields(Stage::Collected, "c")).unwrap();
    assert_eq!(r.stage, Stage::Collected);
    assert!(!r.disputed);

    let r = lifecycle::save(&mut ledger, "A", &fields(Stage::Saved, "s")).unwrap();
    assert_eq!(r.stage, Stage::Saved);

    // Enter from Collected is refused on a second record that skipped Save.
    lifecycle::create(&mut ledger, "B", &fields(Stage::Collected, "c")).unwrap();
    let err = lifecycle::enter(&mut ledger, "B", &fields(Stage::Entered, "e")).unwrap_err();
    assert!(err.to_string().contains("expected Saved, got Collected"));

    ledger.begin_next().unwrap();
    let r = lifecycle::reject_save(&mut ledger, "A").unwrap();
    assert!(r.disputed);
    assert_eq!(r.stage, Stage::Saved);

    let r = lifecycle::modify_save(&mut ledger, "A", &fields(Stage::Saved, "s2")).unwrap();
    assert!(!r.disputed);
    assert_eq!(r.stage, Stage::Saved);

    lifecycle::enter(&mut ledger, "A", &fields(Stage::Entered, "e")).unwrap();
    lifecycle::share(&mut ledger, "A", &fields(Stage::Shared, "h")).unwrap();
    ledger.begin_next().unwrap();
    let r = lifecycle::commit(&mut ledger, "A").unwrap();
    assert!(r.locked);

    assert!(matches!(
        lifecycle::delete(&mut ledger, "A"),
        Err(LifecycleError::AlreadyFinalized { .. })
    ));

    lifecycle::admin_purge(&mut ledger, "A").unwrap();
    assert!(!lifecycle::exists(&ledger, "A").unwrap());
    assert!(lifecycle::exists(&ledger, "B").unwrap());
}

#[test]
fn stage_hashes_match_their_arguments() {
    let mut ledger = open_ledger();
    let collected = fields(Stage::Collected, "c");
    let saved = fields(Stage::Saved, "s");
    lifecycle::create(&mut ledger, "A", &collected).unwrap();
    let r = lifecycle::save(&mut ledger, "A", &saved).unwrap();

    let stored = r.collection_info.as_ref().unwrap().content_hash;
    assert_eq!(stored, content_hash(&collected));
    assert_eq!(
        r.preservation_info.as_ref().unwrap().content_hash,
        content_hash(&saved)
    );
    assert!(r.audit().is_intact());
}

#[test]
fn history_tracks_every_write_and_the_deletion() {
    let mut ledger = open_ledger();
    to_stage(&mut ledger, "A", Stage::Entered);
    lifecycle::delete(&mut ledger, "A").unwrap();

    let history = lifecycle::read_history(&ledger, "A").unwrap();
    assert_eq!(history.len(), 4);
    let stages: Vec<Option<Stage>> = history
        .map(|r| r.map(|r| (!r.deleted).then_some(r.stage)))
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        stages,
        vec![
            Some(Stage::Collected),
            Some(Stage::Saved),
            Some(Stage::Entered),
            None
        ]
    );
}

#[test]
fn history_versions_carry_transaction_ids() {
    let mut ledger = open_ledger();
    lifecycle::create(&mut ledger, "A", &fields(Stage::Collected, "c")).unwrap();
    let meta = ledger.begin_next().unwrap();
    lifecycle::reject_create(&mut ledger, "A").unwrap();

    let versions: Vec<_> = lifecycle::read_history(&ledger, "A")
        .unwrap()
        .versions()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[1].tx_id, meta.tx_id);
    assert_eq!(versions[1].record.finalizing_tx_id.as_ref(), Some(&meta.tx_id));
    assert!(versions[0].timestamp < versions[1].timestamp);
}

#[test]
fn failed_operation_writes_nothing() {
    let mut ledger = open_ledger();
    to_stage(&mut ledger, "A", Stage::Shared);
    lifecycle::commit(&mut ledger, "A").unwrap();
    let before: Vec<HistoryEntry> = ledger.history_for_key("A").unwrap();

    let finalized = |r: Result<Record, LifecycleError>| {
        matches!(r, Err(LifecycleError::AlreadyFinalized { .. }))
    };
    assert!(finalized(lifecycle::modify_create(&mut ledger, "A", &fields(Stage::Collected, "z"))));
    assert!(finalized(lifecycle::save(&mut ledger, "A", &fields(Stage::Saved, "z"))));
    assert!(finalized(lifecycle::enter(&mut ledger, "A", &fields(Stage::Entered, "z"))));
    assert!(finalized(lifecycle::share(&mut ledger, "A", &fields(Stage::Shared, "z"))));
    assert!(finalized(lifecycle::reject_share(&mut ledger, "A")));
    assert!(matches!(
        lifecycle::delete(&mut ledger, "A"),
        Err(LifecycleError::AlreadyFinalized { .. })
    ));

    assert_eq!(ledger.history_for_key("A").unwrap(), before);
}

#[test]
fn dispatch_accepts_chaincode_names() {
    let mut ledger = open_ledger();
    let mut args = vec!["A".to_string()];
    args.extend(fields(Stage::Collected, "c"));
    let op: Operation = "CreateFruitInfo".parse().unwrap();
    let Response::Record(record) = dispatch(&mut ledger, op, &args).unwrap() else {
        panic!("create should return the record");
    };
    assert_eq!(record.id.as_str(), "A");

    let op: Operation = "ReadFruitInfoByRange".parse().unwrap();
    let Response::Records(records) =
        dispatch(&mut ledger, op, &["A".to_string(), "B".to_string()]).unwrap()
    else {
        panic!("range should return records");
    };
    assert_eq!(records.len(), 1);
}

// ─── Properties ─────────────────────────────────────────────────────

proptest! {
    /// An advance succeeds iff the record is at the stage just before it.
    #[test]
    fn advance_requires_exact_predecessor(current in stage_strategy(), target in stage_strategy()) {
        prop_assume!(target != Stage::Collected);
        let mut ledger = open_ledger();
        to_stage(&mut ledger, "A", current);

        let result = advance_to(&mut ledger, "A", target);
        if target.previous() == Some(current) {
            prop_assert_eq!(result.unwrap().stage, target);
        } else {
            let is_transition_error = matches!(
                result,
                Err(LifecycleError::InvalidStateTransition { expected, actual, .. })
                    if Some(expected) == target.previous() && actual == current
            );
            prop_assert!(is_transition_error);
            prop_assert_eq!(lifecycle::read(&ledger, "A").unwrap().stage, current);
        }
    }

    /// Reject never changes the stage and only succeeds at the current stage.
    #[test]
    fn reject_never_moves_stage(current in stage_strategy(), rejected in stage_strategy()) {
        let mut ledger = open_ledger();
        to_stage(&mut ledger, "A", current);

        let result = reject_at(&mut ledger, "A", rejected);
        let after = lifecycle::read(&ledger, "A").unwrap();
        prop_assert_eq!(after.stage, current);
        prop_assert_eq!(result.is_ok(), rejected == current);
        prop_assert_eq!(after.disputed, rejected == current);
    }

    /// After commit every mutation fails with AlreadyFinalized.
    #[test]
    fn committed_record_refuses_mutation(stage in stage_strategy(), kind in 0u8..3) {
        let mut ledger = open_ledger();
        to_stage(&mut ledger, "A", Stage::Shared);
        lifecycle::commit(&mut ledger, "A").unwrap();

        let result = match (kind, stage) {
            (0, Stage::Collected) => lifecycle::modify_create(&mut ledger, "A", &fields(stage, "m")),
            (0, Stage::Saved) => lifecycle::modify_save(&mut ledger, "A", &fields(stage, "m")),
            (0, Stage::Entered) => lifecycle::modify_enter(&mut ledger, "A", &fields(stage, "m")),
            (0, Stage::Shared) => lifecycle::modify_share(&mut ledger, "A", &fields(stage, "m")),
            (1, _) => reject_at(&mut ledger, "A", stage),
            (_, Stage::Collected) => lifecycle::modify_create(&mut ledger, "A", &fields(stage, "m")),
            (_, _) => advance_to(&mut ledger, "A", stage),
        };
        let finalized = matches!(result, Err(LifecycleError::AlreadyFinalized { .. }));
        prop_assert!(finalized);
        prop_assert!(lifecycle::read(&ledger, "A").unwrap().locked);
    }

    /// Only the declared field count binds.
    #[test]
    fn payload_arity_is_exact(stage in stage_strategy(), count in 0usize..40) {
        let mut ledger = open_ledger();
        if stage != Stage::Collected {
            lifecycle::create(&mut ledger, "A", &fields(Stage::Collected, "c")).unwrap();
        }
        let args: Vec<String> = (0..count).map(|i| i.to_string()).collect();
        let result = match stage {
            Stage::Collected => lifecycle::create(&mut ledger, "A", &args),
            Stage::Saved => lifecycle::modify_save(&mut ledger, "A", &args),
            Stage::Entered => lifecycle::modify_enter(&mut ledger, "A", &args),
            Stage::Shared => lifecycle::modify_share(&mut ledger, "A", &args),
        };
        if count == field_count(stage) {
            prop_assert!(result.is_ok());
        } else {
            let arity_error = matches!(
                result,
                Err(LifecycleError::InvalidArgumentCount { expected, actual, .. })
                    if expected == field_count(stage) && actual == count
            );
            prop_assert!(arity_error);
        }
    }

    /// Create then exists; a second create fails.
    #[test]
    fn create_is_not_repeatable(id in "[A-Za-z0-9_-]{1,16}") {
        let mut ledger = open_ledger();
        lifecycle::create(&mut ledger, &id, &fields(Stage::Collected, "c")).unwrap();
        prop_assert!(lifecycle::exists(&ledger, &id).unwrap());
        let again = lifecycle::create(&mut ledger, &id, &fields(Stage::Collected, "c"));
        let exists_error = matches!(again, Err(LifecycleError::AlreadyExists { .. }));
        prop_assert!(exists_error);
    }
}
