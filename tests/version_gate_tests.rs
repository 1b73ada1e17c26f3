use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use upgrade_gate::{
    GateError, MemoryVersionStore, Savepoint, UpgradePlan, VersionGate, VersionStore, run_upgrade,
};

const COMPONENT: &str = "local_helloworld";

fn helloworld_plan() -> UpgradePlan<()> {
    let mut plan = UpgradePlan::new(COMPONENT);
    plan.add_noop_savepoint(2024120100).unwrap();
    plan
}

/// Plan whose steps bump a shared counter, so tests can count side effects.
fn counting_plan(targets: &[u64], counter: &Arc<AtomicUsize>) -> UpgradePlan<()> {
    let mut plan = UpgradePlan::<()>::new(COMPONENT);
    for target in targets {
        let counter = Arc::clone(counter);
        plan.add_savepoint(Savepoint::new(*target).with_step(move |_: &mut ()| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }))
        .unwrap();
    }
    plan
}

#[test]
fn helloworld_upgrade_from_older_release() {
    let plan = helloworld_plan();
    let mut store = MemoryVersionStore::with_versions([(COMPONENT, 2024010100)]);

    let report = run_upgrade(&plan, 2024010100, &mut store, &mut ()).unwrap();

    assert_eq!(report.applied, vec![2024120100]);
    assert_eq!(store.installed_version(COMPONENT).unwrap(), Some(2024120100));
}

#[test]
fn helloworld_upgrade_at_current_release_is_noop() {
    let plan = helloworld_plan();
    let mut store = MemoryVersionStore::with_versions([(COMPONENT, 2024120100)]);

    let report = run_upgrade(&plan, 2024120100, &mut store, &mut ()).unwrap();

    assert!(report.is_noop());
    assert_eq!(store.write_count(), 0);
}

#[test]
fn helloworld_upgrade_from_newer_release_is_noop() {
    let plan = helloworld_plan();
    let mut store = MemoryVersionStore::with_versions([(COMPONENT, 2025010100)]);

    let report = run_upgrade(&plan, 2025010100, &mut store, &mut ()).unwrap();

    assert!(report.is_noop());
    assert_eq!(store.installed_version(COMPONENT).unwrap(), Some(2025010100));
}

#[test]
fn no_side_effects_at_or_above_max_version() {
    let counter = Arc::new(AtomicUsize::new(0));
    let plan = counting_plan(&[3, 7, 11], &counter);

    for old_version in [11, 12, 1_000, u64::MAX] {
        let mut store = MemoryVersionStore::new();
        let report = run_upgrade(&plan, old_version, &mut store, &mut ()).unwrap();
        assert!(report.is_noop());
        assert_eq!(store.write_count(), 0);
    }
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[test]
fn first_install_reaches_max_version() {
    let counter = Arc::new(AtomicUsize::new(0));
    let plan = counting_plan(&[1, 2, 4, 8, 16], &counter);
    let mut store = MemoryVersionStore::new();

    let report = run_upgrade(&plan, 0, &mut store, &mut ()).unwrap();

    assert_eq!(report.to_version, plan.max_version());
    assert_eq!(store.installed_version(COMPONENT).unwrap(), Some(16));
    assert_eq!(counter.load(Ordering::SeqCst), 5);
    assert_eq!(store.write_count(), 5);
}

#[test]
fn second_pass_with_returned_version_is_idempotent() {
    let counter = Arc::new(AtomicUsize::new(0));
    let plan = counting_plan(&[10, 20], &counter);
    let mut store = MemoryVersionStore::new();
    let gate = VersionGate::new(&plan);

    let first = gate.run_upgrade(0, &mut store, &mut ()).unwrap();
    let second = gate.run_upgrade(first.to_version, &mut store, &mut ()).unwrap();

    assert!(second.is_noop());
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[test]
fn installed_version_never_decreases() {
    let counter = Arc::new(AtomicUsize::new(0));
    let plan = counting_plan(&[5, 10, 15], &counter);

    for (recorded, caller) in [(0, 0), (5, 5), (10, 0), (15, 3), (40, 40)] {
        let mut store = MemoryVersionStore::with_versions([(COMPONENT, recorded)]);
        run_upgrade(&plan, caller, &mut store, &mut ()).unwrap();
        let after = store.installed_version(COMPONENT).unwrap().unwrap();
        assert!(after >= recorded, "{} dropped to {}", recorded, after);
    }
}

#[test]
fn failed_savepoint_leaves_previous_version_and_retry_resumes() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let applied_first = Arc::new(AtomicUsize::new(0));

    let mut plan = UpgradePlan::<()>::new(COMPONENT);
    {
        let applied_first = Arc::clone(&applied_first);
        plan.add_savepoint(Savepoint::new(100).with_step(move |_: &mut ()| {
            applied_first.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }))
        .unwrap();
    }
    {
        // Fails on the first attempt only, as a transient error would.
        let attempts = Arc::clone(&attempts);
        plan.add_savepoint(
            Savepoint::new(200)
                .with_label("add index")
                .with_step(move |_: &mut ()| {
                    if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(GateError::ExecutionError("lock timeout".to_string()))
                    } else {
                        Ok(())
                    }
                }),
        )
        .unwrap();
    }
    plan.add_noop_savepoint(300).unwrap();

    let mut store = MemoryVersionStore::new();
    let err = run_upgrade(&plan, 0, &mut store, &mut ()).unwrap_err();
    assert_eq!(err.failed_version(), Some(200));
    assert!(err.to_string().contains("lock timeout"));
    assert_eq!(store.installed_version(COMPONENT).unwrap(), Some(100));

    // The host retries with the unchanged caller version.
    let report = run_upgrade(&plan, 0, &mut store, &mut ()).unwrap();
    assert_eq!(report.from_version, 100);
    assert_eq!(report.applied, vec![200, 300]);
    assert_eq!(applied_first.load(Ordering::SeqCst), 1);
    assert_eq!(store.installed_version(COMPONENT).unwrap(), Some(300));
}

#[test]
fn steps_see_the_injected_context() {
    struct HostContext {
        executed_sql: Vec<String>,
    }

    let plan = UpgradePlan::new(COMPONENT)
        .with_savepoint(Savepoint::new(2).with_step(|ctx: &mut HostContext| {
            ctx.executed_sql
                .push("ALTER TABLE greetings ADD COLUMN lang TEXT".to_string());
            Ok(())
        }))
        .unwrap();
    let mut ctx = HostContext {
        executed_sql: Vec::new(),
    };
    let mut store = MemoryVersionStore::new();

    run_upgrade(&plan, 1, &mut store, &mut ctx).unwrap();

    assert_eq!(ctx.executed_sql.len(), 1);
}
