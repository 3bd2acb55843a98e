use civitas::core::chance::{FixedDice, SeededDice};
use civitas::core::config::CivitasConfig;
use civitas::core::engine::{Engine, GovernanceError};
use civitas::core::gate::Caller;
use civitas::core::ledger::{MemberId, PresidentSlot};
use civitas::core::store::Store;
use civitas::plugins::election::{close_and_elect, open_polls, register_candidate};
use civitas::plugins::tyranny::{attempt_revolt, declare_tyranny, president};
use tempfile::tempdir;

const SUPERVISOR: u64 = 3;

fn seated(root: &std::path::Path, config: CivitasConfig) -> Engine {
    let config = CivitasConfig {
        supervisors: vec![MemberId(SUPERVISOR)],
        ..config
    };
    let engine = Engine::new(Store::new(root), config).unwrap();
    let supervisor = Caller::new(SUPERVISOR, "mod");
    register_candidate(&engine, &Caller::new(1, "caesar"), None).unwrap();
    open_polls(&engine, &supervisor).unwrap();
    close_and_elect(&engine, &supervisor).unwrap();
    engine
}

#[test]
fn test_only_president_declares_tyranny() {
    let tmp = tempdir().unwrap();
    let engine = seated(tmp.path(), CivitasConfig::default());

    let err = declare_tyranny(&engine, &Caller::new(9, "brutus")).unwrap_err();
    assert!(matches!(err, GovernanceError::Unauthorized { .. }));
    assert!(!engine.phase_flags().unwrap().tyranny_active);

    let flags = declare_tyranny(&engine, &Caller::new(1, "caesar")).unwrap();
    assert!(flags.tyranny_active);
}

#[test]
fn test_supervisor_cannot_declare_tyranny() {
    let tmp = tempdir().unwrap();
    let engine = seated(tmp.path(), CivitasConfig::default());
    let err = declare_tyranny(&engine, &Caller::new(SUPERVISOR, "mod")).unwrap_err();
    assert!(matches!(err, GovernanceError::Unauthorized { .. }));
}

#[test]
fn test_revolt_without_tyranny() {
    let tmp = tempdir().unwrap();
    let engine = seated(tmp.path(), CivitasConfig::default()).with_dice(FixedDice(true));
    let err = attempt_revolt(&engine, &Caller::new(9, "brutus")).unwrap_err();
    assert!(matches!(err, GovernanceError::NoTyrannyActive));
    assert!(president(&engine).unwrap().is_some());
}

#[test]
fn test_successful_revolt_vacates_slot() {
    let tmp = tempdir().unwrap();
    let engine = seated(tmp.path(), CivitasConfig::default()).with_dice(FixedDice(true));
    declare_tyranny(&engine, &Caller::new(1, "caesar")).unwrap();

    let outcome = attempt_revolt(&engine, &Caller::new(9, "brutus")).unwrap();
    assert!(outcome.succeeded);
    assert_eq!(
        outcome.deposed,
        Some(PresidentSlot {
            name: "caesar".to_string(),
            candidate_id: MemberId(1),
        })
    );
    assert!(!engine.phase_flags().unwrap().tyranny_active);
    assert!(president(&engine).unwrap().is_none());

    // Democracy restored: a second revolt has nothing to overthrow.
    assert!(matches!(
        attempt_revolt(&engine, &Caller::new(9, "brutus")),
        Err(GovernanceError::NoTyrannyActive)
    ));
}

#[test]
fn test_failed_revolt_changes_nothing() {
    let tmp = tempdir().unwrap();
    let engine = seated(tmp.path(), CivitasConfig::default()).with_dice(FixedDice(false));
    declare_tyranny(&engine, &Caller::new(1, "caesar")).unwrap();
    let before = president(&engine).unwrap();

    let outcome = attempt_revolt(&engine, &Caller::new(9, "brutus")).unwrap();
    assert!(!outcome.succeeded);
    assert!(outcome.deposed.is_none());
    assert!(engine.phase_flags().unwrap().tyranny_active);
    assert_eq!(president(&engine).unwrap(), before);
}

#[test]
fn test_seeded_revolts_are_reproducible() {
    let run = |seed: u64| -> Vec<bool> {
        let tmp = tempdir().unwrap();
        let engine = seated(tmp.path(), CivitasConfig::default()).with_dice(SeededDice::from_seed(seed));
        let mut outcomes = Vec::new();
        for _ in 0..5 {
            let caesar = Caller::new(1, "caesar");
            if president(&engine).unwrap().is_none() {
                // Reseat caesar through a fresh election.
                let supervisor = Caller::new(SUPERVISOR, "mod");
                register_candidate(&engine, &caesar, None).unwrap();
                open_polls(&engine, &supervisor).unwrap();
                close_and_elect(&engine, &supervisor).unwrap();
            }
            declare_tyranny(&engine, &caesar).unwrap();
            outcomes.push(attempt_revolt(&engine, &Caller::new(9, "brutus")).unwrap().succeeded);
        }
        outcomes
    };
    assert_eq!(run(17), run(17));
}

#[test]
fn test_config_seed_drives_dice() {
    let config = CivitasConfig {
        revolt_seed: Some(5),
        revolt_success_probability: 1.0,
        ..CivitasConfig::default()
    };
    let tmp = tempdir().unwrap();
    let engine = seated(tmp.path(), config);
    declare_tyranny(&engine, &Caller::new(1, "caesar")).unwrap();
    assert!(attempt_revolt(&engine, &Caller::new(9, "brutus")).unwrap().succeeded);
}
