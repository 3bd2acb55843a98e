use civitas::core::config::CivitasConfig;
use civitas::core::engine::{Engine, GovernanceError};
use civitas::core::gate::{Action, Caller};
use civitas::core::ledger::MemberId;
use civitas::core::store::Store;
use civitas::plugins::debate::{close_debate, debate_state, may_speak_in_debate, open_debate};
use civitas::plugins::election::{open_polls, register_candidate};
use tempfile::tempdir;

const SUPERVISOR: u64 = 42;

fn engine(root: &std::path::Path) -> Engine {
    let config = CivitasConfig {
        supervisors: vec![MemberId(SUPERVISOR)],
        ..CivitasConfig::default()
    };
    Engine::new(Store::new(root), config).unwrap()
}

#[test]
fn test_debate_toggle_requires_supervisor() {
    let tmp = tempdir().unwrap();
    let engine = engine(tmp.path());
    let supervisor = Caller::new(SUPERVISOR, "mod");

    assert!(!debate_state(&engine).unwrap());
    let err = open_debate(&engine, &Caller::new(1, "pleb")).unwrap_err();
    assert!(matches!(
        err,
        GovernanceError::Unauthorized {
            action: Action::OpenDebate
        }
    ));
    assert!(!debate_state(&engine).unwrap());

    let flags = open_debate(&engine, &supervisor).unwrap();
    assert!(flags.debating);
    assert!(debate_state(&engine).unwrap());

    close_debate(&engine, &supervisor).unwrap();
    assert!(!debate_state(&engine).unwrap());
}

#[test]
fn test_debate_is_independent_of_polls() {
    let tmp = tempdir().unwrap();
    let engine = engine(tmp.path());
    let supervisor = Caller::new(SUPERVISOR, "mod");
    open_debate(&engine, &supervisor).unwrap();
    open_polls(&engine, &supervisor).unwrap();
    let flags = engine.phase_flags().unwrap();
    assert!(flags.debating && flags.polls_open && !flags.tyranny_active);
}

#[test]
fn test_speech_needs_debate_and_candidacy() {
    let tmp = tempdir().unwrap();
    let engine = engine(tmp.path());
    let supervisor = Caller::new(SUPERVISOR, "mod");
    let candidate = Caller::new(1, "alice");
    let bystander = Caller::new(2, "bob");
    register_candidate(&engine, &candidate, None).unwrap();

    // Not debating yet: only the supervisor may speak.
    assert!(!may_speak_in_debate(&engine, &candidate).unwrap().allowed);
    assert!(!may_speak_in_debate(&engine, &bystander).unwrap().allowed);
    assert!(may_speak_in_debate(&engine, &supervisor).unwrap().allowed);

    open_debate(&engine, &supervisor).unwrap();
    let verdict = may_speak_in_debate(&engine, &candidate).unwrap();
    assert!(verdict.allowed && verdict.is_candidate && verdict.debating);

    let verdict = may_speak_in_debate(&engine, &bystander).unwrap();
    assert!(!verdict.allowed);
    assert!(!verdict.is_candidate);
}

#[test]
fn test_closure_gate_replaces_roster() {
    let tmp = tempdir().unwrap();
    // A platform that grants debate control to anyone named "host".
    let engine = engine(tmp.path()).with_gate(|caller: &Caller, action: Action| {
        caller.name == "host" && matches!(action, Action::OpenDebate | Action::CloseDebate)
    });

    open_debate(&engine, &Caller::new(77, "host")).unwrap();
    assert!(debate_state(&engine).unwrap());
    assert!(open_debate(&engine, &Caller::new(SUPERVISOR, "mod")).is_err());

    // Speech checks consult the same gate.
    let verdict = may_speak_in_debate(&engine, &Caller::new(77, "host")).unwrap();
    assert!(!verdict.is_supervisor);
    assert!(!verdict.allowed);
}
