use civitas::core::broker::{self, DbBroker};
use civitas::core::config::{self, CivitasConfig};
use civitas::core::db;
use civitas::core::engine::{Engine, GovernanceError};
use civitas::core::error::CivitasError;
use civitas::core::gate::Caller;
use civitas::core::ledger::{Ledger, MemberId, PhaseFlags};
use civitas::core::schemas;
use civitas::core::store::Store;
use civitas::plugins::election::{open_polls, register_candidate, withdraw};
use rusqlite::params;
use std::fs;
use tempfile::tempdir;

#[test]
fn store_initialization_is_idempotent() {
    let tmp = tempdir().unwrap();
    let store = Store::new(tmp.path().join("nested").join(".civitas"));
    assert!(!store.is_initialized());

    let first = store.initialize().unwrap();
    let second = store.initialize().unwrap();
    assert_eq!(first, second);
    assert!(store.is_initialized());
    assert!(first.ends_with(schemas::CIVITAS_DB_NAME));
}

#[test]
fn seeded_state_survives_reinitialization() {
    let tmp = tempdir().unwrap();
    let engine = Engine::open(tmp.path()).unwrap();
    register_candidate(&engine, &Caller::new(1, "alice"), None).unwrap();
    drop(engine);

    // Reopening must not reset flags or wipe the roster.
    let engine = Engine::open(tmp.path()).unwrap();
    assert_eq!(engine.phase_flags().unwrap(), PhaseFlags::default());
    let status = civitas::status(&engine).unwrap();
    assert_eq!(status.candidates, 1);
    assert!(status.president.is_none());
    assert_eq!(status.ballots, 0);
}

#[test]
fn broker_audits_every_mutation() {
    let tmp = tempdir().unwrap();
    let config = CivitasConfig {
        supervisors: vec![MemberId(10)],
        ..CivitasConfig::default()
    };
    let engine = Engine::new(Store::new(tmp.path()), config).unwrap();
    let alice = Caller::new(1, "alice");

    register_candidate(&engine, &alice, None).unwrap();
    let rejected = register_candidate(&engine, &alice, None).unwrap_err();
    assert!(matches!(rejected, GovernanceError::AlreadyRegistered { .. }));
    open_polls(&engine, &Caller::new(10, "mod")).unwrap();

    let events = engine.broker().read_events(10).unwrap();
    let summary: Vec<(&str, &str)> = events
        .iter()
        .map(|e| (e.op.as_str(), e.status.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("election.register", "success"),
            ("election.register", "error"),
            ("polls.open", "success"),
        ]
    );
    assert_eq!(events[0].actor, "alice#1");
    assert!(events.iter().all(|e| e.db_id == schemas::CIVITAS_DB_NAME));
    assert!(events[1].detail.as_deref().unwrap().contains("already registered"));
}

#[test]
fn unwritable_audit_log_never_half_applies() {
    let tmp = tempdir().unwrap();
    let engine = Engine::open(tmp.path()).unwrap();
    fs::create_dir_all(engine.broker().audit_log_path()).unwrap();
    let alice = Caller::new(1, "alice");

    let err = register_candidate(&engine, &alice, None).unwrap_err();
    assert!(!err.is_rejection());
    assert_eq!(civitas::status(&engine).unwrap().candidates, 0);

    // Rejections keep their type even when the log cannot record them.
    let err = withdraw(&engine, &alice).unwrap_err();
    assert!(matches!(err, GovernanceError::NotRegistered { .. }));
}

#[test]
fn broker_skips_corrupt_audit_lines() {
    let tmp = tempdir().unwrap();
    db::initialize_civitas_db(tmp.path()).unwrap();
    let broker = DbBroker::new(tmp.path());
    let _: Result<(), CivitasError> = broker.with_tx("tester", "first", |_| Ok(()));
    let mut content = fs::read_to_string(broker.audit_log_path()).unwrap();
    content.push_str("{not json\n");
    fs::write(broker.audit_log_path(), content).unwrap();
    let _: Result<(), CivitasError> = broker.with_tx("tester", "second", |_| Ok(()));

    let ops: Vec<String> = broker
        .read_events(10)
        .unwrap()
        .into_iter()
        .map(|e| e.op)
        .collect();
    assert_eq!(ops, vec!["first", "second"]);
}

#[test]
fn broker_schema_names_audit_log() {
    let schema = broker::schema();
    assert_eq!(schema["name"], "broker");
    assert_eq!(schema["storage"][0], schemas::BROKER_EVENTS_NAME);
}

#[test]
fn schema_rejects_invalid_rows() {
    let tmp = tempdir().unwrap();
    let db_path = db::initialize_civitas_db(tmp.path()).unwrap();
    let conn = db::db_connect(&db_path).unwrap();

    conn.execute(
        "INSERT INTO candidates(candidate_id, name, votes) VALUES(?1, 'a', 0)",
        params![1i64],
    )
    .unwrap();
    let dup = conn.execute(
        "INSERT INTO candidates(candidate_id, name, votes) VALUES(?1, 'b', 0)",
        params![1i64],
    );
    assert!(dup.is_err(), "candidate ids must be unique");

    let negative = conn.execute("UPDATE candidates SET votes = -1", []);
    assert!(negative.is_err(), "vote counts cannot go negative");

    let second_slot = conn.execute(
        "INSERT INTO president(slot, name, candidate_id) VALUES(2, 'x', 1)",
        [],
    );
    assert!(second_slot.is_err(), "only one president slot exists");
}

#[test]
fn ledger_roster_order_and_totals() {
    let tmp = tempdir().unwrap();
    let db_path = db::initialize_civitas_db(tmp.path()).unwrap();
    let conn = db::db_connect(&db_path).unwrap();
    let ledger = Ledger::new(&conn);

    for (id, name) in [(30u64, "c"), (10, "a"), (20, "b")] {
        ledger.insert_candidate(MemberId(id), name).unwrap();
    }
    let order: Vec<u64> = ledger
        .candidates()
        .unwrap()
        .into_iter()
        .map(|c| c.candidate_id.0)
        .collect();
    assert_eq!(order, vec![30, 10, 20]);

    assert!(ledger.adjust_votes(MemberId(20), 2).unwrap());
    assert!(ledger.adjust_votes(MemberId(10), 1).unwrap());
    assert!(!ledger.adjust_votes(MemberId(99), 1).unwrap());
    assert_eq!(ledger.vote_total().unwrap(), 3);
    assert_eq!(
        ledger.leading_candidate().unwrap().unwrap().candidate_id,
        MemberId(20)
    );

    assert_eq!(ledger.reset_votes().unwrap(), 2);
    assert_eq!(ledger.vote_total().unwrap(), 0);
    // All tied at zero: registration order decides.
    assert_eq!(
        ledger.leading_candidate().unwrap().unwrap().candidate_id,
        MemberId(30)
    );
}

#[test]
fn config_loads_from_store_root() {
    let tmp = tempdir().unwrap();
    assert_eq!(config::load_config(tmp.path()).unwrap(), CivitasConfig::default());

    fs::write(
        tmp.path().join(schemas::CONFIG_FILE_NAME),
        "supervisors = [1, 2]\nrevolt_success_probability = 0.25\n",
    )
    .unwrap();
    let loaded = config::load_config(tmp.path()).unwrap();
    assert_eq!(loaded.supervisors, vec![MemberId(1), MemberId(2)]);
    assert_eq!(loaded.revolt_success_probability, 0.25);

    let engine = Engine::open(tmp.path()).unwrap();
    assert_eq!(engine.revolt_success_probability(), 0.25);
    assert!(engine.is_supervisor(
        &Caller::new(2, "mod"),
        civitas::core::gate::Action::OpenPolls
    ));
}

#[test]
fn config_with_unknown_keys_is_refused() {
    let tmp = tempdir().unwrap();
    fs::write(
        tmp.path().join(schemas::CONFIG_FILE_NAME),
        "supervisor = [1]\n",
    )
    .unwrap();
    let err = Engine::open(tmp.path()).err().unwrap();
    assert!(matches!(err, CivitasError::ConfigError(_)));
}
