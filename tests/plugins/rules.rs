use civitas::core::chance::FixedDice;
use civitas::core::config::CivitasConfig;
use civitas::core::engine::{Engine, GovernanceError};
use civitas::core::gate::Caller;
use civitas::core::ledger::MemberId;
use civitas::core::store::Store;
use civitas::plugins::election::{close_and_elect, open_polls, register_candidate};
use civitas::plugins::rules::{enact_rule, rules};
use civitas::plugins::tyranny::declare_tyranny;
use tempfile::tempdir;

const SUPERVISOR: u64 = 7;

fn engine_with_president(root: &std::path::Path) -> Engine {
    let config = CivitasConfig {
        supervisors: vec![MemberId(SUPERVISOR)],
        ..CivitasConfig::default()
    };
    let engine = Engine::new(Store::new(root), config)
        .unwrap()
        .with_dice(FixedDice(false));
    let supervisor = Caller::new(SUPERVISOR, "mod");
    register_candidate(&engine, &Caller::new(1, "prez"), None).unwrap();
    open_polls(&engine, &supervisor).unwrap();
    close_and_elect(&engine, &supervisor).unwrap();
    engine
}

#[test]
fn test_only_president_enacts_without_tyranny() {
    let tmp = tempdir().unwrap();
    let engine = engine_with_president(tmp.path());

    let err = enact_rule(&engine, &Caller::new(2, "citizen"), "no hats").unwrap_err();
    assert!(matches!(err, GovernanceError::Unauthorized { .. }));
    assert!(rules(&engine).unwrap().is_empty());

    let rule = enact_rule(&engine, &Caller::new(1, "prez"), "  no hats ").unwrap();
    assert_eq!(rule.text, "no hats");
    assert_eq!(rule.enacted_by, MemberId(1));
    assert!(!rule.under_tyranny);
    assert!(rule.enacted_at.ends_with('Z'));
}

#[test]
fn test_president_recognized_by_display_name() {
    let tmp = tempdir().unwrap();
    let engine = engine_with_president(tmp.path());
    // Adapter that only knows names passes a different id.
    enact_rule(&engine, &Caller::new(555, "prez"), "quiet hours").unwrap();
    assert_eq!(rules(&engine).unwrap().len(), 1);
}

#[test]
fn test_anyone_enacts_under_tyranny() {
    let tmp = tempdir().unwrap();
    let engine = engine_with_president(tmp.path());
    declare_tyranny(&engine, &Caller::new(1, "prez")).unwrap();

    let rule = enact_rule(&engine, &Caller::new(3, "rando"), "hats mandatory").unwrap();
    assert!(rule.under_tyranny);
}

#[test]
fn test_rules_are_append_only_in_order() {
    let tmp = tempdir().unwrap();
    let engine = engine_with_president(tmp.path());
    let prez = Caller::new(1, "prez");
    for text in ["one", "two", "three"] {
        enact_rule(&engine, &prez, text).unwrap();
    }
    let texts: Vec<String> = rules(&engine).unwrap().into_iter().map(|r| r.text).collect();
    assert_eq!(texts, vec!["one", "two", "three"]);
}

#[test]
fn test_rules_survive_an_election() {
    let tmp = tempdir().unwrap();
    let engine = engine_with_president(tmp.path());
    enact_rule(&engine, &Caller::new(1, "prez"), "keep me").unwrap();

    let supervisor = Caller::new(SUPERVISOR, "mod");
    register_candidate(&engine, &Caller::new(2, "next"), None).unwrap();
    open_polls(&engine, &supervisor).unwrap();
    close_and_elect(&engine, &supervisor).unwrap();

    assert_eq!(rules(&engine).unwrap().len(), 1);
}

#[test]
fn test_blank_rule_rejected() {
    let tmp = tempdir().unwrap();
    let engine = engine_with_president(tmp.path());
    let err = enact_rule(&engine, &Caller::new(1, "prez"), " \n ").unwrap_err();
    assert!(matches!(err, GovernanceError::InvalidArgument(_)));
}

#[test]
fn test_no_president_means_no_rules() {
    let tmp = tempdir().unwrap();
    let engine = Engine::open(tmp.path()).unwrap();
    let err = enact_rule(&engine, &Caller::new(1, "anyone"), "x").unwrap_err();
    assert!(matches!(err, GovernanceError::Unauthorized { .. }));
}
