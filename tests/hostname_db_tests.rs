//! Integration tests for HostnameDb matching behavior

use std::collections::HashSet;
use std::sync::Arc;

use ext_hostname_db::{
    HostDbError, HostnameDb, HostnameDbOptions, ManualScheduler, RetrievalModifiers,
};

const ALL_MODIFIERS: [RetrievalModifiers; 4] = [
    RetrievalModifiers::All,
    RetrievalModifiers::SpecificOnly,
    RetrievalModifiers::GenericOnly,
    RetrievalModifiers::RegexOnly,
];

fn retrieve(db: &HostnameDb, hostname: &str, n: usize, modifiers: RetrievalModifiers) -> Vec<Vec<String>> {
    let mut out: Vec<Vec<String>> = vec![Vec::new(); n];
    db.retrieve(hostname, &mut out, modifiers).unwrap();
    out
}

fn flat(db: &HostnameDb, hostname: &str, modifiers: RetrievalModifiers) -> Vec<String> {
    retrieve(db, hostname, 1, modifiers).remove(0)
}

#[test]
fn test_suffix_walk_specific_entry() {
    let mut db = HostnameDb::new(0);
    db.store("example.com", 0, "##.specific");

    assert_eq!(
        flat(&db, "a.b.example.com", RetrievalModifiers::All),
        vec!["##.specific"]
    );
    assert_eq!(
        flat(&db, "a.b.example.com", RetrievalModifiers::SpecificOnly),
        vec!["##.specific"]
    );
    assert!(flat(&db, "a.b.example.com", RetrievalModifiers::GenericOnly).is_empty());
}

#[test]
fn test_suffix_walk_generic_entry() {
    let mut db = HostnameDb::new(0);
    db.store("", 0, "##.generic");

    assert_eq!(
        flat(&db, "a.b.example.com", RetrievalModifiers::All),
        vec!["##.generic"]
    );
    assert_eq!(
        flat(&db, "a.b.example.com", RetrievalModifiers::GenericOnly),
        vec!["##.generic"]
    );
    assert!(flat(&db, "a.b.example.com", RetrievalModifiers::SpecificOnly).is_empty());
}

#[test]
fn test_suffix_walk_is_label_aligned() {
    let mut db = HostnameDb::new(0);
    db.store("example.com", 0, "##.x");

    // "notexample.com" does not end with the label sequence "example.com"
    assert!(flat(&db, "notexample.com", RetrievalModifiers::All).is_empty());
    assert!(flat(&db, "example.co", RetrievalModifiers::All).is_empty());
    assert_eq!(flat(&db, "example.com", RetrievalModifiers::All), vec!["##.x"]);
}

#[test]
fn test_walk_order_is_most_specific_first() {
    let mut db = HostnameDb::new(0);
    db.store("", 0, "generic");
    db.store("com", 0, "tld");
    db.store("example.com", 0, "domain");
    db.store("www.example.com", 0, "host");

    assert_eq!(
        flat(&db, "www.example.com", RetrievalModifiers::All),
        vec!["host", "domain", "tld", "generic"]
    );
}

#[test]
fn test_category_routing() {
    let mut db = HostnameDb::new(1);
    db.store("example.com", 0, "##.hide");
    db.store("example.com", 1, "#@#.hide");

    let out = retrieve(&db, "example.com", 2, RetrievalModifiers::All);
    assert_eq!(out[0], vec!["##.hide"]);
    assert_eq!(out[1], vec!["#@#.hide"]);
}

#[test]
fn test_category_routing_uses_low_bits_only() {
    let mut db = HostnameDb::new(3);
    db.store("example.com", 0b101, "five");
    db.store("example.com", 0b010, "two");

    // Two buckets: only bit 0 selects
    let out = retrieve(&db, "example.com", 2, RetrievalModifiers::All);
    assert_eq!(out[0], vec!["two"]);
    assert_eq!(out[1], vec!["five"]);

    // Eight buckets: full category
    let out = retrieve(&db, "example.com", 8, RetrievalModifiers::All);
    assert_eq!(out[5], vec!["five"]);
    assert_eq!(out[2], vec!["two"]);
}

#[test]
fn test_insertion_order_preserved() {
    let mut db = HostnameDb::new(0);
    db.store("example.com", 0, "v1");
    db.store("other.com", 0, "unrelated");
    db.store("example.com", 0, "v2");
    db.store("example.com", 0, "v3");

    assert_eq!(
        flat(&db, "example.com", RetrievalModifiers::SpecificOnly),
        vec!["v1", "v2", "v3"]
    );
}

#[test]
fn test_interning_idempotence() {
    let mut db = HostnameDb::new(0);
    db.store("a.com", 0, "##.shared");
    let before = db.string_count();
    db.store("b.com", 0, "##.shared");
    assert!(db.string_count() <= before + 1);
    assert_eq!(db.string_count(), 1);

    let mut a: Vec<Vec<Arc<str>>> = vec![Vec::new()];
    let mut b: Vec<Vec<Arc<str>>> = vec![Vec::new()];
    db.retrieve("a.com", &mut a, RetrievalModifiers::SpecificOnly).unwrap();
    db.retrieve("b.com", &mut b, RetrievalModifiers::SpecificOnly).unwrap();
    assert!(Arc::ptr_eq(&a[0][0], &b[0][0]));
}

#[test]
fn test_regex_fallback() {
    let mut db = HostnameDb::new(0);
    db.store("/^ads\\./", 0, "##.regex");

    assert_eq!(flat(&db, "ads.example.com", RetrievalModifiers::All), vec!["##.regex"]);
    assert_eq!(
        flat(&db, "ads.example.com", RetrievalModifiers::RegexOnly),
        vec!["##.regex"]
    );
    assert!(flat(&db, "ads.example.com", RetrievalModifiers::SpecificOnly).is_empty());
    assert!(flat(&db, "ads.example.com", RetrievalModifiers::GenericOnly).is_empty());
    assert!(flat(&db, "www.ads.example.com", RetrievalModifiers::All).is_empty());
}

#[test]
fn test_regex_tests_full_hostname() {
    let mut db = HostnameDb::new(0);
    // Anchored on both ends: would never match a stripped suffix alone
    db.store("/^www\\.example\\.com$/", 0, "##.full");
    assert_eq!(flat(&db, "www.example.com", RetrievalModifiers::All), vec!["##.full"]);
}

#[test]
fn test_regex_and_hostname_namespaces_are_separate() {
    let mut db = HostnameDb::new(0);
    db.store("/example/", 0, "##.regex");
    db.store("example", 0, "##.host");

    assert_eq!(db.regex_key_count(), 1);
    assert_eq!(db.hostname_key_count(), 1);
    assert_eq!(
        flat(&db, "example", RetrievalModifiers::SpecificOnly),
        vec!["##.host"]
    );
    assert_eq!(
        flat(&db, "example", RetrievalModifiers::All),
        vec!["##.host", "##.regex"]
    );
}

#[test]
fn test_regex_keys_scanned_in_insertion_order() {
    let mut db = HostnameDb::new(0);
    db.store("/z/", 0, "first");
    db.store("/a/", 0, "second");
    db.store("/z/", 0, "third");

    assert_eq!(
        flat(&db, "za.com", RetrievalModifiers::All),
        vec!["first", "third", "second"]
    );
}

#[test]
fn test_invalid_pattern_reported_and_others_still_match() {
    let mut db = HostnameDb::new(0);
    db.store("/(unclosed/", 0, "##.broken");
    db.store("/^ads\\./", 0, "##.ok");
    db.store("example.com", 0, "##.host");

    // Retrievals that skip the regex scan never compile or report it
    let mut out: Vec<Vec<String>> = vec![Vec::new()];
    assert!(db
        .retrieve("ads.example.com", &mut out, RetrievalModifiers::SpecificOnly)
        .is_ok());

    let mut out: Vec<Vec<String>> = vec![Vec::new()];
    let err = db
        .retrieve("ads.example.com", &mut out, RetrievalModifiers::All)
        .unwrap_err();
    match err {
        HostDbError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "(unclosed"),
        other => panic!("expected InvalidPattern, got {:?}", other),
    }
    assert_eq!(out[0], vec!["##.host", "##.ok"]);

    // Reported once: later scans skip the broken key and succeed
    for modifiers in [RetrievalModifiers::All, RetrievalModifiers::RegexOnly] {
        let mut out: Vec<Vec<String>> = vec![Vec::new()];
        db.retrieve("ads.example.com", &mut out, modifiers).unwrap();
        assert_eq!(out[0], vec!["##.host", "##.ok"]);
    }
}

#[test]
fn test_set_buckets_dedup_across_levels() {
    let mut db = HostnameDb::new(0);
    db.store("example.com", 0, "##.ad");
    db.store("", 0, "##.ad");

    let mut out: Vec<HashSet<String>> = vec![HashSet::new()];
    db.retrieve("www.example.com", &mut out, RetrievalModifiers::All)
        .unwrap();
    assert_eq!(out[0].len(), 1);
}

#[test]
fn test_reclamation_safety() {
    let scheduler = Arc::new(ManualScheduler::new());
    let mut db = HostnameDb::with_scheduler(HostnameDbOptions::new(1), scheduler.clone());

    db.store("a.com", 0, "##.same");
    db.reclaim(true);
    db.store("a.com", 1, "##.same");
    db.reclaim(false);
    scheduler.run_idle();
    db.store("b.com", 0, "##.same");

    // Duplicates are allowed, losses are not
    assert!(db.string_count() >= 1 && db.string_count() <= 3);
    let out = retrieve(&db, "a.com", 2, RetrievalModifiers::SpecificOnly);
    assert_eq!(out[0], vec!["##.same"]);
    assert_eq!(out[1], vec!["##.same"]);
    let out = retrieve(&db, "b.com", 2, RetrievalModifiers::SpecificOnly);
    assert_eq!(out[0], vec!["##.same"]);
    db.verify().unwrap();
}

#[test]
fn test_chains_always_terminate() {
    let mut db = HostnameDb::new(2);
    let hosts = ["", "a.com", "b.a.com", "c.org", "/^x/"];
    for i in 0..500u32 {
        let host = hosts[(i as usize * 7) % hosts.len()];
        db.store(host, i % 4, &format!("##.s{}", i % 37));
    }
    assert_eq!(db.len(), 500);
    assert_eq!(db.slot_count(), 500);

    // verify() walks every chain and rejects cycles or stray links
    db.verify().unwrap();

    let mut total = 0;
    for modifiers in ALL_MODIFIERS {
        let out = retrieve(&db, "x.b.a.com", 4, modifiers);
        total += out.iter().map(Vec::len).sum::<usize>();
    }
    assert!(total > 0);
}

#[test]
fn test_empty_db_retrieves_nothing() {
    let db = HostnameDb::default();
    for modifiers in ALL_MODIFIERS {
        assert!(flat(&db, "example.com", modifiers).is_empty());
    }
}
