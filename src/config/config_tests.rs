use super::*;

#[test]
fn defaults_match_ingest_contract() {
    let g = GlobalIngestConfig::default();
    assert_eq!(g.workers, 8);
    assert_eq!(g.queue_capacity, 900);
    assert_eq!(g.chunk_size, 1_048_576);
    assert_eq!(g.max_attempts, 4);
    assert_eq!(g.default_local_ip, "127.0.0.1");
}

#[test]
fn precedence_global_then_run() {
    let global = GlobalIngestConfig::default();
    let opts = IngestOptions {
        include_pattern: Some("ProjX".into()),
        local_ip: Some("10.0.0.5".into()),
        chunk_size: Some(1),
        ..Default::default()
    };
    let eff = EffectiveIngestConfig::from_layers(&global, &opts);
    assert_eq!(eff.workers, 8);
    assert_eq!(eff.chunk_size, 1);
    assert_eq!(eff.local_ip, "10.0.0.5");
    assert_eq!(eff.include_pattern.as_deref(), Some("projx"));
    assert!(eff.compress);
    assert!(!eff.is_reference);
}

#[test]
fn zero_values_are_clamped() {
    let mut global = GlobalIngestConfig::default();
    global.max_attempts = 0;
    let opts = IngestOptions { workers: Some(0), queue_capacity: Some(0), local_ip: Some(String::new()), ..Default::default() };
    let eff = EffectiveIngestConfig::from_layers(&global, &opts);
    assert_eq!((eff.workers, eff.queue_capacity, eff.max_attempts), (1, 1, 1));
    assert_eq!(eff.local_ip, "127.0.0.1");
}

#[test]
fn skip_suffixes() {
    let eff = EffectiveIngestConfig::from_layers(&GlobalIngestConfig::default(), &IngestOptions::default());
    assert!(eff.is_skipped("mod.pyc"));
    assert!(!eff.is_skipped("mod.py"));
}

#[test]
fn env_overrides_and_bad_values() {
    // Only this test touches these variables.
    std::env::set_var("CANOPY_INGEST_WORKERS", "3");
    std::env::set_var("CANOPY_INGEST_QUEUE_CAPACITY", "lots");
    let g = GlobalIngestConfig::from_env();
    std::env::remove_var("CANOPY_INGEST_WORKERS");
    std::env::remove_var("CANOPY_INGEST_QUEUE_CAPACITY");
    assert_eq!(g.workers, 3);
    assert_eq!(g.queue_capacity, 900);
}

#[test]
fn catalog_defaults_seed_authenticated_read() {
    let c = CatalogConfig::default();
    assert_eq!(c.root_acl.get(AUTHENTICATED), Some(&AccessMask::Read));
    assert_eq!(c.index_fields.len(), 2);
}
