use predictive_ingestion::{DataFileMerger, DataPaths, StoreError, Stores};
use predictive_schemas::{DataKind, MergeMode};
use std::fs;
use tempfile::TempDir;

/// Merging a shared historical file keeps our data and adds theirs
#[test]
fn test_merge_historical_is_set_union() {
    let temp_dir = TempDir::new().unwrap();
    let paths = DataPaths::new(temp_dir.path().join("data"));
    fs::create_dir_all(paths.dir()).unwrap();
    fs::write(
        paths.path(DataKind::HistoricalData),
        "// DO NOT REMOVE THIS LINE [datatype=\"historical-data\"]\nowl, forest\n",
    )
    .unwrap();

    let mut stores = Stores::open(paths.dir()).unwrap();
    let merger = DataFileMerger::new().unwrap();

    let shared = temp_dir.path().join("shared.txt");
    fs::write(
        &shared,
        "// DO NOT REMOVE THIS LINE [datatype=\"historical-data\"]\n// from a colleague\nforest, owl\nbeach, sea\n",
    )
    .unwrap();

    let report = merger.import(&mut stores, &shared, MergeMode::Merge).unwrap();
    assert_eq!(report.kind, DataKind::HistoricalData);
    assert_eq!(report.added, 1);
    assert_eq!(
        report.status_message(),
        "Merged historical-data files. Reloaded historical-data."
    );

    assert_eq!(stores.tagsets().len(), 2);
    let written = fs::read_to_string(paths.path(DataKind::HistoricalData)).unwrap();
    assert!(!written.contains("from a colleague"));
}

/// Replacing a store discards what was there before
#[test]
fn test_replace_is_destructive() {
    let temp_dir = TempDir::new().unwrap();
    let mut stores = Stores::open(temp_dir.path()).unwrap();
    assert!(stores.ledger().has_entries("lemon"));

    let incoming = temp_dir.path().join("team-learn.xml");
    fs::write(
        &incoming,
        r#"<?xml version="1.0" encoding="utf-8"?>
<root datatype="learn-data" comment="Team ledger">
  <item tag="owl" suggest="night" score="4" />
</root>
"#,
    )
    .unwrap();

    let merger = DataFileMerger::new().unwrap();
    let report = merger
        .import(&mut stores, &incoming, MergeMode::Replace)
        .unwrap();
    assert_eq!(report.mode, MergeMode::Replace);

    assert!(!stores.ledger().has_entries("lemon"));
    assert_eq!(stores.ledger().len(), 1);
    assert_eq!(stores.ledger().comment(), Some("Team ledger"));
}

/// Merging learn data adds unseen pairs at the minimum score
#[test]
fn test_merge_learn_data() {
    let temp_dir = TempDir::new().unwrap();
    let mut stores = Stores::open(temp_dir.path()).unwrap();

    let incoming = temp_dir.path().join("other.xml");
    fs::write(
        &incoming,
        r#"<root datatype="learn-data" comment="Other">
  <item tag="lemon" suggest="citrus" score="30" />
  <item tag="lemon" suggest="yellow" score="30" />
</root>"#,
    )
    .unwrap();

    let merger = DataFileMerger::new().unwrap();
    let report = merger.import(&mut stores, &incoming, MergeMode::Merge).unwrap();
    assert_eq!(report.added, 1);

    let lemon = stores.ledger().query("lemon");
    let scores: Vec<(&str, u32)> = lemon.iter().map(|s| (s.suggest.as_str(), s.score)).collect();
    assert_eq!(scores, vec![("citrus", 1), ("yellow", 1)]);
    assert_eq!(stores.ledger().comment(), Some("Default learn data file"));
}

/// Config files are always replaced, even when a merge was requested
#[test]
fn test_config_merge_becomes_replace() {
    let temp_dir = TempDir::new().unwrap();
    let mut stores = Stores::open(temp_dir.path()).unwrap();
    assert_eq!(stores.config().max_tags, 10);

    let incoming = temp_dir.path().join("config.xml");
    fs::write(
        &incoming,
        r#"<root datatype="config"><tags><max>40</max></tags></root>"#,
    )
    .unwrap();

    let merger = DataFileMerger::new().unwrap();
    let report = merger.import(&mut stores, &incoming, MergeMode::Merge).unwrap();
    assert_eq!(report.mode, MergeMode::Replace);
    assert_eq!(
        report.status_message(),
        "Replaced config file. Reloaded config."
    );
    assert_eq!(stores.config().max_tags, 40);
}

/// Files without a matching marker and extension are rejected untouched
#[test]
fn test_unrecognized_file_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let mut stores = Stores::open(temp_dir.path()).unwrap();
    let before = stores.tagsets().len();

    let incoming = temp_dir.path().join("notes.xml");
    fs::write(&incoming, "// datatype=\"historical-data\"\nsea, beach\n").unwrap();

    let merger = DataFileMerger::new().unwrap();
    let result = merger.import(&mut stores, &incoming, MergeMode::Merge);
    assert!(matches!(result, Err(StoreError::Unrecognized { .. })));
    assert_eq!(stores.tagsets().len(), before);
}
