use std::path::{Path, PathBuf};

use model2data_core::{
    ColumnRef, Error, Reference, build_fk_lookup, classify_references, order_tables,
    parse_schema_file,
};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn parses_hackernews_tables() {
    let parsed = parse_schema_file(&fixture("hackernews.dbml")).expect("parse fixture");

    assert_eq!(
        parsed.catalog.table_names(),
        vec!["stories", "stories__kids", "dlt_loads"]
    );
    for (name, table) in parsed.catalog.entries() {
        assert_eq!(name, table.name);
        assert!(!table.columns.is_empty());
        assert!(table.columns.iter().all(|column| !column.name.is_empty()));
    }

    let stories = parsed.catalog.table("stories").expect("stories");
    let names: Vec<&str> = stories.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "id",
            "by",
            "score",
            "time",
            "title",
            "type",
            "url",
            "descendants",
            "_dlt_load_id",
            "_dlt_id",
        ]
    );
    assert!(stories.columns[0].settings.is_primary_key());
    assert!(stories.column("_dlt_id").expect("_dlt_id").settings.is_unique());
}

#[test]
fn note_and_index_blocks_do_not_leak() {
    let parsed = parse_schema_file(&fixture("hackernews.dbml")).expect("parse fixture");

    assert!(parsed.catalog.table("fake_table").is_none());
    let stories = parsed.catalog.table("stories").expect("stories");
    assert!(stories.column("kids").is_none());
    assert!(stories.column("(id,").is_none());
    assert!(
        parsed
            .references
            .iter()
            .all(|reference| reference.source_table != "ghost")
    );
}

#[test]
fn settings_are_lowercase() {
    let parsed = parse_schema_file(&fixture("hackernews.dbml")).expect("parse fixture");
    for table in &parsed.catalog.tables {
        for column in &table.columns {
            for token in column.settings.tokens() {
                assert_eq!(token, token.to_lowercase());
            }
        }
    }
}

#[test]
fn references_point_from_child_to_parent() {
    let parsed = parse_schema_file(&fixture("hackernews.dbml")).expect("parse fixture");

    assert_eq!(
        parsed.references,
        vec![
            Reference::new("stories__kids", "_dlt_parent_id", "stories", "_dlt_id"),
            Reference::new("stories__kids", "story_id", "stories", "id"),
        ]
    );
}

#[test]
fn fixture_flows_through_classification_and_ordering() {
    let parsed = parse_schema_file(&fixture("hackernews.dbml")).expect("parse fixture");
    let classified = classify_references(&parsed.catalog, &parsed.references);

    assert_eq!(classified.fk_refs.len(), 1);
    assert_eq!(classified.attribute_refs.len(), 1);
    assert!(classified.unresolved.is_empty());

    let lookup = build_fk_lookup(&classified.fk_refs);
    assert_eq!(
        lookup.get("stories__kids", "story_id"),
        Some(&ColumnRef::new("stories", "id"))
    );

    let order = order_tables(&parsed.catalog, &lookup);
    assert_eq!(order.order, vec!["dlt_loads", "stories", "stories__kids"]);
    assert!(order.removed_edges.is_empty());
}

#[test]
fn missing_file_is_not_found() {
    let path = fixture("does_not_exist.dbml");
    match parse_schema_file(&path) {
        Err(Error::NotFound(missing)) => assert_eq!(missing, path),
        other => panic!("expected NotFound, got {other:?}"),
    }
}
