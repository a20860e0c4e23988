//! Unit tests for strata-store

use strata_core::{
    ClusterConfig, ReferenceEdge, Resolution, ScopeFilter, Symbol, SymbolId, SymbolKind, plan,
};

use crate::*;

fn symbol(id: i64, name: &str, path: &str, start: u32, kind: Option<SymbolKind>) -> Symbol {
    let mut s = Symbol::new(id, name, path, start);
    s.kind = kind;
    s
}

fn seeded() -> Store {
    let store = Store::open_in_memory().unwrap();
    store
        .insert_symbols(&[
            symbol(1, "main", "src/main.c", 10, Some(SymbolKind::Function)),
            symbol(2, "parse", "src/parse.c", 4, Some(SymbolKind::Function)),
            symbol(3, "token", "src/parse.c", 20, Some(SymbolKind::Struct)),
            symbol(4, "MAX", "src/parse.h", 2, None),
        ])
        .unwrap();
    store
        .insert_references(&[
            ReferenceEdge::new(1, 2, 14),
            ReferenceEdge::new(1, 3, 12),
            ReferenceEdge::new(2, 3, 8),
            ReferenceEdge::new(2, 4, 6),
        ])
        .unwrap();
    store
}

#[test]
fn symbols_round_trip_through_store() {
    let store = seeded();
    let symbols = store.load_symbols().unwrap();
    assert_eq!(symbols.len(), 4);
    assert_eq!(symbols[2].kind, Some(SymbolKind::Struct));
    assert_eq!(symbols[3].kind, None);
    assert_eq!(store.get_symbol(SymbolId(2)).unwrap().name, "parse");
    assert_eq!(store.find_symbols("token").unwrap()[0].id, SymbolId(3));
}

#[test]
fn missing_symbol_is_not_found() {
    let store = seeded();
    assert!(matches!(store.get_symbol(SymbolId(99)), Err(StoreError::NotFound(_))));
}

#[test]
fn duplicate_id_rolls_back_whole_batch() {
    let store = seeded();
    let result = store.insert_symbols(&[
        symbol(5, "fresh", "src/x.c", 1, None),
        symbol(1, "clash", "src/x.c", 3, None),
    ]);
    assert!(result.is_err());
    assert_eq!(store.load_symbols().unwrap().len(), 4);
    assert!(store.find_symbols("fresh").unwrap().is_empty());
}

#[test]
fn failed_replace_import_keeps_existing_rows() {
    let store = seeded();
    let result = store.import(
        &[
            symbol(7, "first", "src/x.c", 1, None),
            symbol(7, "second", "src/x.c", 5, None),
        ],
        &[ReferenceEdge::new(7, 7, 2)],
        true,
    );
    assert!(result.is_err());

    let stats = store.stats().unwrap();
    assert_eq!(stats.symbols, 4);
    assert_eq!(stats.references, 4);
    assert!(store.find_symbols("first").unwrap().is_empty());
}

#[test]
fn import_replaces_or_appends() {
    let store = seeded();
    store
        .import(&[symbol(8, "extra", "src/y.c", 1, None)], &[ReferenceEdge::new(8, 1, 3)], false)
        .unwrap();
    let stats = store.stats().unwrap();
    assert_eq!((stats.symbols, stats.references), (5, 5));

    store
        .import(&[symbol(9, "only", "src/z.c", 1, None)], &[], true)
        .unwrap();
    let symbols = store.load_symbols().unwrap();
    assert_eq!(symbols.len(), 1);
    assert_eq!(symbols[0].name, "only");
    assert_eq!(store.stats().unwrap().references, 0);
}

#[test]
fn symbol_at_picks_covering_span() {
    let store = seeded();
    // Both parse.c records are open, so the lower id wins.
    assert_eq!(store.symbol_at("src/parse.c", 20).unwrap().unwrap().id, SymbolId(2));

    let mut parse = store.get_symbol(SymbolId(2)).unwrap();
    parse.end_line = 19;
    store.replace_symbols_bounds(&[parse], &[]).unwrap();
    assert_eq!(store.symbol_at("src/parse.c", 19).unwrap().unwrap().id, SymbolId(2));
    assert_eq!(store.symbol_at("src/parse.c", 20).unwrap().unwrap().id, SymbolId(3));
    assert!(store.symbol_at("src/parse.c", 3).unwrap().is_none());
    assert!(store.symbol_at("src/other.c", 20).unwrap().is_none());
}

#[test]
fn search_matches_like_patterns() {
    let store = seeded();
    assert_eq!(store.search("pa%").unwrap(), vec!["parse".to_string()]);
    assert_eq!(
        store.search("%a%").unwrap(),
        vec!["MAX".to_string(), "main".to_string(), "parse".to_string()]
    );
    assert!(store.search("zz%").unwrap().is_empty());
}

#[test]
fn resolutions_overwrite_span_and_kind() {
    let store = seeded();
    let n = store
        .apply_resolutions(&[Resolution {
            id: SymbolId(4),
            start_line: 1,
            end_line: 3,
            kind: SymbolKind::ConstantMacro,
        }])
        .unwrap();
    assert_eq!(n, 1);
    let max = store.get_symbol(SymbolId(4)).unwrap();
    assert_eq!((max.start_line, max.end_line), (1, 3));
    assert_eq!(max.kind, Some(SymbolKind::ConstantMacro));
}

#[test]
fn bounds_update_and_delete() {
    let store = seeded();
    let mut parse = store.get_symbol(SymbolId(2)).unwrap();
    parse.end_line = 19;
    store.replace_symbols_bounds(&[parse], &[SymbolId(4)]).unwrap();
    assert_eq!(store.get_symbol(SymbolId(2)).unwrap().end_line, 19);
    assert_eq!(store.load_symbols().unwrap().len(), 3);
}

#[test]
fn reference_listings_are_ordered() {
    let store = seeded();
    let from: Vec<(i64, u32)> = store
        .references_from(SymbolId(1))
        .unwrap()
        .iter()
        .map(|r| (r.symbol_id.0, r.line))
        .collect();
    assert_eq!(from, vec![(3, 12), (2, 14)]);

    let to = store.references_to(SymbolId(3)).unwrap();
    let files: Vec<&str> = to.iter().map(|r| r.file_path.as_str()).collect();
    assert_eq!(files, vec!["src/main.c", "src/parse.c"]);
    assert_eq!(to[1].name, "parse");
}

#[test]
fn plan_replaces_previous_results() {
    let store = seeded();
    let symbols = store.load_symbols().unwrap();
    let edges = store.load_references().unwrap();
    let first = plan(&symbols, &edges, &ScopeFilter::everything(), &ClusterConfig::default());
    store.replace_plan(&first).unwrap();
    assert_eq!(store.stats().unwrap().assigned, 4);

    let narrow = plan(&symbols, &edges, &ScopeFilter::default(), &ClusterConfig::default());
    store.replace_plan(&narrow).unwrap();

    let stats = store.stats().unwrap();
    assert_eq!(stats.assigned, 3);
    assert_eq!(stats.clusters, narrow.clusters.len());
    assert!(store.assignment(SymbolId(4)).unwrap().is_none());

    let parse = store.assignment(SymbolId(2)).unwrap().unwrap();
    assert_eq!(parse.layer, 1);
    assert_eq!(store.load_batches().unwrap(), narrow.batches);
}

#[test]
fn stats_count_kinds() {
    let store = seeded();
    let stats = store.stats().unwrap();
    assert_eq!(stats.symbols, 4);
    assert_eq!(stats.unclassified, 1);
    assert_eq!(stats.references, 4);
    assert_eq!(
        stats.by_kind,
        vec![("function".to_string(), 2), ("struct".to_string(), 1)]
    );
}

#[test]
fn on_disk_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("strata.db");
    {
        let store = Store::open(&path).unwrap();
        store.insert_symbols(&[symbol(1, "a", "a.c", 1, None)]).unwrap();
    }
    let store = Store::open(&path).unwrap();
    assert_eq!(store.load_symbols().unwrap().len(), 1);
    store.clear().unwrap();
    assert_eq!(store.stats().unwrap().symbols, 0);
}
