//! Subcommand implementations

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use serde::de::DeserializeOwned;
use strata_core::{
    ReferenceEdge, StrataConfig, Symbol, SymbolId, assign_nominal_ends, close_open_ends, export,
    prune_duplicates,
};
use strata_indexer::{line_count, render_source, resolve_symbols};
use strata_store::Store;

/// Everything a subcommand needs: source root, config and an open store.
pub struct Context {
    pub root: PathBuf,
    pub config: StrataConfig,
    pub store: Store,
}

impl Context {
    pub fn load(root: PathBuf, config: Option<PathBuf>, db: Option<PathBuf>) -> Result<Self> {
        let config = StrataConfig::discover(config.as_deref(), Path::new("."))
            .context("Failed to load configuration")?;
        let db = db.unwrap_or_else(|| config.store.path.clone());
        let store = Store::open(&db).with_context(|| format!("Failed to open store {}", db.display()))?;
        tracing::debug!("Source root: {}, store: {}", root.display(), db.display());
        Ok(Context { root, config, store })
    }
}

fn read_json_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = std::fs::File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut rows = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let row = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: malformed row", path.display(), idx + 1))?;
        rows.push(row);
    }
    Ok(rows)
}

pub fn import(ctx: &Context, symbols: &Path, references: Option<&Path>, append: bool) -> Result<()> {
    let symbols: Vec<Symbol> = read_json_lines(symbols)?;
    let edges: Vec<ReferenceEdge> = match references {
        Some(path) => read_json_lines(path)?,
        None => Vec::new(),
    };

    ctx.store
        .import(&symbols, &edges, !append)
        .context("Failed to store imported rows, store left unchanged")?;
    tracing::info!("Imported {} symbols, {} references", symbols.len(), edges.len());
    Ok(())
}

pub fn bounds(ctx: &Context) -> Result<()> {
    let mut symbols = ctx.store.load_symbols()?;

    let report = assign_nominal_ends(&mut symbols);
    let dedup = prune_duplicates(&mut symbols);
    let closed = close_open_ends(&mut symbols, |path| line_count(&ctx.root, path));

    let mut removed = dedup.removed;
    removed.extend(report.merged.iter().copied());
    ctx.store.replace_symbols_bounds(&symbols, &removed)?;

    tracing::info!(
        "Set {} nominal ends, closed {} at end of file, merged {}, pruned {} duplicates ({} unhandled)",
        report.updated,
        closed,
        report.merged.len(),
        removed.len() - report.merged.len(),
        dedup.unhandled.len()
    );
    Ok(())
}

pub fn resolve(ctx: &Context) -> Result<()> {
    let symbols = ctx.store.load_symbols()?;
    let report = resolve_symbols(&ctx.root, &symbols);
    ctx.store
        .apply_resolutions(&report.resolved)
        .context("Failed to store resolved spans")?;

    println!(
        "resolved {}, missing file {}, out of range {}",
        report.resolved.len(),
        report.skipped_missing,
        report.skipped_out_of_range
    );
    Ok(())
}

pub fn plan(
    ctx: &Context,
    output: Option<&Path>,
    chunk_size: Option<usize>,
    exclude_top: Option<usize>,
) -> Result<()> {
    let mut cluster_config = ctx.config.cluster;
    if let Some(size) = chunk_size {
        cluster_config.chunk_size = size;
    }
    cluster_config.validate()?;

    let mut scope = ctx.config.scope.clone();
    if let Some(n) = exclude_top {
        scope.exclude_top_referenced = n;
    }

    let symbols = ctx.store.load_symbols()?;
    let edges = ctx.store.load_references()?;
    let plan = strata_core::plan(&symbols, &edges, &scope, &cluster_config);
    ctx.store.replace_plan(&plan).context("Failed to store plan")?;

    let report = &plan.report;
    tracing::info!(
        "Planned {} symbols into {} batches over {} layers ({} in overflow, {} cyclic components, {} edges dropped)",
        report.in_scope,
        report.cluster_count,
        report.layer_count,
        report.overflow_size,
        report.cyclic_components,
        report.dropped_edges
    );
    for hub in &report.excluded_hubs {
        tracing::debug!("Excluded hub symbol {}", hub);
    }

    let json = export::to_json(&plan.batches)?;
    match output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Wrote batches to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Split `path:line`, if the suffix is a line number.
fn file_line(key: &str) -> Option<(&str, u32)> {
    let (path, line) = key.rsplit_once(':')?;
    Some((path, line.parse().ok()?))
}

fn lookup(ctx: &Context, key: &str) -> Result<Symbol> {
    if let Ok(id) = key.parse::<i64>() {
        return Ok(ctx.store.get_symbol(SymbolId(id))?);
    }
    if let Some((path, line)) = file_line(key) {
        return ctx
            .store
            .symbol_at(path, line)?
            .with_context(|| format!("No symbol covers {path}:{line}"));
    }
    let mut found = ctx.store.find_symbols(key)?;
    match found.len() {
        0 => bail!("No symbol named {key}"),
        1 => Ok(found.remove(0)),
        n => {
            let ids: Vec<String> = found.iter().map(|s| s.id.to_string()).collect();
            bail!("{n} symbols named {key}, pick one by id: {}", ids.join(", "))
        }
    }
}

pub fn show(ctx: &Context, key: &str) -> Result<()> {
    if key.contains('%') {
        let names = ctx.store.search(key)?;
        if names.is_empty() {
            bail!("No symbol matches {key}");
        }
        for name in names {
            println!("{name}");
        }
        return Ok(());
    }
    let symbol = lookup(ctx, key)?;

    match render_source(&ctx.root, &symbol) {
        Ok(text) => print!("{text}"),
        Err(e) => println!("Source unavailable: {e:#}"),
    }

    let kind = symbol.kind.map_or("unclassified", |k| k.as_str());
    match ctx.store.assignment(symbol.id)? {
        Some(a) => println!("\n{} ({kind}) layer {} cluster {}", symbol.name, a.layer, a.cluster_id.0),
        None => println!("\n{} ({kind}) not planned", symbol.name),
    }

    println!("\nReferences:");
    for r in ctx.store.references_from(symbol.id)? {
        println!("  line {:>5}  {} ({})", r.line, r.name, r.file_path);
    }
    println!("\nReferenced by:");
    for r in ctx.store.references_to(symbol.id)? {
        println!("  {}:{}  {}", r.file_path, r.line, r.name);
    }
    Ok(())
}

pub fn stats(ctx: &Context) -> Result<()> {
    let stats = ctx.store.stats()?;
    println!("symbols:      {} ({} unclassified)", stats.symbols, stats.unclassified);
    for (kind, count) in &stats.by_kind {
        println!("  {kind:<15} {count}");
    }
    println!("references:   {}", stats.references);
    println!("planned:      {} symbols, {} layers, {} clusters", stats.assigned, stats.layers, stats.clusters);
    Ok(())
}
