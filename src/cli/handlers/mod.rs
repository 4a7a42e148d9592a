use std::io::Write;
use std::num::NonZeroUsize;
use std::path::Path;

use regex::Regex;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::source::{self, Source};
use crate::model::config::Config;
use crate::model::record::NodeRecord;
use crate::model::tree::{OutputKeys, TreeNode, write_forest_json};
use crate::ops::{check, hierarchy, query};

/// Resolved settings shared by every command
struct Context {
    config: Config,
    source: Source,
    json: bool,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = resolve_context(&cli)?;

    match cli.command {
        Commands::Tree(args) => cmd_tree(&ctx, args),
        Commands::Check => cmd_check(&ctx),
        Commands::Ls(args) => cmd_ls(&ctx, args),
        Commands::Path(args) => cmd_path(&ctx, args),
        Commands::Find(args) => cmd_find(&ctx, args),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Config file first, then command-line overrides. The source falls back to
/// the configured endpoint, then stdin.
fn resolve_context(cli: &Cli) -> Result<Context, Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let mut config = config_io::load_config(cli.config.as_deref().map(Path::new), &cwd)?;

    if let Some(policy) = cli.orphans {
        config.build.orphans = policy;
    }
    if cli.treeview {
        config.output = OutputKeys::treeview();
    }

    let source = match (&cli.source, &config.source.url) {
        (Some(s), _) => Source::parse(s),
        (None, Some(url)) => Source::Url(url.clone()),
        (None, None) => Source::Stdin,
    };
    tracing::debug!(source = %source, orphans = ?config.build.orphans, "resolved context");

    Ok(Context {
        config,
        source,
        json: cli.json,
    })
}

fn load_records(ctx: &Context) -> Result<Vec<NodeRecord>, source::SourceError> {
    source::load_records(&ctx.source, &ctx.config)
}

fn load_forest(ctx: &Context) -> Result<Vec<TreeNode>, Box<dyn std::error::Error>> {
    let records = load_records(ctx)?;
    let count = records.len();
    let forest = hierarchy::massage(records, ctx.config.build.orphans)?;
    tracing::debug!(records = count, roots = forest.len(), "built forest");
    Ok(forest)
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_tree(ctx: &Context, args: TreeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let forest = load_forest(ctx)?;

    if ctx.json && args.levels.is_some() {
        tracing::warn!("--levels only applies to text output");
    }

    if ctx.json {
        // Streamed, since a deep forest would overflow a recursive serializer.
        let mut out = std::io::BufWriter::new(std::io::stdout().lock());
        write_forest_json(&forest, &ctx.config.output, &mut out)?;
        writeln!(out)?;
        out.flush()?;
    } else if forest.is_empty() {
        println!("(no notebooks)");
    } else {
        print_lines(&format_tree(&forest, args.levels.map(NonZeroUsize::get)));
    }
    Ok(())
}

fn cmd_check(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let records = load_records(ctx)?;
    let result = check::check_records(&records);

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_lines(&format_check(&result));
        if result.valid {
            println!("✓ {} notebooks, collection is valid", records.len());
        }
    }

    if result.valid {
        Ok(())
    } else {
        Err(format!("collection has {} error(s)", result.errors.len()).into())
    }
}

fn cmd_ls(ctx: &Context, args: LsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let forest = load_forest(ctx)?;

    let entries = query::children_of(&forest, args.id.as_deref())
        .ok_or_else(|| format!("notebook not found: {}", args.id.as_deref().unwrap_or_default()))?;
    let (notebook, parent) = match args.id.as_deref().and_then(|id| query::path_to(&forest, id)) {
        Some(path) => (path.last().copied(), path.len().checked_sub(2).map(|i| path[i])),
        None => (None, None),
    };

    if ctx.json {
        let listing = ListingJson {
            notebook: notebook.map(node_summary),
            parent: parent.map(node_summary),
            notebooks: entries.iter().map(node_summary).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&listing)?);
    } else {
        print_lines(&format_listing(notebook, parent, entries));
    }
    Ok(())
}

fn cmd_path(ctx: &Context, args: PathArgs) -> Result<(), Box<dyn std::error::Error>> {
    let forest = load_forest(ctx)?;
    let path = query::path_to(&forest, &args.id)
        .ok_or_else(|| format!("notebook not found: {}", args.id))?;

    if ctx.json {
        let crumbs: Vec<NodeSummaryJson> = path.iter().map(|n| node_summary(n)).collect();
        println!("{}", serde_json::to_string_pretty(&crumbs)?);
    } else {
        println!("{}", format_breadcrumb(&path));
    }
    Ok(())
}

fn cmd_find(ctx: &Context, args: FindArgs) -> Result<(), Box<dyn std::error::Error>> {
    let re = Regex::new(&args.pattern)
        .map_err(|e| format!("invalid regex '{}': {}", args.pattern, e))?;
    let forest = load_forest(ctx)?;
    let hits = query::search(&forest, &re);

    if ctx.json {
        let results = SearchResultsJson {
            pattern: &args.pattern,
            hits: &hits,
        };
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if hits.is_empty() {
        println!("no matches for '{}'", args.pattern);
    } else {
        for hit in &hits {
            println!("{}", format_search_hit(hit));
        }
    }
    Ok(())
}
