//! Anggaran budget tree CLI.
//!
//! Provides the `anggaran` binary for working with a budget database outside
//! the HTTP server: initialise the schema, manage categories and periods,
//! print a category/period tree, and check stored trees for code or total
//! drift.
//!
//! Uses the same `anggaran_storage::load_tree()` path as the server's editor
//! sessions, so what `show` prints is what an editor would open.

use std::process;

use clap::{Parser, Subcommand};

use anggaran_core::{audit, build_tree_checked, BudgetItem, CategoryId, ItemScope, PeriodId, TreeIssue};
use anggaran_storage::{load_tree, ItemStore, SqliteStore};

/// Anggaran budget tree tools.
#[derive(Parser)]
#[command(name = "anggaran", about = "Anggaran budget tree tools")]
struct Cli {
    /// Path to the budget database file.
    #[arg(long, global = true, default_value = "anggaran.db")]
    db: String,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Create the database and apply migrations.
    Init,

    /// Manage financial categories.
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },

    /// Manage budget periods.
    Period {
        #[command(subcommand)]
        action: PeriodAction,
    },

    /// Print the budget tree of a category/period.
    Show {
        #[arg(short, long)]
        category: i64,

        #[arg(short, long)]
        period: i64,

        /// Print the nested tree as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check stored codes and parent totals of a category/period.
    Check {
        #[arg(short, long)]
        category: i64,

        #[arg(short, long)]
        period: i64,
    },
}

#[derive(Subcommand)]
enum CategoryAction {
    Add { name: String },
    List,
}

#[derive(Subcommand)]
enum PeriodAction {
    Add {
        name: String,

        #[arg(short, long)]
        year: i32,
    },
    List,
}

fn main() {
    let cli = Cli::parse();

    let mut store = match SqliteStore::new(&cli.db) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: failed to open database '{}': {}", cli.db, e);
            process::exit(3);
        }
    };

    let exit_code = match cli.command {
        Commands::Init => {
            println!("database ready at {}", cli.db);
            0
        }
        Commands::Category { action } => run_category(&mut store, action),
        Commands::Period { action } => run_period(&mut store, action),
        Commands::Show {
            category,
            period,
            json,
        } => run_show(&store, scope(category, period), json),
        Commands::Check { category, period } => run_check(&store, scope(category, period)),
    };
    process::exit(exit_code);
}

fn scope(category: i64, period: i64) -> ItemScope {
    ItemScope::new(CategoryId(category), PeriodId(period))
}

fn run_category(store: &mut SqliteStore, action: CategoryAction) -> i32 {
    match action {
        CategoryAction::Add { name } => match store.create_category(name.trim()) {
            Ok(category) => {
                println!("{}\t{}", category.id.0, category.name);
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        CategoryAction::List => match store.list_categories() {
            Ok(categories) => {
                for category in categories {
                    println!("{}\t{}", category.id.0, category.name);
                }
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                3
            }
        },
    }
}

fn run_period(store: &mut SqliteStore, action: PeriodAction) -> i32 {
    match action {
        PeriodAction::Add { name, year } => match store.create_period(name.trim(), year) {
            Ok(period) => {
                println!("{}\t{}\t{}", period.id.0, period.name, period.year);
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        PeriodAction::List => match store.list_periods() {
            Ok(periods) => {
                for period in periods {
                    println!("{}\t{}\t{}", period.id.0, period.name, period.year);
                }
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                3
            }
        },
    }
}

/// Execute the show subcommand.
///
/// An empty category/period prints the seeded root an editor would start
/// from.
fn run_show(store: &SqliteStore, scope: ItemScope, json: bool) -> i32 {
    let loaded = match load_tree(store, scope) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error: failed to load items ({}): {}", scope, e);
            return 3;
        }
    };
    for orphan in &loaded.orphans {
        eprintln!("warning: item {} has a missing parent and was skipped", orphan);
    }

    if json {
        let out = serde_json::to_string_pretty(&loaded.tree.roots).unwrap_or_else(|e| {
            format!("{{\"error\": \"failed to serialize tree: {}\"}}", e)
        });
        println!("{}", out);
    } else {
        print!("{}", render_tree(&loaded.tree.roots));
    }
    0
}

/// Execute the check subcommand.
///
/// Returns exit code: 0 = consistent, 2 = issues found, 3 = I/O error.
fn run_check(store: &SqliteStore, scope: ItemScope) -> i32 {
    let records = match store.list_items(scope) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: failed to load items ({}): {}", scope, e);
            return 3;
        }
    };
    let outcome = build_tree_checked(&records);
    let issues = audit(&outcome.tree);

    for orphan in &outcome.orphans {
        println!("orphan: item {} has a missing parent", orphan);
    }
    for issue in &issues {
        println!("{}", describe(issue));
    }

    if issues.is_empty() && outcome.orphans.is_empty() {
        println!("{} items, no issues", records.len());
        0
    } else {
        2
    }
}

fn describe(issue: &TreeIssue) -> String {
    match issue {
        TreeIssue::CodeMismatch { expected, found } => {
            format!("code: '{}' should be '{}'", found, expected)
        }
        TreeIssue::TotalMismatch {
            code,
            expected,
            found,
        } => format!("total: '{}' is {} but its children sum to {}", code, found, expected),
        TreeIssue::TooDeep { code, level } => {
            format!("depth: '{}' is at level {}", code, level)
        }
    }
}

/// Indented `kode  nama  total` lines, one per item in display order.
fn render_tree(roots: &[BudgetItem]) -> String {
    fn walk(items: &[BudgetItem], depth: usize, out: &mut String) {
        for item in items {
            let total = if item.total_target.is_blank() {
                "-"
            } else {
                item.total_target.as_str()
            };
            out.push_str(&format!(
                "{}{}  {}  {}\n",
                "  ".repeat(depth),
                item.code,
                item.name,
                total
            ));
            walk(&item.children, depth + 1, out);
        }
    }

    let mut out = String::new();
    walk(roots, 0, &mut out);
    out
}
