#![forbid(unsafe_code)]

use crate::support::{annotate_times, print_json, report_progress};
use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tl_storage::{ConfigOverrides, TransactionsRequest, UndoLog, UndoLogConfig, env_var};
use tracing::info;

/// Inspect and maintain an undo history database.
#[derive(Debug, Parser)]
#[command(name = "treelog", version)]
pub struct Cli {
    /// Database url or path; falls back to TREELOG_DB_URL.
    #[arg(long, global = true)]
    db: Option<String>,
    /// Tree whose history is read; falls back to TREELOG_TREE_ID.
    #[arg(long, global = true)]
    tree_id: Option<i64>,
    /// Falls back to TREELOG_USER_ID.
    #[arg(long, global = true)]
    user_id: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List transactions, one page at a time.
    List {
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// 0 lists everything.
        #[arg(long, default_value_t = 20)]
        pagesize: usize,
        /// Newest first.
        #[arg(long)]
        desc: bool,
        /// Only transactions before this time (seconds since the epoch).
        #[arg(long)]
        before: Option<f64>,
        /// Only transactions at or after this time (seconds since the epoch).
        #[arg(long)]
        after: Option<f64>,
        /// Include old and new object data.
        #[arg(long)]
        payloads: bool,
    },
    /// Show one transaction.
    Show {
        id: i64,
        #[arg(long)]
        payloads: bool,
    },
    /// Write the whole history as JSON lines.
    Export {
        /// Output file; stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Rewrite legacy payloads in the current encoding.
    Reserialize,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let config = self.config()?;
        let mut log = UndoLog::open(&config).context("open undo history")?;

        match self.command {
            Command::List {
                page,
                pagesize,
                desc,
                before,
                after,
                payloads,
            } => {
                let request = TransactionsRequest {
                    page,
                    pagesize,
                    old_data: payloads,
                    new_data: payloads,
                    ascending: !desc,
                    before,
                    after,
                };
                let (transactions, total) = log.get_transactions(&request)?;
                let mut transactions = serde_json::to_value(transactions)?;
                if let Some(items) = transactions.as_array_mut() {
                    items.iter_mut().for_each(annotate_times);
                }
                print_json(&json!({ "total": total, "transactions": transactions }))?;
            }
            Command::Show { id, payloads } => {
                let transaction = log.get_transaction(id, payloads, payloads)?;
                let mut value = serde_json::to_value(transaction)?;
                annotate_times(&mut value);
                print_json(&value)?;
            }
            Command::Export { out } => {
                let mut progress = |done, total| report_progress("exported", done, total);
                let exported = match &out {
                    Some(path) => {
                        let file = File::create(path)
                            .with_context(|| format!("create {}", path.display()))?;
                        let mut writer = BufWriter::new(file);
                        let exported = log.export_history(&mut writer, Some(&mut progress))?;
                        writer.flush()?;
                        exported
                    }
                    None => {
                        let stdout = std::io::stdout();
                        let mut writer = stdout.lock();
                        log.export_history(&mut writer, Some(&mut progress))?
                    }
                };
                info!(exported, "history export finished");
            }
            Command::Reserialize => {
                let mut progress = |done, total| report_progress("checked", done, total);
                let rewritten = log.reserialize_payloads(Some(&mut progress))?;
                print_json(&json!({ "rewritten": rewritten }))?;
            }
        }

        log.close()?;
        Ok(())
    }

    /// Flags win over the environment, which wins over the defaults. A
    /// variable is only read when its flag is absent.
    fn config(&self) -> anyhow::Result<UndoLogConfig> {
        self.config_with(env_var)
    }

    fn config_with(&self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<UndoLogConfig> {
        let overrides = ConfigOverrides {
            db_url: self.db.clone(),
            tree_id: self.tree_id,
            user_id: self.user_id.clone(),
            max_undo_depth: None,
        };
        UndoLogConfig::resolve(&overrides, lookup).context("resolve history database settings")
    }
}
