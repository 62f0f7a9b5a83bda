//! CLI subcommand implementations.

pub mod cache;
pub mod commit;
pub mod edit;
pub mod jira;
pub mod list;
pub mod start;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use wl_core::{DocumentConfig, Editor, Outcome};

use crate::{Config, logfile};

/// Resolved settings shared by all commands of one invocation.
#[derive(Debug)]
pub struct Workspace {
    pub config: Config,
    pub document_config: DocumentConfig,
    /// Reference time for rounding and relative time expressions.
    pub now: NaiveDateTime,
}

impl Workspace {
    /// Applies the `--file` and `--now` overrides and validates the
    /// document settings.
    pub fn new(
        mut config: Config,
        file: Option<PathBuf>,
        now: Option<NaiveDateTime>,
    ) -> Result<Self> {
        if let Some(file) = file {
            config.file = file;
        }
        let document_config = config
            .document_config()
            .context("invalid document settings")?;
        Ok(Self {
            config,
            document_config,
            now: now.unwrap_or_else(|| Local::now().naive_local()),
        })
    }

    /// Loads the work log into an editor.
    pub fn editor(&self) -> Result<Editor> {
        let document = logfile::load(&self.config.file, &self.document_config)?;
        Ok(Editor::new(
            document,
            self.document_config.clone(),
            self.now,
        ))
    }

    /// Reports the outcomes and saves the log if any of them changed it.
    pub fn finish<W: Write>(
        &self,
        writer: &mut W,
        editor: &Editor,
        outcomes: &[Outcome],
    ) -> Result<()> {
        report(writer, outcomes)?;
        if outcomes.iter().any(Outcome::is_applied) {
            logfile::save(&self.config.file, editor.document())?;
        } else {
            tracing::debug!("nothing changed, log not written");
        }
        Ok(())
    }
}

/// Writes one line per outcome.
pub fn report<W: Write>(writer: &mut W, outcomes: &[Outcome]) -> Result<()> {
    for outcome in outcomes {
        match outcome {
            Outcome::Applied(message) => writeln!(writer, "{message}")?,
            Outcome::Skipped(warning) => writeln!(writer, "Warning: {warning}")?,
        }
    }
    Ok(())
}
