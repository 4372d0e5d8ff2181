//! CaclMgr - reconciler and executor for control-plane ACLs.
//!
//! Each reconciliation pass reads a fresh CONFIG_DB snapshot, derives the
//! full command sequence, and applies it. There is no incremental diffing:
//! the live firewall state is always rebuilt from scratch.

use async_trait::async_trait;
use tracing::{debug, error, info, instrument};

use cacl_common::shell;
use cacl_common::{CaclResult, ConfigMgr, ConfigSource};

use crate::compiler;
use crate::normalize;
use crate::tables::{CFG_ACL_RULE_TABLE_NAME, CFG_ACL_TABLE_NAME};

/// Executes compiled commands and reports their exit status.
///
/// The production implementation shells out; tests substitute a recording
/// stub to observe the sequence without touching the host firewall.
#[async_trait]
pub trait CommandExecutor: Send {
    /// Runs one command, returning its exit code.
    async fn execute(&mut self, cmd: &str) -> CaclResult<i32>;
}

/// Runs commands through `/bin/sh -c`.
pub struct ShellExecutor;

#[async_trait]
impl CommandExecutor for ShellExecutor {
    async fn execute(&mut self, cmd: &str) -> CaclResult<i32> {
        let result = shell::exec(cmd).await?;
        Ok(result.exit_code)
    }
}

/// Control-plane ACL manager.
pub struct CaclMgr<S, E> {
    source: S,
    executor: E,
}

impl<S: ConfigSource, E: CommandExecutor> CaclMgr<S, E> {
    /// Creates a new manager over a snapshot provider and an executor.
    pub fn new(source: S, executor: E) -> Self {
        Self { source, executor }
    }

    /// Consumes the manager, returning the executor.
    pub fn into_executor(self) -> E {
        self.executor
    }

    /// Applies a compiled command sequence, best effort.
    ///
    /// A failing command is logged and execution continues with the next
    /// one; aborting mid-sequence would leave the device partially flushed
    /// and unprotected for longer than necessary.
    async fn apply(&mut self, cmds: &[String]) {
        for cmd in cmds {
            match self.executor.execute(cmd).await {
                Ok(0) => {}
                Ok(code) => {
                    error!(command = %cmd, exit_code = code, "ACL command failed, continuing");
                }
                Err(e) => {
                    error!(command = %cmd, error = %e, "Could not run ACL command, continuing");
                }
            }
        }
    }
}

#[async_trait]
impl<S: ConfigSource, E: CommandExecutor> ConfigMgr for CaclMgr<S, E> {
    fn daemon_name(&self) -> &str {
        "caclmgrd"
    }

    fn config_table_names(&self) -> &[&str] {
        &[CFG_ACL_TABLE_NAME, CFG_ACL_RULE_TABLE_NAME]
    }

    /// One full read-compile-apply pass.
    ///
    /// A snapshot read failure is propagated; translation and execution
    /// failures are recovered locally and never fail the pass.
    #[instrument(skip(self))]
    async fn reconcile_once(&mut self) -> CaclResult<()> {
        let table_entries = self.source.read_table(CFG_ACL_TABLE_NAME).await?;
        let rule_entries = self.source.read_table(CFG_ACL_RULE_TABLE_NAME).await?;

        let tables = normalize::normalize(&table_entries, &rule_entries);
        debug!(
            tables = tables.len(),
            "Normalized control-plane ACL snapshot"
        );

        let cmds = compiler::compile(&tables);
        info!(commands = cmds.len(), "Rebuilding control-plane ACLs");

        self.apply(&cmds).await;
        Ok(())
    }
}
