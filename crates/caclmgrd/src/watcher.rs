//! Change watcher loop.
//!
//! Runs one unconditional reconciliation at startup so the device never sits
//! idle with stale or absent rules, then blocks on the change-event channel
//! and triggers a full rebuild per notification. The payload is ignored:
//! every rebuild reads the current snapshot anyway.

use tokio::sync::mpsc;
use tracing::{debug, info};

use cacl_common::{CaclResult, ChangeEvent, ConfigMgr};

/// Drives the manager until the event channel closes.
///
/// Events queued while a rebuild is in progress coalesce into a single
/// trailing rebuild; at least one reconciliation always happens after the
/// last event.
pub async fn run<M: ConfigMgr>(
    mgr: &mut M,
    events: &mut mpsc::Receiver<ChangeEvent>,
) -> CaclResult<()> {
    info!(daemon = mgr.daemon_name(), "Initial reconciliation");
    mgr.reconcile_once().await?;

    while let Some(event) = events.recv().await {
        debug!(table = %event.table, key = %event.key, "Change notification");

        // Drain the burst; one rebuild covers them all.
        let mut coalesced = 0usize;
        while events.try_recv().is_ok() {
            coalesced += 1;
        }
        if coalesced > 0 {
            debug!(coalesced, "Coalesced queued change notifications");
        }

        mgr.reconcile_once().await?;
    }

    info!(daemon = mgr.daemon_name(), "Change event channel closed, stopping");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct CountingMgr {
        reconciles: usize,
    }

    #[async_trait]
    impl ConfigMgr for CountingMgr {
        fn daemon_name(&self) -> &str {
            "countingmgr"
        }

        fn config_table_names(&self) -> &[&str] {
            &["ACL_TABLE", "ACL_RULE"]
        }

        async fn reconcile_once(&mut self) -> CaclResult<()> {
            self.reconciles += 1;
            Ok(())
        }
    }

    fn event(key: &str) -> ChangeEvent {
        ChangeEvent {
            table: "ACL_RULE".to_string(),
            key: key.to_string(),
        }
    }

    #[tokio::test]
    async fn test_startup_reconcile_without_events() {
        let (tx, mut rx) = mpsc::channel(8);
        drop(tx);

        let mut mgr = CountingMgr { reconciles: 0 };
        run(&mut mgr, &mut rx).await.unwrap();

        assert_eq!(mgr.reconciles, 1);
    }

    #[tokio::test]
    async fn test_each_event_triggers_rebuild() {
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(event("T|RULE_1")).await.unwrap();
        drop(tx);

        let mut mgr = CountingMgr { reconciles: 0 };
        run(&mut mgr, &mut rx).await.unwrap();

        // Startup pass plus one per received event
        assert_eq!(mgr.reconciles, 2);
    }

    #[tokio::test]
    async fn test_burst_coalesces_to_trailing_rebuild() {
        let (tx, mut rx) = mpsc::channel(8);
        for i in 0..5 {
            tx.send(event(&format!("T|RULE_{}", i))).await.unwrap();
        }
        drop(tx);

        let mut mgr = CountingMgr { reconciles: 0 };
        run(&mut mgr, &mut rx).await.unwrap();

        // Startup pass plus a single coalesced rebuild for the burst
        assert_eq!(mgr.reconciles, 2);
    }
}
