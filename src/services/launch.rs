//! Drives launch acknowledgements on the async runtime.

use crate::event_bus::{LaunchResult, UiEvent};
use crossbeam_channel::Sender;
use dock_apps::LaunchFuture;
use log::{info, warn};
use std::time::Duration;
use tokio::runtime::Handle;

/// Await `ack` with a bounded timeout, then post the outcome back to the
/// interactive thread, which owns the hide action.
pub fn spawn_launch(
    runtime: &Handle,
    name: String,
    ack: LaunchFuture,
    timeout: Duration,
    tx: Sender<UiEvent>,
) {
    runtime.spawn(async move {
        let result = match tokio::time::timeout(timeout, ack).await {
            Ok(Ok(())) => {
                info!("{} launched", name);
                LaunchResult::Acknowledged
            }
            Ok(Err(e)) => {
                warn!("Launching {} failed: {}", name, e);
                LaunchResult::Failed(e.to_string())
            }
            Err(_) => {
                warn!("No acknowledgement for {} after {:?}", name, timeout);
                LaunchResult::TimedOut
            }
        };

        let _ = tx.send(UiEvent::LaunchFinished { name, result });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus;
    use dock_apps::LaunchError;
    use std::path::PathBuf;

    fn finished(rx: &crossbeam_channel::Receiver<UiEvent>) -> LaunchResult {
        match rx.recv_timeout(Duration::from_secs(10)).unwrap() {
            UiEvent::LaunchFinished { result, .. } => result,
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_outcomes_are_posted() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (tx, rx) = event_bus::channel();

        spawn_launch(
            runtime.handle(),
            "Mail".to_string(),
            Box::pin(async { Ok::<(), LaunchError>(()) }),
            Duration::from_secs(5),
            tx.clone(),
        );
        assert_eq!(finished(&rx), LaunchResult::Acknowledged);

        spawn_launch(
            runtime.handle(),
            "Ghost".to_string(),
            Box::pin(async { Err(LaunchError::NoCommand(PathBuf::from("ghost.desktop"))) }),
            Duration::from_secs(5),
            tx.clone(),
        );
        assert!(matches!(finished(&rx), LaunchResult::Failed(_)));

        spawn_launch(
            runtime.handle(),
            "Slow".to_string(),
            Box::pin(futures_util::future::pending::<Result<(), LaunchError>>()),
            Duration::from_millis(20),
            tx,
        );
        assert_eq!(finished(&rx), LaunchResult::TimedOut);
    }
}
