use std::sync::mpsc;
use tokio::sync::oneshot;

use shared::api::PredictionClient;
use shared::error::PredictError;
use shared::session::Submission;

use crate::app::UiMessage;

/// Fires the cancellation signal for one in-flight submission. Dropping
/// the handle without calling `cancel` leaves the request running to
/// settlement (or the transport deadline).
pub struct CancelHandle {
    tx: Option<oneshot::Sender<()>>,
}

impl CancelHandle {
    pub fn cancel(mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(());
        }
    }
}

/// One background thread per submission, owning its own runtime. The
/// settlement goes back over the UI channel tagged with the submission
/// id so stale outcomes can be dropped.
pub fn spawn_submission(
    client: PredictionClient,
    submission: Submission,
    tx: mpsc::Sender<UiMessage>,
) -> CancelHandle {
    let (cancel_tx, cancel_rx) = oneshot::channel::<()>();

    std::thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                let _ = tx.send(UiMessage::Settled {
                    submission: submission.id,
                    outcome: Err(PredictError::Network(e.to_string())),
                });
                return;
            }
        };

        let outcome = rt.block_on(async {
            tokio::select! {
                result = client.predict(&submission.request) => result,
                _ = cancel_rx => Err(PredictError::Cancelled),
            }
        });

        if let Err(error) = &outcome {
            log::warn!("Submission {} failed: {}", submission.id, error);
        }
        let _ = tx.send(UiMessage::Settled {
            submission: submission.id,
            outcome,
        });
    });

    CancelHandle {
        tx: Some(cancel_tx),
    }
}
