use std::{sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::state::{TickOutcome, TryOnState};

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "stylesync::tryon::ticker";

use crate::{log_debug, log_error, log_info};

/// Drives one countdown. Each iteration is a single-shot sleep so a cancelled
/// or replaced countdown never fires a late tick.
pub async fn run_countdown(
    state: Arc<Mutex<TryOnState>>,
    epoch: u64,
    tick: Duration,
    cancel_token: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                log_debug!("countdown {epoch} cancelled");
                break;
            }
            _ = tokio::time::sleep(tick) => {
                let outcome = state.lock().await.tick(epoch);
                match outcome {
                    TickOutcome::Remaining(n) => log_debug!("countdown {epoch}: {n}"),
                    TickOutcome::Captured => {
                        log_info!("frame captured at end of countdown {epoch}");
                        break;
                    }
                    TickOutcome::Failed(err) => {
                        log_error!("capture failed at end of countdown {epoch}: {err}");
                        break;
                    }
                    TickOutcome::Stale => {
                        log_debug!("countdown {epoch} superseded");
                        break;
                    }
                }
            }
        }
    }
}
