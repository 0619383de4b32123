use crate::input::{Action, BindingMap, InputSource};
use crate::player::Player;
use std::future::Future;

/// The controller service: pin events in, playback commands out.
///
/// Runs the single control flow the crate is built around: one event at a
/// time, one command in flight at a time. Command failures are logged and
/// the loop keeps going; nothing an input triggers can take the service
/// down.
pub struct Service {
    player: Player,
    bindings: BindingMap,
}

impl Service {
    pub fn new(player: Player, bindings: BindingMap) -> Self {
        Self { player, bindings }
    }

    /// Run until `shutdown` resolves or the input source closes.
    ///
    /// Every exit route (shutdown signal, exhausted source) falls through
    /// to the same scoped teardown point, which releases the server
    /// connection before returning.
    pub async fn run<S, F>(mut self, mut source: S, shutdown: F)
    where
        S: InputSource,
        F: Future<Output = ()>,
    {
        tracing::info!("Entering service loop");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown signal received");
                    break;
                }
                event = source.next_event() => {
                    let Some(event) = event else {
                        tracing::info!("Input source closed");
                        break;
                    };
                    if let Some(action) = self.bindings.resolve(event) {
                        self.dispatch(action).await;
                    }
                }
            }
        }

        // the one teardown point every exit route shares
        tracing::info!("Disconnecting from MPD");
        self.player.client_mut().disconnect().await;
    }

    async fn dispatch(&mut self, action: Action) {
        tracing::debug!("Triggered action '{}'", action.name());
        if let Err(e) = self.player.perform(action).await {
            tracing::warn!("Action '{}' failed: {}", action.name(), e);
        }
    }
}
