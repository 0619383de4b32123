use crate::client::PersistentClient;
use crate::error::Result;
use crate::input::Action;
use crate::registry::CommandId;
use crate::types::{PlayState, Status};

/// Playback glue: one method per action an input can trigger.
///
/// Every method is a thin wrapper over the persistent client, so each one
/// inherits the health-check-then-reconnect behaviour for free.
pub struct Player {
    client: PersistentClient,
    volume_step: u8,
}

impl Player {
    /// Wrap an established client; `volume_step` is the percentage applied
    /// per volume action (and per encoder detent).
    pub fn new(client: PersistentClient, volume_step: u8) -> Self {
        Self {
            client,
            volume_step,
        }
    }

    /// Access to the underlying client, e.g. for teardown
    pub fn client_mut(&mut self) -> &mut PersistentClient {
        &mut self.client
    }

    /// Current playback status
    pub async fn status(&mut self) -> Result<Status> {
        let response = self.client.invoke(CommandId::Status, &[]).await?;
        Status::from_response(&response)
    }

    /// Run the player method bound to `action`
    pub async fn perform(&mut self, action: Action) -> Result<()> {
        match action {
            Action::PlayPause => self.play_pause().await,
            Action::PlayStop => self.play_stop().await,
            Action::NextTrack => self.next_track().await,
            Action::PrevTrack => self.previous_track().await,
            Action::ToggleMute => self.toggle_mute().await,
            Action::VolumeDown => self.volume_down().await,
            Action::VolumeUp => self.volume_up().await,
        }
    }

    /// Pause when playing, otherwise start playback
    pub async fn play_pause(&mut self) -> Result<()> {
        let command = match self.status().await?.state {
            PlayState::Play => CommandId::Pause,
            _ => CommandId::Play,
        };
        self.client.invoke(command, &[]).await?;
        Ok(())
    }

    /// Stop when playing, otherwise start playback
    pub async fn play_stop(&mut self) -> Result<()> {
        let command = match self.status().await?.state {
            PlayState::Play => CommandId::Stop,
            _ => CommandId::Play,
        };
        self.client.invoke(command, &[]).await?;
        Ok(())
    }

    /// Skip to the next track in the queue
    pub async fn next_track(&mut self) -> Result<()> {
        self.client.invoke(CommandId::Next, &[]).await?;
        Ok(())
    }

    /// Go back to the previous track in the queue
    pub async fn previous_track(&mut self) -> Result<()> {
        self.client.invoke(CommandId::Previous, &[]).await?;
        Ok(())
    }

    /// Toggle output 0 on or off
    pub async fn toggle_mute(&mut self) -> Result<()> {
        self.client.invoke(CommandId::ToggleOutput, &["0"]).await?;
        Ok(())
    }

    /// Raise the volume by one step
    pub async fn volume_up(&mut self) -> Result<()> {
        let step = self.volume_step.to_string();
        self.client.invoke(CommandId::Volume, &[&step]).await?;
        Ok(())
    }

    /// Lower the volume by one step
    pub async fn volume_down(&mut self) -> Result<()> {
        let step = format!("-{}", self.volume_step);
        self.client.invoke(CommandId::Volume, &[&step]).await?;
        Ok(())
    }
}
