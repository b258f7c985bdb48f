//! Handle for driving a running engine.

use tokio::sync::{mpsc, watch};

use super::snapshot::DashboardSnapshot;
use crate::config::DashboardConfig;
use crate::source::SourceMode;
use crate::view::StyleKey;

/// User actions accepted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    /// Flip between following the vehicle and a free camera.
    ToggleFollow,
    /// Pan to the vehicle and engage follow.
    Recenter,
    SwitchMode(SourceMode),
    /// Apply an edited configuration.
    ApplyConfig(Box<DashboardConfig>),
    SetStyle(StyleKey),
    /// Clear trail and path.
    Reset,
    Shutdown,
}

/// Cloneable handle to a running [`Engine`](super::Engine).
#[derive(Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<EngineCommand>,
    snapshot: watch::Receiver<DashboardSnapshot>,
}

impl EngineHandle {
    pub(super) fn new(
        commands: mpsc::Sender<EngineCommand>,
        snapshot: watch::Receiver<DashboardSnapshot>,
    ) -> Self {
        Self { commands, snapshot }
    }

    /// Queue a command. Returns `false` once the engine has stopped.
    pub async fn send(&self, command: EngineCommand) -> bool {
        self.commands.send(command).await.is_ok()
    }

    /// Queue a command without waiting. Returns `false` if the queue is
    /// full or the engine has stopped.
    pub fn try_send(&self, command: EngineCommand) -> bool {
        self.commands.try_send(command).is_ok()
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> DashboardSnapshot {
        self.snapshot.borrow().clone()
    }

    /// A receiver that is notified on every publish.
    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.snapshot.clone()
    }
}
