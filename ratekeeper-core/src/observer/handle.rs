use ratekeeper_model::{SyncRequest, SyncResponse};
use tokio::sync::{mpsc, oneshot};

use crate::error::{Result, TransportError};
use crate::ports::VideoId;

/// Inbound edges into the agent's state machine.
#[derive(Debug)]
pub enum AgentEvent {
    /// The bound element reported a rate change.
    RateChanged(VideoId),
    /// A panel asked for an immediate rate change.
    SetSpeed {
        request: SyncRequest,
        reply: oneshot::Sender<SyncResponse>,
    },
    /// Answered after a detection pass, once every event queued ahead of it
    /// has been handled.
    Barrier(oneshot::Sender<()>),
    Shutdown,
}

/// Cloneable handle for talking to a running agent.
#[derive(Debug, Clone)]
pub struct AgentHandle {
    pub(super) events: mpsc::UnboundedSender<AgentEvent>,
}

impl AgentHandle {
    /// Send a sync request and wait for the acknowledgement.
    pub async fn request(&self, request: SyncRequest) -> Result<SyncResponse> {
        let (reply, response) = oneshot::channel();
        self.events
            .send(AgentEvent::SetSpeed { request, reply })
            .map_err(|_| TransportError::NoListener)?;
        response
            .await
            .map_err(|_| TransportError::Disconnected("page agent"))
    }

    /// Wait until the agent has drained pending mutations and events.
    pub async fn flush(&self) -> Result<()> {
        let (done, finished) = oneshot::channel();
        self.events
            .send(AgentEvent::Barrier(done))
            .map_err(|_| TransportError::NoListener)?;
        finished
            .await
            .map_err(|_| TransportError::Disconnected("page agent"))
    }

    pub fn shutdown(&self) {
        let _ = self.events.send(AgentEvent::Shutdown);
    }

    pub fn is_closed(&self) -> bool {
        self.events.is_closed()
    }
}
