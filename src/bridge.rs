//! The bridge loop: receive, decode, generate, deliver, repeat.
//!
//! One task drives everything. Receiving the next request and running
//! inference never overlap, so the provider sees at most one call at a time.

use tracing::{debug, error, info, warn};

use crate::decoder::{decode_datagram, Command};
use crate::error::{BridgeError, ProviderError};
use crate::ports::{RequestSource, ResponseSink};
use crate::session::Session;

/// Why a bridge session ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    /// The controller sent the exit sentinel.
    Exit,
    /// The transport closed.
    TransportClosed,
}

/// What the loop does after one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Wait for the next request.
    Continue,
    /// Shut down.
    Exit,
}

/// Couples a session to a response sink.
pub struct Bridge {
    session: Session,
    sink: Box<dyn ResponseSink>,
}

impl Bridge {
    /// Create a bridge. The sink mode is fixed from here on.
    #[must_use]
    pub fn new(session: Session, sink: Box<dyn ResponseSink>) -> Self {
        Self { session, sink }
    }

    /// The underlying session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Serve requests from `source` until exit, transport closure, or a fatal error.
    ///
    /// The sink and the transport are released before returning, whatever
    /// the outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails or the transport breaks.
    pub async fn run(&mut self, source: &mut dyn RequestSource) -> Result<Shutdown, BridgeError> {
        info!(sink = %self.sink.describe(), "bridge running");
        let outcome = self.serve(source).await;
        self.sink.release();
        source.close();
        match &outcome {
            Ok(reason) => {
                let generations = self.session.generations();
                info!(?reason, generations, "bridge stopped");
            }
            Err(e) => error!(error = %e, "bridge aborted"),
        }
        outcome
    }

    async fn serve(&mut self, source: &mut dyn RequestSource) -> Result<Shutdown, BridgeError> {
        loop {
            let Some(payload) = source.recv().await? else {
                return Ok(Shutdown::TransportClosed);
            };
            info!("received: {}", String::from_utf8_lossy(&payload));
            if self.step(&payload).await? == Flow::Exit {
                return Ok(Shutdown::Exit);
            }
        }
    }

    /// Handle one raw payload.
    ///
    /// Malformed requests and delivery failures are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error only if inference fails; the session must then end.
    pub async fn step(&mut self, payload: &[u8]) -> Result<Flow, ProviderError> {
        let command = match decode_datagram(payload) {
            Ok(Some(command)) => command,
            Ok(None) => {
                debug!("ignoring unrecognised command");
                return Ok(Flow::Continue);
            }
            Err(e) => {
                warn!(error = %e, "ignoring malformed request");
                return Ok(Flow::Continue);
            }
        };

        match command {
            Command::Exit => Ok(Flow::Exit),
            Command::SetTruncation(psi) => {
                info!(psi, "truncation updated");
                self.session.set_truncation(psi);
                Ok(Flow::Continue)
            }
            Command::Generate(request) => {
                let result = self.session.generate(&request).await?;
                if let Err(e) = self.sink.deliver(result) {
                    error!(error = %e, "failed to deliver image");
                }
                Ok(Flow::Continue)
            }
        }
    }
}
