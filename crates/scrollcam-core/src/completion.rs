//! One-shot completion signal for camera flights.
//!
//! A flight can end because it arrived, because a newer flight replaced it,
//! or because the renderer failed. Several of those can race within one
//! frame; the first settlement wins and later ones are ignored.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;

/// How a flight ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlightOutcome {
    Arrived,
    /// A newer flight, a path swap or `stop()` replaced this one.
    Superseded,
    RendererFailed(String),
    /// The settling side went away without reporting.
    Dropped,
}

/// Settling half of a flight's completion signal.
#[derive(Debug)]
pub struct Settler {
    tx: Option<oneshot::Sender<FlightOutcome>>,
}

impl Settler {
    /// Resolves the flight. Returns `false` if it was already settled.
    pub fn settle(&mut self, outcome: FlightOutcome) -> bool {
        match self.tx.take() {
            Some(tx) => {
                // A dropped receiver only means nobody is waiting.
                let _ = tx.send(outcome);
                true
            }
            None => false,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.tx.is_none()
    }
}

/// Awaitable half of a flight's completion signal.
#[derive(Debug)]
pub struct FlightCompletion {
    rx: oneshot::Receiver<FlightOutcome>,
}

impl FlightCompletion {
    /// Non-blocking check, for callers polling once per frame.
    pub fn try_outcome(&mut self) -> Option<FlightOutcome> {
        match self.rx.try_recv() {
            Ok(outcome) => outcome,
            Err(oneshot::Canceled) => Some(FlightOutcome::Dropped),
        }
    }
}

impl Future for FlightCompletion {
    type Output = FlightOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|res| res.unwrap_or(FlightOutcome::Dropped))
    }
}

pub fn channel() -> (Settler, FlightCompletion) {
    let (tx, rx) = oneshot::channel();
    (Settler { tx: Some(tx) }, FlightCompletion { rx })
}
