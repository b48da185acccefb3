//! Pause and dispose requests that arrive while the session is borrowed.
//!
//! JavaScript callbacks (`setPose`, section listeners) run inside a session
//! borrow. A `pause()` or `dispose()` issued from one of them is recorded
//! here and applied by the callback owner once its own work is done.

use std::cell::Cell;

use scrollcam_core::{FrameHost, MapRenderer, TourSession};

#[derive(Debug, Default)]
pub struct Deferred {
    pause: Cell<bool>,
    dispose: Cell<bool>,
}

impl Deferred {
    pub fn request_pause(&self) {
        self.pause.set(true);
    }

    pub fn request_dispose(&self) {
        self.dispose.set(true);
    }

    pub fn is_dispose_requested(&self) -> bool {
        self.dispose.get()
    }

    /// Applies and clears whatever was requested. Dispose wins over pause.
    pub fn apply<H: FrameHost, R: MapRenderer>(&self, session: &mut TourSession<H, R>) {
        let pause = self.pause.take();
        if self.dispose.take() {
            tracing::debug!("applying deferred dispose");
            session.dispose();
        } else if pause {
            tracing::debug!("applying deferred pause");
            session.pause();
        }
    }
}
