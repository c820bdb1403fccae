//! Event plumbing between the platform hooks and the zone controller.
//!
//! Every event travels with the span that was current when it was sent, so
//! the controller's logs nest under whatever produced the event.

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::Span;

pub mod window_move;
pub mod zone_controller;

pub struct Sender<Event>(UnboundedSender<(Span, Event)>);
pub type Receiver<Event> = UnboundedReceiver<(Span, Event)>;

pub fn channel<Event>() -> (Sender<Event>, Receiver<Event>) {
    let (tx, rx) = unbounded_channel();
    (Sender(tx), rx)
}

impl<Event> Sender<Event> {
    /// Sends and forgets. A closed channel only means the controller has
    /// stopped.
    pub fn send(&self, event: Event) { _ = self.try_send(event) }

    /// Hands the event back if the controller has stopped.
    pub fn try_send(&self, event: Event) -> Result<(), Event> {
        self.0.send((Span::current(), event)).map_err(|err| err.0.1)
    }

    pub fn is_closed(&self) -> bool { self.0.is_closed() }
}

impl<Event> Clone for Sender<Event> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_send_returns_event_once_closed() {
        let (tx, rx) = channel::<u32>();
        assert_eq!(tx.try_send(1), Ok(()));
        drop(rx);
        assert!(tx.is_closed());
        assert_eq!(tx.try_send(2), Err(2));
    }
}
