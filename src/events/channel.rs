//! Event channel implementation using crossbeam-channel.
//!
//! Lets the engine report progress to whatever front end is driving it
//! (CLI spinner, GUI log pane, tray app) without knowing which one.

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::Event;

/// Sends events from the engine.
///
/// Cheap to clone and safe to move to the thread running an indexing pass.
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Send an event without blocking.
    ///
    /// If the receiver is dropped, the event is silently discarded.
    pub fn send(&self, event: Event) {
        let _ = self.inner.send(event);
    }
}

/// Receives events from the engine.
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Block until the next event is received
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Returns an iterator over received events
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }

    /// Returns an iterator over events rendered as single log lines.
    ///
    /// Ends once every sender has been dropped.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.inner.iter().map(|event| event.to_string())
    }
}

/// Constructors for sender/receiver pairs.
pub struct EventChannel;

impl EventChannel {
    /// Create a new unbounded event channel.
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }
}

/// A sender whose events go nowhere.
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = EventChannel::new();
    sender
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{IndexEvent, IndexProgress};
    use std::thread;

    #[test]
    fn events_can_be_sent_across_threads() {
        let (sender, receiver) = EventChannel::new();

        let handle = thread::spawn(move || {
            sender.send(Event::Index(IndexEvent::EntryIndexed(IndexProgress {
                indexed: 25,
                skipped: 0,
                entry_name: "a.png".to_string(),
            })));
        });

        handle.join().unwrap();

        match receiver.recv().unwrap() {
            Event::Index(IndexEvent::EntryIndexed(p)) => assert_eq!(p.indexed, 25),
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn lines_end_when_senders_drop() {
        let (sender, receiver) = EventChannel::new();
        sender.send(Event::Index(IndexEvent::Cancelled));
        drop(sender);

        let lines: Vec<_> = receiver.lines().collect();
        assert_eq!(lines, vec!["Indexing cancelled".to_string()]);
    }

    #[test]
    fn null_sender_does_not_panic() {
        null_sender().send(Event::Index(IndexEvent::Cancelled));
    }
}
