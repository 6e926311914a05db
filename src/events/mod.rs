//! # Events Module
//!
//! Progress reporting for front ends.
//!
//! ## Design
//! The engine emits events through channels, so a CLI spinner, a GUI log
//! pane or a tray notification can all follow an indexing pass. Every event
//! also renders as a single human-readable line.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! let worker = std::thread::spawn(move || {
//!     Indexer::new(store).events(sender).index(&source)
//! });
//!
//! for line in receiver.lines() {
//!     println!("{line}");
//! }
//! let summary = worker.join().unwrap()?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
