//! Reply event protocol: type + payload + envelope.
//!
//! This crate defines the wire shape of one bot reply and envelope injection.
//! It does not depend on databot. databot bridges its `Reply` into `ReplyEvent` and the server
//! calls `to_json`.

pub mod envelope;
pub mod event;

pub use envelope::{to_json, Envelope, EnvelopeState};
pub use event::ReplyEvent;
