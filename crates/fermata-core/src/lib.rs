//! The coordination core: one loop serializing keys, playback events,
//! timers, scans, downloads, radio fills, scrobbles, and remote control
//! into sequential state transitions.
//!
//! Embedders construct an [`state::App`] from a [`fermata_model::Config`]
//! and their [`state::Collaborators`], then hand it to [`runtime::run`]
//! together with the loop inbox. Everything inbound is a
//! [`message::Message`]; everything deferred is a [`command::Command`].

pub mod action;
pub mod bridge;
pub mod command;
pub mod input;
pub mod logging;
pub mod message;
pub mod policy;
pub mod popup;
pub mod runtime;
pub mod state;
pub mod transition;
pub mod update;

pub use action::Action;
pub use command::Command;
pub use message::{Feed, Message};
pub use state::{App, Collaborators};
pub use update::update;
