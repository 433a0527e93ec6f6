//! Playback session core for the pod media console: one arbiter over the
//! single audio sink, an observable now-playing session, non-blocking
//! cover art, and the live-chat feed.
//!
//! The render and navigation layers are external: they deliver
//! `SelectionAction`s to [`console::Console`] and read
//! `NowPlayingSnapshot` / chat entries back every frame.

pub mod arbiter;
pub mod backend;
pub mod chat;
pub mod console;
pub mod cover;
pub mod remote;
pub mod session;
pub mod tasks;
