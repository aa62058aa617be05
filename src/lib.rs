//! Music-library hygiene: artist poster repair for a Plex-style media server.

pub mod client;
pub mod detect;
pub mod generate;
pub mod models;
pub mod pathmap;
pub mod progress;
pub mod rank;
pub mod repair;
pub mod report;
pub mod resolve;
pub mod verify;
