//! Stand-in for a stopped Minecraft server: answers the server list with a
//! sleeping or starting MOTD and turns login attempts into wake-up
//! notifications.

pub mod config;
pub mod connection;
pub mod drowse;
pub mod error;
pub mod logging;
pub mod motd;
pub mod notify;
pub mod threat;
pub mod utils;

pub use drowse::Drowse;
