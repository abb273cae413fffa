//! Protocol layer for the portal publisher API

pub mod client;
pub mod transport;

pub use client::PortalClient;
pub use transport::Transport;
