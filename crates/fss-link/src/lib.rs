//! fss-link — raw-socket transport, exchange client, and responder loop.

pub mod client;
pub mod responder;
pub mod socket;

pub use client::{ExchangeError, FssClient, SearchReply};
pub use responder::Responder;
pub use socket::{LinkError, PacketSocket};
