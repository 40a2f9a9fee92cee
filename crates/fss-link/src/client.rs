//! One-shot request/response exchange against an FSS responder.

use std::io;
use std::time::{Duration, Instant};

use fss_core::wire::{FrameError, FssFrame, MacAddr};

use crate::socket::{LinkError, PacketSocket, Received};

/// Errors from a single exchange.
///
/// None of these end the caller's session; the next exchange starts from
/// a clean slate on the same socket.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    /// The request never made it onto the wire.
    #[error("transmit failed: {0}")]
    Transmit(#[source] io::Error),

    /// No reply arrived within the deadline.
    #[error("no response within {0:?}")]
    NoResponse(Duration),

    /// A reply arrived but its payload is not a decodable FSS frame.
    #[error("reply is not a valid FSS frame: {0}")]
    NoValidHeader(#[from] FrameError),

    /// Receiving failed for a reason other than the deadline.
    #[error("receive failed: {0}")]
    Receive(#[source] io::Error),
}

/// Decoded result fields of a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReply {
    /// Non-overlapping occurrences the responder found.
    pub find_count: u32,
    /// Byte offset of the first occurrence. `None` when the responder
    /// reported the not-found sentinel.
    pub first_find: Option<u32>,
    /// Sentence echoed back by the responder.
    pub sentence: Vec<u8>,
}

impl SearchReply {
    fn from_frame(frame: &FssFrame) -> Self {
        Self {
            find_count: frame.find_count.get(),
            first_find: frame.first_find(),
            sentence: frame.sentence().to_vec(),
        }
    }
}

/// Client end of the protocol: one socket, one peer, one request in
/// flight at a time.
///
/// The socket is acquired once at construction and reused across
/// exchanges; dropping the client releases it.
pub struct FssClient {
    socket: PacketSocket,
    peer: MacAddr,
    timeout: Duration,
}

impl FssClient {
    /// Bind the link socket on `interface`, aimed at `peer`.
    pub fn open(interface: &str, peer: MacAddr, timeout: Duration) -> Result<Self, LinkError> {
        let socket = PacketSocket::open(interface)?;
        tracing::info!(interface, peer = %peer, ?timeout, "exchange client ready");
        Ok(Self {
            socket,
            peer,
            timeout,
        })
    }

    /// Perform one request/response cycle: encode, transmit, block for
    /// the reply or the deadline. Single shot — no retransmit.
    ///
    /// Sentences longer than the sentence capacity are truncated by the
    /// codec. The wire carries no exchange identifier, so on a link with
    /// unrelated FSS traffic a stale frame addressed to us would be taken
    /// as the reply; the protocol assumes one clean point-to-point peer.
    pub fn exchange(&self, sentence: &[u8]) -> Result<SearchReply, ExchangeError> {
        let request = FssFrame::request(sentence);
        self.socket
            .send_to(self.peer, &request.wire_bytes())
            .map_err(ExchangeError::Transmit)?;
        tracing::debug!(
            peer = %self.peer,
            sentence_len = request.sentence().len(),
            "request sent"
        );

        let deadline = Instant::now() + self.timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(ExchangeError::NoResponse(self.timeout));
            }
            // SO_RCVTIMEO of zero means block forever; never round down to it.
            self.socket
                .set_read_timeout(Some(remaining.max(Duration::from_millis(1))))
                .map_err(ExchangeError::Receive)?;

            let received = match self.socket.recv() {
                Ok(received) => received,
                Err(e) if timed_out(&e) => return Err(ExchangeError::NoResponse(self.timeout)),
                Err(e) if e.kind() == io::ErrorKind::InvalidData => continue,
                Err(e) => return Err(ExchangeError::Receive(e)),
            };

            // Unrelated traffic the tap still delivers is not our reply.
            if !addressed_to(&received, self.socket.mac()) {
                tracing::trace!(src = %received.src, dst = %received.dst, "skipping frame for another station");
                continue;
            }

            let frame = FssFrame::decode(&received.payload)?;
            tracing::debug!(
                peer = %received.src,
                find_count = frame.find_count.get(),
                first_find = ?frame.first_find(),
                "reply received"
            );
            return Ok(SearchReply::from_frame(&frame));
        }
    }
}

/// True when a received frame is destined for the station with MAC `us`.
fn addressed_to(received: &Received, us: MacAddr) -> bool {
    received.dst == us
}

/// SO_RCVTIMEO expiry surfaces as WouldBlock on Linux, TimedOut on some
/// other unixes. Treat both as the deadline.
fn timed_out(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}
