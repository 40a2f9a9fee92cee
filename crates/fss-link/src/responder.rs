//! The serving side of the protocol: decode, scan, reply.

use fss_core::search::find_occurrences;
use fss_core::wire::{FssFrame, MacAddr};

use crate::socket::{LinkError, PacketSocket};

/// Serves phrase-search requests on one interface.
///
/// Single-threaded: requests are handled one at a time on the calling
/// thread, which is all the one-request-in-flight protocol needs.
pub struct Responder {
    socket: PacketSocket,
    phrase: Vec<u8>,
}

impl Responder {
    /// Bind the link socket on `interface`, searching for `phrase`.
    pub fn open(interface: &str, phrase: &[u8]) -> Result<Self, LinkError> {
        let socket = PacketSocket::open(interface)?;
        Ok(Self {
            socket,
            phrase: phrase.to_vec(),
        })
    }

    /// Hardware address of the serving interface — the address clients
    /// must be pointed at.
    pub fn mac(&self) -> MacAddr {
        self.socket.mac()
    }

    /// Serve forever. Per-frame failures are logged and skipped; nothing
    /// arriving on the wire can stop the loop.
    pub fn run(&self) -> ! {
        tracing::info!(
            interface = self.socket.interface(),
            mac = %self.socket.mac(),
            phrase = %String::from_utf8_lossy(&self.phrase),
            "responder serving"
        );

        loop {
            let received = match self.socket.recv() {
                Ok(received) => received,
                Err(e) => {
                    tracing::warn!(error = %e, "recv failed");
                    continue;
                }
            };

            if received.dst != self.socket.mac() {
                tracing::trace!(src = %received.src, dst = %received.dst, "skipping frame for another station");
                continue;
            }

            let request = match FssFrame::decode(&received.payload) {
                Ok(frame) => frame,
                Err(e) => {
                    let shown = received.payload.len().min(16);
                    tracing::debug!(
                        src = %received.src,
                        error = %e,
                        prefix = %hex::encode(&received.payload[..shown]),
                        "dropping undecodable payload"
                    );
                    continue;
                }
            };

            let reply = build_reply(&request, &self.phrase);
            tracing::info!(
                peer = %received.src,
                sentence_len = request.sentence().len(),
                find_count = reply.find_count.get(),
                first_find = ?reply.first_find(),
                "request served"
            );

            if let Err(e) = self.socket.send_to(received.src, &reply.wire_bytes()) {
                tracing::warn!(peer = %received.src, error = %e, "reply transmit failed");
            }
        }
    }
}

/// Build the reply for one request: scan the sentence for the phrase,
/// echo the sentence back with the count and first offset filled in.
pub fn build_reply(request: &FssFrame, phrase: &[u8]) -> FssFrame {
    let hits = find_occurrences(request.sentence(), phrase);
    FssFrame::reply(request.sentence(), hits.count, hits.first)
}
