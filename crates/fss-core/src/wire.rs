//! FSS wire format — on-wire types for the sentence-search protocol.
//!
//! These types ARE the protocol. Every field, every size, and the
//! not-found sentinel are part of the wire contract shared with the
//! reference peer. Read docs/wire-format.md before modifying.
//!
//! All types are #[repr(C)] with fixed-endian integer fields and use
//! zerocopy derives for safe, allocation-free serialization. There is no
//! unsafe code in this module.

use std::fmt;
use std::str::FromStr;

use static_assertions::assert_eq_size;
use zerocopy::byteorder::{NetworkEndian, U16, U32};
use zerocopy::{AsBytes, FromBytes, FromZeroes};

// ── Constants ─────────────────────────────────────────────────────────────────

/// EtherType identifying FSS payloads inside an Ethernet frame.
pub const ETHERTYPE_FSS: u16 = 0x1234;

/// Capacity of the sentence buffer. `length` never exceeds this; encoding
/// truncates longer input.
pub const SENTENCE_MAX: usize = 256;

/// Size of an encoded FSS frame: three u32 fields plus the sentence buffer.
pub const FRAME_LEN: usize = 12 + SENTENCE_MAX;

/// Wire value of `first_find_pos` meaning "no occurrence".
/// Deliberately outside the 0..=255 range of real offsets. Decoded to
/// `None` by [`FssFrame::first_find`]; never handed out as an index.
pub const NOT_FOUND: u32 = 2048;

/// Single padding byte (an ASCII space) the reference encoding appends
/// after the frame to satisfy minimum-frame-size padding. Emitted for
/// byte compatibility; receivers ignore everything past the frame.
pub const FRAME_TRAILER: u8 = 0x20;

/// Size of the Ethernet header carried ahead of every FSS frame.
pub const ETHERNET_HEADER_LEN: usize = 14;

// ── Hardware addresses ────────────────────────────────────────────────────────

/// A 48-bit IEEE 802 hardware address.
///
/// Rendered and parsed in the usual `aa:bb:cc:dd:ee:ff` form for config
/// files and logs.
#[derive(Clone, Copy, PartialEq, Eq, AsBytes, FromBytes, FromZeroes)]
#[repr(transparent)]
pub struct MacAddr(pub [u8; 6]);

assert_eq_size!(MacAddr, [u8; 6]);

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl fmt::Debug for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacAddr({self})")
    }
}

/// Error parsing a hardware address from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid MAC address '{0}': expected six ':'-separated hex octets")]
pub struct MacParseError(String);

impl FromStr for MacAddr {
    type Err = MacParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 6];
        let mut parts = s.split(':');
        for slot in octets.iter_mut() {
            let part = parts.next().ok_or_else(|| MacParseError(s.to_string()))?;
            // from_str_radix alone also accepts "000" and "+f"; an octet
            // here is exactly two hex digits.
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(MacParseError(s.to_string()));
            }
            *slot = u8::from_str_radix(part, 16).map_err(|_| MacParseError(s.to_string()))?;
        }
        if parts.next().is_some() {
            return Err(MacParseError(s.to_string()));
        }
        Ok(MacAddr(octets))
    }
}

// ── Link envelope ─────────────────────────────────────────────────────────────

/// Ethernet II header wrapped around every FSS frame.
///
/// Wire size: 14 bytes — destination(6) + source(6) + ethertype(2).
#[derive(Debug, Clone, AsBytes, FromBytes, FromZeroes)]
#[repr(C)]
pub struct EthernetHeader {
    /// Destination hardware address.
    pub dst: MacAddr,
    /// Source hardware address (the sending interface).
    pub src: MacAddr,
    /// Payload protocol. Always [`ETHERTYPE_FSS`] for frames built here.
    pub ethertype: U16<NetworkEndian>,
}

assert_eq_size!(EthernetHeader, [u8; ETHERNET_HEADER_LEN]);

impl EthernetHeader {
    /// Header for an FSS frame from `src` to `dst`.
    pub fn fss(dst: MacAddr, src: MacAddr) -> Self {
        Self {
            dst,
            src,
            ethertype: U16::new(ETHERTYPE_FSS),
        }
    }

    /// Split a raw frame into its envelope and payload.
    ///
    /// Returns `None` when the buffer is shorter than a header or the
    /// payload protocol is not FSS.
    pub fn split_fss(frame: &[u8]) -> Option<(EthernetHeader, &[u8])> {
        let header = EthernetHeader::read_from_prefix(frame)?;
        if header.ethertype.get() != ETHERTYPE_FSS {
            return None;
        }
        Some((header, &frame[ETHERNET_HEADER_LEN..]))
    }
}

// ── FSS frame ─────────────────────────────────────────────────────────────────

/// The FSS frame — the single payload type of the protocol.
///
/// A request carries a sentence and zeroed result fields; a response
/// echoes the sentence back with the search result filled in. The frame
/// is constructed fresh per request and per response and has no identity
/// across exchanges.
///
/// Wire size: 268 bytes, always — the sentence buffer is fixed and
/// zero-padded past `length`.
#[derive(Clone, AsBytes, FromBytes, FromZeroes)]
#[repr(C)]
pub struct FssFrame {
    /// Byte offset of the first occurrence of the target phrase, or
    /// [`NOT_FOUND`]. Meaningful only in responses; requests carry 0.
    pub first_find_pos: U32<NetworkEndian>,

    /// Number of non-overlapping occurrences found.
    /// Meaningful only in responses; requests carry 0.
    pub find_count: U32<NetworkEndian>,

    /// Number of valid bytes in `sentence`. Never exceeds [`SENTENCE_MAX`];
    /// a received frame violating that is rejected by [`FssFrame::decode`].
    pub length: U32<NetworkEndian>,

    /// The sentence bytes. Content past `length` is padding, zero by
    /// convention, and carries no meaning.
    pub sentence: [u8; SENTENCE_MAX],
}

assert_eq_size!(FssFrame, [u8; FRAME_LEN]);

impl FssFrame {
    /// Encode a request. Input longer than [`SENTENCE_MAX`] bytes is
    /// truncated to its first [`SENTENCE_MAX`] bytes; this never fails.
    pub fn request(sentence: &[u8]) -> Self {
        Self::encode(sentence, 0, 0)
    }

    /// Encode a response echoing `sentence`, with the search result
    /// filled in. `first = None` emits the [`NOT_FOUND`] sentinel.
    pub fn reply(sentence: &[u8], count: u32, first: Option<u32>) -> Self {
        Self::encode(sentence, first.unwrap_or(NOT_FOUND), count)
    }

    fn encode(sentence: &[u8], first_find_pos: u32, find_count: u32) -> Self {
        let len = sentence.len().min(SENTENCE_MAX);
        let mut buf = [0u8; SENTENCE_MAX];
        buf[..len].copy_from_slice(&sentence[..len]);
        FssFrame {
            first_find_pos: U32::new(first_find_pos),
            find_count: U32::new(find_count),
            length: U32::new(len as u32),
            sentence: buf,
        }
    }

    /// Decode a frame from the payload of a received Ethernet frame.
    ///
    /// Anything past the first [`FRAME_LEN`] bytes (the trailer byte,
    /// link-level padding) is ignored. A short buffer or a `length` field
    /// violating the [`SENTENCE_MAX`] invariant fails without yielding
    /// partial field values.
    pub fn decode(buf: &[u8]) -> Result<FssFrame, FrameError> {
        let frame =
            FssFrame::read_from_prefix(buf).ok_or(FrameError::Truncated(buf.len()))?;
        let length = frame.length.get();
        if length as usize > SENTENCE_MAX {
            return Err(FrameError::LengthOutOfRange(length));
        }
        Ok(frame)
    }

    /// The valid sentence bytes: the first `length` of the buffer.
    pub fn sentence(&self) -> &[u8] {
        let len = (self.length.get() as usize).min(SENTENCE_MAX);
        &self.sentence[..len]
    }

    /// First-occurrence offset with the sentinel decoded away.
    ///
    /// Callers never see [`NOT_FOUND`] as a number; a missing match is an
    /// absent value, not an offset.
    pub fn first_find(&self) -> Option<u32> {
        match self.first_find_pos.get() {
            NOT_FOUND => None,
            pos => Some(pos),
        }
    }

    /// The encoded frame plus the single trailer byte, ready to transmit.
    pub fn wire_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(FRAME_LEN + 1);
        out.extend_from_slice(self.as_bytes());
        out.push(FRAME_TRAILER);
        out
    }
}

impl fmt::Debug for FssFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FssFrame")
            .field("first_find_pos", &self.first_find_pos.get())
            .field("find_count", &self.find_count.get())
            .field("length", &self.length.get())
            .field("sentence", &String::from_utf8_lossy(self.sentence()))
            .finish()
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Errors that can arise when interpreting received FSS bytes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("frame truncated: {0} bytes, need {}", FRAME_LEN)]
    Truncated(usize),

    #[error("length field {0} exceeds sentence capacity {}", SENTENCE_MAX)]
    LengthOutOfRange(u32),
}

// ── Tests ─────────────────────────────────────────────────────────────────────
