//! Raw link-layer socket bound to one interface.
//!
//! AF_PACKET/SOCK_RAW with the protocol field set to the FSS EtherType,
//! so the kernel only delivers FSS-tagged frames. Frames are sent and
//! received whole, Ethernet header included. Opening one requires
//! CAP_NET_RAW.

use std::io::{self, Read};
use std::mem;
use std::time::Duration;

use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use zerocopy::AsBytes;

use fss_core::wire::{EthernetHeader, MacAddr, ETHERNET_HEADER_LEN, ETHERTYPE_FSS};

/// Largest frame accepted off the wire: standard Ethernet MTU plus
/// header. FSS frames are far smaller; the slack absorbs link padding.
const MAX_FRAME: usize = 1514;

/// Errors acquiring or configuring the link socket.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("interface '{0}' not found")]
    InterfaceNotFound(String),

    #[error("failed to open raw packet socket (CAP_NET_RAW required): {0}")]
    Open(#[source] io::Error),

    #[error("failed to bind packet socket to '{name}': {source}")]
    Bind { name: String, source: io::Error },

    #[error("failed to read local hardware address: {0}")]
    LocalAddr(#[source] io::Error),
}

/// A frame taken off the wire, split into envelope fields and payload.
#[derive(Debug)]
pub struct Received {
    /// Sender hardware address from the Ethernet header.
    pub src: MacAddr,
    /// Destination hardware address from the Ethernet header.
    pub dst: MacAddr,
    /// Everything after the 14-byte header: FSS frame plus any padding.
    pub payload: Vec<u8>,
}

/// Raw packet socket bound to one interface, filtered to the FSS
/// EtherType.
///
/// The descriptor is owned by this struct; dropping it releases the
/// socket on every exit path, early returns included.
#[derive(Debug)]
pub struct PacketSocket {
    socket: Socket,
    interface: String,
    mac: MacAddr,
}

impl PacketSocket {
    /// Open a packet socket and bind it to `interface`.
    pub fn open(interface: &str) -> Result<Self, LinkError> {
        let index = if_index(interface)?;

        // The protocol field of AF_PACKET sockets is in network byte order.
        let protocol = Protocol::from(ETHERTYPE_FSS.to_be() as libc::c_int);
        let socket =
            Socket::new(Domain::PACKET, Type::RAW, Some(protocol)).map_err(LinkError::Open)?;

        socket.bind(&link_addr(index)).map_err(|source| LinkError::Bind {
            name: interface.to_string(),
            source,
        })?;

        let mac = local_mac(&socket).map_err(LinkError::LocalAddr)?;

        tracing::debug!(interface, mac = %mac, "packet socket bound");

        Ok(Self {
            socket,
            interface: interface.to_string(),
            mac,
        })
    }

    /// Hardware address of the bound interface.
    pub fn mac(&self) -> MacAddr {
        self.mac
    }

    /// Name of the bound interface.
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Bound on blocking receives. `None` blocks forever.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.socket.set_read_timeout(timeout)
    }

    /// Transmit `payload` to `dst`, prepending the Ethernet header.
    pub fn send_to(&self, dst: MacAddr, payload: &[u8]) -> io::Result<()> {
        let header = EthernetHeader::fss(dst, self.mac);
        let mut frame = Vec::with_capacity(ETHERNET_HEADER_LEN + payload.len());
        frame.extend_from_slice(header.as_bytes());
        frame.extend_from_slice(payload);

        let sent = self.socket.send(&frame)?;
        if sent != frame.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "frame transmitted partially",
            ));
        }
        Ok(())
    }

    /// Block for the next frame on the interface.
    ///
    /// The kernel already filters by EtherType. A frame that still fails
    /// the envelope check (too short for a header, foreign protocol)
    /// yields `InvalidData` rather than partial envelope fields; callers
    /// skip those and keep receiving.
    pub fn recv(&self) -> io::Result<Received> {
        let mut buf = [0u8; MAX_FRAME];
        let n = (&self.socket).read(&mut buf)?;

        match EthernetHeader::split_fss(&buf[..n]) {
            Some((header, payload)) => Ok(Received {
                src: header.src,
                dst: header.dst,
                payload: payload.to_vec(),
            }),
            None => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "frame too short for an Ethernet envelope",
            )),
        }
    }
}

// ── Address plumbing ──────────────────────────────────────────────────────────

/// OS interface index for a named network interface.
fn if_index(name: &str) -> Result<u32, LinkError> {
    // A NUL inside the name can never match a real interface.
    let name_cstr = std::ffi::CString::new(name)
        .map_err(|_| LinkError::InterfaceNotFound(name.to_string()))?;
    let index = unsafe { libc::if_nametoindex(name_cstr.as_ptr()) };
    if index == 0 {
        return Err(LinkError::InterfaceNotFound(name.to_string()));
    }
    Ok(index)
}

/// sockaddr_ll for binding to one interface, FSS protocol only.
fn link_addr(index: u32) -> SockAddr {
    let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
    // SAFETY: sockaddr_ll fits within sockaddr_storage; unset fields stay zero.
    let sll = unsafe {
        &mut *(&mut storage as *mut libc::sockaddr_storage).cast::<libc::sockaddr_ll>()
    };
    sll.sll_family = libc::AF_PACKET as libc::sa_family_t;
    sll.sll_protocol = ETHERTYPE_FSS.to_be();
    sll.sll_ifindex = index as libc::c_int;

    // SAFETY: storage holds a valid sockaddr_ll of exactly this length.
    unsafe { SockAddr::new(storage, mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t) }
}

/// Hardware address the socket got bound to, via getsockname.
fn local_mac(socket: &Socket) -> io::Result<MacAddr> {
    let addr = socket.local_addr()?;
    // SAFETY: local_addr on an AF_PACKET socket yields a sockaddr_ll.
    let sll = unsafe { &*addr.as_ptr().cast::<libc::sockaddr_ll>() };
    if sll.sll_halen as usize != 6 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "interface hardware address is not 48-bit",
        ));
    }
    let mut mac = [0u8; 6];
    mac.copy_from_slice(&sll.sll_addr[..6]);
    Ok(MacAddr(mac))
}
