//! Packet-stream source: Ethernet frame decoding and the Linux AF_PACKET
//! capture socket.
//!
//! Decoding requires a network-layer header; frames without one (ARP etc.)
//! are skipped without emitting an observation. Transport ports default to 0
//! when no TCP/UDP header is present, and payloads are lossy-decoded text.

use super::PacketObservation;
#[cfg(target_os = "linux")]
use super::SourceError;

/// Outcome of one capture poll.
#[derive(Debug)]
pub enum Capture {
    /// A raw Ethernet frame
    Frame(Vec<u8>),
    /// Nothing arrived within the poll timeout; caller may check its stop flag
    Idle,
    /// Stream exhausted
    End,
}

/// Decode one Ethernet frame into an observation. `None` when the frame has
/// no network layer or cannot be sliced.
pub fn decode_frame(interface: &str, frame: &[u8]) -> Option<PacketObservation> {
    let sliced = match etherparse::SlicedPacket::from_ethernet(frame) {
        Ok(s) => s,
        Err(e) => {
            tracing::debug!(interface, error = %e, "unsliceable frame, skipping");
            return None;
        }
    };

    let (src_addr, dst_addr) = match &sliced.net {
        Some(etherparse::NetSlice::Ipv4(ipv4)) => {
            let header = ipv4.header();
            (
                std::net::IpAddr::from(header.source_addr()),
                std::net::IpAddr::from(header.destination_addr()),
            )
        }
        Some(etherparse::NetSlice::Ipv6(ipv6)) => {
            let header = ipv6.header();
            (
                std::net::IpAddr::from(header.source_addr()),
                std::net::IpAddr::from(header.destination_addr()),
            )
        }
        _ => return None,
    };

    let (src_port, dst_port, payload) = match &sliced.transport {
        Some(etherparse::TransportSlice::Tcp(tcp)) => (
            tcp.source_port(),
            tcp.destination_port(),
            lossy_payload(tcp.payload()),
        ),
        Some(etherparse::TransportSlice::Udp(udp)) => (
            udp.source_port(),
            udp.destination_port(),
            lossy_payload(udp.payload()),
        ),
        _ => (0, 0, None),
    };

    Some(PacketObservation::new(
        interface, src_addr, src_port, dst_addr, dst_port, payload,
    ))
}

fn lossy_payload(bytes: &[u8]) -> Option<String> {
    if bytes.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// AF_PACKET raw socket bound to one interface. Reads use a one-second
/// receive timeout so the capture loop can observe the stop flag.
#[cfg(target_os = "linux")]
pub struct AfPacketSource {
    interface: String,
    fd: std::os::unix::io::RawFd,
    buf: Vec<u8>,
}

#[cfg(target_os = "linux")]
impl AfPacketSource {
    const SNAPLEN: usize = 65_535;

    pub fn open(interface: &str) -> Result<Self, SourceError> {
        let capture_err = |reason: String| SourceError {
            interface: interface.to_string(),
            reason,
        };

        let c_name = std::ffi::CString::new(interface)
            .map_err(|_| capture_err("interface name contains NUL".to_string()))?;

        // SAFETY: plain libc socket setup; fd is closed on every error path.
        unsafe {
            let protocol = (libc::ETH_P_ALL as u16).to_be() as i32;
            let fd = libc::socket(libc::AF_PACKET, libc::SOCK_RAW, protocol);
            if fd < 0 {
                return Err(capture_err(std::io::Error::last_os_error().to_string()));
            }

            let ifindex = libc::if_nametoindex(c_name.as_ptr());
            if ifindex == 0 {
                let e = std::io::Error::last_os_error();
                libc::close(fd);
                return Err(capture_err(format!("no such interface: {e}")));
            }

            let mut addr: libc::sockaddr_ll = std::mem::zeroed();
            addr.sll_family = libc::AF_PACKET as u16;
            addr.sll_protocol = (libc::ETH_P_ALL as u16).to_be();
            addr.sll_ifindex = ifindex as i32;
            if libc::bind(
                fd,
                &addr as *const libc::sockaddr_ll as *const libc::sockaddr,
                std::mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            ) < 0
            {
                let e = std::io::Error::last_os_error();
                libc::close(fd);
                return Err(capture_err(format!("bind failed: {e}")));
            }

            let tv = libc::timeval {
                tv_sec: 1,
                tv_usec: 0,
            };
            if libc::setsockopt(
                fd,
                libc::SOL_SOCKET,
                libc::SO_RCVTIMEO,
                &tv as *const libc::timeval as *const libc::c_void,
                std::mem::size_of::<libc::timeval>() as libc::socklen_t,
            ) < 0
            {
                let e = std::io::Error::last_os_error();
                libc::close(fd);
                return Err(capture_err(format!("setsockopt failed: {e}")));
            }

            Ok(Self {
                interface: interface.to_string(),
                fd,
                buf: vec![0u8; Self::SNAPLEN],
            })
        }
    }
}

#[cfg(target_os = "linux")]
impl super::PacketSource for AfPacketSource {
    fn interface(&self) -> &str {
        &self.interface
    }

    fn next_frame(&mut self) -> Result<Capture, SourceError> {
        // SAFETY: buf outlives the call and len matches its capacity.
        let n = unsafe {
            libc::recv(
                self.fd,
                self.buf.as_mut_ptr() as *mut libc::c_void,
                self.buf.len(),
                0,
            )
        };
        if n < 0 {
            let e = std::io::Error::last_os_error();
            return match e.kind() {
                std::io::ErrorKind::WouldBlock
                | std::io::ErrorKind::TimedOut
                | std::io::ErrorKind::Interrupted => Ok(Capture::Idle),
                _ => Err(SourceError {
                    interface: self.interface.clone(),
                    reason: e.to_string(),
                }),
            };
        }
        if n == 0 {
            return Ok(Capture::End);
        }
        Ok(Capture::Frame(self.buf[..n as usize].to_vec()))
    }
}

#[cfg(target_os = "linux")]
impl Drop for AfPacketSource {
    fn drop(&mut self) {
        // SAFETY: fd is owned by this struct and closed exactly once.
        unsafe {
            libc::close(self.fd);
        }
    }
}
