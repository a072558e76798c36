//! Async rtnetlink socket.

use std::os::unix::io::{AsRawFd, RawFd};

use bytes::BytesMut;
use netlink_sys::{Socket, SocketAddr, protocols};
use tokio::io::Interest;
use tokio::io::unix::AsyncFd;

use super::error::{Error, Result};

/// Non-blocking `NETLINK_ROUTE` socket bound to a kernel-assigned port.
pub struct NetlinkSocket {
    fd: AsyncFd<Socket>,
    pid: u32,
}

impl NetlinkSocket {
    /// Open and bind a route socket.
    pub fn new() -> Result<Self> {
        let mut socket = Socket::new(protocols::NETLINK_ROUTE)?;
        socket.set_non_blocking(true)?;

        let mut addr = SocketAddr::new(0, 0);
        socket.bind(&addr)?;
        socket.get_address(&mut addr)?;
        let pid = addr.port_number();

        let fd = AsyncFd::new(socket)?;
        tracing::debug!(pid, "netlink socket bound");

        Ok(Self { fd, pid })
    }

    /// Local port ID.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Send a complete request.
    pub async fn send(&self, msg: &[u8]) -> Result<()> {
        loop {
            let mut guard = self.fd.ready(Interest::WRITABLE).await?;

            match guard.try_io(|inner| inner.get_ref().send(msg, 0)) {
                Ok(result) => {
                    result?;
                    return Ok(());
                }
                Err(_would_block) => continue,
            }
        }
    }

    /// Receive one whole datagram.
    ///
    /// The pending datagram is first peeked with `MSG_TRUNC` to learn its
    /// real size, then read into a buffer of at least `floor` bytes. Both
    /// calls happen under the same readiness guard.
    pub async fn recv_datagram(&self, floor: usize) -> Result<BytesMut> {
        loop {
            let mut guard = self.fd.ready(Interest::READABLE).await?;

            match guard.try_io(|inner| {
                let socket = inner.get_ref();
                let size = socket.recv(&mut Vec::<u8>::new(), libc::MSG_PEEK | libc::MSG_TRUNC)?;
                let capacity = size.max(floor);

                let mut buf = BytesMut::with_capacity(capacity);
                let n = socket.recv(&mut buf, 0)?;
                Ok((size, n, buf))
            }) {
                Ok(result) => {
                    let (size, n, buf) = result?;
                    if n > buf.len() {
                        return Err(Error::Truncated {
                            expected: n,
                            actual: buf.len(),
                        });
                    }
                    tracing::trace!(probed = size, received = n, "datagram");
                    return Ok(buf);
                }
                Err(_would_block) => continue,
            }
        }
    }
}

impl AsRawFd for NetlinkSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.get_ref().as_raw_fd()
    }
}
