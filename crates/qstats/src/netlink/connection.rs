//! Request/response handling for qdisc dumps.

use bytes::BytesMut;

use super::builder::MessageBuilder;
use super::dump::{DumpCollector, DumpOptions, DumpOutcome};
use super::error::{Error, Result};
use super::message::{NLM_F_DUMP, NLM_F_REQUEST, NlMsgType};
use super::qdisc::QdiscStats;
use super::socket::NetlinkSocket;
use super::types::tc::TcMsg;
use crate::util::ifname::{self, NameCache};

/// A route netlink session.
///
/// Owns the socket and the sequence counter. Taking `&mut self` for each
/// exchange keeps a single request outstanding at a time.
pub struct Connection {
    socket: NetlinkSocket,
    seq: u32,
}

impl Connection {
    /// Open a new session.
    pub fn new() -> Result<Self> {
        Ok(Self {
            socket: NetlinkSocket::new()?,
            seq: 1,
        })
    }

    /// Get the underlying socket.
    pub fn socket(&self) -> &NetlinkSocket {
        &self.socket
    }

    fn next_seq(&mut self) -> u32 {
        let seq = self.seq;
        self.seq = self.seq.wrapping_add(1);
        seq
    }

    /// Dump qdiscs and return everything the kernel answered.
    ///
    /// A kernel error terminator is reported through
    /// [`DumpOutcome::end`], not as `Err`; use
    /// [`DumpOutcome::into_result`] to treat it as one.
    pub async fn dump_qdiscs(&mut self, options: &DumpOptions) -> Result<DumpOutcome> {
        let seq = self.next_seq();
        let mut request = qdisc_dump_request(options.get_ifindex());
        request.set_seq(seq);
        request.set_pid(self.socket.pid());

        tracing::debug!(seq, ifindex = options.get_ifindex(), "sending qdisc dump request");
        self.socket.send(&request.finish()).await?;

        let mut collector = DumpCollector::new(seq, options);
        while !collector.is_done() {
            let datagram = self.recv(options).await?;
            collector.feed(&datagram)?;
        }

        let mut outcome = collector.finish()?;
        if options.get_resolve_names() {
            let mut names = NameCache::new();
            for record in &mut outcome.records {
                let ifindex = record.identity.ifindex;
                if ifindex > 0 {
                    record.identity.dev = names.get(ifindex as u32);
                }
            }
        }

        tracing::debug!(
            seq,
            records = outcome.records.len(),
            rejected = outcome.rejected.len(),
            end = ?outcome.end,
            "qdisc dump complete"
        );
        Ok(outcome)
    }

    /// Get all qdiscs.
    pub async fn get_qdiscs(&mut self) -> Result<Vec<QdiscStats>> {
        self.dump_qdiscs(&DumpOptions::new()).await?.into_result()
    }

    /// Get the qdiscs of one interface, by name.
    pub async fn get_qdiscs_for(&mut self, dev: &str) -> Result<Vec<QdiscStats>> {
        let ifindex = ifname::name_to_index(dev)?;
        self.dump_qdiscs(&DumpOptions::new().ifindex(ifindex))
            .await?
            .into_result()
    }

    async fn recv(&self, options: &DumpOptions) -> Result<BytesMut> {
        let recv = self.socket.recv_datagram(options.get_buffer_floor());
        match options.get_timeout() {
            Some(timeout) => tokio::time::timeout(timeout, recv)
                .await
                .map_err(|_| Error::Timeout {
                    ms: timeout.as_millis() as u64,
                })?,
            None => recv.await,
        }
    }
}

/// Build an `RTM_GETQDISC` dump request.
///
/// With an interface index the kernel may limit the answer to that device;
/// older kernels ignore it, so callers filter as well.
pub fn qdisc_dump_request(ifindex: Option<u32>) -> MessageBuilder {
    let mut builder = MessageBuilder::new(NlMsgType::RTM_GETQDISC, NLM_F_REQUEST | NLM_F_DUMP);
    let tcmsg = TcMsg::new().with_ifindex(ifindex.unwrap_or(0) as i32);
    builder.append(&tcmsg);
    builder
}
