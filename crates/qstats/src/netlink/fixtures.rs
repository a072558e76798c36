//! Synthetic kernel responses for unit tests.
//!
//! The raw fixture mirrors what `tc -s qdisc` dumps for a pfifo_fast root
//! on a little-endian host; everything else is assembled with
//! [`MessageBuilder`] so it stays native endian.

use super::builder::MessageBuilder;
use super::message::{NLM_F_MULTI, NLM_F_REQUEST, NLMSG_HDRLEN, NlMsgHdr, NlMsgType};
use super::types::tc::{
    GnetStatsBasic, GnetStatsQueue, GnetStatsRateEst, GnetStatsRateEst64, TcMsg, TcStats, tca,
    tca_stats,
};

/// RTM_NEWQDISC payload: pfifo_fast, ifindex 2, handle 1:, parent root,
/// bytes=1000 packets=10 drops=2, rate64 500/5.
#[cfg(target_endian = "little")]
pub const PFIFO_FAST_ROOT: &[u8] = &[
    // tcmsg
    0x00, 0x00, 0x00, 0x00, // family, pad1, pad2
    0x02, 0x00, 0x00, 0x00, // ifindex = 2
    0x00, 0x00, 0x01, 0x00, // handle = 0x00010000
    0xff, 0xff, 0xff, 0xff, // parent = TC_H_ROOT
    0x01, 0x00, 0x00, 0x00, // info
    // TCA_KIND "pfifo_fast"
    0x0f, 0x00, 0x01, 0x00, b'p', b'f', b'i', b'f', b'o', b'_', b'f', b'a', b's', b't', 0x00,
    0x00, // pad
    // TCA_STATS2 (nested), 4 + 20 + 24 + 20 = 68
    0x44, 0x00, 0x07, 0x80,
    // TCA_STATS_BASIC
    0x14, 0x00, 0x01, 0x00, //
    0xe8, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // bytes = 1000
    0x0a, 0x00, 0x00, 0x00, // packets = 10
    0x00, 0x00, 0x00, 0x00, // pad
    // TCA_STATS_QUEUE
    0x18, 0x00, 0x03, 0x00, //
    0x00, 0x00, 0x00, 0x00, // qlen
    0x00, 0x00, 0x00, 0x00, // backlog
    0x02, 0x00, 0x00, 0x00, // drops = 2
    0x00, 0x00, 0x00, 0x00, // requeues
    0x00, 0x00, 0x00, 0x00, // overlimits
    // TCA_STATS_RATE_EST64
    0x14, 0x00, 0x05, 0x00, //
    0xf4, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // bps = 500
    0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // pps = 5
];

/// Builder for a qdisc message payload (tcmsg + attributes).
#[derive(Debug, Clone, Default)]
pub struct QdiscMsg {
    header: TcMsg,
    kind: Option<String>,
    stats2: Vec<(u16, Vec<u8>)>,
    stats2_raw: Option<Vec<u8>>,
    legacy: Option<TcStats>,
    extra: Vec<(u16, Vec<u8>)>,
}

impl QdiscMsg {
    pub fn new(kind: &str, ifindex: i32, handle: u32, parent: u32) -> Self {
        Self {
            header: TcMsg::new()
                .with_ifindex(ifindex)
                .with_handle(handle)
                .with_parent(parent),
            kind: Some(kind.to_string()),
            ..Default::default()
        }
    }

    pub fn without_kind(mut self) -> Self {
        self.kind = None;
        self
    }

    pub fn basic(self, bytes: u64, packets: u32) -> Self {
        let basic = GnetStatsBasic {
            bytes,
            packets,
            pad: 0,
        };
        self.stats2_entry(tca_stats::BASIC, zerocopy::IntoBytes::as_bytes(&basic))
    }

    pub fn queue(self, queue: GnetStatsQueue) -> Self {
        self.stats2_entry(tca_stats::QUEUE, zerocopy::IntoBytes::as_bytes(&queue))
    }

    pub fn rate32(self, bps: u32, pps: u32) -> Self {
        let rate = GnetStatsRateEst { bps, pps };
        self.stats2_entry(tca_stats::RATE_EST, zerocopy::IntoBytes::as_bytes(&rate))
    }

    pub fn rate64(self, bps: u64, pps: u64) -> Self {
        let rate = GnetStatsRateEst64 { bps, pps };
        self.stats2_entry(tca_stats::RATE_EST64, zerocopy::IntoBytes::as_bytes(&rate))
    }

    /// Add an arbitrary entry to the `TCA_STATS2` container.
    pub fn stats2_entry(mut self, kind: u16, data: &[u8]) -> Self {
        self.stats2.push((kind, data.to_vec()));
        self
    }

    /// Use `data` verbatim as the `TCA_STATS2` payload.
    pub fn stats2_raw(mut self, data: &[u8]) -> Self {
        self.stats2_raw = Some(data.to_vec());
        self
    }

    pub fn legacy(mut self, stats: TcStats) -> Self {
        self.legacy = Some(stats);
        self
    }

    pub fn attr(mut self, kind: u16, data: &[u8]) -> Self {
        self.extra.push((kind, data.to_vec()));
        self
    }

    fn build_into(&self, b: &mut MessageBuilder) {
        b.append(&self.header);
        if let Some(kind) = &self.kind {
            b.append_attr_str(tca::KIND, kind);
        }
        if let Some(legacy) = &self.legacy {
            b.append_attr_struct(tca::STATS, legacy);
        }
        if let Some(raw) = &self.stats2_raw {
            b.append_attr(tca::STATS2, raw);
        } else if !self.stats2.is_empty() {
            let nest = b.nest_start(tca::STATS2);
            for (kind, data) in &self.stats2 {
                b.append_attr(*kind, data);
            }
            b.nest_end(nest);
        }
        for (kind, data) in &self.extra {
            b.append_attr(*kind, data);
        }
    }

    /// The message payload (tcmsg and attributes), without nlmsghdr.
    pub fn payload(&self) -> Vec<u8> {
        let mut b = MessageBuilder::new(NlMsgType::RTM_NEWQDISC, 0);
        self.build_into(&mut b);
        b.finish()[NLMSG_HDRLEN..].to_vec()
    }

    /// A complete RTM_NEWQDISC dump message.
    pub fn message(&self, seq: u32) -> Vec<u8> {
        self.message_with_flags(seq, NLM_F_MULTI)
    }

    pub fn message_with_flags(&self, seq: u32, flags: u16) -> Vec<u8> {
        let mut b = MessageBuilder::new(NlMsgType::RTM_NEWQDISC, flags);
        b.set_seq(seq);
        self.build_into(&mut b);
        b.finish()
    }
}

/// A message with an arbitrary type and body.
pub fn raw_msg(msg_type: u16, seq: u32, body: &[u8]) -> Vec<u8> {
    let mut b = MessageBuilder::new(msg_type, NLM_F_MULTI);
    b.set_seq(seq);
    b.append_bytes(body);
    b.finish()
}

/// NLMSG_DONE terminating a dump.
pub fn done_msg(seq: u32) -> Vec<u8> {
    raw_msg(NlMsgType::DONE, seq, &0i32.to_ne_bytes())
}

/// NLMSG_ERROR carrying `code` (negative errno) and the echoed request header.
pub fn error_msg(seq: u32, code: i32) -> Vec<u8> {
    let mut b = MessageBuilder::new(NlMsgType::ERROR, 0);
    b.set_seq(seq);
    b.append_bytes(&code.to_ne_bytes());
    b.append_bytes(NlMsgHdr::new(NlMsgType::RTM_GETQDISC, NLM_F_REQUEST).as_bytes());
    b.finish()
}

/// Concatenate messages into one datagram.
pub fn datagram(messages: &[Vec<u8>]) -> Vec<u8> {
    messages.concat()
}
