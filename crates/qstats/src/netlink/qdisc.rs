//! Qdisc records and statistics decoding.
//!
//! A qdisc dump message carries a `tcmsg` header followed by attributes.
//! The kind is in `TCA_KIND`. Counters live either in the nested
//! `TCA_STATS2` container (basic, queue and rate estimator entries) or, on
//! old kernels, only in the flat legacy `TCA_STATS` struct. Modern kernels
//! send both.

use super::attr::{AttrIndex, get};
use super::error::{Error, Result};
use super::message::Frame;
use super::parse::split_tcmsg;
use super::types::tc::{
    GnetStatsBasic, GnetStatsQueue, GnetStatsRateEst, GnetStatsRateEst64, TcMsg, TcStats,
    tc_handle, tca, tca_stats,
};

/// One qdisc message: its `tcmsg` and the attribute region after it.
#[derive(Debug, Clone, Copy)]
pub struct QdiscRecord<'a> {
    /// Fixed header.
    pub header: TcMsg,
    /// Attribute bytes following the header.
    pub attrs: &'a [u8],
}

impl<'a> QdiscRecord<'a> {
    /// Split a message payload into header and attributes.
    pub fn parse(payload: &'a [u8]) -> Result<Self> {
        let (header, attrs) = split_tcmsg(payload)?;
        Ok(Self { header, attrs })
    }

    /// Parse the payload of a received frame.
    pub fn from_frame(frame: &Frame<'a>) -> Result<Self> {
        Self::parse(frame.payload)
    }
}

/// Where a qdisc is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
#[cfg_attr(feature = "output", serde(rename_all = "lowercase"))]
pub enum QdiscParent {
    /// Attached at the root of the device.
    Root,
    /// The ingress hook.
    Ingress,
    /// The clsact hook.
    Clsact,
    /// A class of another qdisc.
    Handle(u32),
}

impl QdiscParent {
    /// Classify a raw `tcm_parent` value.
    pub fn from_raw(parent: u32) -> Self {
        match parent {
            tc_handle::ROOT => Self::Root,
            tc_handle::INGRESS => Self::Ingress,
            tc_handle::CLSACT => Self::Clsact,
            other => Self::Handle(other),
        }
    }

    /// The raw `tcm_parent` value.
    pub fn raw(&self) -> u32 {
        match self {
            Self::Root => tc_handle::ROOT,
            Self::Ingress => tc_handle::INGRESS,
            Self::Clsact => tc_handle::CLSACT,
            Self::Handle(h) => *h,
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, Self::Root)
    }
}

impl std::fmt::Display for QdiscParent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Root => f.write_str("root"),
            Self::Ingress => f.write_str("ingress"),
            Self::Clsact => f.write_str("clsact"),
            Self::Handle(h) => write!(f, "parent {}", tc_handle::format(*h)),
        }
    }
}

/// What a qdisc is and where it sits.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct QdiscIdentity {
    /// Qdisc type name, e.g. `fq_codel`.
    pub kind: String,
    /// Interface index.
    pub ifindex: i32,
    /// Interface name, when the caller resolved it.
    #[cfg_attr(feature = "output", serde(skip_serializing_if = "Option::is_none"))]
    pub dev: Option<String>,
    /// Raw handle.
    pub handle: u32,
    /// Attachment point.
    pub parent: QdiscParent,
}

impl QdiscIdentity {
    /// Major number of the handle.
    pub fn major(&self) -> u16 {
        tc_handle::major(self.handle)
    }

    /// Handle formatted as `major:`.
    pub fn handle_str(&self) -> String {
        tc_handle::format(self.handle)
    }
}

/// Byte and packet counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct BasicStats {
    pub bytes: u64,
    pub packets: u32,
}

impl From<GnetStatsBasic> for BasicStats {
    fn from(s: GnetStatsBasic) -> Self {
        Self {
            bytes: s.bytes,
            packets: s.packets,
        }
    }
}

/// Queue state and drop counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct QueueStats {
    /// Current queue length in packets.
    pub qlen: u32,
    /// Backlog in bytes.
    pub backlog: u32,
    pub drops: u32,
    pub requeues: u32,
    pub overlimits: u32,
}

impl From<GnetStatsQueue> for QueueStats {
    fn from(q: GnetStatsQueue) -> Self {
        Self {
            qlen: q.qlen,
            backlog: q.backlog,
            drops: q.drops,
            requeues: q.requeues,
            overlimits: q.overlimits,
        }
    }
}

/// Width of the estimator counters a rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
#[cfg_attr(feature = "output", serde(rename_all = "lowercase"))]
pub enum RateWidth {
    Bits32,
    Bits64,
}

/// Which attribute a rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
#[cfg_attr(feature = "output", serde(rename_all = "lowercase"))]
pub enum RateSource {
    /// An estimator entry inside `TCA_STATS2`.
    Modern,
    /// The bps/pps fields of the legacy `TCA_STATS` struct.
    Legacy,
}

/// Rate estimate normalized to 64 bits.
///
/// `bps` is in bytes per second, as the kernel estimator reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct RateEstimate {
    pub bps: u64,
    pub pps: u64,
    pub width: RateWidth,
    pub source: RateSource,
}

impl RateEstimate {
    /// Rate in bits per second.
    pub fn bits_per_sec(&self) -> u64 {
        self.bps.saturating_mul(8)
    }
}

/// Statistics decoded from one qdisc record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct StatsSnapshot {
    pub basic: Option<BasicStats>,
    pub queue: Option<QueueStats>,
    /// Preferred rate: 64-bit estimator, then 32-bit, then legacy.
    pub rate: Option<RateEstimate>,
    /// The legacy struct, when the kernel sent one.
    #[cfg_attr(feature = "output", serde(skip_serializing_if = "Option::is_none"))]
    pub legacy: Option<TcStats>,
    /// Counters came only from the legacy struct.
    pub legacy_only: bool,
    /// The `TCA_STATS2` walk stopped on a malformed entry.
    #[cfg_attr(feature = "output", serde(skip_serializing_if = "std::ops::Not::not"))]
    pub truncated: bool,
}

impl StatsSnapshot {
    /// Check whether any statistics were present.
    pub fn is_empty(&self) -> bool {
        self.basic.is_none() && self.queue.is_none() && self.rate.is_none()
    }

    pub fn bytes(&self) -> u64 {
        self.basic.map(|b| b.bytes).unwrap_or(0)
    }

    pub fn packets(&self) -> u32 {
        self.basic.map(|b| b.packets).unwrap_or(0)
    }

    pub fn drops(&self) -> u32 {
        self.queue.map(|q| q.drops).unwrap_or(0)
    }

    /// Legacy rate, even when a modern one took precedence.
    pub fn legacy_rate(&self) -> Option<RateEstimate> {
        self.legacy.map(|l| RateEstimate {
            bps: l.bps as u64,
            pps: l.pps as u64,
            width: RateWidth::Bits32,
            source: RateSource::Legacy,
        })
    }

    fn apply_stats2(&mut self, data: &[u8]) {
        let nested = AttrIndex::parse(data, tca_stats::MAX);
        self.truncated = nested.is_truncated();

        self.basic = nested
            .get(tca_stats::BASIC)
            .map(|d| get::struct_prefix::<GnetStatsBasic>(d).into());
        self.queue = nested
            .get(tca_stats::QUEUE)
            .map(|d| get::struct_prefix::<GnetStatsQueue>(d).into());

        self.rate = if let Some(d) = nested.get(tca_stats::RATE_EST64) {
            let r = get::struct_prefix::<GnetStatsRateEst64>(d);
            Some(RateEstimate {
                bps: r.bps,
                pps: r.pps,
                width: RateWidth::Bits64,
                source: RateSource::Modern,
            })
        } else if let Some(d) = nested.get(tca_stats::RATE_EST) {
            let r = get::struct_prefix::<GnetStatsRateEst>(d);
            Some(RateEstimate {
                bps: r.bps as u64,
                pps: r.pps as u64,
                width: RateWidth::Bits32,
                source: RateSource::Modern,
            })
        } else {
            None
        };
    }

    fn apply_legacy(&mut self, data: &[u8], has_stats2: bool) {
        let legacy = get::struct_prefix::<TcStats>(data);
        self.legacy = Some(legacy);

        if self.rate.is_none() {
            self.rate = self.legacy_rate();
        }

        if !has_stats2 {
            self.basic = Some(BasicStats {
                bytes: legacy.bytes,
                packets: legacy.packets,
            });
            self.queue = Some(QueueStats {
                qlen: legacy.qlen,
                backlog: legacy.backlog,
                drops: legacy.drops,
                requeues: 0,
                overlimits: legacy.overlimits,
            });
            self.legacy_only = true;
        }
    }
}

/// A decoded qdisc with its statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct QdiscStats {
    #[cfg_attr(feature = "output", serde(flatten))]
    pub identity: QdiscIdentity,
    pub stats: StatsSnapshot,
}

impl QdiscStats {
    /// Decode a record.
    pub fn decode(record: &QdiscRecord<'_>) -> Result<Self> {
        let (identity, stats) = decode(record)?;
        Ok(Self { identity, stats })
    }

    pub fn kind(&self) -> &str {
        &self.identity.kind
    }

    pub fn ifindex(&self) -> i32 {
        self.identity.ifindex
    }

    pub fn is_root(&self) -> bool {
        self.identity.parent.is_root()
    }
}

/// Decode identity and statistics from a qdisc record.
///
/// Fails only when `TCA_KIND` is missing or not UTF-8. A malformed
/// statistics container leaves whatever was indexed before the bad entry.
pub fn decode(record: &QdiscRecord<'_>) -> Result<(QdiscIdentity, StatsSnapshot)> {
    let attrs = AttrIndex::parse(record.attrs, tca::MAX);
    if attrs.is_truncated() {
        tracing::debug!(
            ifindex = record.header.tcm_ifindex,
            offset = attrs.stopped_at(),
            "qdisc attribute region truncated"
        );
    }

    let kind = attrs
        .get(tca::KIND)
        .ok_or(Error::MissingAttribute { name: "TCA_KIND" })?;
    let kind = get::string(kind)
        .map_err(|e| Error::InvalidMessage(format!("TCA_KIND: {}", e)))?
        .to_string();

    let identity = QdiscIdentity {
        kind,
        ifindex: record.header.tcm_ifindex,
        dev: None,
        handle: record.header.tcm_handle,
        parent: QdiscParent::from_raw(record.header.tcm_parent),
    };

    let mut stats = StatsSnapshot::default();
    let stats2 = attrs.get(tca::STATS2);
    if let Some(data) = stats2 {
        stats.apply_stats2(data);
    }
    if let Some(data) = attrs.get(tca::STATS) {
        stats.apply_legacy(data, stats2.is_some());
    }

    Ok((identity, stats))
}
