//! Traffic control wire types.
//!
//! Layouts mirror `linux/rtnetlink.h`, `linux/pkt_sched.h` and
//! `linux/gen_stats.h`. All fields are native endian.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::netlink::error::{Error, Result};

/// Traffic control message (struct tcmsg).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct TcMsg {
    /// Address family.
    pub tcm_family: u8,
    /// Padding.
    pub tcm_pad1: u8,
    /// Padding.
    pub tcm_pad2: u16,
    /// Interface index.
    pub tcm_ifindex: i32,
    /// Qdisc handle.
    pub tcm_handle: u32,
    /// Parent qdisc.
    pub tcm_parent: u32,
    /// Info (depends on message type).
    pub tcm_info: u32,
}

impl TcMsg {
    /// Size of this structure.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Create a new TC message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the interface index.
    pub fn with_ifindex(mut self, ifindex: i32) -> Self {
        self.tcm_ifindex = ifindex;
        self
    }

    /// Set the handle.
    pub fn with_handle(mut self, handle: u32) -> Self {
        self.tcm_handle = handle;
        self
    }

    /// Set the parent.
    pub fn with_parent(mut self, parent: u32) -> Self {
        self.tcm_parent = parent;
        self
    }

    /// Parse from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::read_from_prefix(data)
            .map(|(msg, _)| msg)
            .map_err(|_| Error::Truncated {
                expected: Self::SIZE,
                actual: data.len(),
            })
    }
}

/// Top-level qdisc attribute ids (TCA_*).
pub mod tca {
    pub const KIND: u16 = 1;
    pub const OPTIONS: u16 = 2;
    pub const STATS: u16 = 3;
    pub const XSTATS: u16 = 4;
    pub const RATE: u16 = 5;
    pub const FCNT: u16 = 6;
    pub const STATS2: u16 = 7;
    pub const STAB: u16 = 8;
    pub const PAD: u16 = 9;
    pub const DUMP_INVISIBLE: u16 = 10;
    pub const CHAIN: u16 = 11;
    pub const HW_OFFLOAD: u16 = 12;
    pub const INGRESS_BLOCK: u16 = 13;
    pub const EGRESS_BLOCK: u16 = 14;
    pub const DUMP_FLAGS: u16 = 15;
    pub const EXT_WARN_MSG: u16 = 16;
    /// Highest top-level attribute id.
    pub const MAX: u16 = EXT_WARN_MSG;
}

/// Attribute ids nested inside `TCA_STATS2` (TCA_STATS_*).
pub mod tca_stats {
    pub const BASIC: u16 = 1;
    pub const RATE_EST: u16 = 2;
    pub const QUEUE: u16 = 3;
    pub const APP: u16 = 4;
    pub const RATE_EST64: u16 = 5;
    pub const PAD: u16 = 6;
    pub const BASIC_HW: u16 = 7;
    pub const PKT64: u16 = 8;
    /// Highest nested statistics attribute id.
    pub const MAX: u16 = PKT64;
}

/// Special handle values.
pub mod tc_handle {
    /// Root qdisc.
    pub const ROOT: u32 = 0xFFFFFFFF;
    /// Ingress qdisc.
    pub const INGRESS: u32 = 0xFFFFFFF1;
    /// Clsact qdisc.
    pub const CLSACT: u32 = 0xFFFFFFF2;
    /// Unspecified.
    pub const UNSPEC: u32 = 0;

    /// Make a handle from major:minor.
    pub const fn make(major: u16, minor: u16) -> u32 {
        ((major as u32) << 16) | (minor as u32)
    }

    /// Get the major number from a handle.
    pub const fn major(handle: u32) -> u16 {
        (handle >> 16) as u16
    }

    /// Get the minor number from a handle.
    pub const fn minor(handle: u32) -> u16 {
        (handle & 0xFFFF) as u16
    }

    /// Format a handle as major:minor string.
    pub fn format(handle: u32) -> String {
        match handle {
            ROOT => "root".to_string(),
            INGRESS => "ingress".to_string(),
            CLSACT => "clsact".to_string(),
            UNSPEC => "none".to_string(),
            _ => {
                let maj = major(handle);
                let min = minor(handle);
                if min == 0 {
                    format!("{:x}:", maj)
                } else {
                    format!("{:x}:{:x}", maj, min)
                }
            }
        }
    }
}

/// Legacy combined statistics (struct tc_stats, `TCA_STATS`).
///
/// Kept verbatim, trailing padding included, so a decoded value re-encodes
/// to the same 40 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct TcStats {
    /// Bytes seen.
    pub bytes: u64,
    /// Packets seen.
    pub packets: u32,
    /// Packets dropped.
    pub drops: u32,
    /// Packets over the configured limit.
    pub overlimits: u32,
    /// Current flow bytes per second.
    pub bps: u32,
    /// Current flow packets per second.
    pub pps: u32,
    /// Queue length.
    pub qlen: u32,
    /// Backlog in bytes.
    pub backlog: u32,
    /// Tail padding of the C struct.
    #[cfg_attr(feature = "output", serde(skip))]
    pub pad: u32,
}

/// Basic counters (struct gnet_stats_basic, `TCA_STATS_BASIC`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct GnetStatsBasic {
    /// Bytes seen.
    pub bytes: u64,
    /// Packets seen.
    pub packets: u32,
    /// Tail padding of the C struct.
    pub pad: u32,
}

/// Rate estimator (struct gnet_stats_rate_est, `TCA_STATS_RATE_EST`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct GnetStatsRateEst {
    /// Bytes per second.
    pub bps: u32,
    /// Packets per second.
    pub pps: u32,
}

/// 64-bit rate estimator (struct gnet_stats_rate_est64, `TCA_STATS_RATE_EST64`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct GnetStatsRateEst64 {
    /// Bytes per second.
    pub bps: u64,
    /// Packets per second.
    pub pps: u64,
}

/// Queue counters (struct gnet_stats_queue, `TCA_STATS_QUEUE`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct GnetStatsQueue {
    /// Queue length in packets.
    pub qlen: u32,
    /// Backlog in bytes.
    pub backlog: u32,
    /// Packets dropped.
    pub drops: u32,
    /// Packets requeued.
    pub requeues: u32,
    /// Packets over the configured limit.
    pub overlimits: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_sizes() {
        assert_eq!(TcMsg::SIZE, 20);
        assert_eq!(std::mem::size_of::<TcStats>(), 40);
        assert_eq!(std::mem::size_of::<GnetStatsBasic>(), 16);
        assert_eq!(std::mem::size_of::<GnetStatsRateEst>(), 8);
        assert_eq!(std::mem::size_of::<GnetStatsRateEst64>(), 16);
        assert_eq!(std::mem::size_of::<GnetStatsQueue>(), 20);
    }

    #[test]
    fn test_handle_helpers() {
        assert_eq!(tc_handle::make(1, 0), 0x0001_0000);
        assert_eq!(tc_handle::major(0x8001_0002), 0x8001);
        assert_eq!(tc_handle::minor(0x8001_0002), 2);
        assert_eq!(tc_handle::format(0x0001_0000), "1:");
        assert_eq!(tc_handle::format(0x0010_000a), "10:a");
        assert_eq!(tc_handle::format(tc_handle::ROOT), "root");
        assert_eq!(tc_handle::format(tc_handle::UNSPEC), "none");
    }

    #[test]
    fn test_tcmsg_roundtrip() {
        let msg = TcMsg::new()
            .with_ifindex(7)
            .with_handle(0x0001_0000)
            .with_parent(tc_handle::ROOT);
        let parsed = TcMsg::from_bytes(msg.as_bytes()).unwrap();
        assert_eq!(parsed, msg);
        assert!(TcMsg::from_bytes(&[0; 12]).is_err());
    }
}
