//! Route netlink plumbing for qdisc dumps.
//!
//! # Quick Start
//!
//! ```ignore
//! use qstats::netlink::{Connection, DumpOptions};
//!
//! let mut conn = Connection::new()?;
//! let outcome = conn.dump_qdiscs(&DumpOptions::new()).await?;
//! for q in outcome.into_result()? {
//!     println!("{} {} sent {} bytes", q.identity.handle_str(), q.kind(), q.stats.bytes());
//! }
//! ```
//!
//! The decoding layers are usable without a socket:
//!
//! ```ignore
//! use qstats::netlink::{FrameReader, QdiscRecord, decode};
//!
//! for frame in FrameReader::new(&datagram) {
//!     let record = QdiscRecord::from_frame(&frame?)?;
//!     let (identity, stats) = decode(&record)?;
//! }
//! ```

pub mod attr;
mod builder;
pub mod connection;
pub mod dump;
mod error;
#[cfg(test)]
mod fixtures;
pub mod message;
pub mod parse;
pub mod qdisc;
mod socket;
pub mod types;

pub use attr::{AttrIndex, NlAttr};
pub use builder::{MessageBuilder, NestToken};
pub use connection::{Connection, qdisc_dump_request};
pub use dump::{DumpCollector, DumpEnd, DumpOptions, DumpOutcome, DumpState, RecordPolicy};
pub use error::{Error, ErrorKind, Result};
pub use message::{Frame, FrameEnd, FrameReader, NLMSG_HDRLEN, NlMsgHdr, NlMsgType};
pub use qdisc::{
    BasicStats, QdiscIdentity, QdiscParent, QdiscRecord, QdiscStats, QueueStats, RateEstimate,
    RateSource, RateWidth, StatsSnapshot, decode,
};
pub use socket::NetlinkSocket;
