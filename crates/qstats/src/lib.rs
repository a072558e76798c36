//! Queueing discipline statistics over rtnetlink.
//!
//! Sends an `RTM_GETQDISC` dump request on a `NETLINK_ROUTE` socket and
//! decodes each answer into a [`QdiscStats`]: the qdisc's kind, handle and
//! parent plus its byte, packet, queue and rate counters. Both the nested
//! `TCA_STATS2` layout and the legacy `TCA_STATS` struct are understood.
//!
//! # Features
//!
//! - `output` - JSON/text output formatting
//! - `integration` - tests against the running kernel
//!
//! # Example
//!
//! ```ignore
//! use qstats::{Connection, DumpOptions};
//!
//! #[tokio::main]
//! async fn main() -> qstats::Result<()> {
//!     let mut conn = Connection::new()?;
//!     let qdiscs = conn.dump_qdiscs(&DumpOptions::new()).await?.into_result()?;
//!     for q in qdiscs {
//!         println!("{} on {}: {} bytes", q.kind(), q.ifindex(), q.stats.bytes());
//!     }
//!     Ok(())
//! }
//! ```

pub mod netlink;
pub mod util;

#[cfg(feature = "output")]
pub mod output;

pub use netlink::{Connection, DumpOptions, Error, QdiscStats, RecordPolicy, Result};
