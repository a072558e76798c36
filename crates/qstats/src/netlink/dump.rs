//! Qdisc dump collection.
//!
//! A dump answer arrives as one or more datagrams, each holding several
//! messages, and ends with `NLMSG_DONE` or `NLMSG_ERROR`. [`DumpCollector`]
//! is fed those datagrams in order and keeps the decoded records.

use std::time::Duration;

use super::error::{Error, Result};
use super::message::{FrameEnd, FrameReader, NlMsgType};
use super::qdisc::{QdiscRecord, QdiscStats};

/// Minimum receive buffer size.
pub const DEFAULT_BUFFER_FLOOR: usize = 32 * 1024;

/// What to do with a record that fails to decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordPolicy {
    /// Drop the record, keep its error in [`DumpOutcome::rejected`].
    #[default]
    Skip,
    /// Abort the whole dump.
    Abort,
}

/// Options for a qdisc dump.
#[derive(Debug, Clone)]
pub struct DumpOptions {
    ifindex: Option<u32>,
    timeout: Option<Duration>,
    buffer_floor: usize,
    record_policy: RecordPolicy,
    resolve_names: bool,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            ifindex: None,
            timeout: None,
            buffer_floor: DEFAULT_BUFFER_FLOOR,
            record_policy: RecordPolicy::Skip,
            resolve_names: true,
        }
    }
}

impl DumpOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only report qdiscs of this interface.
    pub fn ifindex(mut self, ifindex: u32) -> Self {
        self.ifindex = Some(ifindex);
        self
    }

    /// Give up when a receive waits longer than `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Lower bound for the receive buffer size.
    pub fn buffer_floor(mut self, bytes: usize) -> Self {
        self.buffer_floor = bytes;
        self
    }

    pub fn record_policy(mut self, policy: RecordPolicy) -> Self {
        self.record_policy = policy;
        self
    }

    /// Fill in interface names from sysfs after the dump (default on).
    pub fn resolve_names(mut self, resolve: bool) -> Self {
        self.resolve_names = resolve;
        self
    }

    pub fn get_ifindex(&self) -> Option<u32> {
        self.ifindex
    }

    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn get_buffer_floor(&self) -> usize {
        self.buffer_floor
    }

    pub fn get_record_policy(&self) -> RecordPolicy {
        self.record_policy
    }

    pub fn get_resolve_names(&self) -> bool {
        self.resolve_names
    }
}

/// State of a [`DumpCollector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpState {
    /// More datagrams are expected.
    AwaitingMessage,
    /// `NLMSG_DONE` received.
    Finished,
    /// `NLMSG_ERROR` received.
    Failed,
    /// A framing error, or a decode error under [`RecordPolicy::Abort`].
    Aborted,
}

/// How a completed dump ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpEnd {
    /// The kernel sent `NLMSG_DONE`.
    Finished,
    /// The kernel sent `NLMSG_ERROR`.
    Failed {
        /// Error code as sent (negative errno).
        code: i32,
        /// Sequence number of the error message.
        seq: u32,
    },
}

/// Result of a completed dump.
#[derive(Debug)]
pub struct DumpOutcome {
    /// Records decoded before the terminator.
    pub records: Vec<QdiscStats>,
    /// Records dropped under [`RecordPolicy::Skip`].
    pub rejected: Vec<Error>,
    pub end: DumpEnd,
    /// The kernel flagged the dump as inconsistent (`NLM_F_DUMP_INTR`).
    pub interrupted: bool,
}

impl DumpOutcome {
    pub fn is_finished(&self) -> bool {
        self.end == DumpEnd::Finished
    }

    /// The records, or the kernel error if the dump failed.
    pub fn into_result(self) -> Result<Vec<QdiscStats>> {
        match self.end {
            DumpEnd::Finished => Ok(self.records),
            DumpEnd::Failed { code, seq } => Err(Error::from_errno(code).with_seq(seq)),
        }
    }
}

/// Collects the answer to one qdisc dump request.
///
/// Messages carrying another sequence number, and message types other
/// than qdisc messages, are skipped.
#[derive(Debug)]
pub struct DumpCollector {
    seq: u32,
    ifindex: Option<u32>,
    policy: RecordPolicy,
    state: DumpState,
    end: Option<DumpEnd>,
    records: Vec<QdiscStats>,
    rejected: Vec<Error>,
    interrupted: bool,
    datagrams: usize,
}

impl DumpCollector {
    /// Create a collector for the request sent with `seq`.
    pub fn new(seq: u32, options: &DumpOptions) -> Self {
        Self {
            seq,
            ifindex: options.ifindex,
            policy: options.record_policy,
            state: DumpState::AwaitingMessage,
            end: None,
            records: Vec::new(),
            rejected: Vec::new(),
            interrupted: false,
            datagrams: 0,
        }
    }

    pub fn state(&self) -> DumpState {
        self.state
    }

    /// Whether no more datagrams are needed.
    pub fn is_done(&self) -> bool {
        self.state != DumpState::AwaitingMessage
    }

    /// Number of datagrams fed so far.
    pub fn datagrams(&self) -> usize {
        self.datagrams
    }

    /// Process one received datagram.
    ///
    /// Returns the new state. A framing error, or a decode error under
    /// [`RecordPolicy::Abort`], moves the collector to
    /// [`DumpState::Aborted`] and is returned as `Err`.
    pub fn feed(&mut self, datagram: &[u8]) -> Result<DumpState> {
        if self.is_done() {
            tracing::debug!(
                len = datagram.len(),
                state = ?self.state,
                "ignoring datagram after dump ended"
            );
            return Ok(self.state);
        }
        self.datagrams += 1;

        let mut reader = FrameReader::new(datagram);
        for frame in reader.by_ref() {
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    self.state = DumpState::Aborted;
                    return Err(e);
                }
            };

            if frame.seq() != self.seq {
                tracing::debug!(
                    seq = frame.seq(),
                    expected = self.seq,
                    "skipping message from another request"
                );
                continue;
            }

            if frame.header.is_dump_interrupted() && !self.interrupted {
                tracing::warn!(seq = self.seq, "dump interrupted, results may be inconsistent");
                self.interrupted = true;
            }

            match frame.msg_type() {
                NlMsgType::RTM_NEWQDISC | NlMsgType::RTM_DELQDISC => {}
                other => {
                    tracing::debug!(msg_type = other, "skipping non-qdisc message");
                    continue;
                }
            }

            let decoded = QdiscRecord::from_frame(&frame).and_then(|r| QdiscStats::decode(&r));
            match decoded {
                Ok(stats) => {
                    if self.ifindex.is_some_and(|i| stats.ifindex() as u32 != i) {
                        continue;
                    }
                    self.records.push(stats);
                }
                Err(e) => {
                    let e = e.with_seq(frame.seq());
                    match self.policy {
                        RecordPolicy::Skip => {
                            tracing::warn!(error = %e, offset = frame.offset, "dropping qdisc record");
                            self.rejected.push(e);
                        }
                        RecordPolicy::Abort => {
                            self.state = DumpState::Aborted;
                            return Err(e);
                        }
                    }
                }
            }
        }

        match reader.end() {
            Some(FrameEnd::Done { seq }) => {
                if seq != self.seq {
                    tracing::debug!(seq, expected = self.seq, "done message with foreign sequence");
                }
                self.state = DumpState::Finished;
                self.end = Some(DumpEnd::Finished);
            }
            Some(FrameEnd::Error { code, seq }) => {
                tracing::debug!(code, seq, "dump terminated by error message");
                self.state = DumpState::Failed;
                self.end = Some(DumpEnd::Failed { code, seq });
            }
            Some(FrameEnd::Exhausted) | None => {
                tracing::trace!(
                    records = self.records.len(),
                    "datagram exhausted, awaiting more"
                );
            }
        }

        Ok(self.state)
    }

    /// Consume the collector once the dump has terminated.
    pub fn finish(self) -> Result<DumpOutcome> {
        let end = self.end.ok_or_else(|| {
            Error::InvalidMessage(format!(
                "dump seq {} ended in state {:?} without a terminator",
                self.seq, self.state
            ))
        })?;
        Ok(DumpOutcome {
            records: self.records,
            rejected: self.rejected,
            end,
            interrupted: self.interrupted,
        })
    }
}
