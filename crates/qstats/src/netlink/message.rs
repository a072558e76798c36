//! Netlink message header and response framing.

use super::attr::get;
use super::error::{Error, Result};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Netlink message header alignment.
pub const NLMSG_ALIGNTO: usize = 4;

/// Align a length to NLMSG_ALIGNTO boundary.
#[inline]
pub const fn nlmsg_align(len: usize) -> usize {
    (len + NLMSG_ALIGNTO - 1) & !(NLMSG_ALIGNTO - 1)
}

/// Size of the netlink message header.
pub const NLMSG_HDRLEN: usize = nlmsg_align(std::mem::size_of::<NlMsgHdr>());

/// Netlink message header (mirrors struct nlmsghdr).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlMsgHdr {
    /// Length of message including header.
    pub nlmsg_len: u32,
    /// Message type.
    pub nlmsg_type: u16,
    /// Additional flags.
    pub nlmsg_flags: u16,
    /// Sequence number.
    pub nlmsg_seq: u32,
    /// Sending process port ID.
    pub nlmsg_pid: u32,
}

impl NlMsgHdr {
    /// Create a new message header.
    pub fn new(msg_type: u16, flags: u16) -> Self {
        Self {
            nlmsg_len: NLMSG_HDRLEN as u32,
            nlmsg_type: msg_type,
            nlmsg_flags: flags,
            nlmsg_seq: 0,
            nlmsg_pid: 0,
        }
    }

    /// Check if this is an error message.
    pub fn is_error(&self) -> bool {
        self.nlmsg_type == NlMsgType::ERROR
    }

    /// Check if this is a done message.
    pub fn is_done(&self) -> bool {
        self.nlmsg_type == NlMsgType::DONE
    }

    /// Check if this message has the multi flag.
    pub fn is_multi(&self) -> bool {
        self.nlmsg_flags & NLM_F_MULTI != 0
    }

    /// Check if the kernel flagged the dump as inconsistent.
    pub fn is_dump_interrupted(&self) -> bool {
        self.nlmsg_flags & NLM_F_DUMP_INTR != 0
    }

    /// Convert header to bytes.
    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }

    /// Read a header from the front of `data`.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::read_from_prefix(data)
            .map(|(h, _)| h)
            .map_err(|_| Error::Truncated {
                expected: std::mem::size_of::<Self>(),
                actual: data.len(),
            })
    }
}

/// Standard netlink message types used by qdisc dumps.
pub struct NlMsgType;

impl NlMsgType {
    /// No operation, message must be discarded.
    pub const NOOP: u16 = 1;
    /// Error message or ACK.
    pub const ERROR: u16 = 2;
    /// End of multipart message.
    pub const DONE: u16 = 3;
    /// Data lost, request resend.
    pub const OVERRUN: u16 = 4;

    // Qdisc messages
    pub const RTM_NEWQDISC: u16 = 36;
    pub const RTM_DELQDISC: u16 = 37;
    pub const RTM_GETQDISC: u16 = 38;
}

/// Netlink message flags.
pub const NLM_F_REQUEST: u16 = 0x01;
pub const NLM_F_MULTI: u16 = 0x02;
pub const NLM_F_ACK: u16 = 0x04;
pub const NLM_F_DUMP_INTR: u16 = 0x10;

// Modifiers to GET request
pub const NLM_F_ROOT: u16 = 0x100;
pub const NLM_F_MATCH: u16 = 0x200;
pub const NLM_F_DUMP: u16 = NLM_F_ROOT | NLM_F_MATCH;

/// One netlink message borrowed from a receive buffer.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    /// Message header.
    pub header: NlMsgHdr,
    /// Payload following the header, `nlmsg_len - NLMSG_HDRLEN` bytes.
    pub payload: &'a [u8],
    /// Offset of the header within the datagram.
    pub offset: usize,
}

impl Frame<'_> {
    /// Message type.
    pub fn msg_type(&self) -> u16 {
        self.header.nlmsg_type
    }

    /// Sequence number.
    pub fn seq(&self) -> u32 {
        self.header.nlmsg_seq
    }
}

/// How a [`FrameReader`] walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEnd {
    /// The datagram ran out without a terminator; more may follow.
    Exhausted,
    /// `NLMSG_DONE` was reached.
    Done {
        /// Sequence number of the done message.
        seq: u32,
    },
    /// `NLMSG_ERROR` was reached; the exchange failed.
    Error {
        /// Error code from `nlmsgerr`, as sent (negative errno).
        code: i32,
        /// Sequence number of the error message.
        seq: u32,
    },
}

/// Iterator over the data messages of one received datagram.
///
/// Advances by each message's aligned length. Iteration ends without an
/// item on a terminator or when the datagram is used up; the reason is
/// available from [`end`](Self::end) afterwards. A message whose length is
/// below the header size or past the end of the datagram yields one
/// [`Error::Framing`] tagged with its sequence number, and fuses the
/// iterator.
pub struct FrameReader<'a> {
    data: &'a [u8],
    offset: usize,
    end: Option<FrameEnd>,
    failed: bool,
}

impl<'a> FrameReader<'a> {
    /// Create a reader over the valid bytes of a receive buffer.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            end: None,
            failed: false,
        }
    }

    /// How the walk ended, once the iterator has returned `None`.
    ///
    /// `None` while iteration is still in progress or after a framing error.
    pub fn end(&self) -> Option<FrameEnd> {
        self.end
    }

    fn framing(&mut self, seq: u32, reason: String) -> Error {
        self.failed = true;
        Error::Framing {
            offset: self.offset,
            reason,
        }
        .with_seq(seq)
    }
}

impl<'a> Iterator for FrameReader<'a> {
    type Item = Result<Frame<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.end.is_some() {
            return None;
        }

        let data = self.data;
        let rest = &data[self.offset..];
        if rest.len() < NLMSG_HDRLEN {
            self.end = Some(FrameEnd::Exhausted);
            return None;
        }

        let header = match NlMsgHdr::from_bytes(rest) {
            Ok(h) => h,
            Err(e) => {
                self.failed = true;
                return Some(Err(e));
            }
        };

        let msg_len = header.nlmsg_len as usize;
        if msg_len < NLMSG_HDRLEN {
            let reason = format!("length {} below header size {}", msg_len, NLMSG_HDRLEN);
            return Some(Err(self.framing(header.nlmsg_seq, reason)));
        }
        if msg_len > rest.len() {
            let reason = format!(
                "length {} exceeds {} remaining bytes",
                msg_len,
                rest.len()
            );
            return Some(Err(self.framing(header.nlmsg_seq, reason)));
        }

        let payload = &rest[NLMSG_HDRLEN..msg_len];

        if header.is_done() {
            self.end = Some(FrameEnd::Done {
                seq: header.nlmsg_seq,
            });
            return None;
        }

        if header.is_error() {
            // A short error payload still terminates the exchange.
            let code = get::i32_ne(payload).unwrap_or(0);
            self.end = Some(FrameEnd::Error {
                code,
                seq: header.nlmsg_seq,
            });
            return None;
        }

        let frame = Frame {
            header,
            payload,
            offset: self.offset,
        };
        tracing::trace!(
            offset = self.offset,
            len = msg_len,
            msg_type = header.nlmsg_type,
            seq = header.nlmsg_seq,
            "frame"
        );

        self.offset = (self.offset + nlmsg_align(msg_len)).min(data.len());
        Some(Ok(frame))
    }
}

impl std::iter::FusedIterator for FrameReader<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::builder::MessageBuilder;
    use crate::netlink::error::ErrorKind;
    use crate::netlink::fixtures::{done_msg, error_msg, raw_msg};

    fn data_msg(seq: u32, body: &[u8]) -> Vec<u8> {
        raw_msg(NlMsgType::RTM_NEWQDISC, seq, body)
    }

    #[test]
    fn test_two_messages_then_done() {
        let mut buf = data_msg(5, &[1, 2, 3, 4]);
        buf.extend(data_msg(5, &[5, 6, 7, 8, 9]));
        buf.extend(done_msg(5));

        let mut reader = FrameReader::new(&buf);
        let frames: Vec<_> = reader.by_ref().collect::<Result<_>>().unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].payload, &[1, 2, 3, 4]);
        // The builder pads the body, and the padding counts toward nlmsg_len.
        assert_eq!(frames[1].payload.len(), 8);
        assert_eq!(&frames[1].payload[..5], &[5, 6, 7, 8, 9]);
        assert_eq!(frames[1].offset, NLMSG_HDRLEN + 4);
        assert_eq!(reader.end(), Some(FrameEnd::Done { seq: 5 }));
    }

    #[test]
    fn test_error_terminator() {
        let mut buf = data_msg(9, &[0; 8]);
        buf.extend(error_msg(9, -95));
        buf.extend(data_msg(9, &[0; 8]));

        let mut reader = FrameReader::new(&buf);
        assert!(reader.next().unwrap().is_ok());
        assert!(reader.next().is_none());
        assert_eq!(reader.end(), Some(FrameEnd::Error { code: -95, seq: 9 }));
        // Stays finished.
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_exhausted_without_terminator() {
        let mut buf = data_msg(1, &[0; 4]);
        buf.extend_from_slice(&[0; 7]); // less than a header

        let mut reader = FrameReader::new(&buf);
        assert_eq!(reader.by_ref().count(), 1);
        assert_eq!(reader.end(), Some(FrameEnd::Exhausted));

        let mut empty = FrameReader::new(&[]);
        assert!(empty.next().is_none());
        assert_eq!(empty.end(), Some(FrameEnd::Exhausted));
    }

    #[test]
    fn test_length_below_header_is_framing_error() {
        let mut buf = data_msg(1, &[0; 4]);
        let mut bad = NlMsgHdr::new(NlMsgType::RTM_NEWQDISC, 0);
        bad.nlmsg_len = 8;
        buf.extend_from_slice(bad.as_bytes());
        buf.extend(done_msg(1));

        let mut reader = FrameReader::new(&buf);
        assert!(reader.next().unwrap().is_ok());
        let err = reader.next().unwrap().unwrap_err();
        assert_eq!(err.seq(), Some(0));
        assert!(matches!(
            err,
            Error::AtMessage { source, .. }
                if matches!(*source, Error::Framing { offset, .. } if offset == NLMSG_HDRLEN + 4)
        ));
        // No recovery past the corrupt message.
        assert!(reader.next().is_none());
        assert_eq!(reader.end(), None);
    }

    #[test]
    fn test_length_past_buffer_is_framing_error() {
        let mut buf = data_msg(1, &[0; 16]);
        buf.truncate(NLMSG_HDRLEN + 8);

        let mut reader = FrameReader::new(&buf);
        let err = reader.next().unwrap().unwrap_err();
        assert!(err.to_string().contains("exceeds"));
        assert_eq!(err.kind(), ErrorKind::Framing);
        assert_eq!(err.seq(), Some(1));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_short_error_payload() {
        let mut b = MessageBuilder::new(NlMsgType::ERROR, 0);
        b.set_seq(3);
        let buf = b.finish();

        let mut reader = FrameReader::new(&buf);
        assert!(reader.next().is_none());
        assert_eq!(reader.end(), Some(FrameEnd::Error { code: 0, seq: 3 }));
    }

    #[test]
    fn test_header_flags() {
        let mut h = NlMsgHdr::new(NlMsgType::RTM_NEWQDISC, NLM_F_MULTI | NLM_F_DUMP_INTR);
        assert!(h.is_multi());
        assert!(h.is_dump_interrupted());
        h.nlmsg_flags = 0;
        assert!(!h.is_dump_interrupted());
        assert_eq!(NLMSG_HDRLEN, 16);
    }
}
