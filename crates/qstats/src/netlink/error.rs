//! Error types for netlink operations.

use std::io;

/// Result type for netlink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
///
/// Transport and framing errors abort a whole dump. Attribute errors stay
/// local to the attribute region they were found in. Decode errors are
/// confined to one record unless the caller asks for strict handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Socket open/bind/send/receive failure or timeout.
    Transport,
    /// Message boundaries inconsistent with the receive buffer.
    Framing,
    /// Malformed attribute payload.
    Attribute,
    /// Structurally valid message missing required content.
    Decode,
    /// The kernel terminated the exchange with an error message.
    Kernel,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::Transport => "transport error",
            ErrorKind::Framing => "framing error",
            ErrorKind::Attribute => "attribute error",
            ErrorKind::Decode => "decode error",
            ErrorKind::Kernel => "kernel error",
        };
        f.write_str(s)
    }
}

/// Errors that can occur during netlink operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No response arrived within the configured wait.
    #[error("timed out waiting for kernel response after {ms} ms")]
    Timeout {
        /// The wait that elapsed, in milliseconds.
        ms: u64,
    },

    /// Kernel returned an error code.
    #[error("kernel error: {message} (errno {errno})")]
    Kernel {
        /// The errno value from the kernel.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// Message boundaries do not fit the receive buffer.
    #[error("framing error at offset {offset}: {reason}")]
    Framing {
        /// Byte offset of the offending message within the datagram.
        offset: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// Message was truncated.
    #[error("message truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Expected message length.
        expected: usize,
        /// Actual bytes received.
        actual: usize,
    },

    /// Invalid message format.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Invalid attribute format.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    /// A required attribute was absent.
    #[error("missing required attribute {name}")]
    MissingAttribute {
        /// Attribute name, e.g. `TCA_KIND`.
        name: &'static str,
    },

    /// Error attributed to a specific message in a dump.
    #[error("message seq {seq}: {source}")]
    AtMessage {
        /// Sequence number of the offending message.
        seq: u32,
        /// The underlying error.
        #[source]
        source: Box<Error>,
    },

    /// Interface not found.
    #[error("interface not found: {name}")]
    InterfaceNotFound {
        /// The interface name that was not found.
        name: String,
    },
}

impl Error {
    /// Create a kernel error from an errno value as carried in `nlmsgerr`.
    ///
    /// The code is negated; `i32::MIN` saturates to `i32::MAX`.
    pub fn from_errno(code: i32) -> Self {
        let errno = code.saturating_neg();
        let message = io::Error::from_raw_os_error(errno).to_string();
        Self::Kernel { errno, message }
    }

    /// Attach the sequence number of the message that produced this error.
    ///
    /// Errors that already carry a sequence number are returned unchanged.
    pub fn with_seq(self, seq: u32) -> Self {
        match self {
            e @ Self::AtMessage { .. } => e,
            other => Self::AtMessage {
                seq,
                source: Box::new(other),
            },
        }
    }

    /// Sequence number of the offending message, if known.
    pub fn seq(&self) -> Option<u32> {
        match self {
            Self::AtMessage { seq, .. } => Some(*seq),
            _ => None,
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) | Self::Timeout { .. } | Self::InterfaceNotFound { .. } => {
                ErrorKind::Transport
            }
            Self::Framing { .. } | Self::Truncated { .. } => ErrorKind::Framing,
            Self::InvalidAttribute(_) => ErrorKind::Attribute,
            Self::InvalidMessage(_) | Self::MissingAttribute { .. } => ErrorKind::Decode,
            Self::Kernel { .. } => ErrorKind::Kernel,
            Self::AtMessage { source, .. } => source.kind(),
        }
    }

    /// Whether this error must abort the whole exchange.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Transport | ErrorKind::Framing | ErrorKind::Kernel
        )
    }

    /// Check if this is a permission error (EPERM, EACCES).
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::Kernel { errno, .. } => matches!(*errno, 1 | 13), // EPERM=1, EACCES=13
            Self::Io(e) => e.kind() == io::ErrorKind::PermissionDenied,
            Self::AtMessage { source, .. } => source.is_permission_denied(),
            _ => false,
        }
    }

    /// Get the errno value if this is a kernel error.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Kernel { errno, .. } => Some(*errno),
            Self::AtMessage { source, .. } => source.errno(),
            _ => None,
        }
    }
}
