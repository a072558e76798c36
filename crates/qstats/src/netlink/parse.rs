//! Parser combinators for fixed message headers.
//!
//! The attribute walk lives in [`attr`](super::attr); this module only
//! splits fixed-size family headers off a message payload.

use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::take;

use super::error::{Error, Result};
use super::types::tc::TcMsg;

/// Result type for winnow parsers.
pub type PResult<T> = core::result::Result<T, winnow::error::ErrMode<ContextError>>;

/// Take a fixed-size header of `size` bytes off the front of `input`.
pub fn fixed_header<'a>(input: &mut &'a [u8], size: usize) -> PResult<&'a [u8]> {
    take(size).parse_next(input)
}

/// Split a qdisc message payload into its `tcmsg` and attribute region.
///
/// A payload shorter than `tcmsg` would leave a negative attribute length
/// and is rejected.
pub fn split_tcmsg(payload: &[u8]) -> Result<(TcMsg, &[u8])> {
    let mut input = payload;
    let header = fixed_header(&mut input, TcMsg::SIZE).map_err(|_| {
        Error::InvalidMessage(format!(
            "qdisc payload of {} bytes is shorter than tcmsg ({} bytes)",
            payload.len(),
            TcMsg::SIZE
        ))
    })?;
    Ok((TcMsg::from_bytes(header)?, input))
}
