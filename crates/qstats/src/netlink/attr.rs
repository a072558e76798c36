//! Netlink attribute (rtattr/nlattr) handling.
//!
//! Attributes are TLV entries: a 4-byte header `{len: u16, type: u16}`
//! followed by `len - 4` bytes of data, each entry padded to a 4-byte
//! boundary. [`AttrIndex`] walks one such region and keeps, per type, the
//! payload of the first entry seen.

use super::error::{Error, Result};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Netlink attribute alignment.
pub const NLA_ALIGNTO: usize = 4;

/// Align a length to NLA_ALIGNTO boundary.
#[inline]
pub const fn nla_align(len: usize) -> usize {
    (len + NLA_ALIGNTO - 1) & !(NLA_ALIGNTO - 1)
}

/// Size of the attribute header.
pub const NLA_HDRLEN: usize = 4; // nla_align(size_of::<NlAttr>())

/// Netlink attribute header (mirrors struct nlattr / struct rtattr).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlAttr {
    /// Length including header.
    pub nla_len: u16,
    /// Attribute type.
    pub nla_type: u16,
}

/// Attribute type flags.
pub const NLA_F_NESTED: u16 = 1 << 15;
pub const NLA_F_NET_BYTEORDER: u16 = 1 << 14;
pub const NLA_TYPE_MASK: u16 = !(NLA_F_NESTED | NLA_F_NET_BYTEORDER);

impl NlAttr {
    /// Create a new attribute header.
    pub fn new(attr_type: u16, data_len: usize) -> Self {
        Self {
            nla_len: (NLA_HDRLEN + data_len) as u16,
            nla_type: attr_type,
        }
    }

    /// Get the attribute type without flags.
    pub fn kind(&self) -> u16 {
        self.nla_type & NLA_TYPE_MASK
    }

    /// Get the payload length (total length minus header).
    pub fn payload_len(&self) -> usize {
        (self.nla_len as usize).saturating_sub(NLA_HDRLEN)
    }

    /// Convert to bytes.
    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }

    /// Read a header from the front of `data`.
    ///
    /// The header is copied out, so `data` needs no particular alignment.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::read_from_prefix(data)
            .map(|(attr, _)| attr)
            .map_err(|_| Error::Truncated {
                expected: std::mem::size_of::<Self>(),
                actual: data.len(),
            })
    }
}

/// Index from attribute type to the first attribute payload of that type.
///
/// Sized by the maximum valid type of the attribute namespace being walked;
/// built fresh for every region. Entries with type 0, a type above the
/// maximum, or a type already seen are skipped without error.
///
/// The walk stops at the first entry whose declared length is below the
/// header size or runs past the end of the region. Entries indexed before
/// that point are kept; the stop position is reported by
/// [`stopped_at`](Self::stopped_at).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrIndex<'a> {
    slots: Vec<Option<&'a [u8]>>,
    stopped_at: Option<usize>,
}

impl<'a> AttrIndex<'a> {
    /// Walk `region` and index attributes with `0 < type <= max_type`.
    pub fn parse(region: &'a [u8], max_type: u16) -> Self {
        let mut slots = vec![None; max_type as usize + 1];
        let mut stopped_at = None;
        let mut offset = 0;

        while offset + NLA_HDRLEN <= region.len() {
            let rest = &region[offset..];
            let Ok(attr) = NlAttr::from_bytes(rest) else {
                break;
            };

            let len = attr.nla_len as usize;
            if len < NLA_HDRLEN || len > rest.len() {
                tracing::debug!(
                    offset,
                    len,
                    remaining = rest.len(),
                    "malformed attribute, stopping region walk"
                );
                stopped_at = Some(offset);
                break;
            }

            let kind = attr.kind();
            if kind != 0 && kind <= max_type {
                let slot = &mut slots[kind as usize];
                if slot.is_none() {
                    *slot = Some(&rest[NLA_HDRLEN..len]);
                }
            }

            offset += nla_align(len);
        }

        Self { slots, stopped_at }
    }

    /// Payload of the first attribute of type `kind`.
    pub fn get(&self, kind: u16) -> Option<&'a [u8]> {
        self.slots.get(kind as usize).copied().flatten()
    }

    /// Check whether an attribute of type `kind` was indexed.
    pub fn contains(&self, kind: u16) -> bool {
        self.get(kind).is_some()
    }

    /// The maximum type this index accepts.
    pub fn max_type(&self) -> u16 {
        (self.slots.len() - 1) as u16
    }

    /// Number of distinct attribute types indexed.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Check if no attribute was indexed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Region offset of the malformed entry that ended the walk, if any.
    pub fn stopped_at(&self) -> Option<usize> {
        self.stopped_at
    }

    /// Whether the walk ended on a malformed entry rather than at the end.
    pub fn is_truncated(&self) -> bool {
        self.stopped_at.is_some()
    }

    /// Iterate over indexed `(type, payload)` pairs in type order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &'a [u8])> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(kind, slot)| slot.map(|data| (kind as u16, data)))
    }
}

/// Helper functions for extracting typed values from attribute payloads.
pub mod get {
    use super::*;

    /// Extract a u32 value (native endian).
    pub fn u32_ne(data: &[u8]) -> Result<u32> {
        if data.len() < 4 {
            return Err(Error::InvalidAttribute("truncated u32 attribute".into()));
        }
        Ok(u32::from_ne_bytes([data[0], data[1], data[2], data[3]]))
    }

    /// Extract an i32 value (native endian).
    pub fn i32_ne(data: &[u8]) -> Result<i32> {
        if data.len() < 4 {
            return Err(Error::InvalidAttribute("truncated i32 attribute".into()));
        }
        Ok(i32::from_ne_bytes([data[0], data[1], data[2], data[3]]))
    }

    /// Extract a null-terminated string.
    pub fn string(data: &[u8]) -> Result<&str> {
        // Find null terminator or use whole buffer
        let len = data.iter().position(|&b| b == 0).unwrap_or(data.len());
        std::str::from_utf8(&data[..len])
            .map_err(|e| Error::InvalidAttribute(format!("invalid UTF-8: {}", e)))
    }

    /// Copy a fixed-size kernel struct out of an attribute payload.
    ///
    /// The destination starts zeroed and receives
    /// `min(data.len(), size_of::<T>())` bytes, so a payload from a kernel
    /// with a shorter version of the struct leaves the trailing fields at 0
    /// and extra trailing bytes from a newer kernel are ignored.
    pub fn struct_prefix<T: FromBytes + IntoBytes>(data: &[u8]) -> T {
        let mut value = T::new_zeroed();
        let n = data.len().min(std::mem::size_of::<T>());
        value.as_mut_bytes()[..n].copy_from_slice(&data[..n]);
        value
    }
}
