//! Binary TLV header decoding: in-memory and streaming reads, plus the
//! nested-payload validity check used by the dumper.
//!
//! Wire layout (header byte 0): bit 7 = TLV16 marker, bit 6 = non-critical,
//! bit 5 = forward, bits 4..0 = tag bits.
//!
//! - TLV8: `[flags|tag5, len8]`, payload up to 255 bytes.
//! - TLV16: `[flags|tag_hi5, tag_lo8, len_hi8, len_lo8]`, 13-bit tag,
//!   big-endian 16-bit length, payload up to 65535 bytes.

use crate::desc::{Descriptor, DescriptorSet};
use byteorder::{BigEndian, ByteOrder};
use std::io::{self, Read};

/// Header byte 0: marks a TLV16 (4-byte) header.
pub const TLV16_FLAG: u8 = 0x80;
/// Header byte 0: the element may be ignored by processors that do not know the tag.
pub const NON_CRITICAL_FLAG: u8 = 0x40;
/// Header byte 0: the element should be forwarded by processors that do not know the tag.
pub const FORWARD_FLAG: u8 = 0x20;
/// Tag bits carried in header byte 0.
pub const TAG_MASK: u8 = 0x1f;

/// Largest encodable tag (5 + 8 bits).
pub const MAX_TAG: u16 = 0x1fff;
/// Largest encodable payload (16-bit length field).
pub const MAX_PAYLOAD: usize = 0xffff;
/// Largest single TLV: TLV16 header plus a full payload.
pub const MAX_TLV_SIZE: usize = MAX_PAYLOAD + 4;

/// One decoded TLV header. The payload is not materialized; callers slice it
/// out of the surrounding buffer using `header_len` and `data_len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlvHeader {
    pub tag: u16,
    pub is_forward: bool,
    pub is_non_critical: bool,
    pub header_len: usize,
    pub data_len: usize,
    /// Byte offset of this TLV in its input stream; set by the caller.
    pub offset: usize,
}

impl TlvHeader {
    /// Total wire size of this TLV (header plus payload).
    pub fn total_len(&self) -> usize {
        self.header_len + self.data_len
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unexpected end of data inside a TLV header")]
    UnexpectedEnd,
    #[error("TLV length exceeds available data (need {needed}, have {available})")]
    LengthOutOfBounds { needed: usize, available: usize },
    #[error("failed to parse {consumed} bytes")]
    Truncated { consumed: usize },
    #[error("unknown TLV tag 0x{tag:02x}")]
    UnknownTag { tag: u16 },
    #[error("I/O: {0}")]
    Io(#[from] io::Error),
}

/// Parse one header from the start of `buf` without requiring the payload
/// to be present. `data_len` is taken from the length field as declared.
fn header_from_bytes(buf: &[u8]) -> Result<TlvHeader, DecodeError> {
    let b0 = *buf.first().ok_or(DecodeError::UnexpectedEnd)?;
    let is_forward = b0 & FORWARD_FLAG != 0;
    let is_non_critical = b0 & NON_CRITICAL_FLAG != 0;
    if b0 & TLV16_FLAG != 0 {
        if buf.len() < 4 {
            return Err(DecodeError::UnexpectedEnd);
        }
        Ok(TlvHeader {
            tag: u16::from(b0 & TAG_MASK) << 8 | u16::from(buf[1]),
            is_forward,
            is_non_critical,
            header_len: 4,
            data_len: BigEndian::read_u16(&buf[2..4]) as usize,
            offset: 0,
        })
    } else {
        if buf.len() < 2 {
            return Err(DecodeError::UnexpectedEnd);
        }
        Ok(TlvHeader {
            tag: u16::from(b0 & TAG_MASK),
            is_forward,
            is_non_critical,
            header_len: 2,
            data_len: buf[1] as usize,
            offset: 0,
        })
    }
}

/// Read one TLV at the start of `buf`. Fails if the declared header width
/// plus payload length would exceed the region.
pub fn read_header(buf: &[u8]) -> Result<TlvHeader, DecodeError> {
    let hdr = header_from_bytes(buf)?;
    if hdr.total_len() > buf.len() {
        return Err(DecodeError::LengthOutOfBounds {
            needed: hdr.total_len(),
            available: buf.len(),
        });
    }
    Ok(hdr)
}

/// Read until `buf` is full or the source is exhausted; returns bytes read.
fn read_fully<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Read one complete TLV (header and payload) from a stream into `buf`.
///
/// Returns `Ok(None)` when the stream ends cleanly at a TLV boundary.
/// A stream that ends mid-record yields [`DecodeError::Truncated`] carrying
/// the number of bytes that were consumed before it ran dry.
///
/// `buf` must hold at least [`MAX_TLV_SIZE`] bytes; on success the record
/// occupies `buf[..header.total_len()]`.
pub fn read_stream<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<Option<TlvHeader>, DecodeError> {
    debug_assert!(buf.len() >= MAX_TLV_SIZE);

    if read_fully(r, &mut buf[..1])? == 0 {
        return Ok(None);
    }
    let header_len = if buf[0] & TLV16_FLAG != 0 { 4 } else { 2 };
    let got = read_fully(r, &mut buf[1..header_len])?;
    if got < header_len - 1 {
        return Err(DecodeError::Truncated { consumed: 1 + got });
    }
    let hdr = header_from_bytes(&buf[..header_len])?;
    let got = read_fully(r, &mut buf[header_len..header_len + hdr.data_len])?;
    if got < hdr.data_len {
        return Err(DecodeError::Truncated {
            consumed: header_len + got,
        });
    }
    Ok(Some(hdr))
}

/// Decide whether `payload` is itself a well-formed sequence of TLVs.
///
/// Structural problems (malformed header, length overrun, trailing bytes)
/// never error out: the payload is simply not nested and the caller renders
/// it raw. In strict mode every candidate child tag must additionally
/// resolve in `desc`'s child set, falling back to the `top` set; an
/// unresolved tag is a hard [`DecodeError::UnknownTag`] that propagates to
/// the caller instead of downgrading the node.
pub fn check_nested(
    payload: &[u8],
    strict: bool,
    desc: Option<&Descriptor>,
    top: Option<&DescriptorSet>,
) -> Result<bool, DecodeError> {
    let mut pos = 0;
    while pos < payload.len() {
        match read_header(&payload[pos..]) {
            Ok(hdr) => pos += hdr.total_len(),
            Err(_) => return Ok(false),
        }
    }

    if strict {
        let mut pos = 0;
        while pos < payload.len() {
            let hdr = match read_header(&payload[pos..]) {
                Ok(hdr) => hdr,
                Err(_) => return Ok(false),
            };
            let known = desc
                .and_then(|d| d.find(hdr.tag))
                .or_else(|| top.and_then(|t| t.find(hdr.tag)));
            if known.is_none() {
                return Err(DecodeError::UnknownTag { tag: hdr.tag });
            }
            pos += hdr.total_len();
        }
    }

    Ok(true)
}
