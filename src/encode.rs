//! Serialize a leveled record sequence back into binary TLV bytes.
//!
//! The encoder is recursive and fills the scratch buffer from its tail
//! backward: for each record it first encodes the remaining run starting at
//! the next same-level sibling, then its own child run (which becomes its
//! payload), then the payload bytes, then the header in front of them. No
//! separate length pre-pass is needed; the bytes of a run end up in the
//! trailing window of the buffer.

use crate::error::{EncodingError, UndumpError};
use crate::parser::{ForcedWidth, TlvLine};
use crate::tlv::{FORWARD_FLAG, MAX_PAYLOAD, NON_CRITICAL_FLAG, TAG_MASK, TLV16_FLAG};
use byteorder::{BigEndian, ByteOrder};

/// Encode the run of records starting at `stack[0]` into the tail of `buf`.
///
/// Returns the number of bytes produced; the encoded bytes occupy
/// `buf[buf.len() - n..]`. Header width per record: TLV16 when the tag does
/// not fit 5 bits, the payload does not fit one length byte, or TLV16 is
/// forced; TLV8 otherwise. Forcing TLV8 on a record that needs TLV16 is
/// fatal. Headless records contribute their payload bytes with no header.
pub fn serialize_stack(stack: &[TlvLine], buf: &mut [u8], file: &str) -> Result<usize, UndumpError> {
    let buf_len = buf.len();
    let mut len = 0;
    let mut sub_len = 0;
    let rec = match stack.first() {
        Some(rec) => rec,
        None => return Ok(0),
    };

    // Encode everything from the next same-level sibling onward first; that
    // span must sit after this record's own bytes.
    for i in 1..stack.len() {
        if rec.level > stack[i].level {
            break;
        }
        if rec.level == stack[i].level {
            len = serialize_stack(&stack[i..], buf, file)?;
            break;
        }
    }

    // The immediately following deeper run is this record's payload.
    if stack.len() > 1 && rec.level < stack[1].level {
        sub_len = serialize_stack(&stack[1..], &mut buf[..buf_len - len], file)?;
        len += sub_len;
    }

    if !rec.data.is_empty() {
        if sub_len != 0 {
            return Err(UndumpError::encoding(
                file,
                rec.line,
                EncodingError::DataWithChildren,
            ));
        }
        if rec.data.len() > buf_len - len {
            return Err(UndumpError::encoding(
                file,
                rec.line,
                EncodingError::BufferOverflow,
            ));
        }
        let end = buf_len - len;
        buf[end - rec.data.len()..end].copy_from_slice(&rec.data);
        sub_len = rec.data.len();
        len += sub_len;
    }

    if rec.headless {
        return Ok(len);
    }

    if rec.tag > u16::from(TAG_MASK) || sub_len > 0xff || rec.force == Some(ForcedWidth::Tlv16) {
        if buf_len - len < 4 {
            return Err(UndumpError::encoding(
                file,
                rec.line,
                EncodingError::BufferOverflow,
            ));
        }
        if rec.force == Some(ForcedWidth::Tlv8) {
            return Err(UndumpError::encoding(
                file,
                rec.line,
                EncodingError::ForcedTlv8Overflow,
            ));
        }
        if sub_len > MAX_PAYLOAD {
            return Err(UndumpError::encoding(
                file,
                rec.line,
                EncodingError::PayloadTooLarge,
            ));
        }
        let end = buf_len - len;
        BigEndian::write_u16(&mut buf[end - 2..end], sub_len as u16);
        buf[end - 3] = (rec.tag & 0xff) as u8;
        buf[end - 4] = ((rec.tag >> 8) as u8 & TAG_MASK) | TLV16_FLAG;
        len += 4;
    } else {
        if buf_len - len < 2 {
            return Err(UndumpError::encoding(
                file,
                rec.line,
                EncodingError::BufferOverflow,
            ));
        }
        let end = buf_len - len;
        buf[end - 1] = sub_len as u8;
        buf[end - 2] = rec.tag as u8 & TAG_MASK;
        len += 2;
    }

    let header = buf_len - len;
    if rec.is_non_critical {
        buf[header] |= NON_CRITICAL_FLAG;
    }
    if rec.is_forward {
        buf[header] |= FORWARD_FLAG;
    }

    Ok(len)
}
