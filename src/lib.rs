//! # tlvtext — TLV binary/text codec
//!
//! A bidirectional codec between a compact binary Tag-Length-Value wire
//! format and a canonical, human-editable text form of the same structure.
//! One direction decodes arbitrary TLV streams into annotated, indented
//! text (`tlvdump`); the other parses that text grammar back into exact
//! binary bytes (`tlvundump`).
//!
//! ## Wire format
//!
//! Two header widths, selected per element:
//!
//! - **TLV8** — 2-byte header: 5-bit tag, 8-bit length
//! - **TLV16** — 4-byte header: 13-bit tag, big-endian 16-bit length
//!
//! Header byte 0 carries the width marker (bit 7), the non-critical flag
//! (bit 6) and the forward flag (bit 5).
//!
//! ## Text format
//!
//! ```text
//! TLV[0x1f]:
//!     TLV[01]: 0102
//!     TLV[02,N]: "value"
//! ```
//!
//! Nesting is expressed purely through indentation; encoding direction
//! reconstructs levels by byte-exact indent comparison. `TLV8[..]` /
//! `TLV16[..]` force a header width, and a line of bare hex emits raw
//! bytes with no header.
//!
//! ## Usage
//!
//! See the `tlvdump` / `tlvundump` binaries and `tests/roundtrip.rs` for
//! full examples.

pub mod desc;
pub mod dump;
pub mod encode;
pub mod error;
pub mod parser;
pub mod tlv;
pub mod undump;

pub use desc::{DescError, Descriptor, DescriptorSet};
pub use dump::{DumpError, DumpOptions, Dumper};
pub use encode::serialize_stack;
pub use error::{EncodingError, FormatError, IndentationError, UndumpError};
pub use parser::{ForcedWidth, Tokenizer, TlvLine};
pub use tlv::{
    check_nested, read_header, read_stream, DecodeError, TlvHeader, FORWARD_FLAG, MAX_PAYLOAD,
    MAX_TAG, MAX_TLV_SIZE, NON_CRITICAL_FLAG, TLV16_FLAG,
};
pub use undump::convert_stream;
