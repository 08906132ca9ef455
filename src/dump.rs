//! Render decoded TLVs as indented text (dump direction).
//!
//! Each node prints as `TLV[0x<tag><,F><,N>]: ` at `level * 4` spaces of
//! indentation, optionally preceded by a `# label` annotation line and an
//! offset prefix, optionally followed by `(len = N) `. A payload that passes
//! the nested-validity check is expanded recursively; anything else is
//! printed as contiguous lowercase hex, optionally wrapped and with a
//! decimal rendering for short payloads.

use crate::desc::{Descriptor, DescriptorSet};
use crate::tlv::{check_nested, read_header, read_stream, DecodeError, TlvHeader, MAX_TLV_SIZE};
use std::io::{self, Read, Write};

const INDENT_LEN: usize = 4;
/// Hex characters per output line when wrapping is on.
const WRAP_WIDTH: usize = 64;

/// Output options for the dumper. The defaults print bare structure: no
/// offsets, lengths, annotations or decimal conversion, unlimited depth.
#[derive(Debug, Clone, Default)]
pub struct DumpOptions {
    /// Prefix every TLV with its byte offset in the input.
    pub print_offset: bool,
    /// Wrap raw hex payloads at [`WRAP_WIDTH`] hex characters.
    pub wrap: bool,
    /// Show `(len = N)` after the tag.
    pub print_len: bool,
    /// Append `(dec = N)` to raw payloads of at most 8 bytes.
    pub convert: bool,
    /// Emit `# label` lines for tags found in the descriptor set.
    pub annotate: bool,
    /// Refuse to expand nested TLVs whose tags the descriptors do not know.
    pub strict: bool,
    /// Maximum nesting depth to expand; 0 means unlimited.
    pub max_depth: usize,
    /// Byte count of a constant non-TLV header at the start of the input.
    pub header_len: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    #[error("{0}")]
    Decode(#[from] DecodeError),
    #[error("I/O: {0}")]
    Io(#[from] io::Error),
}

/// Renders binary TLVs as text, consulting an optional descriptor set for
/// annotation and strict-type validation.
pub struct Dumper<'a> {
    opts: DumpOptions,
    descriptors: Option<&'a DescriptorSet>,
}

impl<'a> Dumper<'a> {
    pub fn new(opts: DumpOptions, descriptors: Option<&'a DescriptorSet>) -> Self {
        Dumper { opts, descriptors }
    }

    /// Dump every TLV in `input` to `out`, tracking stream offsets. Stops
    /// with an error on a truncated record or, in strict mode, an unknown
    /// nested tag; everything rendered so far stays written.
    pub fn dump_stream<R: Read, W: Write>(&self, input: &mut R, out: &mut W) -> Result<(), DumpError> {
        let mut buf = vec![0u8; MAX_TLV_SIZE];

        if self.opts.header_len > 0 {
            let mut header = vec![0u8; self.opts.header_len];
            input.read_exact(&mut header)?;
            for b in &header {
                write!(out, "{:02x}", b)?;
            }
            writeln!(out)?;
        }

        let mut offset = 0;
        while let Some(mut hdr) = read_stream(input, &mut buf)? {
            hdr.offset = offset;
            self.dump_tlv(out, &buf[..hdr.total_len()], &hdr, 0, None)?;
            offset += hdr.total_len();
        }
        Ok(())
    }

    /// Render one TLV (and, recursively, its children). `tlv` holds the
    /// complete record, header included; `desc` is the node's descriptor if
    /// the parent already resolved one.
    pub fn dump_tlv<W: Write>(
        &self,
        out: &mut W,
        tlv: &[u8],
        hdr: &TlvHeader,
        level: usize,
        desc: Option<&Descriptor>,
    ) -> Result<(), DumpError> {
        let payload = &tlv[hdr.header_len..hdr.total_len()];

        // Resolve the descriptor only when a mode needs it, falling back to
        // the top-level set for tags the parent did not know.
        let desc = if self.opts.annotate || self.opts.strict {
            desc.or_else(|| self.descriptors.and_then(|d| d.find(hdr.tag)))
        } else {
            desc
        };

        if self.opts.annotate {
            if let Some(text) = desc.and_then(|d| d.text.as_deref()) {
                writeln!(out, "{:width$}# {}", "", text, width = level * INDENT_LEN)?;
            }
        }

        let mut prefix_len = 0;
        if self.opts.print_offset {
            let prefix = format!("{:4}:", hdr.offset);
            prefix_len += prefix.len();
            write!(out, "{}", prefix)?;
        }

        write!(out, "{:width$}", "", width = level * INDENT_LEN)?;
        prefix_len += level * INDENT_LEN;

        let label = format!(
            "TLV[0x{:02x}{}{}]: ",
            hdr.tag,
            if hdr.is_forward { ",F" } else { "" },
            if hdr.is_non_critical { ",N" } else { "" },
        );
        prefix_len += label.len();
        write!(out, "{}", label)?;

        if self.opts.print_len {
            let len_note = format!("(len = {}) ", hdr.data_len);
            prefix_len += len_note.len();
            write!(out, "{}", len_note)?;
        }

        let nested = check_nested(payload, self.opts.strict, desc, self.descriptors)?;
        let depth_reached = self.opts.max_depth != 0 && level + 1 >= self.opts.max_depth;

        if !nested || depth_reached {
            self.write_raw(out, payload, prefix_len)?;
        } else {
            writeln!(out)?;
            let mut offset = hdr.offset + hdr.header_len;
            let mut pos = 0;
            while pos < payload.len() {
                let mut child = read_header(&payload[pos..])?;
                child.offset = offset;
                let sub = desc.and_then(|d| d.find(child.tag));
                self.dump_tlv(out, &payload[pos..pos + child.total_len()], &child, level + 1, sub)?;
                offset += child.total_len();
                pos += child.total_len();
            }
        }
        Ok(())
    }

    fn write_raw<W: Write>(&self, out: &mut W, data: &[u8], prefix_len: usize) -> io::Result<()> {
        for (i, b) in data.iter().enumerate() {
            if self.opts.wrap && i > 0 && (i * 2) % WRAP_WIDTH == 0 {
                write!(out, "\n{:width$}", "", width = prefix_len)?;
            }
            write!(out, "{:02x}", b)?;
        }
        if self.opts.convert && data.len() <= 8 {
            let mut value: u64 = 0;
            for b in data {
                value = value << 8 | u64::from(*b);
            }
            write!(out, " (dec = {})", value)?;
        }
        writeln!(out)
    }
}
