//! Rebuild hierarchy from parsed text lines and drive re-serialization.
//!
//! Levels are derived purely from indentation strings: a record's indent
//! must either extend the previous record's indent byte-for-byte (child),
//! match it exactly (sibling), or match some open ancestor's indent exactly
//! (dedent). Whenever a record settles back at level 0 the buffered group
//! is a complete top-level TLV and is flushed to the output immediately;
//! output already written is never rolled back by a later failure.

use crate::encode::serialize_stack;
use crate::error::{IndentationError, UndumpError};
use crate::parser::{TlvLine, Tokenizer};
use crate::tlv::MAX_TLV_SIZE;
use std::io::{BufRead, Write};

/// Derive the level of `rec` from the records of the currently buffered
/// group. The first record of a group and any record with empty indent sit
/// at level 0.
fn assign_level(stack: &[TlvLine], rec: &TlvLine, file: &str) -> Result<usize, UndumpError> {
    let prev = match stack.last() {
        Some(prev) if !rec.indent.is_empty() => prev,
        _ => return Ok(0),
    };

    if rec.indent.len() < prev.indent.len() {
        // Dedent: the indent must match some open ancestor exactly, in both
        // length and content.
        for anc in stack.iter().rev() {
            if rec.indent.len() > anc.indent.len() {
                return Err(UndumpError::indentation(
                    file,
                    rec.line,
                    IndentationError::NoMatchingLevel,
                ));
            }
            if rec.indent.len() == anc.indent.len() {
                if rec.indent != anc.indent {
                    return Err(UndumpError::indentation(
                        file,
                        rec.line,
                        IndentationError::WhitespaceMismatch,
                    ));
                }
                return Ok(anc.level);
            }
        }
        Err(UndumpError::indentation(
            file,
            rec.line,
            IndentationError::NoMatchingLevel,
        ))
    } else {
        if rec.indent[..prev.indent.len()] != prev.indent[..] {
            return Err(UndumpError::indentation(
                file,
                rec.line,
                IndentationError::NotAPrefix,
            ));
        }
        if rec.indent.len() > prev.indent.len() {
            if !prev.data.is_empty() {
                return Err(UndumpError::indentation(
                    file,
                    rec.line,
                    IndentationError::DataWithChildren,
                ));
            }
            Ok(prev.level + 1)
        } else {
            Ok(prev.level)
        }
    }
}

fn flush<W: Write>(
    stack: &[TlvLine],
    scratch: &mut [u8],
    file: &str,
    out: &mut W,
) -> Result<(), UndumpError> {
    let len = serialize_stack(stack, scratch, file)?;
    let total = scratch.len();
    out.write_all(&scratch[total - len..])?;
    Ok(())
}

/// Convert a text stream to binary TLV, writing each completed top-level
/// group as soon as its boundary is seen. Any error is fatal to the rest
/// of the stream.
pub fn convert_stream<R: BufRead, W: Write>(
    input: R,
    file: &str,
    out: &mut W,
) -> Result<(), UndumpError> {
    let mut tokenizer = Tokenizer::new(input, file);
    let mut stack: Vec<TlvLine> = Vec::with_capacity(100);
    let mut scratch = vec![0u8; MAX_TLV_SIZE];

    while let Some(mut rec) = tokenizer.next_line()? {
        rec.level = assign_level(&stack, &rec, file)?;
        if rec.level == 0 && !stack.is_empty() {
            flush(&stack, &mut scratch, file, out)?;
            stack.clear();
        }
        stack.push(rec);
    }

    if !stack.is_empty() {
        flush(&stack, &mut scratch, file, out)?;
    }
    Ok(())
}
