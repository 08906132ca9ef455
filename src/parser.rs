//! Text tokenizer: a character-driven state machine that turns one input
//! line into a [`TlvLine`] record.
//!
//! Two line forms are recognized. A line whose first non-indent character
//! is a hex digit is a raw (headless) payload; everything else must match
//!
//! ```text
//! "TLV" ("8" | "16")? "[" tag ("," flag)* "]" ":" payload?
//! ```
//!
//! where the payload is a double-quoted string (with `\c` and `\ddd`
//! escapes) or hex byte pairs. A missing payload means the element's
//! content follows as deeper-indented lines. `#` at the indent position
//! starts a comment that consumes the rest of the line. Indentation is
//! captured verbatim; the level is derived later by comparing indent
//! strings, never stated in the text.
//!
//! Any character that does not fit the current grammar position is fatal:
//! the error names the input file and 1-based line, and parsing stops.

use crate::error::{FormatError, UndumpError};
use crate::tlv::{MAX_PAYLOAD, MAX_TAG};
use std::io::{self, BufRead};

/// Explicit header width requested in the text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForcedWidth {
    Tlv8,
    Tlv16,
}

/// One parsed text line. `level` is filled in by the tree builder.
#[derive(Debug, Clone, Default)]
pub struct TlvLine {
    /// Exact run of space/tab bytes preceding the first content character.
    pub indent: Vec<u8>,
    /// Literal payload bytes; empty when the element's content is nested.
    pub data: Vec<u8>,
    pub level: usize,
    pub tag: u16,
    pub is_forward: bool,
    pub is_non_critical: bool,
    pub force: Option<ForcedWidth>,
    /// No binary header is emitted; the payload bytes stand alone.
    pub headless: bool,
    /// 1-based source line, for diagnostics.
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Begin,
    Comment,
    Indent,
    RawContent,
    TlvT,
    TlvL,
    TlvV,
    Force,
    Force16,
    BracketBegin,
    TagBegin,
    Tag,
    FlagStart,
    Flag,
    FlagEnd,
    BracketEnd,
    Colon,
    Data,
    DataString,
    DataStringEsc,
    DataStringDec1,
    DataStringDec2,
    DataStringDec3,
    DataHex1,
    DataHex2,
    End,
}

fn is_space(c: u8) -> bool {
    c == b' ' || c == b'\t'
}

fn hex_val(c: u8) -> u8 {
    (c as char).to_digit(16).expect("hex digit") as u8
}

/// Line tokenizer over a buffered byte source.
pub struct Tokenizer<R> {
    input: R,
    file: String,
    line_nr: usize,
}

impl<R: BufRead> Tokenizer<R> {
    pub fn new(input: R, file: &str) -> Self {
        Tokenizer {
            input,
            file: file.to_string(),
            line_nr: 0,
        }
    }

    /// The input name used in diagnostics.
    pub fn file_name(&self) -> &str {
        &self.file
    }

    fn getc(&mut self) -> Result<Option<u8>, UndumpError> {
        let mut byte = [0u8; 1];
        loop {
            match self.input.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(UndumpError::Io(e)),
            }
        }
    }

    fn err(&self, source: FormatError) -> UndumpError {
        UndumpError::format(&self.file, self.line_nr, source)
    }

    fn push_data(&self, rec: &mut TlvLine, b: u8) -> Result<(), UndumpError> {
        if rec.data.len() >= MAX_PAYLOAD {
            return Err(self.err(FormatError::StringTooLarge));
        }
        rec.data.push(b);
        Ok(())
    }

    /// Parse the next record, skipping blank and comment lines. Returns
    /// `Ok(None)` at a clean end of input.
    pub fn next_line(&mut self) -> Result<Option<TlvLine>, UndumpError> {
        let mut rec = TlvLine::default();
        let mut state = State::Begin;
        let mut tag: u32 = 0;
        let mut pending: u8 = 0;

        self.line_nr += 1;
        let mut c = self.getc()?;
        loop {
            match state {
                State::Begin => match c {
                    Some(ch) if ch.is_ascii_hexdigit() => {
                        state = State::RawContent;
                        continue;
                    }
                    Some(b'\n') => {
                        self.line_nr += 1;
                    }
                    Some(b'\r') => {}
                    None => return Ok(None),
                    Some(_) => {
                        state = State::Indent;
                        continue;
                    }
                },
                State::Comment => match c {
                    Some(b'\n') => {
                        self.line_nr += 1;
                        state = State::Begin;
                    }
                    None => {
                        state = State::Begin;
                        continue;
                    }
                    Some(_) => {}
                },
                State::Indent => match c {
                    Some(ch) if is_space(ch) => rec.indent.push(ch),
                    Some(b'#') => {
                        // A comment line contributes no record.
                        rec.indent.clear();
                        state = State::Comment;
                    }
                    Some(ch) if ch.is_ascii_hexdigit() => {
                        state = State::RawContent;
                        continue;
                    }
                    _ => {
                        state = State::TlvT;
                        continue;
                    }
                },
                State::RawContent => {
                    rec.headless = true;
                    state = State::DataHex1;
                    continue;
                }
                State::TlvT => match c {
                    Some(b'T') => state = State::TlvL,
                    _ => return Err(self.err(FormatError::Expected('T'))),
                },
                State::TlvL => match c {
                    Some(b'L') => state = State::TlvV,
                    _ => return Err(self.err(FormatError::Expected('L'))),
                },
                State::TlvV => match c {
                    Some(b'V') => state = State::Force,
                    _ => return Err(self.err(FormatError::Expected('V'))),
                },
                State::Force => match c {
                    Some(b'1') => state = State::Force16,
                    Some(b'8') => {
                        rec.force = Some(ForcedWidth::Tlv8);
                        state = State::BracketBegin;
                    }
                    _ => {
                        state = State::BracketBegin;
                        continue;
                    }
                },
                State::Force16 => match c {
                    Some(b'6') => {
                        rec.force = Some(ForcedWidth::Tlv16);
                        state = State::BracketBegin;
                    }
                    _ => return Err(self.err(FormatError::Expected('6'))),
                },
                State::BracketBegin => match c {
                    Some(ch) if is_space(ch) => {}
                    Some(b'[') => state = State::TagBegin,
                    _ => return Err(self.err(FormatError::Expected('['))),
                },
                State::TagBegin => match c {
                    Some(ch) if is_space(ch) => {}
                    Some(ch) if ch.is_ascii_hexdigit() => {
                        state = State::Tag;
                        continue;
                    }
                    _ => return Err(self.err(FormatError::ExpectedTag)),
                },
                State::Tag => match c {
                    Some(ch) if ch.is_ascii_hexdigit() => {
                        tag = tag << 4 | u32::from(hex_val(ch));
                        if tag > u32::from(MAX_TAG) {
                            return Err(self.err(FormatError::TagTooLarge));
                        }
                    }
                    _ => {
                        state = State::FlagStart;
                        continue;
                    }
                },
                State::FlagStart => match c {
                    Some(ch) if is_space(ch) => {}
                    Some(b',') => state = State::Flag,
                    _ => {
                        state = State::FlagEnd;
                        continue;
                    }
                },
                State::Flag => match c {
                    Some(ch) if is_space(ch) => {}
                    Some(ch) if ch.to_ascii_uppercase() == b'F' => {
                        rec.is_forward = true;
                        state = State::FlagEnd;
                    }
                    Some(ch) if ch.to_ascii_uppercase() == b'N' => {
                        rec.is_non_critical = true;
                        state = State::FlagEnd;
                    }
                    _ => return Err(self.err(FormatError::UnexpectedFlag)),
                },
                State::FlagEnd => match c {
                    Some(ch) if is_space(ch) => {}
                    Some(b',') => {
                        state = State::FlagStart;
                        continue;
                    }
                    _ => {
                        state = State::BracketEnd;
                        continue;
                    }
                },
                State::BracketEnd => match c {
                    Some(ch) if is_space(ch) => {}
                    Some(b']') => state = State::Colon,
                    _ => return Err(self.err(FormatError::Expected(']'))),
                },
                State::Colon => match c {
                    Some(ch) if is_space(ch) => {}
                    Some(b':') => state = State::Data,
                    _ => return Err(self.err(FormatError::Expected(':'))),
                },
                State::Data => match c {
                    Some(ch) if is_space(ch) => {}
                    Some(b'"') => state = State::DataString,
                    Some(b'\n') | None => {
                        state = State::End;
                        continue;
                    }
                    Some(_) => {
                        state = State::DataHex1;
                        continue;
                    }
                },
                State::DataString => match c {
                    Some(b'\\') => state = State::DataStringEsc,
                    Some(b'"') => state = State::End,
                    Some(ch) => self.push_data(&mut rec, ch)?,
                    None => return Err(self.err(FormatError::UnexpectedEof)),
                },
                State::DataStringEsc => match c {
                    Some(ch) if ch.is_ascii_digit() => {
                        state = State::DataStringDec1;
                        continue;
                    }
                    Some(ch) => {
                        self.push_data(&mut rec, ch)?;
                        state = State::DataString;
                    }
                    None => return Err(self.err(FormatError::UnexpectedEof)),
                },
                State::DataStringDec1 => match c {
                    Some(ch) if ch.is_ascii_digit() => {
                        pending = ch - b'0';
                        state = State::DataStringDec2;
                    }
                    _ => return Err(self.err(FormatError::UnexpectedEof)),
                },
                State::DataStringDec2 => match c {
                    Some(ch) if ch.is_ascii_digit() => {
                        pending = pending.wrapping_mul(10).wrapping_add(ch - b'0');
                        state = State::DataStringDec3;
                    }
                    _ => {
                        self.push_data(&mut rec, pending)?;
                        state = State::DataString;
                        continue;
                    }
                },
                State::DataStringDec3 => match c {
                    Some(ch) if ch.is_ascii_digit() => {
                        pending = pending.wrapping_mul(10).wrapping_add(ch - b'0');
                        self.push_data(&mut rec, pending)?;
                        state = State::DataString;
                    }
                    _ => {
                        self.push_data(&mut rec, pending)?;
                        state = State::DataString;
                        continue;
                    }
                },
                State::DataHex1 => match c {
                    Some(ch) if is_space(ch) => {}
                    Some(ch) if ch.is_ascii_hexdigit() => {
                        pending = hex_val(ch) << 4;
                        state = State::DataHex2;
                    }
                    _ => {
                        state = State::End;
                        continue;
                    }
                },
                State::DataHex2 => match c {
                    Some(ch) if is_space(ch) => {}
                    Some(ch) if ch.is_ascii_hexdigit() => {
                        self.push_data(&mut rec, pending | hex_val(ch))?;
                        state = State::DataHex1;
                    }
                    // A trailing lone digit would start a byte that never
                    // completes; reject rather than pad or truncate.
                    _ => return Err(self.err(FormatError::OddHexDigit)),
                },
                State::End => match c {
                    Some(ch) if is_space(ch) => {}
                    Some(b'\n') | None => {
                        rec.tag = tag as u16;
                        rec.line = self.line_nr;
                        return Ok(Some(rec));
                    }
                    Some(_) => return Err(self.err(FormatError::UnexpectedCharacter)),
                },
            }
            c = self.getc()?;
        }
    }
}
