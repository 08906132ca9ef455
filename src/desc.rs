//! Tag descriptor database: maps TLV tags to display labels and permitted
//! child tags. Consulted by the dumper for annotation (`# label` lines) and
//! for strict-type nested validation. The codec works without one; only
//! annotation and strict mode degrade.
//!
//! File format, one entry per line:
//!
//! ```text
//! # aggregation response
//! 0800       Aggregation hash chain
//! 0800.02    Aggregation time
//! 0800.03
//! ```
//!
//! Dotted hex paths nest entries under their parent tag. A path with no
//! label still registers the tag for strict-mode membership. `#` starts a
//! comment line; blank lines are skipped.

use crate::tlv::MAX_TAG;
use std::collections::HashMap;
use std::io;
use std::path::Path;

/// One known tag: optional display label plus the set of known child tags.
#[derive(Debug, Clone, Default)]
pub struct Descriptor {
    pub text: Option<String>,
    children: HashMap<u16, Descriptor>,
}

impl Descriptor {
    /// Look up a child tag of this descriptor.
    pub fn find(&self, tag: u16) -> Option<&Descriptor> {
        self.children.get(&tag)
    }
}

/// Top-level descriptor set, indexed by tag.
#[derive(Debug, Clone, Default)]
pub struct DescriptorSet {
    map: HashMap<u16, Descriptor>,
}

#[derive(Debug, thiserror::Error)]
pub enum DescError {
    #[error("line {line}: invalid tag path '{path}'")]
    InvalidTag { line: usize, path: String },
    #[error("I/O: {0}")]
    Io(#[from] io::Error),
}

impl DescriptorSet {
    /// Look up a top-level tag.
    pub fn find(&self, tag: u16) -> Option<&Descriptor> {
        self.map.get(&tag)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Register one tag path, overwriting any label already present at the
    /// leaf. Intermediate descriptors are created without labels.
    pub fn insert(&mut self, path: &[u16], text: Option<&str>) {
        let (first, rest) = match path.split_first() {
            Some(split) => split,
            None => return,
        };
        let mut node = self.map.entry(*first).or_insert_with(Descriptor::default);
        for tag in rest {
            node = node.children.entry(*tag).or_insert_with(Descriptor::default);
        }
        if let Some(text) = text {
            node.text = Some(text.to_string());
        }
    }

    /// Parse a descriptor database from text.
    pub fn parse(src: &str) -> Result<Self, DescError> {
        let mut set = DescriptorSet::default();
        for (idx, raw) in src.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (path_str, text) = match line.find(|c: char| c.is_ascii_whitespace()) {
                Some(i) => (&line[..i], Some(line[i..].trim())),
                None => (line, None),
            };
            let mut path = Vec::new();
            for part in path_str.split('.') {
                let tag = u16::from_str_radix(part, 16).ok().filter(|t| *t <= MAX_TAG);
                match tag {
                    Some(tag) => path.push(tag),
                    None => {
                        return Err(DescError::InvalidTag {
                            line: idx + 1,
                            path: path_str.to_string(),
                        })
                    }
                }
            }
            set.insert(&path, text);
        }
        Ok(set)
    }

    /// Load a descriptor database file.
    pub fn load(path: &Path) -> Result<Self, DescError> {
        Self::parse(&std::fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_nested_paths() {
        let set = DescriptorSet::parse(
            "# header comment\n\
             0800    Aggregation hash chain\n\
             0800.02 Aggregation time\n\
             0800.03\n\
             \n\
             1f      Padding\n",
        )
        .expect("parse");
        let root = set.find(0x800).expect("root");
        assert_eq!(root.text.as_deref(), Some("Aggregation hash chain"));
        assert_eq!(
            root.find(0x02).and_then(|d| d.text.as_deref()),
            Some("Aggregation time")
        );
        assert!(root.find(0x03).expect("bare tag").text.is_none());
        assert!(set.find(0x1f).is_some());
        assert!(set.find(0x801).is_none());
    }

    #[test]
    fn intermediate_entries_created_without_label() {
        let set = DescriptorSet::parse("0100.05 Leaf only\n").expect("parse");
        let root = set.find(0x100).expect("implicit parent");
        assert!(root.text.is_none());
        assert_eq!(root.find(0x05).and_then(|d| d.text.as_deref()), Some("Leaf only"));
    }

    #[test]
    fn rejects_bad_tag() {
        let err = DescriptorSet::parse("xyz Broken\n").unwrap_err();
        assert!(matches!(err, DescError::InvalidTag { line: 1, .. }));
        // 13-bit ceiling applies to every path element
        let err = DescriptorSet::parse("2000 Too big\n").unwrap_err();
        assert!(matches!(err, DescError::InvalidTag { .. }));
    }
}
