use crate::XrefError;
use std::collections::BTreeMap;
use std::io::{Result, Write};

/// Cross-reference table collected while objects are written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Xref {
    pub entries: BTreeMap<u32, XrefEntry>,
    /// Total number of entries, including the free entry for object 0.
    pub size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum XrefEntry {
    Free,
    Normal { offset: u32, generation: u16 },
}

impl XrefEntry {
    pub fn offset(&self) -> Option<u32> {
        match *self {
            XrefEntry::Normal { offset, .. } => Some(offset),
            XrefEntry::Free => None,
        }
    }
}

impl Xref {
    pub fn new(size: u32) -> Xref {
        Xref {
            entries: BTreeMap::new(),
            size,
        }
    }

    pub fn get(&self, id: u32) -> Option<&XrefEntry> {
        self.entries.get(&id)
    }

    pub fn insert(&mut self, id: u32, entry: XrefEntry) {
        self.entries.insert(id, entry);
    }

    /// Every object id below `size` must have a recorded offset.
    pub fn check_complete(&self) -> std::result::Result<(), XrefError> {
        for id in 1..self.size {
            match self.get(id) {
                Some(XrefEntry::Normal { .. }) => {}
                _ => return Err(XrefError::Missing(id)),
            }
        }
        if self.entries.len() as u32 + 1 != self.size {
            return Err(XrefError::Size {
                expected: self.size,
                found: self.entries.len() as u32 + 1,
            });
        }
        Ok(())
    }
}

/// Length of one xref line including its two-byte end-of-line.
pub const ENTRY_LEN: usize = 20;

/// Emits the classic `xref` section: one subsection starting at object 0.
pub struct XrefWriter;

impl XrefWriter {
    pub fn write(file: &mut dyn Write, xref: &Xref) -> Result<()> {
        writeln!(file, "xref\n0 {}", xref.size)?;

        let mut write_xref_entry =
            |offset: u32, generation: u16, kind: char| writeln!(file, "{:>010} {:>05} {} ", offset, generation, kind);
        write_xref_entry(0, 65535, 'f')?;

        for obj_id in 1..xref.size {
            match xref.get(obj_id) {
                Some(&XrefEntry::Normal { offset, generation }) => write_xref_entry(offset, generation, 'n')?,
                _ => write_xref_entry(0, 65535, 'f')?,
            }
        }
        Ok(())
    }
}
