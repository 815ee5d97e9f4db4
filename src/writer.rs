use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use super::Object::*;
use super::{Dictionary, Document, Object, Stream, StringFormat};
use crate::xref::*;
use crate::{Error, ObjectId, Result};
use log::debug;

/// Marker comment after the version line; its bytes above 127 flag the file as binary.
const BINARY_MARKER: &[u8] = b"%\xE2\xE3\xCF\xD3\n";

impl Document {
    /// Save PDF document to specified file path.
    ///
    /// The file is only created once the whole document has been serialized.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<File> {
        let rendered = self.render()?;
        let mut file = BufWriter::new(File::create(path)?);
        file.write_all(&rendered.bytes)?;
        file.into_inner().map_err(|err| Error::IO(err.into_error()))
    }

    /// Save PDF to arbitrary target
    pub fn save_to<W: Write>(&self, target: &mut W) -> Result<()> {
        let rendered = self.render()?;
        target.write_all(&rendered.bytes)?;
        Ok(())
    }

    /// Serialize into memory, keeping the recorded offsets.
    pub fn render(&self) -> Result<Rendered> {
        Serializer::new(self).run()
    }
}

/// A finished document together with the layout recorded while writing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub bytes: Vec<u8>,
    pub xref: Xref,
    /// Byte offset of the `xref` keyword.
    pub xref_start: usize,
}

/// Where the serializer currently is. States never repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializerState {
    Header,
    WritingObjects { next: usize },
    WritingXref,
    WritingTrailer,
    Done,
    Failed,
}

impl SerializerState {
    pub fn name(&self) -> &'static str {
        match self {
            SerializerState::Header => "Header",
            SerializerState::WritingObjects { .. } => "WritingObjects",
            SerializerState::WritingXref => "WritingXref",
            SerializerState::WritingTrailer => "WritingTrailer",
            SerializerState::Done => "Done",
            SerializerState::Failed => "Failed",
        }
    }
}

/// Single pass writer for a [`Document`].
///
/// Each [`step`](Serializer::step) performs one state transition. Output only
/// leaves the serializer through [`finish`](Serializer::finish), and only
/// after it reached `Done`.
pub struct Serializer<'a> {
    document: &'a Document,
    target: OffsetTracker<Vec<u8>>,
    xref: Xref,
    xref_start: usize,
    state: SerializerState,
}

impl<'a> Serializer<'a> {
    pub fn new(document: &'a Document) -> Serializer<'a> {
        Serializer {
            document,
            target: OffsetTracker::new(Vec::new()),
            xref: Xref::new(document.table.max_id() + 1),
            xref_start: 0,
            state: SerializerState::Header,
        }
    }

    pub fn state(&self) -> SerializerState {
        self.state
    }

    /// Byte position the next write lands on.
    pub fn position(&self) -> usize {
        self.target.position()
    }

    pub fn step(&mut self) -> Result<SerializerState> {
        let result = self.advance();
        match result {
            Ok(state) => {
                debug!("{} -> {} at byte {}", self.state.name(), state.name(), self.position());
                self.state = state;
                Ok(state)
            }
            Err(err) => {
                self.state = SerializerState::Failed;
                Err(err)
            }
        }
    }

    fn advance(&mut self) -> Result<SerializerState> {
        let objects = self.document.table.objects();
        match self.state {
            SerializerState::Header => {
                writeln!(self.target, "%PDF-{}", self.document.version)?;
                self.target.write_all(BINARY_MARKER)?;
                Ok(SerializerState::WritingObjects { next: 0 })
            }
            SerializerState::WritingObjects { next } => {
                if let Some(object) = objects.get(next) {
                    Writer::write_indirect_object(&mut self.target, object.id, &object.body, &mut self.xref)?;
                    Ok(SerializerState::WritingObjects { next: next + 1 })
                } else {
                    Ok(SerializerState::WritingXref)
                }
            }
            SerializerState::WritingXref => {
                self.xref.check_complete()?;
                self.xref_start = self.target.position();
                XrefWriter::write(&mut self.target, &self.xref)?;
                Ok(SerializerState::WritingTrailer)
            }
            SerializerState::WritingTrailer => {
                let mut trailer = self.document.trailer.clone();
                trailer.set("Size", i64::from(self.xref.size));
                self.target.write_all(b"trailer\n")?;
                Writer::write_dictionary(&mut self.target, &trailer)?;
                write!(self.target, "\nstartxref\n{}\n%%EOF\n", self.xref_start)?;
                Ok(SerializerState::Done)
            }
            SerializerState::Done | SerializerState::Failed => Err(Error::SerializerState(self.state.name())),
        }
    }

    /// Drive the remaining states and hand out the buffer.
    pub fn run(mut self) -> Result<Rendered> {
        while self.state != SerializerState::Done {
            self.step()?;
        }
        self.finish()
    }

    pub fn finish(self) -> Result<Rendered> {
        if self.state != SerializerState::Done {
            return Err(Error::SerializerState(self.state.name()));
        }
        Ok(Rendered {
            bytes: self.target.into_inner(),
            xref: self.xref,
            xref_start: self.xref_start,
        })
    }
}

pub struct Writer;

impl Writer {
    fn need_separator(object: &Object) -> bool {
        matches!(*object, Null | Boolean(_) | Integer(_) | Real(_) | Reference(_))
    }

    fn write_indirect_object<W: Write>(
        file: &mut OffsetTracker<W>, id: ObjectId, object: &Object, xref: &mut Xref,
    ) -> io::Result<()> {
        let offset = u32::try_from(file.position())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "document exceeds 4 GiB"))?;
        xref.insert(id.0, XrefEntry::Normal { offset, generation: id.1 });
        debug!("object {} {} at byte {}", id.0, id.1, offset);
        writeln!(file, "{} {} obj", id.0, id.1)?;
        Writer::write_object(file, object)?;
        file.write_all(b"\nendobj\n")?;
        Ok(())
    }

    pub fn write_object(file: &mut dyn Write, object: &Object) -> io::Result<()> {
        match *object {
            Null => file.write_all(b"null"),
            Boolean(value) => file.write_all(if value { &b"true"[..] } else { &b"false"[..] }),
            Integer(value) => {
                let mut buffer = itoa::Buffer::new();
                file.write_all(buffer.format(value).as_bytes())
            }
            Real(value) => Writer::write_real(file, value),
            Name(ref name) => Writer::write_name(file, name),
            String(ref text, ref format) => Writer::write_string(file, text, format),
            Array(ref array) => Writer::write_array(file, array),
            Object::Dictionary(ref dict) => Writer::write_dictionary(file, dict),
            Object::Stream(ref stream) => Writer::write_stream(file, stream),
            Reference(ref id) => write!(file, "{} {} R", id.0, id.1),
        }
    }

    fn write_real(file: &mut dyn Write, value: f64) -> io::Result<()> {
        // PDF has no exponent syntax
        let text = format!("{:.4}", value);
        let text = text.trim_end_matches('0').trim_end_matches('.');
        file.write_all(if text == "-0" { &b"0"[..] } else { text.as_bytes() })
    }

    fn write_name(file: &mut dyn Write, name: &[u8]) -> io::Result<()> {
        file.write_all(b"/")?;
        for &byte in name {
            // white-space and delimiter chars are encoded to # sequences
            // also encode bytes outside of the range 33 (!) to 126 (~)
            if b" \t\n\r\x0C()<>[]{}/%#".contains(&byte) || !(33..=126).contains(&byte) {
                write!(file, "#{:02X}", byte)?;
            } else {
                file.write_all(&[byte])?;
            }
        }
        Ok(())
    }

    fn write_string(file: &mut dyn Write, text: &[u8], format: &StringFormat) -> io::Result<()> {
        match *format {
            // Within a Literal string, backslash (\) and unbalanced parentheses should be escaped.
            // If an end-of-line marker appears within a literal string without a preceding backslash, the result is equivalent to \n.
            // So \r also need be escaped.
            StringFormat::Literal => {
                let mut escape_indice = Vec::new();
                let mut parentheses = Vec::new();
                for (index, &byte) in text.iter().enumerate() {
                    match byte {
                        b'(' => parentheses.push(index),
                        b')' => {
                            if parentheses.pop().is_none() {
                                escape_indice.push(index);
                            }
                        }
                        b'\\' | b'\r' => escape_indice.push(index),
                        _ => continue,
                    }
                }
                escape_indice.append(&mut parentheses);

                file.write_all(b"(")?;
                for (index, &byte) in text.iter().enumerate() {
                    if escape_indice.contains(&index) {
                        file.write_all(b"\\")?;
                        file.write_all(&[if byte == b'\r' { b'r' } else { byte }])?;
                    } else {
                        file.write_all(&[byte])?;
                    }
                }
                file.write_all(b")")?;
            }
            StringFormat::Hexadecimal => {
                file.write_all(b"<")?;
                for &byte in text {
                    write!(file, "{:02X}", byte)?;
                }
                file.write_all(b">")?;
            }
        }
        Ok(())
    }

    fn write_array(file: &mut dyn Write, array: &[Object]) -> io::Result<()> {
        file.write_all(b"[")?;
        let mut first = true;
        for object in array {
            if first {
                first = false;
            } else if Writer::need_separator(object) {
                file.write_all(b" ")?;
            }
            Writer::write_object(file, object)?;
        }
        file.write_all(b"]")?;
        Ok(())
    }

    pub fn write_dictionary(file: &mut dyn Write, dictionary: &Dictionary) -> io::Result<()> {
        file.write_all(b"<<")?;
        for (key, value) in dictionary {
            Writer::write_name(file, key)?;
            if Writer::need_separator(value) {
                file.write_all(b" ")?;
            }
            Writer::write_object(file, value)?;
        }
        file.write_all(b">>")?;
        Ok(())
    }

    /// `/Length` counts the content only, not the end-of-line before `endstream`.
    fn write_stream(file: &mut dyn Write, stream: &Stream) -> io::Result<()> {
        Writer::write_dictionary(file, &stream.dict)?;
        file.write_all(b"\nstream\n")?;
        file.write_all(&stream.content)?;
        file.write_all(b"\nendstream")?;
        Ok(())
    }
}

/// Counts every byte handed to the inner writer.
pub struct OffsetTracker<W: Write> {
    inner: W,
    bytes_written: usize,
}

impl<W: Write> OffsetTracker<W> {
    pub fn new(inner: W) -> OffsetTracker<W> {
        OffsetTracker {
            inner,
            bytes_written: 0,
        }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.bytes_written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for OffsetTracker<W> {
    #[inline]
    fn write(&mut self, buffer: &[u8]) -> io::Result<usize> {
        let result = self.inner.write(buffer);
        if let Ok(bytes) = result {
            self.bytes_written += bytes;
        }
        result
    }

    #[inline]
    fn write_all(&mut self, buffer: &[u8]) -> io::Result<()> {
        self.bytes_written += buffer.len();
        // If this returns `Err` we can’t know how many bytes were actually written (if any)
        // but that doesn’t matter since we’re gonna abort the entire PDF generation anyway.
        self.inner.write_all(buffer)
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
