use super::{Object, StringFormat};
use crate::encodings;
use crate::writer::Writer;
use crate::{ReportOptions, ReportText, Result};
use log::debug;
use std::io::Write;

#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub operator: String,
    pub operands: Vec<Object>,
}

impl Operation {
    pub fn new(operator: &str, operands: Vec<Object>) -> Operation {
        Operation {
            operator: operator.to_string(),
            operands,
        }
    }
}

/// A sequence of page content operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Content {
    pub operations: Vec<Operation>,
}

impl Content {
    /// Encode content operations, one per line.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        for operation in &self.operations {
            for operand in &operation.operands {
                Writer::write_object(&mut buffer, operand)?;
                buffer.write_all(b" ")?;
            }
            buffer.write_all(operation.operator.as_bytes())?;
            buffer.write_all(b"\n")?;
        }
        Ok(buffer)
    }
}

/// Lays the report lines out as one text object.
///
/// The first line is placed absolutely, every later line relative to the
/// previous one. Text goes through [`encodings::string_to_bytes`], and
/// reserved characters are escaped when the string is written.
pub struct ContentBuilder<'a> {
    options: &'a ReportOptions,
    operations: Vec<Operation>,
    font_size: Option<i64>,
}

impl<'a> ContentBuilder<'a> {
    pub fn new(options: &'a ReportOptions) -> ContentBuilder<'a> {
        ContentBuilder {
            options,
            operations: vec![Operation::new("BT", vec![])],
            font_size: None,
        }
    }

    /// Build the complete content of the report page.
    pub fn build(text: &ReportText, options: &ReportOptions) -> Result<Content> {
        let mut builder = ContentBuilder::new(options);
        let body = options.body_size;
        let small = options.small_size;

        builder.line_at(options.title_size, options.left, options.top, &text.title)?;
        builder.line(small, options.title_size + 4, &text.generated_on)?;
        builder.line(options.header_size, 2 * options.leading, &text.section_header)?;
        builder.line(body, options.leading + 4, &text.total_hours)?;
        builder.line(body, options.leading, &text.entry_count)?;
        builder.line(body, options.leading, &text.average_hours)?;
        if let Some(invalid) = &text.invalid_count {
            builder.line(small, options.leading, invalid)?;
        }
        if let Some(note) = &text.note {
            builder.line(small, options.leading + 6, note)?;
        }
        Ok(builder.finish())
    }

    /// Show text at an absolute position.
    pub fn line_at(&mut self, size: i64, x: i64, y: i64, text: &str) -> Result<&mut Self> {
        self.select_font(size);
        self.operations.push(Operation::new("Td", vec![x.into(), y.into()]));
        self.show(text)
    }

    /// Show text `dy` units below the previous line.
    pub fn line(&mut self, size: i64, dy: i64, text: &str) -> Result<&mut Self> {
        self.select_font(size);
        self.operations.push(Operation::new("Td", vec![0.into(), (-dy).into()]));
        self.show(text)
    }

    fn select_font(&mut self, size: i64) {
        if self.font_size != Some(size) {
            self.operations.push(Operation::new(
                "Tf",
                vec![Object::from(self.options.font_resource.as_str()), size.into()],
            ));
            self.font_size = Some(size);
        }
    }

    fn show(&mut self, text: &str) -> Result<&mut Self> {
        let bytes = encodings::string_to_bytes(text)?;
        self.operations
            .push(Operation::new("Tj", vec![Object::String(bytes, StringFormat::Literal)]));
        Ok(self)
    }

    pub fn finish(mut self) -> Content {
        self.operations.push(Operation::new("ET", vec![]));
        debug!("content has {} operations", self.operations.len());
        Content {
            operations: self.operations,
        }
    }
}
