mod object;
pub use object::{Dictionary, Object, ObjectId, Stream, StringFormat};

mod document;
pub use document::Document;

mod error;
pub use error::{Error, ParseError, Result, ValidationError, XrefError};

pub mod content;
pub use content::ContentBuilder;

mod encodings;
mod options;
pub use options::{ReportOptions, ReportOptionsBuilder};

mod summary;
pub use summary::{ReportText, SummaryInput, SummaryRecord, format_decimal};

mod table;
pub use table::{ObjectKind, ObjectTable, PdfObject};

mod xref;
pub use xref::{Xref, XrefEntry, XrefWriter};

mod writer;
pub use writer::{OffsetTracker, Rendered, Serializer, SerializerState, Writer};

mod reader;
pub use reader::{VerifiedLayout, verify};

mod report;
pub use report::{generate, generate_from_record};

#[cfg(feature = "serde")]
pub mod boundary;
