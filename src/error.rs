use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The summary record was rejected before any byte was written.
    #[error("invalid summary: {0}")]
    Validation(#[from] ValidationError),
    /// An Object has the wrong type, e.g. the Object is an Array where a Name would be expected.
    #[error("object has wrong type; expected type {expected} but found type {found}")]
    ObjectType {
        expected: &'static str,
        found: &'static str,
    },
    /// Dictionary key was not found.
    #[error("missing required dictionary key \"{0}\"")]
    DictKey(String),
    /// The fixed object table does not describe a well-formed document.
    #[error("broken document structure: {0}")]
    Structure(String),
    /// The serializer was stepped after it finished or failed.
    #[error("serializer cannot advance from state {0}")]
    SerializerState(&'static str),
    /// Error while writing or checking the cross reference table.
    #[error("invalid cross-reference table: {0}")]
    Xref(#[from] XrefError),
    /// Failed to parse generated output.
    #[error("couldn't parse output: {0}")]
    Parse(#[from] ParseError),
    /// IO error
    #[error("io error: {0}")]
    IO(#[from] std::io::Error),
}

impl Error {
    /// Validation failures are the caller's fault; everything else is ours.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("required field \"{0}\" is missing")]
    MissingField(&'static str),
    #[error("field \"{field}\" must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("field \"{0}\" must not be negative")]
    Negative(&'static str),
    #[error("field \"{0}\" is too large")]
    OutOfRange(&'static str),
    #[error("field \"{0}\" must be a finite number")]
    NotFinite(&'static str),
    #[error("field \"generatedOn\" is not a date: {0}")]
    InvalidDate(String),
    #[error("request body is not a JSON object")]
    NotAnObject,
    #[error("text {0:?} contains characters the page font cannot encode")]
    Unencodable(String),
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unexpected end of input")]
    EndOfInput,
    #[error("invalid file header")]
    InvalidFileHeader,
    #[error("invalid trailer")]
    InvalidTrailer,
    #[error("invalid object header at byte {0}")]
    InvalidObject(usize),
    #[error("invalid stream at byte {0}")]
    InvalidStream(usize),
}

#[derive(Debug, Error)]
pub enum XrefError {
    /// Could not parse cross reference table.
    #[error("could not parse xref")]
    Parse,
    /// Could not find start of cross reference table.
    #[error("invalid start value")]
    Start,
    /// Entry 0 is not the free list head.
    #[error("entry 0 is not the free sentinel")]
    FreeEntry,
    /// Number of entries differs from the object count plus one.
    #[error("expected {expected} entries but found {found}")]
    Size { expected: u32, found: u32 },
    /// An entry does not point at its object.
    #[error("entry for object {id} points at byte {offset}, which is not its header")]
    Offset { id: u32, offset: u32 },
    /// An object has no entry.
    #[error("object {0} has no entry")]
    Missing(u32),
}
