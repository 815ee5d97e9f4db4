use super::{Dictionary, Object, ObjectTable};

/// PDF document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// The version of the PDF specification to which the file conforms.
    pub version: String,

    /// The trailer gives the location of the cross-reference table and of certain special objects.
    pub trailer: Dictionary,

    /// The objects that make up the document, in id order.
    pub table: ObjectTable,
}

impl Document {
    /// Wrap a finished object table; the trailer's `/Root` is the table's catalog.
    pub fn new<S: Into<String>>(table: ObjectTable, version: S) -> Document {
        let mut trailer = Dictionary::new();
        trailer.set("Root", Object::Reference(table.catalog_id()));
        Document {
            version: version.into(),
            trailer,
            table,
        }
    }
}
