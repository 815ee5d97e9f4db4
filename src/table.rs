use crate::content::Content;
use crate::encodings::WIN_ANSI_ENCODING;
use crate::{Dictionary, Error, Object, ObjectId, ReportOptions, Result, Stream, dictionary};
use std::fmt;

/// Role of an object in the one-page document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Catalog,
    PageTree,
    Page,
    ContentStream,
    Font,
}

impl ObjectKind {
    /// Creation order; an object's id is its position here plus one.
    pub const ORDER: [ObjectKind; 5] = [
        ObjectKind::Catalog,
        ObjectKind::PageTree,
        ObjectKind::Page,
        ObjectKind::ContentStream,
        ObjectKind::Font,
    ];

    pub fn id(self) -> ObjectId {
        let index = ObjectKind::ORDER.iter().position(|&kind| kind == self).unwrap_or_default();
        (index as u32 + 1, 0)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One indirect object of the document.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub body: Object,
}

/// The fixed set of objects that make up a report page.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectTable {
    objects: Vec<PdfObject>,
    /// maximum object id
    max_id: u32,
}

impl ObjectTable {
    fn empty() -> ObjectTable {
        ObjectTable {
            objects: Vec::with_capacity(ObjectKind::ORDER.len()),
            max_id: 0,
        }
    }

    /// Add an object; ids are handed out sequentially from 1.
    fn add_object<T: Into<Object>>(&mut self, kind: ObjectKind, object: T) -> ObjectId {
        self.max_id += 1;
        let id = (self.max_id, 0);
        self.objects.push(PdfObject {
            id,
            kind,
            body: object.into(),
        });
        id
    }

    /// Wrap encoded page content into the five document objects.
    pub fn new(content: &Content, options: &ReportOptions) -> Result<ObjectTable> {
        let mut table = ObjectTable::empty();
        let pages_id = ObjectKind::PageTree.id();
        let page_id = ObjectKind::Page.id();
        let content_id = ObjectKind::ContentStream.id();
        let font_id = ObjectKind::Font.id();
        let media_box: Vec<Object> = options.media_box.iter().map(|&v| Object::Integer(v)).collect();

        table.add_object(
            ObjectKind::Catalog,
            dictionary! {
                "Type" => "Catalog",
                "Pages" => pages_id,
            },
        );
        table.add_object(
            ObjectKind::PageTree,
            dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
            },
        );
        table.add_object(
            ObjectKind::Page,
            dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => media_box,
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "Font" => dictionary! {
                        options.font_resource.as_str() => font_id,
                    },
                },
            },
        );
        table.add_object(ObjectKind::ContentStream, Stream::new(Dictionary::new(), content.encode()?));
        table.add_object(
            ObjectKind::Font,
            dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => options.base_font.as_str(),
                "Encoding" => WIN_ANSI_ENCODING,
            },
        );

        table.check_structure()?;
        Ok(table)
    }

    pub fn objects(&self) -> &[PdfObject] {
        &self.objects
    }

    pub fn max_id(&self) -> u32 {
        self.max_id
    }

    pub fn get(&self, kind: ObjectKind) -> Option<&PdfObject> {
        self.objects.iter().find(|object| object.kind == kind)
    }

    pub fn catalog_id(&self) -> ObjectId {
        ObjectKind::Catalog.id()
    }

    fn body(&self, kind: ObjectKind) -> Result<&Object> {
        self.get(kind)
            .map(|object| &object.body)
            .ok_or_else(|| Error::Structure(format!("{kind} object is missing")))
    }

    fn expect_ref(dict: &Dictionary, key: &[u8], target: ObjectKind) -> Result<()> {
        let found = dict.get(key)?.as_reference()?;
        if found != target.id() {
            return Err(Error::Structure(format!(
                "/{} points at {} {} R instead of the {target}",
                String::from_utf8_lossy(key),
                found.0,
                found.1
            )));
        }
        Ok(())
    }

    /// Verify ids, kinds and the reference chain between the objects.
    pub fn check_structure(&self) -> Result<()> {
        if self.objects.len() != ObjectKind::ORDER.len() {
            return Err(Error::Structure(format!("expected 5 objects, found {}", self.objects.len())));
        }
        for (index, (object, kind)) in self.objects.iter().zip(ObjectKind::ORDER).enumerate() {
            if object.id != (index as u32 + 1, 0) || object.kind != kind {
                return Err(Error::Structure(format!(
                    "object {} {} has kind {} at position {}",
                    object.id.0, object.id.1, object.kind, index
                )));
            }
        }

        let catalog = self.body(ObjectKind::Catalog)?.as_dict()?;
        Self::expect_ref(catalog, b"Pages", ObjectKind::PageTree)?;

        let pages = self.body(ObjectKind::PageTree)?.as_dict()?;
        let kids = pages.get(b"Kids")?.as_array()?;
        if kids.len() != 1 || kids[0].as_reference()? != ObjectKind::Page.id() || pages.get(b"Count")?.as_i64()? != 1 {
            return Err(Error::Structure("page tree must hold exactly the one page".to_string()));
        }

        let page = self.body(ObjectKind::Page)?.as_dict()?;
        Self::expect_ref(page, b"Parent", ObjectKind::PageTree)?;
        Self::expect_ref(page, b"Contents", ObjectKind::ContentStream)?;
        let fonts = page.get(b"Resources")?.as_dict()?.get(b"Font")?.as_dict()?;
        for (_, font) in fonts {
            if font.as_reference()? != ObjectKind::Font.id() {
                return Err(Error::Structure("font resource does not point at the font".to_string()));
            }
        }

        let stream = self.body(ObjectKind::ContentStream)?.as_stream()?;
        if stream.declared_length() != Some(stream.content.len() as i64) {
            return Err(Error::Structure(format!(
                "content stream declares {:?} bytes but holds {}",
                stream.declared_length(),
                stream.content.len()
            )));
        }

        if !self.body(ObjectKind::Font)?.as_dict()?.type_is(b"Font") {
            return Err(Error::Structure("font object has the wrong type".to_string()));
        }
        Ok(())
    }
}
