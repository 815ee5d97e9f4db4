use super::{Dictionary, Object, ObjectId, Stream, StringFormat};
use crate::encodings;
use crate::xref::ENTRY_LEN;
use crate::{Error, ParseError, Result, XrefError};
use log::warn;
use std::collections::BTreeMap;
use std::str::{self, FromStr};

use nom::branch::alt;
use nom::bytes::complete::{tag, take, take_while, take_while1};
use nom::character::complete::{char, digit0, digit1, one_of};
use nom::combinator::{consumed, map, map_opt, map_res, opt, recognize, value};
use nom::multi::{count, fold_many0, many0};
use nom::sequence::{delimited, pair, preceded, terminated};
use nom::{IResult, Parser};

// The unit error type keeps the parser cheap; positions are reported by the caller.
type NomResult<'a, O> = IResult<&'a [u8], O, ()>;

/// What a reader sees when it opens a generated buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedLayout {
    pub version: String,
    /// Byte offset named by `startxref`.
    pub xref_start: usize,
    /// Entry count declared by the xref subsection and the trailer.
    pub size: u32,
    /// Object id to the byte offset its `id 0 obj` header starts at.
    pub offsets: BTreeMap<u32, usize>,
    pub root: ObjectId,
    pub page_count: usize,
    pub objects: BTreeMap<u32, Object>,
    /// Decoded bytes of the page's content stream.
    pub content: Vec<u8>,
}

impl VerifiedLayout {
    /// Strings shown by `Tj` operations, in page order.
    pub fn text_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut operands = Vec::new();
        let mut input = self.content.as_slice();
        while let Ok((rest, token)) = content_token(input) {
            match token {
                Token::Operand(object) => operands.push(object),
                Token::Operator(operator) => {
                    if operator == b"Tj" {
                        if let Some(Object::String(text, _)) = operands.last() {
                            lines.push(encodings::bytes_to_string(text));
                        }
                    }
                    operands.clear();
                }
            }
            if rest.is_empty() || rest.len() == input.len() {
                break;
            }
            input = rest;
        }
        lines
    }
}

/// Re-read a generated buffer the way a conforming reader would and check
/// that every offset, length and reference in it is consistent.
pub fn verify(buffer: &[u8]) -> Result<VerifiedLayout> {
    let (_, version) = header(buffer).map_err(|_| ParseError::InvalidFileHeader)?;
    let xref_start = startxref(buffer)?;
    let section = buffer.get(xref_start..).ok_or(XrefError::Start)?;
    let (rest, (first, size, entries)) = xref_section(section).map_err(|_| XrefError::Parse)?;
    if first != 0 {
        return Err(XrefError::Parse.into());
    }
    match entries.first() {
        Some(&(0, 65535, false)) => {}
        _ => return Err(XrefError::FreeEntry.into()),
    }

    let (_, trailer) = trailer(rest).map_err(|_| ParseError::InvalidTrailer)?;
    let declared = trailer.get(b"Size")?.as_i64()?;
    if declared != i64::from(size) {
        return Err(XrefError::Size {
            expected: size,
            found: u32::try_from(declared).unwrap_or_default(),
        }
        .into());
    }
    let root = trailer.get(b"Root")?.as_reference()?;

    let mut offsets = BTreeMap::new();
    let mut objects = BTreeMap::new();
    for (id, &(offset, _, in_use)) in entries.iter().enumerate().skip(1) {
        let id = id as u32;
        if !in_use {
            return Err(XrefError::Missing(id).into());
        }
        let (found, object) = object_at(buffer, offset as usize)?;
        if found != (id, 0) {
            warn!("xref entry {} points at object {} {}", id, found.0, found.1);
            return Err(XrefError::Offset { id, offset }.into());
        }
        offsets.insert(id, offset as usize);
        objects.insert(id, object);
    }

    let (page_count, content) = check_structure(&objects, root)?;
    Ok(VerifiedLayout {
        version,
        xref_start,
        size,
        offsets,
        root,
        page_count,
        objects,
        content,
    })
}

fn check_structure(objects: &BTreeMap<u32, Object>, root: ObjectId) -> Result<(usize, Vec<u8>)> {
    let get = |id: ObjectId| objects.get(&id.0).ok_or(Error::from(XrefError::Missing(id.0)));
    let broken = |message: &str| Error::Structure(message.to_string());

    let catalog = get(root)?.as_dict()?;
    if !catalog.type_is(b"Catalog") {
        return Err(broken("trailer root is not a catalog"));
    }
    let pages_id = catalog.get(b"Pages")?.as_reference()?;
    let pages = get(pages_id)?.as_dict()?;
    if !pages.type_is(b"Pages") {
        return Err(broken("catalog /Pages is not a page tree"));
    }
    let kids = pages.get(b"Kids")?.as_array()?;
    let page_count = usize::try_from(pages.get(b"Count")?.as_i64()?).map_err(|_| broken("negative page count"))?;
    if kids.len() != 1 || page_count != 1 {
        return Err(broken("page tree must hold exactly one page"));
    }
    let page = get(kids[0].as_reference()?)?.as_dict()?;
    if !page.type_is(b"Page") || page.get(b"Parent")?.as_reference()? != pages_id {
        return Err(broken("page does not point back at its page tree"));
    }
    let stream = get(page.get(b"Contents")?.as_reference()?)?.as_stream()?;
    Ok((page_count, stream.content.clone()))
}

fn object_at(buffer: &[u8], offset: usize) -> Result<(ObjectId, Object)> {
    let invalid = |_| ParseError::InvalidObject(offset);
    let input = buffer.get(offset..).ok_or(ParseError::EndOfInput)?;
    let (input, id) = object_header(input).map_err(invalid)?;
    let (input, object) = object(input).map_err(invalid)?;
    let (input, object) = match object {
        Object::Dictionary(dict) => match stream_start(input) {
            Ok((data, ())) => {
                let length = dict.get(b"Length")?.as_i64()?;
                let bad_stream = || ParseError::InvalidStream(offset);
                let length = usize::try_from(length).map_err(|_| bad_stream())?;
                let content = data.get(..length).ok_or_else(bad_stream)?.to_vec();
                let (rest, ()) = stream_end(&data[length..]).map_err(|_| bad_stream())?;
                (rest, Object::Stream(Stream { dict, content }))
            }
            Err(_) => (input, Object::Dictionary(dict)),
        },
        other => (input, other),
    };
    (space, tag(&b"endobj"[..])).parse(input).map_err(invalid)?;
    Ok((id, object))
}

fn startxref(buffer: &[u8]) -> Result<usize> {
    let at = buffer
        .windows(9)
        .rposition(|window| window == b"startxref")
        .ok_or(XrefError::Start)?;
    let (_, (_, _, offset, _, _)) = (tag(&b"startxref"[..]), eol, unsigned::<usize>, eol, tag(&b"%%EOF"[..]))
        .parse(&buffer[at..])
        .map_err(|_: nom::Err<()>| XrefError::Start)?;
    Ok(offset)
}

#[inline]
fn is_whitespace(c: u8) -> bool {
    b" \t\n\r\0\x0C".contains(&c)
}

#[inline]
fn is_delimiter(c: u8) -> bool {
    b"()<>[]{}/%".contains(&c)
}

#[inline]
fn is_regular(c: u8) -> bool {
    !is_whitespace(c) && !is_delimiter(c)
}

fn eol(input: &[u8]) -> NomResult<'_, ()> {
    value((), alt((tag(&b"\r\n"[..]), tag(&b"\n"[..]), tag(&b"\r"[..])))).parse(input)
}

fn space(input: &[u8]) -> NomResult<'_, ()> {
    value((), take_while(is_whitespace)).parse(input)
}

fn unsigned<T: FromStr>(input: &[u8]) -> NomResult<'_, T> {
    map_res(digit1, |digits: &[u8]| {
        str::from_utf8(digits)
            .ok()
            .and_then(|text| text.parse::<T>().ok())
            .ok_or(())
    })
    .parse(input)
}

fn header(input: &[u8]) -> NomResult<'_, String> {
    map(
        delimited(
            tag(&b"%PDF-"[..]),
            take_while1(|c: u8| c.is_ascii_digit() || c == b'.'),
            eol,
        ),
        |version: &[u8]| String::from_utf8_lossy(version).into_owned(),
    )
    .parse(input)
}

fn xref_entry(input: &[u8]) -> NomResult<'_, (u32, u16, bool)> {
    map_opt(
        consumed((
            unsigned::<u32>,
            tag(&b" "[..]),
            unsigned::<u16>,
            tag(&b" "[..]),
            one_of("nf"),
            alt((tag(&b" \n"[..]), tag(&b" \r"[..]), tag(&b"\r\n"[..]))),
        )),
        |(raw, (offset, _, generation, _, kind, _)): (&[u8], _)| {
            (raw.len() == ENTRY_LEN).then_some((offset, generation, kind == 'n'))
        },
    )
    .parse(input)
}

fn xref_section(input: &[u8]) -> NomResult<'_, (u32, u32, Vec<(u32, u16, bool)>)> {
    let (input, (_, _, first, _, size, _)) =
        (tag(&b"xref"[..]), eol, unsigned::<u32>, tag(&b" "[..]), unsigned::<u32>, eol).parse(input)?;
    let (input, entries) = count(xref_entry, size as usize).parse(input)?;
    Ok((input, (first, size, entries)))
}

fn trailer(input: &[u8]) -> NomResult<'_, Dictionary> {
    preceded((tag(&b"trailer"[..]), space), dictionary).parse(input)
}

fn object_header(input: &[u8]) -> NomResult<'_, ObjectId> {
    map(
        (
            unsigned::<u32>,
            take_while1(is_whitespace),
            unsigned::<u16>,
            take_while1(is_whitespace),
            tag(&b"obj"[..]),
            space,
        ),
        |(id, _, generation, _, _, _)| (id, generation),
    )
    .parse(input)
}

fn stream_start(input: &[u8]) -> NomResult<'_, ()> {
    value((), (space, tag(&b"stream"[..]), eol)).parse(input)
}

fn stream_end(input: &[u8]) -> NomResult<'_, ()> {
    value((), (opt(eol), tag(&b"endstream"[..]))).parse(input)
}

fn number(input: &[u8]) -> NomResult<'_, Object> {
    map_opt(
        recognize((
            opt(one_of("+-")),
            alt((
                recognize((digit1, opt((char('.'), digit0)))),
                recognize((char('.'), digit1)),
            )),
        )),
        |text: &[u8]| {
            let text = str::from_utf8(text).ok()?;
            if text.contains('.') {
                text.parse::<f64>().ok().map(Object::Real)
            } else {
                text.parse::<i64>().ok().map(Object::Integer)
            }
        },
    )
    .parse(input)
}

fn reference(input: &[u8]) -> NomResult<'_, Object> {
    map(
        (
            unsigned::<u32>,
            take_while1(is_whitespace),
            unsigned::<u16>,
            take_while1(is_whitespace),
            tag(&b"R"[..]),
        ),
        |(id, _, generation, _, _)| Object::Reference((id, generation)),
    )
    .parse(input)
}

fn hex_byte(input: &[u8]) -> NomResult<'_, u8> {
    map_opt(take(2usize), |hex: &[u8]| {
        str::from_utf8(hex).ok().and_then(|hex| u8::from_str_radix(hex, 16).ok())
    })
    .parse(input)
}

fn name(input: &[u8]) -> NomResult<'_, Vec<u8>> {
    preceded(
        tag(&b"/"[..]),
        many0(alt((
            preceded(tag(&b"#"[..]), hex_byte),
            map_opt(take(1usize), |c: &[u8]| (c[0] != b'#' && is_regular(c[0])).then_some(c[0])),
        ))),
    )
    .parse(input)
}

/// Balanced parentheses and backslash escapes, as the writer produces them.
fn literal_string(input: &[u8]) -> NomResult<'_, Vec<u8>> {
    let fail = || nom::Err::Error(());
    let (mut rest, _) = tag(&b"("[..]).parse(input)?;
    let mut output = Vec::new();
    let mut depth = 0usize;
    loop {
        let (&byte, tail) = rest.split_first().ok_or_else(fail)?;
        rest = tail;
        match byte {
            b'\\' => {
                let (&escaped, tail) = rest.split_first().ok_or_else(fail)?;
                rest = tail;
                output.push(match escaped {
                    b'n' => b'\n',
                    b'r' => b'\r',
                    b't' => b'\t',
                    b'b' => b'\x08',
                    b'f' => b'\x0C',
                    other => other,
                });
            }
            b'(' => {
                depth += 1;
                output.push(byte);
            }
            b')' if depth == 0 => return Ok((rest, output)),
            b')' => {
                depth -= 1;
                output.push(byte);
            }
            _ => output.push(byte),
        }
    }
}

fn hex_string(input: &[u8]) -> NomResult<'_, Vec<u8>> {
    map(
        delimited(
            tag(&b"<"[..]),
            take_while(|c: u8| c.is_ascii_hexdigit() || is_whitespace(c)),
            tag(&b">"[..]),
        ),
        |digits: &[u8]| {
            let digits: Vec<u8> = digits.iter().copied().filter(u8::is_ascii_hexdigit).collect();
            digits
                .chunks(2)
                .map(|chunk| {
                    let high = (chunk[0] as char).to_digit(16).unwrap_or(0);
                    let low = chunk.get(1).and_then(|&c| (c as char).to_digit(16)).unwrap_or(0);
                    (high * 16 + low) as u8
                })
                .collect()
        },
    )
    .parse(input)
}

fn array(input: &[u8]) -> NomResult<'_, Vec<Object>> {
    delimited(pair(tag(&b"["[..]), space), many0(terminated(object, space)), tag(&b"]"[..])).parse(input)
}

fn dictionary(input: &[u8]) -> NomResult<'_, Dictionary> {
    delimited(
        pair(tag(&b"<<"[..]), space),
        fold_many0(
            terminated(pair(terminated(name, space), object), space),
            Dictionary::new,
            |mut dict, (key, value)| {
                dict.set(key, value);
                dict
            },
        ),
        tag(&b">>"[..]),
    )
    .parse(input)
}

fn object(input: &[u8]) -> NomResult<'_, Object> {
    alt((
        value(Object::Null, tag(&b"null"[..])),
        value(Object::Boolean(true), tag(&b"true"[..])),
        value(Object::Boolean(false), tag(&b"false"[..])),
        reference,
        number,
        map(name, Object::Name),
        map(literal_string, |text| Object::String(text, StringFormat::Literal)),
        map(hex_string, |text| Object::String(text, StringFormat::Hexadecimal)),
        map(array, Object::Array),
        map(dictionary, Object::Dictionary),
    ))
    .parse(input)
}

enum Token<'a> {
    Operand(Object),
    Operator(&'a [u8]),
}

fn content_token(input: &[u8]) -> NomResult<'_, Token<'_>> {
    preceded(
        space,
        alt((
            map(object, Token::Operand),
            map(take_while1(is_regular), Token::Operator),
        )),
    )
    .parse(input)
}
