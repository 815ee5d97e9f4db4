use crate::ValidationError;
use encoding_rs::WINDOWS_1252;

/// Name of the simple font encoding the page font declares.
pub const WIN_ANSI_ENCODING: &str = "WinAnsiEncoding";

/// Convert display text to the single-byte codes the page font expects.
///
/// Windows-1252 is the byte encoding behind `/WinAnsiEncoding`, so the
/// returned bytes are exactly what ends up inside the content stream.
pub fn string_to_bytes(text: &str) -> Result<Vec<u8>, ValidationError> {
    let (bytes, _, had_unmappable) = WINDOWS_1252.encode(text);
    if had_unmappable {
        return Err(ValidationError::Unencodable(text.to_string()));
    }
    Ok(bytes.into_owned())
}

pub fn bytes_to_string(bytes: &[u8]) -> String {
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    text.into_owned()
}

#[test]
fn encodes_german_labels() {
    let bytes = string_to_bytes("Einträge: 12").unwrap();
    assert_eq!(bytes, b"Eintr\xE4ge: 12");
    assert_eq!(bytes_to_string(&bytes), "Einträge: 12");
    assert_eq!(string_to_bytes("€").unwrap(), vec![0x80]);
}

#[test]
fn rejects_text_outside_win_ansi() {
    assert_eq!(
        string_to_bytes("Stunden ≈ 3"),
        Err(ValidationError::Unencodable("Stunden ≈ 3".to_string()))
    );
}
