//! Big5 to UTF-8 conversion for legacy `.st` file lines.

use encoding_rs::BIG5;

/// Decodes one raw line of Big5 bytes into a Unicode string.
///
/// Undecodable sequences are replaced with U+FFFD rather than aborting the
/// line. All field offsets downstream are positions in the *decoded*
/// character sequence, never raw byte offsets — a double-byte Big5
/// character counts as one position.
pub fn decode_big5(raw: &[u8]) -> String {
    let (text, _, _) = BIG5.decode(raw);
    text.into_owned()
}
