//! Filename decoding. Ingestion never aborts on a bad name: UTF-8 first,
//! then ISO-8859-1, then UTF-8 with replacement characters.

use std::ffi::OsStr;

use tracing::error;

/// ISO-8859-1 decode. Bytes 0x80..=0x9F are C1 control codes, never part of
/// a printable name, and are rejected.
fn decode_latin1(bytes: &[u8]) -> Option<String> {
    if bytes.iter().any(|b| (0x80..=0x9F).contains(b)) {
        return None;
    }
    Some(bytes.iter().map(|&b| b as char).collect())
}

pub fn decode_name(bytes: &[u8]) -> String {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }
    if let Some(s) = decode_latin1(bytes) {
        return s;
    }
    let lossy = String::from_utf8_lossy(bytes).into_owned();
    error!(target: "canopy::ingest", "undecodable filename, replaced invalid bytes: {}", lossy);
    lossy
}

#[cfg(unix)]
pub fn decode_os(name: &OsStr) -> String {
    use std::os::unix::ffi::OsStrExt;
    decode_name(name.as_bytes())
}

#[cfg(not(unix))]
pub fn decode_os(name: &OsStr) -> String {
    match name.to_str() {
        Some(s) => s.to_string(),
        None => {
            let lossy = name.to_string_lossy().into_owned();
            error!(target: "canopy::ingest", "undecodable filename, replaced invalid bytes: {}", lossy);
            lossy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_passes_through() {
        assert_eq!(decode_name("café.txt".as_bytes()), "café.txt");
    }

    #[test]
    fn latin1_fallback() {
        // "café" in ISO-8859-1
        assert_eq!(decode_name(&[0x63, 0x61, 0x66, 0xE9]), "café");
    }

    #[test]
    fn lossy_last_resort() {
        let got = decode_name(&[0x61, 0x81, 0x62]);
        assert_eq!(got, "a\u{FFFD}b");
    }
}
