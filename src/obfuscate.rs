use base64ct::{Base64UrlUnpadded, Encoding};

/// obfuscate_id
///
/// Reversible scrambling for numeric ids exposed in URLs: the decimal digits
/// are XORed against the cycling key and Base64Url-encoded. This is
/// obfuscation, not cryptography — it hides ids from casual enumeration and
/// nothing more. It MUST NOT be used as an access-control mechanism; the
/// gates never consult it.
pub fn obfuscate_id(id: i64, key: &str) -> String {
    let digits = id.to_string();
    let mixed: Vec<u8> = digits
        .bytes()
        .zip(key.bytes().cycle())
        .map(|(byte, key_byte)| byte ^ key_byte)
        .collect();
    Base64UrlUnpadded::encode_string(&mixed)
}

/// reveal_id
///
/// Reverses [`obfuscate_id`]. Any decoding or parse failure yields `None`;
/// callers treat that the same as a missing id.
pub fn reveal_id(text: &str, key: &str) -> Option<i64> {
    let mixed = Base64UrlUnpadded::decode_vec(text).ok()?;
    let digits: Vec<u8> = mixed
        .iter()
        .zip(key.bytes().cycle())
        .map(|(byte, key_byte)| byte ^ key_byte)
        .collect();
    String::from_utf8(digits).ok()?.parse().ok()
}
