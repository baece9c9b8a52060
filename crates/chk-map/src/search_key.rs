use aviary_interner::Key;

/// `CRC-32` (IEEE 802.3 polynomial, initial register `0`) of a single key
/// component — the hash both search-key functions build on.
fn crc32(component: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(component);
    hasher.finalize()
}

/// Emits `H(k1)_HEX \0 H(k2)_HEX \0 ... H(kn)_HEX`, each field the
/// fixed-width 8-character upper-hex rendering of that component's CRC-32.
/// Output length is always `9n - 1` for an `n`-component key.
#[must_use]
pub fn search_key_16(key: &Key) -> Vec<u8> {
    let mut out = Vec::with_capacity(key.len() * 9 - 1);
    for (i, component) in key.components().iter().enumerate() {
        if i > 0 {
            out.push(0);
        }
        out.extend(format!("{:08X}", crc32(component)).into_bytes());
    }
    out
}

/// Emits the four most-significant (big-endian) bytes of each component's
/// CRC-32, NUL-separated, with any `\n` byte replaced by `_` so the result
/// is safe to store in a line-oriented format. Output length is always
/// `5n - 1` for an `n`-component key.
#[must_use]
pub fn search_key_255(key: &Key) -> Vec<u8> {
    let mut out = Vec::with_capacity(key.len() * 5 - 1);
    for (i, component) in key.components().iter().enumerate() {
        if i > 0 {
            out.push(0);
        }
        for byte in crc32(component).to_be_bytes() {
            out.push(if byte == b'\n' { b'_' } else { byte });
        }
    }
    out
}
