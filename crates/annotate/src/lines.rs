/// Splits `bytes` into lines, each keeping its trailing `\n` (a final
/// unterminated fragment is kept too). Mirrors the line-splitting
/// convention the matcher and the annotation arrays are both indexed by.
#[must_use]
pub fn split_lines(bytes: &[u8]) -> Vec<Vec<u8>> {
    if bytes.is_empty() {
        return Vec::new();
    }
    let mut lines = Vec::new();
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'\n' {
            lines.push(bytes[start..=i].to_vec());
            start = i + 1;
        }
    }
    if start < bytes.len() {
        lines.push(bytes[start..].to_vec());
    }
    lines
}
