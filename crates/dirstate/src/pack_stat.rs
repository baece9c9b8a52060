use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;

/// Packs a stat footprint into the 24-byte field dirstate compares fast
/// paths against: six big-endian u32 fields (`size`, `mtime_s`, `ctime_s`,
/// `st_dev`, `st_ino`, `st_mode`), base64-encoded with no padding.
#[must_use]
pub fn pack_stat(size: u64, mtime_s: u64, ctime_s: u64, st_dev: u64, st_ino: u64, st_mode: u32) -> String {
    let mut bytes = [0u8; 24];
    bytes[0..4].copy_from_slice(&(size as u32).to_be_bytes());
    bytes[4..8].copy_from_slice(&(mtime_s as u32).to_be_bytes());
    bytes[8..12].copy_from_slice(&(ctime_s as u32).to_be_bytes());
    bytes[12..16].copy_from_slice(&(st_dev as u32).to_be_bytes());
    bytes[16..20].copy_from_slice(&(st_ino as u32).to_be_bytes());
    bytes[20..24].copy_from_slice(&st_mode.to_be_bytes());
    STANDARD_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_stat_has_no_base64_padding() {
        let packed = pack_stat(0, 0, 0, 0, 0, 0);
        assert!(!packed.contains('='), "STANDARD_NO_PAD must never emit padding");
        // 24 bytes -> 32 base64 characters, no padding needed at that length.
        assert_eq!(packed.len(), 32);
    }

    #[test]
    fn pack_stat_truncates_values_to_32_bits() {
        let a = pack_stat(0xFFFF_FFFF, 0, 0, 0, 0, 0);
        let b = pack_stat(0x1_FFFF_FFFF, 0, 0, 0, 0, 0);
        assert_eq!(a, b, "only the low 32 bits of each field are packed");
    }

    #[test]
    fn pack_stat_is_deterministic() {
        assert_eq!(pack_stat(1, 2, 3, 4, 5, 6), pack_stat(1, 2, 3, 4, 5, 6));
        assert_ne!(pack_stat(1, 2, 3, 4, 5, 6), pack_stat(1, 2, 3, 4, 5, 7));
    }
}
