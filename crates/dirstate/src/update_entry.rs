use crate::compare::split_dirname;
use crate::pack_stat::pack_stat;

/// The subset of a filesystem `stat()` result `update_entry` needs. The
/// core never performs the syscall itself; the caller supplies this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    pub kind: FileKind,
    pub size: u64,
    pub mtime_s: u64,
    pub ctime_s: u64,
    pub st_dev: u64,
    pub st_ino: u64,
    pub st_mode: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Directory,
    Symlink,
    Other,
}

/// Freshly observed content, computed by the caller only when the fast
/// path misses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreshContent {
    File { sha1: String },
    Symlink { target: String },
    Directory,
}

/// An entry's state in the current working tree, as stored in one
/// dirstate record's tree-0 fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryState {
    pub minikind: u8,
    pub fingerprint: Vec<u8>,
    pub size: u64,
    pub is_executable: bool,
    /// Empty means "unknown, must be recomputed" — the null fingerprint.
    pub packed_stat: String,
}

/// The dirblocks known to exist, keyed by dirname; `update_entry` consults
/// this when an entry transitions to or from a directory.
#[derive(Debug, Default)]
pub struct DirblockIndex {
    dirnames: Vec<Vec<u8>>,
}

impl DirblockIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ensure_dirblock(&mut self, dirname: &[u8]) {
        if !self.dirnames.iter().any(|d| d == dirname) {
            self.dirnames.push(dirname.to_vec());
        }
    }

    #[must_use]
    pub fn contains(&self, dirname: &[u8]) -> bool {
        self.dirnames.iter().any(|d| d == dirname)
    }
}

const KIND_FILE: u8 = b'f';
const KIND_DIRECTORY: u8 = b'd';
const KIND_SYMLINK: u8 = b'l';

/// Updates `entry` in place against a fresh `stat`, matching the saved
/// fingerprint without recomputing content when possible.
///
/// `fresh_content` is only invoked when the fast path misses, so callers
/// may defer sha1 hashing or `readlink` until it's actually needed. Two
/// same-size content edits landing within one `cutoff_time` tick of each
/// other can alias to the same packed-stat footprint; closing that window
/// is the caller's responsibility, not this function's.
pub fn update_entry(
    path: &[u8],
    entry: &mut EntryState,
    stat: &Stat,
    cutoff_time: u64,
    fresh_content: impl FnOnce() -> FreshContent,
    dirblocks: &mut DirblockIndex,
) -> Option<()> {
    let new_minikind = match stat.kind {
        FileKind::File => KIND_FILE,
        FileKind::Directory => KIND_DIRECTORY,
        FileKind::Symlink => KIND_SYMLINK,
        FileKind::Other => return None,
    };

    let fresh_packed =
        pack_stat(stat.size, stat.mtime_s, stat.ctime_s, stat.st_dev, stat.st_ino, stat.st_mode);

    let kind_changed = entry.minikind != new_minikind;
    if !kind_changed && !entry.packed_stat.is_empty() && entry.packed_stat == fresh_packed {
        if new_minikind == KIND_DIRECTORY {
            entry.fingerprint.clear();
            entry.size = 0;
        }
        return Some(());
    }

    match fresh_content() {
        FreshContent::File { sha1 } => {
            entry.fingerprint = sha1.into_bytes();
            entry.size = stat.size;
            entry.is_executable = stat.st_mode & 0o111 != 0;
        }
        FreshContent::Symlink { target } => {
            entry.fingerprint = target.into_bytes();
            entry.size = 0;
            entry.is_executable = false;
        }
        FreshContent::Directory => {
            entry.fingerprint.clear();
            entry.size = 0;
            entry.is_executable = false;
        }
    }

    if kind_changed && (entry.minikind == KIND_DIRECTORY || new_minikind == KIND_DIRECTORY) {
        dirblocks.ensure_dirblock(path);
    }
    entry.minikind = new_minikind;

    entry.packed_stat = if stat.mtime_s < cutoff_time && stat.ctime_s < cutoff_time {
        fresh_packed
    } else {
        String::new()
    };

    Some(())
}

#[must_use]
pub fn dirname_of(path: &[u8]) -> &[u8] {
    split_dirname(path).0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_stat(size: u64, mtime_s: u64) -> Stat {
        Stat { kind: FileKind::File, size, mtime_s, ctime_s: mtime_s, st_dev: 1, st_ino: 2, st_mode: 0o100_644 }
    }

    #[test]
    fn unsupported_kind_leaves_entry_untouched_and_returns_none() {
        let mut entry =
            EntryState { minikind: KIND_FILE, fingerprint: b"old".to_vec(), size: 1, is_executable: false, packed_stat: String::new() };
        let stat = Stat { kind: FileKind::Other, size: 0, mtime_s: 0, ctime_s: 0, st_dev: 0, st_ino: 0, st_mode: 0 };
        let mut dirblocks = DirblockIndex::new();
        let result = update_entry(b"f", &mut entry, &stat, 1000, || unreachable!("must not probe content"), &mut dirblocks);
        assert!(result.is_none());
        assert_eq!(entry.fingerprint, b"old");
    }

    #[test]
    fn fast_path_reuses_saved_fingerprint_when_packed_stat_is_unchanged() {
        let stat = file_stat(10, 5);
        let packed = pack_stat(stat.size, stat.mtime_s, stat.ctime_s, stat.st_dev, stat.st_ino, stat.st_mode);
        let mut entry =
            EntryState { minikind: KIND_FILE, fingerprint: b"sha-old".to_vec(), size: 10, is_executable: false, packed_stat: packed };
        let mut dirblocks = DirblockIndex::new();
        update_entry(b"f", &mut entry, &stat, 1000, || unreachable!("fast path must not probe content"), &mut dirblocks)
            .unwrap();
        assert_eq!(entry.fingerprint, b"sha-old");
    }

    #[test]
    fn stale_fingerprint_within_cutoff_forces_a_null_fingerprint() {
        let stat = file_stat(10, 5);
        let mut entry =
            EntryState { minikind: KIND_FILE, fingerprint: b"sha-old".to_vec(), size: 3, is_executable: false, packed_stat: String::new() };
        let mut dirblocks = DirblockIndex::new();
        update_entry(
            b"f",
            &mut entry,
            &stat,
            /* cutoff_time */ 0,
            || FreshContent::File { sha1: "sha-new".to_string() },
            &mut dirblocks,
        )
        .unwrap();
        assert_eq!(entry.fingerprint, b"sha-new");
        assert!(entry.packed_stat.is_empty(), "mtime/ctime at or after cutoff must force a recheck next time");
    }

    #[test]
    fn transition_to_directory_registers_a_dirblock() {
        let mut entry =
            EntryState { minikind: KIND_FILE, fingerprint: b"sha".to_vec(), size: 3, is_executable: false, packed_stat: String::new() };
        let stat = Stat { kind: FileKind::Directory, size: 0, mtime_s: 5, ctime_s: 5, st_dev: 1, st_ino: 2, st_mode: 0o040_755 };
        let mut dirblocks = DirblockIndex::new();
        update_entry(b"a/b", &mut entry, &stat, 1000, || FreshContent::Directory, &mut dirblocks).unwrap();
        assert!(dirblocks.contains(b"a/b"));
        assert_eq!(entry.minikind, KIND_DIRECTORY);
    }
}
