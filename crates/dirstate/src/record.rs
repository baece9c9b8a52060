use crate::error::{DirstateError, DirstateErrorKind};

/// One tree's view of an entry: `(minikind, fingerprint, size,
/// is_executable, info)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeState {
    pub minikind: u8,
    pub fingerprint: Vec<u8>,
    pub size: u64,
    pub is_executable: bool,
    pub info: Vec<u8>,
}

/// One dirstate record: an entry's identity plus its state across
/// `1 + num_present_parents` trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub dirname: Vec<u8>,
    pub basename: Vec<u8>,
    pub file_id: Vec<u8>,
    pub tree_states: Vec<TreeState>,
}

/// Parses the dirblock section of a dirstate file: NUL-separated fields,
/// one `\n`-terminated record per line. `num_trees` is `1 +
/// num_present_parents`; a record's `dirname` field is present only when
/// it differs from the dirname of the record immediately before it.
pub fn parse_records(bytes: &[u8], num_trees: usize, context: &str) -> Result<Vec<Record>, DirstateError> {
    let base_fields = 2 + 5 * num_trees;
    let mut records = Vec::new();
    let mut current_dirname: Vec<u8> = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let rest = &bytes[pos..];
        let newline = rest
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| DirstateError::corrupt_in(context, DirstateErrorKind::MissingTerminator))?;
        let line = &rest[..newline];
        pos += newline + 1;

        let mut fields: Vec<&[u8]> = line.split(|&b| b == 0).collect();
        if fields.len() == base_fields + 1 {
            current_dirname = fields[0].to_vec();
            fields.remove(0);
        } else if fields.len() != base_fields {
            return Err(DirstateError::corrupt_in(
                context,
                DirstateErrorKind::EntryCountMismatch { declared: base_fields, actual: fields.len() },
            ));
        }

        let basename = fields[0].to_vec();
        let file_id = fields[1].to_vec();
        let mut tree_states = Vec::with_capacity(num_trees);
        for chunk in fields[2..].chunks_exact(5) {
            let minikind = chunk[0].first().copied().unwrap_or(0);
            let fingerprint = chunk[1].to_vec();
            let size_str = std::str::from_utf8(chunk[2])
                .map_err(|_| DirstateError::corrupt_in(context, DirstateErrorKind::MalformedSize))?;
            let size: u64 = size_str
                .parse()
                .map_err(|_| DirstateError::corrupt_in(context, DirstateErrorKind::MalformedSize))?;
            let is_executable = match chunk[3] {
                b"y" => true,
                b"n" => false,
                other => {
                    let byte = other.first().copied().unwrap_or(0);
                    return Err(DirstateError::corrupt_in(context, DirstateErrorKind::BadExecutableFlag(byte)));
                }
            };
            let info = chunk[4].to_vec();
            tree_states.push(TreeState { minikind, fingerprint, size, is_executable, info });
        }

        records.push(Record { dirname: current_dirname.clone(), basename, file_id, tree_states });
    }

    Ok(records)
}

/// Serializes records back to the exact grammar `parse_records` accepts,
/// omitting each record's `dirname` field when it repeats the previous
/// record's.
#[must_use]
pub fn serialize_records(records: &[Record], num_trees: usize) -> Vec<u8> {
    let mut out = Vec::new();
    let mut current_dirname: Option<&[u8]> = None;

    for record in records {
        debug_assert_eq!(record.tree_states.len(), num_trees);

        let mut fields: Vec<Vec<u8>> = Vec::new();
        if current_dirname != Some(record.dirname.as_slice()) {
            fields.push(record.dirname.clone());
            current_dirname = Some(&record.dirname);
        }
        fields.push(record.basename.clone());
        fields.push(record.file_id.clone());
        for state in &record.tree_states {
            fields.push(vec![state.minikind]);
            fields.push(state.fingerprint.clone());
            fields.push(state.size.to_string().into_bytes());
            fields.push(vec![if state.is_executable { b'y' } else { b'n' }]);
            fields.push(state.info.clone());
        }

        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                out.push(0);
            }
            out.extend_from_slice(field);
        }
        out.push(b'\n');
    }

    out
}
