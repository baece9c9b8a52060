use std::collections::BTreeMap;

use crate::error::BencodeError;
use crate::value::Value;

/// Decoder tuning: only the recursion-depth budget, replacing the
/// interpreter-provided recursion guard the source relied on with an
/// explicit, checked limit on the parser's value stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { max_depth: 200 }
    }
}

enum Container {
    List(Vec<Value>),
    Dict {
        entries: BTreeMap<Vec<u8>, Value>,
        last_key: Option<Vec<u8>>,
        pending_key: Option<Vec<u8>>,
    },
}

/// Decodes a single BEncode value, failing if any bytes remain afterwards.
pub fn decode(bytes: &[u8]) -> Result<Value, BencodeError> {
    decode_with_config(bytes, &Config::default())
}

/// Like [`decode`], but with an explicit depth budget.
pub fn decode_with_config(bytes: &[u8], config: &Config) -> Result<Value, BencodeError> {
    let mut pos = 0usize;
    let mut stack: Vec<Container> = Vec::new();
    let mut result: Option<Value> = None;

    loop {
        if result.is_some() && stack.is_empty() {
            break;
        }
        let byte = *bytes
            .get(pos)
            .ok_or(BencodeError::UnexpectedEof { offset: pos })?;

        match byte {
            b'e' => {
                let container = stack
                    .pop()
                    .ok_or(BencodeError::UnexpectedByte { offset: pos, found: byte })?;
                pos += 1;
                let value = match container {
                    Container::List(items) => Value::List(items),
                    Container::Dict { entries, pending_key, .. } => {
                        if pending_key.is_some() {
                            return Err(BencodeError::DictMissingValue { offset: pos });
                        }
                        Value::Dict(entries)
                    }
                };
                emit(value, &mut stack, &mut result, pos)?;
            }
            b'i' => {
                let start = pos;
                let (n, new_pos) = parse_integer(bytes, pos + 1)?;
                pos = new_pos;
                emit(Value::Int(n), &mut stack, &mut result, start)?;
            }
            b'0'..=b'9' => {
                let start = pos;
                let (len, new_pos) = parse_length(bytes, pos)?;
                pos = new_pos;
                let end = pos
                    .checked_add(len)
                    .filter(|&end| end <= bytes.len())
                    .ok_or(BencodeError::UnexpectedEof { offset: pos })?;
                let s = bytes[pos..end].to_vec();
                pos = end;
                emit(Value::Bytes(s), &mut stack, &mut result, start)?;
            }
            b'l' => {
                if stack.len() >= config.max_depth {
                    return Err(BencodeError::TooDeep { limit: config.max_depth });
                }
                stack.push(Container::List(Vec::new()));
                pos += 1;
            }
            b'd' => {
                if stack.len() >= config.max_depth {
                    return Err(BencodeError::TooDeep { limit: config.max_depth });
                }
                stack.push(Container::Dict {
                    entries: BTreeMap::new(),
                    last_key: None,
                    pending_key: None,
                });
                pos += 1;
            }
            other => return Err(BencodeError::UnexpectedByte { offset: pos, found: other }),
        }
    }

    if pos != bytes.len() {
        return Err(BencodeError::TrailingBytes { extra: bytes.len() - pos });
    }
    Ok(result.expect("loop only exits once the top-level value has been produced"))
}

/// Routes a just-parsed value to wherever it belongs: the top-level
/// result, the current list, or the current dict (as a key awaiting its
/// value, or as the value completing a pending key).
fn emit(
    value: Value,
    stack: &mut [Container],
    result: &mut Option<Value>,
    offset: usize,
) -> Result<(), BencodeError> {
    match stack.last_mut() {
        None => *result = Some(value),
        Some(Container::List(items)) => items.push(value),
        Some(Container::Dict { entries, last_key, pending_key }) => match pending_key.take() {
            None => {
                let Value::Bytes(key) = value else {
                    return Err(BencodeError::DictKeyNotBytes { offset });
                };
                if let Some(last) = last_key.as_deref() {
                    if key.as_slice() <= last {
                        return Err(BencodeError::KeysDisordered { offset });
                    }
                }
                *pending_key = Some(key);
            }
            Some(key) => {
                entries.insert(key.clone(), value);
                *last_key = Some(key);
            }
        },
    }
    Ok(())
}

/// Parses `<digits>e` starting just past the `i`, rejecting a leading `+`,
/// a leading zero (other than the bare digit `0`), and `-0`.
fn parse_integer(bytes: &[u8], start: usize) -> Result<(i64, usize), BencodeError> {
    let err = || BencodeError::MalformedInteger { offset: start };

    let mut pos = start;
    let negative = bytes.get(pos) == Some(&b'-');
    if negative {
        pos += 1;
    }
    let digits_start = pos;
    while bytes.get(pos).is_some_and(u8::is_ascii_digit) {
        pos += 1;
    }
    let digits = &bytes[digits_start..pos];
    if digits.is_empty() {
        return Err(err());
    }
    if digits.len() > 1 && digits[0] == b'0' {
        return Err(err());
    }
    if negative && digits == b"0" {
        return Err(err());
    }
    if bytes.get(pos) != Some(&b'e') {
        return Err(err());
    }
    let text = std::str::from_utf8(&bytes[start..pos]).map_err(|_| err())?;
    let value: i64 = text.parse().map_err(|_| err())?;
    Ok((value, pos + 1))
}

/// Parses a non-negative decimal length ending at `:`, rejecting a leading
/// zero other than the bare digit `0`.
fn parse_length(bytes: &[u8], start: usize) -> Result<(usize, usize), BencodeError> {
    let err = || BencodeError::MalformedLength { offset: start };

    let mut pos = start;
    while bytes.get(pos).is_some_and(u8::is_ascii_digit) {
        pos += 1;
    }
    let digits = &bytes[start..pos];
    if digits.is_empty() {
        return Err(err());
    }
    if digits.len() > 1 && digits[0] == b'0' {
        return Err(err());
    }
    if bytes.get(pos) != Some(&b':') {
        return Err(err());
    }
    let text = std::str::from_utf8(digits).map_err(|_| err())?;
    let value: usize = text.parse().map_err(|_| err())?;
    Ok((value, pos + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode;

    #[test]
    fn decodes_worked_example() {
        let bytes = b"d1:ni42e7:parentsl1:a2:bbee";
        let value = decode(bytes).unwrap();
        let dict = value.as_dict().unwrap();
        assert_eq!(dict[b"n".as_slice()].as_int(), Some(42));
        let parents = dict[b"parents".as_slice()].as_list().unwrap();
        assert_eq!(parents[0].as_bytes(), Some(b"a".as_slice()));
        assert_eq!(parents[1].as_bytes(), Some(b"bb".as_slice()));
    }

    #[test]
    fn rejects_leading_zero_integer() {
        assert_eq!(
            decode(b"i03e"),
            Err(BencodeError::MalformedInteger { offset: 1 })
        );
    }

    #[test]
    fn rejects_negative_zero() {
        assert_eq!(
            decode(b"i-0e"),
            Err(BencodeError::MalformedInteger { offset: 1 })
        );
    }

    #[test]
    fn rejects_disordered_dict_keys() {
        assert_eq!(
            decode(b"d1:bi1e1:ai2ee"),
            Err(BencodeError::KeysDisordered { offset: 7 })
        );
    }

    #[test]
    fn rejects_trailing_bytes() {
        assert_eq!(decode(b"i1ei2e"), Err(BencodeError::TrailingBytes { extra: 3 }));
    }

    #[test]
    fn rejects_nesting_past_the_depth_limit() {
        let mut bytes = vec![b'l'; 5];
        bytes.push(b'i');
        bytes.push(b'1');
        bytes.push(b'e');
        bytes.extend(std::iter::repeat(b'e').take(5));
        let config = Config { max_depth: 3 };
        assert_eq!(
            decode_with_config(&bytes, &config),
            Err(BencodeError::TooDeep { limit: 3 })
        );
    }

    #[test]
    fn round_trips_every_supported_shape() {
        let value = Value::dict([
            (b"a".to_vec(), Value::Int(-7)),
            (b"b".to_vec(), Value::List(vec![Value::bytes(*b"x"), Value::from(true)])),
        ]);
        let encoded = encode(&value);
        assert_eq!(decode(&encoded).unwrap(), value);
    }
}
