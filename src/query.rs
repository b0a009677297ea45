//! ## Query string scanner
//!
//! The entrypoint to this module is [`parse`].
//!
//! ```rust
//! let query = fqs::parse("a=1&b=2");
//! ```
//!
//! The scanner walks the input exactly once. While a segment is open it
//! only records where the delimiters are and whether either side of the
//! segment contains a `+` or a `%`; the actual decoding runs after the
//! segment is closed, and only over the slices whose flags demand it.
//! A query string without any encoded bytes is never copied.

use std::borrow::Cow;
use std::fmt::Debug;

use smallvec::SmallVec;

use crate::decode::decode_component;

/// Decoded key/value pairs of a query string.
///
/// Keys are unique: the first occurrence of a key wins and later
/// occurrences are discarded. Pairs keep the order in which their keys
/// first appeared in the input.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct QueryMap<'src> {
  pairs: SmallVec<[Pair<'src>; 8]>,
}

type Pair<'src> = (Cow<'src, str>, Cow<'src, str>);

impl<'src> QueryMap<'src> {
  /// An empty map.
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of distinct keys.
  pub fn len(&self) -> usize {
    self.pairs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.pairs.is_empty()
  }

  /// Get the value of `key`.
  ///
  /// A key that appeared without a value (`"a"` or `"a="`) yields an
  /// empty string.
  pub fn get(&self, key: &str) -> Option<&str> {
    self
      .pairs
      .iter()
      .find(|(k, _)| k == key)
      .map(|(_, v)| v.as_ref())
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.pairs.iter().any(|(k, _)| k == key)
  }

  /// Iterate over the pairs in first-seen order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
    self.pairs.iter().map(|(k, v)| (k.as_ref(), v.as_ref()))
  }

  /// Copy every borrowed slice so the map no longer references the
  /// input it was parsed from.
  pub fn into_owned(self) -> QueryMap<'static> {
    QueryMap {
      pairs: self
        .pairs
        .into_iter()
        .map(|(k, v)| (Cow::Owned(k.into_owned()), Cow::Owned(v.into_owned())))
        .collect(),
    }
  }

  fn insert_first(&mut self, key: Cow<'src, str>, value: Cow<'src, str>) {
    self.pairs.push((key, value));
  }
}

impl<'src> IntoIterator for QueryMap<'src> {
  type Item = Pair<'src>;

  type IntoIter = smallvec::IntoIter<[Pair<'src>; 8]>;

  fn into_iter(self) -> Self::IntoIter {
    self.pairs.into_iter()
  }
}

impl<'src> Debug for QueryMap<'src> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_map().entries(self.iter()).finish()
  }
}

#[cfg(feature = "serde")]
impl<'src> serde::Serialize for QueryMap<'src> {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    use serde::ser::SerializeMap;

    let mut map = serializer.serialize_map(Some(self.len()))?;
    for (key, value) in self.iter() {
      map.serialize_entry(key, value)?;
    }
    map.end()
  }
}

/// Which decode steps each side of the current segment needs.
///
/// All four are reset together at every segment boundary. The decoder
/// only ever runs over a slice whose flag was raised, so a segment of
/// plain bytes costs nothing beyond the scan itself.
#[derive(Clone, Copy, Default)]
struct DecodeFlags {
  key_plus: bool,
  key_percent: bool,
  value_plus: bool,
  value_percent: bool,
}

/// Parse a query string into a [`QueryMap`].
///
/// `input` must not include the leading `?`; splitting the query off
/// the URL is the caller's job. The parse is total: any input yields a
/// map, malformed escapes are kept verbatim, and empty segments from
/// consecutive `&` contribute nothing.
///
/// ```rust
/// let query = fqs::parse("name=ferret&legs=4");
///
/// assert_eq!(query.get("name"), Some("ferret"));
/// assert_eq!(query.get("legs"), Some("4"));
/// assert_eq!(query.get("tail"), None);
/// ```
pub fn parse(input: &str) -> QueryMap<'_> {
  let mut map = QueryMap::new();
  let bytes = input.as_bytes();

  // first byte of the current key
  let mut key_start = 0usize;
  // position of the segment's first `=`, `None` while scanning the key
  let mut eq_pos = None::<usize>;
  let mut flags = DecodeFlags::default();

  // all delimiters are ASCII, so walking bytes never lands a slice
  // boundary inside a UTF-8 sequence
  for i in 0..bytes.len() {
    match bytes[i] {
      b'&' => {
        commit_segment(&mut map, input, key_start, eq_pos, i, flags);
        key_start = i + 1;
        eq_pos = None;
        flags = DecodeFlags::default();
      }
      b'=' => match eq_pos {
        None => eq_pos = Some(i),
        // a second `=` is value data; force the value through the
        // decoder so it is handled like any other non-trivial content
        Some(_) => flags.value_percent = true,
      },
      b'+' => match eq_pos {
        Some(_) => flags.value_plus = true,
        None => flags.key_plus = true,
      },
      b'%' => match eq_pos {
        Some(_) => flags.value_percent = true,
        None => flags.key_percent = true,
      },
      _ => {}
    }
  }

  // the final segment has no terminating `&`
  commit_segment(&mut map, input, key_start, eq_pos, bytes.len(), flags);

  map
}

/// Parse an optional query string.
///
/// Callers usually sit behind something like `Uri::query()`, which
/// yields `None` when the URL has no query at all. That case is an
/// empty map, not an error.
pub fn parse_opt(input: Option<&str>) -> QueryMap<'_> {
  match input {
    Some(input) => parse(input),
    None => QueryMap::new(),
  }
}

/// Close the segment ending at `end` and insert its pair, if any.
fn commit_segment<'src>(
  map: &mut QueryMap<'src>,
  src: &'src str,
  key_start: usize,
  eq_pos: Option<usize>,
  end: usize,
  flags: DecodeFlags,
) {
  let key_end = eq_pos.unwrap_or(end);
  let raw_key = &src[key_start..key_end];

  // two adjacent delimiters produce an empty segment; only a `=` makes
  // an empty key meaningful
  if eq_pos.is_none() && raw_key.is_empty() {
    return;
  }

  let key = decode_component(raw_key, flags.key_plus, flags.key_percent);

  // first occurrence wins
  if map.contains_key(&key) {
    return;
  }

  let value = match eq_pos {
    Some(eq) => decode_component(&src[eq + 1..end], flags.value_plus, flags.value_percent),
    None => Cow::Borrowed(""),
  };

  map.insert_first(key, value);
}

static_assert_send!(QueryMap);
static_assert_sync!(QueryMap);
