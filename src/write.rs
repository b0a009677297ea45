//! Query string writing.
//!
//! The inverse of [`parse`][crate::parse]: form-urlencode a sequence of
//! pairs into a query string. [`QueryMap`] implements [`Display`]
//! through the same encoder, so a parsed map can be written back out
//! without an intermediate buffer.

use std::fmt::{self, Display, Write};

use crate::query::QueryMap;

const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// Form-urlencode `pairs` into a query string.
///
/// Unreserved bytes (`A-Z a-z 0-9 - _ . ~`) are written verbatim, space
/// becomes `+`, and every other byte becomes an uppercase `%XX` escape.
/// Pairs are written in iteration order, values always with an `=`.
///
/// ```rust
/// assert_eq!(fqs::stringify([("a", "1"), ("b", "two words")]), "a=1&b=two+words");
/// ```
pub fn stringify<'kv>(pairs: impl IntoIterator<Item = (&'kv str, &'kv str)>) -> String {
  let mut out = String::new();
  for (i, (key, value)) in pairs.into_iter().enumerate() {
    if i > 0 {
      out.push('&');
    }
    // writing into a `String` cannot fail
    let _ = encode_into(&mut out, key);
    out.push('=');
    let _ = encode_into(&mut out, value);
  }
  out
}

fn encode_into(out: &mut impl Write, raw: &str) -> fmt::Result {
  for &byte in raw.as_bytes() {
    match byte {
      b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
        out.write_char(byte as char)?;
      }
      b' ' => out.write_char('+')?,
      _ => {
        out.write_char('%')?;
        out.write_char(HEX_UPPER[(byte >> 4) as usize] as char)?;
        out.write_char(HEX_UPPER[(byte & 0xF) as usize] as char)?;
      }
    }
  }
  Ok(())
}

impl<'src> Display for QueryMap<'src> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, (key, value)) in self.iter().enumerate() {
      if i > 0 {
        f.write_char('&')?;
      }
      encode_into(f, key)?;
      f.write_char('=')?;
      encode_into(f, value)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parse;

  #[test]
  fn plain_pairs() {
    assert_eq!(stringify([("a", "1"), ("b", "2")]), "a=1&b=2");
  }

  #[test]
  fn empty_iterator() {
    assert_eq!(stringify([]), "");
  }

  #[test]
  fn empty_value_keeps_its_equals() {
    assert_eq!(stringify([("a", "")]), "a=");
  }

  #[test]
  fn space_becomes_plus() {
    assert_eq!(stringify([("key a", "value b")]), "key+a=value+b");
  }

  #[test]
  fn reserved_bytes_are_escaped() {
    assert_eq!(stringify([("a&b", "c=d")]), "a%26b=c%3Dd");
    assert_eq!(stringify([("100%", "+1")]), "100%25=%2B1");
  }

  #[test]
  fn multibyte_utf8_is_escaped() {
    assert_eq!(stringify([("emoji", "✨")]), "emoji=%E2%9C%A8");
  }

  #[test]
  fn display_matches_stringify() {
    let map = parse("a=1&b=two+words");
    assert_eq!(map.to_string(), stringify(map.iter()));
  }

  #[test]
  fn roundtrip() {
    let src = "a=1&key+b=two+words&c=%E2%9C%A8&d=";

    // `written` is forward-declared so it outlives `map`: locals drop in
    // reverse declaration order, and `map`'s drop glue must not outlive
    // the borrow taken by `parse(&written)` below.
    let written;
    let map = parse(src);
    written = stringify(map.iter());

    assert_eq!(written, src);
    assert_eq!(parse(&written), map);
  }
}
