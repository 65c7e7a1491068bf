//! Query-string parsing and percent-decoding.

use std::str::FromStr;

/// Decoded `key=value` pairs of a query string, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    /// Parse the part of a target after `?`.
    ///
    /// Pairs are split on `&` and `=`; a key without `=` has an empty
    /// value. Keys and values are percent-decoded and `+` means space.
    pub fn parse(raw: &str) -> Self {
        let pairs = raw
            .split('&')
            .filter(|part| !part.is_empty())
            .map(|part| {
                let (key, value) = part.split_once('=').unwrap_or((part, ""));
                (decode_component(key), decode_component(value))
            })
            .collect();
        Self { pairs }
    }

    /// First value for `key`, compared without regard to ASCII case.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// First value for `key` parsed as `T`; `None` if absent or invalid.
    pub fn parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }

    /// Whether `key` is present with a truthy value (`1`, `true`, `yes`, `on`).
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| {
            let v = v.trim();
            v == "1"
                || v.eq_ignore_ascii_case("true")
                || v.eq_ignore_ascii_case("yes")
                || v.eq_ignore_ascii_case("on")
        })
    }

    /// Whether no pairs were parsed.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

const fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte.wrapping_sub(b'0')),
        b'a'..=b'f' => Some(byte.wrapping_sub(b'a').wrapping_add(10)),
        b'A'..=b'F' => Some(byte.wrapping_sub(b'A').wrapping_add(10)),
        _ => None,
    }
}

/// Decode `%XX` escapes. Malformed escapes are kept as written and
/// invalid UTF-8 is replaced.
pub fn percent_decode(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0_usize;
    while let Some(&byte) = bytes.get(i) {
        if byte == b'%' {
            let hi = bytes.get(i.saturating_add(1)).copied().and_then(hex_value);
            let lo = bytes.get(i.saturating_add(2)).copied().and_then(hex_value);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push(hi.wrapping_shl(4) | lo);
                i = i.saturating_add(3);
                continue;
            }
        }
        out.push(byte);
        i = i.saturating_add(1);
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn decode_component(text: &str) -> String {
    percent_decode(&text.replace('+', " "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_ignore_case_and_values_decode() {
        let query = Query::parse("Preset=Hot%20Dog&tail=200&mb");
        assert_eq!(query.get("preset"), Some("Hot Dog"));
        assert_eq!(query.parsed::<usize>("TAIL"), Some(200));
        assert_eq!(query.get("mb"), Some(""));
        assert_eq!(query.get("missing"), None);
    }

    #[test]
    fn plus_is_space_in_query() {
        assert_eq!(Query::parse("preset=Hot+Dog").get("preset"), Some("Hot Dog"));
    }

    #[test]
    fn invalid_numbers_are_absent() {
        let query = Query::parse("w=wide&h=-3");
        assert_eq!(query.parsed::<u32>("w"), None);
        assert_eq!(query.parsed::<u32>("h"), None);
    }

    #[test]
    fn flags() {
        let query = Query::parse("mb=1&x=0&y=TRUE");
        assert!(query.flag("mb"));
        assert!(!query.flag("x"));
        assert!(query.flag("y"));
        assert!(!query.flag("z"));
    }

    #[test]
    fn malformed_escapes_survive() {
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz%41"), "%zzA");
        assert_eq!(percent_decode("%2e%2E/"), "../");
    }

    #[test]
    fn empty_query() {
        assert!(Query::parse("").is_empty());
        assert!(Query::parse("&&").is_empty());
    }
}
