//! URL splitting and percent-encoding helpers.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped when a light name is placed in a path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Split a request target into path and query (without the `?`).
pub fn split_url(url: &str) -> (&str, &str) {
    url.split_once('?').unwrap_or((url, ""))
}

/// Decode a path segment. `+` stays literal.
pub fn decode_segment(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Encode a name for use as a path segment.
pub fn encode_segment(name: &str) -> String {
    utf8_percent_encode(name, SEGMENT).to_string()
}

/// Decode `application/x-www-form-urlencoded` pairs. Keys without `=` get
/// an empty value.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_form(key), decode_form(value))
        })
        .collect()
}

/// First value for `key`.
pub fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn decode_form(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_url() {
        assert_eq!(split_url("/connect?ssid=a"), ("/connect", "ssid=a"));
        assert_eq!(split_url("/status"), ("/status", ""));
    }

    #[test]
    fn test_parse_query_decodes() {
        let params = parse_query("ssid=My+Net&password=p%40ss%26word&flag");
        assert_eq!(param(&params, "ssid"), Some("My Net"));
        assert_eq!(param(&params, "password"), Some("p@ss&word"));
        assert_eq!(param(&params, "flag"), Some(""));
        assert_eq!(param(&params, "missing"), None);
    }

    #[test]
    fn test_empty_value_is_present() {
        let params = parse_query("ssid=X&password=");
        assert_eq!(param(&params, "password"), Some(""));
    }

    #[test]
    fn test_segment_encoding() {
        assert_eq!(encode_segment("Living Room"), "Living%20Room");
        assert_eq!(encode_segment("Kitchen"), "Kitchen");
        assert_eq!(decode_segment("Living%20Room"), "Living Room");
        assert_eq!(decode_segment("a+b"), "a+b");
        assert_eq!(decode_segment(&encode_segment("50% ?#")), "50% ?#");
    }
}
