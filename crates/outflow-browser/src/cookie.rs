use serde::Serialize;

/// Apex domain the injected session cookies are scoped to.
pub const WORKSPACE_COOKIE_DOMAIN: &str = ".slack.com";

/// One cookie in the shape Playwright's `addCookies` expects.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
}

/// Parses a raw `name=value; name2=value2` cookie header into records.
///
/// Segments without `=` are dropped; the first `=` splits name from
/// value, so values may themselves contain `=`. Never fails -- a
/// malformed string simply yields fewer (possibly zero) cookies.
pub fn parse_cookie_string(raw: &str) -> Vec<CookieRecord> {
    raw.split(';')
        .filter_map(|segment| {
            let segment = segment.trim();
            let (name, value) = segment.split_once('=')?;
            Some(CookieRecord {
                name: name.trim().to_string(),
                value: value.trim().to_string(),
                domain: WORKSPACE_COOKIE_DOMAIN.to_string(),
                path: "/".to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, value: &str) -> CookieRecord {
        CookieRecord {
            name: name.to_string(),
            value: value.to_string(),
            domain: WORKSPACE_COOKIE_DOMAIN.to_string(),
            path: "/".to_string(),
        }
    }

    #[test]
    fn splits_on_first_equals_and_trims() {
        let cookies = parse_cookie_string("a=1;b=2=3; c = 4");
        assert_eq!(
            cookies,
            vec![record("a", "1"), record("b", "2=3"), record("c", "4")]
        );
    }

    #[test]
    fn segments_without_equals_are_dropped() {
        let cookies = parse_cookie_string("d=abc; garbage ; x");
        assert_eq!(cookies, vec![record("d", "abc")]);
    }

    #[test]
    fn empty_and_malformed_input_yield_no_cookies() {
        assert!(parse_cookie_string("").is_empty());
        assert!(parse_cookie_string(";;;").is_empty());
        assert!(parse_cookie_string("no separators here").is_empty());
    }

    #[test]
    fn serializes_to_playwright_cookie_shape() {
        let cookies = parse_cookie_string("d=xoxd-abc123");
        let json = serde_json::to_value(&cookies).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "name": "d",
                "value": "xoxd-abc123",
                "domain": ".slack.com",
                "path": "/"
            }])
        );
    }
}
