use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error(
    "invalid Polymarket URL; expected https://polymarket.com/event/{{event-slug}} \
     or https://polymarket.com/event/{{event-slug}}/{{market-slug}}"
)]
pub struct InvalidUrl;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    pub event_slug: String,
    pub market_slug: Option<String>,
}

fn is_slug_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Take the leading slug of `s`, returning the slug and the remainder.
/// Stops at the first non-slug character (so query strings and fragments
/// after a slug are ignored, matching how users paste URLs).
fn take_slug(s: &str) -> (&str, &str) {
    let end = s.find(|c| !is_slug_char(c)).unwrap_or(s.len());
    (&s[..end], &s[end..])
}

/// Parse a Polymarket event URL into event and optional market slugs.
pub fn parse_polymarket_url(url: &str) -> Result<ParsedUrl, InvalidUrl> {
    let mut rest = url.trim();
    rest = rest.strip_prefix("https://").or_else(|| rest.strip_prefix("http://")).unwrap_or(rest);
    rest = rest.strip_prefix("www.").unwrap_or(rest);
    let rest = rest.strip_prefix("polymarket.com/event/").ok_or(InvalidUrl)?;

    let (event_slug, rest) = take_slug(rest);
    if event_slug.is_empty() {
        return Err(InvalidUrl);
    }

    let market_slug = rest.strip_prefix('/').map(take_slug).map(|(slug, _)| slug);
    let market_slug = match market_slug {
        Some("") | None => None,
        Some(slug) => Some(slug.to_string()),
    };

    Ok(ParsedUrl {
        event_slug: event_slug.to_string(),
        market_slug,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event_only() {
        let parsed = parse_polymarket_url("https://polymarket.com/event/fed-decision-march").unwrap();
        assert_eq!(parsed.event_slug, "fed-decision-march");
        assert_eq!(parsed.market_slug, None);
    }

    #[test]
    fn test_parse_event_and_market() {
        let parsed =
            parse_polymarket_url("https://polymarket.com/event/fed-decision/will-fed-cut-50bps")
                .unwrap();
        assert_eq!(parsed.event_slug, "fed-decision");
        assert_eq!(parsed.market_slug.as_deref(), Some("will-fed-cut-50bps"));
    }

    #[test]
    fn test_parse_without_scheme_and_with_www() {
        let parsed = parse_polymarket_url("www.polymarket.com/event/some_event").unwrap();
        assert_eq!(parsed.event_slug, "some_event");
    }

    #[test]
    fn test_parse_ignores_query_string() {
        let parsed = parse_polymarket_url("https://polymarket.com/event/foo?tid=12345").unwrap();
        assert_eq!(parsed.event_slug, "foo");
        assert_eq!(parsed.market_slug, None);
    }

    #[test]
    fn test_parse_trailing_slash_means_no_market() {
        let parsed = parse_polymarket_url("https://polymarket.com/event/foo/").unwrap();
        assert_eq!(parsed.market_slug, None);
    }

    #[test]
    fn test_reject_non_polymarket_url() {
        assert_eq!(
            parse_polymarket_url("https://example.com/event/foo"),
            Err(InvalidUrl)
        );
        assert_eq!(parse_polymarket_url("polymarket.com/markets/foo"), Err(InvalidUrl));
        assert_eq!(parse_polymarket_url("https://polymarket.com/event/"), Err(InvalidUrl));
    }
}
