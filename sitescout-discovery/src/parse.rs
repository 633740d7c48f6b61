use std::sync::LazyLock;

use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;

/// Parsed form of one fetched sitemap document.
///
/// A document is classified by its root element: `sitemapindex` or
/// `urlset`. Anything else is unparseable and handled by the regex
/// fallback in [`extract_locs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapNode {
    /// A sitemap-index: `<sitemap><loc>` children pointing at more sitemaps.
    Index { children: Vec<String> },
    /// A leaf sitemap: `<url><loc>` page entries.
    UrlSet { entries: Vec<UrlEntry> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlEntry {
    pub loc: String,
    pub lastmod: Option<String>,
}

static LOC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<loc>\s*(.*?)\s*</loc>").expect("loc regex is valid"));

static LASTMOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<lastmod>\s*(.*?)\s*</lastmod>").expect("lastmod regex is valid")
});

enum Root {
    Index,
    UrlSet,
}

enum Field {
    Loc,
    Lastmod,
}

/// Structured parse of a sitemap document. Returns `None` for malformed XML
/// or a root element that is neither `sitemapindex` nor `urlset`; callers
/// fall back to [`extract_locs`] in that case.
pub fn parse_document(text: &str) -> Option<SitemapNode> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut root: Option<Root> = None;
    let mut children: Vec<String> = Vec::new();
    let mut entries: Vec<UrlEntry> = Vec::new();

    let mut in_entry = false;
    let mut field: Option<Field> = None;
    let mut loc = String::new();
    let mut lastmod: Option<String> = None;

    // quick-xml does not object to a document that just stops; track open
    // elements so truncated markup is reported as unparseable.
    let mut open_elements: usize = 0;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                open_elements += 1;
                let name = e.local_name();
                match root {
                    None => match name.as_ref() {
                        b"sitemapindex" => root = Some(Root::Index),
                        b"urlset" => root = Some(Root::UrlSet),
                        _ => return None,
                    },
                    Some(_) => match name.as_ref() {
                        b"sitemap" | b"url" => {
                            in_entry = true;
                            loc.clear();
                            lastmod = None;
                        }
                        b"loc" if in_entry => field = Some(Field::Loc),
                        b"lastmod" if in_entry => field = Some(Field::Lastmod),
                        _ => {}
                    },
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(f) = &field {
                    let value = t.unescape().ok()?;
                    match f {
                        Field::Loc => loc.push_str(value.trim()),
                        Field::Lastmod => lastmod = Some(value.trim().to_string()),
                    }
                }
            }
            Ok(Event::CData(t)) => {
                if let Some(f) = &field {
                    let value = String::from_utf8_lossy(&t);
                    match f {
                        Field::Loc => loc.push_str(value.trim()),
                        Field::Lastmod => lastmod = Some(value.trim().to_string()),
                    }
                }
            }
            Ok(Event::End(e)) => {
                open_elements = open_elements.checked_sub(1)?;
                match e.local_name().as_ref() {
                    b"loc" | b"lastmod" => field = None,
                    b"sitemap" => {
                        if in_entry && !loc.is_empty() {
                            children.push(std::mem::take(&mut loc));
                        }
                        in_entry = false;
                    }
                    b"url" => {
                        if in_entry && !loc.is_empty() {
                            entries.push(UrlEntry {
                                loc: std::mem::take(&mut loc),
                                lastmod: lastmod.take(),
                            });
                        }
                        in_entry = false;
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => {
                if open_elements != 0 {
                    return None;
                }
                break;
            }
            Ok(_) => {}
            Err(_) => return None,
        }
    }

    match root? {
        Root::Index => Some(SitemapNode::Index { children }),
        Root::UrlSet => Some(SitemapNode::UrlSet { entries }),
    }
}

/// Fallback URL extraction: scan the raw text for `<loc>...</loc>` pairs.
/// Used whenever the structured parse fails; recovers URLs from documents
/// with broken markup as long as the loc tags themselves survived.
pub fn extract_locs(text: &str) -> Vec<String> {
    LOC_RE
        .captures_iter(text)
        .map(|c| c[1].trim().to_string())
        .filter(|loc| !loc.is_empty())
        .collect()
}

/// First non-empty `<lastmod>` value in the raw text, independent of which
/// URL-extraction path ran for the document.
pub fn first_lastmod(text: &str) -> Option<String> {
    LASTMOD_RE
        .captures(text)
        .map(|c| c[1].trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const URLSET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url>
    <loc>https://example.com/</loc>
    <lastmod>2024-01-15</lastmod>
  </url>
  <url>
    <loc>https://example.com/about</loc>
  </url>
</urlset>"#;

    const INDEX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap>
    <loc>https://example.com/sitemap-posts.xml</loc>
    <lastmod>2024-02-01</lastmod>
  </sitemap>
  <sitemap>
    <loc>https://example.com/sitemap-pages.xml</loc>
  </sitemap>
</sitemapindex>"#;

    #[test]
    fn parses_urlset_with_lastmod() {
        let node = parse_document(URLSET).unwrap();
        match node {
            SitemapNode::UrlSet { entries } => {
                assert_eq!(entries.len(), 2);
                assert_eq!(entries[0].loc, "https://example.com/");
                assert_eq!(entries[0].lastmod.as_deref(), Some("2024-01-15"));
                assert_eq!(entries[1].loc, "https://example.com/about");
                assert_eq!(entries[1].lastmod, None);
            }
            other => panic!("expected UrlSet, got {:?}", other),
        }
    }

    #[test]
    fn parses_sitemap_index() {
        let node = parse_document(INDEX).unwrap();
        match node {
            SitemapNode::Index { children } => {
                assert_eq!(
                    children,
                    vec![
                        "https://example.com/sitemap-posts.xml",
                        "https://example.com/sitemap-pages.xml"
                    ]
                );
            }
            other => panic!("expected Index, got {:?}", other),
        }
    }

    #[test]
    fn parses_cdata_locs() {
        let xml = r#"<urlset><url><loc><![CDATA[https://example.com/a?x=1&y=2]]></loc></url></urlset>"#;
        let node = parse_document(xml).unwrap();
        match node {
            SitemapNode::UrlSet { entries } => {
                assert_eq!(entries[0].loc, "https://example.com/a?x=1&y=2");
            }
            other => panic!("expected UrlSet, got {:?}", other),
        }
    }

    #[test]
    fn unknown_root_is_unparseable() {
        assert_eq!(parse_document("<rss><channel></channel></rss>"), None);
        assert_eq!(parse_document("<html><body>nope</body></html>"), None);
    }

    #[test]
    fn malformed_xml_is_unparseable() {
        assert_eq!(parse_document("<urlset><url><loc>https://e.com"), None);
        assert_eq!(parse_document("not xml at all"), None);
    }

    #[test]
    fn fallback_recovers_locs_from_broken_markup() {
        let text = "garbage <loc>https://example.com/a</loc> more garbage\n\
                    <LOC> https://example.com/b </LOC> <loc></loc>";
        assert_eq!(
            extract_locs(text),
            vec!["https://example.com/a", "https://example.com/b"]
        );
    }

    #[test]
    fn fallback_matches_structured_parse_for_well_formed_input() {
        let structured = match parse_document(URLSET).unwrap() {
            SitemapNode::UrlSet { entries } => {
                entries.into_iter().map(|e| e.loc).collect::<Vec<_>>()
            }
            other => panic!("expected UrlSet, got {:?}", other),
        };
        assert_eq!(extract_locs(URLSET), structured);
    }

    #[test]
    fn first_lastmod_is_case_insensitive_and_first_wins() {
        let text = "<LastMod>2023-12-01</LastMod> <lastmod>2024-01-01</lastmod>";
        assert_eq!(first_lastmod(text).as_deref(), Some("2023-12-01"));
        assert_eq!(first_lastmod("<lastmod>  </lastmod>"), None);
        assert_eq!(first_lastmod("no dates here"), None);
    }
}
