//! URL extraction from catalog pages
//!
//! Covers the three non-terminal page shapes: the root catalog page
//! (top-level category links), a category page (alphabetical sub-listing
//! links), and a listing page (pagination links or podcast detail links).
//! All extractors yield `href` values in document order and skip anchors
//! without an `href`; the HTML parser decodes entities during parsing, so
//! returned URLs are already decoded.

use scraper::{Html, Selector};

/// Literal marker identifying a leaf listing URL (one that already encodes a
/// page index).
pub const PAGE_MARKER: &str = "&page=";

const CATEGORY_ANCHORS: &str = "a.top-level-genre";
const LISTING_ANCHORS: &str = "#selectedgenre ul.list.alpha li a";
const PAGINATION_ANCHORS: &str = "ul.list.paginate li a";
const PODCAST_ANCHORS: &str = "div.column:not([id]) ul li a";

/// How a listing-queue URL should be processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    /// A root listing: its pagination URLs fan out into the listings queue
    Root,

    /// A leaf listing page: its podcast anchors go to the podcasts queue
    Leaf,
}

/// Collects hrefs for every element matched by `selector`, in document order
fn select_hrefs(html: &str, selector: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut urls = Vec::new();

    if let Ok(selector) = Selector::parse(selector) {
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                urls.push(href.to_string());
            }
        }
    }

    urls
}

/// Top-level category URLs from the catalog root page
pub fn category_urls(html: &str) -> Vec<String> {
    select_hrefs(html, CATEGORY_ANCHORS)
}

/// Alphabetical sub-listing URLs from a category page
pub fn listing_urls(html: &str) -> Vec<String> {
    select_hrefs(html, LISTING_ANCHORS)
}

/// Page-index URLs from a root listing page
pub fn pagination_urls(html: &str) -> Vec<String> {
    select_hrefs(html, PAGINATION_ANCHORS)
}

/// Podcast detail URLs from a leaf listing page
pub fn podcast_urls(html: &str) -> Vec<String> {
    select_hrefs(html, PODCAST_ANCHORS)
}

/// True when the page carries a pagination node-set
pub fn has_pagination(html: &str) -> bool {
    !pagination_urls(html).is_empty()
}

/// Decides how a listing URL is processed.
///
/// A URL that already encodes a page index (contains [`PAGE_MARKER`],
/// case-insensitive) is always a leaf, regardless of its HTML; the URL
/// check takes precedence over the pagination node-set check. Only
/// marker-less URLs whose page contains pagination markers are roots.
pub fn classify_listing(url: &str, html: &str) -> ListingKind {
    if url.to_ascii_lowercase().contains(PAGE_MARKER) {
        return ListingKind::Leaf;
    }
    if has_pagination(html) {
        ListingKind::Root
    } else {
        ListingKind::Leaf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT_PAGE: &str = r#"
        <html><body>
            <a class="top-level-genre" href="https://example.com/genre/arts/id1301">Arts</a>
            <a class="top-level-genre" href="https://example.com/genre/comedy/id1303">Comedy</a>
            <a class="top-level-genre">No href</a>
            <a href="https://example.com/other">Unrelated</a>
        </body></html>
    "#;

    const CATEGORY_PAGE: &str = r#"
        <html><body>
            <div id="selectedgenre">
                <ul class="list alpha">
                    <li><a href="https://example.com/arts?letter=A">A</a></li>
                    <li><a href="https://example.com/arts?letter=B">B</a></li>
                    <li><a>broken</a></li>
                </ul>
            </div>
        </body></html>
    "#;

    const ROOT_LISTING_PAGE: &str = r#"
        <html><body>
            <ul class="list paginate">
                <li><a href="https://example.com/arts?letter=A&amp;page=1">1</a></li>
                <li><a href="https://example.com/arts?letter=A&amp;page=2">2</a></li>
            </ul>
            <div class="column">
                <ul><li><a href="https://example.com/podcast/p1">P1</a></li></ul>
            </div>
        </body></html>
    "#;

    const LEAF_LISTING_PAGE: &str = r#"
        <html><body>
            <div class="column first">
                <ul>
                    <li><a href="https://example.com/podcast/p1">P1</a></li>
                    <li><a href="https://example.com/podcast/p2">P2</a></li>
                </ul>
            </div>
            <div class="column" id="selectedcontent">
                <ul><li><a href="https://example.com/skip-me">skip</a></li></ul>
            </div>
        </body></html>
    "#;

    #[test]
    fn test_category_urls_in_document_order() {
        let urls = category_urls(ROOT_PAGE);
        assert_eq!(
            urls,
            [
                "https://example.com/genre/arts/id1301",
                "https://example.com/genre/comedy/id1303",
            ]
        );
    }

    #[test]
    fn test_anchors_without_href_skipped() {
        // ROOT_PAGE has one category anchor without href; CATEGORY_PAGE one
        assert_eq!(category_urls(ROOT_PAGE).len(), 2);
        assert_eq!(listing_urls(CATEGORY_PAGE).len(), 2);
    }

    #[test]
    fn test_listing_urls() {
        let urls = listing_urls(CATEGORY_PAGE);
        assert_eq!(urls[0], "https://example.com/arts?letter=A");
    }

    #[test]
    fn test_pagination_hrefs_entity_decoded() {
        let urls = pagination_urls(ROOT_LISTING_PAGE);
        // The page encodes `&` as `&amp;`; extraction yields the decoded URL
        assert_eq!(urls[0], "https://example.com/arts?letter=A&page=1");
        assert_eq!(urls[1], "https://example.com/arts?letter=A&page=2");
    }

    #[test]
    fn test_podcast_urls_skip_id_columns() {
        let urls = podcast_urls(LEAF_LISTING_PAGE);
        assert_eq!(
            urls,
            [
                "https://example.com/podcast/p1",
                "https://example.com/podcast/p2",
            ]
        );
    }

    #[test]
    fn test_has_pagination() {
        assert!(has_pagination(ROOT_LISTING_PAGE));
        assert!(!has_pagination(LEAF_LISTING_PAGE));
    }

    #[test]
    fn test_url_marker_beats_pagination_markup() {
        // Page HTML contains pagination, but the URL already has a page index:
        // the URL check wins and the page is a leaf
        let url = "https://example.com/arts?letter=A&page=2";
        assert_eq!(classify_listing(url, ROOT_LISTING_PAGE), ListingKind::Leaf);

        // Case-insensitive marker match
        let url = "https://example.com/arts?letter=A&PAGE=2";
        assert_eq!(classify_listing(url, ROOT_LISTING_PAGE), ListingKind::Leaf);
    }

    #[test]
    fn test_markerless_url_with_pagination_is_root() {
        let url = "https://example.com/arts?letter=A";
        assert_eq!(classify_listing(url, ROOT_LISTING_PAGE), ListingKind::Root);
    }

    #[test]
    fn test_markerless_url_without_pagination_is_leaf() {
        let url = "https://example.com/arts?letter=A";
        assert_eq!(classify_listing(url, LEAF_LISTING_PAGE), ListingKind::Leaf);
    }
}
