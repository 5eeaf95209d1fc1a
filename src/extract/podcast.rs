//! Podcast detail page extraction
//!
//! Populates a [`PodcastRecord`] from fixed structural paths. Every field
//! lookup is independently optional: a missing node yields the field's
//! empty/zero/`None` default instead of failing the page, so a partially
//! rendered page still produces a usable record.

use crate::record::{last_release_from, sentinel_date, Episode, PodcastRecord};
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};

const NAME_PATH: &str = "#title div.left h1";
const AUTHOR_PATH: &str = "#title div.left h2";
const DESCRIPTION_PATH: &str = r#"div.product-review[metrics-loc="Titledbox_Description"] p"#;
const THUMBNAIL_PATH: &str = "div.lockup.product.podcast a div img";
const CATEGORY_PATH: &str = "li.genre a span";
const LANGUAGE_PATH: &str = "li.language";
const RATING_PATH: &str = r#"span.rating-count[itemprop="reviewCount"]"#;
const WEBSITE_ANCHORS: &str = "ul li a";
const WEBSITE_LABEL: &str = "Podcast Website";
const MORE_BY_AUTHOR_PATH: &str = "div.extra-list.more-by[metrics-loc] ul li div a";
const RELATED_PATH: &str = r#"div[metrics-loc="Swoosh_"] div.lockup.small.podcast.audio a.artwork-link"#;
const EPISODE_ROWS: &str = r#"table[role="presentation"] tr[kind]"#;

/// Date formats attempted for episode release dates, most common first
const DATE_FORMATS: &[&str] = &["%b %d, %Y", "%B %d, %Y", "%m/%d/%Y", "%Y-%m-%d"];

/// Extracts a full record from a detail page.
///
/// The caller owns identity: `id` and `url` are left empty here and filled
/// in from the work item by the detail stage.
pub fn parse_podcast_page(html: &str) -> PodcastRecord {
    let document = Html::parse_document(html);

    let mut record = PodcastRecord {
        name: text_at(&document, NAME_PATH),
        author: strip_by_prefix(&text_at(&document, AUTHOR_PATH)),
        description: text_at(&document, DESCRIPTION_PATH),
        thumbnail: attr_at(&document, THUMBNAIL_PATH, "src").unwrap_or_default(),
        category: text_at(&document, CATEGORY_PATH),
        language: strip_language_prefix(&text_at(&document, LANGUAGE_PATH)),
        rating_count: parse_rating(&text_at(&document, RATING_PATH)),
        website: find_website(&document),
        author_podcasts: hrefs_at(&document, MORE_BY_AUTHOR_PATH),
        related_podcasts: hrefs_at(&document, RELATED_PATH),
        ..PodcastRecord::default()
    };

    record.episodes = parse_episodes(&document);
    record.last_release_date = last_release_from(&record.episodes);
    record
}

/// Lenient release date parse: tries the known formats and substitutes the
/// sentinel instead of failing.
pub fn parse_release_date(text: &str) -> NaiveDate {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .unwrap_or_else(sentinel_date)
}

/// Text content of the first node at `path`, empty when absent
fn text_at(document: &Html, path: &str) -> String {
    let selector = match Selector::parse(path) {
        Ok(selector) => selector,
        Err(_) => return String::new(),
    };
    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Attribute of the first node at `path`
fn attr_at(document: &Html, path: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(path).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr(attr))
        .map(|value| value.to_string())
}

/// Hrefs of every node at `path`; `None` when the section is missing:
/// absent, not empty-but-present
fn hrefs_at(document: &Html, path: &str) -> Option<Vec<String>> {
    let selector = Selector::parse(path).ok()?;
    let urls: Vec<String> = document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(|href| href.to_string())
        .collect();

    if urls.is_empty() {
        None
    } else {
        Some(urls)
    }
}

/// Strips the "By " byline prefix from author text. Locale-specific on
/// purpose; the catalog renders author lines in English.
fn strip_by_prefix(author: &str) -> String {
    let trimmed = author.trim();
    match trimmed.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("by ") => trimmed[3..].trim().to_string(),
        _ => trimmed.to_string(),
    }
}

fn strip_language_prefix(language: &str) -> String {
    language.trim().replacen("Language:", "", 1).trim().to_string()
}

/// Parses the leading integer of the rating-count text ("123 Ratings"),
/// defaulting to 0 when the node is absent or unparsable
fn parse_rating(text: &str) -> u32 {
    text.split_whitespace()
        .next()
        .and_then(|token| token.parse().ok())
        .unwrap_or(0)
}

/// The website link is identified by its anchor text, not a structural path
fn find_website(document: &Html) -> Option<String> {
    let selector = Selector::parse(WEBSITE_ANCHORS).ok()?;
    document
        .select(&selector)
        .find(|element| element.text().collect::<String>().trim() == WEBSITE_LABEL)
        .and_then(|element| element.value().attr("href"))
        .map(|href| href.to_string())
}

/// Parses episode rows from the presentation table.
///
/// Cells carry their payload in `sort-value` attributes: index, name,
/// description, release date. Missing cells degrade per field; the index
/// falls back to the row position, the date to the sentinel.
fn parse_episodes(document: &Html) -> Vec<Episode> {
    let row_selector = match Selector::parse(EPISODE_ROWS) {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    document
        .select(&row_selector)
        .enumerate()
        .map(|(position, row)| {
            let cells: Vec<ElementRef> = row
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|element| element.value().name() == "td")
                .collect();

            let sort_value =
                |cell: usize| cells.get(cell).and_then(|c| c.value().attr("sort-value"));

            Episode {
                index: sort_value(0)
                    .and_then(|value| value.trim().parse().ok())
                    .unwrap_or(position as u32 + 1),
                name: sort_value(1).map(|v| v.trim().to_string()).unwrap_or_default(),
                description: sort_value(2).map(|v| v.trim().to_string()).unwrap_or_default(),
                release_date: sort_value(3)
                    .map(parse_release_date)
                    .unwrap_or_else(sentinel_date),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::is_sentinel;

    fn detail_page(episode_rows: &str) -> String {
        format!(
            r##"<html><body>
                <div id="title"><div class="left">
                    <h1>The Example Show</h1>
                    <h2>By Jane Doe</h2>
                </div></div>
                <div class="lockup product podcast">
                    <a href="#"><div><img src="https://example.com/art.jpg"/></div></a>
                </div>
                <div metrics-loc="Titledbox_Description" class="product-review">
                    <p>Weekly conversations &amp; interviews.</p>
                </div>
                <ul>
                    <li class="genre"><a href="#"><span>Arts</span></a></li>
                    <li class="language">Language: English</li>
                    <li><a href="https://example.org">Podcast Website</a></li>
                </ul>
                <span class="rating-count" itemprop="reviewCount">42 Ratings</span>
                <div metrics-loc="Titledbox_More" class="extra-list more-by">
                    <ul><li><div><a href="https://example.com/podcast/other">Other</a></div></li></ul>
                </div>
                <div metrics-loc="Swoosh_">
                    <div class="lockup small podcast audio">
                        <a class="artwork-link" href="https://example.com/podcast/related"></a>
                    </div>
                </div>
                <table role="presentation">{episode_rows}</table>
            </body></html>"##
        )
    }

    fn episode_row(index: u32, name: &str, date: Option<&str>) -> String {
        let date_cell = match date {
            Some(d) => format!(r#"<td sort-value="{d}">{d}</td>"#),
            None => "<td></td>".to_string(),
        };
        format!(
            r#"<tr kind="episode">
                <td sort-value="{index}">{index}</td>
                <td sort-value="{name}">{name}</td>
                <td sort-value="About {name}">About {name}</td>
                {date_cell}
            </tr>"#
        )
    }

    #[test]
    fn test_full_record() {
        let rows = [
            episode_row(1, "Pilot", Some("Jun 10, 2015")),
            episode_row(2, "Second", Some("Sep 1, 2015")),
        ]
        .join("");
        let record = parse_podcast_page(&detail_page(&rows));

        assert_eq!(record.name, "The Example Show");
        assert_eq!(record.author, "Jane Doe");
        assert_eq!(record.description, "Weekly conversations & interviews.");
        assert_eq!(record.thumbnail, "https://example.com/art.jpg");
        assert_eq!(record.category, "Arts");
        assert_eq!(record.language, "English");
        assert_eq!(record.rating_count, 42);
        assert_eq!(record.website.as_deref(), Some("https://example.org"));
        assert_eq!(
            record.author_podcasts.as_deref(),
            Some(&["https://example.com/podcast/other".to_string()][..])
        );
        assert_eq!(
            record.related_podcasts.as_deref(),
            Some(&["https://example.com/podcast/related".to_string()][..])
        );
        assert_eq!(record.episodes.len(), 2);
        assert_eq!(
            record.last_release_date,
            NaiveDate::from_ymd_opt(2015, 9, 1).unwrap()
        );
    }

    #[test]
    fn test_missing_fields_default() {
        let record = parse_podcast_page("<html><body></body></html>");

        assert!(record.name.is_empty());
        assert!(record.author.is_empty());
        assert_eq!(record.rating_count, 0);
        assert!(record.website.is_none());
        assert!(record.author_podcasts.is_none());
        assert!(record.related_podcasts.is_none());
        assert!(record.episodes.is_empty());
        assert!(is_sentinel(&record.last_release_date));
    }

    #[test]
    fn test_author_by_prefix_stripped() {
        assert_eq!(strip_by_prefix("By Jane Doe"), "Jane Doe");
        assert_eq!(strip_by_prefix("by Jane Doe"), "Jane Doe");
        // No prefix: left intact
        assert_eq!(strip_by_prefix("Jane Doe"), "Jane Doe");
        // "By" must be a standalone word
        assert_eq!(strip_by_prefix("Byron Smith"), "Byron Smith");
    }

    #[test]
    fn test_language_prefix_stripped() {
        assert_eq!(strip_language_prefix("Language: English"), "English");
        assert_eq!(strip_language_prefix("English"), "English");
    }

    #[test]
    fn test_rating_parses_leading_integer() {
        assert_eq!(parse_rating("42 Ratings"), 42);
        assert_eq!(parse_rating(""), 0);
        assert_eq!(parse_rating("no ratings yet"), 0);
    }

    #[test]
    fn test_episode_missing_date_gets_sentinel() {
        let rows = [
            episode_row(1, "One", Some("Jun 10, 2015")),
            episode_row(2, "Two", None),
            episode_row(3, "Three", Some("Mar 2, 2015")),
        ]
        .join("");
        let record = parse_podcast_page(&detail_page(&rows));

        assert_eq!(record.episodes.len(), 3);
        assert!(is_sentinel(&record.episodes[1].release_date));
        // The sentinel is skipped; the real maximum wins
        assert_eq!(
            record.last_release_date,
            NaiveDate::from_ymd_opt(2015, 6, 10).unwrap()
        );
    }

    #[test]
    fn test_all_dates_unparsable_yields_sentinel() {
        let rows = [
            episode_row(1, "One", None),
            episode_row(2, "Two", Some("whenever")),
            episode_row(3, "Three", None),
        ]
        .join("");
        let record = parse_podcast_page(&detail_page(&rows));

        assert!(record.episodes.iter().all(|e| is_sentinel(&e.release_date)));
        assert!(is_sentinel(&record.last_release_date));
    }

    #[test]
    fn test_episode_order_and_index() {
        let rows = [
            episode_row(7, "Seven", Some("Jan 5, 2016")),
            episode_row(6, "Six", Some("Dec 29, 2015")),
        ]
        .join("");
        let record = parse_podcast_page(&detail_page(&rows));

        // Page order is preserved; indexes come from the page
        assert_eq!(record.episodes[0].index, 7);
        assert_eq!(record.episodes[1].index, 6);
    }

    #[test]
    fn test_release_date_formats() {
        assert_eq!(
            parse_release_date("Jun 10, 2015"),
            NaiveDate::from_ymd_opt(2015, 6, 10).unwrap()
        );
        assert_eq!(
            parse_release_date("June 10, 2015"),
            NaiveDate::from_ymd_opt(2015, 6, 10).unwrap()
        );
        assert_eq!(
            parse_release_date("06/10/2015"),
            NaiveDate::from_ymd_opt(2015, 6, 10).unwrap()
        );
        assert_eq!(
            parse_release_date("2015-06-10"),
            NaiveDate::from_ymd_opt(2015, 6, 10).unwrap()
        );
        assert!(is_sentinel(&parse_release_date("gibberish")));
    }

    #[test]
    fn test_identical_extraction_for_identical_input() {
        let rows = episode_row(1, "Pilot", Some("Jun 10, 2015"));
        let page = detail_page(&rows);

        let first = parse_podcast_page(&page);
        let second = parse_podcast_page(&page);
        assert_eq!(first, second);
    }
}
