//! Document-level plumbing shared by every extractor: header
//! resolution, pagination discovery, colspan expansion, and the
//! site-specific helpers for tiers, countries, seasons and player
//! images.

use lazy_static::lazy_static;
use pitchmarket::entities::{Country, PlayerImage};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;

use super::fields::collect_text;

pub(crate) mod selectors {
    use lazy_static::lazy_static;
    use scraper::Selector;

    macro_rules! sel {
        ($name:ident, $css:expr) => {
            lazy_static! {
                pub static ref $name: Selector =
                    Selector::parse($css).expect("hardcoded selector, shouldn't fail");
            }
        };
    }

    sel!(ANCHOR, "a");
    sel!(TABLE, "table");
    sel!(ITEMS_TABLE, "table.items");
    sel!(THEAD_ROW, "thead tr");
    sel!(ROW, "tr");
    sel!(BODY_ROW, "tbody tr");
    sel!(HEADER_CELL, "th, td");
    sel!(CELL, "td");
    sel!(DIVIDER_CELL, "td.extrarow");
    sel!(HAUPTLINK_ANCHOR, "td.hauptlink a");
    sel!(FLAG_IMG, "img.flaggenrahmen");
    sel!(PORTRAIT_IMG, "img.bilderrahmen-fixed");
    sel!(SEASON_OPTION, r#"select[name="saison_id"] option"#);
}

lazy_static! {
    // pagination containers, in priority order
    static ref PAGINATION: Vec<Selector> = [
        "ul.tm-pagination",
        "div.pagination",
        "ul.pagination",
        "nav[role='navigation'] ul",
    ]
    .iter()
    .map(|css| Selector::parse(css).expect("hardcoded selector, shouldn't fail"))
    .collect();

    static ref DIGITS: Regex = Regex::new(r"\d+").expect("hardcoded regex, shouldn't fail");
    static ref PAGE_PARAM: Regex =
        Regex::new(r"page=(\d+)").expect("hardcoded regex, shouldn't fail");
    static ref FLAG_ID: Regex =
        Regex::new(r"(\d+)\.png").expect("hardcoded regex, shouldn't fail");
    static ref PLAYER_ID: Regex =
        Regex::new(r"spieler/(\d+)").expect("hardcoded regex, shouldn't fail");
}

/// Find the main listing table in a page: the `items` table when
/// present, otherwise the first table at all.
pub fn items_table(doc: &Html) -> Option<ElementRef<'_>> {
    doc.select(&selectors::ITEMS_TABLE)
        .next()
        .or_else(|| doc.select(&selectors::TABLE).next())
}

/// Map a table's column headers to their zero-based indices.
///
/// The header row is taken from `<thead>` when present, otherwise the
/// table's first row. Labels are normalized (lowercase, spaces to
/// underscores, periods stripped, the `ø` average glyph spelled out as
/// `avg`); empty labels are skipped. An optional `prefix` namespaces
/// every key so two tables can share one processing function. Returns an
/// empty map when no header row exists, which callers read as "nothing
/// to extract".
pub fn resolve_headers(
    table: ElementRef,
    prefix: Option<&str>,
) -> BTreeMap<String, usize> {
    let header_row = table
        .select(&selectors::THEAD_ROW)
        .next()
        .or_else(|| table.select(&selectors::ROW).next());

    let Some(row) = header_row else {
        return BTreeMap::new();
    };

    let mut headers = BTreeMap::new();
    for (index, cell) in row.select(&selectors::HEADER_CELL).enumerate() {
        let label = normalize_label(&collect_text(cell));
        if label.is_empty() {
            continue;
        }
        let key = match prefix {
            Some(p) => format!("{}{}", p, label),
            None => label,
        };
        headers.insert(key, index);
    }

    headers
}

fn normalize_label(label: &str) -> String {
    label
        .to_lowercase()
        .replace(' ', "_")
        .replace('.', "")
        .replace('ø', "avg")
}

/// Total number of listing pages advertised by a page's pagination
/// widget. Scans the first matching container for page numbers in link
/// text and in `page=` query parameters; absence of pagination is a
/// single page, never an error.
pub fn total_pages(doc: &Html) -> usize {
    let Some(pagination) = PAGINATION.iter().find_map(|s| doc.select(s).next()) else {
        return 1;
    };

    let mut candidates = Vec::new();
    for link in pagination.select(&selectors::ANCHOR) {
        let text = collect_text(link);
        for m in DIGITS.find_iter(&text) {
            if let Ok(n) = m.as_str().parse::<usize>() {
                candidates.push(n);
            }
        }
        if let Some(href) = link.value().attr("href") {
            for cap in PAGE_PARAM.captures_iter(href) {
                if let Ok(n) = cap[1].parse::<usize>() {
                    candidates.push(n);
                }
            }
        }
    }

    candidates.into_iter().max().unwrap_or(1).max(1)
}

/// A row's cells with `colspan` expanded, so cell indices line up with
/// header columns even across merged cells.
pub fn expand_cells(row: ElementRef) -> Vec<ElementRef<'_>> {
    let mut cells = Vec::new();
    for cell in row.select(&selectors::CELL) {
        let colspan = cell
            .value()
            .attr("colspan")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(1)
            .max(1);
        for _ in 0..colspan {
            cells.push(cell);
        }
    }
    cells
}

/// Competition → tier mapping read off the listing table's divider rows.
///
/// A divider is a body row whose only content is one spanning
/// `td.extrarow` naming the tier; the league rows that follow belong to
/// that tier until the next divider.
pub fn league_tiers(table: ElementRef) -> BTreeMap<String, String> {
    let mut tiers = BTreeMap::new();
    let mut current_tier: Option<String> = None;

    for row in table.select(&selectors::BODY_ROW) {
        if let Some(divider) = row.select(&selectors::DIVIDER_CELL).next() {
            let tier = collect_text(divider);
            if !tier.is_empty() {
                current_tier = Some(tier);
            }
            continue;
        }

        let Some(tier) = &current_tier else { continue };
        if let Some(anchor) = row.select(&selectors::ANCHOR).next() {
            let competition = anchor
                .value()
                .attr("title")
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .unwrap_or_else(|| collect_text(anchor));
            if !competition.is_empty() {
                tiers.insert(competition, tier.clone());
            }
        }
    }

    tiers
}

/// Countries mentioned in a listing table, keyed by the numeric id
/// embedded in their flag resource. Duplicates collapse naturally.
pub fn country_info(table: ElementRef) -> Vec<Country> {
    let mut seen = BTreeMap::new();

    for flag in table.select(&selectors::FLAG_IMG) {
        let Some(src) = flag.value().attr("src") else {
            continue;
        };
        let Some(id) = FLAG_ID.captures(src).map(|c| String::from(&c[1])) else {
            continue;
        };
        let name = flag
            .value()
            .attr("title")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from);
        let Some(name) = name else { continue };

        seen.entry(id.clone()).or_insert(Country {
            id,
            name,
            flag_url: String::from(src),
        });
    }

    seen.into_values().collect()
}

/// Season keys offered by a league page's season selector, in document
/// order. Empty when the page has no such widget.
pub fn seasons(doc: &Html) -> Vec<String> {
    doc.select(&selectors::SEASON_OPTION)
        .filter_map(|option| option.value().attr("value"))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect()
}

/// Player portrait metadata in a squad table, keyed by player id parsed
/// from the row's profile link.
pub fn player_images(table: ElementRef) -> BTreeMap<String, PlayerImage> {
    let mut images = BTreeMap::new();

    for row in table.select(&selectors::BODY_ROW) {
        let id = row
            .select(&selectors::ANCHOR)
            .filter_map(|a| a.value().attr("href"))
            .find_map(|href| PLAYER_ID.captures(href).map(|c| String::from(&c[1])));
        let Some(id) = id else { continue };

        let Some(img) = row.select(&selectors::PORTRAIT_IMG).next() else {
            continue;
        };
        // lazy-loaded portraits keep the real URL in data-src
        let url = img
            .value()
            .attr("data-src")
            .or_else(|| img.value().attr("src"))
            .map(String::from);
        let Some(url) = url else { continue };

        images.insert(
            id,
            PlayerImage {
                url,
                title: img.value().attr("title").map(String::from),
            },
        );
    }

    images
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_of(html: &str) -> Html {
        Html::parse_fragment(html)
    }

    fn first_table(doc: &Html) -> ElementRef<'_> {
        doc.select(&selectors::TABLE).next().expect("table present")
    }

    #[test]
    fn headers_resolve_from_thead() {
        let doc = table_of(
            "<table><thead><tr>\
             <th>Competition</th><th>Country</th><th>Clubs</th>\
             <th>Avg. age</th><th>ø Market value</th><th></th>\
             </tr></thead></table>",
        );
        let headers = resolve_headers(first_table(&doc), None);

        assert_eq!(headers["competition"], 0);
        assert_eq!(headers["country"], 1);
        assert_eq!(headers["clubs"], 2);
        assert_eq!(headers["avg_age"], 3);
        assert_eq!(headers["avg_market_value"], 4);
        // the empty sixth label is skipped
        assert_eq!(headers.len(), 5);
    }

    #[test]
    fn headers_fall_back_to_first_row_and_accept_prefix() {
        let doc = table_of("<table><tr><td>Club</td><td>Squad</td></tr></table>");
        let headers = resolve_headers(first_table(&doc), Some("league_"));

        assert_eq!(headers["league_club"], 0);
        assert_eq!(headers["league_squad"], 1);
    }

    #[test]
    fn header_resolution_is_idempotent() {
        let doc = table_of(
            "<table><thead><tr><th>Competition</th><th>Country</th></tr></thead></table>",
        );
        let table = first_table(&doc);
        assert_eq!(resolve_headers(table, None), resolve_headers(table, None));
    }

    #[test]
    fn missing_header_row_yields_empty_map() {
        let doc = table_of("<table></table>");
        assert!(resolve_headers(first_table(&doc), None).is_empty());
    }

    #[test]
    fn pagination_unions_text_and_query_evidence() {
        let doc = Html::parse_document(
            r##"<ul class="tm-pagination">
                <li><a href="?page=1">1</a></li>
                <li><a href="?page=2">2</a></li>
                <li><a href="?page=3">…</a></li>
                <li><a href="?page=7">7</a></li>
            </ul>"##,
        );
        assert_eq!(total_pages(&doc), 7);
    }

    #[test]
    fn pagination_reads_hidden_page_params() {
        let doc = Html::parse_document(
            r##"<div class="pagination"><a href="/x?page=12">last »</a></div>"##,
        );
        assert_eq!(total_pages(&doc), 12);
    }

    #[test]
    fn no_pagination_means_single_page() {
        let doc = Html::parse_document("<p>no pagination here</p>");
        assert_eq!(total_pages(&doc), 1);
    }

    #[test]
    fn colspan_cells_expand() {
        let doc = table_of(
            r#"<table><tr><td colspan="3">wide</td><td>narrow</td></tr></table>"#,
        );
        let row = doc.select(&selectors::ROW).next().expect("row present");
        assert_eq!(expand_cells(row).len(), 4);
    }

    #[test]
    fn divider_rows_assign_tiers() {
        let doc = table_of(
            r#"<table><tbody>
                <tr><td class="extrarow" colspan="5">First Tier</td></tr>
                <tr><td><a title="Premier League" href="/gb1">PL</a></td><td>England</td></tr>
                <tr><td class="extrarow" colspan="5">Second Tier</td></tr>
                <tr><td><a title="Championship" href="/gb2">CS</a></td><td>England</td></tr>
            </tbody></table>"#,
        );
        let tiers = league_tiers(first_table(&doc));

        assert_eq!(tiers["Premier League"], "First Tier");
        assert_eq!(tiers["Championship"], "Second Tier");
    }

    #[test]
    fn countries_deduplicate_on_flag_id() {
        let doc = table_of(
            r#"<table><tbody><tr>
                <td><img class="flaggenrahmen" src="/flags/189.png" title="England"></td>
                <td><img class="flaggenrahmen" src="/flags/189.png" title="England"></td>
                <td><img class="flaggenrahmen" src="/flags/50.png" title="Spain"></td>
            </tr></tbody></table>"#,
        );
        let countries = country_info(first_table(&doc));

        assert_eq!(countries.len(), 2);
        assert!(countries.iter().any(|c| c.id == "189" && c.name == "England"));
        assert!(countries.iter().any(|c| c.id == "50" && c.name == "Spain"));
    }

    #[test]
    fn seasons_come_back_in_document_order() {
        let doc = Html::parse_document(
            r#"<select name="saison_id">
                <option value="2024">24/25</option>
                <option value="2023">23/24</option>
                <option value="">-</option>
            </select>"#,
        );
        assert_eq!(seasons(&doc), vec!["2024", "2023"]);
    }

    #[test]
    fn player_images_key_on_profile_id() {
        let doc = table_of(
            r#"<table><tbody><tr>
                <td><img class="bilderrahmen-fixed" data-src="https://img/342229.jpg" title="K. Mbappé"></td>
                <td><a href="/profil/spieler/342229">K. Mbappé</a></td>
            </tr></tbody></table>"#,
        );
        let images = player_images(first_table(&doc));

        assert_eq!(images["342229"].url, "https://img/342229.jpg");
        assert_eq!(images["342229"].title.as_deref(), Some("K. Mbappé"));
    }
}
