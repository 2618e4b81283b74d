//! League extraction from a region's competition listing table.

use pitchmarket::entities::{League, Region};
use scraper::ElementRef;

use super::engine;
use super::fields::{
    self, anchor_href, anchor_text, currency_cell, extract_row, float_cell, int_cell,
    CellValue, FieldSpec,
};
use super::Summary;

pub(crate) const BASE_URL: &str = "https://www.transfermarkt.com";

/// Default row-width filter against decorative and sub-header rows
pub const MIN_COLUMNS: usize = 5;

const TIER_FALLBACK: &str = "Unknown Tier";

static LEAGUE_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        field: "competition",
        key: "competition",
        offset: 0,
        default: CellValue::Null,
        transform: anchor_text,
    },
    FieldSpec {
        field: "url",
        key: "competition",
        offset: 0,
        default: CellValue::Null,
        transform: anchor_href,
    },
    FieldSpec {
        field: "country",
        key: "country",
        offset: 0,
        default: CellValue::Null,
        transform: country_name,
    },
    FieldSpec {
        field: "clubs",
        key: "clubs",
        offset: 0,
        default: CellValue::Int(0),
        transform: int_cell,
    },
    FieldSpec {
        field: "players",
        key: "players",
        offset: 0,
        default: CellValue::Int(0),
        transform: int_cell,
    },
    FieldSpec {
        field: "avg_age",
        key: "avg_age",
        offset: 0,
        default: CellValue::Null,
        transform: float_cell,
    },
    FieldSpec {
        field: "foreigners",
        key: "foreigners",
        offset: 0,
        default: CellValue::Null,
        transform: float_cell,
    },
    FieldSpec {
        field: "game_ratio_of_foreign_players",
        key: "game_ratio_of_foreign_players",
        offset: 0,
        default: CellValue::Null,
        transform: float_cell,
    },
    FieldSpec {
        field: "goals_per_match",
        key: "goals_per_match",
        offset: 0,
        default: CellValue::Null,
        transform: float_cell,
    },
    FieldSpec {
        field: "average_market_value",
        key: "avg_market_value",
        offset: 0,
        default: CellValue::Null,
        transform: currency_cell,
    },
    FieldSpec {
        field: "total_value",
        key: "total_value",
        offset: 0,
        default: CellValue::Null,
        transform: currency_cell,
    },
];

/// Country cell: the flag image's title, or the plain cell text when
/// the listing carries no flag
fn country_name(cell: ElementRef) -> Option<CellValue> {
    let from_flag = cell
        .select(&engine::selectors::FLAG_IMG)
        .next()
        .and_then(|flag| flag.value().attr("title"))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from);

    match from_flag {
        Some(name) => Some(CellValue::Text(name)),
        None => fields::cell_text(cell),
    }
}

/// Extract every league row of a listing table straight into the region:
/// countries are deduplicated in, divider rows decide each league's
/// tier, and one broken row only costs that row.
pub fn extract_leagues(
    table: ElementRef,
    min_columns: usize,
    region: &mut Region,
    summary: &mut Summary,
) {
    let headers = engine::resolve_headers(table, None);
    if headers.is_empty() {
        log::warn!("league table has no header row, nothing to extract");
        return;
    }

    for country in engine::country_info(table) {
        region.add_country(country);
    }
    let tiers = engine::league_tiers(table);

    for row in table.select(&engine::selectors::BODY_ROW) {
        // divider rows carry the tier label, not league data; their wide
        // colspan would otherwise sneak them past the width filter
        if row.select(&engine::selectors::DIVIDER_CELL).next().is_some() {
            continue;
        }

        let cells = engine::expand_cells(row);
        if cells.len() < min_columns {
            continue;
        }

        let bag = extract_row(LEAGUE_FIELDS, &headers, &cells);
        match build_league(&bag, &region.id) {
            Some(league) => {
                let tier = tiers
                    .get(&league.competition)
                    .map(String::as_str)
                    .unwrap_or(TIER_FALLBACK);
                log::debug!("league extracted: {} ({})", league.competition, league.id);
                region.add_league(tier, league);
                summary.leagues += 1;
            }
            None => {
                log::warn!("skipping league row without competition link");
                summary.rows_skipped += 1;
            }
        }
    }
}

fn build_league(
    bag: &std::collections::BTreeMap<&'static str, CellValue>,
    fk_region: &str,
) -> Option<League> {
    let competition = bag["competition"].as_str()?;
    let href = bag["url"].as_str()?;
    // natural key: the last path segment of the competition link
    let id = href.rsplit('/').next().filter(|s| !s.is_empty())?;
    let url = absolute_url(href);
    let country = bag["country"].clone().into_text();

    let mut league = League::new(id, competition, country, &url, fk_region);
    league.stats.total_clubs = bag["clubs"].as_int().unwrap_or(0);
    league.stats.total_players = bag["players"].as_int().unwrap_or(0);
    league.stats.avg_age = bag["avg_age"].as_float();
    league.stats.foreigners = bag["foreigners"].as_float();
    league.stats.game_ratio_of_foreign_players =
        bag["game_ratio_of_foreign_players"].as_float();
    league.stats.goals_per_match = bag["goals_per_match"].as_float();
    league.stats.average_market_value = bag["average_market_value"].as_float();
    league.stats.total_value = bag["total_value"].as_float();

    Some(league)
}

pub(crate) fn absolute_url(href: &str) -> String {
    if href.starts_with("http") {
        String::from(href)
    } else {
        format!("{}{}", BASE_URL, href)
    }
}
