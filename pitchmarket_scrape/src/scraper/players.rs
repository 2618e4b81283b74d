//! Player extraction from a team's squad table.
//!
//! The squad table nests a small inline table inside each row's player
//! cell (portrait, profile link, detailed position). Its cells land in
//! the flat cell list right after the player cell, which shifts every
//! later column three places past its header index; the field specs
//! carry that shift as an offset.

use lazy_static::lazy_static;
use pitchmarket::entities::{Player, PlayerImage, Team};
use pitchmarket::stats::PlayerStats;
use regex::Regex;
use scraper::ElementRef;
use std::collections::BTreeMap;

use super::engine;
use super::fields::{
    anchor_href, cell_text, collect_text, currency_cell, extract_row, CellValue, FieldSpec,
};
use super::leagues::absolute_url;
use super::normalize;
use super::Summary;

pub const MIN_COLUMNS: usize = 5;

/// Columns shifted by the inline table nested in the player cell
const NESTED_SHIFT: isize = 3;

lazy_static! {
    static ref PLAYER_ID: Regex =
        Regex::new(r"spieler/(\d+)").expect("hardcoded regex, shouldn't fail");
    static ref TEAM_ID: Regex =
        Regex::new(r"verein/(\d+)").expect("hardcoded regex, shouldn't fail");
    static ref FLAG_ID: Regex =
        Regex::new(r"(\d+)\.png").expect("hardcoded regex, shouldn't fail");
}

static PLAYER_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        field: "name",
        key: "player",
        offset: 0,
        default: CellValue::Null,
        transform: player_name,
    },
    FieldSpec {
        field: "url",
        key: "player",
        offset: 0,
        default: CellValue::Null,
        transform: anchor_href,
    },
    FieldSpec {
        field: "position",
        key: "player",
        offset: 0,
        default: CellValue::Null,
        transform: detailed_position,
    },
    FieldSpec {
        field: "birth_date",
        key: "date_of_birth/age",
        offset: NESTED_SHIFT,
        default: CellValue::Null,
        transform: iso_date,
    },
    FieldSpec {
        field: "age",
        key: "date_of_birth/age",
        offset: NESTED_SHIFT,
        default: CellValue::Null,
        transform: age,
    },
    FieldSpec {
        field: "fk_country",
        key: "nat",
        offset: NESTED_SHIFT,
        default: CellValue::Null,
        transform: nationality_id,
    },
    FieldSpec {
        field: "height",
        key: "height",
        offset: NESTED_SHIFT,
        default: CellValue::Null,
        transform: height,
    },
    FieldSpec {
        field: "foot",
        key: "foot",
        offset: NESTED_SHIFT,
        default: CellValue::Null,
        transform: cell_text,
    },
    FieldSpec {
        field: "joined",
        key: "joined",
        offset: NESTED_SHIFT,
        default: CellValue::Null,
        transform: iso_date,
    },
    FieldSpec {
        field: "contract",
        key: "contract",
        offset: NESTED_SHIFT,
        default: CellValue::Null,
        transform: iso_date,
    },
    FieldSpec {
        field: "fk_signed_from",
        key: "signed_from",
        offset: NESTED_SHIFT,
        default: CellValue::Null,
        transform: signed_from_id,
    },
    FieldSpec {
        field: "market_value",
        key: "market_value",
        offset: NESTED_SHIFT,
        default: CellValue::Null,
        transform: currency_cell,
    },
];

fn player_name(cell: ElementRef) -> Option<CellValue> {
    let anchor = cell
        .select(&engine::selectors::HAUPTLINK_ANCHOR)
        .next()
        .or_else(|| cell.select(&engine::selectors::ANCHOR).next())?;
    let text = collect_text(anchor);
    if text.is_empty() {
        None
    } else {
        Some(CellValue::Text(text))
    }
}

/// Second row of the inline table carries the detailed position
fn detailed_position(cell: ElementRef) -> Option<CellValue> {
    let row = cell.select(&engine::selectors::ROW).nth(1)?;
    let position = row.select(&engine::selectors::CELL).next()?;
    let text = collect_text(position);
    if text.is_empty() {
        None
    } else {
        Some(CellValue::Text(text))
    }
}

fn age(cell: ElementRef) -> Option<CellValue> {
    normalize::parse_age(&collect_text(cell)).map(CellValue::Int)
}

fn iso_date(cell: ElementRef) -> Option<CellValue> {
    normalize::parse_date(&collect_text(cell))
        .map(|date| CellValue::Text(date.format("%Y-%m-%d").to_string()))
}

fn nationality_id(cell: ElementRef) -> Option<CellValue> {
    let flag = cell.select(&engine::selectors::FLAG_IMG).next()?;
    let src = flag.value().attr("src")?;
    FLAG_ID
        .captures(src)
        .map(|c| CellValue::Text(String::from(&c[1])))
}

fn height(cell: ElementRef) -> Option<CellValue> {
    normalize::parse_height(&collect_text(cell)).map(CellValue::Float)
}

fn signed_from_id(cell: ElementRef) -> Option<CellValue> {
    cell.select(&engine::selectors::ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .find_map(|href| TEAM_ID.captures(href))
        .map(|c| CellValue::Text(String::from(&c[1])))
}

/// Extract the players of one squad table and attach nothing; the caller
/// decides which team they join. A row missing its profile link is
/// logged and skipped on its own.
pub fn extract_players(table: ElementRef, team: &Team, summary: &mut Summary) -> Vec<Player> {
    let headers = engine::resolve_headers(table, None);
    if headers.is_empty() {
        log::warn!("player table has no header row, nothing to extract");
        return Vec::new();
    }

    let images = engine::player_images(table);
    let mut players = Vec::new();

    for row in table.select(&engine::selectors::BODY_ROW) {
        // inline-table rows show up here too; the width filter drops them
        let cells = engine::expand_cells(row);
        if cells.len() < MIN_COLUMNS {
            continue;
        }

        let bag = extract_row(PLAYER_FIELDS, &headers, &cells);
        match build_player(&bag, row, team, &images) {
            Some(player) => {
                log::debug!("player extracted: {} ({})", player.name, player.id);
                players.push(player);
                summary.players += 1;
            }
            None => {
                log::warn!("skipping player row without profile link");
                summary.rows_skipped += 1;
            }
        }
    }

    players
}

fn build_player(
    bag: &BTreeMap<&'static str, CellValue>,
    row: ElementRef,
    team: &Team,
    images: &BTreeMap<String, PlayerImage>,
) -> Option<Player> {
    let name = bag["name"].as_str()?;
    let href = bag["url"].as_str()?;
    let id = PLAYER_ID.captures(href).map(|c| String::from(&c[1]))?;
    let url = absolute_url(href);

    // the broad position group sits on the row's titled cell, outside
    // any header-mapped column
    let general_position = row
        .select(&engine::selectors::CELL)
        .find_map(|cell| cell.value().attr("title"))
        .map(String::from);

    let image = images.get(&id).cloned();
    if image.is_none() {
        log::debug!("no portrait found for player {}", id);
    }

    let stats = PlayerStats {
        position: bag["position"].clone().into_text(),
        general_position,
        foot: bag["foot"].clone().into_text(),
        height: bag["height"].as_float(),
        age: bag["age"].as_int(),
        birth_date: bag["birth_date"].clone().into_text(),
        market_value: bag["market_value"].as_float(),
    };

    Some(Player {
        id,
        fk_region: team.fk_region.clone(),
        fk_league: team.fk_league.clone(),
        fk_team: team.id.clone(),
        season: team.season.clone(),
        name: String::from(name),
        url: Some(url),
        fk_country: bag["fk_country"].clone().into_text(),
        joined: bag["joined"].clone().into_text(),
        contract: bag["contract"].clone().into_text(),
        fk_signed_from: bag["fk_signed_from"].clone().into_text(),
        image,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::Summary;
    use pitchmarket::stats::TeamStats;
    use scraper::Html;

    fn team() -> Team {
        Team {
            id: String::from("11"),
            fk_region: String::from("EUR1"),
            fk_league: String::from("GB1"),
            season: String::from("2024"),
            name: String::from("Arsenal FC"),
            url: String::from("https://www.transfermarkt.com/fc-arsenal/kader/verein/11"),
            stats: TeamStats {
                fk_team: String::from("11"),
                fk_region: String::from("EUR1"),
                fk_league: String::from("GB1"),
                season: String::from("2024"),
                total_players: 26,
                avg_age: None,
                foreigners: 0,
                average_market_value: None,
                total_market_value: None,
            },
            players: BTreeMap::new(),
        }
    }

    fn squad_table() -> Html {
        Html::parse_document(
            r#"<table class="items">
            <thead><tr>
                <th>#</th><th>Player</th><th>Date of birth/Age</th><th>Nat.</th>
                <th>Height</th><th>Foot</th><th>Joined</th><th>Signed from</th>
                <th>Contract</th><th>Market value</th>
            </tr></thead>
            <tbody>
                <tr>
                    <td class="zentriert">7</td>
                    <td class="posrela">
                        <table class="inline-table">
                            <tr>
                                <td rowspan="2"><img class="bilderrahmen-fixed" data-src="https://img.example.com/433177.jpg" title="Bukayo Saka"></td>
                                <td class="hauptlink"><a href="/bukayo-saka/profil/spieler/433177">Bukayo Saka</a></td>
                            </tr>
                            <tr><td>Right Winger</td></tr>
                        </table>
                    </td>
                    <td class="zentriert">Sep 5, 2001 (23)</td>
                    <td class="zentriert"><img class="flaggenrahmen" src="/flags/189.png" title="England"></td>
                    <td class="zentriert">1,78 m</td>
                    <td class="zentriert">left</td>
                    <td class="zentriert">Jul 1, 2019</td>
                    <td class="zentriert"><a href="/fc-arsenal-u18/startseite/verein/9777"><img src="/logo/9777.gif" title="Arsenal U18"></a></td>
                    <td class="zentriert">Jun 30, 2027</td>
                    <td class="rechts hauptlink">€150,00m</td>
                </tr>
            </tbody></table>"#,
        )
    }

    #[test]
    fn squad_rows_become_players_despite_nested_cells() {
        let doc = squad_table();
        let table = engine::items_table(&doc).expect("table present");
        let mut summary = Summary::default();

        let players = extract_players(table, &team(), &mut summary);

        assert_eq!(players.len(), 1);
        let saka = &players[0];
        assert_eq!(saka.id, "433177");
        assert_eq!(saka.name, "Bukayo Saka");
        assert_eq!(saka.fk_team, "11");
        assert_eq!(saka.fk_league, "GB1");
        assert_eq!(saka.season, "2024");
        assert_eq!(saka.fk_country.as_deref(), Some("189"));
        assert_eq!(saka.joined.as_deref(), Some("2019-07-01"));
        assert_eq!(saka.contract.as_deref(), Some("2027-06-30"));
        assert_eq!(saka.fk_signed_from.as_deref(), Some("9777"));

        assert_eq!(saka.stats.position.as_deref(), Some("Right Winger"));
        assert_eq!(saka.stats.birth_date.as_deref(), Some("2001-09-05"));
        assert_eq!(saka.stats.age, Some(23));
        assert_eq!(saka.stats.height, Some(1.78));
        assert_eq!(saka.stats.foot.as_deref(), Some("left"));
        let value = saka.stats.market_value.expect("extracted");
        assert!((value - 150_000_000.0).abs() < 1.0);

        let image = saka.image.as_ref().expect("portrait captured");
        assert_eq!(image.url, "https://img.example.com/433177.jpg");
    }

    #[test]
    fn rows_without_profile_links_are_skipped() {
        let doc = Html::parse_document(
            r#"<table><thead><tr>
                <th>#</th><th>Player</th><th>Date of birth/Age</th><th>Nat.</th><th>Market value</th>
            </tr></thead>
            <tbody><tr>
                <td>1</td><td>nobody</td><td>-</td><td>-</td><td>-</td>
            </tr></tbody></table>"#,
        );
        let table = engine::items_table(&doc).expect("table present");
        let mut summary = Summary::default();

        let players = extract_players(table, &team(), &mut summary);
        assert!(players.is_empty());
        assert_eq!(summary.rows_skipped, 1);
    }
}
