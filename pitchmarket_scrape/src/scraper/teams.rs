//! Team extraction from a league's season squad-overview table.

use lazy_static::lazy_static;
use pitchmarket::entities::{League, Team};
use pitchmarket::stats::TeamStats;
use regex::Regex;
use scraper::ElementRef;
use std::collections::BTreeMap;

use super::engine;
use super::fields::{
    anchor_href, anchor_text, currency_cell, extract_row, float_cell, int_cell, CellValue,
    FieldSpec,
};
use super::leagues::absolute_url;
use super::Summary;

pub const MIN_COLUMNS: usize = 5;

lazy_static! {
    static ref TEAM_ID: Regex =
        Regex::new(r"verein/(\d+)").expect("hardcoded regex, shouldn't fail");
}

static TEAM_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        field: "name",
        key: "name",
        offset: 0,
        default: CellValue::Null,
        transform: anchor_text,
    },
    // the squad-size cell links to the detailed squad page
    FieldSpec {
        field: "url",
        key: "squad",
        offset: 0,
        default: CellValue::Null,
        transform: anchor_href,
    },
    FieldSpec {
        field: "squad",
        key: "squad",
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
        default: CellValue::Int(0),
        transform: int_cell,
    },
    FieldSpec {
        field: "average_market_value",
        key: "avg_market_value",
        offset: 0,
        default: CellValue::Null,
        transform: currency_cell,
    },
    FieldSpec {
        field: "total_market_value",
        key: "total_market_value",
        offset: 0,
        default: CellValue::Null,
        transform: currency_cell,
    },
];

/// Pull every team row out of a league page's table for one season.
/// Rows whose squad link carries no team id are skipped with a warning;
/// siblings are unaffected.
pub fn extract_teams(
    table: ElementRef,
    league: &League,
    season: &str,
    summary: &mut Summary,
) -> Vec<Team> {
    let headers = engine::resolve_headers(table, None);
    if headers.is_empty() {
        log::warn!("team table has no header row, nothing to extract");
        return Vec::new();
    }

    let mut teams = Vec::new();

    for row in table.select(&engine::selectors::BODY_ROW) {
        let cells = engine::expand_cells(row);
        if cells.len() < MIN_COLUMNS {
            continue;
        }

        let bag = extract_row(TEAM_FIELDS, &headers, &cells);
        match build_team(&bag, league, season) {
            Some(team) => {
                log::debug!("team extracted: {} ({})", team.name, team.id);
                teams.push(team);
                summary.teams += 1;
            }
            None => {
                log::warn!("skipping team row without squad link");
                summary.rows_skipped += 1;
            }
        }
    }

    teams
}

fn build_team(
    bag: &BTreeMap<&'static str, CellValue>,
    league: &League,
    season: &str,
) -> Option<Team> {
    let name = bag["name"].as_str()?;
    let href = bag["url"].as_str()?;
    let id = TEAM_ID.captures(href).map(|c| String::from(&c[1]))?;
    let url = absolute_url(href);

    let stats = TeamStats {
        fk_team: id.clone(),
        fk_region: league.stats.fk_region.clone(),
        fk_league: league.id.clone(),
        season: String::from(season),
        total_players: bag["squad"].as_int().unwrap_or(0),
        avg_age: bag["avg_age"].as_float(),
        foreigners: bag["foreigners"].as_int().unwrap_or(0),
        average_market_value: bag["average_market_value"].as_float(),
        total_market_value: bag["total_market_value"].as_float(),
    };

    Some(Team {
        id: id.clone(),
        fk_region: league.stats.fk_region.clone(),
        fk_league: league.id.clone(),
        season: String::from(season),
        name: String::from(name),
        url,
        stats,
        players: BTreeMap::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::Summary;
    use scraper::Html;

    fn league() -> League {
        League::new(
            "GB1",
            "Premier League",
            Some(String::from("England")),
            "https://www.transfermarkt.com/premier-league/startseite/wettbewerb/GB1",
            "EUR1",
        )
    }

    fn squad_overview() -> Html {
        Html::parse_document(
            r#"<table class="items">
            <thead><tr>
                <th>Name</th><th>Squad</th><th>Avg. age</th><th>Foreigners</th>
                <th>ø Market value</th><th>Total market value</th>
            </tr></thead>
            <tbody>
                <tr>
                    <td><a href="/fc-arsenal/startseite/verein/11/saison_id/2024" title="Arsenal FC">Arsenal</a></td>
                    <td><a href="/fc-arsenal/kader/verein/11/saison_id/2024">26</a></td>
                    <td>25,3</td><td>17</td><td>€44,92m</td><td>€1,17bn</td>
                </tr>
                <tr>
                    <td>row without any link</td>
                    <td>25</td><td>26,1</td><td>15</td><td>€30,00m</td><td>€750,00m</td>
                </tr>
            </tbody></table>"#,
        )
    }

    #[test]
    fn team_rows_become_teams_with_natural_ids() {
        let doc = squad_overview();
        let table = engine::items_table(&doc).expect("table present");
        let mut summary = Summary::default();

        let teams = extract_teams(table, &league(), "2024", &mut summary);

        assert_eq!(teams.len(), 1);
        assert_eq!(summary.rows_skipped, 1);

        let arsenal = &teams[0];
        assert_eq!(arsenal.id, "11");
        assert_eq!(arsenal.name, "Arsenal FC");
        assert_eq!(arsenal.season, "2024");
        assert_eq!(arsenal.stats.fk_league, "GB1");
        assert_eq!(arsenal.stats.fk_region, "EUR1");
        assert_eq!(arsenal.stats.total_players, 26);
        assert_eq!(arsenal.stats.avg_age, Some(25.3));
        assert_eq!(arsenal.stats.foreigners, 17);
        let total = arsenal.stats.total_market_value.expect("extracted");
        assert!((total - 1_170_000_000.0).abs() < 1.0);
    }

    #[test]
    fn short_rows_are_filtered_before_extraction() {
        let doc = Html::parse_document(
            r#"<table><thead><tr><th>Name</th><th>Squad</th></tr></thead>
            <tbody><tr><td>decorative</td><td>-</td></tr></tbody></table>"#,
        );
        let table = engine::items_table(&doc).expect("table present");
        let mut summary = Summary::default();

        let teams = extract_teams(table, &league(), "2024", &mut summary);
        assert!(teams.is_empty());
        assert_eq!(summary.rows_skipped, 0);
    }
}
