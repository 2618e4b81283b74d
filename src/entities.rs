//! The in-memory entity graph: Market → Region → tiered Leagues →
//! seasoned Teams → Players.
//!
//! Every child is exclusively owned by its parent container and keyed by
//! the natural id pulled from the source markup. `add_*` insertion is
//! last-write-wins, so re-adding the same id never duplicates. All maps
//! are `BTreeMap` so the serialized form is stable.

use crate::stats::{LeagueStats, PlayerStats, RegionStats, TeamStats};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root of the graph; owns every scraped region
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Market {
    pub regions: BTreeMap<String, Region>,
}

impl Market {
    pub fn new() -> Self {
        Market {
            regions: BTreeMap::new(),
        }
    }

    pub fn add_region(&mut self, region: Region) {
        self.regions.insert(region.id.clone(), region);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub name: String,
    pub url: String,
    pub stats: RegionStats,
    pub countries: BTreeMap<String, Country>,
    /// tier name → league id → league; a league id lives under exactly
    /// one tier at a time
    pub tiers: BTreeMap<String, BTreeMap<String, League>>,
}

impl Region {
    pub fn new(id: &str, name: &str, url: &str) -> Self {
        Region {
            id: String::from(id),
            name: String::from(name),
            url: String::from(url),
            stats: RegionStats::new(id),
            countries: BTreeMap::new(),
            tiers: BTreeMap::new(),
        }
    }

    pub fn add_country(&mut self, country: Country) {
        self.countries.insert(country.id.clone(), country);
    }

    /// Insert a league under the given tier. If the same league id is
    /// already present under any tier it is removed first, keeping the
    /// one-tier-per-league invariant while staying last-write-wins.
    pub fn add_league(&mut self, tier: &str, league: League) {
        for leagues in self.tiers.values_mut() {
            leagues.remove(&league.id);
        }
        self.tiers
            .entry(String::from(tier))
            .or_default()
            .insert(league.id.clone(), league);
        self.tiers.retain(|_, leagues| !leagues.is_empty());
    }

    /// All league stats across tiers, for region-level aggregation
    pub fn league_stats(&self) -> Vec<&LeagueStats> {
        self.tiers
            .values()
            .flat_map(|leagues| leagues.values().map(|l| &l.stats))
            .collect()
    }
}

/// A country seen in a region's listing, deduplicated by id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Country {
    pub id: String,
    pub name: String,
    pub flag_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct League {
    pub id: String,
    pub competition: String,
    pub country: Option<String>,
    pub url: String,
    pub stats: LeagueStats,
    /// season key → team id → team
    pub seasons: BTreeMap<String, BTreeMap<String, Team>>,
}

impl League {
    pub fn new(id: &str, competition: &str, country: Option<String>, url: &str, fk_region: &str) -> Self {
        League {
            id: String::from(id),
            competition: String::from(competition),
            country,
            url: String::from(url),
            // the stats record always carries this league's own id
            stats: LeagueStats::new(id, fk_region),
            seasons: BTreeMap::new(),
        }
    }

    pub fn add_team(&mut self, season: &str, team: Team) {
        self.seasons
            .entry(String::from(season))
            .or_default()
            .insert(team.id.clone(), team);
    }

    /// Team stats across all seasons, for league-level aggregation
    pub fn team_stats(&self) -> Vec<&TeamStats> {
        self.seasons
            .values()
            .flat_map(|teams| teams.values().map(|t| &t.stats))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub fk_region: String,
    pub fk_league: String,
    pub season: String,
    pub name: String,
    pub url: String,
    pub stats: TeamStats,
    pub players: BTreeMap<String, Player>,
}

impl Team {
    pub fn add_player(&mut self, player: Player) {
        self.players.insert(player.id.clone(), player);
    }

    pub fn player_stats(&self) -> Vec<&PlayerStats> {
        self.players.values().map(|p| &p.stats).collect()
    }
}

/// Image metadata captured alongside a player row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerImage {
    pub url: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub fk_region: String,
    pub fk_league: String,
    pub fk_team: String,
    pub season: String,
    pub name: String,
    pub url: Option<String>,
    pub fk_country: Option<String>,
    pub joined: Option<String>,
    pub contract: Option<String>,
    pub fk_signed_from: Option<String>,
    pub image: Option<PlayerImage>,
    pub stats: PlayerStats,
}
