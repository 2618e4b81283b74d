mod aggregate;
mod client;
mod engine;
mod fields;
mod leagues;
mod market_writer;
mod normalize;
mod players;
mod seeds;
mod teams;

pub use client::{FetchError, HttpClient, HttpOptions};
pub use seeds::{seeds_from_env, seeds_or_default, Seed};

use crate::SCRAPER_HEADING;
use chrono::Datelike;
use pitchmarket::entities::{League, Market, Region, Team};
use pitchmarket::stats::{IntegrityError, LeagueStats, PlayerStats, StatField};
use pitchmarket::OutputFile;
use thiserror::Error;

/// Errors that end a scrape run: writing the output, or an aggregation
/// wired to the wrong record type. Fetch failures never get here; they
/// are logged and absorbed at the page they happen on, so everything
/// extracted before them survives.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}

/// Counters reported at the end of a run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub regions: usize,
    pub regions_failed: usize,
    pub pages: usize,
    pub pages_failed: usize,
    pub leagues: usize,
    pub leagues_failed: usize,
    pub teams: usize,
    pub players: usize,
    pub rows_skipped: usize,
}

/// Crawl scope controls, all optional
#[derive(Debug, Clone, Default)]
pub struct ScrapeOptions {
    /// Cap on listing pages fetched per region
    pub page_limit: Option<usize>,
    /// Cap on leagues descended into per region
    pub league_limit: Option<usize>,
    /// Restrict team and player scraping to one season key
    pub season: Option<String>,
    /// Restrict the run to the seed with this id
    pub region: Option<String>,
}

/// Walks the site top-down, one request at a time: region listing pages,
/// then each league's seasons, then each team's squad. Every level is
/// extracted as it is fetched and aggregated bottom-up on the way out.
pub struct Scraper {
    client: HttpClient,
    options: ScrapeOptions,
}

impl Scraper {
    pub fn new(http: HttpOptions, options: ScrapeOptions) -> Self {
        Scraper {
            client: HttpClient::new(http),
            options,
        }
    }

    /// Scrape every seeded region and write the resulting graph. A region
    /// that fails outright is logged and dropped; its siblings still land
    /// in the output.
    pub fn scrape(&self, seeds: Vec<Seed>, outputs: &OutputFile) -> Result<Summary, ScrapeError> {
        let mut market = Market::new();
        let mut summary = Summary::default();

        for seed in seeds {
            if let Some(only) = &self.options.region {
                if &seed.id != only {
                    continue;
                }
            }

            log::info!("{}Scraping region {} ({})", SCRAPER_HEADING, seed.name, seed.id);
            match self.scrape_region(&seed, &mut summary) {
                Ok(region) => {
                    market.add_region(region);
                    summary.regions += 1;
                }
                Err(e) => {
                    log::error!("{}Region {} failed: {}", SCRAPER_HEADING, seed.id, e);
                    summary.regions_failed += 1;
                }
            }
        }

        market_writer::record_market(&market, outputs)?;

        log::info!(
            "{}Done: {} regions ({} failed), {} pages ({} failed), {} leagues ({} failed), {} teams, {} players, {} rows skipped",
            SCRAPER_HEADING,
            summary.regions,
            summary.regions_failed,
            summary.pages,
            summary.pages_failed,
            summary.leagues,
            summary.leagues_failed,
            summary.teams,
            summary.players,
            summary.rows_skipped,
        );
        Ok(summary)
    }

    /// Fetch one page, absorbing the failure modes a single page is
    /// allowed to have: an unusable url is skipped and a fetch that
    /// exhausted its retries is logged and counted. Either way the
    /// caller moves on with what it already has.
    fn fetch_page(&self, url: &str, summary: &mut Summary) -> Option<scraper::Html> {
        match self.client.fetch_as_document(url) {
            Ok(Some(doc)) => {
                summary.pages += 1;
                Some(doc)
            }
            Ok(None) => None,
            Err(e) => {
                log::error!("{}Giving up on {}: {}", SCRAPER_HEADING, url, e);
                summary.pages_failed += 1;
                None
            }
        }
    }

    fn scrape_region(&self, seed: &Seed, summary: &mut Summary) -> Result<Region, ScrapeError> {
        let mut region = Region::new(&seed.id, &seed.name, &seed.page_url(1));

        let Some(first_page) = self.fetch_page(&seed.page_url(1), summary) else {
            return Ok(region);
        };

        let mut total = engine::total_pages(&first_page);
        if let Some(limit) = self.options.page_limit {
            total = total.min(limit.max(1));
        }
        log::info!("{}Region {} spans {} pages", SCRAPER_HEADING, seed.id, total);

        if let Some(table) = engine::items_table(&first_page) {
            leagues::extract_leagues(table, leagues::MIN_COLUMNS, &mut region, summary);
        }

        for page in 2..=total {
            let Some(doc) = self.fetch_page(&seed.page_url(page), summary) else {
                continue;
            };
            if let Some(table) = engine::items_table(&doc) {
                leagues::extract_leagues(table, leagues::MIN_COLUMNS, &mut region, summary);
            }
        }

        self.descend_into_leagues(&mut region, summary);

        // region aggregates are recomputed from whatever made it in, even
        // when that is nothing
        let league_stats: Vec<LeagueStats> =
            region.league_stats().into_iter().cloned().collect();
        aggregate::average(&league_stats, &mut region.stats, StatField::AvgAge)?;
        aggregate::average(&league_stats, &mut region.stats, StatField::AverageMarketValue)?;
        aggregate::average(&league_stats, &mut region.stats, StatField::TotalValue)?;

        Ok(region)
    }

    /// Scrape teams and players for each league already in the region.
    /// Leagues are taken out, filled in and reinserted one at a time so a
    /// failing league never blocks its tier.
    fn descend_into_leagues(&self, region: &mut Region, summary: &mut Summary) {
        let targets: Vec<(String, String)> = region
            .tiers
            .iter()
            .flat_map(|(tier, leagues)| {
                leagues.keys().map(move |id| (tier.clone(), id.clone()))
            })
            .collect();

        let mut descended = 0usize;
        for (tier, id) in targets {
            if let Some(limit) = self.options.league_limit {
                if descended >= limit {
                    break;
                }
            }

            let Some(mut league) = region
                .tiers
                .get_mut(&tier)
                .and_then(|leagues| leagues.remove(&id))
            else {
                continue;
            };

            if let Err(e) = self.scrape_league(&mut league, summary) {
                log::error!("{}League {} failed: {}", SCRAPER_HEADING, id, e);
                summary.leagues_failed += 1;
            }
            region.add_league(&tier, league);
            descended += 1;
        }
    }

    fn scrape_league(&self, league: &mut League, summary: &mut Summary) -> Result<(), ScrapeError> {
        let Some(doc) = self.fetch_page(&league.url, summary) else {
            return Ok(());
        };

        let seasons = self.seasons_to_scrape(&doc);
        log::info!(
            "{}League {} has {} seasons to scrape",
            SCRAPER_HEADING,
            league.id,
            seasons.len()
        );

        for season in seasons {
            let url = season_url(&league.url, &season);
            let Some(doc) = self.fetch_page(&url, summary) else {
                continue;
            };

            let Some(table) = engine::items_table(&doc) else {
                log::warn!("{}No team table at {}", SCRAPER_HEADING, url);
                continue;
            };

            for mut team in teams::extract_teams(table, league, &season, summary) {
                if let Err(e) = self.scrape_team(&mut team, summary) {
                    log::error!("{}Team {} failed: {}", SCRAPER_HEADING, team.id, e);
                }
                league.add_team(&season, team);
            }
        }

        // recompute from team data when any came in; otherwise the values
        // extracted off the listing row stand
        let team_stats: Vec<_> = league.team_stats().into_iter().cloned().collect();
        if !team_stats.is_empty() {
            aggregate::average(&team_stats, &mut league.stats, StatField::AvgAge)?;
            aggregate::average(&team_stats, &mut league.stats, StatField::AverageMarketValue)?;
        }

        Ok(())
    }

    fn scrape_team(&self, team: &mut Team, summary: &mut Summary) -> Result<(), ScrapeError> {
        let Some(doc) = self.fetch_page(&team.url, summary) else {
            return Ok(());
        };

        let Some(table) = engine::items_table(&doc) else {
            log::warn!("{}No squad table at {}", SCRAPER_HEADING, team.url);
            return Ok(());
        };

        for player in players::extract_players(table, team, summary) {
            team.add_player(player);
        }

        let player_stats: Vec<PlayerStats> =
            team.player_stats().into_iter().cloned().collect();
        if !player_stats.is_empty() {
            aggregate::average(&player_stats, &mut team.stats, StatField::AvgAge)?;
            aggregate::average_as(
                &player_stats,
                StatField::MarketValue,
                &mut team.stats,
                StatField::AverageMarketValue,
            )?;
        }

        Ok(())
    }

    /// The season keys to descend into: the configured season when one is
    /// set, otherwise every season the league page offers, otherwise the
    /// current season.
    fn seasons_to_scrape(&self, doc: &scraper::Html) -> Vec<String> {
        if let Some(season) = &self.options.season {
            return vec![season.clone()];
        }
        let seasons = engine::seasons(doc);
        if seasons.is_empty() {
            vec![current_season()]
        } else {
            seasons
        }
    }
}

fn season_url(league_url: &str, season: &str) -> String {
    format!("{}?saison_id={}", league_url, season)
}

/// Season keys are the year the season starts in; a new season starts in
/// July
fn current_season() -> String {
    let today = chrono::Utc::now().date_naive();
    let year = if today.month() >= 7 {
        today.year()
    } else {
        today.year() - 1
    };
    year.to_string()
}
