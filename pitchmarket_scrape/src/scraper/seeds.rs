//! Crawl entry points.
//!
//! Each seed names one region and the url template of its paginated
//! competition listing. Seeds come from the environment (loaded through
//! dotenv by the binary) as `SEED_<ID>=<Name>|<url template>`, where the
//! template marks the page slot with `{page}`; when no seed variables
//! are set the built-in default region is crawled.

use const_format::formatcp;
use std::env;

use super::leagues::BASE_URL;
use crate::SEED_ENV_PREFIX;

const PAGE_SLOT: &str = "{page}";

const DEFAULT_ID: &str = "EUR1";
const DEFAULT_NAME: &str = "Europe";
const DEFAULT_TEMPLATE: &str =
    formatcp!("{}/wettbewerbe/europa/wettbewerbe?plus=1&page={{page}}", BASE_URL);

#[derive(Debug, Clone, PartialEq)]
pub struct Seed {
    pub id: String,
    pub name: String,
    pub url_template: String,
}

impl Seed {
    /// Listing url for one page. Templates without a page slot serve the
    /// same url for every page, which pairs with a page count of 1.
    pub fn page_url(&self, page: usize) -> String {
        self.url_template.replace(PAGE_SLOT, &page.to_string())
    }
}

/// All `SEED_`-prefixed variables in the environment, sorted by id.
/// Malformed values are logged and left out rather than aborting the run.
pub fn seeds_from_env() -> Vec<Seed> {
    seeds_from(env::vars())
}

/// Environment seeds, or the built-in default region when none are set
pub fn seeds_or_default() -> Vec<Seed> {
    seeds_or_default_from(env::vars())
}

fn seeds_from(vars: impl IntoIterator<Item = (String, String)>) -> Vec<Seed> {
    let mut seeds: Vec<Seed> = vars
        .into_iter()
        .filter_map(|(key, value)| {
            let id = key.strip_prefix(SEED_ENV_PREFIX)?;
            if id.is_empty() {
                return None;
            }
            match parse_seed(id, &value) {
                Some(seed) => Some(seed),
                None => {
                    log::warn!("ignoring malformed seed {}: {:?}", key, value);
                    None
                }
            }
        })
        .collect();

    seeds.sort_by(|a, b| a.id.cmp(&b.id));
    seeds
}

fn seeds_or_default_from(vars: impl IntoIterator<Item = (String, String)>) -> Vec<Seed> {
    let seeds = seeds_from(vars);
    if seeds.is_empty() {
        log::info!("no seeds configured, using the default region");
        vec![default_seed()]
    } else {
        seeds
    }
}

fn default_seed() -> Seed {
    Seed {
        id: String::from(DEFAULT_ID),
        name: String::from(DEFAULT_NAME),
        url_template: String::from(DEFAULT_TEMPLATE),
    }
}

fn parse_seed(id: &str, value: &str) -> Option<Seed> {
    let (name, template) = value.split_once('|')?;
    let name = name.trim();
    let template = template.trim();
    if name.is_empty() || template.is_empty() {
        return None;
    }

    Some(Seed {
        id: String::from(id),
        name: String::from(name),
        url_template: String::from(template),
    })
}
