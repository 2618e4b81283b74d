pub mod scraper;

/// Message to print before any scraper logs
pub const SCRAPER_HEADING: &str = "[SCRAPER] ";

/// Prefix for seed overrides in the environment, e.g.
/// `SEED_EUR1=Europe|https://host/competitions?page={page}`
pub const SEED_ENV_PREFIX: &str = "SEED_";
