use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stats field that can be read from or written into a stats record by
/// the aggregation engine. Closed set; adding a field means deciding which
/// records carry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatField {
    AvgAge,
    AverageMarketValue,
    TotalMarketValue,
    TotalValue,
    MarketValue,
}

/// Raised when aggregation is pointed at a record that does not carry the
/// requested field. This flags a programming error upstream, not bad data.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{record} does not carry the stat field {field:?}")]
pub struct IntegrityError {
    pub record: &'static str,
    pub field: StatField,
}

/// Uniform access to the numeric fields aggregation works with.
///
/// `get` returns `Ok(None)` when the field is carried but absent in the
/// source data; it returns an error when the record type does not carry
/// the field at all.
pub trait StatsRecord {
    const RECORD: &'static str;

    fn get(&self, field: StatField) -> Result<Option<f64>, IntegrityError>;
    fn set(&mut self, field: StatField, value: f64) -> Result<(), IntegrityError>;

    fn unsupported(field: StatField) -> IntegrityError {
        IntegrityError {
            record: Self::RECORD,
            field,
        }
    }
}

/// Region-level aggregates, keyed back to the owning region
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionStats {
    pub fk_region: String,
    pub avg_age: Option<f64>,
    pub average_market_value: Option<f64>,
    pub total_value: Option<f64>,
}

impl RegionStats {
    pub fn new(fk_region: &str) -> Self {
        RegionStats {
            fk_region: String::from(fk_region),
            avg_age: None,
            average_market_value: None,
            total_value: None,
        }
    }
}

impl StatsRecord for RegionStats {
    const RECORD: &'static str = "RegionStats";

    fn get(&self, field: StatField) -> Result<Option<f64>, IntegrityError> {
        match field {
            StatField::AvgAge => Ok(self.avg_age),
            StatField::AverageMarketValue => Ok(self.average_market_value),
            StatField::TotalValue => Ok(self.total_value),
            _ => Err(Self::unsupported(field)),
        }
    }

    fn set(&mut self, field: StatField, value: f64) -> Result<(), IntegrityError> {
        match field {
            StatField::AvgAge => self.avg_age = Some(value),
            StatField::AverageMarketValue => self.average_market_value = Some(value),
            StatField::TotalValue => self.total_value = Some(value),
            _ => return Err(Self::unsupported(field)),
        }
        Ok(())
    }
}

/// League-level stats. Mostly extracted straight off the listing table;
/// the averages are recomputed from team data once teams are in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueStats {
    pub fk_league: String,
    pub fk_region: String,
    pub total_clubs: i64,
    pub total_players: i64,
    pub avg_age: Option<f64>,
    pub foreigners: Option<f64>,
    pub game_ratio_of_foreign_players: Option<f64>,
    pub goals_per_match: Option<f64>,
    pub average_market_value: Option<f64>,
    pub total_value: Option<f64>,
}

impl LeagueStats {
    pub fn new(fk_league: &str, fk_region: &str) -> Self {
        LeagueStats {
            fk_league: String::from(fk_league),
            fk_region: String::from(fk_region),
            total_clubs: 0,
            total_players: 0,
            avg_age: None,
            foreigners: None,
            game_ratio_of_foreign_players: None,
            goals_per_match: None,
            average_market_value: None,
            total_value: None,
        }
    }
}

impl StatsRecord for LeagueStats {
    const RECORD: &'static str = "LeagueStats";

    fn get(&self, field: StatField) -> Result<Option<f64>, IntegrityError> {
        match field {
            StatField::AvgAge => Ok(self.avg_age),
            StatField::AverageMarketValue => Ok(self.average_market_value),
            StatField::TotalValue => Ok(self.total_value),
            _ => Err(Self::unsupported(field)),
        }
    }

    fn set(&mut self, field: StatField, value: f64) -> Result<(), IntegrityError> {
        match field {
            StatField::AvgAge => self.avg_age = Some(value),
            StatField::AverageMarketValue => self.average_market_value = Some(value),
            StatField::TotalValue => self.total_value = Some(value),
            _ => return Err(Self::unsupported(field)),
        }
        Ok(())
    }
}

/// Team-level stats for one season
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamStats {
    pub fk_team: String,
    pub fk_region: String,
    pub fk_league: String,
    pub season: String,
    pub total_players: i64,
    pub avg_age: Option<f64>,
    pub foreigners: i64,
    pub average_market_value: Option<f64>,
    pub total_market_value: Option<f64>,
}

impl StatsRecord for TeamStats {
    const RECORD: &'static str = "TeamStats";

    fn get(&self, field: StatField) -> Result<Option<f64>, IntegrityError> {
        match field {
            StatField::AvgAge => Ok(self.avg_age),
            StatField::AverageMarketValue => Ok(self.average_market_value),
            StatField::TotalMarketValue => Ok(self.total_market_value),
            _ => Err(Self::unsupported(field)),
        }
    }

    fn set(&mut self, field: StatField, value: f64) -> Result<(), IntegrityError> {
        match field {
            StatField::AvgAge => self.avg_age = Some(value),
            StatField::AverageMarketValue => self.average_market_value = Some(value),
            StatField::TotalMarketValue => self.total_market_value = Some(value),
            _ => return Err(Self::unsupported(field)),
        }
        Ok(())
    }
}

/// Leaf stats carried by each player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerStats {
    pub position: Option<String>,
    pub general_position: Option<String>,
    pub foot: Option<String>,
    pub height: Option<f64>,
    pub age: Option<i64>,
    pub birth_date: Option<String>,
    pub market_value: Option<f64>,
}

impl StatsRecord for PlayerStats {
    const RECORD: &'static str = "PlayerStats";

    fn get(&self, field: StatField) -> Result<Option<f64>, IntegrityError> {
        match field {
            StatField::MarketValue => Ok(self.market_value),
            StatField::AvgAge => Ok(self.age.map(|a| a as f64)),
            _ => Err(Self::unsupported(field)),
        }
    }

    fn set(&mut self, field: StatField, value: f64) -> Result<(), IntegrityError> {
        match field {
            StatField::MarketValue => self.market_value = Some(value),
            _ => return Err(Self::unsupported(field)),
        }
        Ok(())
    }
}
