//! Bottom-up statistical aggregation over the entity graph.

use pitchmarket::stats::{IntegrityError, StatField, StatsRecord};

/// Arithmetic mean of `field` across `items`, rounded to two decimals
/// and written into `target`. Items where the field is absent are
/// ignored; with no eligible values at all the result is `0.0`. Reading
/// or writing a field a record type does not carry is an integrity
/// error, since that means the caller wired the wrong collection in.
pub fn average<'a, S, T, I>(
    items: I,
    target: &mut T,
    field: StatField,
) -> Result<f64, IntegrityError>
where
    S: StatsRecord + 'a,
    T: StatsRecord,
    I: IntoIterator<Item = &'a S>,
{
    average_as(items, field, target, field)
}

/// Like [`average`], but reading one field and writing another. Levels
/// of the graph name the same quantity differently: a player's market
/// value averages into a team's average market value.
pub fn average_as<'a, S, T, I>(
    items: I,
    source: StatField,
    target: &mut T,
    dest: StatField,
) -> Result<f64, IntegrityError>
where
    S: StatsRecord + 'a,
    T: StatsRecord,
    I: IntoIterator<Item = &'a S>,
{
    let mut sum = 0.0;
    let mut count = 0usize;

    for item in items {
        if let Some(value) = item.get(source)? {
            sum += value;
            count += 1;
        }
    }

    let mean = if count == 0 {
        0.0
    } else {
        round2(sum / count as f64)
    };

    target.set(dest, mean)?;
    Ok(mean)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
