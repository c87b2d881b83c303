use crate::Location;

/// Distances at or below this are treated as the query sitting on the point.
pub const COINCIDENT_DISTANCE: f64 = 1e-9;

/// Inverse-distance-weighted interpolation of `values` at `query`.
///
/// Each point is weighted by `nearest / distance`, so the nearest point has
/// weight 1 and the rest fall off with distance. When the query coincides
/// with one or more points their values are averaged and the others are
/// ignored. Returns `None` for an empty input.
pub fn inverse_distance_weighted<I>(query: Location, values: I) -> Option<f64>
where
    I: IntoIterator<Item = (Location, f64)>,
{
    let points: Vec<(f64, f64)> = values
        .into_iter()
        .map(|(location, value)| (query.distance_to(&location), value))
        .collect();

    let nearest = points
        .iter()
        .map(|&(distance, _)| distance)
        .min_by(f64::total_cmp)?;

    if nearest <= COINCIDENT_DISTANCE {
        let (sum, count) = points
            .iter()
            .filter(|&&(distance, _)| distance <= COINCIDENT_DISTANCE)
            .fold((0.0, 0u32), |(sum, count), &(_, value)| (sum + value, count + 1));
        return Some(sum / f64::from(count));
    }

    let (weighted, total) = points
        .iter()
        .fold((0.0, 0.0), |(weighted, total), &(distance, value)| {
            let weight = nearest / distance;
            (weighted + weight * value, total + weight)
        });
    Some(weighted / total)
}
