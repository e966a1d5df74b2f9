use serde::{Deserialize, Serialize};

use crate::engine::DistanceResult;
use crate::observation::ObjectId;

/// The provisional score of an end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProximityScore<T> {
    /// The team owning the closest ball.
    pub winning_team: T,
    /// Number of balls of the winning team closer than the closest opposing ball.
    pub points: usize,
}

/// Score an end from a ranking.
///
/// Walks the ranking from the closest ball and counts the consecutive balls that
/// belong to the team of the closest one, stopping at the first ball of another
/// team. Ties are resolved by the order of `results`, which is the stable ranking
/// order produced by [`crate::compute_distances`].
///
/// # Arguments
///
/// * `results` - Balls in ascending distance order.
/// * `team_of` - Maps a ball to its team.
///
/// # Returns
///
/// `None` if the ranking is empty.
pub fn score_by_proximity<T, F>(
    results: &[DistanceResult],
    mut team_of: F,
) -> Option<ProximityScore<T>>
where
    T: PartialEq,
    F: FnMut(ObjectId) -> T,
{
    let (first, rest) = results.split_first()?;
    let winning_team = team_of(first.object_id);

    let points = 1 + rest
        .iter()
        .take_while(|result| team_of(result.object_id) == winning_team)
        .count();

    Some(ProximityScore {
        winning_team,
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn ranking(ids: &[u32]) -> Vec<DistanceResult> {
        ids.iter()
            .enumerate()
            .map(|(rank, &id)| DistanceResult {
                object_id: ObjectId(id),
                distance_meters: 0.01 * (rank + 1) as f64,
                rank,
                confidence: 1.0,
            })
            .collect()
    }

    #[test]
    fn test_score_by_proximity() {
        let teams = HashMap::from([(1, "A"), (0, "A"), (2, "B")]);
        let score = score_by_proximity(&ranking(&[1, 0, 2]), |id| teams[&id.0]);
        assert_eq!(
            score,
            Some(ProximityScore {
                winning_team: "A",
                points: 2
            })
        );
    }

    #[test]
    fn test_score_stops_at_first_opponent() {
        let teams = HashMap::from([(1, 'A'), (2, 'B'), (3, 'A'), (4, 'A')]);
        let score = score_by_proximity(&ranking(&[1, 2, 3, 4]), |id| teams[&id.0]);
        assert_eq!(score.map(|s| (s.winning_team, s.points)), Some(('A', 1)));
    }

    #[test]
    fn test_score_single_team() {
        let score = score_by_proximity(&ranking(&[3, 1, 2]), |_| 7u8);
        assert_eq!(score.map(|s| s.points), Some(3));
    }

    #[test]
    fn test_score_empty() {
        assert_eq!(score_by_proximity(&[], |id: ObjectId| id.0), None);
    }
}
