use std::collections::HashMap;

use crate::params::RatingParams;
use crate::team_results::TeamResults;

/// Mix the solver's margin-based rating with plain win rate:
///
///   final = (1 - w) * srs + w * scale * (win_pct - 0.5)
///
/// This runs after the solver's zero-mean normalization and is not
/// re-centered afterward, matching the production ordering. Win rates
/// center near 0.5 league-wide, so the output stays close to mean zero
/// without being forced there.
pub fn blend_ratings(
    srs_ratings: &HashMap<String, f64>,
    results: &HashMap<String, TeamResults>,
    params: &RatingParams,
) -> HashMap<String, f64> {
    srs_ratings
        .iter()
        .map(|(team, &srs)| {
            let win_pct = results
                .get(team)
                .map(TeamResults::win_pct)
                .unwrap_or(0.0);
            let win_component = params.win_blend_scale * (win_pct - 0.5);
            let blended =
                (1.0 - params.win_blend_weight) * srs + params.win_blend_weight * win_component;
            (team.clone(), blended)
        })
        .collect()
}
