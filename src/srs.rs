use std::collections::HashMap;

use crate::game_records::GameRecord;
use crate::params::RatingParams;

/// Opponents missing from a rating map read as league average (0.0).
pub fn rating_or_zero(ratings: &HashMap<String, f64>, team_id: &str) -> f64 {
    ratings.get(team_id).copied().unwrap_or(0.0)
}

/// Solve SRS-style ratings by fixed-point iteration:
///
///   rating[t] ≈ weighted_avg(m_adj - hca * home_flag + opp_rating)
///
/// Runs exactly `max_iters` Jacobi passes; every pass reads only the
/// previous pass's complete map, so update order within a pass cannot
/// matter. There is deliberately no epsilon early-exit: some schedules
/// oscillate instead of converging, and an early exit would silently
/// change which state a run lands on.
pub fn iterate_ratings(
    records_by_team: &HashMap<String, Vec<GameRecord>>,
    params: &RatingParams,
) -> HashMap<String, f64> {
    let mut teams: Vec<&String> = records_by_team.keys().collect();
    teams.sort();

    let mut ratings: HashMap<String, f64> =
        teams.iter().map(|t| ((*t).clone(), 0.0)).collect();

    for _ in 0..params.max_iters {
        let mut next = HashMap::with_capacity(ratings.len());
        for t in &teams {
            let recs = &records_by_team[*t];
            if recs.is_empty() {
                // No games: the rating carries over and never leaves 0.0.
                next.insert((*t).clone(), rating_or_zero(&ratings, t.as_str()));
                continue;
            }

            let n = recs.len();
            let mut w_sum = 0.0;
            let mut m_adj_sum = 0.0;
            let mut home_flag_sum = 0.0;
            let mut opp_rating_sum = 0.0;
            for (idx, rec) in recs.iter().enumerate() {
                let age = (n - 1 - idx) as f64;
                let w = recency_weight(age, params.recency_half_life_games);
                w_sum += w;
                m_adj_sum += w * rec.m_adj;
                home_flag_sum += w * f64::from(rec.home_flag);
                opp_rating_sum += w * rating_or_zero(&ratings, &rec.opp);
            }

            let avg_m_adj = m_adj_sum / w_sum;
            let avg_home_flag = home_flag_sum / w_sum;
            let avg_opp_rating = opp_rating_sum / w_sum;
            next.insert(
                (*t).clone(),
                avg_m_adj - params.hca * avg_home_flag + avg_opp_rating,
            );
        }
        ratings = next;
    }

    // Re-center so the league mean is exactly zero. Summing in sorted team
    // order keeps repeated runs bit-identical.
    if !ratings.is_empty() {
        let mean = teams.iter().map(|t| ratings[*t]).sum::<f64>() / ratings.len() as f64;
        for rating in ratings.values_mut() {
            *rating -= mean;
        }
    }
    ratings
}

/// The newest record (age 0) always weighs 1.0; weight halves every
/// `half_life` games of age.
fn recency_weight(age: f64, half_life: f64) -> f64 {
    0.5_f64.powf(age / half_life)
}
