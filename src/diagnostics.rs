use std::collections::HashMap;

use crate::game_records::GameRecord;
use crate::srs::rating_or_zero;
use crate::store::StoredGame;
use crate::team_results::TeamResults;

/// Per-team reporting breakdown. All averages here are plain unweighted
/// means over the team's records (unlike the solver, which weights by
/// recency), and `sos_avg_opp_rating` reads opponents' final post-blend
/// ratings. Reporting only; never fed back into a solve.
#[derive(Debug, Clone, Copy)]
pub struct TeamComponents {
    pub games_played: u32,
    pub win_pct: f64,
    pub avg_margin: f64,
    pub avg_adj_margin: f64,
    pub sos_avg_opp_rating: f64,
    pub avg_home_flag: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct AccuracySummary {
    pub games_count: usize,
    pub mae: f64,
    pub rmse: f64,
}

pub fn components(
    records_by_team: &HashMap<String, Vec<GameRecord>>,
    results: &HashMap<String, TeamResults>,
    final_ratings: &HashMap<String, f64>,
) -> HashMap<String, TeamComponents> {
    records_by_team
        .iter()
        .map(|(team, recs)| {
            let res = results.get(team).copied().unwrap_or_default();
            let n = recs.len();
            let (avg_adj_margin, sos_avg_opp_rating, avg_home_flag) = if n == 0 {
                (0.0, 0.0, 0.0)
            } else {
                let inv = 1.0 / n as f64;
                let adj: f64 = recs.iter().map(|r| r.m_adj).sum::<f64>() * inv;
                let sos: f64 = recs
                    .iter()
                    .map(|r| rating_or_zero(final_ratings, &r.opp))
                    .sum::<f64>()
                    * inv;
                let home: f64 = recs.iter().map(|r| f64::from(r.home_flag)).sum::<f64>() * inv;
                (adj, sos, home)
            };
            (
                team.clone(),
                TeamComponents {
                    games_played: n as u32,
                    win_pct: res.win_pct(),
                    avg_margin: res.avg_margin(),
                    avg_adj_margin,
                    sos_avg_opp_rating,
                    avg_home_flag,
                },
            )
        })
        .collect()
}

/// Season-level spread accuracy: predicted margin is
/// `rating[home] - rating[away] + hca` for every scored game where both
/// teams carry a rating. `None` when no game qualifies.
pub fn accuracy(
    games: &[StoredGame],
    ratings: &HashMap<String, f64>,
    hca: f64,
) -> Option<AccuracySummary> {
    let mut abs_sum = 0.0;
    let mut sq_sum = 0.0;
    let mut n = 0usize;

    for g in games {
        let (Some(&home), Some(&away)) = (
            ratings.get(&g.home_team_id),
            ratings.get(&g.away_team_id),
        ) else {
            continue;
        };
        let predicted = home - away + hca;
        let err = g.margin_home() - predicted;
        abs_sum += err.abs();
        sq_sum += err * err;
        n += 1;
    }

    if n == 0 {
        return None;
    }
    Some(AccuracySummary {
        games_count: n,
        mae: abs_sum / n as f64,
        rmse: (sq_sum / n as f64).sqrt(),
    })
}
