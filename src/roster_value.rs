use std::collections::HashMap;

use crate::store::{AppearanceIndex, StoredGame, game_key, player_value_or_zero};

/// Season-long "full-strength" value per team: total minutes per player over
/// the season's games, then the summed per-game value of the top `core_size`
/// players by minutes. This is the baseline each game-day lineup is compared
/// against, independent of who actually played on a given night.
pub fn full_strength_values(
    games: &[StoredGame],
    appearances: &AppearanceIndex,
    player_values: &HashMap<i64, f64>,
    core_size: usize,
) -> HashMap<String, f64> {
    let mut minutes_by_team: HashMap<String, HashMap<i64, f64>> = HashMap::new();
    for g in games {
        let key = game_key(g.game_id);
        for team_id in [&g.home_team_id, &g.away_team_id] {
            let Some(players) = appearances.get(&(key.clone(), team_id.clone())) else {
                continue;
            };
            let team_minutes = minutes_by_team.entry(team_id.clone()).or_default();
            for &(player_id, minutes) in players {
                *team_minutes.entry(player_id).or_insert(0.0) += minutes;
            }
        }
    }

    let mut full_values = HashMap::with_capacity(minutes_by_team.len());
    for (team_id, team_minutes) in minutes_by_team {
        let mut ranked: Vec<(i64, f64)> = team_minutes.into_iter().collect();
        // Minutes descending; player id breaks ties so the core set is stable.
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        let core_value: f64 = ranked
            .iter()
            .take(core_size)
            .map(|&(player_id, _)| player_value_or_zero(player_values, player_id))
            .sum();
        full_values.insert(team_id, core_value);
    }
    full_values
}
