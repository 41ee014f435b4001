use std::collections::HashMap;

use crate::params::RatingParams;
use crate::store::{AppearanceIndex, StoredGame, game_key, player_value_or_zero};

/// One team-perspective view of a finalized game. Every game yields a
/// mirrored pair whose adjusted margins are exact negations of each other.
#[derive(Debug, Clone)]
pub struct GameRecord {
    pub opp: String,
    pub m_adj: f64,
    pub home_flag: i8,
    pub date: String,
}

/// Build lineup-adjusted records per team, each list oldest game first.
///
/// The adjustment subtracts a shrunk estimate of the margin explained by
/// lineup strength: a side missing core players carries a negative lineup
/// deviation, which raises its adjusted margin relative to the raw score.
pub fn build_game_records(
    games: &[StoredGame],
    appearances: &AppearanceIndex,
    player_values: &HashMap<i64, f64>,
    full_values: &HashMap<String, f64>,
    params: &RatingParams,
) -> HashMap<String, Vec<GameRecord>> {
    let mut ordered: Vec<&StoredGame> = games.iter().collect();
    // ISO dates compare correctly as strings; the id tiebreak keeps
    // same-day games in a reproducible order.
    ordered.sort_by(|a, b| a.date.cmp(&b.date).then(a.game_id.cmp(&b.game_id)));

    let mut records: HashMap<String, Vec<GameRecord>> = HashMap::new();
    for g in ordered {
        let key = game_key(g.game_id);
        let v_game_home = side_value(appearances, &key, &g.home_team_id, player_values);
        let v_game_away = side_value(appearances, &key, &g.away_team_id, player_values);

        let l_home = v_game_home - full_values.get(&g.home_team_id).copied().unwrap_or(0.0);
        let l_away = v_game_away - full_values.get(&g.away_team_id).copied().unwrap_or(0.0);
        let e_home = l_home - l_away;

        let margin_home = g
            .margin_home()
            .clamp(-params.blowout_cap, params.blowout_cap);
        let m_adj_home = margin_home - params.lineup_shrink * e_home;

        records
            .entry(g.home_team_id.clone())
            .or_default()
            .push(GameRecord {
                opp: g.away_team_id.clone(),
                m_adj: m_adj_home,
                home_flag: 1,
                date: g.date.clone(),
            });

        // Mirror from the away perspective. Negating the clamped margin and
        // the shift term keeps the pair exactly antisymmetric.
        let e_away = -e_home;
        let margin_away = -margin_home;
        let m_adj_away = margin_away - params.lineup_shrink * e_away;

        records
            .entry(g.away_team_id.clone())
            .or_default()
            .push(GameRecord {
                opp: g.home_team_id.clone(),
                m_adj: m_adj_away,
                home_flag: -1,
                date: g.date.clone(),
            });
    }
    records
}

/// Value of the players who actually appeared for one side of one game.
/// A side with no appearance rows is worth 0.0, not an error.
fn side_value(
    appearances: &AppearanceIndex,
    key: &str,
    team_id: &str,
    player_values: &HashMap<i64, f64>,
) -> f64 {
    let Some(players) = appearances.get(&(key.to_string(), team_id.to_string())) else {
        return 0.0;
    };
    players
        .iter()
        .map(|&(player_id, _)| player_value_or_zero(player_values, player_id))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{AppearanceRow, index_appearances};

    fn game(game_id: i64, date: &str, home_pts: i64, away_pts: i64) -> StoredGame {
        StoredGame {
            game_id,
            season: 2026,
            date: date.to_string(),
            home_team_id: "BOS".to_string(),
            away_team_id: "NYK".to_string(),
            home_pts,
            away_pts,
        }
    }

    fn build(
        games: &[StoredGame],
        rows: &[AppearanceRow],
        player_values: HashMap<i64, f64>,
        full_values: HashMap<String, f64>,
    ) -> HashMap<String, Vec<GameRecord>> {
        let index = index_appearances(rows);
        build_game_records(
            games,
            &index,
            &player_values,
            &full_values,
            &RatingParams::default(),
        )
    }

    #[test]
    fn mirrored_records_are_antisymmetric() {
        let games = vec![game(1, "2026-01-01", 117, 106)];
        let rows = vec![
            AppearanceRow {
                game_id: 1,
                team_id: "BOS".to_string(),
                player_id: 1,
                minutes: 34.0,
            },
            AppearanceRow {
                game_id: 1,
                team_id: "NYK".to_string(),
                player_id: 2,
                minutes: 36.0,
            },
        ];
        let values = HashMap::from([(1, 3.7), (2, 5.2)]);
        let full = HashMap::from([("BOS".to_string(), 9.1), ("NYK".to_string(), 6.4)]);

        let records = build(&games, &rows, values, full);
        let home = &records["BOS"][0];
        let away = &records["NYK"][0];
        assert_eq!(home.home_flag, 1);
        assert_eq!(away.home_flag, -1);
        assert_eq!(away.m_adj, -home.m_adj);
        assert_eq!(away.opp, "BOS");
    }

    #[test]
    fn blowouts_are_capped_before_adjustment() {
        // A 40-point home win clamps to +20 with no lineup deviation.
        let games = vec![game(1, "2026-01-01", 140, 100)];
        let records = build(&games, &[], HashMap::new(), HashMap::new());
        assert_eq!(records["BOS"][0].m_adj, 20.0);
        assert_eq!(records["NYK"][0].m_adj, -20.0);
    }

    #[test]
    fn missing_core_players_raise_the_adjusted_margin() {
        // BOS full strength is 10.0 but only 4.0 suited up; NYK at full
        // strength. L_home = -6, E_home = -6, and the adjustment adds
        // shrink * 6 = +3 to the raw margin.
        let games = vec![game(1, "2026-01-01", 104, 100)];
        let rows = vec![
            AppearanceRow {
                game_id: 1,
                team_id: "BOS".to_string(),
                player_id: 1,
                minutes: 30.0,
            },
            AppearanceRow {
                game_id: 1,
                team_id: "NYK".to_string(),
                player_id: 2,
                minutes: 30.0,
            },
        ];
        let values = HashMap::from([(1, 4.0), (2, 8.0)]);
        let full = HashMap::from([("BOS".to_string(), 10.0), ("NYK".to_string(), 8.0)]);

        let records = build(&games, &rows, values, full);
        assert_eq!(records["BOS"][0].m_adj, 7.0);
        assert_eq!(records["NYK"][0].m_adj, -7.0);
    }

    #[test]
    fn sides_without_appearances_default_to_zero_value() {
        // No appearance rows at all: both lineup values are 0.0 and the
        // deviation cancels against itself only if full values match.
        let games = vec![game(1, "2026-01-01", 110, 100)];
        let full = HashMap::from([("BOS".to_string(), 6.0), ("NYK".to_string(), 2.0)]);
        let records = build(&games, &[], HashMap::new(), full);
        // E_home = (0-6) - (0-2) = -4, so m_adj = 10 - 0.5*(-4) = 12.
        assert_eq!(records["BOS"][0].m_adj, 12.0);
    }

    #[test]
    fn records_are_ordered_by_date_then_id() {
        let games = vec![
            game(7, "2026-01-05", 100, 90),
            game(2, "2026-01-01", 90, 100),
            game(5, "2026-01-05", 101, 99),
        ];
        let records = build(&games, &[], HashMap::new(), HashMap::new());
        let dates: Vec<(&str, i8)> = records["BOS"]
            .iter()
            .map(|r| (r.date.as_str(), r.home_flag))
            .collect();
        assert_eq!(
            dates,
            vec![("2026-01-01", 1), ("2026-01-05", 1), ("2026-01-05", 1)]
        );
        // Same-day games keep ascending id order.
        assert_eq!(records["BOS"][1].m_adj, 2.0);
        assert_eq!(records["BOS"][2].m_adj, 10.0);
    }
}
