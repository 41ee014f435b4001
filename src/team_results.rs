use std::collections::HashMap;

use crate::store::StoredGame;

/// Plain win/loss/point-differential tallies, independent of any rating.
#[derive(Debug, Clone, Copy, Default)]
pub struct TeamResults {
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
    pub point_diff_sum: f64,
}

impl TeamResults {
    pub fn win_pct(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            f64::from(self.wins) / f64::from(self.games)
        }
    }

    pub fn avg_margin(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.point_diff_sum / f64::from(self.games)
        }
    }
}

/// One walk over the season's scored games. A tie counts as a game for both
/// sides but as neither a win nor a loss.
pub fn team_results(games: &[StoredGame]) -> HashMap<String, TeamResults> {
    let mut out: HashMap<String, TeamResults> = HashMap::new();
    for g in games {
        let margin = g.margin_home();

        let home = out.entry(g.home_team_id.clone()).or_default();
        home.games += 1;
        home.point_diff_sum += margin;
        if margin > 0.0 {
            home.wins += 1;
        } else if margin < 0.0 {
            home.losses += 1;
        }

        let away = out.entry(g.away_team_id.clone()).or_default();
        away.games += 1;
        away.point_diff_sum -= margin;
        if margin < 0.0 {
            away.wins += 1;
        } else if margin > 0.0 {
            away.losses += 1;
        }
    }
    out
}
