use std::collections::HashMap;

use anyhow::{Result, bail};
use rusqlite::Connection;

use crate::diagnostics::{self, AccuracySummary, TeamComponents};
use crate::params::RatingParams;
use crate::team_results::TeamResults;
use crate::{blend, game_records, roster_value, srs, store, team_results};

/// Everything one season's run produces: the blended ratings (the primary
/// artifact), the pre-blend SRS map, and the reporting breakdowns.
#[derive(Debug, Clone)]
pub struct SeasonRun {
    pub season: i32,
    pub ratings: HashMap<String, f64>,
    pub srs_ratings: HashMap<String, f64>,
    pub results: HashMap<String, TeamResults>,
    pub components: HashMap<String, TeamComponents>,
    pub accuracy: Option<AccuracySummary>,
}

impl SeasonRun {
    /// Teams best to worst; rating ties fall back to team id so the rank
    /// order is reproducible.
    pub fn ranked(&self) -> Vec<(String, f64)> {
        let mut items: Vec<(String, f64)> =
            self.ratings.iter().map(|(t, r)| (t.clone(), *r)).collect();
        items.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        items
    }
}

/// Rebuild a season's ratings from scratch. Pure given the store contents:
/// no incremental state survives between runs.
pub fn run_season(conn: &Connection, season: i32, params: &RatingParams) -> Result<SeasonRun> {
    if season <= 0 {
        bail!("invalid season {season}: seasons are labeled by their end year");
    }

    let player_values = store::load_player_values(conn, season)?;
    let games = store::load_finalized_games(conn, season)?;
    if games.is_empty() {
        bail!("no finalized games for season {season}; nothing to solve");
    }
    let appearance_rows = store::load_appearances(conn)?;
    let appearances = store::index_appearances(&appearance_rows);

    let full_values =
        roster_value::full_strength_values(&games, &appearances, &player_values, params.core_size);
    let records =
        game_records::build_game_records(&games, &appearances, &player_values, &full_values, params);
    let srs_ratings = srs::iterate_ratings(&records, params);
    let results = team_results::team_results(&games);
    let ratings = blend::blend_ratings(&srs_ratings, &results, params);
    let components = diagnostics::components(&records, &results, &ratings);
    let accuracy = diagnostics::accuracy(&games, &ratings, params.hca);

    Ok(SeasonRun {
        season,
        ratings,
        srs_ratings,
        results,
        components,
        accuracy,
    })
}
