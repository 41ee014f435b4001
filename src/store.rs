use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, params};

/// One finalized game as the engine consumes it: the season query only
/// returns rows with both scores present, so the points are not optional.
#[derive(Debug, Clone)]
pub struct StoredGame {
    pub game_id: i64,
    pub season: i32,
    pub date: String,
    pub home_team_id: String,
    pub away_team_id: String,
    pub home_pts: i64,
    pub away_pts: i64,
}

impl StoredGame {
    pub fn margin_home(&self) -> f64 {
        (self.home_pts - self.away_pts) as f64
    }
}

#[derive(Debug, Clone)]
pub struct AppearanceRow {
    pub game_id: i64,
    pub team_id: String,
    pub player_id: i64,
    pub minutes: f64,
}

/// Appearances grouped by (game key, team id): player id and minutes for
/// every player who suited up on that side of that game.
pub type AppearanceIndex = HashMap<(String, String), Vec<(i64, f64)>>;

/// Fixed-width game key. Upstream feeds disagree on whether game ids are
/// ints or zero-padded strings, so every join goes through this form.
pub fn game_key(game_id: i64) -> String {
    format!("{game_id:010}")
}

/// Missing player values are a defined default, not an error.
pub fn player_value_or_zero(values: &HashMap<i64, f64>, player_id: i64) -> f64 {
    values.get(&player_id).copied().unwrap_or(0.0)
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS games (
            game_id INTEGER PRIMARY KEY,
            season INTEGER NOT NULL,
            date TEXT NOT NULL,
            home_team_id TEXT NOT NULL,
            away_team_id TEXT NOT NULL,
            home_pts INTEGER NULL,
            away_pts INTEGER NULL
        );
        CREATE INDEX IF NOT EXISTS idx_games_season ON games(season);
        CREATE INDEX IF NOT EXISTS idx_games_date ON games(date);

        CREATE TABLE IF NOT EXISTS appearances (
            game_id INTEGER NOT NULL,
            team_id TEXT NOT NULL,
            player_id INTEGER NOT NULL,
            minutes REAL NOT NULL,
            PRIMARY KEY (game_id, team_id, player_id)
        );

        CREATE TABLE IF NOT EXISTS player_values (
            player_id INTEGER NOT NULL,
            season INTEGER NOT NULL,
            v_p REAL NOT NULL,
            PRIMARY KEY (player_id, season)
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

pub fn upsert_game(conn: &Connection, g: &StoredGame) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO games (game_id, season, date, home_team_id, away_team_id, home_pts, away_pts)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(game_id) DO UPDATE SET
            season = excluded.season,
            date = excluded.date,
            home_team_id = excluded.home_team_id,
            away_team_id = excluded.away_team_id,
            home_pts = excluded.home_pts,
            away_pts = excluded.away_pts
        "#,
        params![
            g.game_id,
            g.season,
            g.date,
            g.home_team_id,
            g.away_team_id,
            g.home_pts,
            g.away_pts
        ],
    )
    .context("upsert game")?;
    Ok(())
}

pub fn upsert_appearance(conn: &Connection, a: &AppearanceRow) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO appearances (game_id, team_id, player_id, minutes)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(game_id, team_id, player_id) DO UPDATE SET
            minutes = excluded.minutes
        "#,
        params![a.game_id, a.team_id, a.player_id, a.minutes],
    )
    .context("upsert appearance")?;
    Ok(())
}

pub fn upsert_player_value(conn: &Connection, player_id: i64, season: i32, v_p: f64) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO player_values (player_id, season, v_p)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(player_id, season) DO UPDATE SET
            v_p = excluded.v_p
        "#,
        params![player_id, season, v_p],
    )
    .context("upsert player value")?;
    Ok(())
}

pub fn load_player_values(conn: &Connection, season: i32) -> Result<HashMap<i64, f64>> {
    let mut stmt = conn
        .prepare("SELECT player_id, v_p FROM player_values WHERE season = ?1")
        .context("prepare player values query")?;
    let rows = stmt
        .query_map(params![season], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, f64>(1)?))
        })
        .context("query player values")?;

    let mut out = HashMap::new();
    for row in rows {
        let (player_id, v_p) = row.context("decode player value row")?;
        out.insert(player_id, v_p);
    }
    Ok(out)
}

/// A season's games with both scores present, oldest first. Scheduled or
/// in-progress rows never reach the engine.
pub fn load_finalized_games(conn: &Connection, season: i32) -> Result<Vec<StoredGame>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT game_id, season, date, home_team_id, away_team_id, home_pts, away_pts
            FROM games
            WHERE season = ?1
              AND home_pts IS NOT NULL
              AND away_pts IS NOT NULL
            ORDER BY date ASC, game_id ASC
            "#,
        )
        .context("prepare finalized games query")?;

    let rows = stmt
        .query_map(params![season], |row| {
            Ok(StoredGame {
                game_id: row.get(0)?,
                season: row.get(1)?,
                date: row.get(2)?,
                home_team_id: row.get(3)?,
                away_team_id: row.get(4)?,
                home_pts: row.get(5)?,
                away_pts: row.get(6)?,
            })
        })
        .context("query finalized games")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode game row")?);
    }
    Ok(out)
}

/// All appearances across seasons. Rows are scoped to a season later via the
/// game key, so a single load serves every season in one run.
pub fn load_appearances(conn: &Connection) -> Result<Vec<AppearanceRow>> {
    let mut stmt = conn
        .prepare("SELECT game_id, team_id, player_id, minutes FROM appearances")
        .context("prepare appearances query")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(AppearanceRow {
                game_id: row.get(0)?,
                team_id: row.get(1)?,
                player_id: row.get(2)?,
                minutes: row.get(3)?,
            })
        })
        .context("query appearances")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode appearance row")?);
    }
    Ok(out)
}

pub fn index_appearances(rows: &[AppearanceRow]) -> AppearanceIndex {
    let mut index: AppearanceIndex = HashMap::new();
    for a in rows {
        index
            .entry((game_key(a.game_id), a.team_id.clone()))
            .or_default()
            .push((a.player_id, a.minutes));
    }
    index
}
