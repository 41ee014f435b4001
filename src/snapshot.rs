use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// One row of the daily ratings artifact, rank 1 = best. The movement
/// columns are blank on a first run with no prior snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingRow {
    pub team: String,
    pub rating: f64,
    pub rank: u32,
    pub yest_rank: Option<u32>,
    pub last_week_rank: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WeeklyRow {
    team: String,
    rating: f64,
    rank: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CsvRow {
    date: String,
    season: i32,
    rank: u32,
    team: String,
    rating: f64,
}

pub fn daily_json_path(data_dir: &Path, season: i32) -> PathBuf {
    data_dir.join(format!("ratings_{season}.json"))
}

pub fn weekly_json_path(data_dir: &Path, season: i32) -> PathBuf {
    data_dir.join(format!("ratings_{season}_weekly.json"))
}

fn csv_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("csv")
}

fn csv_snapshot_path(data_dir: &Path, season: i32, date: NaiveDate) -> PathBuf {
    csv_dir(data_dir).join(format!("ratings_{season}_{}.csv", date.format("%Y%m%d")))
}

/// Write the full snapshot set for one season run: the dated CSV, the daily
/// JSON with rank movement columns, and (on Mondays) the weekly reference
/// file that next week's "LW" column reads.
pub fn write_season_snapshots(
    data_dir: &Path,
    season: i32,
    ratings: &HashMap<String, f64>,
    today: NaiveDate,
) -> Result<Vec<RatingRow>> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("create data dir {}", data_dir.display()))?;

    let daily_path = daily_json_path(data_dir, season);
    let mut yesterday_ranks = load_prev_day_ranks(data_dir, season, today);
    if yesterday_ranks.is_empty() {
        yesterday_ranks = load_daily_json_ranks(&daily_path);
    }
    let last_week_ranks = load_last_week_ranks(data_dir, season, today);

    let rows: Vec<RatingRow> = ranked(ratings)
        .into_iter()
        .enumerate()
        .map(|(idx, (team, rating))| {
            let rank = idx as u32 + 1;
            let yest_rank = yesterday_ranks.get(&team).copied();
            let last_week_rank = last_week_ranks.get(&team).copied();
            RatingRow {
                team,
                rating,
                rank,
                yest_rank,
                last_week_rank,
            }
        })
        .collect();

    write_ratings_csv(data_dir, season, today, &rows)?;
    write_json_atomic(&daily_path, &rows)?;

    if today.weekday() == Weekday::Mon {
        let weekly: Vec<WeeklyRow> = rows
            .iter()
            .map(|r| WeeklyRow {
                team: r.team.clone(),
                rating: r.rating,
                rank: r.rank,
            })
            .collect();
        write_json_atomic(&weekly_json_path(data_dir, season), &weekly)?;
    }

    Ok(rows)
}

/// Teams best to worst; ties fall back to team id for a reproducible order.
fn ranked(ratings: &HashMap<String, f64>) -> Vec<(String, f64)> {
    let mut items: Vec<(String, f64)> = ratings.iter().map(|(t, r)| (t.clone(), *r)).collect();
    items.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    items
}

fn write_ratings_csv(
    data_dir: &Path,
    season: i32,
    today: NaiveDate,
    rows: &[RatingRow],
) -> Result<()> {
    let dir = csv_dir(data_dir);
    fs::create_dir_all(&dir).with_context(|| format!("create csv dir {}", dir.display()))?;
    let path = csv_snapshot_path(data_dir, season, today);
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("open csv snapshot {}", path.display()))?;
    for row in rows {
        writer
            .serialize(CsvRow {
                date: today.to_string(),
                season,
                rank: row.rank,
                team: row.team.clone(),
                rating: row.rating,
            })
            .context("write csv snapshot row")?;
    }
    writer.flush().context("flush csv snapshot")?;
    Ok(())
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serialize snapshot json")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("write snapshot {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("swap snapshot {}", path.display()))?;
    Ok(())
}

/// Ranks from the most recent dated CSV strictly before `today`. Missing or
/// unreadable snapshots mean blank movement columns, never an error.
pub fn load_prev_day_ranks(
    data_dir: &Path,
    season: i32,
    today: NaiveDate,
) -> HashMap<String, u32> {
    let Some((_, path)) = latest_snapshot(data_dir, season, |date| date < today, false) else {
        return HashMap::new();
    };
    parse_ranks_from_csv(&path)
}

/// Ranks as of the last completed week: the newest Monday CSV on or before
/// last Monday, else the newest snapshot that old, overlaid by the weekly
/// JSON file when one exists.
pub fn load_last_week_ranks(
    data_dir: &Path,
    season: i32,
    today: NaiveDate,
) -> HashMap<String, u32> {
    let days_back = match today.weekday().num_days_from_monday() {
        0 => 7,
        n => i64::from(n),
    };
    let target_monday = today - Duration::days(days_back);

    let mut ranks = match latest_snapshot(data_dir, season, |date| date <= target_monday, true) {
        Some((_, path)) => parse_ranks_from_csv(&path),
        None => HashMap::new(),
    };

    let weekly = weekly_json_path(data_dir, season);
    if weekly.exists() {
        match read_weekly_ranks(&weekly) {
            Ok(rows) => {
                for row in rows {
                    ranks.insert(row.team, row.rank);
                }
            }
            Err(_) => ranks.clear(),
        }
    }
    ranks
}

/// Newest dated snapshot passing `eligible`. With `prefer_mondays`, Monday
/// snapshots win over any non-Monday candidate.
fn latest_snapshot(
    data_dir: &Path,
    season: i32,
    eligible: impl Fn(NaiveDate) -> bool,
    prefer_mondays: bool,
) -> Option<(NaiveDate, PathBuf)> {
    let dir = csv_dir(data_dir);
    let entries = fs::read_dir(&dir).ok()?;

    let mut best: Option<(NaiveDate, PathBuf)> = None;
    let mut best_is_monday = false;
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(date) = snapshot_date(&path, season) else {
            continue;
        };
        if !eligible(date) {
            continue;
        }
        let is_monday = date.weekday() == Weekday::Mon;
        let wins = match &best {
            None => true,
            Some((best_date, _)) => {
                if prefer_mondays && is_monday != best_is_monday {
                    is_monday
                } else {
                    date > *best_date
                }
            }
        };
        if wins {
            best = Some((date, path));
            best_is_monday = is_monday;
        }
    }
    best
}

fn snapshot_date(path: &Path, season: i32) -> Option<NaiveDate> {
    let stem = path.file_stem()?.to_str()?;
    if path.extension()?.to_str()? != "csv" {
        return None;
    }
    let date_part = stem.strip_prefix(&format!("ratings_{season}_"))?;
    NaiveDate::parse_from_str(date_part, "%Y%m%d").ok()
}

fn parse_ranks_from_csv(path: &Path) -> HashMap<String, u32> {
    let Ok(file) = fs::File::open(path) else {
        return HashMap::new();
    };
    let mut reader = csv::Reader::from_reader(file);
    let mut ranks = HashMap::new();
    for row in reader.deserialize::<CsvRow>() {
        let Ok(row) = row else {
            continue;
        };
        ranks.insert(row.team, row.rank);
    }
    ranks
}

fn load_daily_json_ranks(path: &Path) -> HashMap<String, u32> {
    let Ok(raw) = fs::read_to_string(path) else {
        return HashMap::new();
    };
    let Ok(rows) = serde_json::from_str::<Vec<RatingRow>>(&raw) else {
        return HashMap::new();
    };
    rows.into_iter().map(|r| (r.team, r.rank)).collect()
}

fn read_weekly_ranks(path: &Path) -> Result<Vec<WeeklyRow>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read weekly snapshot {}", path.display()))?;
    serde_json::from_str::<Vec<WeeklyRow>>(&raw)
        .with_context(|| format!("parse weekly snapshot {}", path.display()))
}
