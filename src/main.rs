use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use rayon::prelude::*;

use powerindex::params::RatingParams;
use powerindex::season::{SeasonRun, run_season};
use powerindex::{snapshot, store};

const DEFAULT_SEASONS: &[i32] = &[2026];

fn main() -> Result<()> {
    let seasons = match parse_seasons_arg()? {
        Some(seasons) => seasons,
        None => default_seasons_from_env()?,
    };
    if seasons.is_empty() {
        return Err(anyhow!("no seasons resolved for rating run"));
    }

    let db_path = parse_path_arg("--db")
        .unwrap_or_else(|| PathBuf::from("data").join("league_ratings.db"));
    let data_dir = parse_path_arg("--data-dir").unwrap_or_else(|| PathBuf::from("data"));
    let params = RatingParams::default();

    // Each season is a pure function of its own inputs, so seasons fan out
    // across threads with one read connection apiece.
    let runs: Vec<Result<SeasonRun>> = seasons
        .par_iter()
        .map(|&season| {
            let conn = store::open_db(&db_path)?;
            run_season(&conn, season, &params)
        })
        .collect();

    let today = Utc::now().date_naive();
    for (season, run) in seasons.iter().zip(runs) {
        let run = run.with_context(|| format!("rating run for season {season}"))?;
        println!("=== Ratings for season {season} ===");
        print_season_report(&run);
        let rows = snapshot::write_season_snapshots(&data_dir, run.season, &run.ratings, today)?;
        println!(
            "Saved {} teams to {}",
            rows.len(),
            snapshot::daily_json_path(&data_dir, run.season).display()
        );
    }

    Ok(())
}

fn print_season_report(run: &SeasonRun) {
    println!("rank team      rating    W-L    avgM   adjM    SOS");
    for (idx, (team, rating)) in run.ranked().iter().enumerate() {
        let record = run.results.get(team).copied().unwrap_or_default();
        let comp = run.components.get(team);
        println!(
            "{:>4} {:<8} {:>8.3} {:>3}-{:<3} {:>6.1} {:>6.1} {:>6.2}",
            idx + 1,
            team,
            rating,
            record.wins,
            record.losses,
            record.avg_margin(),
            comp.map(|c| c.avg_adj_margin).unwrap_or(0.0),
            comp.map(|c| c.sos_avg_opp_rating).unwrap_or(0.0),
        );
    }
    match &run.accuracy {
        Some(acc) => println!(
            "spread accuracy: MAE {:.2}, RMSE {:.2} over {} games",
            acc.mae, acc.rmse, acc.games_count
        ),
        None => println!("spread accuracy: no eligible games"),
    }
}

fn parse_seasons_arg() -> Result<Option<Vec<i32>>> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix("--seasons=") {
            return parse_seasons(raw).map(Some);
        }
        if arg == "--seasons"
            && let Some(next) = args.get(idx + 1)
        {
            return parse_seasons(next).map(Some);
        }
    }
    Ok(None)
}

fn parse_seasons(raw: &str) -> Result<Vec<i32>> {
    let mut out = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let season = part
            .parse::<i32>()
            .with_context(|| format!("malformed season identifier {part:?}"))?;
        if !out.contains(&season) {
            out.push(season);
        }
    }
    Ok(out)
}

fn default_seasons_from_env() -> Result<Vec<i32>> {
    match std::env::var("POWERINDEX_SEASONS") {
        Ok(raw) if !raw.trim().is_empty() => parse_seasons(&raw),
        _ => Ok(DEFAULT_SEASONS.to_vec()),
    }
}

fn parse_path_arg(flag: &str) -> Option<PathBuf> {
    let prefix = format!("{flag}=");
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix(&prefix) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}
