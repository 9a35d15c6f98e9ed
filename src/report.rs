//! Per-batter profiles, league comparison and the leaderboard.
//!
//! All numbers are produced through [`SubsetEngine`]: a batter's events are
//! a `Batter` subset, and rates are means of the flag metrics, so events with
//! missing measurements never count against a rate.

use std::cmp::Ordering;

use serde::Serialize;

use crate::data::model::BattedBallDataset;
use crate::metrics::Metric;
use crate::predicate::Predicate;
use crate::subset::{Subset, SubsetEngine};

/// Batted-ball quality profile of one batter.  `None` means no data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatterProfile {
    pub batter: i64,
    pub name: String,
    /// Batted-ball events.
    pub bbe: usize,
    pub median_exit_velocity: Option<f64>,
    pub p90_exit_velocity: Option<f64>,
    pub median_launch_angle: Option<f64>,
    pub hard_hit_pct: Option<f64>,
    pub optimal_pct: Option<f64>,
}

impl BatterProfile {
    pub fn from_subset(
        engine: &SubsetEngine,
        batter: i64,
        name: impl Into<String>,
        events: &Subset<'_>,
    ) -> Self {
        let ev = engine.summarize(events, Metric::ExitVelocity);
        let pct = |metric| engine.summarize(events, metric).mean().map(|m| m * 100.0);
        BatterProfile {
            batter,
            name: name.into(),
            bbe: events.len(),
            median_exit_velocity: ev.median(),
            p90_exit_velocity: ev.p90(),
            median_launch_angle: engine.summarize(events, Metric::LaunchAngle).median(),
            hard_hit_pct: pct(Metric::HardHit),
            optimal_pct: pct(Metric::OptimalLaunchAngle),
        }
    }
}

/// Profile every batter in the dataset, ordered by batter id.
pub fn league_profiles(dataset: &BattedBallDataset, engine: &SubsetEngine) -> Vec<BatterProfile> {
    dataset
        .batters()
        .iter()
        .map(|(&id, name)| {
            let events = engine.filter(dataset, &Predicate::batter(id));
            BatterProfile::from_subset(engine, id, name.as_str(), &events)
        })
        .collect()
}

/// Percentile rank of `score` within `population`, averaging the strict
/// (`< score`) and weak (`<= score`) definitions so ties land in the middle.
/// Absent entries are skipped; `None` when nothing remains.
pub fn percentile_of_score<I>(population: I, score: f64) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut n = 0usize;
    let mut below = 0usize;
    let mut at_or_below = 0usize;
    for v in population.into_iter().flatten() {
        n += 1;
        if v < score {
            below += 1;
        }
        if v <= score {
            at_or_below += 1;
        }
    }
    (n > 0).then(|| (below + at_or_below) as f64 * 50.0 / n as f64)
}

fn median_of(values: impl IntoIterator<Item = Option<f64>>) -> Option<f64> {
    let mut present: Vec<f64> = values.into_iter().flatten().collect();
    present.sort_by(f64::total_cmp);
    crate::subset::percentile_sorted(&present, 50.0)
}

/// One line of a player-vs-league comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub stat: &'static str,
    pub player: Option<f64>,
    /// Median of the per-batter values across the league.
    pub league: Option<f64>,
    pub percentile: Option<f64>,
}

/// A batter's profile set against the rest of the league.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerReport {
    pub profile: BatterProfile,
    pub rows: Vec<ComparisonRow>,
}

type Stat = (&'static str, fn(&BatterProfile) -> Option<f64>);

const REPORT_STATS: [Stat; 5] = [
    ("Median EV", |p: &BatterProfile| p.median_exit_velocity),
    ("90th EV", |p: &BatterProfile| p.p90_exit_velocity),
    ("Hard Hit %", |p: &BatterProfile| p.hard_hit_pct),
    ("Median LA", |p: &BatterProfile| p.median_launch_angle),
    ("Optimal %", |p: &BatterProfile| p.optimal_pct),
];

impl PlayerReport {
    pub fn new(profile: BatterProfile, league: &[BatterProfile]) -> Self {
        let rows = REPORT_STATS
            .iter()
            .map(|&(stat, get)| {
                let player = get(&profile);
                ComparisonRow {
                    stat,
                    player,
                    league: median_of(league.iter().map(get)),
                    percentile: player
                        .and_then(|score| percentile_of_score(league.iter().map(get), score)),
                }
            })
            .collect();
        PlayerReport { profile, rows }
    }
}

/// Batters with strictly more than `min_bbe` events, by median exit velocity
/// descending.  Batters without an exit velocity sort last.
pub fn leaderboard(profiles: &[BatterProfile], min_bbe: usize) -> Vec<BatterProfile> {
    let mut rows: Vec<BatterProfile> = profiles
        .iter()
        .filter(|p| p.bbe > min_bbe)
        .cloned()
        .collect();
    rows.sort_by(|a, b| match (a.median_exit_velocity, b.median_exit_velocity) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::data::model::{BattedBallEvent, Handedness};

    fn event(id: i64, name: &str, ev: Option<f64>, la: Option<f64>) -> BattedBallEvent {
        BattedBallEvent::new(ev, la, None, None, Handedness::Right).with_batter(id, name)
    }

    fn dataset() -> BattedBallDataset {
        BattedBallDataset::from_events(vec![
            event(1, "Slugger", Some(105.0), Some(25.0)),
            event(1, "Slugger", Some(99.0), Some(12.0)),
            event(1, "Slugger", Some(88.0), Some(-10.0)),
            event(1, "Slugger", None, Some(30.0)),
            event(2, "Slapper", Some(80.0), Some(5.0)),
            event(2, "Slapper", Some(85.0), Some(2.0)),
            event(3, "Ghost", None, None),
        ])
    }

    fn engine() -> SubsetEngine {
        SubsetEngine::new(EngineConfig::default()).unwrap()
    }

    #[test]
    fn profiles_use_determined_denominators() {
        let profiles = league_profiles(&dataset(), &engine());
        assert_eq!(profiles.len(), 3);

        let slugger = &profiles[0];
        assert_eq!(slugger.bbe, 4);
        assert_eq!(slugger.median_exit_velocity, Some(99.0));
        // 2 of 3 measured balls were hard hit; the unmeasured one is not a miss.
        let hh = slugger.hard_hit_pct.unwrap();
        assert!((hh - 200.0 / 3.0).abs() < 1e-9);
        // 25, 12, 30 in window, -10 not.
        assert_eq!(slugger.optimal_pct, Some(75.0));

        let ghost = &profiles[2];
        assert_eq!(ghost.bbe, 1);
        assert_eq!(ghost.median_exit_velocity, None);
        assert_eq!(ghost.hard_hit_pct, None);
    }

    #[test]
    fn percentile_rank_handles_ties_and_gaps() {
        let pop = [Some(1.0), Some(2.0), Some(3.0), Some(4.0)];
        assert_eq!(percentile_of_score(pop, 3.0), Some(62.5));
        assert_eq!(percentile_of_score(pop, 10.0), Some(100.0));
        assert_eq!(percentile_of_score(pop, 0.0), Some(0.0));
        assert_eq!(percentile_of_score([None, Some(5.0)], 5.0), Some(50.0));
        assert_eq!(percentile_of_score([None, None], 5.0), None);
    }

    #[test]
    fn player_report_compares_with_league() {
        let e = engine();
        let profiles = league_profiles(&dataset(), &e);
        let report = PlayerReport::new(profiles[0].clone(), &profiles);
        let ev_row = &report.rows[0];
        assert_eq!(ev_row.stat, "Median EV");
        assert_eq!(ev_row.player, Some(99.0));
        // League medians over batters with data: 99 and 82.5.
        assert_eq!(ev_row.league, Some(90.75));
        assert_eq!(ev_row.percentile, Some(75.0));
    }

    #[test]
    fn player_without_data_has_no_percentile() {
        let profiles = league_profiles(&dataset(), &engine());
        let report = PlayerReport::new(profiles[2].clone(), &profiles);
        assert!(report.rows.iter().all(|r| r.player.is_none() && r.percentile.is_none()));
    }

    #[test]
    fn leaderboard_filters_and_sorts() {
        let profiles = league_profiles(&dataset(), &engine());
        let board = leaderboard(&profiles, 0);
        let names: Vec<_> = board.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Slugger", "Slapper", "Ghost"]);

        let board = leaderboard(&profiles, 2);
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].name, "Slugger");
    }
}
