use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Hand / Handedness
// ---------------------------------------------------------------------------

/// A single side: the side a batter stands on, or the arm a pitcher throws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub fn opposite(self) -> Hand {
        match self {
            Hand::Left => Hand::Right,
            Hand::Right => Hand::Left,
        }
    }
}

impl FromStr for Hand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "l" | "left" => Ok(Hand::Left),
            "r" | "right" => Ok(Hand::Right),
            other => Err(format!("unknown hand '{other}'")),
        }
    }
}

/// Batter handedness as recorded for the batter, including switch hitters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handedness {
    Left,
    Right,
    Switch,
}

impl Handedness {
    /// The side the batter actually stood on for this event.
    ///
    /// Switch hitters bat opposite the pitcher's throwing arm; without that
    /// information the side is unknown.
    pub fn batting_side(self, pitcher_throws: Option<Hand>) -> Option<Hand> {
        match self {
            Handedness::Left => Some(Hand::Left),
            Handedness::Right => Some(Hand::Right),
            Handedness::Switch => pitcher_throws.map(Hand::opposite),
        }
    }
}

impl FromStr for Handedness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "l" | "left" => Ok(Handedness::Left),
            "r" | "right" => Ok(Handedness::Right),
            "s" | "b" | "switch" | "both" => Ok(Handedness::Switch),
            other => Err(format!("unknown handedness '{other}'")),
        }
    }
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handedness::Left => write!(f, "L"),
            Handedness::Right => write!(f, "R"),
            Handedness::Switch => write!(f, "S"),
        }
    }
}

// ---------------------------------------------------------------------------
// BattedBallEvent – one row of the source table
// ---------------------------------------------------------------------------

/// A single batted-ball observation.
///
/// Every measurement is optional: tracking may not have captured it.
/// Hit coordinates are relative to home plate, `y` pointing toward centre
/// field and positive `x` toward the first-base side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattedBallEvent {
    /// Exit velocity off the bat (mph).
    pub exit_velocity: Option<f64>,
    /// Vertical launch angle (degrees).
    pub launch_angle: Option<f64>,
    pub hit_coordinate_x: Option<f64>,
    pub hit_coordinate_y: Option<f64>,
    pub batter_handedness: Option<Handedness>,
    /// Needed only to resolve a switch hitter's batting side.
    pub pitcher_throws: Option<Hand>,
    /// MLBAM batter id.
    pub batter: Option<i64>,
    pub batter_name: Option<String>,
}

impl BattedBallEvent {
    /// Event with just the measured fields, handy for in-memory sources.
    pub fn new(
        exit_velocity: Option<f64>,
        launch_angle: Option<f64>,
        hit_coordinate_x: Option<f64>,
        hit_coordinate_y: Option<f64>,
        batter_handedness: Handedness,
    ) -> Self {
        Self {
            exit_velocity,
            launch_angle,
            hit_coordinate_x,
            hit_coordinate_y,
            batter_handedness: Some(batter_handedness),
            ..Default::default()
        }
    }

    pub fn with_batter(mut self, id: i64, name: impl Into<String>) -> Self {
        self.batter = Some(id);
        self.batter_name = Some(name.into());
        self
    }

    pub fn with_pitcher_throws(mut self, hand: Hand) -> Self {
        self.pitcher_throws = Some(hand);
        self
    }
}

// ---------------------------------------------------------------------------
// BattedBallDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The immutable set of events from one load, with a batter index.
#[derive(Debug, Clone, Default)]
pub struct BattedBallDataset {
    events: Vec<BattedBallEvent>,
    /// batter id → display name (first name seen for that id).
    batters: BTreeMap<i64, String>,
}

impl BattedBallDataset {
    /// Build the batter index from the loaded events.
    pub fn from_events(events: Vec<BattedBallEvent>) -> Self {
        let mut batters = BTreeMap::new();
        for ev in &events {
            if let Some(id) = ev.batter {
                let name = ev.batter_name.clone().unwrap_or_else(|| id.to_string());
                batters.entry(id).or_insert(name);
            }
        }
        BattedBallDataset { events, batters }
    }

    pub fn events(&self) -> &[BattedBallEvent] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BattedBallEvent> {
        self.events.iter()
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Batter ids with their display names, ordered by id.
    pub fn batters(&self) -> &BTreeMap<i64, String> {
        &self.batters
    }

    /// Look up a batter id by display name (case-insensitive).
    pub fn find_batter(&self, name: &str) -> Option<i64> {
        self.batters
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name.trim()))
            .map(|(id, _)| *id)
    }

    /// Events belonging to one batter, in source order.
    pub fn events_for(&self, batter: i64) -> impl Iterator<Item = &BattedBallEvent> {
        self.events.iter().filter(move |ev| ev.batter == Some(batter))
    }
}

impl<'a> IntoIterator for &'a BattedBallDataset {
    type Item = &'a BattedBallEvent;
    type IntoIter = std::slice::Iter<'a, BattedBallEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
