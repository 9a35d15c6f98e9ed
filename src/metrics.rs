//! Derived batted-ball metrics.
//!
//! Every derivation is a pure function of one event.  Missing inputs give a
//! missing output; out-of-range inputs (negative exit velocity and the like)
//! are passed through untouched.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, LaunchAngleRange};
use crate::data::model::{BattedBallEvent, Hand};

/// True iff the ball left the bat at or above `threshold_mph`.
pub fn hard_hit(event: &BattedBallEvent, threshold_mph: f64) -> Option<bool> {
    event.exit_velocity.map(|ev| ev >= threshold_mph)
}

/// True iff the launch angle falls inside the closed `range`.
pub fn optimal_launch_angle(event: &BattedBallEvent, range: LaunchAngleRange) -> Option<bool> {
    event.launch_angle.map(|la| range.contains(la))
}

/// Horizontal field angle in degrees, positive when pulled.
///
/// `atan2(x, y)` measured from the line through second base, then flipped for
/// right-handed batters (who pull toward the third-base side, negative `x`).
/// A ball with `y == 0` is defined to have a spray angle of exactly 0, even
/// when the batting side is unknown.
pub fn spray_angle(event: &BattedBallEvent) -> Option<f64> {
    let x = event.hit_coordinate_x?;
    let y = event.hit_coordinate_y?;
    // 0° has no sign, so the batting side does not matter here.
    if y == 0.0 {
        return Some(0.0);
    }
    let side = event
        .batter_handedness?
        .batting_side(event.pitcher_throws)?;

    let angle = x.atan2(y).to_degrees();
    Some(match side {
        Hand::Left => angle,
        Hand::Right => -angle,
    })
}

fn flag(value: Option<bool>) -> Option<f64> {
    value.map(|b| if b { 1.0 } else { 0.0 })
}

// ---------------------------------------------------------------------------
// Metric – the named metrics predicates and summaries work over
// ---------------------------------------------------------------------------

/// A raw or derived per-event metric.
///
/// Flags derive to `1.0` / `0.0`, so the mean of a flag over a subset is a rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    ExitVelocity,
    LaunchAngle,
    HitCoordinateX,
    HitCoordinateY,
    SprayAngle,
    HardHit,
    OptimalLaunchAngle,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::ExitVelocity,
        Metric::LaunchAngle,
        Metric::HitCoordinateX,
        Metric::HitCoordinateY,
        Metric::SprayAngle,
        Metric::HardHit,
        Metric::OptimalLaunchAngle,
    ];

    pub fn derive(self, event: &BattedBallEvent, config: &EngineConfig) -> Option<f64> {
        match self {
            Metric::ExitVelocity => event.exit_velocity,
            Metric::LaunchAngle => event.launch_angle,
            Metric::HitCoordinateX => event.hit_coordinate_x,
            Metric::HitCoordinateY => event.hit_coordinate_y,
            Metric::SprayAngle => spray_angle(event),
            Metric::HardHit => flag(hard_hit(event, config.hard_hit_threshold_mph)),
            Metric::OptimalLaunchAngle => {
                flag(optimal_launch_angle(event, config.optimal_launch_angle_range))
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Metric::ExitVelocity => "exit_velocity",
            Metric::LaunchAngle => "launch_angle",
            Metric::HitCoordinateX => "hit_coordinate_x",
            Metric::HitCoordinateY => "hit_coordinate_y",
            Metric::SprayAngle => "spray_angle",
            Metric::HardHit => "hard_hit",
            Metric::OptimalLaunchAngle => "optimal_launch_angle",
        }
    }

    pub fn is_flag(self) -> bool {
        matches!(self, Metric::HardHit | Metric::OptimalLaunchAngle)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "launch_speed" | "ev" => return Ok(Metric::ExitVelocity),
            "la" => return Ok(Metric::LaunchAngle),
            _ => {}
        }
        Metric::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| format!("unknown metric '{s}'"))
    }
}
