//! Data layer: the batted-ball event model and tabular loading.
//!
//! Architecture:
//! ```text
//!  .parquet / .json / .csv        in-memory table
//!        │                              │
//!        ▼                              ▼
//!   ┌──────────┐                 ┌────────────┐
//!   │  loader   │  parse file →  │ load_table │
//!   └──────────┘                 └────────────┘
//!        │                              │
//!        └──────────────┬───────────────┘
//!                       ▼
//!            ┌────────────────────┐
//!            │ BattedBallDataset  │  Vec<BattedBallEvent>, batter index
//!            └────────────────────┘
//! ```

pub mod loader;
pub mod model;
