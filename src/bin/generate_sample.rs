use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;

use statcast_engine::data::loader::{STATCAST_PLATE_X, STATCAST_PLATE_Y};

/// Write a synthetic Statcast-style batted-ball parquet file.
#[derive(Parser)]
#[command(name = "generate-sample", version)]
struct Args {
    /// Output path
    #[arg(default_value = "sample_bbe.parquet")]
    output: PathBuf,

    /// Batted balls per batter
    #[arg(long, default_value = "250")]
    rows: usize,

    /// PRNG seed
    #[arg(long, default_value = "42")]
    seed: u64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// (id, name, stand, mean exit velocity, mean launch angle, pull tendency in degrees)
const BATTERS: [(i64, &str, &str, f64, f64, f64); 6] = [
    (592450, "Judge, Aaron", "R", 95.5, 17.0, 8.0),
    (665742, "Soto, Juan", "L", 93.0, 10.0, 4.0),
    (660271, "Ohtani, Shohei", "L", 94.5, 15.0, 6.0),
    (514888, "Altuve, Jose", "R", 86.5, 16.0, 12.0),
    (677951, "Witt Jr., Bobby", "R", 91.0, 13.0, 2.0),
    (656941, "Schwarber, Kyle", "L", 92.0, 20.0, 14.0),
];

#[derive(Default)]
struct Columns {
    batter: Vec<i64>,
    player_name: Vec<String>,
    stand: Vec<String>,
    p_throws: Vec<String>,
    launch_speed: Vec<Option<f64>>,
    launch_angle: Vec<Option<f64>>,
    hc_x: Vec<Option<f64>>,
    hc_y: Vec<Option<f64>>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);
    let mut cols = Columns::default();

    for &(id, name, stand, ev_mean, la_mean, pull) in &BATTERS {
        for _ in 0..args.rows {
            let p_throws = if rng.chance(0.7) { "R" } else { "L" };

            // ~3% of balls have no tracking at all, ~5% miss the landing spot.
            let tracked = !rng.chance(0.03);
            let exit_velocity = rng.gauss(ev_mean, 12.0).max(20.0);
            let launch_angle = rng.gauss(la_mean, 25.0).clamp(-80.0, 85.0);

            let spray = rng.gauss(pull, 25.0).clamp(-45.0, 45.0);
            let field_angle = if stand == "R" { -spray } else { spray };
            let distance = (exit_velocity * 1.4).max(10.0);
            let x = distance * field_angle.to_radians().sin();
            let y = distance * field_angle.to_radians().cos();
            let landed = !rng.chance(0.05);

            cols.batter.push(id);
            cols.player_name.push(name.to_string());
            cols.stand.push(stand.to_string());
            cols.p_throws.push(p_throws.to_string());
            cols.launch_speed.push(tracked.then_some(exit_velocity));
            cols.launch_angle.push(tracked.then_some(launch_angle));
            cols.hc_x.push((tracked && landed).then_some(STATCAST_PLATE_X + x));
            cols.hc_y.push((tracked && landed).then_some(STATCAST_PLATE_Y - y));
        }
    }

    let n_rows = cols.batter.len();
    let schema = Arc::new(Schema::new(vec![
        Field::new("batter", DataType::Int64, false),
        Field::new("player_name", DataType::Utf8, false),
        Field::new("stand", DataType::Utf8, false),
        Field::new("p_throws", DataType::Utf8, false),
        Field::new("launch_speed", DataType::Float64, true),
        Field::new("launch_angle", DataType::Float64, true),
        Field::new("hc_x", DataType::Float64, true),
        Field::new("hc_y", DataType::Float64, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(cols.batter)),
            Arc::new(StringArray::from(cols.player_name)),
            Arc::new(StringArray::from(cols.stand)),
            Arc::new(StringArray::from(cols.p_throws)),
            Arc::new(Float64Array::from(cols.launch_speed)),
            Arc::new(Float64Array::from(cols.launch_angle)),
            Arc::new(Float64Array::from(cols.hc_x)),
            Arc::new(Float64Array::from(cols.hc_y)),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;

    println!(
        "Wrote {n_rows} batted balls ({} batters) to {}",
        BATTERS.len(),
        args.output.display()
    );
    Ok(())
}
