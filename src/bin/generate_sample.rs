//! Writes `sample_grid.csv` and `sample_grid.parquet`: a selection with a
//! title, settings, a directive, header rows, error bars and an inset.

use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const WIDTH: usize = 5;

fn damped(t: f64) -> f64 {
    (-t / 4.0).exp() * (2.0 * std::f64::consts::PI * 0.8 * t).cos()
}

fn lorentzian(f: f64, f0: f64, gamma: f64) -> f64 {
    gamma.powi(2) / ((f - f0).powi(2) + gamma.powi(2))
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
}

fn row(cells: &[&str]) -> Vec<String> {
    let mut out: Vec<String> = cells.iter().map(|c| c.to_string()).collect();
    out.resize(WIDTH, String::new());
    out
}

fn build_grid(rng: &mut SimpleRng) -> Vec<Vec<String>> {
    let mut grid = vec![
        row(&["title", "Damped oscillator"]),
        row(&["settings", "grid", "minorticks"]),
        row(&["add_hline", "0", "color=gray"]),
        row(&["set_xlim", "0.5", "2.5", "layer=insettr"]),
        row(&["Time", "Amplitude", "", "Frequency", "Power"]),
        row(&["s", "mV", "", "Hz", "a.u."]),
        row(&["", "measured", "", "", "spectrum"]),
        row(&["X", "Y;;marker=o;ls=none", "Yerr", "X;insettr", "Y;insettr;color=darkred"]),
    ];

    // Main series: 60 samples; inset spectrum: 40 samples, so its columns end
    // early and the trailing cells stay empty.
    for i in 0..60 {
        let t = i as f64 * 0.2;
        let noise = 0.03 + 0.02 * rng.next_f64();
        let mut cells = vec![
            format!("{t:.2}"),
            format!("{:.4}", damped(t) + rng.gauss(0.0, noise)),
            format!("{noise:.4}"),
        ];
        if i < 40 {
            let f = 0.05 * i as f64 + 0.05;
            cells.push(format!("{f:.2}"));
            cells.push(format!("{:.4}", lorentzian(f, 0.8, 0.12) + rng.gauss(0.0, 0.01)));
        }
        cells.resize(WIDTH, String::new());
        grid.push(cells);
    }
    grid
}

fn write_csv(grid: &[Vec<String>], path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    for record in grid {
        writer.write_record(record).context("writing CSV row")?;
    }
    writer.flush()?;
    Ok(())
}

/// Every column is Utf8, as a spreadsheet export of mixed header/data rows.
fn write_parquet(grid: &[Vec<String>], path: &str) -> Result<()> {
    let fields: Vec<Field> = (0..WIDTH)
        .map(|c| Field::new(format!("c{c}"), DataType::Utf8, true))
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let columns: Vec<ArrayRef> = (0..WIDTH)
        .map(|c| {
            let values: Vec<Option<&str>> = grid
                .iter()
                .map(|r| r.get(c).map(String::as_str).filter(|s| !s.is_empty()))
                .collect();
            Arc::new(StringArray::from(values)) as ArrayRef
        })
        .collect();

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let grid = build_grid(&mut rng);

    write_csv(&grid, "sample_grid.csv")?;
    write_parquet(&grid, "sample_grid.parquet")?;

    println!(
        "Wrote a {}x{WIDTH} selection to sample_grid.csv and sample_grid.parquet",
        grid.len()
    );
    Ok(())
}
