// tools/aggregate_summaries.rs
// Fold every "summary_*.json" written by the simulator into one CSV.
// Columns: file,timestamp,count_open,count_closed,total_realized,total_fees,net
//
// Run with:
//   cargo run --bin aggregate_summaries
// or point it at another directory:
//   cargo run --bin aggregate_summaries -- ./data/runs

use std::path::PathBuf;

use swing_options::report::aggregate_dir;

fn main() -> anyhow::Result<()> {
    // Input directory: default "./out" or argv[1]; the CSV lands next to the inputs
    let args: Vec<String> = std::env::args().collect();
    let dir = if args.len() > 1 {
        PathBuf::from(&args[1])
    } else {
        PathBuf::from("out")
    };

    let (out, rows) = aggregate_dir(&dir)?;
    println!("Wrote {} ({} runs)", out.display(), rows);
    Ok(())
}
