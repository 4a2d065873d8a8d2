use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use mask_eval::{Dataset, MaskEval, RowKind};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mask-eval")]
#[command(
    about = "Mask evaluation tool: optimal-match F1 between predicted and ground-truth RLE masks"
)]
struct Cli {
    /// Path to the solution (ground truth) rows JSON file
    #[arg(long)]
    solution: PathBuf,

    /// Path to the submission rows JSON file
    #[arg(long)]
    submission: PathBuf,

    /// Reorder submission rows to the solution's row ids before pairing
    #[arg(long)]
    align: bool,

    /// Score rows on a single thread
    #[arg(long)]
    sequential: bool,

    /// Print the score of every row
    #[arg(long)]
    per_row: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mask_eval=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    tracing::info!("Loading solution from {:?}...", cli.solution);
    let solution = Dataset::new(&cli.solution)
        .with_context(|| format!("failed to load solution {:?}", cli.solution))?;

    tracing::info!("Loading submission from {:?}...", cli.submission);
    let mut submission = Dataset::new(&cli.submission)
        .with_context(|| format!("failed to load submission {:?}", cli.submission))?;

    if cli.align {
        submission = submission
            .align_to(&solution)
            .context("failed to align submission rows")?;
    }

    let mut eval = MaskEval::new(solution, submission);
    eval.params.parallel = !cli.sequential;
    eval.params.match_row_ids = cli.align;

    tracing::info!("Evaluating...");
    eval.evaluate().context("evaluation failed")?;

    if cli.per_row {
        for row in &eval.row_evals {
            let detail = match row.kind {
                RowKind::Authentic => "authentic".to_string(),
                RowKind::Missed => "missed".to_string(),
                RowKind::Masks { num_gt, num_pred } => format!("gt={} pred={}", num_gt, num_pred),
            };
            println!("{}\t{:.6}\t{}", row.row_id, row.score, detail);
        }
    }

    tracing::info!("Accumulating...");
    let score = eval.accumulate()?;
    eval.summarize();

    // Machine-readable line for scripts
    println!("score: {:.15}", score);

    Ok(())
}
