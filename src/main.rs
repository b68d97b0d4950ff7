//! plat command line: drives a headless annotation session end to end.
//!
//! Loads a plan image, ingests a detection-response JSON, applies the
//! score threshold and overlap suppression, and prints the results table
//! and per-label summary. Optionally writes the session out as a project
//! file.

use std::path::PathBuf;

use clap::Parser;

use plat::constants::defaults;
use plat::ingest::{self, DetectionResponse, NmsParams};
use plat::session::EditorSession;
use plat::transform::DisplayRect;
use plat::units::PlanScale;
use plat::LabelCatalog;

#[derive(Parser, Debug)]
#[command(name = "plat", version, about = "Plan annotation tool")]
struct Args {
    /// Plan image file
    image: PathBuf,

    /// Detection response JSON to ingest
    #[arg(short, long)]
    predictions: Option<PathBuf>,

    /// Scan resolution in dots per inch
    #[arg(long, default_value_t = defaults::DPI)]
    dpi: f32,

    /// Plan scale denominator (100 for a 1:100 drawing)
    #[arg(long = "plan-scale", default_value_t = defaults::PLAN_SCALE)]
    plan_scale: f32,

    /// Minimum prediction score to keep
    #[arg(long, default_value_t = defaults::SCORE_THRESHOLD)]
    threshold: f32,

    /// Skip overlap suppression of duplicate boxes
    #[arg(long)]
    no_nms: bool,

    /// Write the resulting project JSON here
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let scale = PlanScale::new(args.dpi, args.plan_scale)?;
    let mut session = EditorSession::with_scale(scale);
    *session.catalog_mut() = LabelCatalog::load_or_default();

    session.load_image(&args.image)?;
    let (width, height) = image::image_dimensions(&args.image)?;
    session.update_viewport(DisplayRect::new(0.0, 0.0, width as f32, height as f32))?;

    if let Some(path) = &args.predictions {
        let json = std::fs::read_to_string(path)?;
        let response = DetectionResponse::from_json(&json)?;
        let mut rows = ingest::to_annotations(&response, args.threshold, &scale);
        if !args.no_nms {
            rows = ingest::apply_nms(rows, NmsParams::default());
        }
        let token = session.begin_detection();
        session.apply_detections(token, rows);
    }

    print_results(&session);

    if let Some(path) = &args.output {
        session.save_project(path)?;
        println!("\nproject saved to {}", path.display());
    }
    Ok(())
}

fn print_results(session: &EditorSession) {
    let table = session.table();
    if table.is_empty() {
        println!("no annotations");
        return;
    }

    println!("{:<4} {:<12} {:<10} {:>7}  {}", "#", "Label", "Kind", "Score", "Measurement");
    for row in &table {
        println!(
            "{:<4} {:<12} {:<10} {:>7}  {}",
            row.index,
            row.label_name,
            row.kind,
            row.score_text(),
            row.measurement_text()
        );
    }

    println!();
    for line in session.summary() {
        println!("{}", line.text());
    }
    println!("total area: {:.2} m²", session.total_area());
}
