//! Predict the most likely diseases for one JSON symptom report.
//!
//! The report is the first argument, or stdin when omitted. The JSON result
//! is the only thing printed to stdout; diagnostics go to stderr.

use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use sympredict::api::{predict_json, Outcome, EXIT_FAILURE};
use sympredict::common::{config::AppCfg, log, PredictError};

#[derive(Parser, Debug)]
#[command(about = "Predict top diseases for a symptom report", version)]
struct Args {
    /// Request JSON. Read from stdin when omitted.
    #[arg(value_name = "JSON")]
    input: Option<String>,

    /// Directory holding bundle.json. Defaults to SYMPREDICT_BUNDLE_DIR.
    #[arg(long = "bundle-dir", value_name = "DIR")]
    bundle_dir: Option<PathBuf>,
}

fn read_stdin() -> Result<String, PredictError> {
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn main() {
    let args = Args::parse();
    let cfg = AppCfg::load();
    log::init(cfg.log_filter.as_deref(), "warn");

    let bundle_dir = args.bundle_dir.unwrap_or(cfg.bundle_dir);
    let outcome = match args.input.map_or_else(read_stdin, Ok) {
        Ok(input) => predict_json(&bundle_dir, &input),
        Err(err) => {
            tracing::error!("could not read request: {err}");
            Outcome {
                payload: serde_json::json!({
                    "error": "Prediction failed",
                    "details": err.to_string(),
                })
                .to_string(),
                exit_code: EXIT_FAILURE,
            }
        }
    };

    println!("{}", outcome.payload);
    std::process::exit(outcome.exit_code);
}
