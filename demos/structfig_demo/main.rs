//! # structfig demo application
//!
//! A sample training CLI that showcases how to integrate structfig into a
//! real application. This is **not** a real app; it exists purely to
//! demonstrate and manually verify structfig's features.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example structfig_demo -- --training_dataset.paths a.csv b.csv
//! cargo run --example structfig_demo -- --help
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature               | How to exercise it                                                          |
//! |-----------------------|-----------------------------------------------------------------------------|
//! | Compiled defaults     | `cargo run --example structfig_demo -- --training_dataset.paths a.csv`     |
//! | Config file           | `cargo run --example structfig_demo -- --config train.yaml`                |
//! | Flag over file        | `... -- --config train.yaml --learning_rate 0.1`                           |
//! | Print config          | `... -- --training_dataset.paths a.csv --print_config`                     |
//! | Missing required      | `cargo run --example structfig_demo` (no paths)                            |
//! | Type errors           | `... -- --training_dataset.paths a.csv --epochs lots`                      |
//! | Write resolved config | `... -- --training_dataset.paths a.csv` with `STRUCTFIG_DEMO_SAVE=out.json` |
//! | Logging               | `RUST_LOG=structfig=debug cargo run --example structfig_demo -- ...`        |

mod schema;

use std::process::ExitCode;

use structfig::{CliParser, ConfigError};
use tracing_subscriber::EnvFilter;

use schema::{Training, training_schema};

fn run() -> Result<(), ConfigError> {
    let schema = training_schema()?;
    let mut config = schema.instantiate();
    CliParser::new(&schema)?
        .name("structfig-demo")
        .parse(&mut config)?;

    if let Some(path) = std::env::var_os("STRUCTFIG_DEMO_SAVE") {
        config.write_file(&path)?;
        println!("Resolved configuration written to {}", path.to_string_lossy());
    }

    let training: Training = config.extract()?;
    let epochs = training
        .epochs
        .map_or_else(|| "until stopped".to_string(), |n| n.to_string());
    println!(
        "Run '{}': lr={} epochs={} batch_size={} shuffle={}",
        training.run_name,
        training.learning_rate,
        epochs,
        training.training_dataset.batch_size,
        training.training_dataset.shuffle,
    );
    for path in &training.training_dataset.paths {
        println!("  reading {path}");
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
