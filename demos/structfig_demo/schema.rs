//! Schema for the structfig demo: a training job with a nested dataset.
//!
//! The same hierarchy exists twice: once as a runtime [`Schema`] that drives
//! loading, validation and CLI flags, and once as plain serde structs that
//! the resolved config is extracted into.

use std::sync::Arc;

use serde::Deserialize;
use structfig::{ConfigError, Field, Schema, ValueType};

pub fn training_schema() -> Result<Arc<Schema>, ConfigError> {
    let dataset = Schema::builder("Dataset")
        .field(
            Field::array("paths", ValueType::String)
                .description("Files to train on."),
        )
        .field(
            Field::int("batch_size")
                .description("Samples per batch.")
                .default(64),
        )
        .field(
            Field::bool("shuffle")
                .description("Shuffle samples every epoch.")
                .default(true),
        )
        .build()?;

    Schema::builder("structfig-demo")
        .description("Train a model (structfig demo).")
        .field(
            Field::float("learning_rate")
                .description("Optimizer step size.")
                .default(0.001),
        )
        .field(
            Field::int("epochs")
                .description("Passes over the dataset; runs until stopped if unset.")
                .optional(),
        )
        .field(
            Field::string("run_name")
                .description("Label for this run.")
                .default("demo"),
        )
        .field(Field::nested("training_dataset", &dataset).description("Dataset settings."))
        .build()
}

#[derive(Debug, Deserialize)]
pub struct Training {
    pub learning_rate: f64,
    pub epochs: Option<u32>,
    pub run_name: String,
    pub training_dataset: Dataset,
}

#[derive(Debug, Deserialize)]
pub struct Dataset {
    pub paths: Vec<String>,
    pub batch_size: u32,
    pub shuffle: bool,
}
