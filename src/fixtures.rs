#[cfg(test)]
pub mod test {
    use std::sync::Arc;

    use crate::field::Field;
    use crate::schema::Schema;
    use crate::types::ValueType;

    /// A training job: defaulted scalars, one optional scalar, and a nested
    /// dataset whose `paths` must be supplied.
    pub fn training_schema() -> Arc<Schema> {
        let dataset = Schema::builder("Dataset")
            .description("Input data settings.")
            .field(
                Field::array("paths", ValueType::String).description("Files to train on."),
            )
            .field(
                Field::int("batch_size")
                    .description("Samples per batch.")
                    .default(64),
            )
            .build()
            .unwrap();

        Schema::builder("Training")
            .field(
                Field::float("learning_rate")
                    .description("Optimizer step size.")
                    .default(0.001),
            )
            .field(
                Field::int("epochs")
                    .description("Passes over the dataset.")
                    .optional(),
            )
            .field(Field::bool("verbose").default(false))
            .field(Field::nested("training_dataset", &dataset).description("Dataset settings."))
            .build()
            .unwrap()
    }

    /// A required root scalar plus an optional nested struct with its own
    /// required field.
    pub fn required_schema() -> Arc<Schema> {
        let checkpoint = Schema::builder("Checkpoint")
            .field(Field::string("dir"))
            .field(Field::int("every").default(1))
            .build()
            .unwrap();

        Schema::builder("Job")
            .field(Field::int("epochs"))
            .field(Field::nested("checkpoint", &checkpoint).optional())
            .build()
            .unwrap()
    }

    #[test]
    fn training_schema_shape() {
        let schema = training_schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name()).collect();
        assert_eq!(
            names,
            vec!["learning_rate", "epochs", "verbose", "training_dataset"]
        );
        assert!(schema.field("epochs").unwrap().is_optional());
        assert!(!schema.field("learning_rate").unwrap().is_required());
    }

    #[test]
    fn required_schema_shape() {
        let schema = required_schema();
        assert!(schema.field("epochs").unwrap().is_required());
        assert!(schema.field("checkpoint").unwrap().is_optional());
    }
}
