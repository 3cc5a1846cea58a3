// Entity pipeline: ingest rows, generate alternates, resolve collisions, merge and serialize

pub mod generate;
pub mod ingest;
pub mod merge;
pub mod resolve;
pub mod rules;
pub mod serialize;

use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, instrument};

use crate::config::Config;
use crate::error::Result;
use crate::types::total_alternates;

use generate::AlternateGenerator;
use resolve::{Collision, ConflictResolver};
use serialize::OutputFormat;

/// Result of a complete pipeline run
#[derive(Debug, Serialize)]
pub struct PipelineResult {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub rows_filtered: usize,
    pub blank_names: usize,
    pub entities: usize,
    pub alternates_generated: usize,
    pub collisions: Vec<Collision>,
    pub alternates_kept: usize,
    pub merged_entities: usize,
    pub format: OutputFormat,
    pub output_file: PathBuf,
}

pub struct Pipeline;

impl Pipeline {
    /// Run every stage and write the output file. Nothing is written unless all stages succeed.
    #[instrument(skip(config), fields(input = %config.input.display(), format = %config.format))]
    pub fn run(config: &Config) -> Result<PipelineResult> {
        config.validate()?;
        let rules = config.load_rules()?;

        let (mut entities, ingest) =
            ingest::load_entities(&config.input, config.filter.as_ref(), config.has_header)?;

        let generator = AlternateGenerator::new(&rules);
        let alternates_generated = generator.expand_all(&mut entities);
        info!(
            entities = entities.len(),
            generated = alternates_generated,
            "Generated alternates"
        );

        let resolution = ConflictResolver::resolve(&mut entities);
        info!("Processed {} items", entities.len());

        let merged = merge::merge_entities(&entities);
        info!("Merged into {} items", merged.len());

        let document = match config.format {
            OutputFormat::Lookup => serialize::render_lookup(&entities)?,
            OutputFormat::Tabular => serialize::render_tabular(&merged)?,
        };
        serialize::write_output(&config.output, &document)?;
        info!(output = %config.output.display(), bytes = document.len(), "Wrote entities");

        Ok(PipelineResult {
            rows_read: ingest.rows_read,
            rows_kept: ingest.rows_kept,
            rows_filtered: ingest.rows_filtered,
            blank_names: ingest.blank_names,
            entities: entities.len(),
            alternates_generated,
            collisions: resolution.collisions,
            alternates_kept: total_alternates(&entities),
            merged_entities: merged.len(),
            format: config.format,
            output_file: config.output.clone(),
        })
    }
}
