// Example runner for the `pixel_sorter` library.
//
// Usage: pixel_sorter <input_image> <output_image> [pipeline.json]
//
// Decoding and encoding go through the `image` crate; the output format follows the
// output file extension. Without a recipe file the default two-pass recipe is used.
// Set RUST_LOG=debug to see every pass.

use anyhow::{Context, Result, bail};
use log::info;
use pixel_sorter::{PipelineConfig, SortPipeline};
use std::env;
use std::fs;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        println!("Usage: pixel_sorter <input_image> <output_image> [pipeline.json]");
        return Ok(());
    }
    let input_path = &args[1];
    let output_path = &args[2];

    let config = match args.get(3) {
        Some(recipe_path) => {
            let json = fs::read_to_string(recipe_path)
                .with_context(|| format!("reading pipeline recipe {recipe_path}"))?;
            PipelineConfig::from_json(&json)
                .with_context(|| format!("parsing pipeline recipe {recipe_path}"))?
        }
        None => PipelineConfig::default(),
    };
    if config.passes.is_empty() {
        bail!("pipeline recipe has no passes");
    }

    let image = image::open(input_path)
        .with_context(|| format!("decoding {input_path}"))?
        .to_rgb8();
    let (width, height) = image.dimensions();
    info!("loaded {input_path} ({width}x{height}), running {} passes", config.passes.len());
    for (index, pass) in config.passes.iter().enumerate() {
        info!(
            "pass {}: {:?} {:?}-mask threshold={} min_len={} sort={:?} reverse={} reuse_mask={}",
            index + 1,
            pass.direction,
            pass.params.mask_kind,
            pass.params.threshold,
            pass.params.min_segment_len,
            pass.params.sort_kind,
            pass.params.reverse,
            pass.reuse_previous_mask,
        );
    }

    let sorted = SortPipeline::new(config).run(&image)?;

    sorted
        .save(output_path)
        .with_context(|| format!("encoding {output_path}"))?;
    println!("Saved to {output_path}");
    Ok(())
}
