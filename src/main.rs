// src/main.rs
use anyhow::{anyhow, Result};
use clap::Parser;
use log::LevelFilter;

use veg_map::cli::{Cli, Commands};
use veg_map::config::PipelineConfig;
use veg_map::io;
use veg_map::pipeline;
use veg_map::processing::indices::{IndexCalculator, NDI};
use veg_map::processing::Classifier;
use veg_map::utils::gdal_ext::TypedBuffer;

fn main() -> Result<()> {
    let cli = Cli::parse();

    pretty_env_logger::formatted_builder()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init();

    match &cli.command {
        Commands::Run { config } => {
            let config = PipelineConfig::load(config)?;
            pipeline::run(&config)?;
            return Ok(());
        }
        Commands::Ndvi { nir, red } => {
            let nir_band = io::read_band_f32(nir)?;
            let red_band = io::read_band_f32(red)?;
            if nir_band.shape() != red_band.shape() {
                return Err(anyhow!(
                    "band shapes differ: {:?} vs {:?}",
                    nir_band.shape(),
                    red_band.shape()
                ));
            }

            let geo_info = io::read_geo_info(nir)?;
            let ndi = NDI::ndvi();
            let inputs = [TypedBuffer::F32(nir_band), TypedBuffer::F32(red_band)];
            let ndvi = ndi
                .calculate(&inputs)
                .into_f32()
                .expect("NDI produces an f32 buffer");

            let options = io::WriteOptions::default();
            if cli.float {
                io::write_f32(&ndvi, &geo_info, &cli.output, ndi.name(), &options)?;
            } else {
                io::write_fixed_point(
                    &ndvi,
                    &geo_info,
                    &cli.output,
                    ndi.name(),
                    cli.scale_factor,
                    &options,
                )?;
            }
        }
        Commands::Classify { ndvi, breaks } => {
            let (index, geo_info) = io::read_index_band(ndvi)?;

            let classifier = match breaks {
                Some(b) => {
                    let breaks: [f32; 3] = b
                        .as_slice()
                        .try_into()
                        .map_err(|_| anyhow!("--breaks needs exactly 3 values"))?;
                    Classifier::new(breaks)?
                }
                None => Classifier::default(),
            };
            let classes = classifier.classify(&index);

            io::write_u8(
                &classes,
                &geo_info,
                &cli.output,
                "NDVI classification",
                &io::WriteOptions::default(),
            )?;
        }
    }

    println!("Processing complete: {}", cli.output.display());
    Ok(())
}
