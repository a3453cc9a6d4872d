use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "veg-map")]
#[command(about = "Sentinel-2 median compositing, NDVI and vegetation classification")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output file path (ndvi and classify commands)
    #[arg(short, long, default_value = "output.tif", global = true)]
    pub output: PathBuf,

    /// Use float32 instead of int16
    #[arg(long, global = true)]
    pub float: bool,

    /// Scaling factor for fixed-point
    #[arg(long, default_value = "10000", global = true)]
    pub scale_factor: i32,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline from a JSON configuration
    Run {
        /// Pipeline configuration file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Normalized Difference Vegetation Index: (NIR-RED)/(NIR+RED)
    Ndvi {
        /// NIR band (A)
        #[arg(short = 'a', long)]
        nir: PathBuf,

        /// RED band (B)
        #[arg(short = 'b', long)]
        red: PathBuf,
    },

    /// Classify an NDVI raster into four cover classes
    Classify {
        /// NDVI raster (float32, or fixed-point int16 with SCALE metadata)
        #[arg(short, long)]
        ndvi: PathBuf,

        /// Three ascending class breaks, e.g. 0.0,0.2,0.5
        #[arg(long, value_delimiter = ',', num_args = 3)]
        breaks: Option<Vec<f32>>,
    },
}
