// src/io/mod.rs
pub mod reader;
pub mod writer;

pub use reader::{
    read_band_f32, read_band_typed, read_geo_info, read_index_band, GeoInfo, SceneBands,
    SceneReader,
};
pub use writer::{write_f32, write_fixed_point, write_u8, WriteOptions};
