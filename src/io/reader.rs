// src/io/reader.rs
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Result};
use flume::{Receiver, Sender};
use gdal::raster::{Buffer, GdalDataType};
use gdal::Dataset;
use parking_lot::Mutex;

use crate::catalog::Scene;
use crate::processing::mask::SclMask;
use crate::utils::gdal_ext::TypedBuffer;
use crate::NODATA_VALUE_FLOAT;

/// Georeferencing shared by every raster of a run.
#[derive(Clone, Debug)]
pub struct GeoInfo {
    pub projection: String,
    pub geo_transform: [f64; 6],
    pub width: usize,
    pub height: usize,
}

/// The cloud-masked reflectance bands of one scene, ordered as requested.
pub struct SceneBands {
    pub scene_id: String,
    pub bands: Vec<Buffer<f32>>,
}

/// Read the grid geometry of a raster file.
pub fn read_geo_info<P: AsRef<Path>>(path: P) -> Result<GeoInfo> {
    let dataset = Dataset::open(path.as_ref())?;
    let (width, height) = dataset.raster_size();
    let geo_transform = dataset.geo_transform()?;
    Ok(GeoInfo {
        projection: dataset.projection(),
        geo_transform: geo_transform.try_into().unwrap(),
        width,
        height,
    })
}

/// Read band 1 of a single-band raster as f32.
///
/// A nodata value declared on the band is rewritten to the shared float
/// sentinel so every later stage sees one missing-pixel encoding.
pub fn read_band_f32<P: AsRef<Path>>(path: P) -> Result<Buffer<f32>> {
    let dataset = Dataset::open(path.as_ref())?;
    let (width, height) = dataset.raster_size();
    let band = dataset.rasterband(1)?;
    let mut buffer = band.read_as::<f32>((0, 0), (width, height), (width, height), None)?;

    if let Some(nodata) = band.no_data_value() {
        let nodata = nodata as f32;
        if nodata != NODATA_VALUE_FLOAT {
            for value in buffer.data_mut() {
                if *value == nodata {
                    *value = NODATA_VALUE_FLOAT;
                }
            }
        }
    }

    Ok(buffer)
}

/// Read an index raster (float32, or fixed-point int16 written with SCALE
/// metadata) back into float values with the shared nodata sentinel.
pub fn read_index_band<P: AsRef<Path>>(path: P) -> Result<(Buffer<f32>, GeoInfo)> {
    let geo_info = read_geo_info(path.as_ref())?;

    let dataset = Dataset::open(path.as_ref())?;
    let (width, height) = dataset.raster_size();
    let band = dataset.rasterband(1)?;
    let mut buffer = band.read_as::<f32>((0, 0), (width, height), (width, height), None)?;

    let nodata = band.no_data_value().map(|v| v as f32);
    let scale = band.scale().unwrap_or(1.0) as f32;

    for value in buffer.data_mut() {
        if Some(*value) == nodata {
            *value = NODATA_VALUE_FLOAT;
        } else if scale != 1.0 {
            *value *= scale;
        }
    }

    Ok((buffer, geo_info))
}

/// Read band 1 keeping its native integer width where it has one.
///
/// The scene classification layer is Byte with most drivers but UInt16 with
/// some; anything else is read as f32.
pub fn read_band_typed<P: AsRef<Path>>(path: P) -> Result<TypedBuffer> {
    let dataset = Dataset::open(path.as_ref())?;
    let (width, height) = dataset.raster_size();
    let band = dataset.rasterband(1)?;
    let buffer = match band.band_type() {
        GdalDataType::UInt8 => {
            TypedBuffer::U8(band.read_as::<u8>((0, 0), (width, height), (width, height), None)?)
        }
        GdalDataType::UInt16 => {
            TypedBuffer::U16(band.read_as::<u16>((0, 0), (width, height), (width, height), None)?)
        }
        _ => {
            TypedBuffer::F32(band.read_as::<f32>((0, 0), (width, height), (width, height), None)?)
        }
    };
    Ok(buffer)
}

struct SceneReadRequest {
    scene: Scene,
    band_names: Arc<Vec<String>>,
    scl_band: Arc<String>,
}

/// Parallel scene reader.
///
/// A pool of I/O worker threads is fed one request per scene over a flume
/// channel; each worker reads the requested reflectance bands plus the SCL
/// band, applies the cloud mask and hands the masked bands back. The first
/// scene read pins the pixel grid; any scene on a different grid is an
/// input error.
pub struct SceneReader {
    io_threads: usize,
    mask: Arc<SclMask>,
}

impl SceneReader {
    pub fn new(io_threads: Option<usize>, mask: SclMask) -> Self {
        let io_threads = io_threads.unwrap_or_else(|| num_cpus::get().max(2));
        Self {
            io_threads,
            mask: Arc::new(mask),
        }
    }

    /// Read and mask all selected scenes.
    ///
    /// Returns the masked scene bands (in no particular order; compositing
    /// is order-insensitive) and the shared grid geometry.
    pub fn read(
        &self,
        scenes: &[&Scene],
        band_names: &[String],
        scl_band: &str,
    ) -> Result<(Vec<SceneBands>, GeoInfo)> {
        if scenes.is_empty() {
            return Err(anyhow!("no scenes to read"));
        }

        let band_names = Arc::new(band_names.to_vec());
        let scl_band = Arc::new(scl_band.to_string());
        let grid: Arc<Mutex<Option<GeoInfo>>> = Arc::new(Mutex::new(None));

        let (req_tx, req_rx) = flume::unbounded::<SceneReadRequest>();
        let (res_tx, res_rx) = flume::unbounded::<Result<SceneBands>>();

        let workers = self.spawn_workers(req_rx, res_tx, Arc::clone(&grid));

        for scene in scenes {
            let request = SceneReadRequest {
                scene: (*scene).clone(),
                band_names: Arc::clone(&band_names),
                scl_band: Arc::clone(&scl_band),
            };
            req_tx.send(request).expect("reader workers alive");
        }
        drop(req_tx);

        let mut results = Vec::with_capacity(scenes.len());
        let mut first_error = None;
        for result in res_rx {
            match result {
                Ok(bands) => results.push(bands),
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        for worker in workers {
            worker.join().map_err(|_| anyhow!("scene reader worker panicked"))?;
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        let geo_info = grid
            .lock()
            .clone()
            .ok_or_else(|| anyhow!("no scene produced grid geometry"))?;
        Ok((results, geo_info))
    }

    fn spawn_workers(
        &self,
        req_rx: Receiver<SceneReadRequest>,
        res_tx: Sender<Result<SceneBands>>,
        grid: Arc<Mutex<Option<GeoInfo>>>,
    ) -> Vec<JoinHandle<()>> {
        let mut workers = Vec::with_capacity(self.io_threads);
        for _ in 0..self.io_threads {
            let req_rx = req_rx.clone();
            let res_tx = res_tx.clone();
            let grid = Arc::clone(&grid);
            let mask = Arc::clone(&self.mask);

            workers.push(thread::spawn(move || {
                for request in req_rx {
                    let result = read_scene(&request, &mask, &grid);
                    if res_tx.send(result).is_err() {
                        break;
                    }
                }
            }));
        }
        workers
    }
}

fn read_scene(
    request: &SceneReadRequest,
    mask: &SclMask,
    grid: &Mutex<Option<GeoInfo>>,
) -> Result<SceneBands> {
    let scene = &request.scene;

    let first_band_path = scene.band_path(&request.band_names[0])?;
    let geo_info = read_geo_info(first_band_path)?;

    // First scene pins the grid; everyone else must match it
    {
        let mut expected = grid.lock();
        match expected.as_ref() {
            None => *expected = Some(geo_info.clone()),
            Some(g) if g.width == geo_info.width && g.height == geo_info.height => {}
            Some(g) => {
                return Err(anyhow!(
                    "scene {} grid {}x{} does not match catalog grid {}x{}",
                    scene.id,
                    geo_info.width,
                    geo_info.height,
                    g.width,
                    g.height
                ));
            }
        }
    }

    let scl = read_band_typed(scene.band_path(&request.scl_band)?)?;

    let mut bands = Vec::with_capacity(request.band_names.len());
    for name in request.band_names.iter() {
        let mut band = read_band_f32(scene.band_path(name)?)?;
        if band.shape() != (geo_info.width, geo_info.height) {
            return Err(anyhow!(
                "scene {} band {} shape {:?} does not match scene grid",
                scene.id,
                name,
                band.shape()
            ));
        }
        mask.apply(&scl, &mut band)?;
        bands.push(band);
    }

    Ok(SceneBands {
        scene_id: scene.id.clone(),
        bands,
    })
}
