// src/utils/gdal_ext.rs
use gdal::raster::Buffer;

/// A raster buffer tagged with its pixel type.
///
/// Reflectance bands are read as `F32`; the scene classification layer
/// arrives as `U8` or `U16` depending on the driver; classification output
/// is `U8`.
#[derive(Clone)]
pub enum TypedBuffer {
    U8(Buffer<u8>),
    U16(Buffer<u16>),
    F32(Buffer<f32>),
}

impl TypedBuffer {
    /// Buffer shape as (width, height).
    pub fn shape(&self) -> (usize, usize) {
        match self {
            TypedBuffer::U8(b) => b.shape(),
            TypedBuffer::U16(b) => b.shape(),
            TypedBuffer::F32(b) => b.shape(),
        }
    }

    pub fn len(&self) -> usize {
        let (w, h) = self.shape();
        w * h
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_f32(&self) -> Option<&Buffer<f32>> {
        match self {
            TypedBuffer::F32(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> Option<&Buffer<u8>> {
        match self {
            TypedBuffer::U8(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_u16(&self) -> Option<&Buffer<u16>> {
        match self {
            TypedBuffer::U16(b) => Some(b),
            _ => None,
        }
    }

    pub fn into_f32(self) -> Option<Buffer<f32>> {
        match self {
            TypedBuffer::F32(b) => Some(b),
            _ => None,
        }
    }

    /// Categorical code at a flat pixel index, for integer-typed buffers.
    ///
    /// Returns `None` for float buffers; the scene classification layer is
    /// always integer-coded.
    pub fn code_at(&self, i: usize) -> Option<u16> {
        match self {
            TypedBuffer::U8(b) => b.data().get(i).map(|&v| v as u16),
            TypedBuffer::U16(b) => b.data().get(i).copied(),
            TypedBuffer::F32(_) => None,
        }
    }
}
