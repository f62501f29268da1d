//! Read-only vector index.
//!
//! Loads a FAISS flat index (`IndexFlatL2` / `IndexFlatIP`, as written by
//! `faiss.write_index`) and answers exact k-nearest-neighbor queries with
//! ndarray. The index is never mutated after load.

use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use ndarray::{Array1, Array2, ArrayView1, Axis};

use crate::core::errors::RagError;

const FOURCC_FLAT: &[u8; 4] = b"IxFl";
const FOURCC_FLAT_L2: &[u8; 4] = b"IxF2";
const FOURCC_FLAT_IP: &[u8; 4] = b"IxFI";

const FAISS_METRIC_INNER_PRODUCT: i32 = 0;
const FAISS_METRIC_L2: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Squared euclidean distance, smaller is closer.
    L2,
    /// Inner product, larger is closer.
    InnerProduct,
}

/// Neighbors in rank order, closest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchHits {
    pub distances: Vec<f32>,
    pub ids: Vec<i64>,
}

impl SearchHits {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct VectorIndex {
    metric: Metric,
    vectors: Array2<f32>,
}

impl VectorIndex {
    /// Build from row-major vectors (`data.len() == count * dimension`).
    pub fn from_vectors(metric: Metric, dimension: usize, data: Vec<f32>) -> Result<Self, RagError> {
        if dimension == 0 {
            return Err(RagError::unavailable("index dimension must be positive"));
        }
        if data.len() % dimension != 0 {
            return Err(RagError::ResourceUnavailable(format!(
                "{} values do not divide into vectors of dimension {}",
                data.len(),
                dimension
            )));
        }

        let count = data.len() / dimension;
        let vectors =
            Array2::from_shape_vec((count, dimension), data).map_err(RagError::unavailable)?;
        Ok(Self { metric, vectors })
    }

    pub fn load(path: &Path) -> Result<Self, RagError> {
        let bytes = fs::read(path)
            .map_err(|e| RagError::ResourceUnavailable(format!("{}: {}", path.display(), e)))?;
        Self::from_faiss_bytes(&bytes)
            .map_err(|e| RagError::ResourceUnavailable(format!("{}: {}", path.display(), e)))
    }

    pub fn from_faiss_bytes(bytes: &[u8]) -> Result<Self, RagError> {
        let mut reader = ByteReader::new(bytes);

        let fourcc = reader.take(4)?;
        if fourcc != FOURCC_FLAT && fourcc != FOURCC_FLAT_L2 && fourcc != FOURCC_FLAT_IP {
            return Err(RagError::ResourceUnavailable(format!(
                "unsupported index type {:?} (only flat indexes are readable)",
                String::from_utf8_lossy(fourcc)
            )));
        }

        let dimension = reader.read_i32()?;
        let ntotal = reader.read_i64()?;
        let _dummy = reader.read_i64()?;
        let _dummy = reader.read_i64()?;
        let _is_trained = reader.read_u8()?;
        let metric_type = reader.read_i32()?;
        if metric_type > 1 {
            let _metric_arg = reader.read_f32()?;
        }

        let metric = match metric_type {
            FAISS_METRIC_L2 => Metric::L2,
            FAISS_METRIC_INNER_PRODUCT => Metric::InnerProduct,
            other => {
                return Err(RagError::ResourceUnavailable(format!(
                    "unsupported metric type {}",
                    other
                )))
            }
        };

        if dimension <= 0 || ntotal < 0 {
            return Err(RagError::ResourceUnavailable(format!(
                "invalid index header: d={} ntotal={}",
                dimension, ntotal
            )));
        }
        let dimension = dimension as usize;
        let ntotal = ntotal as usize;

        let value_count = reader.read_u64()? as usize;
        let expected = dimension
            .checked_mul(ntotal)
            .ok_or_else(|| RagError::unavailable("index size overflows"))?;
        if value_count != expected {
            return Err(RagError::ResourceUnavailable(format!(
                "index holds {} values, header implies {}",
                value_count, expected
            )));
        }

        let raw = reader.take(
            value_count
                .checked_mul(4)
                .ok_or_else(|| RagError::unavailable("index size overflows"))?,
        )?;
        let data: Vec<f32> = raw
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();

        Self::from_vectors(metric, dimension, data)
    }

    pub fn count(&self) -> usize {
        self.vectors.nrows()
    }

    pub fn dimension(&self) -> usize {
        self.vectors.ncols()
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Exact search for the `k` nearest vectors.
    ///
    /// `k` is clamped to `[1, count]`; an empty index yields no hits.
    /// Equal distances are ordered by ascending id.
    pub fn search(&self, query: &[f32], k: usize) -> Result<SearchHits, RagError> {
        if query.len() != self.dimension() {
            return Err(RagError::DimensionMismatch {
                expected: self.dimension(),
                actual: query.len(),
            });
        }

        let count = self.count();
        if count == 0 {
            return Ok(SearchHits::default());
        }
        let k = k.clamp(1, count);

        let query = ArrayView1::from(query);
        let scores: Array1<f32> = match self.metric {
            Metric::L2 => {
                let diff = &self.vectors - &query;
                (&diff * &diff).sum_axis(Axis(1))
            }
            Metric::InnerProduct => self.vectors.dot(&query),
        };

        let mut ranked: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
        let metric = self.metric;
        ranked.sort_by(|left, right| {
            let order = match metric {
                Metric::L2 => left.1.partial_cmp(&right.1),
                Metric::InnerProduct => right.1.partial_cmp(&left.1),
            };
            order
                .unwrap_or(Ordering::Equal)
                .then_with(|| left.0.cmp(&right.0))
        });
        ranked.truncate(k);

        Ok(SearchHits {
            distances: ranked.iter().map(|(_, score)| *score).collect(),
            ids: ranked.iter().map(|(id, _)| *id as i64).collect(),
        })
    }
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], RagError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| {
                RagError::ResourceUnavailable(format!(
                    "index truncated at byte {} (needed {} more)",
                    self.pos, len
                ))
            })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], RagError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn read_u8(&mut self) -> Result<u8, RagError> {
        Ok(self.array::<1>()?[0])
    }

    fn read_i32(&mut self) -> Result<i32, RagError> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    fn read_i64(&mut self) -> Result<i64, RagError> {
        Ok(i64::from_le_bytes(self.array()?))
    }

    fn read_u64(&mut self) -> Result<u64, RagError> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    fn read_f32(&mut self) -> Result<f32, RagError> {
        Ok(f32::from_le_bytes(self.array()?))
    }
}
