//! NNUE network weights and output layer.
//!
//! Implements a (768 -> 128) x 2 perspectives -> 1 architecture with:
//! - Little-endian i16 weight blob, size checked before use
//! - `SCReLU` activation
//!
//! Blob layout, in order: feature rows `[INPUT_SIZE][HIDDEN_SIZE]`,
//! feature bias `[HIDDEN_SIZE]`, output weights `[2][HIDDEN_SIZE]`
//! (side to move first), output bias, then zero padding up to a
//! 64-byte boundary.

use std::fmt;
use std::path::Path;

use super::accumulator::Accumulator;
use super::simd;
use super::{QA, QB, SCALE};
use crate::error::NetworkError;

/// Input feature size: 64 squares × 6 piece types × 2 colors
pub const INPUT_SIZE: usize = 768;

/// Hidden layer size (must match trained network)
pub const HIDDEN_SIZE: usize = 128;

const BLOB_ALIGN: usize = 64;

const PAYLOAD_BYTES: usize =
    (INPUT_SIZE * HIDDEN_SIZE + HIDDEN_SIZE + 2 * HIDDEN_SIZE + 1) * std::mem::size_of::<i16>();

/// Exact byte size of a valid weight blob.
pub const NETWORK_BYTES: usize = PAYLOAD_BYTES.div_ceil(BLOB_ALIGN) * BLOB_ALIGN;

const _: () = assert!(NETWORK_BYTES == 197_440);

/// Immutable NNUE network weights.
///
/// Loaded once and shared read-only (typically behind an `Arc`) by every
/// evaluation context.
pub struct Network {
    /// Feature transformer weights, `INPUT_SIZE` rows
    feature_weights: Box<[[i16; HIDDEN_SIZE]]>,
    /// Feature transformer biases
    feature_bias: [i16; HIDDEN_SIZE],
    /// Output weights: `[0]` side to move, `[1]` side not to move
    output_weights: [[i16; HIDDEN_SIZE]; 2],
    output_bias: i16,
}

impl Network {
    /// Parse a network from a raw weight blob.
    ///
    /// # Errors
    /// Returns [`NetworkError::SizeMismatch`] unless `data` is exactly
    /// [`NETWORK_BYTES`] long.
    pub fn from_bytes(data: &[u8]) -> Result<Self, NetworkError> {
        if data.len() != NETWORK_BYTES {
            log::error!(
                "rejecting network blob: {} bytes, expected {NETWORK_BYTES}",
                data.len()
            );
            return Err(NetworkError::SizeMismatch {
                expected: NETWORK_BYTES,
                found: data.len(),
            });
        }

        let mut words = data[..PAYLOAD_BYTES]
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]));

        let mut feature_weights = vec![[0i16; HIDDEN_SIZE]; INPUT_SIZE].into_boxed_slice();
        for row in feature_weights.iter_mut() {
            fill(row, &mut words);
        }

        let mut feature_bias = [0i16; HIDDEN_SIZE];
        fill(&mut feature_bias, &mut words);

        let mut output_weights = [[0i16; HIDDEN_SIZE]; 2];
        for row in &mut output_weights {
            fill(row, &mut words);
        }

        let output_bias = words.next().unwrap_or_default();

        Ok(Self {
            feature_weights,
            feature_bias,
            output_weights,
            output_bias,
        })
    }

    /// Load network from a weight file.
    ///
    /// # Errors
    /// Fails if the file cannot be read or has the wrong size.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, NetworkError> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let network = Self::from_bytes(&data)?;
        log::info!("loaded network from {} ({} bytes)", path.display(), data.len());
        Ok(network)
    }

    /// Serialize back into the blob layout accepted by [`Network::from_bytes`].
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(NETWORK_BYTES);
        let rows = self
            .feature_weights
            .iter()
            .chain(std::iter::once(&self.feature_bias))
            .chain(self.output_weights.iter());
        for row in rows {
            for v in row {
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
        out.extend_from_slice(&self.output_bias.to_le_bytes());
        out.resize(NETWORK_BYTES, 0);
        out
    }

    #[inline]
    #[must_use]
    pub fn feature_bias(&self) -> &[i16; HIDDEN_SIZE] {
        &self.feature_bias
    }

    /// Weight row for one input feature.
    #[inline]
    #[must_use]
    pub fn feature_row(&self, feature: usize) -> &[i16; HIDDEN_SIZE] {
        &self.feature_weights[feature]
    }

    #[inline]
    #[must_use]
    pub fn output_bias(&self) -> i16 {
        self.output_bias
    }

    /// Score the accumulator pair in centipawns from the perspective of
    /// the side whose accumulator is `us`.
    ///
    /// Division order is fixed: `/ QA`, add bias, `* SCALE`, `/ (QA * QB)`,
    /// each division truncating toward zero.
    #[inline]
    #[must_use]
    pub fn evaluate(&self, us: &Accumulator, them: &Accumulator) -> i32 {
        let mut output = simd::screlu_dot(us.values(), &self.output_weights[0])
            + simd::screlu_dot(them.values(), &self.output_weights[1]);

        output /= i64::from(QA);
        output += i64::from(self.output_bias);
        output *= i64::from(SCALE);
        output /= i64::from(QA) * i64::from(QB);

        output as i32
    }
}

fn fill(row: &mut [i16; HIDDEN_SIZE], words: &mut impl Iterator<Item = i16>) {
    for (slot, w) in row.iter_mut().zip(words) {
        *slot = w;
    }
}

impl fmt::Debug for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Network")
            .field("inputs", &self.feature_weights.len())
            .field("hidden", &HIDDEN_SIZE)
            .field("output_bias", &self.output_bias)
            .finish_non_exhaustive()
    }
}

/// Embedded default network, staged into `OUT_DIR` by the build script
#[cfg(embedded_net)]
static EMBEDDED_NETWORK: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/embedded.nnue"));

#[cfg(embedded_net)]
static EMBEDDED: once_cell::sync::OnceCell<std::sync::Arc<Network>> =
    once_cell::sync::OnceCell::new();

#[cfg(feature = "embedded_nnue")]
impl Network {
    /// The network compiled into the binary, parsed on first use.
    ///
    /// # Errors
    /// Returns [`NetworkError::Missing`] if the crate was built without a
    /// weight file.
    #[cfg(embedded_net)]
    pub fn embedded() -> Result<std::sync::Arc<Network>, NetworkError> {
        EMBEDDED
            .get_or_try_init(|| {
                let network = Network::from_bytes(EMBEDDED_NETWORK)?;
                log::info!("loaded embedded network ({} bytes)", EMBEDDED_NETWORK.len());
                Ok(std::sync::Arc::new(network))
            })
            .map(std::sync::Arc::clone)
    }

    /// The network compiled into the binary, parsed on first use.
    ///
    /// # Errors
    /// Returns [`NetworkError::Missing`] if the crate was built without a
    /// weight file.
    #[cfg(not(embedded_net))]
    pub fn embedded() -> Result<std::sync::Arc<Network>, NetworkError> {
        log::error!("built with embedded_nnue but no weight file was staged");
        Err(NetworkError::Missing)
    }
}
