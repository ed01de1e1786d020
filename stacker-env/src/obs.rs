//! Observation of [`StackerEnv`](crate::StackerEnv).
use crate::space::{DType, Space};
use ndarray::{Array1, Array3};
use serde::{Deserialize, Serialize};
use stacker_core::Obs;
mod codec;
pub use codec::ObservationCodec;

/// Key of the image in a bundled observation.
pub const VISUAL_OBS_KEY: &str = "visual_obs";

/// Key of the vector in a bundled observation.
pub const VECTOR_OBS_KEY: &str = "vector_obs";

/// Default shape of image observations, `[height, width, channels]`.
pub const DEFAULT_IMAGE_SHAPE: [usize; 3] = [84, 84, 3];

/// Bounds of the vector observation, the height of the tallest stack.
pub const VECTOR_OBS_BOUNDS: (f32, f32) = (0.0, 4.0);

/// Kind of observation an environment exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObservationModality {
    /// The height of the tallest stack.
    Vector,

    /// A camera image in the raw byte range.
    Visual,

    /// A normalized camera image and the vector, bundled.
    Both,
}

impl ObservationModality {
    /// Number of observation tensors the simulator sends for the modality.
    pub fn n_tensors(&self) -> usize {
        match self {
            Self::Vector | Self::Visual => 1,
            Self::Both => 2,
        }
    }

    /// Declares the observation space of the modality.
    pub fn space(&self, image_shape: [usize; 3]) -> Space {
        let vector = Space::Box {
            low: VECTOR_OBS_BOUNDS.0,
            high: VECTOR_OBS_BOUNDS.1,
            shape: vec![1],
            dtype: DType::F32,
        };

        match self {
            Self::Vector => vector,
            Self::Visual => Space::Box {
                low: 0.0,
                high: 255.0,
                shape: image_shape.to_vec(),
                dtype: DType::U8,
            },
            Self::Both => Space::Dict(vec![
                (
                    VISUAL_OBS_KEY.to_string(),
                    Space::Box {
                        low: 0.0,
                        high: 1.0,
                        shape: image_shape.to_vec(),
                        dtype: DType::F32,
                    },
                ),
                (VECTOR_OBS_KEY.to_string(), vector),
            ]),
        }
    }
}

/// Observation of [`StackerEnv`](crate::StackerEnv).
#[derive(Clone, Debug, PartialEq)]
pub enum StackerObs {
    /// Height of the tallest stack, shape `[1]`.
    Vector(Array1<f32>),

    /// Camera image in `0..=255`.
    Visual(Array3<u8>),

    /// Camera image normalized to `[0, 1]`, and the height of the tallest stack.
    Both {
        /// Normalized camera image.
        visual: Array3<f32>,
        /// Height of the tallest stack.
        vector: Array1<f32>,
    },
}

impl StackerObs {
    /// Returns the vector observation, if the modality carries one.
    pub fn vector(&self) -> Option<f32> {
        match self {
            Self::Vector(v) | Self::Both { vector: v, .. } => v.get(0).copied(),
            Self::Visual(_) => None,
        }
    }

    /// Modality of the observation.
    pub fn modality(&self) -> ObservationModality {
        match self {
            Self::Vector(_) => ObservationModality::Vector,
            Self::Visual(_) => ObservationModality::Visual,
            Self::Both { .. } => ObservationModality::Both,
        }
    }
}

impl Obs for StackerObs {
    fn len(&self) -> usize {
        1
    }
}
