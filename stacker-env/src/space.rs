//! Observation and action spaces.
//!
//! Spaces are declared once, when the environment is built, from the
//! observation modality and the action encoding. They never change afterwards.
use crate::StackerObs;
use serde::{Deserialize, Serialize};

/// Element type of the arrays in a [`Space`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DType {
    /// Unsigned bytes.
    U8,
    /// 32-bit floats.
    F32,
    /// 32-bit signed integers.
    I32,
}

/// A space of observations or actions.
#[derive(Clone, Debug, PartialEq)]
pub enum Space {
    /// An array of the given shape whose elements lie in `[low, high]`.
    Box {
        /// Lower bound of every element.
        low: f32,
        /// Upper bound of every element.
        high: f32,
        /// Shape of the array.
        shape: Vec<usize>,
        /// Element type.
        dtype: DType,
    },

    /// A vector of categorical values; element `i` lies in `0..nvec[i]`.
    MultiDiscrete(Vec<i32>),

    /// A labeled bundle of spaces.
    Dict(Vec<(String, Space)>),
}

impl Space {
    /// Shape of the arrays in the space.
    ///
    /// A [`Space::Dict`] has no shape on its own, so an empty vector is returned.
    pub fn shape(&self) -> Vec<usize> {
        match self {
            Self::Box { shape, .. } => shape.clone(),
            Self::MultiDiscrete(nvec) => vec![nvec.len()],
            Self::Dict(_) => vec![],
        }
    }

    /// Element type of the arrays in the space.
    pub fn dtype(&self) -> Option<DType> {
        match self {
            Self::Box { dtype, .. } => Some(*dtype),
            Self::MultiDiscrete(_) => Some(DType::I32),
            Self::Dict(_) => None,
        }
    }

    /// Returns the subspace of the given key in a [`Space::Dict`].
    pub fn get(&self, key: &str) -> Option<&Space> {
        match self {
            Self::Dict(spaces) => spaces.iter().find(|(k, _)| k == key).map(|(_, s)| s),
            _ => None,
        }
    }

    /// Returns `true` if `obs` has the shape, element type and bounds of the space.
    pub fn contains(&self, obs: &StackerObs) -> bool {
        match (self, obs) {
            (Self::Box { .. }, StackerObs::Vector(v)) => {
                self.admits(DType::F32, v.shape(), v.iter().copied())
            }
            (Self::Box { .. }, StackerObs::Visual(img)) => {
                self.admits(DType::U8, img.shape(), img.iter().map(|x| *x as f32))
            }
            (Self::Dict(_), StackerObs::Both { visual, vector }) => {
                let visual_ok = self.get(crate::VISUAL_OBS_KEY).map_or(false, |s| {
                    s.admits(DType::F32, visual.shape(), visual.iter().copied())
                });
                let vector_ok = self.get(crate::VECTOR_OBS_KEY).map_or(false, |s| {
                    s.admits(DType::F32, vector.shape(), vector.iter().copied())
                });
                visual_ok && vector_ok
            }
            _ => false,
        }
    }

    fn admits(&self, dt: DType, sh: &[usize], mut values: impl Iterator<Item = f32>) -> bool {
        match self {
            Self::Box {
                low,
                high,
                shape,
                dtype,
            } => *dtype == dt && shape.as_slice() == sh && values.all(|x| *low <= x && x <= *high),
            _ => false,
        }
    }
}
