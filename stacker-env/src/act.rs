//! Action of [`StackerEnv`](crate::StackerEnv).
use crate::space::{DType, Space};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use stacker_core::Act;
mod codec;
pub use codec::{ActionCodec, LAST_ACTION_SENTINEL};

/// Number of buckets of each component of a discrete action.
pub const N_BUCKETS: i32 = 3;

/// Default step of the action accumulator per discrete bucket.
pub const DEFAULT_EPSILON: f64 = 1e-4;

/// How the agent encodes where the theme object is placed.
///
/// An action is a pair `(x, y)` on the top surface of the destination object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionEncoding {
    /// A point in `[-1, 1]^2`; `[0, 0]` is the center of the surface.
    Continuous,

    /// A bucket in `{0, 1, 2}` per component, nudging the placement down,
    /// keeping it, or nudging it up.
    Discrete,
}

impl ActionEncoding {
    /// Declares the action space of the encoding.
    pub fn space(&self) -> Space {
        match self {
            Self::Continuous => Space::Box {
                low: -1.0,
                high: 1.0,
                shape: vec![2],
                dtype: DType::F32,
            },
            Self::Discrete => Space::MultiDiscrete(vec![N_BUCKETS, N_BUCKETS]),
        }
    }
}

/// Action of [`StackerEnv`](crate::StackerEnv).
#[derive(Clone, Debug, PartialEq)]
pub enum StackerAct {
    /// A continuous placement.
    Continuous(Array1<f32>),

    /// Discrete bucket indices.
    Discrete(Array1<i32>),
}

impl StackerAct {
    /// Shape and element type, for error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Continuous(a) => format!("F32 array of shape {:?}", a.shape()),
            Self::Discrete(a) => format!("I32 array of shape {:?}", a.shape()),
        }
    }

    /// Values of the action as floats.
    pub fn to_vec(&self) -> Vec<f32> {
        match self {
            Self::Continuous(a) => a.to_vec(),
            Self::Discrete(a) => a.iter().map(|x| *x as f32).collect(),
        }
    }
}

impl Act for StackerAct {
    fn len(&self) -> usize {
        1
    }
}

impl From<[f32; 2]> for StackerAct {
    fn from(a: [f32; 2]) -> Self {
        Self::Continuous(Array1::from(a.to_vec()))
    }
}

impl From<[i32; 2]> for StackerAct {
    fn from(a: [i32; 2]) -> Self {
        Self::Discrete(Array1::from(a.to_vec()))
    }
}
