//! Conversion of simulator tensors into [`StackerObs`].
use super::{ObservationModality, StackerObs};
use log::{trace, warn};
use ndarray::{Array1, Array3, ArrayD, ArrayViewD, Axis, Ix3};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use stacker_core::record::{Record, RecordValue};

/// Bound on the noise added to the vector observation synthesized at reset.
const RESET_NOISE_BOUND: f32 = 0.1;

/// Converts the tensors of a simulator into the declared observation.
///
/// Simulator tensors have the agent axis first. Visual tensors are float images
/// in `[0, 1]` of shape `[n_agents, h, w, c]`, vector tensors have shape
/// `[n_agents, 1]`. Only the first agent is used.
///
/// A tensor that is missing, has no agent or has an unexpected shape is
/// replaced by the fallback of its modality: zeros for images, `0` for the
/// vector. In [`ObservationModality::Both`], each key falls back on its own.
#[derive(Clone, Debug)]
pub struct ObservationCodec {
    modality: ObservationModality,
    image_shape: [usize; 3],
}

impl ObservationCodec {
    /// Creates a codec for the modality and the shape of images.
    pub fn new(modality: ObservationModality, image_shape: [usize; 3]) -> Self {
        Self {
            modality,
            image_shape,
        }
    }

    /// Modality of the observations produced by the codec.
    pub fn modality(&self) -> ObservationModality {
        self.modality
    }

    /// Converts simulator tensors, indexed by modality, into an observation.
    ///
    /// This method never fails. The returned [`Record`] has `obs`, the vector
    /// observation if any, and a flag for every fallback used.
    pub fn decode(&self, raw: &[ArrayD<f32>]) -> (StackerObs, Record) {
        let mut record = Record::empty();

        let obs = match self.modality {
            ObservationModality::Vector => {
                StackerObs::Vector(self.decode_vector(raw.get(0), &mut record))
            }
            ObservationModality::Visual => {
                let visual = self
                    .decode_visual(raw.get(0), &mut record)
                    .map(|img| img.mapv(to_byte))
                    .unwrap_or_else(|| Array3::zeros(self.image_dim()));
                StackerObs::Visual(visual)
            }
            ObservationModality::Both => {
                let visual = self
                    .decode_visual(raw.get(0), &mut record)
                    .unwrap_or_else(|| Array3::zeros(self.image_dim()));
                let vector = self.decode_vector(raw.get(1), &mut record);
                StackerObs::Both { visual, vector }
            }
        };

        if let Some(v) = obs.vector() {
            record.insert("obs", RecordValue::Array1(vec![v]));
        }

        (obs, record)
    }

    /// Observation substituted when the simulator reports nothing for a tick.
    pub fn fallback(&self) -> StackerObs {
        match self.modality {
            ObservationModality::Vector => StackerObs::Vector(Array1::zeros(1)),
            ObservationModality::Visual => StackerObs::Visual(Array3::zeros(self.image_dim())),
            ObservationModality::Both => StackerObs::Both {
                visual: Array3::zeros(self.image_dim()),
                vector: Array1::zeros(1),
            },
        }
    }

    /// Initial observation substituted when the simulator returns none at reset.
    ///
    /// All objects start on the floor, so the vector is `1` plus gaussian noise
    /// with standard deviation `noise_std`, clipped to `[-0.1, 0.1]`.
    /// Images are zeros.
    pub fn reset_fallback<R: Rng>(&self, rng: &mut R, noise_std: f32) -> StackerObs {
        let noise = match Normal::new(0.0, noise_std) {
            Ok(normal) => normal.sample(rng).clamp(-RESET_NOISE_BOUND, RESET_NOISE_BOUND),
            Err(_) => 0.0,
        };
        let vector = Array1::from_elem(1, 1.0 + noise);

        match self.fallback() {
            StackerObs::Vector(_) => StackerObs::Vector(vector),
            StackerObs::Both { visual, .. } => StackerObs::Both { visual, vector },
            visual => visual,
        }
    }

    fn image_dim(&self) -> (usize, usize, usize) {
        let [h, w, c] = self.image_shape;
        (h, w, c)
    }

    fn decode_vector(&self, t: Option<&ArrayD<f32>>, record: &mut Record) -> Array1<f32> {
        match first_agent(t, &[1]) {
            Some(v) => v.iter().copied().collect(),
            None => {
                trace!("No vector observation in the tick, setting it to 0");
                record.insert("fallback_vector", RecordValue::Scalar(1.0));
                Array1::zeros(1)
            }
        }
    }

    fn decode_visual(&self, t: Option<&ArrayD<f32>>, record: &mut Record) -> Option<Array3<f32>> {
        let img = first_agent(t, &self.image_shape)
            .and_then(|v| v.to_owned().into_dimensionality::<Ix3>().ok());
        if img.is_none() {
            trace!("No visual observation in the tick, setting it to black");
            record.insert("fallback_visual", RecordValue::Scalar(1.0));
        }
        img
    }
}

/// Returns the tensor of the first agent if it has the expected shape.
fn first_agent<'a>(t: Option<&'a ArrayD<f32>>, shape: &[usize]) -> Option<ArrayViewD<'a, f32>> {
    let t = t?;
    if t.ndim() == 0 || t.len_of(Axis(0)) == 0 {
        return None;
    }
    let v = t.index_axis(Axis(0), 0);
    if v.shape() == shape {
        Some(v)
    } else {
        warn!(
            "Observation of shape {:?} does not match the declared shape {:?}, ignored",
            v.shape(),
            shape
        );
        None
    }
}

fn to_byte(x: f32) -> u8 {
    (x * 255.0).round().clamp(0.0, 255.0) as u8
}
