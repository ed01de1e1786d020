//! Conversion of [`StackerAct`] into simulator actions.
use super::{ActionEncoding, StackerAct, N_BUCKETS};
use crate::{simulator::ActionPayload, StackerEnvError};
use log::debug;
use ndarray::Axis;
use stacker_core::record::{Record, RecordValue};

/// Last action before any action was sent in the episode.
pub const LAST_ACTION_SENTINEL: [f32; 2] = [f32::NEG_INFINITY, f32::NEG_INFINITY];

/// Converts actions of the agent into simulator actions.
///
/// Discrete actions also nudge an accumulator, a continuous placement kept on
/// the environment side: bucket 0 subtracts `epsilon`, bucket 1 keeps the
/// value and bucket 2 adds `epsilon`. The accumulator is not sent to the
/// simulator; the bucket indices are.
///
/// The codec remembers the last action to log actions only when they change.
#[derive(Clone, Debug)]
pub struct ActionCodec {
    encoding: ActionEncoding,
    epsilon: f64,
    accumulator: [f64; 2],
    last_action: [f32; 2],
}

impl ActionCodec {
    /// Creates a codec for the encoding.
    pub fn new(encoding: ActionEncoding, epsilon: f64) -> Self {
        Self {
            encoding,
            epsilon,
            accumulator: [0.0; 2],
            last_action: LAST_ACTION_SENTINEL,
        }
    }

    /// Encoding of the actions accepted by the codec.
    pub fn encoding(&self) -> ActionEncoding {
        self.encoding
    }

    /// Checks that `act` belongs to the action space of the encoding.
    pub fn validate(&self, act: &StackerAct) -> Result<(), StackerEnvError> {
        let ok = match (self.encoding, act) {
            (ActionEncoding::Continuous, StackerAct::Continuous(a)) => a.len() == 2,
            (ActionEncoding::Discrete, StackerAct::Discrete(a)) => {
                a.len() == 2 && a.iter().all(|b| (0..N_BUCKETS).contains(b))
            }
            _ => false,
        };

        if ok {
            Ok(())
        } else {
            Err(StackerEnvError::InvalidAction {
                expected: format!("{:?}", self.encoding.space()),
                got: act.describe(),
            })
        }
    }

    /// Converts a validated action into a simulator action of a single agent.
    ///
    /// The returned [`Record`] has `act` and, for discrete actions,
    /// `act_accumulator`.
    pub fn encode(&mut self, act: &StackerAct) -> (ActionPayload, Record) {
        let values = act.to_vec();
        if self.changed(&values) {
            debug!("Action changed: {:?} -> {:?}", self.last_action, values);
        }
        if let [x, y] = values.as_slice() {
            self.last_action = [*x, *y];
        }

        let mut record = Record::from_slice(&[("act", RecordValue::Array1(values))]);
        let payload = match act {
            StackerAct::Continuous(a) => ActionPayload::Continuous(a.clone().insert_axis(Axis(0))),
            StackerAct::Discrete(a) => {
                for (acc, bucket) in self.accumulator.iter_mut().zip(a.iter()) {
                    *acc += match *bucket {
                        0 => -self.epsilon,
                        2 => self.epsilon,
                        _ => 0.0,
                    };
                }
                record.insert(
                    "act_accumulator",
                    RecordValue::Array1(self.accumulator.iter().map(|x| *x as f32).collect()),
                );
                ActionPayload::Discrete(a.clone().insert_axis(Axis(0)))
            }
        };

        (payload, record)
    }

    /// Called at the start of an episode.
    pub fn reset(&mut self) {
        self.accumulator = [0.0; 2];
        self.last_action = LAST_ACTION_SENTINEL;
    }

    /// Called when an episode ended.
    pub fn clear_last_action(&mut self) {
        self.last_action = LAST_ACTION_SENTINEL;
    }

    /// Accumulator of discrete actions; `None` for continuous actions.
    pub fn accumulator(&self) -> Option<[f64; 2]> {
        match self.encoding {
            ActionEncoding::Discrete => Some(self.accumulator),
            ActionEncoding::Continuous => None,
        }
    }

    /// The last action sent in the episode.
    pub fn last_action(&self) -> [f32; 2] {
        self.last_action
    }

    fn changed(&self, values: &[f32]) -> bool {
        !values
            .iter()
            .zip(self.last_action.iter())
            .all(|(a, b)| {
                a == b || (a.is_finite() && b.is_finite() && (a - b).abs() <= 1e-8 + 1e-5 * b.abs())
            })
    }
}
