//! Diagnostic records attached to environment steps.
//!
//! A [`Record`] is a container of key/value pairs. Environments return one
//! from every call of [`Env::step`](crate::Env::step), filled by the
//! observation and action conversions, so a training loop can log what the
//! environment actually did without knowing its internals.
//!
//! ```rust
//! use stacker_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("reward", RecordValue::Scalar(-1.0));
//! record.insert("act", RecordValue::Array1(vec![0.0, 0.5]));
//! assert_eq!(record.get_scalar("reward").unwrap(), -1.0);
//! ```
mod base;
pub use base::{Record, RecordValue};
