//! # dccl-codec — fixed-size frame bit-packing codec
//!
//! Packs heterogeneous, named application values into fixed-size binary
//! frames for severely bandwidth-constrained links (underwater acoustic
//! modems) and unpacks received frames back into named values.
//!
//! A frame is `header ∥ body`: a fixed 6-byte header of eight canonical
//! fields, then a body assembled from an ordered field layout. Fields are
//! packed by left-shifting the body bit buffer and OR-ing each element into
//! the low bits; arrays use the key convention, where the element at index 0
//! is packed last so a receiver can recover it from the final element-width
//! bits alone. Trailing zero bytes are stripped on the wire and padded back
//! before decode.
//!
//! ## Schema DSL
//!
//! ```text
//! message status {
//!     id: 4;
//!     size: 32;
//!     int depth { min: 0; max: 6000; }
//!     float temperature { min: -5.0; max: 40.0; precision: 1; }
//!     enum mode { values: [transit, survey, loiter]; }
//! }
//! ```
//!
//! ## Usage
//!
//! ```
//! use dccl_codec::{parse, encode_frame, decode_frame, AlgorithmRegistry, Value, ValueMap};
//!
//! let mut messages = parse(
//!     "message depth_report { id: 1; size: 16; int depth { min: 0; max: 1000; } }",
//! )?;
//! let msg = messages.remove(0);
//! let registry = AlgorithmRegistry::new();
//!
//! let mut vals = ValueMap::new();
//! vals.insert("depth".to_string(), vec![Value::Int(451)]);
//! vals.insert("_time".to_string(), vec![Value::Int(3600)]);
//!
//! let frame = encode_frame(&msg, &mut vals, &registry)?;
//! let out = decode_frame(&msg, &frame)?;
//! assert_eq!(out["depth"], vec![Value::Int(451)]);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod algorithm;
pub mod bits;
pub mod error;
pub mod field;
pub mod frame;
pub mod header;
pub mod message;
pub mod parser;
pub mod value;

pub use algorithm::{AlgorithmRegistry, UnknownAlgorithmPolicy};
pub use bits::BitBuffer;
pub use error::{CodecError, ConfigError};
pub use field::{Field, FieldKind};
pub use frame::{decode_frame, encode_frame};
pub use header::{HeaderKind, NUM_HEADER_BYTES};
pub use message::Message;
pub use parser::{parse, parse_file};
pub use value::{Value, ValueMap};
