//! Message orchestration: an ordered field layout packed into a fixed-size
//! frame body, plus the canonical header.
//!
//! A message is configured once by the schema loader (`set_*`, `add_field`),
//! sealed by `preprocess()`, and then reused for any number of encode/decode
//! calls. Encode walks the layout in declaration order; decode walks it in
//! reverse, because the field packed last occupies the lowest bits.

use crate::algorithm::AlgorithmRegistry;
use crate::bits::BitBuffer;
use crate::error::{CodecError, ConfigError};
use crate::field::{Field, FieldKind};
use crate::header::{HeaderKind, NUM_HEADER_BYTES};
use crate::value::{Value, ValueMap};
use std::fmt;
use tracing::debug;

/// A schema-defined fixed-size binary frame: header plus body layout.
#[derive(Debug, Clone)]
pub struct Message {
    name: String,
    id: u32,
    /// Requested total frame size in bytes, header included.
    size: usize,
    trigger_var: String,
    layout: Vec<Field>,
    header: Vec<Field>,
    /// Body bits actually used; computed once by `preprocess()`.
    body_bits: usize,
    ready: bool,
}

impl Message {
    pub fn new() -> Self {
        Message {
            name: String::new(),
            id: 0,
            size: 0,
            trigger_var: String::new(),
            layout: Vec::new(),
            header: HeaderKind::CANONICAL.iter().map(|&h| Field::header(h)).collect(),
            body_bits: 0,
            ready: false,
        }
    }

    // configuration surface (schema loader)

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    pub fn set_size(&mut self, size: usize) {
        self.size = size;
    }

    pub fn set_trigger_var(&mut self, trigger_var: &str) {
        self.trigger_var = trigger_var.to_string();
    }

    /// Append a body field of the named kind. Unknown kinds are a
    /// configuration error.
    pub fn add_field(&mut self, kind: &str) -> Result<(), ConfigError> {
        self.layout.push(Field::new(FieldKind::from_name(kind)?));
        Ok(())
    }

    /// The most recently added body field, for the loader's per-field
    /// setters.
    pub fn last_field_mut(&mut self) -> Option<&mut Field> {
        self.layout.last_mut()
    }

    // accessors

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn trigger_var(&self) -> &str {
        &self.trigger_var
    }

    pub fn layout(&self) -> &[Field] {
        &self.layout
    }

    pub fn header(&self) -> &[Field] {
        &self.header
    }

    pub fn name_present(&self, name: &str) -> bool {
        self.layout.iter().chain(self.header.iter()).any(|f| f.name() == name)
    }

    pub fn head_bytes(&self) -> usize {
        NUM_HEADER_BYTES
    }

    pub fn requested_bytes_total(&self) -> usize {
        self.size
    }

    pub fn requested_bytes_body(&self) -> usize {
        self.size.saturating_sub(NUM_HEADER_BYTES)
    }

    pub fn requested_bits_body(&self) -> usize {
        self.requested_bytes_body() * 8
    }

    pub fn used_bits_body(&self) -> usize {
        self.body_bits
    }

    /// Body bytes on the wire before trailing-zero stripping: used bits
    /// rounded up to whole bytes.
    pub fn used_bytes_body(&self) -> usize {
        self.body_bits.div_ceil(8)
    }

    pub fn used_bytes_total(&self) -> usize {
        NUM_HEADER_BYTES + self.used_bytes_body()
    }

    /// Seal configuration: initialize every field, total the body bits, and
    /// verify the layout fits the requested size. Must run exactly once,
    /// before any encode or decode.
    pub fn preprocess(&mut self) -> Result<(), ConfigError> {
        if self.ready {
            return Err(ConfigError::AlreadyPreprocessed(self.name.clone()));
        }

        let trigger = self.trigger_var.clone();
        self.body_bits = 0;
        for field in &mut self.layout {
            field.initialize(&trigger)?;
        }
        for field in &self.layout {
            self.body_bits += field.calc_total_size();
        }
        for field in &mut self.header {
            field.initialize(&trigger)?;
        }

        if self.body_bits > self.requested_bits_body() {
            return Err(ConfigError::Oversize {
                message: self.name.clone(),
                requested_bytes: self.size,
                requested_bits: self.requested_bits_body(),
                used_bits: self.body_bits,
            });
        }

        debug!(
            message = %self.name,
            id = self.id,
            body_bits = self.body_bits,
            body_bytes = self.used_bytes_body(),
            "message preprocessed"
        );
        self.ready = true;
        Ok(())
    }

    fn check_ready(&self) -> Result<(), CodecError> {
        if self.ready {
            Ok(())
        } else {
            Err(CodecError::NotPreprocessed(self.name.clone()))
        }
    }

    /// Encode the fixed-width header. Always yields exactly
    /// `NUM_HEADER_BYTES` bytes; the message id fills `_id` when the caller
    /// did not supply one.
    pub fn head_encode(
        &self,
        vals: &mut ValueMap,
        algorithms: &AlgorithmRegistry,
    ) -> Result<Vec<u8>, CodecError> {
        self.check_ready()?;
        let id_slot = vals.entry("_id".to_string()).or_default();
        if id_slot.first().map_or(true, Value::is_absent) {
            *id_slot = vec![Value::Int(self.id as i64)];
        }

        let mut bits = BitBuffer::new(NUM_HEADER_BYTES * 8);
        for field in &self.header {
            field.var_encode(vals, &mut bits, algorithms)?;
        }
        Ok(bits.to_bytes())
    }

    /// Decode the header, consuming fields in reverse declaration order.
    pub fn head_decode(&self, head: &[u8]) -> Result<ValueMap, CodecError> {
        self.check_ready()?;
        let mut padded = head.to_vec();
        padded.resize(NUM_HEADER_BYTES, 0);
        let mut bits = BitBuffer::from_bytes(&padded);
        let mut out = ValueMap::new();
        for field in self.header.iter().rev() {
            field.var_decode(&mut out, &mut bits)?;
        }
        Ok(out)
    }

    /// Encode the body: every layout field in declaration order, rendered
    /// to bytes with all trailing zero bytes stripped. Decode pads them
    /// back, so the short form is wire-equivalent.
    pub fn body_encode(
        &self,
        vals: &mut ValueMap,
        algorithms: &AlgorithmRegistry,
    ) -> Result<Vec<u8>, CodecError> {
        self.check_ready()?;
        let mut bits = BitBuffer::new(self.used_bytes_body() * 8);
        for field in &self.layout {
            field.var_encode(vals, &mut bits, algorithms)?;
        }
        let mut body = bits.to_bytes();
        while body.last() == Some(&0) {
            body.pop();
        }
        debug!(message = %self.name, bytes = body.len(), "body encoded");
        Ok(body)
    }

    /// Decode the body: zero-pad to the full expected byte count, then pull
    /// fields off in reverse declaration order.
    pub fn body_decode(&self, body: &[u8]) -> Result<ValueMap, CodecError> {
        self.check_ready()?;
        let mut padded = body.to_vec();
        padded.resize(self.used_bytes_body(), 0);
        let mut bits = BitBuffer::from_bytes(&padded);
        let mut out = ValueMap::new();
        for field in self.layout.iter().rev() {
            field.var_decode(&mut out, &mut bits)?;
        }
        debug!(message = %self.name, fields = out.len(), "body decoded");
        Ok(out)
    }
}

impl Default for Message {
    fn default() -> Self {
        Message::new()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "*".repeat(20))?;
        writeln!(f, "message {}: {{{}}}", self.id, self.name)?;
        writeln!(
            f,
            "requested size {{bytes}} [bits]: {{{}}} [{}]",
            self.requested_bytes_total(),
            self.requested_bytes_total() * 8
        )?;
        writeln!(
            f,
            "actual size {{bytes}} [bits]: {{{}}} [{}]",
            self.used_bytes_total(),
            NUM_HEADER_BYTES * 8 + self.used_bits_body()
        )?;
        writeln!(f, ">>>> HEADER <<<<")?;
        for field in &self.header {
            write!(f, "{}", field)?;
        }
        writeln!(f, ">>>> LAYOUT <<<<")?;
        for field in &self.layout {
            write!(f, "{}", field)?;
        }
        writeln!(f, "{}", "*".repeat(20))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_message() -> Message {
        let mut msg = Message::new();
        msg.set_name("status");
        msg.set_id(4);
        msg.set_size(32);
        msg.add_field("int").unwrap();
        {
            let f = msg.last_field_mut().unwrap();
            f.set_name("depth");
            f.set_min(0.0).unwrap();
            f.set_max(1000.0).unwrap();
        }
        msg.preprocess().unwrap();
        msg
    }

    #[test]
    fn preprocess_runs_once() {
        let mut msg = ready_message();
        assert!(matches!(
            msg.preprocess(),
            Err(ConfigError::AlreadyPreprocessed(_))
        ));
    }

    #[test]
    fn encode_before_preprocess_fails() {
        let mut msg = Message::new();
        msg.set_name("early");
        let reg = AlgorithmRegistry::new();
        let mut vals = ValueMap::new();
        assert!(matches!(
            msg.body_encode(&mut vals, &reg),
            Err(CodecError::NotPreprocessed(_))
        ));
    }

    #[test]
    fn unknown_field_kind_rejected() {
        let mut msg = Message::new();
        assert!(matches!(
            msg.add_field("quaternion"),
            Err(ConfigError::UnknownFieldKind(_))
        ));
    }

    #[test]
    fn oversize_detected_at_preprocess() {
        let mut msg = Message::new();
        msg.set_name("toobig");
        msg.set_size(7); // one body byte
        msg.add_field("string").unwrap();
        {
            let f = msg.last_field_mut().unwrap();
            f.set_name("text");
            f.set_max_length(4).unwrap(); // 32 bits > 8
        }
        match msg.preprocess() {
            Err(ConfigError::Oversize { message, used_bits, requested_bits, .. }) => {
                assert_eq!(message, "toobig");
                assert_eq!(used_bits, 32);
                assert_eq!(requested_bits, 8);
            }
            other => panic!("expected Oversize, got {:?}", other),
        }
    }

    #[test]
    fn head_encode_is_fixed_width_and_defaults_id() {
        let msg = ready_message();
        let reg = AlgorithmRegistry::new();
        let mut vals = ValueMap::new();
        vals.insert("_time".to_string(), vec![Value::Int(3600)]);
        let head = msg.head_encode(&mut vals, &reg).unwrap();
        assert_eq!(head.len(), NUM_HEADER_BYTES);

        let out = msg.head_decode(&head).unwrap();
        assert_eq!(out["_id"], vec![Value::Int(4)]);
        assert_eq!(out["_time"], vec![Value::Int(3600)]);
    }
}
