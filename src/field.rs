//! Field codecs: one named, possibly repeated field of a message.
//!
//! A field owns its wire configuration (array length, source binding,
//! algorithm list) and a concrete kind that fixes the per-element bit
//! representation. Elements are packed with the key/array convention: the
//! element at index 0 (the "key") is appended last, so it always occupies
//! the least-significant `calc_size()` bits of the stream regardless of the
//! array length. A receiver can recover just the key by reading the final
//! element-width bits.

use crate::algorithm::AlgorithmRegistry;
use crate::bits::BitBuffer;
use crate::error::{CodecError, ConfigError};
use crate::header::HeaderKind;
use crate::value::{Value, ValueMap};
use std::fmt;

/// Smallest bit width able to distinguish `n` codes.
pub(crate) fn ceil_log2(n: u64) -> usize {
    if n <= 1 {
        0
    } else {
        (64 - (n - 1).leading_zeros()) as usize
    }
}

/// Bounded integer: codes `1..=(max-min+1)` carry `min..=max`, code 0 is
/// the absent value.
#[derive(Debug, Clone)]
pub struct IntConfig {
    pub min: i64,
    pub max: i64,
}

/// Fixed-point float: scaled by `10^precision`, then coded like an integer.
#[derive(Debug, Clone)]
pub struct FloatConfig {
    pub min: f64,
    pub max: f64,
    pub precision: u32,
}

impl FloatConfig {
    fn scale(&self) -> f64 {
        10f64.powi(self.precision as i32)
    }

    fn lo(&self) -> i64 {
        (self.min * self.scale()).round() as i64
    }

    fn hi(&self) -> i64 {
        (self.max * self.scale()).round() as i64
    }
}

/// The closed set of concrete field kinds. The schema loader selects one by
/// name at configuration time; dispatch is by `match`.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Int(IntConfig),
    Float(FloatConfig),
    Bool,
    String { max_length: usize },
    Enum { values: Vec<String> },
    Static { value: String },
    Hex { num_bytes: usize },
    Header(HeaderKind),
}

impl FieldKind {
    /// Kind as named by the schema (`add_field`). Header kinds are built by
    /// the message itself, never by name.
    pub fn from_name(name: &str) -> Result<FieldKind, ConfigError> {
        match name {
            "int" => Ok(FieldKind::Int(IntConfig { min: 0, max: 0 })),
            "float" => Ok(FieldKind::Float(FloatConfig {
                min: 0.0,
                max: 0.0,
                precision: 0,
            })),
            "bool" => Ok(FieldKind::Bool),
            "string" => Ok(FieldKind::String { max_length: 0 }),
            "enum" => Ok(FieldKind::Enum { values: Vec::new() }),
            "static" => Ok(FieldKind::Static {
                value: String::new(),
            }),
            "hex" => Ok(FieldKind::Hex { num_bytes: 0 }),
            other => Err(ConfigError::UnknownFieldKind(other.to_string())),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldKind::Int(_) => "int",
            FieldKind::Float(_) => "float",
            FieldKind::Bool => "bool",
            FieldKind::String { .. } => "string",
            FieldKind::Enum { .. } => "enum",
            FieldKind::Static { .. } => "static",
            FieldKind::Hex { .. } => "hex",
            FieldKind::Header(_) => "header",
        }
    }
}

/// One named field of a message: configuration plus the key/array packing
/// engine over the kind's fixed-width element codec.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    array_length: usize,
    source_var: Option<String>,
    source_key: Option<String>,
    algorithms: Vec<String>,
    kind: FieldKind,
}

impl Field {
    pub fn new(kind: FieldKind) -> Self {
        Field {
            name: String::new(),
            array_length: 1,
            source_var: None,
            source_key: None,
            algorithms: Vec::new(),
            kind,
        }
    }

    /// A canonical header field; its name is the kind's reserved key.
    pub fn header(kind: HeaderKind) -> Self {
        let mut f = Field::new(FieldKind::Header(kind));
        f.name = kind.var_name().to_string();
        f
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn array_length(&self) -> usize {
        self.array_length
    }

    pub fn source_var(&self) -> Option<&str> {
        self.source_var.as_deref()
    }

    pub fn source_key(&self) -> Option<&str> {
        self.source_key.as_deref()
    }

    pub fn algorithms(&self) -> &[String] {
        &self.algorithms
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind.kind_name()
    }

    // configuration setters (schema loader surface)

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn set_array_length(&mut self, len: usize) {
        self.array_length = len.max(1);
    }

    pub fn set_source_var(&mut self, source_var: &str) {
        self.source_var = Some(source_var.to_string());
    }

    pub fn set_source_key(&mut self, source_key: &str) {
        self.source_key = Some(source_key.to_string());
    }

    pub fn set_algorithms(&mut self, algorithms: Vec<String>) {
        self.algorithms = algorithms;
    }

    pub fn set_max(&mut self, max: f64) -> Result<(), ConfigError> {
        match &mut self.kind {
            FieldKind::Int(c) => c.max = max as i64,
            FieldKind::Float(c) => c.max = max,
            _ => return Err(self.unsupported("set_max")),
        }
        Ok(())
    }

    pub fn set_min(&mut self, min: f64) -> Result<(), ConfigError> {
        match &mut self.kind {
            FieldKind::Int(c) => c.min = min as i64,
            FieldKind::Float(c) => c.min = min,
            _ => return Err(self.unsupported("set_min")),
        }
        Ok(())
    }

    pub fn set_precision(&mut self, precision: u32) -> Result<(), ConfigError> {
        match &mut self.kind {
            FieldKind::Float(c) => c.precision = precision,
            _ => return Err(self.unsupported("set_precision")),
        }
        Ok(())
    }

    pub fn set_max_length(&mut self, max_length: usize) -> Result<(), ConfigError> {
        match &mut self.kind {
            FieldKind::String { max_length: m } => *m = max_length,
            _ => return Err(self.unsupported("set_max_length")),
        }
        Ok(())
    }

    pub fn set_num_bytes(&mut self, num_bytes: usize) -> Result<(), ConfigError> {
        match &mut self.kind {
            FieldKind::Hex { num_bytes: n } => *n = num_bytes,
            _ => return Err(self.unsupported("set_num_bytes")),
        }
        Ok(())
    }

    pub fn set_static_val(&mut self, value: &str) -> Result<(), ConfigError> {
        match &mut self.kind {
            FieldKind::Static { value: v } => *v = value.to_string(),
            _ => return Err(self.unsupported("set_static_val")),
        }
        Ok(())
    }

    pub fn add_enum_value(&mut self, value: &str) -> Result<(), ConfigError> {
        match &mut self.kind {
            FieldKind::Enum { values } => values.push(value.to_string()),
            _ => return Err(self.unsupported("add_enum_value")),
        }
        Ok(())
    }

    fn unsupported(&self, setter: &'static str) -> ConfigError {
        ConfigError::UnsupportedSetter {
            field: self.name.clone(),
            kind: self.kind.kind_name(),
            setter,
        }
    }

    /// Adopt the message trigger as source when none was configured, then
    /// run kind-specific validation. Called once from `preprocess()`.
    pub fn initialize(&mut self, trigger_var: &str) -> Result<(), ConfigError> {
        if self.source_var.is_none() && !trigger_var.is_empty() {
            self.source_var = Some(trigger_var.to_string());
        }
        self.initialize_specific()
    }

    fn initialize_specific(&self) -> Result<(), ConfigError> {
        match &self.kind {
            FieldKind::Int(c) => {
                if c.min > c.max {
                    return Err(ConfigError::InvalidBounds {
                        field: self.name.clone(),
                        min: c.min as f64,
                        max: c.max as f64,
                    });
                }
            }
            FieldKind::Float(c) => {
                if c.min > c.max {
                    return Err(ConfigError::InvalidBounds {
                        field: self.name.clone(),
                        min: c.min,
                        max: c.max,
                    });
                }
            }
            FieldKind::String { max_length } => {
                if *max_length == 0 {
                    return Err(self.bad_config("string field needs max_length >= 1"));
                }
            }
            FieldKind::Enum { values } => {
                if values.is_empty() {
                    return Err(self.bad_config("enum field has no values"));
                }
            }
            FieldKind::Hex { num_bytes } => {
                if *num_bytes == 0 {
                    return Err(self.bad_config("hex field needs num_bytes >= 1"));
                }
            }
            FieldKind::Bool | FieldKind::Static { .. } | FieldKind::Header(_) => {}
        }
        Ok(())
    }

    fn bad_config(&self, reason: &str) -> ConfigError {
        ConfigError::BadFieldConfig {
            field: self.name.clone(),
            reason: reason.to_string(),
        }
    }

    /// Fixed bit width of one array element, from configuration alone.
    pub fn calc_size(&self) -> usize {
        match &self.kind {
            FieldKind::Int(c) => ceil_log2((c.max - c.min) as u64 + 2),
            FieldKind::Float(c) => ceil_log2((c.hi() - c.lo()) as u64 + 2),
            FieldKind::Bool => 2,
            FieldKind::String { max_length } => max_length * 8,
            FieldKind::Enum { values } => ceil_log2(values.len() as u64 + 1),
            FieldKind::Static { .. } => 0,
            FieldKind::Hex { num_bytes } => num_bytes * 8,
            FieldKind::Header(h) => h.calc_size(),
        }
    }

    /// Total bits this field occupies in the body.
    pub fn calc_total_size(&self) -> usize {
        self.calc_size() * self.array_length
    }

    /// Encode this field's contribution into the running bit buffer.
    ///
    /// Elements 1..N go in first (index order, each left-shifted into the
    /// buffer), then the key element (index 0) last, landing in the low bits.
    pub fn var_encode(
        &self,
        vals: &mut ValueMap,
        bits: &mut BitBuffer,
        algorithms: &AlgorithmRegistry,
    ) -> Result<(), CodecError> {
        // every field carries the full element count, blank slots included
        vals.entry(self.name.clone())
            .or_default()
            .resize(self.array_length, Value::Absent);

        // copy so transforms rewrite elements without disturbing the mapping
        // other fields' algorithms read from
        let mut elems = vals[&self.name].clone();
        for (i, elem) in elems.iter_mut().enumerate() {
            for alg in &self.algorithms {
                *elem = algorithms.apply(alg, elem, i, vals)?;
            }
        }

        let key = elems[0].clone();
        for elem in &elems[1..] {
            self.encode_element(elem, bits)?;
        }
        // the key goes on last so it sits in the low-order bits
        self.encode_element(&key, bits)
    }

    fn encode_element(&self, val: &Value, bits: &mut BitBuffer) -> Result<(), CodecError> {
        bits.shl(self.calc_size());
        let add = self.encode_specific(val)?;
        bits.or_low(&add);
        Ok(())
    }

    /// Decode this field's contribution, consuming from the low-order end:
    /// the key first, then elements N-1 down to 1.
    pub fn var_decode(&self, vals: &mut ValueMap, bits: &mut BitBuffer) -> Result<(), CodecError> {
        let width = self.calc_size();
        let mut out = vec![Value::Absent; self.array_length];
        let mut key = Value::Absent;
        for i in (1..=self.array_length).rev() {
            let chunk = bits.low_bits(width);
            bits.shr(width);
            let val = self.decode_specific(&chunk)?;
            if i == self.array_length {
                key = val;
            } else {
                out[i] = val;
            }
        }
        out[0] = key;
        vals.insert(self.name.clone(), out);
        Ok(())
    }

    fn out_of_range(&self, val: &Value) -> CodecError {
        CodecError::OutOfRange {
            field: self.name.clone(),
            value: val.to_string(),
        }
    }

    /// Produce exactly `calc_size()` bits for one element.
    fn encode_specific(&self, val: &Value) -> Result<BitBuffer, CodecError> {
        let width = self.calc_size();
        match &self.kind {
            FieldKind::Int(c) => match val.as_i64() {
                None => Ok(BitBuffer::new(width)),
                Some(i) if i < c.min || i > c.max => Err(self.out_of_range(val)),
                Some(i) => Ok(BitBuffer::from_u64((i - c.min) as u64 + 1, width)),
            },
            FieldKind::Float(c) => match val.as_f64() {
                None => Ok(BitBuffer::new(width)),
                Some(f) => {
                    let code = (f * c.scale()).round() as i64;
                    if code < c.lo() || code > c.hi() {
                        return Err(self.out_of_range(val));
                    }
                    Ok(BitBuffer::from_u64((code - c.lo()) as u64 + 1, width))
                }
            },
            FieldKind::Bool => match val.as_bool() {
                None => Ok(BitBuffer::new(width)),
                Some(b) => Ok(BitBuffer::from_u64(b as u64 + 1, width)),
            },
            FieldKind::String { max_length } => {
                if val.is_absent() {
                    return Ok(BitBuffer::new(width));
                }
                let s = val.to_string();
                if s.len() > *max_length {
                    return Err(self.out_of_range(val));
                }
                // first character most significant; unused tail stays zero
                // so short strings render as strippable trailing zero bytes
                let mut padded = s.into_bytes();
                padded.resize(*max_length, 0);
                Ok(BitBuffer::from_bytes(&padded))
            }
            FieldKind::Enum { values } => match val {
                Value::Absent => Ok(BitBuffer::new(width)),
                _ => {
                    let s = val.to_string();
                    match values.iter().position(|v| *v == s) {
                        Some(i) => Ok(BitBuffer::from_u64(i as u64 + 1, width)),
                        None => Err(self.out_of_range(val)),
                    }
                }
            },
            FieldKind::Static { .. } => Ok(BitBuffer::new(0)),
            FieldKind::Hex { num_bytes } => match val {
                Value::Absent => Ok(BitBuffer::new(width)),
                Value::Int(i) => Ok(BitBuffer::from_u64(*i as u64, width)),
                _ => {
                    let s = val.to_string();
                    let bytes = parse_hex(&s).ok_or_else(|| self.out_of_range(val))?;
                    if bytes.len() != *num_bytes {
                        return Err(self.out_of_range(val));
                    }
                    Ok(BitBuffer::from_bytes(&bytes))
                }
            },
            FieldKind::Header(h) => Ok(h.encode_element(val)),
        }
    }

    /// Inverse of `encode_specific`. Codes outside the configured range
    /// decode to the absent value rather than failing.
    fn decode_specific(&self, bits: &BitBuffer) -> Result<Value, CodecError> {
        match &self.kind {
            FieldKind::Int(c) => {
                let code = bits.as_u64();
                if code == 0 || code > (c.max - c.min) as u64 + 1 {
                    Ok(Value::Absent)
                } else {
                    Ok(Value::Int(c.min + (code - 1) as i64))
                }
            }
            FieldKind::Float(c) => {
                let code = bits.as_u64();
                if code == 0 || code > (c.hi() - c.lo()) as u64 + 1 {
                    Ok(Value::Absent)
                } else {
                    Ok(Value::Float((c.lo() + (code - 1) as i64) as f64 / c.scale()))
                }
            }
            FieldKind::Bool => match bits.as_u64() {
                1 => Ok(Value::Bool(false)),
                2 => Ok(Value::Bool(true)),
                _ => Ok(Value::Absent),
            },
            FieldKind::String { .. } => {
                let mut bytes = bits.to_bytes();
                while bytes.last() == Some(&0) {
                    bytes.pop();
                }
                if bytes.is_empty() {
                    Ok(Value::Absent)
                } else {
                    Ok(Value::String(String::from_utf8_lossy(&bytes).into_owned()))
                }
            }
            FieldKind::Enum { values } => {
                let code = bits.as_u64() as usize;
                if code == 0 || code > values.len() {
                    Ok(Value::Absent)
                } else {
                    Ok(Value::String(values[code - 1].clone()))
                }
            }
            FieldKind::Static { value } => Ok(Value::String(value.clone())),
            FieldKind::Hex { .. } => {
                let bytes = bits.to_bytes();
                let mut s = String::with_capacity(bytes.len() * 2);
                for b in &bytes {
                    s.push_str(&format!("{:02x}", b));
                }
                Ok(Value::String(s))
            }
            FieldKind::Header(h) => Ok(h.decode_element(bits)),
        }
    }
}

fn parse_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\t{} ({}):", self.name, self.kind.kind_name())?;
        if !self.algorithms.is_empty() {
            writeln!(f, "\t\talgorithm(s): {}", self.algorithms.join(", "))?;
        }
        if let Some(src) = &self.source_var {
            write!(f, "\t\tsource: {{{}}}", src)?;
            if let Some(key) = &self.source_key {
                write!(f, " key: {}", key)?;
            }
            writeln!(f)?;
        }
        if self.array_length > 1 {
            writeln!(f, "\t\tarray length: {}", self.array_length)?;
        }
        match &self.kind {
            FieldKind::Int(c) => writeln!(f, "\t\tbounds: [{}, {}]", c.min, c.max)?,
            FieldKind::Float(c) => writeln!(
                f,
                "\t\tbounds: [{}, {}] precision: {}",
                c.min, c.max, c.precision
            )?,
            FieldKind::String { max_length } => writeln!(f, "\t\tmax length: {}", max_length)?,
            FieldKind::Enum { values } => writeln!(f, "\t\tvalues: {{{}}}", values.join(", "))?,
            FieldKind::Static { value } => writeln!(f, "\t\tvalue: {}", value)?,
            FieldKind::Hex { num_bytes } => writeln!(f, "\t\tnum bytes: {}", num_bytes)?,
            FieldKind::Bool | FieldKind::Header(_) => {}
        }
        if self.array_length > 1 {
            writeln!(f, "\t\telement size [bits]: [{}]", self.calc_size())?;
        }
        writeln!(f, "\t\ttotal size [bits]: [{}]", self.calc_total_size())
    }
}
