//! Composite object model
//!
//! Every composite is an [`Obj`] behind an [`ObjRef`] handle: a payload of
//! kind-specific storage, an own-property table, and an optional proto
//! (the constructive template generic composites are rebuilt from).
//! Identity is the allocation: two handles denote the same composite only
//! if they point at the same cell.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;

use crate::error::{CoreError, CoreResult};
use crate::property::{PropKey, PropTable, Property};
use crate::value::Value;

// ============================================================================
// Keys
// ============================================================================

/// Wrapper type for Value that implements Hash and Eq for use as a map or
/// set key
///
/// Primitives hash and compare by content (NaN equals NaN via canonical
/// bits, −0 is folded into +0); text by content; symbols by ID; functions
/// and composites by allocation identity.
#[derive(Clone, Debug)]
pub struct ValueKey(pub Value);

impl ValueKey {
    fn canonical_bits(n: f64) -> u64 {
        if n.is_nan() {
            f64::NAN.to_bits()
        } else if n == 0.0 {
            0.0f64.to_bits()
        } else {
            n.to_bits()
        }
    }
}

impl Hash for ValueKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.0 {
            Value::Null => 0u8.hash(state),
            Value::Undefined => 1u8.hash(state),
            Value::Bool(b) => {
                2u8.hash(state);
                b.hash(state);
            }
            Value::Number(n) => {
                3u8.hash(state);
                Self::canonical_bits(*n).hash(state);
            }
            Value::Int(i) => {
                4u8.hash(state);
                i.hash(state);
            }
            Value::Text(s) => {
                5u8.hash(state);
                s.hash(state);
            }
            Value::Symbol(s) => {
                6u8.hash(state);
                s.id().hash(state);
            }
            Value::Function(f) => {
                7u8.hash(state);
                f.addr().hash(state);
            }
            Value::Object(o) => {
                8u8.hash(state);
                o.id().hash(state);
            }
        }
    }
}

impl PartialEq for ValueKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.same_value_zero(&other.0)
    }
}

impl Eq for ValueKey {}

// ============================================================================
// Ordered collection storage
// ============================================================================

/// Ordered collection storage with first-class holes
///
/// A slot is either present or a hole; a collection with no holes is dense.
/// Index writes past the end grow the collection, filling with holes.
#[derive(Clone, Debug, Default)]
pub struct ArrayStorage {
    slots: Vec<Option<Value>>,
}

impl ArrayStorage {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collection of `len` holes
    pub fn with_len(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    /// Create a dense collection from values
    pub fn from_values(values: Vec<Value>) -> Self {
        Self {
            slots: values.into_iter().map(Some).collect(),
        }
    }

    /// Collection length, holes included
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the collection has length zero
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether every slot is present
    pub fn is_dense(&self) -> bool {
        self.slots.iter().all(|s| s.is_some())
    }

    /// Element at `index`; `None` for a hole or past the end
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.slots.get(index).and_then(|s| s.as_ref())
    }

    /// Set element at `index`, growing with holes as needed
    pub fn set(&mut self, index: usize, value: Value) {
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }
        self.slots[index] = Some(value);
    }

    /// Append an element, returns new length
    pub fn push(&mut self, value: Value) -> usize {
        self.slots.push(Some(value));
        self.slots.len()
    }

    /// Turn the slot at `index` into a hole
    pub fn delete(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = None;
        }
    }

    /// Iterate slots in order, holes as `None`
    pub fn iter(&self) -> impl Iterator<Item = Option<&Value>> {
        self.slots.iter().map(|s| s.as_ref())
    }
}

// ============================================================================
// Keyed collection storage
// ============================================================================

/// Associative map storage: insertion-ordered entries with a hashed key
/// index
#[derive(Clone, Debug, Default)]
pub struct MapStorage {
    index: FxHashMap<ValueKey, usize>,
    entries: Vec<(Value, Value)>,
}

impl MapStorage {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Set a key/value pair; an existing key keeps its position
    pub fn set(&mut self, key: Value, value: Value) {
        match self.index.get(&ValueKey(key.clone())) {
            Some(&pos) => self.entries[pos].1 = value,
            None => {
                self.index.insert(ValueKey(key.clone()), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    /// Value for `key`, if present
    pub fn get(&self, key: &Value) -> Option<&Value> {
        let pos = *self.index.get(&ValueKey(key.clone()))?;
        Some(&self.entries[pos].1)
    }

    /// Whether `key` is present
    pub fn has(&self, key: &Value) -> bool {
        self.index.contains_key(&ValueKey(key.clone()))
    }

    /// Delete a key, returns true if it existed
    pub fn delete(&mut self, key: &Value) -> bool {
        match self.index.remove(&ValueKey(key.clone())) {
            Some(pos) => {
                self.entries.remove(pos);
                for slot in self.index.values_mut() {
                    if *slot > pos {
                        *slot -= 1;
                    }
                }
                true
            }
            None => false,
        }
    }

    /// Remove all entries
    pub fn clear(&mut self) {
        self.index.clear();
        self.entries.clear();
    }

    /// Iterate entries in insertion order
    pub fn entries(&self) -> impl Iterator<Item = &(Value, Value)> {
        self.entries.iter()
    }
}

/// Set storage: insertion-ordered members with a hashed index
#[derive(Clone, Debug, Default)]
pub struct SetStorage {
    index: FxHashMap<ValueKey, usize>,
    items: Vec<Value>,
}

impl SetStorage {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of members
    pub fn size(&self) -> usize {
        self.items.len()
    }

    /// Whether the set has no members
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add a member; duplicates (by key identity) are ignored
    pub fn add(&mut self, value: Value) {
        if !self.index.contains_key(&ValueKey(value.clone())) {
            self.index.insert(ValueKey(value.clone()), self.items.len());
            self.items.push(value);
        }
    }

    /// Whether `value` is a member
    pub fn has(&self, value: &Value) -> bool {
        self.index.contains_key(&ValueKey(value.clone()))
    }

    /// Delete a member, returns true if it existed
    pub fn delete(&mut self, value: &Value) -> bool {
        match self.index.remove(&ValueKey(value.clone())) {
            Some(pos) => {
                self.items.remove(pos);
                for slot in self.index.values_mut() {
                    if *slot > pos {
                        *slot -= 1;
                    }
                }
                true
            }
            None => false,
        }
    }

    /// Iterate members in insertion order
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.items.iter()
    }
}

// ============================================================================
// Binary storage
// ============================================================================

/// Raw byte buffer
#[derive(Clone, Debug)]
pub struct Buffer {
    /// Raw byte data
    data: Vec<u8>,
}

impl Buffer {
    /// Create a zero-filled buffer of `size` bytes
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0; size],
        }
    }

    /// Create a buffer from existing bytes
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Buffer length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer has zero length
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Byte at `index`
    pub fn get_byte(&self, index: usize) -> Option<u8> {
        self.data.get(index).copied()
    }

    /// Set byte at `index`
    pub fn set_byte(&mut self, index: usize, value: u8) -> CoreResult<()> {
        let len = self.data.len();
        match self.data.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(CoreError::IndexOutOfBounds { index, len }),
        }
    }

    /// 32-bit signed integer at byte `index` (little-endian)
    pub fn get_int32(&self, index: usize) -> Option<i32> {
        let bytes = self.data.get(index..index + 4)?;
        Some(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Set 32-bit signed integer at byte `index` (little-endian)
    pub fn set_int32(&mut self, index: usize, value: i32) -> CoreResult<()> {
        if index + 4 > self.data.len() {
            return Err(CoreError::IndexOutOfBounds {
                index,
                len: self.data.len(),
            });
        }
        self.data[index..index + 4].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// The raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// A windowed view over a byte buffer composite
///
/// The view holds the buffer by reference; reads and writes go through it,
/// offset by the view's start.
#[derive(Clone, Debug)]
pub struct ViewObject {
    /// The backing buffer composite (payload must be [`Payload::Buffer`])
    pub buffer: ObjRef,
    /// Start of the window, in bytes
    pub byte_offset: usize,
    /// Length of the window, in bytes
    pub byte_length: usize,
}

impl ViewObject {
    /// Create a view over `buffer`, validating the range
    pub fn new(buffer: ObjRef, byte_offset: usize, byte_length: usize) -> CoreResult<Self> {
        let buffer_len = {
            let obj = buffer.borrow();
            match &obj.payload {
                Payload::Buffer(b) => b.len(),
                _ => return Err(CoreError::NotABuffer),
            }
        };
        if byte_offset + byte_length > buffer_len {
            return Err(CoreError::ViewOutOfBounds {
                offset: byte_offset,
                length: byte_length,
                buffer_len,
            });
        }
        Ok(Self {
            buffer,
            byte_offset,
            byte_length,
        })
    }

    fn check(&self, offset: usize, width: usize) -> CoreResult<usize> {
        if offset + width > self.byte_length {
            return Err(CoreError::IndexOutOfBounds {
                index: offset,
                len: self.byte_length,
            });
        }
        Ok(self.byte_offset + offset)
    }

    /// Byte at view offset
    pub fn get_uint8(&self, offset: usize) -> CoreResult<u8> {
        let at = self.check(offset, 1)?;
        let obj = self.buffer.borrow();
        match &obj.payload {
            Payload::Buffer(b) => Ok(b.as_bytes()[at]),
            _ => Err(CoreError::NotABuffer),
        }
    }

    /// Set byte at view offset
    pub fn set_uint8(&self, offset: usize, value: u8) -> CoreResult<()> {
        let at = self.check(offset, 1)?;
        let mut obj = self.buffer.borrow_mut();
        match &mut obj.payload {
            Payload::Buffer(b) => b.set_byte(at, value),
            _ => Err(CoreError::NotABuffer),
        }
    }

    /// 16-bit signed integer at view offset (little-endian)
    pub fn get_int16(&self, offset: usize) -> CoreResult<i16> {
        let at = self.check(offset, 2)?;
        let obj = self.buffer.borrow();
        match &obj.payload {
            Payload::Buffer(b) => {
                let bytes = b.as_bytes();
                Ok(i16::from_le_bytes([bytes[at], bytes[at + 1]]))
            }
            _ => Err(CoreError::NotABuffer),
        }
    }

    /// Set 16-bit signed integer at view offset (little-endian)
    pub fn set_int16(&self, offset: usize, value: i16) -> CoreResult<()> {
        let at = self.check(offset, 2)?;
        let mut obj = self.buffer.borrow_mut();
        match &mut obj.payload {
            Payload::Buffer(b) => {
                let bytes = value.to_le_bytes();
                b.set_byte(at, bytes[0])?;
                b.set_byte(at + 1, bytes[1])
            }
            _ => Err(CoreError::NotABuffer),
        }
    }
}

// ============================================================================
// Fixed-width numeric arrays
// ============================================================================

/// Element lane of a fixed-width numeric array
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum ElementKind {
    Int8,
    Uint8,
    Uint8Clamped,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
    Float64,
    BigInt64,
    BigUint64,
}

impl ElementKind {
    /// Lane width in bytes
    pub fn width(&self) -> usize {
        match self {
            ElementKind::Int8 | ElementKind::Uint8 | ElementKind::Uint8Clamped => 1,
            ElementKind::Int16 | ElementKind::Uint16 => 2,
            ElementKind::Int32 | ElementKind::Uint32 | ElementKind::Float32 => 4,
            ElementKind::Float64 | ElementKind::BigInt64 | ElementKind::BigUint64 => 8,
        }
    }

    /// Lane name for diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Int8 => "i8",
            ElementKind::Uint8 => "u8",
            ElementKind::Uint8Clamped => "u8c",
            ElementKind::Int16 => "i16",
            ElementKind::Uint16 => "u16",
            ElementKind::Int32 => "i32",
            ElementKind::Uint32 => "u32",
            ElementKind::Float32 => "f32",
            ElementKind::Float64 => "f64",
            ElementKind::BigInt64 => "i64",
            ElementKind::BigUint64 => "u64",
        }
    }
}

/// Fixed-width numeric array: one element lane over private byte storage
///
/// Elements are primitive, so duplicating the storage duplicates the array.
#[derive(Clone, Debug)]
pub struct TypedArray {
    kind: ElementKind,
    data: Vec<u8>,
}

impl TypedArray {
    /// Create a zero-filled array of `len` elements
    pub fn new(kind: ElementKind, len: usize) -> Self {
        Self {
            kind,
            data: vec![0; len * kind.width()],
        }
    }

    /// The element lane
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.data.len() / self.kind.width()
    }

    /// Whether the array has zero elements
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Storage size in bytes
    pub fn byte_length(&self) -> usize {
        self.data.len()
    }

    /// The raw backing bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Element at `index`, widened to f64
    ///
    /// 64-bit integer lanes lose precision past 2^53; use [`Self::get_i64`]
    /// for exact access.
    pub fn get(&self, index: usize) -> Option<f64> {
        if index >= self.len() {
            return None;
        }
        let at = index * self.kind.width();
        let b = &self.data;
        Some(match self.kind {
            ElementKind::Int8 => b[at] as i8 as f64,
            ElementKind::Uint8 | ElementKind::Uint8Clamped => b[at] as f64,
            ElementKind::Int16 => i16::from_le_bytes([b[at], b[at + 1]]) as f64,
            ElementKind::Uint16 => u16::from_le_bytes([b[at], b[at + 1]]) as f64,
            ElementKind::Int32 => {
                i32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]]) as f64
            }
            ElementKind::Uint32 => {
                u32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]]) as f64
            }
            ElementKind::Float32 => {
                f32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]]) as f64
            }
            ElementKind::Float64 => f64::from_le_bytes([
                b[at],
                b[at + 1],
                b[at + 2],
                b[at + 3],
                b[at + 4],
                b[at + 5],
                b[at + 6],
                b[at + 7],
            ]),
            ElementKind::BigInt64 | ElementKind::BigUint64 => self.get_i64(index)? as f64,
        })
    }

    /// Set element at `index` from an f64, narrowing to the lane
    pub fn set(&mut self, index: usize, value: f64) -> CoreResult<()> {
        if index >= self.len() {
            return Err(CoreError::IndexOutOfBounds {
                index,
                len: self.len(),
            });
        }
        let at = index * self.kind.width();
        match self.kind {
            ElementKind::Int8 => self.data[at] = value as i8 as u8,
            ElementKind::Uint8 => self.data[at] = value as u8,
            ElementKind::Uint8Clamped => self.data[at] = value.round().clamp(0.0, 255.0) as u8,
            ElementKind::Int16 => {
                self.data[at..at + 2].copy_from_slice(&(value as i16).to_le_bytes())
            }
            ElementKind::Uint16 => {
                self.data[at..at + 2].copy_from_slice(&(value as u16).to_le_bytes())
            }
            ElementKind::Int32 => {
                self.data[at..at + 4].copy_from_slice(&(value as i32).to_le_bytes())
            }
            ElementKind::Uint32 => {
                self.data[at..at + 4].copy_from_slice(&(value as u32).to_le_bytes())
            }
            ElementKind::Float32 => {
                self.data[at..at + 4].copy_from_slice(&(value as f32).to_le_bytes())
            }
            ElementKind::Float64 => self.data[at..at + 8].copy_from_slice(&value.to_le_bytes()),
            ElementKind::BigInt64 | ElementKind::BigUint64 => {
                return self.set_i64(index, value as i64)
            }
        }
        Ok(())
    }

    /// Exact element access for the 64-bit integer lanes
    pub fn get_i64(&self, index: usize) -> Option<i64> {
        if index >= self.len() || self.kind.width() != 8 {
            return None;
        }
        let at = index * 8;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.data[at..at + 8]);
        Some(i64::from_le_bytes(bytes))
    }

    /// Exact element write for the 64-bit integer lanes
    pub fn set_i64(&mut self, index: usize, value: i64) -> CoreResult<()> {
        if index >= self.len() {
            return Err(CoreError::IndexOutOfBounds {
                index,
                len: self.len(),
            });
        }
        let at = index * self.kind.width();
        self.data[at..at + 8].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }
}

// ============================================================================
// Dates, patterns, errors
// ============================================================================

/// Calendar/timestamp value: an absolute instant in milliseconds since the
/// Unix epoch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateObject {
    /// Timestamp in milliseconds since Unix epoch
    pub timestamp_ms: i64,
}

impl DateObject {
    /// Create a date holding the current time
    pub fn now() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        Self { timestamp_ms }
    }

    /// Create a date from a timestamp (milliseconds since epoch)
    pub fn from_timestamp(timestamp_ms: i64) -> Self {
        Self { timestamp_ms }
    }

    /// Get timestamp in milliseconds
    pub fn get_time(&self) -> i64 {
        self.timestamp_ms
    }
}

/// Pattern value: source, flags, and the compiled matcher
#[derive(Clone, Debug)]
pub struct RegExpObject {
    /// The pattern string
    pattern: String,
    /// Pattern flags (g=global, i=ignoreCase, m=multiline)
    flags: String,
    /// Compiled matcher
    compiled: regex::Regex,
}

impl RegExpObject {
    /// Create a new pattern from source and flags
    pub fn new(pattern: &str, flags: &str) -> CoreResult<Self> {
        let mut regex_pattern = String::new();

        let case_insensitive = flags.contains('i');
        let multiline = flags.contains('m');
        if case_insensitive || multiline {
            regex_pattern.push_str("(?");
            if case_insensitive {
                regex_pattern.push('i');
            }
            if multiline {
                regex_pattern.push('m');
            }
            regex_pattern.push(')');
        }
        regex_pattern.push_str(pattern);

        let compiled =
            regex::Regex::new(&regex_pattern).map_err(|e| CoreError::InvalidPattern {
                pattern: pattern.to_string(),
                flags: flags.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            pattern: pattern.to_string(),
            flags: flags.to_string(),
            compiled,
        })
    }

    /// The source pattern
    pub fn source(&self) -> &str {
        &self.pattern
    }

    /// The flags string
    pub fn flags(&self) -> &str {
        &self.flags
    }

    /// Whether the global flag is set
    pub fn global(&self) -> bool {
        self.flags.contains('g')
    }

    /// Whether the case-insensitive flag is set
    pub fn ignore_case(&self) -> bool {
        self.flags.contains('i')
    }

    /// Whether the multiline flag is set
    pub fn multiline(&self) -> bool {
        self.flags.contains('m')
    }

    /// Test whether the pattern matches `text`
    pub fn test(&self, text: &str) -> bool {
        self.compiled.is_match(text)
    }
}

/// Exception subtype
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum ErrorKind {
    Generic,
    Eval,
    Range,
    Reference,
    Syntax,
    Type,
    Uri,
}

impl ErrorKind {
    /// Subtype name for diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Generic => "Error",
            ErrorKind::Eval => "EvalError",
            ErrorKind::Range => "RangeError",
            ErrorKind::Reference => "ReferenceError",
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Type => "TypeError",
            ErrorKind::Uri => "URIError",
        }
    }
}

/// Exception-like value: subtype plus message and origin fields
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorObject {
    /// Exception subtype
    pub kind: ErrorKind,
    /// Error message
    pub message: String,
    /// File the error originated in, if known
    pub origin_file: Option<String>,
    /// Line the error originated at, if known
    pub origin_line: Option<u32>,
}

impl ErrorObject {
    /// Create an error with a message and no origin
    pub fn new(kind: ErrorKind, message: &str) -> Self {
        Self {
            kind,
            message: message.to_string(),
            origin_file: None,
            origin_line: None,
        }
    }

    /// Create an error carrying origin information
    pub fn with_origin(kind: ErrorKind, message: &str, file: &str, line: u32) -> Self {
        Self {
            kind,
            message: message.to_string(),
            origin_file: Some(file.to_string()),
            origin_line: Some(line),
        }
    }
}

// ============================================================================
// Deferred values
// ============================================================================

/// Settlement state of a deferred value
#[derive(Clone, Debug)]
pub enum PromiseState {
    /// Not yet settled
    Pending,
    /// Settled with a value
    Resolved(Value),
    /// Settled with a rejection reason
    Rejected(Value),
}

/// Deferred value: settles at most once, then propagates to dependents
///
/// A dependent is another pending promise that settles with the same
/// outcome when this one does — the mechanism clones of pending promises
/// are chained through.
#[derive(Clone, Debug)]
pub struct PromiseObject {
    state: PromiseState,
    dependents: Vec<ObjRef>,
}

impl PromiseObject {
    /// Create a pending promise payload
    pub fn new() -> Self {
        Self {
            state: PromiseState::Pending,
            dependents: Vec::new(),
        }
    }

    /// Create an already-resolved promise payload
    pub fn resolved(value: Value) -> Self {
        Self {
            state: PromiseState::Resolved(value),
            dependents: Vec::new(),
        }
    }

    /// Create an already-rejected promise payload
    pub fn rejected(reason: Value) -> Self {
        Self {
            state: PromiseState::Rejected(reason),
            dependents: Vec::new(),
        }
    }

    /// Current settlement state
    pub fn state(&self) -> &PromiseState {
        &self.state
    }

    /// Whether the promise has settled
    pub fn is_settled(&self) -> bool {
        !matches!(self.state, PromiseState::Pending)
    }

    /// Register a dependent promise to settle along with this one
    pub fn add_dependent(&mut self, dependent: ObjRef) {
        self.dependents.push(dependent);
    }
}

impl Default for PromiseObject {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Weak-reference collections
// ============================================================================

/// A non-owning composite handle
#[derive(Clone)]
pub struct WeakObj(Weak<RefCell<Obj>>);

impl WeakObj {
    /// Upgrade to a strong handle if the composite is still alive
    pub fn upgrade(&self) -> Option<ObjRef> {
        self.0.upgrade().map(ObjRef)
    }

    fn points_to(&self, target: &ObjRef) -> bool {
        Weak::ptr_eq(&self.0, &Rc::downgrade(&target.0))
    }
}

impl fmt::Debug for WeakObj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.upgrade() {
            Some(_) => write!(f, "WeakObj(alive)"),
            None => write!(f, "WeakObj(dead)"),
        }
    }
}

/// Weak-keyed map storage; entries vanish when their key composite dies
#[derive(Clone, Debug, Default)]
pub struct WeakMapStorage {
    entries: Vec<(WeakObj, Value)>,
}

impl WeakMapStorage {
    /// Create an empty weak map
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key/value pair
    pub fn set(&mut self, key: &ObjRef, value: Value) {
        self.entries.retain(|(k, _)| k.upgrade().is_some());
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k.points_to(key)) {
            entry.1 = value;
        } else {
            self.entries.push((key.downgrade(), value));
        }
    }

    /// Value for a still-alive key
    pub fn get(&self, key: &ObjRef) -> Option<Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.points_to(key))
            .map(|(_, v)| v.clone())
    }

    /// Whether the key is present and alive
    pub fn has(&self, key: &ObjRef) -> bool {
        self.entries.iter().any(|(k, _)| k.points_to(key))
    }
}

/// Weak set storage; members vanish when their composite dies
#[derive(Clone, Debug, Default)]
pub struct WeakSetStorage {
    items: Vec<WeakObj>,
}

impl WeakSetStorage {
    /// Create an empty weak set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member
    pub fn add(&mut self, value: &ObjRef) {
        self.items.retain(|k| k.upgrade().is_some());
        if !self.items.iter().any(|k| k.points_to(value)) {
            self.items.push(value.downgrade());
        }
    }

    /// Whether the member is present and alive
    pub fn has(&self, value: &ObjRef) -> bool {
        self.items.iter().any(|k| k.points_to(value))
    }
}

// ============================================================================
// The composite cell
// ============================================================================

/// Kind-specific storage of a composite
#[derive(Clone, Debug)]
pub enum Payload {
    /// Generic composite: nothing beyond the property table
    Plain,
    /// Ordered collection
    Array(ArrayStorage),
    /// Associative map
    Map(MapStorage),
    /// Set
    Set(SetStorage),
    /// Boxed scalar wrapper around a primitive
    Boxed(Value),
    /// Calendar/timestamp value
    Date(DateObject),
    /// Pattern value
    RegExp(RegExpObject),
    /// Raw byte buffer
    Buffer(Buffer),
    /// Windowed view over a byte buffer
    View(ViewObject),
    /// Fixed-width numeric array
    TypedArray(TypedArray),
    /// Exception-like value
    Error(ErrorObject),
    /// Deferred value
    Promise(PromiseObject),
    /// Weak-keyed map
    WeakMap(WeakMapStorage),
    /// Weak set
    WeakSet(WeakSetStorage),
}

impl Payload {
    /// Payload name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Payload::Plain => "object",
            Payload::Array(_) => "array",
            Payload::Map(_) => "map",
            Payload::Set(_) => "set",
            Payload::Boxed(_) => "boxed",
            Payload::Date(_) => "date",
            Payload::RegExp(_) => "regexp",
            Payload::Buffer(_) => "buffer",
            Payload::View(_) => "view",
            Payload::TypedArray(_) => "typedarray",
            Payload::Error(_) => "error",
            Payload::Promise(_) => "promise",
            Payload::WeakMap(_) => "weakmap",
            Payload::WeakSet(_) => "weakset",
        }
    }
}

/// Composite identity: the allocation address of its cell
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjId(usize);

impl ObjId {
    /// The raw address
    pub fn addr(&self) -> usize {
        self.0
    }
}

impl fmt::Debug for ObjId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjId({:#x})", self.0)
    }
}

/// A heap composite
#[derive(Debug)]
pub struct Obj {
    /// Constructive template; shared by reference between a composite and
    /// its clone. Chains must be acyclic.
    pub proto: Option<ObjRef>,
    /// Kind-specific storage
    pub payload: Payload,
    /// Extra own keyed properties
    pub props: PropTable,
}

/// Shared handle to a composite
///
/// `clone`ing the handle aliases the same composite; identity is compared
/// with [`ObjRef::ptr_eq`] or keyed by [`ObjRef::id`].
#[derive(Clone)]
pub struct ObjRef(Rc<RefCell<Obj>>);

impl ObjRef {
    /// Allocate a composite with the given payload and no proto
    pub fn new(payload: Payload) -> Self {
        Self::with_proto(payload, None)
    }

    /// Allocate a composite with a payload and proto
    pub fn with_proto(payload: Payload, proto: Option<ObjRef>) -> Self {
        Self(Rc::new(RefCell::new(Obj {
            proto,
            payload,
            props: PropTable::new(),
        })))
    }

    // ------------------------------------------------------------------
    // Kind constructors
    // ------------------------------------------------------------------

    /// A generic composite
    pub fn plain() -> Self {
        Self::new(Payload::Plain)
    }

    /// A generic composite built from a template
    pub fn plain_with_proto(proto: Option<ObjRef>) -> Self {
        Self::with_proto(Payload::Plain, proto)
    }

    /// An ordered collection with the given storage
    pub fn array(storage: ArrayStorage) -> Self {
        Self::new(Payload::Array(storage))
    }

    /// A dense ordered collection from values
    pub fn array_from(values: Vec<Value>) -> Self {
        Self::array(ArrayStorage::from_values(values))
    }

    /// An empty associative map
    pub fn new_map() -> Self {
        Self::new(Payload::Map(MapStorage::new()))
    }

    /// An empty set
    pub fn new_set() -> Self {
        Self::new(Payload::Set(SetStorage::new()))
    }

    /// A boxed scalar wrapper; the payload must be a primitive
    pub fn boxed(payload: Value) -> CoreResult<Self> {
        if !payload.is_primitive() {
            return Err(CoreError::NotAPrimitive {
                got: payload.type_name(),
            });
        }
        Ok(Self::new(Payload::Boxed(payload)))
    }

    /// A calendar value
    pub fn date(date: DateObject) -> Self {
        Self::new(Payload::Date(date))
    }

    /// A pattern value
    pub fn regexp(pattern: &str, flags: &str) -> CoreResult<Self> {
        Ok(Self::new(Payload::RegExp(RegExpObject::new(
            pattern, flags,
        )?)))
    }

    /// A zero-filled byte buffer
    pub fn buffer(size: usize) -> Self {
        Self::new(Payload::Buffer(Buffer::new(size)))
    }

    /// A byte buffer from existing bytes
    pub fn buffer_from(data: Vec<u8>) -> Self {
        Self::new(Payload::Buffer(Buffer::from_bytes(data)))
    }

    /// A view over a byte buffer
    pub fn view(buffer: &ObjRef, byte_offset: usize, byte_length: usize) -> CoreResult<Self> {
        Ok(Self::new(Payload::View(ViewObject::new(
            buffer.clone(),
            byte_offset,
            byte_length,
        )?)))
    }

    /// A zero-filled fixed-width numeric array
    pub fn typed_array(kind: ElementKind, len: usize) -> Self {
        Self::new(Payload::TypedArray(TypedArray::new(kind, len)))
    }

    /// An exception-like value
    pub fn error(error: ErrorObject) -> Self {
        Self::new(Payload::Error(error))
    }

    /// A pending promise
    pub fn promise() -> Self {
        Self::new(Payload::Promise(PromiseObject::new()))
    }

    /// A resolved promise
    pub fn promise_resolved(value: Value) -> Self {
        Self::new(Payload::Promise(PromiseObject::resolved(value)))
    }

    /// A rejected promise
    pub fn promise_rejected(reason: Value) -> Self {
        Self::new(Payload::Promise(PromiseObject::rejected(reason)))
    }

    /// An empty weak-keyed map
    pub fn weak_map() -> Self {
        Self::new(Payload::WeakMap(WeakMapStorage::new()))
    }

    /// An empty weak set
    pub fn weak_set() -> Self {
        Self::new(Payload::WeakSet(WeakSetStorage::new()))
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    /// The composite's identity
    pub fn id(&self) -> ObjId {
        ObjId(Rc::as_ptr(&self.0) as usize)
    }

    /// Whether two handles denote the same composite
    pub fn ptr_eq(&self, other: &ObjRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// A non-owning handle to this composite
    pub fn downgrade(&self) -> WeakObj {
        WeakObj(Rc::downgrade(&self.0))
    }

    // ------------------------------------------------------------------
    // Access
    // ------------------------------------------------------------------

    /// Borrow the composite
    pub fn borrow(&self) -> Ref<'_, Obj> {
        self.0.borrow()
    }

    /// Mutably borrow the composite
    pub fn borrow_mut(&self) -> RefMut<'_, Obj> {
        self.0.borrow_mut()
    }

    /// The composite's proto, if any
    pub fn proto(&self) -> Option<ObjRef> {
        self.0.borrow().proto.clone()
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    /// Define an own property with an explicit descriptor
    pub fn define(&self, key: PropKey, prop: Property) {
        self.0.borrow_mut().props.define(key, prop);
    }

    /// Assign a value: defines a writable, enumerable, configurable data
    /// property
    pub fn set(&self, key: impl Into<PropKey>, value: Value) {
        self.define(key.into(), Property::data(value));
    }

    /// Own property descriptor for `key`, if present
    pub fn get_own(&self, key: &PropKey) -> Option<Property> {
        self.0.borrow().props.get(key).cloned()
    }

    /// Own keys in declaration order
    pub fn keys(&self) -> Vec<PropKey> {
        self.0.borrow().props.keys().cloned().collect()
    }

    /// Property descriptor for `key`, searching the proto chain
    pub fn lookup(&self, key: &PropKey) -> Option<Property> {
        let mut current = Some(self.clone());
        while let Some(obj) = current {
            let (found, next) = {
                let cell = obj.0.borrow();
                (cell.props.get(key).cloned(), cell.proto.clone())
            };
            if found.is_some() {
                return found;
            }
            current = next;
        }
        None
    }

    /// Read a property through the proto chain
    ///
    /// Data properties return their value; accessor properties invoke the
    /// getter with this composite as receiver. Missing properties read as
    /// `Undefined`.
    pub fn get(&self, key: &PropKey) -> Value {
        match self.lookup(key) {
            Some(Property::Data { value, .. }) => value,
            Some(Property::Accessor { get: Some(g), .. }) => {
                g.call(Value::Object(self.clone()), &[])
            }
            _ => Value::Undefined,
        }
    }

    // ------------------------------------------------------------------
    // Promise settlement
    // ------------------------------------------------------------------

    /// Resolve a promise composite, propagating to dependents
    ///
    /// Settling an already-settled promise is a no-op.
    pub fn resolve(&self, value: Value) -> CoreResult<()> {
        self.settle(PromiseState::Resolved(value))
    }

    /// Reject a promise composite, propagating to dependents
    pub fn reject(&self, reason: Value) -> CoreResult<()> {
        self.settle(PromiseState::Rejected(reason))
    }

    fn settle(&self, outcome: PromiseState) -> CoreResult<()> {
        let dependents = {
            let mut cell = self.0.borrow_mut();
            let promise = match &mut cell.payload {
                Payload::Promise(p) => p,
                _ => return Err(CoreError::NotAPromise),
            };
            if promise.is_settled() {
                return Ok(());
            }
            promise.state = outcome.clone();
            std::mem::take(&mut promise.dependents)
        };
        for dependent in dependents {
            dependent.settle(outcome.clone())?;
        }
        Ok(())
    }
}

impl fmt::Debug for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Shallow on purpose: composites may be cyclic
        write!(
            f,
            "ObjRef({}@{:#x})",
            self.0.borrow().payload.type_name(),
            self.id().addr()
        )
    }
}
