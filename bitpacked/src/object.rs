use std::{fmt, str::FromStr};

use crate::{RuntimeError, RuntimeResult, Word};

/// Runtime type descriptors known to this layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Int,
    Bool,
    Float,
    NoneType,
    NotImplementedType,
    Range,
    Str,
    List,
    /// placeholder for tags that are assigned but not handed to any packer
    Reserved,
}

impl ObjectType {
    pub const fn name(self) -> &'static str {
        match self {
            ObjectType::Int => "int",
            ObjectType::Bool => "bool",
            ObjectType::Float => "float",
            ObjectType::NoneType => "NoneType",
            ObjectType::NotImplementedType => "NotImplementedType",
            ObjectType::Range => "range",
            ObjectType::Str => "str",
            ObjectType::List => "list",
            ObjectType::Reserved => "reserved",
        }
    }

    /// `bool` is the only subtype relation at this level.
    pub const fn is_subtype_of(self, other: ObjectType) -> bool {
        matches!((self, other), (ObjectType::Bool, ObjectType::Int)) || self as u8 == other as u8
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A runtime value before it has been given an identity.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    None,
    NotImplemented,
    Bool(bool),
    Int(i64),
    Float(f64),
    Range(Range),
    Str(String),
    /// holds identities, each one owning a reference
    List(Vec<Word>),
}

impl Object {
    pub const fn object_type(&self) -> ObjectType {
        match self {
            Object::None => ObjectType::NoneType,
            Object::NotImplemented => ObjectType::NotImplementedType,
            Object::Bool(_) => ObjectType::Bool,
            Object::Int(_) => ObjectType::Int,
            Object::Float(_) => ObjectType::Float,
            Object::Range(_) => ObjectType::Range,
            Object::Str(_) => ObjectType::Str,
            Object::List(_) => ObjectType::List,
        }
    }
}

impl From<bool> for Object {
    fn from(value: bool) -> Self {
        Object::Bool(value)
    }
}

impl From<i64> for Object {
    fn from(value: i64) -> Self {
        Object::Int(value)
    }
}

impl From<f64> for Object {
    fn from(value: f64) -> Self {
        Object::Float(value)
    }
}

impl From<Range> for Object {
    fn from(value: Range) -> Self {
        Object::Range(value)
    }
}

impl From<&str> for Object {
    fn from(value: &str) -> Self {
        Object::Str(value.to_owned())
    }
}

fn write_float(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value.is_nan() {
        f.write_str("nan")
    } else if value.is_infinite() {
        f.write_str(if value > 0.0 { "inf" } else { "-inf" })
    } else {
        write!(f, "{value:?}")
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::None => f.write_str("None"),
            Object::NotImplemented => f.write_str("NotImplemented"),
            Object::Bool(true) => f.write_str("True"),
            Object::Bool(false) => f.write_str("False"),
            Object::Int(n) => write!(f, "{n}"),
            Object::Float(x) => write_float(f, *x),
            Object::Range(range) => write!(f, "{range}"),
            Object::Str(s) => write!(f, "{s:?}"),
            Object::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "<{item}>")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Python `range`: an immutable arithmetic sequence.
///
/// Equality follows the element sequence, not the constructor arguments:
/// `range(0, 3, 5) == range(0, 1)` and all empty ranges are equal.
#[derive(Debug, Clone, Copy)]
pub struct Range {
    start: i64,
    stop: i64,
    step: i64,
}

impl Range {
    pub fn new(start: i64, stop: i64, step: i64) -> RuntimeResult<Self> {
        if step == 0 {
            return Err(RuntimeError::RangeStepZero);
        }
        Ok(Self { start, stop, step })
    }

    pub fn from_stop(stop: i64) -> Self {
        Self {
            start: 0,
            stop,
            step: 1,
        }
    }

    /// Inverse of [`Range::canonical`].
    pub(crate) fn from_canonical(start: i64, step: i64, len: u64) -> Self {
        if len == 0 {
            return Self::from_stop(0);
        }
        let step = if step == 0 { 1 } else { step };
        let stop = i128::from(start) + i128::from(step) * i128::from(len);
        Self {
            start,
            stop: stop.clamp(i64::MIN.into(), i64::MAX.into()) as i64,
            step,
        }
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn stop(&self) -> i64 {
        self.stop
    }

    pub fn step(&self) -> i64 {
        self.step
    }

    pub fn len(&self) -> u64 {
        let (start, stop, step) = (
            i128::from(self.start),
            i128::from(self.stop),
            i128::from(self.step),
        );
        let len = if step > 0 && start < stop {
            (stop - start - 1) / step + 1
        } else if step < 0 && start > stop {
            (start - stop - 1) / -step + 1
        } else {
            0
        };
        len as u64
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `index`, negative indices count from the end.
    pub fn get(&self, index: i64) -> RuntimeResult<i64> {
        let len = self.len();
        let resolved = if index < 0 {
            i128::from(index) + i128::from(len)
        } else {
            i128::from(index)
        };
        if resolved < 0 || resolved >= i128::from(len) {
            return Err(RuntimeError::IndexOutOfRange {
                index,
                len: usize::try_from(len).unwrap_or(usize::MAX),
            });
        }
        Ok((i128::from(self.start) + resolved * i128::from(self.step)) as i64)
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + use<> {
        let Range { start, step, .. } = *self;
        (0..self.len()).map(move |i| (i128::from(start) + i128::from(i) * i128::from(step)) as i64)
    }

    /// `(start, step, len)` after normalization: empty ranges become `(0, 0, 0)` and
    /// single element ranges get step `1`.
    pub fn canonical(&self) -> (i64, i64, u64) {
        match self.len() {
            0 => (0, 0, 0),
            1 => (self.start, 1, 1),
            len => (self.start, self.step, len),
        }
    }

    /// `self[slice]`. `Overflow` only when the result has no `i64` bounds, which
    /// happens when it must end on `i64::MIN` or `i64::MAX` itself.
    pub fn slice(&self, slice: &Slice) -> RuntimeResult<Range> {
        let indices = slice.indices(self.len())?;
        let start = i128::from(self.start);
        let step = i128::from(self.step);

        let substep = i64::try_from(indices.step * step).map_err(|_| RuntimeError::Overflow)?;
        let clamp = |value: i128| value.clamp(i64::MIN.into(), i64::MAX.into()) as i64;
        let substart = clamp(start + indices.start * step);
        if indices.len == 0 {
            return Range::new(substart, substart, substep);
        }
        let substop = clamp(start + indices.stop * step);
        let range = Range::new(substart, substop, substep)?;
        if range.len() != indices.len {
            return Err(RuntimeError::Overflow);
        }
        Ok(range)
    }
}

impl PartialEq for Range {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for Range {}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.step == 1 {
            write!(f, "range({}, {})", self.start, self.stop)
        } else {
            write!(f, "range({}, {}, {})", self.start, self.stop, self.step)
        }
    }
}

/// `[start:stop:step]` with every part optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Slice {
    pub start: Option<i64>,
    pub stop: Option<i64>,
    pub step: Option<i64>,
}

/// Concrete indices of a slice applied to a sequence of a known length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceIndices {
    pub start: i128,
    pub stop: i128,
    pub step: i128,
    pub len: u64,
}

impl Slice {
    pub fn new(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Self {
        Self { start, stop, step }
    }

    /// Clamp the slice to a sequence of `length` elements, the way `slice.indices` does.
    pub fn indices(&self, length: u64) -> RuntimeResult<SliceIndices> {
        let step = i128::from(self.step.unwrap_or(1));
        if step == 0 {
            return Err(RuntimeError::SliceStepZero);
        }
        let length = i128::from(length);
        let (lower, upper) = if step < 0 {
            (-1, length - 1)
        } else {
            (0, length)
        };

        let adjust = |bound: Option<i64>, default: i128| match bound {
            None => default,
            Some(value) => {
                let value = i128::from(value);
                if value < 0 {
                    (value + length).max(lower)
                } else {
                    value.min(upper)
                }
            }
        };

        let start = adjust(self.start, if step < 0 { upper } else { lower });
        let stop = adjust(self.stop, if step < 0 { lower } else { upper });

        let len = if step < 0 {
            if stop < start {
                (start - stop - 1) / -step + 1
            } else {
                0
            }
        } else if start < stop {
            (stop - start - 1) / step + 1
        } else {
            0
        };

        Ok(SliceIndices {
            start,
            stop,
            step,
            len: len as u64,
        })
    }
}

impl FromStr for Slice {
    type Err = RuntimeError;

    /// Parses `start:stop` or `start:stop:step`, without brackets.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RuntimeError::InvalidLiteral(s.to_owned());
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(invalid());
        }
        let bound = |part: Option<&&str>| -> RuntimeResult<Option<i64>> {
            match part {
                None => Ok(None),
                Some(p) if p.is_empty() => Ok(None),
                Some(p) => p.parse().map(Some).map_err(|_| invalid()),
            }
        };
        Ok(Slice {
            start: bound(parts.first())?,
            stop: bound(parts.get(1))?,
            step: bound(parts.get(2))?,
        })
    }
}

fn parse_range(s: &str) -> RuntimeResult<Range> {
    let invalid = || RuntimeError::InvalidLiteral(s.to_owned());
    let rest = s.strip_prefix("range(").ok_or_else(invalid)?;
    let close = rest.find(')').ok_or_else(invalid)?;
    let args = rest[..close]
        .split(',')
        .map(|arg| arg.trim().parse::<i64>().map_err(|_| invalid()))
        .collect::<RuntimeResult<Vec<_>>>()?;
    let range = match args.as_slice() {
        [stop] => Range::from_stop(*stop),
        [start, stop] => Range::new(*start, *stop, 1)?,
        [start, stop, step] => Range::new(*start, *stop, *step)?,
        _ => return Err(invalid()),
    };

    let tail = rest[close + 1..].trim();
    if tail.is_empty() {
        return Ok(range);
    }
    let inner = tail
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .ok_or_else(invalid)?;
    range.slice(&inner.parse()?)
}

impl FromStr for Object {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "None" => return Ok(Object::None),
            "NotImplemented" => return Ok(Object::NotImplemented),
            "True" => return Ok(Object::Bool(true)),
            "False" => return Ok(Object::Bool(false)),
            _ => {}
        }
        if s.starts_with("range(") {
            return parse_range(s).map(Object::Range);
        }
        for quote in ['\'', '"'] {
            if let Some(inner) = s.strip_prefix(quote).and_then(|t| t.strip_suffix(quote)) {
                return Ok(Object::Str(inner.to_owned()));
            }
        }
        if let Ok(n) = s.parse::<i64>() {
            return Ok(Object::Int(n));
        }
        s.parse::<f64>()
            .map(Object::Float)
            .map_err(|_| RuntimeError::InvalidLiteral(s.to_owned()))
    }
}
