use std::fmt;

use strum::{Display, EnumString};

/// Constraint attached to a typed placeholder such as `<todo_id:int>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ParamType {
    Int,
    Float,
    Str,
    Alpha,
    Slug,
    Uuid,
}

impl ParamType {
    /// Whether a decoded path segment satisfies this constraint.
    pub fn matches(&self, raw: &str) -> bool {
        if raw.is_empty() {
            return false;
        }
        match self {
            ParamType::Int => {
                let digits = raw.strip_prefix('-').unwrap_or(raw);
                !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
            }
            ParamType::Float => raw.parse::<f64>().is_ok(),
            ParamType::Str => true,
            ParamType::Alpha => raw.chars().all(|c| c.is_ascii_alphabetic()),
            ParamType::Slug => raw.split('-').all(|part| {
                !part.is_empty()
                    && part
                        .bytes()
                        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
            }),
            ParamType::Uuid => uuid::Uuid::parse_str(raw).is_ok(),
        }
    }
}

/// A Rust type a path segment can be bound to.
///
/// `KIND` is the placeholder constraint the type implies when a handler
/// declares a parameter of that type; `None` leaves the placeholder
/// unconstrained.
pub trait PathParam: Sized + Send + 'static {
    const KIND: Option<ParamType>;

    fn from_segment(raw: &str) -> Option<Self>;
}

macro_rules! int_path_param {
    ($($ty:ty),*) => {
        $(
            impl PathParam for $ty {
                const KIND: Option<ParamType> = Some(ParamType::Int);

                fn from_segment(raw: &str) -> Option<Self> {
                    raw.parse().ok()
                }
            }
        )*
    };
}

int_path_param!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl PathParam for f32 {
    const KIND: Option<ParamType> = Some(ParamType::Float);

    fn from_segment(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

impl PathParam for f64 {
    const KIND: Option<ParamType> = Some(ParamType::Float);

    fn from_segment(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

impl PathParam for String {
    const KIND: Option<ParamType> = Some(ParamType::Str);

    fn from_segment(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }
}

impl PathParam for uuid::Uuid {
    const KIND: Option<ParamType> = Some(ParamType::Uuid);

    fn from_segment(raw: &str) -> Option<Self> {
        uuid::Uuid::parse_str(raw).ok()
    }
}

/// An unconstrained path segment, rendered as a bare `<name>` placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawSegment(pub String);

impl RawSegment {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RawSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PathParam for RawSegment {
    const KIND: Option<ParamType> = None;

    fn from_segment(raw: &str) -> Option<Self> {
        Some(RawSegment(raw.to_string()))
    }
}

/// Declaration of one handler parameter bound from the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub kind: Option<ParamType>,
    /// Optional parameters start a new, longer route template.
    pub optional: bool,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, kind: Option<ParamType>, optional: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            optional,
        }
    }
}

/// Ordered parameter list of one handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    specs: Vec<ParamSpec>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, spec: ParamSpec) -> Self {
        self.specs.push(spec);
        self
    }

    pub fn required<T: PathParam>(self, name: impl Into<String>) -> Self {
        self.push(ParamSpec::new(name, T::KIND, false))
    }

    pub fn optional<T: PathParam>(self, name: impl Into<String>) -> Self {
        self.push(ParamSpec::new(name, T::KIND, true))
    }

    pub fn untyped(self, name: impl Into<String>) -> Self {
        self.push(ParamSpec::new(name, None, false))
    }

    pub fn optional_untyped(self, name: impl Into<String>) -> Self {
        self.push(ParamSpec::new(name, None, true))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParamSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
