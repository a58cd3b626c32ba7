use crate::{Error, Result};
use std::{fmt, str::FromStr};

/// A qualified type name, such as `app::billing::Invoice`.
///
/// Entities are identified by their type path. The last segment is the
/// simple name; the preceding segments form the package.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypePath {
    segments: Vec<String>,
}

/// A declared value type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Type {
    /// Boolean value
    Bool,

    /// Signed 8-bit integer
    I8,

    /// Signed 16-bit integer
    I16,

    /// Signed 32-bit integer
    I32,

    /// Signed 64-bit integer
    I64,

    /// Unsigned 8-bit integer
    U8,

    /// Unsigned 16-bit integer
    U16,

    /// Unsigned 32-bit integer
    U32,

    /// Unsigned 64-bit integer
    U64,

    F32,
    F64,

    /// String type
    String,

    Uuid,
    Bytes,
    Decimal,
    Timestamp,
    Date,
    Time,

    /// A user-defined type: an entity, an embeddable or an opaque value type.
    Path(TypePath),

    /// An ordered collection of a single type
    List(Box<Type>),

    /// An unordered collection of a single type
    Set(Box<Type>),
}

impl TypePath {
    /// Parses a path separated by `::` or `.`.
    pub fn new(path: &str) -> Self {
        let segments = path
            .split("::")
            .flat_map(|segment| segment.split('.'))
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(String::from)
            .collect();
        Self { segments }
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The last segment of the path.
    pub fn simple_name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    /// All segments but the last.
    pub fn package(&self) -> &[String] {
        match self.segments.split_last() {
            Some((_, package)) => package,
            None => &[],
        }
    }

    pub fn has_package(&self) -> bool {
        self.segments.len() > 1
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// A path in the same package with a different simple name.
    pub fn sibling(&self, simple_name: &str) -> Self {
        let mut segments = self.package().to_vec();
        segments.push(simple_name.to_string());
        Self { segments }
    }

    /// Returns `true` if `query` names this path, either exactly or, when
    /// `query` carries no package, by simple name.
    pub fn matches(&self, query: &TypePath) -> bool {
        if query.has_package() {
            self == query
        } else {
            self.simple_name() == query.simple_name()
        }
    }
}

impl fmt::Display for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("::"))
    }
}

impl fmt::Debug for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypePath({self})")
    }
}

impl From<&str> for TypePath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TypePath {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<&TypePath> for TypePath {
    fn from(value: &TypePath) -> Self {
        value.clone()
    }
}

impl Type {
    pub fn path(path: impl Into<TypePath>) -> Self {
        Self::Path(path.into())
    }

    pub fn list(ty: impl Into<Self>) -> Self {
        Self::List(Box::new(ty.into()))
    }

    pub fn set(ty: impl Into<Self>) -> Self {
        Self::Set(Box::new(ty.into()))
    }

    /// Looks up a primitive type by its keyword.
    pub fn primitive(name: &str) -> Option<Self> {
        Some(match name {
            "bool" => Self::Bool,
            "i8" => Self::I8,
            "i16" => Self::I16,
            "i32" => Self::I32,
            "i64" => Self::I64,
            "u8" => Self::U8,
            "u16" => Self::U16,
            "u32" => Self::U32,
            "u64" => Self::U64,
            "f32" => Self::F32,
            "f64" => Self::F64,
            "String" | "str" | "std::string::String" => Self::String,
            "Uuid" | "uuid::Uuid" => Self::Uuid,
            "Bytes" | "bytes::Bytes" => Self::Bytes,
            "Decimal" | "rust_decimal::Decimal" => Self::Decimal,
            "Timestamp" => Self::Timestamp,
            "Date" => Self::Date,
            "Time" => Self::Time,
            _ => return None,
        })
    }

    /// Returns `true` for scalar types that can never name an entity.
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Self::Path(_) | Self::List(_) | Self::Set(_))
    }

    pub fn is_iterable(&self) -> bool {
        matches!(self, Self::List(_) | Self::Set(_))
    }

    /// Unwraps one level of collection wrapping.
    pub fn element(&self) -> &Type {
        match self {
            Self::List(item) | Self::Set(item) => item,
            _ => self,
        }
    }

    pub fn as_path(&self) -> Option<&TypePath> {
        match self {
            Self::Path(path) => Some(path),
            _ => None,
        }
    }

    fn keyword(&self) -> Option<&'static str> {
        Some(match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::String => "String",
            Self::Uuid => "Uuid",
            Self::Bytes => "Bytes",
            Self::Decimal => "Decimal",
            Self::Timestamp => "Timestamp",
            Self::Date => "Date",
            Self::Time => "Time",
            _ => return None,
        })
    }

    fn parse(input: &str, src: &str) -> Result<Self> {
        let s = input.trim();

        if s.is_empty() {
            return Err(Error::invalid_type(src, "empty type expression"));
        }

        let Some(open) = s.find('<') else {
            if s.contains('>') {
                return Err(Error::invalid_type(src, "unbalanced `>`"));
            }

            if let Some(primitive) = Self::primitive(s) {
                return Ok(primitive);
            }

            return Self::parse_path(s, src).map(Self::Path);
        };

        let Some(inner) = s[open + 1..].strip_suffix('>') else {
            return Err(Error::invalid_type(src, "unterminated generic argument list"));
        };

        let head = Self::parse_path(&s[..open], src)?;
        let item = Self::parse(inner, src)?;

        match head.simple_name() {
            // Nullability is carried by the attribute, not the type
            "Option" | "Box" => Ok(item),
            "Vec" | "VecDeque" | "LinkedList" => Ok(Self::list(item)),
            "HashSet" | "BTreeSet" | "IndexSet" => Ok(Self::set(item)),
            other => Err(Error::invalid_type(
                src,
                format!("unsupported generic type `{other}`"),
            )),
        }
    }

    fn parse_path(s: &str, src: &str) -> Result<TypePath> {
        let path = TypePath::new(s);

        if path.is_empty() {
            return Err(Error::invalid_type(src, "missing type name"));
        }

        for segment in path.segments() {
            let valid = segment
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_')
                && !segment.starts_with(|c: char| c.is_ascii_digit());

            if !valid {
                return Err(Error::invalid_type(
                    src,
                    format!("invalid path segment `{segment}`"),
                ));
            }
        }

        Ok(path)
    }
}

impl FromStr for Type {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s, s)
    }
}

impl From<TypePath> for Type {
    fn from(value: TypePath) -> Self {
        Self::Path(value)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(keyword) = self.keyword() {
            return f.write_str(keyword);
        }

        match self {
            Self::Path(path) => path.fmt(f),
            Self::List(item) => write!(f, "Vec<{item}>"),
            Self::Set(item) => write!(f, "HashSet<{item}>"),
            _ => unreachable!(),
        }
    }
}
