use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::{lenient_count, null_default};

/// One detected anti-pattern instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    #[serde(rename = "type", default)]
    pub problem_type: ProblemType,

    /// Stable identifier used to follow the same problem across runs.
    #[serde(default, deserialize_with = "null_default")]
    pub id: String,

    /// Statement text, kept in full.
    #[serde(default, deserialize_with = "null_default")]
    pub sql: String,

    /// Repetition count, mainly for N+1 groups.
    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub count: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Evidence>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<Suggestion>,
}

/// Problem vocabulary. Unknown tags pass through as [`ProblemType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProblemType {
    NPlusOne,
    MissingIndex,
    SortWithoutIndex,
    SelectStarLarge,
    Other(String),
}

impl ProblemType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::NPlusOne => "N+1",
            Self::MissingIndex => "MISSING_INDEX",
            Self::SortWithoutIndex => "SORT_WITHOUT_INDEX",
            Self::SelectStarLarge => "SELECT_STAR_LARGE",
            Self::Other(tag) => tag,
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "N+1" => Self::NPlusOne,
            "MISSING_INDEX" => Self::MissingIndex,
            "SORT_WITHOUT_INDEX" => Self::SortWithoutIndex,
            "SELECT_STAR_LARGE" => Self::SelectStarLarge,
            other => Self::Other(other.to_string()),
        }
    }
}

impl Default for ProblemType {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl fmt::Display for ProblemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ProblemType {
    fn from(tag: &str) -> Self {
        Self::from_tag(tag)
    }
}

impl Serialize for ProblemType {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProblemType {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let tag: Option<String> = Option::deserialize(d)?;
        Ok(tag.map(|t| Self::from_tag(&t)).unwrap_or_default())
    }
}

/// Call-frame trail pointing at where a problem originated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Frames ordered from most relevant application frame outwards.
    #[serde(default, deserialize_with = "frames")]
    pub top_stack: Vec<Frame>,
}

/// One `(file, symbol, line)` entry of a stack trail. Serialized as a triple.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub file: Option<String>,
    pub symbol: Option<String>,
    pub line: Option<u32>,
}

impl Frame {
    pub fn new(file: impl Into<String>, symbol: impl Into<String>, line: u32) -> Self {
        Self {
            file: Some(file.into()),
            symbol: Some(symbol.into()),
            line: Some(line),
        }
    }

    fn from_value(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Array(parts) => Self {
                file: parts.first().and_then(text),
                symbol: parts.get(1).and_then(text),
                line: parts.get(2).and_then(line_number),
            },
            serde_json::Value::Object(map) => Self {
                file: map.get("file").and_then(text),
                symbol: map
                    .get("symbol")
                    .or_else(|| map.get("function"))
                    .and_then(text),
                line: map
                    .get("line")
                    .or_else(|| map.get("lineno"))
                    .and_then(line_number),
            },
            _ => Self::default(),
        }
    }
}

impl Serialize for Frame {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        (&self.file, &self.symbol, &self.line).serialize(s)
    }
}

impl<'de> Deserialize<'de> for Frame {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(d)?;
        Ok(Self::from_value(&value))
    }
}

fn text(v: &serde_json::Value) -> Option<String> {
    v.as_str().map(str::to_string)
}

fn line_number(v: &serde_json::Value) -> Option<u32> {
    match v {
        serde_json::Value::Number(n) => n.as_u64().and_then(|l| u32::try_from(l).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `top_stack` appears as a list of triples, a list of frame objects, or, from
/// older analyzers, a single flat `[file, symbol, line]` triple.
fn frames<'de, D>(d: D) -> Result<Vec<Frame>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Option::deserialize(d)?;
    let Some(serde_json::Value::Array(items)) = value else {
        return Ok(Vec::new());
    };

    let flat_triple = items
        .first()
        .map(|first| first.is_string())
        .unwrap_or(false);
    if flat_triple {
        return Ok(vec![Frame::from_value(&serde_json::Value::Array(items))]);
    }

    Ok(items.iter().map(Frame::from_value).collect())
}

/// Structured fix proposal attached to a problem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ddl: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<serde_json::Value>,

    /// Keys this model does not name, kept so fallback rendering is lossless.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Suggestion {
    pub fn of_kind(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Self::default()
        }
    }

    pub fn with_ddl(mut self, ddl: impl Into<String>) -> Self {
        self.ddl = Some(ddl.into());
        self
    }

    pub fn with_args(mut self, args: serde_json::Value) -> Self {
        self.args = Some(args);
        self
    }

    /// String argument `key` from `args`, when `args` is an object.
    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.args.as_ref()?.get(key)?.as_str()
    }
}
