//! Compilation of the `q` filter payload into a [`ConditionTree`].
//!
//! The payload is a JSON document. Objects hold `field: value` predicates that
//! are ANDed by co-occurrence, arrays hold nested groups:
//!
//! ```json
//! [{"status": "active"}, {"$or.age.$gte": 18, "$or.profile.city.$like": "Ber*"}]
//! ```
//!
//! Field keys carry an optional `$or.`/`$and.` prefix, an optional
//! `relation.` path through a to-one relation, and an optional operator
//! suffix such as `.$gte` or `.$in`.

use serde_json::Value as JsonValue;
use std::fmt;

use super::columns::validate_column;
use crate::catalog::{ModelCatalog, ModelDefinition, RelationDefinition};
use crate::errors::QueryError;

/// How a predicate or group is chained onto the ones before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Boolean {
    #[default]
    And,
    Or,
}

/// A single filter value after coercion from JSON
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Bool(b) => Some(Self::Bool(*b)),
            JsonValue::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float)),
            JsonValue::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    /// One piece of a `"1,2,3"` or `"lo:hi"` string. Pieces that are valid
    /// JSON numbers bind as numbers, anything else (`"007"`, `"abc"`) as text.
    fn from_segment(part: &str) -> Self {
        part.parse::<serde_json::Number>()
            .ok()
            .and_then(|n| Self::from_json(&JsonValue::Number(n)))
            .unwrap_or_else(|| Self::Text(part.to_string()))
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullCheck {
    IsNull,
    IsNotNull,
}

/// Operators taking a column, a symbol and one scalar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    NotLike,
}

impl Comparison {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
        }
    }
}

/// Operators taking a column and a list of values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetTest {
    In,
    NotIn,
    Between,
    NotBetween,
}

impl SetTest {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::Between => "BETWEEN",
            Self::NotBetween => "NOT BETWEEN",
        }
    }
}

/// The test a predicate applies, shaped by how many values it needs
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Null(NullCheck),
    Compare(Comparison, Scalar),
    Set(SetTest, Vec<Scalar>),
}

/// One leaf condition
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Explicit `$or.`/`$and.` prefix, if the key carried one
    pub prefix: Option<Boolean>,
    /// Name of the model owning `field`
    pub model: String,
    pub table: String,
    pub field: String,
    pub filter: Filter,
    /// Set when the field was reached through a to-one relation
    pub relation: Option<RelationDefinition>,
}

impl Predicate {
    #[must_use]
    pub fn column(&self) -> String {
        format!("{}.{}", self.table, self.field)
    }

    #[must_use]
    pub fn boolean(&self) -> Boolean {
        self.prefix.unwrap_or_default()
    }
}

/// Recursive boolean structure of predicates
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionTree {
    Predicate(Predicate),
    Group(Vec<ConditionTree>),
}

impl Default for ConditionTree {
    fn default() -> Self {
        Self::Group(Vec::new())
    }
}

impl ConditionTree {
    /// First predicate in depth-first order
    #[must_use]
    pub fn first_predicate(&self) -> Option<&Predicate> {
        match self {
            Self::Predicate(p) => Some(p),
            Self::Group(children) => children.iter().find_map(Self::first_predicate),
        }
    }

    /// How this node chains onto its siblings.
    ///
    /// A group takes the prefix of the first predicate found inside it, even
    /// when later predicates in the group carry none.
    #[must_use]
    pub fn boolean(&self) -> Boolean {
        self.first_predicate().map_or(Boolean::And, Predicate::boolean)
    }

    /// All predicates, depth-first
    #[must_use]
    pub fn predicates(&self) -> Vec<&Predicate> {
        let mut out = Vec::new();
        self.collect_predicates(&mut out);
        out
    }

    fn collect_predicates<'t>(&'t self, out: &mut Vec<&'t Predicate>) {
        match self {
            Self::Predicate(p) => out.push(p),
            Self::Group(children) => {
                for child in children {
                    child.collect_predicates(out);
                }
            }
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first_predicate().is_none()
    }
}

/// Output of [`ConditionCompiler::compile`]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledConditions {
    pub tree: ConditionTree,
    /// `table.column` of every compiled predicate, in compile order
    pub used_columns: Vec<String>,
}

#[derive(Clone, Copy)]
enum Operator {
    Compare(Comparison),
    Set(SetTest),
}

/// Operator suffixes, each mutually exclusive with the others
const SUFFIXES: [(&str, Operator); 11] = [
    (".$not", Operator::Compare(Comparison::NotEq)),
    (".$gt", Operator::Compare(Comparison::Gt)),
    (".$gte", Operator::Compare(Comparison::Gte)),
    (".$lt", Operator::Compare(Comparison::Lt)),
    (".$lte", Operator::Compare(Comparison::Lte)),
    (".$like", Operator::Compare(Comparison::Like)),
    (".$notLike", Operator::Compare(Comparison::NotLike)),
    (".$in", Operator::Set(SetTest::In)),
    (".$notIn", Operator::Set(SetTest::NotIn)),
    (".$between", Operator::Set(SetTest::Between)),
    (".$notBetween", Operator::Set(SetTest::NotBetween)),
];

/// Compiles filter payloads for one model. Build a fresh compiler per request.
pub struct ConditionCompiler<'a, C: ModelCatalog + ?Sized> {
    model: &'a ModelDefinition,
    catalog: &'a C,
    used_columns: Vec<String>,
}

impl<'a, C: ModelCatalog + ?Sized> ConditionCompiler<'a, C> {
    pub fn new(model: &'a ModelDefinition, catalog: &'a C) -> Self {
        Self {
            model,
            catalog,
            used_columns: Vec::new(),
        }
    }

    /// Decode and compile the raw `q` payload.
    ///
    /// Spaces and `%20` sequences are removed before decoding. An absent or
    /// empty payload, or JSON `null`, compiles to an empty tree.
    pub fn compile(mut self, payload: Option<&str>) -> Result<CompiledConditions, QueryError> {
        let content = payload.unwrap_or_default().replace("%20", "").replace(' ', "");
        if content.is_empty() {
            return Ok(CompiledConditions::default());
        }

        let json: JsonValue =
            serde_json::from_str(&content).map_err(|_| QueryError::malformed(&content))?;
        let tree = self.compile_value(&json)?;

        Ok(CompiledConditions {
            tree,
            used_columns: self.used_columns,
        })
    }

    /// Compile an already decoded payload node
    pub fn compile_value(&mut self, value: &JsonValue) -> Result<ConditionTree, QueryError> {
        match value {
            JsonValue::Array(items) => items
                .iter()
                .map(|item| self.compile_value(item))
                .collect::<Result<_, _>>()
                .map(ConditionTree::Group),
            JsonValue::Object(fields) => fields
                .iter()
                .map(|(key, value)| self.classify(key, value).map(ConditionTree::Predicate))
                .collect::<Result<_, _>>()
                .map(ConditionTree::Group),
            JsonValue::Null => Ok(ConditionTree::default()),
            other => Err(QueryError::malformed(other.to_string())),
        }
    }

    /// Turn one `key: value` pair into a predicate
    pub fn classify(&mut self, key: &str, value: &JsonValue) -> Result<Predicate, QueryError> {
        // `$or.` then `$and.`; when both are present the later one wins
        let (mut prefix, mut field) = (None, key);
        if let Some(rest) = field.strip_prefix("$or.") {
            (prefix, field) = (Some(Boolean::Or), rest);
        }
        if let Some(rest) = field.strip_prefix("$and.") {
            (prefix, field) = (Some(Boolean::And), rest);
        }

        let (field, filter) = if value.is_null() {
            match field.strip_suffix(".$not") {
                Some(field) => (field, Filter::Null(NullCheck::IsNotNull)),
                None => (field, Filter::Null(NullCheck::IsNull)),
            }
        } else {
            let (field, operator) = SUFFIXES
                .iter()
                .find_map(|(suffix, op)| field.strip_suffix(suffix).map(|f| (f, *op)))
                .unwrap_or((field, Operator::Compare(Comparison::Eq)));
            (field, coerce(key, operator, value)?)
        };

        let mut predicate = Predicate {
            prefix,
            model: self.model.name.clone(),
            table: self.model.table.clone(),
            field: field.to_string(),
            filter,
            relation: None,
        };

        if let Some((relation_name, column)) = field.split_once('.') {
            let relation = self
                .model
                .relations
                .iter()
                .find(|r| r.name == relation_name && r.kind.is_to_one())
                .ok_or_else(|| QueryError::undefined_relation(field))?;
            let related = self
                .catalog
                .model(&relation.model)
                .ok_or_else(|| QueryError::undefined_model(&relation.model))?;

            predicate.model.clone_from(&related.name);
            predicate.table.clone_from(&related.table);
            predicate.field = column.to_string();
            predicate.relation = Some(relation.clone());
        }

        validate_column(&predicate.field)?;
        self.used_columns.push(predicate.column());

        Ok(predicate)
    }
}

fn coerce(key: &str, operator: Operator, value: &JsonValue) -> Result<Filter, QueryError> {
    let malformed = || QueryError::malformed(format!("{{\"{key}\":{value}}}"));

    match operator {
        Operator::Compare(op @ (Comparison::Like | Comparison::NotLike)) => {
            let pattern = value.as_str().ok_or_else(malformed)?;
            Ok(Filter::Compare(op, Scalar::Text(pattern.replace('*', "%"))))
        }
        Operator::Compare(op) => Scalar::from_json(value)
            .map(|scalar| Filter::Compare(op, scalar))
            .ok_or_else(malformed),
        Operator::Set(op) => {
            let separator = match op {
                SetTest::In | SetTest::NotIn => ',',
                SetTest::Between | SetTest::NotBetween => ':',
            };
            let values = match value {
                JsonValue::String(s) => s
                    .split(separator)
                    .map(Scalar::from_segment)
                    .collect(),
                JsonValue::Array(items) => items
                    .iter()
                    .map(Scalar::from_json)
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(malformed)?,
                _ => return Err(malformed()),
            };
            let is_range = matches!(op, SetTest::Between | SetTest::NotBetween);
            if is_range && values.len() != 2 {
                return Err(malformed());
            }
            Ok(Filter::Set(op, values))
        }
    }
}
