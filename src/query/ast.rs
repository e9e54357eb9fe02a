//! Query Abstract Syntax Tree
//!
//! Statement types produced by the parser, with two stringers:
//!
//! - `Display` renders the full grammar and is idempotent through the parser.
//! - [`SelectStatement::legacy_string`] renders the reduced grammar accepted by
//!   the report download service: no aggregate functions, aliases, GROUP BY,
//!   ORDER BY or LIMIT.
//!
//! # Example
//!
//! ```text
//! SELECT CampaignName, SUM(Cost) AS cost FROM CAMPAIGN_PERFORMANCE_REPORT
//!   WHERE CampaignStatus = "ENABLED" DURING LAST_7_DAYS
//!   GROUP BY 1 ORDER BY 2 DESC LIMIT 5
//! ```

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::query::dates::{DateRangeLiteral, DATE_LAYOUT};

/// Name of the pseudo column used by `SELECT *` and `COUNT(*)`
pub const STAR: &str = "*";

/// A column reference with an optional alias
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Name displayed for this column: the alias when set
    pub fn label(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Aggregate functions available in the select list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AggregateFunction {
    Avg,
    Count,
    Max,
    Min,
    Sum,
}

impl AggregateFunction {
    /// Parse a function name, case-insensitively
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "AVG" => Some(Self::Avg),
            "COUNT" => Some(Self::Count),
            "MAX" => Some(Self::Max),
            "MIN" => Some(Self::Min),
            "SUM" => Some(Self::Sum),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Avg => "AVG",
            Self::Count => "COUNT",
            Self::Max => "MAX",
            Self::Min => "MIN",
            Self::Sum => "SUM",
        }
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A select list entry: a column, optionally wrapped in an aggregate
/// function and/or marked DISTINCT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicColumn {
    pub column: Column,
    #[serde(default)]
    pub function: Option<AggregateFunction>,
    #[serde(default)]
    pub distinct: bool,
}

impl DynamicColumn {
    pub fn new(column: Column) -> Self {
        Self {
            column,
            function: None,
            distinct: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.column.name
    }

    pub fn label(&self) -> &str {
        self.column.label()
    }

    /// `*` outside of any function
    pub fn is_star(&self) -> bool {
        self.column.name == STAR && self.function.is_none()
    }

    /// Whether this field collapses rows
    pub fn aggregates(&self) -> bool {
        self.distinct || self.function.is_some()
    }
}

/// A column referenced by its 1-based position in the select list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPosition {
    pub column: Column,
    pub position: usize,
}

/// WHERE comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    Equal,
    Different,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    In,
    NotIn,
    StartsWith,
    StartsWithIgnoreCase,
    Contains,
    ContainsIgnoreCase,
    DoesNotContain,
    DoesNotContainIgnoreCase,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::Different => "!=",
            Self::Greater => ">",
            Self::GreaterOrEqual => ">=",
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::In => "IN",
            Self::NotIn => "NOT_IN",
            Self::StartsWith => "STARTS_WITH",
            Self::StartsWithIgnoreCase => "STARTS_WITH_IGNORE_CASE",
            Self::Contains => "CONTAINS",
            Self::ContainsIgnoreCase => "CONTAINS_IGNORE_CASE",
            Self::DoesNotContain => "DOES_NOT_CONTAIN",
            Self::DoesNotContainIgnoreCase => "DOES_NOT_CONTAIN_IGNORE_CASE",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single WHERE predicate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub column: String,
    pub operator: Operator,
    /// One value, or several for a bracketed list
    pub values: Vec<String>,
    /// Bare literal values rather than quoted strings
    #[serde(default)]
    pub literal: bool,
}

/// DURING clause: a named range or two explicit days, never both
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum During {
    Literal(DateRangeLiteral),
    Range { start: NaiveDate, end: NaiveDate },
}

impl fmt::Display for During {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(literal) => write!(f, "{}", literal),
            Self::Range { start, end } => write!(
                f,
                "{},{}",
                start.format(DATE_LAYOUT),
                end.format(DATE_LAYOUT)
            ),
        }
    }
}

/// ORDER BY entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub column: ColumnPosition,
    #[serde(default)]
    pub desc: bool,
}

/// LIMIT clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limit {
    #[serde(default)]
    pub offset: usize,
    pub row_count: usize,
}

/// How a statement was terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Terminator {
    #[default]
    End,
    Semicolon,
    /// `\G`: vertical output requested
    Vertical,
}

/// SELECT statement
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectStatement {
    pub fields: Vec<DynamicColumn>,
    pub source: String,
    pub conditions: Vec<Condition>,
    pub during: Option<During>,
    pub group_by: Vec<ColumnPosition>,
    pub order_by: Vec<Order>,
    pub limit: Option<Limit>,
    pub terminator: Terminator,
}

impl SelectStatement {
    /// Whether at least one field is DISTINCT or uses an aggregate function
    pub fn aggregates(&self) -> bool {
        self.fields.iter().any(DynamicColumn::aggregates)
    }

    /// Render the reduced grammar sent to the report download service
    pub fn legacy_string(&self) -> String {
        let mut q = String::from("SELECT ");
        let names: Vec<&str> = self.fields.iter().map(DynamicColumn::name).collect();
        q.push_str(&names.join(", "));
        q.push_str(" FROM ");
        q.push_str(&self.source);
        push_where(&mut q, &self.conditions);
        push_during(&mut q, self.during.as_ref());
        q
    }
}

impl fmt::Display for SelectStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<String> = self.fields.iter().map(field_string).collect();
        let mut q = format!("SELECT {} FROM {}", fields.join(", "), self.source);
        push_where(&mut q, &self.conditions);
        push_during(&mut q, self.during.as_ref());

        if !self.group_by.is_empty() {
            let positions: Vec<String> = self
                .group_by
                .iter()
                .map(|g| g.position.to_string())
                .collect();
            q.push_str(" GROUP BY ");
            q.push_str(&positions.join(", "));
        }

        if !self.order_by.is_empty() {
            let orders: Vec<String> = self
                .order_by
                .iter()
                .map(|o| {
                    if o.desc {
                        format!("{} DESC", o.column.position)
                    } else {
                        o.column.position.to_string()
                    }
                })
                .collect();
            q.push_str(" ORDER BY ");
            q.push_str(&orders.join(", "));
        }

        if let Some(limit) = self.limit {
            q.push_str(" LIMIT ");
            if limit.offset > 0 {
                q.push_str(&format!("{}, ", limit.offset));
            }
            q.push_str(&limit.row_count.to_string());
        }

        f.write_str(&q)
    }
}

fn field_string(field: &DynamicColumn) -> String {
    let mut s = String::new();
    if field.distinct {
        s.push_str("DISTINCT ");
    }
    s.push_str(&field.column.name);
    if let Some(function) = field.function {
        s = format!("{}({})", function, s);
    }
    if let Some(alias) = &field.column.alias {
        s.push_str(" AS ");
        s.push_str(alias);
    }
    s
}

fn push_where(q: &mut String, conditions: &[Condition]) {
    if conditions.is_empty() {
        return;
    }
    let rendered: Vec<String> = conditions
        .iter()
        .map(|c| {
            let values: Vec<String> = c
                .values
                .iter()
                .map(|v| if c.literal { v.clone() } else { quote(v) })
                .collect();
            let value = if values.len() > 1 {
                format!("[{}]", values.join(", "))
            } else {
                values.join("")
            };
            format!("{} {} {}", c.column, c.operator, value)
        })
        .collect();
    q.push_str(" WHERE ");
    q.push_str(&rendered.join(" AND "));
}

fn push_during(q: &mut String, during: Option<&During>) {
    if let Some(during) = during {
        q.push_str(" DURING ");
        q.push_str(&during.to_string());
    }
}

/// Double-quote a string, escaping backslashes and double quotes
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// DESC / DESCRIBE statement
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DescribeStatement {
    pub full: bool,
    pub source: String,
    pub column: Option<String>,
    pub terminator: Terminator,
}

impl fmt::Display for DescribeStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DESC ")?;
        if self.full {
            f.write_str("FULL ")?;
        }
        f.write_str(&self.source)?;
        if let Some(column) = &self.column {
            write!(f, " {}", column)?;
        }
        Ok(())
    }
}

/// SHOW TABLES LIKE pattern, with the `%` wildcards already interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikePattern {
    Equal(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
}

impl LikePattern {
    /// Interpret leading and trailing `%` wildcards
    pub fn parse(pattern: &str) -> Self {
        let starts = pattern.starts_with('%');
        let ends = pattern.len() > 1 && pattern.ends_with('%');
        match (starts, ends) {
            (true, true) => Self::Contains(pattern[1..pattern.len() - 1].to_string()),
            (true, false) => Self::Suffix(pattern[1..].to_string()),
            (false, true) => Self::Prefix(pattern[..pattern.len() - 1].to_string()),
            (false, false) => Self::Equal(pattern.to_string()),
        }
    }
}

impl fmt::Display for LikePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pattern = match self {
            Self::Equal(s) => s.clone(),
            Self::Prefix(s) => format!("{}%", s),
            Self::Suffix(s) => format!("%{}", s),
            Self::Contains(s) => format!("%{}%", s),
        };
        f.write_str(&quote(&pattern))
    }
}

/// SHOW TABLES statement
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShowStatement {
    pub full: bool,
    pub like: Option<LikePattern>,
    pub with: Option<String>,
    pub terminator: Terminator,
}

impl fmt::Display for ShowStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SHOW ")?;
        if self.full {
            f.write_str("FULL ")?;
        }
        f.write_str("TABLES")?;
        if let Some(like) = &self.like {
            write!(f, " LIKE {}", like)?;
        }
        if let Some(with) = &self.with {
            write!(f, " WITH {}", quote(with))?;
        }
        Ok(())
    }
}

/// CREATE [OR REPLACE] VIEW statement
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CreateViewStatement {
    pub replace: bool,
    pub name: String,
    /// Explicit column names, empty when not given
    pub columns: Vec<String>,
    pub select: SelectStatement,
}

impl fmt::Display for CreateViewStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CREATE ")?;
        if self.replace {
            f.write_str("OR REPLACE ")?;
        }
        write!(f, "VIEW {}", self.name)?;
        if !self.columns.is_empty() {
            write!(f, " ({})", self.columns.join(", "))?;
        }
        write!(f, " AS {}", self.select)
    }
}

/// A parsed statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Select(SelectStatement),
    Describe(DescribeStatement),
    Show(ShowStatement),
    CreateView(CreateViewStatement),
}

impl Statement {
    pub fn terminator(&self) -> Terminator {
        match self {
            Self::Select(s) => s.terminator,
            Self::Describe(s) => s.terminator,
            Self::Show(s) => s.terminator,
            Self::CreateView(s) => s.select.terminator,
        }
    }

    /// Whether the statement ended with `\G`
    pub fn vertical(&self) -> bool {
        self.terminator() == Terminator::Vertical
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select(s) => s.fmt(f),
            Self::Describe(s) => s.fmt(f),
            Self::Show(s) => s.fmt(f),
            Self::CreateView(s) => s.fmt(f),
        }
    }
}
