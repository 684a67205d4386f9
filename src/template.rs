// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Tiny text templating.
//!
//! Every document tcollect hands to the user, and every confirmation it prints
//! back, is produced from a small template. The language is deliberately
//! limited: it can substitute values and pick between branches, nothing more.
//!
//! # Syntax
//!
//! - `{{ path.to.value }}` substitutes the value found at a dotted path. A
//!   trailing `()` is accepted on the path, so `{{ plan.focus_list() }}` and
//!   `{{ plan.focus_list }}` mean the same thing. Missing values render as
//!   nothing.
//! - `{% if cond %} … {% else %} … {% endif %}` selects a branch. A condition
//!   is a chain of operands joined by `and` / `or`, where each operand is a
//!   path optionally prefixed by `not`. `and` binds tighter than `or`, and
//!   evaluation stops as soon as the result is known.
//!
//! A block tag that sits alone on its line swallows the whole line, so
//! templates can put `{% if %}` on separate lines without leaving blank lines
//! behind.
//!
//! # Values
//!
//! A template is rendered against a [`Value`] tree made of maps, lists,
//! scalars and zero-argument accessors. Accessors are evaluated lazily, only
//! when a path or condition actually reaches them.

use std::{
    collections::BTreeMap,
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    sync::Arc,
};

/// Node of a template context tree.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Accessor(Accessor),
}

impl Value {
    /// Construct map value from key value pairs.
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Construct lazily evaluated value.
    pub fn accessor(func: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        Self::Accessor(Accessor(Arc::new(func)))
    }

    /// Follow dotted path segments through maps, lists and accessors.
    ///
    /// Numeric segments index into lists. Anything that cannot be followed
    /// yields [`Value::Null`].
    pub fn lookup<S: AsRef<str>>(&self, path: &[S]) -> Value {
        let Some((head, tail)) = path.split_first() else {
            return self.resolved();
        };

        match self {
            Value::Map(map) => map
                .get(head.as_ref())
                .map(|value| value.lookup(tail))
                .unwrap_or_default(),
            Value::List(items) => head
                .as_ref()
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get(index))
                .map(|value| value.lookup(tail))
                .unwrap_or_default(),
            Value::Accessor(accessor) => accessor.call().lookup(path),
            _ => Value::Null,
        }
    }

    /// Evaluate accessors until a concrete value remains.
    pub fn resolved(&self) -> Value {
        match self {
            Value::Accessor(accessor) => accessor.call().resolved(),
            other => other.clone(),
        }
    }

    /// Truthiness used by `{% if %}`.
    ///
    /// Null, false, zero, empty text, empty lists and empty maps are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(flag) => *flag,
            Value::Int(number) => *number != 0,
            Value::Text(text) => !text.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
            Value::Accessor(accessor) => accessor.call().is_truthy(),
        }
    }
}

impl Display for Value {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Value::Null | Value::Map(_) => Ok(()),
            Value::Bool(flag) => write!(fmt, "{flag}"),
            Value::Int(number) => write!(fmt, "{number}"),
            Value::Text(text) => fmt.write_str(text),
            Value::List(items) => {
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        fmt.write_str(", ")?;
                    }
                    write!(fmt, "{item}")?;
                }
                Ok(())
            }
            Value::Accessor(accessor) => write!(fmt, "{}", accessor.call()),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

impl From<i64> for Value {
    fn from(number: i64) -> Self {
        Self::Int(number)
    }
}

impl From<u64> for Value {
    fn from(number: u64) -> Self {
        i64::try_from(number)
            .map(Self::Int)
            .unwrap_or_else(|_| Self::Text(number.to_string()))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Self::Null,
            Json::Bool(flag) => Self::Bool(flag),
            Json::Number(number) => match number.as_i64() {
                Some(int) => Self::Int(int),
                None => Self::Text(number.to_string()),
            },
            Json::String(text) => Self::Text(text),
            Json::Array(items) => Self::List(items.into_iter().map(Into::into).collect()),
            Json::Object(map) => Self::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect()),
        }
    }
}

/// Zero-argument accessor inside a context tree.
#[derive(Clone)]
pub struct Accessor(Arc<dyn Fn() -> Value + Send + Sync>);

impl Accessor {
    fn call(&self) -> Value {
        (self.0)()
    }
}

impl Debug for Accessor {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str("Accessor(..)")
    }
}

/// Parsed template.
#[derive(Clone, Debug)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    /// Parse template source.
    ///
    /// # Errors
    ///
    /// - Return [`TemplateError`] if tags are malformed or unbalanced.
    pub fn parse(source: &str) -> Result<Self> {
        let mut tokens = tokenize(source)?.into_iter();
        let (nodes, end) = parse_nodes(&mut tokens)?;
        match end {
            Terminator::Eof => Ok(Self { nodes }),
            Terminator::Else => Err(TemplateError::UnexpectedBlock("else".into())),
            Terminator::Endif => Err(TemplateError::UnexpectedBlock("endif".into())),
        }
    }

    /// Render template against context.
    pub fn render(&self, context: &Value) -> String {
        let mut output = String::new();
        render_nodes(&self.nodes, context, &mut output);
        output
    }
}

/// Parse and render template source in one go.
///
/// # Errors
///
/// - Return [`TemplateError`] if tags are malformed or unbalanced.
pub fn render_template(source: &str, context: &Value) -> Result<String> {
    Ok(Template::parse(source)?.render(context))
}

#[derive(Clone, Debug)]
enum Node {
    Text(String),
    Var(Vec<String>),
    If {
        condition: Condition,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

/// Disjunction of conjunctions.
#[derive(Clone, Debug)]
struct Condition {
    any: Vec<Vec<Operand>>,
}

impl Condition {
    fn parse(source: &str) -> Result<Self> {
        let mut any = Vec::new();
        let mut all = Vec::new();
        let mut negate = false;
        let mut expect_operand = true;

        for word in source.split_whitespace() {
            match (word, expect_operand) {
                ("not", true) => negate = !negate,
                ("and", false) => expect_operand = true,
                ("or", false) => {
                    any.push(std::mem::take(&mut all));
                    expect_operand = true;
                }
                (path, true) => {
                    all.push(Operand {
                        negate,
                        path: parse_path(path)?,
                    });
                    negate = false;
                    expect_operand = false;
                }
                (_, false) => return Err(TemplateError::InvalidCondition(source.into())),
            }
        }

        if expect_operand {
            return Err(TemplateError::InvalidCondition(source.into()));
        }
        any.push(all);

        Ok(Self { any })
    }

    fn evaluate(&self, context: &Value) -> bool {
        self.any.iter().any(|all| {
            all.iter()
                .all(|operand| context.lookup(&operand.path).is_truthy() != operand.negate)
        })
    }
}

#[derive(Clone, Debug)]
struct Operand {
    negate: bool,
    path: Vec<String>,
}

fn parse_path(source: &str) -> Result<Vec<String>> {
    let trimmed = source.strip_suffix("()").unwrap_or(source);
    let segments = trimmed.split('.').map(str::to_string).collect::<Vec<_>>();
    if segments.iter().any(|segment| {
        segment.is_empty()
            || !segment
                .chars()
                .all(|ch| ch.is_alphanumeric() || ch == '_' || ch == '-')
    }) {
        return Err(TemplateError::InvalidPath(source.into()));
    }

    Ok(segments)
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    Text(String),
    Var(String),
    Block(String),
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut rest = source;
    let mut line_clean = true;

    loop {
        let var = rest.find("{{");
        let block = rest.find("{%");
        let (start, is_block) = match (var, block) {
            (None, None) => {
                if !rest.is_empty() {
                    tokens.push(Token::Text(rest.to_string()));
                }
                return Ok(tokens);
            }
            (Some(v), Some(b)) if b < v => (b, true),
            (Some(v), _) => (v, false),
            (None, Some(b)) => (b, true),
        };

        let mut text = &rest[..start];
        let after_open = &rest[start + 2..];
        let close = if is_block { "%}" } else { "}}" };
        let end = after_open
            .find(close)
            .ok_or(TemplateError::Unterminated(start))?;
        let body = after_open[..end].trim();
        if body.is_empty() {
            return Err(TemplateError::EmptyExpression);
        }
        let mut remaining = &after_open[end + 2..];

        if is_block {
            let line_start = text.rfind('\n').map(|index| index + 1);
            let lead = &text[line_start.unwrap_or(0)..];
            let trail_end = remaining.find('\n');
            let trail = &remaining[..trail_end.unwrap_or(remaining.len())];
            let starts_line = line_start.is_some() || line_clean;

            // INVARIANT: Standalone block tags consume their entire line.
            if starts_line && lead.trim().is_empty() && trail.trim().is_empty() {
                text = &text[..line_start.unwrap_or(0)];
                remaining = match trail_end {
                    Some(index) => &remaining[index + 1..],
                    None => "",
                };
                line_clean = true;
            } else {
                line_clean = false;
            }
        } else {
            line_clean = false;
        }

        if !text.is_empty() {
            tokens.push(Token::Text(text.to_string()));
        }
        tokens.push(if is_block {
            Token::Block(body.to_string())
        } else {
            Token::Var(body.to_string())
        });
        rest = remaining;
    }
}

enum Terminator {
    Else,
    Endif,
    Eof,
}

fn parse_nodes(tokens: &mut impl Iterator<Item = Token>) -> Result<(Vec<Node>, Terminator)> {
    let mut nodes = Vec::new();
    while let Some(token) = tokens.next() {
        match token {
            Token::Text(text) => nodes.push(Node::Text(text)),
            Token::Var(path) => nodes.push(Node::Var(parse_path(&path)?)),
            Token::Block(block) => {
                let (keyword, rest) = block
                    .split_once(char::is_whitespace)
                    .map(|(keyword, rest)| (keyword, rest.trim()))
                    .unwrap_or((block.as_str(), ""));
                match keyword {
                    "if" => {
                        let condition = Condition::parse(rest)?;
                        let (then, end) = parse_nodes(tokens)?;
                        let otherwise = match end {
                            Terminator::Endif => Vec::new(),
                            Terminator::Else => match parse_nodes(tokens)? {
                                (otherwise, Terminator::Endif) => otherwise,
                                (_, Terminator::Else) => {
                                    return Err(TemplateError::UnexpectedBlock("else".into()))
                                }
                                (_, Terminator::Eof) => return Err(TemplateError::UnclosedIf),
                            },
                            Terminator::Eof => return Err(TemplateError::UnclosedIf),
                        };
                        nodes.push(Node::If {
                            condition,
                            then,
                            otherwise,
                        });
                    }
                    "else" if rest.is_empty() => return Ok((nodes, Terminator::Else)),
                    "endif" if rest.is_empty() => return Ok((nodes, Terminator::Endif)),
                    _ => return Err(TemplateError::UnknownBlock(block)),
                }
            }
        }
    }

    Ok((nodes, Terminator::Eof))
}

fn render_nodes(nodes: &[Node], context: &Value, output: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => output.push_str(text),
            Node::Var(path) => output.push_str(&context.lookup(path).to_string()),
            Node::If {
                condition,
                then,
                otherwise,
            } => {
                if condition.evaluate(context) {
                    render_nodes(then, context, output);
                } else {
                    render_nodes(otherwise, context, output);
                }
            }
        }
    }
}

/// Template error types.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// Opening delimiter without closing delimiter.
    #[error("unterminated tag at byte {0}")]
    Unterminated(usize),

    /// Tag without content.
    #[error("empty template tag")]
    EmptyExpression,

    /// Block keyword other than if/else/endif.
    #[error("unknown block tag {0:?}")]
    UnknownBlock(String),

    /// Else or endif without matching if.
    #[error("unexpected {0:?} tag")]
    UnexpectedBlock(String),

    /// If without endif.
    #[error("missing endif tag")]
    UnclosedIf,

    /// Condition with dangling or doubled operators.
    #[error("invalid condition {0:?}")]
    InvalidCondition(String),

    /// Path with empty or invalid segments.
    #[error("invalid value path {0:?}")]
    InvalidPath(String),
}

/// Friendly result alias :3
type Result<T, E = TemplateError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use simple_test_case::test_case;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn context() -> Value {
        Value::map([
            ("date", Value::from("1 May (Monday)")),
            ("habits", Value::from("")),
            (
                "plan",
                Value::map([
                    ("focus", Value::from("- write")),
                    ("has_want", Value::from(false)),
                    (
                        "focus_list",
                        Value::accessor(|| Value::from("- write\n- read")),
                    ),
                ]),
            ),
            ("tags", Value::from(vec!["a", "b", "c"])),
            ("count", Value::from(3_i64)),
        ])
    }

    #[test]
    fn substitutes_dotted_paths() -> anyhow::Result<()> {
        let result = render_template("{{ date }}: {{ plan.focus }} [{{ tags }}]", &context())?;
        pretty_assertions::assert_eq!(result, "1 May (Monday): - write [a, b, c]");

        Ok(())
    }

    #[test]
    fn missing_paths_render_empty() -> anyhow::Result<()> {
        let result = render_template("<{{ nothing.here }}><{{ date.deeper }}>", &context())?;
        pretty_assertions::assert_eq!(result, "<><>");

        Ok(())
    }

    #[test]
    fn accessor_call_syntax() -> anyhow::Result<()> {
        let result = render_template("{{ plan.focus_list() }}", &context())?;
        pretty_assertions::assert_eq!(result, "- write\n- read");

        Ok(())
    }

    #[test]
    fn standalone_blocks_consume_their_line() -> anyhow::Result<()> {
        let template = indoc! {"
            # {{ date }}
            {% if plan and plan.focus %}
            {{ plan.focus_list() }}
            {% endif %}
            {% if habits %}
            ## Habits
            {% else %}
            No habits.
            {% endif %}
            Done.
        "};
        let expect = indoc! {"
            # 1 May (Monday)
            - write
            - read
            No habits.
            Done.
        "};
        pretty_assertions::assert_eq!(render_template(template, &context())?, expect);

        Ok(())
    }

    #[test]
    fn inline_blocks_keep_surrounding_text() -> anyhow::Result<()> {
        let result = render_template("a {% if count %}b{% else %}c{% endif %} d", &context())?;
        pretty_assertions::assert_eq!(result, "a b d");

        Ok(())
    }

    #[test]
    fn nested_conditions() -> anyhow::Result<()> {
        let template = "{% if plan %}{% if plan.has_want %}want{% else %}focus{% endif %}{% endif %}";
        pretty_assertions::assert_eq!(render_template(template, &context())?, "focus");

        Ok(())
    }

    #[test_case("habits or count", "yes"; "or picks second operand")]
    #[test_case("habits and count", "no"; "and fails on first operand")]
    #[test_case("habits and count or date", "yes"; "and binds tighter than or")]
    #[test_case("not habits", "yes"; "negated falsy operand")]
    #[test_case("not not habits", "no"; "double negation")]
    #[test_case("plan.has_want or tags", "yes"; "list truthiness")]
    #[test]
    fn boolean_conditions(condition: &str, expect: &str) {
        let template = format!("{{% if {condition} %}}yes{{% else %}}no{{% endif %}}");
        let result = render_template(&template, &context()).unwrap();
        pretty_assertions::assert_eq!(result, expect);
    }

    #[test]
    fn conditions_short_circuit() -> anyhow::Result<()> {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let context = Value::map([
            ("yes", Value::from(true)),
            (
                "expensive",
                Value::accessor(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Value::from(true)
                }),
            ),
        ]);

        render_template("{% if yes or expensive %}x{% endif %}", &context)?;
        pretty_assertions::assert_eq!(calls.load(Ordering::SeqCst), 0);

        render_template("{% if not yes and expensive %}x{% endif %}", &context)?;
        pretty_assertions::assert_eq!(calls.load(Ordering::SeqCst), 0);

        render_template("{% if yes and expensive %}x{% endif %}", &context)?;
        pretty_assertions::assert_eq!(calls.load(Ordering::SeqCst), 1);

        Ok(())
    }

    #[test]
    fn renders_json_contexts() -> anyhow::Result<()> {
        let json = serde_json::json!({
            "id": 42,
            "tags": ["x", "y"],
            "thread": {"name": "Daily"},
            "missing": null,
        });
        let result = render_template(
            "#{{ id }} {{ thread.name }} {{ tags }}{% if missing %}!{% endif %}",
            &Value::from(json),
        )?;
        pretty_assertions::assert_eq!(result, "#42 Daily x, y");

        Ok(())
    }

    #[test_case("{{ date", TemplateError::Unterminated(0); "unterminated variable")]
    #[test_case("{%  %}", TemplateError::EmptyExpression; "empty block")]
    #[test_case("{% for x %}", TemplateError::UnknownBlock("for x".into()); "unknown keyword")]
    #[test_case("{% endif %}", TemplateError::UnexpectedBlock("endif".into()); "stray endif")]
    #[test_case("{% if a %}x", TemplateError::UnclosedIf; "missing endif")]
    #[test_case("{% if a and %}{% endif %}", TemplateError::InvalidCondition("a and".into()); "dangling operator")]
    #[test_case("{{ a..b }}", TemplateError::InvalidPath("a..b".into()); "empty segment")]
    #[test]
    fn malformed_templates(source: &str, expect: TemplateError) {
        pretty_assertions::assert_eq!(Template::parse(source).unwrap_err(), expect);
    }
}
