//! Page template rendering.
//!
//! Templates use `${name}` for substitution. Only placeholders whose body is
//! a dotted identifier path (`${version}`, `${project.url}`) are evaluated;
//! any other `${...}` text, such as shell defaults like `${HOME:-/root}`, is
//! copied unchanged. There are no control blocks, so JSP or ERB snippets and
//! Confluence wiki macros like `{toc}` or `{code}` need no escaping.
//!
//! Property keys containing dots are exposed as nested maps: the property
//! `project.url` is referenced as `${project.url}`.

use std::collections::{BTreeMap, HashSet};

use minijinja::{Environment, ErrorKind, UndefinedBehavior, Value};
use tracing::debug;

use crate::properties::PropertySet;
use crate::resolver::ResolveError;

/// Error producing page markup.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// Source could not be read.
    #[error("cannot read template source")]
    Source(#[from] ResolveError),

    /// Placeholder is not a valid expression (e.g. `${not}`).
    #[error("invalid template syntax")]
    Syntax(#[source] minijinja::Error),

    /// Evaluation failed (e.g. undefined variable in strict mode).
    #[error("template rendering failed")]
    Render(#[source] minijinja::Error),
}

/// Evaluator options.
#[derive(Debug, Clone, Copy)]
pub struct TemplateOptions {
    /// Render referenced-but-undefined variables as empty text instead of
    /// failing.
    pub skip_undefined: bool,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            skip_undefined: true,
        }
    }
}

/// Renders page sources with a [`PropertySet`].
#[derive(Debug, Clone, Default)]
pub struct TemplateRenderer {
    options: TemplateOptions,
}

impl TemplateRenderer {
    /// Create a renderer with the given options.
    #[must_use]
    pub fn new(options: TemplateOptions) -> Self {
        Self { options }
    }

    /// Substitute `props` into `source`.
    ///
    /// Every property is bound as an optional variable: properties the
    /// template never mentions are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Syntax`] for placeholders that are not valid
    /// expressions and [`TemplateError::Render`] when evaluation fails.
    pub fn render(&self, source: &str, props: &PropertySet) -> Result<String, TemplateError> {
        let segments = parse(source);

        let referenced: HashSet<String> = segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Variable(path) => Some((*path).to_owned()),
                Segment::Text(_) => None,
            })
            .collect();
        for (key, _) in props.iter() {
            if !is_referenced(&referenced, key) {
                debug!(variable = key, "Variable not referenced by template");
            }
        }

        let env = self.environment();
        let context = build_context(props);
        let mut out = String::with_capacity(source.len());
        for segment in segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Variable(path) => {
                    let expr = env
                        .compile_expression(path)
                        .map_err(TemplateError::Syntax)?;
                    let value = expr.eval(&context).map_err(TemplateError::Render)?;
                    if value.is_undefined() {
                        if !self.options.skip_undefined {
                            return Err(TemplateError::Render(minijinja::Error::new(
                                ErrorKind::UndefinedError,
                                format!("'{path}' is undefined"),
                            )));
                        }
                    } else {
                        out.push_str(&value.to_string());
                    }
                }
            }
        }
        Ok(out)
    }

    fn environment<'s>(&self) -> Environment<'s> {
        let mut env = Environment::new();
        env.set_undefined_behavior(if self.options.skip_undefined {
            UndefinedBehavior::Chainable
        } else {
            UndefinedBehavior::Strict
        });
        env
    }
}

/// Piece of a template source.
#[derive(Debug, PartialEq, Eq)]
enum Segment<'s> {
    /// Copied verbatim.
    Text(&'s str),
    /// Body of a `${...}` placeholder.
    Variable(&'s str),
}

/// Split `source` into literal text and `${path}` placeholders.
fn parse(source: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut rest = source;

    while let Some(start) = rest.find("${") {
        let body = &rest[start + 2..];
        match body.find('}') {
            Some(end) if is_variable_path(&body[..end]) => {
                if start > 0 {
                    segments.push(Segment::Text(&rest[..start]));
                }
                segments.push(Segment::Variable(&body[..end]));
                rest = &body[end + 1..];
            }
            _ => {
                segments.push(Segment::Text(&rest[..start + 2]));
                rest = body;
            }
        }
    }
    if !rest.is_empty() {
        segments.push(Segment::Text(rest));
    }
    segments
}

/// `ident(.ident)*` where identifiers are ASCII letters, digits and `_`.
fn is_variable_path(body: &str) -> bool {
    !body.is_empty()
        && body.split('.').all(|ident| {
            let mut chars = ident.chars();
            chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

/// Whether `key` is used by the template, directly or as a nested prefix.
fn is_referenced(referenced: &HashSet<String>, key: &str) -> bool {
    referenced.iter().any(|var| {
        var == key
            || var
                .strip_prefix(key)
                .is_some_and(|rest| rest.starts_with('.'))
            || key
                .strip_prefix(var.as_str())
                .is_some_and(|rest| rest.starts_with('.'))
    })
}

/// Property tree built from dotted keys.
enum Slot {
    Leaf(String),
    Branch(BTreeMap<String, Slot>),
}

impl Slot {
    fn into_value(self) -> Value {
        match self {
            Self::Leaf(s) => Value::from(s),
            Self::Branch(map) => Value::from(
                map.into_iter()
                    .map(|(k, v)| (k, v.into_value()))
                    .collect::<BTreeMap<String, Value>>(),
            ),
        }
    }
}

/// Build the render context, nesting dotted keys.
///
/// Keys are visited in sorted order, so a plain key (`project`) is seen
/// before dotted keys below it (`project.url`); the plain value wins.
fn build_context(props: &PropertySet) -> BTreeMap<String, Value> {
    let mut root: BTreeMap<String, Slot> = BTreeMap::new();

    'props: for (key, value) in props.iter() {
        let mut segments: Vec<&str> = key.split('.').collect();
        let Some(last) = segments.pop() else {
            continue;
        };

        let mut current = &mut root;
        for segment in segments {
            current = match current
                .entry(segment.to_owned())
                .or_insert_with(|| Slot::Branch(BTreeMap::new()))
            {
                Slot::Branch(children) => children,
                Slot::Leaf(_) => {
                    debug!(property = key, "Property shadowed by another key, not bound");
                    continue 'props;
                }
            };
        }

        if current.contains_key(last) {
            debug!(property = key, "Property shadowed by another key, not bound");
            continue;
        }
        current.insert(last.to_owned(), Slot::Leaf(value.to_owned()));
    }

    root.into_iter()
        .map(|(k, slot)| (k, slot.into_value()))
        .collect()
}
