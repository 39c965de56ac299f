use regex::{Captures, Regex};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{GenerateError, Result};

/// The five templates shipped with the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateId {
    /// Shared `EloquentRepositoryInterface`
    BaseInterface,
    /// Shared `ModelRepository` implementation
    BaseRepository,
    /// Per-model `<Model>RepositoryInterface`
    ModelInterface,
    /// Per-model `<Model>Repository`
    ModelRepository,
    /// `RepositoryServiceProvider` wiring file
    Provider,
}

impl TemplateId {
    /// Every template, in publication order.
    pub const ALL: [TemplateId; 5] = [
        TemplateId::BaseInterface,
        TemplateId::BaseRepository,
        TemplateId::ModelInterface,
        TemplateId::ModelRepository,
        TemplateId::Provider,
    ];

    /// Stable identifier, also the override file stem (`<name>.stub`).
    pub const fn name(self) -> &'static str {
        match self {
            TemplateId::BaseInterface => "eloquent-repository-interface",
            TemplateId::BaseRepository => "model-repository",
            TemplateId::ModelInterface => "repository-interface",
            TemplateId::ModelRepository => "repository",
            TemplateId::Provider => "repository-provider",
        }
    }

    /// Look a template up by its identifier.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }

    const fn builtin(self) -> &'static str {
        match self {
            TemplateId::BaseInterface => {
                include_str!("../../templates/eloquent-repository-interface.stub")
            }
            TemplateId::BaseRepository => include_str!("../../templates/model-repository.stub"),
            TemplateId::ModelInterface => {
                include_str!("../../templates/repository-interface.stub")
            }
            TemplateId::ModelRepository => include_str!("../../templates/repository.stub"),
            TemplateId::Provider => include_str!("../../templates/repository-provider.stub"),
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Placeholder values for a single render call.
///
/// Keys are upper-cased on insertion, so `model` and `MODEL` address the same
/// `$MODEL$` token; inserting a key twice keeps the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateContext {
    values: BTreeMap<String, String>,
}

impl TemplateContext {
    /// Empty context (templates render verbatim).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a value for `$KEY$`.
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.values
            .insert(key.as_ref().to_uppercase(), value.into());
    }

    /// Value bound to a key, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&key.to_uppercase()).map(String::as_str)
    }

    /// Number of bound keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no key is bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for TemplateContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut ctx = TemplateContext::new();
        for (k, v) in iter {
            ctx.insert(k, v);
        }
        ctx
    }
}

/// Replace every `$KEY$` token bound in `ctx` in a single pass.
///
/// Only the literal tokens of bound keys are matched, longest first, so a
/// stray `$` or an unbound token never hides a bound one. Substituted values
/// are never rescanned. Tokens without a binding are left verbatim and
/// bindings without a token are ignored.
pub fn substitute(template: &str, ctx: &TemplateContext) -> String {
    let mut tokens: Vec<(String, &str)> = ctx
        .values
        .iter()
        .map(|(key, value)| (format!("${key}$"), value.as_str()))
        .collect();
    if tokens.is_empty() {
        return template.to_string();
    }
    tokens.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let pattern = tokens
        .iter()
        .map(|(token, _)| regex::escape(token))
        .collect::<Vec<_>>()
        .join("|");
    match Regex::new(&pattern) {
        Ok(re) => re
            .replace_all(template, |caps: &Captures<'_>| {
                lookup(&tokens, &caps[0]).unwrap_or(&caps[0]).to_string()
            })
            .into_owned(),
        Err(err) => {
            tracing::warn!(%err, keys = tokens.len(), "placeholder pattern too large, scanning literally");
            scan_literal(template, &tokens)
        }
    }
}

fn lookup<'a>(tokens: &[(String, &'a str)], token: &str) -> Option<&'a str> {
    tokens.iter().find(|(t, _)| t == token).map(|(_, v)| *v)
}

/// Same leftmost, longest-token-first replacement without a compiled pattern.
fn scan_literal(template: &str, tokens: &[(String, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    'outer: while let Some(ch) = rest.chars().next() {
        for (token, value) in tokens {
            if let Some(after) = rest.strip_prefix(token.as_str()) {
                out.push_str(value);
                rest = after;
                continue 'outer;
            }
        }
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    out
}

/// Resolves template identifiers to template text.
///
/// A stub in the override directory wins over the built-in template of the
/// same name; identifiers known to neither are `TemplateNotFound`.
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    override_dir: Option<PathBuf>,
}

impl TemplateStore {
    /// Store serving only the built-in templates.
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Store that checks `dir/<name>.stub` before the built-ins.
    pub fn with_overrides(dir: impl Into<PathBuf>) -> Self {
        TemplateStore {
            override_dir: Some(dir.into()),
        }
    }

    /// Directory consulted for override stubs.
    pub fn override_dir(&self) -> Option<&Path> {
        self.override_dir.as_deref()
    }

    /// Raw template text for an identifier.
    ///
    /// # Errors
    ///
    /// `TemplateNotFound` when neither an override nor a built-in exists, or
    /// when the override exists but cannot be read.
    pub fn load(&self, name: &str) -> Result<Cow<'static, str>> {
        if let Some(dir) = &self.override_dir {
            let path = dir.join(format!("{name}.stub"));
            if path.is_file() {
                tracing::debug!(template = name, path = %path.display(), "using override stub");
                return std::fs::read_to_string(&path)
                    .map(Cow::Owned)
                    .map_err(|_| GenerateError::TemplateNotFound {
                        name: name.to_string(),
                    });
            }
        }
        TemplateId::from_name(name)
            .map(|id| Cow::Borrowed(id.builtin()))
            .ok_or_else(|| GenerateError::TemplateNotFound {
                name: name.to_string(),
            })
    }

    /// Load a template and substitute its placeholders.
    pub fn render(&self, name: &str, ctx: &TemplateContext) -> Result<String> {
        let raw = self.load(name)?;
        Ok(substitute(&raw, ctx))
    }

    /// Shorthand for rendering one of the shipped templates.
    pub fn render_id(&self, id: TemplateId, ctx: &TemplateContext) -> Result<String> {
        self.render(id.name(), ctx)
    }
}
