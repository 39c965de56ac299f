//! # Model Discovery
//!
//! Finds the data-model classes that get a repository.
//!
//! ```text
//! composer.json psr-4 → walk each root → candidate names → resolve → filter
//! ```
//!
//! Every source file under a registered root becomes a *candidate*: its
//! fully-qualified name is the root's namespace prefix followed by the file's
//! relative path with separators turned into `\` and the extension dropped.
//! Candidates are resolved through a [`TypeResolver`]; names that do not
//! resolve are excluded without error. A resolved type is eligible when it is
//! a concrete class whose supertype chain reaches one of the configured model
//! bases and it has not opted out with `#[Repository(enable: false)]`.
//!
//! Order is registration order of the roots, then file-name order within each
//! root, so repeated runs over the same tree produce the same list.

mod index;
pub mod manifest;
pub mod php;

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::{join_namespace, RepogenConfig};
use crate::error::{GenerateError, Result};

pub use index::PhpSourceIndex;
pub use manifest::{parse_source_roots, read_source_roots, SourceRoot};
pub use php::{Attribute, AttributeArg, TypeKind};

/// Attribute name that controls generation.
pub const OPT_OUT_ATTRIBUTE: &str = "Repository";

/// A source file and the type name it should declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Name derived from the root prefix and relative path
    pub fqn: String,
    /// Source file
    pub path: PathBuf,
}

/// Metadata the resolver exposes for a loadable type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    /// Fully-qualified name as declared
    pub fqn: String,
    /// Namespace part of `fqn`
    pub namespace: String,
    /// Unqualified name
    pub short_name: String,
    /// Declaration kind
    pub kind: TypeKind,
    /// Whether the class is abstract
    pub is_abstract: bool,
    /// Parent, grandparent, ... in order
    pub supertypes: Vec<String>,
    /// Attributes on the declaration
    pub attributes: Vec<Attribute>,
}

/// Answers whether a candidate names a loadable type.
pub trait TypeResolver {
    /// `Ok(None)` when the candidate does not correspond to a type; `Err` when
    /// it should but its metadata is corrupt.
    fn resolve(&self, candidate: &Candidate) -> Result<Option<TypeInfo>>;
}

/// Why a resolved type does or does not get a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// Concrete model that opted in
    Eligible,
    /// Interface, trait or enum
    NotAClass(TypeKind),
    /// Class outside the model hierarchy
    NotAModel,
    /// Abstract model
    Abstract,
    /// Model carrying `#[Repository(enable: false)]`
    OptedOut,
}

impl Eligibility {
    /// Whether repositories are generated.
    pub fn is_eligible(self) -> bool {
        self == Eligibility::Eligible
    }

    /// Whether the type is a model that was skipped; these are reported to the
    /// operator, other skips only to the log.
    pub fn is_skipped_model(self) -> bool {
        matches!(self, Eligibility::Abstract | Eligibility::OptedOut)
    }
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eligibility::Eligible => f.write_str("eligible"),
            Eligibility::NotAClass(kind) => write!(f, "{kind}, not a class"),
            Eligibility::NotAModel => f.write_str("not a model"),
            Eligibility::Abstract => f.write_str("abstract model"),
            Eligibility::OptedOut => f.write_str("disabled by #[Repository]"),
        }
    }
}

/// A discovered type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    /// Fully-qualified name
    pub fqn: String,
    /// Namespace part of `fqn`
    pub namespace: String,
    /// Unqualified name
    pub short_name: String,
    /// Declaring file
    pub source: PathBuf,
    /// Eligibility verdict
    pub eligibility: Eligibility,
}

impl ModelDescriptor {
    /// Whether repositories are generated for this type.
    pub fn is_eligible(&self) -> bool {
        self.eligibility.is_eligible()
    }
}

/// Result of a discovery pass.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Every resolved type, in discovery order
    pub resolved: Vec<ModelDescriptor>,
    /// Candidates that do not name a type
    pub unresolved: Vec<Candidate>,
}

impl Discovery {
    /// Eligible models in discovery order.
    pub fn models(&self) -> impl Iterator<Item = &ModelDescriptor> {
        self.resolved.iter().filter(|m| m.is_eligible())
    }

    /// Resolved types that were skipped, in discovery order.
    pub fn skipped(&self) -> impl Iterator<Item = &ModelDescriptor> {
        self.resolved.iter().filter(|m| !m.is_eligible())
    }
}

/// List candidates under every root. Roots that do not exist are skipped with
/// a warning; duplicate names keep their first occurrence.
pub fn enumerate_candidates(roots: &[SourceRoot], extension: &str) -> Result<Vec<Candidate>> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for root in roots {
        if !root.dir.is_dir() {
            tracing::warn!(prefix = %root.prefix, dir = %root.dir.display(), "source root does not exist");
            continue;
        }
        for entry in WalkDir::new(&root.dir).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&root.dir).to_path_buf();
                GenerateError::fs("list", &path, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension().and_then(|e| e.to_str()) != Some(extension) {
                continue;
            }
            let Some(fqn) = candidate_name(&root.prefix, &root.dir, entry.path()) else {
                tracing::debug!(path = %entry.path().display(), "path is not a valid type name");
                continue;
            };
            if !seen.insert(fqn.to_ascii_lowercase()) {
                tracing::debug!(%fqn, path = %entry.path().display(), "duplicate candidate ignored");
                continue;
            }
            candidates.push(Candidate {
                fqn,
                path: entry.into_path(),
            });
        }
    }
    Ok(candidates)
}

/// `App\` + `Models/User.php` → `App\Models\User`.
pub fn candidate_name(prefix: &str, root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(root).ok()?.with_extension("");
    let segments = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(join_namespace(prefix, &segments.join("\\")))
}

/// Classify candidates through a resolver.
pub fn classify<R: TypeResolver + ?Sized>(
    candidates: &[Candidate],
    resolver: &R,
    model_bases: &[String],
) -> Result<Discovery> {
    let mut discovery = Discovery::default();
    for candidate in candidates {
        match resolver.resolve(candidate)? {
            Some(info) => {
                let eligibility = eligibility(&info, model_bases);
                if eligibility.is_eligible() {
                    tracing::debug!(model = %info.fqn, "eligible model");
                } else {
                    tracing::info!(class = %info.fqn, reason = %eligibility, "skipped");
                }
                discovery.resolved.push(ModelDescriptor {
                    fqn: info.fqn,
                    namespace: info.namespace,
                    short_name: info.short_name,
                    source: candidate.path.clone(),
                    eligibility,
                });
            }
            None => {
                tracing::debug!(candidate = %candidate.fqn, "does not resolve to a type");
                discovery.unresolved.push(candidate.clone());
            }
        }
    }
    Ok(discovery)
}

/// Full discovery for a set of roots using the static PHP scanner.
pub fn discover_models(roots: &[SourceRoot], config: &RepogenConfig) -> Result<Discovery> {
    let candidates = enumerate_candidates(roots, &config.source_extension)?;
    let index = PhpSourceIndex::build(&candidates)?;
    classify(&candidates, &index, &config.model_bases)
}

/// Decide eligibility. Kind and model-ness are checked before opt-out, so an
/// attribute never makes an ineligible type eligible.
pub fn eligibility(info: &TypeInfo, model_bases: &[String]) -> Eligibility {
    if info.kind != TypeKind::Class {
        return Eligibility::NotAClass(info.kind);
    }
    let is_model = info.supertypes.iter().any(|sup| {
        model_bases
            .iter()
            .any(|base| base.trim_start_matches('\\').eq_ignore_ascii_case(sup))
    });
    if !is_model {
        Eligibility::NotAModel
    } else if info.is_abstract {
        Eligibility::Abstract
    } else if opted_out(&info.attributes) {
        Eligibility::OptedOut
    } else {
        Eligibility::Eligible
    }
}

/// `true` only for an explicit `enable` of `false` or `0`.
pub fn opted_out(attributes: &[Attribute]) -> bool {
    attributes
        .iter()
        .filter(|a| a.short_name().eq_ignore_ascii_case(OPT_OUT_ATTRIBUTE))
        .filter_map(|a| a.arg("enable", 0))
        .any(|value| {
            let value = value.trim().trim_start_matches('\\');
            value.eq_ignore_ascii_case("false") || value == "0"
        })
}
