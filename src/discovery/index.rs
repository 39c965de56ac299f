//! [`TypeResolver`] backed by statically scanned PHP sources.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use super::php::{scan_declaration, PhpDeclaration};
use super::{Candidate, TypeInfo, TypeResolver};
use crate::error::{GenerateError, Result};

struct IndexEntry {
    path: PathBuf,
    scanned: std::result::Result<Option<PhpDeclaration>, String>,
}

/// Declarations of every candidate file, keyed by lower-cased candidate name.
///
/// Supertype chains are followed through this index; a parent that is not in
/// it lives outside the project and ends the chain.
pub struct PhpSourceIndex {
    entries: HashMap<String, IndexEntry>,
}

impl PhpSourceIndex {
    /// Read and scan every candidate. Unreadable files are fatal; files whose
    /// header cannot be parsed only fail once something resolves them.
    pub fn build(candidates: &[Candidate]) -> Result<Self> {
        let mut entries = HashMap::with_capacity(candidates.len());
        for candidate in candidates {
            let bytes = std::fs::read(&candidate.path)
                .map_err(|e| GenerateError::fs("read", &candidate.path, e))?;
            let source = String::from_utf8_lossy(&bytes);
            entries
                .entry(candidate.fqn.to_ascii_lowercase())
                .or_insert_with(|| IndexEntry {
                    path: candidate.path.clone(),
                    scanned: scan_declaration(&source),
                });
        }
        tracing::debug!(files = entries.len(), "indexed candidate sources");
        Ok(PhpSourceIndex { entries })
    }

    /// Declaration for `fqn`, if a scanned file declares exactly that type.
    fn declaration(&self, fqn: &str) -> Result<Option<&PhpDeclaration>> {
        let Some(entry) = self.entries.get(&fqn.to_ascii_lowercase()) else {
            return Ok(None);
        };
        match &entry.scanned {
            Err(reason) => Err(GenerateError::type_resolution(fqn, &entry.path, reason.clone())),
            Ok(Some(decl)) if decl.fqn().eq_ignore_ascii_case(fqn) => Ok(Some(decl)),
            Ok(_) => Ok(None),
        }
    }
}

impl TypeResolver for PhpSourceIndex {
    fn resolve(&self, candidate: &Candidate) -> Result<Option<TypeInfo>> {
        let Some(decl) = self.declaration(&candidate.fqn)? else {
            return Ok(None);
        };

        let fqn = decl.fqn();
        let mut seen = HashSet::from([fqn.to_ascii_lowercase()]);
        let mut supertypes = Vec::new();
        let mut next = decl.parent.clone();
        while let Some(parent) = next {
            if !seen.insert(parent.to_ascii_lowercase()) {
                return Err(GenerateError::type_resolution(
                    &fqn,
                    &candidate.path,
                    format!("cyclic inheritance through `{parent}`"),
                ));
            }
            next = self.declaration(&parent)?.and_then(|d| d.parent.clone());
            supertypes.push(parent);
        }

        Ok(Some(TypeInfo {
            namespace: decl.namespace.clone(),
            short_name: decl.name.clone(),
            fqn,
            kind: decl.kind,
            is_abstract: decl.is_abstract,
            supertypes,
            attributes: decl.attributes.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn index(files: &[(&str, &str)]) -> (TempDir, Vec<Candidate>, PhpSourceIndex) {
        let dir = TempDir::new().unwrap();
        let candidates: Vec<Candidate> = files
            .iter()
            .map(|(fqn, source)| {
                let path = dir.path().join(format!("{}.php", fqn.replace('\\', "_")));
                std::fs::write(&path, source).unwrap();
                Candidate {
                    fqn: fqn.to_string(),
                    path,
                }
            })
            .collect();
        let index = PhpSourceIndex::build(&candidates).unwrap();
        (dir, candidates, index)
    }

    #[test]
    fn test_chain_follows_project_parents_then_stops_outside() {
        let (_dir, candidates, index) = index(&[
            (
                "App\\Models\\User",
                "<?php namespace App\\Models; class User extends BaseEntity {}",
            ),
            (
                "App\\Models\\BaseEntity",
                "<?php namespace App\\Models; use Illuminate\\Database\\Eloquent\\Model; abstract class BaseEntity extends Model {}",
            ),
        ]);
        let info = index.resolve(&candidates[0]).unwrap().unwrap();
        assert_eq!(
            info.supertypes,
            vec!["App\\Models\\BaseEntity", "Illuminate\\Database\\Eloquent\\Model"]
        );
    }

    #[test]
    fn test_class_extending_itself_is_a_resolution_error() {
        let (_dir, candidates, index) = index(&[(
            "App\\Models\\Loop",
            "<?php namespace App\\Models; class Loop extends Loop {}",
        )]);
        let err = index.resolve(&candidates[0]).unwrap_err();
        assert!(
            matches!(&err, GenerateError::TypeResolution { fqn, reason, .. }
                if fqn == "App\\Models\\Loop" && reason.contains("cyclic")),
            "{err}"
        );
    }

    #[test]
    fn test_two_class_cycle_is_a_resolution_error() {
        let (_dir, candidates, index) = index(&[
            ("App\\Models\\A", "<?php namespace App\\Models; class A extends B {}"),
            ("App\\Models\\B", "<?php namespace App\\Models; class B extends A {}"),
        ]);
        for candidate in &candidates {
            assert!(matches!(
                index.resolve(candidate),
                Err(GenerateError::TypeResolution { .. })
            ));
        }
    }
}
