//! Structure resolution.
//!
//! A table's row layout is not always stored next to its rows. The resolver
//! determines a [`Structure`] for a `(file path, table name)` pair from two
//! sources:
//!
//! 1. An external schema index: `<schema root>/structure.json` maps
//!    file-path regexes to schema file names; each schema file maps a table
//!    name (or table-name regex) to an ordered `{field name: type string}`
//!    object. Walks follow JSON declaration order; the first match wins.
//! 2. For the 64-bit dialect, the in-band schema preamble: a field count
//!    followed by one type code per field. The preamble is authoritative
//!    but anonymous, so a file-based result that agrees with it position
//!    for position is preferred for its human-readable names.
//!
//! Schema problems are never fatal: a missing root, unreadable file, or
//! unparseable JSON demotes to "no schema" (an empty structure), and
//! unrecognised type strings bind to [`EntryType::Empty`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use regex::Regex;
use serde_json::Value as JsonValue;

use expa_common::types::{EntryType, StructureEntry};

use crate::config::ResolverConfig;
use crate::structure::Structure;

type SchemaObject = serde_json::Map<String, JsonValue>;

/// Resolves table structures from the on-disk schema index.
///
/// Parsed schema files are cached for the resolver's lifetime, so repeated
/// lookups against the same index cost one disk read per file.
#[derive(Debug, Default)]
pub struct StructureResolver {
    config: ResolverConfig,
    cache: Mutex<HashMap<PathBuf, Option<Arc<SchemaObject>>>>,
}

impl StructureResolver {
    /// Creates a resolver over the given schema root.
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// The resolver configuration.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolves a structure from the schema index alone (32-bit dialect).
    ///
    /// Returns an empty structure when no schema applies.
    pub fn resolve(&self, file_path: &Path, table_name: &str) -> Structure {
        Structure::new(self.entries_from_schema(file_path, table_name))
    }

    /// Resolves a structure from the in-band preamble type codes,
    /// reconciled against the schema index (64-bit dialect).
    ///
    /// The file-based result is used only when it matches the preamble in
    /// length and position-wise types; otherwise the in-band structure wins
    /// with synthesised `"{type} {index}"` field names.
    pub fn resolve_with_preamble(
        &self,
        file_path: &Path,
        table_name: &str,
        codes: &[u32],
    ) -> Structure {
        let inband: Vec<StructureEntry> = codes
            .iter()
            .enumerate()
            .map(|(index, &code)| {
                let ty = EntryType::from_u32(code);
                StructureEntry::new(format!("{} {}", ty, index), ty)
            })
            .collect();

        let from_file = self.entries_from_schema(file_path, table_name);
        if from_file.is_empty() || from_file.len() != inband.len() {
            return Structure::new(inband);
        }

        let disagrees = inband
            .iter()
            .zip(&from_file)
            .any(|(a, b)| a.entry_type != b.entry_type);
        if disagrees {
            tracing::warn!(
                table = table_name,
                "schema file disagrees with in-band structure, keeping in-band types"
            );
            return Structure::new(inband);
        }

        Structure::new(from_file)
    }

    /// File-based lookup: index walk, schema-file walk, type translation.
    fn entries_from_schema(&self, file_path: &Path, table_name: &str) -> Vec<StructureEntry> {
        if !self.config.schema_root_exists() {
            return Vec::new();
        }
        let Some(schema_file) = self.schema_file_for(file_path) else {
            return Vec::new();
        };
        let Some(schema) = self.load_object(&self.config.schema_path(&schema_file)) else {
            return Vec::new();
        };

        // Exact table name first; otherwise the first declaration whose key,
        // wrapped as a full-match regex, matches the name.
        let fields = schema.get(table_name).or_else(|| {
            schema.iter().find_map(|(pattern, value)| {
                compile_regex(&format!("^(?:{})$", pattern))
                    .filter(|re| re.is_match(table_name))
                    .map(|_| value)
            })
        });

        let Some(JsonValue::Object(fields)) = fields else {
            return Vec::new();
        };

        fields
            .iter()
            .map(|(name, type_string)| {
                StructureEntry::new(
                    name.clone(),
                    EntryType::from_schema_str(type_string.as_str().unwrap_or("")),
                )
            })
            .collect()
    }

    /// Walks the index in declaration order; the first path regex that
    /// matches selects the schema file.
    fn schema_file_for(&self, file_path: &Path) -> Option<String> {
        let index = self.load_object(&self.config.index_path())?;
        let haystack = file_path.to_string_lossy();

        for (pattern, value) in index.iter() {
            let Some(re) = compile_regex(pattern) else {
                continue;
            };
            if re.is_match(&haystack) {
                return value.as_str().map(str::to_owned);
            }
        }
        None
    }

    /// Loads a JSON object from disk, through the cache. Unreadable or
    /// unparseable files cache as absent.
    fn load_object(&self, path: &Path) -> Option<Arc<SchemaObject>> {
        let mut cache = self.cache.lock();
        if let Some(cached) = cache.get(path) {
            return cached.clone();
        }
        let loaded = read_object(path);
        cache.insert(path.to_path_buf(), loaded.clone());
        loaded
    }
}

fn read_object(path: &Path) -> Option<Arc<SchemaObject>> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "schema file not readable");
            return None;
        }
    };
    match serde_json::from_str::<JsonValue>(&text) {
        Ok(JsonValue::Object(map)) => Some(Arc::new(map)),
        Ok(_) => {
            tracing::warn!(path = %path.display(), "schema file is not a JSON object, ignoring");
            None
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "malformed schema file, ignoring");
            None
        }
    }
}

fn compile_regex(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(err) => {
            tracing::warn!(pattern, error = %err, "invalid schema regex, skipping");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_schema(root: &Path, index: &str, files: &[(&str, &str)]) {
        fs::create_dir_all(root).unwrap();
        fs::write(root.join("structure.json"), index).unwrap();
        for (name, body) in files {
            fs::write(root.join(name), body).unwrap();
        }
    }

    fn resolver(root: &Path) -> StructureResolver {
        StructureResolver::new(ResolverConfig::new(root))
    }

    #[test]
    fn test_missing_schema_root_yields_empty() {
        let tmp = TempDir::new().unwrap();
        let r = resolver(&tmp.path().join("nope"));
        assert!(r.resolve(Path::new("data/skill.mbe"), "skill").is_empty());
    }

    #[test]
    fn test_exact_table_lookup_preserves_order() {
        let tmp = TempDir::new().unwrap();
        write_schema(
            tmp.path(),
            r#"{ "skill": "skills.json" }"#,
            &[(
                "skills.json",
                r#"{ "skill_para": { "id": "int", "rate": "float", "name": "string" } }"#,
            )],
        );

        let r = resolver(tmp.path());
        let s = r.resolve(Path::new("data/skill.mbe"), "skill_para");
        let entries = s.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].name, "id");
        assert_eq!(entries[0].entry_type, EntryType::Int32);
        assert_eq!(entries[1].name, "rate");
        assert_eq!(entries[1].entry_type, EntryType::Float);
        assert_eq!(entries[2].entry_type, EntryType::String);
    }

    #[test]
    fn test_table_name_regex_fallback_is_full_match() {
        let tmp = TempDir::new().unwrap();
        write_schema(
            tmp.path(),
            r#"{ ".*": "tables.json" }"#,
            &[(
                "tables.json",
                r#"{ "para": { "a": "int" }, "digimon_.*": { "b": "short" } }"#,
            )],
        );

        let r = resolver(tmp.path());
        // "para" would regex-search-match inside "digimon_para", but the
        // fallback wraps keys as full-match expressions.
        let s = r.resolve(Path::new("x.mbe"), "digimon_para");
        assert_eq!(s.entries()[0].name, "b");
        assert_eq!(s.entries()[0].entry_type, EntryType::Int16);
    }

    #[test]
    fn test_index_walk_takes_first_match() {
        let tmp = TempDir::new().unwrap();
        write_schema(
            tmp.path(),
            r#"{ "skill": "first.json", ".*": "second.json" }"#,
            &[
                ("first.json", r#"{ "t": { "a": "int" } }"#),
                ("second.json", r#"{ "t": { "a": "float" } }"#),
            ],
        );

        let r = resolver(tmp.path());
        let s = r.resolve(Path::new("data/skill.mbe"), "t");
        assert_eq!(s.entries()[0].entry_type, EntryType::Int32);

        let s = r.resolve(Path::new("data/item.mbe"), "t");
        assert_eq!(s.entries()[0].entry_type, EntryType::Float);
    }

    #[test]
    fn test_malformed_schema_json_is_not_fatal() {
        let tmp = TempDir::new().unwrap();
        write_schema(
            tmp.path(),
            r#"{ ".*": "broken.json" }"#,
            &[("broken.json", "{ not json")],
        );

        let r = resolver(tmp.path());
        assert!(r.resolve(Path::new("x.mbe"), "t").is_empty());
    }

    #[test]
    fn test_unknown_type_string_binds_to_empty() {
        let tmp = TempDir::new().unwrap();
        write_schema(
            tmp.path(),
            r#"{ ".*": "t.json" }"#,
            &[("t.json", r#"{ "t": { "a": "quaternion", "b": "byte" } }"#)],
        );

        let r = resolver(tmp.path());
        let s = r.resolve(Path::new("x.mbe"), "t");
        assert_eq!(s.entries()[0].entry_type, EntryType::Empty);
        assert_eq!(s.entries()[1].entry_type, EntryType::Int8);
    }

    #[test]
    fn test_preamble_without_schema_synthesises_names() {
        let tmp = TempDir::new().unwrap();
        let r = resolver(&tmp.path().join("nope"));

        let codes = [EntryType::Int32.as_u32(), EntryType::String.as_u32()];
        let s = r.resolve_with_preamble(Path::new("x.mbe"), "t", &codes);
        assert_eq!(s.entries()[0].name, "int32 0");
        assert_eq!(s.entries()[1].name, "string 1");
        assert_eq!(s.entries()[1].entry_type, EntryType::String);
    }

    #[test]
    fn test_preamble_reconcile_prefers_matching_schema_names() {
        let tmp = TempDir::new().unwrap();
        write_schema(
            tmp.path(),
            r#"{ ".*": "t.json" }"#,
            &[("t.json", r#"{ "t": { "id": "int", "name": "string" } }"#)],
        );

        let r = resolver(tmp.path());
        let codes = [EntryType::Int32.as_u32(), EntryType::String.as_u32()];
        let s = r.resolve_with_preamble(Path::new("x.mbe"), "t", &codes);
        assert_eq!(s.entries()[0].name, "id");
        assert_eq!(s.entries()[1].name, "name");
    }

    #[test]
    fn test_preamble_reconcile_rejects_disagreeing_schema() {
        let tmp = TempDir::new().unwrap();
        write_schema(
            tmp.path(),
            r#"{ ".*": "t.json" }"#,
            &[("t.json", r#"{ "t": { "id": "float", "name": "string" } }"#)],
        );

        let r = resolver(tmp.path());
        let codes = [EntryType::Int32.as_u32(), EntryType::String.as_u32()];
        let s = r.resolve_with_preamble(Path::new("x.mbe"), "t", &codes);
        // Type disagreement at position 0: in-band wins.
        assert_eq!(s.entries()[0].name, "int32 0");
        assert_eq!(s.entries()[0].entry_type, EntryType::Int32);
    }

    #[test]
    fn test_preamble_reconcile_rejects_length_mismatch() {
        let tmp = TempDir::new().unwrap();
        write_schema(
            tmp.path(),
            r#"{ ".*": "t.json" }"#,
            &[("t.json", r#"{ "t": { "id": "int" } }"#)],
        );

        let r = resolver(tmp.path());
        let codes = [EntryType::Int32.as_u32(), EntryType::String.as_u32()];
        let s = r.resolve_with_preamble(Path::new("x.mbe"), "t", &codes);
        assert_eq!(s.entry_count(), 2);
        assert_eq!(s.entries()[0].name, "int32 0");
    }

    #[test]
    fn test_unknown_preamble_code_demotes_to_empty() {
        let tmp = TempDir::new().unwrap();
        let r = resolver(&tmp.path().join("nope"));

        let s = r.resolve_with_preamble(Path::new("x.mbe"), "t", &[2, 57]);
        assert_eq!(s.entries()[0].entry_type, EntryType::Int32);
        assert_eq!(s.entries()[1].entry_type, EntryType::Empty);
    }
}
