//! Project-wide function and type registries
//!
//! Global invariants enforced:
//! - Built once per invocation, then read-only; queries never mutate
//! - Discovery order is preserved and deterministic
//! - Lookup misses are valid negative results, never errors

use crate::record::{FunctionRecord, TypeRecord};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};

/// Result of a pattern search, carrying whether the pattern failed to compile
/// as a regex and substring matching was used instead
pub struct PatternMatches<'a> {
    pub records: Vec<&'a FunctionRecord>,
    pub used_fallback: bool,
}

/// All discovered functions, keyed by qualified id and by plain name
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    /// Discovery order
    functions: Vec<FunctionRecord>,
    by_name: HashMap<String, Vec<usize>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: FunctionRecord) {
        let index = self.functions.len();
        self.by_name
            .entry(record.name.clone())
            .or_default()
            .push(index);
        self.functions.push(record);
    }

    pub fn all(&self) -> &[FunctionRecord] {
        &self.functions
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Whether a plain name is a key in this registry; the load-bearing
    /// project-internal-call test
    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// All records matching `name`: exact name matches in discovery order,
    /// or, when there are none, records whose qualified id ends with
    /// `:<name>` (disambiguates same-named methods across scopes)
    pub fn find_by_name(&self, name: &str) -> Vec<&FunctionRecord> {
        if let Some(indices) = self.by_name.get(name) {
            return indices.iter().map(|&i| &self.functions[i]).collect();
        }
        let suffix = format!(":{}", name);
        self.functions
            .iter()
            .filter(|f| f.id.ends_with(&suffix))
            .collect()
    }

    /// First match in discovery order, for commands that need a single record
    pub fn resolve(&self, name: &str) -> Option<&FunctionRecord> {
        self.find_by_name(name).into_iter().next()
    }

    /// Pattern search over names.
    ///
    /// The pattern is interpreted as a regular expression when it compiles,
    /// honoring its own case rules (anchors like `^use` stay meaningful);
    /// otherwise matching falls back to a case-insensitive substring test.
    /// The fallback is reported, never silent.
    pub fn find_by_pattern(&self, pattern: &str) -> PatternMatches<'_> {
        match Regex::new(pattern) {
            Ok(re) => PatternMatches {
                records: self.functions.iter().filter(|f| re.is_match(&f.name)).collect(),
                used_fallback: false,
            },
            Err(_) => {
                let needle = pattern.to_lowercase();
                PatternMatches {
                    records: self
                        .functions
                        .iter()
                        .filter(|f| f.name.to_lowercase().contains(&needle))
                        .collect(),
                    used_fallback: true,
                }
            }
        }
    }

    /// Every record whose callee set contains `name`
    pub fn callers_of(&self, name: &str) -> Vec<&FunctionRecord> {
        self.functions
            .iter()
            .filter(|f| f.callees.contains(name))
            .collect()
    }

    /// The subset of a record's callees defined inside the analyzed project,
    /// in sorted order. External and library calls are excluded.
    pub fn project_calls_of(&self, record: &FunctionRecord) -> Vec<String> {
        record
            .callees
            .iter()
            .filter(|callee| self.contains_name(callee))
            .cloned()
            .collect()
    }

    /// Directory path -> ids of the functions declared under it, in
    /// discovery order
    pub fn modules(&self) -> BTreeMap<String, Vec<String>> {
        let mut modules: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for record in &self.functions {
            let dir = match record.file_path.rsplit_once('/') {
                Some((dir, _)) => dir.to_string(),
                None => ".".to_string(),
            };
            modules.entry(dir).or_default().push(record.id.clone());
        }
        modules
    }
}

/// Interface/type-alias/enum declarations keyed by name.
///
/// Duplicate names across files are last-write-wins; the overwrite is
/// surfaced to the caller so it can warn instead of silently dropping the
/// earlier definition.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: BTreeMap<String, TypeRecord>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, returning the previously stored record for the same
    /// name if one existed
    pub fn insert(&mut self, record: TypeRecord) -> Option<TypeRecord> {
        self.types.insert(record.name.clone(), record)
    }

    pub fn get(&self, name: &str) -> Option<&TypeRecord> {
        self.types.get(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Records in name order
    pub fn all(&self) -> impl Iterator<Item = &TypeRecord> {
        self.types.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FunctionKind;
    use std::collections::BTreeSet;

    fn record(file: &str, scope: Option<&str>, name: &str, callees: &[&str]) -> FunctionRecord {
        FunctionRecord {
            id: FunctionRecord::make_id(file, scope, name),
            name: name.to_string(),
            kind: FunctionKind::Function,
            enclosing_scope: scope.map(|s| s.to_string()),
            file_path: file.to_string(),
            start_line: 1,
            end_line: 1,
            is_async: false,
            is_exported: false,
            parameters: vec![],
            return_type: "void".to_string(),
            callees: callees.iter().map(|c| c.to_string()).collect::<BTreeSet<_>>(),
            calls: vec![],
            mutations: vec![],
            complexity: 1,
        }
    }

    fn registry(records: Vec<FunctionRecord>) -> FunctionRegistry {
        let mut reg = FunctionRegistry::new();
        for r in records {
            reg.insert(r);
        }
        reg
    }

    #[test]
    fn test_find_by_name_exact() {
        let reg = registry(vec![
            record("a.ts", None, "foo", &[]),
            record("b.ts", None, "foo", &[]),
        ]);
        let matches = reg.find_by_name("foo");
        assert_eq!(matches.len(), 2);
        // Discovery order: first match comes from a.ts
        assert_eq!(matches[0].file_path, "a.ts");
    }

    #[test]
    fn test_find_by_name_qualified_suffix() {
        let reg = registry(vec![record("a.ts", Some("Widget"), "render", &[])]);
        // No plain-name key "Widget:render"; suffix match on the id works
        let matches = reg.find_by_name("Widget:render");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "a.ts:Widget:render");
    }

    #[test]
    fn test_find_by_name_miss_is_empty() {
        let reg = registry(vec![record("a.ts", None, "foo", &[])]);
        assert!(reg.find_by_name("missing").is_empty());
    }

    #[test]
    fn test_pattern_anchored_regex() {
        let reg = registry(vec![
            record("a.ts", None, "useAuth", &[]),
            record("a.ts", None, "useForm", &[]),
            record("a.ts", None, "Usekey", &[]),
        ]);
        let matches = reg.find_by_pattern("^use");
        assert!(!matches.used_fallback);
        let names: Vec<&str> = matches.records.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["useAuth", "useForm"]);
    }

    #[test]
    fn test_pattern_invalid_falls_back_to_substring() {
        let reg = registry(vec![
            record("a.ts", None, "useAuth", &[]),
            record("a.ts", None, "other", &[]),
        ]);
        // Unbalanced paren cannot compile as a regex
        let matches = reg.find_by_pattern("useA(");
        assert!(matches.used_fallback);
        assert!(matches.records.is_empty());
    }

    #[test]
    fn test_pattern_fallback_is_case_insensitive() {
        // Fabricated name: the fallback compares lowercased needle against
        // lowercased names, whatever characters they hold
        let reg = registry(vec![record("a.ts", None, "use(Auth", &[])]);
        let matches = reg.find_by_pattern("USE(");
        assert!(matches.used_fallback);
        assert_eq!(matches.records.len(), 1);
    }

    #[test]
    fn test_pattern_case_insensitive_flag_through_regex() {
        let reg = registry(vec![record("a.ts", None, "useAuth", &[])]);
        let matches = reg.find_by_pattern("(?i)auth");
        assert!(!matches.used_fallback);
        assert_eq!(matches.records.len(), 1);
    }

    #[test]
    fn test_callers_of() {
        let reg = registry(vec![
            record("a.ts", None, "a", &["b"]),
            record("a.ts", None, "b", &[]),
            record("a.ts", None, "c", &["b"]),
        ]);
        let callers: Vec<&str> = reg.callers_of("b").iter().map(|f| f.name.as_str()).collect();
        assert_eq!(callers, vec!["a", "c"]);
    }

    #[test]
    fn test_project_calls_exclude_external() {
        let reg = registry(vec![
            record("a.ts", None, "caller", &["helper", "console.log"]),
            record("a.ts", None, "helper", &[]),
        ]);
        let record = reg.resolve("caller").unwrap();
        let internal = reg.project_calls_of(record);
        assert_eq!(internal, vec!["helper"]);
    }

    #[test]
    fn test_modules_grouping() {
        let reg = registry(vec![
            record("src/api/client.ts", None, "fetch", &[]),
            record("src/api/client.ts", None, "post", &[]),
            record("src/util.ts", None, "trim", &[]),
            record("root.ts", None, "main", &[]),
        ]);
        let modules = reg.modules();
        assert_eq!(modules["src/api"].len(), 2);
        assert_eq!(modules["src"], vec!["src/util.ts:trim"]);
        assert_eq!(modules["."], vec!["root.ts:main"]);
    }

    #[test]
    fn test_type_registry_last_write_wins() {
        let mut types = TypeRegistry::new();
        let first = TypeRecord {
            name: "User".to_string(),
            file_path: "a.ts".to_string(),
            start_line: 1,
            definition: "interface User { id: string }".to_string(),
        };
        let second = TypeRecord {
            name: "User".to_string(),
            file_path: "b.ts".to_string(),
            start_line: 5,
            definition: "interface User { id: number }".to_string(),
        };
        assert!(types.insert(first).is_none());
        let displaced = types.insert(second).unwrap();
        assert_eq!(displaced.file_path, "a.ts");
        assert_eq!(types.get("User").unwrap().file_path, "b.ts");
    }

    #[test]
    fn test_empty_registry_is_valid() {
        let reg = FunctionRegistry::new();
        assert!(reg.is_empty());
        assert!(reg.find_by_name("anything").is_empty());
        assert!(reg.callers_of("anything").is_empty());
    }
}
