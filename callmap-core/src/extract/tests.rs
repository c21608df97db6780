//! Tests for function and type extraction

use crate::extract::{self, clean_type_text, FileExtraction};
use crate::parser;
use crate::record::{FunctionKind, FunctionRecord};
use swc_common::{sync::Lrc, SourceMap};

fn parse_and_extract(src: &str) -> FileExtraction {
    let cm: Lrc<SourceMap> = Default::default();
    let module = parser::parse_source(src, &cm, "test.ts").unwrap();
    extract::extract_file(&module, "test.ts", &cm)
}

fn functions(src: &str) -> Vec<FunctionRecord> {
    parse_and_extract(src).functions
}

fn named<'a>(records: &'a [FunctionRecord], name: &str) -> &'a FunctionRecord {
    records
        .iter()
        .find(|f| f.name == name)
        .unwrap_or_else(|| panic!("no record named {}", name))
}

#[test]
fn test_top_level_function_declaration() {
    let records = functions("function foo() { return 42; }");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "foo");
    assert_eq!(records[0].kind, FunctionKind::Function);
    assert_eq!(records[0].enclosing_scope, None);
    assert_eq!(records[0].id, "test.ts:foo");
}

#[test]
fn test_arrow_binding_takes_binding_name() {
    let records = functions("const load = async () => { return 1; };");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "load");
    assert_eq!(records[0].kind, FunctionKind::Arrow);
    assert!(records[0].is_async);
}

#[test]
fn test_function_expression_binding() {
    let records = functions("const tick = function innerName() { return 1; };");
    assert_eq!(records.len(), 1);
    // The binding's name wins over the inner identifier
    assert_eq!(records[0].name, "tick");
}

#[test]
fn test_anonymous_arrow_skipped() {
    let records = functions("[1, 2, 3].map(x => x * 2);");
    assert!(records.is_empty(), "unbound arrow must not be emitted");
}

#[test]
fn test_class_members() {
    let src = r#"
        class Widget {
            constructor(private size: number) { this.size = size; }
            render(): string { return "ok"; }
            get area(): number { return this.size * this.size; }
            set area(value: number) { this.size = value; }
        }
    "#;
    let records = functions(src);
    assert_eq!(records.len(), 4);
    for record in &records {
        assert_eq!(record.enclosing_scope.as_deref(), Some("Widget"));
    }
    assert_eq!(named(&records, "constructor").kind, FunctionKind::Constructor);
    assert_eq!(named(&records, "render").kind, FunctionKind::Method);
    let getters = records
        .iter()
        .filter(|f| f.kind == FunctionKind::Getter)
        .count();
    let setters = records
        .iter()
        .filter(|f| f.kind == FunctionKind::Setter)
        .count();
    assert_eq!((getters, setters), (1, 1));
    assert_eq!(named(&records, "render").id, "test.ts:Widget:render");
}

#[test]
fn test_class_property_arrow() {
    let src = r#"
        class Button {
            onClick = () => { emit("click"); };
        }
    "#;
    let records = functions(src);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "onClick");
    assert_eq!(records[0].kind, FunctionKind::Arrow);
    assert_eq!(records[0].enclosing_scope.as_deref(), Some("Button"));
}

#[test]
fn test_object_literal_method_scoped_to_binding() {
    let src = r#"
        const config = {
            load() { return 1; },
            save: (data: string) => { return data; },
        };
    "#;
    let records = functions(src);
    assert_eq!(records.len(), 2);
    assert_eq!(named(&records, "load").enclosing_scope.as_deref(), Some("config"));
    // Property-assigned arrow is synthesized from the property name
    let save = named(&records, "save");
    assert_eq!(save.enclosing_scope.as_deref(), Some("config"));
    assert_eq!(save.kind, FunctionKind::Arrow);
}

#[test]
fn test_nested_object_literal_uses_nearest_name() {
    let src = r#"
        const api = {
            handlers: {
                onLoad() { return 1; },
            },
        };
    "#;
    let records = functions(src);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "onLoad");
    assert_eq!(records[0].enclosing_scope.as_deref(), Some("handlers"));
}

#[test]
fn test_object_literal_getter_setter() {
    let src = r#"
        const store = {
            get value(): number { return 1; },
            set value(v: number) { cache = v; },
        };
    "#;
    let records = functions(src);
    assert_eq!(records.len(), 2);
    assert!(records.iter().any(|f| f.kind == FunctionKind::Getter));
    assert!(records.iter().any(|f| f.kind == FunctionKind::Setter));
}

#[test]
fn test_anonymous_sentinel_for_unnamed_object() {
    let src = "register({ onLoad() { return 1; } });";
    let records = functions(src);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].enclosing_scope.as_deref(), Some("anonymous"));
}

#[test]
fn test_nested_function_scoped_to_enclosing_function() {
    let src = r#"
        function outer() {
            function inner() { return 1; }
            const helper = () => 2;
            return inner() + helper();
        }
    "#;
    let records = functions(src);
    assert_eq!(records.len(), 3);
    assert_eq!(named(&records, "inner").enclosing_scope.as_deref(), Some("outer"));
    assert_eq!(named(&records, "helper").enclosing_scope.as_deref(), Some("outer"));
    assert_eq!(named(&records, "outer").enclosing_scope, None);
}

#[test]
fn test_property_assignment_chain() {
    let src = "app.start = () => { boot(); };";
    let records = functions(src);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "start");
    assert_eq!(records[0].enclosing_scope.as_deref(), Some("app"));
}

#[test]
fn test_exported_flags() {
    let src = r#"
        export function visible() { return 1; }
        export const bound = () => 2;
        function hidden() { return 3; }
        export default function entry() { return 4; }
    "#;
    let records = functions(src);
    assert!(named(&records, "visible").is_exported);
    assert!(named(&records, "bound").is_exported);
    assert!(!named(&records, "hidden").is_exported);
    assert!(named(&records, "entry").is_exported);
}

#[test]
fn test_export_covers_every_declarator_in_list() {
    let src = "export const a = () => 1, b = () => 2;";
    let records = functions(src);
    assert_eq!(records.len(), 2);
    assert!(named(&records, "a").is_exported);
    assert!(named(&records, "b").is_exported);
}

#[test]
fn test_unexported_declarator_list_stays_internal() {
    let records = functions("const a = () => 1, b = () => 2;");
    assert!(!named(&records, "a").is_exported);
    assert!(!named(&records, "b").is_exported);
}

#[test]
fn test_export_does_not_leak_to_nested() {
    let src = r#"
        export function outer() {
            function inner() { return 1; }
            return inner();
        }
    "#;
    let records = functions(src);
    assert!(named(&records, "outer").is_exported);
    assert!(!named(&records, "inner").is_exported);
}

#[test]
fn test_parameters_captured_in_order() {
    let src = "function f(a: string, b?: number, c: boolean = true) { return a; }";
    let records = functions(src);
    let params = &records[0].parameters;
    assert_eq!(params.len(), 3);
    assert_eq!(params[0].name, "a");
    assert_eq!(params[0].type_text, "string");
    assert!(!params[0].optional);
    assert!(params[1].optional);
    assert_eq!(params[1].type_text, "number");
    assert_eq!(params[2].default.as_deref(), Some("true"));
}

#[test]
fn test_untyped_parameter_defaults_to_any() {
    let records = functions("function f(x) { return x; }");
    assert_eq!(records[0].parameters[0].type_text, "any");
}

#[test]
fn test_rest_parameter() {
    let records = functions("function f(...items: string[]) { return items; }");
    let param = &records[0].parameters[0];
    assert_eq!(param.name, "...items");
    assert_eq!(param.type_text, "string[]");
}

#[test]
fn test_destructured_parameter_keeps_pattern_text() {
    let records = functions("function f({ id, name }: Props) { return id; }");
    let param = &records[0].parameters[0];
    assert_eq!(param.name, "{ id, name }");
    assert_eq!(param.type_text, "Props");
}

#[test]
fn test_return_type_captured_and_defaulted() {
    let records = functions(
        "function typed(): Promise<string> { return fetchIt(); }\nfunction untyped() { }",
    );
    assert_eq!(named(&records, "typed").return_type, "Promise<string>");
    assert_eq!(named(&records, "untyped").return_type, "void");
}

#[test]
fn test_overload_signatures_skipped() {
    let src = r#"
        function pick(x: string): string;
        function pick(x: number): number;
        function pick(x: any): any { return x; }
    "#;
    let records = functions(src);
    // Only the implementation has a body
    assert_eq!(records.len(), 1);
}

#[test]
fn test_line_bounds_and_size() {
    let src = "function f() {\n  return 1;\n}\n";
    let records = functions(src);
    assert_eq!(records[0].start_line, 1);
    assert_eq!(records[0].end_line, 3);
    assert_eq!(records[0].size_lines(), 3);
    assert!(records[0].end_line >= records[0].start_line);
}

#[test]
fn test_extraction_is_deterministic() {
    let src = r#"
        function zzz() { return aaa(); }
        const aaa = () => 1;
        class Box { open() { return zzz(); } }
    "#;
    let first: Vec<String> = functions(src).iter().map(|f| f.id.clone()).collect();
    let second: Vec<String> = functions(src).iter().map(|f| f.id.clone()).collect();
    assert_eq!(first, second);
}

#[test]
fn test_callees_recorded_on_record() {
    let src = "function caller() { helper(1); api.send(x); }";
    let records = functions(src);
    let callees = &records[0].callees;
    assert!(callees.contains("helper"));
    assert!(callees.contains("api.send"));
}

#[test]
fn test_types_extracted() {
    let src = r#"
        interface User { id: string; }
        type Handler = (e: Event) => void;
        enum Color { Red, Green }
        function f() { return 1; }
    "#;
    let extraction = parse_and_extract(src);
    let names: Vec<&str> = extraction.types.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["User", "Handler", "Color"]);
    assert!(extraction.types[0].definition.starts_with("interface User"));
}

#[test]
fn test_interfaces_do_not_produce_function_records() {
    let src = "interface Foo { bar(): void; }";
    let records = functions(src);
    assert!(records.is_empty());
}

#[test]
fn test_clean_type_import_qualifier() {
    assert_eq!(
        clean_type_text(r#"import("/deep/path/models").User"#),
        "User"
    );
}

#[test]
fn test_clean_type_react_prefix() {
    assert_eq!(clean_type_text("React.FC<Props>"), "FC<Props>");
    assert_eq!(clean_type_text("React.ReactNode"), "ReactNode");
    assert_eq!(clean_type_text("React.ReactElement"), "ReactElement");
}

#[test]
fn test_clean_type_truncation_to_exactly_100() {
    let long = "A".repeat(150);
    let cleaned = clean_type_text(&long);
    assert_eq!(cleaned.chars().count(), 100);
    assert!(cleaned.ends_with("..."));
    assert_eq!(cleaned.chars().filter(|c| *c == 'A').count(), 97);
}

#[test]
fn test_clean_type_short_text_untouched() {
    assert_eq!(clean_type_text("string"), "string");
}

#[test]
fn test_dynamic_import_callee() {
    let src = r#"async function lazy() { const m = await import("./heavy"); }"#;
    let records = functions(src);
    assert!(records[0].callees.contains("import(./heavy)"));
}
