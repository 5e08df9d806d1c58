#![allow(non_snake_case)]

use super::*;

fn platforms(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

const LOADER: &str = r#"// generated by neon
module.exports = require('@neon-rs/load').proxy({
  platforms: {
    'win32-x64-msvc': () => require('@acme/win32-x64-msvc'),
    'darwin-arm64': () => require('@acme/darwin-arm64')
  },
  debug: () => require('../index.node')
});
"#;

// ============================================================================
// Table detection
// ============================================================================

#[test]
fn find_platform_tables___proxy_loader___finds_platform_object_only() {
    let tables = find_platform_tables(LOADER).unwrap();

    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].keys, vec!["win32-x64-msvc", "darwin-arm64"]);
}

#[test]
fn find_platform_tables___mixed_keys___are_ignored() {
    let source = "const x = { 'linux-x64-gnu': 1, other: 2 };";

    assert!(find_platform_tables(source).unwrap().is_empty());
}

#[test]
fn find_platform_tables___empty_object___is_ignored() {
    assert!(find_platform_tables("const x = {};").unwrap().is_empty());
}

#[test]
fn find_platform_tables___empty_platforms_value___is_a_table() {
    let source = "module.exports = proxy({ platforms: {}, debug: {} });";

    let tables = find_platform_tables(source).unwrap();

    assert_eq!(tables.len(), 1);
    assert!(tables[0].keys.is_empty());
}

#[test]
fn find_platform_tables___block_statements___are_not_tables() {
    let source = "function f() { if (x) { return 1; } }";

    assert!(find_platform_tables(source).unwrap().is_empty());
}

#[test]
fn find_platform_tables___braces_in_strings_and_comments___are_skipped() {
    let source = r#"
// { 'linux-x64-gnu': broken
/* } */
const s = "{ not: 'an object' }";
const t = `${ { 'darwin-x64': 1 }['darwin-x64'] } }`;
const table = { "linux-x64-gnu": () => require("@acme/linux-x64-gnu") };
"#;

    let tables = find_platform_tables(source).unwrap();

    let keys: Vec<&Vec<String>> = tables.iter().map(|t| &t.keys).collect();
    assert_eq!(keys, vec![&vec!["darwin-x64".to_string()], &vec!["linux-x64-gnu".to_string()]]);
}

#[test]
fn find_platform_tables___regex_literals___are_skipped() {
    let source = r#"
const quote = /'/g;
const braces = /[{/}]+/;
function strip(s) { return s.replace(/"/g, ''); }
const half = total / 2 / 1;
const table = { 'darwin-x64': () => require('@acme/darwin-x64') };
"#;

    let tables = find_platform_tables(source).unwrap();

    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].keys, vec!["darwin-x64"]);
}

#[test]
fn find_platform_tables___unterminated_regex___fails() {
    let err = find_platform_tables("const r = /abc\n;").unwrap_err();

    assert!(matches!(err, LoaderError::UnterminatedRegex(10)));
}

#[test]
fn find_platform_tables___unterminated_string___fails() {
    let err = find_platform_tables("const x = { 'linux-x64-gnu: 1 };").unwrap_err();

    assert!(matches!(err, LoaderError::UnterminatedString(12)));
}

#[test]
fn find_platform_tables___unterminated_comment___fails() {
    let err = find_platform_tables("const x = 1; /* never closed").unwrap_err();

    assert!(matches!(err, LoaderError::UnterminatedComment(13)));
}

#[test]
fn find_platform_tables___unbalanced_brace___fails() {
    let err = find_platform_tables("const x = { a: (1 };").unwrap_err();

    assert_eq!(
        err,
        LoaderError::Unbalanced {
            found: '}',
            offset: 18
        }
    );
}

// ============================================================================
// Insertion
// ============================================================================

#[test]
fn insert_platform_loaders___multiline_table___appends_with_indentation() {
    let updated =
        insert_platform_loaders(LOADER, "@acme", &platforms(&["linux-x64-gnu"])).unwrap();

    assert!(updated.contains(
        "    'darwin-arm64': () => require('@acme/darwin-arm64'),\n    'linux-x64-gnu': () => require('@acme/linux-x64-gnu')\n  },"
    ));
    assert!(updated.contains("debug: () => require('../index.node')"));
}

#[test]
fn insert_platform_loaders___existing_platform___is_not_duplicated() {
    let updated = insert_platform_loaders(
        LOADER,
        "@acme",
        &platforms(&["darwin-arm64", "linux-x64-gnu", "linux-x64-gnu"]),
    )
    .unwrap();

    assert_eq!(updated.matches("'darwin-arm64'").count(), 1);
    assert_eq!(updated.matches("'linux-x64-gnu'").count(), 1);
}

#[test]
fn insert_platform_loaders___nothing_new___returns_source_unchanged() {
    let updated = insert_platform_loaders(LOADER, "@acme", &platforms(&["darwin-arm64"])).unwrap();

    assert_eq!(updated, LOADER);
}

#[test]
fn insert_platform_loaders___trailing_comma___is_preserved() {
    let source = "const t = {\n\t\"darwin-x64\": () => require(\"@acme/darwin-x64\"),\n};\n";

    let updated = insert_platform_loaders(
        source,
        "@acme",
        &platforms(&["linux-x64-gnu", "win32-x64-msvc"]),
    )
    .unwrap();

    assert_eq!(
        updated,
        "const t = {\n\t\"darwin-x64\": () => require(\"@acme/darwin-x64\"),\n\t\"linux-x64-gnu\": () => require(\"@acme/linux-x64-gnu\"),\n\t\"win32-x64-msvc\": () => require(\"@acme/win32-x64-msvc\"),\n};\n"
    );
}

#[test]
fn insert_platform_loaders___single_line_table___stays_on_one_line() {
    let source = "const t = { 'darwin-x64': () => require('@acme/darwin-x64') };";

    let updated = insert_platform_loaders(source, "@acme", &platforms(&["linux-x64-gnu"])).unwrap();

    assert_eq!(
        updated,
        "const t = { 'darwin-x64': () => require('@acme/darwin-x64'), 'linux-x64-gnu': () => require('@acme/linux-x64-gnu') };"
    );
}

#[test]
fn insert_platform_loaders___trailing_comment___stays_after_new_entries() {
    let source = "const t = {\n  'darwin-x64': () => require('@acme/darwin-x64') // intel\n};";

    let updated = insert_platform_loaders(source, "@acme", &platforms(&["darwin-arm64"])).unwrap();

    assert_eq!(
        updated,
        "const t = {\n  'darwin-x64': () => require('@acme/darwin-x64'),\n  'darwin-arm64': () => require('@acme/darwin-arm64') // intel\n};"
    );
}

#[test]
fn insert_platform_loaders___several_tables___updates_each() {
    let source = "const a = { 'darwin-x64': 1 };\nconst b = { 'darwin-x64': 2 };";

    let updated = insert_platform_loaders(source, "@acme", &platforms(&["freebsd-x64"])).unwrap();

    assert_eq!(updated.matches("'freebsd-x64'").count(), 2);
}

#[test]
fn insert_platform_loaders___empty_platforms_table___is_laid_out_fresh() {
    let source = "module.exports = require('@neon-rs/load').proxy({\n  platforms: {},\n  debug: () => require('../index.node')\n});\n";

    let updated = insert_platform_loaders(
        source,
        "@acme",
        &platforms(&["linux-x64-gnu", "darwin-arm64"]),
    )
    .unwrap();

    assert_eq!(
        updated,
        "module.exports = require('@neon-rs/load').proxy({\n  platforms: {\n    'linux-x64-gnu': () => require('@acme/linux-x64-gnu'),\n    'darwin-arm64': () => require('@acme/darwin-arm64')\n  },\n  debug: () => require('../index.node')\n});\n"
    );
}

#[test]
fn insert_platform_loaders___empty_table_with_comment___keeps_comment() {
    let source = "proxy({ platforms: { /* none yet */ } });";

    let updated = insert_platform_loaders(source, "@acme", &platforms(&["darwin-x64"])).unwrap();

    assert_eq!(
        updated,
        "proxy({ platforms: { 'darwin-x64': () => require('@acme/darwin-x64') /* none yet */ } });"
    );
}

#[test]
fn insert_platform_loaders___after_regex_literal___updates_table() {
    let source = "const q = /'/g;\nconst t = { 'darwin-x64': () => require('@acme/darwin-x64') };";

    let updated = insert_platform_loaders(source, "@acme", &platforms(&["linux-x64-gnu"])).unwrap();

    assert!(updated.contains("'linux-x64-gnu': () => require('@acme/linux-x64-gnu')"));
    assert!(updated.starts_with("const q = /'/g;\n"));
}
