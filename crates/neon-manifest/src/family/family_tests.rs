#![allow(non_snake_case)]

use super::*;
use proptest::prelude::*;
use serde_json::json;

fn map(entries: &[(&str, &str)]) -> PlatformMap {
    entries
        .iter()
        .map(|(node, rust)| ((*node).to_string(), (*rust).to_string()))
        .collect()
}

// ============================================================================
// Decoding
// ============================================================================

#[test]
fn PlatformFamily___from_json___decodes_preset_name() {
    let family = PlatformFamily::from_json(&json!("common"), "neon.platforms").unwrap();

    assert_eq!(family, PlatformFamily::Preset("common".to_string()));
}

#[test]
fn PlatformFamily___from_json___decodes_preset_list() {
    let family =
        PlatformFamily::from_json(&json!(["linux", "macos"]), "neon.platforms").unwrap();

    assert_eq!(
        family,
        PlatformFamily::Presets(vec!["linux".to_string(), "macos".to_string()])
    );
}

#[test]
fn PlatformFamily___from_json___decodes_map() {
    let family = PlatformFamily::from_json(
        &json!({ "linux-x64-gnu": "x86_64-unknown-linux-gnu" }),
        "neon.platforms",
    )
    .unwrap();

    assert_eq!(
        family,
        PlatformFamily::from(map(&[("linux-x64-gnu", "x86_64-unknown-linux-gnu")]))
    );
}

#[test]
fn PlatformFamily___to_json___keeps_declared_order() {
    let json = json!({
        "win32-x64-msvc": "x86_64-pc-windows-msvc",
        "darwin-x64": "x86_64-apple-darwin",
        "android-arm64": "aarch64-linux-android"
    });

    let family = PlatformFamily::from_json(&json, "neon.platforms").unwrap();
    let encoded = family.to_json();

    let keys: Vec<&String> = encoded.as_object().unwrap().keys().collect();
    assert_eq!(keys, ["win32-x64-msvc", "darwin-x64", "android-arm64"]);
}

#[test]
fn PlatformFamily___from_json___rejects_unknown_preset() {
    let err = PlatformFamily::from_json(&json!("everything"), "neon.platforms").unwrap_err();

    assert!(matches!(err, ManifestError::InvalidIdentifier { .. }));
}

#[test]
fn PlatformFamily___from_json___rejects_non_string_list_item() {
    let err = PlatformFamily::from_json(&json!(["linux", 7]), "neon.platforms").unwrap_err();

    assert!(err.to_string().contains("neon.platforms[1]"));
}

#[test]
fn PlatformFamily___from_json___rejects_non_string_target() {
    let err = PlatformFamily::from_json(&json!({ "linux-x64-gnu": true }), "neon.platforms")
        .unwrap_err();

    assert!(err.to_string().contains("neon.platforms.linux-x64-gnu"));
}

#[test]
fn PlatformFamily___from_json___rejects_number() {
    let err = PlatformFamily::from_json(&json!(3), "neon.platforms").unwrap_err();

    assert!(matches!(err, ManifestError::InvalidShape { .. }));
}

#[test]
fn PlatformFamily___to_json___keeps_declarative_form() {
    let family = PlatformFamily::Presets(vec!["desktop".to_string(), "mobile".to_string()]);

    assert_eq!(family.to_json(), json!(["desktop", "mobile"]));
}

// ============================================================================
// Expansion
// ============================================================================

#[test]
fn expand_preset___group___flattens_members() {
    let desktop = expand_preset("desktop").unwrap();

    let mut expected = expand_preset("linux").unwrap();
    expected.extend(expand_preset("macos").unwrap());
    expected.extend(expand_preset("windows").unwrap());
    assert_eq!(desktop, expected);
    assert_eq!(desktop["darwin-arm64"], "aarch64-apple-darwin");
}

#[test]
fn expand_preset___nested_groups___resolve_through_diamonds() {
    // extended -> common -> desktop, and extended -> mobile
    let extended = expand_preset("extended").unwrap();

    assert!(extended.contains_key("linux-x64-gnu"));
    assert!(extended.contains_key("android-arm64"));
    assert!(extended.contains_key("linux-x64-musl"));
    assert!(extended.contains_key("freebsd-x64"));
}

#[test]
fn expand_platform_family___common_and_mobile___is_union_with_mobile_winning() {
    let family = PlatformFamily::Presets(vec!["common".to_string(), "mobile".to_string()]);
    let expanded = expand_platform_family(&family).unwrap();

    let common = expand_preset("common").unwrap();
    let mobile = expand_preset("mobile").unwrap();
    for (node, rust) in &mobile {
        assert_eq!(&expanded[node], rust);
    }
    for node in common.keys() {
        assert!(expanded.contains_key(node));
    }
    assert_eq!(
        expanded.len(),
        common.keys().chain(mobile.keys()).collect::<std::collections::BTreeSet<_>>().len()
    );
}

#[test]
fn expand_platform_family___map___is_returned_unchanged() {
    let flat = map(&[
        ("linux-arm-gnueabihf", "arm-unknown-linux-gnueabihf"),
        ("darwin-x64", "x86_64-apple-darwin"),
    ]);
    let family = PlatformFamily::from(flat.clone());

    assert_eq!(expand_platform_family(&family).unwrap(), flat);
}

#[test]
fn expand_platform_family___empty_list___is_empty() {
    let family = PlatformFamily::Presets(Vec::new());

    assert!(expand_platform_family(&family).unwrap().is_empty());
}

// ============================================================================
// Cycle guard
// ============================================================================

static LOOP_A: PresetDef = PresetDef::Group(&["loop-b"]);
static LOOP_B: PresetDef = PresetDef::Group(&["leaf", "loop-a"]);
static LEAF: PresetDef = PresetDef::Map(&[("linux-x64-gnu", "x86_64-unknown-linux-gnu")]);
static DIAMOND: PresetDef = PresetDef::Group(&["leaf", "leaf"]);

fn cyclic_lookup(name: &str) -> Option<&'static PresetDef> {
    match name {
        "loop-a" => Some(&LOOP_A),
        "loop-b" => Some(&LOOP_B),
        "leaf" => Some(&LEAF),
        "diamond" => Some(&DIAMOND),
        _ => None,
    }
}

#[test]
fn merge_preset___self_referencing_chain___fails() {
    let err = merge_preset("loop-a", cyclic_lookup, &mut PlatformMap::new(), &mut Vec::new())
        .unwrap_err();

    assert!(matches!(err, ManifestError::PresetCycle(ref name) if name == "loop-a"));
}

#[test]
fn merge_preset___repeated_member___is_not_a_cycle() {
    let mut out = PlatformMap::new();
    merge_preset("diamond", cyclic_lookup, &mut out, &mut Vec::new()).unwrap();

    assert_eq!(out.len(), 1);
}

// ============================================================================
// Properties
// ============================================================================

fn preset_names() -> Vec<&'static str> {
    platform::platform_presets().collect()
}

proptest! {
    #[test]
    fn expand___flat_map___is_fixed_point(indices in prop::collection::vec(0usize..64, 0..12)) {
        let targets: Vec<&str> = platform::rust_targets().collect();
        let flat: PlatformMap = indices
            .iter()
            .map(|i| {
                let rust = targets[i % targets.len()];
                (platform::rust_to_node(rust).unwrap().to_string(), rust.to_string())
            })
            .collect();

        let once = expand_platform_family(&PlatformFamily::from(flat.clone())).unwrap();
        let twice = expand_platform_family(&PlatformFamily::from(once.clone())).unwrap();

        prop_assert_eq!(&once, &flat);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn expand___preset_list___last_preset_wins(indices in prop::collection::vec(0usize..32, 0..6)) {
        let names = preset_names();
        let chosen: Vec<String> = indices
            .iter()
            .map(|i| names[i % names.len()].to_string())
            .collect();

        let merged = expand_platform_family(&PlatformFamily::Presets(chosen.clone())).unwrap();

        let expansions: Vec<PlatformMap> = chosen
            .iter()
            .map(|name| expand_preset(name).unwrap())
            .collect();
        for (node, rust) in &merged {
            let last = expansions.iter().rev().find_map(|e| e.get(node)).unwrap();
            prop_assert_eq!(rust, last);
        }
        for expansion in &expansions {
            for node in expansion.keys() {
                prop_assert!(merged.contains_key(node));
            }
        }
    }
}
