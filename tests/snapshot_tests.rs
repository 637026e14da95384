use serde_json::json;

use statechart_explorer::model::listener::{node_selector, path_prefix, Gesture};
use statechart_explorer::model::snapshot::{assemble, RawElement};

fn elements(value: serde_json::Value) -> Vec<RawElement> {
    serde_json::from_value(value).unwrap()
}

fn button(index: usize, extra: serde_json::Value) -> serde_json::Value {
    let mut element = json!({
        "nodeXPath": format!("/html/body/div[1]/button[{index}]"),
        "tag": "button",
        "class": ["btn"],
        "parents": [{ "nodeXPath": "/html/body/div[1]", "tag": "div", "id": "toolbar" }],
        "listeners": [{ "event": "click", "eventFunction": "function(){go()}" }]
    });
    if let (Some(target), Some(extra)) = (element.as_object_mut(), extra.as_object()) {
        for (key, value) in extra {
            target.insert(key.clone(), value.clone());
        }
    }
    element
}

// ============================================================================
// Selectors and paths
// ============================================================================

#[test]
fn id_short_circuits_the_selector() {
    assert_eq!(node_selector(Some("save"), "button", &[], &[]), "#save");
}

#[test]
fn selector_walks_up_to_the_nearest_id() {
    let raw = elements(json!([{
        "nodeXPath": "/html/body/section[1]/div[2]/button[1]",
        "tag": "button",
        "class": ["btn", "primary"],
        "parents": [
            { "nodeXPath": "/html/body/section[1]/div[2]", "tag": "div", "class": ["row"] },
            { "nodeXPath": "/html/body/section[1]", "tag": "section", "id": "main" },
            { "nodeXPath": "/html/body", "tag": "body" }
        ],
        "listeners": [{ "event": "click", "eventFunction": "f" }]
    }]));

    let snapshot = assemble(raw, &[]);
    assert_eq!(snapshot[0].selector, "#main div.row button.btn.primary");
    assert_eq!(snapshot[0].ancestor_selector(0), "#main div.row");
    assert_eq!(snapshot[0].ancestor_selector(1), "#main");
}

#[test]
fn path_prefix_drops_the_last_index() {
    assert_eq!(path_prefix("/html/body/ul[1]/li[3]"), "/html/body/ul[1]/li");
    assert_eq!(path_prefix("/html"), "/html");
}

// ============================================================================
// Driver payloads
// ============================================================================

#[test]
fn nulls_and_scalars_are_normalised() {
    let raw = elements(json!([{
        "nodeXPath": "/html/body/input[1]",
        "tag": "input",
        "class": null,
        "parents": null,
        "attributes": [
            { "name": "type", "value": "range" },
            { "name": "aria-valuenow", "value": 5 },
            { "name": "checked", "value": true }
        ],
        "styles": null,
        "isModalOpen": true,
        "listeners": [{ "event": "input", "eventFunction": "f" }]
    }]));

    let snapshot = assemble(raw, &[]);
    let record = &snapshot[0];
    assert!(record.classes.is_empty());
    assert!(record.ancestors.is_empty());
    assert_eq!(record.attribute("aria-valuenow"), Some("5"));
    assert_eq!(record.attribute("checked"), Some("true"));
    assert!(record.modal_open);
    assert_eq!(record.resolved_target, None);
}

#[test]
fn brush_wins_when_both_gestures_are_reported() {
    let raw = elements(json!([{
        "nodeXPath": "/html/body/svg[1]",
        "tag": "svg",
        "id": "chart",
        "listeners": [{
            "event": "mousedown",
            "eventFunction": "f",
            "brushable": { "directions": "x", "brush_extent": [[0, 0], [100, 20]] },
            "zoomable": { "scale": 1.0, "translate_x": 0.0, "translate_y": 0.0 }
        }]
    }]));

    let snapshot = assemble(raw, &[]);
    assert!(matches!(snapshot[0].gesture, Some(Gesture::Brush(_))));
}

#[test]
fn excluded_events_are_dropped_case_insensitively() {
    let raw = elements(json!([{
        "nodeXPath": "/html/body/div[1]",
        "tag": "div",
        "id": "pane",
        "listeners": [
            { "event": "Scroll", "eventFunction": "f" },
            { "event": "click", "eventFunction": "g" }
        ]
    }]));

    let snapshot = assemble(raw, &["scroll".to_string()]);
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].event, "click");
}

// ============================================================================
// Select expansion
// ============================================================================

#[test]
fn each_option_becomes_its_own_record() {
    let raw = elements(json!([{
        "nodeXPath": "/html/body/select[1]",
        "tag": "select",
        "id": "mode",
        "selectValues": [
            { "value": "a", "selected": true },
            { "value": "b" }
        ],
        "listeners": [{ "event": "change", "eventFunction": "f" }]
    }]));

    let snapshot = assemble(raw, &[]);
    let values: Vec<&str> = snapshot
        .iter()
        .filter_map(|r| r.select_option.as_ref())
        .map(|o| o.value.as_str())
        .collect();
    assert_eq!(values, vec!["a", "b"]);
    assert_eq!(snapshot[0].label(), "change [a] on '#mode'");
    assert!(snapshot.iter().all(|r| r.duplicate_count == 0));
}

// ============================================================================
// Sibling folding
// ============================================================================

#[test]
fn identical_siblings_fold_into_the_first() {
    let raw = elements(json!([button(1, json!({})), button(2, json!({})), button(3, json!({}))]));

    let snapshot = assemble(raw, &[]);
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].path, "/html/body/div[1]/button[1]");
    assert_eq!(snapshot[0].duplicate_count, 2);
}

#[test]
fn different_handlers_do_not_fold() {
    let second = button(
        2,
        json!({ "listeners": [{ "event": "click", "eventFunction": "function(){stop()}" }] }),
    );
    let raw = elements(json!([button(1, json!({})), second]));

    assert_eq!(assemble(raw, &[]).len(), 2);
}

#[test]
fn listbox_expansion_attribute_prevents_folding() {
    let expanded = button(
        2,
        json!({ "attributes": [{ "name": "aria-expanded_parent", "value": "true" }] }),
    );
    let raw = elements(json!([button(1, json!({})), expanded]));

    let snapshot = assemble(raw, &[]);
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[0].duplicate_count, 0);
}

#[test]
fn form_controls_never_fold() {
    let input = |i: usize| {
        json!({
            "nodeXPath": format!("/html/body/form[1]/input[{i}]"),
            "tag": "input",
            "listeners": [{ "event": "change", "eventFunction": "f" }]
        })
    };
    let raw = elements(json!([input(1), input(2)]));

    assert_eq!(assemble(raw, &[]).len(), 2);
}

#[test]
fn range_handles_pair_left_and_right() {
    let handle = |i: usize, now: u32| {
        button(
            i,
            json!({ "attributes": [
                { "name": "aria-valuemin", "value": 0 },
                { "name": "aria-valuemax", "value": 100 },
                { "name": "aria-valuenow", "value": now }
            ] }),
        )
    };
    let raw = elements(json!([handle(1, 70), handle(2, 20)]));

    let snapshot = assemble(raw, &[]);
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[0].attribute("handleRight"), Some("true"));
    assert_eq!(snapshot[1].attribute("handleLeft"), Some("true"));
    assert!(!snapshot[0].has_attribute("handleLeft"));
}
