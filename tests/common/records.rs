use statechart_explorer::model::listener::{AncestorInfo, Attribute, ListenerRecord, SelectOption};

pub const HANDLER: &str = "function(){handle()}";

/// A listener on an element with an id, so its selector is `#id`.
pub fn on_id(id: &str, path: &str, event: &str) -> ListenerRecord {
    let mut record = ListenerRecord::new(&format!("#{id}"), path, "div", event, HANDLER);
    record.id = Some(id.to_string());
    record
}

/// `on_id` nested inside the element `#parent` at `parent_path`.
pub fn inside(parent: &str, parent_path: &str, id: &str, path: &str, event: &str) -> ListenerRecord {
    let mut record = on_id(id, path, event);
    record.ancestors.push(ancestor(parent, parent_path));
    record
}

pub fn ancestor(id: &str, path: &str) -> AncestorInfo {
    AncestorInfo {
        path: path.to_string(),
        tag: "div".to_string(),
        id: Some(id.to_string()),
        classes: Vec::new(),
        toggle_open: None,
        hidden: false,
        visibility: String::new(),
        display: String::new(),
        clip_path: String::new(),
        transform: String::new(),
    }
}

pub fn with_attr(mut record: ListenerRecord, name: &str, value: &str) -> ListenerRecord {
    record.attributes.push(Attribute::new(name, value));
    record
}

pub fn select_option(id: &str, value: &str, selected: bool) -> ListenerRecord {
    let mut record = on_id(id, "/html/body/select[1]", "change");
    record.tag = "select".to_string();
    record.select_option = Some(SelectOption {
        name: None,
        value: value.to_string(),
        selected: selected.then_some(true),
        disabled: false,
    });
    record
}
