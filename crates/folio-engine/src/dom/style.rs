//! Inline `style` attribute access and text direction lookup.

use super::{Dom, NodeId};

/// Property names are case-insensitive except custom properties (`--name`)
fn normalize_name(name: &str) -> String {
    let name = name.trim();
    if name.starts_with("--") {
        name.to_string()
    } else {
        name.to_ascii_lowercase()
    }
}

fn parse_declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|declaration| {
            let (name, value) = declaration.split_once(':')?;
            let name = normalize_name(name);
            let value = value.trim();
            (!name.is_empty() && !value.is_empty()).then(|| (name, value.to_string()))
        })
        .collect()
}

fn write_declarations(declarations: &[(String, String)]) -> String {
    declarations
        .iter()
        .map(|(name, value)| format!("{name}: {value};"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn get_style_property(dom: &Dom, node: NodeId, name: &str) -> Option<String> {
    let style = dom.attribute(node, "style")?;
    let name = normalize_name(name);
    parse_declarations(style)
        .into_iter()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| v)
}

/// Sets (or with `None` removes) one inline style property. The `style`
/// attribute is dropped once it has no declarations left.
pub fn set_style_property(dom: &mut Dom, node: NodeId, name: &str, value: Option<&str>) {
    if !dom.is_element(node) {
        return;
    }
    let name = normalize_name(name);
    let mut declarations = dom
        .attribute(node, "style")
        .map(parse_declarations)
        .unwrap_or_default();

    match (declarations.iter().position(|(n, _)| *n == name), value) {
        (Some(index), Some(value)) => declarations[index].1 = value.to_string(),
        (Some(index), None) => {
            declarations.remove(index);
        }
        (None, Some(value)) => declarations.push((name, value.to_string())),
        (None, None) => {}
    }

    if declarations.is_empty() {
        dom.remove_attribute(node, "style");
    } else {
        dom.set_attribute(node, "style", &write_declarations(&declarations));
    }
}

/// Whether text at `node` runs right to left, resolved from the closest
/// `direction` style or `dir` attribute.
pub fn is_rtl(dom: &Dom, node: NodeId) -> bool {
    let mut current = Some(node);
    while let Some(n) = current {
        if dom.is_element(n) {
            if let Some(direction) = get_style_property(dom, n, "direction") {
                return direction.eq_ignore_ascii_case("rtl");
            }
            if let Some(dir) = dom.attribute(n, "dir")
                && !dir.is_empty()
            {
                return dir.eq_ignore_ascii_case("rtl");
            }
        }
        current = dom.parent(n);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::html::parse_fragment;

    #[test]
    fn test_set_and_get_style_property() {
        let mut dom = Dom::new();
        let el = dom.create_element("span");
        set_style_property(&mut dom, el, "color", Some("red"));
        set_style_property(&mut dom, el, "background-color", Some("blue"));
        set_style_property(&mut dom, el, "color", Some("green"));
        assert_eq!(
            dom.attribute(el, "style"),
            Some("color: green; background-color: blue;")
        );
        assert_eq!(
            get_style_property(&dom, el, "background-color").as_deref(),
            Some("blue")
        );
    }

    #[test]
    fn test_removing_last_property_drops_attribute() {
        let mut dom = Dom::new();
        let el = dom.create_element("span");
        set_style_property(&mut dom, el, "color", Some("red"));
        set_style_property(&mut dom, el, "color", None);
        assert_eq!(dom.attribute(el, "style"), None);
    }

    #[test]
    fn test_is_rtl_resolves_closest_direction() {
        let mut dom = Dom::new();
        let fragment = parse_fragment(
            &mut dom,
            r#"<div dir="rtl"><p style="direction: ltr"><b>x</b></p><i>y</i></div>"#,
        );
        let div = dom.children(fragment)[0];
        let p = dom.children(div)[0];
        let b = dom.children(p)[0];
        let i = dom.children(div)[1];
        assert!(!is_rtl(&dom, b));
        assert!(is_rtl(&dom, i));
        assert!(is_rtl(&dom, dom.children(i)[0]));
        assert!(!is_rtl(&dom, fragment));
    }
}
