//! Writing resolved styles back into the document.

use std::sync::Arc;

use css::{Declaration, Stylesheet};
use dom::{Attr, Dom, ElementData, NodeId};

use crate::collector::{CssSource, SourceOrigin};
use crate::config::InlineConfig;

/// `property: value;` pairs joined by a space, `!important` kept.
pub fn serialize_declarations(declarations: &[Declaration]) -> String {
    declarations
        .iter()
        .map(|d| format!("{d};"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Replace the element's `style` attribute with `resolved` and write the
/// mapped presentational attributes.
pub fn apply_declarations(element: &mut ElementData, resolved: &[Declaration], config: &InlineConfig) {
    if resolved.is_empty() {
        element.remove_attr("style");
        return;
    }
    element.set_attr("style", serialize_declarations(resolved));

    for declaration in resolved {
        if let Some(mapping) = config.attribute_for(&declaration.property) {
            element.set_attr(&mapping.attribute, mapping.convert(&declaration.value));
        }
    }
}

/// Replace each processed stylesheet with what could not be inlined.
///
/// `<style>` elements keep only their passthrough CSS and disappear when
/// there is none. A `<link>` becomes a `<style>` holding its passthrough.
/// External sheets get a new `<style>` at the end of `<head>`. With
/// `keep_style_tags` the document's own elements are left untouched and
/// external sheets are appended in full.
pub fn rewrite_stylesheets(dom: &mut Dom, sheets: &[(CssSource, Arc<Stylesheet>)], config: &InlineConfig) {
    let head = dom.get_elements_by_tag(dom.document(), "head").first().copied();

    for (source, sheet) in sheets {
        let remaining =
            sheet.leftover_css(config.important_passthrough, !config.include_star_selectors);
        match &source.origin {
            SourceOrigin::Style(_) | SourceOrigin::Link { .. } if config.keep_style_tags => {}
            SourceOrigin::Style(node) => {
                if remaining.is_empty() {
                    dom.detach(*node);
                } else {
                    dom.set_text_content(*node, &remaining);
                }
            }
            SourceOrigin::Link { node, .. } => {
                if !remaining.is_empty() {
                    let style = style_element(dom, &remaining);
                    dom.insert_before(*node, style);
                }
                dom.detach(*node);
            }
            SourceOrigin::External { url } => {
                let text = if config.keep_style_tags {
                    source.text.to_string()
                } else {
                    remaining
                };
                if text.is_empty() {
                    continue;
                }
                let Some(head) = head else {
                    tracing::debug!(%url, "no <head> for external stylesheet leftovers");
                    continue;
                };
                let style = style_element(dom, &text);
                dom.append_child(head, style);
            }
        }
    }
}

fn style_element(dom: &mut Dom, css: &str) -> NodeId {
    let style = dom.create_html_element("style", vec![Attr::new("type", "text/css")]);
    dom.append_text(style, css);
    style
}

/// Drop every `class` attribute.
pub fn remove_classes(dom: &mut Dom) {
    for id in dom.elements() {
        if let Some(element) = dom.element_mut(id) {
            element.remove_attr("class");
        }
    }
}
