use std::collections::HashMap;

/// Render `{{name}}` placeholders in a single pass.
///
/// Substituted values are never re-scanned, so dialogue text that happens to
/// contain `{{query}}` stays literal. Unknown placeholders are kept unchanged.
pub fn render(template: &str, fields: &HashMap<&str, &str>) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        rendered.push_str(&rest[..start]);
        let Some(end_offset) = rest[start..].find("}}") else {
            rendered.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let placeholder = &rest[start..start + end_offset + 2];
        let name = placeholder[2..placeholder.len() - 2].trim();
        match fields.get(name) {
            Some(value) => rendered.push_str(value),
            None => rendered.push_str(placeholder),
        }
        rest = &rest[start + end_offset + 2..];
    }
    rendered.push_str(rest);
    rendered
}
