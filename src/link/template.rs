pub const PLACEHOLDER_NAME: &str = "{{nama}}";
pub const PLACEHOLDER_LINK: &str = "{{link}}";

/// Literal placeholder substitution in a single pass; substituted values are
/// never scanned again.
#[must_use]
pub fn render(template: &str, name: &str, link: &str) -> String {
    let mut out = String::with_capacity(template.len() + name.len() + link.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix(PLACEHOLDER_NAME) {
            out.push_str(name);
            rest = after;
        } else if let Some(after) = tail.strip_prefix(PLACEHOLDER_LINK) {
            out.push_str(link);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}
