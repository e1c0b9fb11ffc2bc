/// Replaces characters that can not appear inside a single file name component.
pub fn sanitize_component(value: &str) -> String {
    value
        .chars()
        .map(|ch| if is_disallowed_char(ch) { '_' } else { ch })
        .collect()
}

pub fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.')
}

fn is_disallowed_char(ch: char) -> bool {
    matches!(ch, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || ch.is_control()
}
