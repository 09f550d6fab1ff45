/// Escapes text for use in XML element content and attribute values.
pub fn escape(s: &str) -> String {
    let mut ret = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => ret.push_str("&amp;"),
            '<' => ret.push_str("&lt;"),
            '>' => ret.push_str("&gt;"),
            '"' => ret.push_str("&quot;"),
            '\'' => ret.push_str("&apos;"),
            c => ret.push(c),
        }
    }
    ret
}
