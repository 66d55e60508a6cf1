//! Which attributes of which elements carry rewritable URLs.

/// Element tag → attributes holding a single URL reference.
pub const URL_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("a", &["href"]),
    ("area", &["href"]),
    ("link", &["href"]),
    ("base", &["href"]),
    ("img", &["src"]),
    ("script", &["src"]),
    ("iframe", &["src"]),
    ("frame", &["src"]),
    ("embed", &["src"]),
    ("source", &["src"]),
    ("track", &["src"]),
    ("input", &["src"]),
    ("audio", &["src"]),
    ("video", &["src", "poster"]),
    ("form", &["action"]),
];

/// Attributes rewritten on `tag`, empty when the tag has none.
pub fn attributes_for(tag: &str) -> &'static [&'static str] {
    URL_ATTRIBUTES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(tag))
        .map(|(_, attributes)| *attributes)
        .unwrap_or(&[])
}
