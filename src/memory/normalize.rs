//! Canonical text form for exact-match comparisons.
//!
//! Stored entry text accumulates cosmetic decorations: an
//! `(Edited on <timestamp>)` suffix after updates, and `Stored on:` /
//! `Updated on:` footer lines in rendered task text. Delete and update
//! resolve their targets by equality, so one normalization function is
//! applied to both the stored content and the caller's key before comparing.

/// Marker prefix of the edit annotation appended to updated memory text.
const EDIT_MARKER: &str = "(Edited on ";

/// Footer line prefixes stamped into rendered task text.
const FOOTER_PREFIXES: [&str; 2] = ["Stored on:", "Updated on:"];

/// Strip decorations and trim, producing the comparable form of entry text.
pub fn normalize(text: &str) -> String {
    let mut s = text.trim();

    // Drop a trailing edit annotation, e.g. "… (Edited on 2024-05-01T09:00:00-04:00)"
    if s.ends_with(')') {
        if let Some(pos) = s.rfind(EDIT_MARKER) {
            s = s[..pos].trim_end();
        }
    }

    let kept: Vec<&str> = s
        .lines()
        .filter(|line| {
            let lead = line.trim_start();
            !FOOTER_PREFIXES.iter().any(|p| lead.starts_with(p))
        })
        .collect();

    kept.join("\n").trim().to_string()
}

/// Whether two pieces of entry text are the same after normalization.
pub fn matches(stored: &str, key: &str) -> bool {
    normalize(stored) == normalize(key)
}
