//! Minimal panel rendering for production mode.

const PANEL_WIDTH: usize = 78;

/// Draw a titled box around wrapped body text.
pub fn panel(title: &str, body: &str) -> String {
    let inner = PANEL_WIDTH - 4;
    let mut out = String::new();

    let mut header = format!("┌─ {title} ");
    let used = 3 + title.chars().count() + 1;
    header.push_str(&"─".repeat(PANEL_WIDTH.saturating_sub(used + 1)));
    header.push('┐');
    out.push_str(&header);
    out.push('\n');

    for line in wrap(body, inner) {
        let pad = inner.saturating_sub(line.chars().count());
        out.push_str(&format!("│ {}{} │\n", line, " ".repeat(pad)));
    }

    out.push('└');
    out.push_str(&"─".repeat(PANEL_WIDTH - 2));
    out.push('┘');
    out
}

/// Greedy word wrap; words longer than the width are split hard.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for raw_line in text.lines() {
        if raw_line.trim().is_empty() {
            lines.push(String::new());
            continue;
        }
        let mut current = String::new();
        for word in raw_line.split_whitespace() {
            let word_len = word.chars().count();
            if !current.is_empty() && current.chars().count() + 1 + word_len > width {
                lines.push(std::mem::take(&mut current));
            }
            if word_len > width {
                // Hard-split oversized tokens (URLs, ids)
                let mut rest: Vec<char> = word.chars().collect();
                while rest.len() > width {
                    let chunk: String = rest.drain(..width).collect();
                    if !current.is_empty() {
                        lines.push(std::mem::take(&mut current));
                    }
                    lines.push(chunk);
                }
                current = rest.into_iter().collect();
            } else {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_has_title_and_borders() {
        let boxed = panel("Valet", "hello");
        let lines: Vec<&str> = boxed.lines().collect();
        assert!(lines[0].starts_with("┌─ Valet "));
        assert!(lines[0].ends_with('┐'));
        assert!(lines[1].contains("hello"));
        assert!(lines.last().unwrap().starts_with('└'));
    }

    #[test]
    fn wrap_respects_width() {
        let lines = wrap("one two three four five six seven eight nine ten", 15);
        assert!(lines.iter().all(|l| l.chars().count() <= 15));
        assert!(lines.len() > 1);
    }

    #[test]
    fn wrap_splits_oversized_words() {
        let lines = wrap(&"x".repeat(40), 15);
        assert!(lines.iter().all(|l| l.chars().count() <= 15));
    }

    #[test]
    fn wrap_preserves_blank_lines() {
        let lines = wrap("para one\n\npara two", 20);
        assert_eq!(lines, vec!["para one", "", "para two"]);
    }
}
