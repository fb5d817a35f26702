use crate::fonts::text_width;
use crate::model::DEFAULT_WRAP_SAFETY;

/// Greedy word wrap in Helvetica at `font_size`.
///
/// A word joins the current line while the joined line measures less than
/// `max_width - safety`; otherwise the line closes and the word starts the next
/// one. A word that is wider than the column on its own still gets a line of its
/// own, so such lines overflow instead of being broken mid-word.
pub fn wrap_text_with_safety(text: &str, max_width: f32, font_size: f32, safety: f32) -> Vec<String> {
    let limit = max_width - safety;
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate_w = text_width(&current, font_size)
            + text_width(" ", font_size)
            + text_width(word, font_size);
        if candidate_w < limit {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// [`wrap_text_with_safety`] with the default `StampStyle::wrap_safety` margin.
pub fn wrap_text(text: &str, max_width: f32, font_size: f32) -> Vec<String> {
    wrap_text_with_safety(text, max_width, font_size, DEFAULT_WRAP_SAFETY)
}
