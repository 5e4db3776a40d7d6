//! Sentence-level tokenizer.
//!
//! Splits an utterance at terminal/separator punctuation (Chinese and Latin
//! variants). Each punctuation character becomes its own fragment so that a
//! changed comma does not mark the surrounding clause as changed.

/// Punctuation characters that end a fragment.
pub const BOUNDARIES: [char; 12] = ['。', '！', '？', '；', '，', '、', '：', ',', '!', '?', ';', ':'];

/// Returns `true` when `c` is one of the fragment boundaries.
pub fn is_boundary(c: char) -> bool {
    BOUNDARIES.contains(&c)
}

/// Splits `text` into sentence fragments, keeping each boundary character as
/// a separate fragment and dropping empty fragments.
///
/// Fragments borrow from `text`; concatenating them reproduces the input.
pub fn tokenize(text: &str) -> Vec<&str> {
    let mut fragments = Vec::new();
    let mut start = 0;

    for (pos, c) in text.char_indices() {
        if !is_boundary(c) {
            continue;
        }
        if pos > start {
            fragments.push(&text[start..pos]);
        }
        let end = pos + c.len_utf8();
        fragments.push(&text[pos..end]);
        start = end;
    }
    if start < text.len() {
        fragments.push(&text[start..]);
    }

    fragments
}
