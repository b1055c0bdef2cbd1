/// Characters that end a sentence when they sit right before a line break
pub const SENTENCE_END: [char; 3] = ['.', '?', '!'];

/// Rejoin lines broken by print wrapping.
///
/// A `\n` survives only when the character immediately before it in the input
/// is `.`, `?` or `!`; every other `\n` becomes one space. Runs of spaces are
/// left as they are.
pub fn join_broken_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev: Option<char> = None;
    for c in text.chars() {
        if c == '\n' && !prev.is_some_and(|p| SENTENCE_END.contains(&p)) {
            out.push(' ');
        } else {
            out.push(c);
        }
        prev = Some(c);
    }
    out
}
