//! Log normalizer: strips terminal escape sequences from captured output.

use regex::Regex;
use std::sync::LazyLock;

// CSI (`ESC [ ... final`), OSC (`ESC ] ... BEL|ST`) and two-byte escapes.
static ESCAPE_SEQUENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)|\x1b[@-Z\\-_]")
        .expect("static regex")
});

/// Remove escape sequences; every other byte of the input is preserved.
///
/// Any stray `ESC` left after sequence removal is dropped too, so the
/// result never contains an escape byte and `strip` is idempotent.
pub fn strip(text: &str) -> String {
    if !text.contains('\u{1b}') {
        return text.to_string();
    }
    ESCAPE_SEQUENCE
        .replace_all(text, "")
        .chars()
        .filter(|c| *c != '\u{1b}')
        .collect()
}
