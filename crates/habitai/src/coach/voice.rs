//! Speech-friendly text for voice mode
//!
//! Strips markdown emphasis and code markers and flattens line breaks so a
//! text-to-speech engine reads the answer as plain sentences.

/// Characters removed outright: `*` (covers `**`), `_` and backticks
const FORMATTING_MARKERS: [char; 3] = ['*', '_', '`'];

/// Prepare a model answer for speech. Idempotent.
pub fn prepare_for_voice(text: &str) -> String {
    let mut spoken = String::with_capacity(text.len());
    let mut in_line_break = false;

    for c in text.chars().filter(|c| !FORMATTING_MARKERS.contains(c)) {
        if c == '\n' || c == '\r' {
            if !in_line_break {
                spoken.push(' ');
                in_line_break = true;
            }
        } else {
            spoken.push(c);
            in_line_break = false;
        }
    }

    spoken.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_emphasis() {
        assert_eq!(
            prepare_for_voice("**Great job!** Keep *going*"),
            "Great job! Keep going"
        );
    }

    #[test]
    fn test_strips_code_and_underscore_markers() {
        assert_eq!(prepare_for_voice("Try `two_minutes` __now__"), "Try twominutes now");
    }

    #[test]
    fn test_collapses_newlines() {
        assert_eq!(
            prepare_for_voice("First line\nSecond line\r\n\nThird"),
            "First line Second line Third"
        );
    }

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(prepare_for_voice("\n  hello  \n"), "hello");
        assert_eq!(prepare_for_voice("**"), "");
    }

    #[test]
    fn test_markers_spanning_newlines() {
        // Removing a marker between two breaks must not leave two spaces
        assert_eq!(prepare_for_voice("a\n*\nb"), "a b");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "**Bold** and _italic_\n\n- list item\n- `code`",
            "  padded \n\n\n text  ",
            "plain text",
            "\r\n*\r\n_\r\n",
            "emoji 🎯 stays\nintact",
            "",
        ];
        for input in inputs {
            let once = prepare_for_voice(input);
            assert_eq!(prepare_for_voice(&once), once, "input: {input:?}");
        }
    }
}
