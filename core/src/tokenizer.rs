use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;

lazy_static! {
    static ref NON_LETTER: Regex = Regex::new(r"[^a-zA-Z]").expect("valid regex");
}

/// Remove every character that is not an ASCII letter, keeping order and case.
pub fn strip_non_letters(word: &str) -> Cow<'_, str> {
    NON_LETTER.replace_all(word, "")
}

/// Split a line on whitespace and strip each word down to its letters.
/// Words with no letters at all are dropped.
pub fn tokenize(line: &str) -> impl Iterator<Item = String> + '_ {
    line.split_whitespace()
        .map(strip_non_letters)
        .filter(|t| !t.is_empty())
        .map(Cow::into_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t: Vec<String> = tokenize("The Cat sat.").collect();
        assert_eq!(t, vec!["The", "Cat", "sat"]);
    }

    #[test]
    fn strips_inside_words() {
        assert_eq!(strip_non_letters("don't"), "dont");
        assert_eq!(strip_non_letters("e-mail42x"), "emailx");
        assert_eq!(strip_non_letters("café"), "caf");
    }

    #[test]
    fn stripping_is_a_projection() {
        for w in ["abc", "a1b2c3", "...", "", "Hello,World!", "ünïcödé", "x_y-z"] {
            let once = strip_non_letters(w).into_owned();
            assert_eq!(strip_non_letters(&once), once.as_str());
        }
    }

    #[test]
    fn punctuation_only_line_yields_nothing() {
        assert_eq!(tokenize("  ,,,  123  ").count(), 0);
        assert_eq!(tokenize("").count(), 0);
        assert_eq!(tokenize("\t \n").count(), 0);
    }
}
