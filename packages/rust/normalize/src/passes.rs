//! Character-stripping passes behind [`crate::normalize`].
//!
//! Each pass is a function `&str -> String` applied in sequence. The order is
//! fixed: keys produced by older exports must stay byte-for-byte identical.

use std::sync::LazyLock;

use regex::Regex;

/// Run every pass over `text`.
pub(crate) fn run_pipeline(text: &str) -> String {
    let mut result = text.to_lowercase();

    result = strip_escaped_newlines(&result);
    result = strip_ascii_symbols(&result);
    result = strip_fullwidth_block(&result);
    result = strip_whitespace(&result);
    result = strip_cjk_symbols(&result);
    result = strip_ideographic_full_stop(&result);
    result = strip_backslashes(&result);

    result
}

// ---------------------------------------------------------------------------
// Pass 1: Escaped newlines
// ---------------------------------------------------------------------------

/// Remove `\n` written out as two characters (exports escape line breaks).
fn strip_escaped_newlines(text: &str) -> String {
    static RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\n").expect("valid regex"));

    RE.replace_all(text, "").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 2: ASCII punctuation and symbols
// ---------------------------------------------------------------------------

/// Remove `!`-`/`, `:`-`@`, `[`-backtick and `{`-`~`.
fn strip_ascii_symbols(text: &str) -> String {
    static RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[!-/:-@\[-`{-~]").expect("valid regex"));

    RE.replace_all(text, "").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 3: Full-width block
// ---------------------------------------------------------------------------

/// Remove U+FE30..=U+FF20: CJK compatibility forms, small form variants and
/// the full-width ASCII range up to `＠` (full-width digits included).
fn strip_fullwidth_block(text: &str) -> String {
    static RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[\x{FE30}-\x{FF20}]").expect("valid regex"));

    RE.replace_all(text, "").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 4: Whitespace
// ---------------------------------------------------------------------------

/// Remove all Unicode whitespace, ideographic space included.
fn strip_whitespace(text: &str) -> String {
    static RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s+]").expect("valid regex"));

    RE.replace_all(text, "").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 5: CJK punctuation
// ---------------------------------------------------------------------------

fn strip_cjk_symbols(text: &str) -> String {
    static RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"[、・’〜：＜＞＿｜「」｛｝【】『』〈〉“”◯○〔〕…―◇]").expect("valid regex")
    });

    RE.replace_all(text, "").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 6: Ideographic full stop
// ---------------------------------------------------------------------------

fn strip_ideographic_full_stop(text: &str) -> String {
    text.replace('。', "")
}

// ---------------------------------------------------------------------------
// Pass 7: Backslashes
// ---------------------------------------------------------------------------

fn strip_backslashes(text: &str) -> String {
    text.replace('\\', "")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaped_newline_removed_but_real_n_kept() {
        assert_eq!(strip_escaped_newlines(r"line one\nline two"), "line oneline two");
        assert_eq!(strip_escaped_newlines("no escapes here"), "no escapes here");
    }

    #[test]
    fn ascii_symbols_removed() {
        assert_eq!(strip_ascii_symbols("What's up? (a+b)=c!"), "Whats up abc");
        assert_eq!(strip_ascii_symbols("a_b`c|d~e"), "abcde");
        assert_eq!(strip_ascii_symbols("plain 123"), "plain 123");
    }

    #[test]
    fn fullwidth_block_removed() {
        assert_eq!(strip_fullwidth_block("パスワード？！"), "パスワード");
        assert_eq!(strip_fullwidth_block("ＩＤ１２"), "ＩＤ");
        assert_eq!(strip_fullwidth_block("﹏x"), "x");
    }

    #[test]
    fn whitespace_removed_including_ideographic_space() {
        assert_eq!(strip_whitespace("a b\tc\u{3000}d\ne"), "abcde");
    }

    #[test]
    fn cjk_symbols_removed() {
        assert_eq!(strip_cjk_symbols("「設定」・【手順】〜…"), "設定手順");
        assert_eq!(strip_cjk_symbols("“quoted”"), "quoted");
    }

    #[test]
    fn full_stop_and_backslash_removed() {
        assert_eq!(strip_ideographic_full_stop("です。"), "です");
        assert_eq!(strip_backslashes(r"a\b"), "ab");
    }

    #[test]
    fn full_pipeline_orders_passes() {
        let input = "  How do I RESET my password?\\n「パスワード」。 ";
        assert_eq!(run_pipeline(input), "howdoiresetmypasswordパスワード");
    }
}
