/// Characters stripped from the start of a line before display or export.
const LEADING_DECORATION: [char; 4] = ['#', '>', '-', '*'];
const EMPHASIS: char = '*';

fn is_leading_decoration(c: char) -> bool {
    c.is_whitespace() || LEADING_DECORATION.contains(&c)
}

/// Strips markdown-ish decoration from a single line.
///
/// The leading run of `#`, `>`, `-`, `*` and whitespace goes first, then every
/// remaining `*`, then surrounding whitespace. Colons, digits and interior
/// punctuation are left alone so dialogue lines survive intact.
pub fn sanitize(line: &str) -> String {
    line.trim_start_matches(is_leading_decoration)
        .replace(EMPHASIS, "")
        .trim()
        .to_string()
}

/// Splits on `\n`, dropping a trailing `\r` from each line.
///
/// Unlike [`str::lines`], a trailing newline yields a final empty line.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
}

/// Applies [`sanitize`] to every line, keeping blank lines in place.
pub fn sanitize_text(text: &str) -> String {
    split_lines(text).map(sanitize).collect::<Vec<_>>().join("\n")
}

/// First `max` characters of `text` (not bytes).
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_heading_markers() {
        assert_eq!(sanitize("### 第5集：逆转"), "第5集：逆转");
        assert_eq!(sanitize("> - **场景**：夜，天台"), "场景：夜，天台");
        assert_eq!(sanitize("  * 林渊：走。  "), "林渊：走。");
    }

    #[test]
    fn test_sanitize_keeps_interior_punctuation() {
        assert_eq!(sanitize("倒计时 3-2-1：开始"), "倒计时 3-2-1：开始");
        assert_eq!(sanitize("A: b # c > d"), "A: b # c > d");
        assert_eq!(sanitize("林渊：**你**以为"), "林渊：你以为");
    }

    #[test]
    fn test_sanitize_blank_and_decoration_only() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("   "), "");
        assert_eq!(sanitize("***"), "");
        assert_eq!(sanitize("----------"), "");
        assert_eq!(sanitize("\u{3000}\u{3000}正文"), "正文");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let samples = [
            "### 第5集：逆转",
            "  >> -- ** 本集钩子：1.xxx",
            "*a*b*c*",
            "# * # 林渊：*你*",
            "-",
            "  x  *  ",
            "**  # 场景",
            "（动作）",
            "\t- [冷笑]",
            "",
        ];
        for s in samples {
            let once = sanitize(s);
            assert_eq!(sanitize(&once), once, "not idempotent for {:?}", s);
        }
    }

    #[test]
    fn test_sanitize_text_preserves_blank_lines() {
        let raw = "## 第1集：开端\n\n**林渊**：走。\n> 动作：转身";
        assert_eq!(sanitize_text(raw), "第1集：开端\n\n林渊：走。\n动作：转身");
    }

    #[test]
    fn test_split_lines_keeps_trailing_blank_lines() {
        let lines: Vec<&str> = split_lines("结论\r\n\n").collect();
        assert_eq!(lines, vec!["结论", "", ""]);
        assert_eq!(sanitize_text("结论\n\n"), "结论\n\n");
    }

    #[test]
    fn test_truncate_chars_counts_characters() {
        assert_eq!(truncate_chars("林渊你好", 2), "林渊");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }
}
