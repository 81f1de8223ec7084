//! Utility functions and helpers

/// String utilities
pub mod string {
    /// Fold a name using RFC 1459 casemapping
    ///
    /// `A-Z`, `[`, `]`, `\` and `~` map to `a-z`, `{`, `}`, `|` and `^`.
    pub fn irc_lowercase(s: &str) -> String {
        s.chars()
            .map(|c| match c {
                'A'..='Z' => c.to_ascii_lowercase(),
                '[' => '{',
                ']' => '}',
                '\\' => '|',
                '~' => '^',
                _ => c,
            })
            .collect()
    }

    /// Whether two names are equal under RFC 1459 casemapping
    pub fn irc_eq(a: &str, b: &str) -> bool {
        a.len() == b.len() && irc_lowercase(a) == irc_lowercase(b)
    }

    /// Validate a channel name
    pub fn is_valid_channel_name(name: &str, max_length: usize) -> bool {
        if name.is_empty() || name.len() > max_length {
            return false;
        }

        match name.chars().next() {
            Some('#') | Some('&') => {}
            _ => return false,
        }

        // Space, comma and BEL are separators on the wire
        !name.chars().skip(1).any(|c| c == ' ' || c == ',' || c == '\x07')
    }

    /// Whether a target names a channel rather than a nickname
    pub fn is_channel_target(target: &str) -> bool {
        target.starts_with('#') || target.starts_with('&')
    }
}

/// Wildcard matching for IRC masks
pub mod wildcard {
    use super::string::irc_lowercase;

    /// Match `text` against a glob `pattern` (`*` and `?`), ignoring case
    pub fn matches(pattern: &str, text: &str) -> bool {
        let pattern: Vec<char> = irc_lowercase(pattern).chars().collect();
        let text: Vec<char> = irc_lowercase(text).chars().collect();

        let (mut p, mut t) = (0, 0);
        let mut star: Option<usize> = None;
        let mut resume = 0;

        while t < text.len() {
            if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
                p += 1;
                t += 1;
            } else if p < pattern.len() && pattern[p] == '*' {
                star = Some(p);
                resume = t;
                p += 1;
            } else if let Some(s) = star {
                // Let the last star swallow one more character
                p = s + 1;
                resume += 1;
                t = resume;
            } else {
                return false;
            }
        }

        pattern[p..].iter().all(|&c| c == '*')
    }
}
