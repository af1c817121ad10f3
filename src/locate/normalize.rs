/// Controls how [`normalize`] canonicalizes a string.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeOptions {
    pub ignore_case: bool,
    pub trim_whitespace: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            ignore_case: true,
            trim_whitespace: true,
        }
    }
}

/// Canonicalize a search string or candidate text for comparison.
///
/// Whitespace runs collapse to single spaces and the result is trimmed when
/// `trim_whitespace` is set; the result is lower-cased when `ignore_case` is
/// set. Idempotent: normalizing an already-normalized string is a no-op.
pub fn normalize(text: &str, options: NormalizeOptions) -> String {
    let mut out = if options.trim_whitespace {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    } else {
        text.to_string()
    };
    if options.ignore_case {
        out = out.to_lowercase();
    }
    out
}

/// [`normalize`] with the default options. This is the form every matching
/// strategy compares against.
pub fn canonical(text: &str) -> String {
    normalize(text, NormalizeOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_and_trims_whitespace() {
        assert_eq!(canonical("  Login \t\n  Button  "), "login button");
    }

    #[test]
    fn test_idempotent() {
        let once = canonical("  Mixed   CASE \t text ");
        assert_eq!(canonical(&once), once);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(canonical(""), "");
        assert_eq!(canonical("   \t\n "), "");
    }

    #[test]
    fn test_case_preserved_when_configured() {
        let opts = NormalizeOptions {
            ignore_case: false,
            trim_whitespace: true,
        };
        assert_eq!(normalize("  Save  Draft ", opts), "Save Draft");
    }

    #[test]
    fn test_whitespace_preserved_when_configured() {
        let opts = NormalizeOptions {
            ignore_case: true,
            trim_whitespace: false,
        };
        assert_eq!(normalize("A  B", opts), "a  b");
    }
}
