use std::ops::Range;

/// A string with at most one highlighted span, as byte offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlighted {
    pub text: String,
    pub span: Option<Range<usize>>,
}

impl Highlighted {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            span: None,
        }
    }

    pub fn is_highlighted(&self) -> bool {
        self.span.is_some()
    }

    /// Splits into (before, marked, after). Unhighlighted text is all `before`.
    pub fn parts(&self) -> (&str, &str, &str) {
        match &self.span {
            Some(span) => (
                &self.text[..span.start],
                &self.text[span.clone()],
                &self.text[span.end..],
            ),
            None => (&self.text, "", ""),
        }
    }
}

/// Marks the first literal occurrence of `root` in `text`. Case-sensitive.
pub fn highlight(text: &str, root: &str) -> Highlighted {
    let span = if root.is_empty() {
        None
    } else {
        text.find(root).map(|start| start..start + root.len())
    };
    Highlighted {
        text: text.to_string(),
        span,
    }
}

/// Highlights with the first root that occurs in `text`.
pub fn highlight_first<S: AsRef<str>>(text: &str, roots: &[S]) -> Highlighted {
    roots
        .iter()
        .map(AsRef::as_ref)
        .find(|root| !root.is_empty() && text.contains(root))
        .map(|root| highlight(text, root))
        .unwrap_or_else(|| Highlighted::plain(text))
}
