use anyhow::Context;
use regex::Regex;

/// A list of regular-expression fragments combined into one alternation.
///
/// Matching must start at the first byte of the path but does not have to
/// consume it entirely. Case-sensitive, tested against the full path string.
#[derive(Debug, Clone)]
pub struct PatternSet {
    combined: Option<Regex>,
}

impl PatternSet {
    /// Compile `fragments` into a single alternation. An empty list matches
    /// nothing; an invalid fragment fails the whole set.
    pub fn compile(fragments: &[String]) -> anyhow::Result<Self> {
        if fragments.is_empty() {
            return Ok(Self { combined: None });
        }
        let alternation = format!("({})", fragments.join(")|("));
        let combined = Regex::new(&format!("^(?:{})", alternation))
            .with_context(|| format!("invalid pattern set {:?}", fragments))?;
        Ok(Self {
            combined: Some(combined),
        })
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.combined.as_ref().is_some_and(|re| re.is_match(path))
    }
}
