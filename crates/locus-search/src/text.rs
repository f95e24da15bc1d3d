//! Query normalisation and text matching.

/// How a query matched a candidate's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    SubtitleOnly,
    Substring,
    Prefix,
    Exact,
}

impl MatchKind {
    /// Base relevance before source and proximity bonuses.
    #[must_use]
    pub fn base_score(self) -> f64 {
        match self {
            MatchKind::Exact => 100.0,
            MatchKind::Prefix => 75.0,
            MatchKind::Substring => 50.0,
            MatchKind::SubtitleOnly => 25.0,
        }
    }
}

/// Lowercase, strip Latin diacritics, drop apostrophes and collapse
/// punctuation and whitespace runs to single spaces.
///
/// `"Aéroport  N'djili"` folds to `"aeroport ndjili"`.
#[must_use]
pub fn fold(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;
    for ch in input.chars().flat_map(char::to_lowercase) {
        let mapped: &str = match ch {
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
            'æ' => "ae",
            'ç' => "c",
            'è' | 'é' | 'ê' | 'ë' => "e",
            'ì' | 'í' | 'î' | 'ï' => "i",
            'ñ' => "n",
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => "o",
            'œ' => "oe",
            'ù' | 'ú' | 'û' | 'ü' => "u",
            'ý' | 'ÿ' => "y",
            '\'' | '’' | '`' | 'ʼ' => continue,
            c if c.is_alphanumeric() => {
                if pending_space && !out.is_empty() {
                    out.push(' ');
                }
                pending_space = false;
                out.push(c);
                continue;
            }
            _ => {
                pending_space = true;
                continue;
            }
        };
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push_str(mapped);
    }
    out
}

/// Match an already-folded query against already-folded text.
#[must_use]
pub fn match_text(query: &str, text: &str) -> Option<MatchKind> {
    if query.is_empty() || text.is_empty() {
        return None;
    }
    if text == query {
        Some(MatchKind::Exact)
    } else if text.starts_with(query) {
        Some(MatchKind::Prefix)
    } else if text.contains(query) {
        Some(MatchKind::Substring)
    } else {
        None
    }
}

/// Best match over a title and its aliases, falling back to the subtitle.
///
/// All inputs must already be folded. An alias counts as a title.
#[must_use]
pub fn best_match<'a>(
    query: &str,
    titles: impl IntoIterator<Item = &'a str>,
    subtitle: Option<&str>,
) -> Option<MatchKind> {
    titles
        .into_iter()
        .filter_map(|t| match_text(query, t))
        .max()
        .or_else(|| {
            subtitle
                .and_then(|s| match_text(query, s))
                .map(|_| MatchKind::SubtitleOnly)
        })
}
