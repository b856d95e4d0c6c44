use crate::api::MediaKind;
use once_cell::sync::Lazy;
use regex::Regex;

static TMDB_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://(?:www\.)?themoviedb\.org/(tv|movie)/(\d+)(?:-[^/?]*)?(?:\?.*)?$")
        .expect("tmdb url pattern")
});

static IMDB_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^tt\d+$").expect("imdb id pattern"));

/// Classification of free text typed at the auto-import prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    /// A TMDB title URL, e.g. `https://www.themoviedb.org/tv/292575-slug`
    TmdbUrl { media_kind: MediaKind, tmdb_id: String },
    /// A bare IMDB identifier like `tt0525553`
    ImdbId(String),
    /// Anything else is treated as a search keyword
    Keyword(String),
}

/// Decide what kind of identifier the user typed.
pub fn classify(text: &str) -> InputKind {
    let text = text.trim();

    if let Some(captures) = TMDB_URL.captures(text) {
        let media_kind = match &captures[1] {
            "movie" => MediaKind::Movie,
            _ => MediaKind::TvSeries,
        };
        return InputKind::TmdbUrl {
            media_kind,
            tmdb_id: captures[2].to_string(),
        };
    }

    if IMDB_ID.is_match(text) {
        return InputKind::ImdbId(text.to_string());
    }

    InputKind::Keyword(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_tmdb_tv_url() {
        let kind = classify("https://www.themoviedb.org/tv/292575-the-narcotic-operation");
        assert_eq!(
            kind,
            InputKind::TmdbUrl {
                media_kind: MediaKind::TvSeries,
                tmdb_id: "292575".into(),
            }
        );
    }

    #[test]
    fn classifies_tmdb_movie_url_without_slug() {
        let kind = classify("https://www.themoviedb.org/movie/1109586");
        assert_eq!(
            kind,
            InputKind::TmdbUrl {
                media_kind: MediaKind::Movie,
                tmdb_id: "1109586".into(),
            }
        );
    }

    #[test]
    fn classifies_imdb_id() {
        assert_eq!(classify(" tt0525553 "), InputKind::ImdbId("tt0525553".into()));
    }

    #[test]
    fn everything_else_is_a_keyword() {
        assert_eq!(classify("海贼王"), InputKind::Keyword("海贼王".into()));
        assert_eq!(
            classify("tt123abc"),
            InputKind::Keyword("tt123abc".into())
        );
    }
}
