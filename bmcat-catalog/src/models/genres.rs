//! Genre list normalization
//!
//! Genres arrive either as a JSON array or as one comma-separated string
//! (the submission form sends the latter).

use serde::{Deserialize, Deserializer};

/// Trim, drop empties, drop duplicates keeping the first occurrence
pub fn normalize_genres<I, S>(genres: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for genre in genres {
        let genre = genre.as_ref().trim();
        if genre.is_empty() || normalized.iter().any(|g| g == genre) {
            continue;
        }
        normalized.push(genre.to_string());
    }
    normalized
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GenreInput {
    List(Vec<String>),
    CommaSeparated(String),
}

/// Serde helper accepting `["Rock", "Pop"]` or `"Rock, Pop"`
pub fn deserialize_genres<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let genres = match GenreInput::deserialize(deserializer)? {
        GenreInput::List(list) => normalize_genres(list),
        GenreInput::CommaSeparated(raw) => normalize_genres(raw.split(',')),
    };
    Ok(genres)
}

/// `Option` variant of [`deserialize_genres`] for optional request fields
pub fn deserialize_optional_genres<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let input = Option::<GenreInput>::deserialize(deserializer)?;
    Ok(input.map(|input| match input {
        GenreInput::List(list) => normalize_genres(list),
        GenreInput::CommaSeparated(raw) => normalize_genres(raw.split(',')),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Body {
        #[serde(deserialize_with = "deserialize_genres")]
        genres: Vec<String>,
        #[serde(default, deserialize_with = "deserialize_optional_genres")]
        extra: Option<Vec<String>>,
    }

    #[test]
    fn test_normalize_trims_and_dedupes() {
        let genres = normalize_genres([" Rock", "Pop ", "", "Rock", "  "]);
        assert_eq!(genres, vec!["Rock", "Pop"]);
    }

    #[test]
    fn test_accepts_array_or_comma_string() {
        let body: Body = serde_json::from_value(json!({"genres": ["J-Pop", " Anime "]})).unwrap();
        assert_eq!(body.genres, vec!["J-Pop", "Anime"]);
        assert!(body.extra.is_none());

        let body: Body =
            serde_json::from_value(json!({"genres": "Rock, Metal,,Rock", "extra": "Pop"})).unwrap();
        assert_eq!(body.genres, vec!["Rock", "Metal"]);
        assert_eq!(body.extra, Some(vec!["Pop".to_string()]));
    }
}
