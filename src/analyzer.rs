//! Filename analysis: pulls the year and episode out of a raw media
//! filename and rebuilds it as `Title (Year) [- S##E##] [- Remainder].ext`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::patterns::{replace_separators, EpisodeMatch, NamingRules, FILENAME_SEPARATORS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Film,
    Series,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Film => "film",
            MediaType::Series => "series",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "film" | "films" | "movie" | "movies" => Ok(MediaType::Film),
            "series" | "tv" | "show" | "shows" => Ok(MediaType::Series),
            other => Err(AnalysisError::UnsupportedMediaType(other.to_string())),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("No episode found in the title")]
    MissingEpisode,
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearMatch {
    pub year: u16,
    pub position: usize,
}

/// Tokens extracted from one filename, kept by the batch item so it can be
/// re-rendered (e.g. once the user supplies a year) without parsing again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerState {
    pub base_name: String,
    /// Lowercased, including the leading dot. Empty when the name has none.
    pub extension: String,
    pub media_type: MediaType,
    pub year: Option<YearMatch>,
    pub episode: Option<EpisodeMatch>,
    /// Used when `year` is `None` (or unusable); the placeholder otherwise.
    pub fallback_year: Option<String>,
}

impl AnalyzerState {
    pub fn set_fallback_year(&mut self, year: impl Into<String>) {
        self.fallback_year = Some(year.into());
    }

    fn fallback_text<'a>(&'a self, rules: &'a NamingRules) -> &'a str {
        self.fallback_year.as_deref().unwrap_or(rules.placeholder())
    }
}

/// Splits `name` into base and extension (with the dot). Only a trailing
/// alphanumeric run counts as an extension, so "Mr. Robot (2015)" has none.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx)
            if idx > 0
                && idx + 1 < name.len()
                && name[idx + 1..].chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            name.split_at(idx)
        }
        _ => (name, ""),
    }
}

#[derive(Debug, Clone)]
pub struct FilenameAnalyzer {
    rules: NamingRules,
}

impl FilenameAnalyzer {
    pub fn new(rules: NamingRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &NamingRules {
        &self.rules
    }

    pub fn extract_year(&self, text: &str) -> Option<YearMatch> {
        self.rules
            .find_year(text)
            .map(|(year, position)| YearMatch { year, position })
    }

    pub fn extract_episode(&self, text: &str) -> Option<EpisodeMatch> {
        self.rules.find_episode(text)
    }

    pub fn analyze(&self, file_name: &str, media_type: MediaType) -> AnalyzerState {
        let (base, ext) = split_extension(file_name);
        let episode = match media_type {
            MediaType::Series => self.extract_episode(base),
            MediaType::Film => None,
        };
        AnalyzerState {
            base_name: base.to_string(),
            extension: ext.to_lowercase(),
            media_type,
            year: self.extract_year(base),
            episode,
            fallback_year: None,
        }
    }

    pub fn render(&self, state: &AnalyzerState) -> Result<String, AnalysisError> {
        match state.media_type {
            MediaType::Film => Ok(self.render_film(state)),
            MediaType::Series => self.render_series(state),
        }
    }

    /// Normalizes `file_name`. `fallback_year` stands in for a missing year;
    /// without it the placeholder is emitted and the caller must ask for one.
    pub fn format(
        &self,
        file_name: &str,
        media_type: MediaType,
        fallback_year: Option<&str>,
    ) -> Result<String, AnalysisError> {
        let mut state = self.analyze(file_name, media_type);
        if let Some(year) = fallback_year {
            state.set_fallback_year(year);
        }
        self.render(&state)
    }

    pub fn is_normalized(&self, file_name: &str, media_type: MediaType) -> bool {
        let (base, _) = split_extension(file_name);
        match media_type {
            MediaType::Series => self.rules.matches_series_normalized(base),
            MediaType::Film => self.rules.matches_film_normalized(base),
        }
    }

    pub fn validate_year(&self, year: &str) -> bool {
        !year.is_empty()
            && year.chars().all(|c| c.is_ascii_digit())
            && year
                .parse::<u16>()
                .is_ok_and(|y| self.rules.year_in_range(y))
    }

    fn render_film(&self, state: &AnalyzerState) -> String {
        let base = state.base_name.as_str();
        let ext = state.extension.as_str();
        match state.year {
            Some(found) => {
                let title = self.rules.clean_segment(&base[..found.position]);
                let remainder = self.rules.clean_segment(&base[found.position + 4..]);
                self.rules
                    .film_name(&title, &found.year.to_string(), &remainder, ext)
            }
            None => {
                let title = replace_separators(base.trim_matches(FILENAME_SEPARATORS));
                self.rules
                    .film_name(&title, state.fallback_text(&self.rules), "", ext)
            }
        }
    }

    fn render_series(&self, state: &AnalyzerState) -> Result<String, AnalysisError> {
        let episode = state.episode.as_ref().ok_or(AnalysisError::MissingEpisode)?;
        let base = state.base_name.as_str();
        let raw_remainder = &base[episode.position + episode.length..];

        // A year after the episode token is not trusted.
        let (raw_title, year) = match state.year {
            Some(found) if found.position < episode.position => {
                (&base[..found.position], found.year.to_string())
            }
            _ => (
                &base[..episode.position],
                state.fallback_text(&self.rules).to_string(),
            ),
        };

        Ok(self.rules.series_name(
            &self.rules.clean_segment(raw_title),
            &year,
            &episode.code(),
            &self.rules.clean_segment(raw_remainder),
            &state.extension,
        ))
    }
}
