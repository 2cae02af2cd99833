//! Naming rules shared by the analyzer and the batch processor.
//!
//! Every regex, separator set and output template used to normalize a
//! filename lives in [`NamingRules`]. It is built once at start-up and then
//! only read.

use chrono::Datelike;
use regex::Regex;

/// Shown in place of the year when none could be extracted.
pub const YEAR_PLACEHOLDER: &str = "Set the correct year";

/// First commercial film exhibition.
pub const MIN_VALID_YEAR: u16 = 1895;

// Left over around a token once the year/episode has been cut out,
// e.g. "Title (" and ") rest" around "2011".
pub const TITLE_ARTIFACTS: &[char] = &['.', '[', ']', '<', '>', '(', ')', '-', '_', ' '];

pub const FILENAME_SEPARATORS: &[char] = &[' ', '.', '-', '_'];

pub const SEPARATOR_REPLACEMENTS: &[(char, char)] = &[('.', ' '), ('_', ' ')];

pub fn current_year() -> u16 {
    u16::try_from(chrono::Local::now().year()).unwrap_or(u16::MAX)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeMatch {
    pub season: u32,
    pub episode: u32,
    /// Byte offset of the token in the searched text.
    pub position: usize,
    /// Byte length of the token as written in the source (`s1e2` is 4).
    pub length: usize,
}

impl EpisodeMatch {
    pub fn code(&self) -> String {
        episode_code(self.season, self.episode)
    }
}

pub fn episode_code(season: u32, episode: u32) -> String {
    format!("S{:02}E{:02}", season, episode)
}

#[derive(Debug, Clone)]
pub struct NamingRules {
    year: Regex,
    episode_se: Regex,
    episode_x: Regex,
    episode_any: Regex,
    edited_season: Regex,
    series_full: Regex,
    series_normalized: Regex,
    film_normalized: Regex,
    year_in_parens: Regex,
    title_before_episode: Regex,
    whitespace: Regex,
    min_year: u16,
    max_year: u16,
}

impl NamingRules {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            year: Regex::new(r"\b\d{4}\b")?,
            episode_se: Regex::new(r"(?i)s(\d+)e(\d+)")?,
            episode_x: Regex::new(r"(?i)(\d+)x(\d+)")?,
            episode_any: Regex::new(r"[Ss](\d+)[Ee](\d+)|(\d+)[Xx](\d+)")?,
            edited_season: Regex::new(r"(?i)s(\d{1,2})e\d{1,2}")?,
            series_full: Regex::new(r"(?i)^(.+?) \((\d{4})\) - S\d+E\d+( - .+)?$")?,
            series_normalized: Regex::new(r"(?i)^[^(]+ \(\d{4}\) - S\d+E\d+( - .+)?$")?,
            film_normalized: Regex::new(r"^[^(]+ \(\d{4}\)( - .+)?$")?,
            year_in_parens: Regex::new(r"\((\d{4})\)")?,
            title_before_episode: Regex::new(r"^(.+?)\s*-\s*[Ss]\d{1,2}[Ee]\d{1,2}")?,
            whitespace: Regex::new(r"\s+")?,
            min_year: MIN_VALID_YEAR,
            max_year: current_year(),
        })
    }

    pub fn with_max_year(mut self, max_year: u16) -> Self {
        self.max_year = max_year;
        self
    }

    pub fn min_year(&self) -> u16 {
        self.min_year
    }

    pub fn max_year(&self) -> u16 {
        self.max_year
    }

    pub fn year_in_range(&self, year: u16) -> bool {
        (self.min_year..=self.max_year).contains(&year)
    }

    pub fn placeholder(&self) -> &'static str {
        YEAR_PLACEHOLDER
    }

    pub fn has_placeholder(&self, name: &str) -> bool {
        name.contains(YEAR_PLACEHOLDER)
    }

    /// Leftmost 4-digit token whose value is an acceptable year.
    pub fn find_year(&self, text: &str) -> Option<(u16, usize)> {
        self.year.find_iter(text).find_map(|m| {
            let year: u16 = m.as_str().parse().ok()?;
            self.year_in_range(year).then_some((year, m.start()))
        })
    }

    /// `S##E##` anywhere wins over `##x##`.
    pub fn find_episode(&self, text: &str) -> Option<EpisodeMatch> {
        self.episode_se
            .captures(text)
            .or_else(|| self.episode_x.captures(text))
            .and_then(|caps| {
                let whole = caps.get(0)?;
                Some(EpisodeMatch {
                    season: caps[1].parse().ok()?,
                    episode: caps[2].parse().ok()?,
                    position: whole.start(),
                    length: whole.len(),
                })
            })
    }

    /// Leftmost token of either episode form, case-sensitive on the
    /// separators the way rename propagation reads original names.
    pub fn first_episode_token(&self, text: &str) -> Option<EpisodeMatch> {
        let caps = self.episode_any.captures(text)?;
        let whole = caps.get(0)?;
        let (season, episode) = match (caps.get(1), caps.get(2)) {
            (Some(s), Some(e)) => (s.as_str(), e.as_str()),
            _ => (caps.get(3)?.as_str(), caps.get(4)?.as_str()),
        };
        Some(EpisodeMatch {
            season: season.parse().ok()?,
            episode: episode.parse().ok()?,
            position: whole.start(),
            length: whole.len(),
        })
    }

    pub fn edited_season(&self, text: &str) -> Option<u32> {
        self.edited_season
            .captures(text)
            .and_then(|caps| caps[1].parse().ok())
    }

    /// Title and year of a `Title (YYYY) - S##E## [- Rest]` base name.
    pub fn parse_series_name<'a>(&self, base_name: &'a str) -> Option<(&'a str, &'a str)> {
        let caps = self.series_full.captures(base_name)?;
        Some((caps.get(1)?.as_str().trim(), caps.get(2)?.as_str()))
    }

    pub fn matches_film_normalized(&self, base_name: &str) -> bool {
        self.film_normalized.is_match(base_name)
    }

    pub fn matches_series_normalized(&self, base_name: &str) -> bool {
        self.series_normalized.is_match(base_name)
    }

    pub fn parenthesized_year<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.year_in_parens
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    pub fn title_before_episode<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.title_before_episode
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
    }

    pub fn strip_parenthesized_years(&self, text: &str) -> String {
        self.year_in_parens.replace_all(text, "").trim().to_string()
    }

    pub fn collapse_whitespace(&self, text: &str) -> String {
        self.whitespace.replace_all(text, " ").into_owned()
    }

    pub fn clean_segment(&self, raw: &str) -> String {
        replace_separators(raw.trim_matches(TITLE_ARTIFACTS))
    }

    pub fn film_name(&self, title: &str, year: &str, remainder: &str, ext: &str) -> String {
        if remainder.trim().is_empty() {
            format!("{title} ({year}){ext}")
        } else {
            format!("{title} ({year}) - {remainder}{ext}")
        }
    }

    pub fn series_name(
        &self,
        title: &str,
        year: &str,
        episode: &str,
        remainder: &str,
        ext: &str,
    ) -> String {
        if remainder.trim().is_empty() {
            format!("{title} ({year}) - {episode}{ext}")
        } else {
            format!("{title} ({year}) - {episode} - {remainder}{ext}")
        }
    }
}

pub fn replace_separators(text: &str) -> String {
    text.chars()
        .map(|c| {
            SEPARATOR_REPLACEMENTS
                .iter()
                .find(|(from, _)| *from == c)
                .map_or(c, |(_, to)| *to)
        })
        .collect()
}
