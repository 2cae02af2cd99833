use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analyzer::{split_extension, AnalyzerState, FilenameAnalyzer, MediaType};
use crate::media_files::{LocalFiles, MediaFiles};
use crate::patterns::{episode_code, replace_separators, NamingRules, FILENAME_SEPARATORS};

pub const NOT_VIDEO_MARKER: &str = "(not a video file)";
pub const ALREADY_NORMALIZED_MARKER: &str = "(already normalized)";
pub const INVALID_MARKER: &str = "(invalid format)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ProcessingStatus {
    Ready,
    NeedsYear,
    Invalid,
    AlreadyNormalized,
    Duplicate,
    NotVideo,
}

impl ProcessingStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ProcessingStatus::Ready => "READY",
            ProcessingStatus::NeedsYear => "NEEDS YEAR",
            ProcessingStatus::Invalid => "INVALID",
            ProcessingStatus::AlreadyNormalized => "NORMALIZED",
            ProcessingStatus::Duplicate => "DUPLICATE",
            ProcessingStatus::NotVideo => "NOT VIDEO",
        }
    }

    pub fn is_editable(&self) -> bool {
        !matches!(
            self,
            ProcessingStatus::NotVideo | ProcessingStatus::AlreadyNormalized
        )
    }

    /// Lower is more urgent; used to order summaries.
    pub fn priority(&self) -> u8 {
        match self {
            ProcessingStatus::Duplicate => 1,
            ProcessingStatus::Invalid => 2,
            ProcessingStatus::NotVideo => 3,
            ProcessingStatus::NeedsYear => 4,
            ProcessingStatus::Ready => 5,
            ProcessingStatus::AlreadyNormalized => 6,
        }
    }

    pub fn summary_label(&self) -> &'static str {
        match self {
            ProcessingStatus::Ready => "Ready",
            ProcessingStatus::NeedsYear => "Needs Year",
            ProcessingStatus::Invalid => "Invalid",
            ProcessingStatus::AlreadyNormalized => "Already Normalized",
            ProcessingStatus::Duplicate => "Duplicates",
            ProcessingStatus::NotVideo => "Not Video",
        }
    }

    /// What the user should do next when this is the most urgent status.
    pub fn action_hint(&self) -> Option<&'static str> {
        match self {
            ProcessingStatus::Duplicate => Some("Please edit or remove duplicates"),
            ProcessingStatus::Invalid => Some("Edit or remove the file"),
            ProcessingStatus::NotVideo => Some("Remove the file"),
            ProcessingStatus::NeedsYear => Some("Edit to add a year"),
            ProcessingStatus::Ready => Some("Apply changes to proceed"),
            ProcessingStatus::AlreadyNormalized => None,
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ItemId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    id: ItemId,
    path: PathBuf,
    original_name: String,
    new_name: String,
    status: ProcessingStatus,
    analyzer_state: Option<AnalyzerState>,
    error_message: Option<String>,
}

impl MediaItem {
    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn new_name(&self) -> &str {
        &self.new_name
    }

    pub fn status(&self) -> ProcessingStatus {
        self.status
    }

    pub fn analyzer_state(&self) -> Option<&AnalyzerState> {
        self.analyzer_state.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn target_path(&self) -> PathBuf {
        match self.path.parent() {
            Some(folder) => folder.join(&self.new_name),
            None => PathBuf::from(&self.new_name),
        }
    }

    fn apply(&mut self, analysis: Analysis) {
        self.new_name = analysis.new_name;
        self.status = analysis.status;
        self.analyzer_state = analysis.state;
        self.error_message = analysis.error;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameReport {
    pub succeeded: usize,
    pub attempted: usize,
    pub errors: Vec<String>,
}

impl RenameReport {
    pub fn all_succeeded(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BatchError {
    #[error("Processing mode is not set")]
    ModeNotSet,
    #[error("Row {row} out of range (batch has {len} items)")]
    RowOutOfRange { row: usize, len: usize },
    #[error("Row {row} no longer holds the item being restored")]
    ItemMismatch { row: usize },
}

struct Analysis {
    new_name: String,
    status: ProcessingStatus,
    state: Option<AnalyzerState>,
    error: Option<String>,
}

impl Analysis {
    fn marker(marker: &str, status: ProcessingStatus, error: Option<String>) -> Self {
        Self {
            new_name: marker.to_string(),
            status,
            state: None,
            error,
        }
    }
}

/// Maps each repeated name to every index it appears at. Unique names are
/// left out.
pub fn check_for_duplicate_names<S: AsRef<str>>(names: &[S]) -> BTreeMap<String, Vec<usize>> {
    let mut seen: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (idx, name) in names.iter().enumerate() {
        seen.entry(name.as_ref().to_string()).or_default().push(idx);
    }
    seen.retain(|_, indices| indices.len() > 1);
    seen
}

#[derive(Debug)]
pub struct BatchProcessor<F: MediaFiles = LocalFiles> {
    analyzer: FilenameAnalyzer,
    files: F,
    mode: Option<MediaType>,
    items: Vec<MediaItem>,
    next_id: u64,
}

impl BatchProcessor<LocalFiles> {
    pub fn new(rules: NamingRules) -> Self {
        Self::with_files(rules, LocalFiles)
    }
}

impl<F: MediaFiles> BatchProcessor<F> {
    pub fn with_files(rules: NamingRules, files: F) -> Self {
        Self {
            analyzer: FilenameAnalyzer::new(rules),
            files,
            mode: None,
            items: Vec::new(),
            next_id: 0,
        }
    }

    pub fn set_mode(&mut self, mode: MediaType) {
        self.mode = Some(mode);
    }

    pub fn mode(&self) -> Option<MediaType> {
        self.mode
    }

    pub fn analyzer(&self) -> &FilenameAnalyzer {
        &self.analyzer
    }

    pub fn files(&self) -> &F {
        &self.files
    }

    pub fn process_files<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<&[MediaItem], BatchError> {
        let mode = self.mode.ok_or(BatchError::ModeNotSet)?;
        self.items.clear();

        for path in paths {
            let item = self.process_single_file(path.as_ref(), mode);
            debug!("{} -> {} [{}]", item.original_name, item.new_name, item.status);
            self.items.push(item);
        }

        self.update_duplicate_status();
        info!("Processed {} files as {}", self.items.len(), mode);
        Ok(&self.items)
    }

    /// Runs an edited name through the pipeline again. The already-normalized
    /// shortcut is skipped: an edit is always fresh input.
    pub fn reprocess_edited_file(&mut self, row: usize, new_filename: &str) -> Result<&MediaItem, BatchError> {
        self.check_row(row)?;
        let mode = self.mode.ok_or(BatchError::ModeNotSet)?;

        let analysis = if !self.files.is_video(Path::new(new_filename)) {
            Analysis::marker(
                NOT_VIDEO_MARKER,
                ProcessingStatus::NotVideo,
                Some("Not a valid video extension".to_string()),
            )
        } else {
            self.run_analyzer(new_filename, mode)
        };

        let item = &mut self.items[row];
        item.apply(analysis);
        debug!("Reprocessed row {}: {} [{}]", row, item.new_name, item.status);
        Ok(&self.items[row])
    }

    pub fn apply_series_year(&mut self, year: &str) -> usize {
        self.restore_duplicates();
        let mut updated = 0;

        for item in self.items.iter_mut() {
            if item.status != ProcessingStatus::NeedsYear {
                continue;
            }
            let Some(state) = item.analyzer_state.as_mut() else {
                continue;
            };
            state.set_fallback_year(year);
            match self.analyzer.render(state) {
                Ok(name) => {
                    item.new_name = name;
                    item.status = ProcessingStatus::Ready;
                    item.error_message = None;
                    updated += 1;
                }
                Err(e) => item.error_message = Some(e.to_string()),
            }
        }

        self.update_duplicate_status();
        info!("Applied year {} to {} files", year, updated);
        updated
    }

    /// Pushes the title, year and (if edited) season of one series episode
    /// onto every other editable episode. Each episode keeps its own episode
    /// number and episode title, read from its original filename.
    pub fn propagate_series_edit(&mut self, edited_row: usize, normalized_base_name: &str) -> Result<Vec<usize>, BatchError> {
        self.check_row(edited_row)?;
        if self.mode != Some(MediaType::Series) {
            return Ok(Vec::new());
        }

        let rules = self.analyzer.rules();
        let Some((title, year)) = rules.parse_series_name(normalized_base_name) else {
            debug!("Edited name does not match the series pattern: {}", normalized_base_name);
            return Ok(Vec::new());
        };
        let edited_season = rules.edited_season(normalized_base_name);
        match edited_season {
            Some(season) => info!(
                "Propagating series edit from row {}: title='{}', year={}, season={:02}",
                edited_row, title, year, season
            ),
            None => info!(
                "Propagating series edit from row {}: title='{}', year={} (season unchanged)",
                edited_row, title, year
            ),
        }

        let mut modified = Vec::new();
        for (row, item) in self.items.iter_mut().enumerate() {
            if row == edited_row || !item.status.is_editable() {
                continue;
            }

            let (base_name, extension) = split_extension(&item.original_name);
            let Some(found) = rules.first_episode_token(base_name) else {
                debug!("Row {}: no episode in original name", row);
                continue;
            };

            let season = edited_season.unwrap_or(found.season);
            let remainder = replace_separators(
                base_name[found.position + found.length..].trim_matches(FILENAME_SEPARATORS),
            );

            item.new_name = rules.series_name(
                title,
                year,
                &episode_code(season, found.episode),
                &remainder,
                &extension.to_lowercase(),
            );
            item.status = ProcessingStatus::Ready;
            item.error_message = None;
            if let Some(state) = item.analyzer_state.as_mut() {
                state.set_fallback_year(year);
            }
            debug!("Row {}: updated to {}", row, item.new_name);
            modified.push(row);
        }

        if !modified.is_empty() {
            self.update_duplicate_status();
        }
        info!("Propagation complete: {} episodes updated", modified.len());
        Ok(modified)
    }

    /// Turns already-normalized items back into editable ones. Films: just
    /// `row`. Series: every already-normalized episode, since series edits
    /// apply to the whole batch.
    pub fn force_edit_file(&mut self, row: usize) -> Result<Vec<usize>, BatchError> {
        self.check_row(row)?;
        let mode = self.mode.ok_or(BatchError::ModeNotSet)?;

        let targets: Vec<usize> = match mode {
            MediaType::Film => {
                if self.items[row].status == ProcessingStatus::AlreadyNormalized {
                    vec![row]
                } else {
                    warn!(
                        "force_edit_file: row {} is not already normalized ({})",
                        row, self.items[row].status
                    );
                    Vec::new()
                }
            }
            MediaType::Series => self
                .items
                .iter()
                .enumerate()
                .filter(|(_, item)| item.status == ProcessingStatus::AlreadyNormalized)
                .map(|(idx, _)| idx)
                .collect(),
        };

        for &idx in &targets {
            let original_name = self.items[idx].original_name.clone();
            let mut analysis = self.run_analyzer(&original_name, mode);
            if analysis.status != ProcessingStatus::Invalid {
                // A year out of range renders as the placeholder and still needs one.
                analysis.status = if self.analyzer.rules().has_placeholder(&analysis.new_name) {
                    ProcessingStatus::NeedsYear
                } else {
                    ProcessingStatus::Ready
                };
            }
            self.items[idx].apply(analysis);
        }

        if !targets.is_empty() {
            self.update_duplicate_status();
            info!("Force edit: {} files changed to READY", targets.len());
        }
        Ok(targets)
    }

    pub fn remove_file(&mut self, row: usize) -> bool {
        if row >= self.items.len() {
            warn!("Cannot remove file: invalid row {}", row);
            return false;
        }
        let removed = self.items.remove(row);
        self.update_duplicate_status();
        info!("Removed {} (row {})", removed.original_name, row);
        true
    }

    pub fn restore_item(&mut self, row: usize, item: MediaItem) -> Result<(), BatchError> {
        self.check_row(row)?;
        if self.items[row].id != item.id {
            return Err(BatchError::ItemMismatch { row });
        }
        self.items[row] = item;
        Ok(())
    }

    /// Renames every `Ready` item on disk. Failures stay in the batch with an
    /// error string; successes leave it. An existing target is never
    /// overwritten.
    pub fn apply_renames(&mut self) -> RenameReport {
        let mut report = RenameReport::default();
        let mut renamed = HashSet::new();

        for item in self.items.iter().filter(|i| i.status == ProcessingStatus::Ready) {
            report.attempted += 1;
            let target = item.target_path();

            if target != item.path && self.files.exists(&target) {
                warn!("Skipping {}: {} already exists", item.original_name, target.display());
                report.errors.push(format!(
                    "Error renaming {}: target '{}' already exists",
                    item.original_name, item.new_name
                ));
                continue;
            }

            match self.files.rename(&item.path, &target) {
                Ok(()) => {
                    info!("Renamed {} -> {}", item.original_name, item.new_name);
                    report.succeeded += 1;
                    renamed.insert(item.id);
                }
                Err(e) => {
                    warn!("Rename failed for {}: {}", item.original_name, e);
                    report
                        .errors
                        .push(format!("Error renaming {}: {}", item.original_name, e));
                }
            }
        }

        self.items.retain(|item| !renamed.contains(&item.id));
        report
    }

    pub fn check_target_conflicts(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|item| item.status == ProcessingStatus::Ready)
            .filter(|item| {
                let target = item.target_path();
                target != item.path && self.files.exists(&target)
            })
            .map(|item| item.new_name.clone())
            .collect()
    }

    /// Recomputes `Duplicate` from scratch: earlier duplicates first go back
    /// to the status their name implies, then repeated names among `Ready`
    /// and `NeedsYear` items are marked.
    pub fn update_duplicate_status(&mut self) {
        self.restore_duplicates();

        let candidates: Vec<usize> = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                matches!(
                    item.status,
                    ProcessingStatus::Ready | ProcessingStatus::NeedsYear
                )
            })
            .map(|(idx, _)| idx)
            .collect();

        let marked: Vec<usize> = {
            let names: Vec<&str> = candidates
                .iter()
                .map(|&idx| self.items[idx].new_name.as_str())
                .collect();
            check_for_duplicate_names(&names)
                .into_values()
                .flatten()
                .map(|k| candidates[k])
                .collect()
        };

        for idx in marked {
            self.items[idx].status = ProcessingStatus::Duplicate;
        }
    }

    pub fn get_statistics(&self) -> BTreeMap<ProcessingStatus, usize> {
        let mut counts = BTreeMap::new();
        for item in &self.items {
            *counts.entry(item.status).or_insert(0) += 1;
        }
        counts
    }

    pub fn has_ready_files(&self) -> bool {
        self.items.iter().any(|i| i.status == ProcessingStatus::Ready)
    }

    pub fn needs_year_input(&self) -> bool {
        self.items.iter().any(|i| i.status == ProcessingStatus::NeedsYear)
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn item(&self, row: usize) -> Option<&MediaItem> {
        self.items.get(row)
    }

    pub fn row_of(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.mode = None;
    }

    fn check_row(&self, row: usize) -> Result<(), BatchError> {
        if row < self.items.len() {
            Ok(())
        } else {
            Err(BatchError::RowOutOfRange {
                row,
                len: self.items.len(),
            })
        }
    }

    fn process_single_file(&mut self, path: &Path, mode: MediaType) -> MediaItem {
        let original_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let analysis = if !self.files.is_video(path) {
            Analysis::marker(
                NOT_VIDEO_MARKER,
                ProcessingStatus::NotVideo,
                Some("Not a valid video file".to_string()),
            )
        } else if self.analyzer.is_normalized(&original_name, mode) {
            Analysis::marker(ALREADY_NORMALIZED_MARKER, ProcessingStatus::AlreadyNormalized, None)
        } else {
            self.run_analyzer(&original_name, mode)
        };

        let id = ItemId(self.next_id);
        self.next_id += 1;

        MediaItem {
            id,
            path: path.to_path_buf(),
            original_name,
            new_name: analysis.new_name,
            status: analysis.status,
            analyzer_state: analysis.state,
            error_message: analysis.error,
        }
    }

    fn run_analyzer(&self, file_name: &str, mode: MediaType) -> Analysis {
        let state = self.analyzer.analyze(file_name, mode);
        match self.analyzer.render(&state) {
            Ok(new_name) => {
                let status = if self.analyzer.rules().has_placeholder(&new_name) {
                    ProcessingStatus::NeedsYear
                } else {
                    ProcessingStatus::Ready
                };
                Analysis {
                    new_name,
                    status,
                    state: Some(state),
                    error: None,
                }
            }
            Err(e) => Analysis::marker(INVALID_MARKER, ProcessingStatus::Invalid, Some(e.to_string())),
        }
    }

    fn restore_duplicates(&mut self) {
        let rules = self.analyzer.rules();
        for item in self.items.iter_mut() {
            if item.status != ProcessingStatus::Duplicate {
                continue;
            }
            item.status = if rules.has_placeholder(&item.new_name) {
                ProcessingStatus::NeedsYear
            } else if item.new_name.is_empty() || item.new_name == INVALID_MARKER {
                ProcessingStatus::Invalid
            } else {
                ProcessingStatus::Ready
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::io;

    /// Every path is a video unless it ends in `.txt`; renames are recorded.
    #[derive(Default)]
    struct RecordingFiles {
        existing: Vec<PathBuf>,
        failing: Vec<PathBuf>,
        renamed: RefCell<Vec<(PathBuf, PathBuf)>>,
    }

    impl MediaFiles for RecordingFiles {
        fn is_video(&self, path: &Path) -> bool {
            path.extension().is_none_or(|ext| ext != "txt")
        }

        fn exists(&self, path: &Path) -> bool {
            self.existing.iter().any(|p| p == path)
        }

        fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
            if self.failing.iter().any(|p| p == from) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"));
            }
            self.renamed.borrow_mut().push((from.to_path_buf(), to.to_path_buf()));
            Ok(())
        }
    }

    fn rules() -> NamingRules {
        NamingRules::new().unwrap().with_max_year(2024)
    }

    fn processor(mode: MediaType, files: RecordingFiles) -> BatchProcessor<RecordingFiles> {
        let mut processor = BatchProcessor::with_files(rules(), files);
        processor.set_mode(mode);
        processor
    }

    fn statuses<F: MediaFiles>(processor: &BatchProcessor<F>) -> Vec<ProcessingStatus> {
        processor.items().iter().map(|i| i.status()).collect()
    }

    #[test]
    fn test_check_for_duplicate_names() {
        let dups = check_for_duplicate_names(&["Movie (2020).mkv", "Film (2021).mkv", "Movie (2020).mkv"]);
        assert_eq!(dups.len(), 1);
        assert_eq!(dups["Movie (2020).mkv"], vec![0, 2]);
    }

    #[test]
    fn test_process_without_mode_fails() {
        let mut processor = BatchProcessor::with_files(rules(), RecordingFiles::default());
        let err = processor.process_files(&["/m/a.mkv"]).unwrap_err();
        assert_eq!(err, BatchError::ModeNotSet);
    }

    #[test]
    fn test_process_assigns_every_status() {
        let mut processor = processor(MediaType::Film, RecordingFiles::default());
        processor
            .process_files(&[
                "/m/The.Matrix.1999.mkv",
                "/m/Untitled.mkv",
                "/m/notes.txt",
                "/m/Alien (1979).mkv",
            ])
            .unwrap();

        assert_eq!(
            statuses(&processor),
            vec![
                ProcessingStatus::Ready,
                ProcessingStatus::NeedsYear,
                ProcessingStatus::NotVideo,
                ProcessingStatus::AlreadyNormalized,
            ]
        );
        assert_eq!(processor.items()[0].new_name(), "The Matrix (1999).mkv");
        assert_eq!(processor.items()[2].new_name(), NOT_VIDEO_MARKER);
        assert!(processor.items()[2].error_message().is_some());
    }

    #[test]
    fn test_series_without_episode_is_invalid() {
        let mut processor = processor(MediaType::Series, RecordingFiles::default());
        processor.process_files(&["/tv/random.video.file.mkv"]).unwrap();

        let item = &processor.items()[0];
        assert_eq!(item.status(), ProcessingStatus::Invalid);
        assert_eq!(item.new_name(), INVALID_MARKER);
        assert_eq!(item.error_message(), Some("No episode found in the title"));
    }

    #[test]
    fn test_duplicates_are_marked_and_released() {
        let mut processor = processor(MediaType::Film, RecordingFiles::default());
        processor
            .process_files(&["/m/Movie.2020.mkv", "/m/Film.2021.mkv", "/m/Movie 2020.mkv"])
            .unwrap();
        assert_eq!(
            statuses(&processor),
            vec![
                ProcessingStatus::Duplicate,
                ProcessingStatus::Ready,
                ProcessingStatus::Duplicate,
            ]
        );

        assert!(processor.remove_file(2));
        assert_eq!(
            statuses(&processor),
            vec![ProcessingStatus::Ready, ProcessingStatus::Ready]
        );
    }

    #[test]
    fn test_reprocess_skips_normalized_shortcut() {
        let mut processor = processor(MediaType::Film, RecordingFiles::default());
        processor.process_files(&["/m/Alien (1979).mkv"]).unwrap();

        let item = processor.reprocess_edited_file(0, "Alien (1979).mkv").unwrap();
        assert_eq!(item.status(), ProcessingStatus::Ready);
        assert_eq!(item.new_name(), "Alien (1979).mkv");
    }

    #[test]
    fn test_reprocess_out_of_range() {
        let mut processor = processor(MediaType::Film, RecordingFiles::default());
        processor.process_files(&["/m/Alien (1979).mkv"]).unwrap();
        let err = processor.reprocess_edited_file(3, "x.mkv").unwrap_err();
        assert_eq!(err, BatchError::RowOutOfRange { row: 3, len: 1 });
    }

    #[test]
    fn test_reprocess_non_video_name() {
        let mut processor = processor(MediaType::Film, RecordingFiles::default());
        processor.process_files(&["/m/Alien.1979.mkv"]).unwrap();
        let item = processor.reprocess_edited_file(0, "Alien.txt").unwrap();
        assert_eq!(item.status(), ProcessingStatus::NotVideo);
    }

    #[test]
    fn test_apply_series_year_promotes_needs_year() {
        let mut processor = processor(MediaType::Series, RecordingFiles::default());
        processor
            .process_files(&["/tv/show.s01e01.pilot.mkv", "/tv/show.s01e02.mkv"])
            .unwrap();
        assert!(processor.needs_year_input());

        assert_eq!(processor.apply_series_year("2008"), 2);
        assert!(!processor.needs_year_input());
        assert_eq!(processor.items()[0].new_name(), "show (2008) - S01E01 - pilot.mkv");
        assert_eq!(processor.items()[1].new_name(), "show (2008) - S01E02.mkv");
    }

    #[test]
    fn test_propagation_keeps_episode_numbers_and_titles() {
        let mut processor = processor(MediaType::Series, RecordingFiles::default());
        processor
            .process_files(&[
                "/tv/bb.s01e01.pilot.mkv",
                "/tv/bb.s01e02.cats.in.the.bag.mkv",
                "/tv/bb.1x03.mkv",
                "/tv/notes.txt",
            ])
            .unwrap();

        let modified = processor
            .propagate_series_edit(0, "Breaking Bad (2008) - S02E01 - pilot")
            .unwrap();
        assert_eq!(modified, vec![1, 2]);
        assert_eq!(
            processor.items()[1].new_name(),
            "Breaking Bad (2008) - S02E02 - cats in the bag.mkv"
        );
        assert_eq!(processor.items()[2].new_name(), "Breaking Bad (2008) - S02E03.mkv");
        assert_eq!(processor.items()[3].status(), ProcessingStatus::NotVideo);
    }

    #[test]
    fn test_propagation_is_series_only() {
        let mut processor = processor(MediaType::Film, RecordingFiles::default());
        processor.process_files(&["/m/a.2001.mkv", "/m/b.2002.mkv"]).unwrap();
        let modified = processor
            .propagate_series_edit(0, "Show (2008) - S01E01")
            .unwrap();
        assert!(modified.is_empty());
    }

    #[test]
    fn test_force_edit_film_touches_only_target() {
        let mut processor = processor(MediaType::Film, RecordingFiles::default());
        processor
            .process_files(&["/m/Alien (1979).mkv", "/m/Heat (1995).mkv"])
            .unwrap();

        assert_eq!(processor.force_edit_file(1).unwrap(), vec![1]);
        assert_eq!(
            statuses(&processor),
            vec![ProcessingStatus::AlreadyNormalized, ProcessingStatus::Ready]
        );
        assert_eq!(processor.items()[1].new_name(), "Heat (1995).mkv");
    }

    #[test]
    fn test_force_edit_series_touches_whole_batch() {
        let mut processor = processor(MediaType::Series, RecordingFiles::default());
        processor
            .process_files(&[
                "/tv/Show (2008) - S01E01 - Pilot.mkv",
                "/tv/show.s01e02.mkv",
                "/tv/Show (2008) - S01E03.mkv",
            ])
            .unwrap();

        assert_eq!(processor.force_edit_file(1).unwrap(), vec![0, 2]);
        assert_eq!(processor.items()[0].status(), ProcessingStatus::Ready);
        assert_eq!(processor.items()[2].new_name(), "Show (2008) - S01E03.mkv");
    }

    #[test]
    fn test_force_edit_keeps_needs_year_for_out_of_range_year() {
        let files = RecordingFiles::default();
        let mut processor = processor(MediaType::Film, files);
        processor.process_files(&["/m/Movie (2099).mkv"]).unwrap();
        assert_eq!(statuses(&processor), vec![ProcessingStatus::AlreadyNormalized]);

        assert_eq!(processor.force_edit_file(0).unwrap(), vec![0]);
        assert_eq!(statuses(&processor), vec![ProcessingStatus::NeedsYear]);
        assert!(!processor.has_ready_files());

        let report = processor.apply_renames();
        assert_eq!(report.attempted, 0);
        assert!(processor.files().renamed.borrow().is_empty());
    }

    #[test]
    fn test_apply_renames_only_touches_ready_items() {
        let files = RecordingFiles {
            failing: vec![PathBuf::from("/m/Heat.1995.mkv")],
            ..Default::default()
        };
        let mut processor = processor(MediaType::Film, files);
        processor
            .process_files(&[
                "/m/The.Matrix.1999.mkv",
                "/m/Heat.1995.mkv",
                "/m/Untitled.mkv",
                "/m/notes.txt",
                "/m/Alien (1979).mkv",
            ])
            .unwrap();

        let report = processor.apply_renames();
        assert_eq!(report.attempted, 2);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("Heat.1995.mkv"));

        let renamed = processor.files().renamed.borrow();
        assert_eq!(
            *renamed,
            vec![(
                PathBuf::from("/m/The.Matrix.1999.mkv"),
                PathBuf::from("/m/The Matrix (1999).mkv")
            )]
        );
        // The failed rename stays for a retry.
        assert_eq!(processor.len(), 4);
        assert_eq!(processor.items()[0].original_name(), "Heat.1995.mkv");
    }

    #[test]
    fn test_existing_target_is_flagged_and_not_overwritten() {
        let files = RecordingFiles {
            existing: vec![PathBuf::from("/m/The Matrix (1999).mkv")],
            ..Default::default()
        };
        let mut processor = processor(MediaType::Film, files);
        processor.process_files(&["/m/The.Matrix.1999.mkv"]).unwrap();

        assert_eq!(processor.check_target_conflicts(), vec!["The Matrix (1999).mkv"]);
        let report = processor.apply_renames();
        assert_eq!(report.succeeded, 0);
        assert_eq!(report.errors.len(), 1);
        assert!(processor.files().renamed.borrow().is_empty());
        assert_eq!(processor.len(), 1);
    }

    #[test]
    fn test_row_of_follows_removals() {
        let mut processor = processor(MediaType::Film, RecordingFiles::default());
        processor
            .process_files(&["/m/a.2001.mkv", "/m/b.2002.mkv", "/m/c.2003.mkv"])
            .unwrap();
        let id = processor.items()[2].id();
        processor.remove_file(0);
        assert_eq!(processor.row_of(id), Some(1));
    }

    #[test]
    fn test_statistics() {
        let mut processor = processor(MediaType::Film, RecordingFiles::default());
        processor
            .process_files(&["/m/a.2001.mkv", "/m/b.2002.mkv", "/m/c.txt"])
            .unwrap();
        let stats = processor.get_statistics();
        assert_eq!(stats.get(&ProcessingStatus::Ready), Some(&2));
        assert_eq!(stats.get(&ProcessingStatus::NotVideo), Some(&1));
        assert!(processor.has_ready_files());
    }
}
