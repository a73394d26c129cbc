//! Length statistics over saved transcript files.

use console::style;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

use crate::output::SEPARATOR;
use crate::Result;

static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+(?:\s+|$)").unwrap());

pub const DEFAULT_WPM: f64 = 250.0;

/// Transcript text following the metadata separator, if the file has one
pub fn body_after_separator(content: &str) -> Option<&str> {
    content
        .split_once(SEPARATOR)
        .map(|(_, body)| body.trim())
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Non-empty pieces left after splitting on `.`, `!` or `?` followed by whitespace or the end
pub fn count_sentences(text: &str) -> usize {
    SENTENCE_END
        .split(text)
        .filter(|piece| !piece.trim().is_empty())
        .count()
}

/// Reading-time category of a transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReadingBucket {
    UnderTwo,
    TwoToFive,
    FiveToTen,
    TenToFifteen,
    FifteenPlus,
}

impl ReadingBucket {
    pub const ALL: [ReadingBucket; 5] = [
        ReadingBucket::UnderTwo,
        ReadingBucket::TwoToFive,
        ReadingBucket::FiveToTen,
        ReadingBucket::TenToFifteen,
        ReadingBucket::FifteenPlus,
    ];

    pub fn from_minutes(minutes: f64) -> Self {
        if minutes < 2.0 {
            Self::UnderTwo
        } else if minutes < 5.0 {
            Self::TwoToFive
        } else if minutes < 10.0 {
            Self::FiveToTen
        } else if minutes < 15.0 {
            Self::TenToFifteen
        } else {
            Self::FifteenPlus
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::UnderTwo => "< 2 min",
            Self::TwoToFive => "2-5 min",
            Self::FiveToTen => "5-10 min",
            Self::TenToFifteen => "10-15 min",
            Self::FifteenPlus => "15+ min",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

/// Counts for one transcript file
#[derive(Debug, Clone, PartialEq)]
pub struct FileStats {
    pub path: PathBuf,
    pub words: usize,
    pub sentences: usize,
    pub reading_minutes: f64,
}

impl FileStats {
    pub fn bucket(&self) -> ReadingBucket {
        ReadingBucket::from_minutes(self.reading_minutes)
    }
}

/// Analyze one file; `None` when it has no separator or an empty body
pub fn analyze_file(path: &Path, wpm: f64) -> Result<Option<FileStats>> {
    let content = fs_err::read_to_string(path)?;
    let Some(body) = body_after_separator(&content) else {
        return Ok(None);
    };

    let words = count_words(body);
    if words == 0 {
        return Ok(None);
    }

    Ok(Some(FileStats {
        path: path.to_path_buf(),
        words,
        sentences: count_sentences(body),
        reading_minutes: words as f64 / wpm,
    }))
}

/// Aggregated statistics over many transcript files
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisReport {
    pub files: Vec<FileStats>,
    /// Files found but skipped for lacking a transcript body
    pub skipped: usize,
}

impl AnalysisReport {
    pub fn bucket_counts(&self) -> [usize; 5] {
        let mut counts = [0; 5];
        for file in &self.files {
            counts[file.bucket().index()] += 1;
        }
        counts
    }

    pub fn total_words(&self) -> usize {
        self.files.iter().map(|f| f.words).sum()
    }

    pub fn total_sentences(&self) -> usize {
        self.files.iter().map(|f| f.sentences).sum()
    }

    pub fn word_stats(&self) -> Option<Summary> {
        Summary::of(self.files.iter().map(|f| f.words))
    }

    pub fn sentence_stats(&self) -> Option<Summary> {
        Summary::of(self.files.iter().map(|f| f.sentences))
    }

    /// Print the report
    pub fn display(&self) {
        println!("📊 Analyzed {} transcripts", style(self.files.len()).bold());
        if self.skipped > 0 {
            println!("   ({} files without a transcript body skipped)", self.skipped);
        }

        if self.files.is_empty() {
            return;
        }

        println!("\nReading time:");
        let counts = self.bucket_counts();
        for bucket in ReadingBucket::ALL {
            let count = counts[bucket.index()];
            let percent = count as f64 * 100.0 / self.files.len() as f64;
            println!("  {:>10}: {:>5} ({:.1}%)", bucket.label(), count, percent);
        }

        println!("\nTotal words: {}", self.total_words());
        println!("Total sentences: {}", self.total_sentences());
        if let Some(words) = self.word_stats() {
            println!("Words per file: {}", words);
        }
        if let Some(sentences) = self.sentence_stats() {
            println!("Sentences per file: {}", sentences);
        }
    }
}

/// Mean, minimum and maximum of a count
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub mean: f64,
    pub min: usize,
    pub max: usize,
}

impl Summary {
    fn of(values: impl Iterator<Item = usize>) -> Option<Self> {
        let values: Vec<usize> = values.collect();
        let min = *values.iter().min()?;
        let max = *values.iter().max()?;
        let mean = values.iter().sum::<usize>() as f64 / values.len() as f64;
        Some(Self { mean, min, max })
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mean {:.2}, min {}, max {}", self.mean, self.min, self.max)
    }
}

fn is_transcript_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("md") | Some("txt")
    )
}

/// Analyze every transcript under `dirs`, recursively
pub fn analyze_dirs(dirs: &[PathBuf], wpm: f64) -> Result<AnalysisReport> {
    if !(wpm.is_finite() && wpm > 0.0) {
        anyhow::bail!("Words per minute must be positive, got {}", wpm);
    }

    let mut report = AnalysisReport::default();

    for dir in dirs {
        if !dir.is_dir() {
            tracing::warn!("Folder '{}' does not exist", dir.display());
            continue;
        }

        let mut paths: Vec<PathBuf> = WalkDir::new(dir)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file() && is_transcript_file(entry.path()))
            .map(|entry| entry.into_path())
            .collect();
        paths.sort();

        for path in paths {
            match analyze_file(&path, wpm) {
                Ok(Some(stats)) => report.files.push(stats),
                Ok(None) => report.skipped += 1,
                Err(e) => {
                    tracing::warn!("Error reading {}: {}", path.display(), e);
                    report.skipped += 1;
                }
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript(body: &str) -> String {
        format!("Title: t\nVideo ID: x\nURL: u\n{}\n{}\n", SEPARATOR, body)
    }

    #[test]
    fn test_body_after_separator() {
        assert_eq!(body_after_separator(&transcript("Hello there.")), Some("Hello there."));
        assert_eq!(body_after_separator("no separator here"), None);
    }

    #[test]
    fn test_count_sentences() {
        assert_eq!(count_sentences("One. Two! Three? Four"), 4);
        assert_eq!(count_sentences("Costs 3.50 dollars. Really!!"), 2);
        assert_eq!(count_sentences("..."), 0);
        assert_eq!(count_sentences(""), 0);
    }

    #[test]
    fn test_count_words() {
        assert_eq!(count_words("  a b\tc\nd "), 4);
        assert_eq!(count_words(""), 0);
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(ReadingBucket::from_minutes(0.0), ReadingBucket::UnderTwo);
        assert_eq!(ReadingBucket::from_minutes(1.99), ReadingBucket::UnderTwo);
        assert_eq!(ReadingBucket::from_minutes(2.0), ReadingBucket::TwoToFive);
        assert_eq!(ReadingBucket::from_minutes(5.0), ReadingBucket::FiveToTen);
        assert_eq!(ReadingBucket::from_minutes(10.0), ReadingBucket::TenToFifteen);
        assert_eq!(ReadingBucket::from_minutes(15.0), ReadingBucket::FifteenPlus);
    }

    #[test]
    fn test_analyze_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        fs_err::create_dir_all(&nested).unwrap();

        let short = "word. ".repeat(100);
        let long = "word ".repeat(1000);
        fs_err::write(dir.path().join("short.md"), transcript(&short)).unwrap();
        fs_err::write(nested.join("long.txt"), transcript(&long)).unwrap();
        fs_err::write(dir.path().join("empty.md"), transcript("")).unwrap();
        fs_err::write(dir.path().join("notes.json"), transcript(&short)).unwrap();

        let missing = dir.path().join("missing");
        let report = analyze_dirs(&[dir.path().to_path_buf(), missing], DEFAULT_WPM).unwrap();

        assert_eq!(report.files.len(), 2);
        assert_eq!(report.skipped, 1);
        // 100 words read in 0.4 min, 1000 words in 4 min
        assert_eq!(report.bucket_counts(), [1, 1, 0, 0, 0]);
        assert_eq!(report.total_words(), 1100);

        let words = report.word_stats().unwrap();
        assert_eq!(words.min, 100);
        assert_eq!(words.max, 1000);
        assert_eq!(words.mean, 550.0);

        let sentences = report.sentence_stats().unwrap();
        assert_eq!(sentences.min, 1);
        assert_eq!(sentences.max, 100);
    }

    #[test]
    fn test_rejects_non_positive_wpm() {
        assert!(analyze_dirs(&[], 0.0).is_err());
    }
}
