use crate::config::Config;
use crate::constants::WORKER_THREAD_PREFIX;
use crate::discovery::discover;
use crate::error::{RecompressError, Result};
use crate::formats;
use crate::processing::{recompress, RecompressOutcome};
use crate::quality::QualityResolver;
use crate::utils::{calculate_compression_ratio, format_file_size};
use crate::validation::validate_root_dir;
use rayon::prelude::*;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info, info_span, warn};

/// Files owned by exactly one worker, processed in order
pub type FileChunk = Vec<PathBuf>;

/// Tally of what one worker did with its chunk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkReport {
    pub worker: usize,
    pub assigned: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub bytes_before: u64,
    pub bytes_after: u64,
    /// The worker panicked and dropped the rest of its chunk
    pub crashed: bool,
}

impl ChunkReport {
    fn new(worker: usize, assigned: usize) -> Self {
        Self {
            worker,
            assigned,
            ..Self::default()
        }
    }

    fn record(&mut self, outcome: &RecompressOutcome) {
        match outcome.recompressed_size {
            Some(after) if outcome.is_success() => {
                self.succeeded += 1;
                self.bytes_before += outcome.original_size;
                self.bytes_after += after;
            }
            _ => self.failed += 1,
        }
    }

    pub fn processed(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Files never reached because the worker crashed
    pub fn unprocessed(&self) -> usize {
        self.assigned - self.processed()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub discovered: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub crashed_workers: usize,
    pub unprocessed: usize,
    pub bytes_before: u64,
    pub bytes_after: u64,
    pub elapsed: Duration,
}

impl RunSummary {
    fn from_reports(discovered: usize, reports: &[ChunkReport], elapsed: Duration) -> Self {
        let mut summary = Self {
            discovered,
            elapsed,
            ..Self::default()
        };
        for report in reports {
            summary.succeeded += report.succeeded;
            summary.failed += report.failed;
            summary.unprocessed += report.unprocessed();
            summary.bytes_before += report.bytes_before;
            summary.bytes_after += report.bytes_after;
            if report.crashed {
                summary.crashed_workers += 1;
            }
        }
        summary
    }

    /// Any file failed or was dropped by a crashed worker
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.crashed_workers > 0
    }
}

/// Split `items` into at most `n` contiguous chunks of `ceil(len / n)`
/// items, preserving order. `n == 0` is treated as 1.
pub fn partition<T>(items: Vec<T>, n: usize) -> Vec<Vec<T>> {
    let chunk_size = items.len().div_ceil(n.max(1)).max(1);
    let mut chunks = Vec::with_capacity(n.max(1).min(items.len()));
    let mut iter = items.into_iter();

    loop {
        let chunk: Vec<T> = iter.by_ref().take(chunk_size).collect();
        if chunk.is_empty() {
            break;
        }
        chunks.push(chunk);
    }

    chunks
}

/// Run every chunk on its own worker and wait for all of them.
///
/// Workers share nothing but the read-only resolver. A panicking worker is
/// contained and reported; the others carry on.
pub fn run_all(chunks: Vec<FileChunk>, resolver: &QualityResolver) -> Result<Vec<ChunkReport>> {
    if chunks.is_empty() {
        return Ok(Vec::new());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(chunks.len())
        .thread_name(|i| format!("{}-{}", WORKER_THREAD_PREFIX, i))
        .build()
        .map_err(|e| RecompressError::ThreadPool(e.to_string()))?;

    let reports: Vec<ChunkReport> = pool.install(|| {
        chunks
            .into_par_iter()
            .enumerate()
            .map(|(worker, chunk)| run_chunk(worker, chunk, resolver))
            .collect()
    });

    Ok(reports)
}

/// Recompress one chunk sequentially
pub fn run_chunk(worker: usize, chunk: FileChunk, resolver: &QualityResolver) -> ChunkReport {
    let span = info_span!("worker", id = worker);
    let _guard = span.enter();

    let mut report = ChunkReport::new(worker, chunk.len());
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        for path in &chunk {
            let outcome = recompress(path, resolver);
            report.record(&outcome);
        }
    }));

    if let Err(payload) = result {
        report.crashed = true;
        error!(
            remaining = report.unprocessed(),
            reason = %panic_message(payload.as_ref()),
            "worker crashed, rest of its chunk was skipped"
        );
    }

    report
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Discover, partition and recompress everything under `config.root`.
pub fn run(config: &Config) -> Result<RunSummary> {
    let start_time = Instant::now();

    validate_root_dir(&config.root)?;
    info!(
        root = %config.root.display(),
        extensions = ?config.extensions,
        "scanning for images"
    );

    let image_files = discover(&config.root, &config.extensions);
    let total_files = image_files.len();

    if total_files == 0 {
        warn!("no image files found under {}", config.root.display());
    } else {
        info!("found {} image files to process", total_files);
    }

    if config.dry_run {
        for path in &image_files {
            let format = formats::detect(path).ok().flatten();
            info!(
                format = %format.map_or("unknown", |kind| kind.name()),
                quality = format.map(|kind| config.quality.resolve(kind.name())),
                path = %path.display(),
                "would recompress"
            );
        }
        return Ok(RunSummary {
            discovered: total_files,
            elapsed: start_time.elapsed(),
            ..RunSummary::default()
        });
    }

    let chunks = partition(image_files, config.parallelism);
    info!(
        "using {} workers for {} files",
        chunks.len(),
        total_files
    );

    let reports = run_all(chunks, &config.quality)?;
    let summary = RunSummary::from_reports(total_files, &reports, start_time.elapsed());
    log_summary(&summary);

    Ok(summary)
}

fn log_summary(summary: &RunSummary) {
    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        before = %format_file_size(summary.bytes_before),
        after = %format_file_size(summary.bytes_after),
        ratio = %format!(
            "{:.1}%",
            calculate_compression_ratio(summary.bytes_before, summary.bytes_after)
        ),
        "elapsed_time = {:.2}s",
        summary.elapsed.as_secs_f64()
    );

    if summary.crashed_workers > 0 {
        warn!(
            crashed_workers = summary.crashed_workers,
            unprocessed = summary.unprocessed,
            "some workers crashed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::ImageKind;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_image(path: &Path, format: ImageFormat) {
        DynamicImage::ImageRgb8(RgbImage::new(16, 16))
            .save_with_format(path, format)
            .unwrap();
    }

    #[test]
    fn test_partition_even_split() {
        let chunks = partition((0..8).collect(), 4);
        assert_eq!(chunks, vec![vec![0, 1], vec![2, 3], vec![4, 5], vec![6, 7]]);
    }

    #[test]
    fn test_partition_last_chunk_shorter() {
        let chunks = partition((0..7).collect(), 3);
        assert_eq!(chunks, vec![vec![0, 1, 2], vec![3, 4, 5], vec![6]]);
    }

    #[test]
    fn test_partition_more_workers_than_items() {
        let chunks = partition(vec!["a", "b"], 8);
        assert_eq!(chunks, vec![vec!["a"], vec!["b"]]);
    }

    #[test]
    fn test_partition_edge_cases() {
        assert!(partition(Vec::<u8>::new(), 4).is_empty());
        assert_eq!(partition(vec![1, 2, 3], 0), vec![vec![1, 2, 3]]);
    }

    #[test]
    fn test_run_chunk_continues_after_failure() {
        let temp_dir = TempDir::new().unwrap();
        let broken = temp_dir.path().join("broken.jpg");
        let good = temp_dir.path().join("good.jpg");
        fs::write(&broken, [0xFF, 0xD8, 0xFF, 0xE0, 0x00]).unwrap();
        write_image(&good, ImageFormat::Jpeg);

        let report = run_chunk(0, vec![broken, good], &QualityResolver::default());

        assert_eq!(report.assigned, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.succeeded, 1);
        assert!(!report.crashed);
        assert_eq!(report.unprocessed(), 0);
    }

    #[test]
    fn test_run_all_processes_every_chunk() {
        let temp_dir = TempDir::new().unwrap();
        let files: Vec<PathBuf> = (0..5)
            .map(|i| {
                let path = temp_dir.path().join(format!("img{}.jpg", i));
                write_image(&path, ImageFormat::Jpeg);
                path
            })
            .collect();

        let reports = run_all(partition(files, 2), &QualityResolver::default()).unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports.iter().map(|r| r.succeeded).sum::<usize>(), 5);
        assert_eq!(reports[0].worker, 0);
        assert_eq!(reports[1].worker, 1);
    }

    #[test]
    fn test_run_all_empty() {
        assert!(run_all(Vec::new(), &QualityResolver::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_run_end_to_end() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_image(&root.join("a.jpg"), ImageFormat::Jpeg);
        write_image(&root.join("b.png"), ImageFormat::Png);
        write_image(&root.join("c.jpg"), ImageFormat::Png);
        fs::write(root.join("d.txt"), b"not an image").unwrap();
        let png_before = fs::read(root.join("b.png")).unwrap();

        let mut config = Config::with_root(root);
        config.parallelism = 2;
        let summary = run(&config).unwrap();

        assert_eq!(summary.discovered, 2);
        assert_eq!(summary.succeeded, 2);
        assert!(!summary.has_failures());
        assert_eq!(
            formats::detect(&root.join("c.jpg")).unwrap(),
            Some(ImageKind::Png)
        );
        assert_eq!(fs::read(root.join("b.png")).unwrap(), png_before);
        assert_eq!(fs::read(root.join("d.txt")).unwrap(), b"not an image");
    }

    #[test]
    fn test_run_dry_run_leaves_files() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.jpg");
        write_image(&path, ImageFormat::Jpeg);
        let before = fs::read(&path).unwrap();

        let mut config = Config::with_root(temp_dir.path());
        config.dry_run = true;
        let summary = run(&config).unwrap();

        assert_eq!(summary.discovered, 1);
        assert_eq!(summary.succeeded, 0);
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_run_missing_root() {
        let config = Config::with_root("/nonexistent/root");
        assert!(matches!(run(&config), Err(RecompressError::RootNotFound(_))));
    }

    #[test]
    fn test_summary_counts_crashed_workers() {
        let reports = vec![
            ChunkReport {
                worker: 0,
                assigned: 3,
                succeeded: 1,
                crashed: true,
                ..ChunkReport::default()
            },
            ChunkReport {
                worker: 1,
                assigned: 2,
                succeeded: 2,
                ..ChunkReport::default()
            },
        ];

        let summary = RunSummary::from_reports(5, &reports, Duration::ZERO);
        assert_eq!(summary.succeeded, 3);
        assert_eq!(summary.crashed_workers, 1);
        assert_eq!(summary.unprocessed, 2);
        assert!(summary.has_failures());
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(42);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
