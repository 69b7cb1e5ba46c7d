//! The reconciliation engine
//!
//! Drives one synchronization run: scan the source folder, fingerprint
//! every candidate (through the cache, sequentially or in parallel),
//! classify against the manifest, gate on disk space, apply the safe-copy
//! protocol, and persist the manifest once at the end.
//!
//! Strategy choice only affects how fingerprints are computed. The
//! post-processing loop re-iterates in scan order, so classification and
//! copy order are identical on both paths. Workers never mutate shared
//! state: cache consultation happens before dispatch and cache writes
//! after the batch drains, all on the orchestrating task.

use crate::diff::{classify, FingerprintResults, SyncPlan};
use crate::parallel::{ParallelConfig, ParallelExecutor};
use crate::progress::{ProgressSink, ProgressUpdate, SyncPhase};
use fontsync_cache::FontCache;
use fontsync_config::{Manifest, ManifestStore};
use fontsync_fs::{
    check_disk_space, probe_font_file, FontInstaller, FontScanner, Fingerprinter,
    DISK_SPACE_MARGIN,
};
use fontsync_types::{DiskSpace, Error, FontFile, Result, SyncSettings, SyncSummary};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Candidate count above which fingerprinting goes parallel
///
/// Fingerprinting is I/O-bound and only benefits from concurrency once
/// per-task overhead is amortized over enough files.
pub const PARALLEL_THRESHOLD: usize = 50;

/// Batch size of the sequential fingerprinting strategy
pub const SEQUENTIAL_BATCH_SIZE: usize = 50;

/// Render an error as `message (hint)` for per-file error lists
pub fn error_detail(error: &Error) -> String {
    match error.hint() {
        Some(hint) => format!("{error} ({hint})"),
        None => error.to_string(),
    }
}

/// The reconciliation engine
///
/// Sole writer of the manifest and sole client of the cache and scanner.
pub struct SyncEngine {
    settings: SyncSettings,
    scanner: FontScanner,
    fingerprinter: Fingerprinter,
    installer: FontInstaller,
    executor: ParallelExecutor,
    cache: Option<FontCache>,
    parallel_threshold: usize,
}

impl SyncEngine {
    /// Create an engine from injected settings, with caching enabled
    pub fn new(settings: SyncSettings) -> Self {
        let installer = FontInstaller::new(&settings.install_dir);
        let cache = FontCache::new(&settings.cache_dir, settings.cache_ttl_hours);
        Self {
            scanner: FontScanner::new(),
            fingerprinter: Fingerprinter::default(),
            installer,
            executor: ParallelExecutor::new(),
            cache: Some(cache),
            parallel_threshold: PARALLEL_THRESHOLD,
            settings,
        }
    }

    /// Disable the fingerprint cache
    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    /// Override the parallel-strategy threshold
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Override the parallel executor configuration
    pub fn with_executor_config(mut self, config: ParallelConfig) -> Self {
        self.executor = ParallelExecutor::with_config(config);
        self
    }

    /// The injected settings
    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// The font installer this engine copies through
    pub fn installer(&self) -> &FontInstaller {
        &self.installer
    }

    /// Scan the configured source folder, accumulating batch by batch
    pub fn scan_source(
        &self,
        manifest: &Manifest,
        sink: Option<&dyn ProgressSink>,
    ) -> Result<Vec<PathBuf>> {
        let folder = manifest.sync_folder_path()?;

        let mut paths = Vec::new();
        for batch in self.scanner.scan_batches(&folder)? {
            paths.extend(batch);
            emit(sink, SyncPhase::Scanning, paths.len(), 0, None);
        }

        info!("found {} fonts under {}", paths.len(), folder.display());
        Ok(paths)
    }

    /// Build the sync plan: scan, fingerprint, classify
    pub async fn plan(
        &mut self,
        manifest: &Manifest,
        sink: Option<&dyn ProgressSink>,
    ) -> Result<SyncPlan> {
        let paths = self.scan_source(manifest, sink)?;

        let mut files: Vec<FontFile> = Vec::with_capacity(paths.len());
        let mut probe_errors = Vec::new();
        for path in &paths {
            match probe_font_file(path).await {
                Ok(file) => files.push(file),
                // The file vanished between scan and probe
                Err(e) => probe_errors.push(format!(
                    "{}: {}",
                    path.file_name().unwrap_or_default().to_string_lossy(),
                    error_detail(&e)
                )),
            }
        }

        let hashes = self.fingerprint_files(&files, sink).await;

        let mut plan = classify(&files, &hashes, manifest);
        if !probe_errors.is_empty() {
            probe_errors.append(&mut plan.errors);
            plan.errors = probe_errors;
        }

        debug!(
            "plan: {} install, {} update, {} up-to-date, {} skipped, {} errors",
            plan.install.len(),
            plan.update.len(),
            plan.up_to_date.len(),
            plan.skipped.len(),
            plan.errors.len()
        );
        Ok(plan)
    }

    /// Fingerprint every eligible file, choosing the strategy by count
    async fn fingerprint_files(
        &mut self,
        files: &[FontFile],
        sink: Option<&dyn ProgressSink>,
    ) -> FingerprintResults {
        let eligible: Vec<PathBuf> = files
            .iter()
            .filter(|f| !f.locked && !f.cloud_syncing)
            .map(|f| f.path.clone())
            .collect();

        if eligible.len() > self.parallel_threshold {
            debug!("fingerprinting {} files in parallel", eligible.len());
            self.fingerprint_parallel(eligible, sink).await
        } else {
            self.fingerprint_sequential(eligible, sink).await
        }
    }

    async fn fingerprint_sequential(
        &mut self,
        paths: Vec<PathBuf>,
        sink: Option<&dyn ProgressSink>,
    ) -> FingerprintResults {
        let total = paths.len();
        let mut results = FingerprintResults::new();

        for batch in paths.chunks(SEQUENTIAL_BATCH_SIZE) {
            for path in batch {
                let outcome = self
                    .fingerprint_cached(path)
                    .await
                    .map_err(|e| error_detail(&e));
                results.insert(path.clone(), outcome);
                emit(
                    sink,
                    SyncPhase::Fingerprinting,
                    results.len(),
                    total,
                    file_name_of(path),
                );
            }
        }

        results
    }

    async fn fingerprint_parallel(
        &mut self,
        paths: Vec<PathBuf>,
        sink: Option<&dyn ProgressSink>,
    ) -> FingerprintResults {
        let total = paths.len();
        let mut results = FingerprintResults::new();

        // Cache consultation stays on the orchestrating task; only misses
        // are dispatched to workers.
        let mut misses = Vec::new();
        for path in paths {
            match self.lookup_cached(&path).await {
                Some(hash) => {
                    results.insert(path, Ok(hash));
                    emit(
                        sink,
                        SyncPhase::Fingerprinting,
                        results.len(),
                        total,
                        None,
                    );
                }
                None => misses.push(path),
            }
        }

        let hits = results.len();
        let fingerprinter = self.fingerprinter.clone();
        let progress = |completed: usize, _total: usize| {
            emit(sink, SyncPhase::Fingerprinting, hits + completed, total, None);
        };

        let outcomes = self
            .executor
            .process_batch(
                misses,
                move |path: PathBuf| {
                    let fingerprinter = fingerprinter.clone();
                    async move {
                        let hash = fingerprinter.fingerprint(&path).await?;
                        Ok((path, Ok::<_, String>(hash)))
                    }
                },
                Some(&progress),
                |path: &PathBuf, error| (path.clone(), Err(error_detail(&error))),
            )
            .await;

        // Aggregation and cache writes happen back here, single-threaded
        for (success, (path, outcome)) in outcomes {
            if success {
                if let Ok(hash) = &outcome {
                    if let Some(cache) = self.cache.as_mut() {
                        cache.set_hash(&path, hash).await;
                    }
                }
            }
            results.insert(path, outcome);
        }

        results
    }

    async fn lookup_cached(&mut self, path: &Path) -> Option<String> {
        match self.cache.as_mut() {
            Some(cache) => cache.get_hash(path).await,
            None => None,
        }
    }

    /// Fingerprint one file through the cache
    pub async fn fingerprint_cached(&mut self, path: &Path) -> Result<String> {
        if let Some(hash) = self.lookup_cached(path).await {
            return Ok(hash);
        }

        let hash = self.fingerprinter.fingerprint(path).await?;
        if let Some(cache) = self.cache.as_mut() {
            cache.set_hash(path, &hash).await;
        }
        Ok(hash)
    }

    /// Apply a plan: disk-space gate, ordered copies, manifest update
    ///
    /// With nothing to install or update the manifest and disk are left
    /// untouched. Per-file copy failures are recorded and the run
    /// continues; the manifest is saved once after all candidates, and a
    /// save failure is reported without undoing applied copies.
    pub async fn execute(
        &mut self,
        plan: &SyncPlan,
        manifest: &mut Manifest,
        store: &ManifestStore,
        sink: Option<&dyn ProgressSink>,
    ) -> Result<SyncSummary> {
        let mut summary = SyncSummary::new();
        summary.skipped = plan.up_to_date.len() as u64;
        summary.errors = plan.errors.clone();

        if !plan.has_work() {
            info!("all fonts are up to date, nothing to do");
            return Ok(summary);
        }

        let required_mb = plan.required_mb() * DISK_SPACE_MARGIN;
        let space = check_disk_space(&self.settings.install_dir, required_mb);
        ensure_space(&space, required_mb)?;

        let total = plan.total_actions();
        let mut completed = 0usize;

        let actions = plan
            .install
            .iter()
            .map(|c| (c, false))
            .chain(plan.update.iter().map(|c| (c, true)));

        for (candidate, is_update) in actions {
            match self.installer.copy(&candidate.path, None, true).await {
                Ok(_) => {
                    manifest.record_install(candidate.name.clone(), candidate.hash.clone());
                    if is_update {
                        summary.updated += 1;
                    } else {
                        summary.added += 1;
                    }
                }
                Err(e) => {
                    warn!("failed to install {}: {}", candidate.name, e);
                    summary
                        .errors
                        .push(format!("{}: {}", candidate.name, error_detail(&e)));
                }
            }

            completed += 1;
            emit(
                sink,
                SyncPhase::Applying,
                completed,
                total,
                Some(candidate.name.clone()),
            );
        }

        if let Err(e) = store.save(manifest).await {
            warn!("manifest save failed: {}", e);
            summary
                .errors
                .push(format!("manifest save failed: {}", error_detail(&e)));
        }

        info!(
            "sync applied: {} added, {} updated, {} up to date, {} errors",
            summary.added,
            summary.updated,
            summary.skipped,
            summary.errors.len()
        );
        Ok(summary)
    }

    /// Full reconciliation run: load, plan, execute
    pub async fn sync(
        &mut self,
        store: &ManifestStore,
        sink: Option<&dyn ProgressSink>,
    ) -> Result<SyncSummary> {
        let mut manifest = store.load().await?;
        let plan = self.plan(&manifest, sink).await?;
        self.execute(&plan, &mut manifest, store, sink).await
    }
}

/// Fail with `DiskSpace` when a measured report says the requirement does
/// not fit
fn ensure_space(space: &DiskSpace, required_mb: f64) -> Result<()> {
    if space.sufficient {
        Ok(())
    } else {
        Err(Error::DiskSpace {
            required_mb,
            free_mb: space.free_mb,
        })
    }
}

fn emit(
    sink: Option<&dyn ProgressSink>,
    phase: SyncPhase,
    completed: usize,
    total: usize,
    detail: Option<String>,
) {
    if let Some(sink) = sink {
        sink.update(ProgressUpdate {
            phase,
            completed,
            total,
            detail,
        });
    }
}

fn file_name_of(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().to_string())
}
