//! Rotating file writer
//!
//! The active file is rolled over to `<path>.<unix-ts>.<N>` when the next
//! write would push it past the size limit. `N` grows monotonically across
//! rotations, so ordering by suffix is ordering by age. Rotated files may be
//! gzip-compressed in the background and are pruned by count and by age.

use super::Writer;
use crate::core::error::{LoggerError, Result};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// When and how the active file is rolled over
///
/// # Examples
///
/// ```
/// use logz::writers::RotationPolicy;
/// use std::time::Duration;
///
/// let policy = RotationPolicy::new()
///     .with_max_size(50 * 1024 * 1024)
///     .with_max_backups(7)
///     .with_max_age(Duration::from_secs(7 * 24 * 3600))
///     .with_compression(true);
/// assert_eq!(policy.max_backups, 7);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Size limit in bytes; 0 disables rotation
    pub max_size: u64,
    /// Rotated files to keep; 0 keeps all
    pub max_backups: usize,
    /// Rotated files older than this are deleted
    pub max_age: Option<Duration>,
    /// Gzip rotated files
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_size: 10 * 1024 * 1024,
            max_backups: 5,
            max_age: None,
            compress: false,
        }
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_size = bytes;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backups = count;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_age(mut self, age: Duration) -> Self {
        self.max_age = Some(age);
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    /// Rotation happens only when the pending write would exceed the limit
    fn should_rotate(&self, current: u64, incoming: usize) -> bool {
        self.max_size > 0 && current > 0 && current + incoming as u64 > self.max_size
    }
}

struct ActiveFile {
    file: Option<BufWriter<File>>,
    size: u64,
    closed: bool,
}

#[derive(Debug)]
struct RotatedFile {
    path: PathBuf,
    suffix: u64,
}

/// File writer with size-based rotation, compression and retention
///
/// # Examples
///
/// ```no_run
/// use logz::writers::{RotatingFileWriter, RotationPolicy, Writer};
///
/// let policy = RotationPolicy::new().with_max_size(1024 * 1024).with_compression(true);
/// let writer = RotatingFileWriter::new("/var/log/app.log", policy).unwrap();
/// writer.write(b"started\n").unwrap();
/// ```
pub struct RotatingFileWriter {
    path: PathBuf,
    name: String,
    policy: RotationPolicy,
    /// Held for the whole write, so rotation is exclusive
    active: Mutex<ActiveFile>,
    compression: Mutex<Vec<JoinHandle<()>>>,
    /// Serializes compression and pruning, which run after `active` is released
    maintenance: Mutex<()>,
}

impl RotatingFileWriter {
    pub fn new(path: impl AsRef<Path>, policy: RotationPolicy) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let (file, size) = open_active(&path)?;
        Ok(Self {
            name: path.display().to_string(),
            path,
            policy,
            active: Mutex::new(ActiveFile {
                file: Some(BufWriter::new(file)),
                size,
                closed: false,
            }),
            compression: Mutex::new(Vec::new()),
            maintenance: Mutex::new(()),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.active.lock().size
    }

    /// Rotated files, oldest first
    pub fn rotated_files(&self) -> Vec<PathBuf> {
        self.list_rotated()
            .map(|files| files.into_iter().map(|f| f.path).collect())
            .unwrap_or_default()
    }

    /// Block until every background compression job has finished
    pub fn wait_for_compression(&self) {
        let handles: Vec<_> = self.compression.lock().drain(..).collect();
        for handle in handles {
            if handle.join().is_err() {
                eprintln!("[LOGGER ERROR] Compression thread panicked");
            }
        }
    }

    /// Move the active file aside and reopen it empty
    fn rotate(&self, active: &mut ActiveFile) -> Result<RotatedFile> {
        if let Some(mut file) = active.file.take() {
            file.flush().map_err(|e| {
                LoggerError::file_rotation(&self.name, format!("Failed to flush before rotation: {}", e))
            })?;
        }

        let existing = self.list_rotated()?;
        let suffix = existing.last().map_or(1, |f| f.suffix + 1);
        let rotated = self.rotated_path(unix_now(), suffix);

        if self.path.exists() {
            fs::rename(&self.path, &rotated).map_err(|e| {
                LoggerError::file_rotation(
                    &self.name,
                    format!("Failed to rename to '{}': {}", rotated.display(), e),
                )
            })?;
        }

        let (file, size) = open_active(&self.path).map_err(|e| {
            LoggerError::file_rotation(&self.name, format!("Failed to create new log file: {}", e))
        })?;
        active.file = Some(BufWriter::new(file));
        active.size = size;

        Ok(RotatedFile {
            path: rotated,
            suffix,
        })
    }

    /// Compression and retention for a file that was just rotated out
    fn finish_rotation(&self, rotated: RotatedFile) -> Result<()> {
        let _maintenance = self.maintenance.lock();
        // Older jobs must not race with pruning below
        self.wait_for_compression();
        if self.policy.compress && rotated.path.exists() {
            let source = rotated.path.clone();
            let handle = thread::Builder::new()
                .name("logz-compress".to_string())
                .spawn(move || {
                    if let Err(e) = compress_file(&source) {
                        eprintln!("[LOGGER ERROR] {}", e);
                    }
                })
                .map_err(|e| {
                    LoggerError::io_operation("spawn compression thread", "spawn failed", e)
                })?;
            self.compression.lock().push(handle);
        }

        self.prune(rotated.suffix)
    }

    fn append(&self, active: &mut ActiveFile, buf: &[u8]) -> Result<()> {
        if active.file.is_none() {
            let (file, size) = open_active(&self.path)?;
            active.file = Some(BufWriter::new(file));
            active.size = size;
        }
        if let Some(file) = active.file.as_mut() {
            file.write_all(buf)
                .map_err(|e| LoggerError::write_failed(&self.name, e.to_string()))?;
        }
        active.size += buf.len() as u64;
        Ok(())
    }

    /// Apply the count and age limits; the file just rotated is always kept
    fn prune(&self, newest: u64) -> Result<()> {
        let mut files = self.list_rotated()?;

        if self.policy.max_backups > 0 && files.len() > self.policy.max_backups {
            let excess = files.len() - self.policy.max_backups;
            for file in files.drain(..excess) {
                remove_rotated(&file.path)?;
            }
        }

        if let Some(max_age) = self.policy.max_age {
            let now = SystemTime::now();
            for file in files.iter().filter(|f| f.suffix != newest) {
                let expired = fs::metadata(&file.path)
                    .and_then(|m| m.modified())
                    .ok()
                    .and_then(|modified| now.duration_since(modified).ok())
                    .is_some_and(|age| age > max_age);
                if expired {
                    remove_rotated(&file.path)?;
                }
            }
        }
        Ok(())
    }

    fn rotated_path(&self, timestamp: u64, suffix: u64) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("app.log");
        self.path
            .with_file_name(format!("{}.{}.{}", file_name, timestamp, suffix))
    }

    fn list_rotated(&self) -> Result<Vec<RotatedFile>> {
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(dir) => dir.to_path_buf(),
            None => PathBuf::from("."),
        };
        let base = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("app.log");
        let prefix = format!("{}.", base);

        let read_dir = fs::read_dir(&dir).map_err(|e| {
            LoggerError::io_operation(
                "list rotated files",
                format!("Failed to read '{}'", dir.display()),
                e,
            )
        })?;

        let mut files: Vec<RotatedFile> = read_dir
            .filter_map(|entry| {
                let entry = entry.ok()?;
                if !entry.file_type().ok()?.is_file() {
                    return None;
                }
                let file_name = entry.file_name();
                let rest = file_name.to_str()?.strip_prefix(&prefix)?;
                let rest = rest.strip_suffix(".gz").unwrap_or(rest);
                let (timestamp, suffix) = rest.split_once('.')?;
                timestamp.parse::<u64>().ok()?;
                let suffix = suffix.parse::<u64>().ok()?;
                Some(RotatedFile {
                    path: entry.path(),
                    suffix,
                })
            })
            .collect();
        files.sort_by_key(|f| f.suffix);
        // A file being compressed briefly exists in both forms
        files.dedup_by_key(|f| f.suffix);
        Ok(files)
    }
}

impl Writer for RotatingFileWriter {
    fn write(&self, buf: &[u8]) -> Result<()> {
        let mut rotated = None;
        let mut rotation_error = None;
        let written = {
            let mut active = self.active.lock();
            if active.closed {
                return Err(LoggerError::write_failed(&self.name, "writer is closed"));
            }

            if self.policy.should_rotate(active.size, buf.len()) {
                match self.rotate(&mut active) {
                    Ok(file) => rotated = Some(file),
                    Err(e) => {
                        eprintln!(
                            "[LOGGER WARNING] Log rotation failed: {}. Continuing with current file.",
                            e
                        );
                        rotation_error = Some(e);
                    }
                }
            }
            self.append(&mut active, buf)
        };

        // compression jobs are joined without holding the active file
        if let Some(file) = rotated {
            if let Err(e) = self.finish_rotation(file) {
                eprintln!("[LOGGER WARNING] Log retention failed: {}", e);
                rotation_error = Some(e);
            }
        }

        written?;
        match rotation_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn flush(&self) -> Result<()> {
        if let Some(file) = self.active.lock().file.as_mut() {
            file.flush()
                .map_err(|e| LoggerError::write_failed(&self.name, e.to_string()))?;
        }
        self.wait_for_compression();
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let result = {
            let mut active = self.active.lock();
            active.closed = true;
            match active.file.take() {
                Some(mut file) => file
                    .flush()
                    .map_err(|e| LoggerError::write_failed(&self.name, e.to_string())),
                None => Ok(()),
            }
        };
        self.wait_for_compression();
        result
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for RotatingFileWriter {
    fn drop(&mut self) {
        if let Some(mut file) = self.active.get_mut().file.take() {
            let _ = file.flush();
        }
        self.wait_for_compression();
    }
}

fn open_active(path: &Path) -> Result<(File, u64)> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            LoggerError::io_operation(
                "open log file",
                format!("Failed to open '{}'", path.display()),
                e,
            )
        })?;
    let size = file.metadata().map(|m| m.len()).unwrap_or(0);
    Ok((file, size))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}

fn remove_rotated(path: &Path) -> Result<()> {
    fs::remove_file(path).map_err(|e| {
        LoggerError::file_rotation(
            path.display().to_string(),
            format!("Failed to remove old log file: {}", e),
        )
    })
}

/// Gzip `path` into `<path>.gz` through a temporary file.
///
/// The original is removed only after the compressed file is in place.
fn compress_file(path: &Path) -> Result<PathBuf> {
    let gz_path = with_suffix(path, ".gz");
    let temp_path = with_suffix(path, ".gz.tmp");

    let input = File::open(path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to open file for compression: {}", path.display()),
            e,
        )
    })?;
    let mut reader = BufReader::with_capacity(64 * 1024, input);

    let output = File::create(&temp_path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to create temporary file: {}", temp_path.display()),
            e,
        )
    })?;
    let mut encoder = flate2::write::GzEncoder::new(
        BufWriter::with_capacity(64 * 1024, output),
        flate2::Compression::default(),
    );

    let mut buffer = vec![0u8; 64 * 1024];
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                let _ = fs::remove_file(&temp_path);
                return Err(LoggerError::io_operation(
                    "compress log file",
                    format!("Failed to read from file: {}", path.display()),
                    e,
                ));
            }
        };
        if let Err(e) = encoder.write_all(&buffer[..read]) {
            let _ = fs::remove_file(&temp_path);
            return Err(LoggerError::io_operation(
                "compress log file",
                "Failed to compress data chunk",
                e,
            ));
        }
    }

    let finished = encoder.finish().and_then(|mut out| out.flush());
    if let Err(e) = finished {
        let _ = fs::remove_file(&temp_path);
        return Err(LoggerError::io_operation(
            "compress log file",
            "Failed to finish compression",
            e,
        ));
    }

    fs::rename(&temp_path, &gz_path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to rename compressed file to: {}", gz_path.display()),
            e,
        )
    })?;

    if let Err(e) = fs::remove_file(path) {
        eprintln!(
            "[LOGGER WARNING] Compressed {} but failed to remove the original: {}",
            path.display(),
            e
        );
    }
    Ok(gz_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use tempfile::tempdir;

    fn record(i: usize) -> Vec<u8> {
        // 20 bytes including the newline
        format!("record number {:05}\n", i).into_bytes()
    }

    #[test]
    fn test_policy_builder() {
        let policy = RotationPolicy::new()
            .with_max_size(1024)
            .with_max_backups(3)
            .with_compression(true);
        assert_eq!(policy.max_size, 1024);
        assert_eq!(policy.max_backups, 3);
        assert!(policy.compress);
        assert_eq!(policy.max_age, None);
    }

    #[test]
    fn test_exact_limit_does_not_rotate() {
        let policy = RotationPolicy::new().with_max_size(100);
        assert!(!policy.should_rotate(80, 20));
        assert!(policy.should_rotate(81, 20));
        assert!(!policy.should_rotate(0, 500));
        assert!(!RotationPolicy::new().with_max_size(0).should_rotate(10_000, 1));
    }

    #[test]
    fn test_ten_records_of_twenty_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let writer =
            RotatingFileWriter::new(&path, RotationPolicy::new().with_max_size(100)).unwrap();

        for i in 0..10 {
            assert_eq!(record(i).len(), 20);
            writer.write(&record(i)).unwrap();
        }
        writer.flush().unwrap();

        let rotated = writer.rotated_files();
        assert_eq!(rotated.len(), 1);
        let first = fs::read_to_string(&rotated[0]).unwrap();
        assert_eq!(first.lines().count(), 5);
        assert!(first.starts_with("record number 00000"));

        let current = fs::read_to_string(&path).unwrap();
        assert_eq!(current.lines().count(), 5);
        assert!(current.ends_with("record number 00009\n"));
    }

    #[test]
    fn test_rotated_name_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("svc.log");
        let writer =
            RotatingFileWriter::new(&path, RotationPolicy::new().with_max_size(20)).unwrap();
        writer.write(&record(0)).unwrap();
        writer.write(&record(1)).unwrap();
        writer.write(&record(2)).unwrap();

        let names: Vec<String> = writer
            .rotated_files()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 2);
        for (i, name) in names.iter().enumerate() {
            let parts: Vec<&str> = name.split('.').collect();
            assert_eq!(&parts[..2], ["svc", "log"]);
            assert!(parts[2].parse::<u64>().is_ok());
            assert_eq!(parts[3], (i + 1).to_string());
        }
    }

    #[test]
    fn test_max_backups_deletes_oldest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let policy = RotationPolicy::new().with_max_size(20).with_max_backups(2);
        let writer = RotatingFileWriter::new(&path, policy).unwrap();

        for i in 0..6 {
            writer.write(&record(i)).unwrap();
        }
        writer.flush().unwrap();

        let rotated = writer.rotated_files();
        assert_eq!(rotated.len(), 2);
        assert_eq!(fs::read_to_string(&rotated[0]).unwrap(), "record number 00003\n");
        assert_eq!(fs::read_to_string(&rotated[1]).unwrap(), "record number 00004\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "record number 00005\n");
    }

    #[test]
    fn test_compression_replaces_rotated_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let policy = RotationPolicy::new().with_max_size(20).with_compression(true);
        let writer = RotatingFileWriter::new(&path, policy).unwrap();

        writer.write(&record(0)).unwrap();
        writer.write(&record(1)).unwrap();
        writer.wait_for_compression();

        let rotated = writer.rotated_files();
        assert_eq!(rotated.len(), 1);
        assert_eq!(rotated[0].extension().and_then(|e| e.to_str()), Some("gz"));
        assert!(!with_suffix(&rotated[0], ".tmp").exists());

        let mut decoded = String::new();
        GzDecoder::new(File::open(&rotated[0]).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, "record number 00000\n");
    }

    #[test]
    fn test_concurrent_writers_with_compression_keep_every_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let policy = RotationPolicy::new()
            .with_max_size(100)
            .with_max_backups(0)
            .with_compression(true);
        let writer = RotatingFileWriter::new(&path, policy).unwrap();

        std::thread::scope(|scope| {
            for t in 0..4 {
                let writer = &writer;
                scope.spawn(move || {
                    for i in 0..50 {
                        writer.write(&record(t * 100 + i)).unwrap();
                    }
                });
            }
        });
        writer.close().unwrap();

        let mut lines = fs::read_to_string(&path).unwrap().lines().count();
        for rotated in writer.rotated_files() {
            assert_eq!(rotated.extension().and_then(|e| e.to_str()), Some("gz"));
            let mut decoded = String::new();
            GzDecoder::new(File::open(&rotated).unwrap())
                .read_to_string(&mut decoded)
                .unwrap();
            lines += decoded.lines().count();
        }
        assert_eq!(lines, 200);
    }

    #[test]
    fn test_max_age_removes_stale_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let stale = dir.path().join("app.log.1000.1");
        fs::write(&stale, "old\n").unwrap();
        let old = SystemTime::now() - Duration::from_secs(3600);
        File::options()
            .write(true)
            .open(&stale)
            .unwrap()
            .set_modified(old)
            .unwrap();

        let policy = RotationPolicy::new()
            .with_max_size(20)
            .with_max_backups(0)
            .with_max_age(Duration::from_secs(60));
        let writer = RotatingFileWriter::new(&path, policy).unwrap();
        writer.write(&record(0)).unwrap();
        writer.write(&record(1)).unwrap();

        assert!(!stale.exists());
        let rotated = writer.rotated_files();
        assert_eq!(rotated.len(), 1);
        assert!(rotated[0].to_string_lossy().ends_with(".2"));
    }

    #[test]
    fn test_unrelated_files_are_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(dir.path().join("app.log.bak"), "x").unwrap();
        fs::write(dir.path().join("other.log.1.1"), "x").unwrap();
        let writer = RotatingFileWriter::new(&path, RotationPolicy::new()).unwrap();
        assert!(writer.rotated_files().is_empty());
    }

    #[test]
    fn test_existing_size_is_counted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, vec![b'x'; 90]).unwrap();
        let writer =
            RotatingFileWriter::new(&path, RotationPolicy::new().with_max_size(100)).unwrap();
        assert_eq!(writer.current_size(), 90);
        writer.write(&record(0)).unwrap();
        assert_eq!(writer.rotated_files().len(), 1);
        assert_eq!(writer.current_size(), 20);
    }

    #[test]
    fn test_write_after_close_fails() {
        let dir = tempdir().unwrap();
        let writer =
            RotatingFileWriter::new(dir.path().join("a.log"), RotationPolicy::new()).unwrap();
        writer.close().unwrap();
        assert!(writer.write(b"x\n").is_err());
    }
}
