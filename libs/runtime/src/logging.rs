use crate::config::{LoggingConfig, Section};
use std::{
    collections::HashMap,
    io::{IsTerminal, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::{filter::Targets, fmt};

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};

const DEFAULT_SECTION: &str = "default";
const DEFAULT_MAX_SIZE_MB: u64 = 100;
const DEFAULT_MAX_AGE_DAYS: u32 = 7;

// -------- level helpers --------
fn parse_tracing_level(s: &str) -> Option<Level> {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        "off" | "none" => None,
        _ => Some(Level::INFO),
    }
}

fn level_filter(s: &str) -> LevelFilter {
    parse_tracing_level(s).map_or(LevelFilter::OFF, LevelFilter::from_level)
}

/// True if target == prefix or target starts with "prefix::".
fn matches_crate_prefix(target: &str, prefix: &str) -> bool {
    target
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

// -------- rotating writer for files --------
type SharedRotate = Arc<Mutex<FileRotate<AppendTimestamp>>>;

#[derive(Clone)]
struct RotWriter(SharedRotate);

#[derive(Clone)]
struct RotWriterHandle(SharedRotate);

impl Write for RotWriterHandle {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("log writer lock poisoned"))?
            .write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("log writer lock poisoned"))?
            .flush()
    }
}

// A writer handle that may be None (drops writes)
struct RoutedWriterHandle(Option<RotWriterHandle>);

impl Write for RoutedWriterHandle {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.0 {
            Some(w) => w.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.0 {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}

/// Routes records to per-target files; the longest matching prefix wins,
/// otherwise the `default` section's file.
#[derive(Default)]
struct MultiFileRouter {
    default: Option<RotWriter>,
    by_prefix: HashMap<String, RotWriter>,
}

impl MultiFileRouter {
    fn resolve_for(&self, target: &str) -> Option<RotWriterHandle> {
        self.by_prefix
            .iter()
            .filter(|(prefix, _)| matches_crate_prefix(target, prefix))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, w)| w)
            .or(self.default.as_ref())
            .map(|w| RotWriterHandle(w.0.clone()))
    }

    fn is_empty(&self) -> bool {
        self.default.is_none() && self.by_prefix.is_empty()
    }
}

impl<'a> fmt::MakeWriter<'a> for MultiFileRouter {
    type Writer = RoutedWriterHandle;

    fn make_writer(&'a self) -> Self::Writer {
        RoutedWriterHandle(self.default.as_ref().map(|w| RotWriterHandle(w.0.clone())))
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        RoutedWriterHandle(self.resolve_for(meta.target()))
    }
}

// -------- config extraction --------

struct ConfigData<'a> {
    default_section: Option<&'a Section>,
    crate_sections: Vec<(&'a str, &'a Section)>,
}

fn extract_config_data(cfg: &LoggingConfig) -> ConfigData<'_> {
    let mut crate_sections: Vec<(&str, &Section)> = cfg
        .iter()
        .filter(|(k, _)| k.as_str() != DEFAULT_SECTION)
        .map(|(k, v)| (k.as_str(), v))
        .collect();
    crate_sections.sort_by(|a, b| a.0.cmp(b.0));

    ConfigData {
        default_section: cfg.get(DEFAULT_SECTION),
        crate_sections,
    }
}

// -------- path resolution helpers --------

/// Absolute paths are kept as-is; relative paths are joined with `base_dir`.
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn file_limit(section: &Section) -> FileLimit {
    match section.max_backups {
        Some(n) if n > 0 => FileLimit::MaxFiles(n),
        _ => FileLimit::Age(chrono::Duration::days(i64::from(
            section.max_age_days.unwrap_or(DEFAULT_MAX_AGE_DAYS),
        ))),
    }
}

/// Create a rotating writer, ensuring the parent directory exists.
fn create_rotating_writer_at_path(
    log_path: &Path,
    max_bytes: usize,
    limit: FileLimit,
) -> std::io::Result<RotWriter> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let rot = FileRotate::new(
        log_path,
        AppendTimestamp::default(limit),
        ContentLimit::BytesSurpassed(max_bytes),
        Compression::None,
        #[cfg(unix)]
        None,
    );

    Ok(RotWriter(Arc::new(Mutex::new(rot))))
}

fn section_writer(name: &str, section: &Section, base_dir: &Path) -> Option<RotWriter> {
    if section.file.trim().is_empty() {
        return None;
    }
    let max_bytes = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB) * 1024 * 1024;
    let log_path = resolve_log_path(&section.file, base_dir);

    match create_rotating_writer_at_path(&log_path, max_bytes as usize, file_limit(section)) {
        Ok(writer) => Some(writer),
        Err(e) => {
            // the subscriber is not installed yet, so stderr is the only channel
            eprintln!(
                "Failed to init log file for '{}': {} ({})",
                name,
                log_path.display(),
                e
            );
            None
        }
    }
}

// -------- public init --------

/// Install the global subscriber.
/// - `cfg`: logging sections keyed by target prefix, plus `default`
/// - `base_dir`: resolves relative log file paths (usually server.home_dir)
///
/// Repeated calls are no-ops.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    use tracing_subscriber::{layer::SubscriberExt, prelude::*, Registry};

    // Bridge `log` → `tracing` before installing the subscriber
    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        let _ = fmt()
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .try_init();
        return;
    }

    let data = extract_config_data(cfg);
    let console_targets = build_console_targets(&data);
    let router = build_file_router(&data, base_dir);
    let file_targets = build_file_targets(&data, router.default.is_some());

    let console_layer = fmt::layer()
        .with_ansi(std::io::stdout().is_terminal())
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(console_targets);

    if router.is_empty() {
        let _ = Registry::default().with(console_layer).try_init();
        return;
    }

    let file_layer = fmt::layer()
        .json()
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_writer(router)
        .with_filter(file_targets);

    let _ = Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init();
}

fn build_console_targets(data: &ConfigData) -> Targets {
    let default = data
        .default_section
        .map_or(LevelFilter::OFF, |s| level_filter(&s.console_level));

    data.crate_sections
        .iter()
        .fold(Targets::new().with_default(default), |t, (name, section)| {
            t.with_target(*name, level_filter(&section.console_level))
        })
}

fn build_file_router(data: &ConfigData, base_dir: &Path) -> MultiFileRouter {
    let mut router = MultiFileRouter {
        default: data
            .default_section
            .and_then(|s| section_writer(DEFAULT_SECTION, s, base_dir)),
        by_prefix: HashMap::new(),
    };

    for (name, section) in &data.crate_sections {
        if let Some(writer) = section_writer(name, section, base_dir) {
            router.by_prefix.insert((*name).to_string(), writer);
        }
    }

    router
}

/// Sections with their own file log at their `file_level`; sections without
/// one fall through to the default file and its level.
fn build_file_targets(data: &ConfigData, has_default_file: bool) -> Targets {
    let default = match data.default_section {
        Some(s) if has_default_file => level_filter(&s.file_level),
        _ => LevelFilter::OFF,
    };

    data.crate_sections
        .iter()
        .fold(Targets::new().with_default(default), |t, (name, section)| {
            let own_file = !section.file.trim().is_empty();
            let own_level = !section.file_level.trim().is_empty();
            if own_file || (own_level && has_default_file) {
                t.with_target(*name, level_filter(&section.file_level))
            } else {
                t
            }
        })
}

// =================== tests ===================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_logging_config;
    use tempfile::tempdir;

    fn section(console: &str, file: &str, file_level: &str) -> Section {
        Section {
            console_level: console.into(),
            file: file.into(),
            file_level: file_level.into(),
            max_age_days: None,
            max_backups: Some(2),
            max_size_mb: Some(1),
        }
    }

    #[test]
    fn test_logging_level_parsing() {
        assert_eq!(parse_tracing_level("trace"), Some(Level::TRACE));
        assert_eq!(parse_tracing_level("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_tracing_level(" Info "), Some(Level::INFO));
        assert_eq!(parse_tracing_level("warning"), Some(Level::WARN));
        assert_eq!(parse_tracing_level("ERROR"), Some(Level::ERROR));
        assert_eq!(parse_tracing_level("off"), None);
        assert_eq!(parse_tracing_level("none"), None);
        assert_eq!(parse_tracing_level("bogus"), Some(Level::INFO));
        assert_eq!(level_filter("off"), LevelFilter::OFF);
    }

    #[test]
    fn test_crate_prefix_matching() {
        assert!(matches_crate_prefix("timesheet", "timesheet"));
        assert!(matches_crate_prefix("timesheet::domain", "timesheet"));
        assert!(!matches_crate_prefix("timesheets", "timesheet"));
        assert!(!matches_crate_prefix("sqlx::query", "timesheet"));
    }

    #[test]
    fn test_extract_config_data_sorted() {
        let mut cfg = default_logging_config();
        cfg.insert("sqlx".into(), section("warn", "", ""));
        cfg.insert("timesheet".into(), section("debug", "logs/ts.log", "trace"));

        let data = extract_config_data(&cfg);
        assert!(data.default_section.is_some());
        let names: Vec<_> = data.crate_sections.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["sqlx", "timesheet"]);
    }

    #[test]
    fn test_file_paths_resolved_against_home_dir() {
        let tmp = tempdir().unwrap();
        let resolved = resolve_log_path("logs/test.log", tmp.path());
        assert!(resolved.starts_with(tmp.path()));
        assert!(resolved.ends_with("logs/test.log"));

        let abs = tmp.path().join("abs.log");
        assert_eq!(resolve_log_path(abs.to_str().unwrap(), Path::new("/other")), abs);
    }

    #[test]
    fn test_create_rotating_writer_at_path_creates_parent() {
        let tmp = tempdir().unwrap();
        let p = tmp.path().join("nested/dir/app.log");

        let writer = create_rotating_writer_at_path(&p, 128 * 1024, FileLimit::MaxFiles(2));
        assert!(writer.is_ok());
        assert!(p.parent().unwrap().exists());

        let mut handle = RotWriterHandle(writer.unwrap().0);
        handle.write_all(b"{\"msg\":\"hello\"}\n").unwrap();
        handle.flush().unwrap();
        assert!(std::fs::read_to_string(&p).unwrap().contains("hello"));
    }

    #[test]
    fn test_router_prefers_longest_prefix_then_default() {
        let tmp = tempdir().unwrap();
        let mut cfg = default_logging_config();
        cfg.get_mut("default").unwrap().file = "logs/main.log".into();
        cfg.insert("worktrack_db".into(), section("info", "logs/db.log", "debug"));
        cfg.insert(
            "worktrack_db::session".into(),
            section("info", "logs/session.log", "debug"),
        );

        let data = extract_config_data(&cfg);
        let router = build_file_router(&data, tmp.path());
        assert!(!router.is_empty());

        let write_to = |target: &str, line: &str| {
            let mut h = RoutedWriterHandle(router.resolve_for(target));
            h.write_all(line.as_bytes()).unwrap();
            h.flush().unwrap();
        };
        write_to("worktrack_db::session", "session-line\n");
        write_to("worktrack_db::repo", "repo-line\n");
        write_to("timesheet::domain", "domain-line\n");

        let read = |rel: &str| std::fs::read_to_string(tmp.path().join(rel)).unwrap();
        assert!(read("logs/session.log").contains("session-line"));
        assert!(read("logs/db.log").contains("repo-line"));
        assert!(!read("logs/db.log").contains("session-line"));
        assert!(read("logs/main.log").contains("domain-line"));
    }

    #[test]
    fn test_router_without_files_drops_writes() {
        let mut cfg = LoggingConfig::new();
        cfg.insert("default".into(), section("info", "", "debug"));
        let data = extract_config_data(&cfg);
        let router = build_file_router(&data, Path::new("/nonexistent"));
        assert!(router.is_empty());

        let mut h = RoutedWriterHandle(router.resolve_for("anything"));
        assert_eq!(h.write(b"dropped").unwrap(), 7);
    }

    #[test]
    fn test_file_limit_selection() {
        let mut s = section("info", "x.log", "debug");
        assert!(matches!(file_limit(&s), FileLimit::MaxFiles(2)));
        s.max_backups = None;
        s.max_age_days = Some(3);
        assert!(matches!(file_limit(&s), FileLimit::Age(_)));
    }

    #[test]
    fn test_init_twice_is_harmless() {
        let tmp = tempdir().unwrap();
        let mut cfg = default_logging_config();
        cfg.get_mut("default").unwrap().file = "logs/init.log".into();
        init_logging_from_config(&cfg, tmp.path());
        init_logging_from_config(&cfg, tmp.path());
        tracing::info!(target: "worktrack_test", "after init");
    }
}
