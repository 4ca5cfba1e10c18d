use crate::config::{LoggingConfig, Section};
use crate::paths::resolve_under;
use std::{
    io::Write,
    path::Path,
    sync::{Arc, Mutex},
};
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::{
    filter::{FilterFn, Targets},
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    Layer, Registry,
};

use file_rotate::{compression::Compression, suffix::AppendCount, ContentLimit, FileRotate};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

const DEFAULT_SECTION: &str = "default";
const ROTATED_FILES_KEPT: usize = 5;

fn parse_level(s: &str) -> Option<Level> {
    match s.to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        "off" | "none" => None,
        _ => Some(Level::INFO),
    }
}

fn level_filter(s: &str) -> LevelFilter {
    parse_level(s).map_or(LevelFilter::OFF, LevelFilter::from_level)
}

/// True if `target` is `prefix` itself or lives under `prefix::`.
fn matches_prefix(target: &str, prefix: &str) -> bool {
    target == prefix
        || (target.starts_with(prefix) && target[prefix.len()..].starts_with("::"))
}

#[derive(Clone)]
struct RotatingFile(Arc<Mutex<FileRotate<AppendCount>>>);

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("log file lock poisoned"))?
            .write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("log file lock poisoned"))?
            .flush()
    }
}

fn open_rotating(path: &Path, max_bytes: usize) -> std::io::Result<RotatingFile> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let rot = FileRotate::new(
        path,
        AppendCount::new(ROTATED_FILES_KEPT),
        ContentLimit::BytesSurpassed(max_bytes),
        Compression::None,
        #[cfg(unix)]
        None,
    );
    Ok(RotatingFile(Arc::new(Mutex::new(rot))))
}

fn file_sink(section: &Section, base_dir: &Path) -> Option<RotatingFile> {
    if section.file.trim().is_empty() {
        return None;
    }
    let max_bytes = section.max_size_mb.unwrap_or(100) * 1024 * 1024;
    let path = resolve_under(&section.file, base_dir);
    match open_rotating(&path, max_bytes as usize) {
        Ok(w) => Some(w),
        Err(e) => {
            eprintln!("Failed to open log file '{}': {e}", path.display());
            None
        }
    }
}

/// Console filter: explicit sections at their own level, everything else at
/// the "default" console level.
fn console_targets(cfg: &LoggingConfig) -> Targets {
    let default_level = cfg
        .get(DEFAULT_SECTION)
        .map_or(LevelFilter::INFO, |s| level_filter(&s.console_level));

    cfg.iter()
        .filter(|(name, _)| name.as_str() != DEFAULT_SECTION)
        .fold(Targets::new().with_default(default_level), |t, (name, s)| {
            t.with_target(name.clone(), level_filter(&s.console_level))
        })
}

fn json_file_layer<F>(writer: RotatingFile, filter: F) -> BoxedLayer
where
    F: tracing_subscriber::layer::Filter<Registry> + Send + Sync + 'static,
{
    fmt::layer()
        .json()
        .with_ansi(false)
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_writer(move || writer.clone())
        .with_filter(filter)
        .boxed()
}

fn build_layers(cfg: &LoggingConfig, base_dir: &Path) -> Vec<BoxedLayer> {
    let ansi = atty::is(atty::Stream::Stdout);
    let mut layers: Vec<BoxedLayer> = vec![fmt::layer()
        .with_ansi(ansi)
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(console_targets(cfg))
        .boxed()];

    let explicit: Vec<String> = cfg
        .keys()
        .filter(|k| k.as_str() != DEFAULT_SECTION)
        .cloned()
        .collect();

    for (name, section) in cfg {
        let Some(writer) = file_sink(section, base_dir) else {
            continue;
        };
        let Some(level) = parse_level(&section.file_level) else {
            continue;
        };

        if name == DEFAULT_SECTION {
            let excluded = explicit.clone();
            let filter = FilterFn::new(move |meta: &tracing::Metadata<'_>| {
                meta.level() <= &level
                    && !excluded.iter().any(|p| matches_prefix(meta.target(), p))
            });
            layers.push(json_file_layer(writer, filter));
        } else {
            let filter = Targets::new().with_target(name.clone(), level);
            layers.push(json_file_layer(writer, filter));
        }
    }
    layers
}

/// Install the global subscriber.
/// Relative log file paths are resolved against `base_dir` (normally `server.home_dir`).
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    // `log` records from dependencies flow into tracing.
    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        let _ = fmt()
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .try_init();
        return;
    }

    let _ = Registry::default().with(build_layers(cfg, base_dir)).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_logging_config;
    use tempfile::tempdir;

    #[test]
    fn level_parsing() {
        assert_eq!(parse_level("trace"), Some(Level::TRACE));
        assert_eq!(parse_level("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_level("Warn"), Some(Level::WARN));
        assert_eq!(parse_level("off"), None);
        assert_eq!(parse_level("none"), None);
        assert_eq!(parse_level("bogus"), Some(Level::INFO));
    }

    #[test]
    fn prefix_matching_respects_module_boundaries() {
        assert!(matches_prefix("marketplace", "marketplace"));
        assert!(matches_prefix("marketplace::audit", "marketplace"));
        assert!(!matches_prefix("marketplace_extra", "marketplace"));
        assert!(!matches_prefix("sqlx::query", "marketplace"));
    }

    #[test]
    fn rotating_writer_creates_parent_dirs() {
        let tmp = tempdir().unwrap();
        let p = tmp.path().join("nested/dir/market.log");
        let mut w = open_rotating(&p, 64 * 1024).expect("writer");
        w.write_all(b"hello\n").unwrap();
        w.flush().unwrap();
        assert!(p.parent().unwrap().exists());
    }

    #[test]
    fn one_layer_per_file_sink_plus_console() {
        let tmp = tempdir().unwrap();
        let mut cfg = default_logging_config();
        cfg.insert(
            "marketplace::audit".into(),
            Section {
                console_level: "info".into(),
                file: "logs/audit.log".into(),
                file_level: "info".into(),
                max_size_mb: Some(1),
            },
        );
        cfg.insert(
            "sqlx".into(),
            Section {
                console_level: "warn".into(),
                file: String::new(),
                file_level: "debug".into(),
                max_size_mb: None,
            },
        );

        let layers = build_layers(&cfg, tmp.path());
        // console + default file + audit file; sqlx has no file sink
        assert_eq!(layers.len(), 3);
        assert!(tmp.path().join("logs").exists());
    }
}
