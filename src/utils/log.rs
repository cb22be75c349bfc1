use std::{fs, path::PathBuf};

use chrono::{DateTime, Duration, Utc};
use tracing_subscriber::{EnvFilter, Layer};
use tracing_subscriber::{
    fmt::{self},
    registry::LookupSpan,
    reload,
};

use crate::APP_NAMESPACE;

type BoxedLayer<S> =
    Box<dyn tracing_subscriber::layer::Layer<S> + Send + Sync + 'static>;
pub type LogHandle<S> = reload::Handle<Option<BoxedLayer<S>>, S>;

const MAX_LOG_FILES: usize = 10;
const MAX_LOG_AGE_DAYS: i64 = 7;

pub struct LogManager {
    pub state_dir: PathBuf,
}

impl LogManager {
    pub fn init() -> Self {
        let state_dir = std::env::var("XDG_STATE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").expect("$HOME should be set");
                PathBuf::from(home).join(".local/state")
            })
            .join(APP_NAMESPACE);

        let _ = fs::create_dir_all(&state_dir);
        Self { state_dir }
    }

    fn generate_log_name() -> String {
        let pid = std::process::id();
        let now = Utc::now().format("%Y%m%d-%H%M%S");
        format!("{APP_NAMESPACE}.{pid}.{now}.log")
    }

    /// Swaps a file layer into the reload slot and returns the log path.
    pub fn setup_logging<S>(&self, handle: &LogHandle<S>) -> PathBuf
    where
        S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    {
        self.cleanup_old_logs();
        let log_name = Self::generate_log_name();
        let log_path = self.state_dir.join(&log_name);

        let file_appender =
            tracing_appender::rolling::never(&self.state_dir, &log_name);

        let layer = fmt::layer().compact().with_writer(file_appender).boxed();

        let _ = handle.modify(|l| *l = Some(layer));
        log_path
    }

    fn cleanup_old_logs(&self) {
        let Ok(entries) = fs::read_dir(&self.state_dir) else {
            return;
        };
        let now = Utc::now();
        let expiration = Duration::days(MAX_LOG_AGE_DAYS);

        let mut log_files: Vec<(PathBuf, DateTime<Utc>)> = entries
            .flatten()
            .filter(|e| {
                e.file_name().to_string_lossy().starts_with(APP_NAMESPACE)
            })
            .filter_map(|e| {
                let path = e.path();
                let meta = e.metadata().ok()?;
                let modified = meta.modified().ok()?.into();
                Some((path, modified))
            })
            .collect();

        log_files.retain(|(path, modified)| {
            if now.signed_duration_since(*modified) > expiration {
                let _ = fs::remove_file(path);
                false
            } else {
                true
            }
        });

        if log_files.len() > MAX_LOG_FILES {
            log_files.sort_by_key(|&(_, modified)| modified);
            let to_remove = log_files.len() - MAX_LOG_FILES;
            for (path, _) in &log_files[..to_remove] {
                let _ = fs::remove_file(path);
            }
        }
    }
}

pub fn get_default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "info,frosttip=debug".into()
        } else {
            "error,frosttip=info".into()
        }
    })
}
