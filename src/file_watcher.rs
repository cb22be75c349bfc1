use iced::{
    Subscription,
    advanced::subscription::{EventStream, Hasher, Recipe, from_recipe},
};
use std::{
    hash::Hash,
    io,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::{Message, utils::BoxStream};

const POLLING_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub enum FileWatcherEvent {
    Changed,
    Missing,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CheckResult {
    Missing,
    Unchanged,
    Changed,
}

struct FileWatcher {
    path: PathBuf,
}

#[profiling::all_functions]
impl Recipe for FileWatcher {
    type Output = FileWatcherEvent;

    fn hash(&self, state: &mut Hasher) {
        std::any::TypeId::of::<Self>().hash(state);
        self.path.hash(state);
    }

    fn stream(self: Box<Self>, _input: EventStream) -> BoxStream<Self::Output> {
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut watcher = FileWatcherInner::new(self.path);
            loop {
                tokio::time::sleep(POLLING_INTERVAL).await;

                let event = match watcher.check() {
                    CheckResult::Changed => Some(FileWatcherEvent::Changed),
                    CheckResult::Missing => Some(FileWatcherEvent::Missing),
                    CheckResult::Unchanged => None,
                };

                if let Some(event) = event
                    && tx.send(event).is_err()
                {
                    break;
                }
            }
        });

        Box::pin(UnboundedReceiverStream::new(rx))
    }
}

/// Re-parses the config whenever its mtime or resolved path changes.
pub fn watch_file(path: PathBuf) -> Subscription<Message> {
    from_recipe(FileWatcher { path }).map(Message::ConfigWatcher)
}

fn see_path(path: &Path) -> io::Result<(SystemTime, PathBuf)> {
    let canon = path.canonicalize()?;
    let mtime = canon.metadata()?.modified()?;
    Ok((mtime, canon))
}

struct FileWatcherInner {
    path: PathBuf,

    last_props: Option<(SystemTime, PathBuf)>,
}

#[profiling::all_functions]
impl FileWatcherInner {
    fn new(path: PathBuf) -> Self {
        let last_props = see_path(&path).ok();
        Self { path, last_props }
    }

    fn check(&mut self) -> CheckResult {
        if let Ok(new_props) = see_path(&self.path) {
            if self.last_props.as_ref() == Some(&new_props) {
                CheckResult::Unchanged
            } else {
                self.last_props = Some(new_props);
                CheckResult::Changed
            }
        } else {
            CheckResult::Missing
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn a_missing_file_reports_missing_until_it_appears() {
        let path = std::env::temp_dir().join(format!(
            "frosttip-watcher-test-{}.kdl",
            std::process::id()
        ));
        let _ = fs::remove_file(&path);

        let mut watcher = FileWatcherInner::new(path.clone());
        assert_eq!(watcher.check(), CheckResult::Missing);

        fs::write(&path, "tooltip { delay 10 }").unwrap();
        assert_eq!(
            watcher.check(),
            CheckResult::Changed,
            "appearing counts as a change"
        );
        assert_eq!(watcher.check(), CheckResult::Unchanged);

        let _ = fs::remove_file(&path);
        assert_eq!(watcher.check(), CheckResult::Missing);
    }
}
