//! One-shot and automatic match logging.

use crate::capture::{Bases, CaptureMatch, MatchSnapshot, ResolveBases, SceneProbe, SceneTracker};
use crate::config::{AutoMode, Config};
use crate::error::MatchError;
use crate::layout::MatchLayout;
use crate::logger::MatchLog;
use crate::names::NameTable;
use crate::report::{LogLevel, Report};
use crate::session::{Connector, Session};
use crate::watch::{Shutdown, WatchConfig, Watcher};
use chrono::Local;
use geckolog_client::Sleeper;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What to log and how often to look.
#[derive(Debug, Clone)]
pub struct DriverOptions {
    pub level: LogLevel,
    pub auto: Option<AutoMode>,
    pub log_dir: PathBuf,
    pub watch: WatchConfig,
    pub scene_interval: Duration,
}

impl DriverOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            level: config.logging.level,
            auto: config.logging.auto,
            log_dir: config.logging.dir.clone(),
            watch: config.watch_config(),
            scene_interval: config.polling.scene_interval(),
        }
    }
}

/// Captures matches through a retrying session and writes them to the log.
pub struct MatchLogger<C: Connector> {
    session: Session<C>,
    layout: MatchLayout,
    names: NameTable,
    options: DriverOptions,
    shutdown: Shutdown,
    bases: Option<Bases>,
    log: Option<MatchLog>,
}

impl<C: Connector> MatchLogger<C> {
    pub fn new(
        session: Session<C>,
        layout: MatchLayout,
        names: NameTable,
        options: DriverOptions,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            session,
            layout,
            names,
            options,
            shutdown,
            bases: None,
            log: None,
        }
    }

    /// Path of the log file currently written, if any.
    pub fn log_path(&self) -> Option<&Path> {
        self.log.as_ref().map(MatchLog::path)
    }

    pub fn session(&self) -> &Session<C> {
        &self.session
    }

    /// Resolves the base pointers once. They stay valid across reconnects.
    async fn bases<S: Sleeper>(&mut self, sleeper: &S) -> Result<Bases, MatchError> {
        if let Some(bases) = self.bases {
            return Ok(bases);
        }
        let mut work = ResolveBases {
            layout: &self.layout,
        };
        let bases = self.session.retrying(&mut work, sleeper).await?;
        self.bases = Some(bases);
        Ok(bases)
    }

    fn open_log(&mut self) -> Result<(), MatchError> {
        if self.options.level.writes_file() {
            self.log = Some(MatchLog::create(&self.options.log_dir, Local::now())?);
        }
        Ok(())
    }

    async fn capture<S: Sleeper>(&mut self, sleeper: &S) -> Result<MatchSnapshot, MatchError> {
        let bases = self.bases(sleeper).await?;
        let watcher = Watcher::new(&self.options.watch, sleeper, &self.shutdown);
        let mut work = CaptureMatch::new(&self.layout, &bases, watcher)
            .with_stats(self.options.level.wants_stats());
        self.session.retrying(&mut work, sleeper).await
    }

    fn write(&self, snapshot: &MatchSnapshot, number: Option<u32>) -> Result<(), MatchError> {
        if let Some(log) = &self.log {
            let report = Report::new(&self.names, self.options.level, number.is_some());
            log.append(&report.render(snapshot, number))?;
        }
        Ok(())
    }

    /// Logs the current (or most recent) match once.
    pub async fn log_once<S, F>(&mut self, sleeper: &S, mut on_match: F) -> Result<MatchSnapshot, MatchError>
    where
        S: Sleeper,
        F: FnMut(&MatchSnapshot, Option<u32>),
    {
        self.open_log()?;
        let snapshot = self.capture(sleeper).await?;
        if !snapshot.in_match {
            tracing::info!("Not in a match; logging data left from the previous one");
        }
        self.write(&snapshot, None)?;
        on_match(&snapshot, None);
        Ok(snapshot)
    }

    /// Watches for matches until shutdown, logging each one as it starts.
    ///
    /// Returns the number of matches seen.
    pub async fn run_auto<S, F>(&mut self, sleeper: &S, mut on_match: F) -> Result<u32, MatchError>
    where
        S: Sleeper,
        F: FnMut(&MatchSnapshot, Option<u32>),
    {
        let mode = self.options.auto.unwrap_or(AutoMode::All);
        let mut tracker = SceneTracker::new();
        self.open_log()?;

        tracing::info!("Auto logging started ({:?})", mode);

        while !self.shutdown.is_triggered() {
            let bases = self.bases(sleeper).await?;
            let mut probe = SceneProbe {
                layout: &self.layout,
                bases: &bases,
            };
            let in_versus = self.session.retrying(&mut probe, sleeper).await?;

            if let Some(number) = tracker.observe(in_versus) {
                tracing::info!("Match {} started", number);
                if mode == AutoMode::Latest && number > 1 {
                    self.open_log()?;
                }

                match self.capture(sleeper).await {
                    Ok(snapshot) => {
                        self.write(&snapshot, Some(number))?;
                        on_match(&snapshot, Some(number));
                    }
                    Err(MatchError::Cancelled) => break,
                    Err(e) => return Err(e),
                }
            }

            sleeper.sleep(self.options.scene_interval).await;
        }

        tracing::info!("Auto logging stopped after {} matches", tracker.matches());
        Ok(tracker.matches())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::tests::{console, SCENE_MGR};
    use crate::session::tests::MockConnector;
    use crate::testing::{FakeSleeper, MockLink};
    use geckolog_client::{RetryPolicy, Variant};
    use std::cell::Cell;
    use tempfile::TempDir;

    /// Triggers shutdown on the given sleep.
    struct StopAfter {
        remaining: Cell<u32>,
        shutdown: Shutdown,
    }

    impl Sleeper for StopAfter {
        async fn sleep(&self, _duration: Duration) {
            self.remaining.set(self.remaining.get().saturating_sub(1));
            if self.remaining.get() == 0 {
                self.shutdown.trigger();
            }
        }
    }

    fn options(dir: &TempDir, level: LogLevel, auto: Option<AutoMode>) -> DriverOptions {
        DriverOptions {
            level,
            auto,
            log_dir: dir.path().to_path_buf(),
            watch: WatchConfig::default(),
            scene_interval: Duration::from_secs(10),
        }
    }

    fn logger(image: MockLink, options: DriverOptions, shutdown: &Shutdown) -> MatchLogger<MockConnector> {
        MatchLogger::new(
            Session::new(MockConnector::new(image), RetryPolicy::default()),
            MatchLayout::default(),
            NameTable::empty(),
            options,
            shutdown.clone(),
        )
    }

    /// Scene id sequence as seen by successive accesses.
    fn script_scenes(link: &mut MockLink, scenes: &[u16]) {
        let layout = MatchLayout::default();
        for scene in scenes {
            link.script_read(SCENE_MGR + layout.scene_id + 2, scene.to_be_bytes().to_vec());
        }
    }

    #[tokio::test]
    async fn test_log_once_writes_file() {
        let dir = TempDir::new().unwrap();
        let shutdown = Shutdown::new();
        let image = console(Variant::Classic, &[("Callie", 0x100, 0), ("Marie", 0x200, 1)], true);
        let mut logger = logger(image, options(&dir, LogLevel::Full, None), &shutdown);
        let mut seen = Vec::new();

        let snapshot = logger
            .log_once(&FakeSleeper::default(), |s, n| seen.push((s.players.len(), n)))
            .await
            .unwrap();

        assert_eq!(snapshot.players.len(), 2);
        assert_eq!(seen, [(2, None)]);
        let content = std::fs::read_to_string(logger.log_path().unwrap()).unwrap();
        assert!(content.starts_with("geckolog log from "));
        assert!(content.contains("\nSession ID: ABCDEF (11259375)\n"));
        assert!(content.contains("\n[Player 2]\n  Name: Marie\n"));
        assert!(content.contains("  Weapons: "));
    }

    #[tokio::test]
    async fn test_level_none_writes_no_file() {
        let dir = TempDir::new().unwrap();
        let shutdown = Shutdown::new();
        let image = console(Variant::Classic, &[("Callie", 0x100, 0)], true);
        let mut logger = logger(image, options(&dir, LogLevel::None, None), &shutdown);

        logger.log_once(&FakeSleeper::default(), |_, _| {}).await.unwrap();

        assert!(logger.log_path().is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_auto_logs_each_transition_into_versus() {
        let dir = TempDir::new().unwrap();
        let shutdown = Shutdown::new();
        let mut image = console(Variant::Classic, &[("Callie", 0x100, 0)], false);
        // Probe, probe + capture, probe, probe, probe + capture.
        script_scenes(&mut image, &[2, 7, 7, 7, 2, 7, 7]);
        let mut logger = logger(image, options(&dir, LogLevel::Basic, Some(AutoMode::All)), &shutdown);
        let sleeper = StopAfter {
            remaining: Cell::new(5),
            shutdown: shutdown.clone(),
        };
        let mut numbers = Vec::new();

        let matches = logger
            .run_auto(&sleeper, |_, n| numbers.extend(n))
            .await
            .unwrap();

        assert_eq!(matches, 2);
        assert_eq!(numbers, [1, 2]);
        let content = std::fs::read_to_string(logger.log_path().unwrap()).unwrap();
        assert!(content.contains("\n[Match 1]\n  Time: "));
        assert!(content.contains("\n[Match 2]\n"));
        assert!(content.contains("\n  [Player 1]\n    Name: Callie\n"));
        assert_eq!(logger.session().connects(), 1);
    }

    #[tokio::test]
    async fn test_auto_latest_starts_new_file_per_match() {
        let dir = TempDir::new().unwrap();
        let shutdown = Shutdown::new();
        let mut image = console(Variant::Classic, &[("Callie", 0x100, 0)], false);
        script_scenes(&mut image, &[7, 7, 2, 7, 7]);
        let mut logger = logger(image, options(&dir, LogLevel::Basic, Some(AutoMode::Latest)), &shutdown);
        let sleeper = StopAfter {
            remaining: Cell::new(3),
            shutdown: shutdown.clone(),
        };

        let matches = logger.run_auto(&sleeper, |_, _| {}).await.unwrap();
        assert_eq!(matches, 2);

        let day = std::fs::read_dir(dir.path()).unwrap().next().unwrap().unwrap().path();
        let mut files: Vec<_> = std::fs::read_dir(day)
            .unwrap()
            .map(|entry| std::fs::read_to_string(entry.unwrap().path()).unwrap())
            .collect();
        files.sort();
        assert_eq!(files.len(), 2);
        assert!(files.iter().any(|f| f.contains("[Match 1]") && !f.contains("[Match 2]")));
        assert!(files.iter().any(|f| f.contains("[Match 2]") && !f.contains("[Match 1]")));
    }

    #[tokio::test]
    async fn test_auto_stops_immediately_when_already_shut_down() {
        let dir = TempDir::new().unwrap();
        let shutdown = Shutdown::new();
        shutdown.trigger();
        let image = console(Variant::Classic, &[], true);
        let mut logger = logger(image, options(&dir, LogLevel::Basic, Some(AutoMode::All)), &shutdown);

        let matches = logger
            .run_auto(&FakeSleeper::default(), |_, _| {})
            .await
            .unwrap();
        assert_eq!(matches, 0);
        assert_eq!(logger.session().connects(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_console_exhausts_retries() {
        let dir = TempDir::new().unwrap();
        let shutdown = Shutdown::new();
        let connector = MockConnector::new(console(Variant::Classic, &[], true));
        connector.refusals.set(u32::MAX);
        let mut logger = MatchLogger::new(
            Session::new(connector, RetryPolicy::default()),
            MatchLayout::default(),
            NameTable::empty(),
            options(&dir, LogLevel::None, None),
            shutdown,
        );
        let sleeper = FakeSleeper::default();

        let err = logger.log_once(&sleeper, |_, _| {}).await.unwrap_err();
        assert!(matches!(err, MatchError::RetriesExhausted { attempts: 3, .. }));
        assert_eq!(sleeper.slept().len(), 2);
    }
}
