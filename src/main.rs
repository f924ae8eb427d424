mod ui;

use crate::ui::screen::current_screen;
use chrono::Utc;
use clap::{error::ErrorKind, ArgAction, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use lectio::{
    app_dirs::AppDirs,
    celebration::ChapterCelebration,
    config::{Config, ConfigStore, FileConfigStore},
    corpus::{Library, TextStore},
    logging,
    navigation::ChapterRef,
    orp::WordFrame,
    persistence::{
        load_preferences, load_stats, persist_snapshot, resumable_position, save_preferences,
        MemoryStore, PersistenceStore, Preferences, SavedPosition, SqliteStore,
    },
    runtime::{
        CrosstermEventSource, FixedTicker, ReaderEvent, ReaderEventSource, Runner, Ticker,
        TimerDriver,
    },
    session::{ReadingSession, SessionError, SessionEvent},
    speed::Speed,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::{Duration, Instant},
};

/// How often the stats bar refreshes while nothing else happens.
const REFRESH_INTERVAL: Duration = Duration::from_secs(1);
const ANIMATION_FRAME: Duration = Duration::from_millis(50);

/// rsvp speed reader for scripture, one word at a time
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal speed reader that flashes scripture one word at a time, with the optimal recognition point highlighted, and moves on to the next chapter by itself."
)]
pub struct Cli {
    /// book to open, e.g. "Genesis"
    #[clap(short = 'b', long)]
    book: Option<String>,

    /// chapter to open (defaults to the first chapter of the book)
    #[clap(short = 'c', long)]
    chapter: Option<String>,

    /// reading speed in words per minute: 300 to 900 in steps of 100
    #[clap(short = 's', long, value_parser = parse_speed)]
    speed: Option<Speed>,

    /// version (translation) to read, e.g. "KJV"
    #[clap(short = 't', long, value_name = "VERSION")]
    translation: Option<String>,

    /// extra corpus file to load as a version (repeatable)
    #[clap(long = "corpus", value_name = "FILE")]
    corpus: Vec<PathBuf>,

    /// continue from the last saved position
    #[clap(long = "continue")]
    resume: bool,

    /// list loaded versions with their books and chapter counts, then exit
    #[clap(long)]
    list: bool,

    /// print lifetime reading statistics, then exit
    #[clap(long)]
    stats: bool,

    /// more detail in the log file (-v info, -vv debug)
    #[clap(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,
}

fn parse_speed(s: &str) -> Result<Speed, String> {
    let wpm: u32 = s.parse().map_err(|e| format!("{e}"))?;
    Speed::new(wpm).map_err(|e| e.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Library,
    Reading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Books,
    Chapters,
}

/// Selection in the library lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LibraryCursor {
    pub book: usize,
    pub chapter: usize,
    pub focus: Focus,
}

impl Default for LibraryCursor {
    fn default() -> Self {
        Self {
            book: 0,
            chapter: 0,
            focus: Focus::Books,
        }
    }
}

pub struct App {
    pub library: Library,
    pub session: ReadingSession,
    pub state: AppState,
    pub cursor: LibraryCursor,
    pub frame: Option<WordFrame>,
    pub status: Option<String>,
    pub prefs: Preferences,
    pub resume: Option<SavedPosition>,
    pub celebration: ChapterCelebration,
    pub viewport: (u16, u16),
    pub should_quit: bool,
    store: Box<dyn PersistenceStore>,
}

impl App {
    /// Opens `version`, falling back to the first loaded version.
    pub fn new(
        library: Library,
        store: Box<dyn PersistenceStore>,
        version: &str,
        speed: Speed,
    ) -> Result<Self, SessionError> {
        let (text, status) = match library.get(version) {
            Some(text) => (text, None),
            None => {
                let fallback = library
                    .names()
                    .first()
                    .and_then(|name| library.get(name))
                    .ok_or(SessionError::NoContent)?;
                log::warn!("version {version} is not loaded, using {}", fallback.name());
                let status = format!("Version {version} not found; reading {}.", fallback.name());
                (fallback, Some(status))
            }
        };

        let session = ReadingSession::new(text)
            .with_stats(load_stats(store.as_ref()))
            .with_speed(speed);
        let status = match session.first_readable_chapter() {
            Ok(_) => status,
            Err(e) => Some(e.to_string()),
        };

        let mut app = Self {
            library,
            session,
            state: AppState::Library,
            cursor: LibraryCursor::default(),
            frame: None,
            status,
            prefs: load_preferences(store.as_ref()),
            resume: None,
            celebration: ChapterCelebration::new(),
            viewport: (80, 24),
            should_quit: false,
            store,
        };
        app.refresh_resume();
        Ok(app)
    }

    pub fn version(&self) -> &str {
        self.session.store().name()
    }

    /// 1-based position of the current version among the loaded ones.
    pub fn version_position(&self) -> usize {
        let names = self.library.names();
        names
            .iter()
            .position(|n| *n == self.version())
            .map_or(1, |i| i + 1)
    }

    pub fn selected_book(&self) -> Option<String> {
        self.session.book_order().get(self.cursor.book).cloned()
    }

    pub fn chapters(&self) -> Vec<String> {
        self.selected_book()
            .map(|book| {
                self.session
                    .store()
                    .chapter_numbers(&book)
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn move_selection(&mut self, delta: i32) {
        let step = |current: usize, len: usize| -> usize {
            if len == 0 {
                return 0;
            }
            (current as i64 + delta as i64).clamp(0, len as i64 - 1) as usize
        };
        match self.cursor.focus {
            Focus::Books => {
                let next = step(self.cursor.book, self.session.book_order().len());
                if next != self.cursor.book {
                    self.cursor.book = next;
                    self.cursor.chapter = 0;
                }
            }
            Focus::Chapters => {
                self.cursor.chapter = step(self.cursor.chapter, self.chapters().len());
            }
        }
    }

    /// Enter on a book moves to its chapters; Enter on a chapter reads it.
    pub fn start_selected(&mut self) {
        match self.cursor.focus {
            Focus::Books => self.cursor.focus = Focus::Chapters,
            Focus::Chapters => {
                let (Some(book), Some(chapter)) = (
                    self.selected_book(),
                    self.chapters().get(self.cursor.chapter).cloned(),
                ) else {
                    return;
                };
                self.start_chapter(&book, &chapter, 0);
            }
        }
    }

    pub fn start_chapter(&mut self, book: &str, chapter: &str, word_index: usize) {
        self.session.stop();
        self.process_session_events();

        match self.session.start_from(book, chapter, word_index) {
            Ok(()) => self.status = None,
            Err(e) => self.status = Some(e.to_string()),
        }
        self.process_session_events();
    }

    /// Starts the book given on the command line, or its first chapter.
    pub fn open(&mut self, book: &str, chapter: Option<&str>) {
        let chapter = chapter
            .map(str::to_string)
            .or_else(|| self.session.store().first_chapter(book).map(str::to_string))
            .unwrap_or_else(|| "1".to_string());
        self.start_chapter(book, &chapter, 0);
    }

    pub fn continue_reading(&mut self) {
        let Some(saved) = self.resume.clone() else {
            self.status = Some("Nothing to continue yet.".to_string());
            return;
        };

        if saved.version != self.version() {
            if self.library.get(&saved.version).is_some() {
                self.switch_version(&saved.version);
            } else {
                log::info!(
                    "saved version {} is not loaded, continuing in {}",
                    saved.version,
                    self.version()
                );
            }
        }
        if let Err(e) = self.session.change_speed(saved.speed) {
            log::warn!("ignoring saved speed: {e}");
        }
        self.start_chapter(&saved.book, &saved.chapter, saved.word_index);
    }

    pub fn cycle_version(&mut self) {
        let Some(next) = self.library.next_name(self.version()).map(str::to_string) else {
            return;
        };
        if next != self.version() {
            self.switch_version(&next);
            self.status = Some(format!("Switched to {next}."));
        }
    }

    fn switch_version(&mut self, name: &str) {
        let Some(text) = self.library.get(name) else {
            return;
        };
        self.session.set_store(text);
        self.process_session_events();
        self.cursor = LibraryCursor::default();
    }

    pub fn toggle_dark_mode(&mut self) {
        self.prefs.dark_mode = !self.prefs.dark_mode;
        self.save_preferences();
    }

    pub fn change_font_size(&mut self, larger: bool) {
        self.prefs.font_size = if larger {
            self.prefs.font_size.larger()
        } else {
            self.prefs.font_size.smaller()
        };
        self.save_preferences();
    }

    fn save_preferences(&mut self) {
        if let Err(e) = save_preferences(self.store.as_mut(), &self.prefs) {
            log::warn!("failed to save preferences: {e}");
        }
    }

    fn refresh_resume(&mut self) {
        self.resume = resumable_position(self.store.as_ref(), Utc::now());
    }

    fn sync_cursor(&mut self, location: &ChapterRef) {
        if let Some(book) = self
            .session
            .book_order()
            .iter()
            .position(|b| *b == location.book)
        {
            self.cursor.book = book;
            self.cursor.chapter = self
                .chapters()
                .iter()
                .position(|c| *c == location.chapter)
                .unwrap_or(0);
            self.cursor.focus = Focus::Chapters;
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('q')
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            self.quit();
            return;
        }

        self.status = None;
        let mut screen = current_screen(&self.state);
        screen.on_key(key, self);
        self.process_session_events();
    }

    /// Applies everything the session reported since the last call.
    pub fn process_session_events(&mut self) {
        for event in self.session.drain_events() {
            match event {
                SessionEvent::ChapterStarted { location, .. } => {
                    self.frame = None;
                    self.celebration.stop();
                    self.state = AppState::Reading;
                    self.sync_cursor(&location);
                }
                SessionEvent::Word(frame) => self.frame = Some(frame),
                SessionEvent::ChapterComplete(location) => {
                    let (width, height) = self.viewport;
                    self.celebration.start(location, width, height);
                }
                SessionEvent::AllComplete => {
                    self.status = Some(format!("You've reached the end of {}.", self.version()));
                }
                SessionEvent::Paused | SessionEvent::Resumed | SessionEvent::SpeedChanged(_) => {}
                SessionEvent::Stopped => {
                    self.state = AppState::Library;
                    self.frame = None;
                    self.celebration.stop();
                    self.refresh_resume();
                }
                SessionEvent::Persist(snapshot) => {
                    persist_snapshot(self.store.as_mut(), &snapshot, Utc::now())
                }
                SessionEvent::Failed(e) => self.status = Some(e.to_string()),
            }
        }
    }

    pub fn quit(&mut self) {
        self.session.stop();
        self.process_session_events();
        self.should_quit = true;
    }
}

/// Embedded versions, then the versions directory, then `--corpus` files.
fn load_library(cli: &Cli, versions_dir: Option<PathBuf>) -> Library {
    let mut library = Library::embedded();
    if let Some(dir) = versions_dir {
        for e in library.load_dir(&dir) {
            log::warn!("skipping version: {e}");
        }
    }
    for path in &cli.corpus {
        match TextStore::load(path) {
            Ok(text) => library.insert(text),
            Err(e) => {
                log::error!("{e}");
                eprintln!("lectio: {e}");
            }
        }
    }
    library
}

fn list_library(library: &Library) -> String {
    let mut out = String::new();
    for name in library.names() {
        let Some(text) = library.get(name) else {
            continue;
        };
        out.push_str(&format!("{name}\n"));
        for book in text.book_order() {
            let count = text.chapter_count(&book);
            let unit = if count == 1 { "chapter" } else { "chapters" };
            out.push_str(&format!("  {book} ({count} {unit})\n"));
        }
    }
    out
}

fn open_store() -> Box<dyn PersistenceStore> {
    match SqliteStore::new() {
        Ok(store) => Box::new(store),
        Err(e) => {
            log::warn!("saved state unavailable, nothing will be kept: {e}");
            Box::new(MemoryStore::default())
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(log_path) = AppDirs::log_path() {
        if let Err(e) = logging::init(&log_path, cli.verbose) {
            eprintln!("lectio: logging disabled: {e}");
        }
    }

    let config_store = FileConfigStore::new();
    let mut config = config_store.load();
    let library = load_library(
        &cli,
        config.versions_dir.clone().or_else(AppDirs::versions_dir),
    );
    let store = open_store();

    if cli.list {
        print!("{}", list_library(&library));
        return Ok(());
    }
    if cli.stats {
        println!("{}", load_stats(store.as_ref()).summary(Utc::now()));
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let version = cli.translation.clone().unwrap_or_else(|| config.version.clone());
    let speed = cli
        .speed
        .unwrap_or_else(|| Speed::new(config.speed).unwrap_or_default());
    let mut app = App::new(library, store, &version, speed)?;

    if cli.resume {
        app.continue_reading();
    } else if let Some(book) = &cli.book {
        app.open(book, cli.chapter.as_deref());
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::new(REFRESH_INTERVAL));
    let result = start_tui(&mut terminal, &mut app, &runner);

    finish(&mut app, &mut config, &config_store);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    result
}

/// Saves the final position and stats, then writes the effective version and
/// speed back to the config.
fn finish<S: ConfigStore>(app: &mut App, config: &mut Config, config_store: &S) {
    app.quit();
    config.version = app.version().to_string();
    config.speed = app.session.speed().wpm();
    if let Err(e) = config_store.save(config) {
        log::warn!("failed to save config: {e}");
    }
}

fn start_tui<B: Backend, E: ReaderEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    let mut driver = TimerDriver::new();

    loop {
        if let Ok(size) = terminal.size() {
            app.viewport = (size.width, size.height);
        }
        app.process_session_events();
        terminal.draw(|f| ui(app, f))?;
        if app.should_quit {
            break;
        }

        driver.sync(app.session.pending_tick(), Instant::now());
        let max_wait = if app.celebration.is_active {
            ANIMATION_FRAME
        } else {
            REFRESH_INTERVAL
        };
        match runner.step_within(driver.wait(Instant::now(), max_wait)) {
            ReaderEvent::Key(key) => app.on_key(key),
            ReaderEvent::Resize | ReaderEvent::Tick => {}
        }

        if let Some(token) = driver.take_due(Instant::now()) {
            app.session.fire(token);
        }
        app.celebration.update();
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    current_screen(&app.state).render(app, f);
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectio::persistence::{FontSize, POSITION_KEY};
    use lectio::session::PlayState;
    use ratatui::{backend::TestBackend, Terminal};

    const KJV: &str = r#"{
        "Genesis": {
            "1": { "1": "In the beginning God created the heaven and the earth." },
            "2": { "1": "Thus the heavens and the earth were finished," }
        },
        "Jonah": { "1": { "1": "Now the word of the LORD came unto Jonah" } }
    }"#;

    fn library() -> Library {
        let mut library = Library::default();
        library.insert(TextStore::from_json("KJV", KJV).unwrap());
        library.insert(TextStore::from_json("ASV", KJV).unwrap());
        library
    }

    fn app() -> App {
        App::new(library(), Box::new(MemoryStore::default()), "KJV", Speed::default()).unwrap()
    }

    fn press(app: &mut App, code: KeyCode) {
        app.on_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn reveal(app: &mut App, words: usize) {
        for _ in 0..words {
            let tick = app.session.pending_tick().unwrap();
            app.session.fire(tick.token);
        }
        app.process_session_events();
    }

    fn screen_text(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 24)).unwrap();
        terminal.draw(|f| ui(app, f)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer.content.iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["lectio"]);
        assert_eq!(cli.book, None);
        assert_eq!(cli.chapter, None);
        assert_eq!(cli.speed, None);
        assert_eq!(cli.translation, None);
        assert!(cli.corpus.is_empty());
        assert!(!cli.resume && !cli.list && !cli.stats);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_cli_reading_flags() {
        let cli = Cli::parse_from([
            "lectio", "-b", "Psalms", "-c", "23", "-s", "500", "-t", "asv", "-vv",
        ]);
        assert_eq!(cli.book.as_deref(), Some("Psalms"));
        assert_eq!(cli.chapter.as_deref(), Some("23"));
        assert_eq!(cli.speed.map(Speed::wpm), Some(500));
        assert_eq!(cli.translation.as_deref(), Some("asv"));
        assert_eq!(cli.verbose, 2);

        let cli = Cli::parse_from(["lectio", "--corpus", "a.json", "--corpus", "b.json", "--continue"]);
        assert_eq!(cli.corpus.len(), 2);
        assert!(cli.resume);
    }

    #[test]
    fn test_cli_rejects_unsupported_speed() {
        assert!(Cli::try_parse_from(["lectio", "-s", "350"]).is_err());
        assert!(Cli::try_parse_from(["lectio", "-s", "fast"]).is_err());
    }

    #[test]
    fn test_app_falls_back_to_loaded_version() {
        let app = App::new(library(), Box::new(MemoryStore::default()), "NIV", Speed::default())
            .unwrap();
        assert_eq!(app.version(), "ASV");
        assert!(app.status.as_deref().unwrap().contains("NIV"));
    }

    #[test]
    fn test_app_without_versions_has_no_content() {
        let result = App::new(
            Library::default(),
            Box::new(MemoryStore::default()),
            "KJV",
            Speed::default(),
        );
        assert!(matches!(result, Err(SessionError::NoContent)));
    }

    #[test]
    fn test_app_reports_empty_version() {
        let mut library = Library::default();
        library.insert(TextStore::from_json("KJV", r#"{"Genesis": {"1": {"1": "..."}}}"#).unwrap());
        let app = App::new(library, Box::new(MemoryStore::default()), "KJV", Speed::default())
            .unwrap();
        assert_eq!(app.status.as_deref(), Some("no content available"));
    }

    #[test]
    fn test_library_navigation_and_start() {
        let mut app = app();
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected_book().as_deref(), Some("Jonah"));
        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.cursor.focus, Focus::Chapters);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.state, AppState::Reading);
        assert_eq!(app.session.location(), Some(&ChapterRef::new("Genesis", "2")));
        assert_eq!(app.session.state(), PlayState::Playing);
    }

    #[test]
    fn test_reading_keys() {
        let mut app = app();
        app.open("Genesis", None);
        reveal(&mut app, 3);
        assert_eq!(app.frame.as_ref().map(WordFrame::word).as_deref(), Some("beginning"));

        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.session.state(), PlayState::Paused);
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.session.state(), PlayState::Playing);

        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.session.speed().wpm(), 500);
        press(&mut app, KeyCode::Left);
        assert_eq!(app.session.speed().wpm(), 400);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state, AppState::Library);
        assert_eq!(app.session.state(), PlayState::Stopped);
    }

    #[test]
    fn test_stop_saves_position_and_continue_resumes() {
        let mut app = app();
        app.open("Genesis", Some("1"));
        press(&mut app, KeyCode::Right);
        reveal(&mut app, 4);
        press(&mut app, KeyCode::Esc);

        let resume = app.resume.clone().expect("resumable position");
        assert_eq!(resume.book, "Genesis");
        assert_eq!(resume.word_index, 4);
        assert_eq!(resume.speed, 400);
        assert!(app.store.get(POSITION_KEY).unwrap().is_some());

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.state, AppState::Reading);
        assert_eq!(app.session.index(), 4);
        assert_eq!(app.session.speed().wpm(), 400);
    }

    #[test]
    fn test_continue_without_saved_position() {
        let mut app = app();
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.state, AppState::Library);
        assert_eq!(app.status.as_deref(), Some("Nothing to continue yet."));
    }

    #[test]
    fn test_start_failure_is_shown() {
        let mut app = app();
        app.open("Genesis", Some("50"));
        assert_eq!(app.state, AppState::Library);
        assert_eq!(app.status.as_deref(), Some("Chapter 50 not found for Genesis."));
    }

    #[test]
    fn test_version_cycle_stops_reading() {
        let mut app = app();
        app.open("Jonah", None);
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('v'));
        assert_eq!(app.version(), "ASV");
        assert_eq!(app.cursor, LibraryCursor::default());
        assert_eq!(app.version_position(), 1);
        press(&mut app, KeyCode::Char('v'));
        assert_eq!(app.version(), "KJV");
    }

    #[test]
    fn test_preferences_persist() {
        let mut app = app();
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('+'));
        assert!(app.prefs.dark_mode);
        assert_eq!(app.prefs.font_size, FontSize::Large);
        assert_eq!(load_preferences(app.store.as_ref()), app.prefs);

        press(&mut app, KeyCode::Char('-'));
        press(&mut app, KeyCode::Char('-'));
        assert_eq!(app.prefs.font_size, FontSize::Small);
    }

    #[test]
    fn test_chapter_complete_celebrates_then_advances() {
        let mut app = app();
        app.open("Genesis", Some("1"));
        reveal(&mut app, 10);
        reveal(&mut app, 1);
        assert!(app.celebration.is_active);
        assert_eq!(app.session.stats().chapters_completed, 1);

        reveal(&mut app, 1);
        assert!(!app.celebration.is_active);
        assert_eq!(app.session.location(), Some(&ChapterRef::new("Genesis", "2")));
        assert_eq!(app.cursor.chapter, 1);
    }

    #[test]
    fn test_quit_key() {
        let mut app = app();
        app.open("Jonah", None);
        reveal(&mut app, 2);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
        assert_eq!(app.session.state(), PlayState::Stopped);
        assert_eq!(app.resume.as_ref().map(|r| r.word_index), Some(2));
    }

    #[test]
    fn test_ui_library_screen() {
        let mut app = app();
        let content = screen_text(&mut app);
        assert!(content.contains("Genesis (2)"));
        assert!(content.contains("Jonah (1)"));
        assert!(content.contains("Chapter 1"));
        assert!(content.contains("KJV"));
    }

    #[test]
    fn test_ui_reading_screen() {
        let mut app = app();
        app.open("Genesis", Some("1"));
        reveal(&mut app, 1);
        let content = screen_text(&mut app);
        assert!(content.contains("Genesis 1"));
        assert!(content.contains("300 WPM"));
        assert!(content.contains("1 / 10 words"));

        press(&mut app, KeyCode::Char(' '));
        assert!(screen_text(&mut app).contains("PAUSED"));
    }

    #[test]
    fn test_list_library() {
        let listing = list_library(&library());
        assert!(listing.starts_with("ASV\n"));
        assert!(listing.contains("  Genesis (2 chapters)\n"));
        assert!(listing.contains("  Jonah (1 chapter)\n"));
    }

    #[test]
    fn test_finish_saves_position_and_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_store = FileConfigStore::with_path(dir.path().join("config.json"));
        let mut config = Config::default();
        let mut app = app();
        press(&mut app, KeyCode::Char('v'));
        app.open("Jonah", None);
        press(&mut app, KeyCode::Up);
        reveal(&mut app, 3);

        finish(&mut app, &mut config, &config_store);

        assert!(app.should_quit);
        assert_eq!(app.resume.as_ref().map(|r| r.word_index), Some(3));
        let saved = config_store.load();
        assert_eq!(saved.version, "ASV");
        assert_eq!(saved.speed, 400);
    }

    #[test]
    fn test_event_loop_reads_to_the_end() {
        use std::sync::mpsc;

        let mut library = Library::default();
        library.insert(TextStore::from_json("KJV", r#"{"Jonah": {"1": {"1": "Arise, go"}}}"#).unwrap());
        let mut app = App::new(library, Box::new(MemoryStore::default()), "KJV", Speed::FASTEST)
            .unwrap();
        app.open("Jonah", None);

        let (tx, rx) = mpsc::channel();
        let runner = Runner::new(
            lectio::runtime::ChannelEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(5)),
        );
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();

        // two words, the completion pause and the advance take under two seconds
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_secs(5));
            let _ = tx.send(ReaderEvent::Key(KeyEvent::new(
                KeyCode::Char('q'),
                KeyModifiers::NONE,
            )));
        });
        start_tui(&mut terminal, &mut app, &runner).unwrap();

        assert!(app.should_quit);
        assert_eq!(app.state, AppState::Library);
        assert_eq!(app.session.stats().total_words_read, 2);
        assert_eq!(app.session.stats().chapters_completed, 1);
        assert_eq!(app.status.as_deref(), Some("You've reached the end of KJV."));
    }
}
