mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use homing::{
    app_dirs::AppDirs,
    celebration::HitBurst,
    config::{Config, ConfigStore, FileConfigStore},
    feedback::{PointerSample, ProximityFeedbackController},
    geometry::{Extents, Point},
    haptics::{TerminalChime, TerminalHaptics},
    logging::init_file_logger,
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, MouseSample, Runner},
    target::{RandomSource, RngSource},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin, Write},
    path::PathBuf,
    time::{Duration, Instant},
};

/// drag-to-find hot/cold seek game with proximity rumble feedback
#[derive(Parser, Debug, Clone, Default)]
#[clap(
    version,
    about,
    long_about = "Hold the left mouse button and sweep across the board. The rumble meter grows stronger the closer you get to the hidden dot; touch it to score and a new dot appears."
)]
pub struct Cli {
    /// config file to read settings from
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// seed for target placement, for reproducible rounds
    #[clap(long)]
    seed: Option<u64>,

    /// hide the target until it has been found
    #[clap(short = 'b', long)]
    blind: bool,

    /// disable the rumble meter (proximity pulses are dropped)
    #[clap(long)]
    no_haptics: bool,

    /// do not ring the terminal bell on a hit
    #[clap(long)]
    no_bell: bool,

    /// distance (surface units) at which the target counts as found
    #[clap(long)]
    hit_radius: Option<f64>,

    /// file to write logs to
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// write the merged settings to the config file and exit
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Layer command line overrides on top of the stored config
    fn apply(&self, mut cfg: Config) -> Config {
        if self.blind {
            cfg.blind = true;
        }
        if self.no_haptics {
            cfg.haptics = false;
        }
        if self.no_bell {
            cfg.bell = false;
        }
        if let Some(radius) = self.hit_radius {
            cfg.tuning.hit_radius = radius;
        }
        cfg
    }

    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }
}

pub type Controller =
    ProximityFeedbackController<TerminalHaptics, TerminalChime<Box<dyn Write>>, Box<dyn RandomSource>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyOutcome {
    Continue,
    Quit,
}

pub struct App {
    pub config: Config,
    pub seed: Option<u64>,
    pub controller: Option<Controller>,
    pub burst: HitBurst,
    /// Terminal cells covered by the play surface
    pub surface: Rect,
    pub blind: bool,
    chime_out: fn() -> Box<dyn Write>,
}

fn stdout_writer() -> Box<dyn Write> {
    Box::new(io::stdout())
}

impl App {
    pub fn new(config: Config, seed: Option<u64>, chime_out: fn() -> Box<dyn Write>) -> Self {
        Self {
            blind: config.blind,
            config,
            seed,
            controller: None,
            burst: HitBurst::new(),
            surface: Rect::default(),
            chime_out,
        }
    }

    fn random_source(&self) -> Box<dyn RandomSource> {
        match self.seed {
            Some(seed) => Box::new(RngSource::seeded(seed)),
            None => Box::new(RngSource::thread()),
        }
    }

    pub fn extents(&self) -> Extents {
        self.config
            .cell_scale()
            .extents(self.surface.width, self.surface.height)
    }

    /// Whether the surface leaves room to place a target
    pub fn is_playable(&self) -> bool {
        self.config.tuning.margins().fits(self.extents())
    }

    /// Track the terminal size; the first playable size starts the game
    pub fn resize(&mut self, area: Rect) {
        self.surface = ui::surface_area(area);
        let extents = self.extents();

        if let Some(controller) = self.controller.as_mut() {
            controller.on_resize(extents);
            return;
        }
        if !self.is_playable() {
            return;
        }

        let haptics = TerminalHaptics::new(self.config.haptics);
        let chime = TerminalChime::new(self.config.bell, (self.chime_out)());
        match Controller::new(
            extents,
            self.config.tuning,
            self.random_source(),
            haptics,
            chime,
        ) {
            Ok(controller) => self.controller = Some(controller),
            Err(err) => log::warn!("cannot start yet: {err}"),
        }
    }

    /// Surface coordinates for a terminal cell; cells left of or above the
    /// surface map to negative coordinates.
    pub fn to_surface(&self, column: u16, row: u16) -> Point {
        let scale = self.config.cell_scale();
        Point::new(
            (column as f64 - self.surface.x as f64 + 0.5) * scale.cell_width,
            (row as f64 - self.surface.y as f64 + 0.5) * scale.cell_height,
        )
    }

    /// Feed a mouse sample that arrived at `now` (since start). The clock
    /// catches up first so a hit schedules its cues from the moment it landed.
    pub fn on_pointer(&mut self, sample: MouseSample, now: Duration) {
        let playable = self.is_playable();
        let location = self.to_surface(sample.column, sample.row);
        let extents = self.extents();
        if let Some(controller) = self.controller.as_mut() {
            controller.advance(now);
            if playable {
                controller.on_sample(PointerSample::new(location, sample.phase), extents);
            }
        }
    }

    /// Advance game time to `now` (since start), `dt` since the previous step
    pub fn on_tick(&mut self, now: Duration, dt: Duration) {
        let extents = self.extents();
        if let Some(controller) = self.controller.as_mut() {
            controller.advance(now);
            controller.haptics_mut().advance(dt);
            if controller.signal_mut().take_fired() > 0 {
                let origin = controller
                    .last_hit()
                    .unwrap_or_else(|| controller.target().position());
                self.burst.start(origin, extents);
            }
        }
        self.burst.update(dt.as_secs_f64());
    }

    fn on_key(&mut self, key: KeyEvent) -> KeyOutcome {
        if key.kind != KeyEventKind::Press {
            return KeyOutcome::Continue;
        }
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => KeyOutcome::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                KeyOutcome::Quit
            }
            KeyCode::Char('b') => {
                self.blind = !self.blind;
                KeyOutcome::Continue
            }
            _ => KeyOutcome::Continue,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(path) = cli.log_file.clone().or_else(AppDirs::log_path) {
        if let Err(err) = init_file_logger(&path) {
            eprintln!("logging disabled: {err}");
        }
    }

    let store = cli.config_store();
    let config = cli.apply(store.load()).sanitized();

    if cli.save_config {
        store.save(&config)?;
        println!("saved settings to {}", store.path().display());
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    log::info!("starting with {:?} (seed {:?})", config, cli.seed);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, cli.seed, stdout_writer);
    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if let Some(controller) = &app.controller {
        log::info!("session over after {} hits", controller.hits());
    }
    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(app.config.tick_rate_ms.max(1))),
    );

    let size = terminal.size()?;
    app.resize(Rect::new(0, 0, size.width, size.height));

    let started = Instant::now();
    let mut last_step = started;

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        let event = runner.step();
        let now = Instant::now();

        match event {
            GameEvent::Tick => {}
            GameEvent::Resize => {
                let size = terminal.size()?;
                app.resize(Rect::new(0, 0, size.width, size.height));
            }
            GameEvent::Pointer(sample) => app.on_pointer(sample, now - started),
            GameEvent::Key(key) => {
                if app.on_key(key) == KeyOutcome::Quit {
                    break;
                }
            }
        }

        // a steady stream of drag events must not starve the clock
        app.on_tick(now - started, now - last_step);
        last_step = now;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use homing::{feedback::Phase, target::TargetState};

    fn sink_writer() -> Box<dyn Write> {
        Box::new(io::sink())
    }

    fn test_app(seed: u64) -> App {
        let config = Config {
            bell: false,
            ..Config::default()
        };
        App::new(config, Some(seed), sink_writer)
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    /// Terminal cell closest to a surface point
    fn cell_for(app: &App, p: Point) -> (u16, u16) {
        let scale = app.config.cell_scale();
        (
            app.surface.x + (p.x / scale.cell_width) as u16,
            app.surface.y + (p.y / scale.cell_height) as u16,
        )
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["homing"]);
        assert!(cli.config.is_none());
        assert!(cli.seed.is_none());
        assert!(!cli.blind);
        assert!(!cli.save_config);
        assert_eq!(cli.apply(Config::default()), Config::default());
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "homing",
            "--blind",
            "--no-haptics",
            "--no-bell",
            "--hit-radius",
            "12.5",
            "--seed",
            "9",
        ]);
        let cfg = cli.apply(Config::default());
        assert!(cfg.blind);
        assert!(!cfg.haptics);
        assert!(!cfg.bell);
        assert_eq!(cfg.tuning.hit_radius, 12.5);
        assert_eq!(cli.seed, Some(9));
    }

    #[test]
    fn test_cli_rejects_bad_radius() {
        let res = Cli::try_parse_from(["homing", "--hit-radius", "wide"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_app_starts_once_playable() {
        let mut app = test_app(1);
        app.resize(Rect::new(0, 0, 20, 10));
        assert!(!app.is_playable());
        assert!(app.controller.is_none());

        app.resize(Rect::new(0, 0, 80, 24));
        assert!(app.is_playable());
        let controller = app.controller.as_ref().unwrap();
        assert_eq!(controller.target().state(), TargetState::Armed);
        assert!(controller
            .target()
            .in_placement_box(controller.target().position(), app.extents()));
    }

    #[test]
    fn test_pointer_outside_surface_maps_negative() {
        let mut app = test_app(1);
        app.resize(Rect::new(0, 0, 80, 24));
        let p = app.to_surface(0, 0);
        assert!(p.x < 0.0 && p.y < 0.0);
    }

    #[test]
    fn test_drag_onto_target_scores() {
        let mut app = test_app(3);
        app.resize(Rect::new(0, 0, 80, 24));
        let target = app.controller.as_ref().unwrap().target().position();
        let (col, row) = cell_for(&app, target);

        app.on_pointer(MouseSample::new(app.surface.x, app.surface.y, Phase::Began), ms(0));
        app.on_pointer(MouseSample::new(col, row, Phase::Changed), ms(0));

        let controller = app.controller.as_ref().unwrap();
        assert_eq!(controller.hits(), 1);
        assert_eq!(controller.target().state(), TargetState::HitPending);

        app.on_tick(ms(150), ms(150));
        assert!(app.burst.is_active);

        app.on_tick(ms(800), ms(650));
        let controller = app.controller.as_ref().unwrap();
        assert_eq!(controller.target().state(), TargetState::Armed);
    }

    #[test]
    fn test_hit_delays_start_when_the_pointer_lands() {
        let mut app = test_app(3);
        app.resize(Rect::new(0, 0, 80, 24));
        app.on_tick(ms(0), ms(0));
        let target = app.controller.as_ref().unwrap().target().position();
        let (col, row) = cell_for(&app, target);

        // hit arrives between ticks
        app.on_pointer(MouseSample::new(col, row, Phase::Began), ms(30));
        app.on_tick(ms(30), ms(30));
        assert_eq!(app.controller.as_ref().unwrap().hits(), 1);

        app.on_tick(ms(100), ms(70));
        assert!(!app.burst.is_active);
        app.on_tick(ms(131), ms(31));
        assert!(app.burst.is_active);

        app.on_tick(ms(700), ms(569));
        let state = app.controller.as_ref().unwrap().target().state();
        assert_eq!(state, TargetState::HitPending);
        app.on_tick(ms(731), ms(31));
        let state = app.controller.as_ref().unwrap().target().state();
        assert_eq!(state, TargetState::Armed);
    }

    #[test]
    fn test_playable_matches_placement_rule() {
        let mut app = test_app(1);
        // 21x18 inner cells is the smallest board exceeding the 80x140 minimum
        app.resize(Rect::new(0, 0, 23, 22));
        assert_eq!(app.extents(), Extents::new(84.0, 144.0));
        assert!(app.is_playable());
        assert!(app.controller.is_some());

        let mut app = test_app(1);
        app.resize(Rect::new(0, 0, 22, 22));
        assert!(!app.is_playable());
        assert!(app.controller.is_none());
    }

    #[test]
    fn test_far_drag_rumbles() {
        let mut app = test_app(5);
        app.resize(Rect::new(0, 0, 80, 24));
        let target = app.controller.as_ref().unwrap().target().position();
        // opposite corner of the surface from the target
        let extents = app.extents();
        let far = Point::new(
            if target.x > extents.width / 2.0 { 0.0 } else { extents.width - 1.0 },
            if target.y > extents.height / 2.0 { 0.0 } else { extents.height - 1.0 },
        );
        let (col, row) = cell_for(&app, far);
        app.on_pointer(MouseSample::new(col, row, Phase::Began), ms(0));

        let haptics = app.controller.as_ref().unwrap().haptics();
        assert!(haptics.is_playing());
        assert!(haptics.level() >= 0.16);

        app.on_tick(ms(200), ms(200));
        assert!(!app.controller.as_ref().unwrap().haptics().is_playing());
    }

    #[test]
    fn test_keys() {
        let mut app = test_app(1);
        let press = |code| KeyEvent::new(code, KeyModifiers::NONE);

        assert_eq!(app.on_key(press(KeyCode::Char('b'))), KeyOutcome::Continue);
        assert!(app.blind);
        assert_eq!(app.on_key(press(KeyCode::Char('b'))), KeyOutcome::Continue);
        assert!(!app.blind);

        assert_eq!(app.on_key(press(KeyCode::Char('q'))), KeyOutcome::Quit);
        assert_eq!(app.on_key(press(KeyCode::Esc)), KeyOutcome::Quit);
        assert_eq!(
            app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            KeyOutcome::Quit
        );
        assert_eq!(app.on_key(press(KeyCode::Char('x'))), KeyOutcome::Continue);
    }

    #[test]
    fn test_shrinking_terminal_pauses_input() {
        let mut app = test_app(2);
        app.resize(Rect::new(0, 0, 80, 24));
        app.resize(Rect::new(0, 0, 20, 10));
        assert!(!app.is_playable());

        app.on_pointer(MouseSample::new(5, 5, Phase::Began), ms(0));
        let controller = app.controller.as_ref().unwrap();
        assert!(controller.last_feedback().is_none());
    }
}
