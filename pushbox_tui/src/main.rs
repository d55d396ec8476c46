use anyhow::{Context, Result};
use clap::Parser;
use pushbox_core::{
    board::{Board, Cell, REFERENCE_HEIGHT, REFERENCE_LEVEL, REFERENCE_WIDTH},
    catalog::{EntityKind, LightColor, TileKind},
    device::{PacketStream, celebration_color, clear_pending_input, encode_board, win_transition},
    input::{DeviceInput, ScriptedInput, command_from_key},
    session::{Outcome, Session},
    win::goal_progress,
};
use ratatui::{
    crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use std::{
    fs::File,
    io::{self, Stdout},
    path::{Path, PathBuf},
    sync::Mutex,
    thread,
    time::Duration,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt::writer::BoxMakeWriter};

mod serial;

use serial::SerialStream;

/// How long the solved board stays on screen before the UI closes.
const SOLVED_LINGER: Duration = Duration::from_millis(1500);

#[derive(Parser, Debug)]
#[command(version, about = "Box-pushing puzzle for the terminal and an 8x8 pad controller", long_about = None)]
struct Args {
    /// Level descriptor file; line breaks are ignored
    #[arg(short, long, value_name = "LEVEL_FILE")]
    level: Option<PathBuf>,

    /// Board width in cells
    #[arg(long, default_value_t = REFERENCE_WIDTH)]
    width: usize,

    /// Board height in cells
    #[arg(long, default_value_t = REFERENCE_HEIGHT)]
    height: usize,

    /// Serial device of the pad controller; plays on the controller instead of the terminal UI
    #[arg(short, long, value_name = "DEVICE")]
    device: Option<String>,

    /// Baud rate of the controller's serial port
    #[arg(long, default_value_t = 31_250)]
    baud: u32,

    /// Replay these w/a/s/d/r keys without a UI and print the final board
    #[arg(short, long, value_name = "KEYS")]
    moves: Option<String>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Write logs to this file (the terminal UI discards them otherwise)
    #[arg(long, value_name = "LOG_FILE")]
    log_file: Option<PathBuf>,
}

impl Args {
    fn uses_terminal_ui(&self) -> bool {
        self.device.is_none() && self.moves.is_none()
    }
}

struct App {
    /// The running game.
    session: Session,
    /// Flag to control the main loop.
    should_quit: bool,
    /// Set once the puzzle is solved; input is ignored afterwards.
    game_over: bool,
}

impl App {
    fn new(session: Session) -> Self {
        let game_over = session.is_won();
        App {
            session,
            should_quit: false,
            game_over,
        }
    }

    /// Handles one key press.
    fn on_key(&mut self, key: char) -> Result<()> {
        if self.game_over {
            return Ok(());
        }
        if let Some(command) = command_from_key(key) {
            if self.session.apply(command)? == Outcome::Won {
                self.game_over = true;
            }
        }
        Ok(())
    }

    fn quit(&mut self) {
        self.should_quit = true;
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args)?;

    if let Some(device) = &args.device {
        // The controller is opened before any board exists.
        let stream = SerialStream::open(device, args.baud)
            .with_context(|| format!("Cannot open controller {device}"))?;
        let session = load_session(&args)?;
        return run_hardware(stream, session);
    }

    let session = load_session(&args)?;
    if let Some(keys) = &args.moves {
        return run_replay(session, keys);
    }

    let mut terminal = setup_terminal()?;
    let mut app = App::new(session);
    let result = run_app(&mut terminal, &mut app);
    restore_terminal(&mut terminal)?;
    result
}

fn init_tracing(args: &Args) -> Result<()> {
    let writer = match &args.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Cannot create log file {}", path.display()))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None if args.uses_terminal_ui() => BoxMakeWriter::new(io::sink),
        None => BoxMakeWriter::new(io::stderr),
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(true)
        .compact()
        .try_init();
    Ok(())
}

fn load_session(args: &Args) -> Result<Session> {
    let descriptor = match &args.level {
        Some(path) => read_level(path)?,
        None => REFERENCE_LEVEL.to_string(),
    };
    Session::new(descriptor, args.width, args.height).context("Failed to load level")
}

/// Level files may keep one board row per line.
fn read_level(path: &Path) -> Result<String> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read level file {}", path.display()))?;
    Ok(text.chars().filter(|c| !matches!(c, '\n' | '\r')).collect())
}

/// Plays on the pad controller, mirroring every change to stdout.
fn run_hardware(mut stream: SerialStream, mut session: Session) -> Result<()> {
    clear_pending_input(&mut stream)?;
    stream.send(&encode_board(session.board()))?;
    println!("{}\n", session.board().render_text());

    let won = {
        let mut input = DeviceInput::new(&mut stream);
        session.play(&mut input, |input, board| {
            println!("{}\n", board.render_text());
            input.stream().send(&encode_board(board))
        })?
    };

    if won {
        let color = celebration_color(&mut rand::rng());
        for frame in win_transition(color) {
            stream.send(&frame.commands)?;
            thread::sleep(frame.hold);
        }
        println!("Solved!");
    }
    info!("session finished");
    Ok(())
}

/// Applies a fixed key sequence and prints where it ended up.
fn run_replay(mut session: Session, keys: &str) -> Result<()> {
    let won = session.play(&mut ScriptedInput::new(keys), |_, _| Ok(()))?;
    println!("{}", session.board().render_text());
    let (covered, total) = goal_progress(session.board());
    if won {
        println!("Solved!");
    } else {
        println!("Not solved: {covered}/{total} goals covered");
    }
    Ok(())
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the main loop of the TUI application.
///
/// Blocks on the keyboard; the board only changes in response to a key.
/// Once the puzzle is solved the final board is shown for a moment and the
/// loop ends; a key press closes it sooner.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if app.game_over {
            if event::poll(SOLVED_LINGER)? {
                event::read()?;
            }
            info!("puzzle solved, closing");
            break;
        }

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                    KeyCode::Char(c) => app.on_key(c)?,
                    _ => {}
                }
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Renders the user interface.
fn ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Area for the board
            Constraint::Length(3), // Area for status/help
        ])
        .split(frame.area());

    render_board(frame, main_layout[0], app.session.board());

    let (covered, total) = goal_progress(app.session.board());
    let status = if app.game_over {
        format!("Solved! All {total} goals covered.")
    } else {
        format!("Goals {covered}/{total}  |  w/a/s/d move, r restart, q quit")
    };
    let status = Paragraph::new(status)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(status, main_layout[1]);
}

/// Renders the board, coloring each cell like its pad on the controller.
fn render_board(frame: &mut Frame, area: Rect, board: &Board) {
    let lines: Vec<Line> = board
        .cells()
        .rows()
        .map(|row| Line::from(row.iter().map(cell_span).collect::<Vec<_>>()))
        .collect();

    let board_paragraph = Paragraph::new(lines)
        .block(Block::default().title("Pushbox").borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(board_paragraph, area);
}

fn cell_span(cell: &Cell) -> Span<'static> {
    let color = cell
        .entity
        .attributes()
        .color
        .unwrap_or(cell.tile.attributes().color);
    let mut style = match color {
        LightColor::OFF => Style::default(),
        lit => Style::default().fg(pad_color(lit)),
    };
    if cell.entity == EntityKind::Player {
        style = style.bold();
    }
    if cell.tile == TileKind::Goal && cell.entity == EntityKind::Box {
        style = style.bg(Color::Rgb(0, 85, 0));
    }
    Span::styled(cell.symbol().to_string(), style)
}

/// Terminal approximation of a pad LED: red and green in four steps each.
fn pad_color(color: LightColor) -> Color {
    Color::Rgb(color.red() * 85, color.green() * 85, 0)
}
