mod app;
mod event;
mod ui;

use std::fs::{self, OpenOptions};
use std::io;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::Parser;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use dailyword::config::Config;
use dailyword::puzzle::source::PuzzleSource;
use dailyword::session::game::RoundState;
use dailyword::store::json_store::default_data_dir;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Wrap};

use app::{App, AppScreen, FeedbackKind};
use event::{AppEvent, EventHandler};
use ui::components::letter_row::LetterRow;
use ui::components::share_popup::SharePopup;
use ui::layout::AppLayout;
use ui::theme::Theme;

#[derive(Parser)]
#[command(name = "dailyword", version, about = "Daily word-guessing game for the terminal")]
struct Cli {
    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(short, long, help = "Puzzle list: \"bundled\", a JSON file, or an http(s) URL")]
    puzzles: Option<String>,

    #[arg(short, long, help = "Play the puzzle for this date (YYYY-MM-DD) instead of today")]
    date: Option<NaiveDate>,

    #[arg(long, help = "Log filter, e.g. \"debug\" or \"dailyword=trace\"")]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(err) => (Config::default(), Some(err)),
    };
    if let Some(theme) = cli.theme {
        config.theme = theme;
    }
    if let Some(puzzles) = cli.puzzles {
        config.puzzle_source = puzzles;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    init_logging(&config.log_level);
    if let Some(err) = config_error {
        log::warn!("ignoring unreadable config: {err}");
    }
    match Config::write_default_if_missing() {
        Ok(Some(path)) => log::info!("wrote default config to {}", path.display()),
        Ok(None) => {}
        Err(err) => log::warn!("could not write default config: {err}"),
    }

    let today = cli.date.unwrap_or_else(|| Local::now().date_naive());
    let theme = Theme::load(&config.theme).unwrap_or_else(|| {
        log::warn!(
            "unknown theme {:?}, using default (available: {})",
            config.theme,
            Theme::available_themes().join(", ")
        );
        Theme::default()
    });
    log::debug!("using theme {}", theme.name);
    let theme: &'static Theme = Box::leak(Box::new(theme));
    let source = PuzzleSource::parse(&config.puzzle_source);
    let mut app = App::new(config, theme, today);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(Duration::from_millis(50));
    events.spawn_puzzle_load(source);

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Some(ref text) = app.share_text {
        println!("{text}");
    }
    if let Err(err) = result {
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

/// Logs go to a file: the terminal belongs to the game while it runs.
fn init_logging(level: &str) {
    let dir = default_data_dir();
    if fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("dailyword.log"))
    else {
        return;
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init();
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Tick => {
                if app.is_animating() {
                    app.tick(Instant::now());
                }
            }
            AppEvent::Resize(_, _) => {}
            AppEvent::PuzzlesLoaded(result) => app.puzzles_loaded(result),
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match app.screen {
        AppScreen::Loading | AppScreen::LoadFailed => match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => app.should_quit = true,
            _ => {}
        },
        AppScreen::Share => app.close_popup(),
        AppScreen::Playing => handle_game_key(app, key),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum GameKey {
    Quit,
    Check,
    DeleteBackward,
    DeleteForward,
    MoveFocus(isize),
    Hint,
    Reveal,
    Share,
    Type(char),
}

/// Key map for the playing screen. Ctrl-h is left unbound: many terminals
/// send it as Backspace.
fn game_key(key: KeyEvent) -> Option<GameKey> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('r') => Some(GameKey::Reveal),
            KeyCode::Char('s') => Some(GameKey::Share),
            _ => None,
        };
    }

    Some(match key.code {
        KeyCode::Esc => GameKey::Quit,
        KeyCode::Enter => GameKey::Check,
        KeyCode::Backspace => GameKey::DeleteBackward,
        KeyCode::Delete => GameKey::DeleteForward,
        KeyCode::Left => GameKey::MoveFocus(-1),
        KeyCode::Right => GameKey::MoveFocus(1),
        KeyCode::Home => GameKey::MoveFocus(isize::MIN / 2),
        KeyCode::End => GameKey::MoveFocus(isize::MAX / 2),
        KeyCode::Tab | KeyCode::Char('?') => GameKey::Hint,
        KeyCode::Char(ch) => GameKey::Type(ch),
        _ => return None,
    })
}

fn handle_game_key(app: &mut App, key: KeyEvent) {
    match game_key(key) {
        Some(GameKey::Quit) => app.should_quit = true,
        Some(GameKey::Check) => app.submit(),
        Some(GameKey::DeleteBackward) => app.delete_backward(),
        Some(GameKey::DeleteForward) => app.delete_forward(),
        Some(GameKey::MoveFocus(delta)) => app.move_focus(delta),
        Some(GameKey::Hint) => app.hint(),
        Some(GameKey::Reveal) => app.reveal(),
        Some(GameKey::Share) => app.share(),
        Some(GameKey::Type(ch)) => app.type_char(ch),
        None => {}
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    let layout = AppLayout::new(area);
    render_header(frame, app, layout.header);

    match app.screen {
        AppScreen::Loading => {
            let text = Paragraph::new(Line::from(Span::styled(
                "Loading today's puzzle...",
                Style::default().fg(colors.text_dim()),
            )))
            .alignment(Alignment::Center);
            frame.render_widget(text, layout.letters);
        }
        AppScreen::LoadFailed => {
            let message = app.load_error.as_deref().unwrap_or("unknown error");
            let text = Paragraph::new(vec![
                Line::from(Span::styled(
                    "Could not load today's puzzle",
                    Style::default()
                        .fg(colors.error())
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(message, Style::default().fg(colors.error()))),
            ])
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
            frame.render_widget(text, layout.letters);
            render_footer(frame, app, layout.footer, &["[Esc] Quit"]);
        }
        AppScreen::Playing | AppScreen::Share => {
            render_game(frame, app, &layout);
            if app.screen == AppScreen::Share
                && let Some(ref text) = app.share_text
            {
                let popup = ui::layout::centered_rect(50, 40, area);
                frame.render_widget(SharePopup::new(text, app.theme), popup);
            }
        }
    }
}

fn render_header(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let colors = &app.theme.colors;
    let streak = app.game.streak();
    let info = format!(
        " {} | 🔥 Streak: {} | Best: {}",
        app.today.format("%Y-%m-%d"),
        streak.current_streak(),
        streak.best_streak(),
    );
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {} ", app.config.share_title),
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            info,
            Style::default().fg(colors.text_dim()).bg(colors.header_bg()),
        ),
    ]))
    .style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, area);
}

fn render_game(frame: &mut ratatui::Frame, app: &App, layout: &AppLayout) {
    let colors = &app.theme.colors;

    if let Some(puzzle) = app.game.puzzle() {
        let clue = Paragraph::new(vec![
            Line::from(Span::styled("Clue", Style::default().fg(colors.text_dim()))),
            Line::from(Span::styled(
                puzzle.clue.as_str(),
                Style::default().fg(colors.fg()).add_modifier(Modifier::BOLD),
            )),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
        frame.render_widget(clue, layout.clue);
    }

    if let Some(input) = app.game.input() {
        let popping = app.popping();
        let row = LetterRow::new(input.cells(), input.focus(), app.theme)
            .popping(&popping)
            .shake_offset(app.shake_offset(Instant::now()))
            .solved(app.game.state() == Some(RoundState::Solved));
        frame.render_widget(row, layout.letters);
    }

    let mut lines = Vec::new();
    if let Some(ref feedback) = app.feedback {
        let color = match feedback.kind {
            FeedbackKind::Info => colors.fg(),
            FeedbackKind::Success => colors.success(),
            FeedbackKind::Warning => colors.warning(),
            FeedbackKind::Error => colors.error(),
        };
        lines.push(Line::from(Span::styled(
            feedback.text.as_str(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
    }
    if let Some(ref warning) = app.storage_warning {
        lines.push(Line::from(Span::styled(
            warning.as_str(),
            Style::default().fg(colors.warning()),
        )));
    }
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        layout.feedback,
    );

    let hints: &[&str] = if app.game.is_over() {
        &["[Ctrl-s] Share", "[Esc] Quit"]
    } else {
        &[
            "[Enter] Check",
            "[Tab/?] Hint",
            "[Ctrl-r] Reveal",
            "[Ctrl-s] Share",
            "[Backspace] Delete",
            "[Esc] Quit",
        ]
    };
    render_footer(frame, app, layout.footer, hints);
}

fn render_footer(frame: &mut ratatui::Frame, app: &App, area: Rect, hints: &[&str]) {
    let colors = &app.theme.colors;
    let lines: Vec<Line> = ui::layout::pack_hint_lines(hints, area.width as usize)
        .into_iter()
        .map(|l| Line::from(Span::styled(l, Style::default().fg(colors.text_dim()))))
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_hint_keys() {
        assert_eq!(game_key(press(KeyCode::Tab, KeyModifiers::NONE)), Some(GameKey::Hint));
        assert_eq!(
            game_key(press(KeyCode::Char('?'), KeyModifiers::SHIFT)),
            Some(GameKey::Hint)
        );
    }

    #[test]
    fn test_ctrl_h_is_not_a_hint() {
        assert_eq!(game_key(press(KeyCode::Char('h'), KeyModifiers::CONTROL)), None);
        // What such terminals actually deliver stays a deletion.
        assert_eq!(
            game_key(press(KeyCode::Backspace, KeyModifiers::NONE)),
            Some(GameKey::DeleteBackward)
        );
    }

    #[test]
    fn test_control_shortcuts_and_letters() {
        assert_eq!(
            game_key(press(KeyCode::Char('r'), KeyModifiers::CONTROL)),
            Some(GameKey::Reveal)
        );
        assert_eq!(
            game_key(press(KeyCode::Char('s'), KeyModifiers::CONTROL)),
            Some(GameKey::Share)
        );
        assert_eq!(
            game_key(press(KeyCode::Char('A'), KeyModifiers::SHIFT)),
            Some(GameKey::Type('A'))
        );
    }
}
