use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind}, execute, terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen}};
use ratatui::{backend::CrosstermBackend, Frame, Terminal, widgets::{Block, Borders, List, ListItem, Paragraph, ListState, Wrap}, layout::{Layout, Constraint, Direction}, style::{Style, Modifier, Color}};
use tracing_subscriber::EnvFilter;

use taskflow::{
    client::{
        api::HttpApi,
        assistant::{Assistant, GenerativeTextClient, Sender, FAQ},
        resource_client::ResourceClient,
        state::{Notice, NoticeLevel, ResourceList},
    },
    config::ClientConfig,
    domain::{feedback::Feedback, record::Resource, todo::Todo},
};

const TOAST_TTL: Duration = Duration::from_secs(3);

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_logging()?;
    let config = ClientConfig::from_env();
    let api = HttpApi::new(config.backend_url.clone());
    let assistant = config.assistant.clone().map(|c| Assistant::new(GenerativeTextClient::new(c)));
    let app = App::new(api, assistant, config.backend_url);

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    res
}

/// The UI owns the terminal, so logs go to a file and only when asked for.
fn init_logging() -> Result<()> {
    let Ok(filter) = std::env::var("TASKFLOW_LOG") else { return Ok(()) };
    let file = std::fs::OpenOptions::new().create(true).append(true).open("taskflow-tui.log")?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum View { Todos, Feedback, Assistant }

impl View {
    fn next(self) -> Self {
        match self { View::Todos => View::Feedback, View::Feedback => View::Assistant, View::Assistant => View::Todos }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode { Browse, Compose }

struct Toast {
    notice: Notice,
    shown_at: Instant,
}

struct App {
    todos: ResourceClient<Todo, HttpApi>,
    feedback: ResourceClient<Feedback, HttpApi>,
    assistant: Option<Assistant<GenerativeTextClient>>,
    backend_url: String,
    view: View,
    mode: Mode,
    selected: usize,
    list_state: ListState,
    toast: Option<Toast>,
    chat_input: String,
    faq_selected: usize,
    quit: bool,
}

impl App {
    fn new(api: HttpApi, assistant: Option<Assistant<GenerativeTextClient>>, backend_url: String) -> Self {
        Self {
            todos: ResourceClient::new(api.clone()),
            feedback: ResourceClient::new(api),
            assistant,
            backend_url,
            view: View::Todos,
            mode: Mode::Browse,
            selected: 0,
            list_state: ListState::default(),
            toast: None,
            chat_input: String::new(),
            faq_selected: 0,
            quit: false,
        }
    }

    async fn load(&mut self) {
        // Failures are already turned into notices.
        let _ = self.todos.load().await;
        let _ = self.feedback.load().await;
        self.collect_notices();
    }

    fn collect_notices(&mut self) {
        let latest = self
            .todos
            .state_mut()
            .drain_notices()
            .into_iter()
            .chain(self.feedback.state_mut().drain_notices())
            .last();
        if let Some(notice) = latest {
            self.toast = Some(Toast { notice, shown_at: Instant::now() });
        }
    }

    fn visible_len(&self) -> usize {
        match self.view {
            View::Todos => self.todos.state().len(),
            View::Feedback => self.feedback.state().len(),
            View::Assistant => FAQ.len(),
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_len();
        if len == 0 { self.selected = 0; self.list_state.select(None); }
        else { if self.selected >= len { self.selected = len - 1; } self.list_state.select(Some(self.selected)); }
    }

    async fn handle_key(&mut self, code: KeyCode) {
        if code == KeyCode::Tab && self.mode == Mode::Browse && !self.busy() {
            self.view = self.view.next();
            self.selected = 0;
            return;
        }
        match self.view {
            View::Todos => {
                let browsing = self.mode == Mode::Browse && !self.busy();
                if browsing && code == KeyCode::Char(' ') {
                    if let Some(id) = self.todos.state().nth(self.selected).map(|t| t.id.clone()) {
                        let _ = self.todos.toggle(&id).await;
                    }
                } else {
                    self.quit |= handle_list_key(&mut self.todos, &mut self.mode, &mut self.selected, code).await;
                }
            }
            View::Feedback => {
                self.quit |= handle_list_key(&mut self.feedback, &mut self.mode, &mut self.selected, code).await;
            }
            View::Assistant => self.handle_assistant_key(code).await,
        }
        self.collect_notices();
    }

    /// An edit or a delete confirmation is open in the current list.
    fn busy(&self) -> bool {
        match self.view {
            View::Todos => is_busy(self.todos.state()),
            View::Feedback => is_busy(self.feedback.state()),
            View::Assistant => false,
        }
    }

    async fn handle_assistant_key(&mut self, code: KeyCode) {
        let Some(assistant) = self.assistant.as_mut() else { return };
        match code {
            KeyCode::Enter if self.chat_input.trim().is_empty() => { assistant.ask_faq(self.faq_selected); }
            KeyCode::Enter => {
                let query = std::mem::take(&mut self.chat_input);
                assistant.ask(&query).await;
            }
            KeyCode::Up => { if self.faq_selected > 0 { self.faq_selected -= 1; } }
            KeyCode::Down => { if self.faq_selected + 1 < FAQ.len() { self.faq_selected += 1; } }
            KeyCode::Esc => self.chat_input.clear(),
            KeyCode::Backspace => { self.chat_input.pop(); }
            KeyCode::Char(c) => self.chat_input.push(c),
            _ => {}
        }
    }
}

fn is_busy<R: Resource>(state: &ResourceList<R>) -> bool { state.editing().is_some() || state.pending_delete().is_some() }

/// Keys shared by both record lists. Returns `true` when the user quits.
async fn handle_list_key<R: Resource>(client: &mut ResourceClient<R, HttpApi>, mode: &mut Mode, selected: &mut usize, code: KeyCode) -> bool {
    if client.state().pending_delete().is_some() {
        if code == KeyCode::Char('y') { let _ = client.confirm_delete().await; } else { client.cancel_delete(); }
        return false;
    }
    if client.state().editing().is_some() {
        match code {
            KeyCode::Esc => client.cancel_edit(),
            // Enter or moving focus away saves.
            KeyCode::Enter | KeyCode::Tab => { let _ = client.commit_edit().await; }
            KeyCode::Backspace => { if let Some(buf) = client.state_mut().edit_buffer_mut() { buf.pop(); } }
            KeyCode::Char(c) => { if let Some(buf) = client.state_mut().edit_buffer_mut() { buf.push(c); } }
            _ => {}
        }
        return false;
    }
    if *mode == Mode::Compose {
        match code {
            KeyCode::Esc => { *mode = Mode::Browse; client.state_mut().input.clear(); }
            // Blank input and failed requests keep the input open.
            KeyCode::Enter => { if client.add().await.is_ok() { *mode = Mode::Browse; } }
            KeyCode::Backspace => { client.state_mut().input.pop(); }
            KeyCode::Char(c) => client.state_mut().input.push(c),
            _ => {}
        }
        return false;
    }
    let selected_id = client.state().nth(*selected).map(|r| r.id().clone());
    match code {
        KeyCode::Char('q') => return true,
        KeyCode::Up => { if *selected > 0 { *selected -= 1; } }
        KeyCode::Down => { if *selected + 1 < client.state().len() { *selected += 1; } }
        KeyCode::Char('n') => *mode = Mode::Compose,
        KeyCode::Char('e') => { if let Some(id) = selected_id { client.start_edit(&id); } }
        KeyCode::Char('d') => { if let Some(id) = selected_id { client.request_delete(&id); } }
        KeyCode::Char('r') => { let _ = client.load().await; }
        _ => {}
    }
    false
}

async fn run_app(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, mut app: App) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();
    app.load().await;

    loop {
        app.clamp_selection();
        terminal.draw(|f| draw(f, &mut app))?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                // Only act on key presses; ignore repeats and releases to prevent duplicate input
                if key.kind != KeyEventKind::Press { continue; }
                app.handle_key(key.code).await;
                if app.quit { break; }
            }
        }
        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
            if app.toast.as_ref().is_some_and(|t| t.shown_at.elapsed() >= TOAST_TTL) { app.toast = None; }
        }
    }
    Ok(())
}

fn record_items<R: Resource>(state: &ResourceList<R>, mark: impl Fn(&R) -> &'static str) -> Vec<ListItem<'static>> {
    let editing = state.editing();
    state
        .records()
        .map(|r| match editing {
            Some(edit) if &edit.id == r.id() => ListItem::new(format!("{} {}_", mark(r), edit.buffer)),
            _ => ListItem::new(format!("{} {}", mark(r), r.text())),
        })
        .collect()
}

fn footer_for<R: Resource>(state: &ResourceList<R>, mode: Mode) -> Option<(String, &'static str)> {
    if state.pending_delete().is_some() {
        return Some((format!("Are you sure you want to delete this {}? (y/n)", R::LABELS.item), "confirm"));
    }
    if let Some(edit) = state.editing() {
        return Some((format!("Edit: {}_  |  Enter/Tab to save, Esc to cancel", edit.buffer), "edit"));
    }
    if mode == Mode::Compose {
        return Some((format!("New {}: {}_  |  Enter to add, Esc to cancel", R::LABELS.item, state.input), "new"));
    }
    None
}

fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1), Constraint::Length(3)])
        .split(f.size());

    let header = Paragraph::new(format!(
        "Todos: {}  Feedback: {}  |  Tab: switch view, n: new, e: edit, d: delete, space: toggle, r: reload, q: quit",
        app.todos.state().len(),
        app.feedback.state().len()
    ))
    .block(Block::default().borders(Borders::ALL).title("taskflow"));
    f.render_widget(header, chunks[0]);

    let highlight = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD | Modifier::REVERSED);
    let footer = match app.view {
        View::Todos => {
            let items = record_items(app.todos.state(), |t: &Todo| if t.completed { "[x]" } else { "[ ]" });
            let empty = items.is_empty();
            let list = List::new(items).block(Block::default().borders(Borders::ALL).title("My Tasks")).highlight_style(highlight).highlight_symbol(">> ");
            if empty {
                f.render_widget(Paragraph::new("No tasks yet. Press n to add one!").block(Block::default().borders(Borders::ALL).title("My Tasks")), chunks[1]);
            } else {
                f.render_stateful_widget(list, chunks[1], &mut app.list_state);
            }
            footer_for(app.todos.state(), app.mode)
        }
        View::Feedback => {
            let items = record_items(app.feedback.state(), |_: &Feedback| "*");
            let empty = items.is_empty();
            let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Feedback Board")).highlight_style(highlight).highlight_symbol(">> ");
            if empty {
                f.render_widget(Paragraph::new("No feedback yet. Be the first!").block(Block::default().borders(Borders::ALL).title("Feedback Board")), chunks[1]);
            } else {
                f.render_stateful_widget(list, chunks[1], &mut app.list_state);
            }
            footer_for(app.feedback.state(), app.mode)
        }
        View::Assistant => {
            draw_assistant(f, app, chunks[1]);
            Some((format!("Ask: {}_  |  Enter to send (empty: ask highlighted question), Up/Down: pick question", app.chat_input), "assistant"))
        }
    };

    let (text, title, color) = match (footer, &app.toast) {
        (Some((text, title)), _) => (text, title, Color::Reset),
        (None, Some(Toast { notice, .. })) => match notice.level {
            NoticeLevel::Success => (notice.message.clone(), "ok", Color::Green),
            NoticeLevel::Failure => (notice.message.clone(), "error", Color::Red),
        },
        (None, None) => (format!("backend: {}", app.backend_url), "info", Color::Reset),
    };
    let footer = Paragraph::new(text)
        .style(Style::default().fg(color))
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(footer, chunks[2]);
}

fn draw_assistant(f: &mut Frame, app: &mut App, area: ratatui::layout::Rect) {
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let transcript = match &app.assistant {
        Some(assistant) if assistant.messages().is_empty() => "Hi! Ask me anything about TaskFlow.".to_string(),
        Some(assistant) => assistant
            .messages()
            .iter()
            .map(|m| format!("{}: {}", match m.sender { Sender::User => "you", Sender::Bot => "bot" }, m.text))
            .collect::<Vec<_>>()
            .join("\n\n"),
        None => "Assistant not configured. Set TASKFLOW_ASSISTANT_KEY to enable it.".to_string(),
    };
    let chat = Paragraph::new(transcript).wrap(Wrap { trim: true }).block(Block::default().borders(Borders::ALL).title("assistant"));
    f.render_widget(chat, panes[0]);

    let questions: Vec<ListItem> = FAQ.iter().map(|(q, _)| ListItem::new(*q)).collect();
    let mut faq_state = ListState::default();
    faq_state.select(Some(app.faq_selected));
    let faq = List::new(questions)
        .block(Block::default().borders(Borders::ALL).title("common questions"))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    f.render_stateful_widget(faq, panes[1], &mut faq_state);
}
