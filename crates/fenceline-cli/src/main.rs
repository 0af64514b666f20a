use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use fenceline_config::Config;
use fenceline_engine::{Engine, Node, RenderedBlock, RenderedLine, extract_blocks};
use fenceline_markers::Markers;
use fenceline_syntax::SyntaxHighlight;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use std::{
    env,
    io::stdout,
    path::{Path, PathBuf},
    process,
};

enum Content {
    None,
    Error(String),
    Blocks(Vec<RenderedBlock>),
}

struct App {
    config: Config,
    documents: Vec<PathBuf>,
    file_list_state: ListState,
    engine: Engine,
    content: Content,
    show_copy_text: bool,
}

impl App {
    fn new(config: Config) -> Result<Self> {
        let documents = config.discover_documents()?;
        log::info!(
            "found {} markdown documents under {}",
            documents.len(),
            config.docs_path.display()
        );

        let mut engine = Engine::new();
        engine.add_plugin(SyntaxHighlight::new());
        engine.add_plugin(Markers::new());

        let mut app = Self {
            config,
            documents,
            file_list_state: ListState::default(),
            engine,
            content: Content::None,
            show_copy_text: false,
        };

        // Select first document if available
        if !app.documents.is_empty() {
            app.file_list_state.select(Some(0));
        }

        Ok(app)
    }

    fn next_file(&mut self) {
        if self.documents.is_empty() {
            return;
        }
        let i = match self.file_list_state.selected() {
            Some(i) => (i + 1) % self.documents.len(),
            None => 0,
        };
        self.file_list_state.select(Some(i));
    }

    fn previous_file(&mut self) {
        if self.documents.is_empty() {
            return;
        }
        let i = match self.file_list_state.selected() {
            Some(i) => {
                if i == 0 {
                    self.documents.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.file_list_state.select(Some(i));
    }

    fn load_selected(&mut self) {
        let Some(path) = self
            .file_list_state
            .selected()
            .and_then(|index| self.documents.get(index))
            .cloned()
        else {
            return;
        };

        match self.render_document(&path) {
            Ok(blocks) => {
                log::info!("rendered {} code blocks from {}", blocks.len(), path.display());
                self.content = Content::Blocks(blocks);
            }
            Err(error) => {
                log::warn!("failed to render {}: {error:#}", path.display());
                self.content =
                    Content::Error(format!("Error rendering {}: {error:#}", path.display()));
            }
        }
    }

    fn render_document(&self, path: &Path) -> Result<Vec<RenderedBlock>> {
        let markdown = std::fs::read_to_string(path)?;
        let mut blocks = extract_blocks(&markdown);

        // Freshly extracted blocks are still fully editable
        if let Some(language) = self.config.default_language.as_deref() {
            for block in &mut blocks {
                if block.language().is_empty() {
                    block.set_language(language)?;
                }
            }
        }

        Ok(self.engine.render_group(&mut blocks)?)
    }
}

/// Terminal style for an output element, keyed on element name and class.
fn element_style(name: &str, attrs: &[(String, String)]) -> Style {
    let class = attrs
        .iter()
        .find(|(key, _)| key == "class")
        .map(|(_, value)| value.as_str());

    match (name, class) {
        ("span", Some("tok-comment")) => Style::default().fg(Color::DarkGray),
        ("span", Some("tok-string")) => Style::default().fg(Color::Green),
        ("span", Some("tok-number")) => Style::default().fg(Color::Magenta),
        ("span", Some("tok-keyword")) => {
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD)
        }
        ("mark", _) => Style::default().bg(Color::Yellow).fg(Color::Black),
        ("ins", _) => Style::default().bg(Color::Green).fg(Color::Black),
        ("del", _) => Style::default().bg(Color::Red).fg(Color::White),
        _ => Style::default(),
    }
}

/// Flatten an output node into styled spans; nested elements layer their
/// styles over the inherited one.
fn node_spans(node: &Node, style: Style, spans: &mut Vec<Span<'static>>) {
    match node {
        Node::Text(text) => {
            if !text.is_empty() {
                spans.push(Span::styled(text.clone(), style));
            }
        }
        Node::Element(element) => {
            let style = style.patch(element_style(&element.name, &element.attrs));
            for child in &element.children {
                node_spans(child, style, spans);
            }
        }
        Node::Group(children) | Node::Line(children) => {
            for child in children {
                node_spans(child, style, spans);
            }
        }
    }
}

fn styled_line(line: &RenderedLine) -> Line<'static> {
    // synthetic render-only lines (snip ellipses etc.) show dimmed
    let base = if line.source.is_none() {
        Style::default().add_modifier(Modifier::DIM)
    } else {
        Style::default()
    };

    let mut spans = Vec::new();
    node_spans(&line.node, base, &mut spans);
    if spans.is_empty() {
        spans.push(Span::raw(""));
    }
    Line::from(spans)
}

fn content_lines(app: &App) -> Vec<Line<'static>> {
    let fence_style = Style::default().fg(Color::DarkGray);

    match &app.content {
        Content::None => vec![Line::from(
            "Select a document and press Enter to render its code blocks",
        )],
        Content::Error(message) => vec![Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Red),
        ))],
        Content::Blocks(blocks) if blocks.is_empty() => {
            vec![Line::from("No fenced code blocks in this document")]
        }
        Content::Blocks(blocks) => {
            let mut lines = Vec::new();
            for (index, block) in blocks.iter().enumerate() {
                if index > 0 {
                    lines.push(Line::from(""));
                }

                let mut fence = format!("```{}", block.language);
                if !block.meta.is_empty() {
                    fence.push(' ');
                    fence.push_str(&block.meta);
                }
                lines.push(Line::from(Span::styled(fence, fence_style)));

                if app.show_copy_text {
                    for text in block.copy_text.lines() {
                        lines.push(Line::from(Span::raw(text.to_string())));
                    }
                } else {
                    for line in &block.lines {
                        lines.push(styled_line(line));
                    }
                }

                lines.push(Line::from(Span::styled("```".to_string(), fence_style)));
            }
            lines
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    // Determine docs path from CLI args or config file
    let args: Vec<String> = env::args().collect();
    let config_path = Config::default_config_path();

    let config = if args.len() == 2 {
        Config {
            docs_path: PathBuf::from(&args[1]),
            default_language: None,
        }
    } else if args.len() == 1 {
        match Config::load() {
            Ok(Some(config)) => {
                log::info!("loaded config from {}", config_path.display());
                config
            }
            Ok(None) => {
                eprintln!("Error: No docs path provided and no config file found");
                eprintln!("Usage: {} <docs-folder-path>", args[0]);
                eprintln!("Or create a config file at {}", config_path.display());
                process::exit(1);
            }
            Err(e) => {
                eprintln!("Error: Failed to load config file: {e}");
                eprintln!("Usage: {} <docs-folder-path>", args[0]);
                process::exit(1);
            }
        }
    } else {
        eprintln!("Usage: {} [docs-folder-path]", args[0]);
        process::exit(1);
    };

    // Fail before touching the terminal if the docs dir is unusable
    let mut app = match App::new(config) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => app.next_file(),
                KeyCode::Up | KeyCode::Char('k') => app.previous_file(),
                KeyCode::Enter | KeyCode::Char('l') => app.load_selected(),
                KeyCode::Char('c') => app.show_copy_text = !app.show_copy_text,
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .margin(1)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)].as_ref())
        .split(f.area());

    // Document list panel
    let items: Vec<ListItem> = app
        .documents
        .iter()
        .map(|path| {
            let name = path
                .strip_prefix(&app.config.docs_path)
                .unwrap_or(path)
                .display()
                .to_string();
            ListItem::new(vec![Line::from(vec![Span::raw(name)])])
        })
        .collect();

    let document_list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Documents"))
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));

    f.render_stateful_widget(document_list, chunks[0], &mut app.file_list_state);

    // Content panel
    let title = if app.show_copy_text { "Copy text" } else { "Blocks" };
    let content = Paragraph::new(content_lines(app))
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(ratatui::widgets::Wrap { trim: false });

    f.render_widget(content, chunks[1]);

    // Instructions
    let help_text = Line::from(vec![
        Span::raw("q: Quit | "),
        Span::raw("↑/k ↓/j: Select | "),
        Span::raw("Enter/l: Render | "),
        Span::raw("c: Toggle copy text"),
    ]);

    let help = Paragraph::new(vec![help_text]).block(Block::default());

    // Place help at bottom
    let bottom_chunk = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(f.area());

    f.render_widget(help, bottom_chunk[1]);
}
