//! TUI views and rendering
//!
//! Pure functions of the app state; nothing here mutates anything.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use tracing::trace;

use super::app::App;
use super::state::{AppState, FormField, Screen};
use crate::wizard::{ChatRole, SessionState, Step};

mod colors {
    use ratatui::style::Color;

    pub const HEADER: Color = Color::Rgb(0, 255, 255); // Cyan
    pub const KEYBIND: Color = Color::Rgb(0, 255, 255); // Cyan
    pub const STEP: Color = Color::Rgb(255, 215, 0); // Gold
    pub const DIM: Color = Color::DarkGray;
    pub const USER: Color = Color::Rgb(0, 255, 127); // Green
    pub const ERROR: Color = Color::Rgb(220, 20, 60); // Crimson
    pub const FOCUS: Color = Color::Rgb(255, 255, 0); // Yellow
}

/// Main render function
pub fn render(app: &App, frame: &mut Frame) {
    let state = app.state();
    if let Screen::Setup { problem, instructions } = &state.screen {
        let area = frame.area();
        render_setup(problem, instructions, frame, area);
        return;
    }

    let session = app.wizard().state();
    let show_input = session.step() == Step::Clarifying || state.editing_refinement;

    let mut constraints = vec![Constraint::Length(3), Constraint::Min(0)];
    if show_input {
        constraints.push(Constraint::Length(3));
    }
    constraints.push(Constraint::Length(3));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(frame.area());

    render_header(state, session, frame, chunks[0]);
    match session.step() {
        Step::Initial => render_form(state, frame, chunks[1]),
        Step::Final if session.final_document().is_some() => render_final(state, session, frame, chunks[1]),
        _ => render_conversation(state, session, frame, chunks[1]),
    }
    if show_input {
        render_input(state, session, frame, chunks[2]);
    }
    render_footer(state, session, frame, chunks[chunks.len() - 1]);
}

fn render_header(state: &AppState, session: &SessionState, frame: &mut Frame, area: Rect) {
    let mut spans = vec![
        Span::styled(
            "Project Forge ",
            Style::default().fg(colors::HEADER).add_modifier(Modifier::BOLD),
        ),
        Span::raw("│ "),
        Span::styled(step_title(session.step()), Style::default().fg(colors::STEP)),
    ];
    if session.step() == Step::Clarifying {
        spans.push(Span::styled(
            format!(" ({} follow-ups)", session.clarification_rounds()),
            Style::default().fg(colors::DIM),
        ));
    }
    if !state.model.is_empty() {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(state.model.clone(), Style::default().fg(colors::DIM)));
    }

    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn step_title(step: Step) -> &'static str {
    match step {
        Step::Initial => "Describe your project",
        Step::Clarifying => "A few questions",
        Step::Suggesting => "Project suggestion",
        Step::Refining => "Refining",
        Step::Final => "Final proposal",
    }
}

fn render_setup(problem: &str, instructions: &[String], frame: &mut Frame, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled(
            "Configuration Required",
            Style::default().fg(colors::ERROR).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(problem.to_string()),
        Line::default(),
    ];
    for (i, step) in instructions.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!("{}. ", i + 1), Style::default().fg(colors::KEYBIND)),
            Span::raw(step.clone()),
        ]));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Press q to exit, then restart pf.",
        Style::default().fg(colors::DIM),
    )));

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(" Project Forge "));
    frame.render_widget(paragraph, area);
}

fn render_form(state: &AppState, frame: &mut Frame, area: Rect) {
    let mut lines = Vec::new();
    for field in FormField::ALL {
        let focused = state.form.focus == field;
        let label_style = if focused {
            Style::default().fg(colors::FOCUS).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        lines.push(Line::from(Span::styled(field.label(), label_style)));

        let value = state.form.value(field);
        let value_line = match field {
            FormField::Level => Line::from(vec![
                Span::styled("‹ ", Style::default().fg(colors::DIM)),
                Span::raw(value),
                Span::styled(" ›", Style::default().fg(colors::DIM)),
            ]),
            _ if focused => Line::from(vec![Span::raw(value), Span::styled("█", Style::default().fg(colors::FOCUS))]),
            _ => Line::from(value),
        };
        lines.push(value_line);
        lines.push(Line::default());
    }

    let form = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(" New project "));
    frame.render_widget(form, area);
}

/// Conversation lines: chat bubbles in order, then the spinner
fn conversation_lines<'a>(state: &AppState, session: &'a SessionState) -> Vec<Line<'a>> {
    let mut lines: Vec<Line> = Vec::new();
    for msg in session.messages() {
        match msg.role {
            ChatRole::User => {
                for (i, content_line) in msg.text.lines().enumerate() {
                    let prefix = if i == 0 { "> " } else { "  " };
                    lines.push(Line::from(vec![
                        Span::styled(prefix, Style::default().fg(colors::USER).add_modifier(Modifier::BOLD)),
                        Span::styled(content_line, Style::default().fg(colors::USER)),
                    ]));
                }
            }
            ChatRole::Assistant => {
                let markdown_text = tui_markdown::from_str(&msg.text);
                for line in markdown_text.lines.iter() {
                    let mut spans = vec![Span::raw("  ")];
                    spans.extend(line.spans.iter().cloned());
                    lines.push(Line::from(spans));
                }
            }
            ChatRole::Status => {
                lines.push(Line::from(Span::styled(
                    msg.text.as_str(),
                    Style::default().fg(colors::DIM).add_modifier(Modifier::ITALIC),
                )));
            }
        }
        lines.push(Line::default());
    }

    if session.loading() {
        lines.push(Line::from(vec![
            Span::styled(state.spinner_frame(), Style::default().fg(colors::STEP)),
            Span::styled(" Thinking...", Style::default().fg(colors::DIM)),
        ]));
    }
    lines
}

/// Rows `lines` take when wrapped to `width`
fn wrapped_height(lines: &[Line], width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let rows: usize = lines.iter().map(|l| l.width().max(1).div_ceil(width)).sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}

/// Scroll offset that keeps the bottom visible, minus what the user scrolled back
fn bottom_scroll(content_height: u16, view_height: u16, scroll_back: u16) -> u16 {
    content_height.saturating_sub(view_height).saturating_sub(scroll_back)
}

fn render_conversation(state: &AppState, session: &SessionState, frame: &mut Frame, area: Rect) {
    trace!(messages = session.messages().len(), "render_conversation: called");
    let lines = conversation_lines(state, session);
    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);
    let offset = bottom_scroll(wrapped_height(&lines, inner_width), inner_height, state.scroll_back);

    let title = match session.step() {
        Step::Suggesting if session.suggestion_draft().is_some() => " Conversation · suggestion ready ",
        _ => " Conversation ",
    };
    let paragraph = Paragraph::new(Text::from(lines))
        .wrap(Wrap { trim: false })
        .scroll((offset, 0))
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(paragraph, area);
}

fn render_final(state: &AppState, session: &SessionState, frame: &mut Frame, area: Rect) {
    let document = session.final_document().unwrap_or_default();
    let text = tui_markdown::from_str(document);
    let inner_width = area.width.saturating_sub(2);
    let content_height = wrapped_height(&text.lines, inner_width);
    let max_offset = content_height.saturating_sub(area.height.saturating_sub(2));
    let offset = state.doc_scroll.min(max_offset);

    let paragraph = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .scroll((offset, 0))
        .block(Block::default().borders(Borders::ALL).title(" Project Proposal "));
    frame.render_widget(paragraph, area);
}

fn render_input(state: &AppState, session: &SessionState, frame: &mut Frame, area: Rect) {
    let title = if session.step() == Step::Clarifying {
        " Your answer "
    } else {
        " Change request "
    };
    let input = Paragraph::new(Line::from(vec![
        Span::styled("> ", Style::default().fg(colors::USER)),
        Span::raw(state.input.as_str()),
        Span::styled("█", Style::default().fg(colors::FOCUS)),
    ]))
    .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(input, area);
}

/// Key hints for the current step
fn key_hints(state: &AppState, session: &SessionState) -> Vec<(&'static str, &'static str)> {
    if session.loading() {
        return vec![("Ctrl+N", "start over"), ("Ctrl+C", "quit")];
    }
    match session.step() {
        Step::Initial => vec![("Tab", "next field"), ("←/→", "level"), ("Enter", "start"), ("Esc", "quit")],
        Step::Clarifying => vec![("Enter", "send"), ("PgUp/PgDn", "scroll"), ("Ctrl+N", "start over")],
        Step::Suggesting if state.editing_refinement => vec![("Enter", "send"), ("Esc", "cancel")],
        Step::Suggesting => vec![("a", "approve"), ("r", "refine"), ("s", "start over"), ("q", "quit")],
        Step::Refining => vec![("Ctrl+N", "start over")],
        Step::Final => vec![
            ("t", "save .txt"),
            ("j", "save .json"),
            ("h", "save .html"),
            ("s", "start over"),
            ("q", "quit"),
        ],
    }
}

fn render_footer(state: &AppState, session: &SessionState, frame: &mut Frame, area: Rect) {
    let line = if let Some(error) = session.last_error() {
        Line::from(Span::styled(error, Style::default().fg(colors::ERROR)))
    } else if let Some(notice) = &state.notice {
        Line::from(Span::raw(notice.as_str()))
    } else {
        let mut spans = Vec::new();
        for (key, action) in key_hints(state, session) {
            spans.push(Span::styled(key, Style::default().fg(colors::KEYBIND)));
            spans.push(Span::raw(format!(" {}  ", action)));
        }
        Line::from(spans)
    };

    let footer = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::MockLlmClient;
    use crate::wizard::{ExperienceLevel, ProjectInput, Wizard};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::path::PathBuf;

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_bottom_scroll() {
        assert_eq!(bottom_scroll(10, 20, 0), 0);
        assert_eq!(bottom_scroll(50, 20, 0), 30);
        assert_eq!(bottom_scroll(50, 20, 5), 25);
        assert_eq!(bottom_scroll(50, 20, 100), 0);
    }

    #[test]
    fn test_wrapped_height() {
        let lines = vec![Line::from("x".repeat(25)), Line::default()];
        assert_eq!(wrapped_height(&lines, 10), 4);
    }

    #[test]
    fn test_render_form() {
        let app = App::new(AppState::new("gemini-2.5-flash"), Wizard::default(), PathBuf::from("."));
        let screen = draw(&app);
        assert!(screen.contains("Project Forge"));
        assert!(screen.contains("Skills to Learn"));
        assert!(screen.contains("Beginner"));
        assert!(screen.contains("gemini-2.5-flash"));
    }

    #[test]
    fn test_render_setup() {
        let app = App::new(
            AppState::setup("GEMINI_API_KEY is not set", vec!["export GEMINI_API_KEY=<key>".to_string()]),
            Wizard::default(),
            PathBuf::from("."),
        );
        let screen = draw(&app);
        assert!(screen.contains("Configuration Required"));
        assert!(screen.contains("GEMINI_API_KEY is not set"));
    }

    #[tokio::test]
    async fn test_render_conversation_and_error() {
        let client = MockLlmClient::scripted(vec![Ok("Which platform?".to_string()), Err("down".to_string())]);
        let mut wizard = Wizard::default();
        wizard
            .submit(ProjectInput::new("Recipe App", "React", ExperienceLevel::Beginner), &client)
            .await
            .unwrap();
        let _ = wizard.answer("Web", &client).await;

        let app = App::new(AppState::new("mock"), wizard, PathBuf::from("."));
        let screen = draw(&app);
        assert!(screen.contains("Which platform?"));
        assert!(screen.contains("Failed to get clarification"));
        assert!(screen.contains("Your answer"));
    }
}
