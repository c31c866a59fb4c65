use chrono::Local;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Padding, Paragraph},
};

use unicode_width::UnicodeWidthChar;

use crate::app::{App, TAB_WIDTH};
use crate::message::{Message, Role};
use crate::preferences::Theme;

const ASSISTANT_NAME: &str = "SmartSpark";
const ASSISTANT_ICON: &str = "✨";
const WELCOME_TITLE: &str = "Welcome to SmartSpark!";
const WELCOME_SUBTITLE: &str = "Your intelligent AI assistant is ready to help. Ask me anything!";
const INPUT_PLACEHOLDER: &str = "Type your message here...";
const MAX_INPUT_ROWS: u16 = 5;

/// Colour set for one theme
struct Palette {
    bg: Color,
    fg: Color,
    muted: Color,
    surface: Color,
    border: Color,
    user: Color,
    assistant: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                bg: Color::Rgb(249, 250, 251),
                fg: Color::Rgb(17, 24, 39),
                muted: Color::Rgb(107, 114, 128),
                surface: Color::Rgb(229, 231, 235),
                border: Color::Rgb(209, 213, 219),
                user: Color::Rgb(37, 99, 235),
                assistant: Color::Rgb(147, 51, 234),
            },
            Theme::Dark => Self {
                bg: Color::Rgb(17, 24, 39),
                fg: Color::Rgb(243, 244, 246),
                muted: Color::Rgb(156, 163, 175),
                surface: Color::Rgb(55, 65, 81),
                border: Color::Rgb(55, 65, 81),
                user: Color::Rgb(96, 165, 250),
                assistant: Color::Rgb(192, 132, 252),
            },
        }
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let palette = Palette::for_theme(app.theme);

    frame.render_widget(Block::default().style(Style::default().bg(palette.bg).fg(palette.fg)), area);

    let input_rows = (app.input.split('\n').count() as u16).clamp(1, MAX_INPUT_ROWS);

    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(input_rows + 2),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, &palette, frame, header_area);
    render_chat(app, &palette, frame, chat_area);
    render_input(app, &palette, frame, input_area);
    render_footer(app, &palette, frame, footer_area);
}

fn render_header(app: &App, palette: &Palette, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(
            format!(" {} {} ", ASSISTANT_ICON, ASSISTANT_NAME),
            Style::default().fg(palette.assistant).bold(),
        ),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(palette.muted),
        ),
    ]);

    let theme_indicator = match app.theme {
        Theme::Dark => "☾ dark",
        Theme::Light => "☀ light",
    };
    let mut status = Vec::new();
    if let Some(id) = &app.conversation_id {
        let short: String = id.chars().take(8).collect();
        status.push(Span::styled(format!("#{} ", short), Style::default().fg(palette.muted)));
    }
    status.push(Span::styled(format!("{} ", theme_indicator), Style::default().fg(palette.fg)));

    let style = Style::default().bg(palette.surface);
    frame.render_widget(Paragraph::new(title).style(style), area);
    frame.render_widget(
        Paragraph::new(Line::from(status)).alignment(Alignment::Right),
        area,
    );
}

fn render_chat(app: &mut App, palette: &Palette, frame: &mut Frame, area: Rect) {
    let block = Block::default().padding(Padding::new(2, 2, 1, 0));
    let inner = block.inner(area);

    let mut lines = if app.messages.is_empty() && !app.loading {
        welcome_lines(palette, inner.height)
    } else {
        transcript_lines(app, palette, inner.width as usize)
    };

    // Scroll offsets are u16; beyond that only the newest rows stay reachable
    let overflow = lines.len().saturating_sub(u16::MAX as usize);
    lines.drain(..overflow);
    let total_rows = u16::try_from(lines.len()).unwrap_or(u16::MAX);

    app.update_chat_viewport(total_rows, inner.height);

    let chat = Paragraph::new(Text::from(lines))
        .block(block)
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn welcome_lines(palette: &Palette, height: u16) -> Vec<Line<'static>> {
    let top_padding = height.saturating_sub(4) / 2;
    let mut lines: Vec<Line> = (0..top_padding).map(|_| Line::default()).collect();

    lines.push(Line::from(Span::styled(ASSISTANT_ICON, Style::default().fg(palette.assistant))).centered());
    lines.push(Line::from(Span::styled(
        WELCOME_TITLE,
        Style::default().fg(palette.fg).add_modifier(Modifier::BOLD),
    )).centered());
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(WELCOME_SUBTITLE, Style::default().fg(palette.muted))).centered());

    lines
}

/// Every row of the conversation pane, already wrapped to `width`
fn transcript_lines(app: &App, palette: &Palette, width: usize) -> Vec<Line<'static>> {
    // Bubbles take at most four fifths of the pane
    let bubble_width = (width * 4 / 5).max(10).min(width.max(1));
    let mut lines: Vec<Line> = Vec::new();

    for msg in &app.messages {
        match msg.role {
            Role::User => push_user_message(&mut lines, msg, palette, bubble_width),
            Role::Assistant => push_assistant_message(&mut lines, msg, palette, bubble_width),
        }
        lines.push(Line::default());
    }

    if app.loading {
        lines.push(assistant_header(palette, None));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(vec![
            Span::styled("│ ", Style::default().fg(palette.assistant)),
            Span::styled(
                format!("{} is thinking{}", ASSISTANT_NAME, dots),
                Style::default().fg(palette.muted).add_modifier(Modifier::ITALIC),
            ),
        ]));
    }

    lines
}

fn push_user_message(lines: &mut Vec<Line<'static>>, msg: &Message, palette: &Palette, width: usize) {
    lines.push(
        Line::from(Span::styled(
            format!("You · {}", local_time(msg)),
            Style::default().fg(palette.user).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Right),
    );

    for row in wrap_text(&msg.content, width) {
        lines.push(
            Line::from(Span::styled(row, Style::default().fg(palette.user)))
                .alignment(Alignment::Right),
        );
    }
}

fn push_assistant_message(lines: &mut Vec<Line<'static>>, msg: &Message, palette: &Palette, width: usize) {
    lines.push(assistant_header(palette, Some(msg)));

    let gutter = Style::default().fg(palette.assistant);
    for row in wrap_text(&msg.content, width.saturating_sub(2)) {
        lines.push(Line::from(vec![
            Span::styled("│ ", gutter),
            Span::styled(row, Style::default().fg(palette.fg)),
        ]));
    }
}

fn assistant_header(palette: &Palette, msg: Option<&Message>) -> Line<'static> {
    let label = match msg {
        Some(msg) => format!("{} {} · {}", ASSISTANT_ICON, ASSISTANT_NAME, local_time(msg)),
        None => format!("{} {}", ASSISTANT_ICON, ASSISTANT_NAME),
    };
    Line::from(Span::styled(
        label,
        Style::default().fg(palette.assistant).add_modifier(Modifier::BOLD),
    ))
}

fn local_time(msg: &Message) -> String {
    msg.timestamp.with_timezone(&Local).format("%H:%M").to_string()
}

fn char_width(c: char) -> usize {
    c.width().unwrap_or(0)
}

/// Wrap text into rows at most `width` terminal columns wide, keeping every
/// space and blank line. Breaks after whitespace where possible.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();

    for line in text.split('\n') {
        let line = line.trim_end_matches('\r').replace('\t', &" ".repeat(TAB_WIDTH));
        let mut current: Vec<char> = Vec::new();
        let mut current_width = 0;

        for c in line.chars() {
            let w = char_width(c);

            while current_width + w > width && !current.is_empty() {
                let split = current
                    .iter()
                    .rposition(|ch| ch.is_whitespace())
                    .map(|i| i + 1)
                    .filter(|&i| i < current.len());
                let rest = match split {
                    Some(i) => current.split_off(i),
                    None => Vec::new(),
                };
                rows.push(current.into_iter().collect());
                current_width = rest.iter().map(|&ch| char_width(ch)).sum();
                current = rest;
            }

            current.push(c);
            current_width += w;
        }
        rows.push(current.into_iter().collect());
    }

    rows
}

fn render_input(app: &App, palette: &Palette, frame: &mut Frame, area: Rect) {
    let border_color = if app.loading { palette.border } else { palette.user };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message ");

    let inner = input_block.inner(area);
    let (cursor_row, cursor_col) = app.input_cursor_position();

    // Keep the cursor visible in both directions
    let row_offset = cursor_row.saturating_sub(inner.height.max(1) as usize - 1);
    let inner_width = inner.width as usize;
    let col_offset = if inner_width == 0 {
        0
    } else if cursor_col >= inner_width {
        cursor_col - inner_width + 1
    } else {
        0
    };

    let input = if app.input.is_empty() {
        Paragraph::new(Span::styled(INPUT_PLACEHOLDER, Style::default().fg(palette.muted)))
    } else {
        Paragraph::new(app.input.as_str())
            .style(Style::default().fg(palette.fg))
            .scroll((row_offset as u16, col_offset as u16))
    };

    frame.render_widget(input.block(input_block), area);

    if inner.width > 0 && inner.height > 0 {
        frame.set_cursor_position((
            inner.x + (cursor_col - col_offset) as u16,
            inner.y + (cursor_row - row_offset) as u16,
        ));
    }
}

fn render_footer(app: &App, palette: &Palette, frame: &mut Frame, area: Rect) {
    let send_button = if app.loading {
        Span::styled(" Sending... ", Style::default().bg(palette.surface).fg(palette.muted))
    } else if app.can_send() {
        Span::styled(
            " Send ",
            Style::default().bg(palette.user).fg(Color::White).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(" Send ", Style::default().bg(palette.surface).fg(palette.muted))
    };

    let key_style = Style::default().bg(palette.surface).fg(palette.fg);
    let label_style = Style::default().fg(palette.muted);

    let hints = vec![
        Span::styled(" Enter ", key_style),
        Span::styled(" send ", label_style),
        Span::styled(" Shift+Enter ", key_style),
        Span::styled(" newline ", label_style),
        Span::styled(" Ctrl+N ", key_style),
        Span::styled(" new chat ", label_style),
        Span::styled(" Ctrl+T ", key_style),
        Span::styled(" theme ", label_style),
        Span::styled(" Ctrl+C ", key_style),
        Span::styled(" quit ", label_style),
    ];

    let footer_content = Line::from(
        vec![send_button, Span::raw(" ")]
            .into_iter()
            .chain(hints)
            .collect::<Vec<_>>(),
    );

    frame.render_widget(Paragraph::new(footer_content), area);
}
