use ratatui::{
    layout::{Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, InputMode, RequestState};
use crate::markdown::{normalize, render_markdown};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // The input box grows with the prompt, up to five rows
    let prompt_rows = (app.prompt_input.split('\n').count() as u16).clamp(1, 5);

    // Main layout: header, prompt input, response, footer
    let [header_area, input_area, response_area, footer_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(prompt_rows + 2),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);
    render_input(app, frame, input_area);
    render_response(app, frame, response_area);
    render_footer(app, frame, footer_area);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let header = Paragraph::new(vec![
        Line::from(Span::styled(
            " gembot ",
            Style::default().fg(Color::Cyan).bold(),
        )),
        Line::from(Span::styled(
            " Prompt the Gemini API from your terminal",
            Style::default().fg(Color::DarkGray),
        )),
    ]);
    frame.render_widget(header, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Prompt ");

    let inner_width = area.width.saturating_sub(2) as usize;
    let inner_height = area.height.saturating_sub(2) as usize;

    let lines: Vec<&str> = app.prompt_input.split('\n').collect();

    // Locate the cursor's row and column in character terms
    let mut remaining = app.prompt_cursor;
    let mut cursor_row = lines.len().saturating_sub(1);
    let mut cursor_col = 0;
    for (i, line) in lines.iter().enumerate() {
        let chars = line.chars().count();
        if remaining <= chars {
            cursor_row = i;
            cursor_col = remaining;
            break;
        }
        remaining -= chars + 1; // the newline itself
    }

    // Scroll vertically and horizontally to keep the cursor visible
    let top = cursor_row.saturating_sub(inner_height.saturating_sub(1));
    let col_offset = if inner_width > 1 {
        cursor_col.saturating_sub(inner_width - 1)
    } else {
        cursor_col
    };

    let visible: Vec<Line> = lines
        .iter()
        .skip(top)
        .take(inner_height.max(1))
        .map(|line| {
            Line::from(
                line.chars()
                    .skip(col_offset)
                    .take(inner_width)
                    .collect::<String>(),
            )
        })
        .collect();

    let input = Paragraph::new(visible).block(input_block);
    frame.render_widget(input, area);

    if editing {
        let prefix: String = lines
            .get(cursor_row)
            .map(|line| {
                line.chars()
                    .skip(col_offset)
                    .take(cursor_col - col_offset)
                    .collect()
            })
            .unwrap_or_default();
        let cursor_x = area.x + 1 + prefix.width() as u16;
        let cursor_y = area.y + 1 + (cursor_row - top) as u16;
        frame.set_cursor_position(Position::new(cursor_x, cursor_y));
    }
}

fn render_response(app: &mut App, frame: &mut Frame, area: Rect) {
    let response_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Response ");

    // The document is recomputed from the answer text on every draw; the
    // displayed text is a pure function of the request state.
    let text = match &app.request_state {
        RequestState::Idle => Text::from(Span::styled(
            "Enter a prompt and press Enter to generate a response.",
            Style::default().fg(Color::DarkGray),
        )),
        RequestState::Generating => {
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            Text::from(Span::styled(
                format!("Generating{}", dots),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            ))
        }
        RequestState::Succeeded(answer) => Text::from(render_markdown(&normalize(answer))),
        RequestState::Failed(message) => Text::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
    };

    // Track viewport metrics for scroll clamping
    app.response_height = area.height.saturating_sub(2);
    app.total_response_lines =
        estimated_display_rows(&text.lines, area.width.saturating_sub(2) as usize);

    let response = Paragraph::new(text)
        .block(response_block)
        .wrap(Wrap { trim: false })
        .scroll((app.response_scroll, 0));

    frame.render_widget(response, area);
}

/// Estimates how many display rows the text occupies after wrapping, so
/// scrolling can reach the end of long answers.
fn estimated_display_rows(lines: &[Line], width: usize) -> u16 {
    if width == 0 {
        return lines.len() as u16;
    }
    lines
        .iter()
        .map(|line| {
            let line_width: usize = line.spans.iter().map(|s| s.content.as_ref().width()).sum();
            (line_width / width + 1) as u16
        })
        .sum()
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().fg(Color::Black).bg(Color::DarkGray);
    let label_style = Style::default().fg(Color::DarkGray);

    let spans = match app.input_mode {
        InputMode::Editing => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" generate ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" scroll mode ", label_style),
            Span::styled(" Ctrl-C ", key_style),
            Span::styled(" quit ", label_style),
        ],
        InputMode::Normal => vec![
            Span::styled(" i ", key_style),
            Span::styled(" edit ", label_style),
            Span::styled(" Enter ", key_style),
            Span::styled(" generate ", label_style),
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
    };

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
