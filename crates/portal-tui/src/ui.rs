use ratatui::{
    Frame,
    layout::{Constraint, Layout, Margin, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Wrap,
    },
};
use portal_core::{ChatRole, Project, QUICK_ACTIONS};
use crate::app::{chat_line_count, App, FocusPane, InputMode, ProfileState};

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            chars.next();

            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;
            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next();
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            current_text.push(c);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    Line::from(spans)
}

fn status_style(project: &Project) -> Style {
    if project.is_scheduled() {
        Style::default().fg(Color::Black).bg(Color::Green)
    } else {
        Style::default().fg(Color::Black).bg(Color::Yellow)
    }
}

fn border_style(focused: bool) -> Style {
    Style::default().fg(if focused { Color::Cyan } else { Color::DarkGray })
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    // Projects and quick actions on the left, chat on the right
    let [side_area, chat_column] = Layout::horizontal([
        Constraint::Percentage(33),
        Constraint::Percentage(67),
    ])
    .areas(body_area);

    let [projects_area, actions_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(QUICK_ACTIONS.len() as u16 + 2),
    ])
    .areas(side_area);

    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(chat_column);

    app.projects_area = Some(projects_area);
    app.chat_area = Some(chat_area);

    render_projects(app, frame, projects_area);
    render_quick_actions(app, frame, actions_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = vec![
        Span::styled(" Property Management Portal ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ];

    if let Some(user) = app.user() {
        spans.extend([
            Span::raw("  "),
            Span::styled(user.name.clone(), Style::default().fg(Color::White).bold()),
            Span::raw(" "),
            Span::styled(user.identity_line(), Style::default().fg(Color::Gray)),
        ]);
    }

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_projects(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app.focus == FocusPane::Projects))
        .title(" My Projects ");

    let user = match &app.profile {
        ProfileState::Loaded(user) if !user.projects.is_empty() => user,
        state => {
            let message = match state {
                ProfileState::Loading => "Loading projects...",
                ProfileState::Loaded(_) => "No projects yet.",
                ProfileState::Unavailable => "Projects unavailable.\nThe assistant still works.",
            };
            let placeholder = Paragraph::new(message)
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            frame.render_widget(placeholder, area);
            return;
        }
    };

    let selected_project = app.selected_project;
    let items: Vec<ListItem> = user
        .projects
        .iter()
        .enumerate()
        .map(|(idx, project)| {
            let marker = if selected_project == Some(idx) { "* " } else { "" };
            let mut lines = vec![
                Line::from(vec![
                    Span::styled(
                        format!("{}{}", marker, project.category),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(" "),
                    Span::styled(format!(" {} ", project.status), status_style(project)),
                ]),
                Line::from(Span::styled(
                    project.number.clone(),
                    Style::default().fg(Color::Gray),
                )),
                Line::from(project.address.clone()),
            ];
            if let Some((date, time)) = project.schedule() {
                lines.push(Line::from(Span::styled(
                    format!("Date: {}  {}", date, time),
                    Style::default().fg(Color::Gray),
                )));
            }
            lines.push(Line::from(Span::styled(
                format!("Tech: {}", project.technician),
                Style::default().fg(Color::Gray),
            )));
            lines.push(Line::default());

            let style = if selected_project == Some(idx) {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            };
            ListItem::new(lines).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.project_state);
}

fn render_quick_actions(app: &App, frame: &mut Frame, area: Rect) {
    let busy = app.is_busy();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(false))
        .title(" Quick Actions ");

    let key_style = if busy {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Yellow).bold()
    };
    let text_style = if busy {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    let lines: Vec<Line> = QUICK_ACTIONS
        .iter()
        .enumerate()
        .map(|(i, query)| {
            Line::from(vec![
                Span::styled(format!("{} ", i + 1), key_style),
                Span::styled(*query, text_style),
            ])
        })
        .collect();

    let actions = Paragraph::new(lines).block(block);
    frame.render_widget(actions, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app.focus == FocusPane::Chat))
        .title(" AI Assistant ");

    // Store chat area dimensions for scroll calculations
    let inner = block.inner(area);
    app.chat_height = inner.height;
    app.chat_width = inner.width;

    let messages = app.messages();
    let busy = app.is_busy();

    let mut lines: Vec<Line> = Vec::new();
    for msg in &messages {
        let label_style = match msg.role {
            ChatRole::User => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ChatRole::Assistant => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        };
        lines.push(Line::from(vec![
            Span::styled(msg.role.label(), label_style),
            Span::raw("  "),
            Span::styled(msg.local_time(), Style::default().fg(Color::DarkGray)),
        ]));

        // One rendered line per source line so blank lines survive
        for line in msg.content.lines() {
            match msg.role {
                ChatRole::User => lines.push(Line::from(line.to_string())),
                ChatRole::Assistant => lines.push(parse_markdown_line(line)),
            }
        }
        lines.push(Line::default());
    }

    if busy {
        lines.push(Line::from(Span::styled(
            ChatRole::Assistant.label(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let total_lines = chat_line_count(&messages, busy, inner.width as usize);
    let max_scroll = total_lines.saturating_sub(inner.height);
    if app.follow_chat || app.chat_scroll > max_scroll {
        app.chat_scroll = max_scroll;
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);

    if total_lines > inner.height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));

        let mut scrollbar_state = ScrollbarState::new(max_scroll as usize)
            .position(app.chat_scroll as usize);

        frame.render_stateful_widget(
            scrollbar,
            area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let busy = app.is_busy();
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if busy {
        Color::DarkGray
    } else if editing || app.focus == FocusPane::Input {
        Color::Yellow
    } else {
        Color::DarkGray
    };

    let title = if busy { " Sending... " } else { " Ask about your projects, scheduling or availability " };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scrolling keeps the cursor inside the box
    let input = app.input();
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = input.chars().skip(scroll_offset).take(inner_width).collect();
    let text_style = if busy {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Cyan)
    };

    let paragraph = Paragraph::new(visible_text).style(text_style).block(block);
    frame.render_widget(paragraph, area);

    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" INSERT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints: Vec<(&str, &str)> = match app.input_mode {
        InputMode::Editing => vec![(" Enter ", " send "), (" Esc ", " stop typing ")],
        InputMode::Normal => {
            let mut hints = vec![(" Tab ", " focus ")];
            match app.focus {
                FocusPane::Projects => hints.extend([(" j/k ", " nav "), (" Enter ", " select ")]),
                FocusPane::Chat => hints.extend([(" j/k ", " scroll "), (" g/G ", " top/bottom ")]),
                FocusPane::Input => hints.push((" i ", " type ")),
            }
            hints.extend([(" 1-5 ", " quick action "), (" q ", " quit ")]);
            hints
        }
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints.into_iter().flat_map(|(key, label)| {
            [Span::styled(key, key_style), Span::styled(label, label_style)]
        }))
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span_texts(line: &Line) -> Vec<String> {
        line.spans.iter().map(|s| s.content.to_string()).collect()
    }

    #[test]
    fn test_markdown_bold() {
        let line = parse_markdown_line("Project **12345** is scheduled");
        assert_eq!(span_texts(&line), vec!["Project ", "12345", " is scheduled"]);
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_markdown_unclosed_bold_is_literal() {
        let line = parse_markdown_line("a **b");
        assert_eq!(span_texts(&line).concat(), "a **b");
    }

    #[test]
    fn test_markdown_single_star_is_literal() {
        let line = parse_markdown_line("* bullet");
        assert_eq!(span_texts(&line).concat(), "* bullet");
    }
}
