use crate::app::App;
use city_poster::Stage;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph, Widget},
    Frame,
};

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(6),    // Preview + history
            Constraint::Length(3), // Gauge
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(30)])
        .split(rows[0]);

    render_preview(frame, app, columns[0]);
    render_history(frame, app, columns[1]);
    render_gauge(frame, app, rows[1]);
    render_status_bar(frame, app, rows[2]);
}

fn render_preview(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" {} ", app.request.city),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if let Some(stage) = app.stage() {
        frame.render_widget(PreviewWidget { stage }, inner);
    }
}

/// Downsampled view of the stage surface, two pixels per cell using
/// upper-half blocks
struct PreviewWidget<'s> {
    stage: &'s Stage,
}

impl PreviewWidget<'_> {
    /// Largest cell rect inside `area` that keeps the poster aspect ratio
    fn fit(&self, area: Rect) -> Rect {
        let aspect = self.stage.width() as f32 / self.stage.height() as f32;
        // each cell covers one horizontal and two vertical pixels
        let max_w = area.width as f32;
        let max_h = area.height as f32 * 2.0;
        let (w, h) = if max_w / max_h > aspect {
            (max_h * aspect, max_h)
        } else {
            (max_w, max_w / aspect)
        };
        let cols = (w as u16).max(1).min(area.width);
        let rows = ((h / 2.0) as u16).max(1).min(area.height);
        Rect {
            x: area.x + (area.width - cols) / 2,
            y: area.y + (area.height - rows) / 2,
            width: cols,
            height: rows,
        }
    }
}

impl Widget for PreviewWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Ok(surface) = self.stage.surface() else {
            return;
        };
        if area.width == 0 || area.height == 0 {
            return;
        }
        let target = self.fit(area);
        let sample = |col: u16, sub_row: u32| -> Color {
            let x = col as u32 * surface.width() / target.width as u32;
            let y = sub_row * surface.height() / (target.height as u32 * 2);
            surface
                .pixel(x.min(surface.width() - 1), y.min(surface.height() - 1))
                .map(|p| {
                    let c = p.demultiply();
                    Color::Rgb(c.red(), c.green(), c.blue())
                })
                .unwrap_or(Color::Reset)
        };

        for row in 0..target.height {
            for col in 0..target.width {
                let top = sample(col, row as u32 * 2);
                let bottom = sample(col, row as u32 * 2 + 1);
                buf[(target.x + col, target.y + row)]
                    .set_char('▀')
                    .set_fg(top)
                    .set_bg(bottom);
            }
        }
    }
}

fn render_history(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .history
        .iter()
        .rev()
        .take(area.height.saturating_sub(2) as usize)
        .map(|p| {
            let color = match p.stage {
                "Done" => Color::Green,
                "Error" => Color::Red,
                _ => Color::Gray,
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:>3}% ", p.percent), Style::default().fg(Color::Yellow)),
                Span::styled(p.stage, Style::default().fg(color)),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Stages "),
    );
    frame.render_widget(list, area);
}

fn render_gauge(frame: &mut Frame, app: &App, area: Rect) {
    let (label, color) = match (app.latest(), &app.failure) {
        (_, Some(reason)) => (format!("Error: {reason}"), Color::Red),
        (Some(p), None) => (format!("{} {}%", p.stage, p.percent), Color::Cyan),
        (None, None) => ("Background".to_string(), Color::Cyan),
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Progress "))
        .gauge_style(Style::default().fg(color))
        .percent(app.percent().min(100) as u16)
        .label(label);
    frame.render_widget(gauge, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let data = app.data;
    let status = Line::from(vec![
        Span::styled(" Roads: ", Style::default().fg(Color::DarkGray)),
        Span::styled(data.roads.len().to_string(), Style::default().fg(Color::Yellow)),
        Span::styled(" Water: ", Style::default().fg(Color::DarkGray)),
        Span::styled(data.water_areas.len().to_string(), Style::default().fg(Color::Yellow)),
        Span::styled(" Waterways: ", Style::default().fg(Color::DarkGray)),
        Span::styled(data.waterways.len().to_string(), Style::default().fg(Color::Yellow)),
        Span::styled(" Parks: ", Style::default().fg(Color::DarkGray)),
        Span::styled(data.parks.len().to_string(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.theme.name.as_str(), Style::default().fg(Color::Magenta)),
        Span::styled(
            if app.is_rendering() {
                " | q:cancel"
            } else {
                " | r:render again  s:save  q:quit"
            },
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(status), area);
}
