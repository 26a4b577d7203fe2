use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget},
};
use std::time::Instant;

use super::app::App;
use super::color;
use super::particles::Particle;
use super::transport::MediaElement;
use super::visualizer::VisualBar;
use crate::constants::SPINNER_CHARS;

/// Night soil behind the bars
const BACKGROUND: (u8, u8, u8) = (24, 16, 8);
/// Bars that have not seen any audio yet
const RESTING_TOP: (u8, u8, u8) = (76, 175, 80);
const RESTING_BASE: (u8, u8, u8) = (46, 125, 50);
const PEAK_CAP: (u8, u8, u8) = (255, 236, 179);
/// Partial cell glyphs, one eighth at a time
const EIGHTHS: [&str; 8] = [" ", "▁", "▂", "▃", "▄", "▅", "▆", "▇"];

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(r, g, b)
}

pub fn draw<M: MediaElement>(f: &mut Frame, app: &App<M>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(2), // Title
            Constraint::Length(1), // Status
            Constraint::Length(1), // Error banner
            Constraint::Min(6),    // Visualizer
            Constraint::Length(3), // Volume
            Constraint::Length(2), // Controls
        ])
        .split(f.area());

    let title = Paragraph::new("🌾 Rádio Campo 🌾")
        .style(
            Style::default()
                .fg(rgb(RESTING_TOP))
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    draw_status(f, chunks[1], app);
    draw_banner(f, chunks[2], app);
    draw_visualizer(f, chunks[3], app);
    draw_volume(f, chunks[4], app);
    draw_controls(f, chunks[5], app);
}

fn draw_status<M: MediaElement>(f: &mut Frame, area: Rect, app: &App<M>) {
    let controller = &app.controller;
    let status = controller.status();

    let mut spans = vec![Span::styled(
        format!("{} ", controller.play_icon()),
        Style::default().fg(if controller.is_playing() {
            Color::Yellow
        } else {
            Color::Green
        }),
    )];
    if status.is_loading() {
        let spinner = SPINNER_CHARS[app.spinner_frame() / 4 % SPINNER_CHARS.len()];
        spans.push(Span::styled(
            format!("{spinner} "),
            Style::default().fg(Color::Yellow),
        ));
    }
    spans.push(Span::styled(
        status.text(),
        Style::default().fg(Color::White),
    ));

    f.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
        area,
    );
}

fn draw_banner<M: MediaElement>(f: &mut Frame, area: Rect, app: &App<M>) {
    if let Some(message) = app.controller.banner().message() {
        let banner = Paragraph::new(format!("⚠ {message}"))
            .style(
                Style::default()
                    .fg(Color::White)
                    .bg(Color::Red)
                    .add_modifier(Modifier::BOLD),
            )
            .alignment(Alignment::Center);
        f.render_widget(banner, area);
    }
}

fn draw_visualizer<M: MediaElement>(f: &mut Frame, area: Rect, app: &App<M>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(rgb(RESTING_BASE)));
    let inner = block.inner(area);
    f.render_widget(block, area);

    match app.controller.visualizer() {
        Some(visualizer) => {
            let widget = BarsWidget {
                bars: visualizer.bars(),
                particles: visualizer.particles().particles(),
                now: app.now(),
            };
            f.render_widget(widget, inner);
        }
        None => {
            let message = Paragraph::new(app.source.as_str())
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center);
            f.render_widget(message, inner);
        }
    }
}

fn draw_volume<M: MediaElement>(f: &mut Frame, area: Rect, app: &App<M>) {
    let controller = &app.controller;
    let slider = controller.slider();

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(Style::default().fg(rgb(RESTING_TOP)).bg(rgb(BACKGROUND)))
        .percent(slider as u16)
        .label(Span::styled(
            format!("{} {slider}%", controller.volume_icon().glyph()),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ));
    f.render_widget(gauge, area);
}

fn draw_controls<M: MediaElement>(f: &mut Frame, area: Rect, app: &App<M>) {
    let playing = app.controller.is_playing();
    let controls = vec![
        Span::styled(
            "[space]",
            Style::default().fg(if playing { Color::Yellow } else { Color::Green }),
        ),
        Span::raw(if playing { " pause  " } else { " play  " }),
        Span::styled("[↑↓]", Style::default().fg(Color::Magenta)),
        Span::raw(" volume  "),
        Span::styled("[s]", Style::default().fg(Color::Cyan)),
        Span::raw(" stop  "),
        if app.telemetry.is_enabled() {
            Span::styled("[t]", Style::default().fg(Color::Blue).bg(Color::DarkGray))
        } else {
            Span::styled("[t]", Style::default().fg(Color::Blue))
        },
        Span::raw(" telemetry  "),
        Span::styled("[x]", Style::default().fg(Color::Blue)),
        Span::raw(" export  "),
        Span::styled("[q]", Style::default().fg(Color::Red)),
        Span::raw(" quit"),
    ];

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    f.render_widget(
        Paragraph::new(Line::from(controls)).alignment(Alignment::Center),
        rows[0],
    );
    if let Some(notice) = app.notice() {
        f.render_widget(
            Paragraph::new(notice)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            rows[1],
        );
    }
}

/// Column span of every bar: (x offset, width). Bars share the width evenly
/// and keep a one-cell gap when there is room for it.
pub fn bar_columns(width: u16, count: usize) -> Vec<(u16, u16)> {
    if count == 0 || width == 0 {
        return Vec::new();
    }
    let slot = (width as usize / count).max(1);
    let bar_width = if slot > 2 { slot - 1 } else { slot };

    (0..count)
        .map(|i| ((i * slot) as u16, bar_width as u16))
        .take_while(|&(x, _)| x < width)
        .collect()
}

/// Height of a bar in eighths of a cell
pub fn bar_eighths(height_percent: f32, rows: u16) -> u32 {
    let eighths = (height_percent.clamp(0.0, 100.0) / 100.0) * rows as f32 * 8.0;
    eighths.round() as u32
}

pub struct BarsWidget<'a> {
    pub bars: &'a [VisualBar],
    pub particles: &'a [Particle],
    pub now: Instant,
}

impl Widget for BarsWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.set_symbol(" ").set_bg(rgb(BACKGROUND));
                }
            }
        }

        for (bar, (offset, width)) in self.bars.iter().zip(bar_columns(area.width, self.bars.len()))
        {
            render_bar(bar, area, area.x + offset, width, buf);
        }

        for particle in self.particles {
            render_particle(particle, self.now, area, buf);
        }
    }
}

fn render_bar(bar: &VisualBar, area: Rect, x: u16, width: u16, buf: &mut Buffer) {
    let (top, base) = match bar.color {
        Some(c) => {
            let (top, base) = c.gradient();
            (top.to_rgb(), base.to_rgb())
        }
        None => (RESTING_TOP, RESTING_BASE),
    };
    let blend = |c| color::blend(c, BACKGROUND, bar.opacity);

    let total = bar_eighths(bar.height, area.height);
    let full_rows = (total / 8) as u16;
    let remainder = (total % 8) as usize;
    let filled_rows = full_rows + u16::from(remainder > 0);

    let mut style = Style::default().bg(rgb(BACKGROUND));
    if bar.active {
        style = style.add_modifier(Modifier::BOLD);
    }

    for row in 0..filled_rows.min(area.height) {
        let y = area.bottom() - 1 - row;
        let t = if filled_rows > 1 {
            row as f32 / (filled_rows - 1) as f32
        } else {
            1.0
        };
        let fg = blend(color::lerp_rgb(base, top, t));
        let symbol = if row == full_rows { EIGHTHS[remainder] } else { "█" };

        for dx in 0..width {
            if let Some(cell) = buf.cell_mut((x + dx, y)) {
                cell.set_style(style.fg(rgb(fg))).set_symbol(symbol);
            }
        }
    }

    // Glow: a faint haze above loud bars
    let halo_rows = (bar.glow / 10.0) as u16;
    for h in 0..halo_rows {
        let row = filled_rows + h;
        if row >= area.height {
            break;
        }
        let y = area.bottom() - 1 - row;
        let fg = color::blend(top, BACKGROUND, 0.25 / (h + 1) as f32);
        for dx in 0..width {
            if let Some(cell) = buf.cell_mut((x + dx, y)) {
                cell.set_fg(rgb(fg)).set_symbol("░");
            }
        }
    }

    if bar.peak && filled_rows < area.height {
        let y = area.bottom() - 1 - filled_rows;
        for dx in 0..width {
            if let Some(cell) = buf.cell_mut((x + dx, y)) {
                cell.set_fg(rgb(PEAK_CAP))
                    .set_symbol("▔")
                    .set_style(Style::default().add_modifier(Modifier::BOLD));
            }
        }
    }
}

fn render_particle(particle: &Particle, now: Instant, area: Rect, buf: &mut Buffer) {
    let progress = particle.progress(now);
    let x_percent = (particle.x_percent + particle.drift(now)).clamp(0.0, 99.9);
    let x = area.x + (x_percent / 100.0 * area.width as f32) as u16;
    let rise = (progress * (area.height.saturating_sub(1)) as f32) as u16;
    let y = area.bottom() - 1 - rise.min(area.height - 1);

    // Fade out towards the top, like the leaf's animation
    let alpha = 1.0 - progress * 0.8;
    let fg = color::blend(particle.color, BACKGROUND, alpha);
    let symbol = if particle.size >= 8.0 { "❦" } else { "•" };

    if let Some(cell) = buf.cell_mut((x.min(area.right() - 1), y)) {
        cell.set_fg(rgb(fg)).set_symbol(symbol);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::visualizer::BASELINE_HEIGHT;

    fn symbol(buf: &Buffer, x: u16, y: u16) -> String {
        buf.cell((x, y)).map(|c| c.symbol().to_string()).unwrap_or_default()
    }

    #[test]
    fn test_bar_columns_with_gap() {
        let columns = bar_columns(64, 16);
        assert_eq!(columns.len(), 16);
        assert_eq!(columns[0], (0, 3));
        assert_eq!(columns[1], (4, 3));
        assert_eq!(columns[15], (60, 3));
    }

    #[test]
    fn test_bar_columns_narrow_terminal() {
        let columns = bar_columns(10, 32);
        // One cell per bar, and only as many as fit
        assert_eq!(columns.len(), 10);
        assert!(columns.iter().all(|&(_, w)| w == 1));
        assert!(bar_columns(0, 4).is_empty());
    }

    #[test]
    fn test_bar_eighths() {
        assert_eq!(bar_eighths(100.0, 10), 80);
        assert_eq!(bar_eighths(BASELINE_HEIGHT, 25), 16);
        assert_eq!(bar_eighths(50.0, 3), 12);
        assert_eq!(bar_eighths(150.0, 2), 16);
    }

    #[test]
    fn test_baseline_bars_render_at_floor() {
        let area = Rect::new(0, 0, 8, 25);
        let mut buf = Buffer::empty(area);
        let bars = vec![VisualBar::baseline(); 2];
        BarsWidget {
            bars: &bars,
            particles: &[],
            now: Instant::now(),
        }
        .render(area, &mut buf);

        // 8% of 25 rows is exactly two cells
        assert_eq!(symbol(&buf, 0, 24), "█");
        assert_eq!(symbol(&buf, 0, 23), "█");
        assert_eq!(symbol(&buf, 0, 22), " ");
        // Gap column between the two bars
        assert_eq!(symbol(&buf, 3, 24), " ");
        assert_eq!(symbol(&buf, 4, 24), "█");
    }

    #[test]
    fn test_peak_cap_sits_on_top() {
        let area = Rect::new(0, 0, 4, 10);
        let mut buf = Buffer::empty(area);
        let mut bar = VisualBar::baseline();
        bar.height = 50.0;
        bar.peak = true;
        bar.active = true;
        BarsWidget {
            bars: &[bar],
            particles: &[],
            now: Instant::now(),
        }
        .render(area, &mut buf);

        assert_eq!(symbol(&buf, 0, 5), "█");
        assert_eq!(symbol(&buf, 0, 4), "▔");
    }
}
