use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle},
        Block, Borders, Gauge, Paragraph, Widget, Wrap,
    },
};

use homing::{feedback::Feedback, geometry::Point, target::TargetState};

use crate::App;

const STATUS_HEIGHT: u16 = 1;
const LEGEND_HEIGHT: u16 = 1;

const PARTICLE_COLORS: [Color; 7] = [
    Color::Yellow,
    Color::Magenta,
    Color::Cyan,
    Color::Green,
    Color::Red,
    Color::Blue,
    Color::LightYellow,
];

/// Split the screen into board, status line and key legend
fn layout(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(STATUS_HEIGHT),
            Constraint::Length(LEGEND_HEIGHT),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

fn board_block(blind: bool) -> Block<'static> {
    let title = if blind { " homing · blind " } else { " homing " };
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_alignment(Alignment::Center)
}

/// Terminal cells the pointer can play on, for a screen of `area`
pub fn surface_area(area: Rect) -> Rect {
    let [board, _, _] = layout(area);
    board_block(false).inner(board)
}

/// Indicator colour for the current rumble strength
pub fn rumble_color(level: f64) -> Color {
    if level <= 0.0 {
        Color::Blue
    } else if level < 0.4 {
        Color::Cyan
    } else if level < 0.7 {
        Color::Yellow
    } else {
        Color::Red
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [board, status, legend] = layout(area);
        let block = board_block(self.blind);

        match (&self.controller, self.is_playable()) {
            (Some(controller), true) => {
                let extents = self.extents();
                let height = extents.height;
                let target = controller.target();
                let level = controller.haptics().level();
                let indicator = controller.indicator();
                let hit_radius = controller.tuning().hit_radius;

                let show_target = !self.blind || target.state() == TargetState::HitPending;
                let target_color = match target.state() {
                    TargetState::Armed => Color::Red,
                    TargetState::HitPending => Color::DarkGray,
                };

                Canvas::default()
                    .block(block)
                    .marker(Marker::Braille)
                    .x_bounds([0.0, extents.width])
                    .y_bounds([0.0, extents.height])
                    .paint(|ctx| {
                        if show_target {
                            let p = target.position();
                            for radius in [1.0, 2.5, 4.0, 5.5] {
                                ctx.draw(&Circle {
                                    x: p.x,
                                    y: height - p.y,
                                    radius,
                                    color: target_color,
                                });
                            }
                        }

                        if indicator != Point::OFFSCREEN {
                            ctx.draw(&Circle {
                                x: indicator.x,
                                y: height - indicator.y,
                                radius: hit_radius,
                                color: rumble_color(level),
                            });
                        }

                        if self.burst.is_active {
                            ctx.layer();
                            for particle in &self.burst.particles {
                                let color = PARTICLE_COLORS[particle.color_index % PARTICLE_COLORS.len()];
                                let style = if particle.alpha() > 0.5 {
                                    Style::default().fg(color).add_modifier(Modifier::BOLD)
                                } else {
                                    Style::default().fg(color).add_modifier(Modifier::DIM)
                                };
                                ctx.print(
                                    particle.x,
                                    height - particle.y,
                                    Span::styled(particle.symbol.to_string(), style),
                                );
                            }
                        }
                    })
                    .render(board, buf);

                let status_chunks = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Min(10), Constraint::Length(28)])
                    .split(status);

                let distance = match controller.last_feedback() {
                    Some(Feedback::Suppressed { .. }) | None => "--".to_string(),
                    Some(fb) => format!("{:.0}", fb.distance()),
                };
                let status_text = format!(
                    " hits {}   distance {}   {}",
                    controller.hits(),
                    distance,
                    target.state()
                );
                Paragraph::new(Span::styled(
                    status_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ))
                .render(status_chunks[0], buf);

                let label = if controller.haptics().is_supported() {
                    format!("rumble {:>3.0}%", level * 100.0)
                } else {
                    "rumble off".to_string()
                };
                Gauge::default()
                    .gauge_style(Style::default().fg(rumble_color(level)))
                    .ratio(level.clamp(0.0, 1.0))
                    .label(label)
                    .render(status_chunks[1], buf);
            }
            _ => {
                let min = self.config.tuning.margins().min_extents();
                let (cols, rows) = self.config.cell_scale().cells_exceeding(min);
                // plus the border, status line and legend
                let min_cols = cols + 2;
                let min_rows = rows + 2 + STATUS_HEIGHT + LEGEND_HEIGHT;

                Paragraph::new(vec![
                    Line::from(Span::styled(
                        "terminal too small",
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    )),
                    Line::from(format!("need at least {min_cols}x{min_rows} cells")),
                ])
                .block(block)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .render(board, buf);
            }
        }

        let blind = if self.blind { "on" } else { "off" };
        Paragraph::new(Span::styled(
            format!(" drag with the left mouse button / (b)lind: {blind} / (q)uit"),
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .render(legend, buf);
    }
}
