use ms_core::HealthClass;
use ratatui::style::{Color, Modifier, Style};

#[derive(Clone, Copy, Debug)]
pub struct Theme {
    pub surface: Color,
    pub border: Color,
    pub title: Color,
    pub text: Color,
    pub muted: Color,
    pub accent: Color,
    pub ok: Color,
    pub warn: Color,
    pub critical: Color,
    pub info: Color,
}

pub fn theme() -> Theme {
    Theme {
        surface: Color::Rgb(17, 26, 46),
        border: Color::Rgb(71, 85, 105),
        title: Color::Rgb(191, 219, 254),
        text: Color::Rgb(226, 232, 240),
        muted: Color::Rgb(148, 163, 184),
        accent: Color::Rgb(56, 189, 248),
        ok: Color::Rgb(34, 197, 94),
        warn: Color::Rgb(245, 158, 11),
        critical: Color::Rgb(239, 68, 68),
        info: Color::Rgb(59, 130, 246),
    }
}

pub const HEADER_STYLE: Style = Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD);
pub const SELECTED_STYLE: Style = Style::new().add_modifier(Modifier::REVERSED);

impl Theme {
    pub fn health_color(&self, class: HealthClass) -> Color {
        match class {
            HealthClass::Dead => Color::DarkGray,
            HealthClass::Restarting => self.info,
            HealthClass::Critical => self.critical,
            HealthClass::Warning => self.warn,
            HealthClass::Running => self.ok,
            HealthClass::Idle => self.muted,
        }
    }

    pub fn row_style(&self, class: HealthClass) -> Style {
        let style = Style::default().fg(self.health_color(class));
        match class {
            HealthClass::Dead => style.add_modifier(Modifier::DIM),
            HealthClass::Restarting => style.add_modifier(Modifier::ITALIC),
            HealthClass::Critical => style.add_modifier(Modifier::BOLD),
            _ => style,
        }
    }

    pub fn cc_alert_style(&self) -> Style {
        Style::default()
            .fg(Color::White)
            .bg(self.critical)
            .add_modifier(Modifier::BOLD)
    }
}
