//! Color themes and the fleet-specific style lookups

use palette::Srgb;
use ratatui::style::{Color, Modifier, Style};

use crate::api::{Alert, VehicleStatus, VehicleType};

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub colors: ThemeColors,
    pub styles: ThemeStyles,
}

#[derive(Debug, Clone)]
pub struct ThemeColors {
    pub bg_primary: Color,
    pub bg_secondary: Color,
    pub bg_tertiary: Color,

    pub fg_primary: Color,
    pub fg_secondary: Color,
    pub fg_muted: Color,

    pub accent_primary: Color,
    pub accent_secondary: Color,

    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,

    pub border: Color,
    pub border_focused: Color,
    pub selection: Color,
}

#[derive(Debug, Clone)]
pub struct ThemeStyles {
    pub header: Style,
    pub footer: Style,
    pub panel_title: Style,
    pub panel_border: Style,
    pub panel_border_focused: Style,
    pub list_item: Style,
    pub list_item_selected: Style,
    pub stat_value: Style,
    pub stat_label: Style,
    pub alert_critical: Style,
    pub alert_warning: Style,
    pub error_text: Style,
    pub loading: Style,
    pub keybind: Style,
    pub keybind_key: Style,
    pub notification_info: Style,
    pub notification_success: Style,
    pub notification_warning: Style,
    pub notification_error: Style,
}

impl Theme {
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "nord" => Self::nord(),
            "gruvbox" => Self::gruvbox(),
            _ => Self::tokyo_night(),
        }
    }

    /// Tokyo Night theme (default)
    pub fn tokyo_night() -> Self {
        Self::from_colors(
            "Tokyo Night",
            ThemeColors {
                bg_primary: Color::Rgb(26, 27, 38),
                bg_secondary: Color::Rgb(36, 40, 59),
                bg_tertiary: Color::Rgb(41, 46, 66),
                fg_primary: Color::Rgb(192, 202, 245),
                fg_secondary: Color::Rgb(169, 177, 214),
                fg_muted: Color::Rgb(86, 95, 137),
                accent_primary: Color::Rgb(122, 162, 247),
                accent_secondary: Color::Rgb(187, 154, 247),
                success: Color::Rgb(158, 206, 106),
                warning: Color::Rgb(224, 175, 104),
                error: Color::Rgb(247, 118, 142),
                info: Color::Rgb(125, 207, 255),
                border: Color::Rgb(41, 46, 66),
                border_focused: Color::Rgb(122, 162, 247),
                selection: Color::Rgb(52, 59, 88),
            },
        )
    }

    pub fn nord() -> Self {
        Self::from_colors(
            "Nord",
            ThemeColors {
                bg_primary: Color::Rgb(46, 52, 64),
                bg_secondary: Color::Rgb(59, 66, 82),
                bg_tertiary: Color::Rgb(67, 76, 94),
                fg_primary: Color::Rgb(236, 239, 244),
                fg_secondary: Color::Rgb(229, 233, 240),
                fg_muted: Color::Rgb(216, 222, 233),
                accent_primary: Color::Rgb(136, 192, 208),
                accent_secondary: Color::Rgb(129, 161, 193),
                success: Color::Rgb(163, 190, 140),
                warning: Color::Rgb(235, 203, 139),
                error: Color::Rgb(191, 97, 106),
                info: Color::Rgb(136, 192, 208),
                border: Color::Rgb(67, 76, 94),
                border_focused: Color::Rgb(136, 192, 208),
                selection: Color::Rgb(76, 86, 106),
            },
        )
    }

    pub fn gruvbox() -> Self {
        Self::from_colors(
            "Gruvbox",
            ThemeColors {
                bg_primary: Color::Rgb(40, 40, 40),
                bg_secondary: Color::Rgb(60, 56, 54),
                bg_tertiary: Color::Rgb(80, 73, 69),
                fg_primary: Color::Rgb(235, 219, 178),
                fg_secondary: Color::Rgb(213, 196, 161),
                fg_muted: Color::Rgb(168, 153, 132),
                accent_primary: Color::Rgb(131, 165, 152),
                accent_secondary: Color::Rgb(211, 134, 155),
                success: Color::Rgb(184, 187, 38),
                warning: Color::Rgb(250, 189, 47),
                error: Color::Rgb(251, 73, 52),
                info: Color::Rgb(131, 165, 152),
                border: Color::Rgb(80, 73, 69),
                border_focused: Color::Rgb(131, 165, 152),
                selection: Color::Rgb(102, 92, 84),
            },
        )
    }

    fn from_colors(name: &str, colors: ThemeColors) -> Self {
        let styles = ThemeStyles {
            header: Style::default().bg(colors.bg_secondary).fg(colors.fg_primary),
            footer: Style::default().bg(colors.bg_secondary).fg(colors.fg_muted),
            panel_title: Style::default()
                .fg(colors.accent_primary)
                .add_modifier(Modifier::BOLD),
            panel_border: Style::default().fg(colors.border),
            panel_border_focused: Style::default().fg(colors.border_focused),
            list_item: Style::default().fg(colors.fg_primary),
            list_item_selected: Style::default()
                .fg(colors.fg_primary)
                .bg(colors.selection)
                .add_modifier(Modifier::BOLD),
            stat_value: Style::default()
                .fg(colors.fg_primary)
                .add_modifier(Modifier::BOLD),
            stat_label: Style::default().fg(colors.fg_muted),
            alert_critical: Style::default()
                .fg(colors.error)
                .add_modifier(Modifier::BOLD),
            alert_warning: Style::default().fg(colors.warning),
            error_text: Style::default().fg(colors.error),
            loading: Style::default()
                .fg(colors.fg_muted)
                .add_modifier(Modifier::ITALIC),
            keybind: Style::default().fg(colors.fg_muted),
            keybind_key: Style::default()
                .fg(colors.accent_secondary)
                .add_modifier(Modifier::BOLD),
            notification_info: Style::default().fg(colors.info),
            notification_success: Style::default().fg(colors.success),
            notification_warning: Style::default().fg(colors.warning),
            notification_error: Style::default().fg(colors.error),
        };

        Self {
            name: name.to_string(),
            colors,
            styles,
        }
    }

    pub fn status_color(&self, status: VehicleStatus) -> Color {
        match status {
            VehicleStatus::Idle => self.colors.fg_muted,
            VehicleStatus::EnRoute => self.colors.info,
            VehicleStatus::OnScene => self.colors.error,
            VehicleStatus::Returning => self.colors.success,
        }
    }

    pub fn vehicle_type_color(&self, vehicle_type: VehicleType) -> Color {
        match vehicle_type {
            VehicleType::Police => self.colors.accent_primary,
            VehicleType::Ambulance => self.colors.success,
            VehicleType::FireTruck => self.colors.error,
        }
    }

    pub fn alert_style(&self, alert: &Alert) -> Style {
        if alert.is_critical() {
            self.styles.alert_critical
        } else {
            self.styles.alert_warning
        }
    }

    /// Fuel below 20% is a warning, below 10% an error
    pub fn fuel_color(&self, level: f64) -> Color {
        if level < 10.0 {
            self.colors.error
        } else if level < 20.0 {
            self.colors.warning
        } else {
            self.colors.success
        }
    }
}

/// Terminal color for a chart palette entry
pub fn chart_color(color: Srgb<u8>) -> Color {
    Color::Rgb(color.red, color.green, color.blue)
}

impl Default for Theme {
    fn default() -> Self {
        Self::tokyo_night()
    }
}
