//! Color palette and preset styles for the cardiology screens.

use ratatui::style::{Color, Modifier, Style};

/// Cardiology theme.
pub struct ClinicalTheme;

impl ClinicalTheme {
    /// Crimson, the accent of headers and focus.
    pub const ACCENT: Color = Color::Rgb(220, 38, 38); // #DC2626
    pub const ACCENT_LIGHT: Color = Color::Rgb(248, 113, 113); // #F87171
    pub const ACCENT_DARK: Color = Color::Rgb(153, 27, 27); // #991B1B

    pub const SLATE: Color = Color::Rgb(100, 116, 139); // #64748B
    pub const SLATE_LIGHT: Color = Color::Rgb(148, 163, 184); // #94A3B8

    pub const SUCCESS: Color = Color::Rgb(34, 197, 94); // #22C55E
    pub const WARNING: Color = Color::Rgb(245, 158, 11); // #F59E0B
    pub const DANGER: Color = Color::Rgb(239, 68, 68); // #EF4444
    pub const INFO: Color = Color::Rgb(56, 189, 248); // #38BDF8

    pub const BG_DARK: Color = Color::Rgb(17, 24, 39); // #111827

    pub const TEXT_PRIMARY: Color = Color::Rgb(243, 244, 246); // #F3F4F6
    pub const TEXT_SECONDARY: Color = Color::Rgb(156, 163, 175); // #9CA3AF
    pub const TEXT_MUTED: Color = Color::Rgb(107, 114, 128); // #6B7280

    /// Chart series colors, cycled per group.
    pub const SERIES: [Color; 4] = [
        Color::Rgb(56, 189, 248),
        Color::Rgb(244, 114, 182),
        Color::Rgb(250, 204, 21),
        Color::Rgb(74, 222, 128),
    ];

    #[must_use]
    pub const fn title() -> Style {
        Style::new().fg(Self::TEXT_PRIMARY).add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub const fn subtitle() -> Style {
        Style::new().fg(Self::ACCENT_LIGHT).add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub const fn text() -> Style {
        Style::new().fg(Self::TEXT_PRIMARY)
    }

    #[must_use]
    pub const fn text_secondary() -> Style {
        Style::new().fg(Self::TEXT_SECONDARY)
    }

    #[must_use]
    pub const fn text_muted() -> Style {
        Style::new().fg(Self::TEXT_MUTED)
    }

    #[must_use]
    pub const fn success() -> Style {
        Style::new().fg(Self::SUCCESS)
    }

    #[must_use]
    pub const fn warning() -> Style {
        Style::new().fg(Self::WARNING)
    }

    #[must_use]
    pub const fn danger() -> Style {
        Style::new().fg(Self::DANGER)
    }

    #[must_use]
    pub const fn info() -> Style {
        Style::new().fg(Self::INFO)
    }

    /// Highlighted row or option
    #[must_use]
    pub const fn selected() -> Style {
        Style::new()
            .fg(Self::BG_DARK)
            .bg(Self::ACCENT_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    /// Field under the cursor
    #[must_use]
    pub const fn focused() -> Style {
        Style::new().fg(Self::ACCENT_LIGHT).add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub const fn border() -> Style {
        Style::new().fg(Self::SLATE)
    }

    #[must_use]
    pub const fn border_focused() -> Style {
        Style::new().fg(Self::ACCENT)
    }

    /// Table header row
    #[must_use]
    pub const fn header() -> Style {
        Style::new()
            .fg(Self::TEXT_PRIMARY)
            .bg(Self::ACCENT_DARK)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub const fn key_hint() -> Style {
        Style::new().fg(Self::ACCENT_LIGHT).add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub const fn key_desc() -> Style {
        Style::new().fg(Self::SLATE_LIGHT)
    }

    /// Style of a risk percentage: higher is redder.
    #[must_use]
    pub fn result(percent: f64) -> Style {
        let style = if percent >= 70.0 {
            Self::danger()
        } else if percent >= 30.0 {
            Self::warning()
        } else {
            Self::success()
        };
        style.add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn series(index: usize) -> Style {
        Style::default().fg(Self::SERIES[index % Self::SERIES.len()])
    }
}
