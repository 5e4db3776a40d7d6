//! Color themes.
//!
//! `dark` sticks to the ANSI 16 palette and works on any terminal.
//! `catppuccin_mocha` is RGB and needs truecolor.

use ratatui::style::Color;

#[derive(Debug, Clone)]
pub struct Theme {
    pub border_active: Color,
    pub border_inactive: Color,

    /// Fragments of the original text the revision removed or rewrote.
    pub diff_removed: Color,
    /// Fragments of the current text that differ from the original.
    pub diff_added: Color,
    pub text: Color,
    pub muted: Color,
    pub selection_bg: Color,

    pub role_customer: Color,
    pub role_agent: Color,

    pub decision_accepted: Color,
    pub decision_rejected: Color,
    pub decision_manual: Color,

    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    pub status_mode_normal: Color,
    pub status_mode_edit: Color,
    pub saved: Color,
    pub unsaved: Color,

    pub notice_info: Color,
    pub notice_error: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            border_active: Color::Cyan,
            border_inactive: Color::DarkGray,

            diff_removed: Color::Red,
            diff_added: Color::Green,
            text: Color::Reset,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,

            role_customer: Color::Blue,
            role_agent: Color::Magenta,

            decision_accepted: Color::Green,
            decision_rejected: Color::Red,
            decision_manual: Color::Yellow,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_mode_normal: Color::Cyan,
            status_mode_edit: Color::Green,
            saved: Color::Green,
            unsaved: Color::Yellow,

            notice_info: Color::Cyan,
            notice_error: Color::Red,
        }
    }

    /// Palette: <https://github.com/catppuccin/catppuccin>, Mocha variant.
    pub fn catppuccin_mocha() -> Self {
        let green = Color::Rgb(166, 227, 161); // #a6e3a1
        let red = Color::Rgb(243, 139, 168); // #f38ba8
        let yellow = Color::Rgb(249, 226, 175); // #f9e2af
        let blue = Color::Rgb(137, 180, 250); // #89b4fa
        let mauve = Color::Rgb(203, 166, 247); // #cba6f7
        let teal = Color::Rgb(148, 226, 213); // #94e2d5
        let lavender = Color::Rgb(180, 190, 254); // #b4befe
        let peach = Color::Rgb(250, 179, 135); // #fab387
        let overlay1 = Color::Rgb(127, 132, 156); // #7f849c
        let surface0 = Color::Rgb(49, 50, 68); // #313244
        let surface1 = Color::Rgb(69, 71, 90); // #45475a
        let text = Color::Rgb(205, 214, 244); // #cdd6f4

        Self {
            border_active: lavender,
            border_inactive: overlay1,

            diff_removed: red,
            diff_added: green,
            text,
            muted: overlay1,
            selection_bg: surface0,

            role_customer: blue,
            role_agent: mauve,

            decision_accepted: green,
            decision_rejected: red,
            decision_manual: peach,

            status_bar_bg: surface1,
            status_bar_fg: text,
            status_mode_normal: lavender,
            status_mode_edit: green,
            saved: green,
            unsaved: yellow,

            notice_info: teal,
            notice_error: red,
        }
    }

    /// Unknown names fall back to `dark` with a warning so a config typo never
    /// blocks startup.
    pub fn from_name(name: &str) -> Self {
        match name {
            "catppuccin-mocha" | "catppuccin_mocha" => Self::catppuccin_mocha(),
            "dark" => Self::dark(),
            other => {
                tracing::warn!(theme = other, "unknown theme, falling back to dark");
                Self::dark()
            }
        }
    }
}
