//! Color theme system for inlay.
//!
//! A `Theme` holds named `ratatui::style::Color` fields covering every surface
//! inlay renders: the text buffer, the inline chat overlays and the status bar.
//! Two built-in themes are provided:
//!
//! - `dark` - ANSI 16 colors, works on any terminal.
//! - `catppuccin_mocha` - Catppuccin Mocha palette in RGB; requires truecolor.

use ratatui::style::Color;

#[derive(Debug, Clone)]
pub struct Theme {
    // Buffer
    /// Line-number gutter.
    pub gutter: Color,
    /// Plain buffer text.
    pub text: Color,
    /// Background of selected text.
    pub selection_bg: Color,
    /// Cursor cell background.
    pub cursor_bg: Color,

    // Diff overlay
    /// Added lines (`+`).
    pub diff_added: Color,
    /// Removed lines (`-`).
    pub diff_removed: Color,
    /// Unchanged context lines.
    pub diff_context: Color,
    /// Diff overlay border.
    pub diff_border: Color,

    // Chat widget
    /// Content widget border.
    pub chat_border: Color,
    /// Action labels in the content widget.
    pub chat_action: Color,
    /// Status badge while a request is in flight.
    pub status_thinking: Color,
    /// Status badge once a diff is on screen.
    pub status_done: Color,
    /// Status badge after a failed request.
    pub status_error: Color,

    // Context menu
    pub menu_border: Color,
    pub menu_highlight_bg: Color,

    // Status bar
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    /// Marker shown when the buffer has unsaved edits.
    pub status_dirty: Color,

    /// Application background (used for clearing areas).
    pub background: Color,
}

impl Theme {
    /// Built-in dark theme using ANSI 16 colors. The default when no config is
    /// present.
    pub fn dark() -> Self {
        Self {
            gutter: Color::DarkGray,
            text: Color::Reset,
            selection_bg: Color::Blue,
            cursor_bg: Color::Gray,

            diff_added: Color::Green,
            diff_removed: Color::Red,
            diff_context: Color::DarkGray,
            diff_border: Color::Cyan,

            chat_border: Color::Magenta,
            chat_action: Color::Cyan,
            status_thinking: Color::Yellow,
            status_done: Color::Green,
            status_error: Color::Red,

            menu_border: Color::Cyan,
            menu_highlight_bg: Color::DarkGray,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_dirty: Color::Yellow,

            background: Color::Reset,
        }
    }

    /// Catppuccin Mocha theme using RGB truecolor values.
    ///
    /// Palette source: <https://github.com/catppuccin/catppuccin> Mocha variant.
    pub fn catppuccin_mocha() -> Self {
        let green = Color::Rgb(166, 227, 161);    // #a6e3a1
        let red = Color::Rgb(243, 139, 168);      // #f38ba8
        let yellow = Color::Rgb(249, 226, 175);   // #f9e2af
        let teal = Color::Rgb(148, 226, 213);     // #94e2d5
        let mauve = Color::Rgb(203, 166, 247);    // #cba6f7
        let lavender = Color::Rgb(180, 190, 254); // #b4befe
        let overlay1 = Color::Rgb(127, 132, 156); // #7f849c
        let surface1 = Color::Rgb(69, 71, 90);    // #45475a
        let surface2 = Color::Rgb(88, 91, 112);   // #585b70
        let base = Color::Rgb(30, 30, 46);        // #1e1e2e
        let text = Color::Rgb(205, 214, 244);     // #cdd6f4
        let rosewater = Color::Rgb(245, 224, 220); // #f5e0dc

        Self {
            gutter: overlay1,
            text,
            selection_bg: surface2,
            cursor_bg: rosewater,

            diff_added: green,
            diff_removed: red,
            diff_context: overlay1,
            diff_border: teal,

            chat_border: mauve,
            chat_action: lavender,
            status_thinking: yellow,
            status_done: green,
            status_error: red,

            menu_border: lavender,
            menu_highlight_bg: surface1,

            status_bar_bg: surface1,
            status_bar_fg: text,
            status_dirty: yellow,

            background: base,
        }
    }

    /// Resolves a theme name from config to a built-in theme.
    ///
    /// Unknown names fall back to `dark()` so a typo in config never prevents
    /// startup.
    ///
    /// # Arguments
    ///
    /// * `name` - theme name from config, e.g. `"dark"` or `"catppuccin-mocha"`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "catppuccin-mocha" | "catppuccin_mocha" => Self::catppuccin_mocha(),
            "dark" => Self::dark(),
            other => {
                tracing::warn!(theme = other, "unknown theme, falling back to 'dark'");
                Self::dark()
            }
        }
    }
}
