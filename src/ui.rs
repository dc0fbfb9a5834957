//! Terminal output for facprof: labelled messages, tables and spinners.
//!
//! Colour is disabled, in priority order, by:
//! 1. the `--no-color` flag,
//! 2. a `NO_COLOR` environment variable (any value),
//! 3. `TERM=dumb`,
//! 4. stdout not being a terminal (in `auto` mode).

use anstream::{eprintln, println};
use anstyle::{AnsiColor, Color, Style};
use comfy_table::{Cell, ContentArrangement, Table, presets};
use indicatif::{ProgressBar, ProgressStyle};
use std::borrow::Cow;
use std::io::IsTerminal;
use std::time::Duration;

use crate::settings::{Resource, ShareSettings};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Always,
    #[default]
    Auto,
    Never,
}

impl std::str::FromStr for ColorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "auto" => Ok(Self::Auto),
            "never" => Ok(Self::Never),
            _ => Err(format!("invalid color mode: {}", s)),
        }
    }
}

/// Resolved display settings
#[derive(Debug, Clone)]
pub struct Ui {
    pub color_enabled: bool,
    /// Spinners need both a TTY and colour
    pub spinner_enabled: bool,
}

impl Default for Ui {
    fn default() -> Self {
        Self::new(ColorMode::Auto, false)
    }
}

impl Ui {
    pub fn new(mode: ColorMode, force_no_color: bool) -> Self {
        let color_enabled = Self::resolve_color(mode, force_no_color);
        let spinner_enabled = color_enabled && std::io::stdout().is_terminal();

        if !color_enabled {
            anstream::ColorChoice::write_global(anstream::ColorChoice::Never);
        }

        Self {
            color_enabled,
            spinner_enabled,
        }
    }

    fn resolve_color(mode: ColorMode, force_no_color: bool) -> bool {
        if force_no_color || std::env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if std::env::var("TERM").is_ok_and(|t| t == "dumb") {
            return false;
        }

        match mode {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => std::io::stdout().is_terminal(),
        }
    }

    fn style_label(&self, color: AnsiColor) -> Style {
        if self.color_enabled {
            Style::new().fg_color(Some(Color::Ansi(color))).bold()
        } else {
            Style::new()
        }
    }

    pub fn ok(&self, msg: impl AsRef<str>) {
        let label = self.style_label(AnsiColor::Green);
        println!("{label}OK{label:#} {}", msg.as_ref());
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        let label = self.style_label(AnsiColor::Yellow);
        println!("{label}WARN{label:#} {}", msg.as_ref());
    }

    /// Errors go to stderr
    pub fn err(&self, msg: impl AsRef<str>) {
        let label = self.style_label(AnsiColor::Red);
        eprintln!("{label}ERROR{label:#} {}", msg.as_ref());
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        let label = self.style_label(AnsiColor::Cyan);
        println!("{label}INFO{label:#} {}", msg.as_ref());
    }

    pub fn dim(&self, s: impl AsRef<str>) -> String {
        self.paint(s, Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))))
    }

    pub fn bold(&self, s: impl AsRef<str>) -> String {
        self.paint(s, Style::new().bold())
    }

    pub fn colored(&self, s: impl AsRef<str>, color: AnsiColor) -> String {
        self.paint(s, Style::new().fg_color(Some(Color::Ansi(color))))
    }

    fn paint(&self, s: impl AsRef<str>, style: Style) -> String {
        if self.color_enabled {
            format!("{style}{}{style:#}", s.as_ref())
        } else {
            s.as_ref().to_string()
        }
    }

    pub fn icon_ok(&self) -> &'static str {
        if self.color_enabled { "✓" } else { "[OK]" }
    }

    pub fn icon_warn(&self) -> &'static str {
        if self.color_enabled { "⚠" } else { "[!]" }
    }

    pub fn icon_err(&self) -> &'static str {
        if self.color_enabled { "✗" } else { "[X]" }
    }

    pub fn icon_info(&self) -> &'static str {
        if self.color_enabled { "•" } else { "-" }
    }

    /// Borderless table for key/value listings
    pub fn simple_table(&self) -> Table {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.load_preset(presets::NOTHING);
        table
    }

    pub fn cell(&self, content: impl Into<String>) -> Cell {
        Cell::new(content.into())
    }

    pub fn header_cell(&self, content: impl Into<String>) -> Cell {
        let cell = Cell::new(content.into());
        if self.color_enabled {
            cell.add_attribute(comfy_table::Attribute::Bold)
        } else {
            cell
        }
    }

    /// Uses comfy-table's own styling so column widths stay correct
    pub fn colored_cell(&self, content: impl Into<String>, color: AnsiColor) -> Cell {
        let cell = Cell::new(content.into());
        if self.color_enabled {
            cell.fg(ansi_to_comfy_color(color))
        } else {
            cell
        }
    }

    /// One-letter code per shared resource, e.g. `C M . . B`
    pub fn share_cell(&self, sharing: &ShareSettings) -> Cell {
        if sharing.shared().is_empty() {
            self.colored_cell(sharing.short_codes(), AnsiColor::BrightBlack)
        } else {
            self.colored_cell(sharing.short_codes(), AnsiColor::Cyan)
        }
    }

    /// One row per resource with a yes/no column
    pub fn share_table(&self, sharing: &ShareSettings) -> Table {
        let mut table = self.simple_table();
        for resource in Resource::ALL {
            let shared = if sharing.get(resource) {
                self.colored_cell("shared", AnsiColor::Green)
            } else {
                self.colored_cell("own", AnsiColor::BrightBlack)
            };
            table.add_row(vec![self.cell(format!("  {}:", resource.display_name())), shared]);
        }
        table
    }

    pub fn spinner(&self, message: impl Into<Cow<'static, str>>) -> ProgressBar {
        if !self.spinner_enabled {
            let pb = ProgressBar::hidden();
            pb.set_message(message);
            return pb;
        }

        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }

    pub fn spinner_finish_ok(&self, pb: &ProgressBar, msg: impl Into<Cow<'static, str>>) {
        self.finish_spinner(pb, msg.into(), true);
    }

    pub fn spinner_finish_err(&self, pb: &ProgressBar, msg: impl Into<Cow<'static, str>>) {
        self.finish_spinner(pb, msg.into(), false);
    }

    fn finish_spinner(&self, pb: &ProgressBar, msg: Cow<'static, str>, ok: bool) {
        if !self.spinner_enabled {
            pb.finish_and_clear();
            if ok { self.ok(msg) } else { self.err(msg) }
            return;
        }

        if let Ok(style) = ProgressStyle::default_spinner().template("{msg}") {
            pb.set_style(style);
        }
        let icon = if ok {
            self.colored("✓", AnsiColor::Green)
        } else {
            self.colored("✗", AnsiColor::Red)
        };
        pb.finish_with_message(format!("{} {}", icon, msg));
    }

    pub fn println(&self, msg: impl AsRef<str>) {
        println!("{}", msg.as_ref());
    }

    pub fn newline(&self) {
        println!();
    }

    pub fn section(&self, title: impl AsRef<str>) {
        println!("{}", self.bold(title));
    }
}

fn ansi_to_comfy_color(color: AnsiColor) -> comfy_table::Color {
    use comfy_table::Color as C;
    match color {
        AnsiColor::Black => C::Black,
        AnsiColor::Red | AnsiColor::BrightRed => C::Red,
        AnsiColor::Green | AnsiColor::BrightGreen => C::Green,
        AnsiColor::Yellow | AnsiColor::BrightYellow => C::Yellow,
        AnsiColor::Blue | AnsiColor::BrightBlue => C::Blue,
        AnsiColor::Magenta | AnsiColor::BrightMagenta => C::Magenta,
        AnsiColor::Cyan | AnsiColor::BrightCyan => C::Cyan,
        AnsiColor::White | AnsiColor::BrightWhite => C::White,
        AnsiColor::BrightBlack => C::DarkGrey,
    }
}
