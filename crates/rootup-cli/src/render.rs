use std::io::IsTerminal;

use anstyle::{AnsiColor, Effects, Style};
use rootup_core::{ChangeSet, ManifestDocument, PackageDescriptor, Reporter, SectionChange};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum OutputStyle {
    Plain,
    Rich,
}

pub(crate) fn current_output_style(force_plain: bool) -> OutputStyle {
    if force_plain || std::env::var_os("NO_COLOR").is_some() || !std::io::stdout().is_terminal() {
        OutputStyle::Plain
    } else {
        OutputStyle::Rich
    }
}

/// Prints progress to stdout; labeled verbose lines only when `verbose`.
#[derive(Copy, Clone, Debug)]
pub(crate) struct ConsoleReporter {
    style: OutputStyle,
    verbose: bool,
}

impl ConsoleReporter {
    pub(crate) fn new(style: OutputStyle, verbose: bool) -> Self {
        Self { style, verbose }
    }

    pub(crate) fn print_lines(self, lines: &[String]) {
        for line in lines {
            println!("{line}");
        }
    }
}

impl Reporter for ConsoleReporter {
    fn log(&self, message: &str) {
        println!("{message}");
    }

    fn labeled_verbose(&self, label: Option<&str>, message: &str) {
        if self.verbose {
            println!("{}", render_labeled_line(self.style, label, message));
        }
    }
}

pub(crate) fn render_labeled_line(style: OutputStyle, label: Option<&str>, message: &str) -> String {
    match (label, style) {
        (None, _) => message.to_string(),
        (Some(label), OutputStyle::Plain) => format!("[{label}] {message}"),
        (Some(label), OutputStyle::Rich) => {
            format!("{} {message}", colorize(label_style(), &format!("[{label}]")))
        }
    }
}

/// One line per section: `~` replaced, `+` added, `-` removed.
pub(crate) fn format_change_set_lines(
    style: OutputStyle,
    change_set: &ChangeSet,
    live: &ManifestDocument,
) -> Vec<String> {
    change_set
        .iter()
        .map(|(section, change)| {
            let (symbol, color) = match change {
                SectionChange::Remove => ("-", AnsiColor::Red),
                SectionChange::Replace(_) if live.contains_key(section) => ("~", AnsiColor::Yellow),
                SectionChange::Replace(_) => ("+", AnsiColor::Green),
            };
            match style {
                OutputStyle::Plain => format!("{symbol} {section}"),
                OutputStyle::Rich => format!(
                    "{} {section}",
                    colorize(Style::new().fg_color(Some(color.into())), symbol)
                ),
            }
        })
        .collect()
}

pub(crate) fn format_descriptor_lines(
    heading: &str,
    label: &str,
    descriptor: Option<&PackageDescriptor>,
) -> Vec<String> {
    let mut lines = vec![format!("{heading}: {label}")];
    if let Some(descriptor) = descriptor {
        lines.push(format!("  stability: {}", descriptor.stability()));
        lines.push(format!("  sections: {}", descriptor.document().len()));
        if let Some(fingerprint) = descriptor.fingerprint() {
            lines.push(format!("  sha256: {fingerprint}"));
        }
    }
    lines
}

fn label_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightBlue.into()))
        .effects(Effects::BOLD)
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}
