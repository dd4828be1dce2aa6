use std::fmt::Display;

use feedauth_registry::Feed;
use supports_unicode::Stream;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Success,
    Warning,
    Failure,
    Skipped,
    Written,
    Key,
    Memo,
    Search,
    Start,
    Feeds,
    Done,
}

/// Operator-facing console output.
///
/// Status lines and warnings are suppressed in silent mode. Errors, and the
/// condensed summary of feeds needing attention, are always shown.
#[derive(Debug, Clone)]
pub struct Reporter {
    silent: bool,
    unicode: bool,
}

impl Reporter {
    pub fn new(silent: bool) -> Self {
        Self {
            silent,
            unicode: supports_unicode::on(Stream::Stdout),
        }
    }

    /// Forces ASCII icons, whatever the terminal supports.
    pub fn ascii(mut self) -> Self {
        self.unicode = false;
        self
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    pub fn icon(&self, icon: Icon) -> &'static str {
        use Icon::*;
        match (icon, self.unicode) {
            (Success, true) => "✅ ",
            (Success, false) => "[ok] ",
            (Warning, true) => "⚠️  ",
            (Warning, false) => "[!] ",
            (Failure, true) => "❌ ",
            (Failure, false) => "[x] ",
            (Skipped, true) => "⏭️  ",
            (Skipped, false) => "[skip] ",
            (Written, true) => "✓ ",
            (Written, false) => "+ ",
            (Key, true) => "🔑 ",
            (Memo, true) => "📝 ",
            (Search, true) => "🔍 ",
            (Start, true) => "🚀 ",
            (Feeds, true) => "📦 ",
            (Done, true) => "🎉 ",
            (Key | Memo | Search | Start | Feeds | Done, false) => "",
        }
    }

    pub fn status(&self, message: impl Display) {
        if !self.silent {
            println!("{message}");
        }
    }

    pub fn warn(&self, message: impl Display) {
        if !self.silent {
            eprintln!("{message}");
        }
    }

    pub fn error(&self, message: impl Display) {
        eprintln!("{message}");
    }

    /// Diagnostic output of a failed probe: indented under the feed's status
    /// line normally, or raw on stderr in silent mode.
    pub fn detail(&self, detail: Option<&str>) {
        let Some(detail) = detail else {
            return;
        };
        if self.silent {
            eprintln!("{detail}");
        } else {
            println!("{}", indent(detail, 8));
        }
    }

    /// The short list of feeds needing authentication shown in silent mode.
    pub fn summary<'a>(&self, feeds: impl IntoIterator<Item = &'a Feed>) {
        println!("Some feeds require authentication:");
        for feed in feeds {
            println!(" - {feed}");
        }
        println!("Run without --silent for more details.");
    }
}

fn indent(text: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    text.lines()
        .map(|line| format!("{pad}{}", line.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn indents_and_trims_every_line() {
        assert_eq!(
            indent("npm ERR! code ECONNRESET\n   npm ERR! network", 4),
            "    npm ERR! code ECONNRESET\n    npm ERR! network"
        );
    }

    #[test]
    fn ascii_icons() {
        let reporter = Reporter::new(true).ascii();
        assert_eq!(reporter.icon(Icon::Failure), "[x] ");
        assert_eq!(reporter.icon(Icon::Done), "");
        assert!(reporter.is_silent());
    }
}
