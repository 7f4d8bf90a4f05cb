//! Terminal output for view payloads: sizes, dates, colours and indentation.

use std::io::{self, Write};

use chrono::DateTime;
use colored::Colorize;
use serde::Serialize;

use crate::config::Config;
use crate::torrent::{FileEntryWarning, TorrentMetadata};
use crate::utils::text::{is_printable, lossy};
use crate::view::{DumpRow, ViewPayload};

#[derive(Debug, Clone, Copy)]
enum Style {
    Header,
    Label,
    Index,
    Size,
    Date,
    Unprintable,
    Plain,
}

/// One JSON document per input file.
#[derive(Serialize)]
struct JsonDocument<'a, 'b> {
    file: &'a str,
    #[serde(flatten)]
    payload: &'a ViewPayload<'b>,
    skipped: &'a [FileEntryWarning],
}

#[derive(Debug, Clone)]
pub struct Renderer {
    pub colour: bool,
    pub ascii_only: bool,
    pub tab: String,
}

impl From<&Config> for Renderer {
    fn from(config: &Config) -> Self {
        Self {
            colour: config.colour,
            ascii_only: config.ascii_only,
            tab: config.tab.clone(),
        }
    }
}

/// Human readable size, e.g. `1.5MB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1}{}", size, UNITS[unit])
}

/// POSIX seconds as a UTC timestamp, if representable.
pub fn format_date(seconds: i64) -> Option<String> {
    DateTime::from_timestamp(seconds, 0).map(|d| d.format("%Y/%m/%d %H:%M:%S UTC").to_string())
}

impl Renderer {
    fn paint(&self, text: String, style: Style) -> String {
        if !self.colour {
            return text;
        }
        match style {
            Style::Header => text.bold().to_string(),
            Style::Label => text.bright_green().bold().to_string(),
            Style::Index => text.bright_yellow().bold().to_string(),
            Style::Size => text.cyan().to_string(),
            Style::Date => text.magenta().to_string(),
            Style::Unprintable => text.bright_red().bold().to_string(),
            Style::Plain => text,
        }
    }

    /// Raw bytes as display text, or a `[N UTF-8 Bytes]` placeholder.
    fn text(&self, bytes: &[u8]) -> String {
        if is_printable(bytes, self.ascii_only) {
            self.paint(lossy(bytes), Style::Plain)
        } else {
            self.paint(format!("[{} UTF-8 Bytes]", bytes.len()), Style::Unprintable)
        }
    }

    fn indent(&self, depth: usize) -> String {
        self.tab.repeat(depth)
    }

    fn line<W: Write>(&self, out: &mut W, label: &str, value: &str) -> io::Result<()> {
        writeln!(
            out,
            "{}{}{}",
            self.paint(format!("{}{:<12}", self.indent(1), label), Style::Label),
            self.tab,
            value
        )
    }

    pub fn header<W: Write>(&self, out: &mut W, file_name: &str) -> io::Result<()> {
        writeln!(out, "{}", self.paint(file_name.to_string(), Style::Header))
    }

    pub fn render<W: Write>(&self, out: &mut W, payload: &ViewPayload<'_>) -> io::Result<()> {
        match payload {
            ViewPayload::Basic {
                metadata,
                total_size,
                file_count,
            } => {
                self.summary(out, metadata)?;
                if metadata.is_multi_file {
                    self.line(out, "num files", &file_count.to_string())?;
                    self.line(out, "total size", &self.paint(format_size(*total_size), Style::Size))
                } else {
                    self.line(out, "file name", &self.text(&metadata.name))?;
                    self.line(out, "file size", &self.paint(format_size(*total_size), Style::Size))
                }
            }
            ViewPayload::TopLevelOnly { entries, .. } => {
                for entry in entries {
                    let suffix = if entry.is_directory { "/" } else { "" };
                    writeln!(
                        out,
                        "{}{}{}{}{}",
                        self.indent(1),
                        self.text(entry.name),
                        suffix,
                        self.tab,
                        self.paint(format_size(entry.size), Style::Size)
                    )?;
                }
                Ok(())
            }
            ViewPayload::WithFiles { metadata, files } => {
                self.summary(out, metadata)?;
                writeln!(out, "{}", self.paint(format!("{}files", self.indent(1)), Style::Label))?;
                for (index, file) in files.iter().enumerate() {
                    writeln!(out, "{}", self.paint(format!("{}{}", self.indent(2), index), Style::Index))?;
                    let path = file
                        .path_components
                        .iter()
                        .map(|c| self.text(c))
                        .collect::<Vec<_>>()
                        .join("/");
                    writeln!(out, "{}{}", self.indent(3), path)?;
                    writeln!(
                        out,
                        "{}{}",
                        self.indent(3),
                        self.paint(format_size(file.size), Style::Size)
                    )?;
                }
                Ok(())
            }
            ViewPayload::FullDump { metadata, rows, .. } => {
                self.summary(out, metadata)?;
                writeln!(out, "{}", self.paint(format!("{}files", self.indent(1)), Style::Label))?;
                for row in rows {
                    self.dump_row(out, row)?;
                }
                self.line(out, "piece length", &metadata.piece_length.to_string())?;
                self.line(out, "pieces", &metadata.piece_count.to_string())?;
                if metadata.private {
                    self.line(out, "private", "yes")?;
                }
                Ok(())
            }
        }
    }

    /// Writes `payload` as JSON, tagged with the input it came from and the
    /// file entries that were skipped while reading it.
    pub fn render_json<W: Write>(
        &self,
        out: &mut W,
        file: &str,
        payload: &ViewPayload<'_>,
        skipped: &[FileEntryWarning],
    ) -> io::Result<()> {
        let document = JsonDocument {
            file,
            payload,
            skipped,
        };
        serde_json::to_writer_pretty(&mut *out, &document)?;
        writeln!(out)
    }

    fn summary<W: Write>(&self, out: &mut W, metadata: &TorrentMetadata) -> io::Result<()> {
        let optional = |value: &Option<String>| {
            value
                .as_deref()
                .map(|v| self.text(v.as_bytes()))
                .unwrap_or_default()
        };

        self.line(out, "name", &self.text(&metadata.name))?;
        self.line(out, "tracker url", &optional(&metadata.announce_url))?;
        self.line(out, "created by", &optional(&metadata.created_by))?;

        let created_on = match metadata.creation_date {
            Some(seconds) => match format_date(seconds) {
                Some(date) => self.paint(date, Style::Date),
                None => self.paint("[Not A Date]".to_string(), Style::Unprintable),
            },
            None => String::new(),
        };
        self.line(out, "created on", &created_on)?;

        if metadata.comment.is_some() {
            self.line(out, "comment", &optional(&metadata.comment))?;
        }
        Ok(())
    }

    fn dump_row<W: Write>(&self, out: &mut W, row: &DumpRow<'_>) -> io::Result<()> {
        let suffix = if row.is_directory { "/" } else { "" };
        writeln!(
            out,
            "{}{}{}{}{}",
            self.indent(row.depth + 2),
            self.text(row.name),
            suffix,
            self.tab,
            self.paint(format_size(row.size), Style::Size)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bencode::DecodeOptions;
    use crate::torrent::Torrent;
    use crate::view::{select_view, ViewMode};

    fn plain() -> Renderer {
        Renderer {
            colour: false,
            ascii_only: false,
            tab: "  ".to_string(),
        }
    }

    fn render(torrent: &Torrent, mode: ViewMode, renderer: &Renderer) -> String {
        let payload = select_view(
            mode,
            &torrent.metadata,
            &torrent.files.entries,
            &torrent.hierarchy,
        );
        let mut out = Vec::new();
        renderer.render(&mut out, &payload).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn multi() -> Torrent {
        Torrent::from_bytes(
            b"d7:comment2:hi10:created by4:test13:creation datei0e4:infod5:filesl\
d6:lengthi2048e4:pathl3:dir5:a.binee\
d6:lengthi1e4:pathl2:\xff\xfeee\
e4:name4:proj12:piece lengthi16384e6:pieces40:\
0123456789012345678901234567890123456789ee",
            DecodeOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0.0B");
        assert_eq!(format_size(100), "100.0B");
        assert_eq!(format_size(1536), "1.5KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024 * 1024), "3072.0GB");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(0).as_deref(), Some("1970/01/01 00:00:00 UTC"));
        assert_eq!(
            format_date(1_700_000_000).as_deref(),
            Some("2023/11/14 22:13:20 UTC")
        );
        assert_eq!(format_date(i64::MAX), None);
    }

    #[test]
    fn test_basic_multi_file_output() {
        let text = render(&multi(), ViewMode::Basic, &plain());
        assert!(text.contains("  name          proj\n"), "{}", text);
        assert!(text.contains("  created on    1970/01/01 00:00:00 UTC\n"), "{}", text);
        assert!(text.contains("  comment       hi\n"), "{}", text);
        assert!(text.contains("  num files     2\n"), "{}", text);
        assert!(text.contains("  total size    2.0KB\n"), "{}", text);
    }

    #[test]
    fn test_unprintable_names_are_summarised() {
        let text = render(&multi(), ViewMode::WithFiles, &plain());
        assert!(text.contains("      [2 UTF-8 Bytes]\n"), "{}", text);
        assert!(text.contains("      dir/a.bin\n"), "{}", text);
        assert!(text.contains("    1\n"), "{}", text);
    }

    #[test]
    fn test_ascii_only_mode() {
        let torrent = Torrent::from_bytes(
            "d4:infod6:lengthi1e4:name6:caf\u{e9}!ee".as_bytes(),
            DecodeOptions::default(),
        )
        .unwrap();
        let unicode = render(&torrent, ViewMode::Basic, &plain());
        assert!(unicode.contains("caf\u{e9}!"), "{}", unicode);

        let ascii = Renderer {
            ascii_only: true,
            ..plain()
        };
        let text = render(&torrent, ViewMode::Basic, &ascii);
        assert!(text.contains("[6 UTF-8 Bytes]"), "{}", text);
    }

    #[test]
    fn test_full_dump_indents_by_depth() {
        let text = render(&multi(), ViewMode::FullDump, &plain());
        assert!(text.contains("\n    proj/  2.0KB\n"), "{}", text);
        assert!(text.contains("\n      dir/  2.0KB\n"), "{}", text);
        assert!(text.contains("\n        a.bin  2.0KB\n"), "{}", text);
        assert!(text.contains("  pieces        2\n"), "{}", text);
    }

    #[test]
    fn test_top_level_output() {
        let text = render(&multi(), ViewMode::TopLevelOnly, &plain());
        assert_eq!(text, "  dir/  2.0KB\n  [2 UTF-8 Bytes]  1.0B\n");
    }

    #[test]
    fn test_json_output() {
        let torrent = multi();
        let payload = select_view(
            ViewMode::Basic,
            &torrent.metadata,
            &torrent.files.entries,
            &torrent.hierarchy,
        );
        let mut out = Vec::new();
        plain()
            .render_json(&mut out, "multi.torrent", &payload, &torrent.files.warnings)
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["file"], "multi.torrent");
        assert_eq!(json["skipped"], serde_json::json!([]));
        assert_eq!(json["view"], "basic");
        assert_eq!(json["total_size"], 2049);
        assert_eq!(json["metadata"]["comment"], "hi");
    }

    #[test]
    fn test_json_lists_skipped_entries() {
        let torrent = Torrent::from_bytes(
            b"d4:infod5:filesld6:lengthi1e4:pathl1:aeei7ee4:name1:Xee",
            DecodeOptions::default(),
        )
        .unwrap();
        let payload = select_view(
            ViewMode::WithFiles,
            &torrent.metadata,
            &torrent.files.entries,
            &torrent.hierarchy,
        );
        let mut out = Vec::new();
        plain()
            .render_json(&mut out, "x.torrent", &payload, &torrent.files.warnings)
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["view"], "with_files");
        assert_eq!(json["files"][0]["path"], serde_json::json!(["a"]));
        assert_eq!(json["skipped"][0]["index"], 1);
        assert_eq!(json["skipped"][0]["reason"], "entry is not a dictionary");
    }
}
