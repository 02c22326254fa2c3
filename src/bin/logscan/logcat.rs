//! Logcat `threadtime` lines and the filter applied to them.

use optbind::OptionValue;
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

// MM-DD HH:MM:SS.mmm  PID  TID L TAG: message
static RE_THREADTIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{2}-\d{2})\s+(\d{2}:\d{2}:\d{2}\.\d{3})\s+(\d+)\s+(\d+)\s+([VDIWEF])\s+([^:]*?)\s*:\s?(.*)$",
    )
    .unwrap()
});

optbind::option_enum! {
    /// Logcat priority, ordered from least to most severe.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
    pub enum Level {
        #[default]
        Verbose = "V",
        Debug = "D",
        Info = "I",
        Warn = "W",
        Error = "E",
        Fatal = "F",
    }
}

impl Level {
    pub const ALL: [Level; 6] = [
        Level::Verbose,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
    ];

    pub fn from_letter(letter: &str) -> Option<Level> {
        Level::kind().translate(letter).and_then(Level::from_value)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine<'t> {
    pub date: &'t str,
    pub time: &'t str,
    pub pid: u32,
    pub tid: u32,
    pub level: Level,
    pub tag: &'t str,
    pub message: &'t str,
}

/// Parse one `threadtime` line; `None` for anything else.
pub fn parse_line(line: &str) -> Option<LogLine<'_>> {
    let caps = RE_THREADTIME.captures(line)?;
    Some(LogLine {
        date: caps.get(1)?.as_str(),
        time: caps.get(2)?.as_str(),
        pid: caps[3].parse().ok()?,
        tid: caps[4].parse().ok()?,
        level: Level::from_letter(&caps[5])?,
        tag: caps.get(6)?.as_str(),
        message: caps.get(7)?.as_str(),
    })
}

/// Which lines to keep.
#[derive(Debug, Default)]
pub struct Filter {
    pub min_level: Level,
    /// Keep only these tags; empty keeps every tag.
    pub tags: HashSet<String>,
    /// Per-tag minimum levels overriding `min_level`.
    pub tag_levels: HashMap<String, Level>,
}

impl Filter {
    pub fn keeps(&self, line: &LogLine<'_>) -> bool {
        if !self.tags.is_empty() && !self.tags.contains(line.tag) {
            return false;
        }
        let threshold = self
            .tag_levels
            .get(line.tag)
            .copied()
            .unwrap_or(self.min_level);
        line.level >= threshold
    }
}

/// Number of kept lines per level.
#[derive(Debug, Default)]
pub struct LevelCounts(BTreeMap<Level, usize>);

impl LevelCounts {
    pub fn record(&mut self, level: Level) {
        *self.0.entry(level).or_default() += 1;
    }

    pub fn get(&self, level: Level) -> usize {
        self.0.get(&level).copied().unwrap_or_default()
    }
}

impl fmt::Display for LevelCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for level in Level::ALL {
            writeln!(f, "{}\t{}", level, self.get(level))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str =
        "10-19 12:34:56.789  1234  5678 W ActivityManager: Slow operation: 120ms";

    #[test]
    fn parses_threadtime() {
        let line = parse_line(SAMPLE).unwrap();
        assert_eq!(line.date, "10-19");
        assert_eq!(line.time, "12:34:56.789");
        assert_eq!(line.pid, 1234);
        assert_eq!(line.tid, 5678);
        assert_eq!(line.level, Level::Warn);
        assert_eq!(line.tag, "ActivityManager");
        assert_eq!(line.message, "Slow operation: 120ms");
    }

    #[test]
    fn rejects_other_formats() {
        assert!(parse_line("--------- beginning of main").is_none());
        assert!(parse_line("W/ActivityManager( 1234): brief format").is_none());
        assert!(parse_line("").is_none());
    }

    #[test]
    fn levels_are_ordered() {
        assert!(Level::Verbose < Level::Debug);
        assert!(Level::Error < Level::Fatal);
        assert_eq!(Level::from_letter("e"), Some(Level::Error));
        assert_eq!(Level::from_letter("X"), None);
        assert_eq!(Level::Info.to_string(), "I");
    }

    #[test]
    fn filter_applies_tag_overrides() {
        let line = parse_line(SAMPLE).unwrap();
        let mut filter = Filter {
            min_level: Level::Error,
            ..Filter::default()
        };
        assert!(!filter.keeps(&line));
        filter
            .tag_levels
            .insert("ActivityManager".to_string(), Level::Info);
        assert!(filter.keeps(&line));
        filter.tags.insert("Other".to_string());
        assert!(!filter.keeps(&line));
    }

    #[test]
    fn counts_list_every_level() {
        let mut counts = LevelCounts::default();
        counts.record(Level::Warn);
        counts.record(Level::Warn);
        counts.record(Level::Error);
        assert_eq!(counts.get(Level::Warn), 2);
        assert_eq!(counts.to_string(), "V\t0\nD\t0\nI\t0\nW\t2\nE\t1\nF\t0\n");
    }
}
