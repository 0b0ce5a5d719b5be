//! Stand-in browser capabilities for sandboxed scripts
//!
//! Scripts written for a browser touch `console`, `document` and `window`
//! before doing anything else. The sandbox answers those calls with the inert
//! implementations below so the script keeps running; nothing here models a
//! render tree. The JavaScript side of the surface is thin glue that forwards
//! every call to one of these traits.

use crate::limits::{LoadEventMode, SandboxLimits};
use serde::Serialize;

/// Console method a line was written with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Log,
    Info,
    Warn,
    Error,
    Debug,
}

impl ConsoleLevel {
    pub fn parse(level: &str) -> Self {
        match level {
            "info" => ConsoleLevel::Info,
            "warn" => ConsoleLevel::Warn,
            "error" => ConsoleLevel::Error,
            "debug" => ConsoleLevel::Debug,
            _ => ConsoleLevel::Log,
        }
    }

    /// Prefix distinguishing the line in the collected output
    pub fn marker(self) -> &'static str {
        match self {
            ConsoleLevel::Log | ConsoleLevel::Debug => "",
            ConsoleLevel::Info => "[info] ",
            ConsoleLevel::Warn => "[warn] ",
            ConsoleLevel::Error => "[error] ",
        }
    }
}

/// Destination of everything a script prints
pub trait ConsoleSink: Send {
    fn write(&mut self, level: ConsoleLevel, text: &str);

    fn last_line(&self) -> Option<&str>;

    /// Drain collected lines
    fn take_lines(&mut self) -> Vec<String>;
}

/// Line buffer with an upper bound
#[derive(Debug, Default)]
pub struct BufferedConsole {
    lines: Vec<String>,
    max_lines: usize,
    dropped: usize,
}

impl BufferedConsole {
    pub fn new(max_lines: usize) -> Self {
        Self {
            lines: Vec::new(),
            max_lines,
            dropped: 0,
        }
    }
}

impl ConsoleSink for BufferedConsole {
    fn write(&mut self, level: ConsoleLevel, text: &str) {
        if self.lines.len() >= self.max_lines {
            self.dropped += 1;
            return;
        }
        self.lines.push(format!("{}{}", level.marker(), text));
    }

    fn last_line(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }

    fn take_lines(&mut self) -> Vec<String> {
        let mut lines = std::mem::take(&mut self.lines);
        if self.dropped > 0 {
            lines.push(format!("... {} more lines truncated", self.dropped));
            self.dropped = 0;
        }
        lines
    }
}

/// How a script reached an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementLookup<'a> {
    Selector(&'a str),
    Id(&'a str),
    ClassName(&'a str),
    TagName(&'a str),
    Create(&'a str),
}

impl<'a> ElementLookup<'a> {
    pub fn parse(kind: &str, query: &'a str) -> Self {
        match kind {
            "id" => ElementLookup::Id(query),
            "class" => ElementLookup::ClassName(query),
            "tag" => ElementLookup::TagName(query),
            "create" => ElementLookup::Create(query),
            _ => ElementLookup::Selector(query),
        }
    }
}

/// Shape handed back to the script for an element stub
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementDescriptor {
    pub tag_name: String,
    pub id: String,
    pub class_name: String,
    /// Human-readable handle used in recorded lines, e.g. `#app`
    pub label: String,
}

/// Stand-in for `document`
pub trait DocumentStub: Send {
    fn resolve(&mut self, lookup: ElementLookup<'_>) -> ElementDescriptor;

    /// A listener was attached to `target`; returns the line to record, if any
    fn listener_added(&mut self, target: &str, event: &str) -> Option<String>;
}

/// Storage object a script addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageArea {
    Local,
    Session,
}

impl StorageArea {
    pub fn parse(area: &str) -> Self {
        if area == "session" {
            StorageArea::Session
        } else {
            StorageArea::Local
        }
    }
}

/// Stand-in for `window`
pub trait WindowStub: Send {
    /// Returns the line recorded for the alert
    fn alert(&mut self, message: &str) -> String;

    fn confirm(&mut self, message: &str) -> bool;

    fn prompt(&mut self, message: &str, default: Option<&str>) -> Option<String>;

    fn storage_get(&mut self, area: StorageArea, key: &str) -> Option<String>;

    fn storage_set(&mut self, area: StorageArea, key: &str, value: &str);

    fn load_event_mode(&self) -> LoadEventMode;
}

/// Document stub answering every lookup with a fresh element
#[derive(Debug, Default)]
pub struct InertDocument {
    lookups: usize,
}

impl InertDocument {
    pub fn lookups(&self) -> usize {
        self.lookups
    }
}

impl DocumentStub for InertDocument {
    fn resolve(&mut self, lookup: ElementLookup<'_>) -> ElementDescriptor {
        self.lookups += 1;
        let (tag_name, id, class_name, label) = match lookup {
            ElementLookup::Id(id) => ("div", id, "", format!("#{}", id)),
            ElementLookup::ClassName(class) => ("div", "", class, format!(".{}", class)),
            ElementLookup::TagName(tag) | ElementLookup::Create(tag) => {
                (tag, "", "", tag.to_ascii_lowercase())
            }
            ElementLookup::Selector(selector) => {
                if let Some(id) = selector.strip_prefix('#') {
                    ("div", id, "", selector.to_string())
                } else if let Some(class) = selector.strip_prefix('.') {
                    ("div", "", class, selector.to_string())
                } else {
                    ("div", "", "", selector.to_string())
                }
            }
        };
        ElementDescriptor {
            tag_name: tag_name.to_ascii_lowercase(),
            id: id.to_string(),
            class_name: class_name.to_string(),
            label,
        }
    }

    fn listener_added(&mut self, target: &str, event: &str) -> Option<String> {
        Some(format!("Event listener registered: '{}' on {}", event, target))
    }
}

/// Window stub with empty storage and negative dialogs
#[derive(Debug)]
pub struct InertWindow {
    load_event_mode: LoadEventMode,
}

impl InertWindow {
    pub fn new(load_event_mode: LoadEventMode) -> Self {
        Self { load_event_mode }
    }
}

impl WindowStub for InertWindow {
    fn alert(&mut self, message: &str) -> String {
        format!("[alert] {}", message)
    }

    fn confirm(&mut self, _message: &str) -> bool {
        false
    }

    fn prompt(&mut self, _message: &str, _default: Option<&str>) -> Option<String> {
        None
    }

    fn storage_get(&mut self, _area: StorageArea, _key: &str) -> Option<String> {
        None
    }

    fn storage_set(&mut self, _area: StorageArea, _key: &str, _value: &str) {}

    fn load_event_mode(&self) -> LoadEventMode {
        self.load_event_mode
    }
}

/// The request-scoped set of stand-ins a sandbox sees
pub struct HostSurface {
    console: Box<dyn ConsoleSink>,
    document: Box<dyn DocumentStub>,
    window: Box<dyn WindowStub>,
}

impl HostSurface {
    pub fn new(
        console: impl ConsoleSink + 'static,
        document: impl DocumentStub + 'static,
        window: impl WindowStub + 'static,
    ) -> Self {
        Self {
            console: Box::new(console),
            document: Box::new(document),
            window: Box::new(window),
        }
    }

    /// Default surface for a run under `limits`
    pub fn inert(limits: &SandboxLimits) -> Self {
        Self::new(
            BufferedConsole::new(limits.max_output_lines),
            InertDocument::default(),
            InertWindow::new(limits.load_event_mode),
        )
    }

    pub fn log(&mut self, level: ConsoleLevel, text: &str) {
        self.console.write(level, text);
    }

    pub fn resolve(&mut self, lookup: ElementLookup<'_>) -> ElementDescriptor {
        self.document.resolve(lookup)
    }

    pub fn element_listener(&mut self, target: &str, event: &str) {
        if let Some(line) = self.document.listener_added(target, event) {
            self.console.write(ConsoleLevel::Log, &line);
        }
    }

    /// Returns true when the listener must be invoked right away
    pub fn window_listener(&mut self, event: &str) -> bool {
        if event == "load" && self.window.load_event_mode() == LoadEventMode::Immediate {
            return true;
        }
        self.console.write(
            ConsoleLevel::Log,
            &format!("Event listener registered: '{}' on window", event),
        );
        false
    }

    pub fn alert(&mut self, message: &str) {
        let line = self.window.alert(message);
        self.console.write(ConsoleLevel::Log, &line);
    }

    pub fn confirm(&mut self, message: &str) -> bool {
        self.window.confirm(message)
    }

    pub fn prompt(&mut self, message: &str, default: Option<&str>) -> Option<String> {
        self.window.prompt(message, default)
    }

    pub fn storage_get(&mut self, area: StorageArea, key: &str) -> Option<String> {
        self.window.storage_get(area, key)
    }

    pub fn storage_set(&mut self, area: StorageArea, key: &str, value: &str) {
        self.window.storage_set(area, key, value);
    }

    pub fn require(&mut self, module: &str) {
        self.console.write(
            ConsoleLevel::Warn,
            &format!("require('{}') is simulated; returning an empty object", module),
        );
    }

    pub fn fetch(&mut self, url: &str) {
        self.console.write(
            ConsoleLevel::Info,
            &format!("fetch('{}') is simulated; returning an empty response", url),
        );
    }

    /// Append `Result: <value>` unless the value is already the last line
    pub fn record_completion(&mut self, value: &str) {
        if self.console.last_line() != Some(value) {
            self.console
                .write(ConsoleLevel::Log, &format!("Result: {}", value));
        }
    }

    pub fn into_lines(mut self) -> Vec<String> {
        self.console.take_lines()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_markers() {
        let mut console = BufferedConsole::new(10);
        console.write(ConsoleLevel::Log, "plain");
        console.write(ConsoleLevel::Info, "note");
        console.write(ConsoleLevel::Warn, "careful");
        console.write(ConsoleLevel::Error, "broken");
        assert_eq!(
            console.take_lines(),
            vec!["plain", "[info] note", "[warn] careful", "[error] broken"]
        );
    }

    #[test]
    fn test_console_truncates() {
        let mut console = BufferedConsole::new(2);
        for i in 0..5 {
            console.write(ConsoleLevel::Log, &i.to_string());
        }
        assert_eq!(
            console.take_lines(),
            vec!["0", "1", "... 3 more lines truncated"]
        );
    }

    #[test]
    fn test_document_lookups() {
        let mut document = InertDocument::default();
        let by_id = document.resolve(ElementLookup::Id("app"));
        assert_eq!(by_id.label, "#app");
        assert_eq!(by_id.id, "app");

        let created = document.resolve(ElementLookup::Create("BUTTON"));
        assert_eq!(created.tag_name, "button");

        let by_selector = document.resolve(ElementLookup::parse("selector", ".card"));
        assert_eq!(by_selector.class_name, "card");
        assert_eq!(document.lookups(), 3);
    }

    #[test]
    fn test_window_load_fires_immediately_by_default() {
        let mut host = HostSurface::inert(&SandboxLimits::default());
        assert!(host.window_listener("load"));
        assert!(!host.window_listener("resize"));
        assert_eq!(
            host.into_lines(),
            vec!["Event listener registered: 'resize' on window"]
        );
    }

    #[test]
    fn test_window_load_can_be_recorded() {
        let limits = SandboxLimits {
            load_event_mode: LoadEventMode::Record,
            ..SandboxLimits::default()
        };
        let mut host = HostSurface::inert(&limits);
        assert!(!host.window_listener("load"));
    }

    #[test]
    fn test_dialogs_and_storage_are_negative() {
        let mut host = HostSurface::inert(&SandboxLimits::default());
        assert!(!host.confirm("sure?"));
        assert_eq!(host.prompt("name?", Some("x")), None);
        host.storage_set(StorageArea::Local, "k", "v");
        assert_eq!(host.storage_get(StorageArea::Local, "k"), None);
        host.alert("hello");
        assert_eq!(host.into_lines(), vec!["[alert] hello"]);
    }

    #[test]
    fn test_completion_is_not_repeated() {
        let mut host = HostSurface::inert(&SandboxLimits::default());
        host.log(ConsoleLevel::Log, "2");
        host.record_completion("2");
        host.record_completion("3");
        assert_eq!(host.into_lines(), vec!["2", "Result: 3"]);
    }
}
