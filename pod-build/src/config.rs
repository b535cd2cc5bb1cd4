//! Ini-style config files: runtime bootstrap configuration and package
//! manifests.
//!
//! The format is line oriented: an optional leading `; comment`,
//! `key=value` properties for the global section, then `[section]`
//! headers introducing further properties. A backslash escapes the next
//! character, which is how values carry newlines, `=` signs and comment
//! characters; an escaped CRLF pair collapses to one embedded newline.
//! Multi-valued properties are packed into a single string as
//! `Array[v1•v2•...]`.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::BuildError;
use crate::Result;

/// Delimiter inside packed list values, chosen to stay clear of
/// anything that plausibly appears in a path or version string.
pub const LIST_DELIMITER: char = '\u{2022}';

const LIST_PREFIX: &str = "Array[";
const LIST_SUFFIX: char = ']';

#[derive(Debug, Clone, thiserror::Error)]
#[error("malformed config at line {line}: {reason}")]
pub struct ConfigParseError {
    pub line: usize,
    pub reason: String,
}

/// One property map. Insertion order is preserved; setting an existing
/// key replaces its value in place.
#[derive(Debug, Clone, Default)]
pub struct Section {
    properties: Vec<(String, String)>,
}

impl Section {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.properties.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.properties.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// A sectioned property store: one global section plus named sections
/// in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    comment: Option<String>,
    global: Section,
    sections: Vec<(String, Section)>,
}

impl ConfigFile {
    pub fn new() -> ConfigFile {
        ConfigFile::default()
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = Some(comment.into());
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn global(&self) -> &Section {
        &self.global
    }

    /// Set a property in the global section.
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.global.set(key, value);
    }

    pub fn get_property(&self, key: &str) -> Option<&str> {
        self.global.get(key)
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
    }

    /// The named section, created empty if absent.
    pub fn section_mut(&mut self, name: &str) -> &mut Section {
        let idx = match self.sections.iter().position(|(n, _)| n == name) {
            Some(idx) => idx,
            None => {
                self.sections.push((name.to_string(), Section::default()));
                self.sections.len() - 1
            }
        };
        &mut self.sections[idx].1
    }

    pub fn sections(&self) -> impl Iterator<Item = (&str, &Section)> {
        self.sections.iter().map(|(n, s)| (n.as_str(), s))
    }

    /// Set a global property to a packed list value.
    pub fn set_list<S: AsRef<str>>(&mut self, key: impl Into<String>, values: &[S]) {
        self.global.set(key, pack_list(values));
    }

    pub fn get_list(&self, key: &str) -> Option<Vec<String>> {
        self.global.get(key).map(unpack_list)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<ConfigFile> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|source| BuildError::read(path, source))?;
        Ok(Self::parse(&text)?)
    }

    pub fn parse(text: &str) -> std::result::Result<ConfigFile, ConfigParseError> {
        Parser::default().run(text)
    }

    pub fn dump_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        if let Some(comment) = &self.comment {
            writeln!(writer, "; {}", comment)?;
        }
        write_section(writer, &self.global)?;
        for (name, section) in &self.sections {
            writeln!(writer, "[{}]", name)?;
            write_section(writer, section)?;
        }
        Ok(())
    }

    /// Write the config as UTF-8 text. May be called again after further
    /// mutation; each call serialises the current state.
    pub fn dump<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| BuildError::write(path, source))?;
        let mut writer = BufWriter::new(file);
        self.dump_to(&mut writer)
            .and_then(|_| writer.flush())
            .map_err(|source| BuildError::write(path, source))
    }
}

impl fmt::Display for ConfigFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::new();
        self.dump_to(&mut buf).map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8(buf).map_err(|_| fmt::Error)?)
    }
}

/// Pack values into the single-string `Array[v1•v2•...]` encoding.
pub fn pack_list<S: AsRef<str>>(values: &[S]) -> String {
    let mut out = String::from(LIST_PREFIX);
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push(LIST_DELIMITER);
        }
        out.push_str(value.as_ref());
    }
    out.push(LIST_SUFFIX);
    out
}

/// Reverse [`pack_list`]. A value without the `Array[...]` wrapper is a
/// single-element list.
pub fn unpack_list(value: &str) -> Vec<String> {
    let inner = value
        .strip_prefix(LIST_PREFIX)
        .and_then(|rest| rest.strip_suffix(LIST_SUFFIX));
    match inner {
        Some("") => vec![],
        Some(inner) => inner.split(LIST_DELIMITER).map(str::to_string).collect(),
        None => vec![value.to_string()],
    }
}

fn write_section<W: Write>(writer: &mut W, section: &Section) -> std::io::Result<()> {
    for (key, value) in section.iter() {
        let mut line = String::with_capacity(key.len() + value.len() + 1);
        escape_into(&mut line, key);
        line.push('=');
        escape_into(&mut line, value);
        writeln!(writer, "{}", line)?;
    }
    Ok(())
}

fn escape_into(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '\\' | '\r' | '\n' | '=' | ';' | '#' | '[' | ']' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    Escape,
    EscapedCrlf,
    Comment,
}

/// What the characters currently being read belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Key,
    Value,
    SectionName,
    SectionDone,
}

#[derive(Debug)]
struct Parser {
    state: State,
    target: Target,
    key: String,
    value: String,
    section_name: String,
    comment_buf: String,
    current_section: Option<String>,
    seen_content: bool,
    line: usize,
    out: ConfigFile,
}

impl Default for Parser {
    fn default() -> Self {
        Parser {
            state: State::Normal,
            target: Target::Key,
            key: String::new(),
            value: String::new(),
            section_name: String::new(),
            comment_buf: String::new(),
            current_section: None,
            seen_content: false,
            line: 1,
            out: ConfigFile::new(),
        }
    }
}

impl Parser {
    fn run(mut self, text: &str) -> std::result::Result<ConfigFile, ConfigParseError> {
        for c in text.chars() {
            self.step(c)?;
        }

        match self.state {
            State::Escape => {
                return Err(self.error("dangling escape at end of input"));
            }
            State::Comment => self.finish_comment(),
            State::Normal | State::EscapedCrlf => {}
        }
        self.end_line()?;

        Ok(self.out)
    }

    fn step(&mut self, c: char) -> std::result::Result<(), ConfigParseError> {
        match self.state {
            State::Escape => {
                match c {
                    // an escaped CR may be half of an escaped CRLF pair;
                    // either way it contributes one embedded newline
                    '\r' => {
                        self.buf().push('\n');
                        self.state = State::EscapedCrlf;
                        return Ok(());
                    }
                    '\n' => {
                        self.buf().push('\n');
                        self.line += 1;
                    }
                    c => self.buf().push(c),
                }
                self.state = State::Normal;
                Ok(())
            }
            State::EscapedCrlf => {
                self.state = State::Normal;
                if c == '\n' {
                    self.line += 1;
                    return Ok(());
                }
                self.step(c)
            }
            State::Comment => {
                if c == '\n' {
                    self.finish_comment();
                    self.state = State::Normal;
                    self.end_line()?;
                    self.line += 1;
                } else {
                    self.comment_buf.push(c);
                }
                Ok(())
            }
            State::Normal => self.step_normal(c),
        }
    }

    fn step_normal(&mut self, c: char) -> std::result::Result<(), ConfigParseError> {
        match c {
            '\\' => {
                self.state = State::Escape;
                Ok(())
            }
            '\n' => {
                self.end_line()?;
                self.line += 1;
                Ok(())
            }
            '\r' => Ok(()),
            _ => match self.target {
                Target::SectionName => {
                    if c == ']' {
                        self.target = Target::SectionDone;
                    } else {
                        self.section_name.push(c);
                    }
                    Ok(())
                }
                Target::SectionDone => {
                    if c.is_whitespace() {
                        Ok(())
                    } else {
                        Err(self.error("unexpected characters after section header"))
                    }
                }
                Target::Key | Target::Value => {
                    match c {
                        ';' | '#' if self.buf().trim().is_empty() => {
                            // comment opens only where no key/value text
                            // has been written yet
                            self.state = State::Comment;
                        }
                        '[' if self.target == Target::Key && self.key.trim().is_empty() => {
                            self.target = Target::SectionName;
                            self.section_name.clear();
                        }
                        '=' if self.target == Target::Key => {
                            self.target = Target::Value;
                        }
                        c => self.buf().push(c),
                    }
                    Ok(())
                }
            },
        }
    }

    fn buf(&mut self) -> &mut String {
        match self.target {
            Target::Value => &mut self.value,
            _ => &mut self.key,
        }
    }

    fn finish_comment(&mut self) {
        // only a whole-line comment before any content counts as the
        // file comment
        if !self.seen_content && self.target == Target::Key && self.out.comment.is_none() {
            self.out.comment = Some(self.comment_buf.trim().to_string());
        }
        self.comment_buf.clear();
    }

    fn end_line(&mut self) -> std::result::Result<(), ConfigParseError> {
        match self.target {
            Target::SectionName => return Err(self.error("unterminated section header")),
            Target::SectionDone => {
                let name = self.section_name.trim().to_string();
                if name.is_empty() {
                    return Err(self.error("empty section name"));
                }
                self.out.section_mut(&name);
                self.current_section = Some(name);
                self.seen_content = true;
            }
            Target::Key => {
                if !self.key.trim().is_empty() {
                    return Err(self.error("property line without `=`"));
                }
            }
            Target::Value => {
                let key = self.key.trim().to_string();
                let value = self.value.trim().to_string();
                let section = match &self.current_section {
                    Some(name) => self.out.section_mut(name),
                    None => &mut self.out.global,
                };
                section.set(key, value);
                self.seen_content = true;
            }
        }

        self.key.clear();
        self.value.clear();
        self.target = Target::Key;
        Ok(())
    }

    fn error(&self, reason: impl Into<String>) -> ConfigParseError {
        ConfigParseError {
            line: self.line,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_properties_and_sections() {
        let config = ConfigFile::parse(
            "; runtime configuration\n\
             name=demo\n\
             version=1.2.0\n\
             [generator]\n\
             by=tester@example\n",
        )
        .unwrap();

        assert_eq!(config.comment(), Some("runtime configuration"));
        assert_eq!(config.get_property("name"), Some("demo"));
        assert_eq!(config.get_property("version"), Some("1.2.0"));
        assert_eq!(
            config.section("generator").unwrap().get("by"),
            Some("tester@example")
        );
    }

    #[test]
    fn whitespace_around_keys_and_values_is_trimmed() {
        let config = ConfigFile::parse("  name  =  spaced out  \n").unwrap();
        assert_eq!(config.get_property("name"), Some("spaced out"));
    }

    #[test]
    fn setting_an_existing_key_replaces_in_place() {
        let mut config = ConfigFile::new();
        config.set_property("a", "1");
        config.set_property("b", "2");
        config.set_property("a", "3");

        let keys: Vec<_> = config.global().iter().collect();
        assert_eq!(keys, [("a", "3"), ("b", "2")]);
    }

    #[test]
    fn comment_chars_mid_value_are_literal() {
        let config = ConfigFile::parse("url=http://example#frag\n").unwrap();
        assert_eq!(config.get_property("url"), Some("http://example#frag"));
    }

    #[test]
    fn comment_at_value_start_truncates_the_value() {
        let config = ConfigFile::parse("key= ; trailing comment\n").unwrap();
        assert_eq!(config.get_property("key"), Some(""));
    }

    #[test]
    fn escaped_newline_survives_round_trip() {
        let mut config = ConfigFile::new();
        config.set_property("text", "line one\nline two");

        let dumped = config.to_string();
        let reparsed = ConfigFile::parse(&dumped).unwrap();
        assert_eq!(reparsed.get_property("text"), Some("line one\nline two"));
    }

    #[test]
    fn escaped_crlf_collapses_to_one_newline() {
        let config = ConfigFile::parse("key=a\\\r\nb\n").unwrap();
        assert_eq!(config.get_property("key"), Some("a\nb"));
    }

    #[test]
    fn escaped_equals_in_key() {
        let config = ConfigFile::parse("a\\=b=c\n").unwrap();
        assert_eq!(config.get_property("a=b"), Some("c"));
    }

    #[test]
    fn list_round_trip() {
        let mut config = ConfigFile::new();
        config.set_list("paths", &["x", "y", "z"]);

        let dumped = config.to_string();
        let reparsed = ConfigFile::parse(&dumped).unwrap();
        assert_eq!(
            reparsed.get_list("paths").unwrap(),
            vec!["x".to_string(), "y".to_string(), "z".to_string()]
        );
    }

    #[test]
    fn unwrapped_value_unpacks_to_single_element() {
        assert_eq!(unpack_list("plain"), vec!["plain".to_string()]);
        assert_eq!(unpack_list("Array[]"), Vec::<String>::new());
    }

    #[test]
    fn property_line_without_equals_is_an_error() {
        let err = ConfigFile::parse("first=ok\nnot a property\n").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn unterminated_section_header_is_an_error() {
        let err = ConfigFile::parse("[oops\n").unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn dangling_escape_is_an_error() {
        assert!(ConfigFile::parse("key=value\\").is_err());
    }
}
