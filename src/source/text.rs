//! Text manifest format
//!
//! One entry per line. Indentation gives nesting, `#` starts a comment that
//! runs to the end of the line, and an optional `{ key: value, ... }` block
//! after the name carries attributes:
//!
//! ```text
//! etc {mode: 0o040755}
//!     passwd {size: 1024, mode: 0o100644}
//! usr
//!     bin
//! ```

use crate::error::ManifestError;
use crate::source::ManifestBuilder;
use crate::tree::{AttrKey, Attributes, Manifest, NodeId};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, instrument};

const TAB_WIDTH: usize = 8;

/// One logical line of manifest text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    /// 1-based line number in the source
    pub line: usize,
    /// Nesting level, 0 for top-level entries
    pub level: usize,
    pub name: String,
    pub attrs: Attributes,
}

/// Parser for the text manifest format
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestParser;

impl ManifestParser {
    pub fn new() -> Self {
        Self
    }

    /// Lazily split `lines` into `(level, name, attrs)` records
    ///
    /// Blank and comment-only lines produce nothing. `source_name` is only
    /// used in error messages.
    pub fn parse_lines<I, S>(&self, lines: I, source_name: &str) -> ParseLines<I::IntoIter>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ParseLines {
            lines: lines.into_iter(),
            source_name: source_name.to_string(),
            indents: vec![0],
            line: 0,
            failed: false,
        }
    }

    /// Assemble parsed lines into a manifest
    pub fn build_lines<I>(&self, lines: I) -> Result<Manifest, ManifestError>
    where
        I: IntoIterator<Item = Result<ParsedLine, ManifestError>>,
    {
        let mut manifest = Manifest::new();
        let root = manifest.root().id();
        // open[n] is the parent for entries at level n
        let mut open: Vec<NodeId> = vec![root];
        let mut prev = root;

        for parsed in lines {
            let parsed = parsed?;
            if parsed.level >= open.len() {
                open.push(prev);
            } else {
                open.truncate(parsed.level + 1);
            }
            let parent = open[parsed.level];
            prev = manifest.add_child(parent, &parsed.name, parsed.attrs)?;
        }
        Ok(manifest)
    }

    pub fn parse_str(&self, text: &str) -> Result<Manifest, ManifestError> {
        self.parse_named(text, "<string>")
    }

    pub fn parse_reader<R: Read>(
        &self,
        mut reader: R,
        source_name: &str,
    ) -> Result<Manifest, ManifestError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        self.parse_named(&text, source_name)
    }

    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub fn parse_file(&self, path: &Path) -> Result<Manifest, ManifestError> {
        let start = Instant::now();
        let text =
            fs::read_to_string(path).map_err(|e| ManifestError::unreadable(path, e))?;
        let manifest = self.parse_named(&text, &path.display().to_string())?;
        info!(
            entry_count = manifest.entry_count(),
            duration_ms = start.elapsed().as_millis(),
            "Parsed manifest file"
        );
        Ok(manifest)
    }

    fn parse_named(&self, text: &str, source_name: &str) -> Result<Manifest, ManifestError> {
        self.build_lines(self.parse_lines(text.lines(), source_name))
    }
}

impl ManifestBuilder for ManifestParser {
    type Source = Path;

    fn supported_attrs(&self) -> &'static [AttrKey] {
        &AttrKey::ALL
    }

    fn build(&self, source: &Path) -> Result<Manifest, ManifestError> {
        self.parse_file(source)
    }
}

/// Iterator returned by [`ManifestParser::parse_lines`]
///
/// Stops after the first error.
pub struct ParseLines<I> {
    lines: I,
    source_name: String,
    /// Indent widths of the open levels; the initial 0 is never popped
    indents: Vec<usize>,
    line: usize,
    failed: bool,
}

impl<I> ParseLines<I> {
    fn level_for(&mut self, indent: usize) -> Result<usize, ManifestError> {
        let top = *self.indents.last().unwrap_or(&0);
        if indent > top {
            self.indents.push(indent);
        } else if indent < top {
            while self.indents.len() > 1 && indent < *self.indents.last().unwrap_or(&0) {
                self.indents.pop();
            }
            let expected = *self.indents.last().unwrap_or(&0);
            if indent != expected {
                return Err(ManifestError::InvalidIndentation {
                    source_name: self.source_name.clone(),
                    line: self.line,
                    indent,
                    expected,
                });
            }
        }
        Ok(self.indents.len() - 1)
    }

    fn parse_line(&mut self, raw: &str) -> Result<Option<ParsedLine>, ManifestError> {
        let text = raw.split('#').next().unwrap_or("");
        let text = text.trim_end_matches(['\n', '\r']).replace('\t', &" ".repeat(TAB_WIDTH));
        let token = text.trim_start_matches(' ');
        if token.trim().is_empty() {
            return Ok(None);
        }

        let level = self.level_for(text.len() - token.len())?;
        let (name, attrs) = parse_token(token.trim_end(), self.line)?;
        Ok(Some(ParsedLine {
            line: self.line,
            level,
            name,
            attrs,
        }))
    }
}

impl<I, S> Iterator for ParseLines<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = Result<ParsedLine, ManifestError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        while let Some(raw) = self.lines.next() {
            self.line += 1;
            match self.parse_line(raw.as_ref()) {
                Ok(None) => continue,
                Ok(Some(parsed)) => return Some(Ok(parsed)),
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

/// Split `name {k: v, ...}` into the name and its attributes
fn parse_token(token: &str, line: usize) -> Result<(String, Attributes), ManifestError> {
    let mut attrs = Attributes::new();
    let Some((name, block)) = token.rsplit_once('{') else {
        return Ok((token.to_string(), attrs));
    };

    let malformed = || ManifestError::MalformedAttributes {
        line,
        text: token.to_string(),
    };
    let body = block.strip_suffix('}').ok_or_else(malformed)?;
    for item in body.split(',') {
        if item.trim().is_empty() {
            continue;
        }
        let (key, value) = item.split_once(':').ok_or_else(malformed)?;
        attrs.insert_parsed(key, value)?;
    }
    debug!(line, attr_count = attrs.len(), "Parsed attributes");
    Ok((name.trim_end().to_string(), attrs))
}

/// Writes manifests in the format read by [`ManifestParser`]
#[derive(Debug, Clone)]
pub struct ManifestWriter {
    indent: String,
    level: usize,
    attr_keys: Option<Vec<String>>,
}

impl Default for ManifestWriter {
    fn default() -> Self {
        Self {
            indent: "\t".to_string(),
            level: 0,
            attr_keys: None,
        }
    }
}

impl ManifestWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indent string repeated once per level
    pub fn indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    /// Level of the top-level entries
    pub fn level(mut self, level: usize) -> Self {
        self.level = level;
        self
    }

    /// Only write these attribute keys
    pub fn attr_keys<S: Into<String>>(mut self, keys: impl IntoIterator<Item = S>) -> Self {
        self.attr_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn write<W: Write>(&self, manifest: &Manifest, out: &mut W) -> io::Result<()> {
        for line in self.lines(manifest) {
            writeln!(out, "{}", line)?;
        }
        Ok(())
    }

    /// Render into a fresh string, one line per entry
    pub fn render(&self, manifest: &Manifest) -> String {
        self.lines(manifest).fold(String::new(), |mut text, line| {
            text.push_str(&line);
            text.push('\n');
            text
        })
    }

    /// Output lines without terminators; the root produces none
    fn lines<'m>(&'m self, manifest: &'m Manifest) -> impl Iterator<Item = String> + 'm {
        manifest.walk().filter_map(move |entry| {
            let (name, parents) = entry.path.split_last()?;
            Some(format!(
                "{}{}{}",
                self.indent.repeat(self.level + parents.len()),
                name,
                self.format_attrs(entry.attrs)
            ))
        })
    }

    fn format_attrs(&self, attrs: &Attributes) -> String {
        let filtered;
        let attrs = match &self.attr_keys {
            Some(keys) => {
                filtered = attrs.filtered(keys);
                &filtered
            }
            None => attrs,
        };
        if attrs.is_empty() {
            return String::new();
        }
        let items: Vec<String> = attrs
            .iter()
            .map(|(key, value)| match AttrKey::known(key) {
                Some(known) => format!("{}: {}", key, known.format_value(value)),
                None => format!("{}: {}", key, value),
            })
            .collect();
        format!(" {{{}}}", items.join(", "))
    }
}
