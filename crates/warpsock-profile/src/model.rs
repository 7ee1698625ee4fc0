// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Format-preserving profile model.

/// A `Key = Value` line.
///
/// `raw` holds the original text while the entry is unmodified; setting a new
/// value clears it and the entry renders canonically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
	pub key: String,
	pub value: String,
	raw: Option<String>,
}

impl Entry {
	pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			key: key.into(),
			value: value.into(),
			raw: None,
		}
	}

	fn parse(line: &str) -> Option<Self> {
		let (key, value) = line.split_once('=')?;
		let key = key.trim();
		if key.is_empty() {
			return None;
		}
		Some(Self {
			key: key.to_string(),
			value: value.trim().to_string(),
			raw: Some(line.to_string()),
		})
	}

	pub fn is_key(&self, key: &str) -> bool {
		self.key.eq_ignore_ascii_case(key)
	}

	/// Returns true when the value actually changed.
	pub fn set_value(&mut self, value: &str) -> bool {
		if self.value == value {
			return false;
		}
		self.value = value.to_string();
		self.raw = None;
		true
	}

	fn render(&self, out: &mut String, crlf: bool) {
		match &self.raw {
			Some(raw) => out.push_str(raw),
			None => {
				out.push_str(&self.key);
				out.push_str(" = ");
				out.push_str(&self.value);
				push_cr(out, crlf);
			}
		}
	}
}

/// Canonical lines carry the `\r` of a CRLF profile; raw lines already have theirs.
fn push_cr(out: &mut String, crlf: bool) {
	if crlf {
		out.push('\r');
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
	Entry(Entry),
	/// Blank lines, comments and anything else we do not interpret.
	Raw(String),
}

impl Line {
	fn is_blank(&self) -> bool {
		matches!(self, Line::Raw(raw) if raw.trim().is_empty())
	}

	fn render(&self, out: &mut String, crlf: bool) {
		match self {
			Line::Entry(entry) => entry.render(out, crlf),
			Line::Raw(raw) => out.push_str(raw),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
	pub name: String,
	/// `None` for sections created in code.
	header_raw: Option<String>,
	pub lines: Vec<Line>,
}

impl Section {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			header_raw: None,
			lines: Vec::new(),
		}
	}

	pub fn is(&self, name: &str) -> bool {
		self.name.eq_ignore_ascii_case(name)
	}

	pub fn entries(&self) -> impl Iterator<Item = &Entry> {
		self.lines.iter().filter_map(|line| match line {
			Line::Entry(entry) => Some(entry),
			Line::Raw(_) => None,
		})
	}

	/// First value for `key`, compared case-insensitively.
	pub fn get(&self, key: &str) -> Option<&str> {
		self
			.entries()
			.find(|e| e.is_key(key))
			.map(|e| e.value.as_str())
	}

	pub fn count(&self, key: &str) -> usize {
		self.entries().filter(|e| e.is_key(key)).count()
	}

	/// Set `key` to `value`, keeping exactly one entry for it.
	///
	/// The first existing entry is updated in place and later duplicates are
	/// dropped. A missing key is inserted after the last entry so trailing
	/// blank lines keep separating this section from the next. Returns true
	/// when the section changed.
	pub fn set(&mut self, key: &str, value: &str) -> bool {
		let mut changed = false;
		let mut seen = false;
		self.lines.retain_mut(|line| match line {
			Line::Entry(entry) if entry.is_key(key) => {
				if seen {
					changed = true;
					return false;
				}
				seen = true;
				changed |= entry.set_value(value);
				true
			}
			_ => true,
		});

		if !seen {
			let at = self
				.lines
				.iter()
				.rposition(|line| matches!(line, Line::Entry(_)))
				.map(|i| i + 1)
				.unwrap_or_else(|| {
					self
						.lines
						.iter()
						.position(Line::is_blank)
						.unwrap_or(self.lines.len())
				});
			self.lines.insert(at, Line::Entry(Entry::new(key, value)));
			changed = true;
		}

		changed
	}

	fn ends_with_blank(&self) -> bool {
		self.lines.last().map(Line::is_blank).unwrap_or(false)
	}

	fn render(&self, out: &mut String, crlf: bool) {
		match &self.header_raw {
			Some(raw) => out.push_str(raw),
			None => {
				out.push('[');
				out.push_str(&self.name);
				out.push(']');
				push_cr(out, crlf);
			}
		}
		for line in &self.lines {
			out.push('\n');
			line.render(out, crlf);
		}
	}
}

/// A parsed profile.
///
/// `Profile::parse(s).render() == s` for any input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Profile {
	/// Lines before the first section header.
	pub preamble: Vec<Line>,
	pub sections: Vec<Section>,
	trailing_newline: bool,
	/// Most lines end in `\r\n`; new lines follow suit.
	crlf: bool,
}

impl Profile {
	pub fn parse(content: &str) -> Self {
		let trailing_newline = content.ends_with('\n');
		let body = content.strip_suffix('\n').unwrap_or(content);
		let crlf = content.matches("\r\n").count() * 2 > content.matches('\n').count();

		let mut profile = Profile {
			preamble: Vec::new(),
			sections: Vec::new(),
			trailing_newline,
			crlf,
		};

		if body.is_empty() && !trailing_newline {
			return profile;
		}

		for raw in body.split('\n') {
			let trimmed = raw.trim();

			if let Some(name) = trimmed
				.strip_prefix('[')
				.and_then(|rest| rest.strip_suffix(']'))
			{
				profile.sections.push(Section {
					name: name.trim().to_string(),
					header_raw: Some(raw.to_string()),
					lines: Vec::new(),
				});
				continue;
			}

			let line = if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
				Line::Raw(raw.to_string())
			} else {
				Entry::parse(raw)
					.map(Line::Entry)
					.unwrap_or_else(|| Line::Raw(raw.to_string()))
			};

			match profile.sections.last_mut() {
				Some(section) => section.lines.push(line),
				None => profile.preamble.push(line),
			}
		}

		profile
	}

	pub fn render(&self) -> String {
		let mut out = String::new();
		let mut first = true;

		for line in &self.preamble {
			if !first {
				out.push('\n');
			}
			line.render(&mut out, self.crlf);
			first = false;
		}

		for section in &self.sections {
			if !first {
				out.push('\n');
			}
			section.render(&mut out, self.crlf);
			first = false;
		}

		if self.trailing_newline {
			out.push('\n');
		}
		out
	}

	pub fn section(&self, name: &str) -> Option<&Section> {
		self.sections.iter().find(|s| s.is(name))
	}

	pub fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
		self.sections.iter_mut().find(|s| s.is(name))
	}

	pub fn count_sections(&self, name: &str) -> usize {
		self.sections.iter().filter(|s| s.is(name)).count()
	}

	/// Number of `key` entries across every section.
	pub fn count_entries(&self, key: &str) -> usize {
		self.sections.iter().map(|s| s.count(key)).sum()
	}

	/// Drop every `name` section after the first. Returns how many were removed.
	pub fn remove_duplicate_sections(&mut self, name: &str) -> usize {
		let before = self.sections.len();
		let mut seen = false;
		self.sections.retain(|s| {
			if !s.is(name) {
				return true;
			}
			let keep = !seen;
			seen = true;
			keep
		});
		before - self.sections.len()
	}

	/// Append a section, separated from what precedes it by one blank line.
	pub fn append_section(&mut self, section: Section) {
		let needs_separator = match self.sections.last() {
			Some(last) => !last.ends_with_blank(),
			None => self.preamble.last().is_some_and(|l| !l.is_blank()),
		};
		if needs_separator {
			let separator = Line::Raw(if self.crlf { "\r" } else { "" }.to_string());
			match self.sections.last_mut() {
				Some(last) => last.lines.push(separator),
				None => self.preamble.push(separator),
			}
		}
		self.sections.push(section);
		self.trailing_newline = true;
	}
}
