//! Rule data model: what to match and how to paint it
//!
//! A [`Rule`] is a user-defined matching policy: a pattern with flags,
//! optional filename filters, an occurrence cap, and a set of purely
//! cosmetic display attributes. The engine only reads rules; it never
//! creates or destroys them — that is the lifecycle collaborator's job.

use crate::errors::{CoreError, Result};
use bitflags::bitflags;
use core::fmt;

/// Default occurrence cap applied when a rule does not set its own
pub const DEFAULT_MAX_MATCHES: usize = 1000;

/// Stable, opaque rule identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RuleId(String);

impl RuleId {
    /// Create a rule id from any string-like value
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    /// View the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RuleId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RuleId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

bitflags! {
    /// Pattern match flags, lowered to inline regex groups at compile time
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct MatchFlags: u8 {
        /// Letters match regardless of case (`i`)
        const CASE_INSENSITIVE = 1 << 0;
        /// `^` and `$` match at line boundaries (`m`)
        const MULTI_LINE = 1 << 1;
        /// `.` also matches `\n` (`s`)
        const DOT_MATCHES_NEWLINE = 1 << 2;
        /// Whitespace in the pattern is insignificant (`x`)
        const IGNORE_WHITESPACE = 1 << 3;
    }
}

impl MatchFlags {
    /// Parse a host-editor flag string such as `"gim"`
    ///
    /// The host markers `g`, `u`, and `y` carry no meaning here (every
    /// scan is global and byte-offset based) and are accepted silently.
    ///
    /// # Errors
    /// Returns [`CoreError::Pattern`] for an unknown flag letter.
    pub fn from_letters(letters: &str) -> Result<Self> {
        let mut flags = Self::empty();
        for letter in letters.chars() {
            match letter {
                'i' => flags |= Self::CASE_INSENSITIVE,
                'm' => flags |= Self::MULTI_LINE,
                's' => flags |= Self::DOT_MATCHES_NEWLINE,
                'x' => flags |= Self::IGNORE_WHITESPACE,
                'g' | 'u' | 'y' => {}
                other => {
                    return Err(CoreError::pattern(
                        letters,
                        format!("unknown flag letter '{other}'"),
                    ))
                }
            }
        }
        Ok(flags)
    }

    /// Render the flags back to their letter form
    #[must_use]
    pub fn as_letters(&self) -> String {
        let mut letters = String::new();
        if self.contains(Self::CASE_INSENSITIVE) {
            letters.push('i');
        }
        if self.contains(Self::MULTI_LINE) {
            letters.push('m');
        }
        if self.contains(Self::DOT_MATCHES_NEWLINE) {
            letters.push('s');
        }
        if self.contains(Self::IGNORE_WHITESPACE) {
            letters.push('x');
        }
        letters
    }

    /// Render the flags as an inline regex group, or `""` when empty
    #[must_use]
    pub fn inline_group(&self) -> String {
        let letters = self.as_letters();
        if letters.is_empty() {
            letters
        } else {
            format!("(?{letters})")
        }
    }
}

/// Cosmetic display attributes
///
/// None of these fields affect which text matches; changing them is always
/// a cosmetic-only rule change. Values are host-side style strings (CSS
/// colors and the like) that this engine treats as opaque.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Style {
    /// Foreground color
    pub color: Option<String>,
    /// Background color
    pub background: Option<String>,
    /// Border shorthand
    pub border: Option<String>,
    /// Outline shorthand
    pub outline: Option<String>,
    /// Bold text
    pub bold: bool,
    /// Italic text
    pub italic: bool,
    /// Underlined text
    pub underline: bool,
}

/// A user-defined matching policy
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rule {
    /// Stable opaque identifier
    pub id: RuleId,
    /// Disabled rules hold no interval store
    pub enabled: bool,
    /// Regular expression source
    pub pattern: String,
    /// Match flags applied to the pattern
    pub flags: MatchFlags,
    /// Only buffers whose path matches this regex are tracked
    pub filter_include: Option<String>,
    /// Buffers whose path matches this regex are never tracked
    pub filter_exclude: Option<String>,
    /// Occurrence cap; matches past it are absent, not an error
    pub max_matches: usize,
    /// Cosmetic display attributes
    pub style: Style,
}

/// Classification of a rule edit, used to route rule-set-change handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Same rule by content comparison of every field
    Unchanged,
    /// Only display attributes changed; stores stay valid
    CosmeticOnly,
    /// Pattern, flags, filters, cap, or enabled membership changed
    ContentAffecting,
}

impl Rule {
    /// Create an enabled rule with default flags, cap, and style
    pub fn new<S: Into<RuleId>>(id: S, pattern: &str) -> Self {
        Self {
            id: id.into(),
            enabled: true,
            pattern: pattern.to_string(),
            flags: MatchFlags::empty(),
            filter_include: None,
            filter_exclude: None,
            max_matches: DEFAULT_MAX_MATCHES,
            style: Style::default(),
        }
    }

    /// Start building a rule with a fluent API
    pub fn builder<S: Into<RuleId>>(id: S) -> RuleBuilder {
        RuleBuilder::new(id)
    }

    /// Classify the difference between two revisions of the same rule
    ///
    /// Every field that can change which text matches is content-affecting;
    /// everything else is cosmetic. Caller is expected to have matched the
    /// revisions up by id already.
    #[must_use]
    pub fn classify_change(old: &Self, new: &Self) -> ChangeKind {
        if old == new {
            return ChangeKind::Unchanged;
        }
        let content_equal = old.pattern == new.pattern
            && old.flags == new.flags
            && old.filter_include == new.filter_include
            && old.filter_exclude == new.filter_exclude
            && old.max_matches == new.max_matches
            && old.enabled == new.enabled;
        if content_equal {
            ChangeKind::CosmeticOnly
        } else {
            ChangeKind::ContentAffecting
        }
    }
}

/// Builder for creating rules with fluent method chaining
///
/// # Examples
///
/// ```
/// use hilite_core::Rule;
///
/// let rule = Rule::builder("todo")
///     .pattern(r"TODO|FIXME")
///     .flags("i")
///     .unwrap()
///     .color("#ff8800")
///     .max_matches(200)
///     .build()
///     .unwrap();
///
/// assert_eq!(rule.id.as_str(), "todo");
/// assert!(rule.enabled);
/// ```
#[derive(Debug)]
pub struct RuleBuilder {
    rule: Rule,
}

impl RuleBuilder {
    /// Create a builder for the given rule id
    pub fn new<S: Into<RuleId>>(id: S) -> Self {
        Self {
            rule: Rule::new(id, ""),
        }
    }

    /// Set the pattern source
    #[must_use]
    pub fn pattern(mut self, pattern: &str) -> Self {
        self.rule.pattern = pattern.to_string();
        self
    }

    /// Parse and set match flags from a letter string such as `"im"`
    ///
    /// # Errors
    /// Returns [`CoreError::Pattern`] for an unknown flag letter.
    pub fn flags(mut self, letters: &str) -> Result<Self> {
        self.rule.flags = MatchFlags::from_letters(letters)?;
        Ok(self)
    }

    /// Set match flags directly
    #[must_use]
    pub fn match_flags(mut self, flags: MatchFlags) -> Self {
        self.rule.flags = flags;
        self
    }

    /// Set the include filename filter
    #[must_use]
    pub fn filter_include(mut self, filter: &str) -> Self {
        self.rule.filter_include = Some(filter.to_string());
        self
    }

    /// Set the exclude filename filter
    #[must_use]
    pub fn filter_exclude(mut self, filter: &str) -> Self {
        self.rule.filter_exclude = Some(filter.to_string());
        self
    }

    /// Set the occurrence cap
    #[must_use]
    pub fn max_matches(mut self, cap: usize) -> Self {
        self.rule.max_matches = cap;
        self
    }

    /// Set the enabled flag
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.rule.enabled = enabled;
        self
    }

    /// Set the foreground color
    #[must_use]
    pub fn color(mut self, color: &str) -> Self {
        self.rule.style.color = Some(color.to_string());
        self
    }

    /// Set the background color
    #[must_use]
    pub fn background(mut self, background: &str) -> Self {
        self.rule.style.background = Some(background.to_string());
        self
    }

    /// Replace the whole style block
    #[must_use]
    pub fn style(mut self, style: Style) -> Self {
        self.rule.style = style;
        self
    }

    /// Finish the rule
    ///
    /// # Errors
    /// Returns [`CoreError::Rule`] when the id or pattern is empty.
    pub fn build(self) -> Result<Rule> {
        if self.rule.id.as_str().is_empty() {
            return Err(CoreError::rule("rule id must not be empty"));
        }
        if self.rule.pattern.is_empty() {
            return Err(CoreError::rule(format!(
                "rule `{}` has an empty pattern",
                self.rule.id
            )));
        }
        Ok(self.rule)
    }
}
