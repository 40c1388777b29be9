//! Parsing of alias names and recipient strings.
//!
//! Alias names (the left-hand side of an alias) are decoded with
//! [`decode_rfc822`]; recipients (the right-hand side) with [`decode_target`],
//! which also accepts the `/etc/aliases` delivery forms:
//!
//! ```text
//! | command        pipe to a command
//! /path/to/file    append to a file
//! :include:/path   read recipients from a file
//! ```
//!
//! Parsing never touches storage, so a batch of names can be validated in
//! full before any row is written.

use std::fmt;

use crate::{Error, Result};

/// Wildcard token accepted in lookup patterns.
pub const WILDCARD: &str = "*";

/// Marker that starts an include directive.
pub const INCLUDE_MARKER: &str = ":include:";

/// Characters a domain name may not start with.
const BAD_DOMAIN_LEAD: &[char] = &[';', '.', '-', '@'];

/// How a recipient is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecipientForm {
    /// A mail address, local or domain-qualified.
    #[default]
    Address,
    /// `| command`
    Pipe,
    /// `/absolute/path`
    File,
    /// `:include:/path`
    Include,
}

impl RecipientForm {
    /// Returns true for pipe, file and include forms.
    #[must_use]
    pub const fn is_special(self) -> bool {
        !matches!(self, Self::Address)
    }
}

/// Unpersisted result of parsing a name or recipient.
///
/// Special forms carry no local part and no domain; their verbatim text is
/// kept as the extension, which is how it is stored in the link row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AddressParts {
    local_part: String,
    domain: Option<String>,
    extension: Option<String>,
    form: RecipientForm,
}

impl AddressParts {
    /// Creates parts for a plain address without extension.
    ///
    /// No validation is done; use [`decode_rfc822`] for untrusted input.
    #[must_use]
    pub fn new(local_part: impl Into<String>, domain: Option<&str>) -> Self {
        Self {
            local_part: local_part.into(),
            domain: domain.map(str::to_string),
            extension: None,
            form: RecipientForm::Address,
        }
    }

    /// The local part, empty for special forms.
    #[must_use]
    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    /// The domain name, `None` for local names and special forms.
    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// The plus-extension, or the verbatim text of a special form.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// How this recipient is delivered.
    #[must_use]
    pub const fn form(&self) -> RecipientForm {
        self.form
    }

    /// Returns true if this names a mail address (it has a local part).
    #[must_use]
    pub fn is_address(&self) -> bool {
        !self.form.is_special() && !self.local_part.is_empty()
    }

    /// Returns true if this has no domain.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        self.domain.is_none()
    }

    /// Returns true if the local part or the domain is a wildcard.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.local_part == WILDCARD || self.domain.as_deref() == Some(WILDCARD)
    }

    /// Rejects wildcard parts where a concrete address is needed.
    ///
    /// # Errors
    ///
    /// Returns `Error::BadName` if the parts contain a wildcard.
    pub fn require_concrete(self) -> Result<Self> {
        if self.is_wildcard() {
            return Err(Error::bad_name(format!("wildcard not allowed here: {self}")));
        }
        Ok(self)
    }

    /// Rejects a plus-extension where a bare alias name is needed.
    ///
    /// # Errors
    ///
    /// Returns `Error::BadName` if the parts carry an extension.
    pub fn require_no_extension(self) -> Result<Self> {
        if self.extension.is_some() {
            return Err(Error::bad_name(format!("extension not allowed here: {self}")));
        }
        Ok(self)
    }

    fn special(form: RecipientForm, text: &str) -> Self {
        Self {
            local_part: String::new(),
            domain: None,
            extension: Some(text.to_string()),
            form,
        }
    }
}

impl fmt::Display for AddressParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.form.is_special() {
            return write!(f, "{}", self.extension.as_deref().unwrap_or_default());
        }
        write!(f, "{}", self.local_part)?;
        if let Some(ext) = &self.extension {
            write!(f, "+{ext}")?;
        }
        if let Some(domain) = &self.domain {
            write!(f, "@{domain}")?;
        }
        Ok(())
    }
}

/// Decodes an alias name: `local`, `local+ext`, `local@domain` or
/// `local+ext@domain`. Either side may be the wildcard `*`.
///
/// # Errors
///
/// Returns `Error::BadName` if the local part or the domain is malformed.
pub fn decode_rfc822(raw: &str) -> Result<AddressParts> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::bad_name("empty name"));
    }

    let (local, domain) = match raw.split_once('@') {
        Some((local, domain)) => (local, Some(validate_domain(domain)?)),
        None => (raw, None),
    };

    let (local_part, extension) = match local.split_once('+') {
        Some((base, ext)) => (base, (!ext.is_empty()).then_some(ext)),
        None => (local, None),
    };
    validate_local_part(local_part, raw)?;
    if let Some(ext) = extension {
        validate_extension(ext, raw)?;
    }

    Ok(AddressParts {
        local_part: local_part.to_string(),
        domain: domain.map(str::to_string),
        extension: extension.map(str::to_string),
        form: RecipientForm::Address,
    })
}

/// Decodes a recipient: a pipe, file or include directive, or else an
/// address as accepted by [`decode_rfc822`]. Wildcards are rejected.
///
/// # Errors
///
/// Returns `Error::BadName` if the recipient is malformed.
pub fn decode_target(raw: &str) -> Result<AddressParts> {
    // Special forms are kept byte for byte; only addresses are trimmed.
    if let Some(cmd) = raw.strip_prefix('|') {
        if cmd.trim().is_empty() {
            return Err(Error::bad_name("empty pipe command"));
        }
        return Ok(AddressParts::special(RecipientForm::Pipe, raw));
    }
    if let Some(path) = raw.strip_prefix('/') {
        if path.trim().is_empty() {
            return Err(Error::bad_name("empty file path"));
        }
        return Ok(AddressParts::special(RecipientForm::File, raw));
    }
    if let Some(path) = strip_include(raw) {
        if path.trim().is_empty() {
            return Err(Error::bad_name("empty include path"));
        }
        return Ok(AddressParts::special(RecipientForm::Include, raw));
    }

    decode_rfc822(raw)?.require_concrete()
}

fn strip_include(raw: &str) -> Option<&str> {
    let marker_len = INCLUDE_MARKER.len();
    if raw.len() >= marker_len
        && raw.is_char_boundary(marker_len)
        && raw[..marker_len].eq_ignore_ascii_case(INCLUDE_MARKER)
    {
        Some(&raw[marker_len..])
    } else {
        None
    }
}

pub(crate) fn validate_domain(domain: &str) -> Result<&str> {
    if domain.is_empty() {
        return Err(Error::bad_name("empty domain"));
    }
    if domain.starts_with(BAD_DOMAIN_LEAD) {
        return Err(Error::bad_name(format!("bad domain: {domain}")));
    }
    if domain.contains('@') || domain.contains(char::is_whitespace) {
        return Err(Error::bad_name(format!("bad domain: {domain}")));
    }
    Ok(domain)
}

/// Characters that would break the rendered `a, b` recipient list.
const BAD_LOCAL_CHARS: &[char] = &[',', ':', '|', '@'];

fn has_bad_local_chars(text: &str) -> bool {
    text.contains(char::is_whitespace) || text.contains(BAD_LOCAL_CHARS)
}

fn validate_local_part(local_part: &str, raw: &str) -> Result<()> {
    if local_part.is_empty() {
        return Err(Error::bad_name(format!("empty local part: {raw}")));
    }
    if has_bad_local_chars(local_part) {
        return Err(Error::bad_name(format!("bad local part: {raw}")));
    }
    Ok(())
}

fn validate_extension(extension: &str, raw: &str) -> Result<()> {
    if has_bad_local_chars(extension) {
        return Err(Error::bad_name(format!("bad extension: {raw}")));
    }
    Ok(())
}

/// A lookup pattern, decoded once and matched exhaustively by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressPattern {
    /// `name` or `name@domain`: at most one address.
    Exact(AddressParts),
    /// `*`: every local address.
    AllLocal,
    /// `*@domain`: every address in the domain.
    AllInDomain(String),
    /// `name@*`: the local part in every domain.
    LocalPartAcrossDomains(String),
    /// `*@*`: every domain-qualified address.
    AllQualified,
}

impl AddressPattern {
    /// Parses a lookup pattern.
    ///
    /// # Errors
    ///
    /// Returns `Error::BadName` if the pattern is malformed.
    pub fn parse(raw: &str) -> Result<Self> {
        decode_rfc822(raw).map(Self::from_parts)
    }

    /// Classifies already decoded parts.
    #[must_use]
    pub fn from_parts(parts: AddressParts) -> Self {
        let any_local = parts.local_part == WILDCARD;
        let any_domain = parts.domain.as_deref() == Some(WILDCARD);
        match (any_local, any_domain) {
            (true, true) => Self::AllQualified,
            (false, true) => Self::LocalPartAcrossDomains(parts.local_part),
            (true, false) => match parts.domain {
                None => Self::AllLocal,
                Some(domain) => Self::AllInDomain(domain),
            },
            (false, false) => Self::Exact(parts),
        }
    }
}
