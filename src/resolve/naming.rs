//! Instance naming
//!
//! The name comes from, in order: the request, the template's
//! `instance_name_pattern`, or the configured default pattern.
//!
//! Patterns use single-brace placeholders, e.g.
//! `{type}-{region}-{gpu_count}x{gpu_name}-{user}`. `{{` and `}}` produce
//! literal braces. Placeholders not in [`Placeholder::ALL`] are kept as written
//! or rejected, depending on [`UnresolvedPlaceholder`].

use std::fmt;

use rand::Rng;
use tracing::debug;

use super::metadata::ExtendedMetadata;
use super::region_of;
use crate::config::{NamingConfig, UnresolvedPlaceholder};
use crate::{CreationRequest, OrchestrateError};

/// GPU types ending in this suffix are virtual workstation variants
pub const VWS_SUFFIX: &str = "-vws";

/// Placeholders a name pattern may reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    Template,
    Size,
    Region,
    Zone,
    /// `vws` or `gpu`
    Type,
    GpuName,
    GpuCount,
    GpuType,
    /// Alias of `Id`
    User,
    Id,
}

impl Placeholder {
    /// Every recognized placeholder
    pub const ALL: [Placeholder; 10] = [
        Placeholder::Template,
        Placeholder::Size,
        Placeholder::Region,
        Placeholder::Zone,
        Placeholder::Type,
        Placeholder::GpuName,
        Placeholder::GpuCount,
        Placeholder::GpuType,
        Placeholder::User,
        Placeholder::Id,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Placeholder::Template => "template",
            Placeholder::Size => "size",
            Placeholder::Region => "region",
            Placeholder::Zone => "zone",
            Placeholder::Type => "type",
            Placeholder::GpuName => "gpu_name",
            Placeholder::GpuCount => "gpu_count",
            Placeholder::GpuType => "gpu_type",
            Placeholder::User => "user",
            Placeholder::Id => "id",
        }
    }

    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

/// A parsed name pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePattern {
    source: String,
    segments: Vec<Segment>,
}

impl NamePattern {
    /// Parse a pattern under the given policy for unknown placeholders
    pub fn parse(pattern: &str, policy: UnresolvedPlaceholder) -> Result<Self, OrchestrateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for n in chars.by_ref() {
                        if n == '}' {
                            closed = true;
                            break;
                        }
                        name.push(n);
                    }

                    match (closed, Placeholder::lookup(&name)) {
                        (true, Some(placeholder)) => {
                            if !literal.is_empty() {
                                segments.push(Segment::Literal(std::mem::take(&mut literal)));
                            }
                            segments.push(Segment::Placeholder(placeholder));
                        }
                        _ if policy == UnresolvedPlaceholder::Fail => {
                            let message = if closed {
                                format!("unknown placeholder {{{}}}", name)
                            } else {
                                "unclosed '{'".to_string()
                            };
                            return Err(OrchestrateError::name_pattern(pattern, message));
                        }
                        _ => {
                            literal.push('{');
                            literal.push_str(&name);
                            if closed {
                                literal.push('}');
                            }
                        }
                    }
                }
                '}' if policy == UnresolvedPlaceholder::Fail => {
                    return Err(OrchestrateError::name_pattern(pattern, "unmatched '}'"));
                }
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    /// The pattern as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Placeholders referenced, in order of appearance
    pub fn placeholders(&self) -> impl Iterator<Item = Placeholder> + '_ {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(p) => Some(*p),
            Segment::Literal(_) => None,
        })
    }

    /// Substitute every placeholder from `values`
    pub fn render(&self, values: &NameValues) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(p) => out.push_str(values.get(*p)),
            }
        }
        out
    }
}

/// Short random token shared by `{id}` and `{user}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueToken(String);

impl UniqueToken {
    /// Generate a lowercase hex token of `length` characters
    pub fn generate<R: Rng>(rng: &mut R, length: usize) -> Self {
        const HEX: &[u8] = b"0123456789abcdef";
        let token = (0..length)
            .map(|_| HEX[rng.gen_range(0..HEX.len())] as char)
            .collect();
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UniqueToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl fmt::Display for UniqueToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Values bound to each placeholder for one naming call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameValues {
    pub template: String,
    pub size: String,
    pub region: String,
    pub zone: String,
    pub graphics_type: String,
    pub gpu_name: String,
    pub gpu_count: String,
    pub gpu_type: String,
    pub token: String,
}

impl NameValues {
    /// Derive placeholder values from the request and extended metadata
    pub fn new(
        request: &CreationRequest,
        size: &str,
        extended: &ExtendedMetadata,
        token: &UniqueToken,
    ) -> Self {
        let gpu_type = extended.gpu_type();
        let (graphics_type, gpu_name) = match gpu_type.strip_suffix(VWS_SUFFIX) {
            Some(name) => ("vws", name),
            None => ("gpu", gpu_type),
        };

        Self {
            template: request.template.clone(),
            size: size.to_string(),
            region: region_of(&request.zone).to_string(),
            zone: request.zone.clone(),
            graphics_type: graphics_type.to_string(),
            gpu_name: gpu_name.to_string(),
            gpu_count: extended.gpu_count().to_string(),
            gpu_type: gpu_type.to_string(),
            token: token.as_str().to_string(),
        }
    }

    pub fn get(&self, placeholder: Placeholder) -> &str {
        match placeholder {
            Placeholder::Template => &self.template,
            Placeholder::Size => &self.size,
            Placeholder::Region => &self.region,
            Placeholder::Zone => &self.zone,
            Placeholder::Type => &self.graphics_type,
            Placeholder::GpuName => &self.gpu_name,
            Placeholder::GpuCount => &self.gpu_count,
            Placeholder::GpuType => &self.gpu_type,
            Placeholder::User | Placeholder::Id => &self.token,
        }
    }
}

/// Resolve the instance name
///
/// `size` is the resolved template size, which may differ from the request
/// when the family default was used.
pub fn resolve_name(
    request: &CreationRequest,
    size: &str,
    extended: &ExtendedMetadata,
    config: &NamingConfig,
    token: &UniqueToken,
) -> Result<String, OrchestrateError> {
    if let Some(name) = request.name.as_deref().filter(|n| !n.is_empty()) {
        debug!("Using requested instance name {}", name);
        return Ok(name.to_string());
    }

    let source = extended
        .name_pattern()
        .unwrap_or(config.default_pattern.as_str());
    let pattern = NamePattern::parse(source, config.unresolved)?;
    let name = pattern.render(&NameValues::new(request, size, extended, token));

    debug!("Instance name {} from pattern {}", name, pattern.as_str());
    Ok(name)
}
