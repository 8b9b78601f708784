//! Path templates: `/things/{id}/$handlerName`.
//!
//! - `{name}` is a wildcard capturing exactly one concrete segment.
//! - `$key` is replaced at registration time by the substitution bound to `key`.
//! - Anything else is a literal compared byte for byte.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Segment appended to every registered template to expose its introspection view.
pub const INTROSPECT_SEGMENT: &str = "_introspect";

/// Wildcard-name and `$key` bindings applied when a template is registered.
pub type Substitutions = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("empty wildcard name in template {template}")]
    EmptyWildcard { template: String },
    #[error("wildcard {{{name}}} appears more than once in template {template}")]
    DuplicateWildcard { template: String, name: String },
    #[error("no value found for ${key} in template {template}")]
    MissingSubstitution { template: String, key: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    /// Capture name after substitution
    Wildcard(Arc<str>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

/// Non-empty `/`-separated components of a path or template.
pub fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Name of a `{name}` wildcard segment, `None` for any other segment.
#[must_use]
pub fn wildcard_name(segment: &str) -> Option<&str> {
    segment.strip_prefix('{')?.strip_suffix('}')
}

impl Template {
    /// Parse a template as written in a spec, without substitutions.
    ///
    /// # Errors
    ///
    /// Empty or repeated wildcard names.
    pub fn parse(raw: &str) -> Result<Self, TemplateError> {
        Self::parse_with(raw, &Substitutions::new(), false)
    }

    /// Parse a template for registration, applying `substitutions` to `$key`
    /// segments and to wildcard names.
    ///
    /// # Errors
    ///
    /// Empty or repeated wildcard names, or a `$key` without a binding.
    pub fn bind(raw: &str, substitutions: &Substitutions) -> Result<Self, TemplateError> {
        Self::parse_with(raw, substitutions, true)
    }

    fn parse_with(
        raw: &str,
        substitutions: &Substitutions,
        substitute: bool,
    ) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut seen: Vec<&str> = Vec::new();

        for segment in path_segments(raw) {
            if let Some(name) = wildcard_name(segment) {
                if name.is_empty() {
                    return Err(TemplateError::EmptyWildcard {
                        template: raw.to_owned(),
                    });
                }
                if seen.contains(&name) {
                    return Err(TemplateError::DuplicateWildcard {
                        template: raw.to_owned(),
                        name: name.to_owned(),
                    });
                }
                seen.push(name);
                let bound = if substitute {
                    substitutions.get(name).map_or(name, String::as_str)
                } else {
                    name
                };
                segments.push(Segment::Wildcard(Arc::from(bound)));
            } else if let (true, Some(key)) = (substitute, segment.strip_prefix('$')) {
                let value = substitutions.get(key).ok_or_else(|| {
                    TemplateError::MissingSubstitution {
                        template: raw.to_owned(),
                        key: key.to_owned(),
                    }
                })?;
                segments.extend(path_segments(value).map(|s| Segment::Literal(s.to_owned())));
            } else {
                segments.push(Segment::Literal(segment.to_owned()));
            }
        }

        Ok(Self { segments })
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Capture names in template order.
    pub fn wildcard_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Wildcard(name) => Some(name.as_ref()),
            Segment::Literal(_) => None,
        })
    }

    /// Sibling template answering introspection requests.
    #[must_use]
    pub fn introspect(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Literal(INTROSPECT_SEGMENT.to_owned()));
        Self { segments }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => write!(f, "/{s}")?,
                Segment::Wildcard(name) => write!(f, "/{{{name}}}")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_literals_and_wildcards() {
        let t = Template::parse("/c/{collection}/schema/{field}").unwrap();
        assert_eq!(t.wildcard_names().collect::<Vec<_>>(), vec!["collection", "field"]);
        assert_eq!(t.to_string(), "/c/{collection}/schema/{field}");
        assert_eq!(Template::parse("/").unwrap().to_string(), "/");
    }

    #[test]
    fn empty_segments_are_ignored() {
        assert_eq!(
            Template::parse("//a///b/").unwrap(),
            Template::parse("/a/b").unwrap()
        );
    }

    #[test]
    fn dollar_segments_take_substitutions() {
        let subs = Substitutions::from([("handlerName".to_owned(), "/update/json".to_owned())]);
        let t = Template::bind("/$handlerName/{id}", &subs).unwrap();
        assert_eq!(t.to_string(), "/update/json/{id}");

        let err = Template::bind("/$handlerName", &Substitutions::new()).unwrap_err();
        assert!(matches!(err, TemplateError::MissingSubstitution { .. }));
        // Without binding, `$key` stays literal
        assert_eq!(Template::parse("/$x").unwrap().to_string(), "/$x");
    }

    #[test]
    fn wildcards_can_be_renamed() {
        let subs = Substitutions::from([("id".to_owned(), "thing".to_owned())]);
        let t = Template::bind("/things/{id}", &subs).unwrap();
        assert_eq!(t.wildcard_names().collect::<Vec<_>>(), vec!["thing"]);
    }

    #[test]
    fn rejects_bad_wildcards() {
        assert!(matches!(
            Template::parse("/a/{}"),
            Err(TemplateError::EmptyWildcard { .. })
        ));
        assert!(matches!(
            Template::parse("/a/{x}/b/{x}"),
            Err(TemplateError::DuplicateWildcard { .. })
        ));
    }

    #[test]
    fn introspect_sibling() {
        let t = Template::parse("/things/{id}").unwrap().introspect();
        assert_eq!(t.to_string(), "/things/{id}/_introspect");
    }
}
