use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use percent_encoding::percent_decode_str;

use super::param::{ParamSpec, ParamType, Params};
use crate::error::{RestfulError, Result};
use crate::request::PathArgs;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Literal(String),
    Placeholder {
        name: String,
        kind: Option<ParamType>,
    },
}

impl Segment {
    pub fn placeholder(name: impl Into<String>, kind: Option<ParamType>) -> Self {
        Segment::Placeholder {
            name: name.into(),
            kind,
        }
    }

    fn parse(template: &str, raw: &str) -> Result<Self> {
        if let Some(inner) = raw.strip_prefix('<') {
            let inner = inner
                .strip_suffix('>')
                .ok_or_else(|| RestfulError::template(template, "unterminated placeholder"))?;
            let (name, kind) = match inner.split_once(':') {
                Some((name, kind)) => {
                    let kind = ParamType::from_str(kind).map_err(|_| {
                        RestfulError::template(template, format!("unknown parameter type '{}'", kind))
                    })?;
                    (name, Some(kind))
                }
                None => (inner, None),
            };
            if !is_identifier(name) {
                return Err(RestfulError::template(
                    template,
                    format!("invalid parameter name '{}'", name),
                ));
            }
            return Ok(Segment::placeholder(name, kind));
        }

        if raw.contains(['<', '>', '{', '}']) || raw.starts_with([':', '*']) {
            return Err(RestfulError::template(
                template,
                format!("invalid literal segment '{}'", raw),
            ));
        }
        Ok(Segment::Literal(raw.to_string()))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(literal) => f.write_str(literal),
            Segment::Placeholder { name, kind: None } => write!(f, "<{}>", name),
            Segment::Placeholder {
                name,
                kind: Some(kind),
            } => write!(f, "<{}:{}>", name, kind),
        }
    }
}

impl From<&ParamSpec> for Segment {
    fn from(spec: &ParamSpec) -> Self {
        Segment::placeholder(spec.name.clone(), spec.kind)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// URL pattern made of literal and placeholder segments.
///
/// The textual form is `/todos/<todo_id:int>`; the empty template renders as
/// an empty string and stands for the endpoint's base path itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RouteTemplate {
    segments: Vec<Segment>,
}

impl RouteTemplate {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let segments = raw
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| Segment::parse(raw, s))
            .collect::<Result<Vec<_>>>()?;
        let template = Self { segments };
        template.check_unique_names()?;
        Ok(template)
    }

    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub fn join(&self, other: &RouteTemplate) -> RouteTemplate {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        RouteTemplate { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn check_unique_names(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for name in self.placeholders() {
            if !seen.insert(name) {
                return Err(RestfulError::template(
                    &self.to_string(),
                    format!("duplicate parameter name '{}'", name),
                ));
            }
        }
        Ok(())
    }

    /// Path in axum's `{name}` syntax.
    pub fn to_axum_path(&self) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        let mut path = String::new();
        for segment in &self.segments {
            path.push('/');
            match segment {
                Segment::Literal(literal) => path.push_str(literal),
                Segment::Placeholder { name, .. } => {
                    path.push('{');
                    path.push_str(name);
                    path.push('}');
                }
            }
        }
        path
    }

    /// Placeholder names erased; two templates with the same shape collide in the router.
    pub fn shape(&self) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(literal) => format!("/{}", literal),
                Segment::Placeholder { .. } => "/{}".to_string(),
            })
            .collect()
    }

    /// Match a request path, returning the decoded placeholder values.
    ///
    /// Returns `None` when a literal differs, the segment count differs or a
    /// typed placeholder rejects its value.
    pub fn capture(&self, path: &str) -> Option<PathArgs> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut args = PathArgs::default();
        for (segment, part) in self.segments.iter().zip(parts) {
            let decoded = percent_decode_str(part).decode_utf8().ok()?;
            match segment {
                Segment::Literal(literal) => {
                    if literal != part && *literal != decoded {
                        return None;
                    }
                }
                Segment::Placeholder { name, kind } => {
                    if let Some(kind) = kind {
                        if !kind.matches(&decoded) {
                            return None;
                        }
                    }
                    args.insert(name.clone(), decoded.into_owned());
                }
            }
        }
        Some(args)
    }
}

impl fmt::Display for RouteTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for RouteTemplate {
    type Err = RestfulError;

    fn from_str(s: &str) -> Result<Self> {
        RouteTemplate::parse(s)
    }
}

/// Templates a handler answers on, shortest first.
///
/// Every optional parameter closes the template built so far before its own
/// placeholder is appended, so a handler with `n` optional parameters is
/// reachable through `n + 1` templates and the last one lists every parameter.
pub fn derive_templates(params: &Params) -> Vec<RouteTemplate> {
    let mut templates = Vec::new();
    let mut current = RouteTemplate::root();
    for spec in params.iter() {
        if spec.optional {
            templates.push(current.clone());
        }
        current.push(Segment::from(spec));
    }
    templates.push(current);
    templates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::RawSegment;

    #[test]
    fn test_parse_and_display() {
        let template = RouteTemplate::parse("todos/<todo_id:int>/<tag>").unwrap();
        assert_eq!(template.to_string(), "/todos/<todo_id:int>/<tag>");
        assert_eq!(template.to_axum_path(), "/todos/{todo_id}/{tag}");
        assert_eq!(template.shape(), "/todos/{}/{}");
        assert_eq!(
            template.placeholders().collect::<Vec<_>>(),
            vec!["todo_id", "tag"]
        );
    }

    #[test]
    fn test_root_template() {
        let root = RouteTemplate::parse("/").unwrap();
        assert!(root.is_root());
        assert_eq!(root.to_string(), "");
        assert_eq!(root.to_axum_path(), "/");
        assert!(root.capture("/").unwrap().is_empty());
    }

    #[test]
    fn test_parse_errors() {
        assert!(RouteTemplate::parse("/todos/<id").is_err());
        assert!(RouteTemplate::parse("/todos/<id:number>").is_err());
        assert!(RouteTemplate::parse("/todos/<1id>").is_err());
        assert!(RouteTemplate::parse("/todos/{id}").is_err());
        assert!(RouteTemplate::parse("/todos/:id").is_err());
        assert!(RouteTemplate::parse("/<id>/<id>").is_err());
    }

    #[test]
    fn test_join_keeps_order() {
        let prefix = RouteTemplate::parse("/v0.9/").unwrap();
        let base = RouteTemplate::parse("todos").unwrap();
        let tail = RouteTemplate::parse("<todo_id:int>").unwrap();
        assert_eq!(
            prefix.join(&base).join(&tail).to_axum_path(),
            "/v0.9/todos/{todo_id}"
        );
    }

    #[test]
    fn test_capture_enforces_constraints() {
        let template = RouteTemplate::parse("/todos/<todo_id:int>").unwrap();
        let args = template.capture("/todos/17").unwrap();
        assert_eq!(args.get("todo_id"), Some("17"));
        assert!(template.capture("/todos/abc").is_none());
        assert!(template.capture("/todos").is_none());
        assert!(template.capture("/other/17").is_none());
    }

    #[test]
    fn test_capture_decodes_values() {
        let template = RouteTemplate::parse("/notes/<title>").unwrap();
        let args = template.capture("/notes/hello%20world").unwrap();
        assert_eq!(args.get("title"), Some("hello world"));
    }

    #[test]
    fn test_no_params_yields_single_template() {
        let templates = derive_templates(&Params::new());
        assert_eq!(templates, vec![RouteTemplate::root()]);
    }

    #[test]
    fn test_one_optional_param_yields_two_templates() {
        let templates = derive_templates(&Params::new().optional::<i64>("todo_id"));
        let rendered: Vec<String> = templates.iter().map(|t| t.to_string()).collect();
        assert_eq!(rendered, vec!["", "/<todo_id:int>"]);
    }

    #[test]
    fn test_required_then_optional() {
        let params = Params::new()
            .required::<i64>("todo_id")
            .optional::<String>("title")
            .optional::<RawSegment>("note");
        let rendered: Vec<String> = derive_templates(&params)
            .iter()
            .map(|t| t.to_string())
            .collect();
        assert_eq!(
            rendered,
            vec![
                "/<todo_id:int>",
                "/<todo_id:int>/<title:str>",
                "/<todo_id:int>/<title:str>/<note>",
            ]
        );
    }

    #[test]
    fn test_required_after_optional_only_in_longer_template() {
        let params = Params::new().optional_untyped("a").untyped("b");
        let rendered: Vec<String> = derive_templates(&params)
            .iter()
            .map(|t| t.to_string())
            .collect();
        assert_eq!(rendered, vec!["", "/<a>/<b>"]);
    }
}
