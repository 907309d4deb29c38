use crate::domain::model::MetadataRecord;
use crate::utils::error::{EtlError, Result};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

const DEFAULT_IMAGE_EXT: &str = ".png";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    TokenId,
    Stem,
    Image,
    ImageName,
    ImageExt,
}

impl Placeholder {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "token_id" => Some(Placeholder::TokenId),
            "stem" => Some(Placeholder::Stem),
            "image" => Some(Placeholder::Image),
            "image_name" => Some(Placeholder::ImageName),
            "image_ext" => Some(Placeholder::ImageExt),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Placeholder::TokenId => "token_id",
            Placeholder::Stem => "stem",
            Placeholder::Image => "image",
            Placeholder::ImageName => "image_name",
            Placeholder::ImageExt => "image_ext",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

/// Escaped braces, a `{name}` placeholder, or a stray brace.
static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{|\}\}|\{([^{}]*)\}|[{}]").expect("valid regex")
});

/// Compiled `--filename-template`. Parsing up front means an unknown
/// placeholder aborts the run before any record is touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameTemplate {
    segments: Vec<Segment>,
}

impl FilenameTemplate {
    pub fn parse(template: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut last = 0;

        for caps in TOKEN.captures_iter(template) {
            let Some(token) = caps.get(0) else { continue };
            literal.push_str(&template[last..token.start()]);
            last = token.end();

            match (token.as_str(), caps.get(1)) {
                ("{{", _) => literal.push('{'),
                ("}}", _) => literal.push('}'),
                (_, Some(name)) => {
                    let placeholder = Placeholder::from_name(name.as_str()).ok_or_else(|| {
                        EtlError::UnknownPlaceholder {
                            placeholder: name.as_str().to_string(),
                            template: template.to_string(),
                        }
                    })?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(placeholder));
                }
                (brace, None) => {
                    return Err(EtlError::MalformedTemplate {
                        template: template.to_string(),
                        reason: if brace == "{" {
                            format!("unclosed '{{' at offset {}", token.start())
                        } else {
                            format!("a lone '}}' at offset {} must be written as '}}}}'", token.start())
                        },
                    })
                }
            }
        }
        literal.push_str(&template[last..]);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    /// `image` is the record's image after gateway substitution.
    pub fn render(&self, record: &MetadataRecord, image: Option<&str>) -> Result<String> {
        let image = image.filter(|s| !s.is_empty());
        let mut out = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(placeholder) => match placeholder {
                    Placeholder::TokenId => out.push_str(&record.identifier),
                    Placeholder::Stem => out.push_str(&record.stem),
                    Placeholder::Image | Placeholder::ImageName => {
                        let image = image.ok_or_else(|| EtlError::MissingTemplateValue {
                            placeholder: placeholder.name().to_string(),
                            record: record.origin.clone(),
                            field: "image".to_string(),
                        })?;
                        if *placeholder == Placeholder::Image {
                            out.push_str(image);
                        } else {
                            out.push_str(image_name(image));
                        }
                    }
                    Placeholder::ImageExt => {
                        out.push_str(&image.map(image_ext).unwrap_or_else(|| {
                            DEFAULT_IMAGE_EXT.to_string()
                        }));
                    }
                },
            }
        }

        Ok(out)
    }
}

/// Final path segment of a URL or path, ignoring any query or fragment.
pub fn image_name(image: &str) -> &str {
    let path = image.split(['?', '#']).next().unwrap_or(image);
    path.rsplit('/').find(|s| !s.is_empty()).unwrap_or("")
}

fn image_ext(image: &str) -> String {
    Path::new(image_name(image))
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_else(|| DEFAULT_IMAGE_EXT.to_string())
}
