use crate::metadata::MediaMetadata;
use crate::sanitize::sanitize_component;
use thiserror::Error;

pub const DEFAULT_TEMPLATE: &str = "{YYYY}-{MM}-{DD}_{hh}-{mm}-{ss}_{Height}";

pub const FIELD_NAMES: &[&str] = &[
    "YYYY", "MM", "DD", "hh", "mm", "ss", "Seq", "Artist", "Make", "Model", "Height", "Folder",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    Literal(String),
    Field(Field),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Seq,
    Artist,
    Make,
    Model,
    Height,
    Folder,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Format string is empty")]
    Empty,
    #[error("Unbalanced braces in format string")]
    UnbalancedBraces,
    #[error("Empty placeholder in format string")]
    EmptyField,
    #[error("Unknown field {{{name}}}, expected one of: {list}", name = .0, list = FIELD_NAMES.join(", "))]
    UnknownField(String),
}

/// Per-file values that are not part of the metadata record.
#[derive(Debug, Clone, Copy)]
pub struct NameContext<'a> {
    pub folder: &'a str,
    pub seq: u64,
    pub seq_width: usize,
}

pub fn validate_template(input: &str) -> Result<(), TemplateError> {
    parse_template(input).map(|_| ())
}

/// Splits a format string into literals and fields.
///
/// `{{` and `}}` are literal braces. A field may carry a `:spec` suffix, which
/// is accepted and ignored since every field has a fixed rendering.
pub fn parse_template(input: &str) -> Result<Vec<TemplatePart>, TemplateError> {
    if input.is_empty() {
        return Err(TemplateError::Empty);
    }

    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                if !literal.is_empty() {
                    parts.push(TemplatePart::Literal(std::mem::take(&mut literal)));
                }
                let mut name = String::new();
                let mut found_close = false;
                for next in chars.by_ref() {
                    if next == '}' {
                        found_close = true;
                        break;
                    }
                    if next == '{' {
                        return Err(TemplateError::UnbalancedBraces);
                    }
                    name.push(next);
                }
                if !found_close {
                    return Err(TemplateError::UnbalancedBraces);
                }
                let name = name.split(':').next().unwrap_or_default().trim();
                if name.is_empty() {
                    return Err(TemplateError::EmptyField);
                }
                parts.push(TemplatePart::Field(parse_field(name)?));
            }
            '}' => return Err(TemplateError::UnbalancedBraces),
            _ => literal.push(ch),
        }
    }

    if !literal.is_empty() {
        parts.push(TemplatePart::Literal(literal));
    }

    Ok(parts)
}

/// Expands the template and appends the original extension.
pub fn format_filename(
    parts: &[TemplatePart],
    metadata: &MediaMetadata,
    context: &NameContext<'_>,
) -> String {
    append_extension(render_stem(parts, metadata, context), &metadata.ext)
}

/// Expands the template without the extension.
pub fn render_stem(parts: &[TemplatePart], metadata: &MediaMetadata, context: &NameContext<'_>) -> String {
    let ts = &metadata.timestamp;
    let mut output = String::new();
    for part in parts {
        match part {
            TemplatePart::Literal(text) => output.push_str(text),
            TemplatePart::Field(field) => {
                let value = match field {
                    Field::Year => ts.year.to_string(),
                    Field::Month => format!("{:02}", ts.month),
                    Field::Day => format!("{:02}", ts.day),
                    Field::Hour => format!("{:02}", ts.hour),
                    Field::Minute => format!("{:02}", ts.minute),
                    Field::Second => format!("{:02}", ts.second),
                    Field::Seq => format!("{:0width$}", context.seq, width = context.seq_width),
                    Field::Artist => metadata.artist.clone(),
                    Field::Make => metadata.make.clone(),
                    Field::Model => metadata.model.clone(),
                    Field::Height => metadata.height_label(),
                    Field::Folder => context.folder.to_string(),
                };
                output.push_str(&sanitize_component(&value));
            }
        }
    }
    output
}

pub fn append_extension(mut stem: String, ext: &str) -> String {
    if !ext.is_empty() {
        stem.push('.');
        stem.push_str(ext);
    }
    stem
}

fn parse_field(name: &str) -> Result<Field, TemplateError> {
    match name {
        "YYYY" => Ok(Field::Year),
        "MM" => Ok(Field::Month),
        "DD" => Ok(Field::Day),
        "hh" => Ok(Field::Hour),
        "mm" => Ok(Field::Minute),
        "ss" => Ok(Field::Second),
        "Seq" => Ok(Field::Seq),
        "Artist" => Ok(Field::Artist),
        "Make" => Ok(Field::Make),
        "Model" => Ok(Field::Model),
        "Height" => Ok(Field::Height),
        "Folder" => Ok(Field::Folder),
        other => Err(TemplateError::UnknownField(other.to_string())),
    }
}
