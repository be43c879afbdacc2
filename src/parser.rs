//! One-line activity entry: `name[@project][;tags][#description]`.
//!
//! Parsing is pure. Turning the project name into a project identifier is a
//! separate step on [`crate::Database::resolve_project`] because it may create
//! the project.

use crate::error::ParseError;
use std::str::FromStr;

pub const PROJECT_SEPARATOR: char = '@';
pub const TAGS_SEPARATOR: char = ';';
pub const DESCRIPTION_SEPARATOR: char = '#';

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedActivity {
    pub name: String,
    /// Present only when `@` is followed by a non-empty name.
    pub project_name: Option<String>,
    pub tags: String,
    pub description: String,
}

/// Each separator may occur at most once in the whole input, so a description
/// that itself contains `@` or `;` is rejected.
pub fn parse_activity(input: &str) -> Result<ParsedActivity, ParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    if let Some((separator, count)) = [DESCRIPTION_SEPARATOR, TAGS_SEPARATOR, PROJECT_SEPARATOR]
        .into_iter()
        .map(|separator| (separator, trimmed.matches(separator).count()))
        .find(|(_, count)| *count > 1)
    {
        return Err(ParseError::Malformed { separator, count });
    }

    let (rest, description) = split_once_or_whole(trimmed, DESCRIPTION_SEPARATOR);
    let (rest, tags) = split_once_or_whole(rest, TAGS_SEPARATOR);
    let (name, project_name) = split_once_or_whole(rest, PROJECT_SEPARATOR);

    Ok(ParsedActivity {
        name: name.to_string(),
        project_name: project_name
            .filter(|project| !project.is_empty())
            .map(ToOwned::to_owned),
        tags: tags.unwrap_or_default().to_string(),
        description: description.unwrap_or_default().to_string(),
    })
}

impl FromStr for ParsedActivity {
    type Err = ParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        parse_activity(input)
    }
}

fn split_once_or_whole(value: &str, separator: char) -> (&str, Option<&str>) {
    value
        .split_once(separator)
        .map_or((value, None), |(head, tail)| (head, Some(tail)))
}
