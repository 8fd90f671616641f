use std::collections::BTreeMap;

use parley_core::ChatMessage;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("Missing prompt variable: {0}")]
    MissingVariable(String),

    #[error("Unbalanced brace at byte {0} in prompt template")]
    UnbalancedBrace(usize),
}

/// Values substituted into a template's `{name}` placeholders.
pub type PromptVariables<'a> = BTreeMap<&'a str, &'a str>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Variable(String),
}

/// A system-message template followed by the conversation messages.
///
/// Placeholders are written `{name}`; `{{` and `}}` produce literal braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPromptTemplate {
    segments: Vec<Segment>,
}

impl ChatPromptTemplate {
    pub fn new(system_template: &str) -> Result<Self, PromptError> {
        Ok(Self {
            segments: parse(system_template)?,
        })
    }

    /// Fill the system template.
    pub fn format_system(&self, variables: &PromptVariables<'_>) -> Result<String, PromptError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Variable(name) => {
                    let value = variables
                        .get(name.as_str())
                        .ok_or_else(|| PromptError::MissingVariable(name.clone()))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }

    /// The full prompt: the rendered system message, then `messages` unchanged.
    pub fn render(
        &self,
        variables: &PromptVariables<'_>,
        messages: Vec<ChatMessage>,
    ) -> Result<Vec<ChatMessage>, PromptError> {
        let system = ChatMessage::system(self.format_system(variables)?);
        Ok(std::iter::once(system).chain(messages).collect())
    }
}

fn parse(template: &str) -> Result<Vec<Segment>, PromptError> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' if chars.peek().is_some_and(|&(_, n)| n == '{') => {
                chars.next();
                text.push('{');
            }
            '}' if chars.peek().is_some_and(|&(_, n)| n == '}') => {
                chars.next();
                text.push('}');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((_, '{')) | None => return Err(PromptError::UnbalancedBrace(pos)),
                        Some((_, ch)) => name.push(ch),
                    }
                }
                let name = name.trim();
                if name.is_empty() {
                    return Err(PromptError::UnbalancedBrace(pos));
                }
                if !text.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text)));
                }
                segments.push(Segment::Variable(name.to_string()));
            }
            '}' => return Err(PromptError::UnbalancedBrace(pos)),
            _ => text.push(c),
        }
    }

    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::Role;

    const LANGUAGE_PROMPT: &str = "You are a helpful assistant. Answer all questions to the best of your ability in {language}.";

    #[test]
    fn test_render_language_prompt() {
        let template = ChatPromptTemplate::new(LANGUAGE_PROMPT).unwrap();

        let vars = PromptVariables::from([("language", "italian")]);
        let rendered = template
            .render(&vars, vec![ChatMessage::user("Hi! I'm Bob")])
            .unwrap();

        assert_eq!(rendered.len(), 2);
        assert_eq!(rendered[0].role, Role::System);
        assert!(rendered[0].content.ends_with("in italian."));
        assert_eq!(rendered[1], ChatMessage::user("Hi! I'm Bob"));
    }

    #[test]
    fn test_missing_variable() {
        let template = ChatPromptTemplate::new(LANGUAGE_PROMPT).unwrap();
        let err = template.render(&PromptVariables::new(), Vec::new()).unwrap_err();
        assert_eq!(err, PromptError::MissingVariable("language".to_string()));
    }

    #[test]
    fn test_escaped_braces_and_repeats() {
        let template = ChatPromptTemplate::new("{{json}} {a}/{b}/{a}").unwrap();

        let vars = PromptVariables::from([("a", "1"), ("b", "2")]);
        assert_eq!(template.format_system(&vars).unwrap(), "{json} 1/2/1");
    }

    #[test]
    fn test_unbalanced_braces() {
        assert_eq!(
            ChatPromptTemplate::new("in {language"),
            Err(PromptError::UnbalancedBrace(3))
        );
        assert!(ChatPromptTemplate::new("oops }").is_err());
        assert!(ChatPromptTemplate::new("empty {}").is_err());
    }

    #[test]
    fn test_template_without_variables() {
        let template = ChatPromptTemplate::new("Talk like a pirate.").unwrap();
        assert_eq!(
            template.format_system(&PromptVariables::new()).unwrap(),
            "Talk like a pirate."
        );
    }
}
