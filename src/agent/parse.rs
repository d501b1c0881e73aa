use std::sync::LazyLock;

use regex::Regex;

pub const FINAL_ANSWER_MARKER: &str = "Final Answer:";

// `action` must be followed directly by the colon so that `Action Input:` lines never match.
static ACTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*[*_]*action[*_]*\s*:[*_]*\s*(.*?)\s*$").unwrap());
static INPUT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*[*_]*action[\s_]*input[*_]*\s*:[*_]*\s*(.*?)\s*$").unwrap()
});
static THOUGHT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*[*_]*thought[*_]*\s*:[*_]*\s*(.*?)\s*$").unwrap());

/// What one model reply asks the loop to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Text after the final-answer marker. Ends the run.
    Final(String),
    /// Everything else, including replies with no recognizable lines at all.
    Act(Directive),
}

/// First thought, action, and action input lines of a reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directive {
    pub thought: Option<String>,
    pub action: Option<String>,
    pub input: Option<String>,
}

impl Reply {
    pub fn parse(text: &str) -> Self {
        if let Some((_, answer)) = text.split_once(FINAL_ANSWER_MARKER) {
            return Reply::Final(answer.trim().to_string());
        }

        let mut directive = Directive::default();
        for line in text.lines() {
            if directive.thought.is_none() {
                directive.thought = capture(&THOUGHT_RE, line);
            }
            if directive.action.is_none() {
                directive.action = capture(&ACTION_RE, line);
            }
            if directive.input.is_none() {
                directive.input = capture(&INPUT_RE, line).map(|s| unquote(&s).to_string());
            }
        }
        Reply::Act(directive)
    }
}

#[cfg(test)]
impl Reply {
    pub fn get_final(&self) -> Option<&str> {
        match self {
            Reply::Final(s) => Some(s),
            _ => None,
        }
    }

    pub fn get_directive(&self) -> Option<&Directive> {
        match self {
            Reply::Act(d) => Some(d),
            _ => None,
        }
    }
}

fn capture(re: &Regex, line: &str) -> Option<String> {
    re.captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Strip one layer of matching quotes or backticks.
fn unquote(s: &str) -> &str {
    for q in ['"', '\'', '`'] {
        if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
            return s[1..s.len() - 1].trim();
        }
    }
    s
}
