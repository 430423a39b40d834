//! Prompting seam for the interactive question engine
//!
//! Topics talk to a [`Prompter`] rather than to the terminal directly, so
//! the whole question pipeline can be driven by a scripted prompter in
//! tests. The default implementation is cliclack-backed (feature `tui`).

use crate::error::CoreError;
use anyhow::Result;

/// Entering this at any free-text prompt clears the field to empty instead
/// of keeping the previous value.
pub const CLEAR_SENTINEL: &str = "-";

/// Source of operator answers.
pub trait Prompter {
    /// Free-text input with a default shown when non-empty.
    fn input(&mut self, prompt: &str, default: &str) -> Result<String>;

    /// Masked input for secrets.
    fn password(&mut self, prompt: &str) -> Result<String>;

    /// Yes/no question.
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool>;

    /// Enumerated choice; `items` are (value, label) pairs, returns the
    /// chosen value.
    fn select(&mut self, prompt: &str, items: &[(&str, &str)], default: &str) -> Result<String>;

    /// Show a validation error before re-prompting.
    fn note_error(&mut self, message: &str) -> Result<()>;
}

/// Prompt/validate/retry loop: re-asks the same prompt with an error message
/// until the validator accepts. The clear sentinel short-circuits to empty.
pub fn ask_validated<F>(
    prompter: &mut dyn Prompter,
    prompt: &str,
    default: &str,
    mut validate: F,
) -> Result<String>
where
    F: FnMut(&str) -> std::result::Result<String, String>,
{
    loop {
        let raw = prompter.input(prompt, default)?;
        if raw.trim() == CLEAR_SENTINEL {
            return Ok(String::new());
        }
        match validate(raw.trim()) {
            Ok(value) => return Ok(value),
            Err(message) => prompter.note_error(&message)?,
        }
    }
}

/// Masked secret prompt. A blank answer keeps the previous value when one
/// exists; otherwise the prompt retries until something is entered.
pub fn ask_password(
    prompter: &mut dyn Prompter,
    prompt: &str,
    previous: &str,
) -> Result<String> {
    let label = if previous.is_empty() {
        prompt.to_string()
    } else {
        format!("{} (blank keeps current)", prompt)
    };
    loop {
        let raw = prompter.password(&label)?;
        if raw.is_empty() {
            if previous.is_empty() {
                prompter.note_error("A value is required")?;
                continue;
            }
            return Ok(previous.to_string());
        }
        return Ok(raw);
    }
}

/// Masked secret prompt for an optional password. The clear sentinel
/// empties the value; a blank answer keeps the previous one (which may
/// itself be empty).
pub fn ask_password_or_clear(
    prompter: &mut dyn Prompter,
    prompt: &str,
    previous: &str,
) -> Result<String> {
    let label = if previous.is_empty() {
        format!("{} (\"{}\" for none)", prompt, CLEAR_SENTINEL)
    } else {
        format!(
            "{} (blank keeps current, \"{}\" for none)",
            prompt, CLEAR_SENTINEL
        )
    };
    let raw = prompter.password(&label)?;
    if raw.trim() == CLEAR_SENTINEL {
        return Ok(String::new());
    }
    if raw.is_empty() {
        return Ok(previous.to_string());
    }
    Ok(raw)
}

/// Input validators used across topics.
pub mod validate {
    /// Non-empty free text.
    pub fn non_empty(raw: &str) -> Result<String, String> {
        if raw.is_empty() {
            Err("A value is required".to_string())
        } else {
            Ok(raw.to_string())
        }
    }

    /// TCP port in the unprivileged-safe range.
    pub fn port(raw: &str) -> Result<String, String> {
        match raw.parse::<u16>() {
            Ok(p) if p > 0 => Ok(p.to_string()),
            _ => Err("Enter a port number between 1 and 65535".to_string()),
        }
    }

    /// Integer within an inclusive range.
    pub fn integer_in(raw: &str, min: i64, max: i64) -> Result<String, String> {
        match raw.parse::<i64>() {
            Ok(n) if n >= min && n <= max => Ok(n.to_string()),
            _ => Err(format!("Enter a number between {} and {}", min, max)),
        }
    }

    /// Hostname/domain label: alphanumerics, dots and hyphens only.
    pub fn domain(raw: &str) -> Result<String, String> {
        let ok = !raw.is_empty()
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
            && !raw.starts_with('.')
            && !raw.ends_with('.');
        if ok {
            Ok(raw.to_lowercase())
        } else {
            Err("Enter a valid domain name (letters, digits, dots, hyphens)".to_string())
        }
    }

    /// Single DNS label (no dots).
    pub fn subdomain(raw: &str) -> Result<String, String> {
        let ok = !raw.is_empty()
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-');
        if ok {
            Ok(raw.to_lowercase())
        } else {
            Err("Enter a single DNS label (letters, digits, hyphens)".to_string())
        }
    }

    /// Minimal email shape check; real verification happens out of band.
    pub fn email(raw: &str) -> Result<String, String> {
        let mut parts = raw.splitn(2, '@');
        let local = parts.next().unwrap_or("");
        let host = parts.next().unwrap_or("");
        if !local.is_empty() && host.contains('.') && !host.ends_with('.') {
            Ok(raw.to_string())
        } else {
            Err("Enter a valid email address".to_string())
        }
    }

    /// Five-field cron expression; field contents are not interpreted here.
    pub fn cron(raw: &str) -> Result<String, String> {
        let fields: Vec<&str> = raw.split_whitespace().collect();
        let ok = fields.len() == 5
            && fields.iter().all(|f| {
                f.chars()
                    .all(|c| c.is_ascii_digit() || matches!(c, '*' | '/' | ',' | '-'))
            });
        if ok {
            Ok(fields.join(" "))
        } else {
            Err("Enter a five-field cron expression, e.g. \"0 2 * * 0\"".to_string())
        }
    }

    /// Identifier used for database users and names.
    pub fn identifier(raw: &str) -> Result<String, String> {
        let ok = !raw.is_empty()
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !raw.chars().next().is_some_and(|c| c.is_ascii_digit());
        if ok {
            Ok(raw.to_string())
        } else {
            Err("Use letters, digits and underscores, not starting with a digit".to_string())
        }
    }
}

/// Cliclack-backed prompter used by the real CLI.
#[cfg(feature = "tui")]
pub struct CliclackPrompter;

#[cfg(feature = "tui")]
impl Prompter for CliclackPrompter {
    fn input(&mut self, prompt: &str, default: &str) -> Result<String> {
        let answer: String = if default.is_empty() {
            cliclack::input(prompt).required(false).interact()?
        } else {
            cliclack::input(prompt).default_input(default).interact()?
        };
        Ok(answer)
    }

    fn password(&mut self, prompt: &str) -> Result<String> {
        let answer: String = cliclack::password(prompt).mask('*').interact()?;
        Ok(answer)
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        let answer = cliclack::confirm(prompt).initial_value(default).interact()?;
        Ok(answer)
    }

    fn select(&mut self, prompt: &str, items: &[(&str, &str)], default: &str) -> Result<String> {
        let mut select = cliclack::select(prompt);
        let mut initial = 0;
        for (idx, (value, label)) in items.iter().enumerate() {
            select = select.item(idx, label, "");
            if *value == default {
                initial = idx;
            }
        }
        let chosen: usize = select.initial_value(initial).interact()?;
        Ok(items[chosen].0.to_string())
    }

    fn note_error(&mut self, message: &str) -> Result<()> {
        cliclack::log::error(message)?;
        Ok(())
    }
}

/// Scripted prompter for tests: answers are consumed in order, one per
/// prompt; running out aborts the session like an interrupt would.
pub struct ScriptedPrompter {
    answers: std::collections::VecDeque<String>,
    /// Validation errors surfaced during the session, for assertions.
    pub errors: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            errors: Vec::new(),
        }
    }

    fn next(&mut self, prompt: &str) -> Result<String> {
        self.answers
            .pop_front()
            .ok_or_else(|| CoreError::PromptAborted(format!("no scripted answer for: {}", prompt)).into())
    }
}

impl Prompter for ScriptedPrompter {
    fn input(&mut self, prompt: &str, default: &str) -> Result<String> {
        let raw = self.next(prompt)?;
        if raw.is_empty() {
            Ok(default.to_string())
        } else {
            Ok(raw)
        }
    }

    fn password(&mut self, prompt: &str) -> Result<String> {
        self.next(prompt)
    }

    fn confirm(&mut self, prompt: &str, _default: bool) -> Result<bool> {
        let raw = self.next(prompt)?;
        Ok(matches!(raw.as_str(), "y" | "yes" | "true"))
    }

    fn select(&mut self, prompt: &str, items: &[(&str, &str)], _default: &str) -> Result<String> {
        let raw = self.next(prompt)?;
        if items.iter().any(|(value, _)| *value == raw) {
            Ok(raw)
        } else {
            Err(CoreError::PromptAborted(format!(
                "scripted answer {:?} is not an option for: {}",
                raw, prompt
            ))
            .into())
        }
    }

    fn note_error(&mut self, message: &str) -> Result<()> {
        self.errors.push(message.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ask_validated_retries_until_accepted() {
        let mut prompter = ScriptedPrompter::new(["abc", "70000", "8080"]);
        let value = ask_validated(&mut prompter, "Port", "80", validate::port).unwrap();
        assert_eq!(value, "8080");
        assert_eq!(prompter.errors.len(), 2);
    }

    #[test]
    fn test_clear_sentinel_yields_empty() {
        let mut prompter = ScriptedPrompter::new(["-"]);
        let value =
            ask_validated(&mut prompter, "Email", "a@b.co", validate::email).unwrap();
        assert_eq!(value, "");
    }

    #[test]
    fn test_empty_answer_takes_default() {
        let mut prompter = ScriptedPrompter::new([""]);
        let value = ask_validated(&mut prompter, "Port", "8080", validate::port).unwrap();
        assert_eq!(value, "8080");
    }

    #[test]
    fn test_optional_password_keeps_and_clears() {
        let mut prompter = ScriptedPrompter::new([""]);
        let kept = ask_password_or_clear(&mut prompter, "Redis password", "old").unwrap();
        assert_eq!(kept, "old");

        let mut prompter = ScriptedPrompter::new(["-"]);
        let cleared = ask_password_or_clear(&mut prompter, "Redis password", "old").unwrap();
        assert_eq!(cleared, "");

        let mut prompter = ScriptedPrompter::new([""]);
        let none = ask_password_or_clear(&mut prompter, "Redis password", "").unwrap();
        assert_eq!(none, "");
    }

    #[test]
    fn test_validators() {
        assert!(validate::domain("Example.ORG").is_ok());
        assert!(validate::domain("bad domain").is_err());
        assert!(validate::subdomain("app-2").is_ok());
        assert!(validate::subdomain("a.b").is_err());
        assert!(validate::email("ops@example.org").is_ok());
        assert!(validate::email("nope").is_err());
        assert!(validate::cron("0 2 * * 0").is_ok());
        assert!(validate::cron("every sunday").is_err());
        assert!(validate::identifier("app_user").is_ok());
        assert!(validate::identifier("1bad").is_err());
    }
}
