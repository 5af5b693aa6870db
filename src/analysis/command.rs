//! User commands posted as pull request comments.
//!
//! Recognized forms (case-insensitive, filenames may be wrapped in backticks):
//! - `summarize tests [file]`
//! - `generate tests <file>` / `all generate tests`
//! - `explain tests <file>` / `all explain tests`
//! - `sec check <file>`
//! - `custom prompt <file> --prompt <text>` / `all custom prompt --prompt <text>`
//!
//! Every form accepts a trailing `--prompt <text>`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::FileRecord;
use crate::errors::CommandError;

static PROMPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)(?:^|\s)--prompt\s+(.+)$").unwrap());
static COMMAND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(all\s+)?(summarize\s+tests|generate\s+tests|explain\s+tests|sec\s+check|custom\s+prompt)(?:\s+(.+))?$")
        .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    SummarizeTests,
    GenerateTests,
    ExplainTests,
    SecCheck,
    CustomPrompt,
}

impl CommandAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandAction::SummarizeTests => "summarize tests",
            CommandAction::GenerateTests => "generate tests",
            CommandAction::ExplainTests => "explain tests",
            CommandAction::SecCheck => "sec check",
            CommandAction::CustomPrompt => "custom prompt",
        }
    }

    fn parse(words: &str) -> Option<Self> {
        let normalized = words.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_lowercase();
        match normalized.as_str() {
            "summarize tests" => Some(CommandAction::SummarizeTests),
            "generate tests" => Some(CommandAction::GenerateTests),
            "explain tests" => Some(CommandAction::ExplainTests),
            "sec check" => Some(CommandAction::SecCheck),
            "custom prompt" => Some(CommandAction::CustomPrompt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandScope {
    AllFiles,
    File(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCommand {
    pub action: CommandAction,
    pub scope: CommandScope,
    pub prompt: Option<String>,
}

impl UserCommand {
    /// Parse a comment body. `None` when the comment is not a command.
    pub fn parse(body: &str) -> Option<Self> {
        let trimmed = body.trim();
        let (head, prompt) = match PROMPT.captures(trimmed) {
            Some(cap) => {
                let start = cap.get(0)?.start();
                let prompt = cap.get(1).map(|m| m.as_str().trim().to_string()).filter(|p| !p.is_empty());
                (trimmed[..start].trim(), prompt)
            }
            None => (trimmed, None),
        };

        let cap = COMMAND.captures(head)?;
        let all = cap.get(1).is_some();
        let action = CommandAction::parse(cap.get(2)?.as_str())?;
        let file = cap
            .get(3)
            .map(|m| m.as_str().replace('`', "").trim().to_string())
            .filter(|f| !f.is_empty());

        let scope = match (all, file, action) {
            (true, Some(_), _) => return None,
            (true, None, CommandAction::GenerateTests | CommandAction::ExplainTests | CommandAction::CustomPrompt) => {
                CommandScope::AllFiles
            }
            (true, None, _) => return None,
            (false, Some(file), _) => CommandScope::File(file),
            (false, None, CommandAction::SummarizeTests) => CommandScope::AllFiles,
            (false, None, _) => return None,
        };

        if action == CommandAction::CustomPrompt && prompt.is_none() {
            return None;
        }
        Some(Self { action, scope, prompt })
    }

    /// Paths this command applies to.
    ///
    /// `AllFiles` selects every non-test record. A named file must be a
    /// record, a test to modify, or the unique record ending in `/<file>`.
    pub fn targets(
        &self,
        records: &BTreeMap<String, FileRecord>,
        tests_to_modify: &[String],
    ) -> Result<Vec<String>, CommandError> {
        let file = match &self.scope {
            CommandScope::AllFiles => {
                return Ok(records.values().filter(|r| !r.is_test()).map(|r| r.path.clone()).collect());
            }
            CommandScope::File(file) => file.trim_start_matches("./"),
        };

        if records.contains_key(file) || tests_to_modify.iter().any(|t| t == file) {
            return Ok(vec![file.to_string()]);
        }

        let suffix = format!("/{file}");
        let matches: Vec<String> = records.keys().filter(|p| p.ends_with(&suffix)).cloned().collect();
        match matches.len() {
            1 => Ok(matches),
            0 => Err(CommandError::UnknownFile {
                file: file.to_string(),
                available: records.keys().cloned().chain(tests_to_modify.iter().cloned()).collect(),
            }),
            _ => Err(CommandError::Ambiguous { file: file.to_string(), matches }),
        }
    }
}

impl fmt::Display for UserCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            CommandScope::AllFiles if self.action == CommandAction::SummarizeTests => {
                write!(f, "{}", self.action.as_str())?
            }
            CommandScope::AllFiles => write!(f, "all {}", self.action.as_str())?,
            CommandScope::File(file) => write!(f, "{} {}", self.action.as_str(), file)?,
        }
        if let Some(prompt) = &self.prompt {
            write!(f, " --prompt {prompt}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FileStatus;

    fn file(action: CommandAction, name: &str, prompt: Option<&str>) -> UserCommand {
        UserCommand {
            action,
            scope: CommandScope::File(name.to_string()),
            prompt: prompt.map(str::to_string),
        }
    }

    #[test]
    fn parses_every_form() {
        assert_eq!(
            UserCommand::parse("generate tests `src/math.ts`"),
            Some(file(CommandAction::GenerateTests, "src/math.ts", None))
        );
        assert_eq!(
            UserCommand::parse("  Explain   Tests src/a.ts --prompt focus on edge cases \n"),
            Some(file(CommandAction::ExplainTests, "src/a.ts", Some("focus on edge cases")))
        );
        assert_eq!(
            UserCommand::parse("sec check lib/auth.py"),
            Some(file(CommandAction::SecCheck, "lib/auth.py", None))
        );
        assert_eq!(
            UserCommand::parse("custom prompt src/a.ts --prompt list mocks"),
            Some(file(CommandAction::CustomPrompt, "src/a.ts", Some("list mocks")))
        );
        let all = UserCommand::parse("all custom prompt --prompt review naming").expect("command");
        assert_eq!(all.scope, CommandScope::AllFiles);
        assert_eq!(all.prompt.as_deref(), Some("review naming"));
    }

    #[test]
    fn summarize_without_file_covers_all_files() {
        let cmd = UserCommand::parse("summarize tests --prompt be brief").expect("command");
        assert_eq!(cmd.scope, CommandScope::AllFiles);
        assert_eq!(cmd.prompt.as_deref(), Some("be brief"));
    }

    #[test]
    fn rejects_incomplete_or_unknown_commands() {
        for body in [
            "generate tests",
            "sec check",
            "custom prompt src/a.ts",
            "all custom prompt",
            "all generate tests src/a.ts",
            "all sec check",
            "please generate tests for src/a.ts",
            "LGTM",
        ] {
            assert_eq!(UserCommand::parse(body), None, "{body}");
        }
    }

    #[test]
    fn display_round_trips() {
        for body in ["generate tests src/a.ts", "all explain tests", "summarize tests", "custom prompt a.ts --prompt x y"] {
            let cmd = UserCommand::parse(body).expect("command");
            assert_eq!(cmd.to_string(), body);
            assert_eq!(UserCommand::parse(&cmd.to_string()), Some(cmd));
        }
    }

    fn records() -> BTreeMap<String, FileRecord> {
        ["src/math.ts", "src/util/format.ts", "lib/format.ts", "test/math.test.ts"]
            .into_iter()
            .map(|p| (p.to_string(), FileRecord::new(p, FileStatus::Modified)))
            .collect()
    }

    #[test]
    fn targets_resolve_named_files() {
        let records = records();
        let tests = vec!["test/util.test.ts".to_string()];

        let exact = file(CommandAction::GenerateTests, "src/math.ts", None);
        assert_eq!(exact.targets(&records, &tests), Ok(vec!["src/math.ts".to_string()]));

        let suffix = file(CommandAction::GenerateTests, "math.ts", None);
        assert_eq!(suffix.targets(&records, &tests), Ok(vec!["src/math.ts".to_string()]));

        let test = file(CommandAction::ExplainTests, "test/util.test.ts", None);
        assert_eq!(test.targets(&records, &tests), Ok(vec!["test/util.test.ts".to_string()]));

        let ambiguous = file(CommandAction::GenerateTests, "format.ts", None);
        assert!(matches!(ambiguous.targets(&records, &tests), Err(CommandError::Ambiguous { .. })));

        let missing = file(CommandAction::GenerateTests, "nope.ts", None);
        let err = missing.targets(&records, &tests).expect_err("unknown");
        assert!(err.to_string().contains("was not found in the analysis"));
    }

    #[test]
    fn all_files_skips_tests() {
        let cmd = UserCommand::parse("all generate tests").expect("command");
        let targets = cmd.targets(&records(), &[]).expect("targets");
        assert_eq!(targets, vec!["lib/format.ts", "src/math.ts", "src/util/format.ts"]);
    }
}
