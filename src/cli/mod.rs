/*!
Argument parsing, alias expansion and command validation.

Parsing rules (deliberately loose):
  - The first bare token is the command, alias-expanded (rws -> read_wiki_structure).
  - A token starting with one or two dashes is a flag; its name is
    alias-expanded (-r -> repoName). If the next token exists and does not
    itself look like a flag it becomes the value, otherwise the flag is
    boolean true.
  - Unknown flags are NOT an error: they are recorded under their literal
    name and forwarded verbatim as tool-call arguments. This is what lets
    new server-side tool parameters work without a client release.
  - `--help` / `-h` short-circuits everything.
  - `lang` and `verbose` are client options, never forwarded.

Validation checks command existence first, then per-command required
parameters, so exactly one error message is ever shown.
*/

use serde_json::Value;
use std::fmt;

use crate::i18n::Messages;

/// The closed set of commands the client can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ReadWikiStructure,
    ReadWikiContents,
    AskQuestion,
    ViewShare,
}

impl Command {
    /// Parse a canonical (already alias-expanded) command token.
    pub fn from_token(token: &str) -> Option<Command> {
        match token {
            "read_wiki_structure" => Some(Command::ReadWikiStructure),
            "read_wiki_contents" => Some(Command::ReadWikiContents),
            "ask_question" => Some(Command::AskQuestion),
            "view_share" => Some(Command::ViewShare),
            _ => None,
        }
    }

    /// Wire name used in the `tools/call` request.
    pub fn name(&self) -> &'static str {
        match self {
            Command::ReadWikiStructure => "read_wiki_structure",
            Command::ReadWikiContents => "read_wiki_contents",
            Command::AskQuestion => "ask_question",
            Command::ViewShare => "view_share",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Expand a command alias to its canonical name. Unknown tokens pass through.
pub fn expand_command(token: &str) -> &str {
    match token {
        "rws" | "str" => "read_wiki_structure",
        "rwc" | "cont" => "read_wiki_contents",
        "aq" | "ask" => "ask_question",
        "vs" => "view_share",
        other => other,
    }
}

/// Expand a parameter alias to its canonical name. Unknown tokens pass through.
pub fn expand_param(token: &str) -> &str {
    match token {
        "r" | "repo" => "repoName",
        "t" => "topic",
        "q" => "question",
        "u" => "uuid",
        "l" => "lang",
        "f" => "format",
        other => other,
    }
}

/// Client-side options, consumed by the CLI itself rather than forwarded.
#[derive(Debug, Default)]
pub struct Options {
    pub help: bool,
    pub lang: Option<String>,
    pub verbose: bool,
}

/// Result of parsing the raw argument list.
#[derive(Debug, Default)]
pub struct Parsed {
    pub command: Option<String>,
    /// Flag values, keyed by canonical name. String for `--flag value`,
    /// Bool(true) for a bare `--flag`. Forwarded as-is to `tools/call`.
    pub params: serde_json::Map<String, Value>,
    pub options: Options,
}

/// Walk the raw argument list left to right.
pub fn parse_args(args: &[String]) -> Parsed {
    let mut parsed = Parsed::default();

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];

        if arg == "--help" || arg == "-h" {
            parsed.options.help = true;
            return parsed;
        }

        if let Some(name) = arg.strip_prefix("--").or_else(|| arg.strip_prefix('-')) {
            let key = expand_param(name);
            let value = args.get(i + 1);

            match key {
                "lang" => {
                    parsed.options.lang = value.cloned();
                    i += 1;
                }
                "verbose" => {
                    parsed.options.verbose = true;
                }
                _ => {
                    if let Some(v) = value.filter(|v| !v.starts_with('-')) {
                        parsed.params.insert(key.to_string(), Value::String(v.clone()));
                        i += 1;
                    } else {
                        parsed.params.insert(key.to_string(), Value::Bool(true));
                    }
                }
            }
        } else if parsed.command.is_none() {
            parsed.command = Some(expand_command(arg).to_string());
        }

        i += 1;
    }

    parsed
}

/// A usage failure: the message to print and whether to follow with help text.
#[derive(Debug)]
pub struct UsageError {
    pub message: String,
    pub show_help: bool,
}

/// True when a parameter is present and non-empty (bare flags count as present).
fn has_param(params: &serde_json::Map<String, Value>, key: &str) -> bool {
    match params.get(key) {
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Bool(b)) => *b,
        Some(_) => true,
        None => false,
    }
}

/// Check command existence, then per-command required parameters.
pub fn validate(parsed: &Parsed, msgs: &Messages) -> Result<Command, UsageError> {
    let Some(token) = parsed.command.as_deref() else {
        return Err(UsageError {
            message: msgs.err_no_command.to_string(),
            show_help: true,
        });
    };

    let Some(command) = Command::from_token(token) else {
        return Err(UsageError {
            message: format!("{}: {}", msgs.err_invalid_command, token),
            show_help: true,
        });
    };

    let missing = |message: &str| UsageError {
        message: message.to_string(),
        show_help: false,
    };

    if command != Command::ViewShare && !has_param(&parsed.params, "repoName") {
        return Err(missing(msgs.err_missing_repo));
    }
    if command == Command::ReadWikiContents && !has_param(&parsed.params, "topic") {
        return Err(missing(msgs.err_missing_topic));
    }
    if command == Command::AskQuestion && !has_param(&parsed.params, "question") {
        return Err(missing(msgs.err_missing_question));
    }
    if command == Command::ViewShare && !has_param(&parsed.params, "uuid") {
        return Err(missing(msgs.err_missing_uuid));
    }

    Ok(command)
}

/// Print the full usage text to stdout.
pub fn print_help(msgs: &Messages) {
    println!();
    println!("{}", msgs.usage);
    println!();
    println!("{}", msgs.description);
    println!();
    println!("{}", msgs.help_commands);
    for (cmd, desc) in msgs.commands {
        println!("  {:<25} {}", cmd, desc);
    }
    println!();
    println!("{}", msgs.help_options);
    println!("  --repoName, -r, --repo  {}", msgs.opt_repo);
    println!("  --topic, -t            {}", msgs.opt_topic);
    println!("  --question, -q         {}", msgs.opt_question);
    println!("  --uuid, -u             {}", msgs.opt_uuid);
    println!("  --format, -f           {}", msgs.opt_format);
    println!("  --lang, -l             {}", msgs.opt_lang);
    println!("  --verbose              {}", msgs.opt_verbose);
    println!("  --help, -h             {}", msgs.help_title);
    println!();
    println!("Aliases:");
    println!("  rws, str               read_wiki_structure");
    println!("  rwc, cont              read_wiki_contents");
    println!("  aq, ask                ask_question");
    println!("  vs                     view_share");
    println!();
    println!("{}", msgs.help_examples);
    for ex in msgs.examples {
        println!("{}", ex);
    }
    println!();
    println!("{}", msgs.see_also);
    println!();
}

/* --------------------------------- Tests ---------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::{Lang, catalog};

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn command_aliases_expand_to_one_canonical_name() {
        for (alias, canonical) in [
            ("rws", "read_wiki_structure"),
            ("str", "read_wiki_structure"),
            ("rwc", "read_wiki_contents"),
            ("cont", "read_wiki_contents"),
            ("aq", "ask_question"),
            ("ask", "ask_question"),
            ("vs", "view_share"),
        ] {
            assert_eq!(expand_command(alias), canonical);
        }
        assert_eq!(expand_command("read_wiki_structure"), "read_wiki_structure");
        assert_eq!(expand_command("bogus"), "bogus", "unknown tokens pass through");
    }

    #[test]
    fn param_aliases_expand_to_one_canonical_name() {
        for (alias, canonical) in [
            ("r", "repoName"),
            ("repo", "repoName"),
            ("t", "topic"),
            ("q", "question"),
            ("u", "uuid"),
            ("l", "lang"),
            ("f", "format"),
        ] {
            assert_eq!(expand_param(alias), canonical);
        }
        assert_eq!(expand_param("whatever"), "whatever", "unknown tokens pass through");
    }

    #[test]
    fn first_bare_token_is_the_command() {
        let parsed = parse_args(&argv(&["rws", "-r", "owner/repo"]));
        assert_eq!(parsed.command.as_deref(), Some("read_wiki_structure"));
        assert_eq!(
            parsed.params.get("repoName"),
            Some(&Value::String("owner/repo".into()))
        );
    }

    #[test]
    fn flag_without_value_is_boolean_true() {
        let parsed = parse_args(&argv(&["aq", "--deep", "--question", "why?"]));
        assert_eq!(parsed.params.get("deep"), Some(&Value::Bool(true)));
        assert_eq!(
            parsed.params.get("question"),
            Some(&Value::String("why?".into()))
        );
    }

    #[test]
    fn unknown_flags_are_recorded_not_rejected() {
        let parsed = parse_args(&argv(&["rws", "--futureParam", "x"]));
        assert_eq!(
            parsed.params.get("futureParam"),
            Some(&Value::String("x".into()))
        );
    }

    #[test]
    fn help_short_circuits() {
        let parsed = parse_args(&argv(&["-h", "rws", "-r", "o/r"]));
        assert!(parsed.options.help);
        assert!(parsed.command.is_none());
        assert!(parsed.params.is_empty());
    }

    #[test]
    fn lang_is_an_option_not_a_param() {
        let parsed = parse_args(&argv(&["rws", "-l", "zh", "-r", "o/r"]));
        assert_eq!(parsed.options.lang.as_deref(), Some("zh"));
        assert!(!parsed.params.contains_key("lang"));
    }

    #[test]
    fn ask_question_without_question_fails_validation() {
        let msgs = catalog(Lang::En);
        let parsed = parse_args(&argv(&["ask_question", "-r", "o/r"]));
        let err = validate(&parsed, msgs).unwrap_err();
        assert_eq!(err.message, msgs.err_missing_question);
        assert!(!err.show_help);
    }

    #[test]
    fn invalid_command_is_checked_before_required_params() {
        let msgs = catalog(Lang::En);
        let parsed = parse_args(&argv(&["frobnicate"]));
        let err = validate(&parsed, msgs).unwrap_err();
        assert!(err.message.starts_with(msgs.err_invalid_command));
        assert!(err.show_help);
    }

    #[test]
    fn view_share_needs_uuid_but_not_repo() {
        let msgs = catalog(Lang::En);
        let parsed = parse_args(&argv(&["vs"]));
        let err = validate(&parsed, msgs).unwrap_err();
        assert_eq!(err.message, msgs.err_missing_uuid);

        let ok = parse_args(&argv(&["vs", "-u", "_5495e609"]));
        assert_eq!(validate(&ok, msgs).unwrap(), Command::ViewShare);
    }

    #[test]
    fn empty_string_value_counts_as_missing() {
        let msgs = catalog(Lang::En);
        let parsed = parse_args(&argv(&["read_wiki_contents", "-r", "o/r", "--topic", ""]));
        // "" does not look like a flag, so it is consumed as the value
        let err = validate(&parsed, msgs).unwrap_err();
        assert_eq!(err.message, msgs.err_missing_topic);
    }
}
