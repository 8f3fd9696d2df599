use anyhow::Result;

mod cli;
mod cmd;
mod i18n;
mod mcp;
mod utils;

use cli::Command;

/// DeepWiki CLI (`dw`)
///
/// Queries the DeepWiki documentation service:
///   dw read_wiki_structure --repoName "owner/repo"
///   dw read_wiki_contents  --repoName "owner/repo" --topic "Installation"
///   dw ask_question        --repoName "owner/repo" --question "How to authenticate?"
///   dw view_share          --uuid "_5495e609-..." [--format brief|full|json]
///
/// The three wiki commands run one JSON-RPC tool call over an SSE session;
/// view_share is a plain REST lookup. `--lang en|zh` overrides the locale
/// auto-detection, `--verbose` logs protocol details to stderr.
///
/// Exit codes: 0 on success or help display, 1 on any failure.
fn main() {
    if let Err(e) = run() {
        // Catalog messages carry their own localized "Error:" prefix.
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let parsed = cli::parse_args(&args);

    let lang = parsed
        .options
        .lang
        .as_deref()
        .map(i18n::Lang::from_tag)
        .unwrap_or_else(i18n::detect);
    let msgs = i18n::catalog(lang);

    utils::init_logging(utils::derive_level(parsed.options.verbose));

    if parsed.options.help || parsed.command.is_none() {
        cli::print_help(msgs);
        return Ok(());
    }

    let command = match cli::validate(&parsed, msgs) {
        Ok(command) => command,
        Err(usage) => {
            eprintln!("{}", usage.message);
            if usage.show_help {
                eprintln!();
                cli::print_help(msgs);
            }
            std::process::exit(1);
        }
    };

    match command {
        Command::ViewShare => cmd::execute_share(&parsed.params, msgs),
        _ => cmd::execute_query(command, &parsed.params, msgs),
    }
}
