/*!
Two-locale message catalog (en / zh).

This is a lookup table, not a localization engine:
  - Lang::from_tag("zh_CN.UTF-8") -> Zh, anything else -> En
  - detect() walks LANG / LC_ALL / LC_MESSAGES
  - catalog(lang) returns a &'static Messages

`--lang` / `-l` overrides detection; see main.rs.
*/

/// Supported output languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    En,
    Zh,
}

impl Lang {
    /// Map a locale tag (e.g. "zh_CN.UTF-8", "en", "zh") to a language.
    pub fn from_tag(tag: &str) -> Lang {
        if tag.trim().starts_with("zh") {
            Lang::Zh
        } else {
            Lang::En
        }
    }
}

/// Detect the output language from the locale environment.
pub fn detect() -> Lang {
    for var in ["LANG", "LC_ALL", "LC_MESSAGES"] {
        if let Ok(v) = std::env::var(var)
            && !v.trim().is_empty()
        {
            return Lang::from_tag(&v);
        }
    }
    Lang::En
}

/// Every user-facing string, per language.
pub struct Messages {
    pub usage: &'static str,
    pub description: &'static str,

    /// (name, description) rows for the help command table; aliases included.
    pub commands: &'static [(&'static str, &'static str)],

    pub opt_repo: &'static str,
    pub opt_topic: &'static str,
    pub opt_question: &'static str,
    pub opt_uuid: &'static str,
    pub opt_format: &'static str,
    pub opt_lang: &'static str,
    pub opt_verbose: &'static str,

    pub examples: &'static [&'static str],

    pub err_no_command: &'static str,
    pub err_invalid_command: &'static str,
    pub err_missing_repo: &'static str,
    pub err_missing_topic: &'static str,
    pub err_missing_question: &'static str,
    pub err_missing_uuid: &'static str,
    pub err_connection_failed: &'static str,
    pub err_request_failed: &'static str,
    pub err_timeout: &'static str,

    pub help_title: &'static str,
    pub help_commands: &'static str,
    pub help_options: &'static str,
    pub help_examples: &'static str,
    pub see_also: &'static str,
}

/// Return the catalog for a language.
pub fn catalog(lang: Lang) -> &'static Messages {
    match lang {
        Lang::En => &EN,
        Lang::Zh => &ZH,
    }
}

static EN: Messages = Messages {
    usage: "Usage: dw <command> [options]",
    description: "A CLI tool for retrieving GitHub repository documentation and knowledge via DeepWiki",
    commands: &[
        ("read_wiki_structure", "Get repository documentation structure"),
        ("rws", "[alias] Get repository documentation structure"),
        ("read_wiki_contents", "Read specific documentation content"),
        ("rwc", "[alias] Read specific documentation content"),
        ("ask_question", "Ask questions about the repository"),
        ("aq", "[alias] Ask questions about the repository"),
        ("view_share", "View shared query result by UUID"),
        ("vs", "[alias] View shared query result by UUID"),
    ],
    opt_repo: "Repository name (e.g., \"owner/repo\")",
    opt_topic: "Documentation topic name",
    opt_question: "Your question about the repository",
    opt_uuid: "Share query UUID (e.g., \"_5495e609-f29e-44a7-a7bf-91c3f8f76303\")",
    opt_format: "Output format (brief|full|json, default: full)",
    opt_lang: "Language (en|zh, default: auto)",
    opt_verbose: "Log protocol details to stderr",
    examples: &[
        "  dw read_wiki_structure --repoName \"openai/openai-node\"",
        "  dw read_wiki_contents --repoName \"openai/openai-node\" --topic \"Installation\"",
        "  dw ask_question --repoName \"openai/openai-node\" --question \"How to authenticate?\"",
        "  dw view_share --uuid \"_5495e609-f29e-44a7-a7bf-91c3f8f76303\"",
        "  dw view_share --uuid \"...\" --format brief",
        "  dw view_share --uuid \"...\" --format json",
    ],
    err_no_command: "Error: No command provided",
    err_invalid_command: "Error: Invalid command",
    err_missing_repo: "Error: --repoName is required",
    err_missing_topic: "Error: --topic is required",
    err_missing_question: "Error: --question is required",
    err_missing_uuid: "Error: --uuid is required",
    err_connection_failed: "Error: SSE connection failed",
    err_request_failed: "Error: Request failed",
    err_timeout: "Error: Timeout - no response from server",
    help_title: "Help",
    help_commands: "Commands:",
    help_options: "Options:",
    help_examples: "Examples:",
    see_also: "For more information, visit: https://github.com/Dwsy/deepwiki-skills",
};

static ZH: Messages = Messages {
    usage: "用法: dw <命令> [选项]",
    description: "通过 DeepWiki MCP SSE 协议获取 GitHub 仓库文档和知识的 CLI 工具",
    commands: &[
        ("read_wiki_structure", "获取仓库文档结构"),
        ("rws", "[别名] 获取仓库文档结构"),
        ("read_wiki_contents", "查看具体文档内容"),
        ("rwc", "[别名] 查看具体文档内容"),
        ("ask_question", "针对仓库提问"),
        ("aq", "[别名] 针对仓库提问"),
        ("view_share", "查看分享的查询结果"),
        ("vs", "[别名] 查看分享的查询结果"),
    ],
    opt_repo: "仓库名称 (例如: \"owner/repo\")",
    opt_topic: "文档主题名称",
    opt_question: "关于仓库的问题",
    opt_uuid: "分享查询的 UUID (例如: \"_5495e609-f29e-44a7-a7bf-91c3f8f76303\")",
    opt_format: "输出格式 (brief|full|json, 默认: full)",
    opt_lang: "语言 (en|zh, 默认: 自动)",
    opt_verbose: "在 stderr 输出协议调试信息",
    examples: &[
        "  dw read_wiki_structure --repoName \"openai/openai-node\"",
        "  dw read_wiki_contents --repoName \"openai/openai-node\" --topic \"Installation\"",
        "  dw ask_question --repoName \"openai/openai-node\" --question \"如何认证?\"",
        "  dw view_share --uuid \"_5495e609-f29e-44a7-a7bf-91c3f8f76303\"",
        "  dw view_share --uuid \"...\" --format brief",
        "  dw view_share --uuid \"...\" --format json",
    ],
    err_no_command: "错误: 未提供命令",
    err_invalid_command: "错误: 无效的命令",
    err_missing_repo: "错误: 需要 --repoName 参数",
    err_missing_topic: "错误: 需要 --topic 参数",
    err_missing_question: "错误: 需要 --question 参数",
    err_missing_uuid: "错误: 需要 --uuid 参数",
    err_connection_failed: "错误: SSE 连接失败",
    err_request_failed: "错误: 请求失败",
    err_timeout: "错误: 超时 - 未收到服务器响应",
    help_title: "帮助",
    help_commands: "命令:",
    help_options: "选项:",
    help_examples: "示例:",
    see_also: "更多信息请访问: https://github.com/Dwsy/deepwiki-skills",
};

/* --------------------------------- Tests ---------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zh_prefix_selects_chinese() {
        assert_eq!(Lang::from_tag("zh_CN.UTF-8"), Lang::Zh);
        assert_eq!(Lang::from_tag("zh"), Lang::Zh);
        assert_eq!(Lang::from_tag("en_US.UTF-8"), Lang::En);
        assert_eq!(Lang::from_tag(""), Lang::En);
    }

    #[test]
    fn catalogs_differ() {
        assert_ne!(catalog(Lang::En).usage, catalog(Lang::Zh).usage);
        assert_eq!(catalog(Lang::En).commands.len(), catalog(Lang::Zh).commands.len());
    }
}
