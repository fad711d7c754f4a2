//! Concrete inline chat actions: external commands and built-ins.
//!
//! A `command` action runs `sh -c <command>` with the whole-line selection on
//! stdin and treats stdout as the reply, so any CLI model client that prints
//! a fenced code block works as a diff preview source. Built-ins need no
//! external program.

use std::process::Stdio;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use inlay_core::{
    DiffPreviewStrategy, EditorSurface, FeatureRegistry, InlineChatAction, InlineChatHandler,
    StrategyRequest, StrategyResponse,
};
use inlay_core::text::expand_to_lines;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::config::ActionConfig;

/// Runs a shell command per request.
#[derive(Debug, Clone)]
pub struct CommandStrategy {
    command: String,
}

impl CommandStrategy {
    pub fn new(command: impl Into<String>) -> Self {
        Self { command: command.into() }
    }

    async fn run(command: String, request: StrategyRequest) -> StrategyResponse {
        let mut process = Command::new("sh");
        process
            .arg("-c")
            .arg(&command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .env("INLAY_ACTION", &request.action_id)
            .env("INLAY_START_LINE", request.cross_selection.start_line().to_string())
            .env("INLAY_END_LINE", request.cross_selection.end_line().to_string());
        if let Some(uri) = &request.uri {
            process.env("INLAY_FILE", &uri.path);
            if let Some(ext) = uri.extension() {
                process.env("INLAY_LANGUAGE", ext);
            }
        }

        let mut child = match process.spawn() {
            Ok(child) => child,
            Err(error) => return StrategyResponse::error(format!("cannot run `{command}`: {error}")),
        };

        // Written from its own task so a child that prints before reading
        // stdin cannot deadlock against us.
        if let Some(mut stdin) = child.stdin.take() {
            let input = request.cross_text.into_bytes();
            tokio::spawn(async move {
                if let Err(error) = stdin.write_all(&input).await {
                    tracing::debug!(%error, "strategy stdin closed early");
                }
            });
        }

        match child.wait_with_output().await {
            Ok(output) if output.status.success() => {
                StrategyResponse::reply(String::from_utf8_lossy(&output.stdout))
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                StrategyResponse::error(format!("`{command}` exited with {}: {}", output.status, stderr.trim()))
            }
            Err(error) => StrategyResponse::error(format!("`{command}` failed: {error}")),
        }
    }
}

impl DiffPreviewStrategy for CommandStrategy {
    /// Resolves to `Cancel` as soon as `token` fires; dropping the pending
    /// wait kills the child.
    fn provide(
        &self,
        request: StrategyRequest,
        token: CancellationToken,
    ) -> BoxFuture<'static, StrategyResponse> {
        let command = self.command.clone();
        async move {
            tokio::select! {
                _ = token.cancelled() => StrategyResponse::Cancel,
                response = Self::run(command, request) => response,
            }
        }
        .boxed()
    }
}

// ---------------------------------------------------------------------------
// Built-ins
// ---------------------------------------------------------------------------

/// Line comment prefix for a file extension.
pub fn comment_prefix(extension: Option<&str>) -> &'static str {
    match extension {
        Some("py" | "sh" | "bash" | "toml" | "yaml" | "yml" | "rb" | "pl" | "r" | "conf") => "#",
        Some("sql" | "lua" | "hs" | "elm") => "--",
        Some("vim") => "\"",
        Some("lisp" | "el" | "clj" | "scm") => ";;",
        _ => "//",
    }
}

/// Comments every non-blank line, or uncomments them all when every
/// non-blank line is already commented.
pub fn toggle_comment(text: &str, prefix: &str) -> String {
    let is_commented = |line: &str| line.trim_start().starts_with(prefix);
    let all_commented = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .all(is_commented);
    text.split('\n')
        .map(|line| {
            if line.trim().is_empty() {
                return line.to_owned();
            }
            let indent = &line[..line.len() - line.trim_start().len()];
            let body = line.trim_start();
            if all_commented {
                let rest = &body[prefix.len()..];
                format!("{indent}{}", rest.strip_prefix(' ').unwrap_or(rest))
            } else {
                format!("{indent}{prefix} {body}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn trim_trailing(text: &str) -> String {
    text.split('\n').map(str::trim_end).collect::<Vec<_>>().join("\n")
}

/// Sorts lines; trailing blank lines stay at the end.
pub fn sort_lines(text: &str) -> String {
    let mut lines: Vec<&str> = text.split('\n').collect();
    let blank_tail = lines.iter().rev().take_while(|l| l.trim().is_empty()).count();
    let keep = lines.len() - blank_tail;
    lines[..keep].sort_unstable();
    lines.join("\n")
}

/// Rewrites the whole lines under the selection with `transform`.
fn rewrite_selected_lines(editor: &mut dyn EditorSurface, transform: impl Fn(&str, Option<&str>) -> String) {
    let Some(selection) = editor.selection() else {
        return;
    };
    let lines = expand_to_lines(selection);
    let original = editor.value_in_range(lines);
    let extension = editor.uri().and_then(|uri| uri.extension());
    let updated = transform(&original, extension.as_deref());
    if updated != original {
        editor.push_edit(lines, &updated);
    }
}

/// Handler for a `builtin = "..."` action, or `None` for an unknown name.
pub fn builtin_handler(name: &str) -> Option<InlineChatHandler> {
    let handler = match name {
        "toggle-comment" => InlineChatHandler::execute(|editor: &mut dyn EditorSurface| {
            rewrite_selected_lines(editor, |text, ext| toggle_comment(text, comment_prefix(ext)));
        }),
        "trim-trailing" => InlineChatHandler::execute(|editor: &mut dyn EditorSurface| {
            rewrite_selected_lines(editor, |text, _| trim_trailing(text));
        }),
        // Proposed as a diff rather than applied, like a model reply would be.
        "sort-lines" => InlineChatHandler::diff_preview(
            |request: StrategyRequest, _token: CancellationToken| async move {
                StrategyResponse::reply(format!("```\n{}\n```", sort_lines(&request.cross_text)))
            },
        ),
        _ => return None,
    };
    Some(handler)
}

/// Actions offered when the config lists none.
pub fn default_actions() -> Vec<ActionConfig> {
    [
        ("sort", "Sort lines", "sort-lines"),
        ("comment", "Toggle comment", "toggle-comment"),
        ("trim", "Trim trailing whitespace", "trim-trailing"),
    ]
    .into_iter()
    .map(|(id, label, builtin)| ActionConfig {
        id: id.to_owned(),
        label: label.to_owned(),
        command: None,
        builtin: Some(builtin.to_owned()),
    })
    .collect()
}

/// Builds the action registry from config entries, in order. Entries naming
/// an unknown built-in are skipped with a warning.
pub fn build_registry(actions: &[ActionConfig]) -> Arc<FeatureRegistry> {
    let mut registry = FeatureRegistry::new();
    for action in actions {
        let handler = match (&action.command, &action.builtin) {
            (Some(command), _) => Some(InlineChatHandler::diff_preview(CommandStrategy::new(command))),
            (None, Some(name)) => builtin_handler(name),
            (None, None) => None,
        };
        match handler {
            Some(handler) => registry.register(InlineChatAction::new(&action.id, &action.label), handler),
            None => tracing::warn!(action = %action.id, "inline chat action has no usable handler"),
        }
    }
    Arc::new(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use inlay_core::{TextRange, MAX_COLUMN};

    fn request(text: &str) -> StrategyRequest {
        StrategyRequest {
            action_id: "test".to_owned(),
            uri: None,
            selection: TextRange::from_coords(1, 1, 1, 2),
            cross_selection: TextRange::from_coords(1, 1, 1, MAX_COLUMN),
            cross_text: text.to_owned(),
        }
    }

    #[test]
    fn toggles_comments_preserving_indent() {
        let code = "fn a() {\n    b();\n\n}";
        let commented = toggle_comment(code, "//");
        assert_eq!(commented, "// fn a() {\n    // b();\n\n// }");
        assert_eq!(toggle_comment(&commented, "//"), code);
    }

    #[test]
    fn mixed_block_gets_commented() {
        assert_eq!(toggle_comment("# a\nb", "#"), "# # a\n# b");
    }

    #[test]
    fn trims_and_sorts() {
        assert_eq!(trim_trailing("a  \n b\t\n"), "a\n b\n");
        assert_eq!(sort_lines("c\na\nb\n"), "a\nb\nc\n");
    }

    #[test]
    fn registry_follows_config_order() {
        let mut actions = default_actions();
        actions.push(ActionConfig {
            id: "bogus".into(),
            label: "Bogus".into(),
            command: None,
            builtin: Some("no-such-builtin".into()),
        });
        let registry = build_registry(&actions);
        let ids: Vec<&str> = registry.actions().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["sort", "comment", "trim"]);
        assert!(registry.handler("sort").unwrap().diff_preview.is_some());
        assert!(registry.handler("comment").unwrap().execute.is_some());
    }

    #[tokio::test]
    async fn command_stdout_is_the_reply() {
        let strategy = CommandStrategy::new("tr a-z A-Z");
        let response = strategy.provide(request("let x;"), CancellationToken::new()).await;
        assert_eq!(response, StrategyResponse::reply("LET X;"));
    }

    #[tokio::test]
    async fn failing_command_is_an_error() {
        let strategy = CommandStrategy::new("echo nope >&2; exit 3");
        let response = strategy.provide(request(""), CancellationToken::new()).await;
        assert!(matches!(response, StrategyResponse::Error(ref m) if m.contains("nope")));
    }

    #[tokio::test]
    async fn cancellation_wins_over_a_slow_command() {
        let strategy = CommandStrategy::new("sleep 30");
        let token = CancellationToken::new();
        let pending = strategy.provide(request(""), token.clone());
        token.cancel();
        assert_eq!(pending.await, StrategyResponse::Cancel);
    }

    #[tokio::test]
    async fn sort_builtin_replies_with_a_fenced_block() {
        let handler = builtin_handler("sort-lines").unwrap();
        let strategy = handler.diff_preview.unwrap();
        let response = strategy.provide(request("b\na"), CancellationToken::new()).await;
        assert_eq!(response, StrategyResponse::reply("```\na\nb\n```"));
    }
}
