//! Chat command parsing, registry, and built-in commands.
//!
//! Commands never touch server state directly. A handler inspects the
//! [`CommandContext`] and returns a [`CommandResult`] describing the
//! messages to send and, optionally, a [`CommandAction`] for the server
//! to carry out.

use std::collections::HashMap;

use tracing::debug;

/// Leading character that marks a chat line as a command.
pub const COMMAND_PREFIX: char = '/';

/// Split a chat line into a lowercased command name and its arguments.
///
/// Returns `None` when the line is ordinary chat.
pub fn parse_command(text: &str) -> Option<(String, Vec<String>)> {
    let rest = text.strip_prefix(COMMAND_PREFIX)?;
    let mut tokens = rest.split_whitespace();
    let name = tokens.next().unwrap_or_default().to_ascii_lowercase();
    Some((name, tokens.map(String::from).collect()))
}

/// A player visible to command handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct OnlinePlayer {
    pub name: String,
    pub position: [f32; 3],
}

/// Context passed to a command handler.
pub struct CommandContext {
    /// Name of the player executing the command.
    pub sender_name: String,
    /// Whether the sender is on the operator list.
    pub sender_is_op: bool,
    /// Arguments after the command name.
    pub args: Vec<String>,
    /// Snapshot of the players online when the command ran.
    pub online: Vec<OnlinePlayer>,
}

impl CommandContext {
    /// Look up an online player by name, ignoring case.
    pub fn find_player(&self, name: &str) -> Option<&OnlinePlayer> {
        self.online
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

/// A side effect the server applies after a command succeeds.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandAction {
    /// Move the sender to a block position.
    Teleport { position: [f32; 3] },
    /// Disconnect a player.
    Kick { target: String, reason: String },
    /// Grant or revoke operator status.
    SetOp { target: String, op: bool },
}

/// Result returned by a command handler.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command executed successfully.
    pub success: bool,
    /// Messages to send back to the command sender.
    pub messages: Vec<String>,
    /// Optional message to broadcast to all players.
    pub broadcast: Option<String>,
    /// Optional server-side effect.
    pub action: Option<CommandAction>,
}

impl CommandResult {
    /// Create a successful result with a single message.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            messages: vec![message.into()],
            broadcast: None,
            action: None,
        }
    }

    /// Create a failed result with a single message.
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            messages: vec![message.into()],
            broadcast: None,
            action: None,
        }
    }

    fn with_action(mut self, action: CommandAction) -> Self {
        self.action = Some(action);
        self
    }
}

/// Function pointer type for command handlers.
pub type CommandFn = fn(&CommandRegistry, &CommandContext) -> CommandResult;

/// A registered command.
pub struct CommandEntry {
    pub name: String,
    pub description: String,
    /// Only operators may run it.
    pub op_only: bool,
    pub handler: CommandFn,
}

/// Registry of available chat commands.
pub struct CommandRegistry {
    commands: HashMap<String, CommandEntry>,
}

impl CommandRegistry {
    /// Create a new registry with the built-in commands.
    pub fn new() -> Self {
        let mut registry = Self {
            commands: HashMap::new(),
        };
        registry.register("help", "List available commands", false, cmd_help);
        registry.register("list", "Show online players", false, cmd_list);
        registry.register("say", "Broadcast a message to all players", false, cmd_say);
        registry.register("tp", "Teleport to coordinates or a player", false, cmd_tp);
        registry.register("kick", "Disconnect a player", true, cmd_kick);
        registry.register("op", "Grant operator status", true, cmd_op);
        registry.register("deop", "Revoke operator status", true, cmd_deop);
        registry
    }

    /// Register a command, replacing any previous one with the same name.
    pub fn register(&mut self, name: &str, description: &str, op_only: bool, handler: CommandFn) {
        self.commands.insert(
            name.to_string(),
            CommandEntry {
                name: name.to_string(),
                description: description.to_string(),
                op_only,
                handler,
            },
        );
    }

    /// Execute a command by name.
    pub fn execute(&self, name: &str, ctx: &CommandContext) -> CommandResult {
        let Some(entry) = self.commands.get(name) else {
            return CommandResult::err(format!("Unknown command: {name}"));
        };
        if entry.op_only && !ctx.sender_is_op {
            debug!("{} tried /{name} without permission", ctx.sender_name);
            return CommandResult::err("You do not have permission to use this command.");
        }
        (entry.handler)(self, ctx)
    }

    /// Get a reference to all registered commands.
    pub fn get_commands(&self) -> &HashMap<String, CommandEntry> {
        &self.commands
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Built-in commands
// ---------------------------------------------------------------------------

fn cmd_help(registry: &CommandRegistry, ctx: &CommandContext) -> CommandResult {
    let mut entries: Vec<&CommandEntry> = registry
        .commands
        .values()
        .filter(|e| ctx.sender_is_op || !e.op_only)
        .collect();
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    let mut lines = vec!["Available commands:".to_string()];
    lines.extend(
        entries
            .into_iter()
            .map(|e| format!("/{} - {}", e.name, e.description)),
    );
    CommandResult {
        success: true,
        messages: lines,
        broadcast: None,
        action: None,
    }
}

fn cmd_list(_registry: &CommandRegistry, ctx: &CommandContext) -> CommandResult {
    let count = ctx.online.len();
    let names = if ctx.online.is_empty() {
        String::new()
    } else {
        let names: Vec<&str> = ctx.online.iter().map(|p| p.name.as_str()).collect();
        format!(": {}", names.join(", "))
    };
    CommandResult::ok(format!(
        "There {verb} {count} player{s} online{names}",
        verb = if count == 1 { "is" } else { "are" },
        s = if count == 1 { "" } else { "s" },
    ))
}

fn cmd_say(_registry: &CommandRegistry, ctx: &CommandContext) -> CommandResult {
    if ctx.args.is_empty() {
        return CommandResult::err("Usage: /say <message>");
    }
    CommandResult {
        success: true,
        messages: vec![],
        broadcast: Some(format!("[{}] {}", ctx.sender_name, ctx.args.join(" "))),
        action: None,
    }
}

fn cmd_tp(_registry: &CommandRegistry, ctx: &CommandContext) -> CommandResult {
    const USAGE: &str = "Usage: /tp <x> <y> <z> | /tp <player>";
    match ctx.args.as_slice() {
        [target] => match ctx.find_player(target) {
            Some(player) => CommandResult::ok(format!("Teleported to {}", player.name))
                .with_action(CommandAction::Teleport {
                    position: player.position,
                }),
            None => CommandResult::err(format!("Player not found: {target}")),
        },
        [x, y, z] => match (x.parse::<f32>(), y.parse::<f32>(), z.parse::<f32>()) {
            (Ok(x), Ok(y), Ok(z)) if x.is_finite() && y.is_finite() && z.is_finite() => {
                CommandResult::ok(format!("Teleported to {x} {y} {z}"))
                    .with_action(CommandAction::Teleport {
                        position: [x, y, z],
                    })
            }
            _ => CommandResult::err(USAGE),
        },
        _ => CommandResult::err(USAGE),
    }
}

fn cmd_kick(_registry: &CommandRegistry, ctx: &CommandContext) -> CommandResult {
    let Some(target) = ctx.args.first() else {
        return CommandResult::err("Usage: /kick <player> [reason]");
    };
    let Some(player) = ctx.find_player(target) else {
        return CommandResult::err(format!("Player not found: {target}"));
    };
    let reason = if ctx.args.len() > 1 {
        ctx.args[1..].join(" ")
    } else {
        "No reason specified".to_string()
    };
    CommandResult::ok(format!("Kicked {}", player.name)).with_action(CommandAction::Kick {
        target: player.name.clone(),
        reason,
    })
}

fn cmd_op(_registry: &CommandRegistry, ctx: &CommandContext) -> CommandResult {
    match ctx.args.as_slice() {
        [target] => {
            let target = resolve_name(ctx, target);
            CommandResult::ok(format!("Made {target} an operator"))
                .with_action(CommandAction::SetOp { target, op: true })
        }
        _ => CommandResult::err("Usage: /op <player>"),
    }
}

fn cmd_deop(_registry: &CommandRegistry, ctx: &CommandContext) -> CommandResult {
    match ctx.args.as_slice() {
        [target] => {
            let target = resolve_name(ctx, target);
            CommandResult::ok(format!("{target} is no longer an operator"))
                .with_action(CommandAction::SetOp { target, op: false })
        }
        _ => CommandResult::err("Usage: /deop <player>"),
    }
}

/// Spelling of an online player's name, or the argument as typed when the
/// player is offline.
fn resolve_name(ctx: &CommandContext, name: &str) -> String {
    ctx.find_player(name)
        .map_or_else(|| name.to_string(), |p| p.name.clone())
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn make_ctx(sender: &str, op: bool, args: Vec<&str>) -> CommandContext {
        CommandContext {
            sender_name: sender.to_string(),
            sender_is_op: op,
            args: args.into_iter().map(String::from).collect(),
            online: vec![
                OnlinePlayer {
                    name: "Alice".into(),
                    position: [10.0, 33.0, 12.5],
                },
                OnlinePlayer {
                    name: "Bob".into(),
                    position: [0.0, 40.0, 0.0],
                },
            ],
        }
    }

    #[test]
    fn parse_plain_chat() {
        assert_eq!(parse_command("hello /there"), None);
    }

    #[test]
    fn parse_splits_on_whitespace() {
        let (name, args) = parse_command("/TP  1 2\t3").unwrap();
        assert_eq!(name, "tp");
        assert_eq!(args, vec!["1", "2", "3"]);
    }

    #[test]
    fn parse_bare_prefix() {
        let (name, args) = parse_command("/").unwrap();
        assert!(name.is_empty());
        assert!(args.is_empty());
    }

    #[test]
    fn registry_has_builtins() {
        let reg = CommandRegistry::new();
        for name in ["help", "list", "say", "tp", "kick", "op", "deop"] {
            assert!(reg.get_commands().contains_key(name), "{name}");
        }
    }

    #[test]
    fn unknown_command() {
        let reg = CommandRegistry::new();
        let result = reg.execute("fly", &make_ctx("Alice", false, vec![]));
        assert!(!result.success);
        assert_eq!(result.messages[0], "Unknown command: fly");
    }

    #[test]
    fn help_hides_operator_commands() {
        let reg = CommandRegistry::new();
        let result = reg.execute("help", &make_ctx("Alice", false, vec![]));
        assert!(result.success);
        assert_eq!(result.messages[0], "Available commands:");
        assert!(result.messages.iter().any(|l| l.starts_with("/tp")));
        assert!(!result.messages.iter().any(|l| l.starts_with("/kick")));

        let result = reg.execute("help", &make_ctx("Alice", true, vec![]));
        assert!(result.messages.iter().any(|l| l.starts_with("/kick")));
    }

    #[test]
    fn list_players() {
        let reg = CommandRegistry::new();
        let result = reg.execute("list", &make_ctx("Alice", false, vec![]));
        assert_eq!(result.messages[0], "There are 2 players online: Alice, Bob");
    }

    #[test]
    fn list_single_player() {
        let reg = CommandRegistry::new();
        let mut ctx = make_ctx("Alice", false, vec![]);
        ctx.online.truncate(1);
        let result = reg.execute("list", &ctx);
        assert_eq!(result.messages[0], "There is 1 player online: Alice");
    }

    #[test]
    fn say_broadcasts() {
        let reg = CommandRegistry::new();
        let result = reg.execute("say", &make_ctx("Alice", false, vec!["hello", "world"]));
        assert!(result.success);
        assert!(result.messages.is_empty());
        assert_eq!(result.broadcast.as_deref(), Some("[Alice] hello world"));
    }

    #[test]
    fn say_empty_fails() {
        let reg = CommandRegistry::new();
        let result = reg.execute("say", &make_ctx("Alice", false, vec![]));
        assert!(!result.success);
        assert!(result.messages[0].contains("Usage"));
    }

    #[test]
    fn tp_to_coordinates() {
        let reg = CommandRegistry::new();
        let result = reg.execute("tp", &make_ctx("Alice", false, vec!["1", "35.5", "-2"]));
        assert!(result.success);
        assert_eq!(
            result.action,
            Some(CommandAction::Teleport {
                position: [1.0, 35.5, -2.0]
            })
        );
    }

    #[test]
    fn tp_to_player() {
        let reg = CommandRegistry::new();
        let result = reg.execute("tp", &make_ctx("Alice", false, vec!["bob"]));
        assert_eq!(
            result.action,
            Some(CommandAction::Teleport {
                position: [0.0, 40.0, 0.0]
            })
        );
    }

    #[test]
    fn tp_rejects_bad_arguments() {
        let reg = CommandRegistry::new();
        for args in [vec![], vec!["1", "2"], vec!["a", "b", "c"], vec!["Nobody"]] {
            let result = reg.execute("tp", &make_ctx("Alice", false, args));
            assert!(!result.success);
            assert!(result.action.is_none());
        }
    }

    #[test]
    fn kick_requires_operator() {
        let reg = CommandRegistry::new();
        let result = reg.execute("kick", &make_ctx("Alice", false, vec!["Bob"]));
        assert!(!result.success);
        assert!(result.action.is_none());
        assert!(result.messages[0].contains("permission"));
    }

    #[test]
    fn kick_with_reason() {
        let reg = CommandRegistry::new();
        let result = reg.execute("kick", &make_ctx("Alice", true, vec!["bob", "too", "loud"]));
        assert!(result.success);
        assert_eq!(
            result.action,
            Some(CommandAction::Kick {
                target: "Bob".into(),
                reason: "too loud".into()
            })
        );
    }

    #[test]
    fn kick_unknown_player() {
        let reg = CommandRegistry::new();
        let result = reg.execute("kick", &make_ctx("Alice", true, vec!["Carol"]));
        assert!(!result.success);
        assert!(result.action.is_none());
    }

    #[test]
    fn op_and_deop() {
        let reg = CommandRegistry::new();
        let result = reg.execute("op", &make_ctx("Alice", true, vec!["Carol"]));
        assert_eq!(
            result.action,
            Some(CommandAction::SetOp {
                target: "Carol".into(),
                op: true
            })
        );
        let result = reg.execute("deop", &make_ctx("Alice", true, vec!["Carol"]));
        assert_eq!(
            result.action,
            Some(CommandAction::SetOp {
                target: "Carol".into(),
                op: false
            })
        );
        let result = reg.execute("op", &make_ctx("Bob", false, vec!["Bob"]));
        assert!(!result.success);
    }

    #[test]
    fn op_uses_online_spelling() {
        let reg = CommandRegistry::new();
        let result = reg.execute("op", &make_ctx("Alice", true, vec!["bob"]));
        assert_eq!(result.messages[0], "Made Bob an operator");
        assert_eq!(
            result.action,
            Some(CommandAction::SetOp {
                target: "Bob".into(),
                op: true
            })
        );
        let result = reg.execute("deop", &make_ctx("Alice", true, vec!["BOB"]));
        assert_eq!(
            result.action,
            Some(CommandAction::SetOp {
                target: "Bob".into(),
                op: false
            })
        );
    }

    #[test]
    fn result_helpers() {
        let ok = CommandResult::ok("success");
        assert!(ok.success);
        assert_eq!(ok.messages[0], "success");

        let err = CommandResult::err("failed");
        assert!(!err.success);
        assert_eq!(err.messages[0], "failed");
    }
}
