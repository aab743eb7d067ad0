use std::{collections::BTreeMap, io, sync::Arc};

use once_cell::sync::Lazy;
use strsim::levenshtein;
use thiserror::Error;
use tracing::info;

use crate::{
    cli::{
        io::{ScriptPrompter, TerminalPrompter},
        output, render,
    },
    config::{Config, ConfigError, ConfigManager},
    core::{LedgerStore, LoadReport, Prompter},
    domain::{EntryKind, LedgerState},
    errors::LedgerError,
    storage::{JsonFileStore, StorageError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Readline(#[from] rustyline::error::ReadlineError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("exit requested")]
    ExitRequested,
}

pub type CommandResult = Result<(), CommandError>;

pub(crate) enum LoopControl {
    Continue,
    Exit,
}

type Handler = fn(&mut ShellContext, &[&str]) -> CommandResult;

pub(crate) struct CommandSpec {
    pub name: &'static str,
    pub usage: &'static str,
    pub summary: &'static str,
    handler: Handler,
}

static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "add",
        usage: "add <income|expense> <description> <amount>",
        summary: "Record a new entry",
        handler: cmd_add,
    },
    CommandSpec {
        name: "remove",
        usage: "remove <income|expense> <position>",
        summary: "Remove the entry at a listed position",
        handler: cmd_remove,
    },
    CommandSpec {
        name: "list",
        usage: "list [income|expense]",
        summary: "Show entries, totals and balance",
        handler: cmd_list,
    },
    CommandSpec {
        name: "balance",
        usage: "balance",
        summary: "Show the running balance",
        handler: cmd_balance,
    },
    CommandSpec {
        name: "clear",
        usage: "clear",
        summary: "Erase every entry after confirmation",
        handler: cmd_clear,
    },
    CommandSpec {
        name: "backups",
        usage: "backups",
        summary: "List store backups, newest first",
        handler: cmd_backups,
    },
    CommandSpec {
        name: "restore",
        usage: "restore <backup>",
        summary: "Restore the store from a backup and reload",
        handler: cmd_restore,
    },
    CommandSpec {
        name: "config",
        usage: "config [set <key> <value>]",
        summary: "Show or change preferences",
        handler: cmd_config,
    },
    CommandSpec {
        name: "version",
        usage: "version",
        summary: "Show build information",
        handler: cmd_version,
    },
    CommandSpec {
        name: "help",
        usage: "help [command]",
        summary: "Show available commands",
        handler: cmd_help,
    },
    CommandSpec {
        name: "exit",
        usage: "exit",
        summary: "Leave the shell",
        handler: cmd_exit,
    },
];

/// Command names and aliases resolved to their specs.
static REGISTRY: Lazy<BTreeMap<&'static str, &'static CommandSpec>> = Lazy::new(|| {
    let mut map: BTreeMap<&'static str, &'static CommandSpec> =
        COMMANDS.iter().map(|command| (command.name, command)).collect();
    let aliases = [("quit", "exit"), ("ls", "list"), ("rm", "remove")];
    for (alias, target) in aliases {
        if let Some(spec) = map.get(target).copied() {
            map.insert(alias, spec);
        }
    }
    map
});

/// Shell state: the loaded ledger plus the configuration it was opened with.
pub struct ShellContext {
    pub(crate) mode: CliMode,
    pub(crate) running: bool,
    store: LedgerStore,
    file_store: Arc<JsonFileStore>,
    config: Config,
    config_manager: ConfigManager,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let config_manager = ConfigManager::new()?;
        let prompter: Box<dyn Prompter> = match mode {
            CliMode::Interactive => Box::new(TerminalPrompter::new()),
            CliMode::Script => Box::new(ScriptPrompter::from_env()),
        };
        Self::with_parts(mode, config_manager, prompter)
    }

    pub fn with_parts(
        mode: CliMode,
        config_manager: ConfigManager,
        prompter: Box<dyn Prompter>,
    ) -> Result<Self, CliError> {
        let config = config_manager.load()?;
        let store_path = config.resolve_store_file(config_manager.base_dir());
        let backups_dir = store_path
            .parent()
            .map(|parent| parent.join("backups"))
            .unwrap_or_else(|| config_manager.base_dir().join("backups"));
        let file_store = Arc::new(JsonFileStore::new(
            store_path,
            backups_dir,
            config.backup_retention,
        )?);

        let (store, report) = LedgerStore::open(Box::new(Arc::clone(&file_store)), prompter)?;
        let store = store.with_clear_scope(config.clear_scope);
        info!(path = %file_store.path().display(), "shell opened store");

        let context = Self {
            mode,
            running: true,
            store,
            file_store,
            config,
            config_manager,
        };
        context.report_load(&report);
        Ok(context)
    }

    pub fn prompt(&self) -> String {
        match self.store.state() {
            Ok(state) => format!(
                "ledger [{}]> ",
                render::format_amount(&self.config.currency_symbol, state.balance)
            ),
            Err(_) => "ledger> ".to_string(),
        }
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        REGISTRY.keys().copied().collect()
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        let Some(spec) = REGISTRY.get(command) else {
            self.suggest_command(raw);
            return Ok(LoopControl::Continue);
        };
        match (spec.handler)(self, args) {
            Ok(()) => Ok(LoopControl::Continue),
            Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
            Err(err) => Err(err),
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{input}`. Type `help` to see available commands."
        ));
        let best = REGISTRY
            .keys()
            .map(|name| (levenshtein(name, &input.to_ascii_lowercase()), *name))
            .min_by_key(|(distance, _)| *distance);
        if let Some((distance, name)) = best {
            if distance <= 3 {
                output::info(format!("Suggestion: `{name}`?"));
            }
        }
    }

    pub(crate) fn confirm_exit(&mut self) -> bool {
        if self.mode == CliMode::Script {
            return true;
        }
        TerminalPrompter::new().confirm("Exit shell?")
    }

    pub(crate) fn report_error(&self, err: CommandError) {
        match err {
            CommandError::ExitRequested => {}
            // Already shown to the user through the prompter.
            CommandError::Ledger(LedgerError::Validation(_)) => {}
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::info("Use `help <command>` for usage details.");
            }
            other => output::error(other),
        }
    }

    fn state(&self) -> Result<&LedgerState, CommandError> {
        Ok(self.store.state()?)
    }

    fn symbol(&self) -> &str {
        &self.config.currency_symbol
    }

    fn report_load(&self, report: &LoadReport) {
        for warning in &report.warnings {
            output::warning(warning);
        }
    }

    fn show_balance(&self) -> CommandResult {
        let state = self.state()?;
        let line = render::balance_line(state, self.symbol());
        output::signed_line(&line, !state.balance.is_negative());
        Ok(())
    }
}

fn parse_kind(raw: Option<&&str>) -> Result<EntryKind, CommandError> {
    let raw = raw.ok_or_else(|| {
        CommandError::InvalidArguments("Missing entry kind (income or expense).".into())
    })?;
    raw.parse()
        .map_err(|err| CommandError::InvalidArguments(format!("{err}")))
}

/// Accepts `12.50` and `12,50`. Anything unparsable becomes NaN so the store
/// rejects it with its own message.
fn parse_amount(raw: &str) -> f64 {
    raw.trim().replace(',', ".").parse().unwrap_or(f64::NAN)
}

fn cmd_add(ctx: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.len() < 3 {
        return Err(CommandError::InvalidArguments(
            "Usage: add <income|expense> <description> <amount>".into(),
        ));
    }
    let kind = parse_kind(args.first())?;
    let (amount_raw, description_parts) = args[1..]
        .split_last()
        .ok_or_else(|| CommandError::InvalidArguments("Missing amount.".into()))?;
    let description = description_parts.join(" ");
    let amount = parse_amount(amount_raw);

    ctx.store.add_entry(kind, &description, amount)?;
    let state = ctx.state()?;
    if let Some(entry) = state.entries(kind).last() {
        output::success(format!(
            "Added {kind} `{}` ({}).",
            entry.description(),
            render::format_amount(ctx.symbol(), entry.amount())
        ));
    }
    ctx.show_balance()
}

fn cmd_remove(ctx: &mut ShellContext, args: &[&str]) -> CommandResult {
    let kind = parse_kind(args.first())?;
    let position: usize = args
        .get(1)
        .and_then(|raw| raw.trim().parse().ok())
        .filter(|position| *position >= 1)
        .ok_or_else(|| {
            CommandError::InvalidArguments("Position must be a number starting at 1.".into())
        })?;

    let removed = ctx.store.remove_entry(kind, position - 1)?;
    output::success(format!(
        "Removed {kind} `{}` ({}).",
        removed.description(),
        render::format_amount(ctx.symbol(), removed.amount())
    ));
    ctx.show_balance()
}

fn cmd_list(ctx: &mut ShellContext, args: &[&str]) -> CommandResult {
    let kinds: Vec<EntryKind> = match args.first() {
        Some(_) => vec![parse_kind(args.first())?],
        None => vec![EntryKind::Expense, EntryKind::Income],
    };
    let state = ctx.state()?;
    for kind in &kinds {
        output::section(render::kind_title(*kind));
        for line in render::entry_lines(*kind, state.entries(*kind), ctx.symbol()) {
            output::line(line);
        }
    }
    if kinds.len() > 1 {
        output::line("");
        output::line(render::totals_line(state, ctx.symbol()));
    }
    ctx.show_balance()
}

fn cmd_balance(ctx: &mut ShellContext, _args: &[&str]) -> CommandResult {
    ctx.show_balance()
}

fn cmd_clear(ctx: &mut ShellContext, _args: &[&str]) -> CommandResult {
    if ctx.store.clear_all()? {
        output::success("Ledger cleared.");
    } else {
        output::info("Nothing was cleared.");
    }
    Ok(())
}

fn cmd_backups(ctx: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let backups = ctx.file_store.list_backups()?;
    if backups.is_empty() {
        output::info("No backups yet.");
        return Ok(());
    }
    output::section("Backups");
    for backup in backups {
        let created = backup
            .created_at
            .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown".into());
        output::line(format!(
            "{}  {}  {} bytes",
            backup.name, created, backup.size_bytes
        ));
    }
    Ok(())
}

fn cmd_restore(ctx: &mut ShellContext, args: &[&str]) -> CommandResult {
    let name = args
        .first()
        .ok_or_else(|| CommandError::InvalidArguments("Usage: restore <backup>".into()))?;
    ctx.file_store.restore_backup(name)?;
    let report = ctx.store.load()?;
    ctx.report_load(&report);
    output::success(format!("Restored `{name}`."));
    ctx.show_balance()
}

fn cmd_config(ctx: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] => {
            output::section("Configuration");
            for key in Config::KEYS {
                let value = ctx.config.get(key).unwrap_or_default();
                output::line(format!("{key} = {value}"));
            }
            Ok(())
        }
        ["set", key, value @ ..] if !value.is_empty() => {
            let value = value.join(" ");
            ctx.config.set(key, &value)?;
            ctx.config_manager.save(&ctx.config)?;
            ctx.store.set_clear_scope(ctx.config.clear_scope);
            output::success(format!("Set {key} = {value}."));
            if matches!(*key, "backup_retention" | "store_file") {
                output::info("This takes effect the next time the shell starts.");
            }
            Ok(())
        }
        _ => Err(CommandError::InvalidArguments(
            "Usage: config [set <key> <value>]".into(),
        )),
    }
}

fn cmd_version(_ctx: &mut ShellContext, _args: &[&str]) -> CommandResult {
    output::line(format!(
        "ledger_tracker {} ({} {}, built {} for {} [{}])",
        env!("CARGO_PKG_VERSION"),
        env!("LEDGER_TRACKER_BUILD_HASH"),
        env!("LEDGER_TRACKER_BUILD_STATUS"),
        env!("LEDGER_TRACKER_BUILD_TIMESTAMP"),
        env!("LEDGER_TRACKER_BUILD_TARGET"),
        env!("LEDGER_TRACKER_BUILD_PROFILE"),
    ));
    output::line(env!("LEDGER_TRACKER_BUILD_RUSTC"));
    Ok(())
}

fn cmd_help(_ctx: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first() {
        let spec = REGISTRY
            .get(name.to_ascii_lowercase().as_str())
            .ok_or_else(|| CommandError::InvalidArguments(format!("No help for `{name}`.")))?;
        output::line(format!("{}\n  {}", spec.usage, spec.summary));
        return Ok(());
    }
    output::section("Commands");
    for spec in COMMANDS {
        output::line(format!("{:<45} {}", spec.usage, spec.summary));
    }
    Ok(())
}

fn cmd_exit(_ctx: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ScriptedPrompter;
    use tempfile::TempDir;

    fn context(answer: bool) -> (ShellContext, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).expect("config");
        let context = ShellContext::with_parts(
            CliMode::Script,
            manager,
            Box::new(ScriptedPrompter::answering(answer)),
        )
        .expect("context");
        (context, temp)
    }

    fn run(ctx: &mut ShellContext, line: &str) -> Result<LoopControl, CommandError> {
        let tokens = shell_words::split(line).expect("tokens");
        let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();
        ctx.dispatch(&tokens[0], &tokens[0], &args)
    }

    #[test]
    fn add_joins_unquoted_description_words() {
        let (mut ctx, _guard) = context(true);
        run(&mut ctx, "add expense Weekly groceries 82,40").expect("add");
        let state = ctx.store().state().expect("state");
        assert_eq!(state.expenses[0].description(), "Weekly groceries");
        assert_eq!(state.balance.cents(), -8_240);
    }

    #[test]
    fn remove_uses_one_based_positions() {
        let (mut ctx, _guard) = context(true);
        run(&mut ctx, "add income Salary 100").expect("add");
        run(&mut ctx, "add income Bonus 50").expect("add");
        run(&mut ctx, "remove income 1").expect("remove");
        let state = ctx.store().state().expect("state");
        assert_eq!(state.incomes.len(), 1);
        assert_eq!(state.incomes[0].description(), "Bonus");
        assert!(matches!(
            run(&mut ctx, "remove income 0"),
            Err(CommandError::InvalidArguments(_))
        ));
    }

    #[test]
    fn unparsable_amount_is_a_validation_error() {
        let (mut ctx, _guard) = context(true);
        let err = run(&mut ctx, "add income Salary lots").err().expect("error");
        assert!(matches!(err, CommandError::Ledger(LedgerError::Validation(_))));
    }

    #[test]
    fn exit_and_alias_stop_the_loop() {
        let (mut ctx, _guard) = context(true);
        assert!(matches!(run(&mut ctx, "quit"), Ok(LoopControl::Exit)));
        assert!(matches!(run(&mut ctx, "exit"), Ok(LoopControl::Exit)));
    }

    #[test]
    fn config_set_updates_clear_scope() {
        let (mut ctx, _guard) = context(true);
        run(&mut ctx, "config set clear_scope ledger_keys").expect("config");
        assert_eq!(
            ctx.store().clear_scope(),
            crate::core::ClearScope::LedgerKeys
        );
    }
}
