use std::collections::{HashMap, HashSet};

use crate::{env::Environment, App, Command, ConfigError, Flag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct FlagId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScopeId(pub(crate) usize);

#[derive(Debug, Clone, Copy)]
pub(crate) enum Sub<'a> {
    Declared(&'a Command),
    Help,
}

/// One level of the command tree as seen during a parse.
#[derive(Debug)]
pub(crate) struct Scope<'a> {
    pub(crate) command: Option<&'a Command>,
    pub(crate) parent: Option<ScopeId>,
    /// Long names and short aliases, all pointing at slots in the flag store.
    pub(crate) aliases: HashMap<String, FlagId>,
    pub(crate) commands: Vec<(&'a str, Sub<'a>)>,
    pub(crate) display: Vec<FlagId>,
    pub(crate) pending: Vec<FlagId>,
    pub(crate) assigned: HashSet<FlagId>,
    pub(crate) positionals: Vec<String>,
    pub(crate) help: Option<FlagId>,
}

pub(crate) const HELP: &str = "help";

impl<'a> Scope<'a> {
    /// Builds the scope for `command` (or the root of `app`), registering
    /// its own flags in `store`.
    pub(crate) fn new(
        app: &'a App,
        parent: Option<(ScopeId, &Scope<'a>)>,
        command: Option<&'a Command>,
        store: &mut Vec<Flag>,
        env: &dyn Environment,
    ) -> Result<Scope<'a>, ConfigError> {
        let scope_name = command.map_or(app.name.as_str(), |it| it.name.as_str());
        let (own_flags, subcommands) = match command {
            None => (&app.flags, &app.commands),
            Some(cmd) => (&cmd.flags, &cmd.subcommands),
        };

        let mut scope = Scope {
            command,
            parent: parent.map(|(id, _)| id),
            aliases: HashMap::new(),
            commands: Vec::new(),
            display: Vec::new(),
            pending: Vec::new(),
            assigned: HashSet::new(),
            positionals: Vec::new(),
            help: None,
        };

        let inherited = match (command, parent) {
            (Some(cmd), Some((_, parent))) if cmd.inherit_parent_flags => Some(parent),
            _ => None,
        };
        if let Some(parent) = inherited {
            scope.aliases = parent.aliases.clone();
        }

        let mut own_aliases = HashSet::new();
        for flag in own_flags {
            flag.validate_declaration()?;
            let mut keys = vec![flag.name().to_string()];
            keys.extend(flag.short_alias().map(String::from));
            for key in &keys {
                if !own_aliases.insert(key.clone()) {
                    return Err(ConfigError::DuplicateAlias {
                        alias: key.clone(),
                        scope: scope_name.to_string(),
                    });
                }
            }
            let mut flag = flag.clone();
            flag.bind_env(env);
            let id = scope.register(store, flag, keys);
            scope.display.push(id);
        }

        if app.help_flag {
            let flag = Flag::bool(HELP, false).short('h').usage("Display this help message");
            let mut keys = vec![HELP.to_string()];
            // An explicit `-h` wins over the implicit one.
            if !own_aliases.contains("h") {
                keys.push("h".to_string());
            }
            if !own_aliases.contains(HELP) {
                let id = scope.register(store, flag, keys);
                scope.display.push(id);
                scope.help = Some(id);
            }
        }

        if let Some(parent) = inherited {
            for &id in &parent.display {
                if scope.aliases.values().any(|&it| it == id) && !scope.display.contains(&id) {
                    scope.display.push(id);
                }
            }
        }
        scope.pending =
            scope.display.iter().copied().filter(|&id| store[id.0].is_required()).collect();

        for cmd in subcommands {
            if cmd.name.is_empty() {
                return Err(ConfigError::EmptyCommandName);
            }
            scope.commands.push((cmd.name.as_str(), Sub::Declared(cmd)));
        }
        let offers_help = command.is_none() || !subcommands.is_empty();
        if app.help_command && offers_help && !subcommands.iter().any(|it| it.name == HELP) {
            scope.commands.push((HELP, Sub::Help));
        }

        tracing::debug!(
            scope = scope_name,
            flags = scope.display.len(),
            commands = scope.commands.len(),
            "built scope"
        );
        Ok(scope)
    }

    fn register(&mut self, store: &mut Vec<Flag>, flag: Flag, keys: Vec<String>) -> FlagId {
        let id = FlagId(store.len());
        store.push(flag);
        for key in keys {
            self.aliases.insert(key, id);
        }
        id
    }

    pub(crate) fn name(&self, app: &'a App) -> &'a str {
        self.command.map_or(app.name.as_str(), |it| it.name.as_str())
    }

    pub(crate) fn find_command(&self, token: &str) -> Option<Sub<'a>> {
        self.commands.iter().find(|(name, _)| *name == token).map(|&(_, sub)| sub)
    }

    pub(crate) fn has_action(&self, app: &App) -> bool {
        match self.command {
            None => app.action.is_some(),
            Some(cmd) => cmd.action.is_some(),
        }
    }

    pub(crate) fn release(&mut self) {
        self.aliases.clear();
        self.commands.clear();
        self.display.clear();
        self.pending.clear();
        self.assigned.clear();
        self.positionals.clear();
        self.help = None;
    }
}
