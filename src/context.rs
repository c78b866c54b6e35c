use std::{ffi::OsString, fmt};

use crate::{
    env::{Environment, ProcessEnv},
    rt,
    scope::{FlagId, Scope, ScopeId, Sub},
    Action, App, ConfigError, Flag, Kind, ParseError, Result,
};

/// The result of parsing one command line against an [`App`].
///
/// A context owns the values of every flag registered during the pass and
/// the chain of scopes from the root to the selected command. Accessors on
/// the context read from the innermost scope; use [`Context::parent`] to
/// look at enclosing ones.
pub struct Context<'a> {
    pub(crate) app: &'a App,
    env: Box<dyn Environment + 'a>,
    pub(crate) flags: Vec<Flag>,
    pub(crate) scopes: Vec<Scope<'a>>,
    pub(crate) help_command: bool,
    /// No pass has touched the root scope yet.
    fresh: bool,
    released: bool,
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("app", &self.app.name)
            .field("flags", &self.flags)
            .field("scopes", &self.scopes)
            .field("help_command", &self.help_command)
            .finish()
    }
}

impl<'a> Context<'a> {
    /// Builds the root scope, reading environment defaults from the process
    /// environment.
    pub fn new(app: &'a App) -> Result<Context<'a>, ConfigError> {
        Context::with_env(app, ProcessEnv)
    }

    pub fn with_env(app: &'a App, env: impl Environment + 'a) -> Result<Context<'a>, ConfigError> {
        let env: Box<dyn Environment + 'a> = Box::new(env);
        let mut flags = Vec::new();
        let root = Scope::new(app, None, None, &mut flags, &*env)?;
        Ok(Context {
            app,
            env,
            flags,
            scopes: vec![root],
            help_command: false,
            fresh: true,
            released: false,
        })
    }

    /// Parses `args` (without the program name), descending into commands
    /// as they are named.
    ///
    /// On failure the context keeps everything parsed before the offending
    /// argument, so it can still render usage for the deepest scope reached.
    /// Parsing again starts over from the root with declared defaults.
    pub fn parse<I>(&mut self, args: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<OsString>,
    {
        self.begin_pass()?;
        let mut p = rt::Parser::new(args.into_iter().map(Into::into).collect());
        rt::parse(self, &mut p)
    }

    /// Parses the arguments of the current process.
    pub fn parse_env(&mut self) -> Result<()> {
        self.begin_pass()?;
        let mut p = rt::Parser::new_from_env();
        rt::parse(self, &mut p)
    }

    /// Rebuilds the root scope unless it is still untouched since
    /// construction.
    fn begin_pass(&mut self) -> Result<(), ConfigError> {
        if std::mem::replace(&mut self.fresh, false) {
            return Ok(());
        }
        let mut flags = Vec::new();
        let root = Scope::new(self.app, None, None, &mut flags, &*self.env)?;
        self.flags = flags;
        self.scopes = vec![root];
        self.help_command = false;
        self.released = false;
        tracing::debug!(app = %self.app.name, "starting a new pass");
        Ok(())
    }

    pub fn app(&self) -> &'a App {
        self.app
    }

    /// The innermost scope.
    pub fn scope(&self) -> ScopeRef<'_, 'a> {
        ScopeRef { ctx: self, id: self.current() }
    }

    pub fn parent(&self) -> Option<ScopeRef<'_, 'a>> {
        self.scope().parent()
    }

    pub fn scope_name(&self) -> &'a str {
        self.scope().name()
    }

    /// Number of commands selected below the root.
    pub fn depth(&self) -> usize {
        self.scopes.len().saturating_sub(1)
    }

    /// Names of the selected commands, outermost first.
    pub fn command_path(&self) -> Vec<&'a str> {
        self.scopes.iter().filter_map(|it| it.command).map(|it| it.name.as_str()).collect()
    }

    pub fn command(&self) -> Option<&'a crate::Command> {
        self.scopes.last().and_then(|it| it.command)
    }

    /// Action of the innermost scope.
    pub fn action(&self) -> Option<Action> {
        match self.command() {
            Some(cmd) => cmd.action,
            None => self.app.action,
        }
    }

    /// Whether `help` was given as a command or `-h/--help` is set anywhere
    /// along the chain.
    pub fn help_requested(&self) -> bool {
        self.help_command
            || self.scopes.iter().any(|scope| {
                scope.help.map_or(false, |id| {
                    scope.assigned.contains(&id)
                        && matches!(self.flags[id.0].kind(), Kind::Bool { value: true })
                })
            })
    }

    pub fn positionals(&self) -> &[String] {
        self.scope().positionals()
    }

    pub fn string(&self, name: &str) -> (String, bool) {
        self.scope().string(name)
    }

    pub fn int(&self, name: &str) -> (i64, bool) {
        self.scope().int(name)
    }

    pub fn float(&self, name: &str) -> (f64, bool) {
        self.scope().float(name)
    }

    pub fn bool(&self, name: &str) -> (bool, bool) {
        self.scope().bool(name)
    }

    /// Drops the lookup tables of every scope. Calling it again is a no-op.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        for scope in self.scopes.iter_mut().rev() {
            scope.release();
        }
        self.flags.clear();
        self.released = true;
        tracing::debug!(app = %self.app.name, "released context");
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub(crate) fn current(&self) -> ScopeId {
        ScopeId(self.scopes.len() - 1)
    }

    pub(crate) fn current_scope(&self) -> &Scope<'a> {
        &self.scopes[self.current().0]
    }

    pub(crate) fn flag(&self, id: FlagId) -> &Flag {
        &self.flags[id.0]
    }

    pub(crate) fn descend(&mut self, command: &'a crate::Command) -> Result<(), ConfigError> {
        let parent_id = self.current();
        let parent = &self.scopes[parent_id.0];
        let env = &*self.env;
        let mut scope =
            Scope::new(self.app, Some((parent_id, parent)), Some(command), &mut self.flags, env)?;
        let scopes = &self.scopes;
        scope.pending.retain(|id| !scopes.iter().any(|it| it.assigned.contains(id)));
        tracing::debug!(command = %command.name, depth = self.scopes.len(), "entering command");
        self.scopes.push(scope);
        Ok(())
    }

    pub(crate) fn enter(&mut self, sub: Sub<'a>) -> Result<(), ConfigError> {
        match sub {
            Sub::Declared(cmd) => self.descend(cmd),
            Sub::Help => {
                tracing::debug!("help command requested");
                self.help_command = true;
                Ok(())
            }
        }
    }

    /// Whether `id` was assigned by any scope in the chain during this pass.
    pub(crate) fn is_written(&self, id: FlagId) -> bool {
        self.scopes.iter().any(|it| it.assigned.contains(&id))
    }

    pub(crate) fn check_duplicate(&self, id: FlagId) -> Result<(), ParseError> {
        if self.is_written(id) {
            return Err(ParseError::DuplicateFlag(self.flag(id).name().to_string()));
        }
        Ok(())
    }

    /// Records an explicit assignment in the current scope and drops `id`
    /// from every pending-required list.
    pub(crate) fn mark_assigned(&mut self, id: FlagId) {
        let current = self.current();
        self.scopes[current.0].assigned.insert(id);
        for scope in &mut self.scopes {
            scope.pending.retain(|&it| it != id);
        }
    }

    pub(crate) fn set_value(&mut self, id: FlagId, token: &str) -> Result<(), ParseError> {
        self.flags[id.0].set(token)?;
        self.mark_assigned(id);
        Ok(())
    }

    pub(crate) fn set_true(&mut self, id: FlagId) {
        self.flags[id.0].set_true();
        self.mark_assigned(id);
    }

    pub(crate) fn missing_required(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for scope in &self.scopes {
            for &id in &scope.pending {
                if !seen.contains(&id) {
                    seen.push(id);
                }
            }
        }
        seen.into_iter().map(|id| self.flag(id).name().to_string()).collect()
    }
}

/// A view of one scope in the chain of a [`Context`].
#[derive(Clone, Copy)]
pub struct ScopeRef<'c, 'a> {
    pub(crate) ctx: &'c Context<'a>,
    pub(crate) id: ScopeId,
}

impl fmt::Debug for ScopeRef<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeRef").field("name", &self.name()).finish()
    }
}

impl<'c, 'a> ScopeRef<'c, 'a> {
    pub(crate) fn data(&self) -> &'c Scope<'a> {
        &self.ctx.scopes[self.id.0]
    }

    pub fn parent(&self) -> Option<ScopeRef<'c, 'a>> {
        self.data().parent.map(|id| ScopeRef { ctx: self.ctx, id })
    }

    /// The command name, or the program name at the root.
    pub fn name(&self) -> &'a str {
        self.data().name(self.ctx.app)
    }

    pub fn command(&self) -> Option<&'a crate::Command> {
        self.data().command
    }

    pub fn positionals(&self) -> &'c [String] {
        &self.data().positionals
    }

    /// Flags visible in this scope, in display order.
    pub fn flags(&self) -> Vec<&'c Flag> {
        self.data().display.iter().map(|&id| self.ctx.flag(id)).collect()
    }

    pub(crate) fn command_names(&self) -> impl Iterator<Item = &'a str> + 'c {
        self.data().commands.iter().map(|&(name, _)| name)
    }

    pub(crate) fn has_action(&self) -> bool {
        self.data().has_action(self.ctx.app)
    }

    /// Walks outwards to the first scope that knows `name`. That scope is
    /// authoritative even if the flag was not set there. The walk stops at a
    /// command that does not inherit its parent's flags.
    fn lookup(&self, name: &str) -> Option<(&'c Flag, bool)> {
        let mut cursor = Some(self.id);
        while let Some(id) = cursor {
            let scope = &self.ctx.scopes[id.0];
            if let Some(&flag) = scope.aliases.get(name) {
                return Some((self.ctx.flag(flag), scope.assigned.contains(&flag)));
            }
            cursor = match scope.command {
                Some(cmd) if !cmd.inherit_parent_flags => None,
                _ => scope.parent,
            };
        }
        None
    }

    pub fn string(&self, name: &str) -> (String, bool) {
        match self.lookup(name) {
            Some((flag, set)) => match flag.kind() {
                Kind::String { value, .. } => (value.clone(), set),
                _ => (String::new(), false),
            },
            None => (String::new(), false),
        }
    }

    pub fn int(&self, name: &str) -> (i64, bool) {
        match self.lookup(name).map(|(flag, set)| (flag.kind(), set)) {
            Some((Kind::Int { value, .. }, set)) => (*value, set),
            _ => (0, false),
        }
    }

    pub fn float(&self, name: &str) -> (f64, bool) {
        match self.lookup(name).map(|(flag, set)| (flag.kind(), set)) {
            Some((Kind::Float { value, .. }, set)) => (*value, set),
            _ => (0.0, false),
        }
    }

    pub fn bool(&self, name: &str) -> (bool, bool) {
        match self.lookup(name).map(|(flag, set)| (flag.kind(), set)) {
            Some((Kind::Bool { value }, set)) => (*value, set),
            _ => (false, false),
        }
    }
}
