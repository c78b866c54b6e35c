use crate::{Context, Flag};

pub type ActionError = Box<dyn std::error::Error + Send + Sync>;

/// Entry point of a command, called by the run driver once parsing succeeded.
pub type Action = fn(&Context<'_>) -> Result<(), ActionError>;

/// The root of a declaration tree.
#[derive(Debug, Clone)]
pub struct App {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) action: Option<Action>,
    pub(crate) flags: Vec<Flag>,
    pub(crate) commands: Vec<Command>,
    pub(crate) help_flag: bool,
    pub(crate) help_command: bool,
}

impl App {
    /// `name` is the program name shown in usage text.
    pub fn new(name: impl Into<String>) -> App {
        App {
            name: name.into(),
            description: String::new(),
            action: None,
            flags: Vec::new(),
            commands: Vec::new(),
            help_flag: true,
            help_command: true,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> App {
        self.description = description.into();
        self
    }

    /// Runs when no command is selected. Without an action a command is
    /// mandatory.
    pub fn action(mut self, action: Action) -> App {
        self.action = Some(action);
        self
    }

    pub fn flag(mut self, flag: Flag) -> App {
        self.flags.push(flag);
        self
    }

    pub fn command(mut self, command: Command) -> App {
        self.commands.push(command);
        self
    }

    /// Removes the implicit `-h/--help` flag from every scope.
    pub fn disable_help_flag(mut self) -> App {
        self.help_flag = false;
        self
    }

    /// Removes the implicit `help` command.
    pub fn disable_help_command(mut self) -> App {
        self.help_command = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flags(&self) -> &[Flag] {
        &self.flags
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }
}

/// A git-style command with its own scope of flags and subcommands.
#[derive(Debug, Clone)]
pub struct Command {
    pub(crate) name: String,
    pub(crate) usage: String,
    pub(crate) description: String,
    pub(crate) action: Option<Action>,
    pub(crate) flags: Vec<Flag>,
    pub(crate) subcommands: Vec<Command>,
    pub(crate) inherit_parent_flags: bool,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Command {
        Command {
            name: name.into(),
            usage: String::new(),
            description: String::new(),
            action: None,
            flags: Vec::new(),
            subcommands: Vec::new(),
            inherit_parent_flags: false,
        }
    }

    /// One-line summary shown in the parent's command list.
    pub fn usage(mut self, usage: impl Into<String>) -> Command {
        self.usage = usage.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Command {
        self.description = description.into();
        self
    }

    pub fn action(mut self, action: Action) -> Command {
        self.action = Some(action);
        self
    }

    pub fn flag(mut self, flag: Flag) -> Command {
        self.flags.push(flag);
        self
    }

    pub fn subcommand(mut self, command: Command) -> Command {
        self.subcommands.push(command);
        self
    }

    /// Makes the flags of the enclosing scope visible inside this command.
    pub fn inherit_parent_flags(mut self) -> Command {
        self.inherit_parent_flags = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flags(&self) -> &[Flag] {
        &self.flags
    }

    pub fn subcommands(&self) -> &[Command] {
        &self.subcommands
    }
}
