//! Command line parsing against a tree of commands, each with its own scope of
//! flags.
//!
//! ```no_run
//! use treeflags::{App, Command, Context, Flag};
//!
//! fn build(ctx: &Context<'_>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let (jobs, _) = ctx.int("jobs");
//!     println!("building {:?} with {jobs} jobs", ctx.positionals());
//!     Ok(())
//! }
//!
//! let app = App::new("cargo-lite")
//!     .flag(Flag::bool("verbose", false).short('v').usage("Use verbose output."))
//!     .command(
//!         Command::new("build")
//!             .usage("Compile the current package.")
//!             .inherit_parent_flags()
//!             .flag(Flag::int_in("jobs", 1, 1..=64).short('j').metavar("N"))
//!             .action(build),
//!     );
//! app.run_or_exit();
//! ```
use std::{ffi::OsString, fmt, process};

mod app;
mod context;
mod env;
mod flag;
mod help;
mod rt;
mod run;
mod scope;
pub mod term;

pub use crate::{
    app::{Action, ActionError, App, Command},
    context::{Context, ScopeRef},
    env::{Environment, ProcessEnv},
    flag::{Flag, Kind, Value},
    help::HelpWriter,
};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("{0}")]
    Action(ActionError),
}

impl Error {
    /// Prints the error to stderr and exits with [`Error::exit_code`].
    pub fn exit(&self) -> ! {
        eprintln!("Error: {self}");
        process::exit(self.exit_code())
    }

    /// 1 for a broken declaration tree, 2 for anything else.
    pub fn exit_code(&self) -> i32 {
        if self.is_config() {
            1
        } else {
            2
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

/// A broken declaration tree. Reported before any argument of the affected
/// level is read.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("flag is missing a name")]
    EmptyFlagName,
    #[error("invalid flag name: `{0}`")]
    InvalidFlagName(String),
    #[error("invalid short alias for flag `{flag}`: `{short}`")]
    InvalidShort { flag: String, short: char },
    #[error("invalid range for flag `{0}`")]
    InvalidRange(String),
    #[error("invalid default for flag `{flag}`: {reason}")]
    InvalidDefault { flag: String, reason: String },
    #[error("alias `{alias}` declared more than once in `{scope}`")]
    DuplicateAlias { alias: String, scope: String },
    #[error("command is missing a name")]
    EmptyCommandName,
}

/// Bad command line input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("unrecognized flag: `{0}`")]
    UnrecognizedFlag(String),
    #[error("unrecognized option: `-{0}`")]
    UnrecognizedOption(char),
    #[error("flag provided more than once: `--{0}`")]
    DuplicateFlag(String),
    #[error("non-boolean flag `-{flag}` cannot be used in a compound expression `{token}`")]
    CompoundTypeError { flag: char, token: String },
    #[error("invalid value for `--{flag}`: `{value}` is not {expected}")]
    TypeMismatch { flag: String, value: String, expected: &'static str },
    #[error("invalid value for `--{flag}`: `{value}` {reason}")]
    ConstraintViolation { flag: String, value: String, reason: String },
    #[error("the following flag is missing a value: `--{0}`")]
    MissingValue(String),
    #[error("missing required flag(s): {}", Names(.0))]
    RequiredFlagsMissing(Vec<String>),
    #[error("invalid utf8 argument: {0:?}")]
    InvalidUtf8(OsString),
}

struct Names<'a>(&'a [String]);

impl fmt::Display for Names<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "`--{name}`")?;
        }
        Ok(())
    }
}
