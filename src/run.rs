use std::{
    ffi::OsString,
    io::{self, Write},
};

use crate::{term, App, Context, Error, Result};

impl App {
    /// Parses the process arguments and runs the selected action, reporting
    /// problems on stderr.
    pub fn run(&self) -> Result<()> {
        let args = std::env::args_os().skip(1).collect::<Vec<_>>();
        self.run_to(args, &mut io::stderr(), term::width())
    }

    /// Like [`App::run`], but exits the process with [`Error::exit_code`] on
    /// error.
    pub fn run_or_exit(&self) {
        if let Err(err) = self.run() {
            std::process::exit(err.exit_code())
        }
    }

    /// Parses `args` (without the program name) and dispatches.
    ///
    /// * parse errors print `Error: ...` plus the usage of the deepest scope
    ///   reached to `out` and are returned;
    /// * `help` / `--help` print the full help and succeed;
    /// * the selected action runs if there is one, otherwise the help of the
    ///   selected scope is printed.
    pub fn run_to<I>(&self, args: I, out: &mut dyn Write, width: usize) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<OsString>,
    {
        let res = match Context::new(self) {
            Ok(mut ctx) => {
                let res = dispatch(&mut ctx, args, out, width);
                ctx.release();
                res
            }
            Err(err) => Err(err.into()),
        };
        if let Err(err @ (Error::Config(_) | Error::Action(_))) = &res {
            let _ = writeln!(out, "Error: {err}");
        }
        res
    }
}

fn dispatch<I>(ctx: &mut Context<'_>, args: I, out: &mut dyn Write, width: usize) -> Result<()>
where
    I: IntoIterator,
    I::Item: Into<OsString>,
{
    if let Err(err) = ctx.parse(args) {
        if let Error::Parse(_) = err {
            let _ = writeln!(out, "Error: {err}");
            let _ = write!(out, "{}", ctx.usage(width));
        }
        return Err(err);
    }
    if ctx.help_requested() {
        let _ = write!(out, "{}", ctx.help(width));
        return Ok(());
    }
    match ctx.action() {
        Some(action) => {
            tracing::debug!(path = ?ctx.command_path(), "running action");
            action(ctx).map_err(Error::Action)
        }
        None => {
            let _ = write!(out, "{}", ctx.help(width));
            Ok(())
        }
    }
}
