use std::ffi::OsString;

use crate::{context::Context, scope::FlagId, ParseError, Result};

/// Remaining arguments, stored reversed so that the next one can be popped
/// and, if it turns out to belong to someone else, pushed back.
pub(crate) struct Parser {
    rargs: Vec<OsString>,
}

impl Parser {
    pub(crate) fn new(mut args: Vec<OsString>) -> Self {
        args.reverse();
        Self { rargs: args }
    }

    pub(crate) fn new_from_env() -> Self {
        let args = std::env::args_os().collect::<Vec<_>>();
        let mut res = Parser::new(args);
        let _progn = res.rargs.pop();
        res
    }

    fn next(&mut self) -> Option<Result<String, ParseError>> {
        self.rargs.pop().map(|it| it.into_string().map_err(ParseError::InvalidUtf8))
    }

    fn push_back(&mut self, arg: String) {
        self.rargs.push(arg.into())
    }

    fn rest(&mut self) -> Result<Vec<String>, ParseError> {
        let mut res = Vec::with_capacity(self.rargs.len());
        while let Some(arg) = self.next() {
            res.push(arg?);
        }
        Ok(res)
    }
}

#[derive(Debug, Clone, Copy)]
enum State {
    Ready,
    AwaitingValue(FlagId),
}

enum Step {
    Done,
    Await(FlagId),
    /// `--`: it and everything after it are positionals.
    Stop,
}

pub(crate) fn parse(ctx: &mut Context<'_>, p: &mut Parser) -> Result<()> {
    let mut state = State::Ready;
    // First non-boolean flag whose value slot was skipped by a dash argument.
    let mut abandoned = None;

    while let Some(arg) = p.next() {
        let arg = arg?;
        if let State::AwaitingValue(id) = state {
            state = State::Ready;
            let is_bool = ctx.flag(id).is_bool();
            if arg.starts_with('-') {
                if !is_bool {
                    abandoned.get_or_insert(id);
                }
                p.push_back(arg);
                continue;
            }
            match ctx.set_value(id, &arg) {
                Ok(()) => continue,
                // The boolean stays `true`, the argument is read again.
                Err(_) if is_bool => {
                    tracing::trace!(token = %arg, "not a boolean value, re-reading");
                    p.push_back(arg);
                    continue;
                }
                Err(err) => return Err(err.into()),
            }
        }

        match classify(ctx, &arg)? {
            Step::Done => (),
            Step::Await(id) => state = State::AwaitingValue(id),
            Step::Stop => {
                let rest = p.rest()?;
                tracing::trace!(count = rest.len(), "positionals after `--`");
                let current = ctx.current();
                let positionals = &mut ctx.scopes[current.0].positionals;
                positionals.push(arg);
                positionals.extend(rest);
                break;
            }
        }
    }

    if let State::AwaitingValue(id) = state {
        if !ctx.flag(id).is_bool() {
            return Err(ParseError::MissingValue(ctx.flag(id).name().to_string()).into());
        }
    }
    if let Some(id) = abandoned {
        if !ctx.is_written(id) {
            return Err(ParseError::MissingValue(ctx.flag(id).name().to_string()).into());
        }
    }

    if !ctx.help_requested() {
        let missing = ctx.missing_required();
        if !missing.is_empty() {
            return Err(ParseError::RequiredFlagsMissing(missing).into());
        }
    }
    tracing::debug!(path = ?ctx.command_path(), "parsed arguments");
    Ok(())
}

fn classify(ctx: &mut Context<'_>, arg: &str) -> Result<Step> {
    if arg == "--" {
        return Ok(Step::Stop);
    }

    if let Some(flag) = arg.strip_prefix("--") {
        let (name, value) = match flag.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (flag, None),
        };
        let id = match ctx.current_scope().aliases.get(name) {
            Some(&id) => id,
            None => return Err(ParseError::UnrecognizedFlag(arg.to_string()).into()),
        };
        ctx.check_duplicate(id)?;
        return match value {
            Some(value) => {
                ctx.set_value(id, value)?;
                Ok(Step::Done)
            }
            None => Ok(bare(ctx, id)),
        };
    }

    if arg.len() > 1 && arg.starts_with('-') {
        let chars = arg[1..].chars().collect::<Vec<_>>();
        if let Some((&last, init)) = chars.split_last() {
            for &c in init {
                let id = short(ctx, c)?;
                if !ctx.flag(id).is_bool() {
                    return Err(ParseError::CompoundTypeError { flag: c, token: arg.to_string() }
                        .into());
                }
                ctx.check_duplicate(id)?;
                ctx.set_true(id);
            }
            let id = short(ctx, last)?;
            ctx.check_duplicate(id)?;
            return Ok(bare(ctx, id));
        }
    }

    if let Some(sub) = ctx.current_scope().find_command(arg) {
        ctx.enter(sub)?;
        return Ok(Step::Done);
    }

    let current = ctx.current();
    ctx.scopes[current.0].positionals.push(arg.to_string());
    Ok(Step::Done)
}

fn short(ctx: &Context<'_>, c: char) -> Result<FlagId, ParseError> {
    let mut buf = [0; 4];
    ctx.current_scope()
        .aliases
        .get(&*c.encode_utf8(&mut buf))
        .copied()
        .ok_or(ParseError::UnrecognizedOption(c))
}

/// A flag given without `=value`: booleans flip to `true` right away, but
/// every flag gets a chance to take the next argument as its value.
fn bare(ctx: &mut Context<'_>, id: FlagId) -> Step {
    if ctx.flag(id).is_bool() {
        ctx.set_true(id);
    }
    Step::Await(id)
}
