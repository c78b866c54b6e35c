use std::{cell::Cell, collections::HashMap};

use expect_test::expect;
use treeflags::{App, Command, ConfigError, Context, Environment, Error, Flag};

use crate::{args, check, noop, tool};

#[test]
fn non_inheriting_command_shadows_nothing() {
    let app = tool();
    let mut ctx = Context::new(&app).unwrap();
    ctx.parse(args("-c 5 run")).unwrap();

    assert_eq!(ctx.int("count"), (0, false));
    assert_eq!(ctx.float("ratio"), (0.5, false));
    let parent = ctx.parent().unwrap();
    assert_eq!(parent.name(), "tool");
    assert_eq!(parent.int("count"), (5, true));
}

#[test]
fn inherited_flags_report_where_they_were_set() {
    let app = tool();
    let mut ctx = Context::new(&app).unwrap();
    ctx.parse(args("-v build -j 4 -o out")).unwrap();

    assert_eq!(ctx.bool("verbose"), (true, false));
    assert_eq!(ctx.string("output"), ("out".to_string(), true));
    assert_eq!(ctx.int("jobs"), (4, true));

    let root = ctx.parent().unwrap();
    assert_eq!(root.bool("verbose"), (true, true));
    assert_eq!(root.string("output"), ("out".to_string(), false));
    assert_eq!(root.int("jobs"), (0, false));
}

#[test]
fn inherited_flag_is_one_slot() {
    check(&tool(), "-v build -v", expect!["flag provided more than once: `--verbose`"]);
    check(&tool(), "build -v --verbose", expect!["flag provided more than once: `--verbose`"]);
}

#[test]
fn own_flag_shadows_inherited_one() {
    let app = App::new("app")
        .action(noop)
        .flag(Flag::bool("verbose", false).short('v'))
        .command(
            Command::new("sub")
                .inherit_parent_flags()
                .action(noop)
                .flag(Flag::int("verbose", 0).usage("Verbosity level.")),
        );
    let mut ctx = Context::new(&app).unwrap();
    ctx.parse(args("-v sub --verbose 3")).unwrap();

    assert_eq!(ctx.int("verbose"), (3, true));
    assert_eq!(ctx.bool("verbose"), (false, false));
    assert_eq!(ctx.parent().unwrap().bool("verbose"), (true, true));
}

#[test]
fn unknown_names_and_wrong_types_read_as_zero() {
    let app = tool();
    let mut ctx = Context::new(&app).unwrap();
    ctx.parse(args("--count 7 -o x")).unwrap();

    assert_eq!(ctx.int("missing"), (0, false));
    assert_eq!(ctx.string("count"), (String::new(), false));
    assert_eq!(ctx.bool("output"), (false, false));
    assert_eq!(ctx.float("count"), (0.0, false));
    assert_eq!(ctx.int("count"), (7, true));
}

#[test]
fn failed_parse_keeps_earlier_assignments() {
    let app = tool();
    let mut ctx = Context::new(&app).unwrap();
    let err = ctx.parse(args("-v build --nope")).unwrap_err();

    assert!(matches!(err, Error::Parse(_)));
    assert_eq!(ctx.command_path(), ["build"]);
    assert_eq!(ctx.bool("verbose"), (true, false));
    assert_eq!(ctx.parent().unwrap().bool("verbose"), (true, true));
}

#[test]
fn positionals_belong_to_their_scope() {
    let app = tool();
    let mut ctx = Context::new(&app).unwrap();
    ctx.parse(args("a build b c")).unwrap();

    assert_eq!(ctx.positionals(), ["b", "c"]);
    assert_eq!(ctx.parent().unwrap().positionals(), ["a"]);
}

#[test]
fn command_chain() {
    let app = tool();
    let mut ctx = Context::new(&app).unwrap();
    assert_eq!(ctx.depth(), 0);
    assert!(ctx.action().is_some());

    ctx.parse(args("remote add -u u --name n")).unwrap();
    assert_eq!(ctx.depth(), 2);
    assert_eq!(ctx.command_path(), ["remote", "add"]);
    assert_eq!(ctx.scope_name(), "add");
    assert_eq!(ctx.command().map(|it| it.name()), Some("add"));
    assert!(ctx.action().is_some());

    let remote = ctx.parent().unwrap();
    assert_eq!(remote.name(), "remote");
    assert_eq!(remote.command().map(Command::name), Some("remote"));
    assert!(remote.parent().unwrap().parent().is_none());
}

#[test]
fn help_command_does_not_open_a_scope() {
    let app = tool();
    let mut ctx = Context::new(&app).unwrap();
    ctx.parse(args("help build")).unwrap();

    assert!(ctx.help_requested());
    assert_eq!(ctx.command_path(), ["build"]);
}

#[test]
fn help_flag_is_per_scope() {
    let app = tool();
    let mut ctx = Context::new(&app).unwrap();
    ctx.parse(args("-h build -h")).unwrap();

    assert!(ctx.help_requested());
    assert_eq!(ctx.bool("help"), (true, true));
    assert_eq!(ctx.parent().unwrap().bool("help"), (true, true));
}

#[test]
fn disabled_help_is_just_unknown() {
    let app = tool().disable_help_flag().disable_help_command();
    check(&app, "--help", expect!["unrecognized flag: `--help`"]);
    check(
        &app,
        "help",
        expect![[r#"
            tool: verbose=false quiet=false output= count=0 ["help"]
        "#]],
    );
}

#[test]
fn explicit_short_h_wins() {
    let app = App::new("app").action(noop).flag(Flag::string("host", "").short('h'));
    check(
        &app,
        "-h example.org",
        expect![[r#"
            app: host=example.org* help=false
        "#]],
    );
    check(
        &app,
        "--help",
        expect![[r#"
            app: host= help=true*
        "#]],
    );
}

#[derive(Default)]
struct CountingEnv {
    reads: Cell<usize>,
}

impl Environment for CountingEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.reads.set(self.reads.get() + 1);
        (key == "TOOL_OUTPUT").then(|| "from-env".to_string())
    }
}

#[test]
fn environment_is_read_once_per_flag() {
    let app = App::new("app")
        .action(noop)
        .flag(Flag::string("output", "-").env("TOOL_OUTPUT"))
        .command(Command::new("a").inherit_parent_flags().action(noop))
        .command(Command::new("b").inherit_parent_flags().action(noop));
    let env = CountingEnv::default();
    let mut ctx = Context::with_env(&app, &env).unwrap();
    ctx.parse(args("a")).unwrap();

    assert_eq!(env.reads.get(), 1);
    assert_eq!(ctx.string("output"), ("from-env".to_string(), false));
}

#[test]
fn environment_defaults() {
    let app = App::new("app")
        .action(noop)
        .flag(Flag::bool("color", true).env("NO_COLOR"))
        .flag(Flag::bool("debug", false).env("APP_DEBUG"))
        .flag(Flag::int("jobs", 2).env("APP_JOBS"))
        .flag(Flag::choice("mode", "fast", ["fast", "slow"]).env("APP_MODE"))
        .flag(Flag::float("scale", 1.0).env("APP_SCALE"));
    let env: HashMap<String, String> = [
        ("NO_COLOR", "1"),
        ("APP_DEBUG", ""),
        ("APP_JOBS", "many"),
        ("APP_MODE", "medium"),
        ("APP_SCALE", "2.5"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    let mut ctx = Context::with_env(&app, env).unwrap();
    ctx.parse(args("--jobs 3")).unwrap();

    assert_eq!(ctx.bool("color"), (false, false));
    assert_eq!(ctx.bool("debug"), (false, false));
    assert_eq!(ctx.int("jobs"), (3, true));
    assert_eq!(ctx.string("mode"), ("fast".to_string(), false));
    assert_eq!(ctx.float("scale"), (2.5, false));
}

#[test]
fn config_errors() {
    let app = App::new("app").flag(Flag::string("", ""));
    assert_eq!(Context::new(&app).unwrap_err(), ConfigError::EmptyFlagName);

    let app = App::new("app")
        .flag(Flag::bool("all", false).short('a'))
        .flag(Flag::bool("any", false).short('a'));
    let err = Context::new(&app).unwrap_err();
    expect!["alias `a` declared more than once in `app`"].assert_eq(&err.to_string());

    let app = App::new("app").flag(Flag::int_in("level", 0, 5..=1));
    assert_eq!(Context::new(&app).unwrap_err(), ConfigError::InvalidRange("level".to_string()));

    let app = App::new("app").command(Command::new(""));
    assert_eq!(Context::new(&app).unwrap_err(), ConfigError::EmptyCommandName);
}

#[test]
fn nested_config_error_surfaces_when_descending() {
    let app = App::new("app")
        .action(noop)
        .command(Command::new("sub").flag(Flag::int_in("n", 0, 1..=3)));
    let mut ctx = Context::new(&app).unwrap();
    ctx.parse(args("")).unwrap();

    let mut ctx = Context::new(&app).unwrap();
    let err = ctx.parse(args("sub")).unwrap_err();
    assert!(err.is_config());
    expect!["invalid default for flag `n`: 0 outside 1-3"].assert_eq(&err.to_string());
}

#[test]
fn parsing_again_starts_over() {
    let app = tool();
    let mut ctx = Context::new(&app).unwrap();
    ctx.parse(args("-v build -j 4 x")).unwrap();
    ctx.parse(args("-v")).unwrap();

    assert_eq!(ctx.depth(), 0);
    assert_eq!(ctx.bool("verbose"), (true, true));
    assert!(ctx.positionals().is_empty());

    ctx.parse(args("")).unwrap();
    assert_eq!(ctx.bool("verbose"), (false, false));

    ctx.parse(args("remote add")).unwrap_err();
    ctx.parse(args("help")).unwrap();
    assert!(ctx.help_requested());
    ctx.parse(args("run")).unwrap();
    assert!(!ctx.help_requested());
    assert_eq!(ctx.command_path(), ["run"]);
}

#[test]
fn parsing_after_release() {
    let app = tool();
    let mut ctx = Context::new(&app).unwrap();
    ctx.parse(args("-c 2")).unwrap();
    ctx.release();

    ctx.parse(args("-c 3")).unwrap();
    assert!(!ctx.is_released());
    assert_eq!(ctx.int("count"), (3, true));
}

#[test]
fn release_is_idempotent() {
    let app = tool();
    let mut ctx = Context::new(&app).unwrap();
    ctx.parse(args("-v build")).unwrap();
    assert!(!ctx.is_released());

    ctx.release();
    assert!(ctx.is_released());
    ctx.release();
    assert!(ctx.is_released());
    assert_eq!(ctx.bool("verbose"), (false, false));
}
