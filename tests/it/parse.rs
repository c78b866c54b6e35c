use expect_test::expect;

use crate::{check, parse_dump, tool};

#[test]
fn no_arguments() {
    check(
        &tool(),
        "",
        expect![[r#"
            tool: verbose=false quiet=false output= count=0 help=false
        "#]],
    );
}

#[test]
fn positionals() {
    check(
        &tool(),
        "a b c",
        expect![[r#"
            tool: verbose=false quiet=false output= count=0 help=false ["a", "b", "c"]
        "#]],
    );
    check(
        &tool(),
        "- --count 2",
        expect![[r#"
            tool: verbose=false quiet=false output= count=2* help=false ["-"]
        "#]],
    );
}

#[test]
fn double_dash_ends_flags() {
    check(
        &tool(),
        "-v -- -q --count x run",
        expect![[r#"
            tool: verbose=true* quiet=false output= count=0 help=false ["--", "-q", "--count", "x", "run"]
        "#]],
    );
    check(
        &tool(),
        "a -- -v b",
        expect![[r#"
            tool: verbose=false quiet=false output= count=0 help=false ["a", "--", "-v", "b"]
        "#]],
    );
    check(
        &tool(),
        "build -- -j",
        expect![[r#"
            build: profile=dev jobs=1 help=false verbose=false quiet=false output= count=0 ["--", "-j"]
            tool: verbose=false quiet=false output= count=0 help=false
        "#]],
    );
}

#[test]
fn long_flags() {
    check(
        &tool(),
        "--output out.txt --count 3 --verbose",
        expect![[r#"
            tool: verbose=true* quiet=false output=out.txt* count=3* help=false
        "#]],
    );
    check(
        &tool(),
        "--output=a=b --count=-3",
        expect![[r#"
            tool: verbose=false quiet=false output=a=b* count=-3* help=false
        "#]],
    );
    check(
        &tool(),
        "--output=",
        expect![[r#"
            tool: verbose=false quiet=false output=* count=0 help=false
        "#]],
    );
}

#[test]
fn compound_short_flags() {
    check(
        &tool(),
        "-vqo out.txt",
        expect![[r#"
            tool: verbose=true* quiet=true* output=out.txt* count=0 help=false
        "#]],
    );
    assert_eq!(parse_dump(&tool(), "-vqo out.txt"), parse_dump(&tool(), "-v -q -o out.txt"));

    check(
        &tool(),
        "-ovq",
        expect!["non-boolean flag `-o` cannot be used in a compound expression `-ovq`"],
    );
    check(
        &tool(),
        "-voq",
        expect!["non-boolean flag `-o` cannot be used in a compound expression `-voq`"],
    );
    check(&tool(), "-vx", expect!["unrecognized option: `-x`"]);
    check(&tool(), "-vv", expect!["flag provided more than once: `--verbose`"]);
}

#[test]
fn boolean_takes_optional_value() {
    check(
        &tool(),
        "-v false",
        expect![[r#"
            tool: verbose=false* quiet=false output= count=0 help=false
        "#]],
    );
    check(
        &tool(),
        "--quiet TRUE",
        expect![[r#"
            tool: verbose=false quiet=true* output= count=0 help=false
        "#]],
    );
    check(
        &tool(),
        "--verbose maybe",
        expect![[r#"
            tool: verbose=true* quiet=false output= count=0 help=false ["maybe"]
        "#]],
    );
    check(
        &tool(),
        "-v run",
        expect![[r#"
            run: ratio=0.5 help=false
            tool: verbose=true* quiet=false output= count=0 help=false
        "#]],
    );
    check(
        &tool(),
        "--verbose=yes",
        expect!["invalid value for `--verbose`: `yes` is not `true` or `false`"],
    );
}

#[test]
fn bad_values() {
    check(&tool(), "--nope", expect!["unrecognized flag: `--nope`"]);
    check(&tool(), "-c lots", expect!["invalid value for `--count`: `lots` is not an integer"]);
    check(&tool(), "run -r 2", expect!["invalid value for `--ratio`: `2` is outside 0-1"]);
    check(&tool(), "run -r x", expect!["invalid value for `--ratio`: `x` is not a number"]);
    check(
        &tool(),
        "build --profile fast",
        expect!["invalid value for `--profile`: `fast` is not one of {dev, release}"],
    );
    check(&tool(), "build -j 0", expect!["invalid value for `--jobs`: `0` is outside 1-64"]);
    check(&tool(), "-c 1 -c 2", expect!["flag provided more than once: `--count`"]);
}

#[test]
fn commands_do_not_see_parent_flags_unless_inheriting() {
    check(&tool(), "run -v", expect!["unrecognized option: `-v`"]);
    check(&tool(), "run --count 1", expect!["unrecognized flag: `--count`"]);
    check(
        &tool(),
        "build -vj 4 release",
        expect![[r#"
            build: profile=dev jobs=4* help=false verbose=true* quiet=false output= count=0 ["release"]
            tool: verbose=true quiet=false output= count=0 help=false
        "#]],
    );
}

#[test]
fn missing_value() {
    check(&tool(), "-c", expect!["the following flag is missing a value: `--count`"]);
    check(&tool(), "--output", expect!["the following flag is missing a value: `--output`"]);
    check(&tool(), "-c -v", expect!["the following flag is missing a value: `--count`"]);
    check(&tool(), "-c -v 3", expect!["the following flag is missing a value: `--count`"]);
    check(
        &tool(),
        "-v",
        expect![[r#"
            tool: verbose=true* quiet=false output= count=0 help=false
        "#]],
    );
}

#[test]
fn skipped_value_slot_can_be_filled_later() {
    check(
        &tool(),
        "-c -c 3",
        expect![[r#"
            tool: verbose=false quiet=false output= count=3* help=false
        "#]],
    );
}

#[test]
fn negative_numbers_need_equals() {
    check(&tool(), "-c -5", expect!["unrecognized option: `-5`"]);
    check(
        &tool(),
        "--count=-5",
        expect![[r#"
            tool: verbose=false quiet=false output= count=-5* help=false
        "#]],
    );
}

#[test]
fn required_flags() {
    check(&tool(), "remote add", expect!["missing required flag(s): `--url`, `--name`"]);
    check(&tool(), "remote add --name origin", expect!["missing required flag(s): `--url`"]);
    check(
        &tool(),
        "remote add --name origin -u git@host",
        expect![[r#"
            add: url=git@host* name=origin* help=false
            remote: help=false
            tool: verbose=false quiet=false output= count=0 help=false
        "#]],
    );
}

#[test]
fn help_skips_required_flags() {
    check(
        &tool(),
        "remote add --help",
        expect![[r#"
            add: url= name= help=true*
            remote: help=false
            tool: verbose=false quiet=false output= count=0 help=false
        "#]],
    );
    check(
        &tool(),
        "help remote add",
        expect![[r#"
            add: url= name= help=false
            remote: help=false
            tool: verbose=false quiet=false output= count=0 help=false
        "#]],
    );
}

#[test]
fn invalid_utf8() {
    #[cfg(unix)]
    {
        use std::{ffi::OsString, os::unix::ffi::OsStringExt};

        let app = tool();
        let mut ctx = treeflags::Context::new(&app).unwrap();
        let err = ctx.parse([OsString::from_vec(vec![0xff, b'x'])]).unwrap_err();
        expect![[r#"invalid utf8 argument: "\xFFx""#]].assert_eq(&err.to_string());
    }
}
