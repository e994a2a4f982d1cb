//! Property-based tests for argument vector construction and delivery
//!
//! The argument vector is always
//! `interpreter -> launcher args -> interpreter args -> script -> script args`,
//! each value passed as exactly one element with no shell interpretation.

#![cfg(unix)]

use std::ffi::OsString;
use std::fs;

use proptest::prelude::*;
use pyrunner::{Invocation, PythonRunner, RunnerConfiguration};
use tempfile::TempDir;

fn arg_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 '\"$*?;&|<>()-]{0,16}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]
    #[test]
    fn prop_build_command_orders_argument_vector(
        interpreter_args in prop::collection::vec("-[a-zA-Z]{1,4}", 0..4),
        script in "[a-z]{1,8}\\.py",
        args in prop::collection::vec(arg_strategy(), 0..8),
    ) {
        let mut config = RunnerConfiguration::new("/bin/sh").unwrap();
        config.set_interpreter_args(interpreter_args.clone());
        let runner = PythonRunner::new(config);

        let cmd = runner.build_command(&Invocation::new(&script).args(&args));

        let expected: Vec<OsString> = interpreter_args
            .iter()
            .chain(std::iter::once(&script))
            .chain(args.iter())
            .map(OsString::from)
            .collect();
        prop_assert_eq!(cmd.program, OsString::from("/bin/sh"));
        prop_assert_eq!(cmd.args, expected);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]
    #[test]
    fn prop_arguments_reach_child_unchanged(
        args in prop::collection::vec(arg_strategy(), 0..6),
    ) {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("echo_args.sh");
        fs::write(&script, "for a in \"$@\"; do printf '[%s]' \"$a\"; done\n").unwrap();

        let runner = PythonRunner::new(RunnerConfiguration::new("/bin/sh").unwrap());
        let text = runner.execute(&Invocation::new(script).args(&args)).unwrap();

        let expected: String = args.iter().map(|a| format!("[{a}]")).collect();
        prop_assert_eq!(text, expected);
    }
}
