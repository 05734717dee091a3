use crate::{parser, transpiler, type_checker, util::fmt};

/// Each variant contains the input source.
pub enum Test {
    Parser(&'static str),
    Checker(&'static str),
    Transpiler(&'static str),
}

pub enum Assertion {
    /// The stage succeeds and its JSON dump matches exactly.
    JsonOk(&'static str),
    /// Transpilation succeeds and the emitted functions (prelude stripped)
    /// match exactly.
    CppOk(&'static str),
    /// The pipeline fails with exactly this message.
    ExpectedError(&'static str),
}

pub fn run_pipeline(test: Test) -> (String, Option<String>) {
    match test {
        Test::Parser(src) => match parser::parse_program(src) {
            Ok(program) => (fmt::dump_program_string(&program), None),
            Err(error) => (String::new(), Some(error.message)),
        },
        Test::Checker(src) => {
            let program = match parser::parse_program(src) {
                Ok(program) => program,
                Err(error) => return (String::new(), Some(error.message)),
            };
            match type_checker::check(&program) {
                Ok(checked) => (fmt::dump_checked_program_string(&checked), None),
                Err(error) => (String::new(), Some(error.message)),
            }
        }
        Test::Transpiler(src) => {
            let program = match parser::parse_program(src) {
                Ok(program) => program,
                Err(error) => return (String::new(), Some(error.message)),
            };
            let checked = match type_checker::check(&program) {
                Ok(checked) => checked,
                Err(error) => return (String::new(), Some(error.message)),
            };
            match transpiler::transpile(&checked) {
                Ok(code) => {
                    let body = code
                        .strip_prefix(transpiler::PRELUDE)
                        .expect("emitted code starts with the prelude");
                    (body.to_string(), None)
                }
                Err(error) => (String::new(), Some(error.message)),
            }
        }
    }
}

#[track_caller]
pub fn run_assertion(assertion: Assertion, output: &str, error: &Option<String>) {
    match assertion {
        Assertion::JsonOk(expected) | Assertion::CppOk(expected) => {
            ::pretty_assertions::assert_eq!(error.as_deref(), None);
            ::pretty_assertions::assert_eq!(output, expected);
        }
        Assertion::ExpectedError(expected) => {
            ::pretty_assertions::assert_eq!(error.as_deref(), Some(expected));
        }
    }
}

macro_rules! pipeline_tests {
    (
        use $stage:ident;

        $(
            fn $test_name:ident() {
                let source = $source:expr;
                $($assertions_tt:tt)*
            }
        )*
    ) => {
        $(
            #[test]
            fn $test_name() {
                let test = pipeline_tests!(@@test($stage), $source);
                let (output, error) = crate::util::test_utils::run_pipeline(test);
                pipeline_tests!(@@expand_assertions, (&output, &error), [$($assertions_tt)*]);
            }
        )*
    };

    (@@expand_assertions, $ctx:expr, []) => {};
    (@@expand_assertions, $ctx:expr, [
        let $assertion:ident = $expected:expr;
        $($rest_tt:tt)*
    ]) => {
        crate::util::test_utils::run_assertion(
            pipeline_tests!(@@assertion, $assertion, $expected),
            $ctx.0,
            $ctx.1,
        );
        pipeline_tests!(@@expand_assertions, $ctx, [$($rest_tt)*]);
    };

    (@@assertion, json_ok, $expected:expr) => {
        crate::util::test_utils::Assertion::JsonOk($expected)
    };
    (@@assertion, cpp_ok, $expected:expr) => {
        crate::util::test_utils::Assertion::CppOk(::indoc::indoc! { $expected })
    };
    (@@assertion, expected_error, $expected:expr) => {
        crate::util::test_utils::Assertion::ExpectedError($expected)
    };

    (@@test(parser), $source:expr) => {
        crate::util::test_utils::Test::Parser($source)
    };
    (@@test(checker), $source:expr) => {
        crate::util::test_utils::Test::Checker($source)
    };
    (@@test(transpiler), $source:expr) => {
        crate::util::test_utils::Test::Transpiler($source)
    };
}
pub(crate) use pipeline_tests;
