mod common;

#[cfg(test)]
mod interpreter_tests {
    use rox::lox::Outcome;

    use crate::common::{self, run, run_ok};

    fn runtime_error(source: &str) -> (String, String) {
        let (out, err, outcome) = run(source);
        assert_eq!(outcome, Outcome::RuntimeError, "stdout was: {}", out);
        assert_eq!(outcome.exit_code(), 70);

        (out, err)
    }

    #[test]
    fn test_arithmetic_and_formatting() {
        assert_eq!(
            run_ok("print 1 + 2 * 3; print 7 / 2; print -(4 - 10); print 1 / 0;"),
            vec!["7", "3.5", "6", "inf"]
        );
    }

    #[test]
    fn test_strings_concatenate() {
        assert_eq!(
            run_ok("var a = \"foo\"; print a + \"bar\";"),
            vec!["foobar"]
        );
    }

    #[test]
    fn test_comparison_and_equality() {
        assert_eq!(
            run_ok(
                "print 1 < 2; print 2 <= 1; print 1 == 1; print \"a\" == \"a\"; \
                 print nil == false; print 1 == \"1\"; print nil == nil;"
            ),
            vec!["true", "false", "true", "true", "false", "false", "true"]
        );
    }

    #[test]
    fn test_truthiness() {
        assert_eq!(
            run_ok(
                "if (0) print \"zero\"; if (\"\") print \"empty\"; \
                 if (nil) print \"nil\"; else print \"no nil\"; print !nil; print !0;"
            ),
            vec!["zero", "empty", "no nil", "true", "false"]
        );
    }

    #[test]
    fn test_logical_operators_return_operands() {
        assert_eq!(
            run_ok(
                "print nil or \"yes\"; print 1 or 2; print nil and 1; \
                 print 1 and 2; print false or nil;"
            ),
            vec!["yes", "1", "nil", "2", "nil"]
        );
    }

    #[test]
    fn test_logical_operators_short_circuit() {
        assert_eq!(
            run_ok(
                "var hits = 0; fun hit() { hits = hits + 1; return true; } \
                 false and hit(); true or hit(); print hits;"
            ),
            vec!["0"]
        );
    }

    #[test]
    fn test_block_shadowing() {
        assert_eq!(
            run_ok("var a = 1; { var a = 2; print a; } print a;"),
            vec!["2", "1"]
        );
    }

    #[test]
    fn test_uninitialized_variable_is_nil() {
        assert_eq!(run_ok("var a; print a;"), vec!["nil"]);
    }

    #[test]
    fn test_assignment_is_an_expression() {
        assert_eq!(
            run_ok("var a; var b; a = b = 3; print a; print b;"),
            vec!["3", "3"]
        );
    }

    #[test]
    fn test_while_and_for() {
        assert_eq!(
            run_ok(
                "var i = 0; while (i < 3) { print i; i = i + 1; } \
                 for (var j = 10; j > 8; j = j - 1) print j;"
            ),
            vec!["0", "1", "2", "10", "9"]
        );
    }

    #[test]
    fn test_recursion() {
        assert_eq!(
            run_ok(
                "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); } \
                 print fib(15);"
            ),
            vec!["610"]
        );
    }

    #[test]
    fn test_return_unwinds_loops() {
        assert_eq!(
            run_ok(
                "fun first() { for (var i = 0; ; i = i + 1) { if (i == 3) return i; } } \
                 print first();"
            ),
            vec!["3"]
        );
    }

    #[test]
    fn test_function_without_return_yields_nil() {
        assert_eq!(
            run_ok("fun f() {} fun g() { return; } print f(); print g();"),
            vec!["nil", "nil"]
        );
    }

    #[test]
    fn test_closure_counter() {
        assert_eq!(
            run_ok(
                "fun makeCounter() { var i = 0; fun count() { i = i + 1; return i; } return count; } \
                 var c = makeCounter(); print c(); print c(); \
                 var d = makeCounter(); print d(); print c();"
            ),
            vec!["1", "2", "1", "3"]
        );
    }

    #[test]
    fn test_closures_bind_lexically() {
        // The inner `a` declared later in the block must not change what
        // `show` already resolved to.
        assert_eq!(
            run_ok(
                "var a = \"global\"; \
                 { fun show() { print a; } show(); var a = \"block\"; show(); }"
            ),
            vec!["global", "global"]
        );
    }

    #[test]
    fn test_callable_values_print() {
        assert_eq!(
            run_ok("fun f() {} print f; print clock;"),
            vec!["<fn f>", "<native fn>"]
        );
    }

    #[test]
    fn test_clock_returns_seconds() {
        assert_eq!(run_ok("print clock() > 1000000000;"), vec!["true"]);
    }

    #[test]
    fn test_function_equality_is_identity() {
        assert_eq!(
            run_ok("fun f() {} var g = f; print f == g; fun h() {} print f == h;"),
            vec!["true", "false"]
        );
    }

    #[test]
    fn test_arity_mismatch_runs_nothing() {
        let (out, err) = runtime_error("fun f(a, b) { print \"body\"; } f(1);");

        assert_eq!(out, "");
        assert_eq!(err, "Expected 2 arguments but got 1.\n[line 1]\n");
    }

    #[test]
    fn test_calling_a_non_callable() {
        let (_, err) = runtime_error("\"text\"();");

        assert_eq!(err, "Can only call functions and classes.\n[line 1]\n");
    }

    #[test]
    fn test_operand_errors() {
        let (_, err) = runtime_error("print -\"a\";");
        assert_eq!(err, "Operand must be a number.\n[line 1]\n");

        let (_, err) = runtime_error("print 1 < \"a\";");
        assert_eq!(err, "Operands must be numbers.\n[line 1]\n");

        let (_, err) = runtime_error("print 1 + \"a\";");
        assert_eq!(err, "Right operand must be a number.\n[line 1]\n");

        let (_, err) = runtime_error("print \"a\" + 1;");
        assert_eq!(err, "Right operand must be a string.\n[line 1]\n");

        let (_, err) = runtime_error("print nil + 1;");
        assert_eq!(err, "Operands must be two numbers or two strings.\n[line 1]\n");
    }

    #[test]
    fn test_undefined_variable() {
        let (_, err) = runtime_error("print 1;\nprint missing;");
        assert_eq!(err, "Undefined variable 'missing'.\n[line 2]\n");

        let (_, err) = runtime_error("missing = 1;");
        assert_eq!(err, "Undefined variable 'missing'.\n[line 1]\n");
    }

    #[test]
    fn test_runtime_error_stops_the_program() {
        let (out, _) = runtime_error("print \"one\"; print -nil; print \"two\";");

        assert_eq!(out, "one\n");
    }

    #[test]
    fn test_syntax_errors_exit_65() {
        let (out, err, outcome) = run("print \"ok\";\nvar;");

        assert_eq!(outcome, Outcome::StaticError);
        assert_eq!(out, "");
        assert_eq!(err, "[line 2] Error at ';': Expected variable name\n");
    }

    #[test]
    fn test_lex_errors_exit_65() {
        let (out, err, outcome) = run("print 1; @");

        assert_eq!(outcome, Outcome::StaticError);
        assert_eq!(out, "");
        assert_eq!(err, "[line 1] Error: Unexpected character: @\n");
    }

    #[test]
    fn test_session_keeps_definitions_between_runs() {
        let (mut lox, out, _) = common::session();

        assert_eq!(
            lox.run("var n = 1; fun bump() { var step = 1; n = n + step; }"),
            Outcome::Success
        );
        assert_eq!(lox.run("bump(); bump();"), Outcome::Success);
        assert_eq!(lox.run("print n;"), Outcome::Success);

        assert_eq!(out.contents(), "3\n");
    }

    #[test]
    fn test_callee_then_arguments_left_to_right() {
        assert_eq!(
            run_ok("fun t(x) { print x; return x; } fun f(a, b) {} t(f)(t(1), t(2));"),
            vec!["<fn f>", "1", "2"]
        );
    }

    #[test]
    fn test_binary_operands_left_to_right() {
        assert_eq!(
            run_ok(
                "fun t(x) { print x; return x; } \
                 print t(1) + t(2); print t(\"a\") == t(\"b\"); print t(3) < t(4);"
            ),
            vec!["1", "2", "3", "a", "b", "false", "3", "4", "true"]
        );
    }

    #[test]
    fn test_large_numbers_print_in_exponent_form() {
        assert_eq!(
            run_ok("print 100000000000000000000000; print 1000 * 1000; print 999999;"),
            vec!["1e+23", "1e+06", "999999"]
        );
    }

    #[test]
    fn test_session_recovers_after_errors() {
        let (mut lox, out, err) = common::session();

        assert_eq!(lox.run("print nil + 1;"), Outcome::RuntimeError);
        assert!(lox.had_runtime_error());

        lox.reset_errors();
        assert!(!lox.had_runtime_error());

        assert_eq!(lox.run("print \"still here\";"), Outcome::Success);
        assert_eq!(out.contents(), "still here\n");
        assert!(err.contents().starts_with("Operands must be"));
    }

    #[test]
    fn test_prompt_runs_each_line() {
        let (mut lox, out, err) = common::session();
        let mut prompt = Vec::new();

        let input = "var x = 2;\nprint x * 3;\nprint oops;\nprint x;\n";
        lox.run_prompt(input.as_bytes(), &mut prompt)
            .expect("prompt I/O");

        assert_eq!(out.contents(), "6\n2\n");
        assert_eq!(err.contents(), "Undefined variable 'oops'.\n[line 1]\n");
        assert_eq!(String::from_utf8_lossy(&prompt), "> > > > > \n");
    }
}
