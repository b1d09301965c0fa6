mod common;

#[cfg(test)]
mod diagnostic_tests {
    use rox::diagnostic::Diagnostics;
    use rox::error::{LoxError, RuntimeError};
    use rox::token::{Token, TokenType};

    use crate::common::SharedBuffer;

    fn sink() -> (Diagnostics, SharedBuffer) {
        let buffer = SharedBuffer::default();
        let diagnostics = Diagnostics::with_sink(Box::new(buffer.clone()));

        (diagnostics, buffer)
    }

    #[test]
    fn test_static_errors_raise_only_the_static_flag() {
        let (mut diagnostics, buffer) = sink();

        diagnostics.error(&LoxError::lex(3, "Unexpected character: @"));
        diagnostics.error(&LoxError::parse(
            &Token::new(TokenType::EOF, "", 4),
            "Expect expression.",
        ));
        diagnostics.error(&LoxError::resolve(
            &Token::identifier("a", 5),
            "Already a variable with this name in this scope.",
        ));

        assert!(diagnostics.had_error());
        assert!(!diagnostics.had_runtime_error());
        assert_eq!(
            buffer.contents(),
            "[line 3] Error: Unexpected character: @\n\
             [line 4] Error at end: Expect expression.\n\
             [line 5] Error at 'a': Already a variable with this name in this scope.\n"
        );
    }

    #[test]
    fn test_runtime_error_raises_only_the_runtime_flag() {
        let (mut diagnostics, buffer) = sink();
        let fault = RuntimeError::new(&Token::identifier("x", 7), "Undefined variable 'x'.");

        diagnostics.error(&LoxError::from(fault));

        assert!(!diagnostics.had_error());
        assert!(diagnostics.had_runtime_error());
        assert_eq!(buffer.contents(), "Undefined variable 'x'.\n[line 7]\n");
    }

    #[test]
    fn test_reset_clears_both_flags() {
        let (mut diagnostics, _) = sink();

        diagnostics.report(1, "", "boom");
        diagnostics.runtime_error(&RuntimeError::new(&Token::identifier("y", 1), "bad"));
        diagnostics.reset();

        assert!(!diagnostics.had_error());
        assert!(!diagnostics.had_runtime_error());
    }
}
