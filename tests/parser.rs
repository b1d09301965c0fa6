#[cfg(test)]
mod parser_tests {
    use rox::ast::{Expr, ExprId, Stmt};
    use rox::ast_printer::AstPrinter;
    use rox::parser::Parser;
    use rox::scanner::Scanner;
    use rox::token::Token;

    fn tokens(source: &str) -> Vec<Token> {
        Scanner::new(source).filter_map(Result::ok).collect()
    }

    fn print(source: &str) -> String {
        let tokens = tokens(source);
        let statements = Parser::new(&tokens)
            .parse()
            .unwrap_or_else(|errors| panic!("parse failed: {:?}", errors));

        AstPrinter::print_program(&statements)
    }

    fn errors(source: &str) -> Vec<String> {
        let tokens = tokens(source);

        match Parser::new(&tokens).parse() {
            Ok(statements) => panic!("expected errors, parsed {:?}", statements),
            Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
        }
    }

    #[test]
    fn test_precedence() {
        assert_eq!(print("1 + 2 * 3;"), "(; (+ 1.0 (* 2.0 3.0)))");
        assert_eq!(print("(1 + 2) * -3;"), "(; (* (group (+ 1.0 2.0)) (- 3.0)))");
        assert_eq!(print("!true == false;"), "(; (== (! true) false))");
        assert_eq!(print("a or b and c;"), "(; (or a (and b c)))");
    }

    #[test]
    fn test_assignment_is_right_associative() {
        assert_eq!(print("a = b = 1;"), "(; (= a (= b 1.0)))");
        assert_eq!(print("p.x = 2;"), "(; (= (. p x) 2.0))");
    }

    #[test]
    fn test_calls_and_properties() {
        assert_eq!(
            print("f(1, \"s\")(2).field;"),
            "(; (. (call (call f 1.0 s) 2.0) field))"
        );
    }

    #[test]
    fn test_for_desugars_to_while() {
        assert_eq!(
            print("for (var i = 0; i < 2; i = i + 1) print i;"),
            "(block (var i 0.0) (while (< i 2.0) (block (print i) (; (= i (+ i 1.0))))))"
        );
        assert_eq!(print("for (;;) print 1;"), "(while true (print 1.0))");
    }

    #[test]
    fn test_class_declaration() {
        assert_eq!(
            print("class B < A { init(x) { this.x = x; } get() { return super.get(); } }"),
            "(class B < A (method init(x) (; (= (. this x) x))) \
             (method get() (return (call (super get)))))"
        );
    }

    #[test]
    fn test_function_and_control_flow() {
        assert_eq!(
            print("fun f(a, b) { if (a) return b; else return; }"),
            "(fun f(a b) (if a (return b) (return)))"
        );
        assert_eq!(print("while (x) { var y; }"), "(while x (block (var y)))");
    }

    #[test]
    fn test_missing_semicolon_reports_at_end() {
        assert_eq!(
            errors("print 1"),
            vec!["[line 1] Error at end: Expected ';' after value"]
        );
    }

    #[test]
    fn test_recovers_and_reports_every_error() {
        let errors = errors("var = 1;\nprint 2;\nprint ;\n");

        assert_eq!(
            errors,
            vec![
                "[line 1] Error at '=': Expected variable name",
                "[line 3] Error at ';': Expected expression",
            ]
        );
    }

    #[test]
    fn test_invalid_assignment_target() {
        assert_eq!(
            errors("1 = 2;"),
            vec!["[line 1] Error at '=': Invalid assignment target"]
        );
    }

    #[test]
    fn test_super_needs_a_method() {
        assert_eq!(
            errors("super;"),
            vec!["[line 1] Error at ';': Expected '.' after 'super'"]
        );
    }

    #[test]
    fn test_too_many_arguments() {
        let args: Vec<String> = (0..256).map(|i| i.to_string()).collect();
        let source = format!("f({});", args.join(", "));

        let errors = errors(&source);

        assert_eq!(errors.len(), 1);
        assert!(errors[0].ends_with("Cannot have more than 255 arguments"));
    }

    #[test]
    fn test_expression_ids_start_where_asked() {
        let tokens = tokens("a; b = c;");
        let mut parser = Parser::with_first_id(&tokens, 10);
        let statements = parser.parse().expect("valid program");

        let ids: Vec<ExprId> = statements
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::Expression(Expr::Variable { id, .. }) => Some(*id),
                Stmt::Expression(Expr::Assign { id, .. }) => Some(*id),
                _ => None,
            })
            .collect();

        // `b` and `c` take 11 and 12 before the assignment itself is numbered.
        assert_eq!(ids, vec![ExprId(10), ExprId(13)]);
        assert_eq!(parser.next_id(), 14);
    }
}
