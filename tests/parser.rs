use rox::ast::{Expr, LiteralValue, Stmt};
use rox::error::Diagnostics;
use rox::parser::{Parser, MAX_ARGS};
use rox::scanner::Scanner;
use rox::token::TokenType;

fn parse(source: &str) -> (Vec<Stmt>, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let tokens = Scanner::new(source).scan_tokens(&mut diagnostics);
    let statements = Parser::new(&tokens, &mut diagnostics).parse();

    (statements, diagnostics)
}

fn messages(diagnostics: &Diagnostics) -> Vec<String> {
    diagnostics
        .reports()
        .iter()
        .map(ToString::to_string)
        .collect()
}

#[test]
fn test_parse_var_and_expression_statements() {
    let (statements, diagnostics) = parse("var a = 1;\na + 2;");

    assert!(!diagnostics.had_error());
    assert_eq!(statements.len(), 2);

    match &statements[0] {
        Stmt::Var {
            name,
            initializer: Some(Expr::Literal(LiteralValue::Number(n))),
        } => {
            assert_eq!(name.lexeme, "a");
            assert_eq!(*n, 1.0);
        }
        other => panic!("expected var declaration, got {:?}", other),
    }

    assert!(matches!(
        &statements[1],
        Stmt::Expression(Expr::Binary { .. })
    ));
}

#[test]
fn test_factor_binds_tighter_than_term() {
    let (statements, _) = parse("1 + 2 * 3;");

    let Stmt::Expression(Expr::Binary {
        left,
        operator,
        right,
    }) = &statements[0]
    else {
        panic!("expected binary expression");
    };

    assert_eq!(operator.token_type, TokenType::PLUS);
    assert!(matches!(**left, Expr::Literal(LiteralValue::Number(_))));
    assert!(matches!(
        &**right,
        Expr::Binary { operator, .. } if operator.token_type == TokenType::STAR
    ));
}

#[test]
fn test_error_at_token_and_at_end() {
    let (_, diagnostics) = parse("1 +;");
    assert_eq!(
        messages(&diagnostics),
        vec!["[Line 1] Error at ';': Expected expression."]
    );

    let (_, diagnostics) = parse("1 +");
    assert_eq!(
        messages(&diagnostics),
        vec!["[Line 1] Error at end: Expected expression."]
    );
}

#[test]
fn test_recovers_and_reports_every_syntax_error() {
    let (statements, diagnostics) = parse("var = 1;\nvar b = ;\nvar c = 3;");

    assert_eq!(
        messages(&diagnostics),
        vec![
            "[Line 1] Error at '=': Expected variable name.",
            "[Line 2] Error at ';': Expected expression.",
        ]
    );

    // Only the well-formed declaration survives.
    assert_eq!(statements.len(), 1);
    assert!(matches!(&statements[0], Stmt::Var { name, .. } if name.lexeme == "c"));
}

#[test]
fn test_invalid_assignment_target_does_not_stop_parsing() {
    let (statements, diagnostics) = parse("1 = 2;\nvar ok = true;");

    assert_eq!(
        messages(&diagnostics),
        vec!["[Line 1] Error at '=': Invalid assignment target."]
    );
    assert_eq!(statements.len(), 2);
}

#[test]
fn test_property_assignment_becomes_set() {
    let (statements, diagnostics) = parse("point.x = 3;");

    assert!(!diagnostics.had_error());
    assert!(matches!(
        &statements[0],
        Stmt::Expression(Expr::Set { name, .. }) if name.lexeme == "x"
    ));
}

#[test]
fn test_ternary_groups_to_the_right() {
    let (statements, diagnostics) = parse("a ? b : c ? d : e;");

    assert!(!diagnostics.had_error());

    let Stmt::Expression(Expr::Ternary {
        condition,
        then_branch,
        else_branch,
    }) = &statements[0]
    else {
        panic!("expected ternary");
    };

    assert!(matches!(&**condition, Expr::Variable { name, .. } if name.lexeme == "a"));
    assert!(matches!(&**then_branch, Expr::Variable { name, .. } if name.lexeme == "b"));
    assert!(matches!(&**else_branch, Expr::Ternary { .. }));
}

#[test]
fn test_ternary_without_colon_is_an_error() {
    let (_, diagnostics) = parse("a ? b;");

    assert_eq!(
        messages(&diagnostics),
        vec!["[Line 1] Error at ';': Expected ':' after then branch of ternary expression."]
    );
}

#[test]
fn test_for_loop_desugars_to_while() {
    let (statements, diagnostics) = parse("for (var i = 0; i < 3; i = i + 1) f(i);");

    assert!(!diagnostics.had_error());
    assert_eq!(statements.len(), 1);

    let Stmt::Block(outer) = &statements[0] else {
        panic!("expected outer block");
    };
    assert_eq!(outer.len(), 2);
    assert!(matches!(&outer[0], Stmt::Var { .. }));

    let Stmt::While { condition, body } = &outer[1] else {
        panic!("expected while loop");
    };
    assert!(matches!(condition, Expr::Binary { .. }));

    let Stmt::Block(inner) = &**body else {
        panic!("expected body block");
    };
    assert_eq!(inner.len(), 2);
    assert!(matches!(&inner[0], Stmt::Expression(Expr::Call { .. })));
    assert!(matches!(&inner[1], Stmt::Expression(Expr::Assign { .. })));
}

#[test]
fn test_empty_for_clauses_loop_forever() {
    let (statements, diagnostics) = parse("for (;;) {}");

    assert!(!diagnostics.had_error());
    assert!(matches!(
        &statements[0],
        Stmt::While {
            condition: Expr::Literal(LiteralValue::True),
            ..
        }
    ));
}

#[test]
fn test_too_many_arguments_is_reported_but_parsed() {
    let args: Vec<String> = (0..=MAX_ARGS).map(|i| i.to_string()).collect();
    let source = format!("f({});", args.join(", "));

    let (statements, diagnostics) = parse(&source);

    assert_eq!(
        messages(&diagnostics),
        vec!["[Line 1] Error at '16': Can't have more than 16 arguments."]
    );

    let Stmt::Expression(Expr::Call { arguments, .. }) = &statements[0] else {
        panic!("expected call");
    };
    assert_eq!(arguments.len(), MAX_ARGS + 1);
}

#[test]
fn test_too_many_parameters_is_reported() {
    let params: Vec<String> = (0..=MAX_ARGS).map(|i| format!("p{}", i)).collect();
    let source = format!("fun f({}) {{}}", params.join(", "));

    let (statements, diagnostics) = parse(&source);

    assert_eq!(
        messages(&diagnostics),
        vec!["[Line 1] Error at 'p16': Can't have more than 16 parameters."]
    );
    assert_eq!(statements.len(), 1);
}

#[test]
fn test_class_with_superclass_and_methods() {
    let (statements, diagnostics) = parse(
        "class B < A {\n  init(x) { this.x = x; }\n  get() { return super.get(); }\n}",
    );

    assert!(!diagnostics.had_error());

    let Stmt::Class {
        name,
        superclass,
        methods,
    } = &statements[0]
    else {
        panic!("expected class");
    };

    assert_eq!(name.lexeme, "B");
    assert!(matches!(superclass, Some(Expr::Variable { name, .. }) if name.lexeme == "A"));

    let names: Vec<&str> = methods.iter().map(|m| m.name.lexeme.as_str()).collect();
    assert_eq!(names, vec!["init", "get"]);
    assert_eq!(methods[0].params.len(), 1);
}

#[test]
fn test_super_requires_method_name() {
    let (_, diagnostics) = parse("super;");

    assert_eq!(
        messages(&diagnostics),
        vec!["[Line 1] Error at ';': Expected '.' after 'super'."]
    );
}

#[test]
fn test_each_reference_gets_its_own_id() {
    let (statements, _) = parse("a;\na;");

    let ids: Vec<_> = statements
        .iter()
        .map(|stmt| match stmt {
            Stmt::Expression(Expr::Variable { id, .. }) => *id,
            other => panic!("expected variable, got {:?}", other),
        })
        .collect();

    assert_ne!(ids[0], ids[1]);
}
