use rox::session::{Session, Status};

/// Run `source` in a fresh captured session.
fn run(source: &str) -> (Status, String, Vec<String>) {
    run_with_input(source, "")
}

fn run_with_input(source: &str, input: &str) -> (Status, String, Vec<String>) {
    let mut session = Session::captured(input);
    let status = session.run(source);

    let reports = session
        .diagnostics()
        .reports()
        .iter()
        .map(ToString::to_string)
        .collect();

    (status, session.output(), reports)
}

fn assert_prints(source: &str, expected: &str) {
    let (status, output, reports) = run(source);

    assert!(reports.is_empty(), "unexpected errors: {:?}", reports);
    assert_eq!(status, Status::Ok);
    assert_eq!(output, expected);
}

fn assert_runtime_error(source: &str, expected: &str) {
    let (status, _, reports) = run(source);

    assert_eq!(status, Status::RuntimeError);
    assert_eq!(reports, vec![expected.to_owned()]);
}

// ─────────────────────────── expressions ───────────────────────────

#[test]
fn test_arithmetic_and_number_display() {
    assert_prints(
        "printLine(1 + 2 * 3);\nprintLine(7 / 2);\nprintLine(-(4 - 10));\nprintLine(0.1 + 0.2 > 0.3);",
        "7\n3.5\n6\ntrue\n",
    );
}

#[test]
fn test_string_concatenation() {
    assert_prints(
        r#"printLine("n=" + 1); printLine(2 + "x"); printLine("a" + "b"); printLine("t" + true + nil);"#,
        "n=1\n2x\nab\nttruenil\n",
    );
}

#[test]
fn test_plus_without_string_or_numbers() {
    assert_runtime_error(
        "nil + 1;",
        "[Line 1] Operands must be two numbers or at least one string.",
    );
}

#[test]
fn test_comparison_requires_numbers() {
    assert_runtime_error(r#"1 < "2";"#, "[Line 1] Operands must be numbers.");
}

#[test]
fn test_negation_requires_number() {
    assert_runtime_error(r#"-"x";"#, "[Line 1] Operand must be a number.");
}

#[test]
fn test_division_by_zero_is_its_own_error() {
    assert_runtime_error("printLine(1 / 0);", "[Line 1] Division by zero.");
    assert_runtime_error(r#"printLine(1 / "a");"#, "[Line 1] Operands must be numbers.");
}

#[test]
fn test_equality() {
    assert_prints(
        r#"printLine(1 == "1"); printLine(nil == nil); printLine("a" == "a"); printLine(nil != false);"#,
        "false\ntrue\ntrue\ntrue\n",
    );
}

#[test]
fn test_truthiness() {
    assert_prints(
        r#"printLine(0 ? "t" : "f"); printLine("" ? "t" : "f"); printLine(nil ? "t" : "f"); printLine(!false);"#,
        "t\nt\nf\ntrue\n",
    );
}

#[test]
fn test_ternary_chains() {
    assert_prints(
        "printLine(true ? 1 : false ? 2 : 3);\nprintLine(false ? 1 : true ? 2 : 3);\nprintLine(false ? 1 : false ? 2 : 3);",
        "1\n2\n3\n",
    );
}

#[test]
fn test_ternary_evaluates_one_branch() {
    // `boom` is undefined: evaluating it would be a runtime error.
    assert_prints("printLine(true ? 1 : boom);", "1\n");
}

#[test]
fn test_logical_operators_return_operands() {
    assert_prints(
        r#"printLine(nil or "x"); printLine(1 and 2); printLine(false and boom());"#,
        "x\n2\nfalse\n",
    );
}

// ─────────────────────────── variables ───────────────────────────

#[test]
fn test_block_shadowing() {
    assert_prints(
        "var a = 1;\n{\n  var a = 2;\n  printLine(a);\n}\nprintLine(a);",
        "2\n1\n",
    );
}

#[test]
fn test_unassigned_variable() {
    assert_runtime_error(
        "var a;\nprintLine(a);",
        "[Line 2] Variable 'a' was read before being assigned.",
    );
}

#[test]
fn test_assigning_declared_variable() {
    assert_prints("var a; a = 3; printLine(a);", "3\n");
}

#[test]
fn test_undefined_variable() {
    assert_runtime_error("printLine(b);", "[Line 1] Undefined variable 'b'.");
    assert_runtime_error("b = 1;", "[Line 1] Undefined variable 'b'.");
}

#[test]
fn test_loops() {
    assert_prints(
        "var sum = 0;\nfor (var i = 0; i < 5; i = i + 1) sum = sum + i;\nprintLine(sum);\nvar n = 3;\nwhile (n > 0) { print(n); n = n - 1; }",
        "10\n321",
    );
}

#[test]
fn test_if_else() {
    assert_prints(
        r#"if (1 > 2) printLine("yes"); else printLine("no");"#,
        "no\n",
    );
}

// ─────────────────────────── functions ───────────────────────────

#[test]
fn test_recursion() {
    assert_prints(
        "fun fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); }\nprintLine(fib(10));",
        "55\n",
    );
}

#[test]
fn test_closure_counters_are_independent() {
    assert_prints(
        "fun makeCounter() {\n  var count = 0;\n  fun inc() { count = count + 1; return count; }\n  return inc;\n}\nvar c = makeCounter();\nprintLine(c());\nprintLine(c());\nvar d = makeCounter();\nprintLine(d());\nprintLine(c());",
        "1\n2\n1\n3\n",
    );
}

#[test]
fn test_closure_binding_is_static() {
    assert_prints(
        "var a = \"global\";\n{\n  fun show() { printLine(a); }\n  show();\n  var a = \"block\";\n  show();\n}",
        "global\nglobal\n",
    );
}

#[test]
fn test_return_exits_loops() {
    assert_prints(
        "fun first() { for (var i = 0; ; i = i + 1) { if (i == 3) return i; } }\nprintLine(first());",
        "3\n",
    );
}

#[test]
fn test_function_without_return_yields_nil() {
    assert_prints("fun f() {}\nprintLine(f());", "nil\n");
}

#[test]
fn test_arity_mismatch() {
    assert_runtime_error(
        "fun f(a, b) {}\nf(1);",
        "[Line 2] Expected 2 arguments but got 1.",
    );
}

#[test]
fn test_calling_a_non_callable() {
    assert_runtime_error(r#""x"();"#, "[Line 1] Can only call functions and classes.");
}

#[test]
fn test_callable_display() {
    assert_prints(
        "fun f() {}\nprintLine(f);\nprintLine(clock);",
        "<fn f>\n<native fn clock>\n",
    );
}

#[test]
fn test_clock_is_a_number() {
    assert_prints("printLine(clock() > 0);", "true\n");
}

#[test]
fn test_read_line() {
    let (status, output, _) = run_with_input(
        r#"printLine("hi " + readLine()); printLine(readLine()); printLine(readLine());"#,
        "alice\r\nbob\n",
    );

    assert_eq!(status, Status::Ok);
    assert_eq!(output, "hi alice\nbob\nnil\n");
}

// ─────────────────────────── classes ───────────────────────────

#[test]
fn test_class_and_instance_display() {
    assert_prints(
        "class Foo {}\nprintLine(Foo);\nprintLine(Foo());",
        "Foo\nFoo instance\n",
    );
}

#[test]
fn test_fields_and_initializer() {
    assert_prints(
        "class Point {\n  init(x, y) { this.x = x; this.y = y; }\n  sum() { return this.x + this.y; }\n}\nvar p = Point(1, 2);\nprintLine(p.sum());\np.x = 10;\nprintLine(p.sum());",
        "3\n12\n",
    );
}

#[test]
fn test_initializer_arity() {
    assert_runtime_error(
        "class P { init(x, y) {} }\nP(1);",
        "[Line 2] Expected 2 arguments but got 1.",
    );
}

#[test]
fn test_calling_init_directly_returns_instance() {
    assert_prints(
        "class A { init() { this.n = 1; } }\nvar a = A();\nprintLine(a.init() == a);",
        "true\n",
    );
}

#[test]
fn test_bound_method_keeps_this() {
    assert_prints(
        "class Greeter {\n  init(name) { this.name = name; }\n  greet() { return \"hi \" + this.name; }\n}\nvar g = Greeter(\"ann\").greet;\nprintLine(g());",
        "hi ann\n",
    );
}

#[test]
fn test_fields_shadow_methods() {
    assert_prints(
        "class A { m() { return \"method\"; } }\nvar a = A();\na.m = \"field\";\nprintLine(a.m);",
        "field\n",
    );
}

#[test]
fn test_inheritance_and_super() {
    assert_prints(
        "class A {\n  method() { return \"A \" + this.name; }\n  other() { return \"inherited\"; }\n}\nclass B < A {\n  method() { return \"B then \" + super.method(); }\n}\nvar b = B();\nb.name = \"bee\";\nprintLine(b.method());\nprintLine(b.other());",
        "B then A bee\ninherited\n",
    );
}

#[test]
fn test_super_skips_the_receivers_own_class() {
    assert_prints(
        "class A { say() { return \"A\"; } }\nclass B < A { say() { return \"B\" + super.say(); } }\nclass C < B { say() { return \"C\" + super.say(); } }\nprintLine(C().say());",
        "CBA\n",
    );
}

#[test]
fn test_undefined_property() {
    assert_runtime_error(
        "class A {}\nA().missing;",
        "[Line 2] Undefined property 'missing'.",
    );
}

#[test]
fn test_properties_need_instances() {
    assert_runtime_error("var x = 1;\nx.y;", "[Line 2] Only instances have properties.");
    assert_runtime_error("var x = 1;\nx.y = 2;", "[Line 2] Only instances have fields.");
}

#[test]
fn test_superclass_must_be_a_class() {
    assert_runtime_error("var x = 1;\nclass A < x {}", "[Line 2] Superclass must be a class.");
}

#[test]
fn test_instance_equality_is_identity() {
    assert_prints(
        "class A {}\nvar a = A();\nvar b = a;\nprintLine(a == b);\nprintLine(a == A());",
        "true\nfalse\n",
    );
}

// ─────────────────────────── pipeline ───────────────────────────

#[test]
fn test_runtime_error_aborts_remaining_statements() {
    let (status, output, reports) = run("printLine(1);\nprintLine(x);\nprintLine(2);");

    assert_eq!(status, Status::RuntimeError);
    assert_eq!(status.exit_code(), 70);
    assert_eq!(output, "1\n");
    assert_eq!(reports, vec!["[Line 2] Undefined variable 'x'."]);
}

#[test]
fn test_static_errors_prevent_execution() {
    let (status, output, reports) = run("printLine(\"a\");\nvar 1;\nvar = 2;");

    assert_eq!(status, Status::StaticError);
    assert_eq!(status.exit_code(), 65);
    assert_eq!(output, "");
    assert_eq!(reports.len(), 2);
}

#[test]
fn test_resolver_errors_prevent_execution() {
    let (status, output, _) = run("printLine(1);\nreturn;");

    assert_eq!(status, Status::StaticError);
    assert_eq!(output, "");
}

#[test]
fn test_clean_run_exit_code() {
    let (status, _, _) = run("var a = 1;");

    assert_eq!(status.exit_code(), 0);
}

#[test]
fn test_session_keeps_globals_between_runs() {
    let mut session = Session::captured("");

    assert_eq!(session.run("var a = 1;"), Status::Ok);
    assert_eq!(session.run("fun add(b) { return a + b; }"), Status::Ok);
    assert_eq!(session.run("printLine(add(2));"), Status::Ok);

    assert_eq!(session.output(), "3\n");
}

#[test]
fn test_session_recovers_after_error_without_reset() {
    let mut session = Session::captured("");

    assert_eq!(session.run("var = ;"), Status::StaticError);
    assert_eq!(session.run("printLine(nope);"), Status::RuntimeError);

    assert_eq!(session.run("printLine(\"still here\");"), Status::Ok);
    assert_eq!(session.output(), "still here\n");
    assert!(session.diagnostics().reports().is_empty());
}

#[test]
fn test_lexical_error_alone_prevents_execution() {
    let (status, output, reports) = run("printLine(1); @");

    assert_eq!(status, Status::StaticError);
    assert_eq!(status.exit_code(), 65);
    assert_eq!(output, "");
    assert_eq!(reports, vec!["[Line 1] Error: Unexpected character."]);
}

#[test]
fn test_read_line_takes_one_line_per_call_across_runs() {
    let mut session = Session::captured("first\nsecond\nthird\n");

    assert_eq!(session.run("var x = readLine();"), Status::Ok);
    assert_eq!(session.run("printLine(readLine());"), Status::Ok);
    assert_eq!(session.run("printLine(x);"), Status::Ok);

    assert_eq!(session.output(), "second\nfirst\n");
}

#[test]
fn test_huge_and_infinite_numbers_display() {
    assert_prints(
        "printLine(1000000 * 1000000 * 1000000 * 1000000);\nvar x = 10;\nfor (var i = 0; i < 400; i = i + 1) x = x * 10;\nprintLine(x);\nprintLine(-x);",
        "1e24\nInfinity\n-Infinity\n",
    );
}
