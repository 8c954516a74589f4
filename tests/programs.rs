use klox::{Lox, LoxError, RuntimeError, SharedBuffer};

struct Run {
    output: String,
    errors: Vec<LoxError>,
    had_error: bool,
    had_runtime_error: bool,
}

fn run_with_input(source: &str, input: &'static str) -> Run {
    let output = SharedBuffer::default();
    let mut lox = Lox::with_io(Box::new(output.clone()), Box::new(input.as_bytes()));
    lox.run_file(source);

    let diagnostics = lox.diagnostics();
    Run {
        output: output.contents(),
        errors: diagnostics.drain(),
        had_error: diagnostics.had_error(),
        had_runtime_error: diagnostics.had_runtime_error(),
    }
}

fn run(source: &str) -> Run {
    run_with_input(source, "")
}

fn output_of(source: &str) -> String {
    let run = run(source);
    assert!(
        run.errors.is_empty(),
        "unexpected errors: {:?}",
        run.errors.iter().map(|e| e.to_string()).collect::<Vec<_>>()
    );
    run.output
}

fn runtime_error_of(source: &str) -> RuntimeError {
    let mut run = run(source);
    assert!(run.had_runtime_error, "expected a runtime error");
    assert!(!run.had_error);
    match run.errors.pop() {
        Some(LoxError::Runtime(e)) => e,
        other => panic!("expected runtime error, got {:?}", other),
    }
}

fn static_errors_of(source: &str) -> Vec<String> {
    let run = run(source);
    assert!(run.had_error, "expected a static error");
    assert_eq!(run.output, "", "nothing may execute after a static error");
    run.errors.iter().map(|e| e.to_string()).collect()
}

// ───────────────────────────── expressions ─────────────────────────────

#[test]
fn arithmetic_and_precedence() {
    assert_eq!(output_of("print(1 + 2 * 3 - 4 / 2);"), "5\n");
    assert_eq!(output_of("print(1 / 2);"), "0.5\n");
    assert_eq!(output_of("print(-(3));"), "-3\n");
    assert_eq!(output_of("print((1 + 2) * 3);"), "9\n");
}

#[test]
fn division_by_zero_is_its_own_error() {
    assert!(matches!(
        runtime_error_of("print(1 / 0);"),
        RuntimeError::DivisionByZero { .. }
    ));
}

#[test]
fn string_concatenation_stringifies_right_operand() {
    assert_eq!(output_of("print(\"foo\" + 1);"), "foo1\n");
    assert_eq!(output_of("print(\"a\" + \"b\");"), "ab\n");
    assert_eq!(output_of("print(\"x\" + nil + true);"), "xniltrue\n");
}

#[test]
fn number_plus_string_is_a_type_error() {
    match runtime_error_of("1 + \"foo\";") {
        RuntimeError::Type { message, .. } => {
            assert_eq!(message, "Operands must be two numbers or strings.")
        }
        other => panic!("expected type error, got {:?}", other),
    }
}

#[test]
fn arithmetic_on_non_numbers_is_a_type_error() {
    match runtime_error_of("\"a\" * 2;") {
        RuntimeError::Type { message, .. } => assert_eq!(message, "Operands must be numbers."),
        other => panic!("expected type error, got {:?}", other),
    }
    assert!(matches!(runtime_error_of("-\"a\";"), RuntimeError::Type { .. }));
    assert!(matches!(runtime_error_of("nil < 1;"), RuntimeError::Type { .. }));
}

#[test]
fn equality_never_coerces() {
    assert_eq!(
        output_of("print(nil == nil); print(nil == false); print(0 == false); print(\"1\" == 1);"),
        "true\nfalse\nfalse\nfalse\n"
    );
    assert_eq!(output_of("print(1 != 2); print(\"a\" == \"a\");"), "true\ntrue\n");
}

#[test]
fn logical_operators_short_circuit_and_return_operands() {
    let source = r#"
        var calls = 0;
        fun side() { calls = calls + 1; return true; }
        print(false and side());
        print(true or side());
        print(calls);
        print(nil or "default");
        print(1 and 2);
    "#;
    assert_eq!(output_of(source), "false\ntrue\n0\ndefault\n2\n");
}

#[test]
fn conditional_evaluates_exactly_one_branch() {
    let source = r#"
        var hits = "";
        fun a() { hits = hits + "a"; return 1; }
        fun b() { hits = hits + "b"; return 2; }
        print(true ? a() : b());
        print(nil ? a() : b());
        print(hits);
    "#;
    assert_eq!(output_of(source), "1\n2\nab\n");
}

#[test]
fn comma_operator_returns_right_operand() {
    assert_eq!(output_of("var x = (print(1), 2); print(x);"), "1\n2\n");
}

#[test]
fn compound_assignment() {
    assert_eq!(
        output_of("var x = 10; x += 5; x -= 3; x *= 2; x /= 4; print(x);"),
        "6\n"
    );
    assert_eq!(output_of("var s = \"a\"; s += \"b\"; print(s);"), "ab\n");
}

// ───────────────────────────── variables & scope ─────────────────────────────

#[test]
fn undefined_variable_at_any_depth() {
    assert!(matches!(
        runtime_error_of("print(missing);"),
        RuntimeError::UndefinedVariable { .. }
    ));
    assert!(matches!(
        runtime_error_of("{ { missing = 1; } }"),
        RuntimeError::UndefinedVariable { .. }
    ));
    assert!(matches!(
        runtime_error_of("fun f() { return missing; } f();"),
        RuntimeError::UndefinedVariable { .. }
    ));
}

#[test]
fn blocks_shadow_and_restore() {
    let source = r#"
        var a = "global";
        {
            var a = "outer";
            {
                var a = "inner";
                print(a);
            }
            print(a);
        }
        print(a);
    "#;
    assert_eq!(output_of(source), "inner\nouter\nglobal\n");
}

#[test]
fn closure_binding_is_static() {
    // `show` keeps seeing the global `a` even after a shadowing local appears
    let source = r#"
        var a = "global";
        {
            fun show() { print(a); }
            show();
            var a = "block";
            show();
        }
    "#;
    assert_eq!(output_of(source), "global\nglobal\n");
}

#[test]
fn uninitialized_variable_is_nil() {
    assert_eq!(output_of("var x; print(x);"), "nil\n");
}

// ───────────────────────────── functions ─────────────────────────────

#[test]
fn closures_keep_their_environment_alive() {
    let source = r#"
        fun make() {
            var i = 0;
            fun inc() { i = i + 1; return i; }
            return inc;
        }
        var c = make();
        c();
        print(c());
    "#;
    assert_eq!(output_of(source), "2\n");
}

#[test]
fn independent_closures_do_not_share_state() {
    let source = r#"
        fun counter() { var n = 0; return fun () { n = n + 1; return n; }; }
        var a = counter();
        var b = counter();
        a(); a();
        print(a());
        print(b());
    "#;
    assert_eq!(output_of(source), "3\n1\n");
}

#[test]
fn recursion() {
    let source = r#"
        fun fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); }
        print(fib(15));
    "#;
    assert_eq!(output_of(source), "610\n");
}

#[test]
fn function_without_return_yields_nil() {
    assert_eq!(output_of("fun f() {} print(f());"), "nil\n");
    assert_eq!(output_of("fun g() { return; } print(g());"), "nil\n");
}

#[test]
fn return_unwinds_out_of_nested_loops() {
    let source = r#"
        fun find() {
            for (var i = 0; i < 10; i = i + 1) {
                while (true) {
                    if (i == 3) return i;
                    break;
                }
            }
            return -1;
        }
        print(find());
    "#;
    assert_eq!(output_of(source), "3\n");
}

#[test]
fn arity_mismatch() {
    match runtime_error_of("fun f(a, b) {} f(1);") {
        RuntimeError::Arity { expected, got, .. } => assert_eq!((expected, got), (2, 1)),
        other => panic!("expected arity error, got {:?}", other),
    }
    assert!(matches!(
        runtime_error_of("clock(1);"),
        RuntimeError::Arity { .. }
    ));
}

#[test]
fn calling_a_non_callable() {
    match runtime_error_of("\"str\"();") {
        RuntimeError::Type { message, .. } => {
            assert_eq!(message, "Can only call functions and classes.")
        }
        other => panic!("expected type error, got {:?}", other),
    }
}

#[test]
fn display_forms() {
    let source = r#"
        fun named() {}
        class Point {}
        print(named);
        print(fun () {});
        print(clock);
        print(Point);
        print(Point());
    "#;
    assert_eq!(
        output_of(source),
        "<fun named>\n<fun>\n<native fn clock>\n<class Point>\n<Point instance>\n"
    );
}

// ───────────────────────────── classes ─────────────────────────────

#[test]
fn initializer_and_methods() {
    let source = r#"
        class Pair {
            init(a, b) { this.a = a; this.b = b; }
            sum() { return this.a + this.b; }
        }
        var p = Pair(2, 3);
        print(p.sum());
    "#;
    assert_eq!(output_of(source), "5\n");
}

#[test]
fn initializer_always_returns_the_instance() {
    let source = r#"
        class Foo {
            init() { this.x = 1; return; }
        }
        var foo = Foo();
        var again = foo.init();
        print(again == foo);
        print(again.x);
    "#;
    assert_eq!(output_of(source), "true\n1\n");
}

#[test]
fn fields_shadow_methods() {
    let source = r#"
        class A { m() { return "method"; } }
        var a = A();
        print(a.m());
        a.m = fun () { return "field"; };
        print(a.m());
        print(A().m());
    "#;
    assert_eq!(output_of(source), "method\nfield\nmethod\n");
}

#[test]
fn bound_methods_remember_their_instance() {
    let source = r#"
        class Box { init(v) { this.v = v; } get() { return this.v; } }
        var g = Box("kept").get;
        print(g());
    "#;
    assert_eq!(output_of(source), "kept\n");
}

#[test]
fn super_dispatches_to_the_superclass() {
    let source = r#"
        class A {
            name() { return "A"; }
            greet() { return "hello from " + this.name(); }
        }
        class B < A {
            name() { return "B"; }
            greet() { return super.greet() + " via " + super.name(); }
        }
        print(B().greet());
    "#;
    assert_eq!(output_of(source), "hello from B via A\n");
}

#[test]
fn inherited_initializer() {
    let source = r#"
        class Base { init(x) { this.x = x; } }
        class Derived < Base {}
        print(Derived(7).x);
    "#;
    assert_eq!(output_of(source), "7\n");
}

#[test]
fn class_can_refer_to_itself() {
    let source = r#"
        class Node {
            make() { return Node(); }
        }
        print(Node().make());
    "#;
    assert_eq!(output_of(source), "<Node instance>\n");
}

#[test]
fn property_errors() {
    assert!(matches!(
        runtime_error_of("class A {} A().missing;"),
        RuntimeError::UndefinedProperty { .. }
    ));
    match runtime_error_of("var x = 1; x.y;") {
        RuntimeError::Type { message, .. } => assert_eq!(message, "Only instances have properties."),
        other => panic!("expected type error, got {:?}", other),
    }
    match runtime_error_of("var x = 1; x.y = 2;") {
        RuntimeError::Type { message, .. } => assert_eq!(message, "Only instances have fields."),
        other => panic!("expected type error, got {:?}", other),
    }
}

#[test]
fn superclass_must_be_a_class() {
    match runtime_error_of("var NotClass = 1; class A < NotClass {}") {
        RuntimeError::Type { message, .. } => assert_eq!(message, "Superclass must be a class."),
        other => panic!("expected type error, got {:?}", other),
    }
}

// ───────────────────────────── control flow ─────────────────────────────

#[test]
fn continue_still_runs_the_increment() {
    let source = "for (var i = 0; i < 3; i = i + 1) { if (i == 1) continue; print(i); }";
    assert_eq!(output_of(source), "0\n2\n");
}

#[test]
fn break_only_leaves_the_innermost_loop() {
    let source = r#"
        var outer = 0;
        while (outer < 3) {
            var inner = 0;
            while (true) {
                if (inner == 2) { break; }
                inner = inner + 1;
            }
            print(outer + inner);
            outer = outer + 1;
        }
    "#;
    assert_eq!(output_of(source), "2\n3\n4\n");
}

#[test]
fn while_with_continue() {
    let source = r#"
        var i = 0;
        while (i < 5) {
            i = i + 1;
            if (i == 2 or i == 4) continue;
            print(i);
        }
    "#;
    assert_eq!(output_of(source), "1\n3\n5\n");
}

#[test]
fn if_executes_exactly_one_branch() {
    assert_eq!(
        output_of("if (0) print(\"zero is truthy\"); else print(\"no\");"),
        "zero is truthy\n"
    );
    assert_eq!(output_of("if (nil) print(1); else print(2);"), "2\n");
    assert_eq!(output_of("if (false) print(1);"), "");
}

// ───────────────────────────── static errors ─────────────────────────────

#[test]
fn break_outside_loop_never_runs() {
    let errors = static_errors_of("print(1); break;");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("'break' can only be used inside loops."));
}

#[test]
fn loop_does_not_leak_into_nested_function() {
    let errors = static_errors_of("while (true) { fun f() { continue; } }");
    assert_eq!(errors.len(), 1);
}

#[test]
fn all_static_errors_surface_in_one_run() {
    let errors = static_errors_of("return 1;\nthis;\n{ var a = 1; var a = 2; }");
    assert_eq!(errors.len(), 3, "{:?}", errors);
}

#[test]
fn parse_errors_are_positioned() {
    let errors = static_errors_of("var = 1;");
    assert_eq!(errors, vec!["[1:5] Error at '=': Expected variable name."]);
}

// ───────────────────────────── natives ─────────────────────────────

#[test]
fn read_consumes_input_lines() {
    let run = run_with_input(
        "var a = read(); var b = read(); print(a + \"/\" + b); print(read());",
        "first\nsecond\n",
    );
    assert!(run.errors.is_empty());
    assert_eq!(run.output, "first/second\nnil\n");
}

#[test]
fn conversion_natives() {
    let source = r#"
        print(tonumber("12") + 1);
        print(tonumber("x"));
        print(tostring(3) + "!");
        print(type(nil));
        print(type(1));
        print(type("s"));
        print(type(true));
        print(type(clock));
        print(type(fun () {}));
        class K {}
        print(type(K));
        print(type(K()));
    "#;
    assert_eq!(
        output_of(source),
        "13\nnil\n3!\nnil\nnumber\nstring\nbool\nfunction\nfunction\nclass\ninstance\n"
    );
}

#[test]
fn sleep_with_bad_argument_is_a_runtime_error() {
    assert!(matches!(
        runtime_error_of("sleep(\"soon\");"),
        RuntimeError::Native { .. }
    ));
}
