use anise_core::{run_source, run_source_with_input, run_source_with_options, RunOptions};

#[test]
fn evaluates_arithmetic_at_top_level() {
    assert_eq!(run_source("(+ 1 2 3)").unwrap(), "6\n");
}

#[test]
fn dispatches_factorial_on_literal_and_name() {
    let src = r#"
        (func fact (0) :int 1)
        (func fact (n) :int (* n (fact (- n 1))))
        (print (fact 5))
    "#;
    assert_eq!(run_source(src).unwrap(), "120\n");
}

#[test]
fn memoised_fibonacci_is_fast() {
    let src = r#"
        (func' fib (0) :int 0)
        (func' fib (1) :int 1)
        (func' fib (n) :int (+ (fib (- n 1)) (fib (- n 2))))
        (print (fib 30))
    "#;
    let started = std::time::Instant::now();
    assert_eq!(run_source(src).unwrap(), "832040\n");
    assert!(started.elapsed() < std::time::Duration::from_secs(1));
}

#[test]
fn memoised_bodies_run_once_per_argument_tuple() {
    let src = r#"
        (func' g (n) :any (do (print "run") n))
        (g 5)
        (g 5)
        (print (g 5))
    "#;
    assert_eq!(run_source(src).unwrap(), "run\n5\n");
}

#[test]
fn generator_produces_a_lazy_sequence() {
    let src = r#"
        (set xs (gen (lambda (s) (list (+ s 1) (+ s 1))) 0))
        (print (head (tail (tail xs))))
    "#;
    assert_eq!(run_source(src).unwrap(), "3\n");
}

#[test]
fn lambda_applies_through_a_variable() {
    let src = r#"
        (set f (lambda (x) (* x x)))
        (print (apply f '(7)))
    "#;
    assert_eq!(run_source(src).unwrap(), "49\n");
}

#[test]
fn conditionals_and_short_circuit() {
    let src = r#"(if (and true (< 3 5)) (print "y") (print "n"))"#;
    assert_eq!(run_source(src).unwrap(), "y\n");
}

#[test]
fn tail_recursion_runs_in_bounded_stack() {
    let src = r#"
        (func count (0) :int 0)
        (func count (n) :int (count (- n 1)))
        (print (count 200000))
    "#;
    assert_eq!(run_source(src).unwrap(), "0\n");
}

#[test]
fn tail_positions_inside_if_and_do_are_preserved() {
    let src = r#"
        (func drain (n) :int (if (= n 0) 0 (do (drain (- n 1)))))
        (print (drain 100000))
    "#;
    assert_eq!(run_source(src).unwrap(), "0\n");
}

#[test]
fn first_matching_implementation_wins() {
    let src = r#"
        (func f (x:int) :str "int")
        (func f (x) :str "other")
        (print (f 1))
        (print (f "s"))
    "#;
    assert_eq!(run_source(src).unwrap(), "int\nother\n");

    let reordered = r#"
        (func f (x) :str "other")
        (func f (x:int) :str "int")
        (print (f 1))
    "#;
    assert_eq!(run_source(reordered).unwrap(), "other\n");
}

#[test]
fn repeated_pattern_names_require_equal_values() {
    let src = r#"
        (func same (x x) :bool true)
        (func same (a b) :bool false)
        (print (same 1 1))
        (print (same 1 2))
    "#;
    assert_eq!(run_source(src).unwrap(), "true\nfalse\n");
}

#[test]
fn generic_parameters_bind_and_concretise() {
    let src = r#"
        (func id (x:A) A x)
        (print (id 42))
        (print (id "s"))
    "#;
    assert_eq!(run_source(src).unwrap(), "42\ns\n");
}

#[test]
fn wildcard_pattern_captures_the_whole_tuple() {
    let src = r#"
        (func all args :list args)
        (print (all 1 2 3))
    "#;
    assert_eq!(run_source(src).unwrap(), "'(1 2 3)\n");
}

#[test]
fn implicit_positional_bindings_are_available() {
    let src = r#"
        (func snd rest :any (head (tail __args)))
        (print (snd 7 8))
    "#;
    assert_eq!(run_source(src).unwrap(), "8\n");
}

#[test]
fn scoped_lambda_slots_are_released_per_call() {
    let src = r#"
        (func sqsum (x:int) :int (do (set' sq (lambda (y) (* y y))) (sq x) :int))
        (print (sqsum 3))
        (print (sqsum 4))
    "#;
    assert_eq!(run_source(src).unwrap(), "9\n16\n");
}

#[test]
fn lambdas_capture_by_value() {
    let src = r#"
        (func addn (n:int) :func (do (set f (lambda (x) (+ x n))) f))
        (set add2 (addn 2))
        (print (apply add2 '(40)))
    "#;
    assert_eq!(run_source(src).unwrap(), "42\n");
}

#[test]
fn short_circuit_skips_the_rest() {
    let src = r#"
        (print (or true (print "no")))
        (print (and false (print "no")))
    "#;
    let out = run_source(src).unwrap();
    assert_eq!(out, "true\nfalse\n");
    assert!(!out.contains("no"));
}

#[test]
fn bigmath_switches_integer_precision() {
    let src = r#"
        (use bigmath)
        (print (* 1000000000000 1000000000000))
    "#;
    assert_eq!(run_source(src).unwrap(), "1000000000000000000000000\n");
}

#[test]
fn machine_overflow_suggests_bigmath() {
    let src = "(print (* 1000000000000 1000000000000))";
    let err = run_source(src).unwrap_err();
    assert!(err.to_string().contains("bigmath"));
}

#[test]
fn trailing_type_identifier_ascribes_the_body() {
    let src = r#"
        (func h (x:int) :int (head (list x)) :int)
        (print (h 5))
    "#;
    assert_eq!(run_source(src).unwrap(), "5\n");
}

#[test]
fn return_type_checking_rejects_bad_bodies() {
    let err = run_source(r#"(func bad (n:int) :int "oops") (print (bad 1))"#).unwrap_err();
    assert!(err.to_string().contains("incorrect return value"));
}

#[test]
fn incompatible_if_branches_fail_the_check() {
    let err = run_source(r#"(func bad (n:int) :int (if (< n 1) 1 "s")) (print (bad 1))"#)
        .unwrap_err();
    assert!(err.to_string().contains("if branches"));
}

#[test]
fn runtime_errors_are_reported() {
    assert!(run_source("(boom 1)")
        .unwrap_err()
        .to_string()
        .contains("unknown function"));
    assert!(run_source("(head '())").unwrap_err().to_string().contains("head"));
    assert!(run_source("(if 1 2 3)").unwrap_err().to_string().contains("boolean"));
    assert!(run_source("(/ 1 0)")
        .unwrap_err()
        .to_string()
        .contains("division by zero"));
    assert!(run_source("(f)").is_err());
}

#[test]
fn no_matching_implementation_names_the_function() {
    let src = r#"
        (func f (0) :int 1)
        (print (f "s"))
    "#;
    let err = run_source(src).unwrap_err();
    assert!(err.to_string().contains("no matching implementation"));
    assert!(err.to_string().contains("f"));
}

#[test]
fn stdin_is_a_lazy_character_list() {
    assert_eq!(
        run_source_with_input("(print (head __stdin))", "abc").unwrap(),
        "a\n"
    );
    assert_eq!(
        run_source_with_input("(print (head (tail __stdin)))", "xy").unwrap(),
        "y\n"
    );
    assert_eq!(
        run_source_with_input("(print (empty __stdin))", "").unwrap(),
        "true\n"
    );
}

#[test]
fn scoped_file_handles_close_on_frame_exit() {
    let path = std::env::temp_dir().join(format!("anise-open-{}.txt", std::process::id()));
    std::fs::write(&path, "hello").unwrap();
    let src = format!(
        r#"(set' f (open "{}")) (print (head f))"#,
        path.display()
    );
    assert_eq!(run_source(&src).unwrap(), "h\n");
    std::fs::remove_file(&path).ok();
}

#[test]
fn builtin_library_loads_from_a_directory() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("builtin");
    let src = r#"
        (print (min 3 5))
        (print (max 3 5))
        (print (not= 1 2))
        (print (inc 41))
    "#;
    let out = run_source_with_options(
        src,
        "",
        RunOptions {
            builtin_dir: Some(dir),
            ..RunOptions::default()
        },
    )
    .unwrap();
    assert_eq!(out, "3\n5\ntrue\n42\n");
}
