use anise_core::run_source;

#[test]
fn arithmetic_is_variadic() {
    assert_eq!(run_source("(print (+ 1 2 3 4))").unwrap(), "10\n");
    assert_eq!(run_source("(print (+))").unwrap(), "0\n");
    assert_eq!(run_source("(print (- 10 1 2))").unwrap(), "7\n");
    assert_eq!(run_source("(print (- 5))").unwrap(), "5\n");
    assert_eq!(run_source("(print (* 2 3 4))").unwrap(), "24\n");
    assert_eq!(run_source("(print (*))").unwrap(), "1\n");
    assert_eq!(run_source("(print (/ 20 2 2))").unwrap(), "5\n");
    assert_eq!(run_source("(print (mod 7 3))").unwrap(), "1\n");
}

#[test]
fn arithmetic_rejects_non_integers() {
    assert!(run_source(r#"(print (+ 1 "2"))"#).is_err());
    assert!(run_source(r#"(print (mod 1))"#).is_err());
}

#[test]
fn comparisons_take_two_integers() {
    assert_eq!(run_source("(print (< 1 2))").unwrap(), "true\n");
    assert_eq!(run_source("(print (<= 2 2))").unwrap(), "true\n");
    assert_eq!(run_source("(print (> 1 2))").unwrap(), "false\n");
    assert_eq!(run_source("(print (>= 1 2))").unwrap(), "false\n");
    assert!(run_source("(print (< 1 2 3))").is_err());
    assert!(run_source(r#"(print (< 1 "2"))"#).is_err());
}

#[test]
fn equality_is_structural() {
    assert_eq!(run_source("(print (= 1 1))").unwrap(), "true\n");
    assert_eq!(run_source(r#"(print (= "a" "a"))"#).unwrap(), "true\n");
    assert_eq!(run_source(r#"(print (= 1 "1"))"#).unwrap(), "false\n");
    assert_eq!(run_source("(print (= '(1 2) '(1 2)))").unwrap(), "true\n");
    assert_eq!(run_source(r#"(print (= '() ""))"#).unwrap(), "true\n");
    assert_eq!(run_source("(print (not (= 1 2)))").unwrap(), "true\n");
}

#[test]
fn list_operations() {
    assert_eq!(run_source("(print (list 1 2 3))").unwrap(), "'(1 2 3)\n");
    assert_eq!(run_source("(print (head '(1 2)))").unwrap(), "1\n");
    assert_eq!(run_source("(print (tail '(1 2)))").unwrap(), "'(2)\n");
    assert_eq!(run_source("(print (empty '()))").unwrap(), "true\n");
    assert_eq!(run_source("(print (empty '(1)))").unwrap(), "false\n");
    assert_eq!(run_source("(print (length '(1 2 3)))").unwrap(), "3\n");
    assert_eq!(
        run_source("(print (append '(1) 2 3))").unwrap(),
        "'(1 2 3)\n"
    );
}

#[test]
fn nth_is_one_based_and_bounded() {
    assert_eq!(run_source("(print (nth 1 '(10 20)))").unwrap(), "10\n");
    assert_eq!(run_source("(print (nth 2 '(10 20)))").unwrap(), "20\n");
    assert!(run_source("(print (nth 0 '(10 20)))").is_err());
    assert!(run_source("(print (nth 3 '(10 20)))").is_err());
}

#[test]
fn strings_are_character_lists() {
    assert_eq!(run_source(r#"(print (head "abc"))"#).unwrap(), "a\n");
    assert_eq!(run_source(r#"(print (tail "abc"))"#).unwrap(), "bc\n");
    assert_eq!(run_source(r#"(print (empty ""))"#).unwrap(), "true\n");
    assert_eq!(run_source(r#"(print (length "abc"))"#).unwrap(), "3\n");
    assert_eq!(run_source(r#"(print (nth 2 "abc"))"#).unwrap(), "b\n");
    assert!(run_source(r#"(print (head ""))"#).is_err());
}

#[test]
fn append_concatenates_strings() {
    assert_eq!(
        run_source(r#"(print (append "ab" "cd" "e"))"#).unwrap(),
        "abcde\n"
    );
    assert_eq!(run_source(r#"(print (append "" "xy"))"#).unwrap(), "xy\n");
    assert!(run_source(r#"(print (append "ab" 1))"#).is_err());
}

#[test]
fn int_parses_strings() {
    assert_eq!(run_source(r#"(print (int "42"))"#).unwrap(), "42\n");
    assert_eq!(run_source(r#"(print (int "-7"))"#).unwrap(), "-7\n");
    assert!(run_source(r#"(print (int "x"))"#).is_err());
    assert!(run_source(r#"(print (int 42))"#).is_err());
}

#[test]
fn space_and_eol_classify_characters() {
    assert_eq!(run_source(r#"(print (space " "))"#).unwrap(), "true\n");
    assert_eq!(run_source("(print (space \"\t\"))").unwrap(), "true\n");
    assert_eq!(run_source(r#"(print (space "x"))"#).unwrap(), "false\n");
    assert_eq!(run_source(r#"(print (space ""))"#).unwrap(), "false\n");
    assert_eq!(run_source("(print (eol \"\n\"))").unwrap(), "true\n");
    assert_eq!(run_source(r#"(print (eol " "))"#).unwrap(), "false\n");
}

#[test]
fn print_joins_arguments_with_spaces() {
    assert_eq!(run_source(r#"(print 1 "a" true '(2))"#).unwrap(), "1 a true '(2)\n");
    assert_eq!(run_source("(print)").unwrap(), "\n");
}

#[test]
fn not_requires_a_boolean() {
    assert_eq!(run_source("(print (not true))").unwrap(), "false\n");
    assert!(run_source("(print (not 1))").is_err());
}
