//! End-to-end language tests: parse then evaluate complete programs.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rill::interp::{Environment, Interpreter, Value};
use rill::parser::parse;

fn run(source: &str) -> Value {
    let program = parse(source).expect("program should parse");
    let env = Environment::new().into_ref();
    Interpreter::new().eval_program(&program, &env)
}

fn run_error(source: &str) -> String {
    match run(source) {
        Value::Error { message } => message,
        other => panic!("expected error, got {other}"),
    }
}

fn parse_errors(source: &str) -> Vec<String> {
    match parse(source) {
        Ok(program) => panic!("expected parse errors, got {program}"),
        Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
    }
}

#[derive(Clone, Default)]
struct Sink(Rc<RefCell<Vec<u8>>>);

impl Sink {
    fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).expect("output should be utf-8")
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// Core scenarios

#[test]
fn let_bindings_compose() {
    assert_eq!(run("let a = 5; let b = a * 2; let c = a + b; c;"), Value::Int(15));
}

#[test]
fn closures_capture_their_environment() {
    let source = "let newAdder = func(x) { return func(y) { return x + y; }; };\n\
                  let addTwo = newAdder(2);\n\
                  addTwo(3);";
    assert_eq!(run(source), Value::Int(5));
}

#[test]
fn while_loop_with_break() {
    let source = "let i = 0;\n\
                  while (true) {\n\
                    i = i + 1;\n\
                    if (i == 4) { break; }\n\
                  }\n\
                  i;";
    assert_eq!(run(source), Value::Int(4));
}

#[test]
fn for_loop_with_continue() {
    let source = "let x = 0;\n\
                  for (let i = 0; i < 4; i = i + 1) {\n\
                    if (i != 3) { continue; }\n\
                    x = i;\n\
                  }\n\
                  x;";
    assert_eq!(run(source), Value::Int(3));
}

#[test]
fn chained_push_observes_the_mutation() {
    assert_eq!(run("[1, 2, 3].push(4).length();"), Value::Int(4));
}

#[test]
fn split_on_spaces() {
    let result = run("\"hello world\".split(\" \");");
    assert_eq!(
        result,
        Value::array(vec![Value::string("hello"), Value::string("world")])
    );
    assert_eq!(result.to_string(), "[\"hello\", \"world\"]");
}

#[test]
fn missing_hash_key_is_null() {
    assert_eq!(run("{\"foo\": 5}[\"bar\"];"), Value::Null);
}

#[test]
fn type_mismatch_carries_position() {
    assert_eq!(run_error("5 + true;"), "[1:4] type mismatch: INTEGER + BOOLEAN");
}

#[test]
fn const_reassignment_is_rejected_at_parse_time() {
    assert_eq!(
        parse_errors("const NAME = \"YOU\";\nNAME = \"ME\";"),
        vec!["[2:7] can not reassign constant NAME.".to_string()]
    );
}

#[test]
fn negative_indices_count_from_the_end() {
    assert_eq!(run("[1, 2, 3, 4, 5, 6][-1];"), Value::Int(6));
    assert_eq!(run("[1, 2, 3][-3];"), Value::Int(1));
}

// Builtins

#[test]
fn len_counts_characters() {
    assert_eq!(run("len(\"hello\");"), Value::Int(5));
    assert_eq!(run("len([1, 2, 3]);"), Value::Int(3));
    assert!(run_error("len(5);").ends_with("argument to `len` not supported, got INTEGER"));
    assert!(run_error("len();").ends_with("wrong number of arguments. got=0, want=1"));
}

#[test]
fn first_last_rest() {
    assert_eq!(run("first([1, 2, 3]);"), Value::Int(1));
    assert_eq!(run("last([1, 2, 3]);"), Value::Int(3));
    assert_eq!(run("first([]);"), Value::Null);
    assert_eq!(run("rest([1, 2, 3]);"), Value::array(vec![Value::Int(2), Value::Int(3)]));
    assert_eq!(run("rest([]);"), Value::Null);
}

#[test]
fn global_push_and_pop_do_not_mutate() {
    let source = "let a = [1, 2]; let b = push(a, 3); len(a);";
    assert_eq!(run(source), Value::Int(2));
    assert_eq!(run("push([1], 2);"), Value::array(vec![Value::Int(1), Value::Int(2)]));
    assert_eq!(run("let a = [1, 2]; pop(a); len(a);"), Value::Int(2));
    assert_eq!(run("pop([1, 2]);"), Value::array(vec![Value::Int(1)]));
    assert_eq!(run("pop([]);"), Value::Null);
}

#[test]
fn map_filter_reduce_globals() {
    assert_eq!(
        run("map([1, 2, 3], func(x) { return x * 2; });"),
        Value::array(vec![Value::Int(2), Value::Int(4), Value::Int(6)])
    );
    assert_eq!(
        run("filter([1, 2, 3, 4], func(x) { return x % 2; });"),
        Value::array(vec![Value::Int(1), Value::Int(3)])
    );
    assert_eq!(
        run("reduce([1, 2, 3, 4], 0, func(acc, x) { return acc + x; });"),
        Value::Int(10)
    );
}

#[test]
fn chaining_map_filter_reduce() {
    assert_eq!(
        run("[1, 2, 3].map(func(x) { return x + 1; });"),
        Value::array(vec![Value::Int(2), Value::Int(3), Value::Int(4)])
    );
    assert_eq!(
        run("[1, 2, 3, 4].filter(func(x) { return x > 2; }).length();"),
        Value::Int(2)
    );
    assert_eq!(
        run("[1, 2, 3].reduce(func(acc, x) { return acc * x; }, 1);"),
        Value::Int(6)
    );
}

#[test]
fn callbacks_may_take_index_and_array() {
    assert_eq!(
        run("[10, 20].map(func(x, i) { return x + i; });"),
        Value::array(vec![Value::Int(10), Value::Int(21)])
    );
    assert_eq!(
        run("[1, 2].map(func(x, i, arr) { return arr.length(); });"),
        Value::array(vec![Value::Int(2), Value::Int(2)])
    );
}

#[test]
fn filter_rejects_uncoercible_predicates() {
    assert!(run_error("[1].filter(func(x) { return func() { return 1; }; });")
        .ends_with("cannot convert FUNCTION to BOOLEAN"));
}

#[test]
fn chained_pop() {
    assert_eq!(run("[1, 2, 3].pop();"), Value::Int(3));
    assert_eq!(run("let a = [1, 2, 3]; a.pop(0); a.length();"), Value::Int(2));
    assert_eq!(run("let a = [1, 2, 3]; a.pop(0);"), Value::Int(1));
    assert!(run_error("[].pop();").ends_with("pop from empty array"));
    assert!(run_error("[1].pop(5);").ends_with("pop index out of range: 5"));
}

#[test]
fn string_methods() {
    assert_eq!(run("\"hello\".length();"), Value::Int(5));
    assert_eq!(run("\"hello\".upper();"), Value::string("HELLO"));
    assert_eq!(run("\"HeLLo\".lower();"), Value::string("hello"));
    assert_eq!(
        run("\"abc\".split(\"\");"),
        Value::array(vec![
            Value::string("a"),
            Value::string("b"),
            Value::string("c")
        ])
    );
    assert_eq!(
        run("\"a,b\".split(\",\");"),
        Value::array(vec![Value::string("a"), Value::string("b")])
    );
}

#[test]
fn chaining_errors() {
    assert!(run_error("(5).foo();").ends_with("chaining operator not supported: INTEGER.foo"));
    assert!(run_error("true.foo();").ends_with("chaining operator not supported: BOOLEAN.foo"));
    assert!(run_error("[1].foo();").ends_with("ARRAY has no method foo"));
    assert!(run_error("\"s\".foo();").ends_with("STRING has no method foo"));
    assert!(run_error("[1].length;").ends_with("chaining operator not supported: ARRAY.length"));
}

#[test]
fn math_builtins() {
    assert_eq!(run("pow(2, 10);"), Value::Int(1024));
    assert_eq!(run("pow(2, -1);"), Value::Float(0.5));
    assert_eq!(run("pow(2.0, 2);"), Value::Float(4.0));
    assert_eq!(run("sqrt(16);"), Value::Float(4.0));
    assert!(run_error("sqrt(-1);").ends_with("sqrt of negative number"));
    assert_eq!(run("abs(-3);"), Value::Int(3));
    assert_eq!(run("abs(-2.5);"), Value::Float(2.5));
}

#[test]
fn type_and_conversions() {
    assert_eq!(run("type(1);"), Value::string("INTEGER"));
    assert_eq!(run("type(null);"), Value::string("NULL"));
    assert_eq!(run("int(\"42\");"), Value::Int(42));
    assert_eq!(run("int(3.9);"), Value::Int(3));
    assert_eq!(run("int(true);"), Value::Int(1));
    assert!(run_error("int(\"abc\");").ends_with("cannot convert STRING to INTEGER"));
    assert_eq!(run("float(\"2.5\");"), Value::Float(2.5));
    assert_eq!(run("float(2);"), Value::Float(2.0));
    assert_eq!(run("string(42);"), Value::string("42"));
    assert_eq!(run("string(null);"), Value::string("null"));
    assert_eq!(run("bool(0);"), Value::Bool(false));
    assert_eq!(run("bool(\"\");"), Value::Bool(false));
    assert_eq!(run("bool([1]);"), Value::Bool(true));
    assert_eq!(run("bool(null);"), Value::Bool(false));
}

#[test]
fn range_builtin() {
    assert_eq!(
        run("range(3);"),
        Value::array(vec![Value::Int(0), Value::Int(1), Value::Int(2)])
    );
    assert_eq!(
        run("range(2, 5);"),
        Value::array(vec![Value::Int(2), Value::Int(3), Value::Int(4)])
    );
    assert_eq!(
        run("range(3, 0);"),
        Value::array(vec![Value::Int(3), Value::Int(2), Value::Int(1)])
    );
    assert_eq!(run("range(0);"), Value::array(vec![]));
}

#[test]
fn print_goes_to_the_configured_sink() {
    let sink = Sink::default();
    let mut interp = Interpreter::with_output(Box::new(sink.clone()));
    let env = Environment::new().into_ref();
    let program = parse("print(1 + 2); print(\"hi\", [1, \"a\"]);").unwrap();
    let result = interp.eval_program(&program, &env);
    assert_eq!(result, Value::Null);
    assert_eq!(sink.contents(), "3\nhi\n[1, \"a\"]\n");
}

#[test]
fn rendering_a_cyclic_array_stays_bounded() {
    match run("let a = [1]; a.push(a); string(a);") {
        Value::Str(s) => {
            assert!(s.starts_with("[1, "), "{s}");
            assert!(s.contains("[...]"), "{s}");
        }
        other => panic!("expected string, got {}", other.type_name()),
    }
    match run("let a = [1]; a.push(a); string({\"a\": a});") {
        Value::Str(s) => assert!(s.contains("[...]"), "{s}"),
        other => panic!("expected string, got {}", other.type_name()),
    }
}

// Language odds and ends

#[test]
fn shadowing_in_blocks() {
    let source = "let x = 1; if (true) { let x = 2; } x;";
    assert_eq!(run(source), Value::Int(1));
}

#[test]
fn loops_yield_null() {
    assert_eq!(run("while (false) { 1; }"), Value::Null);
    assert_eq!(run("for (;false;) { 1; }"), Value::Null);
}

#[test]
fn top_level_return_stops_the_program() {
    assert_eq!(run("return 42; 0;"), Value::Int(42));
}

#[test]
fn counter_closure_keeps_state() {
    let source = "let makeCounter = func() {\n\
                    let n = 0;\n\
                    return func() { n = n + 1; return n; };\n\
                  };\n\
                  let tick = makeCounter();\n\
                  tick(); tick(); tick();";
    assert_eq!(run(source), Value::Int(3));
}

#[test]
fn evaluation_is_deterministic() {
    let source = "let acc = [];\n\
                  for (let i = 0; i < 5; i = i + 1) { acc.push(i * i); }\n\
                  acc;";
    assert_eq!(run(source).to_string(), run(source).to_string());
    assert_eq!(run(source).to_string(), "[0, 1, 4, 9, 16]");
}

#[test]
fn printed_programs_reparse_identically() {
    let sources = [
        "let a = 5; let b = a * 2; a + b;",
        "func f(x) { if (x > 0) { return x; } else { return -x; } } f(-3);",
        "[1, 2, 3].map(func(x) { return x * x; });",
        "for (let i = 0; i < 3; ++i) { print(i); }",
    ];
    for source in sources {
        let once = parse(source).unwrap().to_string();
        let twice = parse(&once).unwrap().to_string();
        assert_eq!(once, twice, "source: {source}");
    }
}
