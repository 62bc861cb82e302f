//! 端到端执行测试

use std::rc::Rc;

use super::*;
use crate::config::RuntimeConfig;
use crate::error::{AspError, RuntimeErrorKind};

fn runtime_with(config: RuntimeConfig) -> (AspRuntime, OutputRecorder) {
    let mut runtime = AspRuntime::new(config);
    let output = OutputRecorder::new();
    runtime.register_response(output.sink());
    (runtime, output)
}

fn run_with(config: RuntimeConfig, text: &str) -> Result<OutputRecorder, AspError> {
    let (mut runtime, output) = runtime_with(config);
    runtime.run(&Script::parse("test", text)?)?;
    Ok(output)
}

fn run(text: &str) -> OutputRecorder {
    run_with(RuntimeConfig::default(), text).unwrap()
}

fn run_error(config: RuntimeConfig, text: &str) -> RuntimeErrorKind {
    match run_with(config, text) {
        Err(AspError::Runtime(error)) => error.kind,
        other => panic!("应为运行时错误，得到 {:?}", other.map(|o| o.text())),
    }
}

// -------------------------------------------------------------------------
// 基本场景
// -------------------------------------------------------------------------

#[test]
fn test_big_small() {
    let output = run(
        "dim x\nx = 3\nif x > 2 then\n response.write \"big\"\nelse\n response.write \"small\"\nend if\n",
    );
    assert_eq!(output.writes(), vec![Value::from("big")]);
}

#[test]
fn test_function_return_value() {
    let output = run("function add(a, b)\n    add = a + b\nend function\nresponse.write add(2, 3)\n");
    assert_eq!(output.writes(), vec![Value::from(5)]);
}

#[test]
fn test_forward_call_through_hoisting() {
    let output = run(
        "response.write greet(\"bob\")\nfunction greet(name)\n    greet = \"hi \" & name\nend function\n",
    );
    assert_eq!(output.text(), "hi bob");
}

#[test]
fn test_names_are_case_insensitive() {
    let output = run("DIM Total\ntotal = 5\nResponse.Write TOTAL\n");
    assert_eq!(output.text(), "5");
}

#[test]
fn test_elseif_chain() {
    let script = "function grade(n)\n    if n >= 90 then\n        grade = \"A\"\n    elseif n >= 60 then\n        grade = \"B\"\n    else\n        grade = \"C\"\n    end if\nend function\nresponse.write grade(95) & grade(70) & grade(10)\n";
    assert_eq!(run(script).text(), "ABC");
}

// -------------------------------------------------------------------------
// 参数传递
// -------------------------------------------------------------------------

#[test]
fn test_byref_and_byval() {
    let output = run(
        "sub bump(byref n)\n    n = n + 1\nend sub\nsub keep(byval n)\n    n = n + 1\nend sub\nx = 1\nbump x\nkeep x\nresponse.write x\n",
    );
    assert_eq!(output.text(), "2");
}

#[test]
fn test_byref_through_member_target() {
    let output = run(
        "class Box\n    public value\nend class\nsub bump(byref n)\n    n = n + 1\nend sub\nset b = new Box\nb.value = 1\nbump b.value\nbump (b.value)\nresponse.write b.value\n",
    );
    assert_eq!(output.text(), "2");
}

#[test]
fn test_nested_function_named_like_byref_parameter() {
    let output = run(
        "sub outer(byref n)\n    function n\n        n = 0\n    end function\nend sub\nx = 5\nouter x\nresponse.write x\n",
    );
    assert_eq!(output.text(), "5");
}

#[test]
fn test_parentheses_force_by_value() {
    let output = run("sub bump(n)\n    n = n + 1\nend sub\nx = 1\nbump (x)\nresponse.write x\n");
    assert_eq!(output.text(), "1");
}

#[test]
fn test_default_parameter_mode_follows_config() {
    let script = "sub bump(n)\n    n = n + 1\nend sub\nx = 1\nbump x\nresponse.write x\n";
    assert_eq!(run(script).text(), "2");

    let config = RuntimeConfig {
        default_by_ref: false,
        ..RuntimeConfig::default()
    };
    assert_eq!(run_with(config, script).unwrap().text(), "1");
}

#[test]
fn test_property_let_through_call_target() {
    let output = run(
        "sub store(index, value)\n    response.write index & \"=\" & value\nend sub\nstore(1) = 2\n",
    );
    assert_eq!(output.text(), "1=2");
}

// -------------------------------------------------------------------------
// 函数
// -------------------------------------------------------------------------

#[test]
fn test_recursion() {
    let output = run(
        "function fact(n)\n    if n <= 1 then\n        fact = 1\n    else\n        fact = n * fact(n - 1)\n    end if\nend function\nresponse.write fact(10)\n",
    );
    assert_eq!(output.writes(), vec![Value::from(3628800)]);
}

#[test]
fn test_exit_function() {
    let output = run(
        "function first(a)\n    first = \"early\"\n    if a then\n        exit function\n    end if\n    first = \"late\"\nend function\nresponse.write first(true)\nresponse.write first(false)\n",
    );
    assert_eq!(output.writes(), vec![Value::from("early"), Value::from("late")]);
}

#[test]
fn test_top_level_exit_stops_run() {
    let output = run("response.write \"a\" : exit sub : response.write \"b\"\n");
    assert_eq!(output.text(), "a");
}

#[test]
fn test_nested_function_closes_over_activation() {
    let output = run(
        "function outer(x)\n    function inner\n        inner = x * 2\n    end function\n    outer = inner + 1\nend function\nresponse.write outer(20)\n",
    );
    assert_eq!(output.text(), "41");
}

#[test]
fn test_method_outliving_its_activation() {
    let script = "\
function make
    dim secret
    secret = 7
    class Box
        function peek
            peek = secret
        end function
    end class
    set make = new Box
end function
set b = make
response.write b.peek
";
    let error = run_with(RuntimeConfig::default(), script).unwrap_err();
    assert_eq!(error.location().line, 6);
    assert!(matches!(
        error,
        AspError::Runtime(ref e) if e.kind == RuntimeErrorKind::ScopeDropped
    ));
}

#[test]
fn test_call_statement() {
    let output = run("sub hello(name)\n    response.write \"hello \" & name\nend sub\ncall hello(\"world\")\n");
    assert_eq!(output.text(), "hello world");
}

// -------------------------------------------------------------------------
// 类
// -------------------------------------------------------------------------

const COUNTER: &str = "class Counter
    dim count
    sub class_initialize
        count = 10
    end sub
    function next_value
        count = count + 1
        next_value = count
    end function
    function self
        set self = me
    end function
end class
set c = new Counter
";

#[test]
fn test_class_fields_and_methods() {
    let script = format!("{COUNTER}response.write c.next_value\nresponse.write c.next_value\nresponse.write c.count\n");
    assert_eq!(
        run(&script).writes(),
        vec![Value::from(11), Value::from(12), Value::from(12)]
    );
}

#[test]
fn test_me_refers_to_instance() {
    let script = format!("{COUNTER}set d = new Counter\nresponse.write c.self is c\nresponse.write d.self is c\n");
    assert_eq!(run(&script).text(), "TrueFalse");
}

#[test]
fn test_instance_field_assignment() {
    let script = format!("{COUNTER}c.count = 100\nresponse.write c.next_value\n");
    assert_eq!(run(&script).text(), "101");
}

#[test]
fn test_self_referencing_object() {
    let output = run(
        "class Node\n    dim link\nend class\nset n = new Node\nset n.link = n\nresponse.write n.link.link is n\n",
    );
    assert_eq!(output.text(), "True");
}

#[test]
fn test_unknown_class_and_member() {
    assert_eq!(
        run_error(RuntimeConfig::default(), "set x = new Missing\n"),
        RuntimeErrorKind::UnknownClass {
            name: "Missing".to_string()
        }
    );
    assert_eq!(
        run_error(
            RuntimeConfig::default(),
            "class Empty\nend class\nset e = new Empty\ne.nothing = 1\n"
        ),
        RuntimeErrorKind::UnknownMember {
            member: "nothing".to_string()
        }
    );
}

// -------------------------------------------------------------------------
// 模板与宿主
// -------------------------------------------------------------------------

#[test]
fn test_template_output() {
    let (mut runtime, output) = runtime_with(RuntimeConfig::default());
    let script = Script::parse_template(
        "page.asp",
        "<ul><% dim i : i = 2 %><li><%= i * 21 %></li><% if i > 5 then %>many<% end if %></ul>",
    )
    .unwrap();
    runtime.run(&script).unwrap();
    assert_eq!(output.text(), "<ul><li>42</li></ul>");
    assert_eq!(script.name(), "page.asp");
}

#[test]
fn test_native_function_and_host_object() {
    let (mut runtime, output) = runtime_with(RuntimeConfig::default());
    runtime.register_native("twice", |_, args| match args {
        [arg] => match arg.get() {
            Value::Integer(n) => Ok(Value::Integer(n * 2)),
            other => Err(format!("twice 需要整数，得到 {}", other.type_name())),
        },
        _ => Err("twice 需要 1 个参数".to_string()),
    });
    runtime.register("settings", Rc::new(Object::new("Settings")));

    let script = Script::parse(
        "test",
        "settings.mode = \"fast\"\nresponse.write twice(21)\nresponse.write settings.mode\n",
    )
    .unwrap();
    runtime.run(&script).unwrap();
    assert_eq!(output.writes(), vec![Value::from(42), Value::from("fast")]);

    let error = runtime
        .run(&Script::parse("test", "response.write twice(\"x\")").unwrap())
        .unwrap_err();
    assert_eq!(error.message(), "twice 需要整数，得到 String");
}

#[test]
fn test_globals_persist_between_runs() {
    let (mut runtime, output) = runtime_with(RuntimeConfig::default());
    runtime.run(&Script::parse("a", "x = 5").unwrap()).unwrap();
    runtime.run(&Script::parse("b", "response.write x").unwrap()).unwrap();
    assert_eq!(output.text(), "5");
    assert_eq!(runtime.eval("x * 2 + 1").unwrap(), Value::from(11));
}

// -------------------------------------------------------------------------
// 错误与预算
// -------------------------------------------------------------------------

#[test]
fn test_explicit_mode_reports_location() {
    let config = RuntimeConfig {
        explicit: true,
        ..RuntimeConfig::default()
    };
    let error = run_with(config, "dim a\na = 1\nb = 2\n").unwrap_err();
    assert_eq!((error.location().line, error.location().column), (3, 1));
    assert_eq!(error.message(), "变量 'b' 未声明");
    assert_eq!(error.to_string(), "运行时错误: test:3:1: 变量 'b' 未声明");
}

#[test]
fn test_option_explicit_statement() {
    let kind = run_error(RuntimeConfig::default(), "option explicit\ndim a\nresponse.write a & b\n");
    assert_eq!(
        kind,
        RuntimeErrorKind::Undeclared {
            name: "b".to_string()
        }
    );
}

#[test]
fn test_not_callable_and_arity() {
    assert_eq!(
        run_error(RuntimeConfig::default(), "x = 1\nx 2\n"),
        RuntimeErrorKind::NotCallable {
            name: "x".to_string()
        }
    );
    assert_eq!(
        run_error(RuntimeConfig::default(), "function f(a)\nend function\nf 1, 2\n"),
        RuntimeErrorKind::ArityMismatch {
            name: "f".to_string(),
            expected: 1,
            actual: 2,
        }
    );
}

#[test]
fn test_too_few_arguments() {
    let error = run_with(
        RuntimeConfig::default(),
        "function add(a, b)\n    add = a + b\nend function\nx = add(1)\n",
    )
    .unwrap_err();
    assert_eq!((error.location().line, error.location().column), (4, 5));
    assert!(matches!(
        error,
        AspError::Runtime(ref e) if e.kind == RuntimeErrorKind::ArityMismatch {
            name: "add".to_string(),
            expected: 2,
            actual: 1,
        }
    ));
}

#[test]
fn test_operator_errors_carry_location() {
    let error = run_with(RuntimeConfig::default(), "x = 1\ny = x \\ 0\n").unwrap_err();
    assert_eq!(error.location().line, 2);
    assert!(matches!(
        error,
        AspError::Runtime(ref e) if e.kind == RuntimeErrorKind::DivisionByZero
    ));
}

#[test]
fn test_step_limit() {
    let config = RuntimeConfig {
        max_steps: Some(10),
        ..RuntimeConfig::default()
    };
    assert_eq!(
        run_error(config, "sub spin\n    spin\nend sub\nspin\n"),
        RuntimeErrorKind::StepLimitExceeded { limit: 10 }
    );
}

#[test]
fn test_call_depth_limit() {
    let config = RuntimeConfig {
        max_call_depth: 5,
        ..RuntimeConfig::default()
    };
    assert_eq!(
        run_error(config, "sub spin\n    spin\nend sub\nspin\n"),
        RuntimeErrorKind::CallDepthExceeded { limit: 5 }
    );
}

#[test]
fn test_default_call_depth_fits_thread_stack() {
    // std::thread::spawn 的默认栈大小
    let kind = std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(|| {
            run_error(
                RuntimeConfig::default(),
                "function down(n)\n    if n > 0 then\n        down = down(n - 1)\n    end if\nend function\nx = down(250)\n",
            )
        })
        .unwrap()
        .join()
        .unwrap();
    assert_eq!(kind, RuntimeErrorKind::CallDepthExceeded { limit: 64 });
}

#[test]
fn test_parse_error_surfaces_as_asp_error() {
    let error = Script::parse("bad.vbs", "if x then\nresponse.write 1\n").unwrap_err();
    assert!(matches!(error, AspError::Parse(_)));
    assert_eq!(&*error.location().source_name, "bad.vbs");
}
