//! # Parser 测试
//!
//! AST 以 S 表达式形式做内联快照比较。

use insta::assert_snapshot;

use super::*;
use crate::script::ast::Statement;

fn parse(text: &str) -> Block {
    parse_script("test", text).unwrap()
}

fn sexpr(text: &str) -> String {
    parse(text).to_sexpr()
}

fn expr(text: &str) -> String {
    parse_expression("test", text).unwrap().to_sexpr()
}

fn error(text: &str) -> ParseError {
    parse_script("test", text).unwrap_err()
}

// -------------------------------------------------------------------------
// 表达式
// -------------------------------------------------------------------------

#[test]
fn test_precedence_and_associativity() {
    assert_snapshot!(expr("1 + 2 * 3"), @"(+ 1 (* 2 3))");
    assert_snapshot!(expr("1 * 2 + 3"), @"(+ (* 1 2) 3)");
    assert_snapshot!(expr("1+2+3"), @"(+ (+ 1 2) 3)");
    assert_snapshot!(expr(r"a \ b / c"), @r"(\ a (/ b c))");
    assert_snapshot!(expr(r#""a" & 1 + 2 mod 3"#), @r#"(& "a" (+ 1 (mod 2 3)))"#);
}

#[test]
fn test_comparison_and_logic() {
    assert_snapshot!(expr("a = 1 and b <> 2 or not c"), @"(or (and (= a 1) (<> b 2)) (not c))");
    assert_snapshot!(expr("x <= 1 xor y >= 2"), @"(xor (<= x 1) (>= y 2))");
    assert_snapshot!(expr("x < -1"), @"(< x (- 1))");
    assert_snapshot!(expr("o is nothing"), @"(is o nothing)");
}

#[test]
fn test_unary_binding() {
    // not 吞掉其后的整个表达式，负号只作用于紧随的因子
    assert_snapshot!(expr("not a and b"), @"(not (and a b))");
    assert_snapshot!(expr("-2 ^ 2"), @"(^ (- 2) 2)");
    assert_snapshot!(expr("2 ^ -1"), @"(^ 2 (- 1))");
    assert_snapshot!(expr("1 - -1"), @"(- 1 (- 1))");
}

#[test]
fn test_primaries() {
    assert_snapshot!(expr("f(1)(2)"), @"(call (call f 1) 2)");
    assert_snapshot!(expr("a.b.c(x, 1)"), @"(call a.b.c x 1)");
    assert_snapshot!(expr("new Foo"), @"(new Foo)");
    assert_snapshot!(expr("(1 + 2) * 3"), @"(* (paren (+ 1 2)) 3)");
    assert_snapshot!(expr("True or false"), @"(or true false)");
    assert_snapshot!(expr(r#""say ""hi""""#), @r#""say ""hi""""#);
    assert_snapshot!(expr("response.End"), @"response.End");
}

#[test]
fn test_expression_errors() {
    assert!(matches!(
        parse_expression("test", "1 +").unwrap_err(),
        ParseError::UnexpectedEnd { .. }
    ));
    assert!(matches!(
        parse_expression("test", "(1").unwrap_err(),
        ParseError::UnexpectedEnd { .. }
    ));
    assert!(matches!(
        parse_expression("test", "then").unwrap_err(),
        ParseError::UnexpectedToken { .. }
    ));
    assert!(matches!(
        parse_expression("test", "1 2").unwrap_err(),
        ParseError::UnexpectedToken { .. }
    ));
}

#[test]
fn test_nesting_limit() {
    let deep = format!("x = {}1{}", "(".repeat(300), ")".repeat(300));
    assert!(matches!(
        error(&deep),
        ParseError::NestingTooDeep { limit: MAX_NESTING, location } if location.line == 1
    ));
    let negations = format!("x = {}1", "-".repeat(1000));
    assert!(matches!(error(&negations), ParseError::NestingTooDeep { .. }));
    let blocks = format!("{}{}", "if a then\n".repeat(100), "end if\n".repeat(100));
    assert!(matches!(error(&blocks), ParseError::NestingTooDeep { .. }));

    let shallow = format!("x = {}1{}", "(".repeat(40), ")".repeat(40));
    assert_eq!(parse(&shallow).statements.len(), 1);
}

// -------------------------------------------------------------------------
// 赋值与过程调用的消歧
// -------------------------------------------------------------------------

#[test]
fn test_assignment_or_sub_call() {
    assert_snapshot!(sexpr("f(1) = 2"), @"(block (assign (call f 1) 2))");
    assert_snapshot!(sexpr("f (1), 2"), @"(block (call f (paren 1) 2))");
    assert_snapshot!(sexpr("f 1, 2"), @"(block (call f 1 2))");
    assert_snapshot!(sexpr("f (1)"), @"(block (call f (paren 1)))");
    assert_snapshot!(sexpr("f (1) + 2, 3"), @"(block (call f (+ (paren 1) 2) 3))");
    assert_snapshot!(sexpr("f"), @"(block (call f))");
    assert_snapshot!(sexpr("f()"), @"(block (call f))");
    assert_snapshot!(sexpr("x = y = 1"), @"(block (assign x (= y 1)))");
    assert_snapshot!(sexpr("o.items(2) = 5"), @"(block (assign (call o.items 2) 5))");
}

#[test]
fn test_call_and_set_statements() {
    assert_snapshot!(sexpr("call g(1, 2)"), @"(block (call g 1 2))");
    assert_snapshot!(sexpr("call g"), @"(block (call g))");
    assert_snapshot!(sexpr("set o = new C"), @"(block (assign o (new C)))");
}

#[test]
fn test_parenthesized_sub_call_is_rejected() {
    assert!(matches!(
        error("f(1, 2)"),
        ParseError::ParenthesizedSubCall { location } if location.column == 2
    ));
    assert!(matches!(
        error("f(1, 2), 3"),
        ParseError::ParenthesizedSubCall { .. }
    ));
    assert!(matches!(error("f(1) 2"), ParseError::UnexpectedToken { .. }));
}

// -------------------------------------------------------------------------
// 语句
// -------------------------------------------------------------------------

#[test]
fn test_function_declaration() {
    let text = "function add(a, byref b, byval c)\n    add = a + b\nend function";
    assert_snapshot!(
        sexpr(text),
        @"(block (function add (a byref b byval c) (block (assign add (+ a b)))))"
    );
    // 括号可省略
    assert_snapshot!(sexpr("sub hello\nend sub"), @"(block (sub hello () (block)))");
}

#[test]
fn test_class_declaration() {
    let text = "\
class Point
    public x
    private y
    dim z
    function len()
        len = x
    end function
    private sub reset
        x = 0
    end sub
end class";
    assert_snapshot!(
        sexpr(text),
        @"(block (class Point (dim x) (dim y) (dim z) (function len () (block (assign len x))) (sub reset () (block (assign x 0)))))"
    );
}

#[test]
fn test_class_member_lists() {
    assert_snapshot!(
        sexpr("class P\n    public a, b\n    private c\nend class"),
        @"(block (class P (dim a) (dim b) (dim c)))"
    );
}

#[test]
fn test_if_elseif_else() {
    let text = "\
if a then
    x = 1
elseif b then
    x = 2
else
    x = 3
end if";
    assert_snapshot!(
        sexpr(text),
        @"(block (if a (block (assign x 1)) (block (if b (block (assign x 2)) (block (assign x 3))))))"
    );
    assert_snapshot!(sexpr("if a then\nend if"), @"(block (if a (block) (block)))");
    assert_snapshot!(
        sexpr("if a then\nx = 1\nelseif b then\nx = 2\nelseif c then\nx = 3\nend if"),
        @"(block (if a (block (assign x 1)) (block (if b (block (assign x 2)) (block (if c (block (assign x 3)) (block)))))))"
    );

    // 长 elseif 链不受嵌套上限影响
    let mut long_chain = String::from("if n = 0 then\nx = 0\n");
    for i in 1..200 {
        long_chain.push_str(&format!("elseif n = {i} then\nx = {i}\n"));
    }
    long_chain.push_str("end if");
    assert_eq!(parse(&long_chain).statements.len(), 1);
}

#[test]
fn test_dim_option_exit() {
    assert_snapshot!(
        sexpr("option explicit\ndim a, b\nsub s\nexit sub\nend sub"),
        @"(block (option explicit) (dim a) (dim b) (sub s () (block (exit sub))))"
    );
}

#[test]
fn test_separators_and_comments() {
    assert_snapshot!(
        sexpr("x = 1 : y = 2 ' note\n\n  z = 3\n"),
        @"(block (assign x 1) (assign y 2) (assign z 3))"
    );
}

#[test]
fn test_keywords_are_case_insensitive() {
    assert_snapshot!(
        sexpr("If X Then\nResponse.Write \"a\"\nEnd If"),
        @r#"(block (if X (block (call Response.Write "a")) (block)))"#
    );
}

#[test]
fn test_statement_errors() {
    let mismatched = error("function f\nend sub");
    assert_eq!(mismatched.to_string(), "test:2:5: 'end sub' 与 'end function' 不匹配");

    assert!(matches!(
        error("if x then\ny = 1"),
        ParseError::UnexpectedEnd { expected, .. } if expected == "'end if'"
    ));
    assert!(matches!(
        error("end if"),
        ParseError::UnexpectedToken { found, .. } if found == "'end'"
    ));
    assert!(matches!(error("x = 1 2"), ParseError::UnexpectedToken { .. }));
    assert!(matches!(error("dim if"), ParseError::UnexpectedToken { .. }));
    assert!(matches!(error("x = \"abc"), ParseError::UnterminatedString { .. }));
    assert!(matches!(error("exit loop"), ParseError::UnexpectedToken { .. }));
    assert!(matches!(error("class C\nx = 1\nend class"), ParseError::UnexpectedToken { .. }));
}

#[test]
fn test_locations() {
    let block = parse("dim x\n  x = 1");
    assert_eq!(block.statements.len(), 2);
    let location = block.statements[1].location();
    assert_eq!((location.line, location.column), (2, 5));
    assert_eq!(&*location.source_name, "test");
}

// -------------------------------------------------------------------------
// 模板
// -------------------------------------------------------------------------

#[test]
fn test_template_desugaring() {
    let block = parse_template("test", "<p><%= x %></p><% if y then %>yes<% end if %>").unwrap();
    assert_snapshot!(
        block.to_sexpr(),
        @r#"(block (call response.write "<p>") (call response.write x) (call response.write "</p>") (if y (block (call response.write "yes")) (block)))"#
    );
}

#[test]
fn test_template_close_inside_code() {
    // 代码模式下 `%>` 同样开始模板块
    let block = parse("x = 1 %>hi<% y = 2");
    assert_snapshot!(
        block.to_sexpr(),
        @r#"(block (assign x 1) (call response.write "hi") (assign y 2))"#
    );
}

// -------------------------------------------------------------------------
// 打印与往返
// -------------------------------------------------------------------------

#[test]
fn test_printer_output() {
    let block = parse(
        "function add(a, byref b)\nadd = a + b\nend function\nif add(1, 2) > 2 then\nresponse.write \"big\"\nend if",
    );
    assert_eq!(
        block.to_string(),
        "function add(a, byref b)\n    add = a + b\nend function\nif add(1, 2) > 2 then\n    response.write \"big\"\nend if\n"
    );
}

#[test]
fn test_round_trip() {
    let sources = [
        "\
option explicit
dim x, y
x = 3
if x > 2 and not y then
    response.write \"big\"
elseif x = 2 then
    call f(1)(2)
else
    response.write \"small\" & \"\"\"quoted\"\"\"
end if
f (1), 2
f (1) + 2, 3
f(1) = -x ^ 2
class Counter
    public count
    sub class_initialize()
        count = 0
    end sub
    function next(byref step, byval n)
        count = count + step
        next = count
        exit function
    end function
end class
set c = new Counter",
    ];
    for source in sources {
        let first = parse(source);
        let printed = first.to_string();
        let second = parse(&printed);
        assert_eq!(second.to_sexpr(), first.to_sexpr());
        assert_eq!(second.to_string(), printed);
    }

    let template = parse_template("test", "<html>\n<% if a then %>\n  <b><%= a %></b>\n<% end if %>\n</html>\n").unwrap();
    let printed = template.to_string();
    let reparsed = parse(&printed);
    assert_eq!(reparsed.to_sexpr(), template.to_sexpr());
    assert!(matches!(reparsed.statements[1], Statement::If(_)));
}
