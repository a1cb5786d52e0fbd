//! Recursive-descent parser (§4.H): pipe lowest, then alternative (`//`),
//! then add/sub, then mul/div/mod, then postfix field/index/slice
//! chaining on a primary atom. Returns an explicit error value; never
//! aborts the process, and the unsupported-feature gate runs first so the
//! grammar below never has to recognize (only to refuse) constructs like
//! `reduce` or `as $x`.

use serde_json::Value;

use crate::ast::{Ast, AstBuilder, ArithOp, CmpOp, CondId, CondNode, ExprNode, NodeId, ObjectKey};
use crate::error::ExprError;
use crate::gate;
use crate::lexer::{self, Token};

const DEFAULT_MAX_DEPTH: usize = 100;

pub fn parse(source: &str) -> Result<Ast, ExprError> {
    parse_with_max_depth(source, DEFAULT_MAX_DEPTH)
}

pub fn parse_with_max_depth(source: &str, max_depth: usize) -> Result<Ast, ExprError> {
    gate::check(source)?;
    let tokens = lexer::lex(source).map_err(|message| ExprError::Parse {
        expression: source.to_string(),
        message,
    })?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        max_depth,
        builder: AstBuilder::default(),
    };
    let root = parser.parse_pipe().map_err(|message| {
        if message.starts_with("__depth__") {
            ExprError::RecursionDepthExceeded {
                expression: source.to_string(),
                max_depth,
            }
        } else {
            ExprError::Parse {
                expression: source.to_string(),
                message,
            }
        }
    })?;
    if parser.peek() != &Token::Eof {
        return Err(ExprError::Parse {
            expression: source.to_string(),
            message: format!("unexpected trailing input at token {:?}", parser.peek()),
        });
    }
    Ok(parser.builder.finish(root))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    max_depth: usize,
    builder: AstBuilder,
}

type PResult<T> = Result<T, String>;

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn expect(&mut self, expected: &Token) -> PResult<()> {
        if self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(format!("expected {expected:?}, found {:?}", self.peek()))
        }
    }

    fn expect_ident(&mut self) -> PResult<String> {
        match self.advance() {
            Token::Ident(name) => Ok(name),
            other => Err(format!("expected identifier, found {other:?}")),
        }
    }

    fn consume_question(&mut self) -> bool {
        if self.peek() == &Token::Question {
            self.advance();
            true
        } else {
            false
        }
    }

    fn enter(&mut self) -> PResult<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err("__depth__ exceeded".to_string());
        }
        Ok(())
    }

    // --- pipe | alt (//) | add/sub | mul/div/mod | unary | postfix ---

    fn parse_pipe(&mut self) -> PResult<NodeId> {
        self.enter()?;
        let result = self.parse_pipe_body();
        self.depth -= 1;
        result
    }

    fn parse_pipe_body(&mut self) -> PResult<NodeId> {
        let mut left = self.parse_alt()?;
        while self.peek() == &Token::Pipe {
            self.advance();
            let right = self.parse_alt()?;
            left = self.builder.push(ExprNode::Pipe(left, right));
        }
        Ok(left)
    }

    fn parse_alt(&mut self) -> PResult<NodeId> {
        let mut left = self.parse_add()?;
        while self.peek() == &Token::AltOp {
            self.advance();
            let right = self.parse_add()?;
            left = self.builder.push(ExprNode::Alt(left, right));
        }
        Ok(left)
    }

    fn parse_add(&mut self) -> PResult<NodeId> {
        let mut left = self.parse_mul()?;
        loop {
            let op = match self.peek() {
                Token::Plus => ArithOp::Add,
                Token::Minus => ArithOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_mul()?;
            left = self.builder.push(ExprNode::BinOp { op, left, right });
        }
        Ok(left)
    }

    fn parse_mul(&mut self) -> PResult<NodeId> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => ArithOp::Mul,
                Token::Slash => ArithOp::Div,
                Token::Percent => ArithOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = self.builder.push(ExprNode::BinOp { op, left, right });
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> PResult<NodeId> {
        if self.peek() == &Token::Minus {
            self.advance();
            let operand = self.parse_unary()?;
            let zero = self.builder.push(ExprNode::Literal(Value::from(0)));
            return Ok(self.builder.push(ExprNode::BinOp {
                op: ArithOp::Sub,
                left: zero,
                right: operand,
            }));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> PResult<NodeId> {
        let mut base = if self.peek() == &Token::Dot {
            self.advance();
            let identity = self.builder.push(ExprNode::Identity);
            if let Token::Ident(_) = self.peek() {
                let name = self.expect_ident()?;
                let optional = self.consume_question();
                self.builder.push(ExprNode::Field { target: identity, name, optional })
            } else {
                identity
            }
        } else {
            self.parse_primary_atom()?
        };

        loop {
            match self.peek().clone() {
                Token::Dot => {
                    self.advance();
                    let name = self.expect_ident()?;
                    let optional = self.consume_question();
                    base = self.builder.push(ExprNode::Field { target: base, name, optional });
                }
                Token::LBracket => {
                    self.advance();
                    base = self.parse_bracket_suffix(base)?;
                }
                Token::Question => {
                    self.advance();
                }
                _ => break,
            }
        }
        Ok(base)
    }

    fn parse_bracket_suffix(&mut self, target: NodeId) -> PResult<NodeId> {
        if self.peek() == &Token::RBracket {
            self.advance();
            return Ok(self.builder.push(ExprNode::Iterate { target }));
        }

        let start = self.try_parse_signed_int()?;
        if self.peek() == &Token::Colon {
            self.advance();
            let end = if self.peek() != &Token::RBracket {
                Some(self.parse_signed_int()?)
            } else {
                None
            };
            self.expect(&Token::RBracket)?;
            return Ok(self.builder.push(ExprNode::Slice { target, start, end }));
        }

        let index = start.ok_or_else(|| "expected an index or a slice inside '[...]'".to_string())?;
        self.expect(&Token::RBracket)?;
        Ok(self.builder.push(ExprNode::Index { target, index }))
    }

    fn try_parse_signed_int(&mut self) -> PResult<Option<i64>> {
        let negative = if self.peek() == &Token::Minus {
            self.advance();
            true
        } else {
            false
        };
        match self.peek().clone() {
            Token::Number(n) => {
                self.advance();
                let signed = if negative { -n } else { n };
                Ok(Some(signed as i64))
            }
            other if negative => Err(format!("expected a number after '-', found {other:?}")),
            _ => Ok(None),
        }
    }

    fn parse_signed_int(&mut self) -> PResult<i64> {
        self.try_parse_signed_int()?
            .ok_or_else(|| format!("expected a number, found {:?}", self.peek()))
    }

    fn parse_primary_atom(&mut self) -> PResult<NodeId> {
        match self.peek().clone() {
            Token::LParen => {
                self.advance();
                let inner = self.parse_pipe()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Token::If => self.parse_if(),
            Token::LBrace => self.parse_object(),
            Token::LBracket => self.parse_array(),
            Token::Number(n) => {
                self.advance();
                Ok(self.builder.push(ExprNode::Literal(number_value(n))))
            }
            Token::Str(s) => {
                self.advance();
                Ok(self.builder.push(ExprNode::Literal(Value::String(s))))
            }
            Token::True => {
                self.advance();
                Ok(self.builder.push(ExprNode::Literal(Value::Bool(true))))
            }
            Token::False => {
                self.advance();
                Ok(self.builder.push(ExprNode::Literal(Value::Bool(false))))
            }
            Token::Null => {
                self.advance();
                Ok(self.builder.push(ExprNode::Literal(Value::Null)))
            }
            Token::Ident(name) => {
                self.advance();
                self.parse_call(name)
            }
            other => Err(format!("unexpected token {other:?}")),
        }
    }

    fn parse_call(&mut self, name: String) -> PResult<NodeId> {
        if name == "select" {
            self.expect(&Token::LParen)?;
            let cond = self.parse_condition()?;
            self.expect(&Token::RParen)?;
            return Ok(self.builder.push(ExprNode::Select(cond)));
        }
        if name == "del" {
            self.expect(&Token::LParen)?;
            let path = self.parse_pipe()?;
            self.expect(&Token::RParen)?;
            return Ok(self.builder.push(ExprNode::Delete(path)));
        }

        let mut args = Vec::new();
        if self.peek() == &Token::LParen {
            self.advance();
            if self.peek() != &Token::RParen {
                loop {
                    args.push(self.parse_pipe()?);
                    if self.peek() == &Token::Comma {
                        self.advance();
                        continue;
                    }
                    break;
                }
            }
            self.expect(&Token::RParen)?;
        }
        Ok(self.builder.push(ExprNode::Call { name, args }))
    }

    fn parse_if(&mut self) -> PResult<NodeId> {
        self.expect(&Token::If)?;
        let mut branches = Vec::new();
        let cond = self.parse_condition()?;
        self.expect(&Token::Then)?;
        let then_b = self.parse_pipe()?;
        branches.push((cond, then_b));

        while self.peek() == &Token::Elif {
            self.advance();
            let c = self.parse_condition()?;
            self.expect(&Token::Then)?;
            let t = self.parse_pipe()?;
            branches.push((c, t));
        }

        let mut else_b = if self.peek() == &Token::Else {
            self.advance();
            self.parse_pipe()?
        } else {
            self.builder.push(ExprNode::Identity)
        };
        self.expect(&Token::End)?;

        for (c, t) in branches.into_iter().rev() {
            else_b = self.builder.push(ExprNode::If {
                cond: c,
                then_branch: t,
                else_branch: else_b,
            });
        }
        Ok(else_b)
    }

    fn parse_object(&mut self) -> PResult<NodeId> {
        self.expect(&Token::LBrace)?;
        let mut entries = Vec::new();
        if self.peek() != &Token::RBrace {
            loop {
                match self.peek().clone() {
                    Token::Ident(name) => {
                        self.advance();
                        if self.peek() == &Token::Colon {
                            self.advance();
                            let value = self.parse_alt()?;
                            entries.push((ObjectKey::Literal(name), value));
                            if self.peek() == &Token::Comma {
                                self.advance();
                                continue;
                            }
                            break;
                        }
                        let identity = self.builder.push(ExprNode::Identity);
                        let value = self.builder.push(ExprNode::Field {
                            target: identity,
                            name: name.clone(),
                            optional: false,
                        });
                        entries.push((ObjectKey::Literal(name), value));
                        if self.peek() == &Token::Comma {
                            self.advance();
                            continue;
                        }
                        break;
                    }
                    Token::Str(s) => {
                        self.advance();
                        self.expect(&Token::Colon)?;
                        let value = self.parse_alt()?;
                        entries.push((ObjectKey::Literal(s), value));
                        if self.peek() == &Token::Comma {
                            self.advance();
                            continue;
                        }
                        break;
                    }
                    Token::LParen => {
                        self.advance();
                        let key_expr = self.parse_pipe()?;
                        self.expect(&Token::RParen)?;
                        self.expect(&Token::Colon)?;
                        let value = self.parse_alt()?;
                        entries.push((ObjectKey::Computed(key_expr), value));
                        if self.peek() == &Token::Comma {
                            self.advance();
                            continue;
                        }
                        break;
                    }
                    other => return Err(format!("expected an object key, found {other:?}")),
                }
            }
        }
        self.expect(&Token::RBrace)?;
        Ok(self.builder.push(ExprNode::ObjectConstruct(entries)))
    }

    fn parse_array(&mut self) -> PResult<NodeId> {
        self.expect(&Token::LBracket)?;
        let mut elements = Vec::new();
        if self.peek() != &Token::RBracket {
            loop {
                elements.push(self.parse_pipe()?);
                if self.peek() == &Token::Comma {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.expect(&Token::RBracket)?;
        Ok(self.builder.push(ExprNode::ArrayConstruct(elements)))
    }

    // --- conditions: or | and | not | atom ---

    fn parse_condition(&mut self) -> PResult<CondId> {
        self.parse_cond_or()
    }

    fn parse_cond_or(&mut self) -> PResult<CondId> {
        let mut left = self.parse_cond_and()?;
        while self.peek() == &Token::Or {
            self.advance();
            let right = self.parse_cond_and()?;
            left = self.builder.push_cond(CondNode::Or(left, right));
        }
        Ok(left)
    }

    fn parse_cond_and(&mut self) -> PResult<CondId> {
        let mut left = self.parse_cond_unary()?;
        while self.peek() == &Token::And {
            self.advance();
            let right = self.parse_cond_unary()?;
            left = self.builder.push_cond(CondNode::And(left, right));
        }
        Ok(left)
    }

    fn parse_cond_unary(&mut self) -> PResult<CondId> {
        if self.peek() == &Token::Not {
            self.advance();
            let inner = self.parse_cond_unary()?;
            return Ok(self.builder.push_cond(CondNode::Not(inner)));
        }
        self.parse_cond_atom()
    }

    fn parse_cond_atom(&mut self) -> PResult<CondId> {
        if self.peek() == &Token::LParen {
            let save = self.pos;
            self.advance();
            if let Ok(cond) = self.parse_cond_or() {
                if self.peek() == &Token::RParen {
                    self.advance();
                    return Ok(cond);
                }
            }
            self.pos = save;
        }

        let left = self.parse_pipe()?;
        if let Some(op) = self.peek_cmp_op() {
            self.advance();
            let right = self.parse_pipe()?;
            return Ok(self.builder.push_cond(CondNode::Compare { left, op, right }));
        }
        Ok(self.builder.push_cond(CondNode::Truthy(left)))
    }

    fn peek_cmp_op(&self) -> Option<CmpOp> {
        match self.peek() {
            Token::Eq => Some(CmpOp::Eq),
            Token::Ne => Some(CmpOp::Ne),
            Token::Lt => Some(CmpOp::Lt),
            Token::Le => Some(CmpOp::Le),
            Token::Gt => Some(CmpOp::Gt),
            Token::Ge => Some(CmpOp::Ge),
            _ => None,
        }
    }
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9e15 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_access_parses() {
        let ast = parse(".amount").unwrap();
        assert!(matches!(ast.node(ast.root), ExprNode::Field { .. }));
    }

    #[test]
    fn pipe_and_builtin_parse() {
        let ast = parse(".amount | tonumber | select(. > 1000)").unwrap();
        assert!(matches!(ast.node(ast.root), ExprNode::Pipe(_, _)));
    }

    #[test]
    fn negative_slice_with_min_int_does_not_overflow() {
        let ast = parse(".xs[-9223372036854775808:]").unwrap();
        let ExprNode::Slice { start, .. } = ast.node(ast.root) else {
            panic!("expected slice")
        };
        assert_eq!(*start, Some(i64::MIN));
    }

    #[test]
    fn if_then_else_end_parses() {
        let ast = parse("if . > 0 then \"pos\" else \"neg\" end").unwrap();
        assert!(matches!(ast.node(ast.root), ExprNode::If { .. }));
    }

    #[test]
    fn object_construction_with_shorthand_and_computed_key() {
        let ast = parse("{name, (.k): .v}").unwrap();
        assert!(matches!(ast.node(ast.root), ExprNode::ObjectConstruct(_)));
    }

    #[test]
    fn variable_binding_is_a_parse_time_error_before_parser_runs() {
        let err = parse(". as $x | $x.y").unwrap_err();
        assert!(matches!(err, ExprError::UnsupportedFeature { .. }));
    }

    #[test]
    fn unbalanced_parens_report_a_parse_error() {
        assert!(parse("(.a + .b").is_err());
    }

    #[test]
    fn deeply_nested_parens_hit_the_depth_cap() {
        let source = format!("{}{}{}", "(".repeat(200), ".", ")".repeat(200));
        let err = parse_with_max_depth(&source, 10).unwrap_err();
        assert!(matches!(err, ExprError::RecursionDepthExceeded { .. }));
    }

    #[test]
    fn compound_condition_parses() {
        let ast = parse("select(.a > 1 and .b < 2)").unwrap();
        assert!(matches!(ast.node(ast.root), ExprNode::Select(_)));
    }
}
