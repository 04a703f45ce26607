//! The built-in query parser.
//!
//! Stands in for the external `lmlang_query_core::contracts::QueryParser`
//! contract (the distilled specification treats a real SQL parser as an
//! out-of-scope collaborator). Grammar this crate accepts, matching every
//! statement form the original demo scenarios exercise:
//!
//! ```text
//! statement  := "SELECT" expr ("WHERE" expr)?
//! expr       := and ("OR" and)*
//! and        := comparison ("AND" comparison)*
//! comparison := additive (("<" | "<=" | "=" | "<>" | "!=" | ">" | ">=") additive)?
//! additive   := multiplicative (("+" | "-") multiplicative)*
//! multiplicative := unary (("*" | "/") unary)*
//! unary      := "-" unary | primary
//! primary    := number | identifier | "(" expr ")"
//! ```
//!
//! There is no `FROM` clause: every demo scenario queries the one bound
//! table directly, so the parser is constructed with the set of column
//! names it is allowed to resolve `identifier`s against.

use lmlang_query_core::{BinOpKind, Operation, ParseError, Query, QueryParser};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Select,
    Where,
    And,
    Or,
    Ident(String),
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    LParen,
    RParen,
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    source: &'a str,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Lexer {
            chars: source.char_indices().peekable(),
            source,
        }
    }

    fn tokenize(mut self) -> Result<Vec<(Token, usize)>, ParseError> {
        let mut tokens = Vec::new();
        while let Some(&(pos, c)) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
                continue;
            }
            if c.is_ascii_alphabetic() || c == '_' {
                tokens.push((self.lex_ident(), pos));
                continue;
            }
            if c.is_ascii_digit() || c == '.' {
                tokens.push((self.lex_number(pos)?, pos));
                continue;
            }
            tokens.push((self.lex_operator(pos)?, pos));
        }
        Ok(tokens)
    }

    fn lex_ident(&mut self) -> Token {
        let start = self.chars.peek().unwrap().0;
        let mut end = start;
        while let Some(&(pos, c)) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                end = pos + c.len_utf8();
                self.chars.next();
            } else {
                break;
            }
        }
        let text = &self.source[start..end];
        match text.to_ascii_uppercase().as_str() {
            "SELECT" => Token::Select,
            "WHERE" => Token::Where,
            "AND" => Token::And,
            "OR" => Token::Or,
            _ => Token::Ident(text.to_string()),
        }
    }

    fn lex_number(&mut self, start: usize) -> Result<Token, ParseError> {
        let mut end = start;
        let mut seen_dot = false;
        while let Some(&(pos, c)) = self.chars.peek() {
            if c.is_ascii_digit() {
                end = pos + 1;
                self.chars.next();
            } else if c == '.' && !seen_dot {
                seen_dot = true;
                end = pos + 1;
                self.chars.next();
            } else {
                break;
            }
        }
        if let Some(&(pos, c)) = self.chars.peek() {
            if c == 'e' || c == 'E' {
                end = pos + 1;
                self.chars.next();
                if let Some(&(sign_pos, sign)) = self.chars.peek() {
                    if sign == '+' || sign == '-' {
                        end = sign_pos + 1;
                        self.chars.next();
                    }
                }
                while let Some(&(pos, c)) = self.chars.peek() {
                    if c.is_ascii_digit() {
                        end = pos + 1;
                        self.chars.next();
                    } else {
                        break;
                    }
                }
            }
        }
        let text = &self.source[start..end];
        text.parse::<f64>()
            .map(Token::Number)
            .map_err(|_| ParseError::UnexpectedToken {
                position: start,
                found: text.to_string(),
            })
    }

    fn lex_operator(&mut self, pos: usize) -> Result<Token, ParseError> {
        let (_, c) = self.chars.next().unwrap();
        let token = match c {
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '=' => Token::Eq,
            '<' => match self.chars.peek() {
                Some(&(_, '=')) => {
                    self.chars.next();
                    Token::Le
                }
                Some(&(_, '>')) => {
                    self.chars.next();
                    Token::Ne
                }
                _ => Token::Lt,
            },
            '>' => match self.chars.peek() {
                Some(&(_, '=')) => {
                    self.chars.next();
                    Token::Ge
                }
                _ => Token::Gt,
            },
            '!' => match self.chars.peek() {
                Some(&(_, '=')) => {
                    self.chars.next();
                    Token::Ne
                }
                _ => {
                    return Err(ParseError::UnexpectedToken {
                        position: pos,
                        found: "!".to_string(),
                    })
                }
            },
            other => {
                return Err(ParseError::UnexpectedToken {
                    position: pos,
                    found: other.to_string(),
                })
            }
        };
        Ok(token)
    }
}

struct TokenStream {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl TokenStream {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ParseError> {
        match self.advance() {
            Some(ref t) if t == expected => Ok(()),
            Some(t) => Err(ParseError::UnexpectedToken {
                position: self.pos.saturating_sub(1),
                found: format!("{t:?}"),
            }),
            None => Err(ParseError::UnexpectedEof),
        }
    }
}

fn parse_expr(stream: &mut TokenStream) -> Result<Operation, ParseError> {
    parse_or(stream)
}

fn parse_or(stream: &mut TokenStream) -> Result<Operation, ParseError> {
    let mut left = parse_and(stream)?;
    while matches!(stream.peek(), Some(Token::Or)) {
        stream.advance();
        let right = parse_and(stream)?;
        left = Operation::bin_op(BinOpKind::Or, left, right);
    }
    Ok(left)
}

fn parse_and(stream: &mut TokenStream) -> Result<Operation, ParseError> {
    let mut left = parse_comparison(stream)?;
    while matches!(stream.peek(), Some(Token::And)) {
        stream.advance();
        let right = parse_comparison(stream)?;
        left = Operation::bin_op(BinOpKind::And, left, right);
    }
    Ok(left)
}

fn parse_comparison(stream: &mut TokenStream) -> Result<Operation, ParseError> {
    let left = parse_additive(stream)?;
    let kind = match stream.peek() {
        Some(Token::Lt) => Some(BinOpKind::Lt),
        Some(Token::Le) => Some(BinOpKind::Le),
        Some(Token::Eq) => Some(BinOpKind::Eq),
        Some(Token::Ne) => Some(BinOpKind::Ne),
        Some(Token::Gt) => Some(BinOpKind::Gt),
        Some(Token::Ge) => Some(BinOpKind::Ge),
        _ => None,
    };
    match kind {
        Some(kind) => {
            stream.advance();
            let right = parse_additive(stream)?;
            Ok(Operation::bin_op(kind, left, right))
        }
        None => Ok(left),
    }
}

fn parse_additive(stream: &mut TokenStream) -> Result<Operation, ParseError> {
    let mut left = parse_multiplicative(stream)?;
    loop {
        let kind = match stream.peek() {
            Some(Token::Plus) => BinOpKind::Add,
            Some(Token::Minus) => BinOpKind::Sub,
            _ => break,
        };
        stream.advance();
        let right = parse_multiplicative(stream)?;
        left = Operation::bin_op(kind, left, right);
    }
    Ok(left)
}

fn parse_multiplicative(stream: &mut TokenStream) -> Result<Operation, ParseError> {
    let mut left = parse_unary(stream)?;
    loop {
        let kind = match stream.peek() {
            Some(Token::Star) => BinOpKind::Mul,
            Some(Token::Slash) => BinOpKind::Div,
            _ => break,
        };
        stream.advance();
        let right = parse_unary(stream)?;
        left = Operation::bin_op(kind, left, right);
    }
    Ok(left)
}

fn parse_unary(stream: &mut TokenStream) -> Result<Operation, ParseError> {
    if matches!(stream.peek(), Some(Token::Minus)) {
        stream.advance();
        let operand = parse_unary(stream)?;
        return Ok(Operation::bin_op(BinOpKind::Sub, Operation::Constant(0.0), operand));
    }
    parse_primary(stream)
}

fn parse_primary(stream: &mut TokenStream) -> Result<Operation, ParseError> {
    match stream.advance() {
        Some(Token::Number(v)) => Ok(Operation::Constant(v)),
        Some(Token::Ident(name)) => Ok(Operation::column_ref(name)),
        Some(Token::LParen) => {
            let inner = parse_expr(stream)?;
            stream.expect(&Token::RParen)?;
            Ok(inner)
        }
        Some(other) => Err(ParseError::UnexpectedToken {
            position: stream.pos.saturating_sub(1),
            found: format!("{other:?}"),
        }),
        None => Err(ParseError::UnexpectedEof),
    }
}

/// Walks `op`, collecting every referenced column name in first-occurrence
/// order and validating it against `known_columns`.
fn collect_columns(
    op: &Operation,
    known_columns: &[String],
    seen: &mut Vec<String>,
) -> Result<(), ParseError> {
    match op {
        Operation::Constant(_) => Ok(()),
        Operation::ColumnRef(name) => {
            if !known_columns.iter().any(|c| c == name) {
                return Err(ParseError::UnknownColumn { name: name.clone() });
            }
            if !seen.iter().any(|c| c == name) {
                seen.push(name.clone());
            }
            Ok(())
        }
        Operation::BinOp { left, right, .. } => {
            collect_columns(left, known_columns, seen)?;
            collect_columns(right, known_columns, seen)
        }
    }
}

/// Parses `SELECT <expr> [WHERE <expr>]` statements against a fixed set of
/// known column names (there is no `FROM` clause; the crate serves exactly
/// one bound table per session).
pub struct BuiltinParser {
    known_columns: Vec<String>,
}

impl BuiltinParser {
    pub fn new(known_columns: Vec<String>) -> Self {
        BuiltinParser { known_columns }
    }
}

/// `true` when `text`'s leading word is `SELECT` (case-insensitive).
/// Checked before lexing so a non-statement line (a backslash command, an
/// empty line, stray input) never has to survive the tokenizer to be
/// recognized as "nothing to run" rather than a syntax error.
fn looks_like_select(text: &str) -> bool {
    let leading: String = text.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    leading.eq_ignore_ascii_case("select")
}

impl QueryParser for BuiltinParser {
    fn parse(&self, text: &str) -> Result<Option<Query>, ParseError> {
        let trimmed = text.trim();
        if trimmed.is_empty() || !looks_like_select(trimmed) {
            return Ok(None);
        }

        let tokens = Lexer::new(trimmed).tokenize()?;
        let mut stream = TokenStream { tokens, pos: 0 };

        stream.advance();

        let select = parse_expr(&mut stream)?;
        let where_clause = if matches!(stream.peek(), Some(Token::Where)) {
            stream.advance();
            Some(parse_expr(&mut stream)?)
        } else {
            None
        };

        if let Some(extra) = stream.peek() {
            return Err(ParseError::UnexpectedToken {
                position: stream.pos,
                found: format!("{extra:?}"),
            });
        }

        let mut columns = Vec::new();
        collect_columns(&select, &self.known_columns, &mut columns)?;
        if let Some(where_clause) = &where_clause {
            collect_columns(where_clause, &self.known_columns, &mut columns)?;
        }
        if columns.is_empty() {
            // No column referenced anywhere (e.g. `SELECT 2.5`): bind every
            // known column anyway so the compiled loop still has a `size`
            // to iterate, matching the demo scenario's row count.
            columns = self.known_columns.clone();
        }

        Ok(Some(Query {
            columns,
            select,
            where_clause,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> BuiltinParser {
        BuiltinParser::new(vec!["a".to_string(), "b".to_string()])
    }

    #[test]
    fn parses_select_add() {
        let query = parser().parse("SELECT a+b").unwrap().unwrap();
        assert_eq!(query.columns, vec!["a", "b"]);
        assert!(query.where_clause.is_none());
    }

    #[test]
    fn parses_select_with_where() {
        let query = parser().parse("SELECT a*b WHERE a>2").unwrap().unwrap();
        assert!(query.where_clause.is_some());
    }

    #[test]
    fn parses_parenthesized_and_or() {
        let query = parser().parse("SELECT a WHERE (a>1 AND a<4)").unwrap().unwrap();
        assert!(matches!(
            query.where_clause,
            Some(Operation::BinOp { kind: BinOpKind::And, .. })
        ));
    }

    #[test]
    fn constant_only_select_binds_every_known_column() {
        let query = parser().parse("SELECT 2.5").unwrap().unwrap();
        assert_eq!(query.columns, vec!["a", "b"]);
    }

    #[test]
    fn scientific_notation_literal_parses() {
        let query = parser().parse("SELECT a*1e200").unwrap().unwrap();
        assert!(matches!(query.select, Operation::BinOp { .. }));
    }

    #[test]
    fn non_select_line_is_not_a_statement() {
        assert!(parser().parse("\\d").unwrap().is_none());
        assert!(parser().parse("").unwrap().is_none());
    }

    #[test]
    fn unknown_column_is_rejected() {
        let result = parser().parse("SELECT c");
        assert!(matches!(result, Err(ParseError::UnknownColumn { .. })));
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        let result = parser().parse("SELECT a )");
        assert!(matches!(result, Err(ParseError::UnexpectedToken { .. })));
    }
}
