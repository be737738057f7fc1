//! S-expression reader.
//!
//! Reads Weft source one top-level datum at a time and lowers each datum to
//! a [`Form`]. The stream is lazy: nothing past the current form is read
//! until the driver asks for it.
//!
//! # Syntax
//!
//! | Source | Form |
//! |--------|------|
//! | `42`, `-1.5`, `"text"`, `true`, `false` | literals |
//! | `nothing` | `Form::Null` |
//! | `name` | `Form::Symbol` |
//! | `(module Name body...)`, `(baremodule Name body...)` | `Form::Module` |
//! | `(import A.b)`, `(using ..A)`, `(importall A)` | one statement per path |
//! | `(export a b)`, `(toplevel forms...)` | `Form::Export`, `Form::Toplevel` |
//! | `(= x v)`, `(const x v)`, `(block forms...)` | assignment, constant, block |
//! | `(method f (x (:: y T)) (S (<: U B)) body)` | method definition |
//! | `(abstract Name super)`, `(struct (curly Name T) super)` | type declarations |
//! | `(static_typeof x)`, `(top name)` | type query, base-relative reference |
//! | `(while cond body...)`, `(curly ...)`, `(:: ...)`, `(<: ...)` | custom heads |
//! | `(f args...)` | call |
//!
//! `;` starts a comment that runs to the end of the line. Nesting depth is
//! bounded by memory, not by the native stack.
//!
//! # Errors
//!
//! Malformed input is reported in-band: the reader yields one
//! `Form::SyntaxError` (or `Form::Incomplete` when input ends inside a
//! datum) and then ends the stream.

use std::sync::Arc;

use weft_eval::{ensure_sufficient_stack, SourceParser};
use weft_ir::{Form, FormSource, Head, Literal, Name, SharedInterner};
use weft_runtime::Runtime;

/// Parser that produces a [`Reader`] over the source text.
#[derive(Copy, Clone, Debug, Default)]
pub struct SexprParser;

impl SourceParser for SexprParser {
    fn parse(&mut self, rt: &Runtime, _name: &str, text: &str) -> Box<dyn FormSource> {
        Box::new(Reader::new(Arc::clone(&rt.interner), text))
    }
}

/// A datum before lowering.
#[derive(Clone, Debug, PartialEq)]
enum Datum {
    Int(i64),
    Float(f64),
    Str(String),
    Atom(String),
    List(Vec<Datum>),
}

/// Why a datum could not be read.
#[derive(Clone, Debug, PartialEq, Eq)]
enum ReadError {
    /// Input ended inside a datum.
    Incomplete(String),
    Syntax(String),
}

/// Lazy form stream over one source text.
pub struct Reader {
    interner: SharedInterner,
    text: String,
    pos: usize,
    /// Line of the cursor.
    line: u32,
    /// Line the most recently yielded form started on.
    form_line: u32,
    done: bool,
}

impl Reader {
    pub fn new(interner: SharedInterner, text: &str) -> Self {
        Reader {
            interner,
            text: text.to_string(),
            pos: 0,
            line: 1,
            form_line: 0,
            done: false,
        }
    }

    // Cursor

    #[inline]
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c == ';' {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.bump();
                }
            } else if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    // Datums

    fn read_datum(&mut self) -> Result<Datum, ReadError> {
        self.skip_trivia();
        match self.peek() {
            None => Err(ReadError::Incomplete(
                "incomplete: premature end of input".to_string(),
            )),
            Some('(') => {
                self.bump();
                ensure_sufficient_stack(|| self.read_list())
            }
            Some(')') => {
                self.bump();
                Err(ReadError::Syntax("unexpected \")\"".to_string()))
            }
            Some('"') => {
                self.bump();
                self.read_string()
            }
            Some(_) => Ok(self.read_atom()),
        }
    }

    fn read_list(&mut self) -> Result<Datum, ReadError> {
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                None => {
                    return Err(ReadError::Incomplete(
                        "incomplete: premature end of input".to_string(),
                    ))
                }
                Some(')') => {
                    self.bump();
                    return Ok(Datum::List(items));
                }
                Some(_) => items.push(self.read_datum()?),
            }
        }
    }

    fn read_string(&mut self) -> Result<Datum, ReadError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(ReadError::Incomplete(
                        "incomplete: unterminated string literal".to_string(),
                    ))
                }
                Some('"') => return Ok(Datum::Str(out)),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('0') => out.push('\0'),
                    Some(c @ ('"' | '\\')) => out.push(c),
                    Some(c) => {
                        return Err(ReadError::Syntax(format!(
                            "invalid escape sequence \\{c}"
                        )))
                    }
                    None => {
                        return Err(ReadError::Incomplete(
                            "incomplete: unterminated string literal".to_string(),
                        ))
                    }
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn read_atom(&mut self) -> Datum {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| !c.is_whitespace() && !matches!(c, '(' | ')' | '"' | ';'))
        {
            self.bump();
        }
        let text = &self.text[start..self.pos];
        classify_atom(text)
    }

    // Lowering

    fn intern(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    fn symbol(&self, s: &str) -> Form {
        Form::Symbol(self.intern(s))
    }

    fn lower(&self, datum: &Datum) -> Result<Form, String> {
        match datum {
            Datum::Int(n) => Ok(Form::int(*n)),
            Datum::Float(x) => Ok(Form::Literal(Literal::Float(*x))),
            Datum::Str(s) => Ok(Form::Literal(Literal::Str(s.clone()))),
            Datum::Atom(a) => Ok(match a.as_str() {
                "true" => Form::Literal(Literal::Bool(true)),
                "false" => Form::Literal(Literal::Bool(false)),
                "nothing" => Form::Null,
                _ => self.symbol(a),
            }),
            Datum::List(items) => ensure_sufficient_stack(|| self.lower_list(items)),
        }
    }

    fn lower_all(&self, items: &[Datum]) -> Result<Vec<Form>, String> {
        items.iter().map(|d| self.lower(d)).collect()
    }

    fn lower_list(&self, items: &[Datum]) -> Result<Form, String> {
        let Some((head, args)) = items.split_first() else {
            return Err("empty expression ()".to_string());
        };
        let Datum::Atom(keyword) = head else {
            return Ok(Form::call(self.lower(head)?, self.lower_all(args)?));
        };

        let expr = |head: Head, args: Vec<Form>| Form::Expr { head, args };
        Ok(match keyword.as_str() {
            "module" | "baremodule" => {
                let std_imports = keyword == "module";
                let (name, body) = args
                    .split_first()
                    .ok_or_else(|| format!("expected a name after {keyword}"))?;
                Form::Module(vec![
                    Form::Literal(Literal::Bool(std_imports)),
                    self.lower(name)?,
                    Form::block(self.lower_all(body)?),
                ])
            }
            "import" => self.path_statements(args, Form::Import)?,
            "using" => self.path_statements(args, Form::Using)?,
            "importall" => self.path_statements(args, Form::ImportAll)?,
            "export" => Form::Export(self.lower_all(args)?),
            "toplevel" => Form::Toplevel(self.lower_all(args)?),
            "=" => expr(Head::Assign, self.lower_all(args)?),
            "const" => expr(Head::Const, self.lower_all(args)?),
            "block" => Form::block(self.lower_all(args)?),
            "abstract" => expr(Head::Abstract, self.lower_all(args)?),
            "struct" => expr(Head::Struct, self.lower_all(args)?),
            "static_typeof" => expr(Head::StaticTypeof, self.lower_all(args)?),
            "method" => expr(Head::Method, self.method_parts(args)?),
            "top" => match args {
                [Datum::Atom(name)] => Form::TopRef(self.intern(name)),
                _ => return Err("expected a single name after top".to_string()),
            },
            "while" | "curly" | "::" | "<:" => {
                expr(Head::Custom(self.intern(keyword)), self.lower_all(args)?)
            }
            _ => Form::call(self.symbol(keyword), self.lower_all(args)?),
        })
    }

    /// Parameter and static parameter lists of a method are plain lists, not
    /// calls.
    fn method_parts(&self, args: &[Datum]) -> Result<Vec<Form>, String> {
        args.iter()
            .enumerate()
            .map(|(i, datum)| match datum {
                Datum::List(items) if i == 1 || i == 2 => Ok(Form::block(self.lower_all(items)?)),
                other => self.lower(other),
            })
            .collect()
    }

    /// One statement per dotted path; several paths splice into a
    /// `toplevel` form.
    fn path_statements(
        &self,
        args: &[Datum],
        statement: fn(Vec<Form>) -> Form,
    ) -> Result<Form, String> {
        let mut statements = args
            .iter()
            .map(|datum| match datum {
                Datum::Atom(path) => self.dotted_path(path).map(statement),
                _ => Err("expected a dotted module path".to_string()),
            })
            .collect::<Result<Vec<_>, _>>()?;
        match statements.len() {
            0 => Err("expected a module path".to_string()),
            1 => Ok(statements.remove(0)),
            _ => Ok(Form::Toplevel(statements)),
        }
    }

    /// `..A.b` becomes `[., ., A, b]`.
    fn dotted_path(&self, path: &str) -> Result<Vec<Form>, String> {
        let rest = path.trim_start_matches('.');
        let hops = path.len() - rest.len();
        let mut segments: Vec<Form> = (0..hops).map(|_| Form::Symbol(Name::DOT)).collect();
        if rest.is_empty() {
            return Ok(segments);
        }
        for segment in rest.split('.') {
            if segment.is_empty() {
                return Err(format!("invalid module path {path}"));
            }
            segments.push(self.symbol(segment));
        }
        Ok(segments)
    }
}

/// Integers and floats start with a digit, optionally after a `-`.
fn classify_atom(text: &str) -> Datum {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.starts_with(|c: char| c.is_ascii_digit()) {
        if let Ok(n) = text.parse::<i64>() {
            return Datum::Int(n);
        }
        if let Ok(x) = text.parse::<f64>() {
            return Datum::Float(x);
        }
    }
    Datum::Atom(text.to_string())
}

impl FormSource for Reader {
    fn next_form(&mut self) -> Option<Form> {
        if self.done {
            return None;
        }
        self.skip_trivia();
        self.peek()?;
        self.form_line = self.line;
        let form = match self.read_datum() {
            Ok(datum) => self.lower(&datum).unwrap_or_else(Form::SyntaxError),
            Err(ReadError::Syntax(message)) => Form::SyntaxError(message),
            Err(ReadError::Incomplete(message)) => Form::Incomplete(message),
        };
        if matches!(form, Form::SyntaxError(_) | Form::Incomplete(_)) {
            tracing::debug!(line = self.form_line, "reader stopped at a syntax error");
            self.done = true;
        }
        Some(form)
    }

    fn line(&self) -> u32 {
        self.form_line
    }
}
