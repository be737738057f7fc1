//! Tree-walking execution shared by the interpreter and compiled code.
//!
//! The two differ only in `compiled`: interpreted code may not call
//! intrinsics, evaluate `static_typeof`, or create closures.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use weft_ir::{Form, Head, LabelId, Literal, Name, Stmt, Thunk};
use weft_runtime::{
    Closure, EvalError, EvalResult, FunctionId, Lambda, ModuleId, Runtime, Ty, TypeId, TypeTable,
    TypeVar, Value,
};

use super::intrinsics;
use super::print::PrintHandler;
use crate::define::{define_method, set_supertype, MethodDef, MethodSlot};
use crate::errors::{malformed, not_callable, syntax_error, type_mismatch};
use crate::stack::ensure_sufficient_stack;

pub(super) struct Exec<'a> {
    rt: &'a mut Runtime,
    module: ModuleId,
    compiled: bool,
    print: &'a PrintHandler,
    /// Names assignments write locally instead of to globals.
    declared: Vec<Name>,
    locals: FxHashMap<Name, Value>,
}

impl<'a> Exec<'a> {
    pub(super) fn new(
        rt: &'a mut Runtime,
        module: ModuleId,
        compiled: bool,
        print: &'a PrintHandler,
    ) -> Self {
        Exec {
            rt,
            module,
            compiled,
            print,
            declared: Vec::new(),
            locals: FxHashMap::default(),
        }
    }

    pub(super) fn declare(mut self, names: impl IntoIterator<Item = Name>) -> Self {
        self.declared.extend(names);
        self
    }

    /// Run a lowered statement sequence; the value is that of the last
    /// plain statement executed.
    pub(super) fn run(&mut self, body: &[Stmt]) -> EvalResult {
        let labels: FxHashMap<LabelId, usize> = body
            .iter()
            .enumerate()
            .filter_map(|(pc, stmt)| match stmt {
                Stmt::Label(label) => Some((*label, pc)),
                _ => None,
            })
            .collect();
        let jump = |label: LabelId| {
            labels
                .get(&label)
                .copied()
                .ok_or_else(|| EvalError::new(format!("jump to unknown label {label}")))
        };

        let mut pc = 0;
        let mut last = Value::Nothing;
        while let Some(stmt) = body.get(pc) {
            pc += 1;
            match stmt {
                Stmt::Expr(form) => last = self.eval(form)?,
                Stmt::Label(_) => {}
                Stmt::Goto(target) => pc = jump(*target)?,
                Stmt::GotoIfNot { cond, target } => {
                    if !self.condition(cond)? {
                        last = Value::Nothing;
                        pc = jump(*target)?;
                    }
                }
            }
        }
        Ok(last)
    }

    fn condition(&mut self, cond: &Form) -> Result<bool, EvalError> {
        match self.eval(cond)? {
            Value::Bool(b) => Ok(b),
            other => Err(type_mismatch("if", "Bool", other.kind_name())),
        }
    }

    pub(super) fn eval(&mut self, form: &Form) -> EvalResult {
        match form {
            Form::Literal(lit) => Ok(literal(lit)),
            Form::Symbol(name) => self.lookup(*name),
            Form::TopRef(name) => {
                let base = self.rt.base_relative_to(self.module);
                self.rt.eval_global(base, *name)
            }
            Form::Null => Ok(Value::Nothing),
            Form::SyntaxError(message) | Form::Incomplete(message) => {
                Err(syntax_error(message.clone()))
            }
            Form::Body(body) => self.run(body),
            Form::Thunk(thunk) => self.closure(thunk),
            Form::Expr { head, args } => ensure_sufficient_stack(|| self.eval_expr(*head, args)),
            Form::Module(_) => Err(not_at_toplevel("module")),
            Form::Import(_) => Err(not_at_toplevel("import")),
            Form::Using(_) => Err(not_at_toplevel("using")),
            Form::ImportAll(_) => Err(not_at_toplevel("importall")),
            Form::Export(_) => Err(not_at_toplevel("export")),
            Form::Toplevel(_) => Err(not_at_toplevel("toplevel")),
        }
    }

    fn eval_expr(&mut self, head: Head, args: &[Form]) -> EvalResult {
        match head {
            Head::Call => {
                let [callee, rest @ ..] = args else {
                    return Err(malformed("call"));
                };
                let callee = self.eval(callee)?;
                let values = rest
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call(&callee, &values)
            }
            Head::Assign => {
                let [Form::Symbol(name), value] = args else {
                    return Err(malformed("="));
                };
                let value = self.eval(value)?;
                self.assign(*name, value.clone())?;
                Ok(value)
            }
            Head::Const => {
                let [Form::Symbol(name), value] = args else {
                    return Err(malformed("const"));
                };
                let value = self.eval(value)?;
                self.rt.set_const(self.module, *name, value.clone())?;
                Ok(value)
            }
            Head::Block => {
                let mut last = Value::Nothing;
                for arg in args {
                    last = self.eval(arg)?;
                }
                Ok(last)
            }
            Head::Method => self.define(args),
            Head::Abstract => self.declare_type(args, true),
            Head::Struct => self.declare_type(args, false),
            Head::StaticTypeof => {
                if !self.compiled {
                    return Err(EvalError::new("static_typeof cannot be interpreted"));
                }
                let [arg] = args else {
                    return Err(malformed("static_typeof"));
                };
                let value = self.eval(arg)?;
                Ok(Value::data_type(type_family(&self.rt.types, &value)))
            }
            Head::Custom(name) => match self.rt.name_str(name) {
                "curly" => self.curly(args),
                other => Err(EvalError::new(format!("unsupported expression head {other}"))),
            },
        }
    }

    fn lookup(&mut self, name: Name) -> EvalResult {
        match self.locals.get(&name) {
            Some(value) => Ok(value.clone()),
            None => self.rt.eval_global(self.module, name),
        }
    }

    fn assign(&mut self, name: Name, value: Value) -> Result<(), EvalError> {
        if self.declared.contains(&name) {
            self.locals.insert(name, value);
            Ok(())
        } else {
            self.rt.set_global(self.module, name, value)
        }
    }

    fn closure(&mut self, thunk: &Arc<Thunk>) -> EvalResult {
        if !self.compiled {
            return Err(EvalError::new("closures cannot be interpreted"));
        }
        Ok(Value::Closure(Arc::new(Closure {
            thunk: Arc::clone(thunk),
            module: self.module,
            inferred: true,
        })))
    }

    fn call(&mut self, callee: &Value, args: &[Value]) -> EvalResult {
        match callee {
            Value::Intrinsic(name) if self.compiled => {
                intrinsics::call(self.rt.name_str(*name), args, self.print)
            }
            Value::Intrinsic(name) => Err(EvalError::new(format!(
                "intrinsic {} cannot be interpreted",
                self.rt.name_str(*name)
            ))),
            _ => apply(self.rt, self.print, callee, args),
        }
    }

    /// `(method f (params...) (sparams...) body)`
    fn define(&mut self, args: &[Form]) -> EvalResult {
        let [Form::Symbol(fname), Form::Expr {
            head: Head::Block,
            args: params,
        }, Form::Expr {
            head: Head::Block,
            args: sparams,
        }, body] = args
        else {
            return Err(malformed("method"));
        };

        let mut static_params = Vec::with_capacity(sparams.len());
        for sparam in sparams {
            static_params.push(self.static_parameter(sparam)?);
        }
        let vars: Vec<Arc<TypeVar>> = static_params
            .iter()
            .filter_map(|v| match v {
                Value::TypeVar(tv) => Some(Arc::clone(tv)),
                _ => None,
            })
            .collect();
        let (arg_names, signature) = self.with_type_vars(&vars, |exec| exec.parameters(params))?;

        let body = match body {
            Form::Thunk(thunk) => Arc::clone(thunk),
            other => Arc::new(Thunk::wrap(other.clone())),
        };
        let (file, line) = self.rt.location();
        let def = MethodDef {
            signature,
            static_params,
            lambda: Arc::new(Lambda {
                arg_names,
                module: self.module,
                file,
                line,
                body,
            }),
        };

        let id = if self.declared.contains(fname) {
            let mut cell = self.locals.get(fname).cloned();
            let id = define_method(self.rt, *fname, MethodSlot::Local(&mut cell), def)?;
            if let Some(value) = cell {
                self.locals.insert(*fname, value);
            }
            id
        } else {
            let slot = MethodSlot::Global {
                module: self.module,
            };
            define_method(self.rt, *fname, slot, def)?
        };
        Ok(Value::Function(id))
    }

    /// `T`, `(<: T bound)`, or any expression (which the definer rejects
    /// unless it evaluates to a type variable).
    fn static_parameter(&mut self, form: &Form) -> EvalResult {
        match form {
            Form::Symbol(name) => Ok(Value::TypeVar(TypeVar::new(*name))),
            Form::Expr {
                head: Head::Custom(h),
                args,
            } if self.rt.name_str(*h) == "<:" => {
                let [Form::Symbol(name), bound] = args.as_slice() else {
                    return Err(malformed("method"));
                };
                let upper = self.eval(bound)?;
                Ok(Value::TypeVar(Arc::new(TypeVar {
                    name: *name,
                    upper: Some(upper),
                })))
            }
            other => self.eval(other),
        }
    }

    /// Argument names and types; `x` alone means `x` of type `Any`.
    fn parameters(&mut self, params: &[Form]) -> Result<(Vec<Name>, Vec<Value>), EvalError> {
        let any = Value::data_type(self.rt.types.builtins().any);
        let mut names = Vec::with_capacity(params.len());
        let mut types = Vec::with_capacity(params.len());
        for param in params {
            match param {
                Form::Symbol(name) => {
                    names.push(*name);
                    types.push(any.clone());
                }
                Form::Expr {
                    head: Head::Custom(h),
                    args,
                } if self.rt.name_str(*h) == "::" => {
                    let [Form::Symbol(name), ty] = args.as_slice() else {
                        return Err(malformed("method"));
                    };
                    names.push(*name);
                    types.push(self.eval(ty)?);
                }
                _ => return Err(malformed("method")),
            }
        }
        Ok((names, types))
    }

    /// Evaluate with type variables visible as locals, restoring whatever
    /// they shadowed afterwards.
    fn with_type_vars<R>(
        &mut self,
        vars: &[Arc<TypeVar>],
        f: impl FnOnce(&mut Self) -> Result<R, EvalError>,
    ) -> Result<R, EvalError> {
        let shadowed: Vec<(Name, Option<Value>)> = vars
            .iter()
            .map(|tv| {
                let previous = self.locals.insert(tv.name, Value::TypeVar(Arc::clone(tv)));
                (tv.name, previous)
            })
            .collect();
        let result = f(self);
        for (name, previous) in shadowed.into_iter().rev() {
            match previous {
                Some(value) => self.locals.insert(name, value),
                None => self.locals.remove(&name),
            };
        }
        result
    }

    /// `(abstract Name super)`, `(struct (curly Name T...) super)`; the
    /// supertype is optional.
    fn declare_type(&mut self, args: &[Form], is_abstract: bool) -> EvalResult {
        let statement = if is_abstract { "abstract" } else { "struct" };
        let (name_form, supertype) = match args {
            [name] => (name, None),
            [name, supertype] => (name, Some(supertype)),
            _ => return Err(malformed(statement)),
        };
        let (name, params) = match name_form {
            Form::Symbol(name) => (*name, Vec::new()),
            Form::Expr {
                head: Head::Custom(h),
                args,
            } if self.rt.name_str(*h) == "curly" => {
                let names = args
                    .iter()
                    .map(Form::as_symbol)
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| malformed(statement))?;
                let [name, params @ ..] = names.as_slice() else {
                    return Err(malformed(statement));
                };
                (*name, params.iter().map(|p| TypeVar::new(*p)).collect())
            }
            _ => return Err(malformed(statement)),
        };

        let t = self
            .rt
            .declare_type(self.module, name, params.clone(), is_abstract)?;
        if let Some(supertype) = supertype {
            let candidate = self.with_type_vars(&params, |exec| exec.eval(supertype))?;
            set_supertype(self.rt, t, &candidate)?;
        }
        Ok(Value::Nothing)
    }

    /// `(curly T params...)`: apply a parametric family.
    fn curly(&mut self, args: &[Form]) -> EvalResult {
        let [family, params @ ..] = args else {
            return Err(malformed("curly"));
        };
        let family = self.eval(family)?;
        let id = family
            .as_data_family()
            .ok_or_else(|| type_mismatch("curly", "Type", family.kind_name()))?;
        let params = params
            .iter()
            .map(|p| self.eval(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.rt.types.instantiate(id, params))
    }
}

/// Call a function or closure with intrinsics enabled.
pub(super) fn apply(
    rt: &mut Runtime,
    print: &PrintHandler,
    callee: &Value,
    args: &[Value],
) -> EvalResult {
    match callee {
        Value::Function(id) => call_function(rt, print, *id, args),
        Value::Closure(closure) => Exec::new(rt, closure.module, true, print)
            .declare(closure.thunk.locals.iter().copied())
            .run(&closure.thunk.body),
        Value::Intrinsic(name) => intrinsics::call(rt.name_str(*name), args, print),
        other => Err(not_callable(other)),
    }
}

fn call_function(
    rt: &mut Runtime,
    print: &PrintHandler,
    id: FunctionId,
    args: &[Value],
) -> EvalResult {
    let lambda = select_method(rt, id, args).ok_or_else(|| {
        let kinds: Vec<&str> = args.iter().map(Value::kind_name).collect();
        EvalError::new(format!(
            "no method matching {}({})",
            rt.name_str(rt.functions.get(id).name),
            kinds.join(", ")
        ))
    })?;
    let mut exec = Exec::new(rt, lambda.module, true, print)
        .declare(lambda.arg_names.iter().chain(&lambda.body.locals).copied());
    for (name, value) in lambda.arg_names.iter().zip(args) {
        exec.locals.insert(*name, value.clone());
    }
    exec.run(&lambda.body.body)
}

/// The applicable method with the most non-`Any` entries; the most
/// recently added wins a tie.
fn select_method(rt: &Runtime, id: FunctionId, args: &[Value]) -> Option<Arc<Lambda>> {
    let any = rt.types.builtins().any;
    rt.functions
        .get(id)
        .methods
        .iter()
        .filter(|m| {
            m.signature.len() == args.len()
                && m.signature
                    .iter()
                    .zip(args)
                    .all(|(ty, value)| isa(&rt.types, value, ty))
        })
        .max_by_key(|m| {
            m.signature
                .iter()
                .filter(|ty| ty.as_data_family() != Some(any))
                .count()
        })
        .map(|m| Arc::clone(&m.lambda))
}

fn isa(types: &TypeTable, value: &Value, ty: &Value) -> bool {
    match ty {
        Value::TypeVar(tv) => tv.upper.as_ref().map_or(true, |upper| isa(types, value, upper)),
        Value::Type(t) => match &**t {
            Ty::Data { family, .. } => types.is_subtype_family(type_family(types, value), *family),
            Ty::Union(members) => members.iter().any(|m| isa(types, value, m)),
            Ty::Tuple(_) => false,
        },
        _ => false,
    }
}

fn type_family(types: &TypeTable, value: &Value) -> TypeId {
    let builtins = types.builtins();
    match value {
        Value::Nothing => builtins.nothing,
        Value::Bool(_) => builtins.bool_,
        Value::Int(_) => builtins.int,
        Value::Float(_) => builtins.float,
        Value::Str(_) => builtins.string,
        Value::Type(_) | Value::TypeVar(_) => builtins.type_type,
        _ => builtins.any,
    }
}

fn literal(lit: &Literal) -> Value {
    match lit {
        Literal::Int(n) => Value::Int(*n),
        Literal::Float(x) => Value::Float(*x),
        Literal::Str(s) => Value::string(s),
        Literal::Bool(b) => Value::Bool(*b),
    }
}

#[cold]
fn not_at_toplevel(statement: &str) -> EvalError {
    syntax_error(format!("\"{statement}\" expression not at top level"))
}
