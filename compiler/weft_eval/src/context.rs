//! Ambient module context of an evaluation session.

use weft_runtime::ModuleId;

/// The module new definitions land in, and the module the running task
/// considers current. Both always move together; they are kept separate
/// because embedders may read either.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EvalContext {
    pub module: ModuleId,
    pub task_module: ModuleId,
}

impl EvalContext {
    /// Context with both modules set to `module`.
    pub fn at(module: ModuleId) -> Self {
        EvalContext {
            module,
            task_module: module,
        }
    }
}
