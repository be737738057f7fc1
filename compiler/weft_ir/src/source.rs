//! Form sources: the stream a parser hands to the top-level driver.

use std::collections::VecDeque;

use crate::Form;

/// A lazy, finite, non-restartable sequence of forms.
///
/// `next_form` returns `None` once the source is exhausted. `line` reports the
/// line of the form most recently yielded, which the driver attaches to load
/// errors.
pub trait FormSource {
    /// Yield the next form, or `None` at end of input.
    fn next_form(&mut self) -> Option<Form>;

    /// Line number active for the most recently yielded form.
    fn line(&self) -> u32;
}

/// Form source over an in-memory list, with optional line numbers.
#[derive(Debug, Default)]
pub struct VecSource {
    forms: VecDeque<(u32, Form)>,
    line: u32,
}

impl VecSource {
    /// Forms numbered 1, 2, 3, ... as if each sat on its own line.
    pub fn new(forms: impl IntoIterator<Item = Form>) -> Self {
        let forms = forms
            .into_iter()
            .zip(1u32..)
            .map(|(form, line)| (line, form))
            .collect();
        VecSource { forms, line: 0 }
    }

    /// Forms with explicit line numbers.
    pub fn with_lines(forms: impl IntoIterator<Item = (u32, Form)>) -> Self {
        VecSource {
            forms: forms.into_iter().collect(),
            line: 0,
        }
    }
}

impl FormSource for VecSource {
    fn next_form(&mut self) -> Option<Form> {
        let (line, form) = self.forms.pop_front()?;
        self.line = line;
        Some(form)
    }

    fn line(&self) -> u32 {
        self.line
    }
}
