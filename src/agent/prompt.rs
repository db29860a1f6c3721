//! Input rules of the "Log a task" prompt. The window itself belongs to the platform host; it
//! only asks [classify_char] what to do with a keystroke and sends the raw text back for
//! [validate].

use std::fmt::Display;

/// Identifies a single prompt instance over its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PromptId(pub u64);

impl Display for PromptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "prompt#{}", self.0)
    }
}

/// What the text field should do with a typed character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keystroke {
    Insert,
    /// Swallowed without reaching the field.
    Reject,
    /// Same as pressing the submit button. Swallowed so the field doesn't beep.
    Submit,
}

/// Records are comma separated and never quoted, so a comma can't be part of a task.
pub fn classify_char(ch: char) -> Keystroke {
    match ch {
        ',' => Keystroke::Reject,
        '\r' | '\n' => Keystroke::Submit,
        _ => Keystroke::Insert,
    }
}

/// A task description that is safe to put in the third field of a record: trimmed, non empty,
/// single line, comma free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskText(String);

impl Display for TaskText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptRejection {
    Empty,
    /// Commas can still arrive through the clipboard.
    ContainsComma,
    MultipleLines,
}

impl PromptRejection {
    pub fn title(&self) -> &'static str {
        "Input Required"
    }
}

impl Display for PromptRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PromptRejection::Empty => write!(f, "Please enter a task before logging."),
            PromptRejection::ContainsComma => {
                write!(f, "Task descriptions cannot contain commas.")
            }
            PromptRejection::MultipleLines => {
                write!(f, "Task descriptions must fit on a single line.")
            }
        }
    }
}

pub fn validate(input: &str) -> Result<TaskText, PromptRejection> {
    let text = input.trim();
    if text.is_empty() {
        return Err(PromptRejection::Empty);
    }
    if text.contains(',') {
        return Err(PromptRejection::ContainsComma);
    }
    if text.contains(['\r', '\n']) {
        return Err(PromptRejection::MultipleLines);
    }
    Ok(TaskText(text.to_owned()))
}
