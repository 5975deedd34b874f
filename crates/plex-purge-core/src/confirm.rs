/// Gate for destructive actions. The CLI asks on the terminal; automation
/// passes a pre-supplied answer.
pub trait ConfirmationProvider {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Answers every prompt with a fixed value.
#[derive(Debug, Clone, Copy)]
pub struct PresetConfirmation(pub bool);

impl ConfirmationProvider for PresetConfirmation {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}
