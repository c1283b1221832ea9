/// The interactive prompts an operation may need: a yes/no confirmation
/// before destructive actions, and a blocking alert for failures.
pub trait Surface {
    fn confirm(&mut self, message: &str) -> bool;
    fn alert(&mut self, message: &str);
}

/// Answers every confirmation with yes and records alerts.
///
/// Used for non-interactive runs (`--yes`).
#[derive(Debug, Default)]
pub struct AssumeYes {
    pub alerts: Vec<String>,
}

impl Surface for AssumeYes {
    fn confirm(&mut self, _message: &str) -> bool {
        true
    }

    fn alert(&mut self, message: &str) {
        tracing::warn!(message, "alert");
        self.alerts.push(message.to_string());
    }
}
