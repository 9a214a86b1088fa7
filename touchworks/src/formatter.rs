use colored::*;
use std::fmt::Display;
use touchworks_core::{
    Error,
    magic::{Action, Param},
    session::SecurityToken,
};

/// A wrapper struct for a formatted, colored string.
///
/// Implements `Display` so it can be printed directly.
pub struct FormattedString(pub String);

pub struct ActionList(pub &'static [Action]);

pub struct TokenInfo(pub SecurityToken);

pub struct GenericError<T: Display>(pub &'static str, pub T);

impl std::fmt::Display for FormattedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        writeln!(f, "{}", self.0)?;
        Ok(())
    }
}

impl From<serde_json::Value> for FormattedString {
    fn from(value: serde_json::Value) -> Self {
        FormattedString(serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string()))
    }
}

impl From<Error> for FormattedString {
    fn from(err: Error) -> Self {
        let title = match &err {
            Error::Configuration(_) => "Invalid Configuration:",
            Error::Authentication(_) => "Authentication Failed:",
            Error::Validation(_) => "Invalid Arguments:",
            Error::Transport(_) => "Request Failed:",
            Error::Action { .. } => "Action Failed:",
            Error::Protocol => "Unexpected Response:",
        };
        FormattedString(format!("{}\n\n'{}'", title.red().bold(), err))
    }
}

impl From<anyhow::Error> for FormattedString {
    fn from(err: anyhow::Error) -> Self {
        FormattedString(format!("{}\n\n'{:#}'", "Error:".red().bold(), err))
    }
}

impl<T: Display> From<GenericError<T>> for FormattedString {
    fn from(GenericError(msg, err): GenericError<T>) -> Self {
        FormattedString(format!("{}:\n\n'{}'", msg.red().bold(), err))
    }
}

impl From<ActionList> for FormattedString {
    fn from(ActionList(actions): ActionList) -> Self {
        if actions.is_empty() {
            return FormattedString("No actions found.".yellow().to_string());
        }

        let width = actions.iter().map(|a| a.name.len()).max().unwrap_or(0);

        let mut out = String::new();
        out.push_str("Available Actions:\n");
        for action in actions {
            let name = format!("{:width$}", action.name);
            out.push_str(&format!("  - {}  {}\n", name.green(), action.result_key.dimmed()));
        }
        FormattedString(out.trim_end().to_string())
    }
}

impl From<&Action> for FormattedString {
    fn from(action: &Action) -> Self {
        let mut out = String::new();
        out.push_str(&format!(
            "{} {} -> {}\n",
            "action".cyan(),
            action.name.green(),
            action.result_key
        ));

        if action.uses_patient {
            out.push_str(&format!("  {}\n", "takes a patient id (--patient)".dimmed()));
        }

        if action.params.is_empty() {
            out.push_str(&format!("  {}", "no parameters".dimmed()));
            return FormattedString(out);
        }

        for param in action.params {
            out.push_str(&format!("  {}\n", describe_param(param)));
        }
        FormattedString(out.trim_end().to_string())
    }
}

fn describe_param(param: &Param) -> String {
    let mut line = format!(
        "{} {}",
        param.slot.wire_name().dimmed(),
        param.name.yellow()
    );

    if param.required {
        line.push_str(&format!(" {}", "required".red()));
    }
    if !param.default.is_empty() {
        line.push_str(&format!(" = \"{}\"", param.default));
    }
    if !param.allowed.is_empty() {
        line.push_str(&format!(" (one of: {})", param.allowed.join(", ")));
    }
    line
}

impl From<TokenInfo> for FormattedString {
    fn from(TokenInfo(token): TokenInfo) -> Self {
        FormattedString(format!(
            "{} {} at {}",
            "Token acquired:".green().bold(),
            token.masked(),
            token.acquired_at().to_rfc3339()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use touchworks_core::magic::catalog;

    #[test]
    fn describe_lists_slots_defaults_and_allowed_values() {
        colored::control::set_override(false);

        let FormattedString(text) = FormattedString::from(&catalog::SAVE_NOTE);

        assert!(text.starts_with("action SaveNote -> savenoteinfo"));
        assert!(
            text.contains("Parameter3 document_status = \"Unsigned\" (one of: Unsigned, Final)")
        );
        assert!(text.contains("takes a patient id"));
    }

    #[test]
    fn action_list_shows_every_action() {
        colored::control::set_override(false);

        let FormattedString(text) = FormattedString::from(ActionList(catalog::ACTIONS));

        for action in catalog::ACTIONS {
            assert!(text.contains(action.name));
        }
    }

    #[test]
    fn action_error_keeps_the_vendor_message() {
        colored::control::set_override(false);

        let err = Error::Action {
            action: "GetPatient".into(),
            message: "bad patient id".into(),
        };
        let FormattedString(text) = FormattedString::from(err);

        assert!(text.starts_with("Action Failed:"));
        assert!(text.contains("bad patient id"));
    }
}
