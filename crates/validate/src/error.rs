/// Errors raised while loading or checking a rule set.
#[derive(Debug, thiserror::Error)]
pub enum RuleSetError {
    /// The rule set text could not be parsed (includes invalid regex patterns).
    #[error("could not parse rule set: {0}")]
    Parse(String),

    /// Two rules share an anchor.
    #[error("duplicate rule anchor '{0}'")]
    DuplicateAnchor(String),

    /// A rule with an empty anchor or an `any_of` subject with no fields.
    #[error("rule '{anchor}' is malformed: {reason}")]
    Malformed { anchor: String, reason: String },

    #[error("could not serialize rule set: {0}")]
    Serialize(String),
}
