use super::label::StatusLabel;

/// Keyword cues per label, in priority order. The first row with any hit
/// wins: interview intent outranks rejection wording, which outranks
/// acknowledgement boilerplate.
pub const CUE_TABLE: &[(StatusLabel, &[&str])] = &[
    (
        StatusLabel::Interview,
        &[
            "interview",
            "schedule a call",
            "looking forward to speaking",
            "invite you to interview",
        ],
    ),
    (
        StatusLabel::Rejected,
        &[
            "unfortunately",
            "regret to inform",
            "move forward with other candidates",
            "not selected",
            "will not be proceeding",
        ],
    ),
    (
        StatusLabel::ApplicationReceived,
        &[
            "thank you for your application",
            "we have received your application",
            "your application has been received",
        ],
    ),
];

/// Deterministic fallback classifier over `subject + " " + body`.
pub fn match_cues(text: &str) -> StatusLabel {
    let folded = text.to_lowercase();

    CUE_TABLE
        .iter()
        .find(|(_, cues)| cues.iter().any(|cue| folded.contains(cue)))
        .map(|(label, _)| *label)
        .unwrap_or(StatusLabel::Unknown)
}
