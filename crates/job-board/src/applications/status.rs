use serde::{Deserialize, Serialize};

/// Lifecycle of an application as seen by the student and the hiring company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Reviewed,
    Interview,
    Offered,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        Self::Pending,
        Self::Reviewed,
        Self::Interview,
        Self::Offered,
        Self::Rejected,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Reviewed => "reviewed",
            Self::Interview => "interview",
            Self::Offered => "offered",
            Self::Rejected => "rejected",
        }
    }

    /// Case-insensitive lookup by status name.
    pub fn parse(value: &str) -> Option<Self> {
        let wanted = value.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(wanted))
    }

    /// Statuses reachable in one step. Progress only moves forward; offers and rejections
    /// are final.
    pub const fn allowed_next(self) -> &'static [ApplicationStatus] {
        match self {
            Self::Pending => &[Self::Reviewed, Self::Interview, Self::Offered, Self::Rejected],
            Self::Reviewed => &[Self::Interview, Self::Offered, Self::Rejected],
            Self::Interview => &[Self::Offered, Self::Rejected],
            Self::Offered | Self::Rejected => &[],
        }
    }

    pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_next().is_empty()
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
