use serde::Serialize;

/// Planning failures.
///
/// `InvalidDimension` aborts the whole run before planning starts. The
/// category, family, measurement and fit errors only fail the requirement
/// they belong to. `RecursionLimitExceeded` never leaves the linear planner:
/// it is how the exact-combination search reports that it gave up.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("invalid dimension in requirement '{requirement}': {detail}")]
    InvalidDimension { requirement: String, detail: String },

    #[error("no stock of category '{category}' in material family '{family}'")]
    UnknownMaterialCategory { family: String, category: String },

    #[error("unknown material family '{0}'")]
    UnknownFamily(String),

    #[error("material family '{family}' cannot be measured as {measurement}")]
    UnsupportedMeasurement { family: String, measurement: String },

    #[error("no stock of category '{category}' fits a {length} mm unit")]
    NoFittingStock { category: String, length: u32 },

    #[error("no exact combination of at most {depth} bars covers {length} mm")]
    RecursionLimitExceeded { length: u32, depth: usize },
}

impl PlanError {
    pub fn invalid(requirement: &str, detail: impl Into<String>) -> Self {
        PlanError::InvalidDimension {
            requirement: requirement.to_string(),
            detail: detail.into(),
        }
    }

    /// Whether this error fails the whole run rather than one requirement.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PlanError::InvalidDimension { .. })
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PlanError::InvalidDimension { .. } => ErrorKind::InvalidDimension,
            PlanError::UnknownMaterialCategory { .. } => ErrorKind::UnknownMaterialCategory,
            PlanError::UnknownFamily(_) => ErrorKind::UnknownFamily,
            PlanError::UnsupportedMeasurement { .. } => ErrorKind::UnsupportedMeasurement,
            PlanError::NoFittingStock { .. } => ErrorKind::NoFittingStock,
            PlanError::RecursionLimitExceeded { .. } => ErrorKind::RecursionLimitExceeded,
        }
    }
}

/// Serializable tag of a [`PlanError`], used in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidDimension,
    UnknownMaterialCategory,
    UnknownFamily,
    UnsupportedMeasurement,
    NoFittingStock,
    RecursionLimitExceeded,
}

pub type Result<T> = std::result::Result<T, PlanError>;
