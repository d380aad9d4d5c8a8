use std::fmt;
use std::path::{Component, Path};

/// A single field-level validation failure: the field that failed and the
/// kind of constraint it violated. Rendered messages are derived from the
/// pair instead of parsing framework error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub kind: ViolationKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    Required,
    TooLong(usize),
    OutOfRange { min: i32, max: i32 },
    InvalidFormat(&'static str),
}

impl FieldViolation {
    pub fn new(field: &'static str, kind: ViolationKind) -> Self {
        Self { field, kind }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ViolationKind::Required => write!(f, "{} is required", self.field),
            ViolationKind::TooLong(max) => {
                write!(f, "{} must be at most {} characters", self.field, max)
            }
            ViolationKind::OutOfRange { min, max } => {
                write!(f, "{} must be between {} and {}", self.field, min, max)
            }
            ViolationKind::InvalidFormat(hint) => write!(f, "{} {}", self.field, hint),
        }
    }
}

impl std::error::Error for FieldViolation {}

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 500;
pub const MAX_STORAGE_PATH_LEN: usize = 500;
pub const MAX_TAG_NAME_LEN: usize = 50;

pub fn validate_name(field: &'static str, value: &str, max: usize) -> Result<(), FieldViolation> {
    if value.is_empty() {
        return Err(FieldViolation::new(field, ViolationKind::Required));
    }
    if value.chars().count() > max {
        return Err(FieldViolation::new(field, ViolationKind::TooLong(max)));
    }
    Ok(())
}

pub fn validate_description(value: &str) -> Result<(), FieldViolation> {
    if value.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(FieldViolation::new(
            "description",
            ViolationKind::TooLong(MAX_DESCRIPTION_LEN),
        ));
    }
    Ok(())
}

/// Validates a user-supplied library storage path.
///
/// This is advisory allowlist-by-rejection, not a sandbox: it catches empty
/// paths, lexical `..` traversal, the filesystem root, and sensitive system
/// prefixes. Symlink escapes and validate-then-use races are out of scope.
pub fn validate_storage_path(value: &str) -> Result<(), FieldViolation> {
    if value.is_empty() {
        return Err(FieldViolation::new("storage_path", ViolationKind::Required));
    }
    if value.chars().count() > MAX_STORAGE_PATH_LEN {
        return Err(FieldViolation::new(
            "storage_path",
            ViolationKind::TooLong(MAX_STORAGE_PATH_LEN),
        ));
    }

    let path = Path::new(value);
    let mut has_normal = false;
    for component in path.components() {
        match component {
            Component::ParentDir => {
                return Err(FieldViolation::new(
                    "storage_path",
                    ViolationKind::InvalidFormat("must not contain '..' segments"),
                ));
            }
            Component::Normal(_) => has_normal = true,
            _ => {}
        }
    }
    if !has_normal {
        // Catches "/", "." and "./" — nothing usable to create.
        return Err(FieldViolation::new(
            "storage_path",
            ViolationKind::InvalidFormat("is not a usable directory path"),
        ));
    }

    const DENIED_PREFIXES: [&str; 5] = ["/etc", "/sys", "/proc", "/dev", "/boot"];
    for prefix in DENIED_PREFIXES {
        if value == prefix || value.starts_with(&format!("{}/", prefix)) {
            return Err(FieldViolation::new(
                "storage_path",
                ViolationKind::InvalidFormat("points into a protected system directory"),
            ));
        }
    }

    Ok(())
}

/// Optional 7-character hex color like "#FF0000".
pub fn validate_color(value: &str) -> Result<(), FieldViolation> {
    let valid = value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(FieldViolation::new(
            "color",
            ViolationKind::InvalidFormat("must be a 7-character hex color (e.g., #FF0000)"),
        ));
    }
    Ok(())
}

pub fn validate_rating(value: i32) -> Result<(), FieldViolation> {
    if !(0..=5).contains(&value) {
        return Err(FieldViolation::new(
            "rating",
            ViolationKind::OutOfRange { min: 0, max: 5 },
        ));
    }
    Ok(())
}

/// Splits a comma-delimited tag list, trimming whitespace and dropping
/// empty entries.
pub fn parse_tag_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
