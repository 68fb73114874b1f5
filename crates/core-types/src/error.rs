use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid value for {field}: {value} (must be greater than zero)")]
    InvalidValue { field: &'static str, value: String },
}
