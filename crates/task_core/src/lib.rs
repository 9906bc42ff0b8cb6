pub mod codec;
pub mod config;
pub mod error;
pub mod model;
pub mod storage;
pub mod task_api;

#[cfg(test)]
mod tests {
    use crate::error::AppError;

    #[test]
    fn app_error_exposes_code() {
        let err = AppError::validation("Description cannot be empty");
        assert_eq!(err.code(), "validation_error");
        assert_eq!(err.message(), "Description cannot be empty");
        assert_eq!(
            err.to_string(),
            "validation_error - Description cannot be empty"
        );
    }

    #[test]
    fn app_error_maps_exit_codes() {
        assert_eq!(AppError::parse("bad id").exit_code(), 2);
        assert_eq!(AppError::validation("empty").exit_code(), 2);
        assert_eq!(AppError::not_found("missing").exit_code(), 3);
        assert_eq!(AppError::io("disk full").exit_code(), 1);
        assert_eq!(AppError::invalid_data("corrupt").exit_code(), 1);
    }
}
