pub mod csv_handler;
pub mod password;
pub mod url_validator;
