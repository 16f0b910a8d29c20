pub mod decimal_utils;
pub mod retry_utils;
pub mod time_utils;
