pub mod clock;
pub mod db_utils;
pub mod email_index;
pub mod time_input;
