pub mod letter_request;
pub mod letter_type;
pub mod letterhead;
pub mod program;
pub mod staff;
pub mod status;
pub mod student;
