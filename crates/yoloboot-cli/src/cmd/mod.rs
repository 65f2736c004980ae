pub mod doctor;
pub mod logs;
pub mod status;
pub mod up;
