pub mod applicants;
pub mod intake;
