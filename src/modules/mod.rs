pub mod delivery;
pub mod status;
pub mod upload;
