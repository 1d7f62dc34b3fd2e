pub mod beacon;
pub mod cli;
pub mod descriptor;
pub mod registration;
pub mod sweeper;

// re-export selected public API
pub use registration::RegistrationRunner;
pub use sweeper::SweeperRunner;
