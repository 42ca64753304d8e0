//! CLI commands implementation

pub mod init;
pub mod report;
pub mod run;
pub mod status;

pub use init::*;
pub use report::*;
pub use run::*;
pub use status::*;
