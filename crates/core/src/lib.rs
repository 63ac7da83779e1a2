pub mod attribution;
pub mod config;
pub mod error;
pub mod explanation;
pub mod record;
pub mod report;

pub use attribution::*;
pub use config::Config;
pub use error::*;
pub use explanation::*;
pub use record::*;
pub use report::*;
