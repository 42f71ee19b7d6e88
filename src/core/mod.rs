pub mod checks;
pub mod inspect;
pub mod report;
pub mod verifier;

pub use crate::domain::model::{CheckReport, Finding, Level, Stage, VerificationReport};
pub use crate::domain::ports::{CommandRunner, ConfigProvider, InferenceServer, ReportSink};
pub use crate::utils::error::Result;
