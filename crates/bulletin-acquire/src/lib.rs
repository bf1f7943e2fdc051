pub mod config;
pub mod error;
pub mod markers;
pub mod output;
pub mod session;

pub use config::{ClientConfig, DeploymentMode, PortalConfig, ProxyConfig, ProxyCredentials};
pub use error::{FetchError, Step};
pub use session::{fetch_grades, PortalSession};
