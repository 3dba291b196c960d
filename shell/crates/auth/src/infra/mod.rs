//! Infrastructure Layer
//!
//! Backend implementations and the simulated browser.

pub mod browser;
pub mod configured_backend;
pub mod http_backend;
pub mod mock_backend;

pub use browser::{DocumentCookies, OriginStorage, PageEvent, SimulatedBrowser, SimulatedPage};
pub use configured_backend::ConfiguredBackend;
pub use http_backend::HttpAuthBackend;
pub use mock_backend::MockAuthBackend;
