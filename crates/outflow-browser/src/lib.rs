//! Cookie-session browser automation core for Outflow.
//!
//! The crate owns the campaign execution loop and the reply scan. A
//! [`SessionDriver`] seam separates the state machine from the
//! browser: production uses a supervised Node/Playwright child
//! process, tests use scripted drivers. Sessions are scoped -- one
//! isolated headless browser per operation, torn down on every exit
//! path.

pub mod campaign;
pub mod cookie;
pub mod driver;
pub mod playwright;
pub mod session;

pub use campaign::{REPLY_SCAN_CAP, collect_replies, execute_campaign};
pub use cookie::{CookieRecord, WORKSPACE_COOKIE_DOMAIN, parse_cookie_string};
pub use driver::{Delivery, SessionDriver};
pub use playwright::{PlaywrightDriver, RuntimeProbe, probe_runtime};
pub use session::{Pacing, Session, fetch_replies, run_campaign};
