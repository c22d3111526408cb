pub mod accounts;
pub mod campaigns;
pub mod replies;
pub mod runtime;
pub mod state;

pub use state::AppState;
