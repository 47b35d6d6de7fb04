pub mod backend;
pub mod ffplay;
pub mod session;
pub mod speed;


pub use backend::{MediaBackend, MediaEvent};
pub use ffplay::FfplayBackend;
pub use session::{PlayerSession, SessionOptions};
pub use speed::{SpeedSelector, DEFAULT_SPEED_INDEX, SPEED_OPTIONS};
