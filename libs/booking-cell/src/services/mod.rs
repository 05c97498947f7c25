pub mod flow;
pub mod handler;
pub mod session;
pub mod visits;

pub use flow::BookingFlowService;
pub use handler::MessageHandler;
pub use session::{PatientChatIndex, SessionRegistry};
pub use visits::VisitService;
