pub mod event_service;
pub mod live_board;

pub use event_service::EventService;
pub use live_board::LiveBoard;
