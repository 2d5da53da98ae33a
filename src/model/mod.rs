pub mod agent_output;
pub mod event_result;
pub mod history;
pub mod message;
pub mod round;
pub mod seed;
pub mod session;
