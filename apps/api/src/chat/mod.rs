// Faculty chat assistant. Non-streaming; one model reply per request.

pub mod handlers;
pub mod prompts;
