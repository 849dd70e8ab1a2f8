// Course and portal-wide announcements.

pub mod handlers;
pub mod store;
