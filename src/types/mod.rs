pub mod fetch_window;
pub mod observation;
pub mod period;
pub mod record;
