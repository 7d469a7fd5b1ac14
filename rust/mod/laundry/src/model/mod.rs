mod batch;
mod branch;
mod client;
mod counters;
mod garment;
mod history;
mod notification;
mod settings;
mod status;

pub use batch::*;
pub use branch::*;
pub use client::*;
pub use counters::*;
pub use garment::*;
pub use history::*;
pub use notification::*;
pub use settings::*;
pub use status::*;
