pub mod antispam;
pub mod moderation;
pub mod price;
pub mod stats;
pub mod throttle;
