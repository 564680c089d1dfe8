pub mod leagues;
pub mod moderation;
pub mod outbox;
pub mod presence;
pub mod ranks;
pub mod strikes;
