pub mod leagues;
pub mod membership;
pub mod moderation;
pub mod outbox;
pub mod presence;
pub mod ranks;
pub mod registry;
pub mod rehydration;
pub mod strikes;
