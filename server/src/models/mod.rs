pub mod context;
pub mod league;
pub mod moderation;
pub mod presence;
pub mod rank;
pub mod strike;
