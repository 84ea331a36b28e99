pub mod health;
pub mod history;
pub mod mercenaries;
pub mod prices;
